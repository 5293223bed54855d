//! Multipart form handling and upload policies.
//!
//! Every upload endpoint names an [`UploadPolicy`] that caps the number of files, the size of each file and the
//! accepted content types. Files are streamed to the upload directory under a collision-proof name; text fields
//! are collected into a map for the handler to consume.

use std::{collections::HashMap, path::Path};

use actix_multipart::Multipart;
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tokio::io::AsyncWriteExt;

use crate::errors::UploadError;

const MB: usize = 1024 * 1024;

/// Which content types an upload slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedTypes {
    /// Any `video/*` type.
    Video,
    /// Zip and rar archives.
    Archive,
    /// Any `image/*` type, or a PDF.
    ImageOrPdf,
    /// Images, PDFs, archives or mp4 video.
    Attachment,
}

impl AcceptedTypes {
    fn accepts(self, essence: &str) -> bool {
        match self {
            AcceptedTypes::Video => essence.starts_with("video/"),
            AcceptedTypes::Archive => matches!(
                essence,
                "application/zip" |
                    "application/x-zip-compressed" |
                    "application/x-rar-compressed" |
                    "application/vnd.rar"
            ),
            AcceptedTypes::ImageOrPdf => essence.starts_with("image/") || essence == "application/pdf",
            AcceptedTypes::Attachment => {
                AcceptedTypes::ImageOrPdf.accepts(essence) ||
                    AcceptedTypes::Archive.accepts(essence) ||
                    essence == "video/mp4"
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_files: usize,
    pub max_mb_each: usize,
    pub accepted: AcceptedTypes,
}

/// A single delivery video, up to 200 MB. Shared by the custom-project and catalog video endpoints.
pub const DELIVERY_VIDEO: UploadPolicy =
    UploadPolicy { max_files: 1, max_mb_each: 200, accepted: AcceptedTypes::Video };
/// A single delivery code archive, up to 100 MB.
pub const DELIVERY_CODE: UploadPolicy =
    UploadPolicy { max_files: 1, max_mb_each: 100, accepted: AcceptedTypes::Archive };
/// Up to ten delivery assets of 20 MB each.
pub const DELIVERY_ASSETS: UploadPolicy =
    UploadPolicy { max_files: 10, max_mb_each: 20, accepted: AcceptedTypes::ImageOrPdf };
/// Up to five attachments of 50 MB each on a project request.
pub const PROJECT_ATTACHMENTS: UploadPolicy =
    UploadPolicy { max_files: 5, max_mb_each: 50, accepted: AcceptedTypes::Attachment };
/// Up to five catalog listing images of 10 MB each.
pub const PORTFOLIO_IMAGES: UploadPolicy =
    UploadPolicy { max_files: 5, max_mb_each: 10, accepted: AcceptedTypes::ImageOrPdf };

/// A file that has been streamed to disk.
#[derive(Debug, Clone)]
pub struct SavedFile {
    /// The multipart field the file arrived under.
    pub field: String,
    /// The original filename, as sent by the client.
    pub filename: String,
    /// The public path the file is served from.
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct UploadedForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<SavedFile>,
}

impl UploadedForm {
    pub fn field(&self, name: &str) -> Result<&str, UploadError> {
        self.fields.get(name).map(String::as_str).ok_or_else(|| UploadError::MissingField(name.to_string()))
    }
}

/// Reads a multipart form, storing file parts under `upload_dir` and collecting text parts. The policy is
/// enforced while streaming, so an oversized upload is rejected without being stored in full.
pub async fn read_form(
    mut payload: Multipart,
    policy: UploadPolicy,
    upload_dir: &str,
) -> Result<UploadedForm, UploadError> {
    let mut form = UploadedForm::default();
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| UploadError::StorageError(e.to_string()))?;
    while let Some(mut field) = payload.try_next().await.map_err(|e| UploadError::StorageError(e.to_string()))? {
        let field_name = field.name().to_string();
        let filename = field.content_disposition().get_filename().map(str::to_string);
        match filename {
            None => {
                // A text field.
                let mut value = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| UploadError::StorageError(e.to_string()))?;
                    value.extend_from_slice(&chunk);
                }
                let value = String::from_utf8_lossy(&value).to_string();
                form.fields.insert(field_name, value);
            },
            Some(filename) => {
                if form.files.len() >= policy.max_files {
                    return Err(UploadError::TooManyFiles(policy.max_files));
                }
                let essence =
                    field.content_type().map(|m| m.essence_str().to_string()).unwrap_or_default();
                if !policy.accepted.accepts(&essence) {
                    return Err(UploadError::UnsupportedContentType(essence));
                }
                let stored_name = unique_filename(&filename);
                let path = Path::new(upload_dir).join(&stored_name);
                let mut file =
                    tokio::fs::File::create(&path).await.map_err(|e| UploadError::StorageError(e.to_string()))?;
                let limit = policy.max_mb_each * MB;
                let mut written = 0usize;
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| UploadError::StorageError(e.to_string()))?;
                    written += chunk.len();
                    if written > limit {
                        drop(file);
                        let _ = tokio::fs::remove_file(&path).await;
                        return Err(UploadError::FileTooLarge(policy.max_mb_each));
                    }
                    file.write_all(&chunk).await.map_err(|e| UploadError::StorageError(e.to_string()))?;
                }
                file.flush().await.map_err(|e| UploadError::StorageError(e.to_string()))?;
                debug!("📦️ Stored upload '{filename}' as {stored_name} ({written} bytes)");
                form.files.push(SavedFile {
                    field: field_name,
                    filename,
                    url: format!("/uploads/{stored_name}"),
                    content_type: essence,
                });
            },
        }
    }
    Ok(form)
}

/// A collision-proof stored name that still hints at the original filename.
fn unique_filename(original: &str) -> String {
    let safe: String =
        original.chars().map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' }).collect();
    let nonce: String = thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect();
    format!("{}-{}-{}", Utc::now().timestamp_millis(), nonce, safe)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepted_types_cover_the_policies() {
        assert!(AcceptedTypes::Video.accepts("video/mp4"));
        assert!(!AcceptedTypes::Video.accepts("image/png"));
        assert!(AcceptedTypes::Archive.accepts("application/zip"));
        assert!(AcceptedTypes::Archive.accepts("application/x-rar-compressed"));
        assert!(!AcceptedTypes::Archive.accepts("application/pdf"));
        assert!(AcceptedTypes::ImageOrPdf.accepts("image/jpeg"));
        assert!(AcceptedTypes::ImageOrPdf.accepts("application/pdf"));
        assert!(!AcceptedTypes::ImageOrPdf.accepts("video/mp4"));
        assert!(AcceptedTypes::Attachment.accepts("video/mp4"));
        assert!(AcceptedTypes::Attachment.accepts("application/zip"));
        assert!(!AcceptedTypes::Attachment.accepts("application/octet-stream"));
    }

    #[test]
    fn unique_filenames_sanitize_and_differ() {
        let a = unique_filename("my file (1).mp4");
        let b = unique_filename("my file (1).mp4");
        assert!(a.ends_with("my_file__1_.mp4"));
        assert_ne!(a, b);
    }
}
