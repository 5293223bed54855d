use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use projecthub_engine::{AuthApiError, CatalogApiError, PaymentFlowError, ProjectApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Upload rejected. {0}")]
    UploadError(#[from] UploadError),
    #[error("Payment gateway error. {0}")]
    PaymentGatewayError(String),
    #[error("Payment verification failed.")]
    PaymentVerificationFailed,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Account pending approval.")]
    AccountPendingApproval,
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UploadError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::FORBIDDEN,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::PaymentVerificationFailed => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::NOT_FOUND,
            Self::AccountPendingApproval => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("The field '{0}' is missing from the form.")]
    MissingField(String),
    #[error("The file exceeds the {0} MB limit for this upload.")]
    FileTooLarge(usize),
    #[error("Too many files. At most {0} are accepted for this upload.")]
    TooManyFiles(usize),
    #[error("The content type '{0}' is not accepted for this upload.")]
    UnsupportedContentType(String),
    #[error("Could not store the uploaded file. {0}")]
    StorageError(String),
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredentials => Self::InvalidCredentials,
            AuthApiError::AccountNotActivated => Self::AccountPendingApproval,
            AuthApiError::EmailAlreadyExists => Self::InvalidRequest(e.to_string()),
            AuthApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::PasswordHash(e) => Self::BackendError(e),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<ProjectApiError> for ServerError {
    fn from(e: ProjectApiError) -> Self {
        match e {
            ProjectApiError::ProjectNotFound(_) => Self::NoRecordFound(e.to_string()),
            ProjectApiError::AccessDenied => Self::InsufficientPermissions(e.to_string()),
            ProjectApiError::InvalidTransition(_) => Self::InvalidRequest(e.to_string()),
            ProjectApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::ItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::InvalidSignature => Self::PaymentVerificationFailed,
            PaymentFlowError::OrderNotFound(_) |
            PaymentFlowError::PaymentNotFound(_) |
            PaymentFlowError::ProjectNotFound(_) |
            PaymentFlowError::ItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentFlowError::AccessDenied => Self::InsufficientPermissions(e.to_string()),
            PaymentFlowError::TargetMismatch |
            PaymentFlowError::NoQuote |
            PaymentFlowError::UnpayablePrice(_) |
            PaymentFlowError::InvalidTransition(_) => Self::InvalidRequest(e.to_string()),
            PaymentFlowError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
