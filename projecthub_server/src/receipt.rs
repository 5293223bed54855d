//! PDF receipt rendering.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use projecthub_engine::ReceiptData;

use crate::errors::ServerError;

/// Renders a one-page A4 receipt for a verified payment.
pub fn render_receipt(receipt: &ReceiptData) -> Result<Vec<u8>, ServerError> {
    let (doc, page, layer) = PdfDocument::new("Payment Receipt", Mm(210.0), Mm(297.0), "Layer 1");
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ServerError::Unspecified(format!("Could not load PDF font. {e}")))?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ServerError::Unspecified(format!("Could not load PDF font. {e}")))?;
    let layer = doc.get_page(page).get_layer(layer);

    layer.use_text("ProjectHub - Payment Receipt", 20.0, Mm(20.0), Mm(270.0), &bold);

    // The builtin fonts are WinAnsi encoded, so the amount is spelled with "INR" rather than the rupee sign.
    let amount =
        format!("INR {}.{:02}", receipt.amount.whole_rupees(), (receipt.amount.value() % 100).abs());
    let lines = [
        ("Payment ID", receipt.gateway_payment_id.clone()),
        ("Order ID", receipt.gateway_order_id.clone()),
        ("Amount", amount),
        ("Payment type", receipt.payment_type.to_string()),
        ("Paid by", receipt.paid_by.clone()),
        ("Project", receipt.project_name.clone().unwrap_or_else(|| "-".to_string())),
        ("Date", receipt.paid_at.format("%Y-%m-%d %H:%M UTC").to_string()),
    ];
    let mut y = 245.0;
    for (label, value) in lines {
        layer.use_text(format!("{label}:"), 12.0, Mm(20.0), Mm(y), &bold);
        layer.use_text(value, 12.0, Mm(70.0), Mm(y), &regular);
        y -= 10.0;
    }
    layer.use_text("Thank you for your business.", 10.0, Mm(20.0), Mm(y - 10.0), &regular);

    doc.save_to_bytes().map_err(|e| ServerError::Unspecified(format!("Could not render receipt PDF. {e}")))
}
