//! Gateway payment signature verification.
//!
//! The gateway signs `"{order_id}|{payment_id}"` with HMAC-SHA256 under the shared key secret and sends the
//! digest as lowercase hex. Verification goes through [`Mac::verify_slice`], which compares in constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the expected signature for an (order, payment) pair. Test and tooling helper; request verification
/// uses [`verify_payment_signature`] so the comparison stays constant time.
pub fn payment_signature(order_id: &str, payment_id: &str, secret: &str) -> String {
    let mac = mac_for(order_id, payment_id, secret);
    hex::encode(mac.finalize().into_bytes())
}

/// Returns true iff `signature` is the valid lowercase-hex HMAC for this (order, payment) pair. A malformed hex
/// string is simply an invalid signature.
pub fn verify_payment_signature(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let Ok(given) = hex::decode(signature) else {
        return false;
    };
    mac_for(order_id, payment_id, secret).verify_slice(&given).is_ok()
}

fn mac_for(order_id: &str, payment_id: &str, secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "hub-test-secret";

    #[test]
    fn known_vector_verifies() {
        let sig = payment_signature("order_PH1001", "pay_PH2002", SECRET);
        assert_eq!(sig, "bf95d449e3af227f7c4609586af79a8432ad689295649d8b74cc60eb093a5700");
        assert!(verify_payment_signature("order_PH1001", "pay_PH2002", &sig, SECRET));
    }

    #[test]
    fn second_vector_verifies() {
        let sig = payment_signature("order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f", "9b8f2c");
        assert_eq!(sig, "7d484efbe87cc1a0cce2090ebd1b75c6216f124f6baa9b8150ff4c62a5b24cff");
    }

    #[test]
    fn tampered_inputs_fail() {
        let sig = payment_signature("order_PH1001", "pay_PH2002", SECRET);
        assert!(!verify_payment_signature("order_PH1002", "pay_PH2002", &sig, SECRET));
        assert!(!verify_payment_signature("order_PH1001", "pay_PH2003", &sig, SECRET));
        assert!(!verify_payment_signature("order_PH1001", "pay_PH2002", &sig, "other-secret"));
    }

    #[test]
    fn uppercase_and_garbage_signatures_fail() {
        let sig = payment_signature("order_PH1001", "pay_PH2002", SECRET).to_uppercase();
        // Uppercase hex decodes to the same bytes, so it still verifies.
        assert!(verify_payment_signature("order_PH1001", "pay_PH2002", &sig, SECRET));
        assert!(!verify_payment_signature("order_PH1001", "pay_PH2002", "not-hex-at-all", SECRET));
        assert!(!verify_payment_signature("order_PH1001", "pay_PH2002", "", SECRET));
        assert!(!verify_payment_signature("order_PH1001", "pay_PH2002", "deadbeef", SECRET));
    }
}
