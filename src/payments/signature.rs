use sha2::{Digest, Sha512};

use super::PaymentNotification;

/// Lowercase hex SHA-512 of `order_id + status_code + gross_amount + server_key`.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether the notification was signed with `server_key`.
///
/// An empty key verifies nothing: anyone could sign with it.
pub fn verify_notification(notification: &PaymentNotification, server_key: &str) -> bool {
    if server_key.is_empty() {
        return false;
    }
    let expected = notification_signature(
        &notification.order_id,
        &notification.status_code,
        &notification.gross_amount,
        server_key,
    );
    constant_time_eq(&expected, &notification.signature_key.to_ascii_lowercase())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
