//! # Invoice Description Tags
//!
//! Invoices issued by the bridge carry an HMAC-SHA256 tag over the
//! requesting user, keyed by the configured tag secret. The tag binds an
//! invoice to the user who requested it without putting the user id in
//! the description verbatim.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Description prefix ahead of the tag.
const TAG_PREFIX: &str = "satbridge:";

/// Tag a user id for an invoice description.
pub fn tag_description(secret: &[u8], user_id_b64: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(user_id_b64.as_bytes());
    let tag = mac.finalize().into_bytes();
    format!("{TAG_PREFIX}{}", hex::encode(tag))
}

/// Verify a description tag against a user id. Constant-time on the MAC
/// comparison.
pub fn verify_description_tag(secret: &[u8], user_id_b64: &str, description: &str) -> bool {
    let Some(tag_hex) = description.strip_prefix(TAG_PREFIX) else {
        return false;
    };
    let Ok(tag_bytes) = hex::decode(tag_hex) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(user_id_b64.as_bytes());
    mac.verify_slice(&tag_bytes).is_ok()
}
