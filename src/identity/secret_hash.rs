//! Cognito `SECRET_HASH` computation.
//!
//! App clients that have a secret require every user-scoped call to carry
//!
//! ```text
//! SECRET_HASH = base64(HMAC-SHA256(client_secret, username + client_id))
//! ```
//!
//! # Example
//!
//! ```rust
//! use portfolio_api::identity::secret_hash;
//!
//! let hash = secret_hash("alice", "client-123", "shh");
//! assert_eq!(hash, secret_hash("alice", "client-123", "shh"));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Compute the base64-encoded secret hash for `username`.
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(client_secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
