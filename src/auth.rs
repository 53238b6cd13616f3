//! Connection identity.
//!
//! The battle core consumes an authenticated `{userId, username}` pair from
//! a bearer credential presented at connection time. The credential is a
//! lightweight signed token, `base64url(json).base64url(hmac_sha256(json))`,
//! issued by the surrounding account layer with the same shared key.

use anyhow::Context;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// The authenticated user behind one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    name: String,
    iat: i64,
}

/// Verifies (and, for the account layer and tests, issues) bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: Arc<[u8; 32]>,
}

impl TokenSigner {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key: Arc::new(key) }
    }

    pub fn issue(&self, user: &UserIdentity) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user.user_id,
            name: user.username.clone(),
            iat: OffsetDateTime::now_utc().unix_timestamp(),
        };
        let payload = serde_json::to_vec(&claims)?;
        let part1 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload);
        let part2 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.sign(&payload));
        Ok(format!("{}.{}", part1, part2))
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<UserIdentity> {
        let mut parts = token.split('.');
        let p1 = parts.next().context("missing payload")?;
        let p2 = parts.next().context("missing signature")?;
        if parts.next().is_some() {
            anyhow::bail!("too many parts");
        }
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p1)?;
        let sig = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p2)?;

        let mut mac = HmacSha256::new_from_slice(self.key.as_slice()).expect("hmac accepts any key length");
        mac.update(&payload);
        mac.verify_slice(&sig).context("bad signature")?;

        let claims: Claims = serde_json::from_slice(&payload)?;
        Ok(UserIdentity {
            user_id: claims.sub,
            username: claims.name,
        })
    }

    fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(self.key.as_slice()).expect("hmac accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().into()
    }
}
