//! HMAC-signed feedback links.
//!
//! A token is `<payload>.<signature>`, both base64url without padding.
//! The payload is fixed-width binary:
//!
//! | bytes | field |
//! |-------|-------|
//! | 0     | format version (`1`) |
//! | 1..9  | tutor id, big-endian `i64` |
//! | 9..17 | issued-at, big-endian unix seconds |
//!
//! The signature is HMAC-SHA256 over a domain label followed by the raw
//! payload bytes.
//!
//! # Invariants
//! - Any change to payload or signature fails verification as `Invalid`.
//! - `Expired` is only reported for tokens whose signature verifies.
//! - Tokens are not consumed; they verify repeatedly until they expire.

use crate::error::ErrorKind;
use crate::model::tutor::TutorId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::error::Error;
use std::fmt::{Display, Formatter};

type HmacSha256 = Hmac<Sha256>;

/// Validity window used when the caller does not choose one: 24 hours.
pub const DEFAULT_MAX_AGE_SECS: u64 = 60 * 60 * 24;
/// Shortest signing secret accepted.
pub const MIN_SECRET_BYTES: usize = 16;

const TOKEN_VERSION: u8 = 1;
const PAYLOAD_LEN: usize = 17;
const SIGNING_LABEL: &[u8] = b"tutoring.feedback-link\0";

/// Failure to create a signer or verify a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Signature verified but the token is older than the allowed age.
    Expired { issued_at: i64, max_age_secs: u64 },
    /// Malformed token, bad signature, or no such tutor.
    Invalid,
    /// Configured secret is too short to sign with.
    WeakSecret { min_bytes: usize },
}

impl LinkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Expired { .. } => ErrorKind::Expired,
            Self::Invalid => ErrorKind::Invalid,
            Self::WeakSecret { .. } => ErrorKind::ValidationError,
        }
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired {
                issued_at,
                max_age_secs,
            } => write!(
                f,
                "feedback link issued at {issued_at} is older than {max_age_secs}s"
            ),
            Self::Invalid => write!(f, "feedback link is invalid"),
            Self::WeakSecret { min_bytes } => {
                write!(f, "signing secret must be at least {min_bytes} bytes")
            }
        }
    }
}

impl Error for LinkError {}

/// Claims carried by a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedLink {
    pub tutor_id: TutorId,
    pub issued_at: i64,
}

/// Issues and verifies feedback link tokens with one secret.
#[derive(Clone)]
pub struct FeedbackLinkSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for FeedbackLinkSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackLinkSigner").finish_non_exhaustive()
    }
}

impl FeedbackLinkSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, LinkError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(LinkError::WeakSecret {
                min_bytes: MIN_SECRET_BYTES,
            });
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| LinkError::WeakSecret {
            min_bytes: MIN_SECRET_BYTES,
        })?;
        Ok(Self { mac })
    }

    /// Issues a token for `tutor_id` stamped with the current time.
    pub fn issue(&self, tutor_id: TutorId) -> String {
        self.issue_at(tutor_id, now_epoch_secs())
    }

    /// Issues a token stamped with `issued_at` (unix seconds).
    pub fn issue_at(&self, tutor_id: TutorId, issued_at: i64) -> String {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = TOKEN_VERSION;
        payload[1..9].copy_from_slice(&tutor_id.to_be_bytes());
        payload[9..17].copy_from_slice(&issued_at.to_be_bytes());

        let signature = self.sign(&payload);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Verifies `token` against the current time.
    pub fn verify(&self, token: &str, max_age_secs: u64) -> Result<VerifiedLink, LinkError> {
        self.verify_at(token, now_epoch_secs(), max_age_secs)
    }

    /// Verifies `token` as if the current time were `now` (unix seconds).
    pub fn verify_at(
        &self,
        token: &str,
        now: i64,
        max_age_secs: u64,
    ) -> Result<VerifiedLink, LinkError> {
        let (payload_text, signature_text) =
            token.trim().split_once('.').ok_or(LinkError::Invalid)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_text)
            .map_err(|_| LinkError::Invalid)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_text)
            .map_err(|_| LinkError::Invalid)?;

        let mut mac = self.mac.clone();
        mac.update(SIGNING_LABEL);
        mac.update(&payload);
        mac.verify_slice(&signature)
            .map_err(|_| LinkError::Invalid)?;

        let claims = decode_payload(&payload)?;
        let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
        if now.saturating_sub(claims.issued_at) > max_age {
            return Err(LinkError::Expired {
                issued_at: claims.issued_at,
                max_age_secs,
            });
        }
        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(SIGNING_LABEL);
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

fn decode_payload(payload: &[u8]) -> Result<VerifiedLink, LinkError> {
    if payload.len() != PAYLOAD_LEN || payload[0] != TOKEN_VERSION {
        return Err(LinkError::Invalid);
    }
    let mut tutor_bytes = [0u8; 8];
    tutor_bytes.copy_from_slice(&payload[1..9]);
    let mut issued_bytes = [0u8; 8];
    issued_bytes.copy_from_slice(&payload[9..17]);

    let tutor_id = i64::from_be_bytes(tutor_bytes);
    if tutor_id <= 0 {
        return Err(LinkError::Invalid);
    }
    Ok(VerifiedLink {
        tutor_id,
        issued_at: i64::from_be_bytes(issued_bytes),
    })
}

pub(crate) fn now_epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-0123456789";
    const NOW: i64 = 1_700_000_000;

    fn signer() -> FeedbackLinkSigner {
        FeedbackLinkSigner::new(SECRET).unwrap()
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = FeedbackLinkSigner::new("short").unwrap_err();
        assert_eq!(err, LinkError::WeakSecret { min_bytes: 16 });
    }

    #[test]
    fn token_verifies_inside_window() {
        let token = signer().issue_at(7, NOW - 3600);
        let claims = signer()
            .verify_at(&token, NOW, DEFAULT_MAX_AGE_SECS)
            .unwrap();
        assert_eq!(claims.tutor_id, 7);
        assert_eq!(claims.issued_at, NOW - 3600);
    }

    #[test]
    fn token_exactly_at_max_age_is_still_valid() {
        let token = signer().issue_at(3, NOW - 86_400);
        assert!(signer().verify_at(&token, NOW, 86_400).is_ok());
        let err = signer().verify_at(&token, NOW + 1, 86_400).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);
    }

    #[test]
    fn other_secret_cannot_verify() {
        let token = signer().issue_at(7, NOW);
        let other = FeedbackLinkSigner::new("another-secret-abcdefghij").unwrap();
        assert_eq!(
            other.verify_at(&token, NOW, DEFAULT_MAX_AGE_SECS),
            Err(LinkError::Invalid)
        );
    }

    #[test]
    fn expired_token_with_forged_timestamp_is_invalid_not_expired() {
        let token = signer().issue_at(7, NOW - 90_000);
        let (_, signature) = token.split_once('.').unwrap();
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = TOKEN_VERSION;
        payload[1..9].copy_from_slice(&7i64.to_be_bytes());
        payload[9..17].copy_from_slice(&NOW.to_be_bytes());
        let forged = format!("{}.{signature}", URL_SAFE_NO_PAD.encode(payload));
        assert_eq!(
            signer().verify_at(&forged, NOW, DEFAULT_MAX_AGE_SECS),
            Err(LinkError::Invalid)
        );
    }

    #[test]
    fn malformed_tokens_are_invalid() {
        for token in ["", "no-separator", "a.b.c", ".", "AAAA.AAAA"] {
            assert_eq!(
                signer().verify_at(token, NOW, DEFAULT_MAX_AGE_SECS),
                Err(LinkError::Invalid),
                "token {token:?}"
            );
        }
    }
}
