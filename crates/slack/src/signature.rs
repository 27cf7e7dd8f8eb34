use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Requests whose timestamp drifts further than this from the local clock
/// are rejected before any MAC work, per Slack's replay guidance.
pub const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

const SIGNATURE_VERSION: &str = "v0";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("malformed request timestamp: `{0}`")]
    MalformedTimestamp(String),
    #[error("request timestamp outside the accepted window ({skew_secs}s skew)")]
    StaleTimestamp { skew_secs: i64 },
    #[error("signature is not a {SIGNATURE_VERSION} hex digest")]
    MalformedSignature,
    #[error("signature mismatch")]
    Mismatch,
}

/// Computes the `v0=<hex>` signature for a request body.
pub fn sign(signing_secret: &str, timestamp: i64, body: &str) -> String {
    let base = format!("{SIGNATURE_VERSION}:{timestamp}:{body}");
    format!("{SIGNATURE_VERSION}={}", hmac_hex(signing_secret.as_bytes(), base.as_bytes()))
}

/// Verifies an inbound request against the signing secret.
///
/// `timestamp` and `signature` are the raw header values; `now_unix_secs`
/// is injected so the staleness window is testable.
pub fn verify(
    signing_secret: &str,
    timestamp: &str,
    signature: &str,
    body: &str,
    now_unix_secs: i64,
) -> Result<(), SignatureError> {
    let timestamp_secs = timestamp
        .trim()
        .parse::<i64>()
        .map_err(|_| SignatureError::MalformedTimestamp(timestamp.to_owned()))?;

    let skew_secs = now_unix_secs.saturating_sub(timestamp_secs).abs();
    if skew_secs > MAX_TIMESTAMP_SKEW_SECS {
        return Err(SignatureError::StaleTimestamp { skew_secs });
    }

    if !signature.starts_with("v0=") {
        return Err(SignatureError::MalformedSignature);
    }

    let expected = sign(signing_secret, timestamp_secs, body);
    if constant_time_eq(&expected, signature) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn hmac_hex(secret: &[u8], payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("hmac-sha256 accepts any key length");
    mac.update(payload);
    encode_hex(mac.finalize().into_bytes().as_slice())
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.as_bytes().iter().zip(b.as_bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
