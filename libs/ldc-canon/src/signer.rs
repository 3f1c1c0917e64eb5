//! HMAC-SHA256 signing and verification of the canonical payload (§4.11).

use crate::error::{Result, SignError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The skew window verifiers apply to an out-of-band signed timestamp
/// (§4.11: "verifiers reject timestamps older than 5 minutes"). The
/// header format itself (`v=1; alg=...; key=...; sig=...`) carries no
/// timestamp field, so skew checking is a separate call a caller makes
/// if it has one to check — see [`check_skew`].
pub const SKEW_WINDOW_MS: i64 = 5 * 60 * 1000;

fn mac_with(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts a key of any length")
}

/// Computes the `v=1; alg=hmac-sha256; key=<kid>; sig=<base64url(...)>`
/// header for `payload` (expected to already be canonical JSON).
pub fn sign(payload: &str, secret: &[u8], kid: &str) -> String {
    let mut mac = mac_with(secret);
    mac.update(payload.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("v=1; alg=hmac-sha256; key={kid}; sig={sig}")
}

struct HeaderFields<'a> {
    version: &'a str,
    alg: &'a str,
    sig: &'a str,
}

fn parse_header(header: &str) -> Result<HeaderFields<'_>> {
    let mut version = None;
    let mut alg = None;
    let mut sig = None;
    for part in header.split(';') {
        let Some((k, v)) = part.trim().split_once('=') else {
            continue;
        };
        match k.trim() {
            "v" => version = Some(v.trim()),
            "alg" => alg = Some(v.trim()),
            "sig" => sig = Some(v.trim()),
            _ => {}
        }
    }
    Ok(HeaderFields {
        version: version.ok_or(SignError::Malformed)?,
        alg: alg.ok_or(SignError::Malformed)?,
        sig: sig.ok_or(SignError::Malformed)?,
    })
}

/// Verifies a signature header against `payload` under `secret`, in
/// constant time. Rejects anything but `v=1`/`hmac-sha256`.
pub fn verify(header: &str, payload: &str, secret: &[u8]) -> Result<()> {
    let fields = parse_header(header)?;
    if fields.version != "1" || fields.alg != "hmac-sha256" {
        return Err(SignError::Unsupported);
    }

    let given = URL_SAFE_NO_PAD.decode(fields.sig).map_err(|_| SignError::Malformed)?;

    let mut mac = mac_with(secret);
    mac.update(payload.as_bytes());
    let expected = mac.finalize().into_bytes();

    if expected.as_slice().ct_eq(given.as_slice()).unwrap_u8() == 1 {
        Ok(())
    } else {
        Err(SignError::Mismatch)
    }
}

/// Checks an out-of-band signed timestamp against the 5-minute skew
/// window. Callers supply both sides in milliseconds so this crate never
/// needs its own clock.
pub fn check_skew(signed_at_ms: i64, now_ms: i64) -> Result<()> {
    if (now_ms - signed_at_ms).abs() > SKEW_WINDOW_MS {
        Err(SignError::Expired)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_signature_verifies_against_its_own_payload() {
        let header = sign("payload-bytes", b"secret", "k1");
        assert!(header.starts_with("v=1; alg=hmac-sha256; key=k1; sig="));
        assert!(verify(&header, "payload-bytes", b"secret").is_ok());
    }

    #[test]
    fn a_tampered_payload_fails_verification() {
        let header = sign("payload-bytes", b"secret", "k1");
        assert_eq!(verify(&header, "different-bytes", b"secret"), Err(SignError::Mismatch));
    }

    #[test]
    fn the_wrong_secret_fails_verification() {
        let header = sign("payload-bytes", b"secret", "k1");
        assert_eq!(verify(&header, "payload-bytes", b"wrong-secret"), Err(SignError::Mismatch));
    }

    #[test]
    fn an_unparseable_header_is_malformed() {
        assert_eq!(verify("not a header", "payload-bytes", b"secret"), Err(SignError::Malformed));
    }

    #[test]
    fn an_unsupported_algorithm_is_rejected() {
        let header = "v=1; alg=hmac-sha512; key=k1; sig=AAAA";
        assert_eq!(verify(header, "payload-bytes", b"secret"), Err(SignError::Unsupported));
    }

    #[test]
    fn signing_the_same_payload_twice_is_deterministic() {
        let a = sign("payload-bytes", b"secret", "k1");
        let b = sign("payload-bytes", b"secret", "k1");
        assert_eq!(a, b);
    }

    #[test]
    fn skew_window_accepts_recent_and_rejects_stale_timestamps() {
        let now = 10_000_000_i64;
        assert!(check_skew(now - 60_000, now).is_ok());
        assert_eq!(check_skew(now - 6 * 60_000, now), Err(SignError::Expired));
    }
}
