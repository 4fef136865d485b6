//! One-legged OAuth 1.0a request signing
//!
//! Produces the authorization parameter set for a consumer key/secret pair
//! with no user access token, as required by the marketplace API. The
//! signature base string is canonical: parameters sorted and percent-encoded
//! with the RFC 3986 unreserved profile, so the receiver reconstructs the
//! exact same byte sequence.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use std::collections::BTreeMap;
use url::Url;

use crate::errors::{AppError, AppResult};

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// Nonce length in characters. The protocol requires at least 8; 32 matches
/// what common OAuth client libraries emit.
const NONCE_LEN: usize = 32;
const MIN_NONCE_LEN: usize = 8;

/// Signs outbound requests for one consumer key/secret pair.
#[derive(Clone)]
pub struct RequestSigner {
    consumer_key: String,
    consumer_secret: String,
}

impl RequestSigner {
    pub fn new<K: Into<String>, S: Into<String>>(consumer_key: K, consumer_secret: S) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Sign a request with the current Unix time and a fresh random nonce.
    ///
    /// `url` must not carry a query string; pass query parameters through
    /// `params` so they participate in the signature.
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        params: &BTreeMap<String, String>,
    ) -> AppResult<BTreeMap<String, String>> {
        self.sign_at(method, url, params, Utc::now().timestamp(), &generate_nonce())
    }

    /// Deterministic variant of [`sign`](Self::sign): identical timestamp and
    /// nonce inputs yield an identical parameter set. Tests inject fixed
    /// values here.
    pub fn sign_at(
        &self,
        method: &str,
        url: &str,
        params: &BTreeMap<String, String>,
        timestamp: i64,
        nonce: &str,
    ) -> AppResult<BTreeMap<String, String>> {
        if method.trim().is_empty() {
            return Err(AppError::signing("HTTP method must not be empty"));
        }
        if url.trim().is_empty() {
            return Err(AppError::signing("target URL must not be empty"));
        }
        if nonce.len() < MIN_NONCE_LEN {
            return Err(AppError::signing(format!(
                "nonce must be at least {MIN_NONCE_LEN} characters"
            )));
        }
        let parsed = Url::parse(url)
            .map_err(|e| AppError::signing(format!("invalid target URL '{url}': {e}")))?;
        if parsed.query().is_some() {
            return Err(AppError::signing(
                "target URL must not carry a query string; pass parameters separately",
            ));
        }

        let method = method.to_ascii_uppercase();

        // Merge caller parameters with the oauth_* set. Keys are unique by
        // contract, so the BTreeMap ordering is the canonical sort.
        let mut all: BTreeMap<String, String> = params.clone();
        all.insert("oauth_consumer_key".into(), self.consumer_key.clone());
        all.insert("oauth_signature_method".into(), SIGNATURE_METHOD.into());
        all.insert("oauth_timestamp".into(), timestamp.to_string());
        all.insert("oauth_nonce".into(), nonce.to_string());
        all.insert("oauth_version".into(), OAUTH_VERSION.into());

        let base = signature_base_string(&method, url, &all);
        let signing_key = format!("{}&", percent_encode(&self.consumer_secret));

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .map_err(|e| AppError::signing(format!("HMAC key setup failed: {e}")))?;
        mac.update(base.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        all.insert("oauth_signature".into(), signature);
        Ok(all)
    }
}

/// Render a signed parameter set as an `Authorization: OAuth ...` value.
/// Only the `oauth_*` parameters belong in the header; query parameters
/// travel in the URL.
pub fn authorization_header(signed: &BTreeMap<String, String>) -> String {
    let rendered = signed
        .iter()
        .filter(|(key, _)| key.starts_with("oauth_"))
        .map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {rendered}")
}

/// Percent-encode per the OAuth profile: every byte except the RFC 3986
/// unreserved set `A-Za-z0-9-._~`.
pub fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

pub(crate) fn signature_base_string(
    method: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> String {
    let param_string = params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method,
        percent_encode(url),
        percent_encode(&param_string)
    )
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    const URL: &str = "https://api.example.com/v2/icon";

    fn signer() -> RequestSigner {
        RequestSigner::new("key123", "secret456")
    }

    fn query_params() -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("query".to_string(), "star".to_string());
        params.insert("limit".to_string(), "10".to_string());
        params
    }

    #[test]
    fn base_string_is_canonical() {
        let signed = signer()
            .sign_at("get", URL, &query_params(), 1_300_000_000, "abcdef12")
            .unwrap();

        let mut without_signature = signed.clone();
        without_signature.remove("oauth_signature");
        let base = signature_base_string("GET", URL, &without_signature);

        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.example.com%2Fv2%2Ficon&\
             limit%3D10\
             %26oauth_consumer_key%3Dkey123\
             %26oauth_nonce%3Dabcdef12\
             %26oauth_signature_method%3DHMAC-SHA1\
             %26oauth_timestamp%3D1300000000\
             %26oauth_version%3D1.0\
             %26query%3Dstar"
        );
    }

    #[test]
    fn signing_is_deterministic_for_fixed_inputs() {
        let first = signer()
            .sign_at("GET", URL, &query_params(), 1_300_000_000, "abcdef12")
            .unwrap();
        let second = signer()
            .sign_at("GET", URL, &query_params(), 1_300_000_000, "abcdef12")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn different_nonce_changes_signature() {
        let first = signer()
            .sign_at("GET", URL, &query_params(), 1_300_000_000, "abcdef12")
            .unwrap();
        let second = signer()
            .sign_at("GET", URL, &query_params(), 1_300_000_000, "abcdef13")
            .unwrap();
        assert_ne!(first["oauth_signature"], second["oauth_signature"]);
    }

    #[test]
    fn signature_is_base64_of_sha1_digest() {
        let signed = signer()
            .sign_at("GET", URL, &query_params(), 1_300_000_000, "abcdef12")
            .unwrap();
        let digest = BASE64.decode(&signed["oauth_signature"]).unwrap();
        assert_eq!(digest.len(), 20);
    }

    #[test]
    fn all_required_oauth_fields_are_present() {
        let signed = signer()
            .sign_at("GET", URL, &query_params(), 1_300_000_000, "abcdef12")
            .unwrap();
        for key in [
            "oauth_consumer_key",
            "oauth_signature_method",
            "oauth_timestamp",
            "oauth_nonce",
            "oauth_version",
            "oauth_signature",
        ] {
            assert!(signed.contains_key(key), "missing {key}");
        }
        assert_eq!(signed["oauth_signature_method"], "HMAC-SHA1");
        assert_eq!(signed["oauth_version"], "1.0");
        // Caller parameters survive the merge untouched
        assert_eq!(signed["query"], "star");
        assert_eq!(signed["limit"], "10");
    }

    #[test]
    fn generated_nonce_is_url_safe_and_long_enough() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), 32);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn rejects_empty_method_and_url() {
        let params = BTreeMap::new();
        assert!(matches!(
            signer().sign_at("", URL, &params, 1, "abcdef12"),
            Err(AppError::Signing { .. })
        ));
        assert!(matches!(
            signer().sign_at("GET", "", &params, 1, "abcdef12"),
            Err(AppError::Signing { .. })
        ));
        assert!(matches!(
            signer().sign_at("GET", "   ", &params, 1, "abcdef12"),
            Err(AppError::Signing { .. })
        ));
    }

    #[test]
    fn rejects_url_with_query_string() {
        let params = BTreeMap::new();
        let result = signer().sign_at(
            "GET",
            "https://api.example.com/v2/icon?query=star",
            &params,
            1,
            "abcdef12",
        );
        assert!(matches!(result, Err(AppError::Signing { .. })));
    }

    #[test]
    fn rejects_short_nonce() {
        let result = signer().sign_at("GET", URL, &BTreeMap::new(), 1, "short");
        assert!(matches!(result, Err(AppError::Signing { .. })));
    }

    #[test]
    fn percent_encoding_leaves_unreserved_untouched() {
        assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("a/b?c=d&e"), "a%2Fb%3Fc%3Dd%26e");
        assert_eq!(percent_encode("caf\u{e9}"), "caf%C3%A9");
    }

    #[test]
    fn header_rendering_includes_only_oauth_parameters() {
        let signed = signer()
            .sign_at("GET", URL, &query_params(), 1_300_000_000, "abcdef12")
            .unwrap();
        let header = authorization_header(&signed);
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_consumer_key=\"key123\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(!header.contains("query="));
        assert!(!header.contains("limit="));
    }
}
