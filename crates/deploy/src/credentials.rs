//! Signing credentials for the deployer account.

use std::fmt;

use starknet::core::types::Felt;

use crate::DeployError;

/// The hexadecimal prefix marker.
pub const HEX_PREFIX: &str = "0x";

/// A secret string that is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Canonical credentials of the deployer account.
///
/// The signing key never carries the `0x` prefix, the account address always
/// carries exactly one. Both are hexadecimal felts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub signing_key: SecretString,
    pub account_address: String,
}

impl Credentials {
    /// Resolve credentials from raw, possibly missing, input strings.
    ///
    /// A value that is not a hexadecimal felt once its single prefix is
    /// removed (e.g. `0x0xab`) is refused.
    pub fn resolve(
        signing_key: Option<&str>,
        account_address: Option<&str>,
    ) -> Result<Self, DeployError> {
        let signing_key =
            non_empty(signing_key).ok_or(DeployError::MissingCredential("private key"))?;
        let account_address =
            non_empty(account_address).ok_or(DeployError::MissingCredential("account address"))?;

        let signing_key = strip_hex_prefix(signing_key);
        if !is_hex_felt(signing_key) {
            return Err(DeployError::InvalidCredential {
                name: "private key",
                reason: "is not a hexadecimal felt".to_string(),
            });
        }

        let account_address = ensure_hex_prefix(account_address);
        if !is_hex_felt(strip_hex_prefix(&account_address)) {
            return Err(DeployError::InvalidCredential {
                name: "account address",
                reason: format!("{account_address} is not a hexadecimal felt"),
            });
        }

        Ok(Self {
            signing_key: SecretString::new(signing_key),
            account_address,
        })
    }
}

/// `digits` are at most 64 unprefixed hex digits parsing as a felt.
fn is_hex_felt(digits: &str) -> bool {
    (1..=64).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_hexdigit())
        && Felt::from_hex(&format!("{HEX_PREFIX}{digits}")).is_ok()
}

/// Returns the trimmed value if it carries more than the bare prefix.
fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty() && *value != HEX_PREFIX)
}

/// Strip the hex prefix if present.
pub fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix(HEX_PREFIX).unwrap_or(value)
}

/// Prepend the hex prefix if missing.
pub fn ensure_hex_prefix(value: &str) -> String {
    if value.starts_with(HEX_PREFIX) {
        value.to_string()
    } else {
        format!("{HEX_PREFIX}{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;

    const KEYS: &[&str] = &["0xabc123", "abc123", "0x0", "deadbeef", "  0x1f  "];
    const ADDRESSES: &[&str] = &[
        "def456",
        "0xdef456",
        "0x0",
        "1",
        " 049d36570d4e46f48e99674bd3fcc84644ddd6b96f7c741b1562b82f9e004dc7 ",
    ];

    #[test]
    fn test_resolve_example_credentials() {
        let credentials = Credentials::resolve(Some("0xabc123"), Some("def456")).unwrap();

        assert_eq!(credentials.signing_key.expose(), "abc123");
        assert_eq!(credentials.account_address, "0xdef456");
    }

    #[test]
    fn test_signing_key_never_has_prefix() {
        for key in KEYS {
            let credentials = Credentials::resolve(Some(*key), Some("def456")).unwrap();
            assert!(
                !credentials.signing_key.expose().starts_with(HEX_PREFIX),
                "key {key:?} kept its prefix"
            );
        }
    }

    #[test]
    fn test_account_address_has_exactly_one_prefix() {
        for address in ADDRESSES {
            let credentials = Credentials::resolve(Some("abc123"), Some(*address)).unwrap();
            let rest = credentials.account_address.strip_prefix(HEX_PREFIX).unwrap();
            assert!(!rest.starts_with(HEX_PREFIX), "address {address:?} got a double prefix");
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        for (key, address) in KEYS.iter().zip(ADDRESSES) {
            let once = Credentials::resolve(Some(*key), Some(*address)).unwrap();
            let twice = Credentials::resolve(
                Some(once.signing_key.expose()),
                Some(once.account_address.as_str()),
            )
            .unwrap();

            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_missing_credentials() {
        let cases = [
            (None, Some("def456")),
            (Some(""), Some("def456")),
            (Some("0x"), Some("def456")),
            (Some("abc123"), None),
            (Some("abc123"), Some("   ")),
        ];

        for (key, address) in cases {
            let err = Credentials::resolve(key, address).unwrap_err();
            assert_eq!(err.kind(), FailureKind::MissingCredential);
        }
    }

    const TOO_LONG: &str = "0xfffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

    #[test]
    fn test_malformed_credentials() {
        let cases = [
            (Some("0x0xab"), Some("def456")),
            (Some("zz"), Some("def456")),
            (Some("abc123"), Some("0x0xdef")),
            (Some("abc123"), Some("not-an-address")),
            (Some("abc123"), Some(TOO_LONG)),
        ];

        for (key, address) in cases {
            let err = Credentials::resolve(key, address).unwrap_err();
            assert_eq!(err.kind(), FailureKind::InvalidCredential, "{key:?} {address:?}");
        }
    }

    #[test]
    fn test_invalid_key_is_not_echoed() {
        let err = Credentials::resolve(Some("0xsecretzz"), Some("def456")).unwrap_err();

        assert!(!err.to_string().contains("secretzz"));
    }

    #[test]
    fn test_signing_key_is_redacted() {
        let credentials = Credentials::resolve(Some("0xabc123"), Some("def456")).unwrap();

        let debug = format!("{credentials:?}");
        assert!(!debug.contains("abc123"));
        assert!(debug.contains("<redacted>"));
        assert_eq!(credentials.signing_key.to_string(), "<redacted>");
    }
}
