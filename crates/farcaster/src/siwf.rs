//! Sign In With Farcaster.
//!
//! The client signs an EIP-4361 message with the account's custody key. The
//! fid is carried as a `farcaster://fid/<n>` resource. Whether the recovered
//! address really is the fid's custody address is checked by the caller
//! against the profile API.

use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, Utc};
use tipstats_core::AppError;

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
const FID_RESOURCE_PREFIX: &str = "farcaster://fid/";

/// A parsed EIP-4361 sign-in message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInMessage {
    pub domain: String,
    pub address: Address,
    pub statement: Option<String>,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

/// The outcome of a successful signature check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignIn {
    pub fid: u64,
    pub address: Address,
    pub nonce: String,
}

fn malformed(what: impl Into<String>) -> AppError {
    AppError::Decode(format!("sign-in message: {}", what.into()))
}

fn parse_time(field: &str, value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| malformed(format!("{field}: {e}")))
}

impl FromStr for SignInMessage {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut lines = raw.lines();

        let domain = lines
            .next()
            .and_then(|l| l.strip_suffix(HEADER_SUFFIX))
            .filter(|d| !d.is_empty())
            .ok_or_else(|| malformed("missing header"))?
            .to_string();
        let address = lines
            .next()
            .map(str::trim)
            .ok_or_else(|| malformed("missing address"))
            .and_then(|a| Address::from_str(a).map_err(|e| malformed(format!("address: {e}"))))?;

        let mut statement: Vec<&str> = Vec::new();
        let mut uri = None;
        let mut version = None;
        let mut chain_id = None;
        let mut nonce = None;
        let mut issued_at = None;
        let mut expiration_time = None;
        let mut not_before = None;
        let mut request_id = None;
        let mut resources = Vec::new();
        let mut in_resources = false;

        for line in lines {
            if in_resources {
                if let Some(resource) = line.strip_prefix("- ") {
                    resources.push(resource.trim().to_string());
                    continue;
                }
                in_resources = false;
            }
            if line.trim().is_empty() {
                continue;
            }

            if let Some(v) = line.strip_prefix("URI: ") {
                uri = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix("Version: ") {
                version = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix("Chain ID: ") {
                chain_id = Some(
                    v.trim()
                        .parse::<u64>()
                        .map_err(|e| malformed(format!("chain id: {e}")))?,
                );
            } else if let Some(v) = line.strip_prefix("Nonce: ") {
                nonce = Some(v.trim().to_string());
            } else if let Some(v) = line.strip_prefix("Issued At: ") {
                issued_at = Some(parse_time("issued at", v)?);
            } else if let Some(v) = line.strip_prefix("Expiration Time: ") {
                expiration_time = Some(parse_time("expiration time", v)?);
            } else if let Some(v) = line.strip_prefix("Not Before: ") {
                not_before = Some(parse_time("not before", v)?);
            } else if let Some(v) = line.strip_prefix("Request ID: ") {
                request_id = Some(v.trim().to_string());
            } else if line.trim_end() == "Resources:" {
                in_resources = true;
            } else if uri.is_none() {
                // Free text between the address and the fields.
                statement.push(line.trim());
            } else {
                return Err(malformed(format!("unexpected line `{line}`")));
            }
        }

        Ok(Self {
            domain,
            address,
            statement: (!statement.is_empty()).then(|| statement.join("\n")),
            uri: uri.ok_or_else(|| malformed("missing URI"))?,
            version: version.ok_or_else(|| malformed("missing version"))?,
            chain_id: chain_id.ok_or_else(|| malformed("missing chain id"))?,
            nonce: nonce.ok_or_else(|| malformed("missing nonce"))?,
            issued_at: issued_at.ok_or_else(|| malformed("missing issued at"))?,
            expiration_time,
            not_before,
            request_id,
            resources,
        })
    }
}

impl SignInMessage {
    /// The fid claimed through a `farcaster://fid/<n>` resource.
    pub fn fid(&self) -> Option<u64> {
        self.resources
            .iter()
            .find_map(|r| r.strip_prefix(FID_RESOURCE_PREFIX)?.parse().ok())
    }
}

/// Recover the address that personal-signed `message`.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address, AppError> {
    let bytes = hex::decode(signature.trim().trim_start_matches("0x"))
        .map_err(|e| AppError::Auth(format!("signature is not hex: {e}")))?;
    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|e| AppError::Auth(format!("malformed signature: {e}")))?;
    signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| AppError::Auth(format!("signature recovery failed: {e}")))
}

/// Parse and check a signed sign-in message.
///
/// Checks the domain, the validity window, the fid resource and that the
/// signature recovers to the message address. Nonce bookkeeping and the
/// custody-address check are left to the caller.
pub fn verify(
    raw: &str,
    signature: &str,
    expected_domain: &str,
    now: DateTime<Utc>,
) -> Result<VerifiedSignIn, AppError> {
    let message: SignInMessage = raw.parse()?;

    if !message.domain.eq_ignore_ascii_case(expected_domain) {
        return Err(AppError::Auth(format!(
            "message is for domain {}, expected {expected_domain}",
            message.domain
        )));
    }
    if message.expiration_time.is_some_and(|exp| now >= exp) {
        return Err(AppError::Auth("message has expired".into()));
    }
    if message.not_before.is_some_and(|nb| now < nb) {
        return Err(AppError::Auth("message is not valid yet".into()));
    }
    let fid = message
        .fid()
        .ok_or_else(|| AppError::Auth("message carries no fid resource".into()))?;

    let signer = recover_signer(raw, signature)?;
    if signer != message.address {
        return Err(AppError::Auth(format!(
            "signature was made by {signer}, not {}",
            message.address
        )));
    }

    Ok(VerifiedSignIn {
        fid,
        address: signer,
        nonce: message.nonce,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{SignerSync, local::PrivateKeySigner};
    use chrono::TimeZone;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn signer() -> PrivateKeySigner {
        KEY.parse().unwrap()
    }

    fn message(address: Address, extra: &str) -> String {
        format!(
            "tips.example.com wants you to sign in with your Ethereum account:\n\
             {address}\n\
             \n\
             Farcaster Auth\n\
             \n\
             URI: https://tips.example.com/login\n\
             Version: 1\n\
             Chain ID: 10\n\
             Nonce: abcd1234efgh\n\
             Issued At: 2025-04-05T10:00:00.000Z\n\
             {extra}\
             Resources:\n\
             - farcaster://fid/443855"
        )
    }

    fn sign(signer: &PrivateKeySigner, message: &str) -> String {
        let sig = signer.sign_message_sync(message.as_bytes()).unwrap();
        format!("0x{}", hex::encode(sig.as_bytes()))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 5, 10, 5, 0).unwrap()
    }

    #[test]
    fn parses_message_fields() {
        let signer = signer();
        let raw = message(signer.address(), "Expiration Time: 2025-04-05T11:00:00Z\n");
        let parsed: SignInMessage = raw.parse().expect("parse");

        assert_eq!(parsed.domain, "tips.example.com");
        assert_eq!(parsed.address, signer.address());
        assert_eq!(parsed.statement.as_deref(), Some("Farcaster Auth"));
        assert_eq!(parsed.uri, "https://tips.example.com/login");
        assert_eq!(parsed.chain_id, 10);
        assert_eq!(parsed.nonce, "abcd1234efgh");
        assert!(parsed.expiration_time.is_some());
        assert_eq!(parsed.fid(), Some(443855));
    }

    #[test]
    fn rejects_missing_nonce() {
        let raw = message(signer().address(), "").replace("Nonce: abcd1234efgh\n", "");
        assert!(matches!(raw.parse::<SignInMessage>(), Err(AppError::Decode(_))));
    }

    #[test]
    fn verifies_own_signature() {
        let signer = signer();
        let raw = message(signer.address(), "");
        let sig = sign(&signer, &raw);

        let verified = verify(&raw, &sig, "tips.example.com", now()).expect("verify");
        assert_eq!(verified.fid, 443855);
        assert_eq!(verified.address, signer.address());
        assert_eq!(verified.nonce, "abcd1234efgh");
    }

    #[test]
    fn rejects_foreign_signature() {
        let claimed = signer();
        let other: PrivateKeySigner =
            "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
                .parse()
                .unwrap();
        let raw = message(claimed.address(), "");
        let sig = sign(&other, &raw);

        assert!(matches!(
            verify(&raw, &sig, "tips.example.com", now()),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn rejects_wrong_domain_and_expired() {
        let signer = signer();
        let raw = message(signer.address(), "Expiration Time: 2025-04-05T10:01:00Z\n");
        let sig = sign(&signer, &raw);

        assert!(matches!(
            verify(&raw, &sig, "evil.example.com", now()),
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            verify(&raw, &sig, "tips.example.com", now()),
            Err(AppError::Auth(_))
        ));
    }
}
