//! Account association for the frame manifest.
//!
//! The owner's custody key signs `<header>.<payload>`, where the header is
//! base64 JSON naming the fid and key and the payload is base64url JSON
//! naming the frame's domain.

use alloy::signers::{
    SignerSync,
    local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use serde::Serialize;
use tipstats_core::{AccountAssociation, AppError};

#[derive(Serialize)]
struct Header {
    fid: u64,
    #[serde(rename = "type")]
    kind: &'static str,
    key: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    domain: &'a str,
}

/// First account derived from a BIP-39 phrase (`m/44'/60'/0'/0/0`).
pub fn signer_from_mnemonic(phrase: &str) -> Result<PrivateKeySigner, AppError> {
    MnemonicBuilder::<English>::default()
        .phrase(phrase.trim())
        .build()
        .map_err(|e| AppError::Config(format!("invalid seed phrase: {e}")))
}

fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, AppError> {
    serde_json::to_vec(value).map_err(|e| AppError::Other(e.into()))
}

/// Sign a custody association binding `fid` to `domain`.
pub fn sign_association(
    signer: &PrivateKeySigner,
    fid: u64,
    domain: &str,
) -> Result<AccountAssociation, AppError> {
    let header = STANDARD.encode(encode_json(&Header {
        fid,
        kind: "custody",
        key: signer.address().to_checksum(None),
    })?);
    let payload = URL_SAFE_NO_PAD.encode(encode_json(&Payload { domain })?);

    let signature = signer
        .sign_message_sync(format!("{header}.{payload}").as_bytes())
        .map_err(|e| AppError::Auth(format!("failed to sign account association: {e}")))?;

    Ok(AccountAssociation {
        header,
        payload,
        signature: URL_SAFE_NO_PAD.encode(signature.as_bytes()),
    })
}
