use std::str::FromStr;

use alloy::primitives::Address;
use alloy::sol;
use alloy::sol_types::SolCall;
use serde::Serialize;
use tipstats_core::AppError;

// ─── Frame NFT ──────────────────────────────────────────────────────────────
// Both collections expose the same argument-less public mint.
sol! {
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    contract FrameNft {
        function mint() external;
    }
}

/// The two collections the frame can mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NftCollection {
    /// OG pass, worth 150 allowance per token.
    Og,
    /// Allowance pass, worth 30 allowance per token.
    Allowance,
}

impl FromStr for NftCollection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "og" => Ok(Self::Og),
            "allowance" => Ok(Self::Allowance),
            other => Err(AppError::NotFound(format!("unknown collection `{other}`"))),
        }
    }
}

/// An unsigned transaction request for the client's wallet to submit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MintTransaction {
    pub to: String,
    pub data: String,
    pub value: String,
    pub chain_id: u64,
}

impl MintTransaction {
    /// Build the `mint()` call against `contract`.
    pub fn new(contract: &str, chain_id: u64) -> Result<Self, AppError> {
        let to = Address::from_str(contract)
            .map_err(|e| AppError::Config(format!("invalid contract address {contract}: {e}")))?;
        let data = FrameNft::mintCall {}.abi_encode();

        Ok(Self {
            to: to.to_checksum(None),
            data: format!("0x{}", hex::encode(data)),
            value: "0x0".into(),
            chain_id,
        })
    }
}
