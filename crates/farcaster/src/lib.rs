pub mod abi;
pub mod association;
pub mod client;
pub mod models;
pub mod search;
pub mod siwf;

pub use abi::{MintTransaction, NftCollection};
pub use client::NeynarClient;
pub use models::{Cast, User};
pub use search::{CastSource, SearchPage, collect_casts};
pub use siwf::{SignInMessage, VerifiedSignIn};
