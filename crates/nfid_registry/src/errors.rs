//! Error types for the NFID registry

use nfid_types::{Address, Nfid};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid address: {address}")]
    InvalidAddress { address: Address },

    #[error("NFID 0 is reserved as the empty lookup value")]
    ZeroIdentity,

    #[error("Address {address} already holds NFID {active}")]
    AlreadyMinted { address: Address, active: Nfid },

    #[error("Address {address} holds no NFID")]
    NotMinted { address: Address },

    #[error("Address {address} holds NFID {active}, not {expected}")]
    Mismatch {
        address: Address,
        expected: Nfid,
        active: Nfid,
    },
}

impl RegistryError {
    /// Stable snake_case code for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::InvalidAddress { .. } => "invalid_address",
            RegistryError::ZeroIdentity => "zero_identity",
            RegistryError::AlreadyMinted { .. } => "already_minted",
            RegistryError::NotMinted { .. } => "not_minted",
            RegistryError::Mismatch { .. } => "mismatch",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
