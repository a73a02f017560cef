//! NFID Identity Registry
//!
//! Associates an account address with at most one active numeric identity
//! token (NFID). Identities are issued with `mint`, revoked with `burn`, and
//! queried with `check_nfid`, `find_nfid` and `address_associated_nfid`.
//!
//! The registry is an explicitly constructed, in-memory store. Callers that
//! need to share it across tasks wrap it in an `Arc`.

pub mod errors;
pub mod events;
pub mod registry;
pub mod types;

pub use errors::*;
pub use events::{RegistryEvent, RegistryEventKind};
pub use registry::NfidRegistry;
pub use types::*;

pub use nfid_types::{Address, Nfid, NO_NFID};
