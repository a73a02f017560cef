//! HTTP/JSON execution context for the NFID registry.
//!
//! Parses textual addresses at the boundary and hands typed values to the
//! shared [`nfid_registry::NfidRegistry`].

pub mod nfid;
pub mod server;

pub use nfid::{
    AssociatedResponse, BurnResponse, CheckResponse, EventsResponse, FindResponse, MintResponse,
    NfidRequest,
};
pub use server::{build_router, start_server, AppState, DEFAULT_REQUEST_TIMEOUT};
