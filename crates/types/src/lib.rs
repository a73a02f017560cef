pub mod address;
pub mod nfid;

pub use address::*;
pub use nfid::*;
