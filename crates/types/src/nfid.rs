use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Value returned by outward lookups when an address holds no identity.
pub const NO_NFID: u64 = 0;

/// Numeric identity token held by an address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Nfid(pub u64);

impl Nfid {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == NO_NFID
    }

    /// Collapse an optional identity to the sentinel form used by lookups.
    pub fn or_sentinel(value: Option<Nfid>) -> u64 {
        value.map(|nfid| nfid.0).unwrap_or(NO_NFID)
    }
}

impl fmt::Display for Nfid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Nfid {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Nfid)
    }
}
