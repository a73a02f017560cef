//! Policy and outcome types for the NFID registry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use nfid_types::Nfid;

/// What `mint` does when the address already holds an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemintPolicy {
    /// Fail with `AlreadyMinted` and leave the active identity in place.
    #[default]
    Reject,
    /// Replace the active identity with the new value.
    Overwrite,
}

/// What `burn` does when there is nothing matching to burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnPolicy {
    /// Report the miss in the returned outcome; never an error.
    #[default]
    Lenient,
    /// Fail with `NotMinted` or `Mismatch`.
    Strict,
}

impl FromStr for RemintPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(RemintPolicy::Reject),
            "overwrite" => Ok(RemintPolicy::Overwrite),
            other => Err(format!(
                "unknown re-mint policy '{other}' (expected 'reject' or 'overwrite')"
            )),
        }
    }
}

impl FromStr for BurnPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(BurnPolicy::Lenient),
            "strict" => Ok(BurnPolicy::Strict),
            other => Err(format!(
                "unknown burn policy '{other}' (expected 'lenient' or 'strict')"
            )),
        }
    }
}

impl fmt::Display for RemintPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RemintPolicy::Reject => "reject",
            RemintPolicy::Overwrite => "overwrite",
        };
        f.write_str(value)
    }
}

impl fmt::Display for BurnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            BurnPolicy::Lenient => "lenient",
            BurnPolicy::Strict => "strict",
        };
        f.write_str(value)
    }
}

/// Default number of events retained by the journal.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Behaviour knobs for the paths the base contract leaves open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryPolicy {
    pub remint: RemintPolicy,
    pub burn: BurnPolicy,
    /// Accept `0` as a mintable value. When minted, `find_nfid` cannot tell
    /// it apart from "no identity"; `check_nfid` and `find` still can.
    pub allow_zero_id: bool,
    /// Events kept in memory. `0` keeps none but sequence numbers still advance.
    pub event_capacity: usize,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            remint: RemintPolicy::Reject,
            burn: BurnPolicy::Lenient,
            allow_zero_id: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Result of a successful mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MintOutcome {
    Minted,
    Replaced { previous: Nfid },
}

/// Result of a burn that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BurnOutcome {
    Burned,
    /// Nothing was active; state unchanged.
    NotMinted,
    /// A different identity is active and was kept.
    Mismatch { active: Nfid },
}

impl BurnOutcome {
    pub fn is_burned(&self) -> bool {
        matches!(self, BurnOutcome::Burned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_strings_parse() {
        assert_eq!("Reject".parse::<RemintPolicy>().unwrap(), RemintPolicy::Reject);
        assert_eq!(" overwrite ".parse::<RemintPolicy>().unwrap(), RemintPolicy::Overwrite);
        assert_eq!("strict".parse::<BurnPolicy>().unwrap(), BurnPolicy::Strict);
        assert!("replace".parse::<RemintPolicy>().is_err());
        assert!("panic".parse::<BurnPolicy>().is_err());
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: RegistryPolicy = serde_json::from_str(r#"{"remint":"overwrite"}"#).unwrap();
        assert_eq!(policy.remint, RemintPolicy::Overwrite);
        assert_eq!(policy.burn, BurnPolicy::Lenient);
        assert!(policy.allow_zero_id);
        assert_eq!(policy.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn outcomes_serialize_tagged() {
        let json = serde_json::to_value(MintOutcome::Replaced {
            previous: Nfid::new(7),
        })
        .unwrap();
        assert_eq!(json["outcome"], "replaced");
        assert_eq!(json["previous"], 7);

        let json = serde_json::to_value(BurnOutcome::NotMinted).unwrap();
        assert_eq!(json["outcome"], "not_minted");
    }
}
