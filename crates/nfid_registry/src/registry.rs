//! NFID registry implementation
//!
//! Maps each account address to at most one active identity token and
//! records every transition in an ordered journal.

use crate::errors::*;
use crate::events::{EventJournal, RegistryEvent, RegistryEventKind};
use crate::types::*;
use nfid_types::{Address, Nfid};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, warn};

const STATE_ROOT_DOMAIN: &[u8] = b"NFID_REGISTRY_STATE";

/// NFID Registry
///
/// Owns the address → identity mapping. Mutations hold the write lock for the
/// whole check-and-update step so every mint or burn is observed atomically.
#[derive(Debug)]
pub struct NfidRegistry {
    state: RwLock<RegistryState>,
    policy: RegistryPolicy,
}

#[derive(Debug)]
struct RegistryState {
    /// Address → active identity. Absent key means no identity.
    entries: HashMap<Address, Nfid>,
    journal: EventJournal,
}

impl NfidRegistry {
    /// Create an empty registry governed by `policy`
    pub fn new(policy: RegistryPolicy) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                entries: HashMap::new(),
                journal: EventJournal::new(policy.event_capacity),
            }),
            policy,
        }
    }

    /// Create an empty registry with the default policy
    pub fn with_defaults() -> Self {
        Self::new(RegistryPolicy::default())
    }

    /// Make `nfid` the active identity of `address`
    pub fn mint(&self, address: &Address, nfid: Nfid) -> Result<MintOutcome> {
        self.ensure_address(address)?;

        if nfid.is_zero() && !self.policy.allow_zero_id {
            metrics::counter!("nfid_rejected_total").increment(1);
            warn!(%address, "Rejected mint of reserved NFID 0");
            return Err(RegistryError::ZeroIdentity);
        }

        let mut state = self.state.write();

        let outcome = match state.entries.get(address).copied() {
            None => MintOutcome::Minted,
            Some(active) => match self.policy.remint {
                RemintPolicy::Reject => {
                    metrics::counter!("nfid_rejected_total").increment(1);
                    warn!(%address, %active, requested = %nfid, "Rejected mint over active NFID");
                    return Err(RegistryError::AlreadyMinted {
                        address: *address,
                        active,
                    });
                }
                RemintPolicy::Overwrite => MintOutcome::Replaced { previous: active },
            },
        };

        state.entries.insert(*address, nfid);
        let kind = match outcome {
            MintOutcome::Minted => RegistryEventKind::Minted {
                address: *address,
                nfid,
            },
            MintOutcome::Replaced { previous } => RegistryEventKind::Replaced {
                address: *address,
                previous,
                nfid,
            },
        };
        let seq = state.journal.record(kind);
        // Published under the lock so gauge updates follow mutation order.
        metrics::gauge!("nfid_active_identities").set(state.entries.len() as f64);
        drop(state);

        metrics::counter!("nfid_mint_total").increment(1);
        info!(%address, %nfid, seq, ?outcome, "Minted NFID");

        Ok(outcome)
    }

    /// Revoke `nfid` from `address` if it is the active identity
    pub fn burn(&self, address: &Address, nfid: Nfid) -> Result<BurnOutcome> {
        self.ensure_address(address)?;

        let mut state = self.state.write();

        match state.entries.get(address).copied() {
            Some(active) if active == nfid => {
                state.entries.remove(address);
                let seq = state.journal.record(RegistryEventKind::Burned {
                    address: *address,
                    nfid,
                });
                metrics::gauge!("nfid_active_identities").set(state.entries.len() as f64);
                drop(state);

                metrics::counter!("nfid_burn_total").increment(1);
                info!(%address, %nfid, seq, "Burned NFID");

                Ok(BurnOutcome::Burned)
            }
            Some(active) => {
                drop(state);
                debug!(%address, %active, requested = %nfid, "Burn does not match active NFID");
                match self.policy.burn {
                    BurnPolicy::Lenient => Ok(BurnOutcome::Mismatch { active }),
                    BurnPolicy::Strict => {
                        metrics::counter!("nfid_rejected_total").increment(1);
                        Err(RegistryError::Mismatch {
                            address: *address,
                            expected: nfid,
                            active,
                        })
                    }
                }
            }
            None => {
                drop(state);
                debug!(%address, requested = %nfid, "Burn of address without NFID");
                match self.policy.burn {
                    BurnPolicy::Lenient => Ok(BurnOutcome::NotMinted),
                    BurnPolicy::Strict => {
                        metrics::counter!("nfid_rejected_total").increment(1);
                        Err(RegistryError::NotMinted { address: *address })
                    }
                }
            }
        }
    }

    /// Whether `address` currently holds an identity
    pub fn check_nfid(&self, address: &Address) -> bool {
        self.state.read().entries.contains_key(address)
    }

    /// Active identity of `address`, if any
    pub fn find(&self, address: &Address) -> Option<Nfid> {
        self.state.read().entries.get(address).copied()
    }

    /// Active identity value of `address`, or `0` when it has none.
    ///
    /// A registry that allows minting `0` makes this ambiguous; use
    /// [`NfidRegistry::find`] or [`NfidRegistry::check_nfid`] to tell the
    /// two apart.
    pub fn find_nfid(&self, address: &Address) -> u64 {
        Nfid::or_sentinel(self.find(address))
    }

    /// Whether `nfid` is exactly the active identity of `address`
    pub fn address_associated_nfid(&self, address: &Address, nfid: Nfid) -> bool {
        self.find(address) == Some(nfid)
    }

    /// Number of addresses holding an identity
    pub fn active_count(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Active entries ordered by address
    pub fn snapshot(&self) -> Vec<(Address, Nfid)> {
        let mut entries: Vec<(Address, Nfid)> = self
            .state
            .read()
            .entries
            .iter()
            .map(|(address, nfid)| (*address, *nfid))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Deterministic commitment over the active entries.
    ///
    /// Equal observable state gives an equal root regardless of the history
    /// that produced it.
    pub fn state_root(&self) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(STATE_ROOT_DOMAIN);
        for (address, nfid) in self.snapshot() {
            h.update(address.as_bytes());
            h.update(nfid.value().to_be_bytes());
        }
        h.finalize().into()
    }

    /// Journal entries with a sequence number greater than `seq`
    pub fn events_since(&self, seq: u64) -> Vec<RegistryEvent> {
        self.state.read().journal.since(seq)
    }

    /// Sequence number of the latest transition (0 before any)
    pub fn last_event_seq(&self) -> u64 {
        self.state.read().journal.last_seq()
    }

    fn ensure_address(&self, address: &Address) -> Result<()> {
        if address.is_zero() {
            metrics::counter!("nfid_rejected_total").increment(1);
            warn!("Rejected operation on the zero address");
            return Err(RegistryError::InvalidAddress { address: *address });
        }
        Ok(())
    }
}
