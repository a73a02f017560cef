use nfid_registry::{Address, BurnOutcome, Nfid, NfidRegistry};
use proptest::prelude::*;
use std::collections::HashMap;

// Property-based tests for the registry state machine.
// A plain HashMap model is driven alongside the registry and compared after
// every step.

#[derive(Debug, Clone)]
enum Op {
    Mint(Address, Nfid),
    Burn(Address, Nfid),
}

fn arbitrary_address() -> impl Strategy<Value = Address> {
    prop::array::uniform20(any::<u8>())
        .prop_filter("zero address is rejected", |bytes| bytes != &[0u8; 20])
        .prop_map(Address::new)
}

fn small_address() -> impl Strategy<Value = Address> {
    // Few distinct keys so sequences actually revisit addresses.
    (1u8..=4).prop_map(|byte| Address::new([byte; 20]))
}

fn arbitrary_nfid() -> impl Strategy<Value = Nfid> {
    (1u64..=(1u64 << 53)).prop_map(Nfid::new)
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (small_address(), 1u64..=3).prop_map(|(a, n)| Op::Mint(a, Nfid::new(n))),
        (small_address(), 1u64..=3).prop_map(|(a, n)| Op::Burn(a, Nfid::new(n))),
    ]
}

proptest! {
    #[test]
    fn never_minted_address_is_empty(address in arbitrary_address(), nfid in any::<u64>()) {
        let registry = NfidRegistry::with_defaults();

        prop_assert!(!registry.check_nfid(&address));
        prop_assert_eq!(registry.find_nfid(&address), 0);
        prop_assert!(!registry.address_associated_nfid(&address, Nfid::new(nfid)));
    }
}

proptest! {
    #[test]
    fn mint_establishes_exact_association(
        address in arbitrary_address(),
        nfid in arbitrary_nfid(),
        other in arbitrary_nfid(),
    ) {
        let registry = NfidRegistry::with_defaults();
        registry.mint(&address, nfid).unwrap();

        prop_assert!(registry.check_nfid(&address));
        prop_assert_eq!(registry.find_nfid(&address), nfid.value());
        prop_assert!(registry.address_associated_nfid(&address, nfid));
        prop_assert_eq!(registry.address_associated_nfid(&address, other), other == nfid);
    }
}

proptest! {
    #[test]
    fn mint_then_burn_restores_empty_state(address in arbitrary_address(), nfid in arbitrary_nfid()) {
        let registry = NfidRegistry::with_defaults();
        let empty_root = registry.state_root();

        registry.mint(&address, nfid).unwrap();
        prop_assert_eq!(registry.burn(&address, nfid).unwrap(), BurnOutcome::Burned);

        prop_assert!(!registry.check_nfid(&address));
        prop_assert_eq!(registry.find_nfid(&address), 0);
        prop_assert_eq!(registry.state_root(), empty_root);
    }
}

proptest! {
    #[test]
    fn minting_is_isolated_per_address(
        a in arbitrary_address(),
        b in arbitrary_address(),
        nfid in arbitrary_nfid(),
    ) {
        prop_assume!(a != b);
        let registry = NfidRegistry::with_defaults();

        registry.mint(&a, nfid).unwrap();

        prop_assert!(!registry.check_nfid(&b));
        prop_assert_eq!(registry.find_nfid(&b), 0);
        prop_assert_eq!(registry.active_count(), 1);
    }
}

proptest! {
    #[test]
    fn registry_matches_model(ops in prop::collection::vec(arbitrary_op(), 1..64)) {
        let registry = NfidRegistry::with_defaults();
        let mut model: HashMap<Address, Nfid> = HashMap::new();
        let mut transitions = 0u64;

        for op in ops {
            match op {
                Op::Mint(address, nfid) => {
                    let result = registry.mint(&address, nfid);
                    if model.contains_key(&address) {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(address, nfid);
                        transitions += 1;
                    }
                }
                Op::Burn(address, nfid) => {
                    let outcome = registry.burn(&address, nfid).unwrap();
                    if model.get(&address) == Some(&nfid) {
                        prop_assert_eq!(outcome, BurnOutcome::Burned);
                        model.remove(&address);
                        transitions += 1;
                    } else {
                        prop_assert!(!outcome.is_burned());
                    }
                }
            }

            for byte in 1u8..=4 {
                let address = Address::new([byte; 20]);
                prop_assert_eq!(registry.find(&address), model.get(&address).copied());
            }
        }

        prop_assert_eq!(registry.active_count(), model.len());
        prop_assert_eq!(registry.last_event_seq(), transitions);
    }
}
