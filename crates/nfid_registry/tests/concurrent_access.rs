//! Shared-registry tests: many threads minting and burning through one `Arc`.

use nfid_registry::{Address, Nfid, NfidRegistry, RegistryEventKind};
use std::sync::Arc;
use std::thread;

fn addr(n: u16) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x01;
    bytes[18..].copy_from_slice(&n.to_be_bytes());
    Address::new(bytes)
}

#[test]
fn racing_mints_admit_exactly_one_winner() {
    let registry = Arc::new(NfidRegistry::with_defaults());
    let address = addr(1);

    let handles: Vec<_> = (1..=16u64)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.mint(&address, Nfid::new(n)).is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert!(registry.check_nfid(&address));
    assert_eq!(registry.last_event_seq(), 1);
}

#[test]
fn disjoint_addresses_do_not_interfere() {
    let registry = Arc::new(NfidRegistry::with_defaults());

    thread::scope(|scope| {
        for worker in 0..8u16 {
            let registry = Arc::clone(&registry);
            scope.spawn(move || {
                for i in 0..50u16 {
                    let address = addr(worker * 100 + i);
                    let nfid = Nfid::new(u64::from(worker) * 1_000 + u64::from(i) + 1);
                    registry.mint(&address, nfid).unwrap();
                    if i % 2 == 0 {
                        assert!(registry.burn(&address, nfid).unwrap().is_burned());
                    }
                }
            });
        }
    });

    assert_eq!(registry.active_count(), 8 * 25);
    assert_eq!(registry.last_event_seq(), 8 * 75);

    // Journal order must agree with the final state.
    let events = registry.events_since(0);
    let seqs: Vec<u64> = events.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[1] == w[0] + 1));
    for event in &events {
        if let RegistryEventKind::Burned { address, .. } = &event.kind {
            assert!(!registry.check_nfid(address));
        }
    }
}
