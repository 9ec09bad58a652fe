//! Property-based crash tests for the credential store.
//!
//! Random mutation sequences run against fault-injecting storage. After
//! every step the in-memory set, a reference model and a freshly loaded
//! store must all agree: a failed persist leaves the old set everywhere,
//! a successful one leaves the new set everywhere.

use latchkey_core::{Credential, CredentialId};
use latchkey_storage::{CredentialStore, MemoryStorage, StorageBackend, StorageError, snapshot};
use proptest::prelude::*;
use std::collections::BTreeMap;

const CANONICAL: &str = "cards.dat";
const STAGING: &str = "cards.tmp";

#[derive(Debug, Clone)]
enum Op {
    Upsert(u32, bool),
    Remove(u32),
    SetEnabled(u32, bool),
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    None,
    Write,
    Sync,
    Rename,
    Tear(usize),
}

fn op() -> impl Strategy<Value = Op> {
    // A small id space so removes and toggles hit existing records.
    prop_oneof![
        (0u32..8, any::<bool>()).prop_map(|(id, enabled)| Op::Upsert(id, enabled)),
        (0u32..8).prop_map(Op::Remove),
        (0u32..8, any::<bool>()).prop_map(|(id, enabled)| Op::SetEnabled(id, enabled)),
    ]
}

fn fault() -> impl Strategy<Value = Fault> {
    prop_oneof![
        3 => Just(Fault::None),
        1 => Just(Fault::Write),
        1 => Just(Fault::Sync),
        1 => Just(Fault::Rename),
        1 => (0usize..64).prop_map(Fault::Tear),
    ]
}

type Model = BTreeMap<u32, bool>;

fn persists(op: &Op, model: &Model) -> bool {
    match op {
        Op::Upsert(..) => true,
        Op::Remove(id) | Op::SetEnabled(id, _) => model.contains_key(id),
    }
}

fn apply_to_model(op: &Op, model: &mut Model) {
    match *op {
        Op::Upsert(id, enabled) => {
            model.insert(id, enabled);
        }
        Op::Remove(id) => {
            model.remove(&id);
        }
        Op::SetEnabled(id, enabled) => {
            if let Some(flag) = model.get_mut(&id) {
                *flag = enabled;
            }
        }
    }
}

fn apply_to_store(
    op: &Op,
    store: &mut CredentialStore<MemoryStorage>,
) -> Result<(), StorageError> {
    match *op {
        Op::Upsert(id, enabled) => store
            .upsert(Credential::new(CredentialId::new(id)).with_enabled(enabled))
            .map(drop),
        Op::Remove(id) => store.remove(CredentialId::new(id)).map(drop),
        Op::SetEnabled(id, enabled) => store
            .set_enabled(CredentialId::new(id), enabled)
            .map(drop),
    }
}

fn arm(storage: &MemoryStorage, fault: Fault) {
    match fault {
        Fault::None => {}
        Fault::Write => storage.fail_next_write(),
        Fault::Sync => storage.fail_next_sync(),
        Fault::Rename => storage.fail_next_rename(),
        Fault::Tear(n) => storage.tear_next_write(n),
    }
}

fn contents(store: &CredentialStore<MemoryStorage>) -> Model {
    store
        .iter()
        .map(|c| (c.id().as_u32(), c.is_enabled()))
        .collect()
}

proptest! {
    /// Property: memory, model and a reload agree after every step,
    /// whichever persist stage fails.
    #[test]
    fn prop_store_survives_faults(steps in prop::collection::vec((op(), fault()), 1..24)) {
        let storage = MemoryStorage::new();
        let mut store = CredentialStore::load(storage.clone(), CANONICAL, STAGING).unwrap();
        let mut model = Model::new();

        for (op, fault) in &steps {
            let armed = persists(op, &model) && !matches!(fault, Fault::None);
            if armed {
                arm(&storage, *fault);
            }

            let result = apply_to_store(op, &mut store);
            prop_assert_eq!(result.is_err(), armed, "op {:?} fault {:?}", op, fault);
            if result.is_ok() {
                apply_to_model(op, &mut model);
            }

            prop_assert_eq!(&contents(&store), &model);
            prop_assert!(!storage.exists(STAGING).unwrap());

            let reloaded = CredentialStore::load(storage.clone(), CANONICAL, STAGING).unwrap();
            prop_assert_eq!(&contents(&reloaded), &model);
        }
    }

    /// Property: a power cut that leaves any prefix of a new snapshot in
    /// the staging file never changes what a reboot loads.
    #[test]
    fn prop_torn_staging_next_to_canonical_is_ignored(
        before in prop::collection::btree_map(0u32..64, any::<bool>(), 0..8),
        after in prop::collection::btree_map(0u32..64, any::<bool>(), 0..8),
        cut in 0usize..256,
    ) {
        let storage = MemoryStorage::new();
        let mut store = CredentialStore::load(storage.clone(), CANONICAL, STAGING).unwrap();
        for (&id, &enabled) in &before {
            store
                .upsert(Credential::new(CredentialId::new(id)).with_enabled(enabled))
                .unwrap();
        }
        // Canonical only exists once something has been written.
        prop_assume!(!before.is_empty());

        let next: Vec<Credential> = after
            .iter()
            .map(|(&id, &enabled)| Credential::new(CredentialId::new(id)).with_enabled(enabled))
            .collect();
        let bytes = snapshot::encode(next.iter());
        storage.insert(STAGING, bytes[..cut.min(bytes.len())].to_vec());

        let reloaded = CredentialStore::load(storage.clone(), CANONICAL, STAGING).unwrap();
        prop_assert_eq!(&contents(&reloaded), &before);
        prop_assert!(!storage.exists(STAGING).unwrap());
    }
}

#[test]
fn test_interrupted_first_write_loads_empty() {
    let storage = MemoryStorage::new();
    let credentials = [Credential::new(CredentialId::new(1))];
    let bytes = snapshot::encode(credentials.iter());
    storage.insert(STAGING, bytes[..bytes.len() / 2].to_vec());

    let store = CredentialStore::load(storage.clone(), CANONICAL, STAGING).unwrap();
    assert!(store.is_empty());
    assert!(storage.names().is_empty());
}
