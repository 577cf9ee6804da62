//! Property test: over arbitrary operation sequences, named titles stay
//! unique and the persisted index always mirrors the in-memory store.

use std::collections::HashSet;

use proptest::prelude::*;

use quill::testing::{MemoryFilesystem, MemoryIndex};
use quill::{DocumentStore, WorkspaceConfig};

#[derive(Debug, Clone)]
enum Op {
    Create,
    Rename { target: usize, title: usize },
    Delete { target: usize },
    Save { target: usize },
}

const TITLES: &[&str] = &["Alpha", "Beta", "Gamma", "Delta"];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Create),
        4 => (any::<usize>(), 0..TITLES.len()).prop_map(|(target, title)| Op::Rename { target, title }),
        2 => any::<usize>().prop_map(|target| Op::Delete { target }),
        2 => any::<usize>().prop_map(|target| Op::Save { target }),
    ]
}

/// Pick an existing id deterministically from an arbitrary index.
fn pick(store: &DocumentStore, raw: usize) -> Option<String> {
    let mut ids: Vec<_> = store.documents().map(|d| d.id.clone()).collect();
    if ids.is_empty() {
        return None;
    }
    ids.sort();
    Some(ids[raw % ids.len()].clone())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn titles_stay_unique_and_index_mirrors_store(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        rt.block_on(async move {
            let fs = MemoryFilesystem::new();
            let index = MemoryIndex::new();
            let mut store = DocumentStore::load(&WorkspaceConfig::new("/notes"), fs, index.clone())
                .await
                .unwrap();

            for op in ops {
                match op {
                    Op::Create => {
                        store.create();
                    }
                    Op::Rename { target, title } => {
                        if let Some(id) = pick(&store, target) {
                            // Collisions are expected; they must reject
                            // without changing anything, which the
                            // invariant checks below confirm.
                            let _ = store.rename(&id, TITLES[title]).await;
                        }
                    }
                    Op::Delete { target } => {
                        if let Some(id) = pick(&store, target) {
                            store.delete(&id).await.unwrap();
                        }
                    }
                    Op::Save { target } => {
                        if let Some(id) = pick(&store, target) {
                            // Never-named documents refuse to save; that is
                            // part of the contract, not a failure.
                            let _ = store.save(&id).await;
                        }
                    }
                }

                // No two live documents share a (non-empty) title.
                let mut seen = HashSet::new();
                for doc in store.documents() {
                    if !doc.title.is_empty() {
                        prop_assert!(
                            seen.insert(doc.title.clone()),
                            "duplicate title {:?}",
                            doc.title
                        );
                    }
                }

                // The index holds exactly the saved documents' metadata.
                let snapshot = index.snapshot().await;
                let expected: HashSet<_> = store
                    .documents()
                    .filter_map(|d| d.meta())
                    .map(|m| (m.id.clone(), m.title.clone()))
                    .collect();
                let actual: HashSet<_> = snapshot
                    .values()
                    .map(|m| (m.id.clone(), m.title.clone()))
                    .collect();
                prop_assert_eq!(expected, actual);
            }
            Ok(())
        })?;
    }
}
