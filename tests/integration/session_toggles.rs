use codepack::selection::SelectionState;
use codepack::session::PackSession;
use codepack::store::TieredStore;
use codepack::tree::DirectoryTree;
use codepack::NodePath;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::integration::support::{materialize, register, FakeFs, Shape};

const WRITERS: usize = 4;
const TOGGLES_PER_WRITER: usize = 40;

fn naive_indeterminate(state: &SelectionState, tree: &DirectoryTree) -> BTreeSet<NodePath> {
    tree.spans()
        .filter(|(_, is_directory, _)| *is_directory)
        .filter(|(id, _, _)| {
            let leaves: Vec<&NodePath> = tree.leaf_descendants(id).unwrap().collect();
            let checked = leaves.iter().filter(|l| state.is_checked(l)).count();
            checked > 0 && checked < leaves.len()
        })
        .map(|(id, _, _)| id.clone())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_match_a_replay_in_commit_order() {
    let root = materialize(
        &Shape::Dir(vec![
            Shape::Dir(vec![
                Shape::File,
                Shape::Dir(vec![Shape::File, Shape::File]),
                Shape::File,
            ]),
            Shape::File,
            Shape::Dir(vec![Shape::File, Shape::File]),
        ]),
        PathBuf::from("/s"),
    );
    let mut fs = FakeFs::default();
    register(&mut fs, &root);

    let session = Arc::new(PackSession::new(
        Arc::new(fs),
        Arc::new(TieredStore::in_memory(1024)),
    ));
    let tree = session.load_root(Path::new("/s")).await.unwrap().tree;
    let nodes: Vec<NodePath> = tree.preorder().cloned().collect();
    let mut changes = session.subscribe().await;

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let session = Arc::clone(&session);
        let tree = Arc::clone(&tree);
        let done = Arc::clone(&done);
        tokio::spawn(async move {
            let mut last_revision = 0;
            while !done.load(Ordering::Acquire) {
                let snapshot = session.snapshot().await;
                assert!(snapshot.revision >= last_revision);
                last_revision = snapshot.revision;
                assert_eq!(
                    snapshot.indeterminate,
                    naive_indeterminate(&snapshot.selection, &tree)
                );
                tokio::task::yield_now().await;
            }
        })
    };

    let mut writers = Vec::new();
    for w in 0..WRITERS {
        let session = Arc::clone(&session);
        let nodes = nodes.clone();
        writers.push(tokio::spawn(async move {
            for i in 0..TOGGLES_PER_WRITER {
                let target = &nodes[(w * 3 + i * (w + 1)) % nodes.len()];
                session.toggle(target).await.unwrap();
                tokio::task::yield_now().await;
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }
    done.store(true, Ordering::Release);
    reader.await.unwrap();

    let mut committed = Vec::new();
    while let Ok(change) = changes.try_recv() {
        committed.push(change);
    }
    assert_eq!(committed.len(), WRITERS * TOGGLES_PER_WRITER);

    let mut replay = SelectionState::new();
    for (i, change) in committed.iter().enumerate() {
        assert_eq!(change.revision, i as u64 + 1);
        replay = replay.toggle(&change.path, &tree).unwrap();
        assert_eq!(replay.check_state(&change.path, &tree), Some(change.state));
    }

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.revision, committed.len() as u64);
    assert_eq!(snapshot.selection, replay);
    assert_eq!(snapshot.flattened, replay.flatten(&tree));
    assert_eq!(snapshot.indeterminate, replay.indeterminate(&tree));
}
