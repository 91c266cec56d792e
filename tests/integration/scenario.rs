use codepack::collaborator::LocalFs;
use codepack::session::{PackSession, SessionOptions};
use codepack::store::{StorageTier, TieredStore};
use codepack::CheckState;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn proj_scenario_end_to_end() {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap().join("proj");
    fs::create_dir_all(root.join("vendor")).unwrap();
    fs::write(root.join("a.ts"), "export const a = 1;\n").unwrap();
    fs::write(root.join("img.png"), [0x89u8, b'P', b'N', b'G']).unwrap();
    fs::write(root.join("vendor/x.ts"), "export const x = 1;\n").unwrap();

    let store = Arc::new(TieredStore::open(&temp.path().join("store"), 32).unwrap());
    let session = PackSession::with_options(
        Arc::new(LocalFs::new()),
        Arc::clone(&store),
        SessionOptions::default(),
    );

    let loaded = session.load_root(&root).await.unwrap();
    let ids: Vec<_> = loaded.tree.preorder().cloned().collect();
    assert_eq!(ids, vec![root.clone(), root.join("a.ts"), root.join("img.png")]);

    assert_eq!(session.toggle(&root).await.unwrap(), CheckState::Checked);
    assert_eq!(
        session.flatten().await,
        vec![root.join("a.ts"), root.join("img.png")]
    );

    let artifact = session.concatenate().await.unwrap();
    assert_eq!(artifact.table_of_contents, vec![root.join("a.ts")]);
    assert_eq!(artifact.sections.len(), 1);
    assert_eq!(
        artifact.render(),
        "## Table of Contents\n\n- a.ts\n\n---\n\n\
         ## File: a.ts\n\n```typescript\nexport const a = 1;\n\n```\n\n"
    );

    // Over the 32-byte threshold, so it goes through the bulk tier
    let record = session.persist_artifact(&artifact).await.unwrap();
    assert_eq!(record.tier, StorageTier::Bulk);
    assert_eq!(session.load_artifact().await.unwrap(), Some(artifact.render()));
}
