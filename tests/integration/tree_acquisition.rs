use codepack::classify::has_excluded_segment;
use codepack::collaborator::{DirectoryEntry, LocalFs};
use codepack::tree::{BuilderConfig, DirectoryTreeBuilder, TreeNode};
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::support::{materialize, register, FakeFs, Shape};

fn builder(fs: FakeFs, listing_concurrency: usize) -> DirectoryTreeBuilder<FakeFs> {
    DirectoryTreeBuilder::new(Arc::new(fs)).with_config(BuilderConfig {
        listing_concurrency,
        ..BuilderConfig::default()
    })
}

#[tokio::test(start_paused = true)]
async fn tree_shape_does_not_depend_on_listing_timing() {
    let root = materialize(
        &Shape::Dir(vec![
            Shape::Dir(vec![Shape::File, Shape::Dir(vec![Shape::File])]),
            Shape::File,
            Shape::Dir(vec![Shape::File, Shape::File]),
        ]),
        PathBuf::from("/w"),
    );
    let mut fast_first = FakeFs::default();
    register(&mut fast_first, &root);
    let slow_first = fast_first
        .clone()
        .delay("/w/n0", 40)
        .delay("/w/n0/n1", 5)
        .delay("/w/n2", 1);

    let sequential = builder(fast_first, 1).build(Path::new("/w")).await.unwrap();
    let concurrent = builder(slow_first, 8).build(Path::new("/w")).await.unwrap();

    assert_eq!(sequential.tree.root(), &root);
    assert_eq!(concurrent.tree.root(), &root);
}

#[tokio::test]
async fn local_tree_prunes_excluded_directories_and_keeps_binaries() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("proj");
    fs::create_dir_all(root.join("vendor")).unwrap();
    fs::create_dir_all(root.join(".git/objects")).unwrap();
    fs::create_dir_all(root.join("my-vendor-lib")).unwrap();
    fs::write(root.join("a.ts"), "export {}").unwrap();
    fs::write(root.join("img.png"), [0x89u8, 0x50, 0x4e, 0x47]).unwrap();
    fs::write(root.join("vendor/x.ts"), "x").unwrap();
    fs::write(root.join("my-vendor-lib/y.ts"), "y").unwrap();

    let built = DirectoryTreeBuilder::new(Arc::new(LocalFs::new()))
        .build(&root)
        .await
        .unwrap();

    let names: Vec<&str> = built.tree.root().children().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["a.ts", "img.png", "my-vendor-lib"]);
    assert!(built.failures.is_empty());
    assert_eq!(built.tree.stats().files, 3);
}

#[tokio::test]
async fn missing_subdirectory_degrades_to_empty_node() {
    let fs = FakeFs::default().dir(
        "/r",
        vec![
            DirectoryEntry::directory("/r/gone"),
            DirectoryEntry::file("/r/kept.rs"),
        ],
    );
    let built = builder(fs, 4).build(Path::new("/r")).await.unwrap();

    match built.tree.node(Path::new("/r/gone")).unwrap() {
        TreeNode::Directory(dir) => {
            assert!(dir.children.is_empty());
            assert!(dir.error.is_some());
        }
        other => panic!("expected directory, got {:?}", other),
    }
    assert!(built.tree.contains(Path::new("/r/kept.rs")));
    assert_eq!(built.failures.len(), 1);
    assert_eq!(built.tree.stats().unreadable_directories, 1);
}

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("node_modules".to_string()),
        Just("vendor".to_string()),
        Just(".git".to_string()),
        Just("build".to_string()),
        "[a-z]{1,6}",
    ]
}

proptest! {
    #[test]
    fn no_acquired_node_lies_under_an_excluded_directory(
        dirs in prop::collection::vec(prop::collection::vec(segment(), 1..4), 0..8)
    ) {
        let mut fs = FakeFs::default();
        let root = PathBuf::from("/scan");
        fs.listings.insert(root.clone(), Vec::new());
        for chain in &dirs {
            let mut parent = root.clone();
            for name in chain {
                let child = parent.join(name);
                let entries = fs.listings.entry(parent.clone()).or_default();
                if !entries.iter().any(|e| e.id == child) {
                    entries.push(DirectoryEntry::directory(child.clone()));
                }
                fs.listings.entry(child.clone()).or_default();
                parent = child;
            }
            fs.listings
                .entry(parent.clone())
                .or_default()
                .push(DirectoryEntry::file(parent.join("leaf.rs")));
        }

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let built = runtime
            .block_on(builder(fs, 4).build(&root))
            .unwrap();

        for id in built.tree.preorder() {
            let relative = id.strip_prefix(&root).unwrap();
            prop_assert!(!has_excluded_segment(relative), "excluded node acquired: {:?}", id);
        }
        prop_assert!(built.failures.is_empty());
    }
}
