use codepack::concat::ConcatenationFormatter;
use codepack::{ApiError, NodePath};
use proptest::prelude::*;
use std::path::PathBuf;

use crate::integration::support::FakeFs;

fn render_with_delays(paths: &[NodePath], delays: &[u64], concurrency: usize) -> String {
    let mut fs = FakeFs::default();
    for (i, (path, delay)) in paths.iter().zip(delays).enumerate() {
        fs.contents.insert(path.clone(), format!("content {}\r\n", i));
        fs.delays_ms.insert(path.clone(), *delay);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();
    runtime.block_on(async {
        ConcatenationFormatter::new()
            .with_fetch_concurrency(concurrency)
            .concatenate(paths, &fs)
            .await
            .unwrap()
            .render()
    })
}

proptest! {
    #[test]
    fn output_is_independent_of_fetch_completion_order(
        count in 1usize..10,
        delays in prop::collection::vec(0u64..50, 10),
        concurrency in 1usize..6,
    ) {
        let paths: Vec<NodePath> = (0..count).map(|i| PathBuf::from(format!("/p/f{}.rs", i))).collect();
        let zero = vec![0; count];

        let baseline = render_with_delays(&paths, &zero, 1);
        let shuffled = render_with_delays(&paths, &delays[..count], concurrency);
        prop_assert_eq!(baseline, shuffled);
    }
}

#[tokio::test]
async fn partial_failure_keeps_every_other_file() {
    let fs = FakeFs::default()
        .file("/p/a.rs", "a")
        .file("/p/c.rs", "c");
    let paths: Vec<NodePath> = ["/p/a.rs", "/p/b.rs", "/p/c.rs"]
        .iter()
        .map(PathBuf::from)
        .collect();

    let artifact = ConcatenationFormatter::new()
        .concatenate(&paths, &fs)
        .await
        .unwrap();
    assert_eq!(artifact.table_of_contents, paths);
    assert_eq!(artifact.stats.files_included, 2);
    assert_eq!(artifact.stats.files_unreadable, 1);
    assert!(artifact
        .render()
        .contains("## File: /p/b.rs\n\n[Error reading file]\n\n## File: /p/c.rs"));
}

#[tokio::test]
async fn all_binary_selection_fails() {
    let fs = FakeFs::default().file("/p/logo.png", "png");
    let err = ConcatenationFormatter::new()
        .concatenate(&[PathBuf::from("/p/logo.png")], &fs)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ConcatenationFailed { attempted: 0 }));
}
