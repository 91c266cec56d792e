use codepack::store::{ArtifactKey, FileBulkTier, StorageTier, TieredStore};
use std::sync::Arc;
use tempfile::TempDir;

const THRESHOLD: usize = 1024;

#[tokio::test]
async fn value_one_byte_over_threshold_round_trips_through_bulk_tier() {
    let temp = TempDir::new().unwrap();
    let store = TieredStore::open(temp.path(), THRESHOLD).unwrap();
    let key = ArtifactKey::ConcatenatedFiles.as_str();

    let exact = "a".repeat(THRESHOLD);
    assert_eq!(store.put(key, &exact).await.unwrap().tier, StorageTier::Fast);

    let over = "b".repeat(THRESHOLD + 1);
    let record = store.put(key, &over).await.unwrap();
    assert_eq!(record.tier, StorageTier::Bulk);
    assert_eq!(record.size_bytes, THRESHOLD + 1);
    assert_eq!(store.get(key).await.unwrap(), Some(over));

    let blob = FileBulkTier::new(temp.path().join("bulk")).blob_path(key);
    assert!(blob.exists());
}

#[tokio::test]
async fn values_survive_reopening_the_store() {
    let temp = TempDir::new().unwrap();
    let large = "x".repeat(THRESHOLD * 3);
    {
        let store = TieredStore::open(temp.path(), THRESHOLD).unwrap();
        store.put("large", &large).await.unwrap();
        store
            .put_json(ArtifactKey::TicketMetadata.as_str(), &vec!["PROJ-1", "PROJ-2"])
            .await
            .unwrap();
    }

    let store = TieredStore::open(temp.path(), THRESHOLD).unwrap();
    assert_eq!(store.get("large").await.unwrap(), Some(large));
    let tickets: Option<Vec<String>> = store
        .get_json(ArtifactKey::TicketMetadata.as_str())
        .await
        .unwrap();
    assert_eq!(tickets, Some(vec!["PROJ-1".to_string(), "PROJ-2".to_string()]));
}

#[tokio::test]
async fn clear_removes_bulk_blobs() {
    let temp = TempDir::new().unwrap();
    let store = TieredStore::open(temp.path(), THRESHOLD).unwrap();
    store.put("big", &"z".repeat(THRESHOLD * 2)).await.unwrap();
    store.put("small", "z").await.unwrap();

    assert_eq!(store.clear().await.unwrap(), 2);
    assert!(store.records().await.unwrap().is_empty());
    let remaining = std::fs::read_dir(temp.path().join("bulk")).unwrap().count();
    assert_eq!(remaining, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_a_half_written_value() {
    let store = Arc::new(TieredStore::in_memory(16));
    let small = "s".repeat(8);
    let large = "L".repeat(64);
    store.put("k", &small).await.unwrap();

    let writer = {
        let store = Arc::clone(&store);
        let (small, large) = (small.clone(), large.clone());
        tokio::spawn(async move {
            for i in 0..200 {
                let value = if i % 2 == 0 { &large } else { &small };
                store.put("k", value).await.unwrap();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let (small, large) = (small.clone(), large.clone());
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let value = store.get("k").await.unwrap();
                assert!(value == Some(small.clone()) || value == Some(large.clone()));
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}
