use passage_core::error::Error;
use passage_core::types::Chunk;
use passage_vector::VectorIndex;
use tempfile::TempDir;

const DIM: usize = 4;

fn chunk(text: &str, source_offset: usize) -> Chunk {
    Chunk { text: text.to_string(), source_offset }
}

fn unit(axis: usize) -> Vec<f32> {
    let mut v = vec![0f32; DIM];
    v[axis % DIM] = 1.0;
    v
}

async fn open(tmp: &TempDir) -> VectorIndex {
    VectorIndex::open(tmp.path(), "entries_test", "fake:test:d4", DIM)
        .await
        .expect("open index")
}

#[tokio::test]
async fn search_on_empty_index_returns_nothing() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;
    for k in [1usize, 3, 10] {
        let hits = index.search(&unit(0), k).await.expect("search");
        assert!(hits.is_empty(), "k={k}");
    }
}

#[tokio::test]
async fn insert_count_clear_roundtrip() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;
    assert_eq!(index.count().await.expect("count"), 0);

    let chunks = vec![chunk("alpha", 0), chunk("bravo", 2), chunk("charlie", 4)];
    let vectors = vec![unit(0), unit(1), unit(2)];
    let ids = index.insert(&chunks, &vectors).await.expect("insert");
    assert_eq!(ids.len(), 3);
    assert_eq!(index.count().await.expect("count"), 3);

    index.clear().await.expect("clear");
    assert_eq!(index.count().await.expect("count"), 0);

    // Usable after clear
    let ids2 = index.insert(&[chunk("delta", 0)], &[unit(3)]).await.expect("insert");
    assert_eq!(index.count().await.expect("count"), 1);
    assert!(!ids.contains(&ids2[0]), "ids are not reused after clear");
}

#[tokio::test]
async fn own_embedding_comes_back_at_distance_zero() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;
    let v = vec![0.5f32, 0.5, 0.5, 0.5];
    index.insert(&[chunk("the one", 0)], &[v.clone()]).await.expect("insert");

    let hits = index.search(&v, 1).await.expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "the one");
    assert!(hits[0].distance.abs() < 1e-6, "distance={}", hits[0].distance);
}

#[tokio::test]
async fn results_ascend_by_distance_with_insertion_order_ties() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;
    // Two identical vectors (tie) and one orthogonal
    let chunks = vec![chunk("first twin", 0), chunk("second twin", 5), chunk("stranger", 10)];
    let vectors = vec![unit(0), unit(0), unit(1)];
    index.insert(&chunks, &vectors).await.expect("insert");

    let hits = index.search(&unit(0), 3).await.expect("search");
    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    assert_eq!(hits[0].text, "first twin");
    assert_eq!(hits[1].text, "second twin");
    assert!((hits[0].distance - hits[1].distance).abs() < 1e-6, "twins tie");
    assert_eq!(hits[2].text, "stranger");
}

#[tokio::test]
async fn k_larger_than_index_returns_everything() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;
    index
        .insert(&[chunk("a", 0), chunk("b", 1)], &[unit(0), unit(1)])
        .await
        .expect("insert");
    let hits = index.search(&unit(0), 50).await.expect("search");
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;

    let bad = vec![1.0f32; DIM + 1];
    match index.insert(&[chunk("bad", 0)], &[bad.clone()]).await {
        Err(Error::DimensionMismatch { expected, actual }) => {
            assert_eq!((expected, actual), (DIM, DIM + 1));
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
    match index.search(&bad, 1).await {
        Err(Error::DimensionMismatch { .. }) => {}
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
    // Nothing was written
    assert_eq!(index.count().await.expect("count"), 0);
}

#[tokio::test]
async fn mismatched_lengths_are_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;
    let result = index.insert(&[chunk("a", 0), chunk("b", 1)], &[unit(0)]).await;
    assert!(result.is_err());
    assert_eq!(index.count().await.expect("count"), 0);
}

#[tokio::test]
async fn repeated_ingestion_accumulates_with_fresh_ids() {
    let tmp = TempDir::new().expect("tmp");
    let index = open(&tmp).await;
    let first = index.insert(&[chunk("round one", 0)], &[unit(0)]).await.expect("insert");
    let second = index.insert(&[chunk("round two", 0)], &[unit(1)]).await.expect("insert");
    assert_eq!(index.count().await.expect("count"), 2);
    assert_ne!(first[0], second[0], "ids never collide across ingestions");
}

#[tokio::test]
async fn reopen_is_idempotent_and_pins_embedder() {
    let tmp = TempDir::new().expect("tmp");
    {
        let index = open(&tmp).await;
        index.insert(&[chunk("persisted", 0)], &[unit(0)]).await.expect("insert");
    }
    // Same embedder reopens fine and sees the data
    let index = open(&tmp).await;
    assert_eq!(index.count().await.expect("count"), 1);

    // A different embedder id is a configuration error, not silent mixing
    let result = VectorIndex::open(tmp.path(), "entries_test", "fake:other:d4", DIM).await;
    assert!(result.is_err());
}
