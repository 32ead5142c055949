use passage_core::traits::Embedder;
use passage_embed::{FakeEmbedder, EMBEDDING_DIM};

#[test]
fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Identical inputs produce identical vectors
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn fake_embedder_preserves_input_order() {
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let texts: Vec<String> = ["alpha", "bravo", "charlie"].iter().map(|s| s.to_string()).collect();
    let batch = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(batch.len(), 3);
    for (i, text) in texts.iter().enumerate() {
        let single = embedder.embed_batch(std::slice::from_ref(text)).expect("single");
        assert_eq!(batch[i], single[0], "batch result {i} out of order");
    }
}

#[test]
fn different_texts_differ() {
    let embedder = FakeEmbedder::new(EMBEDDING_DIM);
    let embs = embedder
        .embed_batch(&["solar panel wiring".to_string(), "goat cheese recipe".to_string()])
        .expect("embed_batch");
    let dot: f32 = embs[0].iter().zip(embs[1].iter()).map(|(a, b)| a * b).sum();
    assert!(dot < 0.99, "unrelated texts should not be near-identical (dot={dot})");
}
