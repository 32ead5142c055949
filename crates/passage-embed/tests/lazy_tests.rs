use std::path::PathBuf;

use passage_core::error::Error;
use passage_core::traits::Embedder;
use passage_embed::LazyEmbedder;

#[test]
fn embed_before_load_fails_with_model_not_loaded() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let embedder = LazyEmbedder::new(PathBuf::from("unused"));
    match embedder.embed_batch(&["hello".to_string()]) {
        Err(Error::ModelNotLoaded) => {}
        other => panic!("expected ModelNotLoaded, got {other:?}"),
    }
}

#[test]
fn load_is_idempotent_and_unlocks_embedding() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let embedder = LazyEmbedder::new(PathBuf::from("unused"));
    assert!(!embedder.is_loaded());
    embedder.load().expect("first load");
    embedder.load().expect("second load is a no-op");
    assert!(embedder.is_loaded());

    let embs = embedder.embed_batch(&["hello world".to_string()]).expect("embed");
    assert_eq!(embs[0].len(), embedder.dim());
    assert_eq!(embedder.embedder_id(), "fake:xxhash:d384");
}

#[test]
fn concurrent_first_loads_build_one_model() {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let embedder = std::sync::Arc::new(LazyEmbedder::new(PathBuf::from("unused")));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let e = embedder.clone();
            std::thread::spawn(move || e.load())
        })
        .collect();
    for h in handles {
        h.join().expect("join").expect("load");
    }
    assert!(embedder.is_loaded());
    let a = embedder.embed_batch(&["same".to_string()]).expect("a");
    let b = embedder.embed_batch(&["same".to_string()]).expect("b");
    assert_eq!(a, b);
}
