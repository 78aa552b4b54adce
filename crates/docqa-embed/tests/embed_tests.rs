use docqa_core::config::GatewaySettings;
use docqa_embed::{get_default_embedder, Embedder, FakeEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid calling a remote gateway
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let settings = GatewaySettings { embedding_dim: 256, ..GatewaySettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 256, "embedding dim follows settings");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_ignores_case_and_punctuation() {
    let embedder = FakeEmbedder::new(512);
    let a = embedder.embed("Cats are mammals.").unwrap();
    let b = embedder.embed("cats ARE mammals").unwrap();
    assert!((cosine(&a, &b) - 1.0).abs() < 1e-5);
}

#[test]
fn shared_words_raise_similarity() {
    let embedder = FakeEmbedder::new(1024);
    let query = embedder.embed("What are cats?").unwrap();
    let cats = embedder.embed("Cats are mammals.").unwrap();
    let unrelated = embedder.embed("Rust compiles quickly").unwrap();
    assert!(cosine(&query, &cats) > cosine(&query, &unrelated));
}

#[test]
fn empty_batch_is_empty() {
    let embedder = FakeEmbedder::new(8);
    assert!(embedder.embed_batch(&[]).unwrap().is_empty());
}
