//! Sentence embeddings from the local MiniLM model.
//!
//! Run with: cargo test -p chemlab-rag --features onnx --test onnx_tests -- --ignored
#![cfg(feature = "onnx")]

use std::sync::Arc;

use chemlab_rag::{Document, EmbeddingProvider, InMemoryVectorStore, KnowledgeBase, OnnxEmbeddingProvider};

async fn load() -> OnnxEmbeddingProvider {
    let dir = std::env::var("CHEMLAB_MODEL_DIR").unwrap_or_else(|_| "../models/all-MiniLM-L6-v2".into());
    OnnxEmbeddingProvider::load(dir).await.expect("Failed to load model")
}

#[tokio::test]
#[ignore = "Requires actual model download - run manually"]
async fn paraphrase_outranks_unrelated_text() {
    let kb = KnowledgeBase::builder()
        .embedding_provider(Arc::new(load().await))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .await
        .unwrap();
    kb.add_documents(&[
        Document::new("zinc", "Zinc reacts with hydrochloric acid producing zinc chloride and hydrogen.", "zinc.txt"),
        Document::new("iron", "Iron rusts slowly in moist air.", "iron.txt"),
    ])
    .await
    .unwrap();

    let results = kb.search_scored("Zn + HCl", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].chunk.text.starts_with("Zinc reacts"));
    assert!(results[0].score > results[1].score, "{:?}", results.iter().map(|r| r.score).collect::<Vec<_>>());
}

#[tokio::test]
#[ignore = "Requires actual model download - run manually"]
async fn batch_matches_single_and_is_normalised() {
    let provider = load().await;
    let texts = ["Sodium reacts violently with water.", "Sulfur burns with a blue flame."];

    let batch = provider.embed_batch(&texts).await.unwrap();
    assert_eq!(batch.len(), 2);
    for (text, vector) in texts.iter().zip(&batch) {
        assert_eq!(vector.len(), provider.dimensions());
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);

        let single = provider.embed(text).await.unwrap();
        let cosine: f32 = single.iter().zip(vector).map(|(a, b)| a * b).sum();
        assert!(cosine > 0.999, "{text}: {cosine}");
    }
}
