use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

const TEXT: &str = "Cats purr softly. The cat sleeps. Stocks fell today. The stock market closed.";

/// Two-topic embedder: cats point one way, stocks the other
#[derive(Default)]
struct TopicEmbedder {
    calls: AtomicUsize,
}

impl Embedder for TopicEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                if t.contains("cat") {
                    vec![1.0, 0.0]
                } else if t.contains("stock") {
                    vec![0.0, 1.0]
                } else {
                    vec![0.5, 0.5]
                }
            })
            .collect())
    }
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        bail!("model unavailable")
    }
}

#[test]
fn test_splits_on_topic_shift() {
    let chunks = SemanticChunker::new(Arc::new(TopicEmbedder::default()))
        .chunk(TEXT)
        .unwrap();

    let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
    assert_eq!(
        texts,
        vec![
            "Cats purr softly. The cat sleeps.",
            "Stocks fell today. The stock market closed."
        ]
    );
    assert_eq!(chunks[0].position(), (0, 33));
    assert_eq!(chunks[1].metadata().chunk_index(), 1);
    assert_eq!(chunks[1].metadata().total_chunks(), 2);
}

#[test]
fn test_embeds_in_batches() {
    let embedder = Arc::new(TopicEmbedder::default());
    SemanticChunker::new(embedder.clone())
        .with_batch_size(3)
        .unwrap()
        .chunk(TEXT)
        .unwrap();
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_single_sentence_skips_embedding() {
    let embedder = Arc::new(TopicEmbedder::default());
    let chunks = SemanticChunker::new(embedder.clone())
        .with_source("one.txt")
        .chunk("Only one sentence here.")
        .unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata().source(), Some("one.txt"));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_groups_respect_token_limit() {
    let chunks = SemanticChunker::new(Arc::new(TopicEmbedder::default()))
        .with_max_tokens(20)
        .unwrap()
        .chunk(TEXT)
        .unwrap();

    assert_eq!(chunks.len(), 5);
    assert!(chunks.iter().all(|c| c.token_count() <= 20));
    // The 24-character sentence is hard-split into two pieces
    assert!(chunks[3].metadata().parent_chunk_id().is_some());
    assert_eq!(
        chunks[3].metadata().parent_chunk_id(),
        chunks[4].metadata().parent_chunk_id()
    );
}

#[test]
fn test_empty_text_yields_nothing() {
    let chunker = SemanticChunker::new(Arc::new(FailingEmbedder));
    assert!(chunker.chunk("   ").unwrap().is_empty());
}

#[test]
fn test_embedder_errors_propagate() {
    let err = SemanticChunker::new(Arc::new(FailingEmbedder))
        .chunk(TEXT)
        .unwrap_err();
    assert!(err.to_string().contains("model unavailable"));

    let err = SemanticChunker::new(Arc::new(BrokenEmbedder))
        .chunk(TEXT)
        .unwrap_err();
    assert!(err.to_string().contains("0 vectors for 4 sentences"));
}

#[test]
fn test_settings_are_validated() {
    let embedder: Arc<dyn Embedder> = Arc::new(TopicEmbedder::default());
    assert_eq!(
        SemanticChunker::new(embedder.clone()).with_threshold(2.0).err(),
        Some(ConfigError::InvalidThreshold(2.0))
    );
    assert_eq!(
        SemanticChunker::new(embedder.clone()).with_max_tokens(0).err(),
        Some(ConfigError::ZeroMaxTokens)
    );
    assert_eq!(
        SemanticChunker::new(embedder).with_batch_size(0).err(),
        Some(ConfigError::ZeroBatchSize)
    );
}
