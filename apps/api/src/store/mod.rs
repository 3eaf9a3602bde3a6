//! Resume Store — chunked resume text with vector retrieval.
//!
//! Resumes are split into deterministic overlapping character windows,
//! embedded, and held in an in-memory index keyed by session namespace.
//! Chunks are immutable once stored; re-ingesting a namespace replaces its
//! chunks wholesale, so stale resume data never leaks into retrieval.
//! Nothing is persisted across process restarts.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::embeddings::{Embedder, EmbeddingError};

/// Chunk window size in characters (matches the original splitter).
pub const CHUNK_SIZE: usize = 500;
/// Overlap between consecutive windows in characters.
pub const CHUNK_OVERLAP: usize = 50;

/// Namespace used when the caller does not supply a session id.
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("resume text is empty")]
    EmptyResume,

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// A stored resume fragment. Immutable after ingestion.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: Uuid,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
struct NamespaceEntry {
    chunks: Vec<StoredChunk>,
    ingested_at: DateTime<Utc>,
}

/// One retrieval hit: chunk text plus cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
}

/// In-memory, namespaced vector index over resume chunks.
/// Supports concurrent reads and namespaced writes; invocations running in
/// parallel only contend on the outer map lock.
pub struct ResumeStore {
    embedder: Arc<dyn Embedder>,
    namespaces: RwLock<HashMap<String, NamespaceEntry>>,
}

impl ResumeStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    /// Chunks, embeds, and stores a resume under `namespace`, replacing any
    /// previously ingested chunks in that namespace. Returns the number of
    /// chunks stored.
    pub async fn ingest(&self, namespace: &str, resume_text: &str) -> Result<usize, IngestError> {
        if resume_text.trim().is_empty() {
            return Err(IngestError::EmptyResume);
        }

        let texts = split_into_chunks(resume_text, CHUNK_SIZE, CHUNK_OVERLAP);
        let embeddings = self.embedder.embed(&texts).await?;

        let chunks: Vec<StoredChunk> = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| StoredChunk {
                id: Uuid::new_v4(),
                text,
                embedding,
            })
            .collect();
        let count = chunks.len();

        let mut namespaces = self.namespaces.write().await;
        namespaces.insert(
            namespace.to_string(),
            NamespaceEntry {
                chunks,
                ingested_at: Utc::now(),
            },
        );

        info!("ingested {count} resume chunks into namespace '{namespace}'");
        Ok(count)
    }

    /// Returns the `top_k` chunks most similar to `query`, best first.
    /// Ties keep ingestion order. An empty or unknown namespace yields an
    /// empty result, not an error.
    pub async fn query(
        &self,
        namespace: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, EmbeddingError> {
        let namespaces = self.namespaces.read().await;
        let entry = match namespaces.get(namespace) {
            Some(e) if !e.chunks.is_empty() => e,
            _ => return Ok(vec![]),
        };

        let query_texts = [query.to_string()];
        let query_vec = self
            .embedder
            .embed(&query_texts)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut scored: Vec<RetrievedChunk> = entry
            .chunks
            .iter()
            .map(|c| RetrievedChunk {
                text: c.text.clone(),
                score: cosine_similarity(&c.embedding, &query_vec),
            })
            .collect();

        // Stable sort: equal scores keep chunk ingestion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    /// When the namespace was last (re-)ingested, if ever.
    pub async fn ingested_at(&self, namespace: &str) -> Option<DateTime<Utc>> {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map(|e| e.ingested_at)
    }
}

/// Splits text into overlapping character windows.
///
/// Deterministic and bounded: every chunk is at most `chunk_size` characters
/// (before trimming), consecutive chunks share `overlap` characters, and the
/// split never lands inside a UTF-8 code point.
pub fn split_into_chunks(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(chunk_size > overlap);
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Cosine similarity; 0.0 for zero-norm or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::test_support::HashEmbedder;

    const RESUME: &str = "Jane Doe, Senior Backend Engineer. \
        Eight years building distributed systems in Rust and Go. \
        Led the migration of a payments platform to async Rust with Tokio, \
        cutting p99 latency by 45%. Designed PostgreSQL schemas for \
        multi-tenant billing. Mentored four junior engineers.";

    fn store() -> ResumeStore {
        ResumeStore::new(Arc::new(HashEmbedder))
    }

    #[test]
    fn test_chunker_is_deterministic() {
        let a = split_into_chunks(RESUME, 100, 20);
        let b = split_into_chunks(RESUME, 100, 20);
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunker_bounds_and_overlap() {
        let text = "abcdefghij".repeat(100); // 1000 chars
        let chunks = split_into_chunks(&text, 500, 50);
        assert!(chunks.iter().all(|c| c.chars().count() <= 500));
        // Consecutive windows share the overlap region.
        let tail: String = chunks[0].chars().skip(450).collect();
        assert!(chunks[1].starts_with(&tail));
    }

    #[test]
    fn test_chunker_short_text_yields_single_chunk() {
        let chunks = split_into_chunks("short resume", 500, 50);
        assert_eq!(chunks, vec!["short resume".to_string()]);
    }

    #[test]
    fn test_chunker_handles_multibyte_text() {
        let text = "résumé ".repeat(200);
        let chunks = split_into_chunks(&text, 100, 10);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_cosine_similarity_identical_and_orthogonal() {
        let a = vec![1.0, 0.0, 2.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_ingest_empty_resume_fails() {
        let err = store().ingest("default", "   \n").await.unwrap_err();
        assert!(matches!(err, IngestError::EmptyResume));
    }

    #[tokio::test]
    async fn test_ingest_then_query_returns_chunks() {
        let store = store();
        let count = store.ingest("default", RESUME).await.unwrap();
        assert!(count >= 1);

        let hits = store.query("default", "Rust Tokio latency", 3).await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits.len() <= 3);
        // Ordered best-first.
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_query_empty_store_returns_empty() {
        let hits = store().query("default", "anything", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_unknown_namespace_returns_empty() {
        let store = store();
        store.ingest("session-a", RESUME).await.unwrap();
        let hits = store.query("session-b", "Rust", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_reingest_same_text_replaces_without_corruption() {
        let store = store();
        let first = store.ingest("default", RESUME).await.unwrap();
        let hits_before = store.query("default", "payments platform", 3).await.unwrap();

        let second = store.ingest("default", RESUME).await.unwrap();
        let hits_after = store.query("default", "payments platform", 3).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(hits_before, hits_after);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = store();
        store.ingest("alice", RESUME).await.unwrap();
        store
            .ingest("bob", "Bob Smith, kernel developer, C and eBPF.")
            .await
            .unwrap();

        let alice_hits = store.query("alice", "Rust", 5).await.unwrap();
        assert!(!alice_hits.is_empty());
        assert!(alice_hits.iter().all(|h| !h.text.contains("eBPF")));

        let bob_hits = store.query("bob", "kernel", 5).await.unwrap();
        assert!(!bob_hits.is_empty());
        assert!(bob_hits.iter().all(|h| !h.text.contains("Jane")));
    }
}
