use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docqa_core::chunker::split;
use docqa_core::traits::Embedder;
use docqa_core::{Document, DocumentChunk, Error};
use docqa_embed::HashingEmbedder;
use docqa_vector::{build, retrieve, IndexBuilder};

/// Looks texts up in a fixed table; unknown texts embed to `[0, 0, 1]`.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new(pairs: &[(&str, [f32; 3])]) -> Arc<Self> {
        Arc::new(Self { table: pairs.iter().map(|(t, v)| ((*t).to_string(), v.to_vec())).collect() })
    }
}

impl Embedder for TableEmbedder {
    fn embedder_id(&self) -> &str { "table" }
    fn dim(&self) -> usize { 3 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.table.get(t).cloned().unwrap_or_else(|| vec![0.0, 0.0, 1.0])).collect())
    }
}

/// Fails on the n-th call to `embed_batch`.
struct FlakyEmbedder {
    calls: AtomicUsize,
    fail_on: usize,
}

impl Embedder for FlakyEmbedder {
    fn embedder_id(&self) -> &str { "flaky" }
    fn dim(&self) -> usize { 2 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
            anyhow::bail!("service unavailable");
        }
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Claims one dimension but returns another.
struct LyingEmbedder;

impl Embedder for LyingEmbedder {
    fn embedder_id(&self) -> &str { "lying" }
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

#[test]
fn non_finite_chunk_vector_fails_the_build() {
    let embedder = TableEmbedder::new(&[("good", [1.0, 0.0, 0.0]), ("bad", [f32::NAN, 0.0, 0.0])]);
    let result = build(&[chunk("g", "good"), chunk("b", "bad")], embedder);
    assert!(matches!(result, Err(Error::EmbeddingFailure(msg)) if msg.contains("chunk b")));
}

#[test]
fn non_finite_query_vector_is_embedding_failure() {
    let embedder = TableEmbedder::new(&[("good", [1.0, 0.0, 0.0]), ("q", [0.0, f32::INFINITY, 0.0])]);
    let index = build(&[chunk("g", "good")], embedder).expect("build");
    assert!(matches!(index.retrieve("q", 1), Err(Error::EmbeddingFailure(_))));
}

fn chunk(id: &str, content: &str) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        doc_id: "doc".to_string(),
        source: "doc.txt".to_string(),
        content: content.to_string(),
        chunk_index: 0,
        total_chunks: 1,
        start: 0,
        end: content.chars().count(),
    }
}

#[test]
fn single_chunk_retrieves_itself_with_top_score() {
    let embedder = Arc::new(HashingEmbedder::new(64));
    let c = chunk("doc:0", "the river freezes in winter");
    let index = build(&[c.clone()], embedder).expect("build");

    let result = retrieve(&index, "the river freezes in winter", 1).expect("retrieve");
    assert_eq!(result.len(), 1);
    assert_eq!(result.hits()[0].chunk, c);
    assert!((result.hits()[0].score - 1.0).abs() < 1e-5, "score={}", result.hits()[0].score);
}

#[test]
fn results_sorted_descending_and_truncated_to_k() {
    let embedder = TableEmbedder::new(&[
        ("far", [0.0, 1.0, 0.0]),
        ("near", [1.0, 0.1, 0.0]),
        ("mid", [1.0, 1.0, 0.0]),
        ("q", [1.0, 0.0, 0.0]),
    ]);
    let chunks = vec![chunk("a", "far"), chunk("b", "near"), chunk("c", "mid")];
    let index = build(&chunks, embedder).expect("build");

    let result = index.retrieve("q", 2).expect("retrieve");
    let ids: Vec<&str> = result.hits().iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
    assert!(result.hits()[0].score >= result.hits()[1].score);
}

#[test]
fn ties_keep_insertion_order() {
    let embedder = TableEmbedder::new(&[
        ("first", [1.0, 0.0, 0.0]),
        ("second", [1.0, 0.0, 0.0]),
        ("third", [1.0, 0.0, 0.0]),
        ("other", [0.0, 1.0, 0.0]),
        ("q", [1.0, 0.0, 0.0]),
    ]);
    let chunks = vec![chunk("x", "other"), chunk("1", "first"), chunk("2", "second"), chunk("3", "third")];
    let index = build(&chunks, embedder).expect("build");

    let ids: Vec<String> = index.retrieve("q", 4).unwrap().into_iter().map(|h| h.chunk.id).collect();
    assert_eq!(ids, vec!["1", "2", "3", "x"]);
}

#[test]
fn k_larger_than_index_returns_everything() {
    let embedder = Arc::new(HashingEmbedder::new(32));
    let doc = Document::new("a.txt", "ABCDEFGHIJ");
    let chunks = split(&doc, 4, 1).unwrap();
    let index = build(&chunks, embedder).unwrap();
    assert_eq!(index.retrieve("ABCD", 100).unwrap().len(), 3);
}

#[test]
fn zero_k_is_invalid() {
    let index = build(&[chunk("a", "alpha")], Arc::new(HashingEmbedder::new(8))).unwrap();
    assert!(matches!(index.retrieve("alpha", 0), Err(Error::InvalidConfiguration(_))));
}

#[test]
fn empty_index_returns_empty_result() {
    let index = build(&[], Arc::new(HashingEmbedder::new(8))).unwrap();
    assert!(index.is_empty());
    assert!(index.retrieve("anything", 3).unwrap().is_empty());
}

#[test]
fn embedding_failure_aborts_whole_build() {
    let embedder = Arc::new(FlakyEmbedder { calls: AtomicUsize::new(0), fail_on: 1 });
    let chunks: Vec<DocumentChunk> = (0..5).map(|i| chunk(&i.to_string(), "text")).collect();
    let result = IndexBuilder::new(embedder).batch_size(2).build(&chunks);
    assert!(matches!(result, Err(Error::EmbeddingFailure(_))));
}

#[test]
fn wrong_dimension_is_an_embedding_failure() {
    let result = build(&[chunk("a", "alpha")], Arc::new(LyingEmbedder));
    assert!(matches!(result, Err(Error::EmbeddingFailure(_))));
}

#[test]
fn query_embedding_failure_is_reported() {
    let embedder = Arc::new(FlakyEmbedder { calls: AtomicUsize::new(0), fail_on: 1 });
    let index = build(&[chunk("a", "alpha")], embedder).expect("first call succeeds");
    assert!(matches!(index.retrieve("alpha", 1), Err(Error::EmbeddingFailure(_))));
}

#[test]
fn rebuilding_gives_same_ranking() {
    let doc = Document::new("a.txt", "fire needs fuel heat and oxygen. water boils at one hundred degrees. shelter keeps you dry.");
    let chunks = split(&doc, 30, 5).unwrap();
    let rank = || -> Vec<String> {
        let index = build(&chunks, Arc::new(HashingEmbedder::new(128))).unwrap();
        index.retrieve("how does water boil", 3).unwrap().into_iter().map(|h| h.chunk.id).collect()
    };
    assert_eq!(rank(), rank());
}

#[test]
fn batching_preserves_chunk_order() {
    let embedder = Arc::new(HashingEmbedder::new(16));
    let chunks: Vec<DocumentChunk> = (0..7).map(|i| chunk(&format!("c{i}"), &format!("word{i}"))).collect();
    let index = IndexBuilder::new(embedder).batch_size(3).build(&chunks).unwrap();
    let ids: Vec<&str> = index.entries().iter().map(|e| e.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4", "c5", "c6"]);
}
