use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use docqa_answer::{NO_ANSWER_MESSAGE, UNPROCESSABLE_MESSAGE};
use docqa_core::config::Settings;
use docqa_core::data_processor::DataProcessor;
use docqa_core::traits::{Embedder, Generator};
use docqa_core::{AnswerKind, ChunkingConfig, Document, Error, GenerationOutput};
use docqa_embed::HashingEmbedder;
use docqa_pipeline::QaPipeline;
use tempfile::TempDir;

const MANUAL: &str = "Fire needs three things: fuel, heat and oxygen. \
Gather dry tinder before lighting it. \
Water must be boiled for one full minute before drinking. \
A lean-to shelter keeps rain off while you sleep.";

/// Echoes the last prompt line back wrapped in reasoning tags.
struct EchoGenerator {
    prompts: Mutex<Vec<String>>,
}

impl Generator for EchoGenerator {
    fn model_id(&self) -> &str { "echo" }
    fn generate(&self, prompt: &str) -> anyhow::Result<GenerationOutput> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(GenerationOutput::Text(format!("<think>{}</think>\n", prompt.lines().last().unwrap_or(""))))
    }
}

struct FixedGenerator(GenerationOutput);

impl Generator for FixedGenerator {
    fn model_id(&self) -> &str { "fixed" }
    fn generate(&self, _prompt: &str) -> anyhow::Result<GenerationOutput> { Ok(self.0.clone()) }
}

/// Succeeds for the index build, then fails every query.
struct BuildOnlyEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl Embedder for BuildOnlyEmbedder {
    fn embedder_id(&self) -> &str { "build-only" }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            anyhow::bail!("quota exceeded");
        }
        self.inner.embed_batch(texts)
    }
}

fn settings(chunk_size: usize, overlap: usize, top_k: usize) -> Settings {
    let mut s = Settings::default();
    s.chunking = ChunkingConfig { chunk_size, overlap };
    s.retrieval.top_k = top_k;
    s.embedding.dim = 256;
    s.answer.prompt_template = "{context}\n---\n{question}".to_string();
    s
}

fn echo() -> Arc<EchoGenerator> { Arc::new(EchoGenerator { prompts: Mutex::new(Vec::new()) }) }

#[test]
fn ask_retrieves_relevant_chunk_and_sanitizes() {
    let generator = echo();
    let doc = Document::new("manual.txt", MANUAL);
    let pipeline = QaPipeline::from_documents(
        &[doc],
        &settings(60, 10, 1),
        Arc::new(HashingEmbedder::new(256)),
        Arc::clone(&generator) as Arc<dyn Generator>,
    )
    .expect("pipeline");

    let answer = pipeline.ask("how long must water be boiled");
    assert_eq!(answer.kind(), AnswerKind::Generated);
    assert_eq!(answer.text(), "how long must water be boiled");

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("boiled"), "top chunk should mention boiling: {}", prompts[0]);
}

#[test]
fn retrieval_respects_top_k() {
    let doc = Document::new("manual.txt", MANUAL);
    let pipeline = QaPipeline::from_documents(
        &[doc],
        &settings(40, 5, 3),
        Arc::new(HashingEmbedder::new(256)),
        Arc::new(FixedGenerator(GenerationOutput::Text("ok".into()))),
    )
    .unwrap();
    assert!(pipeline.index().len() > 3);
    assert_eq!(pipeline.retrieve("fire").unwrap().len(), 3);
}

#[test]
fn empty_generation_falls_back() {
    let pipeline = QaPipeline::from_documents(
        &[Document::new("a.txt", MANUAL)],
        &settings(80, 0, 2),
        Arc::new(HashingEmbedder::new(64)),
        Arc::new(FixedGenerator(GenerationOutput::Text("<think>  </think>".into()))),
    )
    .unwrap();
    assert_eq!(pipeline.ask("anything").text(), NO_ANSWER_MESSAGE);
}

#[test]
fn query_embedding_failure_falls_back() {
    let embedder = Arc::new(BuildOnlyEmbedder { inner: HashingEmbedder::new(64), calls: AtomicUsize::new(0) });
    let pipeline = QaPipeline::from_documents(
        &[Document::new("a.txt", "short document")],
        &settings(100, 10, 2),
        embedder,
        Arc::new(FixedGenerator(GenerationOutput::Text("never used".into()))),
    )
    .unwrap();
    let answer = pipeline.ask("question");
    assert_eq!(answer.text(), UNPROCESSABLE_MESSAGE);
    assert_eq!(answer.kind(), AnswerKind::Unprocessable);
}

#[test]
fn invalid_settings_are_rejected_before_indexing() {
    let result = QaPipeline::from_documents(
        &[Document::new("a.txt", MANUAL)],
        &settings(10, 10, 2),
        Arc::new(HashingEmbedder::new(64)),
        echo(),
    );
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[test]
fn from_chunks_validates_before_embedding() {
    let embedder = Arc::new(BuildOnlyEmbedder { inner: HashingEmbedder::new(64), calls: AtomicUsize::new(0) });
    let chunks = DataProcessor::new().chunk_document(&Document::new("a.txt", MANUAL));
    let result = QaPipeline::from_chunks(
        &chunks,
        &settings(100, 10, 0),
        Arc::clone(&embedder) as Arc<dyn Embedder>,
        echo(),
    );
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_queries_share_one_pipeline() {
    let pipeline = Arc::new(
        QaPipeline::from_documents(
            &[Document::new("a.txt", MANUAL)],
            &settings(50, 10, 2),
            Arc::new(HashingEmbedder::new(128)),
            Arc::new(FixedGenerator(GenerationOutput::Text("<end_of_turn>answer".into()))),
        )
        .unwrap(),
    );
    let handles: Vec<_> = ["fire", "water", "shelter", "tinder"]
        .into_iter()
        .map(|q| {
            let p = Arc::clone(&pipeline);
            thread::spawn(move || p.ask(q).into_text())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), "answer");
    }
}

#[test]
fn directory_of_documents_is_indexed() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("fire.txt"), "Fire needs fuel, heat and oxygen.").unwrap();
    fs::write(tmp.path().join("water.txt"), "Boil water for one minute.").unwrap();

    let s = settings(200, 20, 1);
    let documents = DataProcessor::with_config(s.chunking).unwrap().load_documents(tmp.path()).unwrap();
    let pipeline = QaPipeline::from_documents(
        &documents,
        &s,
        Arc::new(HashingEmbedder::new(256)),
        Arc::new(FixedGenerator(GenerationOutput::Text("ok".into()))),
    )
    .unwrap();

    assert_eq!(pipeline.index().len(), 2);
    let top = pipeline.retrieve("boil water").unwrap();
    assert_eq!(top.hits()[0].chunk.doc_id, "water");
}
