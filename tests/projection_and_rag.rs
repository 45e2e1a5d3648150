//! Projection to plot coordinates and retrieval-augmented answering, wired from configuration.

mod common;

use async_trait::async_trait;
use common::{strings, LetterProvider};
use semantic_analysis::comparison::{ChunkType, Document, InMemoryCorpus, TextChunker};
use semantic_analysis::embeddings::Word2VecProvider;
use semantic_analysis::evaluation::AccuracyEvaluator;
use semantic_analysis::io::read_reduced_csv;
use semantic_analysis::pipeline::ProjectionPipeline;
use semantic_analysis::rag::{RagCase, RagPipeline, TextGenerator};
use semantic_analysis::reduction::{ReductionMethod, X_RANGE, Y_RANGE};
use semantic_analysis::store::InMemoryVectorStore;
use semantic_analysis::{AnalysisConfig, Result};
use std::sync::Arc;

const EPSILON: f64 = 1e-9;

#[tokio::test]
async fn test_projection_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = r#"
reduction:
  components: 2
  eigen_order: descending_variance
  perplexity: 1.5
  max_iterations: 250
"#;
    let config = AnalysisConfig::from_yaml_str(yaml)
        .unwrap()
        .with_output_dir(dir.path());

    let words = strings(&["apple", "banana", "cherry", "kiwi", "mango", "papaya"]);
    let projection = ProjectionPipeline::from_config(LetterProvider::new(), &config);
    let outputs = projection
        .run(&words, &[ReductionMethod::Pca, ReductionMethod::NeighborEmbedding])
        .await
        .unwrap();

    assert_eq!(outputs.len(), 2);
    for output in &outputs {
        assert!(output.csv_path.starts_with(dir.path().join("CSVs")));
        let (labels, coords) = read_reduced_csv(&output.csv_path).unwrap();
        assert_eq!(labels, words);
        assert_eq!(coords.ncols(), 2);
        let min_x = coords.column(0).iter().cloned().fold(f64::INFINITY, f64::min);
        let max_y = coords.column(1).iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!((min_x - X_RANGE.0).abs() < EPSILON);
        assert!((max_y - Y_RANGE.1).abs() < EPSILON);
    }
}

#[tokio::test]
async fn test_word_vector_projection_skips_unknown_words() {
    let dir = tempfile::tempdir().unwrap();
    let vectors = dir.path().join("vectors.txt");
    std::fs::write(
        &vectors,
        "king 0.9 0.1 0.3 0.0\n\
         queen 0.8 0.2 0.9 0.1\n\
         man 0.1 0.9 0.2 0.4\n\
         woman 0.2 0.8 0.8 0.6\n\
         apple 0.5 0.5 0.1 0.9\n",
    )
    .unwrap();
    let config = AnalysisConfig::default().with_output_dir(dir.path().join("out"));

    let provider = Word2VecProvider::from_path(&vectors).await.unwrap();
    let inputs = strings(&["King", "queen", "dragon", "man", "woman", "green apple"]);
    let known = provider.known_inputs(&inputs);
    assert_eq!(known, strings(&["King", "queen", "man", "woman", "green apple"]));

    let projection =
        ProjectionPipeline::from_config(Arc::new(provider), &config).with_prefix("word2vec");
    let outputs = projection.run(&known, &[ReductionMethod::Pca]).await.unwrap();

    assert!(outputs[0].csv_path.ends_with("CSVs/word2vec_pca_reduced.csv"));
    let (labels, coords) = read_reduced_csv(&outputs[0].csv_path).unwrap();
    assert_eq!(labels, known);
    assert_eq!(coords.nrows(), 5);
}

/// Answers with the retrieved paragraphs joined together.
struct ConcatGenerator;

#[async_trait]
impl TextGenerator for ConcatGenerator {
    async fn generate(&self, _query: &str, context: &[String]) -> Result<String> {
        Ok(context.join(" "))
    }

    fn name(&self) -> &'static str {
        "concat"
    }
}

#[tokio::test]
async fn test_rag_cases_over_corpus() {
    let corpus = InMemoryCorpus::new(vec![
        Document::new("zoo.txt", "Zebras graze quietly.\n\nOwls hoot at night."),
        Document::new("kitchen.txt", "Bread bakes in the oven."),
    ]);
    let rag = RagPipeline::new(
        LetterProvider::new(),
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(ConcatGenerator),
    )
    .with_top_k(1);

    let indexed = rag
        .index_corpus(&corpus, &TextChunker::new(ChunkType::Paragraph))
        .await
        .unwrap();
    assert_eq!(indexed, 3);

    let results = rag
        .run_cases(&[RagCase {
            query: "Owls hoot at night".to_string(),
            reference: "Owls hoot at night.".to_string(),
        }])
        .await
        .unwrap();

    assert_eq!(results[0].answer, "Owls hoot at night.");
    assert!((results[0].scores.rouge1 - 1.0).abs() < EPSILON);
    assert!((results[0].scores.rouge2 - 1.0).abs() < EPSILON);
    assert!((results[0].scores.cosine_similarity - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_accuracy_of_unrelated_answer() {
    let evaluator = AccuracyEvaluator::new(LetterProvider::new());
    let result = evaluator
        .evaluate("the cat sat", "a dog ran far")
        .await
        .unwrap();
    assert_eq!(result.rouge1, 0.0);
    assert_eq!(result.rouge2, 0.0);
    assert!(result.cosine_similarity < 1.0);
}
