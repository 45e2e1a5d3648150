//! HTTP clients against a mock server: embeddings, vector store, and chat.

mod common;

use common::{embeddings_body, strings, MockServerFixture};
use semantic_analysis::embeddings::{EmbeddingProvider, OpenAiEmbeddingClient};
use semantic_analysis::rag::{OpenAiChatGenerator, TextGenerator};
use semantic_analysis::store::{MetadataFilter, PineconeClient, StoredVector, VectorStore};
use serde_json::json;
use std::sync::Arc;

fn embedding_client(base_url: &str) -> OpenAiEmbeddingClient {
    OpenAiEmbeddingClient::builder()
        .base_url(base_url)
        .api_key("test-key")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_embeddings_are_realigned_by_index() {
    let fixture = MockServerFixture::new().await;
    let body = embeddings_body(&[(1, vec![0.0, 1.0]), (0, vec![1.0, 0.0])]);
    let mock = fixture
        .mock_json_matching(
            "/v1/embeddings",
            json!({"input": ["cat", "dog"], "model": "text-embedding-3-small"}),
            &body,
        )
        .await;

    let embeddings = embedding_client(&fixture.base_url)
        .embed(&strings(&["cat", "dog"]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(embeddings[0].text(), "cat");
    assert_eq!(embeddings[0].vector(), &[1.0, 0.0]);
    assert_eq!(embeddings[1].text(), "dog");
    assert_eq!(embeddings[1].vector(), &[0.0, 1.0]);
}

#[tokio::test]
async fn test_embeddings_split_into_batches() {
    let fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_json_matching(
            "/v1/embeddings",
            json!({"input": ["a", "b"]}),
            &embeddings_body(&[(0, vec![1.0]), (1, vec![2.0])]),
        )
        .await;
    let second = fixture
        .mock_json_matching(
            "/v1/embeddings",
            json!({"input": ["c"]}),
            &embeddings_body(&[(0, vec![3.0])]),
        )
        .await;

    let client = OpenAiEmbeddingClient::builder()
        .base_url(&fixture.base_url)
        .api_key("test-key")
        .max_batch_size(2)
        .build()
        .unwrap();
    let (embeddings, usage) = client.embed_batch(&strings(&["a", "b", "c"])).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let indices: Vec<usize> = embeddings.iter().map(|e| e.index()).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(embeddings[2].text(), "c");
    assert_eq!(embeddings[2].vector(), &[3.0]);
    assert_eq!(usage.prompt_tokens, 8);
}

#[tokio::test]
async fn test_batched_embedding_on_spawned_task() {
    let fixture = MockServerFixture::new().await;
    let first = fixture
        .mock_json_matching(
            "/v1/embeddings",
            json!({"input": ["x", "y"]}),
            &embeddings_body(&[(1, vec![0.0, 2.0]), (0, vec![1.0, 0.0])]),
        )
        .await;
    let second = fixture
        .mock_json_matching(
            "/v1/embeddings",
            json!({"input": ["z"]}),
            &embeddings_body(&[(0, vec![3.0, 3.0])]),
        )
        .await;

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(
        OpenAiEmbeddingClient::builder()
            .base_url(&fixture.base_url)
            .api_key("test-key")
            .max_batch_size(2)
            .build()
            .unwrap(),
    );
    let task = tokio::spawn({
        let provider = provider.clone();
        async move { provider.embed(&strings(&["x", "y", "z"])).await }
    });
    let embeddings = task.await.unwrap().unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let texts: Vec<&str> = embeddings.iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec!["x", "y", "z"]);
    assert_eq!(embeddings[1].vector(), &[0.0, 2.0]);
    assert_eq!(embeddings[2].index(), 2);
}

#[tokio::test]
async fn test_embedding_api_error_is_external_service() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("/v1/embeddings", 500, r#"{"error":{"message":"boom"}}"#)
        .await;

    let err = embedding_client(&fixture.base_url)
        .embed(&strings(&["cat"]))
        .await
        .unwrap_err();
    assert!(err.is_external_service());
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_embedding_count_mismatch_rejected() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("/v1/embeddings", 200, &embeddings_body(&[(0, vec![1.0])]))
        .await;

    let err = embedding_client(&fixture.base_url)
        .embed(&strings(&["cat", "dog"]))
        .await
        .unwrap_err();
    assert!(err.is_external_service());
}

fn pinecone(base_url: &str) -> PineconeClient {
    PineconeClient::builder()
        .index_host(base_url)
        .api_key("pc-key")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_pinecone_upsert_sends_namespace() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_matching(
            "/vectors/upsert",
            json!({
                "namespace": "docs",
                "vectors": [{"id": "doc_0", "values": [1.0, 0.0], "metadata": {"Text": "hello"}}]
            }),
            r#"{"upsertedCount": 1}"#,
        )
        .await;

    let written = pinecone(&fixture.base_url)
        .upsert(
            &[StoredVector::new("doc_0", vec![1.0, 0.0]).with_metadata("Text", "hello")],
            "docs",
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(written, 1);
}

#[tokio::test]
async fn test_pinecone_query_with_filter() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_matching(
            "/query",
            json!({
                "topK": 2,
                "namespace": "docs",
                "includeMetadata": true,
                "filter": {"Source": {"$eq": "a.txt"}}
            }),
            r#"{"matches":[{"id":"doc_3","score":0.9,"metadata":{"Text":"closest","Source":"a.txt"}}]}"#,
        )
        .await;

    let filter = MetadataFilter::new().field_eq("Source", "a.txt");
    let matches = pinecone(&fixture.base_url)
        .query(&[0.5, 0.5], 2, "docs", Some(&filter))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "doc_3");
    assert_eq!(matches[0].metadata["Text"], "closest");
}

#[tokio::test]
async fn test_pinecone_error_status() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("/query", 401, r#"{"message":"unauthorized"}"#)
        .await;

    let err = pinecone(&fixture.base_url)
        .query(&[1.0], 1, "docs", None)
        .await
        .unwrap_err();
    assert!(err.is_external_service());
}

#[tokio::test]
async fn test_chat_generator_returns_first_choice() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_matching(
            "/v1/chat/completions",
            json!({"model": "gpt-4o"}),
            r#"{"choices":[{"message":{"role":"assistant","content":"Paris."}}]}"#,
        )
        .await;

    let generator = OpenAiChatGenerator::builder()
        .base_url(&fixture.base_url)
        .api_key("test-key")
        .build()
        .unwrap();
    let answer = generator
        .generate("Capital of France?", &strings(&["Paris is the capital of France."]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(answer, "Paris.");
}

#[tokio::test]
async fn test_chat_without_choices_is_external_service() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("/v1/chat/completions", 200, r#"{"choices":[]}"#)
        .await;

    let generator = OpenAiChatGenerator::builder()
        .base_url(&fixture.base_url)
        .api_key("test-key")
        .build()
        .unwrap();
    let err = generator.generate("q", &[]).await.unwrap_err();
    assert!(err.is_external_service());
}
