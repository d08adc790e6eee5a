//! HTTP-level tests for the OpenAI-compatible client
//!
//! A local mockito server stands in for the provider.

use mockito::Matcher;
use pagelens_llm::{ChatMessage, ChatModel, EmbeddingModel, LlmError, OpenAiClient, OpenAiConfig};
use serde_json::json;

fn client_for(server: &mockito::ServerGuard) -> OpenAiClient {
    OpenAiClient::new(OpenAiConfig::new("sk-test").with_base_url(server.url())).unwrap()
}

#[tokio::test]
async fn test_chat_completion_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-5-mini",
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"hi there"}}]}"#)
        .create_async()
        .await;

    let chat = client_for(&server).chat("gpt-5-mini");
    let reply = chat.complete(&[ChatMessage::user("hello")]).await.unwrap();

    assert_eq!(reply, "hi there");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_null_content_is_empty() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
        .create_async()
        .await;

    let reply = client_for(&server)
        .chat_completion("gpt-5-mini", &[ChatMessage::user("x")])
        .await
        .unwrap();
    assert_eq!(reply, "");
}

#[tokio::test]
async fn test_chat_no_choices_is_invalid() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let err = client_for(&server)
        .chat_completion("gpt-5-mini", &[ChatMessage::user("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_status_mapping() {
    let mut server = mockito::Server::new_async().await;
    let _limited = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;
    let _missing = server
        .mock("POST", "/embeddings")
        .with_status(404)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .chat_completion("gpt-5-mini", &[ChatMessage::user("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::RateLimitExceeded));

    let err = client
        .embeddings("no-such-model", &["x".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::ModelNotAvailable(ref m) if m == "no-such-model"));
}

#[tokio::test]
async fn test_server_error_carries_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let err = client_for(&server)
        .chat_completion("gpt-5-mini", &[ChatMessage::user("x")])
        .await
        .unwrap_err();
    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_embeddings_ordered_by_index() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .match_body(Matcher::PartialJson(json!({
            "model": "text-embedding-3-large",
            "input": ["first", "second"]
        })))
        .with_status(200)
        .with_body(
            r#"{"object":"list","data":[
                {"object":"embedding","index":1,"embedding":[0.0,1.0]},
                {"object":"embedding","index":0,"embedding":[1.0,0.0]}
            ]}"#,
        )
        .create_async()
        .await;

    let embedder = client_for(&server).embedder("text-embedding-3-large");
    let vectors = embedder
        .embed(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embeddings_batched() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(r#"{"data":[{"index":0,"embedding":[0.5,0.5]}]}"#)
        .expect(3)
        .create_async()
        .await;

    let client = OpenAiClient::new(
        OpenAiConfig::new("sk-test")
            .with_base_url(server.url())
            .with_embedding_batch_size(1),
    )
    .unwrap();
    let inputs: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let vectors = client.embeddings("m", &inputs).await.unwrap();

    assert_eq!(vectors.len(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embeddings_count_mismatch() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(r#"{"data":[{"index":0,"embedding":[0.5,0.5]}]}"#)
        .create_async()
        .await;

    let err = client_for(&server)
        .embeddings("m", &["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_empty_embed_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .expect(0)
        .create_async()
        .await;

    let vectors = client_for(&server).embedder("m").embed(&[]).await.unwrap();
    assert!(vectors.is_empty());
    mock.assert_async().await;
}
