use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use modelhost_sdk::transport::MockTransport;
use modelhost_sdk::types::chat::{
    ChatMessage, ChatResponse, ChatResponseMessage, ChatStreamEvent, SimpleChatRequest,
    StreamingChatRequest,
};
use modelhost_sdk::types::generate::{GenerateResponse, StreamingGenerateRequest};
use modelhost_sdk::types::{
    EmbeddingsResponse, ListModelsResponse, ModelDescriptor, PullProgress, Role,
    RunningModel, RunningModelsResponse, VersionResponse,
};
use modelhost_sdk::{Error, ModelHostClient, Result};

fn test_client(transport: Arc<MockTransport>) -> ModelHostClient {
    ModelHostClient::builder()
        .base_url("http://mock.modelhost.local")
        .default_model("test-model")
        .transport(transport)
        .build()
        .expect("mock client must build")
}

#[tokio::test]
async fn test_chat_simple() -> Result<()> {
    let expected_response = ChatResponse {
        message: ChatResponseMessage {
            role: Role::Assistant,
            content: "Hello from mock!".to_string(),
        },
        ..Default::default()
    };
    let mock_transport =
        Arc::new(MockTransport::new().with_json_response("/api/chat", &expected_response));
    let client = test_client(mock_transport);

    let request = SimpleChatRequest::new("test-model".to_string())
        .add_message(ChatMessage::user("Hi"));

    let response = client.chat_simple(request).await?;
    assert_eq!(response.message.content, expected_response.message.content);

    Ok(())
}

#[tokio::test]
async fn test_chat_stream() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines("/api/chat", vec![
        r#"{"model":"test-model","message":{"role":"assistant","content":"Hello"},"done":false}"#.to_string(),
        r#"{"model":"test-model","message":{"role":"assistant","content":" world"},"done":false}"#.to_string(),
        r#"{"model":"test-model","message":{"role":"assistant","content":"final message"},"done":true}"#.to_string(),
    ]));
    let client = test_client(mock_transport);

    let request = StreamingChatRequest::new("test-model".to_string())
        .add_message(ChatMessage::user("Stream me"));

    let mut stream = client.chat_stream(request).await?;
    let mut received_content = String::new();

    while let Some(event_res) = stream.next().await {
        match event_res? {
            ChatStreamEvent::Message(response) => {
                received_content.push_str(&response.message.content);
            }
            ChatStreamEvent::Error(error) => {
                received_content.push_str(format!("\nError: {}", error).as_str());
            }
            ChatStreamEvent::Partial { partial, error } => {
                received_content.push_str(
                    format!(
                        "\nUnknown Chunk: {}\nError Text: {}",
                        partial,
                        error.unwrap_or("Unknown".to_string())
                    )
                    .as_str(),
                );
            }
        }
    }

    assert_eq!(received_content, "Hello worldfinal message");
    Ok(())
}

#[tokio::test]
async fn test_chat_uses_default_model_when_omitted() -> Result<()> {
    let response = ChatResponse {
        message: ChatResponseMessage {
            role: Role::Assistant,
            content: "ok".to_string(),
        },
        ..Default::default()
    };
    let mock_transport =
        Arc::new(MockTransport::new().with_json_response("/api/chat", &response));
    let client = test_client(mock_transport.clone());

    let reply = client
        .chat(vec![ChatMessage::user("Hi")], None, None)
        .await?;
    assert_eq!(reply, "ok");

    let requests = mock_transport.requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].body.as_ref().expect("chat request has a body");
    assert_eq!(body["model"], "test-model");

    Ok(())
}

#[tokio::test]
async fn test_complete_returns_full_text() -> Result<()> {
    let response = GenerateResponse {
        model: "test-model".to_string(),
        response: "The capital of France is Paris.".to_string(),
        done: true,
        ..Default::default()
    };
    let mock_transport =
        Arc::new(MockTransport::new().with_json_response("/api/generate", &response));
    let client = test_client(mock_transport);

    let text = client.complete("What is the capital of France?", None, None).await?;
    assert_eq!(text, "The capital of France is Paris.");

    Ok(())
}

#[tokio::test]
async fn test_analyze_encodes_image_into_request() -> Result<()> {
    let response = GenerateResponse {
        model: "test-model".to_string(),
        response: "A cat on a mat.".to_string(),
        done: true,
        ..Default::default()
    };
    let mock_transport =
        Arc::new(MockTransport::new().with_json_response("/api/generate", &response));
    let client = test_client(mock_transport.clone());

    let image = b"not really a png";
    let text = client.analyze(image, "Describe this image", None).await?;
    assert_eq!(text, "A cat on a mat.");

    let requests = mock_transport.requests();
    let body = requests[0].body.as_ref().expect("generate request has a body");
    assert_eq!(body["images"][0], BASE64_STANDARD.encode(image));
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["prompt"], "Describe this image");

    Ok(())
}

#[tokio::test]
async fn test_status_unreachable_server_reports_offline() {
    let mock_transport = Arc::new(
        MockTransport::new()
            .with_error("/api/version", Error::Client("connection refused".to_string())),
    );
    let client = test_client(mock_transport);

    let status = client.status().await;
    assert!(!status.running);
    assert!(status.version.is_none());
    assert!(status.loaded_models.is_empty());
}

#[tokio::test]
async fn test_status_reports_version_and_loaded_models() {
    let mock_transport = Arc::new(
        MockTransport::new()
            .with_json_response(
                "/api/version",
                &VersionResponse {
                    version: "0.6.2".to_string(),
                },
            )
            .with_json_response(
                "/api/ps",
                &RunningModelsResponse {
                    models: vec![
                        RunningModel {
                            model: "llama3.2:3b".to_string(),
                            ..Default::default()
                        },
                        RunningModel {
                            model: "nomic-embed-text".to_string(),
                            ..Default::default()
                        },
                    ],
                },
            ),
    );
    let client = test_client(mock_transport);

    let status = client.status().await;
    assert!(status.running);
    assert_eq!(status.version.as_deref(), Some("0.6.2"));
    assert_eq!(
        status.loaded_models,
        vec!["llama3.2:3b".to_string(), "nomic-embed-text".to_string()]
    );
}

#[tokio::test]
async fn test_list_models_preserves_server_order() {
    let listing = ListModelsResponse {
        models: vec![
            ModelDescriptor {
                name: "zeta:latest".to_string(),
                ..Default::default()
            },
            ModelDescriptor {
                name: "alpha:7b".to_string(),
                ..Default::default()
            },
            ModelDescriptor {
                name: "midway:3b".to_string(),
                ..Default::default()
            },
        ],
    };
    let mock_transport = Arc::new(MockTransport::new().with_json_response("/api/tags", &listing));
    let client = test_client(mock_transport);

    let names = client.list_model_names().await;
    assert_eq!(names, vec!["zeta:latest", "alpha:7b", "midway:3b"]);
}

#[tokio::test]
async fn test_list_models_unreachable_server_returns_empty() {
    let mock_transport = Arc::new(
        MockTransport::new()
            .with_error("/api/tags", Error::Client("connection refused".to_string())),
    );
    let client = test_client(mock_transport);

    assert!(client.list_models().await.is_empty());
}

#[tokio::test]
async fn test_model_info_returns_opaque_map() -> Result<()> {
    let metadata = serde_json::json!({
        "modelfile": "FROM llama3.2:3b",
        "parameters": "temperature 0.7",
        "details": { "family": "llama", "parameter_size": "3B" }
    });
    let mock_transport = Arc::new(MockTransport::new().with_json_response("/api/show", &metadata));
    let client = test_client(mock_transport.clone());

    let info = client.model_info("llama3.2:3b").await?;
    assert_eq!(info["modelfile"], "FROM llama3.2:3b");
    assert_eq!(info["details"]["family"], "llama");

    let requests = mock_transport.requests();
    let body = requests[0].body.as_ref().expect("show request has a body");
    assert_eq!(body["name"], "llama3.2:3b");

    Ok(())
}

#[tokio::test]
async fn test_model_info_unknown_name_is_not_found() {
    let mock_transport = Arc::new(MockTransport::new().with_error(
        "/api/show",
        Error::Http {
            status: 404,
            body: r#"{"error":"model 'missing:latest' not found"}"#.to_string(),
        },
    ));
    let client = test_client(mock_transport);

    let err = client.model_info("missing:latest").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(name) if name == "missing:latest"));
}

#[tokio::test]
async fn test_delete_model_success() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new());
    let client = test_client(mock_transport.clone());

    assert!(client.delete_model("old-model:7b").await?);

    let requests = mock_transport.requests();
    assert_eq!(requests[0].path, "/api/delete");
    let body = requests[0].body.as_ref().expect("delete request has a body");
    assert_eq!(body["name"], "old-model:7b");

    Ok(())
}

#[tokio::test]
async fn test_delete_model_absent_name_is_not_found() {
    let mock_transport = Arc::new(MockTransport::new().with_error(
        "/api/delete",
        Error::Http {
            status: 404,
            body: r#"{"error":"model 'missing:latest' not found"}"#.to_string(),
        },
    ));
    let client = test_client(mock_transport);

    let err = client.delete_model("missing:latest").await.unwrap_err();
    assert!(
        matches!(err, Error::NotFound(name) if name == "missing:latest"),
        "expected NotFound, not a transport-class error"
    );
}

#[tokio::test]
async fn test_pull_model_progress_is_non_decreasing_and_ends_at_one() -> Result<()> {
    let lines = vec![
        PullProgress {
            status: "pulling manifest".to_string(),
            ..Default::default()
        },
        PullProgress {
            status: "downloading".to_string(),
            digest: Some("sha256:aaa".to_string()),
            total: Some(100),
            completed: Some(10),
        },
        PullProgress {
            status: "downloading".to_string(),
            digest: Some("sha256:aaa".to_string()),
            total: Some(100),
            completed: Some(55),
        },
        // Next layer starts over with its own byte counts; the fraction
        // reported to the caller must not go backwards.
        PullProgress {
            status: "downloading".to_string(),
            digest: Some("sha256:bbb".to_string()),
            total: Some(50),
            completed: Some(10),
        },
        PullProgress {
            status: "downloading".to_string(),
            digest: Some("sha256:bbb".to_string()),
            total: Some(50),
            completed: Some(50),
        },
        PullProgress {
            status: "verifying sha256 digest".to_string(),
            ..Default::default()
        },
        PullProgress {
            status: "success".to_string(),
            ..Default::default()
        },
    ];
    let mock_transport =
        Arc::new(MockTransport::new().with_json_stream("/api/pull", lines));
    let client = test_client(mock_transport);

    let mut fractions = Vec::new();
    client
        .pull_model("llama3.2:3b", |fraction| fractions.push(fraction))
        .await?;

    assert_eq!(fractions, vec![0.1, 0.55, 1.0]);
    assert!(fractions.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(fractions.last().copied(), Some(1.0));

    Ok(())
}

#[tokio::test]
async fn test_pull_model_emits_final_fraction_on_success() -> Result<()> {
    let lines = vec![
        PullProgress {
            status: "downloading".to_string(),
            total: Some(200),
            completed: Some(100),
            ..Default::default()
        },
        PullProgress {
            status: "success".to_string(),
            ..Default::default()
        },
    ];
    let mock_transport =
        Arc::new(MockTransport::new().with_json_stream("/api/pull", lines));
    let client = test_client(mock_transport);

    let mut fractions = Vec::new();
    client
        .pull_model("llama3.2:3b", |fraction| fractions.push(fraction))
        .await?;

    assert_eq!(fractions, vec![0.5, 1.0]);
    Ok(())
}

#[tokio::test]
async fn test_pull_model_server_error_propagates() {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(
        "/api/pull",
        vec![r#"{"error":"pull model manifest: file does not exist"}"#.to_string()],
    ));
    let client = test_client(mock_transport);

    let err = client
        .pull_model("missing:latest", |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server(_)));
}

#[tokio::test]
async fn test_pull_model_truncated_stream_is_an_error() {
    // Connection ends before the server confirms completion.
    let lines = vec![PullProgress {
        status: "downloading".to_string(),
        total: Some(100),
        completed: Some(40),
        ..Default::default()
    }];
    let mock_transport =
        Arc::new(MockTransport::new().with_json_stream("/api/pull", lines));
    let client = test_client(mock_transport);

    let err = client
        .pull_model("llama3.2:3b", |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn test_stream_delivers_tokens_in_order() -> Result<()> {
    let chunks = vec![
        GenerateResponse {
            model: "test-model".to_string(),
            response: "Hel".to_string(),
            done: false,
            ..Default::default()
        },
        GenerateResponse {
            model: "test-model".to_string(),
            response: "lo".to_string(),
            done: false,
            ..Default::default()
        },
        GenerateResponse {
            model: "test-model".to_string(),
            response: " world".to_string(),
            done: false,
            ..Default::default()
        },
        GenerateResponse {
            model: "test-model".to_string(),
            response: String::new(),
            done: true,
            done_reason: Some("stop".to_string()),
            ..Default::default()
        },
    ];
    let mock_transport =
        Arc::new(MockTransport::new().with_json_stream("/api/generate", chunks));
    let client = test_client(mock_transport);

    let mut tokens = Vec::new();
    client
        .stream("Say hello", |token| tokens.push(token.to_string()), None, None)
        .await?;

    // Tokens arrive in response order and never after the call resolves.
    assert_eq!(tokens, vec!["Hel", "lo", " world"]);
    Ok(())
}

#[tokio::test]
async fn test_stream_server_error_propagates_after_delivered_tokens() {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(
        "/api/generate",
        vec![
            r#"{"model":"test-model","response":"Hi","done":false}"#.to_string(),
            r#"{"error":"generation failed: out of memory"}"#.to_string(),
        ],
    ));
    let client = test_client(mock_transport);

    let mut tokens = Vec::new();
    let err = client
        .stream("Say hello", |token| tokens.push(token.to_string()), None, None)
        .await
        .unwrap_err();

    assert_eq!(tokens, vec!["Hi"]);
    assert!(matches!(err, Error::Server(_)));
}

#[tokio::test]
async fn test_stream_with_cancel_resolves_to_cancelled() {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(
        "/api/generate",
        vec![r#"{"model":"test-model","response":"Hi","done":false}"#.to_string()],
    ));
    let client = test_client(mock_transport);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client
        .stream_with_cancel("Say hello", |_| {}, None, None, cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_set_base_url_does_not_redirect_in_flight_stream() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(
        "/api/generate",
        vec![
            r#"{"model":"test-model","response":"Hi","done":false}"#.to_string(),
            r#"{"model":"test-model","response":"","done":true}"#.to_string(),
        ],
    ));
    let client = ModelHostClient::builder()
        .base_url("http://first.local")
        .default_model("test-model")
        .transport(mock_transport.clone())
        .build()?;

    let request = StreamingGenerateRequest::new("test-model".to_string(), "Say hello".to_string());
    let mut stream = client.generate_stream(request).await?;

    // Reconfigure while the stream is still open.
    client.set_base_url("http://second.local:9999")?;
    while let Some(event) = stream.next().await {
        event?;
    }

    // A later call picks up the new base URL; the dispatched one kept the
    // URL captured at call start.
    let _ = client.list_models().await;

    let requests = mock_transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].base.as_str(), "http://first.local/");
    assert_eq!(requests[1].base.as_str(), "http://second.local:9999/");

    Ok(())
}

#[tokio::test]
async fn test_embed_returns_vector() -> Result<()> {
    let response = EmbeddingsResponse {
        embedding: vec![0.1, -0.2, 0.3],
    };
    let mock_transport =
        Arc::new(MockTransport::new().with_json_response("/api/embeddings", &response));
    let client = test_client(mock_transport.clone());

    let embedding = client.embed("hello world", None).await?;
    assert_eq!(embedding, vec![0.1, -0.2, 0.3]);

    let requests = mock_transport.requests();
    let body = requests[0].body.as_ref().expect("embeddings request has a body");
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["prompt"], "hello world");

    Ok(())
}

#[tokio::test]
async fn test_config_snapshot_reflects_setters() -> Result<()> {
    let client = test_client(Arc::new(MockTransport::new()));

    let config = client.config();
    assert_eq!(config.base_url.as_str(), "http://mock.modelhost.local/");
    assert_eq!(config.default_model, "test-model");

    client.set_default_model("other-model:1b");
    client.set_timeout(Duration::from_secs(5));
    client.set_base_url("http://127.0.0.1:8080")?;

    let config = client.config();
    assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8080/");
    assert_eq!(config.default_model, "other-model:1b");
    assert_eq!(config.timeout, Duration::from_secs(5));

    Ok(())
}

#[tokio::test]
async fn test_builder_rejects_invalid_base_url() {
    let result = ModelHostClient::builder()
        .base_url("definitely not a url")
        .build();
    assert!(matches!(result, Err(Error::Client(_))));
}

#[tokio::test]
async fn test_set_base_url_rejects_invalid_url() {
    let client = test_client(Arc::new(MockTransport::new()));
    let err = client.set_base_url(":: not a url ::").unwrap_err();
    assert!(matches!(err, Error::Client(_)));
}
