//! Completion client integration tests
//!
//! Runs the client against a local mock of the completions endpoint to pin
//! down the truncation-continuation behavior and the wire format.

use ember_agent::completion::{
    CONTINUATION_PROMPT, CompletionClient, CompletionEngine, Message,
};
use ember_agent::config::CompletionConfig;
use ember_agent::Error;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CompletionClient {
    CompletionClient::new("pplx-test-key".to_string(), CompletionConfig::default())
        .unwrap()
        .with_base_url(format!("{}/chat/completions", server.uri()))
}

fn choice_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

fn opening_messages() -> Vec<Message> {
    vec![
        Message::system("You are a test persona."),
        Message::user("tell me something"),
    ]
}

#[tokio::test]
async fn truncated_reply_is_continued_and_joined_with_a_space() {
    let server = MockServer::start().await;

    // Continuation calls carry the fixed prompt; match them first
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(CONTINUATION_PROMPT))
        .respond_with(ResponseTemplate::new(200).set_body_json(choice_body("friend.")))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(choice_body("Hello there")))
        .with_priority(5)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.complete(&opening_messages()).await.unwrap();
    assert_eq!(reply, "Hello there friend.");
}

#[tokio::test]
async fn continuation_stops_at_the_depth_bound() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(choice_body("still going")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.complete(&opening_messages()).await.unwrap();

    // Opening call plus max_continuation_depth continuations, never more
    assert_eq!(reply, "still going still going still going");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn complete_reply_makes_a_single_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(choice_body("All done here.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.complete(&opening_messages()).await.unwrap();
    assert_eq!(reply, "All done here.");
}

#[tokio::test]
async fn non_success_status_surfaces_as_completion_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete(&opening_messages()).await.unwrap_err();
    match err {
        Error::Completion(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("upstream exploded"));
        }
        other => panic!("expected a completion error, got {other:?}"),
    }
}

#[tokio::test]
async fn continuation_request_preserves_the_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(CONTINUATION_PROMPT))
        .respond_with(ResponseTemplate::new(200).set_body_json(choice_body("done.")))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(choice_body("unfinished thought")))
        .with_priority(5)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.complete(&opening_messages()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let follow: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    let messages = follow["messages"].as_array().unwrap();

    // Same system prefix, only the final user message swapped
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], "You are a test persona.");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], CONTINUATION_PROMPT);
}

#[tokio::test]
async fn request_carries_the_expected_sampling_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(choice_body("Noted.")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.complete(&opening_messages()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(body["model"], "llama-3.1-sonar-small-128k-online");
    assert_eq!(body["max_tokens"], 150);
    assert_eq!(body["temperature"], 0.7);
    assert_eq!(body["top_p"], 0.9);
    assert_eq!(body["stream"], false);
    assert_eq!(body["search_recency_filter"], "month");
    assert_eq!(body["search_domain_filter"][0], "perplexity.ai");
}

#[tokio::test]
async fn missing_api_key_is_rejected_at_construction() {
    let err = CompletionClient::new(String::new(), CompletionConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
