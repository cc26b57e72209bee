//! Direct-mode fan-out tests
//!
//! In direct mode the client talks to the provider itself and sends one
//! request per configured model, in provider order.

use numexa::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_for(model: &str, content: &str) -> serde_json::Value {
    json!({
        "id": format!("chatcmpl-{model}"),
        "object": "chat.completion",
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn two_models() -> Config {
    Config::new(
        RoutingMode::Single,
        vec![
            ProviderOptions::new(ProviderType::OpenAi).with_model("gpt-4"),
            ProviderOptions::new(ProviderType::OpenAi).with_model("gpt-3.5-turbo"),
        ],
    )
    .unwrap()
}

fn direct_client(server: &MockServer, policy: FanOutPolicy) -> NumexaClient {
    NumexaClient::new(
        ClientConfig::direct("sk-test")
            .with_base_url(server.uri())
            .with_log_mirroring(false)
            .with_fan_out(policy),
    )
    .unwrap()
}

async fn mount_model(server: &MockServer, model: &str, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": model})))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_direct_mode_sends_one_request_per_model() {
    let mock_server = MockServer::start().await;
    mount_model(
        &mock_server,
        "gpt-4",
        ResponseTemplate::new(200).set_body_json(completion_for("gpt-4", "four")),
    )
    .await;
    mount_model(
        &mock_server,
        "gpt-3.5-turbo",
        ResponseTemplate::new(200).set_body_json(completion_for("gpt-3.5-turbo", "three")),
    )
    .await;

    let client = direct_client(&mock_server, FanOutPolicy::All);
    let request = ChatCompletionRequest::new(vec![Message::user("hi")])
        .with_config(two_models())
        .with_max_tokens(16);
    let fan_out = client.chat_completions().create_all(request).await.unwrap();

    assert_eq!(fan_out.len(), 2);
    let models: Vec<_> = fan_out
        .legs()
        .iter()
        .map(|leg| leg.leg.model.clone().unwrap())
        .collect();
    assert_eq!(models, vec!["gpt-4", "gpt-3.5-turbo"]);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for (req, model) in requests.iter().zip(["gpt-4", "gpt-3.5-turbo"]) {
        let body: serde_json::Value = req.body_json().unwrap();
        assert_eq!(body["model"], model);
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
        assert_eq!(body["max_tokens"], 16);
        assert!(body.get("stream").is_none());
        assert!(body.get("config").is_none());
        assert_eq!(req.headers.get("authorization").unwrap(), "Bearer sk-test");
    }

    let texts: Vec<_> = fan_out
        .into_legs()
        .into_iter()
        .map(|leg| leg.result.unwrap().into_full().unwrap().text().map(str::to_string))
        .collect();
    assert_eq!(texts, vec![Some("four".to_string()), Some("three".to_string())]);
}

#[tokio::test]
async fn test_first_success_stops_dispatch() {
    let mock_server = MockServer::start().await;
    mount_model(
        &mock_server,
        "gpt-4",
        ResponseTemplate::new(200).set_body_json(completion_for("gpt-4", "four")),
    )
    .await;
    mount_model(
        &mock_server,
        "gpt-3.5-turbo",
        ResponseTemplate::new(200).set_body_json(completion_for("gpt-3.5-turbo", "three")),
    )
    .await;

    let client = direct_client(&mock_server, FanOutPolicy::FirstSuccess);
    let completion = client
        .chat_completions()
        .create(ChatCompletionRequest::new(vec![Message::user("hi")]).with_config(two_models()))
        .await
        .unwrap()
        .into_full()
        .unwrap();

    assert_eq!(completion.model.as_deref(), Some("gpt-4"));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_leg_falls_through_to_next_model() {
    let mock_server = MockServer::start().await;
    mount_model(
        &mock_server,
        "gpt-4",
        ResponseTemplate::new(503).set_body_json(json!({"error": {"message": "overloaded"}})),
    )
    .await;
    mount_model(
        &mock_server,
        "gpt-3.5-turbo",
        ResponseTemplate::new(200).set_body_json(completion_for("gpt-3.5-turbo", "three")),
    )
    .await;

    let client = direct_client(&mock_server, FanOutPolicy::FirstSuccess);
    let fan_out = client
        .chat_completions()
        .create_all(ChatCompletionRequest::new(vec![Message::user("hi")]).with_config(two_models()))
        .await
        .unwrap();

    let failures: Vec<_> = fan_out.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.model.as_deref(), Some("gpt-4"));
    assert_eq!(failures[0].1.status_code(), Some(503));
    assert_eq!(fan_out.successes().count(), 1);
}

#[tokio::test]
async fn test_every_leg_failing_reports_each_failure() {
    let mock_server = MockServer::start().await;
    mount_model(&mock_server, "gpt-4", ResponseTemplate::new(500)).await;
    mount_model(&mock_server, "gpt-3.5-turbo", ResponseTemplate::new(429)).await;

    let client = direct_client(&mock_server, FanOutPolicy::FirstSuccess);
    let err = client
        .chat_completions()
        .create(ChatCompletionRequest::new(vec![Message::user("hi")]).with_config(two_models()))
        .await
        .unwrap_err();

    match err {
        LlmError::FanOutFailed { failures } => {
            let statuses: Vec<_> = failures.iter().map(|f| f.error.status_code()).collect();
            assert_eq!(statuses, vec![Some(500), Some(429)]);
            assert_eq!(failures[1].model.as_deref(), Some("gpt-3.5-turbo"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_leg_key_and_overrides_apply_to_that_leg_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-leg"))
        .and(body_partial_json(json!({"model": "gpt-4", "temperature": 0.25})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_for("gpt-4", "four")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::single(
        ProviderOptions::new(ProviderType::OpenAi)
            .with_model("gpt-4")
            .with_api_key("sk-leg")
            .with_override_params(OverrideParams {
                temperature: Some(0.25),
                ..Default::default()
            }),
    )
    .unwrap();

    let client = direct_client(&mock_server, FanOutPolicy::FirstSuccess);
    let completion = client
        .chat_completions()
        .create(
            ChatCompletionRequest::new(vec![Message::user("hi")])
                .with_config(config)
                .with_temperature(0.9),
        )
        .await
        .unwrap()
        .into_full()
        .unwrap();
    assert_eq!(completion.text(), Some("four"));
}
