use llm_switchboard::credential::Credential;
use llm_switchboard::provider::ModelFilter;
use llm_switchboard::types::{GenerationRequest, SamplingParameters};
use llm_switchboard::{AppConfig, DispatchError, Dispatcher, ProviderSettings};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

const KEY: &str = "sk-test";

fn dispatcher_for(provider: &str, server: &ServerGuard) -> Dispatcher {
    let config = AppConfig::default().with_provider(
        provider,
        ProviderSettings::default().with_endpoint(server.url()),
    );
    Dispatcher::new(config)
}

fn models_body() -> String {
    json!({
        "object": "list",
        "data": [
            {"id": "gpt-4o", "object": "model"},
            {"id": "gpt-4o-mini", "object": "model"}
        ]
    })
    .to_string()
}

fn completion_body() -> String {
    json!({
        "id": "chatcmpl-123",
        "model": "gpt-4o-2024-08-06",
        "system_fingerprint": "fp_abc",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "  Rayleigh scattering.  "},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
    .to_string()
}

#[tokio::test]
async fn generates_through_listed_model() {
    let mut server = Server::new_async().await;
    let models = server
        .mock("GET", "/v1/models")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(models_body())
        .create_async()
        .await;
    let chat = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o",
            "temperature": 0.5,
            "max_tokens": 150
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body())
        .create_async()
        .await;

    let dispatcher = dispatcher_for("openai", &server);
    let request = GenerationRequest::new("OpenAI", "gpt-4o", "Why is the sky blue?")
        .with_parameters(SamplingParameters {
            temperature: Some(0.5),
            ..SamplingParameters::default()
        });
    let result = dispatcher
        .generate(&request, Credential::new(KEY))
        .await
        .expect("generation succeeds");

    assert_eq!(result.content, "Rayleigh scattering.");
    assert_eq!(result.id.as_deref(), Some("chatcmpl-123"));
    let metadata = result.metadata.expect("metadata");
    assert_eq!(metadata.model_name, "gpt-4o-2024-08-06");
    assert_eq!(metadata.finish_reason.as_deref(), Some("stop"));
    let usage = result.usage.expect("usage");
    assert_eq!(usage.total_tokens, 15);

    models.assert_async().await;
    chat.assert_async().await;
}

#[tokio::test]
async fn unlisted_model_never_reaches_the_vendor() {
    let mut server = Server::new_async().await;
    let _models = server
        .mock("GET", "/v1/models")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(models_body())
        .create_async()
        .await;
    let chat = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let dispatcher = dispatcher_for("openai", &server);
    let request = GenerationRequest::new("openai", "gpt-9", "hello");
    let err = dispatcher
        .generate(&request, Credential::new(KEY))
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        DispatchError::InvalidModel { provider, model, note: None }
            if provider == "openai" && model == "gpt-9"
    ));
    assert_eq!(err.kind(), "invalid_model");
    chat.assert_async().await;
}

#[tokio::test]
async fn failed_listing_falls_back_to_known_models() {
    let mut server = Server::new_async().await;
    let _models = server
        .mock("GET", "/v1/models")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;
    let chat = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({"model": "gpt-3.5-turbo"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body())
        .create_async()
        .await;

    let dispatcher = dispatcher_for("openai", &server);

    let listing = dispatcher
        .list_models("openai", Credential::new(KEY), None)
        .await
        .expect("listing never fails outright");
    assert_eq!(listing.status(), "degraded");
    assert_eq!(listing.models(), ["gpt-3.5-turbo".to_string()]);
    assert!(listing.note().is_some());

    let rejected = dispatcher
        .generate(
            &GenerationRequest::new("openai", "gpt-4o", "hello"),
            Credential::new(KEY),
        )
        .await
        .unwrap_err();
    match rejected {
        DispatchError::InvalidModel { note, .. } => {
            let note = note.expect("degraded listing carries a note");
            assert!(!note.contains("upstream exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    dispatcher
        .generate(
            &GenerationRequest::new("openai", "gpt-3.5-turbo", "hello"),
            Credential::new(KEY),
        )
        .await
        .expect("fallback model is selectable");
    chat.assert_async().await;
}

#[tokio::test]
async fn vendor_failure_is_a_generation_error() {
    let mut server = Server::new_async().await;
    let _models = server
        .mock("GET", "/v1/models")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(models_body())
        .create_async()
        .await;
    let _chat = server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"rate limited for key sk-test"}}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher_for("openai", &server);
    let err = dispatcher
        .generate(
            &GenerationRequest::new("openai", "gpt-4o", "hello"),
            Credential::new(KEY),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "generation_failed");
    assert!(!err.user_message().contains("sk-test"));
}

#[tokio::test]
async fn listing_filter_is_applied() {
    let mut server = Server::new_async().await;
    let _models = server
        .mock("GET", "/v1/models")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(models_body())
        .create_async()
        .await;

    let dispatcher = dispatcher_for("groq", &server);
    let filter = ModelFilter::search("MINI");
    let listing = dispatcher
        .list_models("groq", Credential::new(KEY), Some(&filter))
        .await
        .expect("listing");

    assert_eq!(listing.status(), "available");
    assert_eq!(listing.models(), ["gpt-4o-mini".to_string()]);
}

#[tokio::test]
async fn count_tokens_is_zero_without_vendor_support() {
    let mut server = Server::new_async().await;
    let _models = server
        .mock("GET", "/v1/models")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(models_body())
        .create_async()
        .await;

    let dispatcher = dispatcher_for("openai", &server);
    let tokens = dispatcher
        .count_tokens("openai", "gpt-4o", "some text", Credential::new(KEY))
        .await
        .expect("count");
    assert_eq!(tokens, 0);
}

#[tokio::test]
async fn missing_required_setting_is_unavailable() {
    let dispatcher = Dispatcher::new(AppConfig::default());
    let err = dispatcher
        .list_models("databricks", Credential::new(KEY), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "adapter_unavailable");
    assert!(err.to_string().contains("databricks"));
}

#[tokio::test]
async fn text2text_model_is_listed_and_generates() {
    let mut server = Server::new_async().await;
    let _text = server
        .mock("GET", "/api/models")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pipeline_tag".into(), "text-generation".into()),
            Matcher::UrlEncoded("search".into(), "google/flan-t5-base".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;
    let _text2text = server
        .mock("GET", "/api/models")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pipeline_tag".into(), "text2text-generation".into()),
            Matcher::UrlEncoded("search".into(), "google/flan-t5-base".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":"google/flan-t5-base","pipeline_tag":"text2text-generation"}]"#)
        .create_async()
        .await;
    let _card = server
        .mock("GET", "/api/models/google/flan-t5-base")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"google/flan-t5-base","pipeline_tag":"text2text-generation"}"#)
        .create_async()
        .await;
    let inference = server
        .mock("POST", "/models/google/flan-t5-base")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"generated_text":" Paris "}]"#)
        .create_async()
        .await;

    let dispatcher = dispatcher_for("huggingface", &server);
    let result = dispatcher
        .generate(
            &GenerationRequest::new("huggingface", "google/flan-t5-base", "Capital of France?"),
            Credential::new(KEY),
        )
        .await
        .expect("text2text model generates");

    assert_eq!(result.content, "Paris");
    inference.assert_async().await;
}
