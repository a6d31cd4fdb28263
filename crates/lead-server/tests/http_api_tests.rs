use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test, web, App, Error,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lead_core::{SessionStore, SqliteSessionStore};
use lead_llm::{ModelCatalog, ProviderConfigs, ProviderRegistry, ProviderSettings};
use lead_server::{app_config, AppState};
use lead_studio::{Connection, GitHubClient};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use wiremock::http::Method;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POST: &str = "---\ntitle: Old Title\ndescription: How chat widgets capture leads\nlayout: post\n---\nChat widgets turn visitors into leads.\n";

struct Upstreams {
    llm: MockServer,
    github: MockServer,
    _dir: TempDir,
}

async fn setup_test_environment() -> (
    impl Service<Request, Response = ServiceResponse, Error = Error>,
    Upstreams,
) {
    let dir = tempdir().expect("tempdir");
    let llm = MockServer::start().await;
    let github = MockServer::start().await;

    let configs = ProviderConfigs {
        openai: Some(ProviderSettings {
            api_key: "sk-test".to_string(),
            base_url: Some(llm.uri()),
        }),
        ..ProviderConfigs::default()
    };
    let registry = Arc::new(ProviderRegistry::from_config(ModelCatalog::builtin(), &configs));

    let store = SqliteSessionStore::new(dir.path().join("sessions.db"));
    store.init().await.expect("init store");

    let git_host = GitHubClient::new(Some("gh-token".to_string())).with_base_url(github.uri());
    let state = web::Data::new(AppState::new(
        registry,
        Arc::new(store),
        Arc::new(git_host),
        vec![Connection::new("blog", "acme", "site").with_content_dir("content")],
        "gpt-4o-mini",
    ));

    let app = test::init_service(App::new().app_data(state.clone()).configure(app_config)).await;
    (
        app,
        Upstreams {
            llm,
            github,
            _dir: dir,
        },
    )
}

fn completion(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
    }))
}

async fn mount_file(github: &MockServer, file_path: &str, content: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/site/contents/{}", file_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "path": file_path,
            "sha": "blob-1",
            "encoding": "base64",
            "content": STANDARD.encode(content),
        })))
        .mount(github)
        .await;
}

async fn post_json(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post().uri(uri).set_json(&body).to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

#[actix_web::test]
async fn test_health_endpoint() {
    let (app, _upstreams) = setup_test_environment().await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["status"], "ok");
}

#[actix_web::test]
async fn test_models_lists_whole_catalog() {
    let (app, _upstreams) = setup_test_environment().await;

    let req = test::TestRequest::get().uri("/api/v1/models").to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;

    let models = resp["models"].as_array().unwrap();
    assert_eq!(models.len(), ModelCatalog::builtin().entries().len());
    let gpt = models.iter().find(|m| m["key"] == "gpt-4o").unwrap();
    assert_eq!(gpt["available"], true);
    assert_eq!(gpt["provider"], "openai");
    let grok = models.iter().find(|m| m["key"] == "grok-3").unwrap();
    assert_eq!(grok["available"], false);
    assert_eq!(resp["defaultModel"], "gpt-4o-mini");
}

#[actix_web::test]
async fn test_model_test_unknown_key_makes_no_call() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .respond_with(completion("never"))
        .expect(0)
        .mount(&upstreams.llm)
        .await;

    let (status, body) =
        post_json(&app, "/api/v1/models/llama-9000/test", json!({ "message": "hi" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("llama-9000"));
}

#[actix_web::test]
async fn test_model_test_returns_reply() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("Hello there!"))
        .expect(1)
        .mount(&upstreams.llm)
        .await;

    let (status, body) =
        post_json(&app, "/api/v1/models/gpt-4o/test", json!({ "message": "hi" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Hello there!");
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["usage"]["totalTokens"], 20);
}

#[actix_web::test]
async fn test_model_test_provider_failure_is_bad_gateway() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal provider detail"))
        .mount(&upstreams.llm)
        .await;

    let (status, body) =
        post_json(&app, "/api/v1/models/gpt-4o/test", json!({ "message": "hi" })).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["message"], "failed to process message");
}

#[actix_web::test]
async fn test_content_creation_chat_scenario() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion(
            "Here is an intro. You could add a statistic up front. I recommend a question hook.",
        ))
        .mount(&upstreams.llm)
        .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/chat",
        json!({
            "message": "Write an intro about SEO",
            "userId": "user-1",
            "sessionType": "content_creation"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messageCount"], 2);
    assert_eq!(
        body["suggestions"],
        json!(["Add a statistic up front", "A question hook"])
    );

    let sent = upstreams.llm.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&sent[0].body).unwrap();
    let messages = sent["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    assert!(messages[0]["content"].as_str().unwrap().contains("content strategist"));
    assert_eq!(messages[1]["content"], "Write an intro about SEO");

    let session_id = body["sessionId"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/sessions/{}", session_id))
        .to_request();
    let session: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(session["messages"].as_array().unwrap().len(), 2);
    assert_eq!(session["sessionType"], "content_creation");
}

#[actix_web::test]
async fn test_n_exchanges_store_two_n_messages() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .respond_with(completion("Noted."))
        .mount(&upstreams.llm)
        .await;

    let (_, first) = post_json(
        &app,
        "/api/v1/chat",
        json!({ "message": "Turn 1", "userId": "user-2" }),
    )
    .await;
    let session_id = first["sessionId"].as_str().unwrap().to_string();

    for turn in 2..=4 {
        let (status, body) = post_json(
            &app,
            "/api/v1/chat",
            json!({ "message": format!("Turn {}", turn), "sessionId": session_id }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messageCount"], turn * 2);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/sessions/{}", session_id))
        .to_request();
    let session: Value = test::call_and_read_body_json(&app, req).await;
    let contents: Vec<&str> = session["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(
        contents,
        vec!["Turn 1", "Noted.", "Turn 2", "Noted.", "Turn 3", "Noted.", "Turn 4", "Noted."]
    );
}

#[actix_web::test]
async fn test_provider_error_leaves_session_unchanged() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .respond_with(completion("First reply"))
        .up_to_n_times(1)
        .mount(&upstreams.llm)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&upstreams.llm)
        .await;

    let (_, first) = post_json(
        &app,
        "/api/v1/chat",
        json!({ "message": "Hello", "userId": "user-3" }),
    )
    .await;
    let session_id = first["sessionId"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        &app,
        "/api/v1/chat",
        json!({ "message": "Are you there?", "sessionId": session_id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["message"], "failed to process message");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/sessions/{}", session_id))
        .to_request();
    let session: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(session["messages"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_chat_with_unknown_session_is_not_found() {
    let (app, _upstreams) = setup_test_environment().await;

    let (status, body) = post_json(
        &app,
        "/api/v1/chat",
        json!({ "message": "Hello", "sessionId": "missing" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found_error");
}

#[actix_web::test]
async fn test_malformed_json_uses_error_envelope() {
    let (app, _upstreams) = setup_test_environment().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/chat")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[actix_web::test]
async fn test_sessions_list_filters_by_user() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .respond_with(completion("Hi"))
        .mount(&upstreams.llm)
        .await;

    for (user, content) in [("alice", "agent-1"), ("alice", "agent-2"), ("bob", "agent-1")] {
        post_json(
            &app,
            "/api/v1/chat",
            json!({ "message": "Hello", "userId": user, "contentId": content }),
        )
        .await;
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/sessions?user_id=alice")
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["total"], 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/sessions?user_id=alice&content_id=agent-2")
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["total"], 1);
    assert_eq!(resp["sessions"][0]["messageCount"], 2);
}

#[actix_web::test]
async fn test_content_generate() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("POST"))
        .respond_with(completion("## Why lead capture matters\n\nBody"))
        .mount(&upstreams.llm)
        .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/content/generate",
        json!({ "title": "Lead capture", "keywords": ["lead capture"], "length": "short" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["content"].as_str().unwrap().starts_with("## Why lead capture"));
    let sent = upstreams.llm.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert!(sent["messages"][0]["content"].as_str().unwrap().contains("500-800 words"));
}

#[actix_web::test]
async fn test_studio_lists_connections_without_tokens() {
    let (app, _upstreams) = setup_test_environment().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/studio/connections")
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["connections"][0]["repository"], "acme/site");
    assert!(resp["connections"][0].get("token").is_none());
}

#[actix_web::test]
async fn test_studio_file_exposes_editable_fields() {
    let (app, upstreams) = setup_test_environment().await;
    mount_file(&upstreams.github, "content/hello.md", POST).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/studio/connections/blog/file?path=content/hello.md")
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(resp["sha"], "blob-1");
    let fields = resp["fields"].as_array().unwrap();
    let title = fields.iter().find(|f| f["path"] == "title").unwrap();
    assert_eq!(title["fieldType"], "string");
    assert_eq!(title["editable"], true);
    let layout = fields.iter().find(|f| f["path"] == "layout").unwrap();
    assert_eq!(layout["editable"], false);
}

#[actix_web::test]
async fn test_studio_preview_title_patch() {
    let (app, upstreams) = setup_test_environment().await;
    mount_file(&upstreams.github, "content/hello.md", POST).await;
    Mock::given(method("POST"))
        .respond_with(completion("unused"))
        .expect(0)
        .mount(&upstreams.llm)
        .await;

    let patch = json!({ "path": "title", "value": "New Title", "operation": "replace" });
    let (status, body) = post_json(
        &app,
        "/api/v1/studio/connections/blog/preview",
        json!({ "path": "content/hello.md", "patches": [patch.clone()] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appliedPatches"], json!([patch]));
    assert_eq!(body["additions"], 1);
    assert_eq!(body["deletions"], 1);
    assert_eq!(
        body["fullDiff"],
        json!([
            { "kind": "removed", "oldLine": 2, "content": "title: Old Title" },
            { "kind": "added", "newLine": 2, "content": "title: New Title" }
        ])
    );
    assert_eq!(body["proposed"], POST.replace("Old Title", "New Title"));
}

#[actix_web::test]
async fn test_studio_apply_missing_file_commits_nothing() {
    let (app, upstreams) = setup_test_environment().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&upstreams.github)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstreams.github)
        .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/studio/connections/blog/apply",
        json!({
            "path": "content/gone.md",
            "patches": [{ "path": "title", "value": "New Title" }],
            "commitMessage": "Update title"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found_error");
}

#[actix_web::test]
async fn test_studio_apply_commits_patched_file() {
    let (app, upstreams) = setup_test_environment().await;
    mount_file(&upstreams.github, "content/hello.md", POST).await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/site/contents/content/hello.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "path": "content/hello.md", "sha": "blob-2" },
            "commit": { "sha": "commit-1" }
        })))
        .expect(1)
        .mount(&upstreams.github)
        .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/studio/connections/blog/apply",
        json!({
            "path": "content/hello.md",
            "patches": [{ "path": "title", "value": "New Title" }],
            "commitMessage": "Update title"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commit"]["commitSha"], "commit-1");

    let put = upstreams
        .github
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method == Method::Put)
        .unwrap();
    let put: Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(put["sha"], "blob-1");
    assert_eq!(put["branch"], "main");
    let committed = STANDARD.decode(put["content"].as_str().unwrap()).unwrap();
    assert_eq!(
        String::from_utf8(committed).unwrap(),
        POST.replace("Old Title", "New Title")
    );
}

#[actix_web::test]
async fn test_studio_preview_with_unparsable_rewrite_is_bad_gateway() {
    let (app, upstreams) = setup_test_environment().await;
    mount_file(&upstreams.github, "content/hello.md", POST).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(completion("---\ntitle: [broken\n---\nBody\n"))
        .mount(&upstreams.llm)
        .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/studio/connections/blog/preview",
        json!({ "path": "content/hello.md", "prompt": "punchier" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["type"], "upstream_error");
    assert_eq!(body["error"]["message"], "model returned unusable output");
}

#[actix_web::test]
async fn test_studio_apply_accepts_leading_slash_path() {
    let (app, upstreams) = setup_test_environment().await;
    mount_file(&upstreams.github, "content/hello.md", POST).await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/site/contents/content/hello.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "path": "content/hello.md", "sha": "blob-2" },
            "commit": { "sha": "commit-2" }
        })))
        .expect(1)
        .mount(&upstreams.github)
        .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/studio/connections/blog/apply",
        json!({
            "path": "/content/hello.md",
            "patches": [{ "path": "title", "value": "New Title" }],
            "commitMessage": "Update title"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "content/hello.md");
    assert_eq!(body["commit"]["commitSha"], "commit-2");
}

#[actix_web::test]
async fn test_studio_preview_rejects_mistyped_patch() {
    let (app, upstreams) = setup_test_environment().await;
    mount_file(
        &upstreams.github,
        "content/draft.md",
        "---\ntitle: Draft\ndraft: false\n---\nBody\n",
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/v1/studio/connections/blog/preview",
        json!({
            "path": "content/draft.md",
            "patches": [{ "path": "draft", "value": "banana" }]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[actix_web::test]
async fn test_studio_unknown_connection_is_not_found() {
    let (app, _upstreams) = setup_test_environment().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/studio/connections/docs/tree")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
