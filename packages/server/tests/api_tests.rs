mod helpers;

use std::time::Duration;

use helpers::TestServer;
use promptlift_ai_provider::models::Provider;
use promptlift_server::ServerConfig;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn grok_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": text } }]
    }))
}

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    }))
}

fn grok_config(mock_server: &MockServer) -> ServerConfig {
    ServerConfig::default()
        .with_api_key(Provider::Grok, Some("test-grok-key".to_string()))
        .with_ai_base_url(Provider::Grok, Some(mock_server.uri()))
}

fn github_config(mock_server: &MockServer) -> ServerConfig {
    ServerConfig::default().with_github_base_url(Some(mock_server.uri()))
}

async fn post(server: &TestServer, route: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(server.url(route))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}

async fn mount_sample_repo(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "a.txt", "path": "a.txt", "type": "file", "size": 5 },
            { "name": "dir", "path": "dir", "type": "dir", "size": 0 },
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/contents/dir"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "b.txt", "path": "dir/b.txt", "type": "file", "size": 5 },
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/contents/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "a.txt", "path": "a.txt", "type": "file", "size": 5,
            "content": "aGVsbG8=\n", "encoding": "base64"
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/contents/dir/b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "b.txt", "path": "dir/b.txt", "type": "file", "size": 5,
            "content": "d29y\nbGQ=\n", "encoding": "base64"
        })))
        .mount(mock_server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_health_carries_security_and_cors_headers() {
    let server = TestServer::start(ServerConfig::default()).await.unwrap();

    let response = reqwest::get(server.url("/health")).await.unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers().clone();
    assert_eq!(response.text().await.unwrap(), "OK");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[test_log::test(tokio::test)]
async fn test_preflight_returns_no_content_with_cors_headers() {
    let server = TestServer::start(ServerConfig::default()).await.unwrap();

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, server.url("/api/generate-code"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert!(
        response.headers()["access-control-allow-methods"]
            .to_str()
            .unwrap()
            .contains("POST")
    );
}

#[test_log::test(tokio::test)]
async fn test_enhance_prompt_returns_one_result_per_template_in_order() {
    let mock_server = MockServer::start().await;
    for (marker, reply) in [
        ("Chain-of-Thought", "enhanced chain"),
        ("Tree-of-Thoughts", "enhanced tree"),
        ("Decomposition: Sub-tasks", "enhanced decomposition"),
    ] {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-grok-key"))
            .and(body_string_contains(marker))
            .respond_with(grok_reply(reply))
            .expect(1)
            .mount(&mock_server)
            .await;
    }
    let server = TestServer::start(grok_config(&mock_server)).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/enhance-prompt",
        json!({ "provider": "grok", "prompt": "a todo app", "level": "advanced" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "enhanced": ["enhanced chain", "enhanced tree", "enhanced decomposition"] })
    );
}

#[test_log::test(tokio::test)]
async fn test_generate_code_with_gemini() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/v1beta/models/gemini-1.5-flash-latest:generateContent",
        ))
        .and(header("x-goog-api-key", "test-gemini-key"))
        .and(body_string_contains(
            "Generate production-ready code based on this prompt: a parser.",
        ))
        .respond_with(gemini_reply("fn parse() {}"))
        .expect(1)
        .mount(&mock_server)
        .await;
    let config = ServerConfig::default()
        .with_api_key(Provider::Gemini, Some("test-gemini-key".to_string()))
        .with_ai_base_url(Provider::Gemini, Some(mock_server.uri()));
    let server = TestServer::start(config).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/generate-code",
        json!({ "aiType": "gemini", "prompt": "a parser", "level": "production" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "code": "fn parse() {}" }));
}

#[test_log::test(tokio::test)]
async fn test_enhance_code_embeds_only_first_8000_characters() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(grok_reply("improved"))
        .expect(1)
        .mount(&mock_server)
        .await;
    let server = TestServer::start(grok_config(&mock_server)).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/enhance-code",
        json!({ "provider": "grok", "codeBase": "q".repeat(10_000), "level": "basic" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "enhancedCode": "improved" }));

    let requests = mock_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let message = sent["messages"][0]["content"].as_str().unwrap();
    assert!(message.starts_with("Take this code base: "));
    assert_eq!(message.matches('q').count(), 8000);
}

#[test_log::test(tokio::test)]
async fn test_ai_rate_limit_is_retried_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(grok_reply("second time lucky"))
        .mount(&mock_server)
        .await;
    let server = TestServer::start(grok_config(&mock_server)).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/generate-code",
        json!({ "provider": "grok", "prompt": "p", "level": "basic" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["code"], "second time lucky");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_upstream_failure_is_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": { "message": "model overloaded" } })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    let server = TestServer::start(grok_config(&mock_server)).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/generate-code",
        json!({ "provider": "grok", "prompt": "p", "level": "basic" }),
    )
    .await;

    assert_eq!(status, 500);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Grok API call failed with status 500: model overloaded"));
}

#[test_log::test(tokio::test)]
async fn test_missing_credential_is_server_error_without_network_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("unused"))
        .expect(0)
        .mount(&mock_server)
        .await;
    let config =
        ServerConfig::default().with_ai_base_url(Provider::Gemini, Some(mock_server.uri()));
    let server = TestServer::start(config).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/generate-code",
        json!({ "provider": "gemini", "prompt": "p", "level": "basic" }),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body, json!({ "error": "Missing credential for Gemini" }));
}

#[test_log::test(tokio::test)]
async fn test_validation_errors_are_bad_requests() {
    let server = TestServer::start(ServerConfig::default()).await.unwrap();

    let cases = [
        (
            "/api/enhance-prompt",
            json!({ "provider": "grok", "prompt": "", "level": "basic" }),
            "Missing required field: prompt",
        ),
        (
            "/api/generate-code",
            json!({ "provider": "openai", "prompt": "p", "level": "basic" }),
            "Unsupported provider: openai",
        ),
        (
            "/api/enhance-code",
            json!({ "provider": "grok", "codeBase": "x", "level": "expert" }),
            "Invalid level: expert",
        ),
        (
            "/api/ingest-repo",
            json!({}),
            "Missing required field: repoUrl",
        ),
        (
            "/api/ingest-repo",
            json!({ "repoUrl": "not a url" }),
            "Invalid repository URL: not a url",
        ),
    ];

    for (route, request, expected) in cases {
        let (status, body) = post(&server, route, request).await;
        assert_eq!(status, 400, "{route}");
        assert_eq!(body, json!({ "error": expected }), "{route}");
    }
}

#[test_log::test(tokio::test)]
async fn test_malformed_json_is_bad_request() {
    let server = TestServer::start(ServerConfig::default()).await.unwrap();

    let response = reqwest::Client::new()
        .post(server.url("/api/enhance-prompt"))
        .header("content-type", "application/json")
        .body("{\"provider\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

#[test_log::test(tokio::test)]
async fn test_ingest_repo_flattens_through_github() {
    let mock_server = MockServer::start().await;
    mount_sample_repo(&mock_server).await;
    let server = TestServer::start(github_config(&mock_server)).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/ingest-repo",
        json!({ "repoUrl": "https://github.com/owner/repo" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "codeBase": "a.txt:\nhello\n\ndir/b.txt:\nworld\n\n" })
    );
}

#[test_log::test(tokio::test)]
async fn test_ingest_repo_restarts_after_rate_limit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/owner/repo/contents/dir"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_sample_repo(&mock_server).await;
    let server = TestServer::start(github_config(&mock_server)).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/ingest-repo",
        json!({ "repoUrl": "github.com/owner/repo.git" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body["codeBase"],
        "a.txt:\nhello\n\ndir/b.txt:\nworld\n\n"
    );
    let root_listings = mock_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/repos/owner/repo/contents")
        .count();
    assert_eq!(root_listings, 2);
}

#[test_log::test(tokio::test)]
async fn test_ingest_repo_not_found_is_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })),
        )
        .mount(&mock_server)
        .await;
    let server = TestServer::start(github_config(&mock_server)).await.unwrap();

    let (status, body) = post(
        &server,
        "/api/ingest-repo",
        json!({ "repoUrl": "https://github.com/owner/missing" }),
    )
    .await;

    assert_eq!(status, 500);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to fetch repository owner/missing")
    );
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_gateway_rate_limit_refuses_excess_requests() {
    let config = ServerConfig::default().with_rate_limit(2, Duration::from_secs(60));
    let server = TestServer::start_raw(config).await.unwrap();

    for _ in 0..2 {
        let (status, _) = post(&server, "/api/ingest-repo", json!({})).await;
        assert_eq!(status, 400);
    }

    let response = reqwest::Client::new()
        .post(server.url("/api/ingest-repo"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let health = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(health.status(), 200);
}
