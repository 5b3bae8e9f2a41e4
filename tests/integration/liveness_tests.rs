//! Liveness gates against mock provider APIs

use crate::test_config;
use contact_crawler::config::{Config, LivenessProvider};
use contact_crawler::crawler::{BatchRunner, CancelFlag};
use contact_crawler::liveness::{build_liveness_gate, LivenessError};
use contact_crawler::output::RecordError;
use serde_json::json;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn siterelic_config(api_server: &MockServer) -> Config {
    let mut config = test_config();
    config.liveness.provider = LivenessProvider::Siterelic;
    config.liveness.endpoint = Some(format!("{}/up", api_server.uri()));
    config.liveness.api_key = "test-key".to_string();
    config
}

fn uptimerobot_config(api_server: &MockServer) -> Config {
    let mut config = test_config();
    config.liveness.provider = LivenessProvider::Uptimerobot;
    config.liveness.endpoint = Some(format!("{}/v2/getMonitors", api_server.uri()));
    config.liveness.api_key = "robot-key".to_string();
    config
}

#[tokio::test]
async fn test_siterelic_reports_up() {
    let api_server = MockServer::start().await;
    let config = siterelic_config(&api_server);

    Mock::given(method("POST"))
        .and(path("/up"))
        .and(header("x-api-key", "test-key"))
        .and(body_json(json!({
            "url": "https://example.com/",
            "followRedirect": true,
            "proxyCountry": "us"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"apiCode": 200, "apiStatus": "success"})),
        )
        .expect(1)
        .mount(&api_server)
        .await;

    let gate = build_liveness_gate(&config.liveness, &config.fetcher).unwrap();
    let url = Url::parse("https://example.com/").unwrap();

    assert!(!gate.is_down(&url).await.unwrap());
}

#[tokio::test]
async fn test_siterelic_reports_down() {
    let api_server = MockServer::start().await;
    let config = siterelic_config(&api_server);

    Mock::given(method("POST"))
        .and(path("/up"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"apiCode": 500, "apiStatus": "error"})),
        )
        .mount(&api_server)
        .await;

    let gate = build_liveness_gate(&config.liveness, &config.fetcher).unwrap();
    let url = Url::parse("https://example.com/").unwrap();

    assert!(gate.is_down(&url).await.unwrap());
}

#[tokio::test]
async fn test_siterelic_rejected_key_is_an_error() {
    let api_server = MockServer::start().await;
    let config = siterelic_config(&api_server);

    Mock::given(method("POST"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&api_server)
        .await;

    let gate = build_liveness_gate(&config.liveness, &config.fetcher).unwrap();
    let url = Url::parse("https://example.com/").unwrap();

    assert!(matches!(
        gate.is_down(&url).await,
        Err(LivenessError::Status(401))
    ));
}

#[tokio::test]
async fn test_uptimerobot_monitor_status() {
    let api_server = MockServer::start().await;
    let config = uptimerobot_config(&api_server);

    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .and(body_string_contains("api_key=robot-key"))
        .and(body_string_contains("format=json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"stat": "ok", "monitors": [{"id": 1, "status": 2}]})),
        )
        .expect(1)
        .mount(&api_server)
        .await;

    let gate = build_liveness_gate(&config.liveness, &config.fetcher).unwrap();
    let url = Url::parse("https://example.com/").unwrap();

    assert!(!gate.is_down(&url).await.unwrap());
}

#[tokio::test]
async fn test_uptimerobot_without_monitors_is_down() {
    let api_server = MockServer::start().await;
    let config = uptimerobot_config(&api_server);

    Mock::given(method("POST"))
        .and(path("/v2/getMonitors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stat": "ok", "monitors": []})))
        .mount(&api_server)
        .await;

    let gate = build_liveness_gate(&config.liveness, &config.fetcher).unwrap();
    let url = Url::parse("https://example.com/").unwrap();

    assert!(gate.is_down(&url).await.unwrap());
}

#[tokio::test]
async fn test_down_site_is_not_crawled() {
    let api_server = MockServer::start().await;
    let site = MockServer::start().await;
    let config = siterelic_config(&api_server);

    Mock::given(method("POST"))
        .and(path("/up"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"apiCode": 404, "apiStatus": "error"})),
        )
        .mount(&api_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("owner@gmail.com"))
        .expect(0)
        .mount(&site)
        .await;

    let runner = Arc::new(BatchRunner::from_config(&config, CancelFlag::new()).unwrap());
    let report = runner.run(vec![site.uri()]).await;

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].error, Some(RecordError::SiteDown));
}

#[tokio::test]
async fn test_provider_failure_follows_fail_policy() {
    let api_server = MockServer::start().await;
    let site = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&api_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>owner@gmail.com</p>", "text/html"),
        )
        .mount(&site)
        .await;

    // Fail open: the site is crawled
    let mut config = siterelic_config(&api_server);
    config.liveness.fail_open = true;
    let runner = Arc::new(BatchRunner::from_config(&config, CancelFlag::new()).unwrap());
    let report = runner.run(vec![site.uri()]).await;
    assert!(report.records[0].emails.contains("owner@gmail.com"));

    // Fail closed: the site is reported down
    config.liveness.fail_open = false;
    let runner = Arc::new(BatchRunner::from_config(&config, CancelFlag::new()).unwrap());
    let report = runner.run(vec![site.uri()]).await;
    assert_eq!(report.records[0].error, Some(RecordError::SiteDown));
}
