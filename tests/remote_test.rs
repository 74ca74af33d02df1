//! HTTP-level tests for the remote source clients.

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use trailarr::config::ConnectionConfig;
use trailarr::remote::{MediaSource, PlexClient, PlexSource, RadarrClient, RemoteError, SonarrClient};
use trailarr_common::{MonitorMode, SourceKind};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "s3cr3t-key";
const TIMEOUT: Duration = Duration::from_secs(5);

fn connection(kind: SourceKind, url: &str) -> ConnectionConfig {
    ConnectionConfig {
        name: kind.to_string(),
        kind,
        url: url.to_string(),
        api_key: API_KEY.to_string(),
        monitor: MonitorMode::New,
        enabled: true,
        path_mappings: Vec::new(),
    }
}

fn radarr(server: &MockServer) -> RadarrClient {
    RadarrClient::new(&connection(SourceKind::Radarr, &server.uri()), TIMEOUT)
}

fn plex(server: &MockServer) -> PlexClient {
    PlexClient::new(&connection(SourceKind::Plex, &server.uri()), TIMEOUT)
}

// ---------------------------------------------------------------------------
// Arr
// ---------------------------------------------------------------------------

#[tokio::test]
async fn radarr_status_reports_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/system/status"))
        .and(header("X-Api-Key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appName": "Radarr",
            "version": "5.2.6.8376",
        })))
        .mount(&server)
        .await;

    let status = radarr(&server).system_status().await.unwrap();
    assert_eq!(status, "Radarr Connection Successful! Version: 5.2.6.8376");
}

#[tokio::test]
async fn radarr_status_rejects_other_app() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/system/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appName": "Sonarr",
            "version": "4.0.0",
        })))
        .mount(&server)
        .await;

    let err = radarr(&server).system_status().await.unwrap_err();
    assert_matches!(err, RemoteError::InvalidResponse(_));
}

#[tokio::test]
async fn unauthorized_does_not_leak_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = radarr(&server).all_media().await.unwrap_err();
    assert_matches!(&err, RemoteError::Connection(message) if message.contains("Unauthorized"));
    assert!(!err.to_string().contains(API_KEY));
}

#[tokio::test]
async fn not_found_names_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = radarr(&server).all_media().await.unwrap_err();
    assert_matches!(&err, RemoteError::Connection(message) if message.contains("/api/v3/movie"));
}

#[tokio::test]
async fn server_error_uses_body_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "database is locked"})),
        )
        .mount(&server)
        .await;

    let err = radarr(&server).all_media().await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::Connection("Internal Server Error: database is locked".to_string())
    );
}

#[tokio::test]
async fn html_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = radarr(&server).all_media().await.unwrap_err();
    assert_matches!(err, RemoteError::InvalidResponse(_));
}

#[tokio::test]
async fn listing_must_be_an_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .mount(&server)
        .await;

    let client = SonarrClient::new(&connection(SourceKind::Sonarr, &server.uri()), TIMEOUT);
    let err = client.all_media().await.unwrap_err();
    assert_matches!(err, RemoteError::InvalidResponse(_));
}

#[tokio::test]
async fn sonarr_lists_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/series"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Fargo", "year": 2014},
            {"id": 2, "title": "Dark", "year": 2017},
        ])))
        .mount(&server)
        .await;

    let client = SonarrClient::new(&connection(SourceKind::Sonarr, &server.uri()), TIMEOUT);
    let media = client.all_media().await.unwrap();
    assert_eq!(media.len(), 2);
    assert_eq!(media[1]["title"], "Dark");
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/movie"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = RadarrClient::new(
        &connection(SourceKind::Radarr, &server.uri()),
        Duration::from_millis(100),
    );
    let err = client.all_media().await.unwrap_err();
    assert_matches!(err, RemoteError::Timeout(_));
}

#[tokio::test]
async fn refused_connection_is_connection_error() {
    let client = RadarrClient::new(&connection(SourceKind::Radarr, "http://127.0.0.1:1"), TIMEOUT);
    let err = client.all_media().await.unwrap_err();
    assert_matches!(err, RemoteError::Connection(_));
}

// ---------------------------------------------------------------------------
// Plex
// ---------------------------------------------------------------------------

async fn mount_sections(server: &MockServer, keys: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .and(header("X-Plex-Token", API_KEY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"MediaContainer": {"Directory": keys}})),
        )
        .mount(server)
        .await;
}

async fn mount_section_media(
    server: &MockServer,
    key: &str,
    media_type: &str,
    items: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(format!("/library/sections/{}/all", key)))
        .and(query_param("type", media_type))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"MediaContainer": {"Metadata": items}})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn plex_status_reports_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/identity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {"machineIdentifier": "abc123", "version": "1.40.0"}
        })))
        .mount(&server)
        .await;

    let status = plex(&server).system_status().await.unwrap();
    assert_eq!(status, "Plex Connection Successful! Version: 1.40.0");
}

#[tokio::test]
async fn plex_lists_movies_then_shows_across_sections() {
    let server = MockServer::start().await;
    mount_sections(&server, json!([{"key": "1"}, {"key": 2}])).await;
    mount_section_media(&server, "1", "1", json!([{"ratingKey": "10", "title": "Heat"}])).await;
    mount_section_media(&server, "2", "1", json!([])).await;
    mount_section_media(&server, "1", "2", json!([])).await;
    mount_section_media(&server, "2", "2", json!([{"ratingKey": "20", "title": "Fargo"}])).await;

    let media = plex(&server).all_media().await.unwrap();
    let titles: Vec<_> = media.iter().map(|m| m["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Heat", "Fargo"]);
}

#[tokio::test]
async fn plex_section_failure_fails_listing() {
    let server = MockServer::start().await;
    mount_sections(&server, json!([{"key": "1"}, {"key": "2"}])).await;
    mount_section_media(&server, "1", "1", json!([{"ratingKey": "10", "title": "Heat"}])).await;
    Mock::given(method("GET"))
        .and(path("/library/sections/2/all"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = plex(&server).all_media().await.unwrap_err();
    assert_matches!(&err, RemoteError::Connection(message) if message.starts_with("Bad Gateway"));
}

#[tokio::test]
async fn plex_has_trailers_checks_extras_subtype() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/metadata/10/extras"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {"Metadata": [
                {"subtype": "behindTheScenes"},
                {"subtype": "trailer"},
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/metadata/11/extras"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {"size": 0}
        })))
        .mount(&server)
        .await;

    let client = plex(&server);
    assert!(client.has_trailers(10).await.unwrap());
    assert!(!client.has_trailers(11).await.unwrap());
}
