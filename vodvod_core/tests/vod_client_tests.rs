use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vodvod_core::config::VodApiConfig;
use vodvod_core::vod::{filter_vods, VodApiError, VodClient};

fn client_for(server: &MockServer) -> VodClient {
    VodClient::new(VodApiConfig::default().with_base_url(server.uri())).unwrap()
}

fn sample_listing() -> serde_json::Value {
    json!([
        {
            "Link": "/vods/1/index.m3u8",
            "Metadata": {
                "TitleAtStart": "Any% attempts",
                "StreamerLoginAtStart": "runner",
                "GameNameAtStart": "Celeste",
                "MaxViews": 42,
                "HlsDurationSeconds": {"Float64": 7200.0, "Valid": true}
            }
        },
        {
            "Link": "/vods/2/index.m3u8",
            "Metadata": {
                "TitleAtStart": "Late night chess",
                "StreamerLoginAtStart": "knight",
                "GameNameAtStart": "Chess"
            }
        }
    ])
}

#[tokio::test]
async fn test_fetch_all_parses_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all/private"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let vods = client.fetch_all().await.unwrap();

    assert_eq!(vods.len(), 2);
    assert_eq!(vods[0].title(), "Any% attempts");
    assert_eq!(vods[0].views(), 42);
    assert_eq!(vods[0].duration_secs(), 7200.0);
    assert_eq!(
        client.stream_url(&vods[1]),
        format!("{}/vods/2/index.m3u8", server.uri())
    );

    let chess = filter_vods(&vods, "CHESS");
    assert_eq!(chess.len(), 1);
    assert_eq!(chess[0].streamer(), "knight");
}

#[tokio::test]
async fn test_fetch_streamer_normalizes_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/@runner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([sample_listing()[0]])))
        .expect(1)
        .mount(&server)
        .await;

    let vods = client_for(&server).fetch_streamer("  Runner ").await.unwrap();
    assert_eq!(vods.len(), 1);
    assert_eq!(vods[0].streamer(), "runner");
}

#[tokio::test]
async fn test_blank_streamer_falls_back_to_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all/private"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_listing()))
        .expect(1)
        .mount(&server)
        .await;

    let vods = client_for(&server).fetch_streamer("   ").await.unwrap();
    assert_eq!(vods.len(), 2);
}

#[tokio::test]
async fn test_null_listing_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .mount(&server)
        .await;

    let vods = client_for(&server).fetch_streamer("nobody").await.unwrap();
    assert!(vods.is_empty());
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_all().await.unwrap_err();
    assert!(matches!(err, VodApiError::Status(500)));
    assert_eq!(err.to_string(), "Network error: 500");
}

#[tokio::test]
async fn test_malformed_body_is_a_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_all().await.unwrap_err();
    assert!(matches!(err, VodApiError::Request(_)));
}
