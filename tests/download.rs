// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;

use m3u_iptv::config::NetworkConfig;
use m3u_iptv::error::{ContentError, Error, TransportError};
use m3u_iptv::{Credentials, PlaylistClient};

const PLAYLIST: &str = "#EXTM3U\n\
    #EXTINF:-1 tvg-logo=\"http://logo/globo.png\" group-title=\"Canais\",Globo HD\n\
    http://stream.example/live/1.ts\n\
    #EXTINF:-1 group-title=\"Filmes\",Matrix\n\
    http://stream.example/movie/2.mp4\n\
    #EXTINF:-1 group-title=\"Séries\",Dark S01E01\n\
    http://stream.example/series/3.mkv\n";

/// Provider endpoint: behaviour is keyed on the username.
async fn provider(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
    match params.get("username").map(String::as_str) {
        Some("good") => (StatusCode::OK, PLAYLIST.to_string()),
        Some("blocked") => (StatusCode::OK, "Account expired".to_string()),
        Some("html") => (StatusCode::OK, "<html><body>hello</body></html>".to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, String::new()),
    }
}

/// Relay endpoint: serves the playlist for accounts the provider refuses
/// directly, and fails for everything else.
async fn relay(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
    match params.get("url") {
        Some(url) if url.contains("username=relayed") => (StatusCode::OK, PLAYLIST.to_string()),
        _ => (StatusCode::BAD_GATEWAY, String::new()),
    }
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/get.php", get(provider))
        .route("/raw", get(relay));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, relay: bool) -> PlaylistClient {
    let network = NetworkConfig {
        relay_url: if relay {
            format!("http://{}/raw?url=", addr)
        } else {
            String::new()
        },
        ..Default::default()
    };
    PlaylistClient::new(&network).unwrap()
}

fn credentials(addr: SocketAddr, username: &str) -> Credentials {
    Credentials::new(&format!("http://{}", addr), username, "secret").unwrap()
}

#[tokio::test]
async fn test_direct_download_and_parse() {
    let addr = spawn_server().await;
    let playlist = client(addr, true)
        .fetch_playlist(&credentials(addr, "good"))
        .await
        .unwrap();

    assert_eq!(playlist.total(), 3);
    assert_eq!(playlist.channels[0].title, "Globo HD");
    assert_eq!(playlist.channels[0].logo, "http://logo/globo.png");
    assert_eq!(playlist.movies[0].title, "Matrix");
    assert_eq!(playlist.series[0].stream_url, "http://stream.example/series/3.mkv");
}

#[tokio::test]
async fn test_falls_back_to_relay() {
    let addr = spawn_server().await;
    let playlist = client(addr, true)
        .fetch_playlist(&credentials(addr, "relayed"))
        .await
        .unwrap();

    assert_eq!(playlist.total(), 3);
}

#[tokio::test]
async fn test_relay_failure_is_reported() {
    let addr = spawn_server().await;
    let result = client(addr, true)
        .download(&credentials(addr, "down").playlist_url())
        .await;

    assert!(matches!(result, Err(TransportError::RelayStatus(502))));
}

#[tokio::test]
async fn test_no_relay_configured() {
    let addr = spawn_server().await;
    let result = client(addr, false)
        .download(&credentials(addr, "relayed").playlist_url())
        .await;

    assert!(matches!(result, Err(TransportError::Status(500))));
}

#[tokio::test]
async fn test_rejected_content() {
    let addr = spawn_server().await;
    let client = client(addr, false);

    let blocked = client.fetch_playlist(&credentials(addr, "blocked")).await;
    assert!(matches!(
        blocked,
        Err(Error::Content(ContentError::Rejected))
    ));

    let html = client.fetch_playlist(&credentials(addr, "html")).await;
    assert!(matches!(html, Err(Error::Content(ContentError::NotAPlaylist))));
}
