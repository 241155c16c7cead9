//! Live server tests over a real socket.

use std::time::Duration;

use route_mux::config::RouterConfig;
use route_mux::http::RequestParamsExt;
use route_mux::lifecycle::configure_router;
use route_mux::{HttpServer, Router, Shutdown};

mod common;
use common::MemoryLog;

#[tokio::test]
async fn test_serves_routes_over_http() {
    let log = MemoryLog::new();
    let static_root = tempfile::tempdir().unwrap();
    std::fs::write(static_root.path().join("app.css"), "body{}").unwrap();

    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.cors.allow_origin = "https://app.example".into();
    config.static_dirs.push(route_mux::config::StaticDirConfig {
        prefix: "/assets/".into(),
        dir: static_root.path().to_string_lossy().into_owned(),
    });

    let mut router = Router::new();
    router
        .get("/user/:id([0-9]+)", |req, w| {
            Box::pin(async move {
                let id = req.param("id").unwrap_or_default();
                w.write(format!("user={id}").as_bytes());
            })
        })
        .unwrap();
    configure_router(&mut router, &config).unwrap();
    router.set_access_log(log.clone());

    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, router);
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap();
    let base = format!("http://{addr}");

    let res = client.get(format!("{base}/user/42")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()["access-control-allow-origin"],
        "https://app.example"
    );
    assert_eq!(res.headers()["content-length"], "7");
    assert_eq!(res.text().await.unwrap(), "user=42");

    let res = client.get(format!("{base}/user/abc")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "404 page not found\n");

    let res = client
        .request(reqwest::Method::OPTIONS, format!("{base}/user/7"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["public"], "GET, HEAD, OPTIONS");

    let res = client.get(format!("{base}/assets/app.css")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "body{}");

    drop(client);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    let lines = log.lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("127.0.0.1:"), "{}", lines[0]);
    assert!(lines[0].contains("\"GET /user/42 HTTP/1.1\" 200 7"), "{}", lines[0]);
    assert!(lines[1].contains("\"GET /user/abc HTTP/1.1\" 404 19"), "{}", lines[1]);
}
