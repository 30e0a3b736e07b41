mod common;

use actix_web::{App, HttpServer};
use reqwest::{redirect::Policy, StatusCode};

use braniac::{routes, session_middleware};
use common::{session_key, TestContext};

#[actix_rt::test]
async fn test_live_server_health_and_login_redirect() {
    let ctx = TestContext::new();
    let data = ctx.state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(session_middleware(session_key(), false))
            .app_data(data.clone())
            .configure(routes::config)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    let resp = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client
        .get(format!("http://{}/news/create/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers()["location"],
        "/authapp/login/?next=%2Fnews%2Fcreate%2F"
    );

    handle.stop(true).await;
}
