use std::net::SocketAddr;
use std::path::PathBuf;

use reqwest::StatusCode as HttpStatusCode;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes;
use service::{auth::SharedSecret, premium::{FileRegistryStore, RegistryService}};

const KEY: &str = "e2e-secret";

fn cors() -> CorsLayer { CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
    data_dir: PathBuf,
}

impl TestApp {
    async fn cleanup(self) {
        let _ = tokio::fs::remove_dir_all(&self.data_dir).await;
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    // isolated registry directory per test run
    let data_dir = std::env::temp_dir().join(format!("premium-e2e-{}", Uuid::new_v4()));
    let store = FileRegistryStore::new(data_dir.join("premium_users.json"));
    let registry = std::sync::Arc::new(RegistryService::new(store, SharedSecret::new(KEY)));

    let app = routes::build_router(registry, cors());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, data_dir })
}

#[tokio::test]
async fn e2e_add_list_delete() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let res = c
        .get(format!("{}/add/premium", app.base_url))
        .query(&[("key", KEY), ("addemail", "e2e@example.com"), ("day", "3day"), ("type", "vip")])
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["details"]["email"], "e2e@example.com");

    let res = c.get(format!("{}/list/email/premium.json", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["active_premium_users"][0]["type"], "vip");

    let res = c
        .get(format!("{}/delete/premium", app.base_url))
        .query(&[("key", KEY), ("delemail", "e2e@example.com")])
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c
        .get(format!("{}/delete/premium", app.base_url))
        .query(&[("key", KEY), ("delemail", "e2e@example.com")])
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    assert!(app.data_dir.join("premium_users.json").exists());

    app.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn e2e_public_liveness_and_metrics() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = reqwest::get(format!("{}/", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(res.text().await?, routes::LIVENESS_TEXT);

    let res = reqwest::get(format!("{}/metrics", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    app.cleanup().await;
    Ok(())
}
