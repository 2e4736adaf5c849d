use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use geeknews::config::DispatchConfig;
use geeknews::mail::SandboxMailer;
use geeknews::server::{AppState, create_router};
use geeknews::store::{
    DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, SqliteStore, Store, seed_default_admin,
};

/// An in-process server on an ephemeral port with its own temp data dir.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");

        let store = SqliteStore::new(temp_dir.path().join("geeknews.db")).expect("open store");
        store.initialize().expect("initialize store");
        seed_default_admin(&store).expect("seed admin");

        let state = Arc::new(AppState::new(
            Arc::new(store),
            Arc::new(SandboxMailer::new()),
            temp_dir.path().to_path_buf(),
            DispatchConfig::default(),
        ));
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://{addr}"),
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Fresh client with its own cookie jar, i.e. its own session.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("build client")
    }

    /// Client logged in with the given credentials.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Client {
        let client = self.client();
        let resp = client
            .post(format!("{}/api/login", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request");
        assert!(
            resp.status().is_success(),
            "login failed for {email}: {}",
            resp.status()
        );
        client
    }

    /// Client logged in as the seeded admin.
    pub async fn admin(&self) -> reqwest::Client {
        self.login(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD).await
    }

    /// Registers a fresh user and returns a logged-in client for it.
    pub async fn register_user(&self, email: &str, password: &str) -> reqwest::Client {
        let resp = self
            .client()
            .post(format!("{}/api/register", self.base_url))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "confirm": password,
            }))
            .send()
            .await
            .expect("register request");
        assert_eq!(resp.status(), 201, "registration failed for {email}");
        self.login(email, password).await
    }
}
