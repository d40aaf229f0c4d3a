use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, COOKIE, LOCATION, SET_COOKIE};
use reqwest::{Client, Response};
use sqlx::SqlitePool;
use tempfile::TempDir;

use formsink::config::Config;
use formsink::session::SESSION_COOKIE;
use formsink::state::SharedState;

/// A running test server backed by its own scratch directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: SqlitePool,
    pub client: Client,
    pub state: SharedState,
    pub spreadsheet_path: PathBuf,
    pub document_dir: PathBuf,
    // Keeps the scratch directory alive for the life of the app.
    pub dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// GET a path, optionally carrying a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        req.send().await.expect("get request failed")
    }

    /// POST urlencoded fields to `/submit`.
    pub async fn submit_form(&self, data: &[(&str, &str)], cookie: Option<&str>) -> Response {
        let mut req = self.client.post(self.url("/submit")).form(data);
        if let Some(cookie) = cookie {
            req = req.header(COOKIE, cookie);
        }
        req.send().await.expect("submit request failed")
    }

    /// Submit a valid form and return the session cookie that now owns the PDF.
    pub async fn submit_valid(&self, name: &str) -> String {
        let resp = self
            .submit_form(
                &[("name", name), ("email", "someone@example.com"), ("age", "30")],
                None,
            )
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/thank_you");
        session_cookie(resp.headers()).expect("submit did not set a session cookie")
    }

    /// GET a page and return its body text.
    pub async fn page(&self, path: &str, cookie: &str) -> String {
        let resp = self.get(path, Some(cookie)).await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK, "GET {path} non-200");
        resp.text().await.unwrap()
    }

    pub async fn row_count(&self) -> i64 {
        formsink::db::submissions::count(&self.pool).await.unwrap()
    }

    pub fn pdf_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.document_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// `name=value` of the session cookie from a response, ready for a Cookie header.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .and_then(|v| v.split(';').next())
        .map(|v| v.to_string())
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn test_config(dir: &TempDir) -> Config {
    Config {
        database_url: format!("sqlite://{}", dir.path().join("users.db").display()),
        secret_key: "test-secret-key-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        spreadsheet_path: dir.path().join("users.xlsx"),
        document_dir: dir.path().join("pdfs"),
        static_dir: dir.path().join("static"),
        max_body_size: 65_536,
        cookie_secure: false,
        session_ttl: Duration::from_secs(3600),
        log_level: "warn".to_string(),
    }
}

/// Spawn a test app with a fresh scratch directory.
pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create tempdir");
    spawn_app_with(dir, |_| {}).await
}

/// Spawn a test app after letting the caller adjust the config.
pub async fn spawn_app_with(dir: TempDir, adjust: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = test_config(&dir);
    adjust(&mut config);

    let pool = formsink::db::connect(&config.database_url)
        .await
        .expect("Failed to open test database");

    let spreadsheet_path = config.spreadsheet_path.clone();
    let document_dir = config.document_dir.clone();
    let (app, state) = formsink::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        state,
        spreadsheet_path,
        document_dir,
        dir,
    }
}
