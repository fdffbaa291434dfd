use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bookscout::application::routes::app_router;
use bookscout::application::state::AppState;
use bookscout::domain::books::{Book, NewBook};
use bookscout::domain::external::{ExternalBook, ExternalCatalog, ExternalSourceError};
use bookscout::domain::repositories::{
    BookRepository, CategoryRepository, CommentRepository, RatingRepository, SavedBookRepository,
    TokenRepository, UserRepository,
};
use bookscout::domain::users::{NewToken, NewUser};
use bookscout::infrastructure::auth::{generate_token, hash_token};
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::task::AbortHandle;

/// Programmable external catalog double. Results are set per method; call
/// counters let tests assert when the external source was (not) consulted.
#[derive(Default)]
pub struct MockCatalog {
    pub search_results: std::sync::Mutex<Vec<ExternalBook>>,
    pub subject_results: std::sync::Mutex<Vec<ExternalBook>>,
    pub trending_results: std::sync::Mutex<Vec<ExternalBook>>,
    pub search_calls: AtomicUsize,
    pub subject_calls: AtomicUsize,
    pub trending_calls: AtomicUsize,
    pub work_calls: AtomicUsize,
    pub description_calls: AtomicUsize,
    pub fail: std::sync::atomic::AtomicBool,
}

impl MockCatalog {
    pub fn set_search_results(&self, results: Vec<ExternalBook>) {
        *self.search_results.lock().unwrap() = results;
    }

    pub fn set_subject_results(&self, results: Vec<ExternalBook>) {
        *self.subject_results.lock().unwrap() = results;
    }

    pub fn set_trending_results(&self, results: Vec<ExternalBook>) {
        *self.trending_results.lock().unwrap() = results;
    }

    pub fn fail_all_calls(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn take(&self, results: &std::sync::Mutex<Vec<ExternalBook>>, limit: u32) -> Vec<ExternalBook> {
        results
            .lock()
            .unwrap()
            .iter()
            .take(limit as usize)
            .cloned()
            .collect()
    }

    fn check_failure(&self) -> Result<(), ExternalSourceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExternalSourceError::new("mock catalog failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ExternalCatalog for MockCatalog {
    async fn search(
        &self,
        _query: &str,
        limit: u32,
        _offset: u32,
    ) -> Result<Vec<ExternalBook>, ExternalSourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.take(&self.search_results, limit))
    }

    async fn by_subject(
        &self,
        _subject: &str,
        limit: u32,
        _offset: u32,
    ) -> Result<Vec<ExternalBook>, ExternalSourceError> {
        self.subject_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.take(&self.subject_results, limit))
    }

    async fn trending(&self, limit: u32) -> Result<Vec<ExternalBook>, ExternalSourceError> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.take(&self.trending_results, limit))
    }

    async fn work_by_id(
        &self,
        external_id: &str,
    ) -> Result<Option<ExternalBook>, ExternalSourceError> {
        self.work_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .iter()
            .find(|candidate| candidate.external_id == external_id)
            .cloned())
    }

    async fn description_for(&self, _external_id: &str) -> Option<String> {
        self.description_calls.fetch_add(1, Ordering::SeqCst);
        None
    }
}

pub struct TestApp {
    pub address: String,
    pub book_repo: Arc<dyn BookRepository>,
    pub rating_repo: Arc<dyn RatingRepository>,
    #[allow(dead_code)]
    pub saved_book_repo: Arc<dyn SavedBookRepository>,
    #[allow(dead_code)]
    pub comment_repo: Arc<dyn CommentRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub token_repo: Arc<dyn TokenRepository>,
    pub catalog: Arc<MockCatalog>,
    pub auth_token: Option<String>,
    server_handle: AbortHandle,
}

impl TestApp {
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        let mut request = Client::new().get(self.api_url(path));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("GET request failed")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        let mut request = Client::new().post(self.api_url(path)).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("POST request failed")
    }

    pub async fn post_empty(&self, path: &str) -> reqwest::Response {
        let mut request = Client::new()
            .post(self.api_url(path))
            .header("content-type", "application/json")
            .body("{}");
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("POST request failed")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        let mut request = Client::new().delete(self.api_url(path));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("DELETE request failed")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_app() -> TestApp {
    let catalog = Arc::new(MockCatalog::default());
    spawn_app_with_catalog(Arc::clone(&catalog) as Arc<dyn ExternalCatalog>, catalog).await
}

pub async fn spawn_app_with_auth() -> TestApp {
    let mut app = spawn_app().await;
    app.auth_token = Some(create_user_token(&app, "reader").await);
    app
}

/// Spawn the server against any external catalog. Used directly by the
/// wiremock-backed tests that exercise the real Open Library client.
pub async fn spawn_app_with_external(external: Arc<dyn ExternalCatalog>) -> TestApp {
    spawn_app_with_catalog(external, Arc::new(MockCatalog::default())).await
}

async fn spawn_app_with_catalog(
    external: Arc<dyn ExternalCatalog>,
    catalog: Arc<MockCatalog>,
) -> TestApp {
    let database = bookscout::infrastructure::database::Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    let state = AppState::from_database(&database, external);

    // Clone repos we need for TestApp before consuming state in the router
    let book_repo = state.book_repo.clone();
    let rating_repo = state.rating_repo.clone();
    let saved_book_repo = state.saved_book_repo.clone();
    let comment_repo = state.comment_repo.clone();
    let category_repo = state.category_repo.clone();
    let user_repo = state.user_repo.clone();
    let token_repo = state.token_repo.clone();

    let app = app_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");

    let local_addr = listener.local_addr().expect("Failed to get local address");
    let address = format!("http://{local_addr}");

    let server_handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .expect("Server failed to start");
    })
    .abort_handle();

    TestApp {
        address,
        book_repo,
        rating_repo,
        saved_book_repo,
        comment_repo,
        category_repo,
        user_repo,
        token_repo,
        catalog,
        auth_token: None,
        server_handle,
    }
}

/// Create a user plus an API token for it, returning the raw token value.
pub async fn create_user_token(app: &TestApp, username: &str) -> String {
    let user = app
        .user_repo
        .insert(NewUser::new(username))
        .await
        .expect("Failed to create user");

    let token_value = generate_token();
    let token_hash = hash_token(&token_value);
    app.token_repo
        .insert(NewToken::new(user.id, token_hash, "test-token".to_string()))
        .await
        .expect("Failed to insert token");

    token_value
}

/// Seed a local book directly through the repository. The public API has no
/// create endpoint; local rows come from seeding or imports.
pub async fn seed_book(app: &TestApp, title: &str, author: &str, genre: Option<&str>) -> Book {
    app.book_repo
        .insert(
            NewBook {
                title: title.to_string(),
                author: author.to_string(),
                external_id: None,
                description: None,
                cover_url: None,
                genre: genre.map(str::to_string),
                is_free: false,
                rating: 0.0,
                rating_count: 0,
                publish_date: None,
                external_url: None,
            }
            .normalize(),
        )
        .await
        .expect("Failed to seed book")
}

/// An external candidate with distinctive provisional values.
pub fn external_book(external_id: &str, title: &str, genre: Option<&str>) -> ExternalBook {
    ExternalBook {
        external_id: external_id.to_string(),
        title: title.to_string(),
        author: "External Author".to_string(),
        description: Some("An externally sourced book".to_string()),
        cover_url: None,
        genre: genre.map(str::to_string),
        is_free: false,
        provisional_rating: 3.8,
        provisional_rating_count: 120,
        publish_date: Some("2001".to_string()),
        external_url: Some(format!("https://openlibrary.org/works/{external_id}")),
    }
}
