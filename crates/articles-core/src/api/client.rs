//! API client for the articles backend.
//!
//! This module defines the two collaborator seams used by the controller,
//! `AuthClient` and `ResourceClient`, and `ApiClient`, the reqwest-backed
//! implementation of both.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::models::{
    ArticleDraft, ArticleId, ArticleResponse, ArticlesResponse, Credentials, LoginResponse,
    MessageResponse,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:9000/api";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const LOGIN_PATH: &str = "login";
const ARTICLES_PATH: &str = "articles";

// ============================================================================
// Collaborator traits
// ============================================================================

/// Unauthenticated login call
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Exchange credentials for a session token
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
}

/// Authenticated CRUD calls against the article collection.
///
/// Implementations attach the current session token to every request and
/// fail with `ApiError::Unauthorized` when it is missing or rejected.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn list(&self) -> Result<ArticlesResponse, ApiError>;
    async fn create(&self, article: &ArticleDraft) -> Result<ArticleResponse, ApiError>;
    async fn update(&self, id: ArticleId, article: &ArticleDraft)
        -> Result<ArticleResponse, ApiError>;
    async fn delete(&self, id: ArticleId) -> Result<MessageResponse, ApiError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// HTTP client for the articles backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` that reads its token from `session`
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay
    pub fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// The backend expects the raw token in the Authorization header.
    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let token = self.session.token().ok_or(ApiError::Unauthorized)?;
        let value = header::HeaderValue::from_str(&token)
            .map_err(|_| ApiError::Unauthorized)?;
        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value);
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(Some(response))
        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(path);
        let headers = if authenticated {
            self.auth_headers()?
        } else {
            header::HeaderMap::new()
        };

        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let mut builder = self
                .client
                .request(method.clone(), &url)
                .headers(headers.clone());
            if let Some(body) = body {
                builder = builder.json(body);
            }

            debug!(%method, url = %url, "Sending request");
            let response = builder.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    return serde_json::from_str(&text).map_err(|e| {
                        ApiError::InvalidResponse(format!(
                            "Failed to parse JSON response from {}: {}",
                            url, e
                        ))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}

#[async_trait]
impl AuthClient for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.request(Method::POST, LOGIN_PATH, Some(credentials), false)
            .await
    }
}

#[async_trait]
impl ResourceClient for ApiClient {
    async fn list(&self) -> Result<ArticlesResponse, ApiError> {
        self.request::<_, ()>(Method::GET, ARTICLES_PATH, None, true)
            .await
    }

    async fn create(&self, article: &ArticleDraft) -> Result<ArticleResponse, ApiError> {
        self.request(Method::POST, ARTICLES_PATH, Some(article), true)
            .await
    }

    async fn update(
        &self,
        id: ArticleId,
        article: &ArticleDraft,
    ) -> Result<ArticleResponse, ApiError> {
        let path = format!("{}/{}", ARTICLES_PATH, id);
        self.request(Method::PUT, &path, Some(article), true).await
    }

    async fn delete(&self, id: ArticleId) -> Result<MessageResponse, ApiError> {
        let path = format!("{}/{}", ARTICLES_PATH, id);
        self.request::<_, ()>(Method::DELETE, &path, None, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post, put},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;
    use crate::models::{Article, Topic};

    const GOOD_TOKEN: &str = "good-token";

    #[derive(Clone, Default)]
    struct Backend {
        articles: Arc<Mutex<Vec<Article>>>,
        next_id: Arc<AtomicUsize>,
        throttle_remaining: Arc<AtomicUsize>,
        seen_auth: Arc<Mutex<Vec<Option<String>>>>,
    }

    type Reply = (StatusCode, Json<Value>);

    impl Backend {
        fn authorize(&self, headers: &HeaderMap) -> Result<(), Reply> {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.seen_auth.lock().unwrap().push(auth.clone());
            if auth.as_deref() == Some(GOOD_TOKEN) {
                Ok(())
            } else {
                Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Ouch: jwt expired"})),
                ))
            }
        }
    }

    async fn login_handler(Json(body): Json<Value>) -> Reply {
        if body["username"] == "foo" && body["password"] == "12345678" {
            (
                StatusCode::OK,
                Json(json!({"message": "Here is your token, foo!", "token": GOOD_TOKEN})),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid credentials"})),
            )
        }
    }

    async fn list_handler(State(backend): State<Backend>, headers: HeaderMap) -> Reply {
        if let Err(reply) = backend.authorize(&headers) {
            return reply;
        }
        if backend.throttle_remaining.load(Ordering::SeqCst) > 0 {
            backend.throttle_remaining.fetch_sub(1, Ordering::SeqCst);
            return (StatusCode::TOO_MANY_REQUESTS, Json(json!({})));
        }
        let articles = backend.articles.lock().unwrap().clone();
        (
            StatusCode::OK,
            Json(json!({"message": "Here are your articles, foo!", "articles": articles})),
        )
    }

    async fn create_handler(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Json(draft): Json<ArticleDraft>,
    ) -> Reply {
        if let Err(reply) = backend.authorize(&headers) {
            return reply;
        }
        let id = backend.next_id.fetch_add(1, Ordering::SeqCst) as ArticleId + 1;
        let article = Article {
            id,
            title: draft.title,
            text: draft.text,
            topic: draft.topic,
        };
        backend.articles.lock().unwrap().push(article.clone());
        (
            StatusCode::CREATED,
            Json(json!({"message": "Well done, foo. Great article!", "article": article})),
        )
    }

    async fn update_handler(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Path(id): Path<ArticleId>,
        Json(draft): Json<ArticleDraft>,
    ) -> Reply {
        if let Err(reply) = backend.authorize(&headers) {
            return reply;
        }
        let mut articles = backend.articles.lock().unwrap();
        match articles.iter_mut().find(|a| a.id == id) {
            Some(article) => {
                article.title = draft.title;
                article.text = draft.text;
                article.topic = draft.topic;
                (
                    StatusCode::OK,
                    Json(json!({"message": "Nice update, foo!", "article": article.clone()})),
                )
            }
            None => (
                StatusCode::NOT_FOUND,
                Json(json!({"message": format!("Article {} not found", id)})),
            ),
        }
    }

    async fn delete_handler(
        State(backend): State<Backend>,
        headers: HeaderMap,
        Path(id): Path<ArticleId>,
    ) -> Reply {
        if let Err(reply) = backend.authorize(&headers) {
            return reply;
        }
        backend.articles.lock().unwrap().retain(|a| a.id != id);
        (
            StatusCode::OK,
            Json(json!({"message": format!("Article {} was deleted, foo!", id)})),
        )
    }

    async fn boom_handler() -> Reply {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "database on fire"})),
        )
    }

    async fn spawn_backend(backend: Backend) -> String {
        let router = Router::new()
            .route("/api/login", post(login_handler))
            .route("/api/articles", get(list_handler).post(create_handler))
            .route("/api/articles/:id", put(update_handler).delete(delete_handler))
            .route("/broken/articles", get(boom_handler))
            .with_state(backend);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str, session: Session) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(5), session)
            .expect("client")
            .with_backoff(Duration::from_millis(5))
    }

    fn logged_in() -> Session {
        let session = Session::in_memory();
        session
            .start(GOOD_TOKEN.to_string(), "foo".to_string())
            .expect("start session");
        session
    }

    #[tokio::test]
    async fn test_login_success() {
        let host = spawn_backend(Backend::default()).await;
        let api = client(&format!("{}/api", host), Session::in_memory());

        let resp = api
            .login(&Credentials::new("foo", "12345678"))
            .await
            .expect("login");
        assert_eq!(resp.token, GOOD_TOKEN);
        assert_eq!(resp.message, "Here is your token, foo!");
    }

    #[tokio::test]
    async fn test_login_bad_credentials_is_unauthorized() {
        let host = spawn_backend(Backend::default()).await;
        let api = client(&format!("{}/api", host), Session::in_memory());

        let err = api
            .login(&Credentials::new("foo", "wrong-password"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_missing_token_fails_without_request() {
        let backend = Backend::default();
        let host = spawn_backend(backend.clone()).await;
        let api = client(&format!("{}/api", host), Session::in_memory());

        let err = api.list().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(backend.seen_auth.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_token_is_attached_to_requests() {
        let backend = Backend::default();
        let host = spawn_backend(backend.clone()).await;
        let api = client(&format!("{}/api/", host), logged_in());

        let resp = api.list().await.expect("list");
        assert!(resp.articles.is_empty());
        assert_eq!(resp.message, "Here are your articles, foo!");
        assert_eq!(
            backend.seen_auth.lock().unwrap().as_slice(),
            &[Some(GOOD_TOKEN.to_string())]
        );
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthorized() {
        let host = spawn_backend(Backend::default()).await;
        let session = Session::in_memory();
        session
            .start("stale".to_string(), "foo".to_string())
            .expect("start");
        let api = client(&format!("{}/api", host), session);

        assert!(api.list().await.unwrap_err().is_unauthorized());
        assert!(api.delete(1).await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_create_update_delete_roundtrip() {
        let host = spawn_backend(Backend::default()).await;
        let api = client(&format!("{}/api", host), logged_in());

        let created = api
            .create(&ArticleDraft::new("A", "B", Topic::JavaScript))
            .await
            .expect("create");
        assert_eq!(created.article.title, "A");
        assert_eq!(created.article.text, "B");
        assert_eq!(created.article.topic, Topic::JavaScript);

        let listed = api.list().await.expect("list");
        assert_eq!(listed.articles, vec![created.article.clone()]);

        let updated = api
            .update(created.article.id, &ArticleDraft::new("A2", "B2", Topic::React))
            .await
            .expect("update");
        assert_eq!(updated.article.id, created.article.id);
        assert_eq!(updated.article.topic, Topic::React);
        assert_eq!(updated.message, "Nice update, foo!");

        let deleted = api.delete(created.article.id).await.expect("delete");
        assert_eq!(
            deleted.message,
            format!("Article {} was deleted, foo!", created.article.id)
        );
        assert!(api.list().await.expect("list").articles.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_article_is_not_found() {
        let host = spawn_backend(Backend::default()).await;
        let api = client(&format!("{}/api", host), logged_in());

        let err = api
            .update(99, &ArticleDraft::new("A", "B", Topic::Node))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Article 99 not found"));
    }

    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let backend = Backend::default();
        backend.throttle_remaining.store(2, Ordering::SeqCst);
        let host = spawn_backend(backend.clone()).await;
        let api = client(&format!("{}/api", host), logged_in());

        api.list().await.expect("list after retries");
        assert_eq!(backend.seen_auth.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_max_retries() {
        let backend = Backend::default();
        backend.throttle_remaining.store(10, Ordering::SeqCst);
        let host = spawn_backend(backend.clone()).await;
        let api = client(&format!("{}/api", host), logged_in());

        assert!(matches!(api.list().await.unwrap_err(), ApiError::RateLimited));
        assert_eq!(
            backend.seen_auth.lock().unwrap().len(),
            MAX_RATE_LIMIT_RETRIES as usize + 1
        );
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let host = spawn_backend(Backend::default()).await;
        let api = client(&format!("{}/broken", host), logged_in());

        let err = api.list().await.unwrap_err();
        assert!(matches!(err, ApiError::ServerError(ref m) if m == "database on fire"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let api = client(&format!("http://{}/api", addr), logged_in());
        let err = api.list().await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
        assert!(!err.is_unauthorized());
    }
}
