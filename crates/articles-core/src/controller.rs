//! Session controller for the articles client.
//!
//! `SessionController` owns the transient UI state (status message, article
//! collection, selected article, loading flag) and coordinates the five
//! network actions against the `AuthClient` and `ResourceClient`.
//!
//! Every action spawns its request on the Tokio runtime and returns
//! immediately. Results travel back over an MPSC channel and are applied by
//! `poll_completions` (once per UI tick) or `wait_idle`. Actions must be
//! called from within a Tokio runtime.
//!
//! Stale results are discarded:
//! - each request is tagged with the session epoch, which advances on login
//!   and logout, so nothing from a previous session is applied
//! - a list result is applied only if no newer list has been issued
//!
//! Discarded results still count as settled, so `loading` always returns to
//! false once every request has finished.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, AuthClient, ResourceClient};
use crate::auth::Session;
use crate::models::{
    Article, ArticleDraft, ArticleId, ArticleResponse, ArticlesResponse, Credentials,
    LoginResponse, MessageResponse, ValidationError,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the request completion channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Message shown after logging out
pub const FAREWELL_MESSAGE: &str = "Goodbye!";

/// Message shown when the server rejects the login credentials
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Message shown when the server rejects the session token
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";

// ============================================================================
// Navigation
// ============================================================================

/// Screens the controller can send the user to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Articles,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Articles => "/articles",
        }
    }
}

/// Every navigation performed, oldest first
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Route>,
}

impl History {
    /// Current route. Before any navigation the login screen is shown.
    pub fn current(&self) -> Route {
        self.entries.last().copied().unwrap_or(Route::Login)
    }

    pub fn entries(&self) -> &[Route] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, route: Route) {
        self.entries.push(route);
    }
}

// ============================================================================
// Request Completions
// ============================================================================

/// Controller actions that go over the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    List,
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Login => "login",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Result of a single request, sent from the request task back to the controller.
enum Outcome {
    Login {
        username: String,
        result: Result<LoginResponse, ApiError>,
    },
    List {
        generation: u64,
        result: Result<ArticlesResponse, ApiError>,
    },
    Create(Result<ArticleResponse, ApiError>),
    Update(Result<ArticleResponse, ApiError>),
    Delete {
        id: ArticleId,
        result: Result<MessageResponse, ApiError>,
    },
}

struct Completion {
    action: Action,
    epoch: u64,
    /// None when the request task panicked
    outcome: Option<Outcome>,
}

// ============================================================================
// Controller
// ============================================================================

pub struct SessionController {
    auth: Arc<dyn AuthClient>,
    resources: Arc<dyn ResourceClient>,
    session: Session,

    message: String,
    /// Failure text of the most recently applied request, if it failed
    last_error: Option<String>,
    articles: Vec<Article>,
    selected: Option<ArticleId>,
    in_flight: usize,
    history: History,

    epoch: u64,
    list_generation: u64,

    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
}

impl SessionController {
    /// `session` must be the same session the resource client reads its token from.
    pub fn new(
        auth: Arc<dyn AuthClient>,
        resources: Arc<dyn ResourceClient>,
        session: Session,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            auth,
            resources,
            session,
            message: String::new(),
            last_error: None,
            articles: Vec::new(),
            selected: None,
            in_flight: 0,
            history: History::default(),
            epoch: 0,
            list_generation: 0,
            completion_tx: tx,
            completion_rx: rx,
        }
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Failure of the most recently applied request. `None` once a request succeeds.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// True while at least one request is in flight
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn route(&self) -> Route {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_active()
    }

    pub fn selected_article_id(&self) -> Option<ArticleId> {
        self.selected
    }

    /// The selected article, if it still exists. A dangling id counts as no selection.
    pub fn current_article(&self) -> Option<&Article> {
        let id = self.selected?;
        self.articles.iter().find(|a| a.id == id)
    }

    /// Select an article for editing; `None` switches the editor to create mode
    pub fn select_article(&mut self, id: Option<ArticleId>) {
        self.selected = id;
    }

    pub fn navigate(&mut self, route: Route) {
        info!(path = route.path(), "Navigating");
        self.history.push(route);
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a token. On success the token is persisted and
    /// the articles screen is shown.
    pub fn login(&mut self, credentials: Credentials) -> Result<(), ValidationError> {
        self.message.clear();

        let credentials = credentials.trimmed();
        if let Err(e) = credentials.validate() {
            self.message = e.to_string();
            return Err(e);
        }

        let auth = Arc::clone(&self.auth);
        self.dispatch(Action::Login, async move {
            let result = auth.login(&credentials).await;
            Outcome::Login {
                username: credentials.username,
                result,
            }
        });
        Ok(())
    }

    /// Drop the session and return to the login screen. No network call.
    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        self.epoch += 1;
        self.articles.clear();
        self.selected = None;
        self.message = FAREWELL_MESSAGE.to_string();
        info!("Logged out");
        self.navigate(Route::Login);
    }

    // =========================================================================
    // Articles
    // =========================================================================

    pub fn list_articles(&mut self) {
        self.message.clear();
        self.list_generation += 1;

        let generation = self.list_generation;
        let resources = Arc::clone(&self.resources);
        self.dispatch(Action::List, async move {
            Outcome::List {
                generation,
                result: resources.list().await,
            }
        });
    }

    pub fn create_article(&mut self, draft: ArticleDraft) -> Result<(), ValidationError> {
        let draft = self.validated(draft)?;

        let resources = Arc::clone(&self.resources);
        self.dispatch(Action::Create, async move {
            Outcome::Create(resources.create(&draft).await)
        });
        Ok(())
    }

    pub fn update_article(
        &mut self,
        id: ArticleId,
        draft: ArticleDraft,
    ) -> Result<(), ValidationError> {
        let draft = self.validated(draft)?;

        let resources = Arc::clone(&self.resources);
        self.dispatch(Action::Update, async move {
            Outcome::Update(resources.update(id, &draft).await)
        });
        Ok(())
    }

    pub fn delete_article(&mut self, id: ArticleId) {
        let resources = Arc::clone(&self.resources);
        self.dispatch(Action::Delete, async move {
            Outcome::Delete {
                id,
                result: resources.delete(id).await,
            }
        });
    }

    fn validated(&mut self, draft: ArticleDraft) -> Result<ArticleDraft, ValidationError> {
        let draft = draft.trimmed();
        if let Err(e) = draft.validate() {
            self.message = e.to_string();
            return Err(e);
        }
        Ok(draft)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Spawn a request and count it as in flight until its completion is applied.
    ///
    /// The request runs in its own task so a panic surfaces as a `JoinError`
    /// here instead of a completion that never arrives.
    fn dispatch<F>(&mut self, action: Action, request: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        self.in_flight += 1;
        debug!(%action, in_flight = self.in_flight, "Request started");

        let tx = self.completion_tx.clone();
        let epoch = self.epoch;

        tokio::spawn(async move {
            let outcome = match tokio::spawn(request).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    error!(%action, error = %e, "Request task failed");
                    None
                }
            };
            let completion = Completion {
                action,
                epoch,
                outcome,
            };
            if tx.send(completion).await.is_err() {
                debug!(%action, "Controller dropped before request completed");
            }
        });
    }

    /// Apply every completion that has already arrived. Returns how many were applied.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait until no request is in flight, applying completions as they arrive.
    pub async fn wait_idle(&mut self) {
        while self.in_flight > 0 {
            match self.completion_rx.recv().await {
                Some(completion) => self.apply(completion),
                None => break,
            }
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let action = completion.action;

        if completion.epoch != self.epoch {
            debug!(%action, "Discarding result from a previous session");
            return;
        }

        let previous_error = self.last_error.take();
        let Some(outcome) = completion.outcome else {
            self.report(format!("Error: {} request failed unexpectedly", action));
            return;
        };

        match outcome {
            Outcome::Login { username, result } => self.finish_login(username, result),
            Outcome::List { generation, result } => {
                if generation != self.list_generation {
                    debug!(generation, latest = self.list_generation, "Discarding stale article list");
                    self.last_error = previous_error;
                    return;
                }
                match result {
                    Ok(resp) => {
                        debug!(count = resp.articles.len(), "Articles loaded");
                        self.articles = resp.articles;
                        self.message = resp.message;
                    }
                    Err(e) => self.fail(action, e),
                }
            }
            Outcome::Create(result) => match result {
                Ok(resp) => {
                    debug!(id = resp.article.id, "Article created");
                    self.articles.push(resp.article);
                    self.message = resp.message;
                }
                Err(e) => self.fail(action, e),
            },
            Outcome::Update(result) => match result {
                Ok(resp) => {
                    let updated = resp.article;
                    debug!(id = updated.id, "Article updated");
                    match self.articles.iter_mut().find(|a| a.id == updated.id) {
                        Some(existing) => *existing = updated,
                        None => self.articles.push(updated),
                    }
                    self.selected = None;
                    self.message = resp.message;
                }
                Err(e) => self.fail(action, e),
            },
            Outcome::Delete { id, result } => match result {
                Ok(resp) => {
                    debug!(id, "Article deleted");
                    self.articles.retain(|a| a.id != id);
                    if self.selected == Some(id) {
                        self.selected = None;
                    }
                    self.message = resp.message;
                }
                Err(e) => self.fail(action, e),
            },
        }
    }

    fn finish_login(&mut self, username: String, result: Result<LoginResponse, ApiError>) {
        match result {
            Ok(resp) => {
                if let Err(e) = self.session.start(resp.token, username) {
                    error!(error = %e, "Failed to store session");
                    self.report(format!("Login failed: {}", e));
                    return;
                }
                self.epoch += 1;
                self.articles.clear();
                self.selected = None;
                self.message = resp.message;
                info!("Login successful");
                self.navigate(Route::Articles);
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.report(if e.is_unauthorized() {
                    INVALID_CREDENTIALS_MESSAGE.to_string()
                } else {
                    format!("Login failed: {}", e)
                });
            }
        }
    }

    /// Failure policy shared by every article action
    fn fail(&mut self, action: Action, e: ApiError) {
        if e.is_unauthorized() {
            warn!(%action, "Session token rejected, returning to login");
            if let Err(clear_err) = self.session.clear() {
                warn!(error = %clear_err, "Failed to clear session");
            }
            self.report(SESSION_EXPIRED_MESSAGE.to_string());
            self.navigate(Route::Login);
        } else {
            error!(%action, error = %e, "Request failed");
            self.report(format!("Error: {}", e));
        }
    }

    fn report(&mut self, failure: String) {
        self.message = failure.clone();
        self.last_error = Some(failure);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
