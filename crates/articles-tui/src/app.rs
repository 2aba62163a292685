//! Application state management for the articles TUI.
//!
//! `App` wraps the `SessionController` with the screen-level state the
//! terminal needs: login form, article list cursor, and the article editor.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use articles_core::api::ApiClient;
use articles_core::models::{Article, ArticleDraft, ArticleId, Credentials};
use articles_core::{Config, Route, SessionController};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for an article title.
const MAX_TITLE_LENGTH: usize = 120;

/// Maximum length for article text.
const MAX_TEXT_LENGTH: usize = 2000;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Environment variables that prefill the login form
const USERNAME_ENV: &str = "ARTICLES_USERNAME";
const PASSWORD_ENV: &str = "ARTICLES_PASSWORD";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Focused panel on the articles screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Form,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

/// Article editor field focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Text,
    Topic,
    Submit,
    Cancel,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Text,
            FormField::Text => FormField::Topic,
            FormField::Topic => FormField::Submit,
            FormField::Submit => FormField::Cancel,
            FormField::Cancel => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Cancel,
            FormField::Text => FormField::Title,
            FormField::Topic => FormField::Text,
            FormField::Submit => FormField::Topic,
            FormField::Cancel => FormField::Submit,
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub controller: SessionController,

    // UI State
    pub state: AppState,
    pub focus: Focus,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,

    // Article list cursor
    pub list_selection: usize,

    // Article editor
    pub form: ArticleDraft,
    pub form_focus: FormField,
    /// Article the editor was last filled from
    form_source: Option<ArticleId>,

    /// Navigations already handled
    seen_navigations: usize,
}

impl App {
    pub fn new(config: Config, controller: SessionController) -> Self {
        let login_username = std::env::var(USERNAME_ENV)
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var(PASSWORD_ENV).unwrap_or_default();

        Self {
            config,
            controller,
            state: AppState::Normal,
            focus: Focus::List,
            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            list_selection: 0,
            form: ArticleDraft::default(),
            form_focus: FormField::Title,
            form_source: None,
            seen_navigations: 0,
        }
    }

    /// Build the controller for `config`: one HTTP client serving as both
    /// auth and resource client, sharing the session with the controller.
    pub fn build_controller(config: &Config) -> Result<SessionController> {
        let session_dir = config
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache"));
        let session = config.open_session(session_dir);
        let api = Arc::new(ApiClient::new(
            &config.api_base_url,
            config.request_timeout(),
            session.clone(),
        )?);
        debug!(base_url = api.base_url(), "API client configured");
        Ok(SessionController::new(api.clone(), api, session))
    }

    /// Show the articles screen if a session exists, the login screen otherwise
    pub fn start(&mut self) {
        let route = if self.controller.is_logged_in() {
            Route::Articles
        } else {
            Route::Login
        };
        self.controller.navigate(route);
        self.tick();
    }

    /// Apply finished requests and react to navigation. Called once per frame.
    pub fn tick(&mut self) {
        self.controller.poll_completions();
        self.handle_navigation();
        self.clamp_list_selection();
        self.sync_form();
    }

    fn handle_navigation(&mut self) {
        while self.controller.history().len() > self.seen_navigations {
            self.seen_navigations = self.controller.history().len();
            match self.controller.route() {
                Route::Articles if !self.controller.is_logged_in() => {
                    // Articles screen requires a session
                    self.controller.navigate(Route::Login);
                }
                Route::Articles => self.enter_articles(),
                Route::Login => self.enter_login(),
            }
        }
    }

    fn enter_articles(&mut self) {
        if let Some(username) = self.controller.session().username() {
            if self.config.last_username.as_deref() != Some(username.as_str()) {
                self.config.last_username = Some(username.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
            }
            self.login_username = username;
        }
        self.login_password.clear();
        self.focus = Focus::List;
        self.list_selection = 0;
        self.controller.list_articles();
    }

    fn enter_login(&mut self) {
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.form = ArticleDraft::default();
        self.form_source = None;
    }

    // =========================================================================
    // Login
    // =========================================================================

    pub fn attempt_login(&mut self) {
        let credentials = Credentials::new(self.login_username.clone(), self.login_password.clone());
        if let Err(e) = self.controller.login(credentials) {
            debug!(error = %e, "Login form rejected");
        }
    }

    pub fn logout(&mut self) {
        self.controller.logout();
    }

    // =========================================================================
    // Article list
    // =========================================================================

    pub fn highlighted_article(&self) -> Option<&Article> {
        self.controller.articles().get(self.list_selection)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.controller.articles().len();
        if len == 0 {
            self.list_selection = 0;
            return;
        }
        let next = self.list_selection as isize + delta;
        self.list_selection = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn select_last(&mut self) {
        self.list_selection = self.controller.articles().len().saturating_sub(1);
    }

    fn clamp_list_selection(&mut self) {
        let max = self.controller.articles().len().saturating_sub(1);
        self.list_selection = self.list_selection.min(max);
    }

    pub fn refresh(&mut self) {
        self.controller.list_articles();
    }

    pub fn delete_highlighted(&mut self) {
        if let Some(id) = self.highlighted_article().map(|a| a.id) {
            self.controller.delete_article(id);
        }
    }

    /// Load the highlighted article into the editor
    pub fn edit_highlighted(&mut self) {
        if let Some(id) = self.highlighted_article().map(|a| a.id) {
            self.controller.select_article(Some(id));
            self.sync_form();
            self.focus = Focus::Form;
            self.form_focus = FormField::Title;
        }
    }

    /// Empty editor in create mode
    pub fn new_article(&mut self) {
        self.controller.select_article(None);
        self.form = ArticleDraft::default();
        self.form_source = None;
        self.focus = Focus::Form;
        self.form_focus = FormField::Title;
    }

    // =========================================================================
    // Article editor
    // =========================================================================

    /// True when the editor targets an existing article
    pub fn is_editing(&self) -> bool {
        self.controller.current_article().is_some()
    }

    /// Refill the editor whenever the selected article changes
    fn sync_form(&mut self) {
        let current = self.controller.current_article().map(|a| (a.id, a.to_draft()));
        let current_id = current.as_ref().map(|(id, _)| *id);
        if current_id != self.form_source {
            self.form = current.map(|(_, draft)| draft).unwrap_or_default();
            self.form_source = current_id;
        }
    }

    pub fn submit_form(&mut self) {
        let draft = self.form.clone();
        let result = match self.controller.current_article().map(|a| a.id) {
            Some(id) => self.controller.update_article(id, draft),
            None => self.controller.create_article(draft),
        };
        match result {
            Ok(()) => {
                if !self.is_editing() {
                    self.form = ArticleDraft::default();
                }
                self.focus = Focus::List;
                self.form_focus = FormField::Title;
            }
            Err(e) => debug!(error = %e, "Article form rejected"),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.controller.select_article(None);
        self.form = ArticleDraft::default();
        self.form_source = None;
        self.focus = Focus::List;
        self.form_focus = FormField::Title;
    }

    /// Type a character into the focused text field
    pub fn form_push(&mut self, c: char) {
        match self.form_focus {
            FormField::Title if can_add_title_char(self.form.title.chars().count(), c) => {
                self.form.title.push(c)
            }
            FormField::Text if can_add_text_char(self.form.text.chars().count(), c) => {
                self.form.text.push(c)
            }
            _ => {}
        }
    }

    pub fn form_backspace(&mut self) {
        match self.form_focus {
            FormField::Title => {
                self.form.title.pop();
            }
            FormField::Text => {
                self.form.text.pop();
            }
            _ => {}
        }
    }

    pub fn cycle_topic(&mut self) {
        self.form.topic = self.form.topic.next();
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

fn can_add_title_char(current_len: usize, c: char) -> bool {
    current_len < MAX_TITLE_LENGTH && is_valid_input_char(c)
}

fn can_add_text_char(current_len: usize, c: char) -> bool {
    current_len < MAX_TEXT_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use articles_core::auth::Session;
    use articles_core::models::Topic;

    /// App wired to a client for an address nothing listens on
    fn offline_app() -> App {
        let session = Session::in_memory();
        let api = Arc::new(
            ApiClient::new(
                "http://127.0.0.1:9/api",
                std::time::Duration::from_millis(200),
                session.clone(),
            )
            .expect("client"),
        );
        let controller = SessionController::new(api.clone(), api, session);
        App::new(Config::default(), controller)
    }

    #[test]
    fn test_login_focus_cycle() {
        assert_eq!(LoginFocus::Username.next(), LoginFocus::Password);
        assert_eq!(LoginFocus::Password.next(), LoginFocus::Button);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Username);
        assert_eq!(LoginFocus::Username.prev(), LoginFocus::Button);
    }

    #[test]
    fn test_form_field_cycle() {
        let mut field = FormField::Title;
        for _ in 0..5 {
            field = field.next();
        }
        assert_eq!(field, FormField::Title);
        assert_eq!(FormField::Title.prev(), FormField::Cancel);
        assert_eq!(FormField::Submit.prev(), FormField::Topic);
    }

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(49, 'z'));
        assert!(!can_add_username_char(50, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[tokio::test]
    async fn test_start_without_session_shows_login() {
        let mut app = offline_app();
        app.start();
        assert_eq!(app.controller.route(), Route::Login);
        assert!(!app.controller.loading());
    }

    #[tokio::test]
    async fn test_articles_route_without_session_bounces_to_login() {
        let mut app = offline_app();
        app.controller.navigate(Route::Articles);
        app.tick();
        assert_eq!(app.controller.route(), Route::Login);
    }

    #[tokio::test]
    async fn test_form_editing() {
        let mut app = offline_app();
        app.new_article();
        assert_eq!(app.focus, Focus::Form);

        for c in "Hi!".chars() {
            app.form_push(c);
        }
        app.form_backspace();
        assert_eq!(app.form.title, "Hi");

        app.form_focus = FormField::Text;
        app.form_push('x');
        app.form_push('\n');
        assert_eq!(app.form.text, "x");

        app.form_focus = FormField::Topic;
        app.form_push('y');
        app.cycle_topic();
        assert_eq!(app.form.topic, Topic::React);
        assert!(!app.is_editing());

        app.cancel_edit();
        assert_eq!(app.form, ArticleDraft::default());
        assert_eq!(app.focus, Focus::List);
    }

    #[tokio::test]
    async fn test_invalid_form_stays_open() {
        let mut app = offline_app();
        app.new_article();
        app.submit_form();

        assert_eq!(app.focus, Focus::Form);
        assert_eq!(app.controller.message(), "Title is required");
        assert!(!app.controller.loading());
    }

    #[tokio::test]
    async fn test_move_selection_on_empty_list() {
        let mut app = offline_app();
        app.move_selection(5);
        assert_eq!(app.list_selection, 0);
        app.select_last();
        assert_eq!(app.list_selection, 0);
        assert!(app.highlighted_article().is_none());
    }
}
