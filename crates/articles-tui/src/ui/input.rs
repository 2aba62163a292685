//! Keyboard input handling for the TUI.
//!
//! Translates key events into `App` and `SessionController` calls based on
//! the current overlay, route and focus.

use crossterm::event::{KeyCode, KeyEvent};

use articles_core::Route;

use crate::app::{
    can_add_password_char, can_add_username_char, App, AppState, Focus, FormField, LoginFocus,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return false;
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return false;
    }

    match app.controller.route() {
        Route::Login => handle_login_input(app, key),
        Route::Articles => match app.focus {
            Focus::List => handle_list_input(app, key),
            Focus::Form => handle_form_input(app, key),
        },
    }
    false
}

fn handle_login_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            if app.controller.is_logged_in() {
                app.controller.navigate(Route::Articles);
            } else {
                app.state = AppState::ConfirmingQuit;
            }
        }
        KeyCode::Down | KeyCode::Tab => app.login_focus = app.login_focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.login_focus = app.login_focus.prev(),
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => match c {
                '?' => app.state = AppState::ShowingHelp,
                'q' => app.state = AppState::ConfirmingQuit,
                '2' => app.controller.navigate(Route::Articles),
                _ => {}
            },
        },
        _ => {}
    }
}

fn handle_list_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('1') => app.controller.navigate(Route::Login),
        KeyCode::Char('2') => app.controller.navigate(Route::Articles),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('n') => app.new_article(),
        KeyCode::Char('e') | KeyCode::Enter => app.edit_highlighted(),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_highlighted(),
        KeyCode::Char('L') => app.logout(),
        KeyCode::Tab => app.focus = Focus::Form,
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.list_selection = 0,
        KeyCode::End => app.select_last(),
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.focus = Focus::List,
        KeyCode::Tab | KeyCode::Down => app.form_focus = app.form_focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.form_focus = app.form_focus.prev(),
        KeyCode::Left | KeyCode::Right if app.form_focus == FormField::Topic => app.cycle_topic(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Enter => match app.form_focus {
            FormField::Submit => app.submit_form(),
            FormField::Cancel => app.cancel_edit(),
            field => app.form_focus = field.next(),
        },
        KeyCode::Char(' ') if app.form_focus == FormField::Topic => app.cycle_topic(),
        KeyCode::Char(c) => app.form_push(c),
        _ => {}
    }
}
