use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Visible width of the username and password fields
const FIELD_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect_fixed(46, 11, area);
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("  Login", styles::title_style())),
        Line::from(""),
    ];

    let username_focused = app.login_focus == LoginFocus::Username;
    lines.push(field_line(
        "Username",
        &tail(&app.login_username, FIELD_WIDTH),
        username_focused,
    ));

    let masked = "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH));
    let password_focused = app.login_focus == LoginFocus::Password;
    lines.push(field_line("Password", &masked, password_focused));

    // Submit button
    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let (label, style) = if button_focused {
        (" ▶ Submit ◀ ", styles::selected_style())
    } else {
        ("   Submit   ", styles::list_item_style())
    };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(label, style),
        Span::raw("]"),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Tab to switch fields, Enter to submit",
        styles::muted_style(),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(styles::content_style(app.controller.loading()));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { " " };
    Line::from(vec![
        Span::raw("    "),
        Span::styled(format!("{}: [", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Keep the end of long input visible
fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(max_chars)).collect()
}
