use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::{App, Focus};
use crate::ui::styles;

use super::article_form;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_article_list(frame, app, chunks[0]);
    article_form::render(frame, app, chunks[1]);
}

fn render_article_list(frame: &mut Frame, app: &App, area: Rect) {
    let articles = app.controller.articles();
    let editing = app.controller.current_article().map(|a| a.id);
    let text_width = (area.width as usize).saturating_sub(6);

    let items: Vec<ListItem> = articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let marker = if Some(article.id) == editing { "✎ " } else { "  " };
            let lines = vec![
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(truncate(&article.title, text_width), styles::title_style()),
                ]),
                Line::from(Span::styled(
                    format!("  {}", truncate(&article.text, text_width)),
                    styles::list_item_style(),
                )),
                Line::from(Span::styled(
                    format!("  Topic: {}", article.topic),
                    styles::muted_style(),
                )),
            ];

            let style = if i == app.list_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            ListItem::new(lines).style(style)
        })
        .collect();

    let focused = matches!(app.focus, Focus::List);
    let block = Block::default()
        .title(format!(" Articles ({}) ", articles.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .style(styles::content_style(app.controller.loading()));

    if articles.is_empty() {
        let empty = List::new(vec![ListItem::new(Span::styled(
            "  No articles yet. Press [n] to write one.",
            styles::muted_style(),
        ))])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.list_selection));

    frame.render_stateful_widget(list, area, &mut state);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("ünïcödé text", 6), "ünï...");
    }
}
