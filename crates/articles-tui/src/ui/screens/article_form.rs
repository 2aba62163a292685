use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use articles_core::models::Topic;

use crate::app::{App, Focus, FormField};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Form);
    let field_focus = |field: FormField| focused && app.form_focus == field;

    let title = if app.is_editing() {
        " Edit Article "
    } else {
        " Create Article "
    };

    let mut lines = vec![
        label_line("Title", field_focus(FormField::Title)),
        value_line(&app.form.title, field_focus(FormField::Title)),
        Line::from(""),
        label_line("Text", field_focus(FormField::Text)),
        value_line(&app.form.text, field_focus(FormField::Text)),
        Line::from(""),
        label_line("Topic", field_focus(FormField::Topic)),
        topic_line(&app.form.topic, field_focus(FormField::Topic)),
        Line::from(""),
    ];

    let mut buttons = vec![Span::raw("  ")];
    buttons.push(button("Submit", field_focus(FormField::Submit)));
    if app.is_editing() {
        buttons.push(Span::raw("  "));
        buttons.push(button("Cancel edit", field_focus(FormField::Cancel)));
    } else {
        buttons.push(Span::raw("  "));
        buttons.push(button("Clear", field_focus(FormField::Cancel)));
    }
    lines.push(Line::from(buttons));

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
        .style(styles::content_style(app.controller.loading()));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn label_line(label: &'static str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::highlight_style()
    } else {
        styles::muted_style()
    };
    Line::from(Span::styled(format!(" {}", label), style))
}

fn value_line(value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{}{}", value, cursor), style),
    ])
}

fn topic_line(topic: &Topic, focused: bool) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    if focused {
        spans.push(Span::styled("◀ ", styles::help_key_style()));
    }
    for (i, known) in Topic::KNOWN.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(known.as_str().to_string(), styles::tab_style(known == topic)));
    }
    if !topic.is_known() {
        spans.push(Span::styled(" | ", styles::muted_style()));
        spans.push(Span::styled(topic.as_str().to_string(), styles::error_style()));
    }
    if focused {
        spans.push(Span::styled(" ▶", styles::help_key_style()));
    }
    Line::from(spans)
}

fn button(label: &str, focused: bool) -> Span<'static> {
    if focused {
        Span::styled(format!("[▶ {} ◀]", label), styles::selected_style())
    } else {
        Span::styled(format!("[  {}  ]", label), styles::list_item_style())
    }
}
