//! Rendering of the wizard
//!
//! Pure function of the app state: nothing here mutates the wizard.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::app::App;
use crate::wizard::Wizard;

const BRAND: Color = Color::Rgb(0x42, 0xA5, 0xF5);
const ACCENT: Color = Color::Rgb(0xFF, 0x7F, 0x50);
const MUTED: Color = Color::Rgb(0x80, 0x80, 0x80);
const ERROR: Color = Color::Rgb(0xEF, 0x53, 0x50);
const SUCCESS: Color = Color::Rgb(0x66, 0xBB, 0x6A);

const CARD_WIDTH: u16 = 64;
const SAVING_LABEL: &str = "Saving...";

pub fn render<B>(frame: &mut Frame, app: &App<B>) {
    let area = frame.area();
    let [main, status] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

    let card = centered_card(main);
    let wizard = &app.wizard;
    let editing = wizard.current_block().kind.field().is_some();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRAND))
        .title(Span::styled(
            format!(" {} ", progress_dots(wizard)),
            Style::default().fg(BRAND),
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let [content, input_area, error_area, buttons_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(if editing { 3 } else { 0 }),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(content_lines(wizard))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        content,
    );

    if editing {
        render_input(frame, app, input_area);
    }

    if let Some(error) = &wizard.state().field_error {
        frame.render_widget(
            Paragraph::new(Span::styled(error.as_str(), Style::default().fg(ERROR)))
                .alignment(Alignment::Center),
            error_area,
        );
    }

    frame.render_widget(
        Paragraph::new(button_row(app)).alignment(Alignment::Center),
        buttons_area,
    );

    render_status(frame, app, status);

    if let Some(notice) = &wizard.state().notice {
        render_notice(frame, notice, area);
    }
}

/// One dot per block, filled up to the current one
pub fn progress_dots(wizard: &Wizard) -> String {
    (0..wizard.course().len())
        .map(|i| if i <= wizard.position() { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

fn centered_card(area: Rect) -> Rect {
    let [_, column, _] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(CARD_WIDTH.min(area.width)),
        Constraint::Min(0),
    ])
    .areas(area);
    let [_, card, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(20.min(column.height)),
        Constraint::Min(0),
    ])
    .areas(column);
    card
}

fn content_lines(wizard: &Wizard) -> Vec<Line<'static>> {
    let block = wizard.current_block();
    let mut lines = vec![Line::from("")];

    lines.push(Line::from(Span::styled(
        block.placeholder_glyph().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if let Some(url) = block.remote_image() {
        lines.push(Line::from(Span::styled(
            url.to_string(),
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        wizard.display_title(),
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    lines.extend(block.text.lines().map(|l| Line::from(l.to_string())));
    lines
}

fn render_input<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
    let field = app.wizard.current_block().kind.field();
    let submitting = app.wizard.state().is_submitting();
    let has_error = app.wizard.state().field_error.is_some();

    let border = if has_error {
        ERROR
    } else if submitting {
        MUTED
    } else {
        BRAND
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let text = if app.input.value().is_empty() {
        let hint = field.map(|f| f.input_hint()).unwrap_or_default();
        Span::styled(hint, Style::default().fg(MUTED))
    } else {
        Span::raw(app.input.value().to_string())
    };

    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(text).block(block), area);

    if !submitting && app.wizard.state().notice.is_none() {
        let before: String = app.input.value().chars().take(app.input.cursor()).collect();
        let x = inner.x + (before.width() as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position((x, inner.y));
    }
}

fn button_row<B>(app: &App<B>) -> Line<'static> {
    let wizard = &app.wizard;
    let block = wizard.current_block();
    let submitting = wizard.state().is_submitting();
    let editing = block.kind.field().is_some();

    let mut spans = Vec::new();
    for (i, button) in block.buttons.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let highlighted = if editing { i == 0 } else { i == app.focused };
        let (label, style) = if submitting && i == 0 {
            (SAVING_LABEL.to_string(), Style::default().fg(MUTED))
        } else if highlighted {
            (
                button.text.clone(),
                Style::default()
                    .fg(Color::Black)
                    .bg(BRAND)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (button.text.clone(), Style::default().fg(BRAND))
        };
        spans.push(Span::styled(format!(" {} ", label), style));
    }
    Line::from(spans)
}

fn render_status<B>(frame: &mut Frame, app: &App<B>, area: Rect) {
    let wizard = &app.wizard;
    let backend = match wizard.state().backend_healthy {
        Some(true) => Span::styled("online", Style::default().fg(SUCCESS)),
        Some(false) => Span::styled("unreachable", Style::default().fg(ERROR)),
        None => Span::styled("checking", Style::default().fg(MUTED)),
    };
    let activity = if app.pending > 0 {
        const SPINNER: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];
        SPINNER[(app.ticks % SPINNER.len() as u64) as usize]
    } else {
        " "
    };
    let key = Style::default().fg(BRAND).add_modifier(Modifier::BOLD);
    let (paging, paging_hint) = if wizard.is_last() {
        ("PgUp", ":prev ")
    } else {
        ("PgDn/PgUp", ":next/prev ")
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" Step {}/{} ", wizard.position() + 1, wizard.course().len()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ backend: "),
        backend,
        Span::raw(format!(" {} │ ", activity)),
        Span::styled("Enter", key),
        Span::raw(":select "),
        Span::styled(paging, key),
        Span::raw(paging_hint),
        Span::styled("Esc", key),
        Span::raw(":back "),
        Span::styled("Ctrl+C", key),
        Span::raw(":quit"),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_notice(frame: &mut Frame, notice: &str, area: Rect) {
    let width = (notice.width() as u16 + 6).max(24).min(area.width);
    let [_, row, _] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(5.min(area.height)),
        Constraint::Min(0),
    ])
    .areas(area);
    let [_, popup, _] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(width),
        Constraint::Min(0),
    ])
    .areas(row);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" Notice ")
        .title_alignment(Alignment::Center);
    let lines = vec![
        Line::from(notice.to_string()),
        Line::from(""),
        Line::from(Span::styled("Enter to close", Style::default().fg(MUTED))),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        popup,
    );
}
