//! Terminal drawing for the viewer

use ratatui::{prelude::*, widgets::*};

use crate::messages::render::{LoadStatus, RenderState};

/// Color for a load status
pub fn status_color(status: LoadStatus) -> Color {
    match status {
        LoadStatus::Loading | LoadStatus::Refreshing => Color::Yellow,
        LoadStatus::Ready => Color::Green,
        LoadStatus::Failed => Color::Red,
    }
}

fn scalar_style(token: &str) -> Style {
    let token = token.trim_end_matches(',');
    if token.starts_with('"') {
        Style::default().fg(Color::Green)
    } else if matches!(token, "true" | "false" | "null") {
        Style::default().fg(Color::Magenta)
    } else if token.parse::<f64>().is_ok() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

/// Byte index of the quote closing the string that opens `s`, skipping
/// backslash escapes
fn closing_quote(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

/// Highlight one line of pretty-printed JSON
fn highlight_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    let punct = Style::default().fg(Color::Yellow);

    let mut spans = vec![Span::raw(indent.to_string())];

    // `"key": value` - only when the string's real closing quote is followed by `: `
    let (key, rest) = match closing_quote(trimmed) {
        Some(close) if trimmed[close + 1..].starts_with(": ") => {
            (Some(&trimmed[..=close]), &trimmed[close + 3..])
        }
        _ => (None, trimmed),
    };

    if let Some(key) = key {
        spans.push(Span::styled(key.to_string(), Style::default().fg(Color::Cyan)));
        spans.push(Span::raw(": "));
    }

    match rest.trim_end_matches(',') {
        "{" | "[" | "}" | "]" | "{}" | "[]" => spans.push(Span::styled(rest.to_string(), punct)),
        _ => spans.push(Span::styled(rest.to_string(), scalar_style(rest))),
    }

    Line::from(spans)
}

/// JSON syntax highlighting for pretty-printed bodies
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    text.lines().map(highlight_line).collect()
}

pub fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // URL
            Constraint::Min(5),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_url_bar(f, state, chunks[0]);
    draw_body(f, state, chunks[1]);
    draw_status_bar(f, state, chunks[2]);

    if state.show_help {
        draw_help_popup(f, area);
    }
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let star = if state.is_favorite { " ★" } else { "" };
    let title = Line::from(vec![
        Span::raw(" Resource"),
        Span::styled(star, Style::default().fg(Color::Yellow)),
        Span::raw(format!(" (refresh #{}) ", state.refresh_key)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    f.render_widget(Paragraph::new(state.url.as_str()).block(block), area);
}

fn draw_body(f: &mut Frame, state: &RenderState, area: Rect) {
    let color = status_color(state.status);
    let title = Span::styled(
        format!(" {} ", state.status.label()),
        Style::default().fg(color).bold(),
    );
    let updated = state
        .updated_at
        .as_deref()
        .map(|t| format!(" Last updated: {} ", t))
        .unwrap_or_default();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_bottom(Line::from(updated).right_aligned());

    let mut lines = Vec::new();
    if let Some(error) = &state.error {
        lines.push(Line::from(Span::styled(
            format!("! {}", error),
            Style::default().fg(Color::Red).bold(),
        )));
        lines.push(Line::default());
    }
    if state.body.is_empty() && state.status == LoadStatus::Loading {
        lines.push(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.extend(highlight_json(&state.body));

    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    f.render_widget(body, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let text = match &state.notice {
        Some(notice) => format!(" {} ", notice),
        None => String::from(" r:refresh | f:favorite | ↑/↓:scroll | ?:help | q:quit "),
    };

    let bar = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(50, 50, area);

    let help_text = r#"
 LOADSTATE - Keyboard Shortcuts

   r / F5             Refresh (new refresh key)
   f                  Toggle favorite
   ↑ / ↓  (k / j)     Scroll body
   ?                  Toggle this help
   q / Esc / Ctrl+C   Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
