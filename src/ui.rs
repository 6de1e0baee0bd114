use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, InputMode};
use crate::health::ConnectivityState;
use crate::transcript::{agent_name, Role, Turn};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let banner_height = if banner_line(app).is_some() { 1 } else { 0 };

    // Main layout: header, banner, chat, input, footer
    let [header_area, banner_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(banner_height),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    if let Some(line) = banner_line(app) {
        frame.render_widget(Paragraph::new(line), banner_area);
    }
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn connectivity_chip(state: ConnectivityState) -> Span<'static> {
    match state {
        ConnectivityState::Checking => {
            Span::styled("● checking", Style::default().fg(Color::Yellow))
        }
        ConnectivityState::Connected => {
            Span::styled("● connected", Style::default().fg(Color::Green))
        }
        ConnectivityState::Disconnected => {
            Span::styled("● disconnected", Style::default().fg(Color::Red))
        }
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " Agent Chat ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("· "),
        connectivity_chip(app.connectivity),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn banner_line(app: &App) -> Option<Line<'static>> {
    if let Some(message) = &app.banner {
        return Some(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    if app.connectivity == ConnectivityState::Checking {
        return Some(Line::from(Span::styled(
            "Checking server connection...".to_string(),
            Style::default().fg(Color::Yellow),
        )));
    }
    None
}

fn turn_label(turn: &Turn) -> Span<'static> {
    match turn.role {
        Role::User => Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Role::Agent if turn.is_error => Span::styled(
            "Error:",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Role::Agent => {
            let name = match turn.agent_id {
                Some(id) => agent_name(id),
                None => "Agent",
            };
            Span::styled(
                format!("{name}:"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        }
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let chat_text = if app.transcript.is_empty() && !app.sending {
        Text::from(Span::styled(
            "Try asking something like: 'Show all users from customers where age > 25' or 'Calculate 5 + 3'",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for turn in app.transcript.turns() {
            lines.push(Line::from(turn_label(turn)));

            let body_style = if turn.is_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            for line in turn.text.lines() {
                lines.push(Line::from(Span::styled(line.to_string(), body_style)));
            }
            lines.push(Line::default());
        }

        if app.sending {
            lines.push(Line::from(Span::styled(
                "Agent:",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    // trim: false keeps leading whitespace in replies (SQL, code) intact
    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.sending {
        " Message (waiting for reply) "
    } else {
        " Message (Enter to send) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible in long drafts.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.draft_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        // Clamp to the inner area so a tiny viewport cannot push the cursor
        // past the border (or past u16 on a long draft)
        let cursor_x = (cursor_pos - scroll_offset).min(inner_width.saturating_sub(1)) as u16;
        frame.set_cursor_position((
            area.x.saturating_add(cursor_x).saturating_add(1),
            area.y.saturating_add(1),
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = match app.input_mode {
        InputMode::Editing => " Enter send · Esc browse · Ctrl+C quit",
        InputMode::Normal => " i edit · j/k scroll · G bottom · q quit",
    };
    let footer = Paragraph::new(Span::styled(
        hints,
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(footer, area);
}
