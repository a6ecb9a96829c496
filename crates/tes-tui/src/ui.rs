use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tes_core::{ChatMessage, ChatRole};
use crate::app::{App, Focus};
use crate::textarea::AutoResizeTextarea;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Wrap text to fit within a given width, returning multiple lines
/// Uses word boundaries for wrapping; only words wider than a line are split
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(width) {
            let piece: String = chunk.iter().collect();
            let piece_len = chunk.len();

            if current_len == 0 {
                current_line = piece;
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= width {
                current_line.push(' ');
                current_line.push_str(&piece);
                current_len += 1 + piece_len;
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = piece;
                current_len = piece_len;
            }
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Build the lines of the message list: one bubble per message, at most
/// 80% of `width`, user bubbles on the right and assistant bubbles on the
/// left, separated by a blank line.
pub fn message_lines(messages: &[ChatMessage], width: u16) -> Vec<Line<'static>> {
    // 1 column of padding on each side of the bubble text
    let bubble_width = (width as usize * 4 / 5).max(3);
    let text_width = bubble_width - 2;

    let mut lines = Vec::new();

    for (idx, msg) in messages.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::default());
        }

        let (style, alignment) = match msg.role {
            ChatRole::User => (Style::default().bg(Color::Blue).fg(Color::White), Alignment::Right),
            ChatRole::Assistant => (Style::default().bg(Color::Gray).fg(Color::Black), Alignment::Left),
        };

        let label = format!("{}:", msg.role.label());
        let body = format!("{} {}", label, msg.content);

        let mut wrapped = Vec::new();
        for paragraph in body.split('\n') {
            wrapped.extend(wrap_text_to_width(paragraph, text_width));
        }

        let inner_width = wrapped.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        for (row, text) in wrapped.into_iter().enumerate() {
            let pad = " ".repeat(inner_width - text.chars().count());
            let spans = if row == 0 && text.starts_with(&label) {
                let rest = text[label.len()..].to_string();
                vec![
                    Span::styled(" ", style),
                    Span::styled(label.clone(), style.add_modifier(Modifier::BOLD)),
                    Span::styled(format!("{}{} ", rest, pad), style),
                ]
            } else {
                vec![Span::styled(format!(" {}{} ", text, pad), style)]
            };
            lines.push(Line::from(spans).alignment(alignment));
        }
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Form is centered and takes half the screen on wide terminals
    let form_width = if area.width >= 100 { area.width / 2 } else { area.width };

    // user id row + file row + textarea + form borders
    let form_height = {
        let textarea = message_input(app);
        (textarea.required_height(form_width.saturating_sub(2)) + 4)
            .min(area.height.saturating_sub(6).max(5))
    };

    // Main layout: header, messages, form, footer
    let [header_area, chat_area, form_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(form_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_messages(app, frame, chat_area);

    let [form_area] = Layout::horizontal([Constraint::Length(form_width)])
        .flex(Flex::Center)
        .areas(form_area);
    render_form(app, frame, form_area);

    render_footer(app, frame, footer_area);

    if let Some(alert) = app.session.alert() {
        render_alert(alert, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.session.in_flight();
    let status = if pending > 0 {
        let spinner = SPINNER[app.animation_frame as usize % SPINNER.len()];
        format!(" {} {} pending", spinner, pending)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" TES Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.client.base_url().to_string(), Style::default().fg(Color::Gray)),
        Span::styled(status, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_welcome(frame: &mut Frame, area: Rect) {
    let [panel] = Layout::vertical([Constraint::Length(3)])
        .flex(Flex::Center)
        .areas(area);

    let welcome = Paragraph::new(vec![
        Line::from(Span::styled(
            "Welcome to TES",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Upload a file or type a message to chat with the AI",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });

    frame.render_widget(welcome, panel);
}

fn render_messages(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let [inner] = Layout::horizontal([Constraint::Min(0)])
        .horizontal_margin(2)
        .areas(area);

    if app.session.messages().is_empty() {
        app.chat_height = inner.height;
        render_welcome(frame, inner);
        return;
    }

    let lines = message_lines(app.session.messages(), inner.width);
    app.chat_height = inner.height;
    app.fit_scroll(lines.len().min(u16::MAX as usize) as u16);

    let chat = Paragraph::new(Text::from(lines)).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, inner);
}

fn message_input(app: &App) -> AutoResizeTextarea<'_> {
    let focused = app.focus == Focus::Message;
    let border_color = if focused { Color::Yellow } else { Color::DarkGray };

    AutoResizeTextarea::new(&app.session.draft().query, app.message_caret)
        .placeholder("Type your message...")
        .style(Style::default().fg(Color::Cyan))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Message (Enter to send) "),
        )
}

/// Columns scrolled off the left of a single-line field so the caret stays visible
fn field_scroll(caret: usize, width: usize) -> usize {
    if caret >= width {
        caret - width + 1
    } else {
        0
    }
}

/// Label plus the window of `value` that fits in `width` columns.
/// A focused field (`caret` is set) scrolls to keep the caret in view.
fn field_line(label: &str, value: &str, placeholder: &str, caret: Option<usize>, width: u16) -> Line<'static> {
    let label_style = if caret.is_some() {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let value_width = (width as usize).saturating_sub(label.chars().count());
    let value_span = if value.is_empty() {
        Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray).italic())
    } else {
        let offset = field_scroll(caret.unwrap_or(0), value_width);
        let visible: String = value.chars().skip(offset).take(value_width).collect();
        Span::styled(visible, Style::default().fg(Color::Cyan))
    };

    Line::from(vec![Span::styled(label.to_string(), label_style), value_span])
}

/// Terminal cell of the caret in a single-line field, never past its right edge
fn field_cursor(area: Rect, label: &str, caret: usize) -> (u16, u16) {
    let label_width = label.chars().count() as u16;
    let value_width = area.width.saturating_sub(label_width);
    let column = caret - field_scroll(caret, value_width as usize);
    let x = area
        .x
        .saturating_add(label_width)
        .saturating_add(column.min(u16::MAX as usize) as u16)
        .min(area.right().saturating_sub(1));
    (x, area.y)
}

const USER_ID_LABEL: &str = "User ID: ";
const FILE_LABEL: &str = "File:    ";

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [user_area, file_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(3),
    ])
    .areas(inner);

    let draft = app.session.draft();

    let user_line = field_line(
        USER_ID_LABEL,
        &draft.user_id,
        "Enter TD User ID",
        (app.focus == Focus::UserId).then(|| app.user_id_caret.position()),
        user_area.width,
    );
    frame.render_widget(Paragraph::new(user_line), user_area);

    let file_line = match (&draft.file, app.focus == Focus::File) {
        (Some(file), false) => {
            let mut line = field_line(FILE_LABEL, &file.file_name, "", None, file_area.width);
            line.push_span(Span::styled(
                format!(" ({}, {} bytes)", file.mime, file.size()),
                Style::default().fg(Color::Gray),
            ));
            line
        }
        (selected, focused) => {
            let placeholder = match selected {
                Some(file) => format!("{} selected, type a path to replace", file.file_name),
                None => "path to a file, Enter to attach".to_string(),
            };
            let caret = focused.then(|| app.file_path_caret.position());
            field_line(FILE_LABEL, &app.file_path_input, &placeholder, caret, file_area.width)
        }
    };
    frame.render_widget(Paragraph::new(file_line), file_area);

    let textarea = message_input(app);
    let cursor = textarea.cursor_position(input_area);
    frame.render_widget(textarea, input_area);

    if app.session.alert().is_some() {
        return;
    }

    let position = match app.focus {
        Focus::UserId => field_cursor(user_area, USER_ID_LABEL, app.user_id_caret.position()),
        Focus::File => field_cursor(file_area, FILE_LABEL, app.file_path_caret.position()),
        Focus::Message => cursor,
    };
    frame.set_cursor_position(position);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let mut hints = vec![
        ("Enter", "send"),
        ("Shift+Enter", "newline"),
        ("Tab", "next field"),
        ("PgUp/PgDn", "scroll"),
    ];
    if app.focus == Focus::File {
        hints.push(("Esc", "clear file"));
    }
    hints.push(("Ctrl+C", "quit"));

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_alert(alert: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 6.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");

    let text = vec![
        Line::from(alert.to_string()),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to dismiss",
            Style::default().fg(Color::Gray),
        )),
    ];

    let popup = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, popup_area);
}
