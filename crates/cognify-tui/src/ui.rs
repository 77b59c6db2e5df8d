use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};
use cognify_core::{ChatRole, Conversation, LoadStatus, Notice, OptionMark};
use crate::app::{App, BackendStatus, InputMode, Screen, UploadField};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn ellipsis(frame: u8) -> String {
    ".".repeat(frame as usize + 1)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, tabs, body, footer
    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tabs(app, frame, tabs_area);

    match app.screen {
        Screen::Upload => render_upload_screen(app, frame, body_area),
        Screen::Flashcards => render_flashcards_screen(app, frame, body_area),
        Screen::Quiz => render_quiz_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let count = app.session.registry.len();
    let counter = if count > 0 {
        format!(" {} content item(s) uploaded ", count)
    } else {
        String::new()
    };

    let status = match &app.backend_status {
        BackendStatus::Unknown => Span::styled(" connecting ", Style::default().fg(Color::Gray)),
        BackendStatus::Online(banner) => {
            Span::styled(format!(" online ({}) ", banner), Style::default().fg(Color::Green))
        }
        BackendStatus::Offline => Span::styled(" offline ", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(" Cognify ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(counter, Style::default().fg(Color::White)),
        status,
        Span::styled(app.backend_url().to_string(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let has_content = app.has_content();
    let titles: Vec<Line> = Screen::all()
        .iter()
        .map(|screen| {
            let style = if screen.needs_content() && !has_content {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(screen.title(), style))
        })
        .collect();

    let selected = Screen::all()
        .iter()
        .position(|s| *s == app.screen)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");

    frame.render_widget(tabs, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Upload => " UPLOAD ",
        Screen::Flashcards => " CARDS ",
        Screen::Quiz => " QUIZ ",
        Screen::Chat => " CHAT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match (app.screen, app.input_mode) {
        (Screen::Upload, InputMode::Normal) => &[("j/k", "field"), ("Enter", "edit")],
        (Screen::Upload, InputMode::Editing) => &[("Enter", "submit"), ("Tab", "field"), ("Esc", "done")],
        (Screen::Flashcards, _) => &[("h/l", "card"), ("Space", "flip"), ("r", "regenerate")],
        (Screen::Quiz, _) => &[
            ("1-9 j/k", "choose"),
            ("Enter", "submit/next"),
            ("r", "retake"),
            ("R", "regenerate"),
        ],
        (Screen::Chat, InputMode::Normal) => &[("i", "ask"), ("j/k", "scroll"), ("G", "bottom")],
        (Screen::Chat, InputMode::Editing) => &[("Enter", "send"), ("Esc", "done")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }
    if app.input_mode == InputMode::Normal {
        spans.extend([
            Span::styled(" Tab ", key_style),
            Span::styled(" screen ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
    }
    if let Some(status) = &app.status_line {
        spans.push(Span::styled(format!("  {}", status), Style::default().fg(Color::Yellow)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Single-line input box that scrolls horizontally to keep the cursor visible
fn render_input(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    text: &str,
    cursor: usize,
    focused: bool,
    editing: bool,
) {
    let border_color = if editing {
        Color::Yellow
    } else if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title));

    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor = cursor.min(text.chars().count());
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = text.chars().skip(scroll_offset).take(inner_width).collect();
    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_upload_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [url_area, path_area, status_area, help_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing;
    let url_focused = app.upload_field == UploadField::Url;

    render_input(
        frame,
        url_area,
        "YouTube URL",
        &app.ingest.url,
        app.url_cursor,
        url_focused,
        editing && url_focused,
    );
    render_input(
        frame,
        path_area,
        "PDF path",
        &app.ingest.document_path,
        app.path_cursor,
        !url_focused,
        editing && !url_focused,
    );

    let status = if let Some(kind) = app.ingest.in_flight() {
        let what = match kind {
            cognify_core::IngestKind::Video => "video",
            cognify_core::IngestKind::Document => "PDF",
        };
        Line::from(Span::styled(
            format!("Processing {}{}", what, ellipsis(app.animation_frame)),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    } else if let Some(hint) = app.upload_hint {
        Line::from(Span::styled(hint, Style::default().fg(Color::Yellow)))
    } else {
        match app.ingest.notice() {
            Some(Notice::Success(message)) => {
                Line::from(Span::styled(message.clone(), Style::default().fg(Color::Green)))
            }
            Some(Notice::Error(message)) => {
                Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)))
            }
            None => Line::default(),
        }
    };

    let status_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Status ");
    frame.render_widget(Paragraph::new(status).block(status_block), status_area);

    let help = if app.has_content() {
        "Add more sources, or press Tab to study what you've uploaded."
    } else {
        "Paste a video link or the path to a PDF. Flashcards, Quiz and Chat unlock after the first upload."
    };
    let help = Paragraph::new(help)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true });
    frame.render_widget(help, help_area);
}

/// Shared loading / failure / empty states for the generated views
fn render_generation_state(
    frame: &mut Frame,
    area: Rect,
    status: &LoadStatus,
    noun: &str,
    animation_frame: u8,
) -> bool {
    let message = match status {
        LoadStatus::Loading => Line::from(Span::styled(
            format!("Generating {}{}", noun, ellipsis(animation_frame)),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC),
        )),
        LoadStatus::Failed(error) => Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        LoadStatus::Idle | LoadStatus::Ready => return false,
    };

    let paragraph = Paragraph::new(message)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(paragraph, area);
    true
}

fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let paragraph = Paragraph::new(Span::styled(message.to_string(), Style::default().fg(Color::Gray)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(paragraph, area);
}

fn render_flashcards_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    if render_generation_state(frame, area, app.flashcard_set.status(), "flashcards", app.animation_frame) {
        return;
    }
    if app.deck.is_empty() {
        render_empty(frame, area, "No flashcards generated yet.");
        return;
    }

    let [counter_area, card_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let counter = Paragraph::new(format!("Card {} of {}", app.deck.index() + 1, app.deck.len()))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Magenta));
    frame.render_widget(counter, counter_area);

    let (side, color) = if app.deck.is_flipped() {
        (" Answer ", Color::Magenta)
    } else {
        (" Question ", Color::Cyan)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(side)
        .title_bottom(Line::from(" Space to flip ").right_aligned());

    // Pad from the top so short cards sit mid-card
    let text = app.deck.visible_text().unwrap_or_default();
    let inner_height = card_area.height.saturating_sub(2);
    let top_pad = inner_height.saturating_sub(1) / 2;
    let mut lines: Vec<Line> = (0..top_pad).map(|_| Line::default()).collect();
    lines.push(Line::from(Span::styled(text.to_string(), Style::default().add_modifier(Modifier::BOLD))));

    let card = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(card, card_area);
}

fn render_quiz_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    if render_generation_state(frame, area, app.quiz_set.status(), "quiz", app.animation_frame) {
        return;
    }
    if app.quiz.is_empty() {
        render_empty(frame, area, "No quiz questions generated yet.");
        return;
    }

    let [progress_area, body_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let progress = Line::from(vec![
        Span::styled(
            format!("Question {} of {}", app.quiz.index() + 1, app.quiz.len()),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw("   "),
        Span::styled(
            format!("Score: {}/{}", app.quiz.score(), app.quiz.len()),
            Style::default().fg(Color::Cyan),
        ),
    ]);
    frame.render_widget(Paragraph::new(progress).alignment(Alignment::Center), progress_area);

    if app.quiz.is_complete() {
        render_quiz_complete(app, frame, body_area);
        return;
    }

    let Some(question) = app.quiz.current() else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            question.question.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    for (i, option) in question.options.iter().enumerate() {
        let (marker, style) = match app.quiz.mark(i) {
            OptionMark::Plain => ("  ", Style::default()),
            OptionMark::Selected => ("> ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            OptionMark::Correct => ("✓ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            OptionMark::Incorrect => ("✗ ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        };
        lines.push(Line::from(vec![
            Span::styled(marker, style),
            Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Gray)),
            Span::styled(option.clone(), style),
        ]));
    }

    lines.push(Line::default());
    let prompt = if app.quiz.is_submitted() {
        "Press Enter for the next question"
    } else if app.quiz.selected().is_some() {
        "Press Enter to submit"
    } else {
        "Choose an answer"
    };
    lines.push(Line::from(Span::styled(prompt, Style::default().fg(Color::Gray))));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Quiz Challenge ");
    let body = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(body, body_area);
}

fn render_quiz_complete(app: &App, frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "Quiz Complete!",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            format!("{} / {}", app.quiz.score(), app.quiz.len()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{}% Correct", app.quiz.percentage())),
        Line::default(),
        Line::from(Span::styled(
            "r to retake, R for new questions",
            Style::default().fg(Color::Gray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    frame.render_widget(
        Paragraph::new(Text::from(lines)).alignment(Alignment::Center).block(block),
        area,
    );
}

/// Transcript lines exactly as the chat view draws them
fn chat_lines(conversation: &Conversation, animation_frame: u8) -> Vec<Line<'static>> {
    let pending = conversation.pending_index();
    let mut lines: Vec<Line> = Vec::new();

    for (i, msg) in conversation.messages().iter().enumerate() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                if pending == Some(i) && msg.content.is_empty() {
                    // Animated ellipsis: cycles through ".", "..", "..."
                    lines.push(Line::from(Span::styled(
                        format!("Thinking{}", ellipsis(animation_frame)),
                        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
                    )));
                } else {
                    for line in msg.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn wrapped(text: Text<'static>) -> Paragraph<'static> {
    Paragraph::new(text).wrap(Wrap { trim: false })
}

/// Rows the transcript takes once wrapped to `width` columns
pub fn transcript_height(conversation: &Conversation, animation_frame: u8, width: u16) -> u16 {
    let rows = wrapped(Text::from(chat_lines(conversation, animation_frame))).line_count(width);
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);
    if app.chat_follow {
        app.scroll_chat_to_bottom();
    }

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Chat: {} source(s) ", app.session.registry.len()));

    let conversation = &app.session.conversation;
    let chat_text = if conversation.messages().is_empty() {
        Text::from(Span::styled(
            "Ask a question about your uploaded content...",
            Style::default().fg(Color::Gray),
        ))
    } else {
        Text::from(chat_lines(conversation, app.animation_frame))
    };

    let chat = wrapped(chat_text)
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let busy = conversation.is_busy();
    let title = if busy { "Waiting for answer" } else { "Ask" };
    render_input(
        frame,
        input_area,
        title,
        &app.chat_input,
        app.chat_cursor,
        !busy,
        app.input_mode == InputMode::Editing && !busy,
    );
}
