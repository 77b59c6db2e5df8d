use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, InputMode, Screen, UploadField};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line editing shared by every text field. Returns false for keys it
/// doesn't handle.
fn edit_text(text: &mut String, cursor: &mut usize, code: KeyCode) -> bool {
    let char_count = text.chars().count();
    *cursor = (*cursor).min(char_count);

    match code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_count),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_count,
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => app.scroll_chat_to_bottom(),
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Backend(event) => {
            app.apply_backend_event(event);
            app.sync_with_registry();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.next_screen();
            return;
        }
        KeyCode::BackTab => {
            app.prev_screen();
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Upload => handle_upload_normal(app, key),
        Screen::Flashcards => handle_flashcards(app, key),
        Screen::Quiz => handle_quiz(app, key),
        Screen::Chat => handle_chat_normal(app, key),
    }
}

fn handle_upload_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Char('k') | KeyCode::Up => {
            app.upload_field = match app.upload_field {
                UploadField::Url => UploadField::Document,
                UploadField::Document => UploadField::Url,
            };
        }
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        _ => {}
    }
}

fn handle_flashcards(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') | KeyCode::Right => app.deck.next(),
        KeyCode::Char('h') | KeyCode::Left => app.deck.prev(),
        KeyCode::Char(' ') | KeyCode::Enter => app.deck.flip(),
        KeyCode::Char('r') => {
            if !app.flashcard_set.is_loading() {
                app.request_flashcards();
            }
        }
        _ => {}
    }
}

fn handle_quiz(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c @ '1'..='9') => {
            let option = (c as usize) - ('1' as usize);
            app.quiz.select(option);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let count = app.quiz.current().map_or(0, |q| q.options.len());
            if count > 0 {
                let next = app.quiz.selected().map_or(0, |i| (i + 1) % count);
                app.quiz.select(next);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            let count = app.quiz.current().map_or(0, |q| q.options.len());
            if count > 0 {
                let prev = app.quiz.selected().map_or(count - 1, |i| (i + count - 1) % count);
                app.quiz.select(prev);
            }
        }
        KeyCode::Enter => {
            if app.quiz.is_submitted() {
                app.quiz.advance();
            } else {
                app.quiz.submit();
            }
        }
        KeyCode::Char('r') => app.quiz.reset(),
        KeyCode::Char('R') => {
            if !app.quiz_set.is_loading() {
                app.request_quiz();
            }
        }
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => {
            // Input stays locked until the current answer settles
            if !app.session.conversation.is_busy() {
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_by(-1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_by(i32::from(app.chat_height / 2));
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_by(-i32::from(app.chat_height / 2));
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') => app.scroll_chat_by(-i32::from(app.chat_scroll)),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Upload => handle_upload_editing(app, key),
        Screen::Chat => handle_chat_editing(app, key),
        _ => app.input_mode = InputMode::Normal,
    }
}

fn handle_upload_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => {
            app.submit_upload();
            if app.upload_hint.is_none() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
            app.upload_field = match app.upload_field {
                UploadField::Url => UploadField::Document,
                UploadField::Document => UploadField::Url,
            };
        }
        code => {
            // Fields are read-only while their upload is in flight
            if app.ingest.is_busy() {
                return;
            }
            match app.upload_field {
                UploadField::Url => edit_text(&mut app.ingest.url, &mut app.url_cursor, code),
                UploadField::Document => {
                    edit_text(&mut app.ingest.document_path, &mut app.path_cursor, code)
                }
            };
        }
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.send_chat_message(),
        code => {
            if !app.session.conversation.is_busy() {
                edit_text(&mut app.chat_input, &mut app.chat_cursor, code);
            }
        }
    }
}
