use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
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
        }
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_up();
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.scroll_chat_to_bottom();
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Backspace => {
            app.delete_draft_char_before_cursor();
        }
        KeyCode::Delete => {
            app.delete_draft_char_at_cursor();
        }
        KeyCode::Left => {
            app.move_cursor_left();
        }
        KeyCode::Right => {
            app.move_cursor_right();
        }
        KeyCode::Home => {
            app.move_cursor_home();
        }
        KeyCode::End => {
            app.move_cursor_end();
        }
        KeyCode::Up => {
            app.scroll_up();
        }
        KeyCode::Down => {
            app.scroll_down();
        }
        KeyCode::Char(c) => {
            app.insert_draft_char(c);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;
    use crate::dispatch::Dispatcher;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn test_app() -> App {
        let (poke_tx, _poke_rx) = mpsc::unbounded_channel();
        let backend = BackendClient::new("http://127.0.0.1:1", Duration::from_secs(1));
        App::new(Dispatcher::new(backend, poke_tx))
    }

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn typed_characters_land_in_the_draft() {
        let mut app = test_app();
        for c in "hi there".chars() {
            handle_event(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(app.draft, "hi there");
        assert_eq!(app.draft_cursor, 8);
    }

    #[tokio::test]
    async fn ctrl_c_quits_in_any_mode() {
        let mut app = test_app();
        app.input_mode = InputMode::Normal;
        let event = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, event).unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn esc_and_enter_toggle_input_modes() {
        let mut app = test_app();
        assert_eq!(app.input_mode, InputMode::Editing);

        handle_event(&mut app, press(KeyCode::Esc)).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);

        handle_event(&mut app, press(KeyCode::Enter)).unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[tokio::test]
    async fn tick_only_animates_while_sending() {
        let mut app = test_app();
        handle_event(&mut app, AppEvent::Tick).unwrap();
        assert_eq!(app.animation_frame, 0);

        app.sending = true;
        handle_event(&mut app, AppEvent::Tick).unwrap();
        assert_eq!(app.animation_frame, 1);
    }
}
