use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply { id, result } => app.settle(id, result),
        AppEvent::MemoryCleared(result) => app.memory_cleared(result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Footer notices last until the next key press
    app.status = None;

    // Global keys that work in any mode; other Ctrl chords are ignored
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.quit(),
            KeyCode::Char('l') => app.clear_conversation(),
            KeyCode::Char('r') => app.retry(),
            KeyCode::Char('d') => app.scroll_half_page_down(),
            KeyCode::Char('u') => app.scroll_half_page_up(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::PageDown => return app.scroll_half_page_down(),
        KeyCode::PageUp => return app.scroll_half_page_up(),
        _ => {}
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.cursor_end();
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ella_core::{ChatClient, ChatError, Message, Submission};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = ChatClient::new("http://localhost:8000", None).unwrap();
        (App::new(client, "Ella", tx), rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn ctrl(app: &mut App, c: char) {
        handle_event(app, AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_typing_fills_input() {
        let (mut app, _rx) = test_app();
        for c in "hi there".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.conversation.input(), "hi ther");
        assert_eq!(app.cursor, 7);
    }

    #[test]
    fn test_enter_on_whitespace_does_nothing() {
        let (mut app, mut rx) = test_app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);

        assert!(app.conversation.history().is_empty());
        assert!(!app.conversation.is_pending());
        assert_eq!(app.conversation.input(), "  ");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reply_event_settles_conversation() {
        let (mut app, _rx) = test_app();
        let outgoing = match app.conversation.submit("hello") {
            Submission::Sent(outgoing) => outgoing,
            other => panic!("unexpected {other:?}"),
        };

        handle_event(
            &mut app,
            AppEvent::Reply {
                id: outgoing.id,
                result: Ok("hi there".to_string()),
            },
        );

        assert_eq!(
            app.conversation.history(),
            &[Message::user("hello"), Message::assistant("hi there")]
        );
        assert!(!app.conversation.is_pending());
    }

    #[test]
    fn test_failed_reply_event_sets_error() {
        let (mut app, _rx) = test_app();
        let outgoing = match app.conversation.submit("hello") {
            Submission::Sent(outgoing) => outgoing,
            other => panic!("unexpected {other:?}"),
        };

        handle_event(
            &mut app,
            AppEvent::Reply {
                id: outgoing.id,
                result: Err(ChatError::MalformedBody("expected value".into())),
            },
        );

        assert!(!app.conversation.is_pending());
        assert!(app.conversation.last_error().is_some());
        assert_eq!(app.conversation.history().len(), 1);
    }

    #[test]
    fn test_modes_and_quit() {
        let (mut app, _rx) = test_app();
        assert_eq!(app.input_mode, InputMode::Editing);

        // 'q' is text while editing
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.conversation.input(), "q");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.input_mode, InputMode::Editing);

        ctrl(&mut app, 'c');
        assert!(app.should_quit);
    }

    #[test]
    fn test_unbound_ctrl_chords_do_not_type() {
        let (mut app, _rx) = test_app();
        press(&mut app, KeyCode::Char('h'));
        ctrl(&mut app, 'a');
        ctrl(&mut app, 'w');
        assert_eq!(app.conversation.input(), "h");
        assert_eq!(app.cursor, 1);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_notice_expires_on_next_key() {
        let (mut app, _rx) = test_app();
        ctrl(&mut app, 'r');
        assert_eq!(app.status.as_deref(), Some("Nothing to retry"));

        press(&mut app, KeyCode::Char('x'));
        assert!(app.status.is_none());
        assert_eq!(app.conversation.input(), "x");
    }

    #[test]
    fn test_tick_animates_only_while_pending() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 0);

        app.conversation.submit("hello");
        handle_event(&mut app, AppEvent::Tick);
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 2);
        handle_event(&mut app, AppEvent::Tick);
        assert_eq!(app.animation_frame, 0);
    }

    #[test]
    fn test_memory_clear_failure_is_reported() {
        let (mut app, _rx) = test_app();
        handle_event(
            &mut app,
            AppEvent::MemoryCleared(Err(ChatError::Status {
                status: 500,
                detail: "Thread memory not initialized.".into(),
            })),
        );
        let status = app.status.clone().unwrap();
        assert!(status.contains("Thread memory not initialized."));
    }
}
