use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, Focus};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::Reply { id, result } => {
            app.apply_reply(id, result);
        }
    }
    Ok(())
}

/// Enter submits the form unless Shift (or Alt, for terminals that cannot
/// report Shift+Enter) is held.
pub fn is_submit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Enter
        && !key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT)
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // The failure alert blocks everything else until dismissed
    if app.session.alert().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.session.dismiss_alert();
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return Ok(());
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return Ok(());
        }
        KeyCode::PageUp => {
            app.scroll_up(app.chat_height.max(2) / 2);
            return Ok(());
        }
        KeyCode::PageDown => {
            app.scroll_down(app.chat_height.max(2) / 2);
            return Ok(());
        }
        _ => {}
    }

    match app.focus {
        Focus::UserId => handle_user_id_editing(app, key),
        Focus::File => handle_file_editing(app, key).await,
        Focus::Message => handle_message_editing(app, key),
    }

    Ok(())
}

fn handle_user_id_editing(app: &mut App, key: KeyEvent) {
    let user_id = &mut app.session.draft_mut().user_id;
    let caret = &mut app.user_id_caret;

    match key.code {
        // Enter in a single-line field submits the whole form
        KeyCode::Enter if is_submit_key(&key) => {
            app.submit();
        }
        KeyCode::Backspace => caret.backspace(user_id),
        KeyCode::Delete => caret.delete(user_id),
        KeyCode::Left => caret.left(),
        KeyCode::Right => caret.right(user_id),
        KeyCode::Home => caret.home(),
        KeyCode::End => caret.end(user_id),
        KeyCode::Char(c) => caret.insert(user_id, c),
        _ => {}
    }
}

async fn handle_file_editing(app: &mut App, key: KeyEvent) {
    let path = &mut app.file_path_input;
    let caret = &mut app.file_path_caret;

    match key.code {
        KeyCode::Enter => app.select_file().await,
        KeyCode::Esc => app.clear_file(),
        KeyCode::Backspace => caret.backspace(path),
        KeyCode::Delete => caret.delete(path),
        KeyCode::Left => caret.left(),
        KeyCode::Right => caret.right(path),
        KeyCode::Home => caret.home(),
        KeyCode::End => caret.end(path),
        KeyCode::Char(c) => caret.insert(path, c),
        _ => {}
    }
}

fn handle_message_editing(app: &mut App, key: KeyEvent) {
    if is_submit_key(&key) {
        app.submit();
        return;
    }

    let query = &mut app.session.draft_mut().query;
    let caret = &mut app.message_caret;

    match key.code {
        KeyCode::Enter => caret.insert(query, '\n'),
        KeyCode::Backspace => caret.backspace(query),
        KeyCode::Delete => caret.delete(query),
        KeyCode::Left => caret.left(),
        KeyCode::Right => caret.right(query),
        KeyCode::Home => caret.home(),
        KeyCode::End => caret.end(query),
        KeyCode::Char(c) => caret.insert(query, c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tes_core::{ApiClient, Attachment, PLACEHOLDER_TEXT};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(ApiClient::new("http://127.0.0.1:9"), tx, "td-1".to_string());
        (app, rx)
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[test]
    fn test_submit_key_detection() {
        assert!(is_submit_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!is_submit_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT)));
        assert!(!is_submit_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)));
        assert!(!is_submit_key(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)));
    }

    #[tokio::test]
    async fn test_enter_submits_message() {
        let (mut app, _rx) = test_app();
        type_text(&mut app, "hello").await;

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        let messages = app.session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].content, PLACEHOLDER_TEXT);
        assert_eq!(app.session.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_enter_matches_submit_action() {
        let (mut by_key, _rx1) = test_app();
        let (mut by_action, _rx2) = test_app();
        type_text(&mut by_key, "same").await;
        type_text(&mut by_action, "same").await;

        handle_event(&mut by_key, key(KeyCode::Enter)).await.unwrap();
        assert!(by_action.submit());

        assert_eq!(by_key.session.messages(), by_action.session.messages());
        assert_eq!(by_key.session.in_flight(), by_action.session.in_flight());
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let (mut app, _rx) = test_app();
        type_text(&mut app, "line one").await;

        let shift_enter = AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        handle_event(&mut app, shift_enter).await.unwrap();
        type_text(&mut app, "two").await;

        assert!(app.session.messages().is_empty());
        assert!(!app.session.is_awaiting());
        assert_eq!(app.session.draft().query, "line one\ntwo");
    }

    #[tokio::test]
    async fn test_enter_on_blank_draft_does_nothing() {
        let (mut app, mut rx) = test_app();
        type_text(&mut app, "   ").await;

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert!(app.session.messages().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_enter_in_user_id_field_submits() {
        let (mut app, _rx) = test_app();
        type_text(&mut app, "question").await;

        handle_event(&mut app, key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.focus, Focus::UserId);
        type_text(&mut app, "-x").await;
        assert_eq!(app.session.draft().user_id, "td-1-x");

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_reply_event_resolves_placeholder() {
        let (mut app, _rx) = test_app();
        type_text(&mut app, "hello").await;
        let outgoing = app.session.submit().unwrap();

        handle_event(
            &mut app,
            AppEvent::Reply { id: outgoing.id, result: Ok("hi".to_string()) },
        )
        .await
        .unwrap();

        assert_eq!(app.session.messages()[1].content, "hi");
        assert!(app.session.draft().query.is_empty());
        assert_eq!(app.message_caret.position(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_reports_back_and_alert_blocks_input() {
        let (mut app, mut rx) = test_app();
        type_text(&mut app, "hello").await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        // Nothing listens on port 9, so the spawned send fails
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::Reply { result: Err(_), .. }));
        handle_event(&mut app, event).await.unwrap();

        assert_eq!(app.session.messages()[1].content, tes_core::ERROR_TEXT);
        assert!(app.session.alert().is_some());

        type_text(&mut app, "ignored").await;
        assert!(app.session.draft().query.is_empty());

        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(app.session.alert().is_none());
    }

    #[tokio::test]
    async fn test_file_field_selects_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "contents").unwrap();

        let (mut app, _rx) = test_app();
        handle_event(&mut app, key(KeyCode::BackTab)).await.unwrap();
        assert_eq!(app.focus, Focus::File);

        type_text(&mut app, path.to_str().unwrap()).await;
        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();
        assert_eq!(
            app.session.draft().file,
            Some(Attachment::new("notes.txt", b"contents".to_vec()))
        );

        handle_event(&mut app, key(KeyCode::Esc)).await.unwrap();
        assert!(app.session.draft().file.is_none());
        assert!(app.file_path_input.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_raises_alert() {
        let (mut app, _rx) = test_app();
        app.focus = Focus::File;
        type_text(&mut app, "/definitely/not/here.txt").await;

        handle_event(&mut app, key(KeyCode::Enter)).await.unwrap();

        assert!(app.session.draft().file.is_none());
        assert!(app.session.alert().unwrap().contains("Could not read"));
        assert!(app.session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let (mut app, _rx) = test_app();
        let ctrl_c = AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        handle_event(&mut app, ctrl_c).await.unwrap();
        assert!(app.should_quit);
    }
}
