use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::mailbox::effect::Effect;
use crate::terminal::keymap::{Command, normalize_key};
use crate::terminal::state::{AppState, Focus};

/// Route a key press and return the effects it produced.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> Vec<Effect> {
    if key.kind != KeyEventKind::Press {
        return vec![];
    }
    match state.focus() {
        Focus::Composer => handle_composer_keys(key, state),
        Focus::Search => {
            handle_search_keys(key, state);
            vec![]
        }
        Focus::List => match state.keymap.lookup(&key) {
            Some(cmd) => run_command(cmd, state),
            None => vec![],
        },
    }
}

pub fn run_command(cmd: Command, state: &mut AppState) -> Vec<Effect> {
    let mb = &mut state.mailbox;
    match cmd {
        Command::Quit => {
            state.should_quit = true;
            vec![]
        }
        Command::CursorDown => mb.move_cursor(1),
        Command::CursorUp => mb.move_cursor(-1),
        Command::Open => match mb.selected_key().cloned() {
            Some(key) => mb.select(&key),
            None => mb.move_cursor(1),
        },
        Command::Delete => mb.delete_batch(),
        Command::Compose => {
            mb.compose_blank();
            vec![]
        }
        Command::Reply => {
            mb.reply();
            vec![]
        }
        Command::SelectAll => {
            mb.check_all_visible();
            vec![]
        }
        Command::ToggleCheck => {
            mb.toggle_checked_selected();
            vec![]
        }
        Command::MarkRead => mb.mark_read_batch(),
        Command::MarkUnread => mb.mark_unread_batch(),
        Command::Restore => mb.restore_batch(),
        Command::Reload => vec![Effect::Reload],
        Command::NextFolder => {
            let next = mb.folder().next();
            mb.set_folder(next);
            vec![]
        }
        Command::PrevFolder => {
            let prev = mb.folder().prev();
            mb.set_folder(prev);
            vec![]
        }
        Command::GoFolder(f) => {
            mb.set_folder(f);
            vec![]
        }
        Command::FocusSearch => {
            state.search_focused = true;
            vec![]
        }
        Command::Escape => {
            mb.dismiss_notice();
            mb.clear_selection();
            vec![]
        }
        Command::ScrollDetail(delta) => {
            state.scroll_detail(delta as i32);
            vec![]
        }
    }
}

fn handle_search_keys(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Enter => state.search_focused = false,
        KeyCode::Esc => {
            state.search_focused = false;
            state.mailbox.set_query("");
        }
        KeyCode::Backspace => {
            let mut q = state.mailbox.query().to_string();
            q.pop();
            state.mailbox.set_query(q);
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let q = format!("{}{c}", state.mailbox.query());
            state.mailbox.set_query(q);
        }
        _ => {}
    }
}

fn handle_composer_keys(key: KeyEvent, state: &mut AppState) -> Vec<Effect> {
    let mb = &mut state.mailbox;
    match normalize_key(&key).as_deref() {
        Some("mod+s") => return mb.save_draft(),
        Some("mod+e") => return mb.send(),
        Some("esc") => {
            mb.close_composer();
            return vec![];
        }
        _ => {}
    }

    let Some(c) = mb.composer_mut() else {
        return vec![];
    };
    if c.sending {
        return vec![];
    }
    match key.code {
        KeyCode::Tab => c.field = c.field.next(),
        KeyCode::BackTab => c.field = c.field.prev(),
        KeyCode::Enter => c.enter(),
        KeyCode::Backspace => c.backspace(),
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER) =>
        {
            c.push_char(ch)
        }
        _ => {}
    }
    vec![]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::ItemKey;
    use crate::domain::records::{Collections, DraftRecord, InboundMessage};
    use crate::mailbox::composer::ComposerField;
    use crate::mailbox::folder::Folder;
    use crate::mailbox::state::View;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app() -> AppState {
        let m = |id: &str, at: i64, read: bool| InboundMessage {
            id: id.into(),
            sender_name: format!("Sender {id}"),
            sender_email: format!("{id}@example.org"),
            subject: format!("Subject {id}"),
            body: "body".into(),
            received_at: at,
            read,
            replied: false,
            deleted_at: None,
            attachments: vec![],
        };
        AppState::new(Collections {
            messages: vec![m("a", 1, true), m("b", 2, false)],
            ..Default::default()
        })
    }

    fn type_text(state: &mut AppState, text: &str) {
        for ch in text.chars() {
            handle_key(press(KeyCode::Char(ch)), state);
        }
    }

    #[test]
    fn arrow_down_from_nothing_selects_first_and_marks_read() {
        let mut state = app();
        let effects = handle_key(press(KeyCode::Down), &mut state);
        assert_eq!(effects, vec![Effect::MarkRead("b".into())]);
        assert_eq!(state.mailbox.selected_key(), Some(&ItemKey::message("b")));
    }

    #[test]
    fn c_opens_blank_composer_and_keys_become_text() {
        let mut state = app();
        handle_key(press(KeyCode::Char('c')), &mut state);
        assert_eq!(state.focus(), Focus::Composer);

        // 'q', 'r' and 'c' are text now, not commands.
        type_text(&mut state, "qrc@example.org");
        handle_key(press(KeyCode::Tab), &mut state);
        type_text(&mut state, "Hi");
        let c = state.mailbox.composer().unwrap();
        assert_eq!(c.recipient, "qrc@example.org");
        assert_eq!(c.subject, "Hi");
        assert_eq!(c.field, ComposerField::Subject);
        assert!(!state.should_quit);

        let effects = handle_key(ctrl('e'), &mut state);
        assert!(matches!(effects.as_slice(), [Effect::Send(_)]));

        // Fields are frozen while the send is outstanding.
        type_text(&mut state, "zzz");
        assert_eq!(state.mailbox.composer().unwrap().subject, "Hi");
    }

    #[test]
    fn composer_save_and_escape() {
        let mut state = app();
        handle_key(press(KeyCode::Char('c')), &mut state);
        let effects = handle_key(ctrl('s'), &mut state);
        assert!(matches!(effects.as_slice(), [Effect::SaveDraft(_)]));
        assert_eq!(state.focus(), Focus::Composer);

        handle_key(press(KeyCode::Esc), &mut state);
        assert_eq!(state.mailbox.view(), &View::NoSelection);
    }

    #[test]
    fn reply_shortcut_needs_a_selected_message() {
        let mut state = app();
        handle_key(press(KeyCode::Char('r')), &mut state);
        assert_eq!(state.focus(), Focus::List);

        handle_key(press(KeyCode::Down), &mut state);
        handle_key(press(KeyCode::Char('r')), &mut state);
        assert_eq!(state.mailbox.composer().unwrap().subject, "Re: Subject b");
    }

    #[test]
    fn search_focus_swallows_shortcuts() {
        let mut state = app();
        handle_key(press(KeyCode::Char('/')), &mut state);
        type_text(&mut state, "subject A");
        assert_eq!(state.mailbox.query(), "subject A");
        assert_eq!(state.mailbox.visible().len(), 1);
        assert!(state.mailbox.composer().is_none());

        handle_key(press(KeyCode::Enter), &mut state);
        assert_eq!(state.focus(), Focus::List);
        assert_eq!(state.mailbox.query(), "subject A");

        handle_key(press(KeyCode::Char('/')), &mut state);
        handle_key(press(KeyCode::Esc), &mut state);
        assert_eq!(state.mailbox.query(), "");
    }

    #[test]
    fn select_all_then_delete_moves_everything_to_trash() {
        let mut state = app();
        handle_key(ctrl('a'), &mut state);
        assert_eq!(state.mailbox.checked().len(), 2);
        let effects = handle_key(press(KeyCode::Delete), &mut state);
        assert_eq!(
            effects,
            vec![
                Effect::MoveToTrash(ItemKey::message("a")),
                Effect::MoveToTrash(ItemKey::message("b")),
            ]
        );
        assert!(state.mailbox.checked().is_empty());
    }

    #[test]
    fn folder_keys_and_quit() {
        let mut state = app();
        handle_key(press(KeyCode::Tab), &mut state);
        assert_eq!(state.mailbox.folder(), Folder::Sent);
        handle_key(press(KeyCode::Char('4')), &mut state);
        assert_eq!(state.mailbox.folder(), Folder::Trash);
        handle_key(press(KeyCode::Char('q')), &mut state);
        assert!(state.should_quit);
    }

    fn drafts_app() -> AppState {
        let d = |id: &str, at: i64| DraftRecord {
            id: id.into(),
            recipient: format!("{id}@example.org"),
            subject: format!("Draft {id}"),
            body: String::new(),
            updated_at: at,
            deleted_at: None,
        };
        let mut state = AppState::new(Collections {
            drafts: vec![d("d1", 2), d("d2", 1)],
            ..Default::default()
        });
        state.mailbox.set_folder(Folder::Drafts);
        state
    }

    fn open_draft_id(state: &AppState) -> Option<String> {
        state.mailbox.composer().and_then(|c| c.draft_id.clone())
    }

    #[test]
    fn arrows_reach_every_draft() {
        let mut state = drafts_app();
        let mut opened = vec![];
        for _ in 0..2 {
            handle_key(press(KeyCode::Down), &mut state);
            opened.push(open_draft_id(&state));
            handle_key(press(KeyCode::Esc), &mut state);
        }
        assert_eq!(opened, vec![Some("d1".to_string()), Some("d2".to_string())]);

        // Stops at the end.
        handle_key(press(KeyCode::Down), &mut state);
        assert_eq!(open_draft_id(&state), None);

        handle_key(press(KeyCode::Up), &mut state);
        assert_eq!(open_draft_id(&state).as_deref(), Some("d1"));
    }

    #[test]
    fn single_draft_can_be_checked_and_trashed() {
        let mut state = drafts_app();
        handle_key(press(KeyCode::Down), &mut state);
        handle_key(press(KeyCode::Esc), &mut state);
        handle_key(press(KeyCode::Down), &mut state);
        handle_key(press(KeyCode::Esc), &mut state);

        handle_key(press(KeyCode::Char('x')), &mut state);
        assert_eq!(
            state.mailbox.checked().iter().collect::<Vec<_>>(),
            vec![&ItemKey::draft("d2")]
        );
        let effects = handle_key(press(KeyCode::Delete), &mut state);
        assert_eq!(effects, vec![Effect::MoveToTrash(ItemKey::draft("d2"))]);

        // Nothing checked: delete falls back to the draft under the cursor.
        let mut state = drafts_app();
        handle_key(press(KeyCode::Down), &mut state);
        handle_key(press(KeyCode::Esc), &mut state);
        let effects = handle_key(press(KeyCode::Delete), &mut state);
        assert_eq!(effects, vec![Effect::MoveToTrash(ItemKey::draft("d1"))]);
    }
}
