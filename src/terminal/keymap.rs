use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::mailbox::folder::Folder;

/// Mailbox-level actions reachable from the list (not from text inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    CursorDown,
    CursorUp,
    Open,
    Delete,
    Compose,
    Reply,
    SelectAll,
    ToggleCheck,
    MarkRead,
    MarkUnread,
    Restore,
    Reload,
    NextFolder,
    PrevFolder,
    GoFolder(Folder),
    FocusSearch,
    Escape,
    ScrollDetail(i16),
}

/// Normalize a key press into the string the dispatch table is keyed by,
/// e.g. `"down"`, `"r"`, `"R"`, `"mod+a"`, `"shift+tab"`.
///
/// Control and Super (Command) both map to `mod`. Shift is folded into the
/// character for printable keys.
pub fn normalize_key(key: &KeyEvent) -> Option<String> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "up".into(),
        KeyCode::Down => "down".into(),
        KeyCode::Left => "left".into(),
        KeyCode::Right => "right".into(),
        KeyCode::Enter => "enter".into(),
        KeyCode::Esc => "esc".into(),
        KeyCode::Tab => "tab".into(),
        KeyCode::BackTab => "shift+tab".into(),
        KeyCode::Backspace => "backspace".into(),
        KeyCode::Delete => "delete".into(),
        KeyCode::Home => "home".into(),
        KeyCode::End => "end".into(),
        KeyCode::PageUp => "pageup".into(),
        KeyCode::PageDown => "pagedown".into(),
        _ => return None,
    };

    let mut prefix = String::new();
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER)
    {
        prefix.push_str("mod+");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        prefix.push_str("alt+");
    }

    // Ctrl+letter arrives lowercase on most terminals; keep it that way.
    let name = if prefix.is_empty() {
        name
    } else {
        name.to_lowercase()
    };
    Some(prefix + &name)
}

pub struct Keymap {
    table: HashMap<String, Command>,
}

impl Keymap {
    pub fn new() -> Self {
        let bindings: &[(&str, Command)] = &[
            ("q", Command::Quit),
            ("down", Command::CursorDown),
            ("j", Command::CursorDown),
            ("up", Command::CursorUp),
            ("k", Command::CursorUp),
            ("enter", Command::Open),
            ("delete", Command::Delete),
            ("backspace", Command::Delete),
            ("c", Command::Compose),
            ("r", Command::Reply),
            ("mod+a", Command::SelectAll),
            ("space", Command::ToggleCheck),
            ("x", Command::ToggleCheck),
            ("m", Command::MarkRead),
            ("u", Command::MarkUnread),
            ("z", Command::Restore),
            ("g", Command::Reload),
            ("tab", Command::NextFolder),
            ("shift+tab", Command::PrevFolder),
            ("1", Command::GoFolder(Folder::Inbox)),
            ("2", Command::GoFolder(Folder::Sent)),
            ("3", Command::GoFolder(Folder::Drafts)),
            ("4", Command::GoFolder(Folder::Trash)),
            ("/", Command::FocusSearch),
            ("esc", Command::Escape),
            ("pagedown", Command::ScrollDetail(10)),
            ("pageup", Command::ScrollDetail(-10)),
        ];
        Self {
            table: bindings
                .iter()
                .map(|(k, c)| (k.to_string(), *c))
                .collect(),
        }
    }

    pub fn lookup(&self, key: &KeyEvent) -> Option<Command> {
        let name = normalize_key(key)?;
        self.table.get(&name).copied()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn normalizes_named_and_modified_keys() {
        assert_eq!(normalize_key(&key(KeyCode::Down, KeyModifiers::NONE)).as_deref(), Some("down"));
        assert_eq!(
            normalize_key(&key(KeyCode::Char('a'), KeyModifiers::CONTROL)).as_deref(),
            Some("mod+a")
        );
        assert_eq!(
            normalize_key(&key(KeyCode::Char('A'), KeyModifiers::SUPER | KeyModifiers::SHIFT))
                .as_deref(),
            Some("mod+a")
        );
        assert_eq!(
            normalize_key(&key(KeyCode::Char('R'), KeyModifiers::SHIFT)).as_deref(),
            Some("R")
        );
        assert_eq!(normalize_key(&key(KeyCode::BackTab, KeyModifiers::SHIFT)).as_deref(), Some("shift+tab"));
        assert_eq!(normalize_key(&key(KeyCode::F(5), KeyModifiers::NONE)), None);
    }

    #[test]
    fn release_events_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(Keymap::new().lookup(&release), None);
    }

    #[test]
    fn table_covers_mailbox_shortcuts() {
        let km = Keymap::new();
        let look = |code, m| km.lookup(&key(code, m));
        assert_eq!(look(KeyCode::Down, KeyModifiers::NONE), Some(Command::CursorDown));
        assert_eq!(look(KeyCode::Up, KeyModifiers::NONE), Some(Command::CursorUp));
        assert_eq!(look(KeyCode::Delete, KeyModifiers::NONE), Some(Command::Delete));
        assert_eq!(look(KeyCode::Backspace, KeyModifiers::NONE), Some(Command::Delete));
        assert_eq!(look(KeyCode::Char('c'), KeyModifiers::NONE), Some(Command::Compose));
        assert_eq!(look(KeyCode::Char('r'), KeyModifiers::NONE), Some(Command::Reply));
        assert_eq!(look(KeyCode::Char('a'), KeyModifiers::CONTROL), Some(Command::SelectAll));
        assert_eq!(look(KeyCode::Char('a'), KeyModifiers::NONE), None);
        assert_eq!(
            look(KeyCode::Char('4'), KeyModifiers::NONE),
            Some(Command::GoFolder(Folder::Trash))
        );
    }
}
