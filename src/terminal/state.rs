use ratatui::widgets::ListState;

use crate::domain::records::Collections;
use crate::mailbox::state::Mailbox;
use crate::terminal::keymap::Keymap;

/// Where key presses go. Only `List` consults the keymap; the other two are
/// text inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Search,
    Composer,
}

pub struct AppState {
    pub mailbox: Mailbox,
    pub keymap: Keymap,
    pub list_state: ListState,

    pub search_focused: bool,
    pub detail_scroll: u16,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(data: Collections) -> Self {
        Self {
            mailbox: Mailbox::new(data),
            keymap: Keymap::new(),
            list_state: ListState::default(),
            search_focused: false,
            detail_scroll: 0,
            should_quit: false,
        }
    }

    pub fn focus(&self) -> Focus {
        if self.mailbox.composer().is_some() {
            Focus::Composer
        } else if self.search_focused {
            Focus::Search
        } else {
            Focus::List
        }
    }

    /// Point the list highlight at the cursor, if it is visible.
    pub fn sync_list_state(&mut self) {
        let idx = self.mailbox.cursor().and_then(|k| {
            self.mailbox
                .visible()
                .iter()
                .position(|i| &i.key == k)
        });
        if idx != self.list_state.selected() {
            self.detail_scroll = 0;
        }
        self.list_state.select(idx);
    }

    pub fn scroll_detail(&mut self, delta: i32) {
        if delta < 0 {
            self.detail_scroll = self.detail_scroll.saturating_sub((-delta) as u16);
        } else {
            self.detail_scroll = self.detail_scroll.saturating_add(delta as u16);
        }
    }
}
