pub mod events;
pub mod keymap;
pub mod state;
pub mod ui;

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;

use crate::domain::records::Collections;
use crate::mailbox::effect::Effect;
use crate::terminal::events::handle_key;
use crate::terminal::state::AppState;
use crate::worker::Worker;

const TICK: Duration = Duration::from_millis(100);

/// Raw mode and the alternate screen for as long as this lives.
struct TerminalSession {
    terminal: DefaultTerminal,
}

impl TerminalSession {
    fn mount() -> Self {
        Self {
            terminal: ratatui::init(),
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        ratatui::restore();
    }
}

/// Run the mailbox until the user quits. Effects go to `worker`; the loop
/// only ever waits on input for one tick.
pub fn run_tui(worker: &Worker) -> Result<()> {
    let mut state = AppState::new(Collections::default());
    worker.submit(Effect::Reload)?;

    let mut session = TerminalSession::mount();
    loop {
        for completion in worker.drain() {
            let follow = state.mailbox.apply(completion);
            worker.submit_all(follow)?;
        }

        state.sync_list_state();
        session
            .terminal
            .draw(|f| ui::render(f, &mut state))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                let effects = handle_key(key, &mut state);
                worker.submit_all(effects)?;
            }
        }

        if state.should_quit {
            break;
        }
    }
    Ok(())
}
