use crate::error::Result;
use crate::poller::PollUpdate;
use crate::token::Credential;
use crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Poll(PollUpdate),
    /// Outcome of a token check started from the entry modal.
    TokenChecked(Result<Credential>),
}

impl From<PollUpdate> for AppEvent {
    fn from(update: PollUpdate) -> Self {
        AppEvent::Poll(update)
    }
}
