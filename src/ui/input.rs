use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    NextTab,
    PrevTab,
    Refresh,
    ToggleAutoRefresh,
    CycleInterval,
    CycleTheme,
    TokenEntry,
    EmbedUrls,
    Help,
    ClosePopup,
    InputChar(char),
    InputBackspace,
    InputSubmit,
    InputClear,
    InputCancel,
    Quit,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Token,
}

pub fn map_key(key: KeyEvent, mode: InputMode) -> Action {
    if mode == InputMode::Token {
        return match key.code {
            KeyCode::Esc => Action::InputCancel,
            KeyCode::Enter => Action::InputSubmit,
            KeyCode::Backspace => Action::InputBackspace,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Action::InputClear
            }
            KeyCode::Char(c) => Action::InputChar(c),
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
        KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => Action::NextTab,
        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => Action::PrevTab,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('a') => Action::ToggleAutoRefresh,
        KeyCode::Char('i') => Action::CycleInterval,
        KeyCode::Char('t') => Action::CycleTheme,
        KeyCode::Char('T') => Action::TokenEntry,
        KeyCode::Char('e') => Action::EmbedUrls,
        KeyCode::Char('?') => Action::Help,
        KeyCode::Esc => Action::ClosePopup,
        _ => Action::None,
    }
}
