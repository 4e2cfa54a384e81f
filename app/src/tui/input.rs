//! Keyboard handling
//!
//! Maps raw key events to semantic actions depending on the current
//! input mode. The controller interprets the actions; nothing here
//! touches state.

use crate::state::InputMode;
use coindeck_core::SortKey;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic user intent, decoupled from key bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    MoveUp,
    MoveDown,
    SwitchFocus,
    Sort(SortKey),
    ToggleFavorite,
    OpenChart,
    CycleChartDays,
    StartSearch,
    StartAddHolding,
    RemoveSelectedHolding,
    Refresh,
    InputChar(char),
    InputBackspace,
    InputSubmit,
    InputCancel,
    None,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Action {
    match mode {
        InputMode::Normal => map_normal(key),
        InputMode::Search | InputMode::AddHolding => map_editing(key),
    }
}

fn map_normal(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Tab | KeyCode::Right => Action::NextTab,
        KeyCode::BackTab | KeyCode::Left => Action::PrevTab,
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Char('v') => Action::SwitchFocus,
        KeyCode::Enter => Action::OpenChart,
        KeyCode::Char('d') => Action::CycleChartDays,
        KeyCode::Char('f') => Action::ToggleFavorite,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('a') => Action::StartAddHolding,
        KeyCode::Char('x') => Action::RemoveSelectedHolding,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('n') => Action::Sort(SortKey::Name),
        KeyCode::Char('p') => Action::Sort(SortKey::Price),
        KeyCode::Char('m') => Action::Sort(SortKey::MarketCap),
        KeyCode::Char('1') => Action::Sort(SortKey::Change1h),
        KeyCode::Char('2') => Action::Sort(SortKey::Change24h),
        KeyCode::Char('7') => Action::Sort(SortKey::Change7d),
        _ => Action::None,
    }
}

fn map_editing(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::Quit;
    }
    match key.code {
        KeyCode::Esc => Action::InputCancel,
        KeyCode::Enter => Action::InputSubmit,
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Char(c) => Action::InputChar(c),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn normal_mode_sort_keys() {
        assert_eq!(
            map_key(InputMode::Normal, key(KeyCode::Char('p'))),
            Action::Sort(SortKey::Price)
        );
        assert_eq!(
            map_key(InputMode::Normal, key(KeyCode::Char('2'))),
            Action::Sort(SortKey::Change24h)
        );
    }

    #[test]
    fn editing_mode_takes_characters_literally() {
        // 'q' quits in normal mode but types into the query while editing
        assert_eq!(map_key(InputMode::Normal, key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(
            map_key(InputMode::Search, key(KeyCode::Char('q'))),
            Action::InputChar('q')
        );
        assert_eq!(
            map_key(InputMode::AddHolding, key(KeyCode::Enter)),
            Action::InputSubmit
        );
    }

    #[test]
    fn ctrl_c_always_quits() {
        let ev = KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        };
        assert_eq!(map_key(InputMode::Search, ev), Action::Quit);
    }
}
