use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::difficulty::Difficulty;

/// Discrete requests the player can make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    TogglePause,
    /// space bar: start when idle, otherwise pause/resume
    StartOrPause,
    Reset,
    SetDifficulty(Difficulty),
    CycleDifficulty,
    Hit(usize),
    /// dismiss the results and start over
    PlayAgain,
    Quit,
}

pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Command::Quit),
        KeyCode::Char(' ') => Some(Command::StartOrPause),
        KeyCode::Char('s') => Some(Command::Start),
        KeyCode::Char('p') => Some(Command::TogglePause),
        KeyCode::Char('r') => Some(Command::Reset),
        KeyCode::Char('e') => Some(Command::SetDifficulty(Difficulty::Easy)),
        KeyCode::Char('m') => Some(Command::SetDifficulty(Difficulty::Medium)),
        KeyCode::Char('h') => Some(Command::SetDifficulty(Difficulty::Hard)),
        KeyCode::Char('d') => Some(Command::CycleDifficulty),
        KeyCode::Enter => Some(Command::PlayAgain),
        KeyCode::Char(c @ '1'..='9') => Some(Command::Hit(c as usize - '1' as usize)),
        _ => None,
    }
}

/// Left click inside one of `holes` hits that hole
pub fn command_for_mouse(mouse: MouseEvent, holes: &[Rect]) -> Option<Command> {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return None;
    }
    let pos = Position::new(mouse.column, mouse.row);
    holes
        .iter()
        .position(|area| area.contains(pos))
        .map(Command::Hit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(command_for_key(key(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(command_for_key(key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
    }

    #[test]
    fn test_lifecycle_keys() {
        assert_eq!(
            command_for_key(key(KeyCode::Char(' '))),
            Some(Command::StartOrPause)
        );
        assert_eq!(command_for_key(key(KeyCode::Char('s'))), Some(Command::Start));
        assert_eq!(
            command_for_key(key(KeyCode::Char('p'))),
            Some(Command::TogglePause)
        );
        assert_eq!(command_for_key(key(KeyCode::Char('r'))), Some(Command::Reset));
        assert_eq!(command_for_key(key(KeyCode::Enter)), Some(Command::PlayAgain));
    }

    #[test]
    fn test_difficulty_keys() {
        assert_eq!(
            command_for_key(key(KeyCode::Char('e'))),
            Some(Command::SetDifficulty(Difficulty::Easy))
        );
        assert_eq!(
            command_for_key(key(KeyCode::Char('h'))),
            Some(Command::SetDifficulty(Difficulty::Hard))
        );
        assert_eq!(
            command_for_key(key(KeyCode::Char('d'))),
            Some(Command::CycleDifficulty)
        );
    }

    #[test]
    fn test_digit_keys_hit_holes() {
        assert_eq!(command_for_key(key(KeyCode::Char('1'))), Some(Command::Hit(0)));
        assert_eq!(command_for_key(key(KeyCode::Char('9'))), Some(Command::Hit(8)));
        assert_eq!(command_for_key(key(KeyCode::Char('0'))), None);
        assert_eq!(command_for_key(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_click_inside_hole() {
        let holes = [Rect::new(0, 0, 10, 5), Rect::new(10, 0, 10, 5)];
        assert_eq!(
            command_for_mouse(click(MouseEventKind::Down(MouseButton::Left), 12, 2), &holes),
            Some(Command::Hit(1))
        );
        assert_eq!(
            command_for_mouse(click(MouseEventKind::Down(MouseButton::Left), 30, 2), &holes),
            None
        );
    }

    #[test]
    fn test_other_mouse_events_ignored() {
        let holes = [Rect::new(0, 0, 10, 5)];
        assert_eq!(
            command_for_mouse(click(MouseEventKind::Down(MouseButton::Right), 1, 1), &holes),
            None
        );
        assert_eq!(
            command_for_mouse(click(MouseEventKind::Moved, 1, 1), &holes),
            None
        );
    }
}
