use serde::{Deserialize, Serialize};

use crate::controller::{Action, GameView, Phase};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
}

impl Key {
    /// Parses a typed token such as `d`, `left` or `esc`. An empty token is Enter.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        let key = match token.to_ascii_lowercase().as_str() {
            "" | "enter" | "return" => Key::Enter,
            "space" | "spc" => Key::Space,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "esc" | "escape" => Key::Escape,
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    fn is_char(self, expected: char) -> bool {
        matches!(self, Key::Char(c) if c.eq_ignore_ascii_case(&expected))
    }
}

/// Maps keys to controller actions for the current game state. Keys that
/// make no sense in that state map to nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputBindings;

impl InputBindings {
    pub fn action_for(&self, key: Key, view: &GameView) -> Option<Action> {
        match view.phase {
            Phase::SettingsOpen | Phase::Paused => None,
            _ if key == Key::Escape => Some(Action::Restart),
            Phase::TimedOut => {
                let continues = key.is_char('d')
                    || matches!(key, Key::Right | Key::Space | Key::Enter);
                continues.then_some(Action::TimeoutContinue)
            }
            Phase::Playing => {
                let reveals = ['w', 'a', 's', 'd'].iter().any(|c| key.is_char(*c))
                    || matches!(
                        key,
                        Key::Up | Key::Down | Key::Left | Key::Right | Key::Space | Key::Enter
                    );
                reveals.then_some(Action::Reveal)
            }
            Phase::AnswerRevealed => {
                if key.is_char('d') || key == Key::Right {
                    Some(Action::MarkCorrect)
                } else if key.is_char('a') || key == Key::Left {
                    Some(Action::MarkIncorrect)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::GameView;

    fn view(phase: Phase) -> GameView {
        GameView {
            phase,
            ..GameView::placeholder()
        }
    }

    #[test]
    fn parses_tokens() {
        assert_eq!(Key::from_token(""), Some(Key::Enter));
        assert_eq!(Key::from_token(" "), Some(Key::Enter));
        assert_eq!(Key::from_token("LEFT"), Some(Key::Left));
        assert_eq!(Key::from_token("esc"), Some(Key::Escape));
        assert_eq!(Key::from_token("D"), Some(Key::Char('D')));
        assert_eq!(Key::from_token("review"), None);
    }

    #[test]
    fn escape_restarts_from_any_game_state() {
        let bindings = InputBindings;
        for phase in [Phase::Playing, Phase::AnswerRevealed, Phase::TimedOut] {
            assert_eq!(bindings.action_for(Key::Escape, &view(phase)), Some(Action::Restart));
        }
    }

    #[test]
    fn reveal_keys_before_answer() {
        let bindings = InputBindings;
        let playing = view(Phase::Playing);
        for key in [
            Key::Char('w'),
            Key::Char('A'),
            Key::Char('s'),
            Key::Char('d'),
            Key::Up,
            Key::Down,
            Key::Left,
            Key::Right,
            Key::Space,
            Key::Enter,
        ] {
            assert_eq!(bindings.action_for(key, &playing), Some(Action::Reveal));
        }
        assert_eq!(bindings.action_for(Key::Char('x'), &playing), None);
    }

    #[test]
    fn grading_keys_after_reveal() {
        let bindings = InputBindings;
        let revealed = view(Phase::AnswerRevealed);
        assert_eq!(bindings.action_for(Key::Char('D'), &revealed), Some(Action::MarkCorrect));
        assert_eq!(bindings.action_for(Key::Right, &revealed), Some(Action::MarkCorrect));
        assert_eq!(bindings.action_for(Key::Char('a'), &revealed), Some(Action::MarkIncorrect));
        assert_eq!(bindings.action_for(Key::Left, &revealed), Some(Action::MarkIncorrect));
        assert_eq!(bindings.action_for(Key::Space, &revealed), None);
    }

    #[test]
    fn timed_out_only_continues() {
        let bindings = InputBindings;
        let timed_out = view(Phase::TimedOut);
        for key in [Key::Char('d'), Key::Right, Key::Space, Key::Enter] {
            assert_eq!(bindings.action_for(key, &timed_out), Some(Action::TimeoutContinue));
        }
        assert_eq!(bindings.action_for(Key::Char('a'), &timed_out), None);
        assert_eq!(bindings.action_for(Key::Left, &timed_out), None);
    }

    #[test]
    fn disabled_states_ignore_keys() {
        let bindings = InputBindings;
        for phase in [Phase::SettingsOpen, Phase::Paused] {
            assert_eq!(bindings.action_for(Key::Escape, &view(phase)), None);
            assert_eq!(bindings.action_for(Key::Enter, &view(phase)), None);
            assert_eq!(bindings.action_for(Key::Char('d'), &view(phase)), None);
        }
    }
}
