//! Controlled text input for search filters.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A one-line search input.
///
/// The input only holds its text and whether it is capturing keystrokes.
/// Every edit is forwarded to the caller's callback; there is no validation
/// or debouncing.
#[derive(Debug, Clone, Default)]
pub struct FilterInput {
    value: String,
    active: bool,
    placeholder: &'static str,
}

impl FilterInput {
    pub fn new(placeholder: &'static str) -> Self {
        Self {
            value: String::new(),
            active: false,
            placeholder,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn placeholder(&self) -> &'static str {
        if self.placeholder.is_empty() {
            "Filter..."
        } else {
            self.placeholder
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start capturing keystrokes.
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Stop capturing keystrokes, keeping the text.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Replace the text, notifying `on_change`.
    pub fn set(&mut self, value: &str, mut on_change: impl FnMut(&str)) {
        self.value = value.to_string();
        on_change(&self.value);
    }

    /// Clear the text and stop capturing, notifying `on_change`.
    pub fn clear(&mut self, on_change: impl FnMut(&str)) {
        self.active = false;
        self.set("", on_change);
    }

    /// Apply a key event while capturing.
    ///
    /// Returns false if the key was not consumed.
    pub fn handle_key(&mut self, key: KeyEvent, mut on_change: impl FnMut(&str)) -> bool {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.stop(),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear(on_change);
            }
            KeyCode::Backspace => {
                self.value.pop();
                on_change(&self.value);
                if self.value.is_empty() {
                    self.active = false;
                }
            }
            KeyCode::Char(c) => {
                self.value.push(c);
                on_change(&self.value);
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn every_keystroke_is_forwarded() {
        let mut input = FilterInput::new("Search property...");
        input.start();

        let mut seen = Vec::new();
        for c in "hr".chars() {
            input.handle_key(key(KeyCode::Char(c)), |v| seen.push(v.to_string()));
        }
        input.handle_key(key(KeyCode::Backspace), |v| seen.push(v.to_string()));

        assert_eq!(seen, vec!["h", "hr", "h"]);
        assert_eq!(input.value(), "h");
        assert!(input.is_active());
    }

    #[test]
    fn backspace_to_empty_leaves_input_mode() {
        let mut input = FilterInput::default();
        input.start();
        input.handle_key(key(KeyCode::Char('x')), |_| {});
        input.handle_key(key(KeyCode::Backspace), |_| {});
        assert!(!input.is_active());
        assert_eq!(input.value(), "");
    }

    #[test]
    fn escape_keeps_text() {
        let mut input = FilterInput::default();
        input.start();
        input.handle_key(key(KeyCode::Char('m')), |_| {});
        input.handle_key(key(KeyCode::Esc), |_| {});
        assert!(!input.is_active());
        assert_eq!(input.value(), "m");
    }

    #[test]
    fn ctrl_c_clears() {
        let mut input = FilterInput::default();
        input.start();
        input.handle_key(key(KeyCode::Char('m')), |_| {});

        let mut last = None;
        input.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), |v| {
            last = Some(v.to_string())
        });
        assert_eq!(last.as_deref(), Some(""));
        assert!(!input.is_active());
    }

    #[test]
    fn placeholder_falls_back() {
        assert_eq!(FilterInput::default().placeholder(), "Filter...");
        assert_eq!(FilterInput::new("Search...").placeholder(), "Search...");
    }

    #[test]
    fn unhandled_keys_are_not_consumed() {
        let mut input = FilterInput::default();
        assert!(!input.handle_key(key(KeyCode::F(2)), |_| {}));
    }
}
