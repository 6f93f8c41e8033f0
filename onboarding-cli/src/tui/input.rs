use crossterm::event::KeyCode;

/// Maximum characters accepted by the name and city inputs
pub const MAX_INPUT_CHARS: usize = 50;

/// Single-line text input with a cursor
///
/// The cursor is a char index, so multi-byte input (Cyrillic, emoji) edits
/// as the user sees it.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the value. Cursor is positioned at the end.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().take(MAX_INPUT_CHARS).collect();
        self.cursor = self.value.chars().count();
    }

    /// Apply an editing key. Returns true when the value changed.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        let len = self.value.chars().count();
        match key {
            KeyCode::Char(c) => {
                if len >= MAX_INPUT_CHARS {
                    return false;
                }
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            KeyCode::Delete => {
                if self.cursor >= len {
                    return false;
                }
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(len);
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = len;
                false
            }
            _ => false,
        }
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}
