//! Incremental disclosure of freshly arrived assistant text.
//!
//! [`RevealSequence`] is a lazy, restartable sequence of increasing prefix
//! lengths. It owns no timer: whoever drives it decides when to pull the next
//! step, and dropping it is the cancellation.

/// Lazy sequence of increasing prefix end offsets (in bytes, on char
/// boundaries) over some content.
///
/// Each step discloses `chars_per_step` more characters. The final item is
/// always `content.len()`, and the sequence is finite for any finite input:
/// at most `ceil(chars / chars_per_step)` items (one item for empty content).
#[derive(Debug, Clone)]
pub struct RevealSequence {
    content: String,
    chars_per_step: usize,
    cursor: usize,
    finished: bool,
}

impl RevealSequence {
    pub fn new(content: impl Into<String>, chars_per_step: usize) -> Self {
        Self {
            content: content.into(),
            chars_per_step: chars_per_step.max(1),
            cursor: 0,
            finished: false,
        }
    }

    /// Rewind to an empty prefix.
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.finished = false;
    }

    /// The prefix disclosed so far.
    pub fn prefix(&self) -> &str {
        &self.content[..self.cursor]
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of steps a full reveal takes.
    pub fn total_steps(&self) -> usize {
        let chars = self.content.chars().count();
        chars.div_ceil(self.chars_per_step).max(1)
    }
}

impl Iterator for RevealSequence {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.finished {
            return None;
        }
        let rest = &self.content[self.cursor..];
        let advance = rest
            .char_indices()
            .nth(self.chars_per_step)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.cursor += advance;
        if self.cursor == self.content.len() {
            self.finished = true;
        }
        Some(self.cursor)
    }
}
