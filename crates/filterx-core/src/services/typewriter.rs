/// Reveals a fully received reply a few characters at a time.
///
/// Each `tick` yields a strictly longer prefix ending on a char boundary,
/// until the whole text is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typewriter {
    text: String,
    chars_per_tick: usize,
    visible_len: usize,
}

impl Typewriter {
    pub fn new(text: impl Into<String>, chars_per_tick: usize) -> Self {
        Self {
            text: text.into(),
            chars_per_tick: chars_per_tick.max(1),
            visible_len: 0,
        }
    }

    /// Advance and return the new visible prefix, or `None` once finished
    pub fn tick(&mut self) -> Option<&str> {
        if self.is_finished() {
            return None;
        }

        let rest = &self.text[self.visible_len..];
        let advance = rest
            .char_indices()
            .nth(self.chars_per_tick)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());

        self.visible_len += advance;
        Some(self.visible())
    }

    pub fn visible(&self) -> &str {
        &self.text[..self.visible_len]
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_finished(&self) -> bool {
        self.visible_len >= self.text.len()
    }

    pub fn restart(&mut self) {
        self.visible_len = 0;
    }

    /// Skip to the end
    pub fn finish(&mut self) {
        self.visible_len = self.text.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_grow_until_full_text() {
        let mut tw = Typewriter::new("Hello there", 3);
        let mut frames = Vec::new();
        while let Some(frame) = tw.tick() {
            frames.push(frame.to_string());
        }

        assert_eq!(frames, vec!["Hel", "Hello ", "Hello the", "Hello there"]);
        for pair in frames.windows(2) {
            assert!(pair[1].len() > pair[0].len());
            assert!(pair[1].starts_with(&pair[0]));
        }
        assert!(tw.is_finished());
        assert!(tw.tick().is_none());
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "héllo wörld 👋";
        let mut tw = Typewriter::new(text, 2);
        while let Some(frame) = tw.tick() {
            assert!(text.starts_with(frame));
        }
        assert_eq!(tw.visible(), "héllo wörld 👋");
    }

    #[test]
    fn test_restart_replays_and_finish_skips() {
        let mut tw = Typewriter::new("abcdef", 2);
        tw.tick();
        tw.tick();
        assert_eq!(tw.visible(), "abcd");

        tw.restart();
        assert_eq!(tw.visible(), "");
        assert_eq!(tw.tick(), Some("ab"));

        tw.finish();
        assert!(tw.is_finished());
        assert_eq!(tw.visible(), "abcdef");
    }

    #[test]
    fn test_empty_text_is_finished() {
        let mut tw = Typewriter::new("", 3);
        assert!(tw.is_finished());
        assert!(tw.tick().is_none());
    }

    #[test]
    fn test_zero_chars_per_tick_still_progresses() {
        let mut tw = Typewriter::new("ab", 0);
        assert_eq!(tw.tick(), Some("a"));
        assert_eq!(tw.tick(), Some("ab"));
        assert!(tw.tick().is_none());
    }
}
