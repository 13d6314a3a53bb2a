use serde::{Deserialize, Serialize};

/// Staggered per-character animation delays.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationTiming {
    /// Delay before the first character starts, in milliseconds.
    pub initial_delay_ms: u64,
    /// Extra delay added per character, in milliseconds.
    pub step_ms: u64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            initial_delay_ms: 3000,
            step_ms: 15,
        }
    }
}

impl AnimationTiming {
    pub fn delay_for(&self, index: usize) -> u64 {
        self.initial_delay_ms + self.step_ms * index as u64
    }
}

/// One character of animated text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharSpan {
    /// HTML-safe markup for the character; spaces become `&nbsp;`.
    pub glyph: String,
    pub delay_ms: u64,
}

fn escape(ch: char) -> String {
    match ch {
        ' ' => "&nbsp;".to_string(),
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' => "&quot;".to_string(),
        '\'' => "&#39;".to_string(),
        other => other.to_string(),
    }
}

pub fn split_chars(text: &str, timing: &AnimationTiming) -> Vec<CharSpan> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| CharSpan {
            glyph: escape(ch),
            delay_ms: timing.delay_for(i),
        })
        .collect()
}

pub fn render_spans(spans: &[CharSpan]) -> String {
    spans
        .iter()
        .map(|span| {
            format!(
                r#"<span class="char" style="animation-delay: {}ms">{}</span>"#,
                span.delay_ms, span.glyph
            )
        })
        .collect()
}

/// Splits `text` and renders the replacement markup in one step.
pub fn animate_text(text: &str, timing: &AnimationTiming) -> String {
    render_spans(&split_chars(text, timing))
}
