
use std::num::NonZeroUsize;
use std::sync::LazyLock;

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

/// Default chunk length, in characters
pub const DEFAULT_MAX_CHUNK_CHARS: NonZeroUsize = match NonZeroUsize::new(22_000) {
    Some(n) => n,
    None => unreachable!(),
};

// Anything that is not whitespace, a word character or in the Arabic block.
static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[^\\w\\s\u{0600}-\u{06FF}]+").expect("noise pattern is a valid regex")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\\s+").expect("whitespace pattern is a valid regex"));

/// Configuration for document chunking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub max_chunk_chars: NonZeroUsize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

/// Strip noise characters and collapse whitespace.
///
/// Word characters, whitespace and Arabic script survive. Each run of other
/// characters becomes a single space, then all whitespace runs (newlines
/// included) collapse to one space and the ends are trimmed.
#[inline]
pub fn normalize_text(raw: &str) -> String {
    let cleaned = NOISE.replace_all(raw, " ");
    let collapsed = WHITESPACE.replace_all(&cleaned, " ");
    collapsed.trim().to_string()
}

/// Split `text` into consecutive slices of at most `max_len` characters.
///
/// Boundaries are purely positional and may cut through a word. Joining the
/// slices back together reproduces `text` exactly.
#[inline]
pub fn chunk_text(text: &str, max_len: NonZeroUsize) -> TextChunks<'_> {
    TextChunks {
        remaining: text,
        max_len,
    }
}

/// Lazy iterator returned by [`chunk_text`]. Clone it to restart.
#[derive(Debug, Clone)]
pub struct TextChunks<'a> {
    remaining: &'a str,
    max_len: NonZeroUsize,
}

impl<'a> Iterator for TextChunks<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let split_at = self
            .remaining
            .char_indices()
            .nth(self.max_len.get())
            .map_or(self.remaining.len(), |(idx, _)| idx);

        let (chunk, rest) = self.remaining.split_at(split_at);
        self.remaining = rest;
        Some(chunk)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining.is_empty() {
            return (0, Some(0));
        }
        // One char is at least one byte and at most four.
        let max = self.max_len.get();
        let lower = self.remaining.len().div_ceil(4).div_ceil(max);
        let upper = self.remaining.len().div_ceil(max);
        (lower.max(1), Some(upper))
    }
}

impl std::iter::FusedIterator for TextChunks<'_> {}

/// Normalize `raw` and return its chunks as owned strings
#[inline]
pub fn prepare_chunks(raw: &str, config: &ChunkingConfig) -> Vec<String> {
    let normalized = normalize_text(raw);
    chunk_text(&normalized, config.max_chunk_chars)
        .map(str::to_string)
        .collect()
}
