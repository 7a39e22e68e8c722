//! Recursive character splitting.
//!
//! Text is split on the coarsest separator it contains (paragraph break,
//! then line break, then space, then between characters). Pieces still longer
//! than `chunk_size` are split again with the finer separators. Pieces are
//! then merged back into chunks of at most `chunk_size` characters, each new
//! chunk carrying the trailing pieces of the previous one, up to
//! `chunk_overlap` characters.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::ChunkerConfig;
use crate::error::Result;

/// Separators from coarsest to finest. The empty separator splits characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits text into overlapping chunks.
#[derive(Debug, Clone, Default)]
pub struct TextSplitter {
    config: ChunkerConfig,
}

impl TextSplitter {
    /// Create a splitter, rejecting an overlap that is not smaller than the size.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The splitter's configuration.
    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chunks = self.split_with(text, &SEPARATORS);
        debug!(
            "Split {} characters into {} chunks",
            char_len(text),
            chunks.len()
        );
        chunks
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, finer) = pick_separator(text, separators);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator).map(str::to_string).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) < self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(std::mem::take(&mut pending), separator));
            }
            if finer.is_empty() {
                let piece = piece.trim();
                if !piece.is_empty() {
                    chunks.push(piece.to_string());
                }
            } else {
                chunks.extend(self.split_with(&piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(pending, separator));
        }

        chunks
    }

    /// Join small pieces into chunks no longer than `chunk_size`.
    fn merge(&self, pieces: Vec<String>, separator: &str) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let sep_len = char_len(separator);

        let mut chunks = Vec::new();
        let mut current: VecDeque<String> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(&piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + len + joiner > size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                // Keep only as much trailing text as the overlap allows.
                loop {
                    let joiner = if current.is_empty() { 0 } else { sep_len };
                    let too_long = total > 0 && total + len + joiner > size;
                    if total <= overlap && !too_long {
                        break;
                    }
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    let front_joiner = if current.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(char_len(&front) + front_joiner);
                }
            }

            let joiner = if current.is_empty() { 0 } else { sep_len };
            total += len + joiner;
            current.push_back(piece);
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator) {
            return (separator, &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<String>, separator: &str) {
    let joined = pieces
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
