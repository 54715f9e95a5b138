//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: sliding window of `chunk_size` characters that
//!   advances by `chunk_size - chunk_overlap`
//! - [`RecursiveChunker`]: prefers paragraph, sentence, then word boundaries
//!
//! All sizes are counted in characters, so multi-byte text (`H₂`, `O₂`) is
//! never cut inside a UTF-8 sequence.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 600;

/// Default number of characters shared by adjacent chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the knowledge base.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks identified as `{document_index}_{chunk_index}`.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document, document_index: usize) -> Vec<Chunk>;
}

fn validate(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_overlap >= chunk_size {
        return Err(RagError::Config(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

fn build_chunks<I>(document: &Document, document_index: usize, texts: I) -> Vec<Chunk>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), chunk_index.to_string());
            Chunk {
                id: format!("{document_index}_{chunk_index}"),
                text: text.into(),
                embedding: Vec::new(),
                metadata,
                document_id: document.id.clone(),
            }
        })
        .collect()
}

/// Byte offset of the `n`th character of `s`, or `s.len()` if it has fewer.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` characters of `s`.
fn tail_chars(s: &str, n: usize) -> &str {
    let skip = char_len(s).saturating_sub(n);
    &s[byte_offset(s, skip)..]
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Each chunk starts `chunk_size - chunk_overlap` characters after the previous
/// one, so neighbours share exactly `chunk_overlap` characters. Only the final
/// chunk may be shorter than `chunk_size`.
///
/// # Example
///
/// ```rust
/// use chemlab_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(4, 1).unwrap();
/// let spans: Vec<&str> = chunker.spans("abcdefghij").collect();
/// assert_eq!(spans, ["abcd", "defg", "ghij"]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum chunk length in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by adjacent chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Lazily iterate over the chunk slices of `text`, left to right.
    pub fn spans<'a>(&self, text: &'a str) -> ChunkSpans<'a> {
        ChunkSpans {
            text,
            start: 0,
            chunk_size: self.chunk_size,
            step: self.chunk_size - self.chunk_overlap,
            done: text.is_empty(),
        }
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE, chunk_overlap: DEFAULT_CHUNK_OVERLAP }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document, document_index: usize) -> Vec<Chunk> {
        build_chunks(document, document_index, self.spans(&document.text))
    }
}

/// Lazy iterator returned by [`FixedSizeChunker::spans`].
#[derive(Debug, Clone)]
pub struct ChunkSpans<'a> {
    text: &'a str,
    start: usize,
    chunk_size: usize,
    step: usize,
    done: bool,
}

impl<'a> Iterator for ChunkSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.start..];
        let end = self.start + byte_offset(rest, self.chunk_size);
        let span = &self.text[self.start..end];

        if end == self.text.len() {
            self.done = true;
        } else {
            self.start += byte_offset(rest, self.step);
        }
        Some(span)
    }
}

/// Splits text hierarchically: paragraphs → sentences → words.
///
/// Segments are merged greedily up to `chunk_size` characters. When a chunk is
/// closed, the next one is seeded with its trailing `chunk_overlap` characters.
/// Segments that are still too long after the last separator fall back to
/// [`FixedSizeChunker`] spans.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    fn split_and_merge(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size || separators.is_empty() {
            let fixed = FixedSizeChunker { chunk_size: self.chunk_size, chunk_overlap: self.chunk_overlap };
            return fixed.spans(text).map(str::to_string).collect();
        }

        let (separator, remaining) = (separators[0], &separators[1..]);
        let mut chunks = Vec::new();
        let mut current = String::new();

        for segment in split_keeping_separator(text, separator) {
            if char_len(&current) + char_len(segment) <= self.chunk_size {
                current.push_str(segment);
                continue;
            }

            if !current.is_empty() {
                let tail = tail_chars(&current, self.chunk_overlap).to_string();
                chunks.push(std::mem::take(&mut current));
                if char_len(&tail) + char_len(segment) <= self.chunk_size {
                    current = tail;
                }
            }

            if char_len(segment) > self.chunk_size {
                current.clear();
                chunks.extend(self.split_and_merge(segment, remaining));
            } else {
                current.push_str(segment);
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document, document_index: usize) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }
        build_chunks(document, document_index, self.split_and_merge(&document.text, &SEPARATORS))
    }
}
