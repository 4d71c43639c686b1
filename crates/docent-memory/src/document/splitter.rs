use uuid::Uuid;

use super::types::{Chunk, ChunkSpan, Document};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Accepted for configuration compatibility. Chunks are always disjoint.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
        }
    }
}

/// Sentence-greedy splitter.
///
/// Text is cut at every run of `.`, `!` or `?`; the delimiters themselves are
/// dropped. Trimmed sentences are packed into chunks joined by a single space
/// until the next sentence would push the chunk past `chunk_size` characters.
/// A sentence longer than `chunk_size` becomes its own oversized chunk.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        if config.chunk_overlap > 0 {
            tracing::warn!(
                chunk_overlap = config.chunk_overlap,
                "chunk overlap is not supported; chunks will be disjoint"
            );
        }
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        self.pack(text).into_iter().map(|p| p.content).collect()
    }

    /// Split a document into [`Chunk`]s with sequential indices and the
    /// character span each chunk's sentences occupy in the original content.
    #[must_use]
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        self.pack(&document.content)
            .into_iter()
            .enumerate()
            .map(|(i, packed)| Chunk {
                id: Uuid::new_v4(),
                document_id: document.id,
                content: packed.content,
                embedding: Vec::new(),
                chunk_index: i,
                span: packed.span,
            })
            .collect()
    }

    fn pack(&self, text: &str) -> Vec<Packed> {
        let chunk_size = self.config.chunk_size;
        let mut chunks = Vec::new();
        let mut current: Option<Packed> = None;
        let mut current_len = 0;

        for sentence in split_sentences(text) {
            match current.as_mut() {
                Some(packed) if current_len + 1 + sentence.len <= chunk_size => {
                    packed.content.push(' ');
                    packed.content.push_str(sentence.text);
                    packed.span.end = sentence.end;
                    current_len += 1 + sentence.len;
                }
                _ => {
                    if let Some(done) = current.take() {
                        chunks.push(done);
                    }
                    current = Some(Packed {
                        content: sentence.text.to_owned(),
                        span: ChunkSpan {
                            start: sentence.start,
                            end: sentence.end,
                        },
                    });
                    current_len = sentence.len;
                }
            }
        }

        chunks.extend(current);
        chunks
    }
}

struct Packed {
    content: String,
    span: ChunkSpan,
}

/// A trimmed, non-empty sentence with its character offsets in the source text.
struct Sentence<'a> {
    text: &'a str,
    start: usize,
    end: usize,
    len: usize,
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut seg_byte = 0;
    let mut seg_char = 0;
    let mut in_terminator = false;

    for (char_idx, (byte_idx, c)) in text.char_indices().enumerate() {
        let terminator = is_terminator(c);
        if terminator && !in_terminator {
            push_sentence(&text[seg_byte..byte_idx], seg_char, &mut sentences);
        } else if !terminator && in_terminator {
            seg_byte = byte_idx;
            seg_char = char_idx;
        }
        in_terminator = terminator;
    }
    if !in_terminator {
        push_sentence(&text[seg_byte..], seg_char, &mut sentences);
    }

    sentences
}

fn push_sentence<'a>(raw: &'a str, raw_start: usize, out: &mut Vec<Sentence<'a>>) {
    let left = raw.trim_start();
    let text = left.trim_end();
    if text.is_empty() {
        return;
    }
    let leading = raw[..raw.len() - left.len()].chars().count();
    let len = text.chars().count();
    let start = raw_start + leading;
    out.push(Sentence {
        text,
        start,
        end: start + len,
        len,
    });
}
