use std::collections::VecDeque;
use std::ops::Range;

use crate::chunk::{assemble, validate_window, Chunk, ChunkMetadata, Chunker, FixedSizeChunker};
use crate::Result;

/// Boundaries tried in order, coarsest first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Recursive chunker - splits on natural boundaries
///
/// Good for: prose, reports, anything with paragraphs
///
/// The text is cut at paragraph breaks first. Pieces that are still longer than
/// `chunk_size` are cut at line breaks, then sentence ends, then spaces, and as
/// a last resort into fixed windows. Neighbouring pieces are merged back
/// together up to `chunk_size`, and each new chunk starts with whole trailing
/// pieces of the previous one totalling at most `overlap` characters.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    overlap: usize,
    fallback: FixedSizeChunker,
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        validate_window(chunk_size, overlap)?;
        Ok(Self {
            chunk_size,
            overlap,
            fallback: FixedSizeChunker::new(chunk_size, overlap)?,
        })
    }

    fn split(&self, text: &str, span: Range<usize>, separators: &[&str]) -> Vec<Range<usize>> {
        let piece = &text[span.clone()];
        if char_len(piece) <= self.chunk_size {
            return vec![span];
        }

        let Some(depth) = separators.iter().position(|sep| piece.contains(sep)) else {
            return self
                .fallback
                .spans(piece)
                .into_iter()
                .map(|(_, r)| span.start + r.start..span.start + r.end)
                .collect();
        };
        let separator = separators[depth];
        let finer = &separators[depth + 1..];

        let mut out = Vec::new();
        let mut current: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut current_len = 0;

        for segment in split_keeping_separator(piece, separator) {
            let segment = span.start + segment.start..span.start + segment.end;
            let segment_len = char_len(&text[segment.clone()]);

            if segment_len > self.chunk_size {
                if let Some(merged) = merged_span(&current) {
                    out.push(merged);
                }
                current.clear();
                current_len = 0;
                out.extend(self.split(text, segment, finer));
                continue;
            }

            if current_len + segment_len > self.chunk_size {
                if let Some(merged) = merged_span(&current) {
                    out.push(merged);
                }
                // keep a tail of whole pieces as overlap for the next chunk
                while current_len > self.overlap
                    || (current_len > 0 && current_len + segment_len > self.chunk_size)
                {
                    if let Some((_, len)) = current.pop_front() {
                        current_len -= len;
                    }
                }
            }

            current_len += segment_len;
            current.push_back((segment, segment_len));
        }

        if let Some(merged) = merged_span(&current) {
            out.push(merged);
        }
        out
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self {
            chunk_size: super::DEFAULT_CHUNK_SIZE,
            overlap: super::DEFAULT_CHUNK_OVERLAP,
            fallback: FixedSizeChunker::default(),
        }
    }
}

impl Chunker for RecursiveChunker {
    fn name(&self) -> &str {
        "recursive"
    }

    fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        // (byte, char) offset of the last piece start; spans come in order
        let mut cursor = (0, 0);
        let pieces = self
            .split(content, 0..content.len(), &SEPARATORS)
            .into_iter()
            .filter_map(|span| {
                let raw = &content[span.clone()];
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let start = span.start + (raw.len() - raw.trim_start().len());
                if start < cursor.0 {
                    cursor = (0, 0);
                }
                cursor = (start, cursor.1 + char_len(&content[cursor.0..start]));
                Some((cursor.1, trimmed.to_string()))
            })
            .collect();

        assemble(pieces, metadata)
    }
}

fn merged_span(current: &VecDeque<(Range<usize>, usize)>) -> Option<Range<usize>> {
    let first = current.front()?;
    let last = current.back()?;
    Some(first.0.start..last.0.end)
}

/// Byte ranges of `text` cut after every occurrence of `separator`, the
/// separator staying on the preceding piece.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, sep) in text.match_indices(separator) {
        let end = i + sep.len();
        ranges.push(start..end);
        start = end;
    }
    if start < text.len() {
        ranges.push(start..text.len());
    }
    ranges
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
