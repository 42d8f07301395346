use std::ops::Range;

use crate::chunk::{assemble, validate_window, Chunk, ChunkMetadata, Chunker};
use crate::Result;

/// Fixed-size chunker - splits by character count
///
/// Windows start every `chunk_size - overlap` characters, so consecutive
/// chunks share exactly `overlap` characters. The final window always ends at
/// the end of the text.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    overlap: usize,
}

impl FixedSizeChunker {
    /// Create a fixed-size chunker.
    ///
    /// Fails with [`Error::Chunking`](crate::Error::Chunking) unless
    /// `0 <= overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        validate_window(chunk_size, overlap)?;
        Ok(Self { chunk_size, overlap })
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `content` into `(char offset, text)` windows, leaving out
    /// windows that are only whitespace.
    pub(crate) fn windows(&self, content: &str) -> Vec<(usize, String)> {
        self.spans(content)
            .into_iter()
            .map(|(position, range)| (position, &content[range]))
            .filter(|(_, window)| !window.trim().is_empty())
            .map(|(position, window)| (position, window.to_string()))
            .collect()
    }

    /// Byte ranges of the windows over `content`, each paired with the char
    /// offset it starts at.
    pub(crate) fn spans(&self, content: &str) -> Vec<(usize, Range<usize>)> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        // byte offset of every char, plus the end of the string
        let bounds: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let total = bounds.len() - 1;
        let stride = self.chunk_size - self.overlap;

        let mut spans = Vec::with_capacity(total.div_ceil(stride));
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(total);
            spans.push((start, bounds[start]..bounds[end]));
            if end == total {
                break;
            }
            start += stride;
        }
        spans
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self {
            chunk_size: super::DEFAULT_CHUNK_SIZE,
            overlap: super::DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker for FixedSizeChunker {
    fn name(&self) -> &str {
        "fixed"
    }

    fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk> {
        assemble(self.windows(content), metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn meta() -> ChunkMetadata {
        ChunkMetadata::default()
    }

    #[test]
    fn test_basic_chunking() {
        let chunker = FixedSizeChunker::new(10, 0).unwrap();
        let content = "0123456789abcdefghij"; // 20 chars
        let chunks = chunker.chunk(content, meta());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "0123456789");
        assert_eq!(chunks[1].content, "abcdefghij");
    }

    #[test]
    fn test_overlap() {
        let chunker = FixedSizeChunker::new(10, 5).unwrap();
        let content = "0123456789abcdefghij"; // 20 chars, stride=5
        let chunks = chunker.chunk(content, meta());

        // the window at 15 would sit entirely inside the one at 10
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "0123456789");
        assert_eq!(chunks[1].content, "56789abcde");
        assert_eq!(chunks[2].content, "abcdefghij");
    }

    #[test]
    fn test_shorter_than_size_is_single_chunk() {
        let chunker = FixedSizeChunker::default();
        let content = "  The sky is blue.  ";
        let chunks = chunker.chunk(content, meta());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, content);
    }

    #[test]
    fn test_three_windows_share_overlap() {
        let chunker = FixedSizeChunker::new(500, 50).unwrap();
        let content: String = (0..1500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunker.chunk(&content, meta());

        assert_eq!(chunks.len(), 4);
        for pair in chunks.windows(2) {
            let first: Vec<char> = pair[0].content.chars().collect();
            let tail: String = first[first.len() - 50..].iter().collect();
            let head: String = pair[1].content.chars().take(50).collect();
            assert_eq!(tail, head);
        }
        assert_eq!(chunks[3].content.chars().count(), 150);
    }

    #[test]
    fn test_unicode_safety() {
        let chunker = FixedSizeChunker::new(5, 1).unwrap();
        let content = "Hello 👋 World, ünïcödé";

        let chunks = chunker.chunk(content, meta());
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 5);
        }
    }

    #[test]
    fn test_metadata_position() {
        let chunker = FixedSizeChunker::new(10, 0).unwrap();
        let content = "0123456789abcdefghij";
        let chunks = chunker.chunk(content, ChunkMetadata::for_source("a.txt"));

        assert_eq!(chunks[0].metadata.position, 0);
        assert_eq!(chunks[1].metadata.position, 10);
        assert_eq!(chunks[1].metadata.total_chunks, Some(2));
        assert_eq!(chunks[1].metadata.source_id.as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_ids_distinguish_position() {
        let chunker = FixedSizeChunker::new(5, 0).unwrap();
        let chunks = chunker.chunk("aaaaaaaaaa", meta());

        assert_eq!(chunks.len(), 2);
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    #[test]
    fn test_empty_content() {
        let chunker = FixedSizeChunker::default();
        assert!(chunker.chunk("", meta()).is_empty());
        assert!(chunker.chunk("   ", meta()).is_empty());
        assert!(chunker.chunk("\n\t \n", meta()).is_empty());
    }

    #[test]
    fn test_blank_windows_skipped() {
        let chunker = FixedSizeChunker::new(10, 2).unwrap();
        let content = format!("abc{}xyz", " ".repeat(30));
        let chunks = chunker.chunk(&content, meta());
        let chars: Vec<char> = content.chars().collect();

        // windows at 8 and 16 fall entirely inside the run of spaces
        let positions: Vec<usize> = chunks.iter().map(|c| c.metadata.position).collect();
        assert_eq!(positions, vec![0, 24, 32]);
        assert_eq!(chunks[0].metadata.total_chunks, Some(3));
        for chunk in &chunks {
            assert!(!chunk.content.trim().is_empty());
            let start = chunk.metadata.position;
            let expected: String = chars[start..start + chunk.content.chars().count()]
                .iter()
                .collect();
            assert_eq!(chunk.content, expected);
        }
        assert_eq!(chunks[2].content, " xyz");
    }

    #[test]
    fn test_rejects_overlap_not_below_size() {
        assert!(FixedSizeChunker::new(10, 10).is_err());
        assert!(FixedSizeChunker::new(0, 0).is_err());
    }

    #[test]
    fn test_deterministic() {
        let chunker = FixedSizeChunker::new(7, 2).unwrap();
        let text = "determinism means the same output every single time";
        assert_eq!(chunker.chunk(text, meta()), chunker.chunk(text, meta()));
    }

    proptest! {
        #[test]
        fn prop_windows_cover_text_with_exact_overlap(
            text in "([a-zé]{1,12} ){0,30}[a-z]{1,5}",
            size in 2usize..40,
            overlap_seed in 0usize..40,
        ) {
            let overlap = overlap_seed % size;
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk(&text, meta());
            let chars: Vec<char> = text.chars().collect();

            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                let start = chunk.metadata.position;
                let len = chunk.content.chars().count();
                prop_assert!(len <= size);
                let expected: String = chars[start..start + len].iter().collect();
                prop_assert_eq!(&chunk.content, &expected);
            }
            for pair in chunks.windows(2) {
                let first_end = pair[0].metadata.position + pair[0].content.chars().count();
                prop_assert_eq!(first_end - pair[1].metadata.position, overlap);
            }
            let last = chunks.last().unwrap();
            prop_assert_eq!(last.metadata.position + last.content.chars().count(), chars.len());
        }
    }
}
