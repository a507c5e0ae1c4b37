//! Sliding-window text splitter.

use super::{Chunk, ChunkingConfig};
use crate::error::{Result, VidQueryError};

/// Where a window may end, in order of preference.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
}

impl Boundary {
    const PREFERENCE: [Boundary; 4] = [
        Boundary::Paragraph,
        Boundary::Line,
        Boundary::Sentence,
        Boundary::Word,
    ];

    /// Whether a chunk ending just before `end` ends on this boundary.
    fn is_at(self, chars: &[char], end: usize) -> bool {
        let last = chars[end - 1];
        let before = end.checked_sub(2).map(|i| chars[i]);
        match self {
            Boundary::Paragraph => last == '\n' && before == Some('\n'),
            Boundary::Line => last == '\n',
            Boundary::Sentence => {
                last.is_whitespace() && matches!(before, Some('.' | '!' | '?' | '।'))
            }
            Boundary::Word => last.is_whitespace(),
        }
    }
}

/// Splits text into overlapping chunks of bounded length.
///
/// Every chunk is at most `chunk_size` characters and consecutive chunks share
/// exactly `chunk_overlap` characters. A window ends on the best available
/// boundary (paragraph, line, sentence, word) in its back half, or is cut hard
/// at `chunk_size`.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
}

impl TextSplitter {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 || config.chunk_overlap >= config.chunk_size {
            return Err(VidQueryError::Config(format!(
                "invalid chunking configuration: size {} with overlap {}",
                config.chunk_size, config.chunk_overlap
            )));
        }
        Ok(Self { config })
    }

    /// Split text into ordered chunks. Empty text yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = if total - start <= self.config.chunk_size {
                total
            } else {
                self.window_end(&chars, start)
            };

            chunks.push(Chunk::new(
                text[offsets[start]..offsets[end]].to_string(),
                chunks.len(),
                start,
            ));

            if end == total {
                break;
            }
            start = end - self.config.chunk_overlap;
        }

        chunks
    }

    fn window_end(&self, chars: &[char], start: usize) -> usize {
        let hard_end = start + self.config.chunk_size;
        // Leaves at least one new character after the overlap.
        let min_end = start + (self.config.chunk_size / 2).max(self.config.chunk_overlap + 1);

        Boundary::PREFERENCE
            .iter()
            .find_map(|boundary| (min_end..=hard_end).rev().find(|&end| boundary.is_at(chars, end)))
            .unwrap_or(hard_end)
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                text.push_str(&chunk.text);
            } else {
                text.extend(chunk.text.chars().skip(overlap));
            }
        }
        text
    }

    fn sample_texts() -> Vec<String> {
        let sentences = (0..300)
            .map(|i| format!("Sentence number {} talks about topic {}.", i, i % 7))
            .collect::<Vec<_>>()
            .join(" ");
        let paragraphs = (0..40)
            .map(|i| format!("Paragraph {} opens here. {}", i, "words and more words ".repeat(8)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let no_spaces = "x".repeat(3456);
        let hindi = "यह एक परीक्षण वाक्य है। ".repeat(150);

        vec![sentences, paragraphs, no_spaces, hindi]
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(TextSplitter::default().split("").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = TextSplitter::default().split("A short transcript.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "A short transcript.");
        assert_eq!(chunks[0].order, 0);
    }

    #[test]
    fn test_chunks_reconstruct_text() {
        let splitter = TextSplitter::default();
        for text in sample_texts() {
            let chunks = splitter.split(&text);
            assert!(chunks.len() > 1);
            assert_eq!(reconstruct(&chunks, 200), text);
        }
    }

    #[test]
    fn test_chunks_are_bounded_and_overlap() {
        let splitter = TextSplitter::default();
        for text in sample_texts() {
            let chunks = splitter.split(&text);
            for pair in chunks.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(a.char_len() <= 1000);
                assert_eq!(b.char_start, a.char_start + a.char_len() - 200);

                let tail: String = a.text.chars().skip(a.char_len() - 200).collect();
                let head: String = b.text.chars().take(200).collect();
                assert_eq!(tail, head);
            }
            assert!(chunks.last().unwrap().char_len() <= 1000);
        }
    }

    #[test]
    fn test_prefers_sentence_boundaries() {
        let text = &sample_texts()[0];
        let chunks = TextSplitter::default().split(text);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.text.ends_with(". "), "chunk ends mid-sentence: {:?}", chunk.text);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let text = &sample_texts()[1];
        let chunks = TextSplitter::default().split(text);
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.text.ends_with("\n\n"));
        }
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let text = "x".repeat(2500);
        let chunks = TextSplitter::default().split(&text);
        let lengths: Vec<usize> = chunks.iter().map(Chunk::char_len).collect();
        assert_eq!(lengths, vec![1000, 1000, 900]);
    }

    #[test]
    fn test_small_custom_window() {
        let splitter = TextSplitter::new(ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 3,
        })
        .unwrap();
        let chunks = splitter.split("abcdefghijklmnopqrst");
        assert_eq!(reconstruct(&chunks, 3), "abcdefghijklmnopqrst");
        assert!(chunks.iter().all(|c| c.char_len() <= 10));
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
        })
        .is_err());
    }
}
