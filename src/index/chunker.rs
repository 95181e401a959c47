// file: src/index/chunker.rs
// description: sentence-aware text splitting with token overlap
// reference: paragraph, sentence and word boundary splitting

use crate::models::{Document, TextChunk};
use tracing::debug;

/// Rough token count without a tokenizer: ASCII text runs about four
/// characters per token, while CJK and other non-ASCII characters usually
/// cost a token each.
pub fn estimate_tokens(text: &str) -> usize {
    let (ascii, other) = text.chars().fold((0usize, 0usize), |(a, o), c| {
        if c.is_ascii() { (a + 1, o) } else { (a, o + 1) }
    });
    ascii.div_ceil(4) + other
}

#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_document(&self, document: &Document) -> Vec<TextChunk> {
        let chunks: Vec<TextChunk> = self
            .split_text(&document.content)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let tokens = estimate_tokens(&text) as u32;
                TextChunk::new(&document.id, &document.relative_path, i as u32, text, tokens)
            })
            .collect();

        debug!(
            "Split {} into {} chunks",
            document.relative_path,
            chunks.len()
        );
        chunks
    }

    pub fn split_documents(&self, documents: &[Document]) -> Vec<TextChunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    /// Every returned chunk is non-blank and estimates to at most
    /// `chunk_size` tokens.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut splits = Vec::new();
        self.split_recursive(text, Level::Paragraph, &mut splits);
        self.merge(splits)
    }

    fn split_recursive<'a>(&self, text: &'a str, level: Level, out: &mut Vec<(&'a str, usize)>) {
        let tokens = estimate_tokens(text);
        if tokens <= self.chunk_size {
            out.push((text, tokens));
            return;
        }

        let pieces = match level {
            Level::Paragraph => text.split_inclusive("\n\n").collect::<Vec<_>>(),
            Level::Sentence => split_sentences(text),
            Level::Word => text.split_inclusive(char::is_whitespace).collect(),
            Level::Char => {
                self.split_chars(text, out);
                return;
            }
        };

        if pieces.len() <= 1 {
            self.split_recursive(text, level.next(), out);
            return;
        }

        for piece in pieces {
            self.split_recursive(piece, level, out);
        }
    }

    fn split_chars<'a>(&self, text: &'a str, out: &mut Vec<(&'a str, usize)>) {
        let mut start = 0;
        let mut ascii = 0usize;
        let mut other = 0usize;

        for (i, c) in text.char_indices() {
            let (next_ascii, next_other) = if c.is_ascii() {
                (ascii + 1, other)
            } else {
                (ascii, other + 1)
            };

            if next_ascii.div_ceil(4) + next_other > self.chunk_size && i > start {
                out.push((&text[start..i], ascii.div_ceil(4) + other));
                start = i;
                (ascii, other) = if c.is_ascii() { (1, 0) } else { (0, 1) };
            } else {
                (ascii, other) = (next_ascii, next_other);
            }
        }

        if start < text.len() {
            out.push((&text[start..], ascii.div_ceil(4) + other));
        }
    }

    fn merge(&self, splits: Vec<(&str, usize)>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<(&str, usize)> = Vec::new();
        let mut current_tokens = 0;

        for (split, tokens) in splits {
            // `current` is never only carried overlap here: every flush is
            // followed by pushing the split that caused it.
            if current_tokens + tokens > self.chunk_size && !current.is_empty() {
                push_chunk(&mut chunks, &current);

                let mut carried = Vec::new();
                let mut carried_tokens = 0;
                for &(text, t) in current.iter().rev() {
                    if carried_tokens + t > self.chunk_overlap {
                        break;
                    }
                    carried.push((text, t));
                    carried_tokens += t;
                }
                carried.reverse();

                while carried_tokens + tokens > self.chunk_size && !carried.is_empty() {
                    let (_, t) = carried.remove(0);
                    carried_tokens -= t;
                }

                current = carried;
                current_tokens = carried_tokens;
            }

            current.push((split, tokens));
            current_tokens += tokens;
        }

        if !current.is_empty() {
            push_chunk(&mut chunks, &current);
        }

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<String>, parts: &[(&str, usize)]) {
    let text: String = parts.iter().map(|(s, _)| *s).collect();
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Paragraph,
    Sentence,
    Word,
    Char,
}

impl Level {
    fn next(self) -> Self {
        match self {
            Level::Paragraph => Level::Sentence,
            Level::Sentence => Level::Word,
            Level::Word | Level::Char => Level::Char,
        }
    }
}

/// Sentence pieces keep their terminator and trailing whitespace, so joining
/// them reproduces the input.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        let boundary = match c {
            '。' | '！' | '？' | '\n' => true,
            '.' | '!' | '?' => iter.peek().is_none_or(|(_, n)| n.is_whitespace()),
            _ => false,
        };

        if !boundary {
            continue;
        }

        let mut stop = i + c.len_utf8();
        while let Some(&(j, n)) = iter.peek() {
            if !n.is_whitespace() {
                break;
            }
            stop = j + n.len_utf8();
            iter.next();
        }

        out.push(&text[start..stop]);
        start = stop;
    }

    if start < text.len() {
        out.push(&text[start..]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("日本語"), 3);
    }

    #[test]
    fn test_small_text_is_single_chunk() {
        let splitter = SentenceSplitter::new(1024, 20);
        let chunks = splitter.split_text("  I wrote short stories.\n\nAnd programmed.  ");
        assert_eq!(chunks, vec!["I wrote short stories.\n\nAnd programmed."]);
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        let splitter = SentenceSplitter::new(16, 2);
        assert!(splitter.split_text(" \n\n \t").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let splitter = SentenceSplitter::new(10, 0);
        let text = "The first sentence is here. The second one follows it. \
                    A third sentence closes the paragraph.\n\nAnother paragraph starts now.";
        let chunks = splitter.split_text(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(estimate_tokens(chunk) <= 10, "chunk too large: {chunk:?}");
        }

        let rejoined: String = chunks.join(" ");
        assert!(rejoined.contains("Another paragraph starts now."));
    }

    #[test]
    fn test_japanese_sentences_split() {
        let splitter = SentenceSplitter::new(12, 0);
        let chunks = splitter.split_text("子供の頃は小説を書いた。プログラムも書いた。");
        assert_eq!(chunks, vec!["子供の頃は小説を書いた。", "プログラムも書いた。"]);
    }

    #[test]
    fn test_overlap_carries_trailing_text() {
        let splitter = SentenceSplitter::new(6, 3);
        let chunks = splitter.split_text("aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii jjjj");

        assert!(chunks.len() >= 2);
        let first_last_word = chunks[0].split_whitespace().last().unwrap();
        assert!(chunks[1].starts_with(first_last_word));
    }

    #[test]
    fn test_no_chunk_is_only_overlap() {
        let splitter = SentenceSplitter::new(6, 5);
        let chunks = splitter.split_text("aaaa bbbb cccc dddd eeee ffff gggg hhhh iiii jjjj");

        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            assert!(!pair[0].ends_with(pair[1].as_str()), "{:?}", pair);
        }
        assert!(chunks.last().unwrap().ends_with("jjjj"));
    }

    #[test]
    fn test_long_word_split_by_chars() {
        let splitter = SentenceSplitter::new(2, 0);
        let chunks = splitter.split_text(&"x".repeat(20));
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| estimate_tokens(c) <= 2));
        assert_eq!(chunks.concat(), "x".repeat(20));
    }

    #[test]
    fn test_split_document_indices() {
        let splitter = SentenceSplitter::new(4, 0);
        let doc = Document::new(
            "/data/a.txt".to_string(),
            "a.txt".to_string(),
            "One. Two. Three. Four. Five. Six.".to_string(),
            33,
            0,
        );

        let chunks = splitter.split_document(&doc);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
            assert_eq!(chunk.document_id, doc.id);
            assert_eq!(chunk.file_path, "a.txt");
        }
    }

    #[test]
    fn test_overlap_clamped_below_chunk_size() {
        let splitter = SentenceSplitter::new(4, 10);
        assert_eq!(splitter.chunk_overlap(), 3);
    }
}
