//! Sentence-aligned text chunking with overlap.

use crate::config::IngestSettings;
use regex::Regex;

/// Splits text into chunks of whole sentences.
///
/// A chunk holds as many sentences as fit in `chunk_size` characters; a single
/// longer sentence becomes its own chunk. Trailing sentences totalling at most
/// `overlap` characters are repeated at the start of the next chunk.
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    overlap: usize,
    sentence_end: Regex,
    whitespace: Regex,
}

impl SentenceChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
            sentence_end: Regex::new(r"[.!?]+\s+").expect("Invalid regex"),
            whitespace: Regex::new(r"\s+").expect("Invalid regex"),
        }
    }

    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Split normalized text into sentences, keeping terminal punctuation.
    fn sentences(&self, text: &str) -> Vec<String> {
        let normalized = self.whitespace.replace_all(text.trim(), " ");

        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.sentence_end.find_iter(&normalized) {
            let sentence = normalized[start..m.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = m.end();
        }
        let tail = normalized[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
        sentences
    }

    /// Chunk `text`. Empty or whitespace-only text yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let sentences = self.sentences(text);
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < sentences.len() {
            let mut size = 0;
            let mut end = i;
            while end < sentences.len() {
                let len = sentences[end].chars().count();
                let space = usize::from(end > i);
                if end > i && size + len + space > self.chunk_size {
                    break;
                }
                size += len + space;
                end += 1;
            }

            chunks.push(sentences[i..end].join(" "));

            if end == sentences.len() {
                break;
            }

            let mut carried = 0;
            let mut carried_len = 0;
            for sentence in sentences[i..end].iter().rev() {
                let len = sentence.chars().count();
                if carried_len + len > self.overlap {
                    break;
                }
                carried_len += len;
                carried += 1;
            }

            // Always advance by at least one sentence.
            i = (end - carried).max(i + 1);
        }

        chunks
    }
}
