//! Cascading-separator text splitting.
//!
//! Splits prefer semantic boundaries: paragraph break, then line break,
//! then space, then a grapheme-level cut as the last resort. Lengths are
//! counted in graphemes so Hebrew combining marks never straddle a cut.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingProfile;
use crate::document::{Chunk, Document};

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits documents into windows bounded by a [`ChunkingProfile`],
/// copying metadata verbatim from each parent to every child.
#[derive(Clone, Copy, Debug)]
pub struct TextChunker {
    profile: ChunkingProfile,
}

impl TextChunker {
    pub fn new(profile: ChunkingProfile) -> Self {
        // Overlap must stay below the window size.
        let profile = ChunkingProfile {
            max_chunk_size: profile.max_chunk_size.max(1),
            overlap: profile.overlap.min(profile.max_chunk_size.saturating_sub(1)),
        };
        Self { profile }
    }

    pub fn profile(&self) -> ChunkingProfile {
        self.profile
    }

    /// One chunk per window of each document's content.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            for window in self.split_text(&document.content) {
                chunks.push(Chunk {
                    content: window,
                    metadata: document.metadata.clone(),
                });
            }
        }
        chunks
    }

    /// Splits raw text into windows of at most `max_chunk_size`
    /// graphemes; `overlap` trailing graphemes of each window are
    /// duplicated as leading context of the next.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let pieces = split_recursive(text, self.profile.max_chunk_size, &SEPARATORS);
        self.apply_overlap(pieces)
    }

    fn apply_overlap(&self, pieces: Vec<String>) -> Vec<String> {
        if self.profile.overlap == 0 || pieces.len() < 2 {
            return pieces;
        }
        let mut out = Vec::with_capacity(pieces.len());
        for index in 0..pieces.len() {
            if index == 0 {
                out.push(pieces[index].clone());
                continue;
            }
            let tail = tail_graphemes(&pieces[index - 1], self.profile.overlap);
            if tail.is_empty() {
                out.push(pieces[index].clone());
            } else {
                out.push(format!("{} {}", tail, pieces[index]));
            }
        }
        out
    }
}

fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

fn tail_graphemes(text: &str, count: usize) -> &str {
    let total = grapheme_len(text);
    if total <= count {
        return text;
    }
    let start = text
        .grapheme_indices(true)
        .nth(total - count)
        .map(|(offset, _)| offset)
        .unwrap_or(0);
    &text[start..]
}

fn split_recursive(text: &str, max: usize, separators: &[&str]) -> Vec<String> {
    if grapheme_len(text) <= max {
        return vec![text.to_string()];
    }
    let Some((separator, rest)) = separators.split_first() else {
        return vec![text.to_string()];
    };
    if separator.is_empty() {
        return split_graphemes(text, max);
    }
    let parts: Vec<&str> = text.split(separator).collect();
    if parts.len() == 1 {
        return split_recursive(text, max, rest);
    }
    merge_parts(&parts, separator, max, rest)
}

fn split_graphemes(text: &str, max: usize) -> Vec<String> {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    graphemes
        .chunks(max)
        .map(|window| window.concat())
        .collect()
}

// Greedily re-joins split parts into windows of at most `max` graphemes;
// a single part that is still oversized recurses with the remaining
// separators.
fn merge_parts(parts: &[&str], separator: &str, max: usize, rest: &[&str]) -> Vec<String> {
    let separator_len = grapheme_len(separator);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for part in parts {
        let part_len = grapheme_len(part);
        if part_len > max {
            push_piece(&mut pieces, std::mem::take(&mut current));
            current_len = 0;
            pieces.extend(split_recursive(part, max, rest));
            continue;
        }
        let joined_len = if current.is_empty() {
            part_len
        } else {
            current_len + separator_len + part_len
        };
        if joined_len > max && !current.is_empty() {
            push_piece(&mut pieces, std::mem::take(&mut current));
            current.push_str(part);
            current_len = part_len;
        } else {
            if !current.is_empty() {
                current.push_str(separator);
            }
            current.push_str(part);
            current_len = joined_len;
        }
    }
    push_piece(&mut pieces, current);
    pieces
}

fn push_piece(pieces: &mut Vec<String>, piece: String) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::meta;

    fn chunker(max_chunk_size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(ChunkingProfile {
            max_chunk_size,
            overlap,
        })
    }

    #[test]
    fn chunk_sized_content_passes_through_unchanged() {
        let text = "מענה רובוטיקה\nM-001\n11 סל תשתיות בית ספריות";
        let windows = chunker(100_000, 0).split_text(text);
        assert_eq!(windows, vec![text.to_string()]);
    }

    #[test]
    fn rechunking_a_chunk_is_idempotent() {
        let long = "פסקה ראשונה עם הרבה מלל שצריך פיצול. ".repeat(20);
        let splitter = chunker(120, 0);
        for window in splitter.split_text(&long) {
            assert_eq!(splitter.split_text(&window), vec![window.clone()]);
        }
    }

    #[test]
    fn empty_and_whitespace_content_produce_no_chunks() {
        let splitter = chunker(100, 0);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn paragraph_breaks_win_over_mid_word_cuts() {
        let text = "פסקה אחת קצרה.\n\nפסקה שנייה קצרה.\n\nפסקה שלישית קצרה.";
        let windows = chunker(20, 0).split_text(text);
        assert!(windows.len() >= 2);
        for window in &windows {
            assert!(grapheme_len(window) <= 20);
            assert!(!window.contains("\n\n"));
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_grapheme_windows() {
        let text = "א".repeat(25);
        let windows = chunker(10, 0).split_text(&text);
        assert_eq!(windows.len(), 3);
        assert_eq!(grapheme_len(&windows[0]), 10);
        assert_eq!(grapheme_len(&windows[2]), 5);
    }

    #[test]
    fn overlap_duplicates_trailing_context() {
        let text = "מילה ".repeat(40);
        let splitter = chunker(50, 10);
        let windows = splitter.split_text(&text);
        assert!(windows.len() >= 2);
        let tail: String = windows[0]
            .graphemes(true)
            .skip(grapheme_len(&windows[0]).saturating_sub(10))
            .collect();
        assert!(windows[1].starts_with(&tail));
    }

    #[test]
    fn metadata_is_copied_to_every_window() {
        let document = Document::new("שורה ראשונה\n\nשורה שנייה\n\nשורה שלישית")
            .with_meta(meta::SOURCE, "x.json")
            .with_meta(meta::POPULATION, "מוסד");
        let chunks = chunker(12, 0).split_documents(std::slice::from_ref(&document));
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(chunk.metadata, document.metadata);
        }
    }

    #[test]
    fn records_profile_keeps_short_records_whole() {
        let record = "מ".repeat(5_000);
        let document = Document::new(record.clone());
        let chunks = TextChunker::new(ChunkingProfile::RECORDS)
            .split_documents(std::slice::from_ref(&document));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, record);
    }
}
