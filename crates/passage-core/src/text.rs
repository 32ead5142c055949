//! Text normalization, word-window chunking, and plain-text extraction.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::TextExtractor;
use crate::types::Chunk;

/// Collapse every whitespace run (tabs, newlines, non-breaking spaces from
/// PDF extraction) into a single ASCII space and trim both ends.
///
/// `split_whitespace` matches the Unicode `White_Space` property, so U+00A0
/// is covered without special-casing.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Window parameters for [`chunk_words`]. Defaults match the original
/// deployment: 500-word windows with an 80-word overlap.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { size: 500, overlap: 80 }
    }
}

/// Split normalized text into overlapping word windows.
///
/// Windows of `size` words start at multiples of `size - overlap`; the final
/// window may be short, and a window that would contain only the previous
/// window's overlap tail is not emitted. For `N` words this produces exactly
/// `ceil(max(0, N - overlap) / (size - overlap))` chunks.
///
/// `overlap >= size` is rejected up front: the window start would stop
/// advancing and the loop would never terminate.
pub fn chunk_words(text: &str, cfg: &ChunkingConfig) -> Result<Vec<Chunk>> {
    if cfg.size == 0 || cfg.overlap >= cfg.size {
        return Err(Error::InvalidChunkParameters(format!(
            "size={} overlap={}: overlap must be smaller than size",
            cfg.size, cfg.overlap
        )));
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let stride = cfg.size - cfg.overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < words.len().saturating_sub(cfg.overlap) {
        let end = (start + cfg.size).min(words.len());
        chunks.push(Chunk {
            text: words[start..end].join(" "),
            source_offset: start,
        });
        start += stride;
    }
    Ok(chunks)
}

/// Reads plain-text documents from disk. Anything fancier (PDF byte streams,
/// OCR) lives outside this crate behind the same [`TextExtractor`] contract.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, source: &Path) -> anyhow::Result<String> {
        match fs::read_to_string(source) {
            Ok(content) => Ok(content),
            // Not valid UTF-8; salvage what we can
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(source)?).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn normalize_collapses_runs_and_nbsp() {
        assert_eq!(normalize("  a\t b\n\nc \u{a0} d  "), "a b c d");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \u{a0} \n"), "");
    }

    #[test]
    fn eight_words_size_three_overlap_one() {
        let cfg = ChunkingConfig { size: 3, overlap: 1 };
        let chunks = chunk_words("a b c d e f g h", &cfg).expect("chunk");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a b c", "c d e", "e f g", "g h"]);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.source_offset).collect();
        assert_eq!(offsets, vec![0, 2, 4, 6]);
    }

    #[test]
    fn chunk_count_matches_formula() {
        for (n, size, overlap) in [
            (8usize, 3usize, 1usize),
            (5, 3, 1),
            (1, 3, 1),
            (500, 500, 80),
            (501, 500, 80),
            (1234, 500, 80),
            (7, 7, 0),
            (20, 4, 3),
        ] {
            let cfg = ChunkingConfig { size, overlap };
            let chunks = chunk_words(&words(n), &cfg).expect("chunk");
            let stride = size - overlap;
            let expected = n.saturating_sub(overlap).div_ceil(stride);
            assert_eq!(chunks.len(), expected, "n={n} size={size} overlap={overlap}");
        }
    }

    #[test]
    fn adjacent_full_windows_share_exactly_overlap_words() {
        let cfg = ChunkingConfig { size: 5, overlap: 2 };
        let chunks = chunk_words(&words(20), &cfg).expect("chunk");
        for pair in chunks.windows(2) {
            let a: Vec<&str> = pair[0].text.split(' ').collect();
            let b: Vec<&str> = pair[1].text.split(' ').collect();
            if a.len() == cfg.size && b.len() == cfg.size {
                assert_eq!(a[a.len() - cfg.overlap..], b[..cfg.overlap]);
            }
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let cfg = ChunkingConfig::default();
        assert!(chunk_words("", &cfg).expect("chunk").is_empty());
    }

    #[test]
    fn overlap_not_below_size_is_rejected() {
        for (size, overlap) in [(3usize, 3usize), (3, 5), (0, 0)] {
            let cfg = ChunkingConfig { size, overlap };
            match chunk_words("a b c", &cfg) {
                Err(Error::InvalidChunkParameters(_)) => {}
                other => panic!("expected InvalidChunkParameters, got {other:?}"),
            }
        }
    }

    #[test]
    fn extractor_reads_plain_files() {
        let tmp = tempfile::tempdir().expect("tmp");
        let path = tmp.path().join("doc.txt");
        std::fs::write(&path, "hello\u{a0}extracted text").expect("write");
        let extractor = PlainTextExtractor;
        let text = extractor.extract(&path).expect("extract");
        assert_eq!(normalize(&text), "hello extracted text");
        assert!(extractor.extract(&tmp.path().join("missing.txt")).is_err());
    }
}
