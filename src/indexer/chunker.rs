use crate::types::{Chunk, ChunkKind};

/// Trait for splitting one file's text into chunks
///
/// Deterministic, side-effect free, and total: malformed or binary-looking
/// input yields an empty sequence rather than an error. The extension is a
/// language hint that implementations are free to ignore.
pub trait Chunker: Send + Sync {
    fn chunk(&self, content: &str, extension: &str) -> Vec<Chunk>;
}

/// Line-window chunker: fixed number of lines per chunk
///
/// The default splitting strategy. Whitespace-only windows are skipped; a
/// file that fits in a single window is tagged as a whole-file chunk.
pub struct LineChunker {
    lines_per_chunk: usize,
}

impl LineChunker {
    pub fn new(lines_per_chunk: usize) -> Self {
        Self {
            lines_per_chunk: lines_per_chunk.max(1),
        }
    }
}

impl Default for LineChunker {
    fn default() -> Self {
        Self::new(50)
    }
}

impl Chunker for LineChunker {
    fn chunk(&self, content: &str, _extension: &str) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let lines: Vec<&str> = content.lines().collect();
        let whole_file = lines.len() <= self.lines_per_chunk;
        let mut chunks = Vec::new();

        for (chunk_idx, chunk_lines) in lines.chunks(self.lines_per_chunk).enumerate() {
            let content = chunk_lines.join("\n");

            // Skip empty chunks
            if content.trim().is_empty() {
                continue;
            }

            let start_line = chunk_idx * self.lines_per_chunk + 1;
            let end_line = start_line + chunk_lines.len() - 1;

            chunks.push(Chunk {
                content,
                start_line: Some(start_line),
                end_line: Some(end_line),
                kind: Some(if whole_file { ChunkKind::File } else { ChunkKind::Block }),
            });
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_yields_no_chunks() {
        let chunker = LineChunker::default();
        assert!(chunker.chunk("", "py").is_empty());
        assert!(chunker.chunk("   \n\t\n", "py").is_empty());
    }

    #[test]
    fn test_small_file_is_one_whole_file_chunk() {
        let chunker = LineChunker::default();
        let chunks = chunker.chunk("def f(): pass", "py");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "def f(): pass");
        assert_eq!(chunks[0].start_line, Some(1));
        assert_eq!(chunks[0].end_line, Some(1));
        assert_eq!(chunks[0].kind, Some(ChunkKind::File));
    }

    #[test]
    fn test_fixed_line_windows() {
        let content = (1..=100)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");

        let chunker = LineChunker::new(10);
        let chunks = chunker.chunk(&content, "rs");

        assert_eq!(chunks.len(), 10);
        assert_eq!(chunks[0].start_line, Some(1));
        assert_eq!(chunks[0].end_line, Some(10));
        assert_eq!(chunks[9].start_line, Some(91));
        assert_eq!(chunks[9].end_line, Some(100));
        assert_eq!(chunks[0].kind, Some(ChunkKind::Block));
    }

    #[test]
    fn test_whitespace_window_skipped() {
        // lines 11-20 are blank; that window contributes nothing
        let mut lines: Vec<String> = (1..=10).map(|i| format!("line {}", i)).collect();
        lines.extend(std::iter::repeat_n(String::new(), 10));
        lines.extend((21..=30).map(|i| format!("line {}", i)));
        let content = lines.join("\n");

        let chunker = LineChunker::new(10);
        let chunks = chunker.chunk(&content, "rs");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].start_line, Some(21));
    }

    #[test]
    fn test_deterministic() {
        let chunker = LineChunker::new(5);
        let content = "a\nb\nc\nd\ne\nf\ng";
        let first = chunker.chunk(content, "txt");
        let second = chunker.chunk(content, "txt");
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.content, b.content);
            assert_eq!(a.start_line, b.start_line);
        }
    }
}
