use crate::error::AppError;

/// Default separator priority: paragraph break, line break, word break,
/// then single characters as the base case that always subdivides.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character text splitter.
///
/// Produces ordered, size-bounded, overlapping chunks suitable for embedding
/// and citation. All lengths are measured in characters, never bytes, so a
/// chunk boundary can never land inside a multi-byte sequence.
///
/// The one documented exception to the size bound: a piece that no remaining
/// separator can subdivide is emitted whole, even when it exceeds
/// `chunk_size`.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Splitter with the default separator priority.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        Self::with_separators(
            chunk_size,
            chunk_overlap,
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Splitter with a caller-supplied separator priority. The list is tried
    /// in order; an empty-string entry splits into single characters.
    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: Vec<String>,
    ) -> Result<Self, AppError> {
        if chunk_overlap >= chunk_size {
            return Err(AppError::new(
                "CHUNKING_INVALID_CONFIG",
                "chunk_overlap must be less than chunk_size",
            )
            .with_details(format!(
                "chunk_size={chunk_size}; chunk_overlap={chunk_overlap}"
            )));
        }
        if separators.is_empty() {
            return Err(AppError::new(
                "CHUNKING_INVALID_CONFIG",
                "At least one separator is required",
            ));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks. Empty or whitespace-only input produces no
    /// chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let mut chunks = self.split_from(text, 0);
        chunks.retain(|c| !c.is_empty());
        chunks
    }

    /// Recursive step. `sep_start` indexes into the separator priority list;
    /// the index only ever grows, and once the list is exhausted the piece is
    /// emitted whole, so termination is guaranteed.
    fn split_from(&self, text: &str, sep_start: usize) -> Vec<String> {
        let Some(sep_idx) = self.pick_separator(text, sep_start) else {
            // No separator left that could subdivide this piece.
            return vec![text.to_string()];
        };
        let separator = self.separators[sep_idx].clone();

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator.as_str()).map(String::from).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            // Oversized piece: flush the pending merge buffer, then recurse
            // into the piece with the remaining lower-priority separators.
            if !pending.is_empty() {
                chunks.extend(self.merge_pieces(std::mem::take(&mut pending), &separator));
            }
            chunks.extend(self.split_from(&piece, sep_idx + 1));
        }
        if !pending.is_empty() {
            chunks.extend(self.merge_pieces(pending, &separator));
        }
        chunks
    }

    /// First separator at or after `sep_start` that occurs in `text`. The
    /// empty separator matches any text. Falls back to the last separator in
    /// the list (mirroring "split on it anyway") unless the list itself is
    /// exhausted.
    fn pick_separator(&self, text: &str, sep_start: usize) -> Option<usize> {
        if sep_start >= self.separators.len() {
            return None;
        }
        for (i, sep) in self.separators.iter().enumerate().skip(sep_start) {
            if sep.is_empty() || text.contains(sep.as_str()) {
                return Some(i);
            }
        }
        Some(self.separators.len() - 1)
    }

    /// Merge small pieces into chunks of at most `chunk_size` characters,
    /// seeding each new chunk with up to `chunk_overlap` trailing characters
    /// of the one just closed.
    fn merge_pieces(&self, pieces: Vec<String>, separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);

            if current_len + piece_len + sep_len <= self.chunk_size {
                current_len += piece_len + sep_len;
                current.push(piece);
                continue;
            }

            if !current.is_empty() {
                chunks.push(current.join(separator));

                // Carry a suffix of the just-closed chunk into the next one.
                let mut overlap = String::new();
                for part in current.iter().rev() {
                    overlap = format!("{part}{separator}{overlap}");
                    if char_len(&overlap) >= self.chunk_overlap {
                        break;
                    }
                }
                let overlap = tail_chars(&overlap, self.chunk_overlap);

                current.clear();
                current_len = 0;
                if !overlap.is_empty() {
                    current_len = char_len(&overlap) + sep_len;
                    current.push(overlap);
                }
            }

            if piece_len <= self.chunk_size {
                current_len += piece_len + sep_len;
                current.push(piece);
            } else {
                // Atomic unit larger than chunk_size: emit unbroken.
                if !current.is_empty() {
                    chunks.push(current.join(separator));
                    current.clear();
                    current_len = 0;
                }
                chunks.push(piece);
            }
        }

        if !current.is_empty() {
            chunks.push(current.join(separator));
        }
        chunks
    }
}

/// Collapse consecutive whitespace to a single space and drop non-printable
/// control characters, trimming the result. Applied to raw document text
/// before chunking.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = true;
        } else if (ch as u32) < 0x20 {
            // Non-whitespace control character, dropped outright.
        } else {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
    }
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s`; the whole string when it is shorter.
fn tail_chars(s: &str, n: usize) -> String {
    let len = char_len(s);
    if len <= n {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}
