//! The value type stored in a byte buffer's chunk tree, and its summary.

use crate::tree::Summary;

/// An owned run of bytes, at most `MAX_CHUNK_BYTES` long (enforced by the
/// splitting logic in [`super::Buffer`], not by this type itself).
pub type Chunk = Vec<u8>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteSummary {
    pub len: usize,
}

impl Summary<Chunk> for ByteSummary {
    fn identity() -> Self {
        ByteSummary { len: 0 }
    }

    fn of_value(value: &Chunk) -> Self {
        ByteSummary { len: value.len() }
    }

    fn combine(left: &Self, right: &Self) -> Self {
        ByteSummary {
            len: left.len + right.len,
        }
    }
}

/// Split `bytes` into chunks no longer than `max_len`, preserving order.
pub fn chunk_bytes(bytes: &[u8], max_len: usize) -> Vec<Chunk> {
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes.chunks(max_len.max(1)).map(|c| c.to_vec()).collect()
}
