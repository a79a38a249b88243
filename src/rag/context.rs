//! Context assembly.
//!
//! Formats ranked chunks into one bounded prompt-context string. Each block
//! opens with a provenance tag and blocks are joined with a fixed delimiter,
//! so the context can be re-split for debugging.

use super::retriever::RetrievedChunk;

/// Separator between provenance-tagged blocks.
pub const BLOCK_DELIMITER: &str = "\n\n---\n\n";

/// Assemble ranked chunks into a single context string.
///
/// Chunks are emitted in rank order until adding another block would exceed
/// `max_chars`. At least the first block is always included, so a single
/// oversized chunk still produces usable context. Empty input yields an
/// empty string; callers treat that as "no grounding available".
pub fn assemble(chunks: &[RetrievedChunk], max_chars: usize) -> String {
    let mut blocks: Vec<String> = Vec::with_capacity(chunks.len());
    let mut used = 0;

    for retrieved in chunks {
        let block = format!(
            "[Source: {}, Chunk {}]\n{}",
            retrieved.chunk.title, retrieved.chunk.sequence_index, retrieved.chunk.text
        );
        let cost = block.chars().count() + BLOCK_DELIMITER.len();
        if !blocks.is_empty() && used + cost > max_chars {
            break;
        }
        used += cost;
        blocks.push(block);
    }

    blocks.join(BLOCK_DELIMITER)
}
