pub mod existence;
pub mod format;
pub mod import;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod records;
pub mod search;
pub mod types;

/// Convert an f32 embedding to the little-endian bytes stored in a lane column.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Inverse of [`embedding_to_bytes`]. Trailing bytes that do not form a whole
/// f32 are ignored; the column CHECK keeps them from being stored.
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(std::mem::size_of::<f32>())
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
