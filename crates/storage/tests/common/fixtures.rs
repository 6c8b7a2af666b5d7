use bytes::Bytes;
use futures::{StreamExt, stream};
use sqldepot_storage::{ByteStream, boxed_stream};
use std::io;

/// Generate deterministic test data using a seeded pseudo-random generator
/// Same seed produces same output (reproducible tests)
pub fn seeded_bytes(seed: u64, len: usize) -> Bytes {
    let mut data = vec![0u8; len];
    let mut state = seed;

    // Simple LCG (Linear Congruential Generator)
    for chunk in data.chunks_mut(8) {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let bytes = state.to_le_bytes();
        for (i, byte) in chunk.iter_mut().enumerate() {
            *byte = bytes[i % 8];
        }
    }

    Bytes::from(data)
}

/// Stream `data` in pieces of `chunk_size` bytes.
#[allow(dead_code)]
pub fn chunked(data: Bytes, chunk_size: usize) -> ByteStream<'static> {
    let mut parts = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + chunk_size).min(data.len());
        parts.push(Ok(data.slice(offset..end)));
        offset = end;
    }
    boxed_stream(stream::iter(parts))
}

/// Stream `prefix` and then fail, as a dropped client connection would.
#[allow(dead_code)]
pub fn failing_after(prefix: Bytes) -> ByteStream<'static> {
    boxed_stream(stream::iter(vec![
        Ok(prefix),
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "body truncated")),
    ]))
}

/// Stream `prefix` and then never yield again, like a client that stalls.
#[allow(dead_code)]
pub fn stalled_after(prefix: Bytes) -> ByteStream<'static> {
    boxed_stream(stream::iter(vec![Ok(prefix)]).chain(stream::pending()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_bytes_deterministic() {
        let data1 = seeded_bytes(42, 1000);
        let data2 = seeded_bytes(42, 1000);
        assert_eq!(data1, data2);
    }

    #[test]
    fn test_seeded_bytes_different_seeds() {
        let data1 = seeded_bytes(42, 1000);
        let data2 = seeded_bytes(43, 1000);
        assert_ne!(data1, data2);
    }
}
