//! # Wire Codec
//!
//! Merkle block message layout (little-endian integers):
//!
//! ```text
//! version(4) | prev_block(32) | merkle_root(32) | timestamp(4) | target(4) | nonce(4)
//! [ total_transactions(4) | var_int hash_count | hash_count * 32 | var_int flag_len | flags ]
//! ```
//!
//! Decoding never panics and never builds a partial object: any overrun,
//! non-canonical var_int or trailing byte yields `None`.

use crate::domain::{
    Hash, HeaderRecord, MerkleBlock, PartialMerklePayload, HASH_SIZE, HEADER_SIZE,
};

/// Bounds-checked little-endian reader over a message buffer.
struct WireReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let slice = self.bytes.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.take(2)?.try_into().ok().map(u16::from_le_bytes)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take(4)?.try_into().ok().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take(8)?.try_into().ok().map(u64::from_le_bytes)
    }

    fn read_hash(&mut self) -> Option<Hash> {
        self.take(HASH_SIZE)?.try_into().ok()
    }

    /// Variable-length integer; only the shortest encoding is accepted.
    fn read_var_int(&mut self) -> Option<u64> {
        match self.read_u8()? {
            0xFD => self
                .read_u16()
                .map(u64::from)
                .filter(|value| *value >= 0xFD),
            0xFE => self
                .read_u32()
                .map(u64::from)
                .filter(|value| *value > 0xFFFF),
            0xFF => self.read_u64().filter(|value| *value > 0xFFFF_FFFF),
            small => Some(u64::from(small)),
        }
    }
}

/// Append a variable-length integer in its shortest form.
pub fn write_var_int(out: &mut Vec<u8>, value: u64) {
    if value < 0xFD {
        out.push(value as u8);
    } else if value <= 0xFFFF {
        out.push(0xFD);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        out.push(0xFE);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn read_header(reader: &mut WireReader<'_>) -> Option<HeaderRecord> {
    let version = reader.read_u32()?;
    let prev_block_hash = reader.read_hash()?;
    let merkle_root = reader.read_hash()?;
    let timestamp = reader.read_u32()?;
    let target = reader.read_u32()?;
    let nonce = reader.read_u32()?;
    Some(HeaderRecord::new(
        version,
        prev_block_hash,
        merkle_root,
        timestamp,
        target,
        nonce,
    ))
}

fn read_payload(reader: &mut WireReader<'_>) -> Option<PartialMerklePayload> {
    let total_transactions = reader.read_u32()?;
    if total_transactions == 0 {
        // A payload that commits to nothing cannot be re-serialized.
        return None;
    }

    let hash_count = usize::try_from(reader.read_var_int()?).ok()?;
    let raw_hashes = reader.take(hash_count.checked_mul(HASH_SIZE)?)?;
    let hashes = raw_hashes
        .chunks_exact(HASH_SIZE)
        .map(|chunk| {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(chunk);
            hash
        })
        .collect();

    let flag_len = usize::try_from(reader.read_var_int()?).ok()?;
    let flags = reader.take(flag_len)?.to_vec();

    Some(PartialMerklePayload {
        total_transactions,
        hashes,
        flags,
    })
}

/// Parse the fixed 80-byte header at the start of `bytes`.
pub fn decode_header(bytes: &[u8]) -> Option<HeaderRecord> {
    read_header(&mut WireReader::new(bytes))
}

/// Parse a header-only or merkle block message.
pub fn decode_merkle_block(bytes: &[u8]) -> Option<MerkleBlock> {
    if bytes.len() < HEADER_SIZE {
        return None;
    }

    let mut reader = WireReader::new(bytes);
    let header = read_header(&mut reader)?;
    if reader.is_empty() {
        return Some(MerkleBlock::new(header, PartialMerklePayload::header_only()));
    }

    let payload = read_payload(&mut reader)?;
    if !reader.is_empty() {
        return None;
    }
    Some(MerkleBlock::new(header, payload))
}

/// Serialize a merkle block; the payload is written only when it commits to
/// at least one transaction. Height is never serialized.
pub fn encode_merkle_block(block: &MerkleBlock) -> Vec<u8> {
    let payload = &block.payload;
    let mut out = Vec::with_capacity(
        HEADER_SIZE + 4 + 18 + payload.hashes.len() * HASH_SIZE + payload.flags.len(),
    );
    out.extend_from_slice(&block.header.encode_header());

    if payload.total_transactions > 0 {
        out.extend_from_slice(&payload.total_transactions.to_le_bytes());
        write_var_int(&mut out, payload.hashes.len() as u64);
        for hash in &payload.hashes {
            out.extend_from_slice(hash);
        }
        write_var_int(&mut out, payload.flags.len() as u64);
        out.extend_from_slice(&payload.flags);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes() -> Vec<u8> {
        HeaderRecord::new(1, [3u8; 32], [4u8; 32], 1_500_000_000, 0x207fffff, 9)
            .encode_header()
            .to_vec()
    }

    fn var_int(value: u64) -> Vec<u8> {
        let mut out = vec![];
        write_var_int(&mut out, value);
        out
    }

    fn read_var_int(bytes: &[u8]) -> Option<u64> {
        WireReader::new(bytes).read_var_int()
    }

    #[test]
    fn test_encodes_a_u8_varint() {
        assert_eq!(var_int(12), vec![12]);
        assert_eq!(var_int(0xFC), vec![0xFC]);
    }

    #[test]
    fn test_encodes_a_u16_varint() {
        assert_eq!(var_int(0xFD), vec![0xFD, 0xFD, 0x00]);
        assert_eq!(var_int(0xFFFF), vec![0xFD, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encodes_a_u32_varint() {
        assert_eq!(var_int(0xFFFF_FFFF), vec![0xFE, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encodes_a_u64_varint() {
        assert_eq!(
            var_int(0xFFFF_FFFF + 1),
            vec![0xFF, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_var_int_roundtrip_boundaries() {
        for value in [0, 0xFC, 0xFD, 0xFFFF, 0x1_0000, 0xFFFF_FFFF, 0x1_0000_0000, u64::MAX] {
            assert_eq!(read_var_int(&var_int(value)), Some(value));
        }
    }

    #[test]
    fn test_rejects_non_canonical_var_int() {
        assert_eq!(read_var_int(&[0xFD, 0x05, 0x00]), None);
        assert_eq!(read_var_int(&[0xFE, 0xFF, 0xFF, 0x00, 0x00]), None);
        assert_eq!(read_var_int(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]), None);
    }

    #[test]
    fn test_rejects_truncated_var_int() {
        assert_eq!(read_var_int(&[]), None);
        assert_eq!(read_var_int(&[0xFD, 0xFF]), None);
    }

    #[test]
    fn test_short_buffer_is_absent() {
        let bytes = header_bytes();
        assert!(decode_merkle_block(&bytes[..79]).is_none());
        assert!(decode_merkle_block(&[]).is_none());
    }

    #[test]
    fn test_header_only_message() {
        let bytes = header_bytes();
        let block = decode_merkle_block(&bytes).unwrap();
        assert!(block.is_header_only());
        assert_eq!(block.payload.total_transactions, 0);
        assert!(block.payload.hashes.is_empty());
        assert!(block.payload.flags.is_empty());
        assert_eq!(encode_merkle_block(&block), bytes);
    }

    #[test]
    fn test_merkle_payload_roundtrip() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.push(2);
        bytes.extend_from_slice(&[0xAA; 32]);
        bytes.extend_from_slice(&[0xBB; 32]);
        bytes.push(1);
        bytes.push(0x1D);

        let block = decode_merkle_block(&bytes).unwrap();
        assert_eq!(block.payload.total_transactions, 3);
        assert_eq!(block.payload.hashes, vec![[0xAA; 32], [0xBB; 32]]);
        assert_eq!(block.payload.flags, vec![0x1D]);
        assert_eq!(encode_merkle_block(&block), bytes);
    }

    #[test]
    fn test_hash_count_overrun_is_absent() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.push(3);
        bytes.extend_from_slice(&[0xAA; 64]);
        assert!(decode_merkle_block(&bytes).is_none());
    }

    #[test]
    fn test_huge_hash_count_is_absent() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(decode_merkle_block(&bytes).is_none());
    }

    #[test]
    fn test_flag_overrun_is_absent() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&[0xAA; 32]);
        bytes.push(2);
        bytes.push(0x01);
        assert!(decode_merkle_block(&bytes).is_none());
    }

    #[test]
    fn test_partial_total_is_absent() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&[1, 0]);
        assert!(decode_merkle_block(&bytes).is_none());
    }

    #[test]
    fn test_trailing_bytes_are_absent() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&[0xAA; 32]);
        bytes.push(1);
        bytes.push(0x01);
        assert!(decode_merkle_block(&bytes).is_some());

        bytes.push(0x00);
        assert!(decode_merkle_block(&bytes).is_none());
    }

    #[test]
    fn test_zero_total_with_payload_is_absent() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(0);
        bytes.push(0);
        assert!(decode_merkle_block(&bytes).is_none());
    }

    #[test]
    fn test_decode_header_ignores_payload() {
        let mut bytes = header_bytes();
        bytes.extend_from_slice(&[0xEE; 10]);
        let header = decode_header(&bytes).unwrap();
        assert_eq!(header.nonce(), 9);
        assert_eq!(header.height(), None);
    }
}
