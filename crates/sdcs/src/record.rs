//! Command record framing: `opcode:u16, flags:u16, payload_length:u32`
//! followed by the payload and 0–7 pad bytes to an 8-byte boundary
//! (spec.md §3, §4.1).

pub const RECORD_HEADER_BYTES: usize = 8;

/// Number of pad bytes needed after a record of total (header+payload) size
/// `len` so the cumulative chunk-payload offset stays 8-byte aligned.
pub const fn pad_len(len: usize) -> usize {
    (8 - (len % 8)) % 8
}

pub struct RecordHeader {
    pub opcode: u16,
    pub flags: u16,
    pub payload_length: u32,
}

impl RecordHeader {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.opcode.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.payload_length.to_le_bytes());
    }

    pub fn read_from(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_HEADER_BYTES {
            return None;
        }
        Some(Self {
            opcode: u16::from_le_bytes(bytes[0..2].try_into().ok()?),
            flags: u16::from_le_bytes(bytes[2..4].try_into().ok()?),
            payload_length: u32::from_le_bytes(bytes[4..8].try_into().ok()?),
        })
    }
}

/// Append a complete record (header + payload + padding) to `out`.
pub fn write_record(out: &mut Vec<u8>, opcode: u16, payload: &[u8]) {
    let header = RecordHeader {
        opcode,
        flags: 0,
        payload_length: payload.len() as u32,
    };
    header.write_to(out);
    out.extend_from_slice(payload);
    let total = RECORD_HEADER_BYTES + payload.len();
    out.extend(std::iter::repeat_n(0u8, pad_len(total)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_len_covers_all_residues() {
        for total in 0..24 {
            assert_eq!((total + pad_len(total)) % 8, 0);
        }
    }

    #[test]
    fn write_record_is_8_byte_aligned() {
        let mut out = Vec::new();
        write_record(&mut out, 0x0001, &[]);
        assert_eq!(out.len() % 8, 0);
        write_record(&mut out, 0x0003, &[1, 2, 3]);
        assert_eq!(out.len() % 8, 0);
    }
}
