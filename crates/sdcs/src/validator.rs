//! Structural SDCS validator (spec.md §4.2). Walks the container and every
//! record without executing them.

use crate::error::ValidationError;
use crate::header::{CHUNK_HEADER_BYTES, FILE_HEADER_BYTES, ChunkHeader, FileHeader, align8, chunk_type};
use crate::opcode::Opcode;
use crate::record::{RECORD_HEADER_BYTES, RecordHeader, pad_len};

/// Implementation version this validator accepts (spec.md §4.2 rule 1).
const IMPL_VERSION_MAJOR: u16 = crate::header::VERSION_MAJOR;
const IMPL_VERSION_MINOR: u16 = crate::header::VERSION_MINOR;

/// Validate a complete SDCS container (file header + chunk directory +
/// command records) per the five rules in spec.md §4.2.
pub fn validate(bytes: &[u8]) -> Result<(), ValidationError> {
    let header = FileHeader::read_from(bytes).ok_or(ValidationError::Protocol {
        offset: 0,
        message: "truncated file header",
    })?;
    if !header.magic_ok() {
        return Err(ValidationError::Protocol {
            offset: 0,
            message: "bad magic",
        });
    }
    if header.version_major != IMPL_VERSION_MAJOR {
        return Err(ValidationError::VersionUnsupported {
            major: header.version_major,
            minor: header.version_minor,
        });
    }
    if header.version_minor > IMPL_VERSION_MINOR {
        return Err(ValidationError::VersionUnsupported {
            major: header.version_major,
            minor: header.version_minor,
        });
    }

    let mut offset = FILE_HEADER_BYTES as u64;
    let mut saw_terminated_cmds_chunk = false;

    for _ in 0..header.chunk_count {
        if offset + CHUNK_HEADER_BYTES as u64 > bytes.len() as u64 {
            return Err(ValidationError::Protocol {
                offset,
                message: "chunk header runs past end of file",
            });
        }
        let chunk_bytes = &bytes[offset as usize..offset as usize + CHUNK_HEADER_BYTES];
        let chunk = ChunkHeader::read_from(chunk_bytes).ok_or(ValidationError::Protocol {
            offset,
            message: "malformed chunk header",
        })?;

        let payload_start = offset + CHUNK_HEADER_BYTES as u64;
        if payload_start + chunk.payload_bytes > bytes.len() as u64 {
            return Err(ValidationError::Protocol {
                offset,
                message: "chunk payload runs past end of file",
            });
        }
        let payload = &bytes[payload_start as usize..(payload_start + chunk.payload_bytes) as usize];

        if chunk.chunk_type == chunk_type::CMDS {
            let ended = walk_command_chunk(payload, payload_start)?;
            if ended {
                saw_terminated_cmds_chunk = true;
            }
        }

        // Safe skip span (spec.md §9): tolerate writers that stored the total
        // chunk span or the payload span (or zero) in `bytes`.
        let legacy_span = if chunk.bytes >= CHUNK_HEADER_BYTES as u64 {
            chunk.bytes - CHUNK_HEADER_BYTES as u64
        } else {
            align8(chunk.bytes)
        };
        let skip_span = align8(chunk.payload_bytes).max(legacy_span);
        offset = payload_start + skip_span;
    }

    if !saw_terminated_cmds_chunk {
        return Err(ValidationError::Protocol {
            offset,
            message: "no command chunk terminated with END",
        });
    }
    Ok(())
}

/// Walk one `CMDS` chunk's records. Returns `Ok(true)` if the chunk's record
/// sequence terminates with `END` and no unexplained bytes follow it.
fn walk_command_chunk(payload: &[u8], base_offset: u64) -> Result<bool, ValidationError> {
    let mut cursor = 0usize;
    let mut last_was_end = false;

    while cursor < payload.len() {
        let record_offset = base_offset + cursor as u64;
        if cursor + RECORD_HEADER_BYTES > payload.len() {
            return Err(ValidationError::Protocol {
                offset: record_offset,
                message: "truncated record header",
            });
        }
        let header = RecordHeader::read_from(&payload[cursor..]).ok_or(ValidationError::Protocol {
            offset: record_offset,
            message: "malformed record header",
        })?;
        let opcode = Opcode::from_u16(header.opcode).ok_or(ValidationError::UnsupportedOpcode {
            offset: record_offset,
            opcode: header.opcode,
        })?;

        let payload_len = header.payload_length as usize;
        let body_start = cursor + RECORD_HEADER_BYTES;
        let body_end = body_start
            .checked_add(payload_len)
            .ok_or(ValidationError::Protocol { offset: record_offset, message: "payload length overflow" })?;
        if body_end > payload.len() {
            return Err(ValidationError::Protocol {
                offset: record_offset,
                message: "record payload runs past chunk end",
            });
        }
        let body = &payload[body_start..body_end];

        check_payload_size(opcode, body, record_offset)?;
        check_geometry(opcode, body, record_offset)?;

        let total = RECORD_HEADER_BYTES + payload_len;
        let advance = total + pad_len(total);
        if cursor + advance > payload.len() {
            return Err(ValidationError::Protocol {
                offset: record_offset,
                message: "record padding runs past chunk end",
            });
        }
        cursor += advance;
        last_was_end = opcode == Opcode::End;
        if last_was_end {
            break;
        }
    }

    if last_was_end {
        // Anything left over must be inert (zero) trailing bytes; any
        // non-zero byte after END fails validation (spec.md §8).
        if payload[cursor..].iter().any(|b| *b != 0) {
            return Err(ValidationError::Protocol {
                offset: base_offset + cursor as u64,
                message: "non-zero bytes follow END",
            });
        }
        Ok(true)
    } else {
        Ok(false)
    }
}

fn check_payload_size(opcode: Opcode, body: &[u8], offset: u64) -> Result<(), ValidationError> {
    let actual = body.len() as u64;
    match opcode.fixed_payload_len() {
        Some(expected) => {
            if actual != expected as u64 {
                return Err(ValidationError::SizeMismatch {
                    offset,
                    opcode: opcode.as_u16(),
                    opcode_name: opcode.name(),
                    expected: expected as u64,
                    actual,
                    message: "fixed-size opcode payload length mismatch",
                });
            }
            Ok(())
        }
        None => check_self_describing_size(opcode, body, offset),
    }
}

fn check_self_describing_size(opcode: Opcode, body: &[u8], offset: u64) -> Result<(), ValidationError> {
    let fail = |expected, actual| ValidationError::SizeMismatch {
        offset,
        opcode: opcode.as_u16(),
        opcode_name: opcode.name(),
        expected,
        actual,
        message: "self-describing opcode payload length mismatch",
    };
    match opcode {
        Opcode::SetClipRects => {
            let len = body.len() as u64;
            if len < 4 || (len - 4) % 16 != 0 {
                return Err(fail(len.max(4), len));
            }
            let count = u32::from_le_bytes(body[0..4].try_into().unwrap()) as u64;
            let expected = 4 + count * 16;
            if expected != len {
                return Err(fail(expected, len));
            }
            Ok(())
        }
        Opcode::StrokePath => {
            let len = body.len() as u64;
            if len < 24 {
                return Err(fail(24, len));
            }
            let n = u32::from_le_bytes(body[20..24].try_into().unwrap()) as u64;
            let expected = 24 + n * 8;
            if expected != len {
                return Err(fail(expected, len));
            }
            Ok(())
        }
        Opcode::BlitImage => {
            let len = body.len() as u64;
            if len < 16 {
                return Err(fail(16, len));
            }
            let w = u32::from_le_bytes(body[8..12].try_into().unwrap()) as u64;
            let h = u32::from_le_bytes(body[12..16].try_into().unwrap()) as u64;
            let expected = 16 + w * h * 4;
            if expected != len {
                return Err(fail(expected, len));
            }
            Ok(())
        }
        Opcode::DrawGlyphRun => {
            let len = body.len() as u64;
            if len < 48 {
                return Err(fail(48, len));
            }
            let atlas_w = u32::from_le_bytes(body[36..40].try_into().unwrap()) as u64;
            let atlas_h = u32::from_le_bytes(body[40..44].try_into().unwrap()) as u64;
            let n = u32::from_le_bytes(body[44..48].try_into().unwrap()) as u64;
            let expected = 48 + n * 12 + atlas_w * atlas_h;
            if expected != len {
                return Err(fail(expected, len));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn f32_at(body: &[u8], idx: usize) -> f32 {
    let start = idx * 4;
    f32::from_le_bytes(body[start..start + 4].try_into().unwrap())
}

fn is_finite_bits(v: f32) -> bool {
    // Bit-level test: exponent != all-ones (spec.md §3/§4.2).
    (v.to_bits() & 0x7F80_0000) != 0x7F80_0000
}

fn check_finite(opcode: Opcode, body: &[u8], offset: u64, float_count: usize) -> Result<(), ValidationError> {
    for i in 0..float_count {
        if !is_finite_bits(f32_at(body, i)) {
            return Err(ValidationError::InvalidScalar {
                offset,
                opcode: opcode.as_u16(),
                opcode_name: opcode.name(),
            });
        }
    }
    Ok(())
}

fn check_non_negative(opcode: Opcode, body: &[u8], offset: u64, indices: &[usize]) -> Result<(), ValidationError> {
    for &i in indices {
        if f32_at(body, i) < 0.0 {
            return Err(ValidationError::InvalidGeometry {
                offset,
                opcode: opcode.as_u16(),
                opcode_name: opcode.name(),
            });
        }
    }
    Ok(())
}

/// Check float finiteness and non-negative width/height constraints for
/// opcodes with geometric payloads (spec.md §3 invariants).
fn check_geometry(opcode: Opcode, body: &[u8], offset: u64) -> Result<(), ValidationError> {
    match opcode {
        Opcode::FillRect => {
            check_finite(opcode, body, offset, 8)?;
            check_non_negative(opcode, body, offset, &[2, 3])
        }
        Opcode::StrokeRect => {
            check_finite(opcode, body, offset, 9)?;
            check_non_negative(opcode, body, offset, &[2, 3])
        }
        Opcode::StrokeLine => check_finite(opcode, body, offset, 9),
        Opcode::SetTransform2D => check_finite(opcode, body, offset, 6),
        Opcode::SetMiterLimit => check_finite(opcode, body, offset, 1),
        Opcode::StrokeQuadBezier => check_finite(opcode, body, offset, 11),
        Opcode::StrokeCubicBezier => check_finite(opcode, body, offset, 13),
        Opcode::SetClipRects => {
            let count = (body.len() as u64 - 4) / 16;
            for r in 0..count {
                let rect_body = &body[4 + r as usize * 16..4 + (r as usize + 1) * 16];
                check_finite(opcode, rect_body, offset, 4)?;
                check_non_negative(opcode, rect_body, offset, &[2, 3])?;
            }
            Ok(())
        }
        Opcode::StrokePath => {
            // stroke_width, r, g, b, a = 5 floats, then n * (x, y).
            check_finite(opcode, body, offset, 5)?;
            let n = u32::from_le_bytes(body[20..24].try_into().unwrap()) as usize;
            let points = &body[24..];
            check_finite(opcode, points, offset, n * 2)
        }
        Opcode::BlitImage => {
            check_finite(opcode, &body[0..8], offset, 2)
        }
        Opcode::DrawGlyphRun => {
            // base_x, base_y, r, g, b, a = 6 floats up front.
            check_finite(opcode, body, offset, 6)?;
            let n = u32::from_le_bytes(body[44..48].try_into().unwrap()) as usize;
            for i in 0..n {
                let glyph = &body[48 + i * 12..48 + i * 12 + 12];
                if !is_finite_bits(f32_at(glyph, 1)) || !is_finite_bits(f32_at(glyph, 2)) {
                    return Err(ValidationError::InvalidScalar { offset, opcode: opcode.as_u16(), opcode_name: opcode.name() });
                }
            }
            Ok(())
        }
        Opcode::Reset
        | Opcode::ClearClip
        | Opcode::ResetTransform
        | Opcode::SetAntialias
        | Opcode::SetBlend
        | Opcode::SetStrokeJoin
        | Opcode::SetStrokeCap
        | Opcode::End => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::types::{Color, Point, Rect};

    fn white() -> Color {
        Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
    }

    #[test]
    fn trailing_nonzero_byte_after_end_fails() {
        let mut enc = Encoder::new();
        enc.reset();
        enc.end();
        let mut bytes = enc.to_container_bytes();
        bytes.push(1); // append beyond declared payload span
        // Fix up payload_bytes/stream_bytes so the extra byte is inside the chunk.
        let payload_bytes_offset = FILE_HEADER_BYTES + 24;
        let new_payload_len = (bytes.len() - FILE_HEADER_BYTES - CHUNK_HEADER_BYTES) as u64;
        bytes[payload_bytes_offset..payload_bytes_offset + 8].copy_from_slice(&new_payload_len.to_le_bytes());
        let err = validate(&bytes).unwrap_err();
        assert!(matches!(err, ValidationError::Protocol { .. }));
    }

    #[test]
    fn zero_bytes_field_with_correct_payload_bytes_validates() {
        let mut enc = Encoder::new();
        enc.reset();
        enc.end();
        let mut bytes = enc.to_container_bytes();
        // Zero out the chunk's `bytes` field; `payload_bytes` still correct.
        let bytes_field_offset = FILE_HEADER_BYTES + 16;
        bytes[bytes_field_offset..bytes_field_offset + 8].copy_from_slice(&0u64.to_le_bytes());
        validate(&bytes).expect("zero bytes field should still validate via payload_bytes");
    }

    #[test]
    fn fill_rect_negative_zero_width_ok_negative_one_geometry_nan_scalar() {
        let rect_ok = Rect { x: 0.0, y: 0.0, w: -0.0, h: 1.0 };
        let mut enc = Encoder::new();
        enc.reset();
        enc.fill_rect(rect_ok, white());
        enc.end();
        validate(&enc.to_container_bytes()).expect("-0.0 width should validate");

        let mut enc2 = Encoder::new();
        enc2.reset();
        enc2.fill_rect(Rect { x: 0.0, y: 0.0, w: -1.0, h: 1.0 }, white());
        enc2.end();
        let err = validate(&enc2.to_container_bytes()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGeometry { .. }));

        let mut enc3 = Encoder::new();
        enc3.reset();
        enc3.fill_rect(Rect { x: 0.0, y: 0.0, w: f32::NAN, h: 1.0 }, white());
        enc3.end();
        let err3 = validate(&enc3.to_container_bytes()).unwrap_err();
        assert!(matches!(err3, ValidationError::InvalidScalar { .. }));
    }

    #[test]
    fn unsupported_opcode_rejected() {
        let mut enc = Encoder::new();
        enc.reset();
        let mut bytes = enc.to_container_bytes();
        // Splice in a record with an unknown opcode followed by END.
        let mut tail = Vec::new();
        tail.extend_from_slice(&0x7777u16.to_le_bytes());
        tail.extend_from_slice(&0u16.to_le_bytes());
        tail.extend_from_slice(&0u32.to_le_bytes());
        crate::record::write_record(&mut tail, Opcode::End.as_u16(), &[]);
        bytes.extend_from_slice(&tail);
        let payload_bytes_offset = FILE_HEADER_BYTES + 24;
        let new_payload_len = (bytes.len() - FILE_HEADER_BYTES - CHUNK_HEADER_BYTES) as u64;
        bytes[payload_bytes_offset..payload_bytes_offset + 8].copy_from_slice(&new_payload_len.to_le_bytes());
        let err = validate(&bytes).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedOpcode { .. }));
    }

    #[test]
    fn version_major_mismatch_rejected() {
        let mut enc = Encoder::new();
        enc.reset();
        enc.end();
        let mut bytes = enc.to_container_bytes();
        bytes[8..10].copy_from_slice(&99u16.to_le_bytes());
        let err = validate(&bytes).unwrap_err();
        assert!(matches!(err, ValidationError::VersionUnsupported { .. }));
    }

    #[test]
    fn stroke_path_two_points_validates() {
        let mut enc = Encoder::new();
        enc.reset();
        enc.stroke_path(1.0, white(), &[Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }])
            .unwrap();
        enc.end();
        validate(&enc.to_container_bytes()).expect("2-point path should validate");
    }
}
