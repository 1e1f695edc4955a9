//! Command record opcodes and their fixed payload sizes.
//!
//! Every opcode below is fixed-width except `SET_CLIP_RECTS` and `STROKE_PATH`,
//! which are self-describing (a leading count field followed by that many
//! fixed-size elements). `fixed_payload_len` returns `None` for those two.

/// A command record opcode (spec.md §4.1 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Reset = 0x0001,
    SetClipRects = 0x0002,
    ClearClip = 0x0003,
    SetBlend = 0x0004,
    SetTransform2D = 0x0005,
    ResetTransform = 0x0006,
    SetAntialias = 0x0007,
    FillRect = 0x0010,
    StrokeRect = 0x0011,
    StrokeLine = 0x0012,
    SetStrokeJoin = 0x0013,
    SetStrokeCap = 0x0014,
    SetMiterLimit = 0x0015,
    StrokeQuadBezier = 0x0016,
    StrokeCubicBezier = 0x0017,
    StrokePath = 0x0018,
    BlitImage = 0x0020,
    DrawGlyphRun = 0x0030,
    End = 0x00F0,
}

impl Opcode {
    /// Map a raw `u16` to a known opcode, or `None` for `UnsupportedOpcode`.
    pub fn from_u16(raw: u16) -> Option<Self> {
        Some(match raw {
            0x0001 => Self::Reset,
            0x0002 => Self::SetClipRects,
            0x0003 => Self::ClearClip,
            0x0004 => Self::SetBlend,
            0x0005 => Self::SetTransform2D,
            0x0006 => Self::ResetTransform,
            0x0007 => Self::SetAntialias,
            0x0010 => Self::FillRect,
            0x0011 => Self::StrokeRect,
            0x0012 => Self::StrokeLine,
            0x0013 => Self::SetStrokeJoin,
            0x0014 => Self::SetStrokeCap,
            0x0015 => Self::SetMiterLimit,
            0x0016 => Self::StrokeQuadBezier,
            0x0017 => Self::StrokeCubicBezier,
            0x0018 => Self::StrokePath,
            0x0020 => Self::BlitImage,
            0x0030 => Self::DrawGlyphRun,
            0x00F0 => Self::End,
            _ => return None,
        })
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Reset => "RESET",
            Self::SetClipRects => "SET_CLIP_RECTS",
            Self::ClearClip => "CLEAR_CLIP",
            Self::SetBlend => "SET_BLEND",
            Self::SetTransform2D => "SET_TRANSFORM_2D",
            Self::ResetTransform => "RESET_TRANSFORM",
            Self::SetAntialias => "SET_ANTIALIAS",
            Self::FillRect => "FILL_RECT",
            Self::StrokeRect => "STROKE_RECT",
            Self::StrokeLine => "STROKE_LINE",
            Self::SetStrokeJoin => "SET_STROKE_JOIN",
            Self::SetStrokeCap => "SET_STROKE_CAP",
            Self::SetMiterLimit => "SET_MITER_LIMIT",
            Self::StrokeQuadBezier => "STROKE_QUAD_BEZIER",
            Self::StrokeCubicBezier => "STROKE_CUBIC_BEZIER",
            Self::StrokePath => "STROKE_PATH",
            Self::BlitImage => "BLIT_IMAGE",
            Self::DrawGlyphRun => "DRAW_GLYPH_RUN",
            Self::End => "END",
        }
    }

    /// Fixed payload length in bytes, or `None` when self-describing.
    pub fn fixed_payload_len(self) -> Option<u32> {
        const F32: u32 = 4;
        Some(match self {
            Self::Reset | Self::ClearClip | Self::ResetTransform | Self::End => 0,
            Self::SetBlend | Self::SetAntialias => 4,
            Self::SetTransform2D => 6 * F32,
            Self::SetStrokeJoin | Self::SetStrokeCap => 4,
            Self::SetMiterLimit => F32,
            Self::FillRect => 8 * F32,
            Self::StrokeRect | Self::StrokeLine => 9 * F32,
            Self::StrokeQuadBezier => 11 * F32,
            Self::StrokeCubicBezier => 13 * F32,
            Self::SetClipRects | Self::StrokePath | Self::BlitImage | Self::DrawGlyphRun => {
                return None;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_opcode() {
        let all = [
            Opcode::Reset,
            Opcode::SetClipRects,
            Opcode::ClearClip,
            Opcode::SetBlend,
            Opcode::SetTransform2D,
            Opcode::ResetTransform,
            Opcode::SetAntialias,
            Opcode::FillRect,
            Opcode::StrokeRect,
            Opcode::StrokeLine,
            Opcode::SetStrokeJoin,
            Opcode::SetStrokeCap,
            Opcode::SetMiterLimit,
            Opcode::StrokeQuadBezier,
            Opcode::StrokeCubicBezier,
            Opcode::StrokePath,
            Opcode::BlitImage,
            Opcode::DrawGlyphRun,
            Opcode::End,
        ];
        for op in all {
            assert_eq!(Opcode::from_u16(op.as_u16()), Some(op));
        }
    }

    #[test]
    fn unknown_opcode_rejected() {
        assert_eq!(Opcode::from_u16(0x9999), None);
    }

    #[test]
    fn self_describing_opcodes_have_no_fixed_len() {
        assert_eq!(Opcode::SetClipRects.fixed_payload_len(), None);
        assert_eq!(Opcode::StrokePath.fixed_payload_len(), None);
        assert_eq!(Opcode::BlitImage.fixed_payload_len(), None);
        assert_eq!(Opcode::DrawGlyphRun.fixed_payload_len(), None);
    }
}
