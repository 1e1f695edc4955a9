//! Append-only SDCS command-stream encoder (spec.md §4.1).
//!
//! Each public method appends exactly one record: an 8-byte header followed
//! by a fixed or self-describing payload, padded to an 8-byte boundary. The
//! encoder never panics on malformed caller input; it returns
//! `Err(EncodeError::InvalidArgument)` instead.

use crate::error::EncodeError;
use crate::header::{CHUNK_HEADER_BYTES, FILE_HEADER_BYTES, FileHeader, chunk_type};
use crate::opcode::Opcode;
use crate::record::write_record;
use crate::types::{BlendMode, Color, GlyphInstance, Point, Rect, StrokeCap, StrokeJoin};

const MAX_PATH_POINTS: usize = 65535;

/// Builds a single `CMDS` chunk's worth of command records.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all recorded commands and start over.
    pub fn reset_buffer(&mut self) {
        self.buf.clear();
    }

    pub fn reset(&mut self) {
        write_record(&mut self.buf, Opcode::Reset.as_u16(), &[]);
    }

    pub fn set_clip_rects(&mut self, rects: &[Rect]) {
        let mut payload = Vec::with_capacity(4 + rects.len() * 16);
        payload.extend_from_slice(&(rects.len() as u32).to_le_bytes());
        for r in rects {
            payload.extend_from_slice(&r.x.to_le_bytes());
            payload.extend_from_slice(&r.y.to_le_bytes());
            payload.extend_from_slice(&r.w.to_le_bytes());
            payload.extend_from_slice(&r.h.to_le_bytes());
        }
        write_record(&mut self.buf, Opcode::SetClipRects.as_u16(), &payload);
    }

    pub fn clear_clip(&mut self) {
        write_record(&mut self.buf, Opcode::ClearClip.as_u16(), &[]);
    }

    pub fn set_blend(&mut self, mode: BlendMode) {
        let payload = (mode as u32).to_le_bytes();
        write_record(&mut self.buf, Opcode::SetBlend.as_u16(), &payload);
    }

    pub fn set_antialias(&mut self, on: bool) {
        let payload = (on as u32).to_le_bytes();
        write_record(&mut self.buf, Opcode::SetAntialias.as_u16(), &payload);
    }

    pub fn set_transform(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        let mut payload = Vec::with_capacity(24);
        for v in [a, b, c, d, e, f] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        write_record(&mut self.buf, Opcode::SetTransform2D.as_u16(), &payload);
    }

    pub fn reset_transform(&mut self) {
        write_record(&mut self.buf, Opcode::ResetTransform.as_u16(), &[]);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let payload = rect_color_payload(rect, color);
        write_record(&mut self.buf, Opcode::FillRect.as_u16(), &payload);
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Color, stroke_width: f32) -> Result<(), EncodeError> {
        require_positive_width(stroke_width)?;
        let mut payload = rect_color_payload(rect, color);
        payload.extend_from_slice(&stroke_width.to_le_bytes());
        write_record(&mut self.buf, Opcode::StrokeRect.as_u16(), &payload);
        Ok(())
    }

    pub fn stroke_line(&mut self, p0: Point, p1: Point, color: Color, stroke_width: f32) -> Result<(), EncodeError> {
        require_positive_width(stroke_width)?;
        let mut payload = Vec::with_capacity(36);
        push_point(&mut payload, p0);
        push_point(&mut payload, p1);
        push_color(&mut payload, color);
        payload.extend_from_slice(&stroke_width.to_le_bytes());
        write_record(&mut self.buf, Opcode::StrokeLine.as_u16(), &payload);
        Ok(())
    }

    pub fn set_stroke_join(&mut self, join: StrokeJoin) {
        let payload = (join as u32).to_le_bytes();
        write_record(&mut self.buf, Opcode::SetStrokeJoin.as_u16(), &payload);
    }

    pub fn set_stroke_cap(&mut self, cap: StrokeCap) {
        let payload = (cap as u32).to_le_bytes();
        write_record(&mut self.buf, Opcode::SetStrokeCap.as_u16(), &payload);
    }

    pub fn set_miter_limit(&mut self, limit: f32) {
        write_record(&mut self.buf, Opcode::SetMiterLimit.as_u16(), &limit.to_le_bytes());
    }

    pub fn stroke_quad_bezier(
        &mut self,
        p0: Point,
        control: Point,
        p1: Point,
        color: Color,
        stroke_width: f32,
    ) -> Result<(), EncodeError> {
        require_positive_width(stroke_width)?;
        let mut payload = Vec::with_capacity(44);
        push_point(&mut payload, p0);
        push_point(&mut payload, control);
        push_point(&mut payload, p1);
        push_color(&mut payload, color);
        payload.extend_from_slice(&stroke_width.to_le_bytes());
        write_record(&mut self.buf, Opcode::StrokeQuadBezier.as_u16(), &payload);
        Ok(())
    }

    pub fn stroke_cubic_bezier(
        &mut self,
        p0: Point,
        c0: Point,
        c1: Point,
        p1: Point,
        color: Color,
        stroke_width: f32,
    ) -> Result<(), EncodeError> {
        require_positive_width(stroke_width)?;
        let mut payload = Vec::with_capacity(52);
        push_point(&mut payload, p0);
        push_point(&mut payload, c0);
        push_point(&mut payload, c1);
        push_point(&mut payload, p1);
        push_color(&mut payload, color);
        payload.extend_from_slice(&stroke_width.to_le_bytes());
        write_record(&mut self.buf, Opcode::StrokeCubicBezier.as_u16(), &payload);
        Ok(())
    }

    /// `points` must contain between 2 and 65535 entries inclusive (spec.md §8
    /// boundary tests).
    pub fn stroke_path(
        &mut self,
        stroke_width: f32,
        color: Color,
        points: &[Point],
    ) -> Result<(), EncodeError> {
        require_positive_width(stroke_width)?;
        if points.len() < 2 {
            return Err(EncodeError::InvalidArgument("stroke_path requires at least 2 points"));
        }
        if points.len() > MAX_PATH_POINTS {
            return Err(EncodeError::InvalidArgument("stroke_path exceeds 65535 points"));
        }
        let mut payload = Vec::with_capacity(20 + points.len() * 8);
        payload.extend_from_slice(&stroke_width.to_le_bytes());
        push_color(&mut payload, color);
        payload.extend_from_slice(&(points.len() as u32).to_le_bytes());
        for p in points {
            push_point(&mut payload, *p);
        }
        write_record(&mut self.buf, Opcode::StrokePath.as_u16(), &payload);
        Ok(())
    }

    /// `rgba` must be exactly `w * h * 4` bytes (spec.md §4.1 "Contracts").
    pub fn blit_image(&mut self, dst_x: f32, dst_y: f32, w: u32, h: u32, rgba: &[u8]) -> Result<(), EncodeError> {
        let expected = (w as u64) * (h as u64) * 4;
        if rgba.len() as u64 != expected {
            return Err(EncodeError::InvalidArgument("image byte length does not match w*h*4"));
        }
        let mut payload = Vec::with_capacity(16 + rgba.len());
        payload.extend_from_slice(&dst_x.to_le_bytes());
        payload.extend_from_slice(&dst_y.to_le_bytes());
        payload.extend_from_slice(&w.to_le_bytes());
        payload.extend_from_slice(&h.to_le_bytes());
        payload.extend_from_slice(rgba);
        write_record(&mut self.buf, Opcode::BlitImage.as_u16(), &payload);
        Ok(())
    }

    /// `glyphs` must be non-empty; `atlas_w` must equal `atlas_cols * cell_w`
    /// (spec.md §4.1: "inconsistent atlas dimensions" is rejected).
    #[allow(clippy::too_many_arguments)]
    pub fn draw_glyph_run(
        &mut self,
        base_x: f32,
        base_y: f32,
        color: Color,
        cell_w: u32,
        cell_h: u32,
        atlas_cols: u32,
        atlas_w: u32,
        atlas_h: u32,
        glyphs: &[GlyphInstance],
        alpha_atlas: &[u8],
    ) -> Result<(), EncodeError> {
        if glyphs.is_empty() {
            return Err(EncodeError::InvalidArgument("glyph run requires at least one glyph"));
        }
        if cell_w == 0 || cell_h == 0 || atlas_cols == 0 || atlas_w == 0 || atlas_h == 0 {
            return Err(EncodeError::InvalidArgument("glyph run has a zero atlas dimension"));
        }
        if atlas_w != atlas_cols * cell_w {
            return Err(EncodeError::InvalidArgument("inconsistent glyph atlas dimensions"));
        }
        let expected_alpha = (atlas_w as u64) * (atlas_h as u64);
        if alpha_atlas.len() as u64 != expected_alpha {
            return Err(EncodeError::InvalidArgument("glyph atlas alpha buffer size mismatch"));
        }
        let mut payload = Vec::with_capacity(44 + glyphs.len() * 12 + alpha_atlas.len());
        payload.extend_from_slice(&base_x.to_le_bytes());
        payload.extend_from_slice(&base_y.to_le_bytes());
        push_color(&mut payload, color);
        payload.extend_from_slice(&cell_w.to_le_bytes());
        payload.extend_from_slice(&cell_h.to_le_bytes());
        payload.extend_from_slice(&atlas_cols.to_le_bytes());
        payload.extend_from_slice(&atlas_w.to_le_bytes());
        payload.extend_from_slice(&atlas_h.to_le_bytes());
        payload.extend_from_slice(&(glyphs.len() as u32).to_le_bytes());
        for g in glyphs {
            payload.extend_from_slice(&g.atlas_index.to_le_bytes());
            payload.extend_from_slice(&g.dx.to_le_bytes());
            payload.extend_from_slice(&g.dy.to_le_bytes());
        }
        payload.extend_from_slice(alpha_atlas);
        write_record(&mut self.buf, Opcode::DrawGlyphRun.as_u16(), &payload);
        Ok(())
    }

    pub fn end(&mut self) {
        write_record(&mut self.buf, Opcode::End.as_u16(), &[]);
    }

    /// Take ownership of the assembled `CMDS` chunk payload bytes.
    pub fn finish_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Wrap the assembled bytes in a 64-byte container header and a single
    /// `CMDS` chunk, writing the result to `path`. Chunk byte totals are
    /// computed on a second pass once the payload length is known (spec.md
    /// §4.1).
    pub fn write_to_file(self, path: &std::path::Path) -> std::io::Result<()> {
        let bytes = self.to_container_bytes();
        std::fs::write(path, bytes)
    }

    /// Same framing as [`Self::write_to_file`] but returned in memory.
    pub fn to_container_bytes(&self) -> Vec<u8> {
        let payload_bytes = self.buf.len() as u64;
        let stream_bytes = FILE_HEADER_BYTES as u64 + CHUNK_HEADER_BYTES as u64 + payload_bytes;
        let header = FileHeader::new(1, stream_bytes);
        let chunk = crate::header::ChunkHeader {
            chunk_type: chunk_type::CMDS,
            flags: 0,
            offset: FILE_HEADER_BYTES as u64,
            bytes: CHUNK_HEADER_BYTES as u64 + payload_bytes,
            payload_bytes,
        };
        let mut out = Vec::with_capacity(stream_bytes as usize);
        header.write_to(&mut out);
        chunk.write_to(&mut out);
        out.extend_from_slice(&self.buf);
        out
    }
}

fn require_positive_width(stroke_width: f32) -> Result<(), EncodeError> {
    if stroke_width <= 0.0 {
        return Err(EncodeError::InvalidArgument("stroke_width must be > 0"));
    }
    Ok(())
}

fn rect_color_payload(rect: Rect, color: Color) -> Vec<u8> {
    let mut payload = Vec::with_capacity(32);
    payload.extend_from_slice(&rect.x.to_le_bytes());
    payload.extend_from_slice(&rect.y.to_le_bytes());
    payload.extend_from_slice(&rect.w.to_le_bytes());
    payload.extend_from_slice(&rect.h.to_le_bytes());
    push_color(&mut payload, color);
    payload
}

fn push_point(out: &mut Vec<u8>, p: Point) {
    out.extend_from_slice(&p.x.to_le_bytes());
    out.extend_from_slice(&p.y.to_le_bytes());
}

fn push_color(out: &mut Vec<u8>, c: Color) {
    out.extend_from_slice(&c.r.to_le_bytes());
    out.extend_from_slice(&c.g.to_le_bytes());
    out.extend_from_slice(&c.b.to_le_bytes());
    out.extend_from_slice(&c.a.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;

    fn white() -> Color {
        Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 }
    }

    #[test]
    fn fill_rect_then_end_round_trips_and_validates() {
        let mut enc = Encoder::new();
        enc.reset();
        enc.fill_rect(Rect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 }, white());
        enc.end();
        let bytes = enc.to_container_bytes();
        assert_eq!(bytes.len() % 8, 0);
        validate(&bytes).expect("stream should validate");
    }

    #[test]
    fn stroke_width_zero_rejected() {
        let mut enc = Encoder::new();
        let err = enc
            .stroke_line(
                Point { x: 0.0, y: 0.0 },
                Point { x: 1.0, y: 1.0 },
                white(),
                0.0,
            )
            .unwrap_err();
        assert_eq!(err, EncodeError::InvalidArgument("stroke_width must be > 0"));
    }

    #[test]
    fn stroke_path_boundaries() {
        let mut enc = Encoder::new();
        assert!(enc.stroke_path(1.0, white(), &[Point { x: 0.0, y: 0.0 }]).is_err());
        let two = [Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }];
        assert!(enc.stroke_path(1.0, white(), &two).is_ok());
        let too_many = vec![Point { x: 0.0, y: 0.0 }; MAX_PATH_POINTS + 1];
        let mut enc2 = Encoder::new();
        assert!(enc2.stroke_path(1.0, white(), &too_many).is_err());
        let mut enc3 = Encoder::new();
        let max = vec![Point { x: 0.0, y: 0.0 }; MAX_PATH_POINTS];
        assert!(enc3.stroke_path(1.0, white(), &max).is_ok());
    }

    #[test]
    fn blit_image_length_mismatch_rejected() {
        let mut enc = Encoder::new();
        assert!(enc.blit_image(0.0, 0.0, 2, 2, &[0u8; 15]).is_err());
        assert!(enc.blit_image(0.0, 0.0, 2, 2, &[0u8; 16]).is_ok());
    }

    #[test]
    fn glyph_run_requires_consistent_atlas() {
        let mut enc = Encoder::new();
        let glyphs = [GlyphInstance { atlas_index: 0, dx: 0.0, dy: 0.0 }];
        // atlas_w should be atlas_cols * cell_w = 2*8 = 16, not 15.
        let alpha = vec![0u8; 16 * 16];
        assert!(enc
            .draw_glyph_run(0.0, 0.0, white(), 8, 16, 2, 15, 16, &glyphs, &alpha)
            .is_err());
        assert!(enc
            .draw_glyph_run(0.0, 0.0, white(), 8, 16, 2, 16, 16, &glyphs, &alpha)
            .is_ok());
        let mut enc2 = Encoder::new();
        assert!(enc2
            .draw_glyph_run(0.0, 0.0, white(), 8, 16, 2, 16, 16, &[], &alpha)
            .is_err());
    }
}
