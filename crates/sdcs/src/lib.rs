//! SDCS: the binary command-stream format consumed by rasterization backends.
//!
//! This crate owns the container/record layout (spec.md §3, §6), the
//! append-only [`encoder::Encoder`], and the structural [`validator::validate`]
//! pass. It never executes a command stream — that is the concern of an
//! external rasterization backend driven through `semadraw-compositor`.

pub mod encoder;
pub mod error;
pub mod header;
pub mod opcode;
pub mod record;
pub mod types;
pub mod validator;

pub use encoder::Encoder;
pub use error::{EncodeError, ValidationError};
pub use opcode::Opcode;
pub use types::{BlendMode, Color, GlyphInstance, Point, Rect, StrokeCap, StrokeJoin};
pub use validator::validate;
