//! focalloop turns a set of photographs into a focal-point aligned loop.
//!
//! The engine is organised around one drawing contract shared by every output:
//!
//! - Keep photographs in an immutable, versioned [`ImageSet`]
//! - Align them so marked focal points coincide ([`align`])
//! - Play them back as a timed sequence with transitions and motion trails ([`PlaybackEngine`])
//! - Export the same frames offscreen as GIF, video or a PNG sequence ([`export`])
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod align;
pub mod assets;
pub mod composite;
pub mod config;
pub mod encode;
pub mod export;
pub mod foundation;
pub mod model;
pub mod playback;
pub mod render;
pub mod viewport;

pub use crate::foundation::core::{Affine, Canvas, FrameIndex, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{FocalError, FocalResult};

pub use crate::assets::{Raster, decode::decode_image};
pub use crate::config::animation::{AnimationConfig, TransitionKind, parse_transition};
pub use crate::config::engine::EngineConfig;
pub use crate::model::image::{ImageId, ImageRecord, Placement};
pub use crate::model::set::ImageSet;
pub use crate::viewport::camera::Viewport;
pub use crate::viewport::grid::{GridLines, grid_lines};

pub use crate::composite::draw::{DrawOptions, ImageDraw, image_draw};
pub use crate::composite::hit::{hit_test, screen_to_focal, world_bounds};
pub use crate::composite::plan::{FramePlan, canvas_plan};

pub use crate::align::solver::{AlignmentResult, align, solve_alignment};

pub use crate::playback::engine::{PlaybackEngine, PlaybackState};
pub use crate::playback::fit::fit_viewport;
pub use crate::playback::scheduler::PreviewLoop;

pub use crate::render::backend::{FrameRGBA, RenderBackend};
pub use crate::render::cpu::CpuBackend;

pub use crate::encode::ffmpeg::VideoEncoder;
pub use crate::encode::gif::AnimatedGifEncoder;
pub use crate::encode::sequence::FrameSequenceEncoder;
pub use crate::encode::sink::{EncodeDeadline, EncoderConfig, FrameEncoder, InMemoryEncoder};

pub use crate::export::control::{CancelToken, ExportHandle, spawn_export};
pub use crate::export::pipeline::{export, export_with_encoder, frame_delay_ms};
pub use crate::export::request::{Artifact, ExportFormat, ExportRequest};
