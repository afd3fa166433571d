//! Unmark is the editing core of a watermark-removal tool.
//!
//! A user loads an image, paints over the watermark with a brush, and submits the image together
//! with a binary mask to an inpainting backend. The public API is session-oriented:
//!
//! - Create an [`EditorSession`] for a viewport
//! - Load an image and feed it pointer input
//! - Submit via [`process`] (or [`EditorSession::begin_submission`] plus a [`ProcessingClient`])
//! - Read the outcome from the session's [`ResultPresenter`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod canvas;
pub(crate) mod client;
/// Editor configuration and its environment overrides.
pub mod config;
pub(crate) mod present;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{Affine, BezPath, Point, Rgba8, Vec2, Viewport};
pub use crate::foundation::error::{ErrorKind, UnmarkError, UnmarkResult};

pub use crate::assets::decode::{SourceImage, decode_source_image};
pub use crate::canvas::geometry::CanvasGeometry;
pub use crate::canvas::stroke::{Brush, Stroke, StrokeId, StrokeLayer};
pub use crate::canvas::surface::ScaledCanvasSurface;
pub use crate::client::processing::{PROCESS_IMAGE_PATH, ProcessingClient, ProcessingResult};
pub use crate::config::{EditorConfig, MaskResolution, ViewportUsage};
pub use crate::present::result::{DisplayHandle, ResultPresenter};
pub use crate::render::backend::{FrameRGBA, MaskImage};
pub use crate::render::mask::{extract_mask, render_mask};
pub use crate::session::editor::{
    EditorSession, LoadTicket, Notice, Outcome, Submission, SubmissionTicket, process,
};
