use std::cell::RefCell;

use crate::assets::decode::{SourceImage, decode_source_image};
use crate::canvas::geometry::CanvasGeometry;
use crate::canvas::stroke::StrokeId;
use crate::canvas::surface::ScaledCanvasSurface;
use crate::client::processing::{ProcessingClient, ProcessingResult};
use crate::config::EditorConfig;
use crate::foundation::core::{Point, Viewport};
use crate::foundation::error::{ErrorKind, UnmarkError, UnmarkResult};
use crate::present::result::{DisplayHandle, ResultPresenter};
use crate::render::backend::{FrameRGBA, MaskImage};
use crate::render::mask::extract_mask;

/// Whether an asynchronous result was applied to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The result belonged to the current session and took effect.
    Applied(T),
    /// The session changed while the work was in flight; the result was dropped.
    Discarded,
}

/// User-facing notification raised by a failed operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

/// Captures the session generation at the start of an image load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Captures the session generation at the start of a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmissionTicket {
    generation: u64,
}

/// Everything a submission sends, plus the ticket to hand back on completion.
#[derive(Clone, Debug)]
pub struct Submission {
    /// Generation check token for [`EditorSession::finish_submission`].
    pub ticket: SubmissionTicket,
    /// Original upload.
    pub source: SourceImage,
    /// Mask extracted from the strokes at submission time.
    pub mask: MaskImage,
}

/// One editing session: upload, strokes, submission state and the latest result.
///
/// Asynchronous work captures the generation when it starts and is applied only if the
/// generation is unchanged when it completes. Loading a new image or resetting bumps the
/// generation.
pub struct EditorSession {
    config: EditorConfig,
    viewport: Viewport,
    surface: Option<ScaledCanvasSurface>,
    presenter: ResultPresenter,
    generation: u64,
    busy: bool,
    notices: Vec<Notice>,
}

impl EditorSession {
    /// Create an empty session.
    pub fn new(config: EditorConfig, viewport: Viewport) -> UnmarkResult<Self> {
        viewport.validate()?;
        config.validate()?;
        let presenter = ResultPresenter::new(config.download_file_name.clone());
        Ok(Self {
            config,
            viewport,
            surface: None,
            presenter,
            generation: 0,
            busy: false,
            notices: Vec::new(),
        })
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Return `true` while a submission is in flight (submit control disabled).
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Editing surface, present once an image is loaded.
    pub fn surface(&self) -> Option<&ScaledCanvasSurface> {
        self.surface.as_ref()
    }

    /// Result presenter.
    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    /// Drain pending notifications, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Start loading a new image; anything still in flight becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.bump_generation();
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply a decoded image, unless the session moved on since `ticket` was issued.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        decoded: UnmarkResult<SourceImage>,
    ) -> UnmarkResult<Outcome<CanvasGeometry>> {
        if ticket.generation != self.generation {
            tracing::warn!(
                ticket = ticket.generation,
                current = self.generation,
                "stale image load discarded"
            );
            return Ok(Outcome::Discarded);
        }
        let image = decoded.map_err(|e| self.notify(e))?;

        let mut surface = ScaledCanvasSurface::initialize(self.viewport, self.config.clone())?;
        let geometry = surface.load_background(image).map_err(|e| self.notify(e))?;
        // Submissions of the old image started while this load was pending are now stale.
        self.bump_generation();
        if let Some(old) = self.surface.replace(surface) {
            old.dispose();
        }
        self.presenter.clear();
        Ok(Outcome::Applied(geometry))
    }

    /// Decode `bytes` and load them as the session image.
    pub fn load_image(
        &mut self,
        bytes: Vec<u8>,
        file_name: impl Into<String>,
    ) -> UnmarkResult<CanvasGeometry> {
        let ticket = self.begin_load();
        match self.finish_load(ticket, decode_source_image(bytes, file_name))? {
            Outcome::Applied(g) => Ok(g),
            Outcome::Discarded => Err(UnmarkError::validation("image load was superseded")),
        }
    }

    /// Drop the image, strokes and result; in-flight work becomes stale.
    pub fn reset(&mut self) {
        self.bump_generation();
        if let Some(surface) = self.surface.take() {
            surface.dispose();
        }
        self.presenter.clear();
    }

    /// Resize the editing area.
    ///
    /// On error neither the session nor the surface changes.
    pub fn set_viewport(&mut self, viewport: Viewport) -> UnmarkResult<Option<CanvasGeometry>> {
        viewport.validate()?;
        let geometry = match self.surface.as_mut() {
            Some(s) => s.set_viewport(viewport)?,
            None => None,
        };
        self.viewport = viewport;
        Ok(geometry)
    }

    /// Change the brush width for strokes drawn from now on.
    pub fn set_brush_width(&mut self, width: f64) -> UnmarkResult<()> {
        self.surface_mut()?.set_brush_width(width)
    }

    /// Forward a pointer press.
    pub fn pointer_down(&mut self, at: Point) -> UnmarkResult<()> {
        self.surface_mut()?.pointer_down(at)
    }

    /// Forward a pointer drag.
    pub fn pointer_move(&mut self, to: Point) -> UnmarkResult<()> {
        self.surface_mut()?.pointer_move(to)
    }

    /// Forward a pointer release.
    pub fn pointer_up(&mut self) -> UnmarkResult<Option<StrokeId>> {
        self.surface_mut()?.pointer_up()
    }

    /// Remove every stroke ("Clear Mask"); the image stays.
    pub fn clear_mask(&mut self) -> UnmarkResult<()> {
        self.surface_mut()?.clear_strokes();
        Ok(())
    }

    /// Render the editing view.
    pub fn render_preview(&mut self) -> UnmarkResult<FrameRGBA> {
        self.surface_mut()?.render_preview()
    }

    /// Extract the mask and mark the session busy.
    ///
    /// Fails without side effects when no image is loaded or a submission is already in flight.
    pub fn begin_submission(&mut self) -> UnmarkResult<Submission> {
        if self.busy {
            return Err(UnmarkError::validation("a submission is already in flight"));
        }
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| UnmarkError::validation("no image loaded"))?;
        let source = surface
            .background()
            .cloned()
            .ok_or_else(|| UnmarkError::validation("no image loaded"))?;
        let mask = extract_mask(surface).map_err(|e| self.notify(e))?;

        self.busy = true;
        tracing::debug!(generation = self.generation, "submission started");
        Ok(Submission {
            ticket: SubmissionTicket {
                generation: self.generation,
            },
            source,
            mask,
        })
    }

    /// Apply the outcome of a submission, unless the session moved on since it started.
    ///
    /// Failures re-enable submission and raise a notice; strokes are never touched.
    pub fn finish_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: UnmarkResult<ProcessingResult>,
    ) -> UnmarkResult<Outcome<DisplayHandle>> {
        if ticket.generation != self.generation {
            tracing::warn!(
                ticket = ticket.generation,
                current = self.generation,
                "stale submission result discarded"
            );
            return Ok(Outcome::Discarded);
        }
        self.busy = false;
        let processed = result.map_err(|e| self.notify(e))?;
        let handle = self
            .presenter
            .show_decoded(processed.bytes, processed.width, processed.height);
        Ok(Outcome::Applied(handle))
    }

    fn surface_mut(&mut self) -> UnmarkResult<&mut ScaledCanvasSurface> {
        self.surface
            .as_mut()
            .ok_or_else(|| UnmarkError::validation("no image loaded"))
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.busy = false;
        tracing::debug!(generation = self.generation, "session generation advanced");
    }

    fn notify(&mut self, err: UnmarkError) -> UnmarkError {
        tracing::warn!(error = %err, "operation failed");
        self.notices.push(Notice {
            kind: err.kind(),
            message: err.to_string(),
        });
        err
    }
}

/// Run one full submission round trip against `client`.
///
/// The session is borrowed only before and after the request, never across the await, so pointer
/// input and resets can interleave with a pending request.
pub async fn process(
    session: &RefCell<EditorSession>,
    client: &ProcessingClient,
) -> UnmarkResult<Outcome<DisplayHandle>> {
    let submission = session.borrow_mut().begin_submission()?;
    let result = client.submit(&submission.source, &submission.mask).await;
    session
        .borrow_mut()
        .finish_submission(submission.ticket, result)
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
