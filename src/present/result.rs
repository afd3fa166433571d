use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::decode::probe_dimensions;
use crate::foundation::error::UnmarkResult;

/// Token for one displayed result. Only the most recent handle is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisplayHandle {
    id: u64,
    /// Result width in pixels.
    pub width: u32,
    /// Result height in pixels.
    pub height: u32,
}

#[derive(Debug)]
struct Shown {
    handle: DisplayHandle,
    bytes: Vec<u8>,
}

/// Holds the latest processed image for display and download.
///
/// At most one result is held; showing a new one releases the previous handle.
#[derive(Debug)]
pub struct ResultPresenter {
    download_name: String,
    current: Option<Shown>,
    next_id: u64,
}

impl ResultPresenter {
    /// Create an empty presenter offering `download_name` for saves.
    pub fn new(download_name: impl Into<String>) -> Self {
        Self {
            download_name: download_name.into(),
            current: None,
            next_id: 1,
        }
    }

    /// Display `bytes`, replacing and releasing any previous result.
    pub fn show(&mut self, bytes: Vec<u8>) -> UnmarkResult<DisplayHandle> {
        let (width, height) = probe_dimensions(&bytes)?;
        Ok(self.show_decoded(bytes, width, height))
    }

    /// Display bytes whose dimensions were established by an earlier decode.
    pub(crate) fn show_decoded(
        &mut self,
        bytes: Vec<u8>,
        width: u32,
        height: u32,
    ) -> DisplayHandle {
        let handle = DisplayHandle {
            id: self.next_id,
            width,
            height,
        };
        self.next_id += 1;
        if let Some(prev) = self.current.replace(Shown { handle, bytes }) {
            tracing::debug!(released = prev.handle.id, "previous result released");
        }
        handle
    }

    /// Drop the current result, if any.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Handle and bytes of the result on display.
    pub fn current(&self) -> Option<(DisplayHandle, &[u8])> {
        self.current.as_ref().map(|s| (s.handle, s.bytes.as_slice()))
    }

    /// Return `true` while `handle` is the result on display.
    pub fn is_live(&self, handle: DisplayHandle) -> bool {
        self.current.as_ref().is_some_and(|s| s.handle == handle)
    }

    /// Default file name for saving the result.
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Write the displayed bytes to `target`.
    ///
    /// A directory target receives [`ResultPresenter::download_name`]. Returns the written path, or
    /// `None` when nothing is on display.
    pub fn save_to(&self, target: impl AsRef<Path>) -> UnmarkResult<Option<PathBuf>> {
        let Some(shown) = self.current.as_ref() else {
            return Ok(None);
        };
        let target = target.as_ref();
        let path = if target.is_dir() {
            target.join(&self.download_name)
        } else {
            target.to_path_buf()
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(&path, &shown.bytes)
            .with_context(|| format!("write result '{}'", path.display()))?;
        Ok(Some(path))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/present/result.rs"]
mod tests;
