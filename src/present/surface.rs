use std::collections::VecDeque;

use crate::foundation::core::{Canvas, LogicalSize};
use crate::foundation::error::{StimError, StimResult};
use crate::render::backend::FrameRGBA;

/// Drawable output owned by an engine for its whole lifetime.
///
/// Lifecycle contract: `acquire` is called exactly once, before anything else, and a failure
/// aborts engine construction. `release` is called at most once; nothing is called after it.
pub trait Surface {
    /// Acquire graphics resources.
    fn acquire(&mut self) -> StimResult<()>;
    /// Current size of the display area in logical pixels.
    fn logical_size(&self) -> LogicalSize;
    /// Host-reported device pixel ratio (unclamped).
    fn device_pixel_ratio(&self) -> f64;
    /// Called when the device-pixel backing size changes.
    fn resize(&mut self, canvas: Canvas);
    /// Show a completed frame.
    fn present(&mut self, frame: &FrameRGBA) -> StimResult<()>;
    /// Release graphics resources.
    fn release(&mut self);
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn acquire(&mut self) -> StimResult<()> {
        (**self).acquire()
    }

    fn logical_size(&self) -> LogicalSize {
        (**self).logical_size()
    }

    fn device_pixel_ratio(&self) -> f64 {
        (**self).device_pixel_ratio()
    }

    fn resize(&mut self, canvas: Canvas) {
        (**self).resize(canvas)
    }

    fn present(&mut self, frame: &FrameRGBA) -> StimResult<()> {
        (**self).present(frame)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// In-memory surface for tests, headless runs, and debugging.
#[derive(Debug)]
pub struct CaptureSurface {
    logical: LogicalSize,
    dpr: f64,
    acquire_error: Option<String>,
    history_limit: Option<usize>,

    acquired: bool,
    released: bool,
    backing: Option<Canvas>,
    resizes: u64,
    presented: u64,
    /// Most recent frames, oldest first.
    pub(crate) frames: VecDeque<FrameRGBA>,
}

impl CaptureSurface {
    /// A surface of `logical` size at device pixel ratio `dpr`, keeping every presented frame.
    pub fn new(logical: LogicalSize, dpr: f64) -> Self {
        Self {
            logical,
            dpr,
            acquire_error: None,
            history_limit: None,
            acquired: false,
            released: false,
            backing: None,
            resizes: 0,
            presented: 0,
            frames: VecDeque::new(),
        }
    }

    /// Keep at most `limit` frames (older frames are dropped first).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Make `acquire` fail with `reason`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.acquire_error = Some(reason.into());
        self
    }

    /// Simulate the host resizing the display area.
    pub fn set_logical_size(&mut self, logical: LogicalSize) {
        self.logical = logical;
    }

    /// Simulate moving to a display with another pixel density.
    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.dpr = dpr;
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Current device-pixel backing size, once the first frame sized it.
    pub fn backing(&self) -> Option<Canvas> {
        self.backing
    }

    /// Number of backing-size changes seen.
    pub fn resize_count(&self) -> u64 {
        self.resizes
    }

    /// Total frames presented, including any dropped from history.
    pub fn presented_count(&self) -> u64 {
        self.presented
    }

    /// The last presented frame: what is currently visible.
    pub fn last_frame(&self) -> Option<&FrameRGBA> {
        self.frames.back()
    }

    /// Retained frames, oldest first.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = &FrameRGBA> {
        self.frames.iter()
    }
}

impl Surface for CaptureSurface {
    fn acquire(&mut self) -> StimResult<()> {
        if let Some(reason) = &self.acquire_error {
            return Err(StimError::surface(reason.clone()));
        }
        self.acquired = true;
        Ok(())
    }

    fn logical_size(&self) -> LogicalSize {
        self.logical
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    fn resize(&mut self, canvas: Canvas) {
        self.backing = Some(canvas);
        self.resizes += 1;
    }

    fn present(&mut self, frame: &FrameRGBA) -> StimResult<()> {
        if !self.acquired || self.released {
            return Err(StimError::surface("present on a surface that is not acquired"));
        }
        self.presented += 1;
        if self.history_limit == Some(0) {
            return Ok(());
        }
        if let Some(limit) = self.history_limit {
            while self.frames.len() >= limit {
                self.frames.pop_front();
            }
        }
        self.frames.push_back(frame.clone());
        Ok(())
    }

    fn release(&mut self) {
        self.released = true;
    }
}
