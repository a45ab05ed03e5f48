use crate::eval::time::{Clock, SystemClock, TimeAccumulator};
use crate::foundation::core::{Canvas, DprRange, LogicalSize, Rgba8, device_canvas};
use crate::foundation::error::{StimError, StimResult};
use crate::present::surface::Surface;
use crate::render::backend::FrameRGBA;
use crate::render::cpu::{CpuRasterOpts, CpuRasterizer};
use crate::render::field::FieldProgram;
use crate::session::refresh::{FrameTicket, RefreshScheduler};
use crate::stimulus::calibration::{CalibrationScale, DEFAULT_PX_PER_DEG, MIN_SIGMA_PX};
use crate::stimulus::params::{AntiAliasMode, RenderMode, StimulusParameters, StimulusPatch};

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOpts {
    /// Clamp applied to the host device pixel ratio at resize time.
    pub dpr: DprRange,
    /// Envelope sigma floor in device pixels.
    pub min_sigma_px: f64,
    /// Calibration used until the host sets one.
    pub default_px_per_deg: f64,
    /// Logical size assumed when the host reports a zero-sized display area.
    pub fallback_logical_size: LogicalSize,
    /// Surface clear color (RGBA8).
    pub clear_rgba: [u8; 4],
    /// Row dispatch for the rasterizer.
    pub raster: CpuRasterOpts,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            dpr: DprRange::default(),
            min_sigma_px: MIN_SIGMA_PX,
            default_px_per_deg: DEFAULT_PX_PER_DEG,
            fallback_logical_size: LogicalSize::new(1280.0, 720.0),
            clear_rgba: [0, 0, 0, 255],
            raster: CpuRasterOpts::default(),
        }
    }
}

impl EngineOpts {
    /// Check values that cannot be absorbed at render time.
    pub fn validate(&self) -> StimResult<()> {
        self.dpr.validate()?;
        if !(self.min_sigma_px.is_finite() && self.min_sigma_px > 0.0) {
            return Err(StimError::validation("min_sigma_px must be finite and > 0"));
        }
        if CalibrationScale::new(self.default_px_per_deg).is_none() {
            return Err(StimError::validation(
                "default_px_per_deg must be finite and > 0",
            ));
        }
        let fb = self.fallback_logical_size;
        if !(fb.width.is_finite() && fb.width > 0.0 && fb.height.is_finite() && fb.height > 0.0) {
            return Err(StimError::validation(
                "fallback_logical_size must be finite and > 0",
            ));
        }
        if self.raster.threads == Some(0) {
            return Err(StimError::validation("raster.threads must be > 0 when provided"));
        }
        Ok(())
    }
}

/// Counters for one engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineStats {
    /// Frames presented to the surface.
    pub frames_presented: u64,
    /// Backing-size changes, including the initial sizing.
    pub resizes: u64,
    /// Refresh callbacks that produced no frame (cancelled or stale tickets).
    pub refreshes_ignored: u64,
    /// Elapsed running time used by the last presented frame, seconds.
    pub last_elapsed_secs: f64,
}

struct FrameResources {
    raster: CpuRasterizer,
    frame: FrameRGBA,
    backing: Option<Canvas>,
}

/// Stimulus engine bound to one output surface.
///
/// Owns every piece of per-surface state: parameters, calibration, mode, anti-alias mode, the time
/// accumulator, and the frame loop. All mutation goes through `&mut self` on the thread that
/// drives refresh callbacks; setters take effect on the next frame.
///
/// Lifecycle: [`attach`](Self::attach) starts running and requests the first frame. `pause` and
/// `resume` stop and restart both the clock and the frame loop. `destroy` is terminal; afterwards
/// every method is a no-op.
pub struct StimulusEngine<S: Surface, R: RefreshScheduler> {
    surface: S,
    scheduler: R,
    opts: EngineOpts,

    time: TimeAccumulator,
    params: StimulusParameters,
    calibration: CalibrationScale,
    mode: RenderMode,
    aa: AntiAliasMode,

    resources: Option<FrameResources>,
    pending: Option<FrameTicket>,
    next_ticket: u64,
    stats: EngineStats,
}

impl<S: Surface, R: RefreshScheduler> StimulusEngine<S, R> {
    /// Attach to `surface` using the wall clock.
    pub fn attach(surface: S, scheduler: R, opts: EngineOpts) -> StimResult<Self> {
        Self::attach_with_clock(surface, scheduler, Box::new(SystemClock::new()), opts)
    }

    /// Attach to `surface` with an explicit time source.
    ///
    /// Fails without creating an engine if `opts` is invalid, the worker pool cannot be built, or
    /// the surface cannot be acquired.
    pub fn attach_with_clock(
        mut surface: S,
        scheduler: R,
        clock: Box<dyn Clock>,
        opts: EngineOpts,
    ) -> StimResult<Self> {
        opts.validate()?;
        let raster = CpuRasterizer::new(opts.raster)?;
        surface.acquire()?;

        let calibration = CalibrationScale::new(opts.default_px_per_deg).unwrap_or_default();
        let frame = FrameRGBA::new(
            Canvas {
                width: 0,
                height: 0,
            },
            Rgba8::from(opts.clear_rgba),
        );
        tracing::info!(
            threads = raster.threads(),
            px_per_deg = calibration.px_per_deg(),
            "stimulus engine attached"
        );

        let mut engine = Self {
            surface,
            scheduler,
            opts,
            time: TimeAccumulator::start(clock),
            params: StimulusParameters::default(),
            calibration,
            mode: RenderMode::default(),
            aa: AntiAliasMode::default(),
            resources: Some(FrameResources {
                raster,
                frame,
                backing: None,
            }),
            pending: None,
            next_ticket: 0,
            stats: EngineStats::default(),
        };
        engine.schedule_next();
        Ok(engine)
    }

    /// Switch the active stimulus.
    pub fn set_demo(&mut self, mode: RenderMode) {
        if self.is_destroyed() {
            return;
        }
        self.mode = mode;
    }

    /// Merge a partial parameter update.
    pub fn update_parameters(&mut self, patch: &StimulusPatch) {
        if self.is_destroyed() {
            return;
        }
        self.params.apply(patch);
    }

    /// Replace the whole parameter record.
    pub fn set_parameters(&mut self, params: StimulusParameters) {
        self.update_parameters(&StimulusPatch::from(params));
    }

    /// Set the pixels-per-degree calibration.
    ///
    /// Non-finite or non-positive values are ignored and the previous calibration stays active.
    pub fn set_calibration(&mut self, px_per_deg: f64) {
        if self.is_destroyed() {
            return;
        }
        match CalibrationScale::new(px_per_deg) {
            Some(scale) => self.calibration = scale,
            None => tracing::warn!(
                px_per_deg,
                kept = self.calibration.px_per_deg(),
                "ignoring invalid calibration"
            ),
        }
    }

    /// Toggle analytic footprint anti-aliasing.
    pub fn set_anti_alias(&mut self, enabled: bool) {
        if self.is_destroyed() {
            return;
        }
        self.aa = AntiAliasMode::from_enabled(enabled);
    }

    /// Freeze the clock and cancel the pending frame. The last presented frame stays visible.
    pub fn pause(&mut self) {
        if self.is_destroyed() || !self.time.is_running() {
            return;
        }
        self.time.pause();
        if let Some(t) = self.pending.take() {
            self.scheduler.cancel(t);
        }
        tracing::debug!(elapsed_secs = self.time.elapsed_seconds(), "paused");
    }

    /// Restart the clock from its frozen value and request a frame.
    pub fn resume(&mut self) {
        if self.is_destroyed() || self.time.is_running() {
            return;
        }
        self.time.resume();
        self.schedule_next();
        tracing::debug!(elapsed_secs = self.time.elapsed_seconds(), "resumed");
    }

    /// Pause, then release the surface and every frame resource. Terminal and idempotent.
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.pause();
        self.resources = None;
        self.surface.release();
        tracing::info!(
            frames_presented = self.stats.frames_presented,
            "stimulus engine destroyed"
        );
    }

    /// Refresh callback entry point.
    ///
    /// Produces a frame only for the currently pending ticket; cancelled or stale tickets, and
    /// any call after `destroy`, return `Ok(false)`. On success the next frame is requested.
    /// A frame error is returned without requesting another frame, which stops the loop until the
    /// next `pause`/`resume` cycle.
    pub fn on_refresh(&mut self, ticket: FrameTicket) -> StimResult<bool> {
        if self.is_destroyed() {
            return Ok(false);
        }
        if self.pending != Some(ticket) {
            self.stats.refreshes_ignored += 1;
            tracing::trace!(ticket = ticket.0, "ignoring refresh");
            return Ok(false);
        }
        self.pending = None;
        if let Err(e) = self.render_frame() {
            tracing::warn!(error = %e, "frame failed, loop stalled until resume");
            return Err(e);
        }
        self.schedule_next();
        Ok(true)
    }

    #[tracing::instrument(level = "trace", skip(self), fields(frame = self.stats.frames_presented))]
    fn render_frame(&mut self) -> StimResult<()> {
        let canvas = device_canvas(
            self.surface.logical_size(),
            self.surface.device_pixel_ratio(),
            self.opts.dpr,
            self.opts.fallback_logical_size,
        );
        let elapsed = self.time.elapsed_seconds();
        let program = self.program_for(canvas, elapsed);

        let Some(res) = self.resources.as_mut() else {
            return Ok(());
        };
        let resized = res.frame.resize(canvas) || res.backing.is_none();
        if resized {
            res.backing = Some(canvas);
            self.surface.resize(canvas);
            self.stats.resizes += 1;
            tracing::debug!(width = canvas.width, height = canvas.height, "surface resized");
        }

        res.raster.clear(&mut res.frame, Rgba8::from(self.opts.clear_rgba));
        res.raster.draw(&program, self.aa, &mut res.frame);
        self.surface.present(&res.frame)?;

        self.stats.frames_presented += 1;
        self.stats.last_elapsed_secs = elapsed;
        Ok(())
    }

    fn program_for(&self, canvas: Canvas, elapsed_secs: f64) -> FieldProgram {
        FieldProgram::calibrate(
            self.mode,
            &self.params,
            self.calibration.px_per_deg(),
            self.opts.min_sigma_px,
            canvas.resolution(),
            elapsed_secs,
        )
    }

    fn schedule_next(&mut self) {
        self.next_ticket += 1;
        let t = FrameTicket(self.next_ticket);
        self.pending = Some(t);
        self.scheduler.request(t);
    }

    /// Calibrated program the next frame would run, for the current backing size.
    ///
    /// Before the first frame the size is derived from the surface's current logical size.
    pub fn uniforms(&self) -> FieldProgram {
        let canvas = self
            .resources
            .as_ref()
            .and_then(|r| r.backing)
            .unwrap_or_else(|| {
                device_canvas(
                    self.surface.logical_size(),
                    self.surface.device_pixel_ratio(),
                    self.opts.dpr,
                    self.opts.fallback_logical_size,
                )
            });
        self.program_for(canvas, self.time.elapsed_seconds())
    }

    pub fn parameters(&self) -> &StimulusParameters {
        &self.params
    }

    /// Active calibration in pixels per degree.
    pub fn calibration(&self) -> f64 {
        self.calibration.px_per_deg()
    }

    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    pub fn anti_alias(&self) -> AntiAliasMode {
        self.aa
    }

    /// `true` while the clock runs and frames are being scheduled.
    pub fn is_running(&self) -> bool {
        !self.is_destroyed() && self.time.is_running()
    }

    pub fn is_destroyed(&self) -> bool {
        self.resources.is_none()
    }

    /// Running time since attach, excluding paused intervals.
    pub fn elapsed_seconds(&self) -> f64 {
        self.time.elapsed_seconds()
    }

    /// `true` when the clock runs but no frame is requested, after a failed frame.
    ///
    /// A `pause`/`resume` cycle restarts the loop.
    pub fn is_stalled(&self) -> bool {
        self.is_running() && self.pending.is_none()
    }

    /// Ticket of the requested, not yet delivered frame.
    pub fn pending_frame(&self) -> Option<FrameTicket> {
        self.pending
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access, for hosts that forward resize or DPR changes.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &R {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut R {
        &mut self.scheduler
    }
}

impl<S: Surface, R: RefreshScheduler> Drop for StimulusEngine<S, R> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<S: Surface, R: RefreshScheduler> std::fmt::Debug for StimulusEngine<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StimulusEngine")
            .field("mode", &self.mode)
            .field("anti_alias", &self.aa)
            .field("params", &self.params)
            .field("px_per_deg", &self.calibration.px_per_deg())
            .field("running", &self.is_running())
            .field("destroyed", &self.is_destroyed())
            .field("pending", &self.pending)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
