//! Gaborstim synthesizes calibrated visual stimuli for psychophysics experiments.
//!
//! Two stimuli are available: a drifting or static Gabor patch (a Gaussian-windowed cosine
//! grating) and a flat mid-gray reference field. The API is engine-oriented:
//!
//! - Attach a [`StimulusEngine`] to a [`Surface`] and a [`RefreshScheduler`]
//! - Push [`StimulusParameters`] (in visual-angle units), a calibration, and a [`RenderMode`]
//! - Deliver display refreshes via [`StimulusEngine::on_refresh`]; each one synthesizes and presents
//!   a full frame
//!
//! Per-pixel synthesis is the pure [`FieldProgram`], which can be evaluated directly at literal
//! fragment coordinates without any surface.
#![forbid(unsafe_code)]

mod eval;
mod foundation;
mod present;
mod render;
mod session;
mod stimulus;

pub use crate::foundation::core::{
    Affine, Canvas, DprRange, LogicalSize, Point, Rgba8, Vec2, device_canvas, quantize_unit,
};
pub use crate::foundation::error::{StimError, StimResult};

pub use crate::eval::time::{Clock, ManualClock, SystemClock, TimeAccumulator};
pub use crate::present::surface::{CaptureSurface, Surface};
pub use crate::render::backend::{FrameRGBA, frag_coord};
pub use crate::render::cpu::{CpuRasterOpts, CpuRasterizer};
pub use crate::render::field::{
    FieldProgram, GaborUniforms, MID_GRAY, SINC_EPSILON, drift_phase, footprint_attenuation,
    footprint_width, to_display,
};
pub use crate::session::driver::{Pacing, SyncDriver, refresh_interval, render_frames};
pub use crate::session::engine::{EngineOpts, EngineStats, StimulusEngine};
pub use crate::session::refresh::{FrameTicket, ManualRefresh, RefreshScheduler};
pub use crate::stimulus::calibration::{
    CalibrationScale, DEFAULT_PX_PER_DEG, MIN_SIGMA_PX, freq_per_pixel, orientation_radians,
    sigma_pixels,
};
pub use crate::stimulus::params::{
    AntiAliasMode, DerivedParameters, RenderMode, StimulusParameters, StimulusPatch,
};
