//! Per-pixel luminance programs.
//!
//! A [`FieldProgram`] is the calibrated uniform block for one frame. Evaluating it at a fragment
//! coordinate is a pure function: no hidden state, no dependence on how pixels are dispatched.

use std::f64::consts::TAU;

use crate::foundation::core::{Affine, Point, Rgba8, Vec2};
use crate::stimulus::calibration::{freq_per_pixel, orientation_radians, sigma_pixels};
use crate::stimulus::params::{AntiAliasMode, RenderMode, StimulusParameters};

/// Mid-gray linear luminance; the zero-contrast level of every program.
pub const MID_GRAY: f64 = 0.5;

/// Below this `|s|` the footprint filter is treated as exactly one.
pub const SINC_EPSILON: f64 = 1e-5;

/// Gabor uniforms, already in device-pixel units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaborUniforms {
    /// Output resolution in device pixels. The patch is centered at half of it.
    pub resolution: Vec2,
    /// Carrier phase for this frame, radians (initial phase plus drift).
    pub phase: f64,
    /// Carrier frequency in cycles per device pixel.
    pub freq_per_px: f64,
    /// Rotation taking centered fragment offsets onto the (modulation, constant-phase) axes.
    pub rotation: Affine,
    /// Michelson contrast.
    pub contrast: f64,
    /// Envelope sigma in device pixels (already floored).
    pub sigma_px: f64,
    /// Display gamma.
    pub gamma: f64,
}

impl GaborUniforms {
    /// Angular spatial frequency in radians per pixel.
    pub fn angular_frequency(&self) -> f64 {
        TAU * self.freq_per_px
    }

    /// Map a fragment coordinate into grating space `(x, y)`.
    ///
    /// `x` runs along the modulation axis, `y` along the constant-phase axis.
    pub fn grating_coords(&self, frag: Point) -> Point {
        let center = (self.resolution * 0.5).to_point();
        self.rotation * (frag - center).to_point()
    }
}

/// One frame's worth of calibrated program state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldProgram {
    /// Uniform mid-gray.
    Solid {
        /// Display gamma.
        gamma: f64,
    },
    /// Gaussian-windowed cosine grating.
    Gabor(GaborUniforms),
}

impl FieldProgram {
    /// Build the program for `mode` from experimenter-facing parameters.
    ///
    /// Degree-based quantities go through the calibration functions here, so the evaluator only
    /// ever sees device-pixel units.
    pub fn calibrate(
        mode: RenderMode,
        params: &StimulusParameters,
        px_per_deg: f64,
        min_sigma_px: f64,
        resolution: Vec2,
        elapsed_secs: f64,
    ) -> Self {
        match mode {
            RenderMode::SolidField => Self::Solid {
                gamma: params.display_gamma,
            },
            RenderMode::GaborPatch => Self::Gabor(GaborUniforms {
                resolution,
                phase: drift_phase(params.initial_phase, params.temporal_frequency, elapsed_secs),
                freq_per_px: freq_per_pixel(params.spatial_frequency, px_per_deg),
                rotation: Affine::rotate(orientation_radians(params.orientation)),
                contrast: params.contrast,
                sigma_px: sigma_pixels(params.envelope_sigma, px_per_deg, min_sigma_px),
                gamma: params.display_gamma,
            }),
        }
    }

    pub fn gamma(&self) -> f64 {
        match self {
            Self::Solid { gamma } => *gamma,
            Self::Gabor(u) => u.gamma,
        }
    }

    /// Linear luminance at `frag`, always in `[0, 1]`. Non-finite uniforms fall back to mid-gray.
    pub fn luminance(&self, frag: Point, aa: AntiAliasMode) -> f64 {
        match self {
            Self::Solid { .. } => MID_GRAY,
            Self::Gabor(u) => gabor_luminance(u, frag, aa),
        }
    }

    /// Gamma-corrected display value at `frag`.
    pub fn display_value(&self, frag: Point, aa: AntiAliasMode) -> f64 {
        to_display(self.luminance(frag, aa), self.gamma())
    }

    /// Achromatic opaque pixel at `frag`.
    pub fn shade(&self, frag: Point, aa: AntiAliasMode) -> Rgba8 {
        Rgba8::gray(self.display_value(frag, aa))
    }
}

/// Carrier phase at `t` seconds: `phase0 + 2π·hz·t`.
pub fn drift_phase(phase0: f64, temporal_hz: f64, t: f64) -> f64 {
    phase0 + TAU * temporal_hz * t
}

/// Linear-to-display correction `l^(1/gamma)`.
pub fn to_display(l: f64, gamma: f64) -> f64 {
    l.powf(1.0 / gamma)
}

/// Width of one device pixel's footprint along the grating's `x` axis.
///
/// This is the screen-space `|∂x/∂col| + |∂x/∂row|` of the rotated coordinate. It is one for
/// axis-aligned gratings and peaks at `√2` on the diagonals.
pub fn footprint_width(rotation: Affine) -> f64 {
    let [a, _, c, _, _, _] = rotation.as_coeffs();
    a.abs() + c.abs()
}

/// Box-filter gain of a cosine with angular frequency `k` averaged over width `w`.
///
/// Returns `sin(s)/s` with `s = k·w/2`, or exactly one when `s` is negligible.
pub fn footprint_attenuation(k: f64, w: f64) -> f64 {
    let s = 0.5 * k * w;
    if s.abs() > SINC_EPSILON { s.sin() / s } else { 1.0 }
}

fn gabor_luminance(u: &GaborUniforms, frag: Point, aa: AntiAliasMode) -> f64 {
    let Point { x, y } = u.grating_coords(frag);

    let k = u.angular_frequency();
    let mut carrier = (k * x + u.phase).cos();
    if aa == AntiAliasMode::AnalyticFootprint {
        carrier *= footprint_attenuation(k, footprint_width(u.rotation));
    }

    let envelope = (-0.5 * (x * x + y * y) / (u.sigma_px * u.sigma_px)).exp();
    let signal = envelope * carrier;

    let l = MID_GRAY + MID_GRAY * u.contrast * signal;
    if l.is_nan() {
        return MID_GRAY;
    }
    l.clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/render/field.rs"]
mod tests;
