//! Visual-angle to device-pixel conversion.
//!
//! Everything here is stateless and recomputed every frame, so a live calibration change shows
//! up on the very next frame.

/// Default calibration in device pixels per degree of visual angle.
pub const DEFAULT_PX_PER_DEG: f64 = 60.0;

/// Smallest envelope sigma the field program will use, in device pixels.
pub const MIN_SIGMA_PX: f64 = 0.5;

/// Pixels-per-degree scale factor set by the host.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationScale(f64);

impl Default for CalibrationScale {
    fn default() -> Self {
        Self(DEFAULT_PX_PER_DEG)
    }
}

impl CalibrationScale {
    /// Accept a scale only if it is finite and strictly positive.
    pub fn new(px_per_deg: f64) -> Option<Self> {
        (px_per_deg.is_finite() && px_per_deg > 0.0).then_some(Self(px_per_deg))
    }

    pub fn px_per_deg(self) -> f64 {
        self.0
    }
}

/// Carrier frequency in cycles per pixel.
pub fn freq_per_pixel(cycles_per_deg: f64, px_per_deg: f64) -> f64 {
    cycles_per_deg / px_per_deg
}

/// Envelope sigma in device pixels, floored at `min_sigma_px`.
///
/// NaN inputs also land on the floor.
pub fn sigma_pixels(sigma_deg: f64, px_per_deg: f64, min_sigma_px: f64) -> f64 {
    (sigma_deg * px_per_deg).max(min_sigma_px)
}

/// Orientation in radians.
pub fn orientation_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}
