use crate::foundation::error::{StimError, StimResult};

pub use kurbo::{Affine, Point, Vec2};

/// Display-area size in logical (layout) pixels, as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogicalSize {
    /// Width in logical pixels.
    pub width: f64,
    /// Height in logical pixels.
    pub height: f64,
}

impl LogicalSize {
    /// Create a logical size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Output canvas dimensions in device (physical) pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of pixels on the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Resolution as a vector, used as the `resolution` uniform of the field program.
    pub fn resolution(self) -> Vec2 {
        Vec2::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Inclusive clamp range for the host device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DprRange {
    /// Lower bound (at least one device pixel per logical pixel).
    pub min: f64,
    /// Upper bound, caps memory and per-frame work on very dense displays.
    pub max: f64,
}

impl Default for DprRange {
    fn default() -> Self {
        Self { min: 1.0, max: 3.0 }
    }
}

impl DprRange {
    /// Create a validated range with `0 < min <= max`.
    pub fn new(min: f64, max: f64) -> StimResult<Self> {
        let r = Self { min, max };
        r.validate()?;
        Ok(r)
    }

    pub(crate) fn validate(self) -> StimResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(StimError::validation("DprRange bounds must be finite"));
        }
        if self.min <= 0.0 {
            return Err(StimError::validation("DprRange min must be > 0"));
        }
        if self.min > self.max {
            return Err(StimError::validation("DprRange min must be <= max"));
        }
        Ok(())
    }

    /// Clamp a host-reported ratio. Non-finite or non-positive ratios count as `min`.
    pub fn clamp(self, dpr: f64) -> f64 {
        if !dpr.is_finite() || dpr <= 0.0 {
            return self.min;
        }
        dpr.clamp(self.min, self.max)
    }
}

/// Derive the device-pixel canvas for a logical display area.
///
/// Zero (or non-finite) logical dimensions fall back to `fallback` per axis. Each axis is
/// `round(logical * clamped_dpr)` and never smaller than one pixel.
pub fn device_canvas(
    logical: LogicalSize,
    dpr: f64,
    range: DprRange,
    fallback: LogicalSize,
) -> Canvas {
    fn axis(v: f64, fallback: f64, scale: f64) -> u32 {
        let v = if v.is_finite() && v > 0.0 { v } else { fallback };
        let px = (v * scale).round();
        if px < 1.0 {
            1
        } else if px >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            px as u32
        }
    }

    let scale = range.clamp(dpr);
    Canvas {
        width: axis(logical.width, fallback.width, scale),
        height: axis(logical.height, fallback.height, scale),
    }
}

/// Opaque straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black, the surface clear color.
    pub fn black() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }

    /// Achromatic opaque pixel from a display value in `[0, 1]`.
    ///
    /// Out-of-range values saturate; NaN maps to zero.
    pub fn gray(value: f64) -> Self {
        let v = quantize_unit(value);
        Self {
            r: v,
            g: v,
            b: v,
            a: 255,
        }
    }

    /// Channel array in memory order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from(v: [u8; 4]) -> Self {
        Self {
            r: v[0],
            g: v[1],
            b: v[2],
            a: v[3],
        }
    }
}

/// Map a unit-interval value to 8 bits with round-to-nearest.
pub fn quantize_unit(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
