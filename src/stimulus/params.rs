use std::str::FromStr;

use crate::foundation::error::{StimError, StimResult};

/// Experimenter-facing stimulus parameters, in visual-angle units.
///
/// The record is never validated: values outside their nominal ranges are absorbed downstream by
/// the calibration floor and the luminance clamp.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StimulusParameters {
    /// Carrier frequency in cycles per degree of visual angle (nominally > 0).
    pub spatial_frequency: f64,
    /// Orientation in degrees; any real value, periodic mod 360.
    pub orientation: f64,
    /// Drift rate in Hz. The sign sets the drift direction.
    pub temporal_frequency: f64,
    /// Carrier phase at `t = 0`, in radians.
    pub initial_phase: f64,
    /// Michelson contrast around mid-gray, nominally in `[0, 1]`.
    pub contrast: f64,
    /// Gaussian envelope standard deviation in degrees of visual angle (nominally > 0).
    pub envelope_sigma: f64,
    /// Exponent of the linear-to-display correction (nominally > 0).
    pub display_gamma: f64,
}

impl Default for StimulusParameters {
    fn default() -> Self {
        Self {
            spatial_frequency: 3.0,
            orientation: 0.0,
            temporal_frequency: 0.0,
            initial_phase: 0.0,
            contrast: 0.9,
            envelope_sigma: 1.0,
            display_gamma: 2.2,
        }
    }
}

impl StimulusParameters {
    /// Merge a partial update; absent fields keep their current value.
    pub fn apply(&mut self, patch: &StimulusPatch) {
        fn set(dst: &mut f64, src: Option<f64>) {
            if let Some(v) = src {
                *dst = v;
            }
        }

        set(&mut self.spatial_frequency, patch.spatial_frequency);
        set(&mut self.orientation, patch.orientation);
        set(&mut self.temporal_frequency, patch.temporal_frequency);
        set(&mut self.initial_phase, patch.initial_phase);
        set(&mut self.contrast, patch.contrast);
        set(&mut self.envelope_sigma, patch.envelope_sigma);
        set(&mut self.display_gamma, patch.display_gamma);
    }

    /// Return a copy with `patch` merged in.
    pub fn merged(mut self, patch: &StimulusPatch) -> Self {
        self.apply(patch);
        self
    }

    /// Parameters plus their pixel-space carrier frequency at `px_per_deg`.
    pub fn derived(&self, px_per_deg: f64) -> DerivedParameters {
        DerivedParameters {
            params: *self,
            freq_per_pixel: crate::stimulus::calibration::freq_per_pixel(
                self.spatial_frequency,
                px_per_deg,
            ),
        }
    }
}

/// Stimulus parameters annotated with the derived carrier frequency in cycles per pixel.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedParameters {
    /// Source parameters.
    #[serde(flatten)]
    pub params: StimulusParameters,
    /// `spatial_frequency / px_per_deg`.
    pub freq_per_pixel: f64,
}

/// Partial [`StimulusParameters`] update. Every field is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StimulusPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spatial_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_phase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope_sigma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_gamma: Option<f64>,
}

impl StimulusPatch {
    /// Decode a patch from a JSON object holding any subset of parameter keys.
    pub fn from_json(s: &str) -> StimResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// True when the patch carries no fields.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<StimulusParameters> for StimulusPatch {
    fn from(p: StimulusParameters) -> Self {
        Self {
            spatial_frequency: Some(p.spatial_frequency),
            orientation: Some(p.orientation),
            temporal_frequency: Some(p.temporal_frequency),
            initial_phase: Some(p.initial_phase),
            contrast: Some(p.contrast),
            envelope_sigma: Some(p.envelope_sigma),
            display_gamma: Some(p.display_gamma),
        }
    }
}

/// Which field program runs each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RenderMode {
    /// Flat mid-gray reference field.
    #[serde(rename = "solid")]
    SolidField,
    /// Gaussian-windowed sinusoidal grating.
    #[default]
    #[serde(rename = "gabor")]
    GaborPatch,
}

impl RenderMode {
    /// Demo identifier used by host selectors.
    pub fn id(self) -> &'static str {
        match self {
            Self::SolidField => "solid",
            Self::GaborPatch => "gabor",
        }
    }
}

impl FromStr for RenderMode {
    type Err = StimError;

    fn from_str(s: &str) -> StimResult<Self> {
        match s.trim() {
            "solid" => Ok(Self::SolidField),
            "gabor" => Ok(Self::GaborPatch),
            other => Err(StimError::validation(format!("unknown demo id '{other}'"))),
        }
    }
}

/// How the carrier is sampled inside each pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AntiAliasMode {
    /// Point-sample the carrier at the pixel center.
    #[default]
    DirectSample,
    /// Average the carrier over the pixel footprint along the modulation axis.
    AnalyticFootprint,
}

impl AntiAliasMode {
    /// Map the host's on/off toggle onto a mode.
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::AnalyticFootprint
        } else {
            Self::DirectSample
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::AnalyticFootprint)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stimulus/params.rs"]
mod tests;
