use serde::{Deserialize, Serialize};

/// Caller supplied knobs that control how a fitted spline is applied.
///
/// Hosts typically keep one of these around and rebuild their warper whenever
/// the user moves the blend slider or toggles one of the gates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfiguration {
    /// Interpolation between the input point (0.0) and the fully warped point (1.0).
    ///
    /// Values outside of `[0, 1]` are not clamped and extrapolate.
    pub blend_factor: f32,
    /// Whether to apply the translation part of the affine term.
    pub apply_translation: bool,
    /// Whether to apply the rotational part of the affine term.
    pub apply_rotation: bool,
    /// Whether to apply the scaling part of the affine term.
    pub apply_scale: bool,
    /// Whether to apply the radial (non-affine) terms.
    pub apply_non_affine_warp: bool,
    /// Uniform scale applied to source landmarks and to every query point.
    pub source_prescale: f32,
    /// Uniform scale applied to destination landmarks before fitting.
    pub destination_prescale: f32,
}

impl Default for WarpConfiguration {
    fn default() -> Self {
        Self {
            blend_factor: 1.0,
            apply_translation: true,
            apply_rotation: true,
            apply_scale: true,
            apply_non_affine_warp: true,
            source_prescale: 1.0,
            destination_prescale: 1.0,
        }
    }
}

impl WarpConfiguration {
    /// Set the blend factor.
    pub fn with_blend_factor(mut self, blend_factor: f32) -> Self {
        self.blend_factor = blend_factor;
        self
    }

    /// Enable or disable the translation part of the affine term.
    pub fn with_translation(mut self, apply: bool) -> Self {
        self.apply_translation = apply;
        self
    }

    /// Enable or disable the rotational part of the affine term.
    pub fn with_rotation(mut self, apply: bool) -> Self {
        self.apply_rotation = apply;
        self
    }

    /// Enable or disable the scaling part of the affine term.
    pub fn with_scale(mut self, apply: bool) -> Self {
        self.apply_scale = apply;
        self
    }

    /// Enable or disable the radial (non-affine) terms.
    pub fn with_non_affine_warp(mut self, apply: bool) -> Self {
        self.apply_non_affine_warp = apply;
        self
    }

    /// Set the source and destination prescale factors.
    pub fn with_prescale(mut self, source_prescale: f32, destination_prescale: f32) -> Self {
        self.source_prescale = source_prescale;
        self.destination_prescale = destination_prescale;
        self
    }

    /// Returns `true` if all of the affine gates are enabled.
    pub fn applies_full_affine(&self) -> bool {
        self.apply_translation && self.apply_rotation && self.apply_scale
    }
}
