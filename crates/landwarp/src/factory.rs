use std::{path::Path, sync::Arc};

use glam::Vec3;
use landwarp_landmarks::{
    io::csv::{read_landmarks_csv, LandmarkCsvError},
    pair_landmarks, Landmark, LandmarkPair3D, LandmarkPairing, PairingSummary,
};
use landwarp_tps::{solve_coefficients, warp_in_place, SolveError, TpsCoefficients3D, WarpConfiguration};

/// Minimum number of fully paired landmarks for a meaningful warp.
const RECOMMENDED_MIN_PAIRED: usize = 3;

/// Error types for the warper factory.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WarperFactoryError {
    /// The landmarks could not be fitted
    #[error(transparent)]
    Solve(#[from] SolveError),

    /// A landmark file could not be read
    #[error(transparent)]
    Csv(#[from] LandmarkCsvError),
}

/// Fit a thin-plate spline to the fully paired records of a pairing result.
///
/// Records that miss a source or a destination are ignored.
pub fn fit(pairings: &[LandmarkPairing]) -> Result<TpsCoefficients3D, SolveError> {
    fit_with_prescale(pairings, 1.0, 1.0)
}

/// Fit a thin-plate spline after rescaling both sides of every correspondence.
///
/// # Arguments
///
/// * `pairings` - The pairing result. Only fully paired records are used.
/// * `source_prescale` - Factor applied to every source position.
/// * `destination_prescale` - Factor applied to every destination position.
pub fn fit_with_prescale(
    pairings: &[LandmarkPairing],
    source_prescale: f32,
    destination_prescale: f32,
) -> Result<TpsCoefficients3D, SolveError> {
    let correspondences = pairings
        .iter()
        .filter_map(LandmarkPairing::try_paired_locations)
        .map(|p| {
            LandmarkPair3D::new(
                p.source * source_prescale,
                p.destination * destination_prescale,
            )
        })
        .collect::<Vec<_>>();

    solve_coefficients(&correspondences)
}

/// Create a warper closure that warps point buffers in place.
///
/// The closure holds a shared handle to the coefficients and a copy of the
/// configuration, so it can be sent to other threads.
pub fn make_warper(
    coefficients: Arc<TpsCoefficients3D>,
    config: WarpConfiguration,
) -> impl Fn(&mut [Vec3]) + Send + Sync + 'static {
    move |points: &mut [Vec3]| warp_in_place(&coefficients, points, &config)
}

/// Outcome of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    /// The check passed.
    Ok,
    /// The check failed, but a warp can still be produced.
    Warning,
    /// The check failed and no warp can be produced.
    Error,
}

/// A single validation check performed by [`TpsWarperFactory::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCheck {
    /// Human readable description of what was checked.
    pub description: String,
    /// The outcome of the check.
    pub state: ValidationState,
}

impl ValidationCheck {
    fn new(description: impl Into<String>, state: ValidationState) -> Self {
        Self {
            description: description.into(),
            state,
        }
    }

    fn from_bool(description: impl Into<String>, passed: bool) -> Self {
        let state = match passed {
            true => ValidationState::Ok,
            false => ValidationState::Error,
        };
        Self::new(description, state)
    }
}

/// Pairs two landmark sets, fits them once and hands out warpers.
///
/// The fitted coefficients are kept behind an [`Arc`] and shared by every warper
/// created from the factory. Changing the blend factor or a gate does not
/// refit, changing a prescale does.
#[derive(Debug, Clone)]
pub struct TpsWarperFactory {
    pairings: Vec<LandmarkPairing>,
    coefficients: Result<Arc<TpsCoefficients3D>, SolveError>,
    config: WarpConfiguration,
}

impl TpsWarperFactory {
    /// Create a factory from source and destination landmarks.
    ///
    /// Fitting errors are kept and reported by [`Self::try_create_warper`] and
    /// [`Self::validate`] so the host can still describe the landmarks.
    pub fn new(source: Vec<Landmark>, destination: Vec<Landmark>, config: WarpConfiguration) -> Self {
        let pairings = pair_landmarks(source, destination);
        let coefficients = Self::fit_shared(&pairings, &config);
        Self {
            pairings,
            coefficients,
            config,
        }
    }

    /// Create a factory from two landmark CSV files.
    pub fn from_csv_files(
        source_path: impl AsRef<Path>,
        destination_path: impl AsRef<Path>,
        config: WarpConfiguration,
    ) -> Result<Self, WarperFactoryError> {
        let source = read_landmarks_csv(source_path)?;
        let destination = read_landmarks_csv(destination_path)?;
        Ok(Self::new(source, destination, config))
    }

    fn fit_shared(
        pairings: &[LandmarkPairing],
        config: &WarpConfiguration,
    ) -> Result<Arc<TpsCoefficients3D>, SolveError> {
        let summary = PairingSummary::from_pairings(pairings);
        if summary.num_fully_paired < RECOMMENDED_MIN_PAIRED {
            log::warn!(
                "only {} landmarks could be paired, at least {} are recommended",
                summary.num_fully_paired,
                RECOMMENDED_MIN_PAIRED
            );
        }

        fit_with_prescale(pairings, config.source_prescale, config.destination_prescale)
            .map(Arc::new)
            .inspect_err(|e| log::warn!("failed to fit landmarks: {e}"))
    }

    /// The pairing records, in pairing order.
    pub fn pairings(&self) -> &[LandmarkPairing] {
        &self.pairings
    }

    /// Counts of source-only, destination-only and fully paired landmarks.
    pub fn summary(&self) -> PairingSummary {
        PairingSummary::from_pairings(&self.pairings)
    }

    /// The current configuration.
    pub fn config(&self) -> &WarpConfiguration {
        &self.config
    }

    /// Replace the configuration, refitting only if a prescale changed.
    pub fn set_config(&mut self, config: WarpConfiguration) {
        let prescale_changed = config.source_prescale != self.config.source_prescale
            || config.destination_prescale != self.config.destination_prescale;

        self.config = config;

        if prescale_changed {
            log::debug!("prescale changed, refitting landmarks");
            self.coefficients = Self::fit_shared(&self.pairings, &self.config);
        }
    }

    /// The fitted coefficients, or the reason fitting failed.
    pub fn coefficients(&self) -> Result<Arc<TpsCoefficients3D>, SolveError> {
        self.coefficients.clone()
    }

    /// Create a warper for the current configuration.
    pub fn try_create_warper(
        &self,
    ) -> Result<impl Fn(&mut [Vec3]) + Send + Sync + 'static, SolveError> {
        let coefficients = self.coefficients()?;
        Ok(make_warper(coefficients, self.config))
    }

    /// Describe the factory as `(label, value)` rows.
    pub fn warp_details(&self) -> Vec<(String, String)> {
        let summary = self.summary();
        let fitted = match &self.coefficients {
            Ok(coefs) => format!("yes ({} control points)", coefs.num_control_points()),
            Err(e) => format!("no ({e})"),
        };

        vec![
            ("number of source landmarks".into(), summary.num_source.to_string()),
            (
                "number of destination landmarks".into(),
                summary.num_destination.to_string(),
            ),
            (
                "number of paired landmarks".into(),
                summary.num_fully_paired.to_string(),
            ),
            (
                "number of unpaired landmarks".into(),
                summary.num_unpaired.to_string(),
            ),
            ("blending factor".into(), self.config.blend_factor.to_string()),
            ("fitted".into(), fitted),
        ]
    }

    /// Run the validation checks a host shows before warping.
    pub fn validate(&self) -> Vec<ValidationCheck> {
        let summary = self.summary();

        let mut checks = vec![
            ValidationCheck::from_bool("source landmarks are present", summary.num_source > 0),
            ValidationCheck::from_bool(
                "destination landmarks are present",
                summary.num_destination > 0,
            ),
            ValidationCheck::from_bool(
                "at least three landmarks can be paired between source/destination",
                summary.num_fully_paired >= RECOMMENDED_MIN_PAIRED,
            ),
            ValidationCheck::new(
                "there are no unpaired landmarks",
                match summary.has_unpaired() {
                    true => ValidationState::Warning,
                    false => ValidationState::Ok,
                },
            ),
        ];

        if let Err(e) = &self.coefficients {
            checks.push(ValidationCheck::new(
                format!("landmarks can be fitted: {e}"),
                ValidationState::Error,
            ));
        }

        checks
    }
}
