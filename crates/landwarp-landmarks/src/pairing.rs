use crate::landmark::{Landmark, LandmarkPairing};

/// Counts of each pairing category in a pairing result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingSummary {
    /// Total number of pairing records.
    pub num_landmarks: usize,
    /// Number of records that have a source position.
    pub num_source: usize,
    /// Number of records that have a destination position.
    pub num_destination: usize,
    /// Number of records that have both a source and a destination position.
    pub num_fully_paired: usize,
    /// Number of records that are missing either side.
    pub num_unpaired: usize,
}

impl PairingSummary {
    /// Compute the summary of a pairing result.
    pub fn from_pairings(pairings: &[LandmarkPairing]) -> Self {
        let num_landmarks = pairings.len();
        let num_fully_paired = pairings.iter().filter(|p| p.is_fully_paired()).count();
        Self {
            num_landmarks,
            num_source: pairings.iter().filter(|p| p.has_source()).count(),
            num_destination: pairings.iter().filter(|p| p.has_destination()).count(),
            num_fully_paired,
            num_unpaired: num_landmarks - num_fully_paired,
        }
    }

    /// Returns `true` if any record is missing either side.
    #[inline]
    pub fn has_unpaired(&self) -> bool {
        self.num_unpaired > 0
    }
}

fn generate_name(suffix: usize) -> String {
    format!("unnamed_{suffix}")
}

/// Pair two independently collected landmark sets by name.
///
/// Every landmark in `a` emits exactly one record, in order. Each one is matched
/// against the first remaining landmark of `b` with the same name (two anonymous
/// landmarks also count as a match), and the matched landmark is removed from `b`.
/// The landmarks of `b` that were never matched are emitted last, in their
/// remaining order, as destination-only records.
///
/// Anonymous landmarks are given an `unnamed_<n>` name. The counter starts at 0
/// and is shared across both passes of a single call.
///
/// # Arguments
///
/// * `a` - The source landmarks.
/// * `b` - The destination landmarks.
///
/// # Returns
///
/// The pairing records.
///
/// Example:
///
/// ```
/// use glam::Vec3;
/// use landwarp_landmarks::{pair_landmarks, Landmark};
///
/// let a = vec![Landmark::named("A", Vec3::X), Landmark::unnamed(Vec3::Y)];
/// let b = vec![Landmark::named("A", Vec3::Z), Landmark::named("B", Vec3::ONE)];
///
/// let pairings = pair_landmarks(a, b);
/// assert_eq!(pairings.len(), 3);
/// assert_eq!(pairings[1].name, "unnamed_0");
/// ```
pub fn pair_landmarks(a: Vec<Landmark>, b: Vec<Landmark>) -> Vec<LandmarkPairing> {
    let mut num_unnamed = 0;
    let mut next_name = |maybe_name: Option<String>| {
        maybe_name.unwrap_or_else(|| {
            let name = generate_name(num_unnamed);
            num_unnamed += 1;
            name
        })
    };

    let mut remaining = b;
    let mut pairings = Vec::with_capacity(a.len() + remaining.len());

    for lm in a {
        let maybe_match = remaining
            .iter()
            .position(|candidate| lm.same_name_or_both_unnamed(candidate));

        let name = next_name(lm.name);

        match maybe_match {
            Some(idx) => {
                // keep the order of the remaining candidates stable
                let matched = remaining.remove(idx);
                pairings.push(LandmarkPairing::new(
                    name,
                    Some(lm.position),
                    Some(matched.position),
                ));
            }
            None => {
                log::warn!("landmark {name} has no destination counterpart");
                pairings.push(LandmarkPairing::new(name, Some(lm.position), None));
            }
        }
    }

    for lm in remaining {
        let name = next_name(lm.name);
        log::warn!("landmark {name} has no source counterpart");
        pairings.push(LandmarkPairing::new(name, None, Some(lm.position)));
    }

    pairings
}

/// Find the pairing record with the given name.
pub fn find_pairing_by_name<'a>(
    pairings: &'a [LandmarkPairing],
    name: &str,
) -> Option<&'a LandmarkPairing> {
    pairings.iter().find(|p| p.name == name)
}
