#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// I/O utilities for reading and writing landmark files.
pub mod io;

/// Landmark and landmark pairing types.
pub mod landmark;

/// Pairing of two independently collected landmark sets.
pub mod pairing;

pub use landmark::{Landmark, LandmarkPair3D, LandmarkPairing};
pub use pairing::{find_pairing_by_name, pair_landmarks, PairingSummary};
