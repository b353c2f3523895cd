use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A 3D position observation that may, or may not, carry a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// The name of the landmark, if it has one.
    pub name: Option<String>,
    /// The position of the landmark.
    pub position: Vec3,
}

impl Landmark {
    /// Create a new landmark from an optional name and a position.
    pub fn new(name: Option<String>, position: Vec3) -> Self {
        Self { name, position }
    }

    /// Create a named landmark.
    pub fn named(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: Some(name.into()),
            position,
        }
    }

    /// Create an anonymous landmark.
    pub fn unnamed(position: Vec3) -> Self {
        Self {
            name: None,
            position,
        }
    }

    /// Returns `true` if both landmarks have the same name, or both have no name.
    #[inline]
    pub fn same_name_or_both_unnamed(&self, other: &Landmark) -> bool {
        self.name == other.name
    }
}

/// A fully paired source/destination correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPair3D {
    /// The position in the source coordinate system.
    pub source: Vec3,
    /// The position in the destination coordinate system.
    pub destination: Vec3,
}

impl LandmarkPair3D {
    /// Create a new correspondence.
    pub fn new(source: Vec3, destination: Vec3) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl fmt::Display for LandmarkPair3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LandmarkPair3D{{source = {}, destination = {}}}",
            self.source, self.destination
        )
    }
}

/// The result of pairing one named slot across the source and destination sets.
///
/// The name is always populated. Anonymous landmarks get a synthesized
/// `unnamed_<n>` name during pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPairing {
    /// The name of the pairing slot.
    pub name: String,
    /// The source position, if the source set contained this landmark.
    pub source: Option<Vec3>,
    /// The destination position, if the destination set contained this landmark.
    pub destination: Option<Vec3>,
}

impl LandmarkPairing {
    /// Create a new pairing record.
    pub fn new(name: impl Into<String>, source: Option<Vec3>, destination: Option<Vec3>) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
        }
    }

    /// Returns `true` if the source set contained this landmark.
    #[inline]
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Returns `true` if the destination set contained this landmark.
    #[inline]
    pub fn has_destination(&self) -> bool {
        self.destination.is_some()
    }

    /// Returns `true` if both a source and a destination position are present.
    #[inline]
    pub fn is_fully_paired(&self) -> bool {
        self.has_source() && self.has_destination()
    }

    /// Returns the correspondence if this record is fully paired.
    pub fn try_paired_locations(&self) -> Option<LandmarkPair3D> {
        match (self.source, self.destination) {
            (Some(source), Some(destination)) => Some(LandmarkPair3D::new(source, destination)),
            _ => None,
        }
    }
}

impl fmt::Display for LandmarkPairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LandmarkPairing{{name = {}", self.name)?;
        match self.source {
            Some(p) => write!(f, ", source = {p}")?,
            None => write!(f, ", source = none")?,
        }
        match self.destination {
            Some(p) => write!(f, ", destination = {p}")?,
            None => write!(f, ", destination = none")?,
        }
        write!(f, "}}")
    }
}
