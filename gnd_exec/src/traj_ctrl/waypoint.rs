//! # Waypoints and trajectories
//!
//! A trajectory is an ordered, non-empty list of waypoints which is flown cyclically forever.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

// Internal
use comms_if::eqpt::GeoPosition;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A target point of the trajectory.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Latitude in degrees
    #[serde(alias = "lat")]
    pub latitude: f64,

    /// Longitude in degrees
    #[serde(alias = "lon")]
    pub longitude: f64,

    /// Ellipsoidal altitude in meters
    #[serde(alias = "alt")]
    pub altitude: f64,

    /// Heading the aircraft shall hold at the waypoint, degrees clockwise from north
    #[serde(alias = "head")]
    pub target_heading: f64,

    /// Speed at the waypoint in meters/second
    #[serde(alias = "speed", default)]
    pub target_speed: f64,
}

/// An ordered sequence of waypoints, repeated indefinitely.
///
/// A trajectory always contains at least one waypoint and all of its values are finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrajectoryFile")]
pub struct Trajectory {
    waypoints: Vec<Waypoint>,
}

/// The on-disk representation of a trajectory, validated into a [`Trajectory`].
#[derive(Deserialize)]
struct TrajectoryFile {
    waypoints: Vec<Waypoint>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while building a trajectory.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrajectoryError {
    #[error("A trajectory must contain at least one waypoint")]
    Empty,

    #[error("Waypoint {0} contains non-finite values")]
    NonFiniteWaypoint(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    /// Create a new waypoint.
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude: f64,
        target_heading: f64,
        target_speed: f64
    ) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            target_heading,
            target_speed
        }
    }

    /// The geodetic position of the waypoint.
    pub fn position(&self) -> GeoPosition {
        GeoPosition {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude
        }
    }

    fn is_finite(&self) -> bool {
        [
            self.latitude,
            self.longitude,
            self.altitude,
            self.target_heading,
            self.target_speed
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

impl Trajectory {
    /// Build a trajectory from the given waypoints.
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, TrajectoryError> {
        if waypoints.is_empty() {
            return Err(TrajectoryError::Empty)
        }

        if let Some(i) = waypoints.iter().position(|w| !w.is_finite()) {
            return Err(TrajectoryError::NonFiniteWaypoint(i))
        }

        Ok(Self { waypoints })
    }

    /// Number of waypoints in one lap of the trajectory.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false, trajectories cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Get the waypoint at the given index, wrapping the index around the trajectory length.
    pub fn get(&self, index: usize) -> &Waypoint {
        &self.waypoints[index % self.waypoints.len()]
    }

    /// The index following the given one, wrapping to zero at the end of the lap.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    /// The waypoints of one lap, in order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// An infinite sequence of `(index, waypoint)` pairs starting at `start` and restarting at
    /// index 0 at the end of each lap.
    pub fn cycle_from(&self, start: usize) -> impl Iterator<Item = (usize, &Waypoint)> + '_ {
        self.waypoints
            .iter()
            .enumerate()
            .cycle()
            .skip(start % self.waypoints.len())
    }
}

impl Default for Trajectory {
    /// A four point box, flown north-east then back, with the far side raised to 50 m.
    fn default() -> Self {
        Self {
            waypoints: vec![
                Waypoint::new(51.189000, -4.413000, 25.0, 0.0, 0.0),
                Waypoint::new(51.189300, -4.411030, 50.0, 0.0, 0.0),
                Waypoint::new(51.189300, -4.411030, 50.0, 0.0, 0.0),
                Waypoint::new(51.189000, -4.413000, 25.0, 0.0, 0.0),
            ]
        }
    }
}

impl TryFrom<TrajectoryFile> for Trajectory {
    type Error = TrajectoryError;

    fn try_from(file: TrajectoryFile) -> Result<Self, Self::Error> {
        Self::new(file.waypoints)
    }
}
