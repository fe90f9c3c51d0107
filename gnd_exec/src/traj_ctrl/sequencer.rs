//! # Waypoint sequencer
//!
//! Tracks which waypoint of the trajectory is active and decides when it has been reached.
//!
//! The sequencer is a two state machine:
//!
//! - `Approaching(i)`: waypoint `i` is active and the aircraft is being steered towards it.
//! - `Converged(i)`: all errors to waypoint `i` were under their thresholds. The owner shall hold
//!   the aircraft (neutral sticks) and call [`WaypointSequencer::advance`], which moves to
//!   `Approaching(i + 1)`, wrapping to `Approaching(0)` at the end of the trajectory.
//!
//! There is no terminal state, the trajectory is flown until the loop is stopped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
use super::{ErrorVector, Trajectory, Waypoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Thresholds under which a waypoint is considered reached.
///
/// All comparisons are strict and made on the magnitude of the error.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceThresholds {
    pub body_x_m: f64,
    pub body_y_m: f64,
    pub altitude_m: f64,
    pub heading_deg: f64,
}

/// Sequences the waypoints of a trajectory.
#[derive(Debug, Clone)]
pub struct WaypointSequencer {
    trajectory: Trajectory,

    state: SeqState,

    /// Number of completed laps of the trajectory
    num_laps: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// State of the sequencer, holding the index of the active waypoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeqState {
    Approaching(usize),
    Converged(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ConvergenceThresholds {
    fn default() -> Self {
        Self {
            body_x_m: 0.5,
            body_y_m: 0.5,
            altitude_m: 0.5,
            heading_deg: 5.0,
        }
    }
}

impl ConvergenceThresholds {
    /// True if all four controlled errors are under their thresholds.
    pub fn is_converged(&self, error: &ErrorVector) -> bool {
        error.body_x_m.abs() < self.body_x_m
            && error.body_y_m.abs() < self.body_y_m
            && error.altitude_m.abs() < self.altitude_m
            && error.heading_deg.abs() < self.heading_deg
    }
}

impl SeqState {
    /// Index of the waypoint the state refers to.
    pub fn index(&self) -> usize {
        match self {
            SeqState::Approaching(i) | SeqState::Converged(i) => *i,
        }
    }
}

impl WaypointSequencer {
    /// Start a new sequence at the first waypoint of the trajectory.
    pub fn new(trajectory: Trajectory) -> Self {
        Self {
            trajectory,
            state: SeqState::Approaching(0),
            num_laps: 0,
        }
    }

    pub fn state(&self) -> SeqState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.state.index()
    }

    pub fn active_waypoint(&self) -> &Waypoint {
        self.trajectory.get(self.state.index())
    }

    pub fn num_laps(&self) -> u64 {
        self.num_laps
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// The waypoints still to be flown, starting with the active one. This sequence never ends.
    pub fn upcoming(&self) -> impl Iterator<Item = (usize, &Waypoint)> + '_ {
        self.trajectory.cycle_from(self.state.index())
    }

    /// Evaluate the error to the active waypoint.
    ///
    /// If approaching and the error is under all thresholds the sequencer moves to `Converged`
    /// and `true` is returned. Once converged the sequencer stays converged until `advance` is
    /// called.
    pub fn evaluate(&mut self, error: &ErrorVector, thresholds: &ConvergenceThresholds) -> bool {
        match self.state {
            SeqState::Approaching(i) => {
                if thresholds.is_converged(error) {
                    debug!("Waypoint {} converged", i);
                    self.state = SeqState::Converged(i);
                    true
                } else {
                    false
                }
            }
            SeqState::Converged(_) => true,
        }
    }

    /// Advance to the next waypoint after a convergence.
    ///
    /// Returns the index of the new active waypoint, or `None` if the sequencer was not converged,
    /// in which case nothing changes.
    pub fn advance(&mut self) -> Option<usize> {
        match self.state {
            SeqState::Converged(i) => {
                let next = self.trajectory.next_index(i);
                if next == 0 {
                    self.num_laps += 1;
                }
                self.state = SeqState::Approaching(next);
                Some(next)
            }
            SeqState::Approaching(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn traj(n: usize) -> Trajectory {
        Trajectory::new(
            (0..n)
                .map(|i| Waypoint::new(51.0 + i as f64 * 1e-4, -4.0, 50.0, 0.0, 0.0))
                .collect()
        ).unwrap()
    }

    fn error(body_x_m: f64, body_y_m: f64, altitude_m: f64, heading_deg: f64) -> ErrorVector {
        ErrorVector {
            body_x_m,
            body_y_m,
            altitude_m,
            heading_deg,
            ..Default::default()
        }
    }

    #[test]
    fn test_thresholds() {
        let t = ConvergenceThresholds::default();

        assert!(t.is_converged(&error(0.49, -0.49, 0.0, -4.9)));
        assert!(!t.is_converged(&error(0.5, 0.0, 0.0, 0.0)));
        assert!(!t.is_converged(&error(0.0, 0.0, -0.6, 0.0)));
        assert!(!t.is_converged(&error(0.0, 0.0, 0.0, 5.0)));
        assert!(!t.is_converged(&error(0.0, 0.0, 0.0, 355.0)));

        // Speed errors play no part
        let mut e = error(0.0, 0.0, 0.0, 0.0);
        e.speed_x_ms = 100.0;
        assert!(t.is_converged(&e));
    }

    #[test]
    fn test_hold_while_approaching() {
        let mut seq = WaypointSequencer::new(traj(3));

        assert_eq!(seq.state(), SeqState::Approaching(0));
        assert!(!seq.evaluate(&error(3.0, 0.0, 0.0, 0.0), &ConvergenceThresholds::default()));
        assert_eq!(seq.state(), SeqState::Approaching(0));
        assert_eq!(seq.advance(), None);
        assert_eq!(seq.active_index(), 0);
    }

    #[test]
    fn test_advance_once_per_convergence() {
        let mut seq = WaypointSequencer::new(traj(3));
        let t = ConvergenceThresholds::default();
        let zero = error(0.0, 0.0, 0.0, 0.0);

        assert!(seq.evaluate(&zero, &t));
        assert_eq!(seq.state(), SeqState::Converged(0));

        // Re-evaluating does not produce a second transition
        assert!(seq.evaluate(&zero, &t));
        assert_eq!(seq.state(), SeqState::Converged(0));

        assert_eq!(seq.advance(), Some(1));
        assert_eq!(seq.advance(), None);
        assert_eq!(seq.state(), SeqState::Approaching(1));
    }

    #[test]
    fn test_wrap_to_first_waypoint() {
        let mut seq = WaypointSequencer::new(traj(3));
        let t = ConvergenceThresholds::default();
        let zero = error(0.0, 0.0, 0.0, 0.0);

        let mut visited = vec![seq.active_index()];
        for _ in 0..4 {
            seq.evaluate(&zero, &t);
            visited.push(seq.advance().unwrap());
        }

        assert_eq!(visited, vec![0, 1, 2, 0, 1]);
        assert_eq!(seq.num_laps(), 1);

        let upcoming: Vec<usize> = seq.upcoming().take(4).map(|(i, _)| i).collect();
        assert_eq!(upcoming, vec![1, 2, 0, 1]);
    }

    #[test]
    fn test_single_waypoint_trajectory() {
        let mut seq = WaypointSequencer::new(traj(1));

        seq.evaluate(&error(0.0, 0.0, 0.0, 0.0), &ConvergenceThresholds::default());

        assert_eq!(seq.advance(), Some(0));
        assert_eq!(seq.num_laps(), 1);
    }
}
