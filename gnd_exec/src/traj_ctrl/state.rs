//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::*;
use comms_if::eqpt::{AircraftState, StickCmd, STICK_LIMIT};
use util::{maths::get_ang_dist_360, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The trajectory control module.
///
/// Must be initialised with `State::init` before the first call to `proc`.
#[derive(Default)]
pub struct TrajCtrl {
    params: Params,

    /// Waypoint sequencer, `None` until initialised
    sequencer: Option<WaypointSequencer>,

    /// Errors of the previous cycle
    memory: ControllerMemory,

    report: StatusReport,
}

/// The status report containing the errors and commands of the cycle.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Index of the waypoint the cycle was computed against
    pub wp_index: usize,

    /// Error to the waypoint
    pub error: ErrorVector,

    /// Heading error wrapped into `(-180, 180]`. Diagnostic only, the controller and the
    /// convergence check use the unwrapped error.
    pub heading_wrapped_deg: f64,

    /// Command produced by the control law, before saturation
    pub raw_cmd: StickCmd,

    /// True if at least one channel was saturated
    pub saturated: bool,

    /// True if the waypoint was reached this cycle
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur in the trajectory control module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrajCtrlError {
    #[error("The saturation limit must be finite, positive and at most {}, found {0}", STICK_LIMIT)]
    InvalidSatLimit(f64),

    #[error("TrajCtrl has not been initialised")]
    NotInitialised,

    #[error("Cannot advance to the next waypoint before the active one has been reached")]
    NotConverged,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrajCtrl {
    type InitData = (Params, Trajectory);
    type InitError = TrajCtrlError;

    type InputData = AircraftState;
    type OutputData = StickCmd;
    type StatusReport = StatusReport;
    type ProcError = TrajCtrlError;

    /// Initialise the TrajCtrl module.
    ///
    /// Expected init data is the parameters and the trajectory to fly. Any previous sequence and
    /// controller memory are discarded.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let (params, trajectory) = init_data;

        if !(params.sat_limit.is_finite()
            && params.sat_limit > 0.0
            && params.sat_limit <= STICK_LIMIT)
        {
            return Err(TrajCtrlError::InvalidSatLimit(params.sat_limit));
        }

        self.params = params;
        self.sequencer = Some(WaypointSequencer::new(trajectory));
        self.memory = ControllerMemory::default();
        self.report = StatusReport::default();

        Ok(())
    }

    /// Process trajectory control.
    ///
    /// Processing involves:
    ///  1. Calculating the error between the aircraft and the active waypoint
    ///  1. Calculating the PD command and updating the controller memory
    ///  1. Saturating the command
    ///  1. Evaluating whether the waypoint has been reached
    ///
    /// The controller memory is updated exactly once per call.
    fn proc(
        &mut self,
        input_data: &Self::InputData
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let sequencer = self.sequencer.as_mut().ok_or(TrajCtrlError::NotInitialised)?;

        self.report = StatusReport::default();
        self.report.wp_index = sequencer.active_index();

        // ---- ERROR CALCULATION ----

        let error = calc_error(sequencer.active_waypoint(), input_data);
        self.report.error = error;
        self.report.heading_wrapped_deg =
            get_ang_dist_360(input_data.heading, sequencer.active_waypoint().target_heading);

        trace!("Error to waypoint {}: {:?}", self.report.wp_index, error);

        // ---- COMMAND GENERATION ----

        let (raw_cmd, memory) = calc_command(&error, &self.memory, &self.params.gains);
        self.memory = memory;
        self.report.raw_cmd = raw_cmd;

        let cmd = saturate(&raw_cmd, self.params.sat_limit);
        self.report.saturated = sat::is_saturated(&raw_cmd, self.params.sat_limit);

        // ---- CONVERGENCE ----

        self.report.converged = sequencer.evaluate(&error, &self.params.thresholds);

        debug!(
            "WP {}: dX {:.3} m, dY {:.3} m, dAlt {:.3} m, dHead {:.2} deg -> {:?}",
            self.report.wp_index,
            error.body_x_m,
            error.body_y_m,
            error.altitude_m,
            error.heading_deg,
            cmd
        );

        Ok((cmd, self.report))
    }
}

impl TrajCtrl {
    /// Advance to the next waypoint once the active one has been reached.
    ///
    /// Returns the index of the new active waypoint.
    pub fn advance(&mut self) -> Result<usize, TrajCtrlError> {
        let sequencer = self.sequencer.as_mut().ok_or(TrajCtrlError::NotInitialised)?;

        let next = sequencer.advance().ok_or(TrajCtrlError::NotConverged)?;

        if self.params.reset_memory_on_advance {
            self.memory = ControllerMemory::default();
        }

        Ok(next)
    }

    /// The sequencer, if initialised.
    pub fn sequencer(&self) -> Option<&WaypointSequencer> {
        self.sequencer.as_ref()
    }

    /// The errors carried over from the last cycle.
    pub fn memory(&self) -> &ControllerMemory {
        &self.memory
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::{GeoPosition, Velocity};

    fn state_at(latitude: f64, longitude: f64, altitude: f64, heading: f64) -> AircraftState {
        AircraftState {
            position: GeoPosition { latitude, longitude, altitude },
            heading,
            velocity: Velocity::default(),
        }
    }

    fn init_traj_ctrl(params: Params, waypoints: Vec<Waypoint>) -> TrajCtrl {
        let mut tc = TrajCtrl::default();
        tc.init((params, Trajectory::new(waypoints).unwrap())).unwrap();
        tc
    }

    #[test]
    fn test_not_initialised() {
        let mut tc = TrajCtrl::default();

        assert_eq!(
            tc.proc(&AircraftState::default()).unwrap_err(),
            TrajCtrlError::NotInitialised
        );
        assert_eq!(tc.advance().unwrap_err(), TrajCtrlError::NotInitialised);
    }

    #[test]
    fn test_invalid_sat_limit() {
        for limit in [0.0, -0.3, 1.5, f64::NAN].iter() {
            let params = Params { sat_limit: *limit, ..Default::default() };
            let mut tc = TrajCtrl::default();

            assert!(matches!(
                tc.init((params, Trajectory::default())),
                Err(TrajCtrlError::InvalidSatLimit(_))
            ));
        }
    }

    #[test]
    fn test_immediate_convergence_at_waypoint() {
        let mut tc = init_traj_ctrl(
            Params::default(),
            vec![
                Waypoint::new(51.1893, -4.41103, 50.0, 0.0, 0.0),
                Waypoint::new(51.1890, -4.41300, 25.0, 0.0, 0.0),
            ]
        );

        let (cmd, report) = tc.proc(&state_at(51.1893, -4.41103, 50.0, 0.0)).unwrap();

        assert!(report.converged);
        assert_eq!(report.wp_index, 0);
        assert!(cmd.channels().iter().all(|c| c.abs() < 1e-9));
        assert_eq!(tc.sequencer().unwrap().state(), SeqState::Converged(0));

        assert_eq!(tc.advance(), Ok(1));
        assert_eq!(tc.sequencer().unwrap().state(), SeqState::Approaching(1));
        assert_eq!(tc.advance(), Err(TrajCtrlError::NotConverged));
    }

    #[test]
    fn test_far_waypoint_saturates() {
        let mut tc = init_traj_ctrl(
            Params::default(),
            vec![Waypoint::new(51.1900, -4.41103, 80.0, 90.0, 0.0)]
        );

        let (cmd, report) = tc.proc(&state_at(51.1893, -4.41103, 50.0, 0.0)).unwrap();

        assert!(!report.converged);
        assert!(report.saturated);
        assert!(cmd.channels().iter().all(|c| c.abs() <= 0.3));

        // Ahead and above
        assert_eq!(cmd.right_y, 0.3);
        assert_eq!(cmd.left_y, 0.3);
        assert!(cmd.right_x.abs() < 1e-3);

        // From rest the inverted heading difference cancels the proportional term
        assert!(cmd.left_x.abs() < 1e-12);
        assert!(report.raw_cmd.left_x.abs() < 1e-12);
    }

    #[test]
    fn test_memory_updated_each_cycle() {
        let mut tc = init_traj_ctrl(
            Params::default(),
            vec![Waypoint::new(51.1893, -4.41103, 52.0, 20.0, 0.0)]
        );

        tc.proc(&state_at(51.1893, -4.41103, 50.0, 0.0)).unwrap();
        assert!((tc.memory().altitude_m - 2.0).abs() < 1e-6);
        assert_eq!(tc.memory().heading_deg, 20.0);

        tc.proc(&state_at(51.1893, -4.41103, 51.0, 10.0)).unwrap();
        assert!((tc.memory().altitude_m - 1.0).abs() < 1e-6);
        assert_eq!(tc.memory().heading_deg, 10.0);
    }

    #[test]
    fn test_memory_reset_on_advance() {
        let waypoints = vec![
            Waypoint::new(51.1893, -4.41103, 50.3, 2.0, 0.0),
            Waypoint::new(51.1890, -4.41300, 25.0, 0.0, 0.0),
        ];

        // Kept by default
        let mut tc = init_traj_ctrl(Params::default(), waypoints.clone());
        tc.proc(&state_at(51.1893, -4.41103, 50.0, 0.0)).unwrap();
        tc.advance().unwrap();
        assert_eq!(tc.memory().heading_deg, 2.0);

        // Cleared if requested
        let params = Params { reset_memory_on_advance: true, ..Default::default() };
        let mut tc = init_traj_ctrl(params, waypoints);
        tc.proc(&state_at(51.1893, -4.41103, 50.0, 0.0)).unwrap();
        tc.advance().unwrap();
        assert_eq!(*tc.memory(), ControllerMemory::default());
    }

    #[test]
    fn test_wrapped_heading_diagnostic() {
        let mut tc = init_traj_ctrl(
            Params::default(),
            vec![Waypoint::new(51.1893, -4.41103, 50.0, 1.0, 0.0)]
        );

        let (_, report) = tc.proc(&state_at(51.1893, -4.41103, 50.0, 359.0)).unwrap();

        assert_eq!(report.error.heading_deg, -358.0);
        assert_eq!(report.heading_wrapped_deg, 2.0);
        assert!(!report.converged);
    }
}
