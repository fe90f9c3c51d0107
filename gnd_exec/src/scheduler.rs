//! # Control Loop Scheduler
//!
//! Drives the trajectory controller against a remote aircraft. One cycle consists of:
//!
//! - Fetching the aircraft state from the remote controller
//! - Trajectory control processing (error, PD command, saturation, convergence)
//! - Sending the stick command
//! - If the waypoint was reached, sending a neutral hold command and advancing to the next
//!   waypoint
//! - Archiving the cycle
//!
//! There is no fixed cycle rate, the period of the loop is the round trip time of the two
//! requests. The period is measured for diagnostics only.
//!
//! Every exit from [`ControlLoopScheduler::run`] attempts to send a neutral command first, so the
//! aircraft is never left flying on a stale command. A stop requested while the state was being
//! fetched abandons the cycle before any command is computed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};
use std::time::Instant;

// Internal
use crate::params::SchedParams;
use crate::traj_ctrl::{StatusReport, TrajCtrl, TrajCtrlError};
use comms_if::{
    eqpt::{AircraftState, StickCmd},
    net::{RemoteStateClient, StateClientError}
};
use util::{
    archive::Archiver,
    module::State,
    session,
    time::std_duration_to_millis
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs the control loop until interrupted.
pub struct ControlLoopScheduler<C: RemoteStateClient> {
    client: C,

    traj_ctrl: TrajCtrl,

    params: SchedParams,

    /// Set from outside (e.g. by a signal handler) to stop the loop
    stop: Arc<AtomicBool>,

    archiver: Option<Archiver>,

    num_consec_comms_errors: u64,

    /// States the remote answered with but which could not be read, over the whole run
    num_malformed_states: u64,

    last_cycle_start: Option<Instant>,

    num_cycles: u64,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    /// Cycle number, starting at zero
    pub cycle: u64,

    /// Trajectory control report of the cycle
    pub status: StatusReport,

    /// Saturated command produced by the cycle
    pub cmd: StickCmd,

    /// True if `cmd` was transmitted successfully
    pub cmd_sent: bool,

    /// If the waypoint was reached, the index of the new active waypoint
    pub advanced_to: Option<usize>,

    /// Time since the start of the previous cycle, `None` on the first cycle
    pub period_ms: Option<f64>,
}

/// A flat archive row, one per cycle.
#[derive(Serialize)]
struct CycleRecord {
    time_s: f64,
    cycle: u64,
    period_ms: f64,
    wp_index: usize,
    east_m: f64,
    north_m: f64,
    up_m: f64,
    body_x_m: f64,
    body_y_m: f64,
    altitude_m: f64,
    heading_deg: f64,
    heading_wrapped_deg: f64,
    speed_x_ms: f64,
    speed_y_ms: f64,
    speed_z_ms: f64,
    raw_left_x: f64,
    raw_left_y: f64,
    raw_right_x: f64,
    raw_right_y: f64,
    left_x: f64,
    left_y: f64,
    right_x: f64,
    right_y: f64,
    saturated: bool,
    converged: bool,
    cmd_sent: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reason for a clean exit of the loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The stop flag was raised
    Interrupted,

    /// The configured maximum number of cycles was reached
    CycleLimit,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Could not fetch the aircraft state: {0}")]
    Fetch(StateClientError),

    #[error("Trajectory control error: {0}")]
    TrajCtrl(#[from] TrajCtrlError),

    #[error("Link to the remote controller lost after {0} consecutive comms errors")]
    CommsLost(u64),

    #[error("Stop requested during the cycle")]
    Interrupted,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: RemoteStateClient> ControlLoopScheduler<C> {
    /// Create a new scheduler.
    ///
    /// `traj_ctrl` must already be initialised.
    pub fn new(
        client: C,
        traj_ctrl: TrajCtrl,
        params: SchedParams,
        stop: Arc<AtomicBool>
    ) -> Self {
        Self {
            client,
            traj_ctrl,
            params,
            stop,
            archiver: None,
            num_consec_comms_errors: 0,
            num_malformed_states: 0,
            last_cycle_start: None,
            num_cycles: 0,
        }
    }

    /// Archive every cycle with the given archiver.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Run cycles until the stop flag is raised, the cycle limit is reached, or a fatal error
    /// occurs.
    pub fn run(&mut self) -> Result<ExitReason, SchedulerError> {
        info!("Beginning control loop");

        loop {
            if self.stop.load(Ordering::SeqCst) {
                info!("Stop requested after {} cycles", self.num_cycles);
                self.safe_stop();
                return Ok(ExitReason::Interrupted)
            }

            if let Some(max) = self.params.max_cycles {
                if self.num_cycles >= max {
                    info!("Cycle limit of {} reached", max);
                    self.safe_stop();
                    return Ok(ExitReason::CycleLimit)
                }
            }

            match self.run_cycle() {
                Ok(report) if report.cmd_sent => {
                    self.num_consec_comms_errors = 0;
                },
                Ok(_) => {
                    self.safe_stop();
                    self.handle_comms_error()?;
                },
                Err(SchedulerError::Fetch(e)) => {
                    if e.is_transport() {
                        warn!("Cycle aborted, remote controller unreachable: {}", e);
                    }
                    else {
                        self.num_malformed_states += 1;
                        warn!(
                            "Cycle aborted, unreadable state ({} so far): {}",
                            self.num_malformed_states, e
                        );
                    }
                    self.safe_stop();
                    self.handle_comms_error()?;
                },
                Err(SchedulerError::Interrupted) => {
                    info!("Stop requested during cycle {}", self.num_cycles - 1);
                    self.safe_stop();
                    return Ok(ExitReason::Interrupted)
                },
                Err(e) => {
                    error!("Control loop failed: {}", e);
                    self.safe_stop();
                    return Err(e)
                }
            }
        }
    }

    /// Execute a single cycle.
    ///
    /// A failure to fetch the state aborts the cycle before any processing. A failure to send the
    /// command is reported in the returned [`CycleReport`], the controller memory and the
    /// convergence evaluation are still updated.
    pub fn run_cycle(&mut self) -> Result<CycleReport, SchedulerError> {
        let cycle = self.num_cycles;
        self.num_cycles += 1;

        // ---- CYCLE TIMING ----

        let cycle_start = Instant::now();
        let period_ms = self
            .last_cycle_start
            .map(|last| std_duration_to_millis(cycle_start - last));
        self.last_cycle_start = Some(cycle_start);

        if let Some(p) = period_ms {
            debug!("Cycle {} period: {:.1} ms", cycle, p);
        }

        // ---- DATA INPUT ----

        let state = self.client.fetch_state().map_err(SchedulerError::Fetch)?;

        trace_state(&state);

        // The fetch may have blocked for long, a command computed now would override the neutral
        // command already sent on the interrupt
        if self.stop.load(Ordering::SeqCst) {
            return Err(SchedulerError::Interrupted)
        }

        // ---- TRAJECTORY CONTROL ----

        let (cmd, status) = self.traj_ctrl.proc(&state)?;

        // ---- COMMAND OUTPUT ----

        let cmd_sent = match self.client.send_stick(&cmd) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not send the stick command: {}", e);
                false
            }
        };

        // ---- SEQUENCING ----

        let mut advanced_to = None;

        if status.converged {
            info!("Waypoint {} reached", status.wp_index);

            if let Err(e) = self.client.send_stick(&StickCmd::neutral()) {
                warn!("Could not send the hold command: {}", e);
            }

            let next = self.traj_ctrl.advance()?;
            info!("Approaching waypoint {}", next);
            advanced_to = Some(next);
        }

        let report = CycleReport {
            cycle,
            status,
            cmd,
            cmd_sent,
            advanced_to,
            period_ms,
        };

        // ---- ARCHIVE ----

        self.archive(&report);

        Ok(report)
    }

    /// Attempt to send a neutral command. Returns true if it was sent.
    pub fn safe_stop(&mut self) -> bool {
        match self.client.send_stick(&StickCmd::neutral()) {
            Ok(()) => {
                debug!("Neutral command sent");
                true
            },
            Err(e) => {
                error!("Could not send the neutral command: {}", e);
                false
            }
        }
    }

    pub fn traj_ctrl(&self) -> &TrajCtrl {
        &self.traj_ctrl
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Number of cycles started so far, including aborted ones.
    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn num_consec_comms_errors(&self) -> u64 {
        self.num_consec_comms_errors
    }

    /// Number of fetches which reached the remote but returned an unreadable state.
    pub fn num_malformed_states(&self) -> u64 {
        self.num_malformed_states
    }

    /// Consume the scheduler, returning the client.
    pub fn into_client(self) -> C {
        self.client
    }

    /// Count a comms error, failing once the limit has been exceeded.
    fn handle_comms_error(&mut self) -> Result<(), SchedulerError> {
        self.num_consec_comms_errors += 1;

        if self.num_consec_comms_errors > self.params.max_consec_comms_errors {
            error!(
                "Maximum number of consecutive comms errors ({}) has been exceeded",
                self.params.max_consec_comms_errors
            );
            self.safe_stop();
            return Err(SchedulerError::CommsLost(self.num_consec_comms_errors))
        }

        Ok(())
    }

    fn archive(&mut self, report: &CycleReport) {
        let archiver = match self.archiver.as_mut() {
            Some(a) => a,
            None => return
        };

        let status = &report.status;
        let record = CycleRecord {
            time_s: session::get_elapsed_seconds(),
            cycle: report.cycle,
            period_ms: report.period_ms.unwrap_or(std::f64::NAN),
            wp_index: status.wp_index,
            east_m: status.error.east_m,
            north_m: status.error.north_m,
            up_m: status.error.up_m,
            body_x_m: status.error.body_x_m,
            body_y_m: status.error.body_y_m,
            altitude_m: status.error.altitude_m,
            heading_deg: status.error.heading_deg,
            heading_wrapped_deg: status.heading_wrapped_deg,
            speed_x_ms: status.error.speed_x_ms,
            speed_y_ms: status.error.speed_y_ms,
            speed_z_ms: status.error.speed_z_ms,
            raw_left_x: status.raw_cmd.left_x,
            raw_left_y: status.raw_cmd.left_y,
            raw_right_x: status.raw_cmd.right_x,
            raw_right_y: status.raw_cmd.right_y,
            left_x: report.cmd.left_x,
            left_y: report.cmd.left_y,
            right_x: report.cmd.right_x,
            right_y: report.cmd.right_y,
            saturated: status.saturated,
            converged: status.converged,
            cmd_sent: report.cmd_sent,
        };

        if let Err(e) = archiver.serialise(record) {
            warn!("Cycle archiving disabled: {}", e);
            self.archiver = None;
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn trace_state(state: &AircraftState) {
    trace!(
        "Aircraft at ({:.7}, {:.7}, {:.2} m), heading {:.2} deg, speed ({:.2}, {:.2}, {:.2}) m/s",
        state.position.latitude,
        state.position.longitude,
        state.position.altitude,
        state.heading,
        state.velocity.x,
        state.velocity.y,
        state.velocity.z
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_ctrl::{Params, Trajectory, Waypoint};
    use comms_if::eqpt::GeoPosition;

    /// Always returns the same state, records everything sent.
    struct FixedClient {
        state: AircraftState,
        sent: Vec<StickCmd>,
    }

    impl RemoteStateClient for FixedClient {
        fn fetch_state(&mut self) -> Result<AircraftState, StateClientError> {
            Ok(self.state)
        }

        fn send_stick(&mut self, cmd: &StickCmd) -> Result<(), StateClientError> {
            self.sent.push(*cmd);
            Ok(())
        }
    }

    #[test]
    fn test_uninitialised_traj_ctrl_is_fatal() {
        let client = FixedClient { state: AircraftState::default(), sent: vec![] };
        let mut sched = ControlLoopScheduler::new(
            client,
            TrajCtrl::default(),
            SchedParams::default(),
            Arc::new(AtomicBool::new(false))
        );

        assert!(matches!(
            sched.run(),
            Err(SchedulerError::TrajCtrl(TrajCtrlError::NotInitialised))
        ));
        assert_eq!(sched.client().sent, vec![StickCmd::neutral()]);
    }

    #[test]
    fn test_archive_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycles.csv");

        let mut traj_ctrl = TrajCtrl::default();
        traj_ctrl.init((
            Params::default(),
            Trajectory::new(vec![Waypoint::new(51.0, -4.0, 10.0, 0.0, 0.0)]).unwrap()
        )).unwrap();

        let client = FixedClient {
            state: AircraftState {
                position: GeoPosition { latitude: 51.0, longitude: -4.0, altitude: 5.0 },
                ..Default::default()
            },
            sent: vec![],
        };

        let params = SchedParams { max_cycles: Some(3), ..Default::default() };
        let mut sched = ControlLoopScheduler::new(
            client,
            traj_ctrl,
            params,
            Arc::new(AtomicBool::new(false))
        ).with_archiver(Archiver::create(&path).unwrap());

        assert_eq!(sched.run().unwrap(), ExitReason::CycleLimit);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("time_s,cycle,period_ms,wp_index,"));
        assert!(lines[1].contains(",NaN,"));
    }
}
