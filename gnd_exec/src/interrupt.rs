//! # Interrupt handling
//!
//! The control loop may be blocked inside a request for as long as the remote controller takes
//! to answer, so raising the stop flag alone does not neutralise the aircraft promptly. The
//! interrupt handler runs on its own thread with its own client, and sends the neutral command
//! itself on every signal:
//!
//! - First signal: raise the stop flag and send the neutral command. The loop exits at the end
//!   of its current request.
//! - Second signal: send the neutral command again and exit the process.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, warn};
use std::os::raw::c_int;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};

// Internal
use comms_if::{eqpt::StickCmd, net::RemoteStateClient};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Exit status used when the operator interrupts the executable.
pub const INTERRUPT_EXIT_CODE: i32 = 130;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Reacts to termination signals.
pub struct InterruptHandler<C: RemoteStateClient> {
    /// Client used only for the neutral command, independent of the loop's client
    client: C,

    stop: Arc<AtomicBool>,

    num_signals: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the process shall do after a signal has been handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterruptAction {
    /// Let the control loop stop by itself
    Stop,

    /// Exit immediately with the given status
    Exit(i32),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: RemoteStateClient> InterruptHandler<C> {
    pub fn new(client: C, stop: Arc<AtomicBool>) -> Self {
        Self {
            client,
            stop,
            num_signals: 0,
        }
    }

    /// Handle one signal. The neutral command is attempted whatever the signal count.
    pub fn on_signal(&mut self, signal: c_int) -> InterruptAction {
        self.num_signals += 1;
        self.stop.store(true, Ordering::SeqCst);

        let action = if self.num_signals == 1 {
            warn!("Signal {} received, stopping the control loop", signal);
            InterruptAction::Stop
        }
        else {
            error!("Signal {} received again, exiting immediately", signal);
            InterruptAction::Exit(INTERRUPT_EXIT_CODE)
        };

        match self.client.send_stick(&StickCmd::neutral()) {
            Ok(()) => info!("Neutral command sent"),
            Err(e) => error!("Could not send the neutral command: {}", e)
        }

        action
    }

    /// Handle signals until one requires the process to exit, returning the exit status.
    ///
    /// Returns `None` if the signal source ends first.
    pub fn listen<I>(&mut self, signals: I) -> Option<i32>
    where
        I: IntoIterator<Item = c_int>
    {
        for signal in signals {
            if let InterruptAction::Exit(code) = self.on_signal(signal) {
                return Some(code)
            }
        }

        None
    }

    pub fn num_signals(&self) -> u32 {
        self.num_signals
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}
