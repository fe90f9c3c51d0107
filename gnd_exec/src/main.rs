//! Main ground-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Connect to the remote controller and send a neutral command
//!     - Wait for the operator to confirm the start of the trajectory
//!     - Run the control loop until interrupted
//!
//! Interrupting the executable (Ctrl-C) sends a neutral command from a dedicated thread, then stops
//! the loop and exits with status 130. A second interrupt sends the neutral command again and exits
//! immediately.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use signal_hook::{consts::TERM_SIGNALS, iterator::Signals};
use std::io::{self, Write};
use std::process;
use std::thread;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};
use structopt::StructOpt;

// Internal
use comms_if::{
    eqpt::StickCmd,
    net::{HttpStateClient, RemoteStateClient}
};
use gnd_lib::{
    interrupt::{InterruptHandler, INTERRUPT_EXIT_CODE},
    params::GndExecParams,
    scheduler::{ControlLoopScheduler, ExitReason},
    traj_ctrl::{self, TrajCtrl, Trajectory}
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, parse_level, LevelFilter},
    module::State,
    params,
    session::{Session, SessionError}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fly a waypoint trajectory with a remote controlled aircraft.
#[derive(Debug, StructOpt)]
#[structopt(name = "gnd_exec")]
struct Opts {
    /// Address of the remote controller, as `host`, `host:port` or a full URL
    address: String,

    /// Send a single full left X command then exit, to check the remote controller's watchdog
    #[structopt(long)]
    watchdog_test: bool,

    /// Start the trajectory without asking for confirmation
    #[structopt(long)]
    no_confirm: bool,

    /// Minimum log level, one of `info`, `debug` or `trace`
    #[structopt(long, default_value = "info", parse(try_from_str = parse_level))]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Sessions go under the software root if set, or the working directory otherwise
    let session = match Session::new("gnd_exec", "sessions") {
        Err(SessionError::SwRootNotSet) => Session::new_in("gnd_exec", "sessions"),
        s => s
    }.wrap_err("Failed to create the session")?;

    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Ground Trajectory Executable\n");
    info!("Running on: {}", host::get_hostname());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: GndExecParams = params::load_or_default("gnd_exec.toml")
        .wrap_err("Could not load exec params")?;
    let traj_ctrl_params: traj_ctrl::Params = params::load_or_default("traj_ctrl.toml")
        .wrap_err("Could not load TrajCtrl params")?;
    let trajectory: Trajectory = params::load_or_default("trajectory.toml")
        .wrap_err("Could not load the trajectory")?;

    info!("Parameters loaded");
    info!("Trajectory contains {} waypoints", trajectory.len());

    // ---- SIGNAL HANDLING ----

    // The handler has its own client with a bounded timeout, so that the neutral command goes out
    // even while the loop is blocked in a request
    let stop = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new(TERM_SIGNALS)
        .wrap_err("Failed to register the signal handlers")?;
    let mut interrupt_handler = InterruptHandler::new(
        HttpStateClient::new(&opts.address, &exec_params.net.for_stop()),
        Arc::clone(&stop)
    );

    thread::Builder::new()
        .name("interrupt".into())
        .spawn(move || {
            if let Some(code) = interrupt_handler.listen(signals.forever()) {
                process::exit(code);
            }
        })
        .wrap_err("Failed to start the interrupt thread")?;

    // ---- INITIALISE NETWORK ----

    let mut client = HttpStateClient::new(&opts.address, &exec_params.net);
    info!("Connecting to the remote controller at {}", client.base_url());

    let banner = client.ping()
        .wrap_err("Could not reach the remote controller")?;
    info!("Remote controller: {}", banner.trim());

    if opts.watchdog_test {
        return watchdog_test(&mut client);
    }

    client.send_stick(&StickCmd::neutral())
        .wrap_err("Could not send the initial neutral command")?;
    info!("Neutral command sent");

    // ---- OPERATOR CONFIRMATION ----

    if exec_params.sched.confirm_start && !opts.no_confirm {
        if !confirm_start().wrap_err("Could not read the operator confirmation")? {
            info!("Trajectory not started");
            return Ok(())
        }
    }

    if stop.load(Ordering::SeqCst) {
        info!("Interrupted before the trajectory started");
        if let Err(e) = client.send_stick(&StickCmd::neutral()) {
            warn!("Could not send the neutral command: {}", e);
        }
        process::exit(INTERRUPT_EXIT_CODE);
    }

    // ---- INITIALISE MODULES ----

    let mut traj_ctrl = TrajCtrl::default();
    traj_ctrl.init((traj_ctrl_params, trajectory))
        .wrap_err("Failed to initialise TrajCtrl")?;
    info!("TrajCtrl init complete");

    let mut scheduler = ControlLoopScheduler::new(
        client,
        traj_ctrl,
        exec_params.sched.clone(),
        Arc::clone(&stop)
    );

    if exec_params.sched.archive_cycles {
        match Archiver::from_path(&session, "cycles.csv") {
            Ok(a) => scheduler = scheduler.with_archiver(a),
            Err(e) => warn!("Cycles will not be archived: {}", e)
        }
    }

    // ---- MAIN LOOP ----

    let exit = scheduler.run()
        .wrap_err("The control loop stopped on an error")?;

    // ---- SHUTDOWN ----

    match exit {
        ExitReason::Interrupted => {
            info!("Interrupted by the operator");
            process::exit(INTERRUPT_EXIT_CODE);
        },
        ExitReason::CycleLimit => info!("End of execution")
    }

    Ok(())
}

/// Ask the operator on stdin whether to start the trajectory.
///
/// Anything other than `n` or `no` is taken as a yes.
fn confirm_start() -> io::Result<bool> {
    print!("Start trajectory? [Y/n] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    let answer = answer.trim().to_ascii_lowercase();

    Ok(!(answer == "n" || answer == "no"))
}

/// Send a single full left X command. The remote controller's watchdog is expected to return the
/// sticks to neutral by itself.
fn watchdog_test(client: &mut HttpStateClient) -> Result<(), Report> {
    warn!("Watchdog test: sending left X = 1.0");

    client.send_stick(&StickCmd::new(1.0, 0.0, 0.0, 0.0))
        .wrap_err("Could not send the watchdog test command")?;

    info!("Watchdog test command sent");

    Ok(())
}
