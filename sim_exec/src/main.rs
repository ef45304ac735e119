//! Simulation executable entry point.
//!
//! # Architecture
//!
//! Drives a simulated skid steer robot around a sequence of paths with the
//! full Cyan core stack in the loop:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Position determination from the simulated sensors
//!         - Pure pursuit target selection
//!         - Heading control and vector interpretation
//!         - Propagation of the simulated robot
//!
//! The estimated and true trajectories, along with every debug packet, are
//! saved into the session directory on exit.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, info, warn};
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use cyan_core::{
    debug::{DebugLogger, DebugPacket},
    geom::Pose2D,
    loc::{self, PoseEstimator},
    loco_ctrl::{self, Interpreter},
    path::{Path, PathSequence},
    pid::{Clock, PidController},
    traj_ctrl::{self, PathFollower},
};
use params::SimExecParams;
use sim::{SimClock, SimRobot};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    maths::wrap_to_pi,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options
#[derive(Debug, StructOpt)]
#[structopt(name = "sim_exec", about = "Follow a path sequence with a simulated robot")]
struct Opt {
    /// Parameter file for the executable, relative to the params directory
    #[structopt(short, long, default_value = "sim_exec.toml")]
    params: String,

    /// Minimum level of log records, at least `info`
    #[structopt(short, long, default_value = "debug")]
    log_level: LevelFilter,
}

/// One cycle of the saved trajectory.
#[derive(Debug, Serialize)]
struct TrajectoryPoint {
    time_s: f64,
    estimate: Pose2D,
    truth: Pose2D,
    motor_powers: Vec<f64>,
    path_index: usize,
    segment_index: usize,
}

/// Debug packets pushed during one cycle.
#[derive(Debug, Serialize)]
struct DebugCycle {
    cycle: u64,
    packets: Vec<DebugPacket>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opt = Opt::from_args();

    // Initialise session
    let session = Session::new(
        "sim_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Cyan Simulation Executable\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: SimExecParams = util::params::load(&opt.params)
        .wrap_err("Could not load exec params")?;
    let loc_params: loc::Params = util::params::load("loc.toml")
        .wrap_err("Could not load loc params")?;
    let loco_ctrl_params: loco_ctrl::Params = util::params::load("loco_ctrl.toml")
        .wrap_err("Could not load loco_ctrl params")?;
    let traj_ctrl_params: traj_ctrl::Params = util::params::load("traj_ctrl.toml")
        .wrap_err("Could not load traj_ctrl params")?;

    info!("Exec parameters loaded");
    debug!("Exec parameters: {:#?}", exec_params);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut robot = SimRobot::new(
        &loc_params,
        exec_params.full_power_speed,
        exec_params.track_width
    ).wrap_err("Failed to initialise the simulated robot")?;

    let meas = robot.measurements(&loc_params.chassis)
        .wrap_err("Failed to build the simulated sensors")?;
    let estimator = PoseEstimator::from_params(&loc_params, meas)
        .wrap_err("Failed to initialise the pose estimator")?;
    info!("Loc init complete, {} estimator", loc_params.chassis.kind());

    let interpreter = Interpreter::from_params(&loco_ctrl_params);
    if let Interpreter::Mecanum(_) = interpreter {
        return Err(eyre!("The simulated robot only supports tank locomotion"));
    }
    info!("LocoCtrl init complete");

    let clock = SimClock::new();
    let pid = PidController::with_clock(traj_ctrl_params.pid_coefficients(), clock.clone());
    let mut follower = PathFollower::with_pid(estimator, interpreter, pid);
    follower.apply_params(&traj_ctrl_params)
        .wrap_err("Failed to initialise TrajCtrl")?;

    let debug_logger = DebugLogger::new_shared(exec_params.debug_capacity)
        .wrap_err("Failed to initialise the debug logger")?;
    follower.attach_logger(debug_logger.clone());
    info!("TrajCtrl init complete");

    let mut paths = Vec::with_capacity(exec_params.paths.len());
    for points in exec_params.paths.iter() {
        let path = match exec_params.path_unit {
            Some(unit) => Path::with_unit(points.clone(), unit),
            None => Path::new(points.clone()),
        }.wrap_err("Invalid path in the exec params")?;
        paths.push(path);
    }
    let mut path_seq = PathSequence::new(paths, traj_ctrl_params.admissible_error)
        .wrap_err("Invalid path sequence in the exec params")?;

    info!(
        "Following {} paths, {:.03} long in total\n",
        path_seq.paths().len(),
        path_seq.paths().iter().map(|p| p.length()).sum::<f64>()
    );

    // ---- MAIN LOOP ----

    let mut trajectory = Vec::new();
    let mut debug_cycles = Vec::new();
    let mut finished = false;

    info!("Begining main loop\n");

    for cycle in 0..exec_params.max_cycles {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- CONTROL ALGORITHM PROCESSING ----

        let following = follower.follow_path_sequence(&mut path_seq)
            .wrap_err("Error during TrajCtrl processing")?;
        follower.push_debug();

        // ---- SIMULATION ----

        robot.step(follower.motor_powers(), exec_params.cycle_period_s)
            .wrap_err("Error propagating the simulated robot")?;
        clock.advance(exec_params.cycle_period_s);

        trajectory.push(TrajectoryPoint {
            time_s: clock.now_s(),
            estimate: follower.pose(),
            truth: robot.pose(),
            motor_powers: follower.motor_powers().to_vec(),
            path_index: path_seq.current_index(),
            segment_index: path_seq.current().segment_index(),
        });

        let packets = debug_logger.borrow_mut().dump();
        if !packets.is_empty() {
            debug_cycles.push(DebugCycle { cycle, packets });
        }

        if !following {
            info!("Path sequence finished after {} cycles", cycle + 1);
            finished = true;
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        if exec_params.real_time {
            let cycle_dur = Instant::now() - cycle_start_instant;

            // Get sleep duration
            match Duration::from_secs_f64(exec_params.cycle_period_s)
                .checked_sub(cycle_dur)
            {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - exec_params.cycle_period_s
                )
            }
        }
    }

    // ---- SHUTDOWN ----

    if !finished {
        warn!(
            "Path sequence not finished after {} cycles",
            exec_params.max_cycles
        );
    }

    let truth = robot.pose();
    let estimate = follower.pose();
    let goal = path_seq.current().last_point();
    info!("Final true pose: {}", truth);
    info!("Distance to goal: {:.04}", goal.distance_from_pose(&truth));
    info!(
        "Estimate error: {:.06} (position), {:.06} rad (heading)",
        estimate.position().distance_from_pose(&truth),
        wrap_to_pi(estimate.heading_rad() - truth.heading_rad()).abs()
    );

    session.save("trajectory.json", trajectory);
    session.save("debug.json", debug_cycles);

    session.exit();

    Ok(())
}
