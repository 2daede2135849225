//! Main locomotion executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and LocoCtrl
//!     - Main loop:
//!         - Telecommand processing from the script
//!         - Locomotion control processing, which sends the velocity demand to the (simulated)
//!           motor board
//!         - Sleep for the rest of the cycle
//!     - Once the script has ended, stop the robot
//!
//! The executable takes one argument, the path to the script to run.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use comms_if::tc::Tc;
use loco_lib::{
    loco_ctrl::LocoCtrl,
    nav::StraightPlanner,
    sim_client::{SimMot, SimProx}
};

mod params;
mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info, trace, warn};
use nalgebra::Vector2;
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use params::LocoExecParams;
use util::{
    logger::{logger_init, LevelFilter},
    session::{self, Session},
    script_interpreter::{ScriptInterpreter, PendingTcs}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of cycles to wait for the robot to come to rest at the end of the script.
const MAX_STOPPING_CYCLES: usize = 100;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "loco_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, LevelFilter::Info, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Locomotion Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: LocoExecParams = util::params::load("loco_exec.toml")
        .wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected one argument (the script path), found {}", args.len() - 1)
        );
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut si = ScriptInterpreter::new(&args[1])
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let (mut loco_ctrl, odom_tx) = LocoCtrl::init("loco_ctrl.toml")
        .wrap_err("Failed to initialise LocoCtrl")?;
    info!("LocoCtrl init complete");

    let mut mot = SimMot::new(odom_tx, exec_params.cycle_period_s);
    let mut prox = SimProx::new(
        exec_params.sim_obstacles_mm
            .iter()
            .map(|o| (Vector2::new(o[0], o[1]), o[2]))
            .collect()
    );
    let mut planner = StraightPlanner {
        via_mm: exec_params.sim_via_points_mm
            .iter()
            .map(|p| Vector2::new(p[0], p[1]))
            .collect(),
        blocked: false
    };
    info!("Simulated equipment initialised");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        match si.get_pending_tcs(session::get_elapsed_seconds()) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut loco_ctrl, &mut planner, tc);
                }
            },
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        cycle(&mut loco_ctrl, &mut mot, &mut prox, exec_params.obstacle_detection);

        // ---- CYCLE MANAGEMENT ----

        sleep_until_end_of_cycle(cycle_start_instant, cycle_period);
    }

    // ---- SHUTDOWN ----

    tc_processor::exec(
        &mut loco_ctrl,
        &mut planner,
        &Tc::LocoCtrl(comms_if::tc::loco_ctrl::LocoCmd::Stop)
    );

    for _ in 0..MAX_STOPPING_CYCLES {
        let cycle_start_instant = Instant::now();

        cycle(&mut loco_ctrl, &mut mot, &mut prox, exec_params.obstacle_detection);

        if loco_ctrl.velocity().is_zero() {
            break;
        }

        sleep_until_end_of_cycle(cycle_start_instant, cycle_period);
    }

    info!("Final pose: {:?}", loco_ctrl.pose());
    info!("End of execution");

    Ok(())
}

/// Run one cycle of locomotion control.
fn cycle(
    loco_ctrl: &mut LocoCtrl,
    mot: &mut SimMot,
    prox: &mut SimProx,
    obstacle_detection: bool
) {
    prox.set_robot_pose(loco_ctrl.pose());

    match loco_ctrl.tick(mot, &*prox, obstacle_detection) {
        Ok(r) => trace!("LocoCtrl status: {:?}", r),

        // Actuation errors don't change the mode, so keep going and try again next cycle
        Err(e) => warn!("Error during LocoCtrl processing: {}", e)
    }
}

/// Sleep for whatever remains of the cycle, warning if it overran.
fn sleep_until_end_of_cycle(cycle_start_instant: Instant, cycle_period: Duration) {
    let cycle_dur = Instant::now() - cycle_start_instant;

    match cycle_period.checked_sub(cycle_dur) {
        Some(d) => thread::sleep(d),
        None => warn!(
            "Cycle overran by {:.06} s",
            cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
        )
    }
}
