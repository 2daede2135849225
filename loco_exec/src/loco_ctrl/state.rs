//! Implementations for the LocoCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector2;
use serde::Serialize;
use std::time::Instant;

// Internal
use super::*;
use crate::kin::{Velocity, VelocityEnvelope};
use crate::loc::{sensor_link, DriftFlags, OdomSender, Pose, SensorLink, SensorUpdate};
use crate::nav::PathPlanner;
use crate::obs_limit::{ObsLimiter, ObsReport};
use crate::rel_ctrl::RelCtrl;
use crate::traj_ctrl::{TrajCtrl, Trajectory, TrajectoryPoint};
use comms_if::eqpt::mot::MotLink;
use comms_if::eqpt::prox::ProxSource;
use comms_if::tc::loco_ctrl::LocoCmd;
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locomotion control module state
pub struct LocoCtrl {
    pub(crate) params: Params,

    mode: Mode,

    /// Mode to resume on `restart`. Only one is remembered.
    previous_mode: Option<Mode>,

    pub(crate) pose: Pose,

    /// The velocity sent on the last cycle.
    pub(crate) velocity: Velocity,

    /// Velocity held in `DirectSpeed` mode.
    direct_speed: Velocity,

    pub(crate) drift: DriftFlags,

    /// Last velocity measured by the motor board.
    measured_velocity: Velocity,

    traj_ctrl: TrajCtrl,
    rel_ctrl: RelCtrl,
    obs_limiter: ObsLimiter,

    pub(crate) is_repositioning: bool,
    pub(crate) reposition_target: RepositionTarget,
    pub(crate) reposition_elapsed_s: f64,

    sensors: SensorLink,

    /// Time of the last call to `tick`.
    last_tick: Option<Instant>,

    pub(crate) report: StatusReport
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct StatusReport {
    /// Mode the cycle ran in.
    pub mode: Mode,

    /// Cycle period used.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Envelope the demand was clamped into.
    pub envelope: VelocityEnvelope,

    /// Obstacle limiter output, `None` if obstacle detection was off.
    pub obstacles: Option<ObsReport>,

    /// The demand was outside the envelope.
    pub envelope_limited: bool,

    /// The demand was further limited by the acceleration limits.
    pub accel_limited: bool,

    /// The velocity sent to the motor board.
    pub velocity: Velocity
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StatusReport {
    fn new(mode: Mode, envelope: VelocityEnvelope) -> Self {
        Self {
            mode,
            dt_s: 0.0,
            envelope,
            obstacles: None,
            envelope_limited: false,
            accel_limited: false,
            velocity: Velocity::zero()
        }
    }
}

impl LocoCtrl {

    /// Create a new controller, returning it alongside the sender the
    /// communications layer posts motor board reports into.
    ///
    /// The robot starts at the origin in `PositionControl` with no trajectory.
    pub fn new(params: Params) -> (Self, OdomSender) {
        let (tx, sensors) = sensor_link();
        let base = VelocityEnvelope::from_limits(&params.limits);

        let ctrl = Self {
            traj_ctrl: TrajCtrl::new(params.limits, params.traj_ctrl.clone()),
            rel_ctrl: RelCtrl::new(params.limits, params.traj_ctrl.braking_dist_factor),
            obs_limiter: ObsLimiter::new(params.obs_limit.clone()),
            params,
            mode: Mode::PositionControl,
            previous_mode: None,
            pose: Pose::default(),
            velocity: Velocity::zero(),
            direct_speed: Velocity::zero(),
            drift: DriftFlags::default(),
            measured_velocity: Velocity::zero(),
            is_repositioning: false,
            reposition_target: RepositionTarget::default(),
            reposition_elapsed_s: 0.0,
            sensors,
            last_tick: None,
            report: StatusReport::new(Mode::PositionControl, base)
        };

        (ctrl, tx)
    }

    /// Create a new controller from a parameter file.
    ///
    /// The path is relative to the parameters directory.
    pub fn init(param_file_path: &str) -> Result<(Self, OdomSender), LocoCtrlError> {
        let params: Params = params::load(param_file_path)?;

        Ok(Self::new(params))
    }

    // ---- OPERATIONS ----

    /// Drive to the pose along a single-point trajectory.
    pub fn go_to_pose(&mut self, x_mm: f64, y_mm: f64, theta_rad: f64) {
        self.ingest_sensors();

        self.traj_ctrl.new_trajectory(
            Trajectory::to_pose(x_mm, y_mm, theta_rad),
            &self.pose
        );
        self.set_mode(Mode::PositionControl);
    }

    /// Ask the planner for a route to the pose and follow it.
    ///
    /// Intermediate points are flowed through with a zero heading, the final
    /// point is a stopping point at `theta_rad`. If the planner finds no route
    /// the mode is left unchanged and `false` is returned.
    pub fn navigate_to(
        &mut self,
        planner: &mut dyn PathPlanner,
        x_mm: f64,
        y_mm: f64,
        theta_rad: f64
    ) -> bool {
        self.ingest_sensors();

        let goal_mm = Vector2::new(x_mm, y_mm);
        let path = match planner.find_path(self.pose.position_mm, goal_mm) {
            Some(p) if p.len() >= 2 => p,
            _ => {
                warn!(
                    "No path found from {:?} to {:?}, staying in {:?}",
                    self.pose.position_mm, goal_mm, self.mode
                );
                return false
            }
        };

        let flow_speed_mms = self.params.traj_ctrl.flow_speed_mms;
        let last = path.len() - 1;

        let points = path
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, p)| match i == last {
                true => TrajectoryPoint::new(p[0], p[1], theta_rad, 0.0),
                false => TrajectoryPoint::new(p[0], p[1], 0.0, flow_speed_mms)
            })
            .collect();

        self.traj_ctrl.new_trajectory(Trajectory::new(points), &self.pose);
        self.set_mode(Mode::PositionControl);

        true
    }

    /// Drive straight for a signed distance.
    ///
    /// Distances within the admitted position error are pushed just outside
    /// it so the goal is not immediately satisfied.
    pub fn go_straight(&mut self, distance_mm: f64) {
        self.ingest_sensors();

        let err = self.params.limits.admitted_position_error_mm;
        let distance_mm = push_out_of_band(distance_mm, err, 1.0);

        self.set_mode(Mode::RelativeControl);
        self.rel_ctrl.new_straight_goal(distance_mm, &self.pose);
    }

    /// Turn on the spot by a signed angle.
    ///
    /// Angles within the admitted angle error are pushed just outside it.
    pub fn turn(&mut self, angle_rad: f64) {
        self.ingest_sensors();

        let err = self.params.limits.admitted_angle_error_rad;
        let angle_rad = push_out_of_band(angle_rad, err, 0.001);

        self.set_mode(Mode::RelativeControl);
        self.rel_ctrl.new_rotate_goal(angle_rad, &self.pose);
    }

    /// Hold a fixed velocity.
    ///
    /// If the robot is stopped the mode switch is deferred until `restart`.
    pub fn set_direct_speed(&mut self, vx_mms: f64, vy_mms: f64, vtheta_rads: f64) {
        if self.mode == Mode::Stopped {
            self.previous_mode = Some(Mode::DirectSpeed);
        }
        else {
            self.set_mode(Mode::DirectSpeed);
        }

        self.direct_speed = Velocity::new(vx_mms, vy_mms, vtheta_rads);
    }

    /// Drive into a hard stop and reset the pose.
    pub fn start_repositioning(
        &mut self,
        x_mm: Option<f64>,
        y_mm: Option<f64>,
        theta_rad: Option<f64>
    ) {
        info!("Repositioning started");

        self.set_mode(Mode::Repositioning);
        self.is_repositioning = true;
        self.reposition_target = RepositionTarget { x_mm, y_mm, theta_rad };
        self.reposition_elapsed_s = 0.0;
    }

    /// Stop, remembering the active mode.
    pub fn stop(&mut self) {
        self.previous_mode = Some(self.mode);
        self.set_mode(Mode::Stopped);
    }

    /// Resume the mode remembered by the last `stop`.
    pub fn restart(&mut self) {
        match self.previous_mode {
            Some(m) => self.set_mode(m),
            None => warn!("Restart requested without a prior stop, staying in {:?}", self.mode)
        }
    }

    /// Execute a telecommand.
    ///
    /// Returns `false` if the command could not be accepted.
    pub fn exec_cmd(&mut self, cmd: &LocoCmd, planner: &mut dyn PathPlanner) -> bool {
        debug!("Executing {:?}", cmd);

        match *cmd {
            LocoCmd::GoToPose { x_mm, y_mm, theta_rad } => {
                self.go_to_pose(x_mm, y_mm, theta_rad)
            },
            LocoCmd::NavigateTo { x_mm, y_mm, theta_rad } => {
                return self.navigate_to(planner, x_mm, y_mm, theta_rad)
            },
            LocoCmd::GoStraight { distance_mm } => self.go_straight(distance_mm),
            LocoCmd::Turn { angle_rad } => self.turn(angle_rad),
            LocoCmd::DirectSpeed { vx_mms, vy_mms, vtheta_rads } => {
                self.set_direct_speed(vx_mms, vy_mms, vtheta_rads)
            },
            LocoCmd::StartRepositioning { x_mm, y_mm, theta_rad } => {
                self.start_repositioning(x_mm, y_mm, theta_rad)
            },
            LocoCmd::Stop => self.stop(),
            LocoCmd::Restart => self.restart()
        }

        true
    }

    // ---- CYCLIC PROCESSING ----

    /// Run one control cycle, timing it against the previous call.
    ///
    /// The first call uses a zero period, and so commands a zero velocity.
    pub fn tick(
        &mut self,
        mot: &mut dyn MotLink,
        prox: &dyn ProxSource,
        obstacle_detection: bool
    ) -> Result<StatusReport, LocoCtrlError> {
        let now = Instant::now();
        let dt_s = match self.last_tick {
            Some(t) => now.duration_since(t).as_secs_f64(),
            None => 0.0
        };
        self.last_tick = Some(now);

        self.step(mot, prox, dt_s, obstacle_detection)
    }

    /// Run one control cycle with the given period.
    ///
    /// An error is returned if the motor board rejects the velocity. The mode
    /// is unaffected by the failure, but the rejected velocity is still stored
    /// as the current one and the next cycle ramps from it.
    pub fn step(
        &mut self,
        mot: &mut dyn MotLink,
        prox: &dyn ProxSource,
        dt_s: f64,
        obstacle_detection: bool
    ) -> Result<StatusReport, LocoCtrlError> {
        self.ingest_sensors();

        let base = VelocityEnvelope::from_limits(&self.params.limits);
        self.report = StatusReport::new(self.mode, base);
        self.report.dt_s = dt_s;

        if obstacle_detection {
            let (env, obs) = self.obs_limiter.envelope(prox, &base);
            self.report.envelope = base.intersect(&env);
            self.report.obstacles = Some(obs);
        }
        let envelope = self.report.envelope;

        let demand = match self.mode {
            Mode::Stopped => Velocity::zero(),
            Mode::PositionControl => {
                self.traj_ctrl.proc(&self.pose, &self.velocity, dt_s)
            },
            Mode::DirectSpeed => self.direct_speed,
            Mode::Repositioning => self.calc_reposition(mot, dt_s),
            Mode::RelativeControl => {
                self.rel_ctrl.proc(&self.pose, &self.velocity, dt_s)
            }
        };

        let out = self.enforce_limits(&demand, &envelope, dt_s);
        self.velocity = out;
        self.report.velocity = out;

        debug!(
            "{:?}: pose {:?}, demand {:?}, out {:?}",
            self.mode, self.pose, demand, out
        );

        if let Err(e) = mot.send_speed_cmd(&out.into()) {
            warn!("Velocity command rejected: {}", e);
            return Err(LocoCtrlError::Actuation(e))
        }

        Ok(self.report)
    }

    /// Apply every motor board report posted since the last call.
    pub fn ingest_sensors(&mut self) {
        for update in self.sensors.drain() {
            match update {
                SensorUpdate::Odom(r) => self.pose = Pose::from(r),
                SensorUpdate::Speed(r) => {
                    self.measured_velocity = Velocity::new(
                        r.vx_mms, r.vy_mms, r.vtheta_rads);
                    self.drift = DriftFlags {
                        left: r.drifting_left,
                        right: r.drifting_right
                    };
                }
            }
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            info!("Mode change: {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    // ---- QUERIES ----

    /// True if the robot is on the given pose within the admitted errors.
    ///
    /// Also true outside of `PositionControl` and `Stopped`, or if there is
    /// no pose to check against.
    pub fn is_at_pose_or_target(&self, target: Option<&Pose>) -> bool {
        if self.mode != Mode::PositionControl && self.mode != Mode::Stopped {
            return true
        }

        match target {
            Some(t) => self.pose.is_near(
                t,
                self.params.limits.admitted_position_error_mm,
                self.params.limits.admitted_angle_error_rad
            ),
            None => true
        }
    }

    pub fn trajectory_finished(&self) -> bool {
        self.traj_ctrl.is_finished()
    }

    pub fn relative_command_finished(&self) -> bool {
        self.rel_ctrl.is_finished()
    }

    pub fn repositioning_finished(&self) -> bool {
        !self.is_repositioning
    }

    /// Either drive side is slipping.
    pub fn is_drifting(&self) -> bool {
        self.drift.any()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn previous_mode(&self) -> Option<Mode> {
        self.previous_mode
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    pub fn measured_velocity(&self) -> Velocity {
        self.measured_velocity
    }

    pub fn trajectory(&self) -> &Trajectory {
        self.traj_ctrl.trajectory()
    }

    pub fn traj_ctrl(&self) -> &TrajCtrl {
        &self.traj_ctrl
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Push a nonzero value lying inside `[-band, band]` out to `band + margin`,
/// keeping its sign. Zero is left alone.
fn push_out_of_band(value: f64, band: f64, margin: f64) -> f64 {
    if value > 0.0 && value <= band {
        band + margin
    }
    else if value < 0.0 && value >= -band {
        -band - margin
    }
    else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kin::KinLimits;
    use crate::nav::StraightPlanner;
    use crate::rel_ctrl::RelGoal;
    use crate::sim_client::{SimMot, SimProx};
    use std::f64::consts::PI;

    const DT_S: f64 = 0.05;

    struct Rig {
        ctrl: LocoCtrl,
        mot: SimMot,
        prox: SimProx
    }

    impl Rig {
        fn new(params: Params) -> Self {
            let (ctrl, tx) = LocoCtrl::new(params);
            Self {
                ctrl,
                mot: SimMot::new(tx, DT_S),
                prox: SimProx::default()
            }
        }

        fn step(&mut self) -> StatusReport {
            self.ctrl.step(&mut self.mot, &self.prox, DT_S, false).unwrap()
        }

        /// Step until `done` or the cycle limit, returning the number of
        /// cycles run.
        fn run_until<F: Fn(&LocoCtrl) -> bool>(&mut self, max: usize, done: F) -> usize {
            for i in 0..max {
                self.step();
                if done(&self.ctrl) {
                    return i + 1
                }
            }
            max
        }
    }

    #[test]
    fn test_first_tick_is_zero() {
        let mut rig = Rig::new(Params::default());
        rig.ctrl.set_direct_speed(200.0, 0.0, 0.5);

        let report = rig.ctrl.tick(&mut rig.mot, &rig.prox, false).unwrap();
        assert_eq!(report.dt_s, 0.0);
        assert!(report.velocity.is_zero());

        let report = rig.ctrl.step(&mut rig.mot, &rig.prox, 0.0, false).unwrap();
        assert!(report.velocity.is_zero());
        assert!(rig.mot.last_cmd().is_some());
    }

    #[test]
    fn test_go_to_pose_converges() {
        let mut rig = Rig::new(Params::default());
        rig.ctrl.go_to_pose(1000.0, 0.0, 0.0);
        assert_eq!(rig.ctrl.mode(), Mode::PositionControl);

        let cycles = rig.run_until(2000, |c| c.trajectory_finished());
        assert!(cycles < 2000);

        // Let the residual speed ramp out
        for _ in 0..10 {
            rig.step();
        }
        assert!(rig.ctrl.velocity().is_zero());

        let target = Pose::new(1000.0, 0.0, 0.0);
        assert!(rig.ctrl.pose().is_near(&target, 10.0, 0.05));
        assert!(rig.ctrl.is_at_pose_or_target(Some(&target)));
    }

    #[test]
    fn test_go_to_pose_to_the_side() {
        let goals = [(0.0, 100.0), (0.0, -120.0), (0.0, 50.0), (10.0, 100.0), (0.0, 200.0)];

        for &(x_mm, y_mm) in goals.iter() {
            let mut rig = Rig::new(Params::default());
            rig.ctrl.go_to_pose(x_mm, y_mm, 0.0);

            let cycles = rig.run_until(2000, |c| c.trajectory_finished());
            assert!(cycles < 2000, "Goal ({}, {}) never reached", x_mm, y_mm);

            for _ in 0..20 {
                rig.step();
            }
            assert!(rig.ctrl.velocity().is_zero());
            assert!(rig.ctrl.pose().is_near(&Pose::new(x_mm, y_mm, 0.0), 15.0, 0.1));
        }
    }

    #[test]
    fn test_accel_limits_every_cycle() {
        let mut rig = Rig::new(Params::default());
        let limits = KinLimits::default();
        rig.ctrl.set_direct_speed(350.0, 80.0, -1.5);

        let mut prev = Velocity::zero();
        for i in 0..100 {
            // Swap demands half way through
            if i == 50 {
                rig.ctrl.set_direct_speed(-350.0, 0.0, 1.5);
            }
            let v = rig.step().velocity;

            assert_eq!(v.vy_mms, 0.0);
            assert!((v.vx_mms - prev.vx_mms).abs() <= limits.accel_max_mmss * DT_S + 1e-9);
            assert!(
                (v.vtheta_rads - prev.vtheta_rads).abs()
                    <= limits.rotation_accel_max_radss * DT_S + 1e-9
            );
            prev = v;
        }
        assert!((prev.vx_mms + 350.0).abs() < 1e-9);
        assert!((prev.vtheta_rads - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_go_to_pose_idempotent() {
        let mut rig = Rig::new(Params::default());
        rig.ctrl.go_to_pose(300.0, -200.0, 1.0);
        let first = rig.ctrl.trajectory().clone();
        rig.ctrl.go_to_pose(300.0, -200.0, 1.0);

        assert_eq!(&first, rig.ctrl.trajectory());
    }

    #[test]
    fn test_repositioning_round_trip() {
        let mut rig = Rig::new(Params::default());
        rig.mot.set_pose(Pose::new(120.0, 340.0, 0.2));
        rig.mot.set_drift_override(Some(DriftFlags { left: true, right: true }));
        rig.step();

        rig.ctrl.start_repositioning(Some(100.0), None, Some(3.0 * PI / 2.0));
        assert!(!rig.ctrl.repositioning_finished());
        rig.step();

        assert!(rig.ctrl.repositioning_finished());
        let pose = rig.ctrl.pose();
        assert_eq!(pose.x(), 100.0);
        assert_eq!(pose.y(), 340.0);
        assert!((pose.heading_rad + PI / 2.0).abs() < 1e-9);
        assert!(rig.mot.pose().is_near(&pose, 1e-9, 1e-9));
        assert_eq!(rig.ctrl.mode(), Mode::Repositioning);
    }

    #[test]
    fn test_failed_repositioning_keeps_pose() {
        let mut rig = Rig::new(Params::default());
        rig.mot.set_pose(Pose::new(120.0, 340.0, 0.2));
        rig.mot.set_drift_override(Some(DriftFlags { left: true, right: true }));
        rig.mot.set_reposition_status(2);
        rig.step();

        rig.ctrl.start_repositioning(Some(0.0), Some(0.0), Some(0.0));
        rig.step();

        assert!(rig.ctrl.repositioning_finished());
        assert!(rig.ctrl.pose().is_near(&Pose::new(120.0, 340.0, 0.2), 1e-9, 1e-9));
    }

    #[test]
    fn test_repositioning_against_wall() {
        let mut rig = Rig::new(Params::default());
        rig.mot.set_wall_x(Some(60.0));
        rig.ctrl.start_repositioning(Some(75.0), None, None);

        // Creeps forward at the repositioning speed
        rig.run_until(10, |_| false);
        assert!((rig.ctrl.velocity().vx_mms - 50.0).abs() < 1e-9);

        let cycles = rig.run_until(200, |c| c.repositioning_finished());
        assert!(cycles < 200);
        assert_eq!(rig.ctrl.pose().x(), 75.0);
        assert_eq!(rig.ctrl.pose().y(), 0.0);
    }

    #[test]
    fn test_repositioning_one_side_drifting() {
        let mut rig = Rig::new(Params::default());
        rig.mot.set_drift_override(Some(DriftFlags { left: false, right: true }));
        rig.step();
        assert!(rig.ctrl.is_drifting());

        rig.ctrl.start_repositioning(None, None, None);
        rig.step();
        rig.step();

        assert!((rig.ctrl.velocity().vtheta_rads + 0.3).abs() < 1e-9);
        assert!(!rig.ctrl.repositioning_finished());
    }

    #[test]
    fn test_repositioning_timeout() {
        let mut params = Params::default();
        params.reposition.timeout_s = Some(1.0);
        let mut rig = Rig::new(params);
        rig.ctrl.start_repositioning(Some(0.0), Some(0.0), Some(0.0));

        let cycles = rig.run_until(100, |c| c.repositioning_finished());
        assert!(cycles == 20 || cycles == 21);
        assert!(rig.ctrl.pose().x() > 0.0);
    }

    #[test]
    fn test_small_relative_goals_pushed_out() {
        let mut rig = Rig::new(Params::default());
        let start = rig.ctrl.pose();

        rig.ctrl.go_straight(5.0);
        assert_eq!(rig.ctrl.mode(), Mode::RelativeControl);
        assert_eq!(rig.ctrl.rel_ctrl.goal(), Some(RelGoal::Straight { distance_mm: 11.0 }));
        assert!(!rig.ctrl.relative_command_finished());

        rig.run_until(400, |c| c.relative_command_finished());
        assert!(rig.ctrl.relative_command_finished());
        assert!(rig.mot.pose().distance_to(&start.position_mm) >= 1.0);

        assert_eq!(push_out_of_band(5.0, 10.0, 1.0), 11.0);
        assert!((push_out_of_band(-0.01, 0.05, 0.001) + 0.051).abs() < 1e-12);
        assert_eq!(push_out_of_band(10.0, 10.0, 1.0), 11.0);
        assert_eq!(push_out_of_band(-10.0, 10.0, 1.0), -11.0);
        assert_eq!(push_out_of_band(0.0, 10.0, 1.0), 0.0);
        assert_eq!(push_out_of_band(250.0, 10.0, 1.0), 250.0);
    }

    #[test]
    fn test_relative_goals_on_band_edge_move() {
        let mut rig = Rig::new(Params::default());
        let start = rig.ctrl.pose();

        rig.ctrl.go_straight(10.0);
        assert_eq!(rig.ctrl.rel_ctrl.goal(), Some(RelGoal::Straight { distance_mm: 11.0 }));
        rig.step();
        assert!(!rig.ctrl.relative_command_finished());
        assert!(rig.ctrl.velocity().vx_mms > 0.0);

        let cycles = rig.run_until(400, |c| c.relative_command_finished());
        assert!(cycles < 400);
        assert!(rig.mot.pose().distance_to(&start.position_mm) >= 1.0);

        rig.ctrl.turn(0.05);
        match rig.ctrl.rel_ctrl.goal() {
            Some(RelGoal::Rotate { angle_rad }) => assert!((angle_rad - 0.051).abs() < 1e-12),
            other => panic!("Expected a rotate goal, got {:?}", other)
        }
        rig.step();
        assert!(!rig.ctrl.relative_command_finished());
        assert!(rig.ctrl.velocity().vtheta_rads > 0.0);

        let cycles = rig.run_until(400, |c| c.relative_command_finished());
        assert!(cycles < 400);
    }

    #[test]
    fn test_turn_converges() {
        let mut rig = Rig::new(Params::default());
        rig.mot.set_pose(Pose::new(0.0, 0.0, 3.0));
        rig.step();

        rig.ctrl.turn(1.0);
        let cycles = rig.run_until(400, |c| c.relative_command_finished());
        assert!(cycles < 400);

        let turned = rig.ctrl.pose().heading_error_to(3.0);
        assert!((turned + 1.0).abs() <= 0.05);
    }

    #[test]
    fn test_navigate_without_path() {
        let mut rig = Rig::new(Params::default());
        rig.ctrl.set_direct_speed(100.0, 0.0, 0.0);

        let mut planner = StraightPlanner { via_mm: vec![], blocked: true };
        assert!(!rig.ctrl.navigate_to(&mut planner, 500.0, 500.0, 0.0));
        assert_eq!(rig.ctrl.mode(), Mode::DirectSpeed);
    }

    #[test]
    fn test_navigate_builds_trajectory() {
        let mut rig = Rig::new(Params::default());
        let mut planner = StraightPlanner {
            via_mm: vec![Vector2::new(400.0, 0.0), Vector2::new(400.0, 300.0)],
            blocked: false
        };

        assert!(rig.ctrl.navigate_to(&mut planner, 700.0, 300.0, 1.0));
        assert_eq!(rig.ctrl.mode(), Mode::PositionControl);

        let points: Vec<_> = rig.ctrl.trajectory().iter().cloned().collect();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].goal_pose.heading_rad, 0.0);
        assert_eq!(points[0].goal_speed_mms, Params::default().traj_ctrl.flow_speed_mms);
        assert_eq!(points[2].goal_pose, Pose::new(700.0, 300.0, 1.0));
        assert!(points[2].is_stop());

        let cycles = rig.run_until(4000, |c| c.trajectory_finished());
        assert!(cycles < 4000);
    }

    #[test]
    fn test_stop_restart_single_slot() {
        let mut rig = Rig::new(Params::default());

        // Restart without a stop keeps the current mode
        rig.ctrl.restart();
        assert_eq!(rig.ctrl.mode(), Mode::PositionControl);

        rig.ctrl.go_straight(100.0);
        rig.ctrl.stop();
        assert_eq!(rig.ctrl.mode(), Mode::Stopped);
        rig.ctrl.restart();
        assert_eq!(rig.ctrl.mode(), Mode::RelativeControl);

        // Only one mode is remembered, a second stop overwrites it with
        // `Stopped` and restart can't get back out.
        rig.ctrl.stop();
        rig.ctrl.stop();
        rig.ctrl.restart();
        assert_eq!(rig.ctrl.mode(), Mode::Stopped);

        // The slot is not cleared by restart
        rig.ctrl.go_to_pose(0.0, 0.0, 0.0);
        rig.ctrl.restart();
        assert_eq!(rig.ctrl.mode(), Mode::Stopped);
    }

    #[test]
    fn test_direct_speed_while_stopped() {
        let mut rig = Rig::new(Params::default());
        rig.ctrl.go_straight(200.0);
        rig.ctrl.stop();

        rig.ctrl.set_direct_speed(100.0, 0.0, 0.0);
        assert_eq!(rig.ctrl.mode(), Mode::Stopped);
        assert_eq!(rig.ctrl.previous_mode(), Some(Mode::DirectSpeed));
        assert!(rig.step().velocity.is_zero());

        rig.ctrl.restart();
        assert_eq!(rig.ctrl.mode(), Mode::DirectSpeed);
        assert!((rig.step().velocity.vx_mms - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_is_at_pose_outside_position_control() {
        let mut rig = Rig::new(Params::default());
        let far = Pose::new(900.0, 900.0, 0.0);

        assert!(!rig.ctrl.is_at_pose_or_target(Some(&far)));
        assert!(rig.ctrl.is_at_pose_or_target(None));

        rig.ctrl.set_direct_speed(0.0, 0.0, 0.0);
        assert!(rig.ctrl.is_at_pose_or_target(Some(&far)));
    }

    #[test]
    fn test_obstacle_blocks_forward() {
        let mut rig = Rig::new(Params::default());
        rig.prox = SimProx::new(vec![(Vector2::new(300.0, 0.0), 50.0)]);
        rig.ctrl.set_direct_speed(200.0, 0.0, 0.0);

        let report = rig.ctrl.step(&mut rig.mot, &rig.prox, DT_S, true).unwrap();
        assert_eq!(report.envelope.max_vx_mms, 0.0);
        assert!(report.velocity.vx_mms <= 0.0);
        assert!(report.obstacles.map(|o| o.is_limited()).unwrap_or(false));

        // Reversing is still allowed
        rig.ctrl.set_direct_speed(-200.0, 0.0, 0.0);
        let report = rig.ctrl.step(&mut rig.mot, &rig.prox, DT_S, true).unwrap();
        assert!((report.velocity.vx_mms + 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_actuation_failure_surfaced() {
        let mut rig = Rig::new(Params::default());
        rig.ctrl.go_straight(300.0);
        rig.mot.set_connected(false);

        match rig.ctrl.step(&mut rig.mot, &rig.prox, DT_S, false) {
            Err(LocoCtrlError::Actuation(_)) => (),
            other => panic!("Expected an actuation error, got {:?}", other)
        }
        assert_eq!(rig.ctrl.mode(), Mode::RelativeControl);

        // The rejected command is still the one the next cycle ramps from
        assert!((rig.ctrl.velocity().vx_mms - 15.0).abs() < 1e-9);
        rig.mot.set_connected(true);
        assert!((rig.step().velocity.vx_mms - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_exec_cmd() {
        let mut rig = Rig::new(Params::default());
        let mut planner = StraightPlanner::default();

        assert!(rig.ctrl.exec_cmd(&LocoCmd::Turn { angle_rad: 0.5 }, &mut planner));
        assert_eq!(rig.ctrl.mode(), Mode::RelativeControl);

        assert!(rig.ctrl.exec_cmd(&LocoCmd::Stop, &mut planner));
        assert_eq!(rig.ctrl.mode(), Mode::Stopped);

        planner.blocked = true;
        assert!(!rig.ctrl.exec_cmd(
            &LocoCmd::NavigateTo { x_mm: 1.0, y_mm: 1.0, theta_rad: 0.0 },
            &mut planner
        ));
        assert_eq!(rig.ctrl.mode(), Mode::Stopped);
    }
}
