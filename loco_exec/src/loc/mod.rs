//! # Localisation module
//!
//! This module provides the robot's pose, and the mailbox through which the
//! motor board's odometry and slip reports reach the control loop.
//!
//! Reports arrive asynchronously from the communications layer. Rather than
//! letting the callback mutate the pose while a cycle is running, reports are
//! posted into a channel by an [`OdomSender`] and drained by the control loop
//! at the start of each cycle, so a cycle only ever sees whole updates.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

// Internal
use comms_if::eqpt::mot::{OdomReport, SpeedReport};
use util::maths::{get_ang_dist, norm_angle};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose of the robot on the table.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in the table frame.
    ///
    /// Units: millimeters
    pub position_mm: Vector2<f64>,

    /// Heading, the angle to the table X+ axis, in (-pi, pi].
    ///
    /// Units: radians
    pub heading_rad: f64
}

/// Latest wheel slip state of each drive side.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftFlags {
    pub left: bool,
    pub right: bool
}

/// Sending half of the sensor mailbox, given to the communications layer.
#[derive(Debug, Clone)]
pub struct OdomSender {
    tx: Sender<SensorUpdate>
}

/// Receiving half of the sensor mailbox, owned by the control loop.
#[derive(Debug)]
pub struct SensorLink {
    rx: Receiver<SensorUpdate>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An update posted by the motor board.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SensorUpdate {
    Odom(OdomReport),
    Speed(SpeedReport)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Create a new pose, normalising the heading.
    pub fn new(x_mm: f64, y_mm: f64, heading_rad: f64) -> Self {
        Self {
            position_mm: Vector2::new(x_mm, y_mm),
            heading_rad: norm_angle(heading_rad)
        }
    }

    pub fn x(&self) -> f64 {
        self.position_mm[0]
    }

    pub fn y(&self) -> f64 {
        self.position_mm[1]
    }

    /// Unit vector pointing along the heading.
    pub fn forward2(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// Distance between this pose's position and the point.
    pub fn distance_to(&self, point_mm: &Vector2<f64>) -> f64 {
        (point_mm - self.position_mm).norm()
    }

    /// Shortest signed rotation taking this heading onto `heading_rad`.
    pub fn heading_error_to(&self, heading_rad: f64) -> f64 {
        get_ang_dist(self.heading_rad, heading_rad)
    }

    /// Shortest signed rotation needed to face the point.
    pub fn bearing_to(&self, point_mm: &Vector2<f64>) -> f64 {
        let d = point_mm - self.position_mm;
        self.heading_error_to(d[1].atan2(d[0]))
    }

    /// Express a table frame point in the robot body frame (X+ forwards, Y+
    /// to the left).
    pub fn to_body(&self, point_mm: &Vector2<f64>) -> Vector2<f64> {
        let d = point_mm - self.position_mm;
        let (s, c) = self.heading_rad.sin_cos();

        Vector2::new(c * d[0] + s * d[1], -s * d[0] + c * d[1])
    }

    /// True if the pose is within the position and angle tolerances of
    /// `other`.
    pub fn is_near(&self, other: &Pose, pos_tol_mm: f64, ang_tol_rad: f64) -> bool {
        self.distance_to(&other.position_mm) <= pos_tol_mm
            && self.heading_error_to(other.heading_rad).abs() <= ang_tol_rad
    }
}

impl From<OdomReport> for Pose {
    fn from(r: OdomReport) -> Self {
        Pose::new(r.x_mm, r.y_mm, r.theta_rad)
    }
}

impl DriftFlags {
    /// Either side is slipping.
    pub fn any(&self) -> bool {
        self.left || self.right
    }

    /// Both sides are slipping, i.e. the robot is pressed against a hard stop.
    pub fn both(&self) -> bool {
        self.left && self.right
    }
}

impl OdomSender {
    /// Post a new absolute pose sample.
    pub fn handle_odometry_report(&self, report: OdomReport) {
        self.post(SensorUpdate::Odom(report))
    }

    /// Post a new speed and slip report.
    pub fn handle_speed_report(&self, report: SpeedReport) {
        self.post(SensorUpdate::Speed(report))
    }

    fn post(&self, update: SensorUpdate) {
        if let Err(e) = self.tx.send(update) {
            warn!("Sensor update dropped, the control loop has gone: {:?}", e.0);
        }
    }
}

impl SensorLink {
    /// Take every update posted since the last call, oldest first.
    pub fn drain(&self) -> Vec<SensorUpdate> {
        self.rx.try_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Create a new sensor mailbox.
pub fn sensor_link() -> (OdomSender, SensorLink) {
    let (tx, rx) = channel();

    (OdomSender { tx }, SensorLink { rx })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pose_frames() {
        let pose = Pose::new(100.0, 100.0, PI / 2.0);

        // A point 50 mm further along Y+ is straight ahead
        let b = pose.to_body(&Vector2::new(100.0, 150.0));
        assert!((b[0] - 50.0).abs() < 1e-9);
        assert!(b[1].abs() < 1e-9);

        // A point at lower X is to the left
        let b = pose.to_body(&Vector2::new(80.0, 100.0));
        assert!((b[1] - 20.0).abs() < 1e-9);

        assert!((pose.bearing_to(&Vector2::new(100.0, 0.0)) - PI).abs() < 1e-9);
    }

    #[test]
    fn test_is_near_wraps() {
        let a = Pose::new(0.0, 0.0, PI - 0.01);
        let b = Pose::new(5.0, 0.0, -PI + 0.01);

        assert!(a.is_near(&b, 10.0, 0.05));
        assert!(!a.is_near(&b, 1.0, 0.05));
    }

    #[test]
    fn test_mailbox_order() {
        let (tx, link) = sensor_link();

        tx.handle_odometry_report(OdomReport { x_mm: 1.0, y_mm: 2.0, theta_rad: 0.0 });
        tx.handle_speed_report(SpeedReport { drifting_left: true, ..Default::default() });
        tx.clone().handle_odometry_report(OdomReport { x_mm: 3.0, y_mm: 4.0, theta_rad: 7.0 });

        let updates = link.drain();
        assert_eq!(updates.len(), 3);
        match updates[2] {
            SensorUpdate::Odom(r) => {
                let p = Pose::from(r);
                assert_eq!(p.x(), 3.0);
                assert!((p.heading_rad - (7.0 - 2.0 * PI)).abs() < 1e-9);
            },
            _ => panic!("Expected an odometry update last")
        }
        assert!(link.drain().is_empty());
    }
}
