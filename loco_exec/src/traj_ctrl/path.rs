//! # Trajectory
//!
//! This module defines the trajectory followed by trajectory control, and the
//! polyline geometry used by the pursuit goal search.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// Internal
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Segments shorter than this are treated as a single point.
const MIN_SEGMENT_LENGTH_MM: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A waypoint and the speed the robot should have when reaching it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub goal_pose: Pose,

    /// Zero for a stopping point, positive to flow through the point.
    ///
    /// Units: millimeters/second
    pub goal_speed_mms: f64
}

/// An ordered sequence of waypoints, the front being the next one to reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: VecDeque<TrajectoryPoint>
}

/// A segment between two path points
#[derive(Debug, Default, Copy, Clone)]
pub struct PathSegment {
    /// The start point of the segment
    pub start_mm: Vector2<f64>,

    /// The target of the segment
    pub target_mm: Vector2<f64>,

    /// The length of the segment
    pub length_mm: f64,

    /// Unit vector pointing in the direction of the segment. Zero for a
    /// degenerate segment.
    pub direction: Vector2<f64>
}

/// The closest point on a polyline to some position.
#[derive(Debug, Copy, Clone)]
pub struct Projection {
    /// Index of the segment the closest point lies on.
    pub segment_index: usize,

    /// How far along the segment the point lies, from 0 (start) to 1 (target).
    pub t: f64,

    /// The closest point itself.
    pub point_mm: Vector2<f64>,

    /// Perpendicular distance from the position to the polyline.
    pub distance_mm: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectoryPoint {
    pub fn new(x_mm: f64, y_mm: f64, theta_rad: f64, goal_speed_mms: f64) -> Self {
        Self {
            goal_pose: Pose::new(x_mm, y_mm, theta_rad),
            goal_speed_mms: goal_speed_mms.max(0.0)
        }
    }

    /// True if the robot must come to a stop (and reach the goal heading) at
    /// this point.
    pub fn is_stop(&self) -> bool {
        self.goal_speed_mms <= 0.0
    }

    pub fn position_mm(&self) -> Vector2<f64> {
        self.goal_pose.position_mm
    }
}

impl Trajectory {
    pub fn new(points: Vec<TrajectoryPoint>) -> Self {
        Self {
            points: points.into()
        }
    }

    /// A trajectory of a single stopping point.
    pub fn to_pose(x_mm: f64, y_mm: f64, theta_rad: f64) -> Self {
        Self::new(vec![TrajectoryPoint::new(x_mm, y_mm, theta_rad, 0.0)])
    }

    pub fn front(&self) -> Option<&TrajectoryPoint> {
        self.points.front()
    }

    pub fn pop_front(&mut self) -> Option<TrajectoryPoint> {
        self.points.pop_front()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrajectoryPoint> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear()
    }

    /// Positions of the points in order.
    pub fn positions(&self) -> Vec<Vector2<f64>> {
        self.points.iter().map(|p| p.position_mm()).collect()
    }
}

impl PathSegment {
    pub fn new(start_mm: Vector2<f64>, target_mm: Vector2<f64>) -> Self {
        let diff = target_mm - start_mm;
        let length_mm = diff.norm();

        let direction = if length_mm > MIN_SEGMENT_LENGTH_MM {
            diff / length_mm
        }
        else {
            Vector2::zeros()
        };

        Self {
            start_mm,
            target_mm,
            length_mm,
            direction
        }
    }

    /// Project the point onto the segment, returning the parameter `t` in
    /// [0, 1] and the closest point.
    pub fn project(&self, point_mm: &Vector2<f64>) -> (f64, Vector2<f64>) {
        if self.length_mm <= MIN_SEGMENT_LENGTH_MM {
            return (0.0, self.start_mm)
        }

        let t = ((point_mm - self.start_mm).dot(&self.direction) / self.length_mm)
            .max(0.0)
            .min(1.0);

        (t, self.start_mm + self.direction * (t * self.length_mm))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the segments joining the vertices in order.
pub fn segments(vertices_mm: &[Vector2<f64>]) -> Vec<PathSegment> {
    vertices_mm
        .windows(2)
        .map(|w| PathSegment::new(w[0], w[1]))
        .collect()
}

/// Find the closest point on the polyline to `point_mm`.
///
/// When two segments are equally close the earlier one wins. Returns `None`
/// if there are fewer than two vertices.
pub fn closest_point(
    vertices_mm: &[Vector2<f64>],
    point_mm: &Vector2<f64>
) -> Option<Projection> {
    let mut best: Option<Projection> = None;

    for (i, seg) in segments(vertices_mm).iter().enumerate() {
        let (t, p) = seg.project(point_mm);
        let d = (point_mm - p).norm();

        match best {
            Some(ref b) if b.distance_mm <= d => (),
            _ => best = Some(Projection {
                segment_index: i,
                t,
                point_mm: p,
                distance_mm: d
            })
        }
    }

    best
}

/// Walk `lookahead_mm` of arc length along the polyline from the projection.
///
/// If the polyline ends first, the remaining length is extrapolated along the
/// direction of the last non-degenerate segment.
pub fn lookahead_point(
    vertices_mm: &[Vector2<f64>],
    proj: &Projection,
    lookahead_mm: f64
) -> Vector2<f64> {
    let segs = segments(vertices_mm);
    let mut remaining_mm = lookahead_mm;
    let mut last_direction = Vector2::zeros();

    for (i, seg) in segs.iter().enumerate().skip(proj.segment_index) {
        if seg.length_mm <= MIN_SEGMENT_LENGTH_MM {
            continue;
        }

        // On the projection's own segment we start part way along
        let offset_mm = if i == proj.segment_index {
            proj.t * seg.length_mm
        }
        else {
            0.0
        };
        let available_mm = seg.length_mm - offset_mm;

        if remaining_mm <= available_mm {
            return seg.start_mm + seg.direction * (offset_mm + remaining_mm)
        }

        remaining_mm -= available_mm;
        last_direction = seg.direction;
    }

    let end_mm = match vertices_mm.last() {
        Some(v) => *v,
        None => proj.point_mm
    };

    end_mm + last_direction * remaining_mm
}

#[cfg(test)]
mod test {
    use super::*;

    fn l_path() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1000.0, 0.0),
            Vector2::new(1000.0, 1000.0)
        ]
    }

    #[test]
    fn test_closest_point() {
        let path = l_path();

        let proj = closest_point(&path, &Vector2::new(400.0, 30.0)).unwrap();
        assert_eq!(proj.segment_index, 0);
        assert!((proj.t - 0.4).abs() < 1e-9);
        assert!((proj.distance_mm - 30.0).abs() < 1e-9);

        let proj = closest_point(&path, &Vector2::new(990.0, 600.0)).unwrap();
        assert_eq!(proj.segment_index, 1);
        assert!((proj.point_mm - Vector2::new(1000.0, 600.0)).norm() < 1e-9);

        // Before the start of the path clamps onto the first vertex
        let proj = closest_point(&path, &Vector2::new(-50.0, 0.0)).unwrap();
        assert_eq!(proj.t, 0.0);

        assert!(closest_point(&path[..1], &Vector2::zeros()).is_none());
    }

    #[test]
    fn test_lookahead_point() {
        let path = l_path();

        // Wraps round the corner
        let proj = closest_point(&path, &Vector2::new(900.0, 0.0)).unwrap();
        let goal = lookahead_point(&path, &proj, 150.0);
        assert!((goal - Vector2::new(1000.0, 50.0)).norm() < 1e-9);

        // Extrapolates past the end
        let proj = closest_point(&path, &Vector2::new(1000.0, 950.0)).unwrap();
        let goal = lookahead_point(&path, &proj, 150.0);
        assert!((goal - Vector2::new(1000.0, 1100.0)).norm() < 1e-9);
    }

    #[test]
    fn test_degenerate_segments() {
        let path = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 0.0),
            Vector2::new(100.0, 0.0)
        ];

        let proj = closest_point(&path, &Vector2::new(20.0, 5.0)).unwrap();
        assert_eq!(proj.segment_index, 1);

        let goal = lookahead_point(&path, &proj, 50.0);
        assert!((goal - Vector2::new(70.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_trajectory_points() {
        let p = TrajectoryPoint::new(10.0, 20.0, 4.0, -5.0);
        assert!(p.is_stop());
        assert!(p.goal_pose.heading_rad < 0.0);

        let mut traj = Trajectory::new(vec![
            TrajectoryPoint::new(0.0, 0.0, 0.0, 100.0),
            p
        ]);
        assert_eq!(traj.len(), 2);
        assert!(!traj.front().unwrap().is_stop());
        traj.pop_front();
        assert_eq!(traj.positions(), vec![Vector2::new(10.0, 20.0)]);
    }
}
