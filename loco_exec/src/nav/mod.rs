//! # Navigation
//!
//! The path planner is an external collaborator. This module defines the seam
//! it plugs into, [`PathPlanner`], and a [`StraightPlanner`] which joins the
//! start and goal through optional via points, used by the executable and in
//! tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Finds a route between two points on the table.
pub trait PathPlanner {
    /// Return the polyline from `start_mm` to `goal_mm`, both included, or `None` if there is no
    /// route.
    fn find_path(&mut self, start_mm: Vector2<f64>, goal_mm: Vector2<f64>) -> Option<Vec<Vector2<f64>>>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A planner that ignores obstacles.
#[derive(Debug, Clone, Default)]
pub struct StraightPlanner {
    /// Points inserted between the start and the goal.
    pub via_mm: Vec<Vector2<f64>>,

    /// Report every goal as unreachable.
    pub blocked: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl PathPlanner for StraightPlanner {
    fn find_path(&mut self, start_mm: Vector2<f64>, goal_mm: Vector2<f64>) -> Option<Vec<Vector2<f64>>> {
        if self.blocked {
            return None;
        }

        let mut path = Vec::with_capacity(self.via_mm.len() + 2);
        path.push(start_mm);
        path.extend(self.via_mm.iter().cloned());
        path.push(goal_mm);

        Some(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_straight_planner() {
        let mut planner = StraightPlanner {
            via_mm: vec![Vector2::new(500.0, 0.0)],
            blocked: false,
        };

        let path = planner.find_path(Vector2::zeros(), Vector2::new(500.0, 500.0)).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[1], Vector2::new(500.0, 0.0));

        planner.blocked = true;
        assert!(planner.find_path(Vector2::zeros(), Vector2::new(1.0, 1.0)).is_none());
    }
}
