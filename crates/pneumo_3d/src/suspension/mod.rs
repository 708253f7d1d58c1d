//! Suspension corner kinematics
//!
//! Each wheel corner is a lever hinged on the frame at the arm pivot, and a
//! pneumatic cylinder hinged at the tail pivot whose piston rod ends on the
//! lever. Every frame the lever angle changes and the rest of the linkage is
//! re-placed so the piston rod keeps its configured length.
//!
//! All lengths are millimetres, angles are degrees unless a name says
//! otherwise. The linkage lives in the XY plane of its corner; Z only carries
//! the corner's longitudinal position.

mod rig;
mod solver;

pub use rig::{PistonPositions, RigLayout, SuspensionRig, ToleranceMonitor};
pub use solver::{
    segment_transform, solve_corner, CornerConstants, CornerGeometry, JOINT_OK_COLOR,
    JOINT_WARNING_COLOR,
};

use pneumo_core::Vec3;
use serde::{Deserialize, Serialize};

/// Fixed length of the rod between the tail pivot and the cylinder body
pub const DEFAULT_TAIL_ROD_LENGTH: f32 = 100.0;

/// Minimum distance kept between the piston and either cylinder cap
pub const PISTON_END_MARGIN: f32 = 10.0;

/// Rod-length deviation above which a corner is flagged
pub const ROD_LENGTH_TOLERANCE: f32 = 1.0;

/// One of the four wheel corners
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    #[serde(rename = "fl")]
    FrontLeft,
    #[serde(rename = "fr")]
    FrontRight,
    #[serde(rename = "rl")]
    RearLeft,
    #[serde(rename = "rr")]
    RearRight,
}

impl Corner {
    /// All corners in payload order
    pub const ALL: [Corner; 4] = [
        Corner::FrontLeft,
        Corner::FrontRight,
        Corner::RearLeft,
        Corner::RearRight,
    ];

    /// Short payload key (`fl`, `fr`, `rl`, `rr`)
    pub fn key(&self) -> &'static str {
        match self {
            Corner::FrontLeft => "fl",
            Corner::FrontRight => "fr",
            Corner::RearLeft => "rl",
            Corner::RearRight => "rr",
        }
    }

    /// Parse a payload key
    pub fn from_key(key: &str) -> Option<Corner> {
        match key {
            "fl" => Some(Corner::FrontLeft),
            "fr" => Some(Corner::FrontRight),
            "rl" => Some(Corner::RearLeft),
            "rr" => Some(Corner::RearRight),
            _ => None,
        }
    }

    /// Index into per-corner arrays
    pub fn index(&self) -> usize {
        match self {
            Corner::FrontLeft => 0,
            Corner::FrontRight => 1,
            Corner::RearLeft => 2,
            Corner::RearRight => 3,
        }
    }

    /// Left corners sit on the negative X side
    pub fn is_left(&self) -> bool {
        matches!(self, Corner::FrontLeft | Corner::RearLeft)
    }

    pub fn is_front(&self) -> bool {
        matches!(self, Corner::FrontLeft | Corner::FrontRight)
    }
}

/// Linkage dimensions shared by all four corners
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerConfig {
    /// Lever length from arm pivot to wheel end
    pub lever_length: f32,
    /// Rod attachment as a fraction of lever length (0..1)
    pub rod_position: f32,
    /// Cylinder body length
    pub cylinder_length: f32,
    /// Cylinder bore diameter at the head side
    pub bore_head: f32,
    /// Piston rod diameter
    pub rod_diameter: f32,
    /// Piston thickness along the cylinder axis
    pub piston_thickness: f32,
    /// Piston rod length, held constant by the solver
    pub piston_rod_length: f32,
    /// Tail rod length between tail pivot and cylinder body
    pub tail_rod_length: f32,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            lever_length: 800.0,
            rod_position: 0.6,
            cylinder_length: 500.0,
            bore_head: 80.0,
            rod_diameter: 35.0,
            piston_thickness: 25.0,
            piston_rod_length: 200.0,
            tail_rod_length: DEFAULT_TAIL_ROD_LENGTH,
        }
    }
}

/// Per-frame inputs for one corner
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerInput {
    /// Lever hinge on the frame
    pub arm_pivot: Vec3,
    /// Cylinder tail hinge on the frame
    pub tail_pivot: Vec3,
    /// Lever swing angle relative to the side's rest direction
    pub lever_angle_deg: f32,
}

impl CornerInput {
    pub fn new(arm_pivot: Vec3, tail_pivot: Vec3, lever_angle_deg: f32) -> Self {
        Self {
            arm_pivot,
            tail_pivot,
            lever_angle_deg,
        }
    }

    /// The same corner on the opposite side of the vehicle
    pub fn mirrored(&self) -> Self {
        Self {
            arm_pivot: self.arm_pivot.mirror_x(),
            tail_pivot: self.tail_pivot.mirror_x(),
            lever_angle_deg: -self.lever_angle_deg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_keys_roundtrip() {
        for corner in Corner::ALL {
            assert_eq!(Corner::from_key(corner.key()), Some(corner));
        }
        assert_eq!(Corner::from_key("front_left"), None);
    }

    #[test]
    fn test_corner_sides() {
        assert!(Corner::FrontLeft.is_left());
        assert!(Corner::RearLeft.is_left());
        assert!(!Corner::RearRight.is_left());
        assert!(Corner::FrontRight.is_front());
        assert!(!Corner::RearLeft.is_front());
    }

    #[test]
    fn test_mirrored_input() {
        let input = CornerInput::new(Vec3::new(-600.0, 120.0, 0.0), Vec3::new(-800.0, 770.0, 0.0), 5.0);
        let mirrored = input.mirrored();
        assert_eq!(mirrored.arm_pivot, Vec3::new(600.0, 120.0, 0.0));
        assert_eq!(mirrored.tail_pivot, Vec3::new(800.0, 770.0, 0.0));
        assert_eq!(mirrored.lever_angle_deg, -5.0);
    }
}
