//! Four-corner suspension rig

use super::{solve_corner, Corner, CornerConfig, CornerConstants, CornerGeometry, CornerInput};
use crate::settings::coerce_number;
use pneumo_core::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Where the pivots sit on the frame
///
/// Left corners mirror right corners across X = 0. Front corners sit at
/// Z = 0, rear corners at `wheelbase`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigLayout {
    /// Lateral distance of each arm pivot from the centre line
    pub arm_pivot_offset: f32,
    /// Arm pivot height (top of the lower beam)
    pub arm_pivot_height: f32,
    /// Lateral distance of each tail pivot from the centre line
    pub tail_pivot_offset: f32,
    /// Tail pivot height (top of the frame)
    pub tail_pivot_height: f32,
    /// Longitudinal distance between front and rear pivots
    pub wheelbase: f32,
}

impl Default for RigLayout {
    fn default() -> Self {
        Self {
            arm_pivot_offset: 600.0,
            arm_pivot_height: 120.0,
            tail_pivot_offset: 800.0,
            tail_pivot_height: 770.0,
            wheelbase: 3200.0,
        }
    }
}

impl RigLayout {
    /// Frame pivots for a corner
    pub fn pivots(&self, corner: Corner) -> (Vec3, Vec3) {
        let side = if corner.is_left() { -1.0 } else { 1.0 };
        let z = if corner.is_front() { 0.0 } else { self.wheelbase };

        (
            Vec3::new(side * self.arm_pivot_offset, self.arm_pivot_height, z),
            Vec3::new(side * self.tail_pivot_offset, self.tail_pivot_height, z),
        )
    }

    /// Per-frame input for a corner at the given lever angle
    pub fn input(&self, corner: Corner, lever_angle_deg: f32) -> CornerInput {
        let (arm_pivot, tail_pivot) = self.pivots(corner);
        CornerInput::new(arm_pivot, tail_pivot, lever_angle_deg)
    }
}

/// Piston positions reported by the simulation, one per corner
///
/// These are display values pushed alongside the geometry; they are stored
/// as given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PistonPositions {
    pub fl: f32,
    pub fr: f32,
    pub rl: f32,
    pub rr: f32,
}

impl PistonPositions {
    pub fn get(&self, corner: Corner) -> f32 {
        match corner {
            Corner::FrontLeft => self.fl,
            Corner::FrontRight => self.fr,
            Corner::RearLeft => self.rl,
            Corner::RearRight => self.rr,
        }
    }

    pub fn set(&mut self, corner: Corner, value: f32) {
        match corner {
            Corner::FrontLeft => self.fl = value,
            Corner::FrontRight => self.fr = value,
            Corner::RearLeft => self.rl = value,
            Corner::RearRight => self.rr = value,
        }
    }

    /// Apply a `{fl, fr, rl, rr}` payload; returns how many corners changed
    ///
    /// Values go through numeric coercion only. Unknown keys and values that
    /// are not numbers are skipped.
    pub fn apply_payload(&mut self, payload: &Value) -> usize {
        let Some(map) = payload.as_object() else {
            debug!("piston payload is not an object, ignoring");
            return 0;
        };

        let mut applied = 0;
        for (key, value) in map {
            let (Some(corner), Some(number)) = (Corner::from_key(key), coerce_number(value)) else {
                continue;
            };
            self.set(corner, number as f32);
            applied += 1;
        }
        applied
    }
}

/// The four corners with their shared configuration
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SuspensionRig {
    pub config: CornerConfig,
    pub layout: RigLayout,
}

impl SuspensionRig {
    pub fn new(config: CornerConfig, layout: RigLayout) -> Self {
        Self { config, layout }
    }

    /// Inputs for all four corners from per-corner lever angles
    pub fn inputs(&self, lever_angles_deg: [f32; 4]) -> [CornerInput; 4] {
        Corner::ALL.map(|corner| self.layout.input(corner, lever_angles_deg[corner.index()]))
    }

    /// Solve all four corners
    ///
    /// Shared constants are derived once for the frame. Corners whose rod
    /// length drifts past tolerance are reported at debug level, never
    /// rejected; [`ToleranceMonitor`] turns them into warnings on change.
    pub fn solve(&self, inputs: &[CornerInput; 4]) -> [CornerGeometry; 4] {
        let constants = CornerConstants::new(&self.config);

        Corner::ALL.map(|corner| {
            let geometry = solve_corner(&inputs[corner.index()], &constants);
            if !geometry.within_tolerance() {
                debug!(
                    corner = corner.key(),
                    error_mm = geometry.rod_length_error,
                    piston = geometry.piston_position,
                    "piston rod length out of tolerance"
                );
            }
            geometry
        })
    }
}

/// Rod-length tolerance state of each corner across frames
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToleranceMonitor {
    breached: [bool; 4],
}

impl ToleranceMonitor {
    pub fn is_breached(&self, corner: Corner) -> bool {
        self.breached[corner.index()]
    }

    /// Record a solved frame and return how many corners changed state
    ///
    /// Entering the breach warns once; leaving it logs at info level.
    pub fn observe(&mut self, corners: &[CornerGeometry; 4]) -> usize {
        let mut changed = 0;
        for corner in Corner::ALL {
            let geometry = &corners[corner.index()];
            let breached = !geometry.within_tolerance();
            if breached == self.breached[corner.index()] {
                continue;
            }

            self.breached[corner.index()] = breached;
            changed += 1;
            if breached {
                warn!(
                    corner = corner.key(),
                    error_mm = geometry.rod_length_error,
                    piston = geometry.piston_position,
                    "piston rod length out of tolerance"
                );
            } else {
                info!(corner = corner.key(), "piston rod length back within tolerance");
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layout_mirrors_sides() {
        let layout = RigLayout::default();
        let (fl_arm, fl_tail) = layout.pivots(Corner::FrontLeft);
        let (fr_arm, fr_tail) = layout.pivots(Corner::FrontRight);

        assert_eq!(fl_arm, Vec3::new(-600.0, 120.0, 0.0));
        assert_eq!(fl_tail, Vec3::new(-800.0, 770.0, 0.0));
        assert_eq!(fr_arm, fl_arm.mirror_x());
        assert_eq!(fr_tail, fl_tail.mirror_x());

        let (rr_arm, _) = layout.pivots(Corner::RearRight);
        assert_eq!(rr_arm.z, 3200.0);
    }

    #[test]
    fn test_rig_solves_all_corners() {
        let rig = SuspensionRig::default();
        let corners = rig.solve(&rig.inputs([0.0; 4]));

        for geometry in &corners {
            assert!(geometry.rod_length_error < 1e-3);
        }
        assert_eq!(corners[Corner::FrontLeft.index()].base_angle_deg, 180.0);
        assert_eq!(corners[Corner::FrontRight.index()].base_angle_deg, 0.0);
    }

    #[test]
    fn test_tolerance_changes_are_reported_once() {
        let rig = SuspensionRig::default();
        let good = rig.solve(&rig.inputs([0.0; 4]));
        let mut bad = good;
        bad[Corner::RearLeft.index()].rod_length_error = 5.0;

        let mut monitor = ToleranceMonitor::default();
        assert_eq!(monitor.observe(&good), 0);
        assert_eq!(monitor.observe(&bad), 1);
        assert!(monitor.is_breached(Corner::RearLeft));

        // Staying out of tolerance is not a new event
        assert_eq!(monitor.observe(&bad), 0);
        assert_eq!(monitor.observe(&bad), 0);

        assert_eq!(monitor.observe(&good), 1);
        assert!(!monitor.is_breached(Corner::RearLeft));
    }

    #[test]
    fn test_piston_payload() {
        let mut pistons = PistonPositions::default();
        let applied = pistons.apply_payload(&json!({
            "fl": 12.5,
            "fr": "-3",
            "rl": true,
            "rr": "not a number",
            "xx": 1.0,
        }));

        // Booleans coerce to 1/0, junk strings are skipped
        assert_eq!(applied, 3);
        assert_eq!(pistons.fl, 12.5);
        assert_eq!(pistons.fr, -3.0);
        assert_eq!(pistons.rl, 1.0);
        assert_eq!(pistons.rr, 0.0);
    }

    #[test]
    fn test_piston_payload_not_object() {
        let mut pistons = PistonPositions::default();
        assert_eq!(pistons.apply_payload(&json!([1, 2, 3])), 0);
    }
}
