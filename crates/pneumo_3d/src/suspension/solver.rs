//! Closed-form corner solver

use super::{CornerConfig, CornerInput, PISTON_END_MARGIN, ROD_LENGTH_TOLERANCE};
use crate::math::{mat4_mul, Mat4Ext, Vec3Ext};
use pneumo_core::{Color, Mat4, Vec3};
use serde::Serialize;

/// Joint marker colour when the rod length holds
pub const JOINT_OK_COLOR: Color = Color::rgb(0.2, 0.8, 0.4);

/// Joint marker colour when the rod length deviates past tolerance
pub const JOINT_WARNING_COLOR: Color = Color::RED;

/// Values derived once per frame from [`CornerConfig`] and shared by all
/// four corners
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerConstants {
    /// Full lever length
    pub lever_length: f32,
    /// Distance from arm pivot to rod attachment along the lever
    pub rod_offset: f32,
    pub cylinder_length: f32,
    pub tail_rod_length: f32,
    pub piston_rod_length: f32,
    /// Lowest allowed piston position along the cylinder axis
    pub piston_min: f32,
    /// Highest allowed piston position along the cylinder axis
    pub piston_max: f32,
}

impl CornerConstants {
    pub fn new(config: &CornerConfig) -> Self {
        let lever_length = config.lever_length.max(0.0);
        let cylinder_length = config.cylinder_length.max(0.0);

        // A cylinder shorter than both margins pins the piston to its middle
        let (piston_min, piston_max) = if cylinder_length >= 2.0 * PISTON_END_MARGIN {
            (PISTON_END_MARGIN, cylinder_length - PISTON_END_MARGIN)
        } else {
            (cylinder_length * 0.5, cylinder_length * 0.5)
        };

        Self {
            lever_length,
            rod_offset: lever_length * config.rod_position.clamp(0.0, 1.0),
            cylinder_length,
            tail_rod_length: config.tail_rod_length.max(0.0),
            piston_rod_length: config.piston_rod_length.max(0.0),
            piston_min,
            piston_max,
        }
    }
}

impl From<&CornerConfig> for CornerConstants {
    fn from(config: &CornerConfig) -> Self {
        Self::new(config)
    }
}

/// Placement of every part of one corner for the current frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CornerGeometry {
    /// 180 for the left side, 0 for the right
    pub base_angle_deg: f32,
    /// Base angle plus lever angle
    pub total_angle_deg: f32,
    pub arm_pivot: Vec3,
    pub tail_pivot: Vec3,
    /// Wheel end of the lever
    pub lever_end: Vec3,
    /// Where the piston rod joins the lever
    pub rod_attach: Vec3,
    /// Unit vector from tail pivot towards the rod attachment
    pub cylinder_axis: Vec3,
    /// In-plane unit normal of the cylinder axis
    pub cylinder_normal: Vec3,
    /// Z rotation for a primitive whose default axis is vertical
    pub cylinder_angle_deg: f32,
    pub tail_rod_end: Vec3,
    pub cylinder_end: Vec3,
    /// Piston distance from `tail_rod_end` along the axis, after clamping
    pub piston_position: f32,
    /// Piston distance before clamping into the cylinder body
    pub piston_position_unclamped: f32,
    pub piston_center: Vec3,
    /// Distance from piston centre to rod attachment
    pub actual_rod_length: f32,
    /// `|actual_rod_length - piston_rod_length|`
    pub rod_length_error: f32,
}

/// Solve one corner
///
/// Pure function of its inputs: call it again whenever the lever angle or a
/// pivot moves.
pub fn solve_corner(input: &CornerInput, constants: &CornerConstants) -> CornerGeometry {
    let base_angle_deg = if input.arm_pivot.x < 0.0 { 180.0 } else { 0.0 };
    let total_angle_deg = base_angle_deg + input.lever_angle_deg;
    let total_rad = total_angle_deg.to_radians();
    let lever_dir = Vec3::new(total_rad.cos(), total_rad.sin(), 0.0);

    let rod_attach = input.arm_pivot + lever_dir * constants.rod_offset;
    let lever_end = input.arm_pivot + lever_dir * constants.lever_length;

    let cylinder_axis = (rod_attach - input.tail_pivot).normalize();
    let cylinder_angle_deg = cylinder_axis.angle_xy_deg() + 90.0;
    let cylinder_normal = cylinder_axis.perpendicular_xy();

    let tail_rod_end = input.tail_pivot + cylinder_axis * constants.tail_rod_length;
    let cylinder_end = tail_rod_end + cylinder_axis * constants.cylinder_length;

    // Rod attachment relative to the axis: foot of the perpendicular and
    // distance off-axis
    let projection = (rod_attach - tail_rod_end).dot(cylinder_axis);
    let foot = tail_rod_end + cylinder_axis * projection;
    let perpendicular = rod_attach.distance(foot);

    let rod = constants.piston_rod_length;
    let axial = (rod * rod - perpendicular * perpendicular).max(0.0).sqrt();
    let piston_position_unclamped = projection - axial;
    let piston_position = piston_position_unclamped.clamp(constants.piston_min, constants.piston_max);
    let piston_center = tail_rod_end + cylinder_axis * piston_position;

    let actual_rod_length = rod_attach.distance(piston_center);
    let rod_length_error = (actual_rod_length - rod).abs();

    CornerGeometry {
        base_angle_deg,
        total_angle_deg,
        arm_pivot: input.arm_pivot,
        tail_pivot: input.tail_pivot,
        lever_end,
        rod_attach,
        cylinder_axis,
        cylinder_normal,
        cylinder_angle_deg,
        tail_rod_end,
        cylinder_end,
        piston_position,
        piston_position_unclamped,
        piston_center,
        actual_rod_length,
        rod_length_error,
    }
}

impl CornerGeometry {
    /// Whether the piston had to be pulled back inside the cylinder body
    pub fn is_clamped(&self) -> bool {
        self.piston_position != self.piston_position_unclamped
    }

    /// Whether the rod length holds within [`ROD_LENGTH_TOLERANCE`]
    pub fn within_tolerance(&self) -> bool {
        self.rod_length_error <= ROD_LENGTH_TOLERANCE
    }

    /// Colour for the rod joint marker
    pub fn joint_marker_color(&self) -> Color {
        if self.within_tolerance() {
            JOINT_OK_COLOR
        } else {
            JOINT_WARNING_COLOR
        }
    }

    /// Lever placement as a box/cylinder of the given thickness
    pub fn lever_transform(&self, thickness: f32) -> Mat4 {
        segment_transform(self.arm_pivot, self.lever_end, thickness)
    }

    /// Tail rod placement
    pub fn tail_rod_transform(&self, radius: f32) -> Mat4 {
        segment_transform(self.tail_pivot, self.tail_rod_end, radius)
    }

    /// Cylinder body placement
    pub fn cylinder_transform(&self, radius: f32) -> Mat4 {
        segment_transform(self.tail_rod_end, self.cylinder_end, radius)
    }

    /// Piston disc placement, centred on `piston_center`
    pub fn piston_transform(&self, radius: f32, thickness: f32) -> Mat4 {
        let half = self.cylinder_axis * (thickness * 0.5);
        segment_transform(self.piston_center - half, self.piston_center + half, radius)
    }

    /// Piston rod placement from piston to lever
    pub fn piston_rod_transform(&self, radius: f32) -> Mat4 {
        segment_transform(self.piston_center, self.rod_attach, radius)
    }
}

/// Transform that maps a unit cylinder (radius 1, height 1, centred, axis
/// along +Y) onto the segment `start..end`
pub fn segment_transform(start: Vec3, end: Vec3, radius: f32) -> Mat4 {
    let delta = end - start;
    let angle = (delta.angle_xy_deg() + 90.0).to_radians();

    let translate = Mat4::from_translation(start.midpoint(end));
    let rotate = Mat4::from_rotation_z(angle);
    let scale = Mat4::from_scale(Vec3::new(radius, delta.length(), radius));

    mat4_mul(&translate, &mat4_mul(&rotate, &scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_config() -> CornerConfig {
        CornerConfig {
            lever_length: 800.0,
            rod_position: 0.6,
            cylinder_length: 500.0,
            piston_rod_length: 200.0,
            ..Default::default()
        }
    }

    fn reference_input(angle: f32) -> CornerInput {
        CornerInput::new(
            Vec3::new(-600.0, 120.0, 0.0),
            Vec3::new(-800.0, 770.0, 0.0),
            angle,
        )
    }

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f32) {
        assert!(
            (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps && (a.z - b.z).abs() < eps,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_reference_corner_keeps_rod_length() {
        let constants = CornerConstants::new(&reference_config());
        let geometry = solve_corner(&reference_input(0.0), &constants);

        // Left side: lever points along -X
        assert_eq!(geometry.base_angle_deg, 180.0);
        assert_vec_close(geometry.rod_attach, Vec3::new(-1080.0, 120.0, 0.0), 1e-3);

        let distance = geometry.piston_center.distance(geometry.rod_attach);
        assert!((distance - 200.0).abs() < 1e-3, "distance = {}", distance);
        assert!(!geometry.is_clamped());
        assert!(geometry.within_tolerance());
        assert_eq!(geometry.joint_marker_color(), JOINT_OK_COLOR);
    }

    #[test]
    fn test_derived_points_lie_on_axis() {
        let constants = CornerConstants::new(&reference_config());
        let geometry = solve_corner(&reference_input(12.0), &constants);

        assert!((geometry.cylinder_axis.length() - 1.0).abs() < 1e-5);
        assert!(geometry.cylinder_axis.dot(geometry.cylinder_normal).abs() < 1e-5);

        let tail_rod = geometry.tail_rod_end.distance(geometry.tail_pivot);
        assert!((tail_rod - 100.0).abs() < 1e-3);

        let body = geometry.cylinder_end.distance(geometry.tail_rod_end);
        assert!((body - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_unclamped_solutions_have_no_error() {
        let constants = CornerConstants::new(&reference_config());

        for step in 0..=36 {
            let angle = -90.0 + step as f32 * 5.0;
            let geometry = solve_corner(&reference_input(angle), &constants);

            if !geometry.is_clamped() {
                assert!(
                    geometry.rod_length_error < 1e-3,
                    "angle {} error {}",
                    angle,
                    geometry.rod_length_error
                );
            }
        }
    }

    #[test]
    fn test_cylinder_angle_matches_axis() {
        let constants = CornerConstants::new(&reference_config());
        let geometry = solve_corner(&reference_input(0.0), &constants);

        let axis = geometry.rod_attach - geometry.tail_pivot;
        let expected = axis.y.atan2(axis.x).to_degrees() + 90.0;
        assert!((geometry.cylinder_angle_deg - expected).abs() < 1e-4);
    }

    #[test]
    fn test_mirrored_corner() {
        let constants = CornerConstants::new(&reference_config());

        for angle in [0.0, 7.5, -20.0, 45.0] {
            let left = solve_corner(&reference_input(angle), &constants);
            let right = solve_corner(&reference_input(angle).mirrored(), &constants);

            assert_eq!(left.base_angle_deg - right.base_angle_deg, 180.0);
            assert_vec_close(right.rod_attach, left.rod_attach.mirror_x(), 1e-3);
            assert_vec_close(right.piston_center, left.piston_center.mirror_x(), 1e-3);
            assert_vec_close(right.cylinder_end, left.cylinder_end.mirror_x(), 1e-3);
            assert!((right.rod_length_error - left.rod_length_error).abs() < 1e-3);
        }
    }

    #[test]
    fn test_clamped_piston_reports_error() {
        // Rod longer than the reachable stroke pushes the piston into the
        // tail cap
        let config = CornerConfig {
            piston_rod_length: 700.0,
            ..reference_config()
        };
        let constants = CornerConstants::new(&config);
        let geometry = solve_corner(&reference_input(0.0), &constants);

        assert!(geometry.is_clamped());
        assert_eq!(geometry.piston_position, 10.0);
        assert!(!geometry.within_tolerance());
        assert_eq!(geometry.joint_marker_color(), JOINT_WARNING_COLOR);
    }

    #[test]
    fn test_short_cylinder_does_not_invert_clamp() {
        let config = CornerConfig {
            cylinder_length: 12.0,
            ..reference_config()
        };
        let constants = CornerConstants::new(&config);
        assert_eq!(constants.piston_min, 6.0);
        assert_eq!(constants.piston_max, 6.0);

        let geometry = solve_corner(&reference_input(0.0), &constants);
        assert_eq!(geometry.piston_position, 6.0);
    }

    #[test]
    fn test_degenerate_pivots_do_not_panic() {
        let constants = CornerConstants::new(&CornerConfig {
            lever_length: 0.0,
            ..reference_config()
        });
        let input = CornerInput::new(Vec3::ZERO, Vec3::ZERO, 0.0);
        let geometry = solve_corner(&input, &constants);

        assert_eq!(geometry.cylinder_axis, Vec3::ZERO);
        assert!(geometry.actual_rod_length.is_finite());
    }

    #[test]
    fn test_segment_transform_maps_unit_cylinder() {
        let start = Vec3::new(10.0, 20.0, 5.0);
        let end = Vec3::new(110.0, 95.0, 5.0);
        let m = segment_transform(start, end, 4.0);

        let top = m.transform_point(Vec3::new(0.0, 0.5, 0.0));
        let bottom = m.transform_point(Vec3::new(0.0, -0.5, 0.0));

        // The primitive is symmetric; its caps land on the segment ends
        assert_vec_close(top, start, 1e-3);
        assert_vec_close(bottom, end, 1e-3);
    }
}
