//! Lever oscillation used when the simulation is not driving the angles

use super::{assign, FieldKey, SectionReader};
use crate::suspension::Corner;
use serde::Serialize;
use std::f32::consts::TAU;

const IS_RUNNING: FieldKey = FieldKey::flat("is_running");
const AMPLITUDE: FieldKey = FieldKey::flat("amplitude");
const FREQUENCY: FieldKey = FieldKey::flat("frequency");
const PHASE_GLOBAL: FieldKey = FieldKey::nested("phase_global", "phases", "global");
const PHASE_FL: FieldKey = FieldKey::nested("phase_fl", "phases", "fl");
const PHASE_FR: FieldKey = FieldKey::nested("phase_fr", "phases", "fr");
const PHASE_RL: FieldKey = FieldKey::nested("phase_rl", "phases", "rl");
const PHASE_RR: FieldKey = FieldKey::nested("phase_rr", "phases", "rr");

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnimationSettings {
    pub is_running: bool,
    /// Peak lever angle in degrees
    pub amplitude: f32,
    /// Oscillation frequency in Hz
    pub frequency: f32,
    /// Phase offsets in degrees
    pub phase_global: f32,
    pub phase_fl: f32,
    pub phase_fr: f32,
    pub phase_rl: f32,
    pub phase_rr: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            is_running: false,
            amplitude: 8.0,
            frequency: 1.0,
            phase_global: 0.0,
            phase_fl: 0.0,
            phase_fr: 0.0,
            phase_rl: 0.0,
            phase_rr: 0.0,
        }
    }
}

impl AnimationSettings {
    pub fn apply(&mut self, r: &SectionReader) -> usize {
        let mut n = 0;
        n += assign(&mut self.is_running, r.flag(IS_RUNNING));
        n += assign(&mut self.amplitude, r.number(AMPLITUDE).map(|v| v.clamp(0.0, 90.0)));
        n += assign(&mut self.frequency, r.number(FREQUENCY).map(|v| v.clamp(0.0, 50.0)));
        n += assign(&mut self.phase_global, r.number(PHASE_GLOBAL));
        n += assign(&mut self.phase_fl, r.number(PHASE_FL));
        n += assign(&mut self.phase_fr, r.number(PHASE_FR));
        n += assign(&mut self.phase_rl, r.number(PHASE_RL));
        n += assign(&mut self.phase_rr, r.number(PHASE_RR));
        n
    }

    pub fn phase(&self, corner: Corner) -> f32 {
        match corner {
            Corner::FrontLeft => self.phase_fl,
            Corner::FrontRight => self.phase_fr,
            Corner::RearLeft => self.phase_rl,
            Corner::RearRight => self.phase_rr,
        }
    }

    /// Lever angle of one corner at `time` seconds
    pub fn lever_angle(&self, corner: Corner, time: f32) -> f32 {
        let phase = (self.phase_global + self.phase(corner)).to_radians();
        self.amplitude * (TAU * self.frequency * time + phase).sin()
    }

    /// Lever angles in `Corner::ALL` order
    pub fn lever_angles(&self, time: f32) -> [f32; 4] {
        Corner::ALL.map(|corner| self.lever_angle(corner, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lever_angles_at_rest() {
        let animation = AnimationSettings::default();
        for angle in animation.lever_angles(0.0) {
            assert!(angle.abs() < 1e-6);
        }
    }

    #[test]
    fn test_quarter_period_peaks() {
        let animation = AnimationSettings {
            amplitude: 10.0,
            frequency: 2.0,
            ..Default::default()
        };
        let angles = animation.lever_angles(0.125);
        for angle in angles {
            assert!((angle - 10.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_phases() {
        let mut animation = AnimationSettings::default();
        let payload = json!({
            "amplitude": 120,
            "phases": { "global": 45, "rr": 45 },
            "phaseFl": -90,
        });
        let n = animation.apply(&SectionReader::new(&payload));

        assert_eq!(n, 4);
        assert_eq!(animation.amplitude, 90.0);

        let angles = animation.lever_angles(0.0);
        // fl: 45 - 90 = -45 degrees of phase
        assert!((angles[0] + 90.0 * (0.5_f32).sqrt()).abs() < 1e-3);
        // rr: 90 degrees of phase
        assert!((angles[3] - 90.0).abs() < 1e-3);
    }
}
