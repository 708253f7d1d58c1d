//! Unit conversion rules for loosely-typed payload values
//!
//! Upstream tools send some lengths in metres and others in millimetres
//! without tagging them. Fields that are millimetre lengths carry a
//! [`UnitRule`] so the conversion is explicit and testable rather than an
//! ad-hoc guess at the call site.

use tracing::debug;

/// How a raw payload number is converted to the field's native unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnitRule {
    /// Use the value as given
    Verbatim,
    /// Magnitudes strictly below `threshold` are read as metres and
    /// multiplied by `scale`
    RescaleBelow { threshold: f32, scale: f32 },
}

impl UnitRule {
    /// Millimetre length: anything with magnitude below 0.1 is metres
    pub const MILLIMETERS: UnitRule = UnitRule::RescaleBelow {
        threshold: 0.1,
        scale: 1000.0,
    };

    /// Convert a raw value
    pub fn apply(&self, value: f32) -> f32 {
        match *self {
            UnitRule::Verbatim => value,
            UnitRule::RescaleBelow { threshold, scale } => {
                // Zero stays zero
                if value != 0.0 && value.abs() < threshold {
                    let scaled = value * scale;
                    debug!(raw = value, scaled, "rescaled small length value");
                    scaled
                } else {
                    value
                }
            }
        }
    }
}

impl Default for UnitRule {
    fn default() -> Self {
        UnitRule::Verbatim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbatim() {
        assert_eq!(UnitRule::Verbatim.apply(0.01), 0.01);
    }

    #[test]
    fn test_millimeters_rescales_small_values() {
        assert_eq!(UnitRule::MILLIMETERS.apply(0.08), 80.0);
        assert_eq!(UnitRule::MILLIMETERS.apply(-0.05), -50.0);
    }

    #[test]
    fn test_millimeters_keeps_large_and_zero() {
        assert_eq!(UnitRule::MILLIMETERS.apply(0.1), 0.1);
        assert_eq!(UnitRule::MILLIMETERS.apply(35.0), 35.0);
        assert_eq!(UnitRule::MILLIMETERS.apply(0.0), 0.0);
    }
}
