//! PneumoStabSim View Core
//!
//! Value types shared by the visualization crates:
//!
//! - **Math**: `Vec2`, `Vec3` and column-major `Mat4`
//! - **Color**: linear RGBA colours with hex parsing for payload strings
//! - **Units**: the explicit metres-vs-millimetres conversion rule used when
//!   reading geometry from loosely-typed payloads
//!
//! # Example
//!
//! ```rust
//! use pneumo_core::{UnitRule, Vec3};
//!
//! let a = Vec3::new(3.0, 4.0, 0.0);
//! assert_eq!(a.length(), 5.0);
//!
//! // 0.035 looks like metres; millimetre fields rescale it.
//! assert_eq!(UnitRule::MILLIMETERS.apply(0.035), 35.0);
//! ```

pub mod color;
pub mod math;
pub mod units;

pub use color::{Color, ColorParseError};
pub use math::{Mat4, Vec2, Vec3};
pub use units::UnitRule;
