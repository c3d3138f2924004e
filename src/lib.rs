//! # Rainfall
//!
//! Workspace facade over the rainfall forecasting crates.
//!
//! - [`math`]: metrics and window arithmetic (`rain_math`)
//! - [`forecast`]: the forecasting pipeline (`rain_forecast`)
//!
//! ## Example
//!
//! ```
//! use rainfall_workspace::math::WindowShape;
//!
//! let shape = WindowShape::new(120, 24).unwrap();
//! assert_eq!(shape.count(150), 7);
//! ```

pub use rain_forecast as forecast;
pub use rain_math as math;

/// Version of the workspace facade
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
