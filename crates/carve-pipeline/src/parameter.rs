//! The sphere-radius parameter and the slider that produces it.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Smallest accepted radius.
pub const MIN_RADIUS: f64 = 0.5;
/// Largest accepted radius.
pub const MAX_RADIUS: f64 = 0.87;
/// Slider increment.
pub const RADIUS_STEP: f64 = 0.01;
/// Initial slider position.
pub const DEFAULT_RADIUS: f64 = 0.65;

/// Slack for float noise from step arithmetic.
const BOUND_TOLERANCE: f64 = 1e-9;

/// Rejected raw input values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// NaN or infinite input.
    #[error("radius must be a finite number, got {0}")]
    NotFinite(f64),

    /// Input outside the accepted window.
    #[error("radius {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Rejected value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// Sphere radius used by the cut, always within `[MIN_RADIUS, MAX_RADIUS]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ShapeParameter(f64);

impl ShapeParameter {
    /// Validate a radius.
    pub fn new(radius: f64) -> Result<Self, ParameterError> {
        if !radius.is_finite() {
            return Err(ParameterError::NotFinite(radius));
        }
        if radius < MIN_RADIUS - BOUND_TOLERANCE || radius > MAX_RADIUS + BOUND_TOLERANCE {
            return Err(ParameterError::OutOfRange {
                value: radius,
                min: MIN_RADIUS,
                max: MAX_RADIUS,
            });
        }
        Ok(Self(radius.clamp(MIN_RADIUS, MAX_RADIUS)))
    }

    /// The radius value.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for ShapeParameter {
    fn default() -> Self {
        Self(DEFAULT_RADIUS)
    }
}

impl TryFrom<f64> for ShapeParameter {
    type Error = ParameterError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ShapeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Bounds of the radius slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderSpec {
    /// Lowest slider value.
    pub min: f64,
    /// Highest slider value.
    pub max: f64,
    /// Slider increment.
    pub step: f64,
    /// Initial slider value.
    pub default: f64,
}

impl SliderSpec {
    /// The sphere-radius slider.
    pub const RADIUS: SliderSpec = SliderSpec {
        min: MIN_RADIUS,
        max: MAX_RADIUS,
        step: RADIUS_STEP,
        default: DEFAULT_RADIUS,
    };

    /// Snap a raw slider value to the step grid and validate it.
    ///
    /// Values outside the slider window are rejected, never clamped.
    pub fn parse(&self, raw: f64) -> Result<ShapeParameter, ParameterError> {
        if !raw.is_finite() {
            return Err(ParameterError::NotFinite(raw));
        }
        if raw < self.min - BOUND_TOLERANCE || raw > self.max + BOUND_TOLERANCE {
            return Err(ParameterError::OutOfRange {
                value: raw,
                min: self.min,
                max: self.max,
            });
        }
        ShapeParameter::new(self.snap(raw))
    }

    /// Every value the slider can take, in ascending order.
    pub fn stops(&self) -> impl Iterator<Item = ShapeParameter> + '_ {
        (0..=self.last_step()).filter_map(move |i| ShapeParameter::new(self.at(i)).ok())
    }

    /// The default slider value as a parameter.
    pub fn default_parameter(&self) -> ShapeParameter {
        ShapeParameter::new(self.default).unwrap_or_default()
    }

    fn snap(&self, raw: f64) -> f64 {
        let steps = ((raw - self.min) / self.step).round() as u32;
        self.at(steps.min(self.last_step()))
    }

    /// Index of the highest stop not above `max`.
    fn last_step(&self) -> u32 {
        ((self.max - self.min) / self.step + BOUND_TOLERANCE).floor() as u32
    }

    fn at(&self, steps: u32) -> f64 {
        // Round to the step's decimal places so 0.5 + 37 * 0.01 lands on 0.87.
        let scale = 10f64.powi(decimal_places(self.step));
        ((self.min + f64::from(steps) * self.step) * scale).round() / scale
    }
}

/// Decimal places needed to write `value` exactly, capped at 9.
fn decimal_places(value: f64) -> i32 {
    (0..9)
        .find(|&d| {
            let scaled = value * 10f64.powi(d);
            (scaled - scaled.round()).abs() < BOUND_TOLERANCE * scaled.max(1.0)
        })
        .unwrap_or(9)
}
