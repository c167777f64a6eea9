//! Bounded reward shaping
//!
//! [`tolerance`] maps a scalar (usually a distance) to a reward in `[0, 1]`:
//! 1.0 inside `[lower, upper]`, decaying to `value_at_margin` at `margin`
//! beyond the nearest bound and clamped there further out. The decay shape
//! follows the dm_control sigmoid family.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Decay shape used outside the tolerance bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sigmoid {
    Gaussian,
    Hyperbolic,
    LongTail,
    Reciprocal,
    Cosine,
    Linear,
    Quadratic,
    TanhSquared,
}

impl Sigmoid {
    /// Sigmoids that reach zero at a finite distance accept `value_at_margin == 0`
    fn is_bounded(self) -> bool {
        matches!(self, Sigmoid::Cosine | Sigmoid::Linear | Sigmoid::Quadratic)
    }

    /// Evaluate at normalized distance `x` (1.0 == one margin past the bound)
    ///
    /// Scaled so that `apply(1.0, v) == v`.
    fn apply(self, x: f32, value_at_margin: f32) -> f32 {
        let v = value_at_margin;
        match self {
            Sigmoid::Gaussian => {
                let scale = (-2.0 * v.ln()).sqrt();
                (-0.5 * (x * scale).powi(2)).exp()
            }
            Sigmoid::Hyperbolic => {
                let scale = (1.0 / v).acosh();
                1.0 / (x * scale).cosh()
            }
            Sigmoid::LongTail => {
                let scale = (1.0 / v - 1.0).sqrt();
                1.0 / ((x * scale).powi(2) + 1.0)
            }
            Sigmoid::Reciprocal => {
                let scale = 1.0 / v - 1.0;
                1.0 / (x.abs() * scale + 1.0)
            }
            Sigmoid::Cosine => {
                let scaled = x * (2.0 * v - 1.0).acos() / PI;
                if scaled.abs() < 1.0 {
                    (1.0 + (PI * scaled).cos()) / 2.0
                } else {
                    0.0
                }
            }
            Sigmoid::Linear => {
                let scaled = x * (1.0 - v);
                if scaled.abs() < 1.0 {
                    1.0 - scaled
                } else {
                    0.0
                }
            }
            Sigmoid::Quadratic => {
                let scaled = x * (1.0 - v).sqrt();
                if scaled.abs() < 1.0 {
                    1.0 - scaled * scaled
                } else {
                    0.0
                }
            }
            Sigmoid::TanhSquared => {
                let scale = (1.0 - v).sqrt().atanh();
                1.0 - (x * scale).tanh().powi(2)
            }
        }
    }
}

/// Shape parameters for one shaped sub-reward
///
/// These are constants per task type ("reach" and "fetch" use different sets).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub lower: f32,
    pub upper: f32,
    pub margin: f32,
    pub value_at_margin: f32,
    pub sigmoid: Sigmoid,
}

impl Tolerance {
    /// Linear falloff from 1.0 at the bound to 0.0 at `margin` beyond it
    pub fn linear(lower: f32, upper: f32, margin: f32) -> Self {
        Self {
            lower,
            upper,
            margin,
            value_at_margin: 0.0,
            sigmoid: Sigmoid::Linear,
        }
    }

    /// Gaussian falloff reaching 0.1 at the margin (dm_control defaults)
    pub fn gaussian(lower: f32, upper: f32, margin: f32) -> Self {
        Self {
            lower,
            upper,
            margin,
            value_at_margin: 0.1,
            sigmoid: Sigmoid::Gaussian,
        }
    }

    pub fn with_value_at_margin(mut self, value_at_margin: f32) -> Self {
        self.value_at_margin = value_at_margin;
        self
    }

    pub fn with_sigmoid(mut self, sigmoid: Sigmoid) -> Self {
        self.sigmoid = sigmoid;
        self
    }

    /// Panic on parameters no task could have meant
    fn validate(&self) {
        assert!(
            self.lower <= self.upper,
            "tolerance lower bound {} exceeds upper bound {}",
            self.lower,
            self.upper
        );
        assert!(
            self.margin >= 0.0,
            "tolerance margin must be non-negative, got {}",
            self.margin
        );
        let v = self.value_at_margin;
        if self.sigmoid.is_bounded() {
            assert!(
                (0.0..1.0).contains(&v),
                "value_at_margin must be in [0, 1) for {:?}, got {}",
                self.sigmoid,
                v
            );
        } else {
            assert!(
                v > 0.0 && v < 1.0,
                "value_at_margin must be in (0, 1) for {:?}, got {}",
                self.sigmoid,
                v
            );
        }
    }

    /// Reward for `value` under these parameters
    pub fn evaluate(&self, value: f32) -> f32 {
        self.validate();

        if value >= self.lower && value <= self.upper {
            return 1.0;
        }
        if self.margin == 0.0 {
            return 0.0;
        }
        if value >= self.upper + self.margin || value <= self.lower - self.margin {
            return self.value_at_margin;
        }

        let distance = if value < self.lower {
            self.lower - value
        } else {
            value - self.upper
        };
        let x = distance / self.margin;

        self.sigmoid
            .apply(x, self.value_at_margin)
            .clamp(self.value_at_margin, 1.0)
    }
}

/// Free-function form of [`Tolerance::evaluate`]
pub fn tolerance(
    value: f32,
    bounds: (f32, f32),
    margin: f32,
    value_at_margin: f32,
    sigmoid: Sigmoid,
) -> f32 {
    Tolerance {
        lower: bounds.0,
        upper: bounds.1,
        margin,
        value_at_margin,
        sigmoid,
    }
    .evaluate(value)
}
