use serde::{Deserialize, Serialize};

/// Fixed-point decimal price. 10^-PRICE_SCALE is the smallest stored fraction.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Deserialize, Serialize,
)]
pub struct Price {
    /// number of atomic units (atomic unit = 10^-PRICE_SCALE)
    pub units: i64,
}

impl Price {
    /// number of decimal places of the atomic unit (10^-8)
    pub const PRICE_SCALE: i32 = 8;

    /// Lossy: create Price from f64 (rounds to nearest atomic unit)
    pub fn from_f64(v: f64) -> Self {
        let scale = 10f64.powi(Self::PRICE_SCALE);
        Self {
            units: (v * scale).round() as i64,
        }
    }

    /// Lossy: convert to f64 for geometry and percentages
    pub fn to_f64(self) -> f64 {
        let scale = 10f64.powi(Self::PRICE_SCALE);
        (self.units as f64) / scale
    }

    pub fn is_zero(self) -> bool {
        self.units == 0
    }

    pub fn is_negative(self) -> bool {
        self.units < 0
    }
}

impl std::ops::Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            units: self.units.saturating_sub(rhs.units),
        }
    }
}
