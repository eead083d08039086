//! Absolute and relative time values.

use super::brand::TimerBrand;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An absolute time on some timer service's clock.
///
/// The unit and epoch are whatever the clock device counts. A value
/// without a brand is compatible with every clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    value: u64,
    brand: Option<TimerBrand>,
}

/// Difference between two [`Timestamp`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelativeTime {
    value: u64,
    brand: Option<TimerBrand>,
}

impl Timestamp {
    /// Brand-less timestamp.
    pub const fn raw(value: u64) -> Self {
        Self { value, brand: None }
    }

    pub const fn branded(value: u64, brand: TimerBrand) -> Self {
        Self {
            value,
            brand: Some(brand),
        }
    }

    pub(crate) const fn with_brand(value: u64, brand: Option<TimerBrand>) -> Self {
        Self { value, brand }
    }

    pub fn abs_value(&self) -> u64 {
        self.value
    }

    pub fn brand(&self) -> Option<TimerBrand> {
        self.brand
    }
}

impl RelativeTime {
    /// Brand-less relative time.
    pub const fn raw(value: u64) -> Self {
        Self { value, brand: None }
    }

    pub const fn branded(value: u64, brand: TimerBrand) -> Self {
        Self {
            value,
            brand: Some(brand),
        }
    }

    pub(crate) const fn with_brand(value: u64, brand: Option<TimerBrand>) -> Self {
        Self { value, brand }
    }

    pub fn rel_value(&self) -> u64 {
        self.value
    }

    pub fn brand(&self) -> Option<TimerBrand> {
        self.brand
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self::raw(value)
    }
}

impl From<u64> for RelativeTime {
    fn from(value: u64) -> Self {
        Self::raw(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.brand {
            Some(brand) => write!(f, "{}@{}", self.value, brand),
            None => write!(f, "{}", self.value),
        }
    }
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.brand {
            Some(brand) => write!(f, "+{}@{}", self.value, brand),
            None => write!(f, "+{}", self.value),
        }
    }
}
