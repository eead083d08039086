//! TimeMath — arithmetic over branded time values.
//!
//! Every operation first resolves the shared brand of its operands: two
//! raw values yield a raw result, a raw and a branded value yield the
//! branded one, and two different brands are rejected. Results must stay
//! non-negative and inside `u64`.

use super::brand::TimerBrand;
use super::value::{RelativeTime, Timestamp};
use crate::error::{TimerError, TimerResult};
use std::cmp::Ordering;

/// Resolve the brand two operands have in common.
pub fn shared_brand(
    left: Option<TimerBrand>,
    right: Option<TimerBrand>,
) -> TimerResult<Option<TimerBrand>> {
    match (left, right) {
        (None, None) => Ok(None),
        (Some(b), None) | (None, Some(b)) => Ok(Some(b)),
        (Some(l), Some(r)) if l == r => Ok(Some(l)),
        (Some(l), Some(r)) => Err(TimerError::BrandMismatch {
            left: l.to_string(),
            right: r.to_string(),
        }),
    }
}

fn checked_add(a: u64, b: u64) -> TimerResult<u64> {
    a.checked_add(b)
        .ok_or_else(|| TimerError::Arithmetic(format!("{a} + {b} overflows")))
}

fn checked_sub(a: u64, b: u64) -> TimerResult<u64> {
    a.checked_sub(b)
        .ok_or_else(|| TimerError::Arithmetic(format!("{a} - {b} is negative")))
}

fn checked_rem(a: u64, step: u64) -> TimerResult<u64> {
    a.checked_rem(step)
        .ok_or_else(|| TimerError::Arithmetic(format!("{a} mod 0")))
}

impl Timestamp {
    /// `abs + rel`
    pub fn add_rel(&self, rel: RelativeTime) -> TimerResult<Timestamp> {
        let brand = shared_brand(self.brand(), rel.brand())?;
        let value = checked_add(self.abs_value(), rel.rel_value())?;
        Ok(Timestamp::with_brand(value, brand))
    }

    /// `abs - rel`
    pub fn sub_rel(&self, rel: RelativeTime) -> TimerResult<Timestamp> {
        let brand = shared_brand(self.brand(), rel.brand())?;
        let value = checked_sub(self.abs_value(), rel.rel_value())?;
        Ok(Timestamp::with_brand(value, brand))
    }

    /// `abs1 - abs2`; errors if `abs2` is later than `abs1`.
    pub fn sub_abs(&self, other: Timestamp) -> TimerResult<RelativeTime> {
        let brand = shared_brand(self.brand(), other.brand())?;
        let value = checked_sub(self.abs_value(), other.abs_value())?;
        Ok(RelativeTime::with_brand(value, brand))
    }

    /// `abs1 - abs2`, clamped to zero.
    pub fn clamped_sub_abs(&self, other: Timestamp) -> TimerResult<RelativeTime> {
        let brand = shared_brand(self.brand(), other.brand())?;
        let value = self.abs_value().saturating_sub(other.abs_value());
        Ok(RelativeTime::with_brand(value, brand))
    }

    /// `abs mod step`, as a plain number.
    pub fn modulo(&self, step: RelativeTime) -> TimerResult<u64> {
        shared_brand(self.brand(), step.brand())?;
        checked_rem(self.abs_value(), step.rel_value())
    }

    /// Order two timestamps of compatible brands.
    pub fn compare(&self, other: &Timestamp) -> TimerResult<Ordering> {
        shared_brand(self.brand(), other.brand())?;
        Ok(self.abs_value().cmp(&other.abs_value()))
    }
}

impl RelativeTime {
    /// `rel1 + rel2`
    pub fn add_rel(&self, other: RelativeTime) -> TimerResult<RelativeTime> {
        let brand = shared_brand(self.brand(), other.brand())?;
        let value = checked_add(self.rel_value(), other.rel_value())?;
        Ok(RelativeTime::with_brand(value, brand))
    }

    /// `rel1 - rel2`
    pub fn sub_rel(&self, other: RelativeTime) -> TimerResult<RelativeTime> {
        let brand = shared_brand(self.brand(), other.brand())?;
        let value = checked_sub(self.rel_value(), other.rel_value())?;
        Ok(RelativeTime::with_brand(value, brand))
    }

    /// `rel mod step`, as a plain number.
    pub fn modulo(&self, step: RelativeTime) -> TimerResult<u64> {
        shared_brand(self.brand(), step.brand())?;
        checked_rem(self.rel_value(), step.rel_value())
    }

    pub fn compare(&self, other: &RelativeTime) -> TimerResult<Ordering> {
        shared_brand(self.brand(), other.brand())?;
        Ok(self.rel_value().cmp(&other.rel_value()))
    }
}
