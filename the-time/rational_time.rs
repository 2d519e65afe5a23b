use std::{
  cmp::Ordering,
  fmt,
  ops::{
    Add,
    AddAssign,
    Neg,
    Sub,
    SubAssign,
  },
};

use serde::{
  Deserialize,
  Serialize,
};

/// A point in time (or a duration) expressed as `value / rate` seconds.
///
/// Values of different rates may be mixed freely: arithmetic promotes to the
/// larger rate and comparisons happen in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RationalTime {
  value: f64,
  rate:  f64,
}

impl Default for RationalTime {
  fn default() -> Self {
    Self::new(0.0, 1.0)
  }
}

impl RationalTime {
  pub const fn new(value: f64, rate: f64) -> Self {
    Self { value, rate }
  }

  #[inline]
  pub const fn value(self) -> f64 {
    self.value
  }

  #[inline]
  pub const fn rate(self) -> f64 {
    self.rate
  }

  /// NaN components and non-positive rates make a time unusable.
  pub fn is_invalid_time(self) -> bool {
    self.value.is_nan() || self.rate.is_nan() || self.rate <= 0.0
  }

  pub fn value_rescaled_to(self, rate: f64) -> f64 {
    if rate == self.rate {
      self.value
    } else {
      (self.value * rate) / self.rate
    }
  }

  pub fn rescaled_to(self, rate: f64) -> Self {
    Self::new(self.value_rescaled_to(rate), rate)
  }

  pub fn to_seconds(self) -> f64 {
    self.value_rescaled_to(1.0)
  }

  pub fn from_seconds(seconds: f64, rate: f64) -> Self {
    Self::new(seconds, 1.0).rescaled_to(rate)
  }

  /// Whole frames only; the fractional part of `frame` is dropped.
  pub fn from_frames(frame: f64, rate: f64) -> Self {
    Self::new(frame.trunc(), rate)
  }

  pub fn to_frames(self) -> i64 {
    self.value as i64
  }

  pub fn floor(self) -> Self {
    Self::new(self.value.floor(), self.rate)
  }

  /// Compares in `other`'s rate, allowing an absolute difference of `delta`.
  pub fn almost_equal(self, other: Self, delta: f64) -> bool {
    (self.value_rescaled_to(other.rate) - other.value).abs() <= delta
  }

  /// The earlier of two times. Ties keep `self`.
  pub fn min(self, other: Self) -> Self {
    if other < self { other } else { self }
  }

  /// The later of two times. Ties keep `self`.
  pub fn max(self, other: Self) -> Self {
    if self < other { other } else { self }
  }

  /// Duration between two times, expressed in the rate of `start_time`.
  pub fn duration_from_start_end_time(start_time: Self, end_time_exclusive: Self) -> Self {
    if start_time.rate == end_time_exclusive.rate {
      Self::new(end_time_exclusive.value - start_time.value, start_time.rate)
    } else {
      Self::new(
        end_time_exclusive.value_rescaled_to(start_time.rate) - start_time.value,
        start_time.rate,
      )
    }
  }
}

impl fmt::Display for RationalTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.value, self.rate)
  }
}

impl Add for RationalTime {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    if self.rate < rhs.rate {
      Self::new(self.value_rescaled_to(rhs.rate) + rhs.value, rhs.rate)
    } else {
      Self::new(rhs.value_rescaled_to(self.rate) + self.value, self.rate)
    }
  }
}

impl Sub for RationalTime {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self {
    if self.rate < rhs.rate {
      Self::new(self.value_rescaled_to(rhs.rate) - rhs.value, rhs.rate)
    } else {
      Self::new(self.value - rhs.value_rescaled_to(self.rate), self.rate)
    }
  }
}

impl AddAssign for RationalTime {
  fn add_assign(&mut self, rhs: Self) {
    *self = *self + rhs;
  }
}

impl SubAssign for RationalTime {
  fn sub_assign(&mut self, rhs: Self) {
    *self = *self - rhs;
  }
}

impl Neg for RationalTime {
  type Output = Self;

  fn neg(self) -> Self {
    Self::new(-self.value, self.rate)
  }
}

impl PartialEq for RationalTime {
  fn eq(&self, other: &Self) -> bool {
    self.value_rescaled_to(other.rate) == other.value
  }
}

impl PartialOrd for RationalTime {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    if self == other {
      return Some(Ordering::Equal);
    }
    (self.value / self.rate).partial_cmp(&(other.value / other.rate))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn arithmetic_promotes_to_larger_rate() {
    let a = RationalTime::new(12.0, 24.0);
    let b = RationalTime::new(24.0, 48.0);

    let sum = a + b;
    assert_eq!(sum.rate(), 48.0);
    assert_eq!(sum.value(), 48.0);

    let diff = b - a;
    assert_eq!(diff.rate(), 48.0);
    assert_eq!(diff.value(), 0.0);
  }

  #[test]
  fn equality_and_ordering_are_rate_aware() {
    let a = RationalTime::new(12.0, 24.0);
    let b = RationalTime::new(0.5, 1.0);
    assert_eq!(a, b);
    assert!(RationalTime::new(11.0, 24.0) < b);
    assert!(RationalTime::new(25.0, 48.0) > a);
    assert!(a <= b && a >= b);
  }

  #[test]
  fn min_and_max_compare_across_rates() {
    let a = RationalTime::new(12.0, 24.0);
    let b = RationalTime::new(20.0, 48.0);
    assert_eq!(a.min(b).rate(), 48.0);
    assert_eq!(a.max(b).rate(), 24.0);

    let same = RationalTime::new(1.0, 2.0);
    assert_eq!(a.min(same).rate(), 24.0);
    assert_eq!(a.max(same).rate(), 24.0);
  }

  #[test]
  fn duration_from_start_end_uses_start_rate() {
    let start = RationalTime::new(10.0, 24.0);
    let end = RationalTime::new(40.0, 48.0);
    let duration = RationalTime::duration_from_start_end_time(start, end);
    assert_eq!(duration.rate(), 24.0);
    assert_eq!(duration.value(), 10.0);
  }

  #[test]
  fn seconds_round_trip() {
    let time = RationalTime::from_seconds(2.5, 24.0);
    assert_eq!(time.value(), 60.0);
    assert_eq!(time.to_seconds(), 2.5);
    assert_eq!(RationalTime::from_frames(7.9, 24.0).to_frames(), 7);
  }

  #[test]
  fn invalid_times_are_detected() {
    assert!(RationalTime::new(1.0, 0.0).is_invalid_time());
    assert!(RationalTime::new(f64::NAN, 24.0).is_invalid_time());
    assert!(!RationalTime::new(1.0, 24.0).is_invalid_time());
  }

  #[test]
  fn display_is_value_over_rate() {
    assert_eq!(RationalTime::new(12.0, 24.0).to_string(), "12/24");
  }

  quickcheck::quickcheck! {
      fn add_then_sub_is_identity(a: i32, b: i32) -> bool {
          let a = RationalTime::new(a as f64, 24.0);
          let b = RationalTime::new(b as f64, 24.0);
          (a + b) - b == a
      }

      fn mixed_rate_sum_matches_seconds(a: i16, b: i16) -> bool {
          let a = RationalTime::new(a as f64, 24.0);
          let b = RationalTime::new(b as f64, 30.0);
          let sum = a + b;
          (sum.to_seconds() - (a.to_seconds() + b.to_seconds())).abs() < 1e-9
      }
  }
}
