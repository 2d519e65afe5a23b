use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};

use crate::RationalTime;

/// Tolerance, in seconds, for range comparisons: half a sample at 192kHz.
pub const DEFAULT_EPSILON_S: f64 = 1.0 / (2.0 * 192000.0);

/// Half-open interval `[start_time, start_time + duration)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeRange {
  start_time: RationalTime,
  duration:   RationalTime,
}

impl TimeRange {
  pub const fn new(start_time: RationalTime, duration: RationalTime) -> Self {
    Self {
      start_time,
      duration,
    }
  }

  /// Zero-length range at `start_time`.
  pub const fn with_start(start_time: RationalTime) -> Self {
    Self::new(start_time, RationalTime::new(0.0, start_time.rate()))
  }

  pub fn range_from_start_end_time(
    start_time: RationalTime,
    end_time_exclusive: RationalTime,
  ) -> Self {
    Self::new(
      start_time,
      RationalTime::duration_from_start_end_time(start_time, end_time_exclusive),
    )
  }

  #[inline]
  pub const fn start_time(&self) -> RationalTime {
    self.start_time
  }

  #[inline]
  pub const fn duration(&self) -> RationalTime {
    self.duration
  }

  pub fn end_time_exclusive(&self) -> RationalTime {
    self.duration + self.start_time.rescaled_to(self.duration.rate())
  }

  /// The last whole sample inside the range. Ranges one sample long (or
  /// shorter) report their start.
  pub fn end_time_inclusive(&self) -> RationalTime {
    let end = self.end_time_exclusive();
    let span = end - self.start_time.rescaled_to(self.duration.rate());
    if span.value() > 1.0 {
      if self.duration.value() != self.duration.value().floor() {
        end.floor()
      } else {
        end - RationalTime::new(1.0, self.duration.rate())
      }
    } else {
      self.start_time
    }
  }

  pub fn duration_extended_by(&self, other: RationalTime) -> Self {
    Self::new(self.start_time, self.duration + other)
  }

  /// Smallest range covering both `self` and `other`.
  pub fn extended_by(&self, other: Self) -> Self {
    let start = self.start_time.min(other.start_time);
    let end = self.end_time_exclusive().max(other.end_time_exclusive());
    Self::range_from_start_end_time(start, end)
  }

  pub fn clamped_time(&self, other: RationalTime) -> RationalTime {
    other.max(self.start_time).min(self.end_time_inclusive())
  }

  pub fn clamped_range(&self, other: Self) -> Self {
    let start = other.start_time.max(self.start_time);
    let shifted = Self::new(start, other.duration);
    let end = shifted.end_time_exclusive().min(self.end_time_exclusive());
    Self::new(start, end - start)
  }

  pub fn contains(&self, time: RationalTime) -> bool {
    self.start_time <= time && time < self.end_time_exclusive()
  }

  /// `other` lies entirely within `self`.
  ///
  /// ```text
  ///        [ other ]
  ///   [      self      ]
  /// ```
  pub fn contains_range(&self, other: &Self) -> bool {
    self.start_time <= other.start_time && self.end_time_exclusive() >= other.end_time_exclusive()
  }

  pub fn overlaps(&self, time: RationalTime) -> bool {
    self.contains(time)
  }

  /// Each range extends at least `epsilon` seconds past the other's start.
  /// Ranges that merely touch do not overlap.
  pub fn overlaps_range(&self, other: &Self, epsilon: f64) -> bool {
    let this_start = self.start_time.to_seconds();
    let this_end = self.end_time_exclusive().to_seconds();
    let other_start = other.start_time.to_seconds();
    let other_end = other.end_time_exclusive().to_seconds();
    (other_end - this_start >= epsilon) && (this_end - other_start >= epsilon)
  }

  pub fn before(&self, other: &Self, epsilon: f64) -> bool {
    other.start_time.to_seconds() - self.end_time_exclusive().to_seconds() >= epsilon
  }

  pub fn before_time(&self, time: RationalTime, epsilon: f64) -> bool {
    time.to_seconds() - self.end_time_exclusive().to_seconds() >= epsilon
  }

  pub fn meets(&self, other: &Self, epsilon: f64) -> bool {
    let gap = other.start_time.to_seconds() - self.end_time_exclusive().to_seconds();
    gap <= epsilon && gap >= 0.0
  }

  pub fn begins(&self, other: &Self, epsilon: f64) -> bool {
    let this_end = self.end_time_exclusive().to_seconds();
    let other_end = other.end_time_exclusive().to_seconds();
    (other.start_time.to_seconds() - self.start_time.to_seconds()).abs() <= epsilon
      && other_end - this_end >= epsilon
  }

  pub fn finishes(&self, other: &Self, epsilon: f64) -> bool {
    let this_end = self.end_time_exclusive().to_seconds();
    let other_end = other.end_time_exclusive().to_seconds();
    (this_end - other_end).abs() <= epsilon
      && self.start_time.to_seconds() - other.start_time.to_seconds() >= epsilon
  }
}

impl PartialEq for TimeRange {
  fn eq(&self, other: &Self) -> bool {
    let start = self.start_time - other.start_time;
    let duration = self.duration - other.duration;
    start.to_seconds().abs() < DEFAULT_EPSILON_S && duration.to_seconds().abs() < DEFAULT_EPSILON_S
  }
}

impl fmt::Display for TimeRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}/{}/{}",
      self.start_time.value(),
      self.duration.value(),
      self.duration.rate()
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rt(value: f64) -> RationalTime {
    RationalTime::new(value, 24.0)
  }

  fn range(start: f64, duration: f64) -> TimeRange {
    TimeRange::new(rt(start), rt(duration))
  }

  #[test]
  fn end_times() {
    let r = range(10.0, 5.0);
    assert_eq!(r.end_time_exclusive(), rt(15.0));
    assert_eq!(r.end_time_inclusive(), rt(14.0));
    assert_eq!(range(10.0, 1.0).end_time_inclusive(), rt(10.0));
    assert_eq!(range(0.0, 2.5).end_time_inclusive(), rt(2.0));
  }

  #[test]
  fn contains_is_half_open() {
    let r = range(0.0, 24.0);
    assert!(r.contains(rt(0.0)));
    assert!(r.contains(rt(23.0)));
    assert!(!r.contains(rt(24.0)));
    assert!(!r.contains(rt(-1.0)));
    assert!(r.contains_range(&range(12.0, 12.0)));
    assert!(!r.contains_range(&range(12.0, 13.0)));
  }

  #[test]
  fn adjacent_ranges_do_not_overlap() {
    let a = range(0.0, 24.0);
    let b = range(24.0, 24.0);
    assert!(!a.overlaps_range(&b, DEFAULT_EPSILON_S));
    assert!(a.meets(&b, DEFAULT_EPSILON_S));
    assert!(a.overlaps_range(&range(23.0, 2.0), DEFAULT_EPSILON_S));
    assert!(a.before(&range(30.0, 1.0), DEFAULT_EPSILON_S));
  }

  #[test]
  fn begins_and_finishes() {
    let outer = range(0.0, 48.0);
    assert!(range(0.0, 12.0).begins(&outer, DEFAULT_EPSILON_S));
    assert!(range(36.0, 12.0).finishes(&outer, DEFAULT_EPSILON_S));
    assert!(!outer.finishes(&outer, DEFAULT_EPSILON_S));
  }

  #[test]
  fn extend_and_clamp() {
    let a = range(0.0, 10.0);
    let b = range(20.0, 10.0);
    assert_eq!(a.extended_by(b), range(0.0, 30.0));
    assert_eq!(a.clamped_range(range(5.0, 10.0)), range(5.0, 5.0));
    assert_eq!(b.clamped_range(range(15.0, 10.0)), range(20.0, 10.0));
    assert_eq!(a.clamped_time(rt(40.0)), rt(9.0));
    assert_eq!(a.duration_extended_by(rt(2.0)), range(0.0, 12.0));
  }

  #[test]
  fn range_from_start_end_time() {
    let r = TimeRange::range_from_start_end_time(rt(12.0), rt(36.0));
    assert_eq!(r, range(12.0, 24.0));
  }

  #[test]
  fn equality_tolerates_mixed_rates() {
    let a = range(12.0, 24.0);
    let b = TimeRange::new(RationalTime::new(0.5, 1.0), RationalTime::new(48.0, 48.0));
    assert_eq!(a, b);
  }

  #[test]
  fn serde_round_trip() {
    let r = range(3.0, 9.0);
    let json = serde_json::to_string(&r).unwrap();
    let back: TimeRange = serde_json::from_str(&json).unwrap();
    assert_eq!(r, back);
  }

  quickcheck::quickcheck! {
      fn extended_by_contains_both(a: i16, da: u8, b: i16, db: u8) -> bool {
          let a = range(a as f64, da as f64);
          let b = range(b as f64, db as f64);
          let joined = a.extended_by(b);
          joined.contains_range(&a) && joined.contains_range(&b)
      }
  }
}
