//! Rate-aware time values for editorial timelines.
//!
//! A [`RationalTime`] is a point in time expressed as `value / rate` seconds;
//! a [`TimeRange`] is the half-open interval
//! `[start_time, start_time + duration)`. Arithmetic between values of
//! different rates promotes to the larger rate.

pub mod rational_time;
pub mod time_range;

pub use rational_time::RationalTime;
pub use time_range::{
  DEFAULT_EPSILON_S,
  TimeRange,
};
