//! Outcomes reported by tree and edit operations.
//!
//! Every fallible call returns [`Result<T>`]. The variant identifies the
//! outcome (see [`TimelineError::code`]); its `Display` output is the detail
//! string.

use the_time::{
  RationalTime,
  TimeRange,
};
use thiserror::Error;

use crate::tree::NodeId;

pub type Result<T> = std::result::Result<T, TimelineError>;

#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum TimelineError {
  #[error("node {0:?} does not exist")]
  UnknownNode(NodeId),
  #[error("node {child:?} already has a parent")]
  ChildAlreadyParented { child: NodeId },
  #[error("index {index} is out of bounds for {len} children")]
  IllegalIndex { index: isize, len: usize },
  #[error("node {child:?} is not a child of {parent:?}")]
  NotAChildOf { child: NodeId, parent: NodeId },
  #[error("node {0:?} has no parent")]
  Detached(NodeId),
  #[error("node {node:?} does not descend from {ancestor:?}")]
  NotDescendedFrom { node: NodeId, ancestor: NodeId },
  #[error("no item found at {time}")]
  NotAnItem { time: RationalTime },
  #[error("no gap found at {time}")]
  NotAGap { time: RationalTime },
  #[error("transition {transition:?} spans {time}")]
  CannotTrimTransition {
    transition: NodeId,
    time:       RationalTime,
  },
  #[error("range {range} does not overlap {node:?}")]
  InvalidTimeRange { node: NodeId, range: TimeRange },
  #[error("internal error: {0}")]
  InternalError(String),
  #[error("node {node:?} is not a {expected}")]
  TypeMismatch {
    node:     NodeId,
    expected: &'static str,
  },
  #[error("cannot compute available range of {0:?}")]
  CannotComputeAvailableRange(NodeId),
  #[error("attaching {child:?} under {parent:?} would create a cycle")]
  WouldCycle { parent: NodeId, child: NodeId },
}

impl TimelineError {
  /// Stable outcome code, suitable for bindings and logs.
  pub fn code(&self) -> &'static str {
    match self {
      Self::UnknownNode(_) => "UNKNOWN_NODE",
      Self::ChildAlreadyParented { .. } => "CHILD_ALREADY_PARENTED",
      Self::IllegalIndex { .. } => "ILLEGAL_INDEX",
      Self::NotAChildOf { .. } | Self::Detached(_) => "NOT_A_CHILD_OF",
      Self::NotDescendedFrom { .. } => "NOT_DESCENDED_FROM",
      Self::NotAnItem { .. } => "NOT_AN_ITEM",
      Self::NotAGap { .. } => "NOT_A_GAP",
      Self::CannotTrimTransition { .. } => "CANNOT_TRIM_TRANSITION",
      Self::InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
      Self::InternalError(_) => "INTERNAL_ERROR",
      Self::TypeMismatch { .. } => "TYPE_MISMATCH",
      Self::CannotComputeAvailableRange(_) => "CANNOT_COMPUTE_AVAILABLE_RANGE",
      Self::WouldCycle { .. } => "WOULD_CYCLE",
    }
  }
}
