//! Editorial timelines: clips, gaps and transitions laid out in tracks and
//! stacks, plus the edit operations that rearrange them.
//!
//! All nodes live in a [`Tree`] arena and are addressed by [`NodeId`]. A node
//! belongs to at most one container; containers are either sequential
//! ([`Track`]) or layered ([`Stack`]). Every query and edit is a method on or
//! a function of the tree, returning [`Result`] with a [`TimelineError`] whose
//! [`code`](TimelineError::code) names the failure.

pub mod composition;
pub mod config;
pub mod edit;
pub mod error;
pub mod item;
pub mod snapshot;
pub mod stack;
pub mod track;
pub mod track_algo;
pub mod transition;
pub mod tree;

pub use composition::{
  Composition,
  KindFilter,
};
pub use config::{
  ConfigError,
  EditConfig,
};
pub use edit::{
  Editor,
  ReferencePoint,
};
pub use error::{
  Result,
  TimelineError,
};
pub use item::{
  Clip,
  Effect,
  Gap,
  ItemData,
  Marker,
  MarkerColor,
  MediaReference,
};
pub use snapshot::{
  Payload,
  Snapshot,
};
pub use stack::Stack;
pub use the_time::{
  RationalTime,
  TimeRange,
};
pub use track::{
  Neighbor,
  NeighborGapPolicy,
  Track,
  TrackKind,
};
pub use track_algo::{
  flatten_stack,
  flatten_tracks,
  track_trimmed_to_range,
};
pub use transition::{
  Transition,
  TransitionType,
};
pub use tree::{
  InvariantError,
  Metadata,
  Node,
  NodeId,
  NodeKind,
  Tree,
};
