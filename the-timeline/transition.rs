use serde::{
  Deserialize,
  Serialize,
};
use the_time::RationalTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
  #[default]
  SmpteDissolve,
  Custom,
}

/// Overlap window between two neighbors on a track.
///
/// `in_offset` reaches back into the previous item, `out_offset` forward into
/// the next one. A transition takes up no track time of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
  pub in_offset:       RationalTime,
  pub out_offset:      RationalTime,
  #[serde(default)]
  pub transition_type: TransitionType,
}

impl Transition {
  pub fn new(
    in_offset: RationalTime,
    out_offset: RationalTime,
    transition_type: TransitionType,
  ) -> Self {
    Self {
      in_offset,
      out_offset,
      transition_type,
    }
  }

  pub fn dissolve(in_offset: RationalTime, out_offset: RationalTime) -> Self {
    Self::new(in_offset, out_offset, TransitionType::SmpteDissolve)
  }

  pub fn duration(&self) -> RationalTime {
    self.in_offset + self.out_offset
  }
}
