//! Item payloads (clips and gaps) and the queries shared by everything that
//! occupies time in a composition.

use serde::{
  Deserialize,
  Serialize,
};
use the_time::{
  RationalTime,
  TimeRange,
};

use crate::{
  error::{
    Result,
    TimelineError,
  },
  tree::{
    NodeId,
    NodeKind,
    Tree,
  },
};

/// Values below this are treated as zero when deciding whether an edit leaves
/// a remnant behind.
pub(crate) const EDIT_EPSILON: f64 = 5.82077e-11;

#[inline]
pub(crate) fn is_zero(time: RationalTime) -> bool {
  time.value().abs() <= EDIT_EPSILON
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
  pub source_range: Option<TimeRange>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub effects:      Vec<Effect>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub markers:      Vec<Marker>,
}

impl ItemData {
  pub fn new(source_range: Option<TimeRange>) -> Self {
    Self {
      source_range,
      ..Self::default()
    }
  }

  pub fn time_scalar(&self) -> Option<f64> {
    self.effects.iter().find_map(|effect| {
      match effect {
        Effect::LinearTimeWarp { time_scalar, .. } => Some(*time_scalar),
        Effect::Custom { .. } => None,
      }
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
  LinearTimeWarp {
    name:        String,
    effect_name: String,
    time_scalar: f64,
  },
  Custom {
    name:        String,
    effect_name: String,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerColor {
  #[default]
  Red,
  Orange,
  Yellow,
  Green,
  Cyan,
  Blue,
  Purple,
  Magenta,
  Black,
  White,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
  pub name:         String,
  pub marked_range: TimeRange,
  #[serde(default)]
  pub color:        MarkerColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
  pub target_url:      Option<String>,
  pub available_range: Option<TimeRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip {
  pub item:            ItemData,
  pub media_reference: Option<MediaReference>,
}

impl Clip {
  pub fn new(source_range: Option<TimeRange>) -> Self {
    Self {
      item:            ItemData::new(source_range),
      media_reference: None,
    }
  }

  pub fn with_media(mut self, media_reference: MediaReference) -> Self {
    self.media_reference = Some(media_reference);
    self
  }

  /// Clip whose media spans `available_range`.
  pub fn with_available_range(self, available_range: TimeRange) -> Self {
    self.with_media(MediaReference {
      target_url:      None,
      available_range: Some(available_range),
    })
  }
}

/// Empty time. A gap has no media, so its extent is its source range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
  pub item: ItemData,
}

impl Gap {
  pub fn new(source_range: TimeRange) -> Self {
    Self {
      item: ItemData::new(Some(source_range)),
    }
  }
}

impl Tree {
  pub fn source_range(&self, id: NodeId) -> Result<Option<TimeRange>> {
    Ok(self.item_data(id)?.source_range)
  }

  pub fn set_source_range(&mut self, id: NodeId, source_range: Option<TimeRange>) -> Result<()> {
    self.item_data_mut(id)?.source_range = source_range;
    Ok(())
  }

  pub fn effects(&self, id: NodeId) -> Result<&[Effect]> {
    Ok(&self.item_data(id)?.effects)
  }

  pub fn add_effect(&mut self, id: NodeId, effect: Effect) -> Result<()> {
    self.item_data_mut(id)?.effects.push(effect);
    Ok(())
  }

  pub fn markers(&self, id: NodeId) -> Result<&[Marker]> {
    Ok(&self.item_data(id)?.markers)
  }

  pub fn add_marker(&mut self, id: NodeId, marker: Marker) -> Result<()> {
    self.item_data_mut(id)?.markers.push(marker);
    Ok(())
  }

  /// Full extent of the underlying media (clips) or of the laid out children
  /// (compositions).
  pub fn available_range(&self, id: NodeId) -> Result<TimeRange> {
    let node = self.node(id)?;
    match &node.kind {
      NodeKind::Clip(clip) => {
        clip
          .media_reference
          .as_ref()
          .and_then(|media| media.available_range)
          .ok_or(TimelineError::CannotComputeAvailableRange(id))
      },
      NodeKind::Gap(_) => Err(TimelineError::CannotComputeAvailableRange(id)),
      NodeKind::Track(track) => self.track_available_range(track.composition.children()),
      NodeKind::Stack(stack) => self.stack_available_range(stack.composition.children()),
      NodeKind::Transition(_) => {
        Err(TimelineError::TypeMismatch {
          node:     id,
          expected: "item",
        })
      },
    }
  }

  /// The available range when it is known and non-empty; used by edits that
  /// clamp against media bounds only when there are any. Missing media is
  /// `None`, any other failure is an error.
  pub(crate) fn known_available_range(&self, id: NodeId) -> Result<Option<TimeRange>> {
    match self.available_range(id) {
      Ok(range) => Ok(Some(range).filter(|range| !is_zero(range.duration()))),
      Err(TimelineError::CannotComputeAvailableRange(_)) => Ok(None),
      Err(err) => Err(err),
    }
  }

  /// The source range if set, otherwise the available range.
  pub fn trimmed_range(&self, id: NodeId) -> Result<TimeRange> {
    match self.source_range(id)? {
      Some(range) => Ok(range),
      None => self.available_range(id),
    }
  }

  /// Time taken up by `id`. For a transition, the width of its overlap window.
  pub fn duration(&self, id: NodeId) -> Result<RationalTime> {
    match &self.node(id)?.kind {
      NodeKind::Transition(transition) => Ok(transition.duration()),
      _ => Ok(self.trimmed_range(id)?.duration()),
    }
  }

  pub fn visible(&self, id: NodeId) -> Result<bool> {
    Ok(self.node(id)?.visible())
  }

  pub fn overlapping(&self, id: NodeId) -> Result<bool> {
    Ok(self.node(id)?.overlapping())
  }

  /// Range of `id` in its container's coordinate space.
  pub fn range_in_parent(&self, id: NodeId) -> Result<TimeRange> {
    let parent = self.parent(id)?.ok_or(TimelineError::Detached(id))?;
    let index = self.index_of_child(parent, id)?;
    self.range_of_child_at_index(parent, index as isize)
  }

  /// Like [`Tree::range_in_parent`], clipped to the container's source range.
  /// `None` when the container trims the child away completely.
  pub fn trimmed_range_in_parent(&self, id: NodeId) -> Result<Option<TimeRange>> {
    let parent = self.parent(id)?.ok_or(TimelineError::Detached(id))?;
    self.trimmed_range_of_child(parent, id)
  }
}
