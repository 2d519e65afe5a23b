use serde::{
  Deserialize,
  Serialize,
};
use the_time::{
  RationalTime,
  TimeRange,
};

use crate::{
  composition::Composition,
  error::{
    Result,
    TimelineError,
  },
  item::Gap,
  tree::{
    NodeId,
    NodeKind,
    Tree,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
  #[default]
  Video,
  Audio,
}

/// Whether [`Tree::neighbors_of`] invents a gap beside a transition that
/// sits at either end of its track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborGapPolicy {
  #[default]
  Never,
  AroundTransitions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Neighbor {
  Child(NodeId),
  /// Placeholder for the missing side of an edge transition. Not part of the
  /// tree.
  Gap(Gap),
}

impl Neighbor {
  pub fn child(&self) -> Option<NodeId> {
    match self {
      Self::Child(id) => Some(*id),
      Self::Gap(_) => None,
    }
  }
}

/// Children laid out end to end. Transitions overlap their neighbors and do
/// not advance the layout.
#[derive(Debug, Default)]
pub struct Track {
  pub(crate) composition: Composition,
  pub kind:               TrackKind,
}

impl Track {
  pub fn new(kind: TrackKind) -> Self {
    Self {
      composition: Composition::default(),
      kind,
    }
  }

  pub fn composition(&self) -> &Composition {
    &self.composition
  }
}

impl Tree {
  pub(crate) fn track_range_of_child_at_index(
    &self,
    children: &[NodeId],
    index: usize,
  ) -> Result<TimeRange> {
    let child = children[index];
    let duration = self.duration(child)?;

    let mut start = RationalTime::new(0.0, duration.rate());
    for &previous in &children[..index] {
      if !self.node(previous)?.overlapping() {
        start += self.duration(previous)?;
      }
    }
    if let Some(transition) = self.node(child)?.as_transition() {
      start -= transition.in_offset;
    }
    Ok(TimeRange::new(start, duration))
  }

  pub(crate) fn track_range_of_all_children(&self, children: &[NodeId]) -> Result<Vec<TimeRange>> {
    let mut ranges = Vec::with_capacity(children.len());
    let Some(&first) = children.first() else {
      return Ok(ranges);
    };

    let mut last_end = RationalTime::new(0.0, self.duration(first)?.rate());
    for &child in children {
      match self.node(child)?.as_transition() {
        Some(transition) => {
          ranges.push(TimeRange::new(
            last_end - transition.in_offset,
            transition.duration(),
          ));
        },
        None => {
          let range = TimeRange::new(last_end, self.duration(child)?);
          last_end = range.end_time_exclusive();
          ranges.push(range);
        },
      }
    }
    Ok(ranges)
  }

  /// Sum of the item durations plus any transition overhang at either end.
  pub(crate) fn track_available_range(&self, children: &[NodeId]) -> Result<TimeRange> {
    let mut duration = RationalTime::default();
    if let Some(&first) = children.first()
      && let Some(transition) = self.node(first)?.as_transition()
    {
      duration += transition.in_offset;
    }
    if let Some(&last) = children.last()
      && let Some(transition) = self.node(last)?.as_transition()
    {
      duration += transition.out_offset;
    }
    for &child in children {
      if self.node(child)?.is_item() {
        duration += self.duration(child)?;
      }
    }
    Ok(TimeRange::new(RationalTime::new(0.0, duration.rate()), duration))
  }

  fn track_children(&self, track: NodeId) -> Result<&[NodeId]> {
    match &self.node(track)?.kind {
      NodeKind::Track(track) => Ok(track.composition.children()),
      _ => {
        Err(TimelineError::TypeMismatch {
          node:     track,
          expected: "track",
        })
      },
    }
  }

  /// The children directly before and after `item` on `track`.
  pub fn neighbors_of(
    &self,
    track: NodeId,
    item: NodeId,
    policy: NeighborGapPolicy,
  ) -> Result<(Option<Neighbor>, Option<Neighbor>)> {
    let children = self.track_children(track)?;
    let index = self.index_of_child(track, item)?;
    let edge_transition = match policy {
      NeighborGapPolicy::AroundTransitions => self.node(item)?.as_transition().copied(),
      NeighborGapPolicy::Never => None,
    };

    let previous = if index > 0 {
      Some(Neighbor::Child(children[index - 1]))
    } else {
      edge_transition.map(|transition| {
        Neighbor::Gap(Gap::new(TimeRange::new(
          RationalTime::new(0.0, transition.in_offset.rate()),
          transition.in_offset,
        )))
      })
    };

    let next = if index + 1 < children.len() {
      Some(Neighbor::Child(children[index + 1]))
    } else {
      edge_transition.map(|transition| {
        Neighbor::Gap(Gap::new(TimeRange::new(
          RationalTime::new(0.0, transition.out_offset.rate()),
          transition.out_offset,
        )))
      })
    };

    Ok((previous, next))
  }

  /// How much of `child`'s range is handle reserved by an adjacent
  /// transition: the previous transition's `in_offset` and the next one's
  /// `out_offset`. Children of a stack have no handles.
  pub fn handles_of_child(
    &self,
    comp: NodeId,
    child: NodeId,
  ) -> Result<(Option<RationalTime>, Option<RationalTime>)> {
    let NodeKind::Track(_) = self.node(comp)?.kind else {
      self.index_of_child(comp, child)?;
      return Ok((None, None));
    };

    let (previous, next) = self.neighbors_of(comp, child, NeighborGapPolicy::Never)?;
    let head = previous
      .and_then(|neighbor| neighbor.child())
      .and_then(|id| self.get(id))
      .and_then(|node| node.as_transition())
      .map(|transition| transition.in_offset);
    let tail = next
      .and_then(|neighbor| neighbor.child())
      .and_then(|id| self.get(id))
      .and_then(|node| node.as_transition())
      .map(|transition| transition.out_offset);
    Ok((head, tail))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    item::Clip,
    transition::Transition,
    tree::Node,
  };

  fn rt(value: f64) -> RationalTime {
    RationalTime::new(value, 24.0)
  }

  fn range(start: f64, duration: f64) -> TimeRange {
    TimeRange::new(rt(start), rt(duration))
  }

  struct Fixture {
    tree:       Tree,
    track:      NodeId,
    a:          NodeId,
    transition: NodeId,
    b:          NodeId,
  }

  // a [0,24), dissolve 6/6 between, b [24,48)
  fn fixture() -> Fixture {
    let mut tree = Tree::new();
    let track = tree.add(Node::track("track", TrackKind::Video));
    let a = tree.add(Node::clip("a", Clip::new(Some(range(0.0, 24.0)))));
    let transition = tree.add(Node::transition("dissolve", Transition::dissolve(rt(6.0), rt(6.0))));
    let b = tree.add(Node::clip("b", Clip::new(Some(range(100.0, 24.0)))));
    for child in [a, transition, b] {
      tree.append_child(track, child).unwrap();
    }
    Fixture {
      tree,
      track,
      a,
      transition,
      b,
    }
  }

  #[test]
  fn transitions_overlap_their_neighbors() {
    let Fixture { tree, track, .. } = fixture();
    let ranges = tree.range_of_all_children(track).unwrap();
    assert_eq!(ranges, vec![range(0.0, 24.0), range(18.0, 12.0), range(24.0, 24.0)]);
    for (index, expected) in ranges.iter().enumerate() {
      assert_eq!(tree.range_of_child_at_index(track, index as isize).unwrap(), *expected);
    }
    assert_eq!(tree.duration(track).unwrap(), rt(48.0));
  }

  #[test]
  fn edge_transitions_extend_the_available_range() {
    let mut tree = Tree::new();
    let track = tree.add(Node::track("track", TrackKind::Audio));
    let lead = tree.add(Node::transition("in", Transition::dissolve(rt(3.0), rt(0.0))));
    let clip = tree.add(Node::clip("clip", Clip::new(Some(range(0.0, 10.0)))));
    let tail = tree.add(Node::transition("out", Transition::dissolve(rt(0.0), rt(5.0))));
    for child in [lead, clip, tail] {
      tree.append_child(track, child).unwrap();
    }
    assert_eq!(tree.available_range(track).unwrap(), range(0.0, 18.0));
    assert_eq!(tree.range_of_child_at_index(track, 0).unwrap(), range(-3.0, 3.0));
  }

  #[test]
  fn empty_track_has_zero_duration() {
    let mut tree = Tree::new();
    let track = tree.add(Node::track("track", TrackKind::Video));
    assert_eq!(tree.duration(track).unwrap().value(), 0.0);
    assert!(tree.range_of_all_children(track).unwrap().is_empty());
  }

  #[test]
  fn neighbors_follow_the_gap_policy() {
    let mut tree = Tree::new();
    let track = tree.add(Node::track("track", TrackKind::Video));
    let transition = tree.add(Node::transition("dissolve", Transition::dissolve(rt(4.0), rt(8.0))));
    tree.append_child(track, transition).unwrap();

    let (previous, next) = tree
      .neighbors_of(track, transition, NeighborGapPolicy::Never)
      .unwrap();
    assert!(previous.is_none() && next.is_none());

    let (previous, next) = tree
      .neighbors_of(track, transition, NeighborGapPolicy::AroundTransitions)
      .unwrap();
    assert_eq!(previous, Some(Neighbor::Gap(Gap::new(range(0.0, 4.0)))));
    assert_eq!(next, Some(Neighbor::Gap(Gap::new(range(0.0, 8.0)))));
    assert_eq!(tree.children(track).unwrap().len(), 1);
  }

  #[test]
  fn neighbors_of_an_item() {
    let Fixture {
      tree,
      track,
      a,
      transition,
      b,
    } = fixture();
    let (previous, next) = tree
      .neighbors_of(track, transition, NeighborGapPolicy::AroundTransitions)
      .unwrap();
    assert_eq!(previous, Some(Neighbor::Child(a)));
    assert_eq!(next, Some(Neighbor::Child(b)));

    let (previous, _) = tree
      .neighbors_of(track, a, NeighborGapPolicy::AroundTransitions)
      .unwrap();
    assert_eq!(previous, None);
  }

  #[test]
  fn leading_transition_gets_a_gap_on_one_side() {
    let mut tree = Tree::new();
    let track = tree.add(Node::track("track", TrackKind::Video));
    let lead = tree.add(Node::transition("in", Transition::dissolve(rt(2.0), rt(3.0))));
    let a = tree.add(Node::clip("a", Clip::new(Some(range(0.0, 24.0)))));
    for child in [lead, a] {
      tree.append_child(track, child).unwrap();
    }

    let (previous, next) = tree
      .neighbors_of(track, lead, NeighborGapPolicy::AroundTransitions)
      .unwrap();
    assert_eq!(previous, Some(Neighbor::Gap(Gap::new(range(0.0, 2.0)))));
    assert_eq!(next, Some(Neighbor::Child(a)));

    let (previous, next) = tree
      .neighbors_of(track, a, NeighborGapPolicy::AroundTransitions)
      .unwrap();
    assert_eq!(previous, Some(Neighbor::Child(lead)));
    assert_eq!(next, None);
    assert_eq!(tree.children(track).unwrap(), &[lead, a]);
  }

  #[test]
  fn handles_come_from_adjacent_transitions() {
    let Fixture {
      tree,
      track,
      a,
      b,
      ..
    } = fixture();
    assert_eq!(tree.handles_of_child(track, a).unwrap(), (None, Some(rt(6.0))));
    assert_eq!(tree.handles_of_child(track, b).unwrap(), (Some(rt(6.0)), None));
  }

  #[test]
  fn neighbors_require_a_track() {
    let mut tree = Tree::new();
    let stack = tree.add(Node::stack("stack"));
    let clip = tree.add(Node::clip("clip", Clip::new(Some(range(0.0, 1.0)))));
    tree.append_child(stack, clip).unwrap();
    let err = tree.neighbors_of(stack, clip, NeighborGapPolicy::Never).unwrap_err();
    assert_eq!(err.code(), "TYPE_MISMATCH");
    assert_eq!(tree.handles_of_child(stack, clip).unwrap(), (None, None));
  }
}
