use the_time::{
  RationalTime,
  TimeRange,
};

use crate::{
  composition::Composition,
  error::Result,
  tree::{
    NodeId,
    Tree,
  },
};

/// Children layered on top of each other, all starting at zero.
#[derive(Debug, Default)]
pub struct Stack {
  pub(crate) composition: Composition,
}

impl Stack {
  pub fn composition(&self) -> &Composition {
    &self.composition
  }
}

impl Tree {
  pub(crate) fn stack_range_of_child_at_index(
    &self,
    children: &[NodeId],
    index: usize,
  ) -> Result<TimeRange> {
    let duration = self.duration(children[index])?;
    Ok(TimeRange::new(RationalTime::new(0.0, duration.rate()), duration))
  }

  pub(crate) fn stack_range_of_all_children(&self, children: &[NodeId]) -> Result<Vec<TimeRange>> {
    (0..children.len())
      .map(|index| self.stack_range_of_child_at_index(children, index))
      .collect()
  }

  /// `[0, longest child)`.
  pub(crate) fn stack_available_range(&self, children: &[NodeId]) -> Result<TimeRange> {
    let mut duration = RationalTime::default();
    for &child in children {
      let child_duration = self.duration(child)?;
      if child_duration > duration {
        duration = child_duration;
      }
    }
    Ok(TimeRange::new(RationalTime::new(0.0, duration.rate()), duration))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    item::Clip,
    track::TrackKind,
    tree::Node,
  };

  fn rt(value: f64) -> RationalTime {
    RationalTime::new(value, 24.0)
  }

  fn range(start: f64, duration: f64) -> TimeRange {
    TimeRange::new(rt(start), rt(duration))
  }

  #[test]
  fn children_all_start_at_zero() {
    let mut tree = Tree::new();
    let stack = tree.add(Node::stack("stack"));
    let short = tree.add(Node::clip("short", Clip::new(Some(range(50.0, 10.0)))));
    let track = tree.add(Node::track("track", TrackKind::Video));
    let long = tree.add(Node::clip("long", Clip::new(Some(range(0.0, 30.0)))));
    tree.append_child(track, long).unwrap();
    tree.append_child(stack, short).unwrap();
    tree.append_child(stack, track).unwrap();

    assert_eq!(
      tree.range_of_all_children(stack).unwrap(),
      vec![range(0.0, 10.0), range(0.0, 30.0)]
    );
    assert_eq!(tree.range_of_child_at_index(stack, 1).unwrap(), range(0.0, 30.0));
    assert_eq!(tree.available_range(stack).unwrap(), range(0.0, 30.0));
    assert_eq!(tree.duration(stack).unwrap(), rt(30.0));
  }

  #[test]
  fn child_at_time_scans_every_layer() {
    let mut tree = Tree::new();
    let stack = tree.add(Node::stack("stack"));
    let long = tree.add(Node::clip("long", Clip::new(Some(range(0.0, 30.0)))));
    let short = tree.add(Node::clip("short", Clip::new(Some(range(0.0, 10.0)))));
    tree.append_child(stack, long).unwrap();
    tree.append_child(stack, short).unwrap();

    assert_eq!(tree.child_at_time(stack, rt(5.0), true).unwrap(), Some(long));
    assert_eq!(tree.child_at_time(stack, rt(25.0), true).unwrap(), Some(long));
    assert_eq!(
      tree.children_in_range(stack, range(2.0, 3.0)).unwrap(),
      vec![long, short]
    );
    assert_eq!(tree.handles_of_child(stack, short).unwrap(), (None, None));
  }
}
