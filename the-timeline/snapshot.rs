//! Owned, serializable copies of subtrees.
//!
//! A [`Snapshot`] holds no handles, so two subtrees are structurally
//! equivalent exactly when their snapshots compare equal.

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  error::Result,
  item::{
    Clip,
    Gap,
    ItemData,
  },
  stack::Stack,
  track::{
    Track,
    TrackKind,
  },
  transition::Transition,
  tree::{
    Metadata,
    Node,
    NodeId,
    NodeKind,
    Tree,
  },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
  Clip(Clip),
  Gap(Gap),
  Transition(Transition),
  Track { item: ItemData, kind: TrackKind },
  Stack { item: ItemData },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  pub name:     String,
  #[serde(default, skip_serializing_if = "Metadata::is_empty")]
  pub metadata: Metadata,
  pub payload:  Payload,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<Snapshot>,
}

impl Snapshot {
  /// Number of nodes in the captured subtree.
  pub fn node_count(&self) -> usize {
    1 + self.children.iter().map(Snapshot::node_count).sum::<usize>()
  }
}

impl Tree {
  /// Captures the subtree rooted at `id`.
  pub fn snapshot(&self, id: NodeId) -> Result<Snapshot> {
    let node = self.node(id)?;
    let payload = match &node.kind {
      NodeKind::Clip(clip) => Payload::Clip(clip.clone()),
      NodeKind::Gap(gap) => Payload::Gap(gap.clone()),
      NodeKind::Transition(transition) => Payload::Transition(*transition),
      NodeKind::Track(track) => {
        Payload::Track {
          item: track.composition.item.clone(),
          kind: track.kind,
        }
      },
      NodeKind::Stack(stack) => {
        Payload::Stack {
          item: stack.composition.item.clone(),
        }
      },
    };

    let children = match node.composition() {
      Some(composition) => {
        composition
          .children()
          .iter()
          .map(|&child| self.snapshot(child))
          .collect::<Result<_>>()?
      },
      None => Vec::new(),
    };

    Ok(Snapshot {
      name: node.name.clone(),
      metadata: node.metadata.clone(),
      payload,
      children,
    })
  }

  /// Rebuilds `snapshot` as a new detached subtree and returns its root.
  pub fn restore(&mut self, snapshot: &Snapshot) -> Result<NodeId> {
    let root = self.restore_node(snapshot);
    if let Err(err) = self.restore_children(root, snapshot) {
      self.delete(root)?;
      return Err(err);
    }
    tracing::trace!(?root, nodes = snapshot.node_count(), "restored snapshot");
    Ok(root)
  }

  fn restore_node(&mut self, snapshot: &Snapshot) -> NodeId {
    let kind = match &snapshot.payload {
      Payload::Clip(clip) => NodeKind::Clip(clip.clone()),
      Payload::Gap(gap) => NodeKind::Gap(gap.clone()),
      Payload::Transition(transition) => NodeKind::Transition(*transition),
      Payload::Track { item, kind } => {
        let mut track = Track::new(*kind);
        track.composition.item = item.clone();
        NodeKind::Track(track)
      },
      Payload::Stack { item } => {
        let mut stack = Stack::default();
        stack.composition.item = item.clone();
        NodeKind::Stack(stack)
      },
    };
    self.add(Node::new(snapshot.name.clone(), kind).with_metadata(snapshot.metadata.clone()))
  }

  fn restore_children(&mut self, parent: NodeId, snapshot: &Snapshot) -> Result<()> {
    for child in &snapshot.children {
      let id = self.restore_node(child);
      self.append_child(parent, id)?;
      self.restore_children(id, child)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use the_time::{
    RationalTime,
    TimeRange,
  };

  use super::*;
  use crate::item::{
    Effect,
    Marker,
    MarkerColor,
  };

  fn range(start: f64, duration: f64) -> TimeRange {
    TimeRange::new(RationalTime::new(start, 24.0), RationalTime::new(duration, 24.0))
  }

  fn sample(tree: &mut Tree) -> NodeId {
    let stack = tree.add(Node::stack("stack"));
    let track = tree.add(Node::track("v1", TrackKind::Video));
    let mut metadata = Metadata::new();
    metadata.insert("reel".into(), json!({ "id": 7, "tags": ["a", "b"] }));
    let mut clip = Clip::new(Some(range(0.0, 24.0))).with_available_range(range(0.0, 48.0));
    clip.item.markers.push(Marker {
      name:         "mark".into(),
      marked_range: range(2.0, 1.0),
      color:        MarkerColor::Green,
    });
    clip.item.effects.push(Effect::Custom {
      name:        "blur".into(),
      effect_name: "Blur".into(),
    });
    let clip = tree.add(Node::clip("shot", clip).with_metadata(metadata));
    let transition = tree.add(Node::transition(
      "dissolve",
      Transition::dissolve(RationalTime::new(2.0, 24.0), RationalTime::new(2.0, 24.0)),
    ));
    let gap = tree.add(Node::gap(range(0.0, 12.0)));
    for child in [clip, transition, gap] {
      tree.append_child(track, child).unwrap();
    }
    tree.append_child(stack, track).unwrap();
    stack
  }

  #[test]
  fn clone_is_structurally_equal_and_detached() {
    let mut tree = Tree::new();
    let stack = sample(&mut tree);
    let track = tree.children(stack).unwrap()[0];

    let copy = tree.clone_subtree(track).unwrap();
    assert_ne!(copy, track);
    assert_eq!(tree.parent(copy).unwrap(), None);
    assert_eq!(tree.snapshot(copy).unwrap(), tree.snapshot(track).unwrap());
    assert_eq!(tree.len(), 9);
    assert!(tree.validate().is_ok());

    let copied_clip = tree.children(copy).unwrap()[0];
    tree.set_source_range(copied_clip, None).unwrap();
    assert_ne!(tree.snapshot(copy).unwrap(), tree.snapshot(track).unwrap());
  }

  #[test]
  fn survives_a_json_round_trip() {
    let mut tree = Tree::new();
    let stack = sample(&mut tree);
    let snapshot = tree.snapshot(stack).unwrap();
    assert_eq!(snapshot.node_count(), 5);

    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded: Snapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, snapshot);

    let mut other = Tree::new();
    let restored = other.restore(&decoded).unwrap();
    assert_eq!(other.len(), 5);
    assert_eq!(other.duration(restored).unwrap(), RationalTime::new(36.0, 24.0));
  }

  #[test]
  fn payload_is_tagged_by_kind() {
    let mut tree = Tree::new();
    let gap = tree.add(Node::gap(range(0.0, 12.0)));
    let value = serde_json::to_value(tree.snapshot(gap).unwrap()).unwrap();
    assert_eq!(value["payload"]["kind"], "gap");
    assert!(value.get("children").is_none());
  }
}
