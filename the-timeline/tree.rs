use std::collections::{
  BTreeMap,
  HashSet,
};

use slotmap::HopSlotMap;
use the_time::TimeRange;

use crate::{
  composition::Composition,
  error::{
    Result,
    TimelineError,
  },
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
};

slotmap::new_key_type! {
  /// Stable handle to a node stored in a [`Tree`].
  pub struct NodeId;
}

pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
  MissingParent,
  ParentNotComposition,
  ParentMismatch,
  MissingChild,
  DuplicateChild,
  ChildSetMismatch,
  Cycle,
}

/// Arena owning every node of one or more timelines.
///
/// Containers own their children through the child list; a child only keeps
/// the handle of its container. Nodes start detached and are attached through
/// the composition methods.
#[derive(Debug, Default)]
pub struct Tree {
  nodes: HopSlotMap<NodeId, Node>,
}

#[derive(Debug)]
pub struct Node {
  pub(crate) parent: Option<NodeId>,
  pub name:          String,
  pub metadata:      Metadata,
  pub kind:          NodeKind,
}

#[derive(Debug)]
pub enum NodeKind {
  Clip(Clip),
  Gap(Gap),
  Transition(Transition),
  Track(Track),
  Stack(Stack),
}

impl NodeKind {
  pub fn label(&self) -> &'static str {
    match self {
      Self::Clip(_) => "clip",
      Self::Gap(_) => "gap",
      Self::Transition(_) => "transition",
      Self::Track(_) => "track",
      Self::Stack(_) => "stack",
    }
  }
}

impl Node {
  pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
    Self {
      parent: None,
      name: name.into(),
      metadata: Metadata::new(),
      kind,
    }
  }

  pub fn clip(name: impl Into<String>, clip: Clip) -> Self {
    Self::new(name, NodeKind::Clip(clip))
  }

  pub fn gap(source_range: TimeRange) -> Self {
    Self::new("", NodeKind::Gap(Gap::new(source_range)))
  }

  pub fn transition(name: impl Into<String>, transition: Transition) -> Self {
    Self::new(name, NodeKind::Transition(transition))
  }

  pub fn track(name: impl Into<String>, kind: TrackKind) -> Self {
    Self::new(name, NodeKind::Track(Track::new(kind)))
  }

  pub fn stack(name: impl Into<String>) -> Self {
    Self::new(name, NodeKind::Stack(Stack::default()))
  }

  pub fn with_metadata(mut self, metadata: Metadata) -> Self {
    self.metadata = metadata;
    self
  }

  #[inline]
  pub fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  /// Item-level state. `None` for transitions.
  pub fn item(&self) -> Option<&ItemData> {
    match &self.kind {
      NodeKind::Clip(clip) => Some(&clip.item),
      NodeKind::Gap(gap) => Some(&gap.item),
      NodeKind::Track(track) => Some(&track.composition.item),
      NodeKind::Stack(stack) => Some(&stack.composition.item),
      NodeKind::Transition(_) => None,
    }
  }

  pub fn item_mut(&mut self) -> Option<&mut ItemData> {
    match &mut self.kind {
      NodeKind::Clip(clip) => Some(&mut clip.item),
      NodeKind::Gap(gap) => Some(&mut gap.item),
      NodeKind::Track(track) => Some(&mut track.composition.item),
      NodeKind::Stack(stack) => Some(&mut stack.composition.item),
      NodeKind::Transition(_) => None,
    }
  }

  pub fn composition(&self) -> Option<&Composition> {
    match &self.kind {
      NodeKind::Track(track) => Some(&track.composition),
      NodeKind::Stack(stack) => Some(&stack.composition),
      _ => None,
    }
  }

  pub(crate) fn composition_mut(&mut self) -> Option<&mut Composition> {
    match &mut self.kind {
      NodeKind::Track(track) => Some(&mut track.composition),
      NodeKind::Stack(stack) => Some(&mut stack.composition),
      _ => None,
    }
  }

  pub fn as_transition(&self) -> Option<&Transition> {
    match &self.kind {
      NodeKind::Transition(transition) => Some(transition),
      _ => None,
    }
  }

  #[inline]
  pub fn is_item(&self) -> bool {
    !self.is_transition()
  }

  #[inline]
  pub fn is_gap(&self) -> bool {
    matches!(self.kind, NodeKind::Gap(_))
  }

  #[inline]
  pub fn is_clip(&self) -> bool {
    matches!(self.kind, NodeKind::Clip(_))
  }

  #[inline]
  pub fn is_transition(&self) -> bool {
    matches!(self.kind, NodeKind::Transition(_))
  }

  /// Transitions overlap their neighbors instead of taking up track time.
  #[inline]
  pub fn overlapping(&self) -> bool {
    self.is_transition()
  }

  /// Gaps and transitions carry no picture of their own.
  pub fn visible(&self) -> bool {
    !matches!(self.kind, NodeKind::Gap(_) | NodeKind::Transition(_))
  }
}

impl Tree {
  pub fn new() -> Self {
    Self::default()
  }

  /// Stores a detached node and returns its handle.
  pub fn add(&mut self, mut node: Node) -> NodeId {
    node.parent = None;
    self.nodes.insert(node)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.nodes.contains_key(id)
  }

  pub fn get(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(id)
  }

  pub fn node(&self, id: NodeId) -> Result<&Node> {
    self.nodes.get(id).ok_or(TimelineError::UnknownNode(id))
  }

  pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
    self.nodes.get_mut(id).ok_or(TimelineError::UnknownNode(id))
  }

  pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
    Ok(self.node(id)?.parent)
  }

  pub fn name(&self, id: NodeId) -> Result<&str> {
    Ok(self.node(id)?.name.as_str())
  }

  /// Detaches `id` from its container, then frees it and every descendant.
  pub fn delete(&mut self, id: NodeId) -> Result<()> {
    if let Some(parent) = self.node(id)?.parent {
      let index = self.index_of_child(parent, id)?;
      self.remove_child(parent, index as isize)?;
    }

    let mut pending = vec![id];
    while let Some(current) = pending.pop() {
      if let Some(node) = self.nodes.remove(current)
        && let Some(composition) = node.composition()
      {
        pending.extend(composition.children().iter().copied());
      }
    }
    Ok(())
  }

  /// Deep copy of the subtree rooted at `id`. The copy is detached.
  pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId> {
    let snapshot = self.snapshot(id)?;
    self.restore(&snapshot)
  }

  pub(crate) fn item_data(&self, id: NodeId) -> Result<&ItemData> {
    self.node(id)?.item().ok_or(TimelineError::TypeMismatch {
      node:     id,
      expected: "item",
    })
  }

  pub(crate) fn item_data_mut(&mut self, id: NodeId) -> Result<&mut ItemData> {
    self
      .node_mut(id)?
      .item_mut()
      .ok_or(TimelineError::TypeMismatch {
        node:     id,
        expected: "item",
      })
  }

  pub(crate) fn composition_of(&self, id: NodeId) -> Result<&Composition> {
    self.node(id)?.composition().ok_or(TimelineError::TypeMismatch {
      node:     id,
      expected: "composition",
    })
  }

  pub(crate) fn composition_of_mut(&mut self, id: NodeId) -> Result<&mut Composition> {
    self
      .node_mut(id)?
      .composition_mut()
      .ok_or(TimelineError::TypeMismatch {
        node:     id,
        expected: "composition",
      })
  }

  /// Checks that parent handles and child lists agree everywhere.
  pub fn validate(&self) -> std::result::Result<(), InvariantError> {
    for (id, node) in &self.nodes {
      if let Some(parent) = node.parent {
        let Some(parent_node) = self.nodes.get(parent) else {
          return Err(InvariantError::MissingParent);
        };
        let Some(composition) = parent_node.composition() else {
          return Err(InvariantError::ParentNotComposition);
        };
        if !composition.contains(id) {
          return Err(InvariantError::ParentMismatch);
        }
      }

      if let Some(composition) = node.composition() {
        let mut seen = HashSet::with_capacity(composition.len());
        for &child in composition.children() {
          if !seen.insert(child) {
            return Err(InvariantError::DuplicateChild);
          }
          let Some(child_node) = self.nodes.get(child) else {
            return Err(InvariantError::MissingChild);
          };
          if child_node.parent != Some(id) {
            return Err(InvariantError::ParentMismatch);
          }
        }
        if !composition.child_set_matches(&seen) {
          return Err(InvariantError::ChildSetMismatch);
        }
      }

      let mut visited = HashSet::new();
      let mut current = node.parent;
      while let Some(ancestor) = current {
        if ancestor == id || !visited.insert(ancestor) {
          return Err(InvariantError::Cycle);
        }
        current = self.nodes.get(ancestor).and_then(|node| node.parent);
      }
    }

    Ok(())
  }
}
