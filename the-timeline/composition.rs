//! Ordered containers and the generic, layout-independent range queries.
//!
//! Indices follow Python conventions: a negative index counts from the end.
//! Positional layout itself belongs to the concrete containers (see
//! [`crate::track`] and [`crate::stack`]); everything here composes those
//! per-level answers.

use std::{
  collections::HashSet,
  ops::Range,
};

use the_time::{
  DEFAULT_EPSILON_S,
  RationalTime,
  TimeRange,
};

use crate::{
  error::{
    Result,
    TimelineError,
  },
  item::ItemData,
  tree::{
    Node,
    NodeId,
    NodeKind,
    Tree,
  },
};

#[derive(Debug, Default)]
pub struct Composition {
  pub(crate) item: ItemData,
  children:        Vec<NodeId>,
  child_set:       HashSet<NodeId>,
}

impl Composition {
  pub fn item(&self) -> &ItemData {
    &self.item
  }

  #[inline]
  pub fn children(&self) -> &[NodeId] {
    &self.children
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.children.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.children.is_empty()
  }

  #[inline]
  pub fn contains(&self, child: NodeId) -> bool {
    self.child_set.contains(&child)
  }

  pub(crate) fn child_set_matches(&self, seen: &HashSet<NodeId>) -> bool {
    self.child_set == *seen
  }

  fn insert(&mut self, position: usize, child: NodeId) {
    self.children.insert(position, child);
    self.child_set.insert(child);
  }

  fn replace(&mut self, position: usize, child: NodeId) -> NodeId {
    let old = std::mem::replace(&mut self.children[position], child);
    self.child_set.remove(&old);
    self.child_set.insert(child);
    old
  }

  fn remove(&mut self, position: usize) -> NodeId {
    let old = self.children.remove(position);
    self.child_set.remove(&old);
    old
  }

  fn take_children(&mut self) -> Vec<NodeId> {
    self.child_set.clear();
    std::mem::take(&mut self.children)
  }
}

/// Which payloads [`Tree::find_children`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
  Any,
  /// Anything that occupies time: clips, gaps and nested compositions.
  Item,
  Clip,
  Gap,
  Transition,
  Composition,
}

impl KindFilter {
  pub fn matches(self, node: &Node) -> bool {
    match self {
      Self::Any => true,
      Self::Item => node.is_item(),
      Self::Clip => node.is_clip(),
      Self::Gap => node.is_gap(),
      Self::Transition => node.is_transition(),
      Self::Composition => node.composition().is_some(),
    }
  }
}

/// Layout strategy of a container, borrowed together with its children.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Layout<'a> {
  Sequential(&'a [NodeId]),
  Layered(&'a [NodeId]),
}

impl<'a> Layout<'a> {
  pub(crate) fn children(self) -> &'a [NodeId] {
    match self {
      Self::Sequential(children) | Self::Layered(children) => children,
    }
  }
}

fn adjusted_index(index: isize, len: usize) -> isize {
  if index < 0 { len as isize + index } else { index }
}

fn checked_index(index: isize, len: usize) -> Result<usize> {
  let adjusted = adjusted_index(index, len);
  if adjusted < 0 || adjusted as usize >= len {
    return Err(TimelineError::IllegalIndex { index, len });
  }
  Ok(adjusted as usize)
}

impl Tree {
  pub(crate) fn layout(&self, comp: NodeId) -> Result<Layout<'_>> {
    match &self.node(comp)?.kind {
      NodeKind::Track(track) => Ok(Layout::Sequential(track.composition.children())),
      NodeKind::Stack(stack) => Ok(Layout::Layered(stack.composition.children())),
      _ => {
        Err(TimelineError::TypeMismatch {
          node:     comp,
          expected: "composition",
        })
      },
    }
  }

  pub fn children(&self, comp: NodeId) -> Result<&[NodeId]> {
    Ok(self.composition_of(comp)?.children())
  }

  pub fn has_child(&self, comp: NodeId, child: NodeId) -> Result<bool> {
    Ok(self.composition_of(comp)?.contains(child))
  }

  pub fn index_of_child(&self, comp: NodeId, child: NodeId) -> Result<usize> {
    self
      .children(comp)?
      .iter()
      .position(|&id| id == child)
      .ok_or(TimelineError::NotAChildOf {
        child,
        parent: comp,
      })
  }

  /// Whether `other` sits somewhere below `comp`. Never fails; a corrupt
  /// parent chain simply answers `false`.
  pub fn is_parent_of(&self, comp: NodeId, other: NodeId) -> bool {
    let mut visited = HashSet::new();
    let mut current = self.get(other).and_then(Node::parent);
    while let Some(ancestor) = current {
      if ancestor == comp {
        return true;
      }
      if !visited.insert(ancestor) {
        return false;
      }
      current = self.get(ancestor).and_then(Node::parent);
    }
    false
  }

  fn check_attachable(&self, comp: NodeId, child: NodeId) -> Result<()> {
    if self.node(child)?.parent.is_some() {
      return Err(TimelineError::ChildAlreadyParented { child });
    }
    if child == comp || self.is_parent_of(child, comp) {
      return Err(TimelineError::WouldCycle {
        parent: comp,
        child,
      });
    }
    Ok(())
  }

  /// Inserts `child` before `index`. Out of range indices clamp to the ends.
  pub fn insert_child(&mut self, comp: NodeId, index: isize, child: NodeId) -> Result<()> {
    let len = self.composition_of(comp)?.len();
    self.check_attachable(comp, child)?;

    let adjusted = adjusted_index(index, len);
    let position = if adjusted >= len as isize {
      len
    } else {
      adjusted.max(0) as usize
    };

    self.composition_of_mut(comp)?.insert(position, child);
    self.node_mut(child)?.parent = Some(comp);
    tracing::trace!(?comp, ?child, position, "inserted child");
    Ok(())
  }

  pub fn append_child(&mut self, comp: NodeId, child: NodeId) -> Result<()> {
    let len = self.composition_of(comp)?.len();
    self.insert_child(comp, len as isize, child)
  }

  /// Replaces the child at `index`, returning the detached previous child.
  pub fn set_child(&mut self, comp: NodeId, index: isize, child: NodeId) -> Result<NodeId> {
    let composition = self.composition_of(comp)?;
    let position = checked_index(index, composition.len())?;
    let current = composition.children()[position];
    if current == child {
      return Ok(child);
    }
    self.check_attachable(comp, child)?;

    let old = self.composition_of_mut(comp)?.replace(position, child);
    self.node_mut(old)?.parent = None;
    self.node_mut(child)?.parent = Some(comp);
    Ok(old)
  }

  /// Detaches the child at `index` and returns it. The node stays in the
  /// arena; use [`Tree::delete`] to free it.
  pub fn remove_child(&mut self, comp: NodeId, index: isize) -> Result<NodeId> {
    let len = self.composition_of(comp)?.len();
    let position = checked_index(index, len)?;
    let old = self.composition_of_mut(comp)?.remove(position);
    self.node_mut(old)?.parent = None;
    tracing::trace!(?comp, child = ?old, position, "removed child");
    Ok(old)
  }

  /// Replaces all children at once. Nothing changes unless every candidate
  /// is detached, distinct and not an ancestor of `comp`.
  pub fn set_children(&mut self, comp: NodeId, children: Vec<NodeId>) -> Result<Vec<NodeId>> {
    self.composition_of(comp)?;
    let mut seen = HashSet::with_capacity(children.len());
    for &child in &children {
      self.check_attachable(comp, child)?;
      if !seen.insert(child) {
        return Err(TimelineError::ChildAlreadyParented { child });
      }
    }

    let old = self.clear_children(comp)?;
    for &child in &children {
      self.node_mut(child)?.parent = Some(comp);
    }
    let composition = self.composition_of_mut(comp)?;
    composition.child_set = seen;
    composition.children = children;
    Ok(old)
  }

  /// Detaches every child and returns them in order.
  pub fn clear_children(&mut self, comp: NodeId) -> Result<Vec<NodeId>> {
    let old = self.composition_of_mut(comp)?.take_children();
    for &child in &old {
      self.node_mut(child)?.parent = None;
    }
    Ok(old)
  }

  /// Range of the child at `index` in `comp`'s coordinate space.
  pub fn range_of_child_at_index(&self, comp: NodeId, index: isize) -> Result<TimeRange> {
    match self.layout(comp)? {
      Layout::Sequential(children) => {
        let position = checked_index(index, children.len())?;
        self.track_range_of_child_at_index(children, position)
      },
      Layout::Layered(children) => {
        let position = checked_index(index, children.len())?;
        self.stack_range_of_child_at_index(children, position)
      },
    }
  }

  /// Like [`Tree::range_of_child_at_index`], clipped to `comp`'s source range.
  pub fn trimmed_range_of_child_at_index(&self, comp: NodeId, index: isize) -> Result<TimeRange> {
    let range = self.range_of_child_at_index(comp, index)?;
    self
      .trim_child_range(comp, range)?
      .ok_or(TimelineError::InvalidTimeRange { node: comp, range })
  }

  /// Ranges of every child, aligned with [`Tree::children`].
  pub fn range_of_all_children(&self, comp: NodeId) -> Result<Vec<TimeRange>> {
    self.layout_ranges(self.layout(comp)?)
  }

  pub(crate) fn layout_ranges(&self, layout: Layout<'_>) -> Result<Vec<TimeRange>> {
    match layout {
      Layout::Sequential(children) => self.track_range_of_all_children(children),
      Layout::Layered(children) => self.stack_range_of_all_children(children),
    }
  }

  /// Clips `child_range` to `comp`'s source range. `None` when nothing of
  /// the range survives.
  pub fn trim_child_range(&self, comp: NodeId, child_range: TimeRange) -> Result<Option<TimeRange>> {
    let Some(source) = self.composition_of(comp)?.item.source_range else {
      return Ok(Some(child_range));
    };

    let past_end = source.start_time() >= child_range.end_time_exclusive();
    let before_start = source.end_time_exclusive() <= child_range.start_time();
    if past_end || before_start {
      return Ok(None);
    }

    let mut range = child_range;
    if range.start_time() < source.start_time() {
      range = TimeRange::range_from_start_end_time(source.start_time(), range.end_time_exclusive());
    }
    if range.end_time_exclusive() > source.end_time_exclusive() {
      range = TimeRange::range_from_start_end_time(range.start_time(), source.end_time_exclusive());
    }
    Ok(Some(range))
  }

  /// Containers from `child`'s parent up to and including `comp`.
  fn path_from_child(&self, comp: NodeId, child: NodeId) -> Result<Vec<NodeId>> {
    let not_descended = TimelineError::NotDescendedFrom {
      node:     child,
      ancestor: comp,
    };
    let mut path = Vec::new();
    let mut visited = HashSet::new();
    let mut current = self.node(child)?.parent;
    loop {
      let Some(parent) = current else {
        return Err(not_descended);
      };
      if !visited.insert(parent) {
        return Err(not_descended);
      }
      path.push(parent);
      if parent == comp {
        return Ok(path);
      }
      current = self.node(parent)?.parent;
    }
  }

  fn range_of_descendant(&self, comp: NodeId, child: NodeId, trimmed: bool) -> Result<Option<TimeRange>> {
    let path = self.path_from_child(comp, child)?;
    let index = self.index_of_child(path[0], child)?;
    let mut range = self.range_of_child_at_index(path[0], index as isize)?;

    for (level, &parent) in path.iter().enumerate() {
      if trimmed {
        match self.trim_child_range(parent, range)? {
          Some(clipped) => range = clipped,
          None => return Ok(None),
        }
      }

      if let Some(&grandparent) = path.get(level + 1) {
        let index = self.index_of_child(grandparent, parent)?;
        let outer = self.range_of_child_at_index(grandparent, index as isize)?;
        let local_start = self.trimmed_range(parent)?.start_time();
        let start = range.start_time() - local_start + outer.start_time();
        let duration = if outer.duration() < range.duration() {
          outer.duration()
        } else {
          range.duration()
        };
        range = TimeRange::new(start, duration);
      }
    }

    Ok(Some(range))
  }

  /// Range of a descendant of `comp`, in `comp`'s coordinate space.
  pub fn range_of_child(&self, comp: NodeId, child: NodeId) -> Result<TimeRange> {
    self
      .range_of_descendant(comp, child, false)?
      .ok_or_else(|| TimelineError::InternalError(format!("untrimmed range of {child:?} vanished")))
  }

  /// Range of a descendant after every container on the way up has applied
  /// its source range. `None` when some level trims it away.
  pub fn trimmed_range_of_child(&self, comp: NodeId, child: NodeId) -> Result<Option<TimeRange>> {
    self.range_of_descendant(comp, child, true)
  }

  /// Indices (with their ranges) of children that can contain `time`.
  fn search_window(layout: Layout<'_>, ranges: &[TimeRange], time: RationalTime) -> Range<usize> {
    match layout {
      Layout::Sequential(_) => {
        let lo = ranges.partition_point(|range| range.end_time_exclusive() <= time);
        let hi = ranges.partition_point(|range| range.start_time() <= time);
        lo..hi.max(lo)
      },
      Layout::Layered(_) => 0..ranges.len(),
    }
  }

  /// The child whose range contains `time`. Unless `shallow`, descends into
  /// nested compositions, translating `time` into each one's own space.
  pub fn child_at_time(&self, comp: NodeId, time: RationalTime, shallow: bool) -> Result<Option<NodeId>> {
    let layout = self.layout(comp)?;
    let ranges = self.layout_ranges(layout)?;
    let children = layout.children();

    let Some(index) = Self::search_window(layout, &ranges, time).find(|&i| ranges[i].contains(time))
    else {
      return Ok(None);
    };
    let child = children[index];

    if shallow || self.node(child)?.composition().is_none() {
      return Ok(Some(child));
    }
    let local = time - ranges[index].start_time() + self.trimmed_range(child)?.start_time();
    self.child_at_time(child, local, false)
  }

  pub(crate) fn children_in_window(&self, comp: NodeId, range: TimeRange) -> Result<Vec<(NodeId, TimeRange)>> {
    let layout = self.layout(comp)?;
    let ranges = self.layout_ranges(layout)?;
    let children = layout.children();

    let window = match layout {
      Layout::Sequential(_) => {
        let lo = ranges.partition_point(|r| r.end_time_exclusive() <= range.start_time());
        let hi = ranges.partition_point(|r| r.start_time() < range.end_time_exclusive());
        lo..hi.max(lo)
      },
      Layout::Layered(_) => 0..ranges.len(),
    };

    Ok(
      window
        .filter(|&i| ranges[i].overlaps_range(&range, DEFAULT_EPSILON_S))
        .map(|i| (children[i], ranges[i]))
        .collect(),
    )
  }

  /// Direct children overlapping `range`, in order.
  pub fn children_in_range(&self, comp: NodeId, range: TimeRange) -> Result<Vec<NodeId>> {
    Ok(
      self
        .children_in_window(comp, range)?
        .into_iter()
        .map(|(child, _)| child)
        .collect(),
    )
  }

  /// Children matching `filter`, limited to those overlapping `range` when
  /// one is given. Unless `shallow`, nested compositions are searched too,
  /// with `range` translated into their own space.
  pub fn find_children(
    &self,
    comp: NodeId,
    range: Option<TimeRange>,
    shallow: bool,
    filter: KindFilter,
  ) -> Result<Vec<NodeId>> {
    let candidates: Vec<(NodeId, Option<TimeRange>)> = match range {
      Some(range) => {
        self
          .children_in_window(comp, range)?
          .into_iter()
          .map(|(child, child_range)| (child, Some(child_range)))
          .collect()
      },
      None => self.children(comp)?.iter().map(|&child| (child, None)).collect(),
    };

    let mut found = Vec::new();
    for (child, child_range) in candidates {
      let node = self.node(child)?;
      if filter.matches(node) {
        found.push(child);
      }
      if shallow || node.composition().is_none() {
        continue;
      }

      let nested_range = match (range, child_range) {
        (Some(range), Some(child_range)) => {
          let local_start = self.trimmed_range(child)?.start_time();
          Some(TimeRange::new(
            range.start_time() - child_range.start_time() + local_start,
            range.duration(),
          ))
        },
        _ => None,
      };
      found.extend(self.find_children(child, nested_range, false, filter)?);
    }
    Ok(found)
  }

  /// Whether any descendant of `comp` is a clip.
  pub fn has_clips(&self, comp: NodeId) -> Result<bool> {
    for &child in self.children(comp)? {
      let node = self.node(child)?;
      if node.is_clip() {
        return Ok(true);
      }
      if node.composition().is_some() && self.has_clips(child)? {
        return Ok(true);
      }
    }
    Ok(false)
  }
}
