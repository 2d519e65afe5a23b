//! Edit algorithms operating on items placed in compositions.
//!
//! Every edit either completes or returns an error before touching the tree.
//! Nodes handed in for placement (`item`) must be detached; the tree takes
//! them over on success. A `fill_template` is never attached itself: it is
//! cloned and resized wherever empty time has to be filled. When no template
//! is given a [`Gap`](crate::item::Gap) is created instead.
//!
//! Nodes an edit discards (overwritten items, split transitions) are freed
//! from the arena.

use serde::{
  Deserialize,
  Serialize,
};
use smallvec::SmallVec;
use the_time::{
  RationalTime,
  TimeRange,
};

use crate::{
  composition::KindFilter,
  config::EditConfig,
  error::{
    Result,
    TimelineError,
  },
  item::{
    Effect,
    is_zero,
  },
  track::{
    Neighbor,
    NeighborGapPolicy,
  },
  tree::{
    Node,
    NodeId,
    NodeKind,
    Tree,
  },
};

/// How [`fill`] maps an item's media onto the gap it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferencePoint {
  /// Place the item's full trimmed duration at the fill time, spilling over
  /// whatever follows the gap if it is longer.
  #[default]
  Source,
  /// Trim the item to the gap's own window.
  Sequence,
  /// Keep the item whole and attach a time warp scaling it to the gap.
  Fit,
}

/// An item child together with its index and trimmed range in the
/// composition being edited.
#[derive(Debug, Clone, Copy)]
struct Located {
  id:    NodeId,
  index: usize,
  range: TimeRange,
}

fn zero(rate: f64) -> RationalTime {
  RationalTime::new(0.0, rate)
}

fn one_frame(rate: f64) -> RationalTime {
  RationalTime::new(1.0, rate)
}

fn zero_based(duration: RationalTime) -> TimeRange {
  TimeRange::new(zero(duration.rate()), duration)
}

fn ensure_placeable(tree: &Tree, item: NodeId) -> Result<TimeRange> {
  let node = tree.node(item)?;
  if !node.is_item() {
    return Err(TimelineError::TypeMismatch {
      node:     item,
      expected: "item",
    });
  }
  if node.parent().is_some() {
    return Err(TimelineError::ChildAlreadyParented { child: item });
  }
  tree.trimmed_range(item)
}

fn ensure_item(tree: &Tree, item: NodeId) -> Result<()> {
  if tree.node(item)?.is_item() {
    Ok(())
  } else {
    Err(TimelineError::TypeMismatch {
      node:     item,
      expected: "item",
    })
  }
}

fn parent_and_index(tree: &Tree, item: NodeId) -> Result<(NodeId, usize)> {
  let parent = tree.parent(item)?.ok_or(TimelineError::Detached(item))?;
  let index = tree.index_of_child(parent, item)?;
  Ok((parent, index))
}

fn reject_transition(tree: &Tree, neighbor: NodeId, time: RationalTime) -> Result<()> {
  if tree.node(neighbor)?.is_transition() {
    return Err(TimelineError::CannotTrimTransition {
      transition: neighbor,
      time,
    });
  }
  Ok(())
}

/// Detached filler covering `source_range`.
fn make_fill(tree: &mut Tree, fill_template: Option<NodeId>, source_range: TimeRange) -> Result<NodeId> {
  match fill_template {
    Some(template) => {
      let fill = tree.clone_subtree(template)?;
      tree.set_source_range(fill, Some(source_range))?;
      Ok(fill)
    },
    None => Ok(tree.add(Node::gap(source_range))),
  }
}

fn remove_transitions_in(tree: &mut Tree, comp: NodeId, range: TimeRange) -> Result<()> {
  for transition in tree.find_children(comp, Some(range), true, KindFilter::Transition)? {
    tracing::debug!(?transition, %range, "removing transition");
    tree.delete(transition)?;
  }
  Ok(())
}

/// Items of `comp` overlapping the one frame window that starts at `time`.
fn probe_items(tree: &Tree, comp: NodeId, time: RationalTime) -> Result<Vec<Located>> {
  let probe = TimeRange::new(time, one_frame(time.rate()));
  let mut located = Vec::new();
  for (id, range) in tree.children_in_window(comp, probe)? {
    if !tree.node(id)?.is_item() {
      continue;
    }
    let Some(range) = tree.trim_child_range(comp, range)? else {
      continue;
    };
    located.push(Located {
      id,
      index: tree.index_of_child(comp, id)?,
      range,
    });
  }
  Ok(located)
}

/// The single item of `comp` whose range contains `time`.
fn item_at(tree: &Tree, comp: NodeId, time: RationalTime) -> Result<Located> {
  let hits: Vec<_> = probe_items(tree, comp, time)?
    .into_iter()
    .filter(|located| located.range.contains(time))
    .collect();
  match hits.as_slice() {
    [] => Err(TimelineError::NotAnItem { time }),
    [hit] => Ok(*hit),
    _ => {
      Err(TimelineError::InternalError(format!(
        "{} items contain {time}",
        hits.len()
      )))
    },
  }
}

fn has_time_warp(tree: &Tree, item: NodeId) -> Result<bool> {
  Ok(
    tree
      .effects(item)?
      .iter()
      .any(|effect| matches!(effect, Effect::LinearTimeWarp { .. })),
  )
}

/// Places `item` so it occupies exactly `range` of `comp`, replacing whatever
/// was there.
///
/// Past the end the item is appended, after filler if there is a hole. Before
/// the start it is prepended the same way. Otherwise overlapped items are
/// split, trimmed or removed around it and the composition's duration stays
/// the same when `range` lies within existing content.
pub fn overwrite(
  tree: &mut Tree,
  item: NodeId,
  comp: NodeId,
  range: TimeRange,
  remove_transitions: bool,
  fill_template: Option<NodeId>,
) -> Result<()> {
  let item_range = ensure_placeable(tree, item)?;
  let comp_range = tree.trimmed_range(comp)?;
  let start = range.start_time();

  if start >= comp_range.end_time_exclusive() {
    tracing::debug!(?item, ?comp, %range, "overwrite appends");
    let fill_duration = start - comp_range.end_time_exclusive();
    if !is_zero(fill_duration) {
      let fill = make_fill(tree, fill_template, zero_based(fill_duration))?;
      tree.append_child(comp, fill)?;
    }
    tree.append_child(comp, item)?;
  } else if start < comp_range.start_time() && range.end_time_exclusive() <= comp_range.start_time() {
    tracing::debug!(?item, ?comp, %range, "overwrite prepends");
    let fill_duration = comp_range.start_time() - range.end_time_exclusive();
    if !is_zero(fill_duration) {
      let fill = make_fill(tree, fill_template, zero_based(fill_duration))?;
      tree.insert_child(comp, 0, fill)?;
    }
    tree.insert_child(comp, 0, item)?;
  } else {
    if remove_transitions {
      remove_transitions_in(tree, comp, range)?;
    }

    let items = tree.find_children(comp, Some(range), true, KindFilter::Item)?;
    let Some(&first) = items.first() else {
      return Err(TimelineError::NotAnItem { time: start });
    };
    let first_index = tree.index_of_child(comp, first)?;
    let first_range = tree.trimmed_range_of_child_at_index(comp, first_index as isize)?;
    let first = Located {
      id:    first,
      index: first_index,
      range: first_range,
    };

    if items.len() == 1 && first_range.contains_range(&range) {
      overwrite_within(tree, item, item_range, comp, first, range)?;
    } else {
      overwrite_across(tree, item, item_range, comp, &items, first, range)?;
    }
  }

  debug_assert!(tree.validate().is_ok());
  Ok(())
}

/// `range` lies inside a single item: split it around the new one.
fn overwrite_within(
  tree: &mut Tree,
  item: NodeId,
  item_range: TimeRange,
  comp: NodeId,
  target: Located,
  range: TimeRange,
) -> Result<()> {
  // Filling a gap with a time warped item keeps the item whole.
  let fit = tree.node(target.id)?.is_gap() && has_time_warp(tree, item)?;

  let head = range.start_time() - target.range.start_time();
  let tail = target.range.duration() - range.duration() - head;
  let source = tree.trimmed_range(target.id)?;
  tracing::debug!(?item, target = ?target.id, %head, %tail, "overwrite splits item");

  let remnant = if is_zero(tail) {
    None
  } else {
    let remnant = tree.clone_subtree(target.id)?;
    tree.set_source_range(
      remnant,
      Some(TimeRange::new(
        source.start_time() + head + range.duration(),
        tail,
      )),
    )?;
    Some(remnant)
  };

  let mut insert_index = target.index;
  if is_zero(head) {
    tree.delete(target.id)?;
  } else {
    tree.set_source_range(
      target.id,
      Some(TimeRange::new(source.start_time(), head)),
    )?;
    insert_index += 1;
  }

  if !fit {
    tree.set_source_range(
      item,
      Some(TimeRange::new(item_range.start_time(), range.duration())),
    )?;
  }
  tree.insert_child(comp, insert_index as isize, item)?;
  if let Some(remnant) = remnant {
    tree.insert_child(comp, insert_index as isize + 1, remnant)?;
  }
  Ok(())
}

/// `range` spans several items: trim the partially covered ends and drop
/// everything in between.
fn overwrite_across(
  tree: &mut Tree,
  item: NodeId,
  item_range: TimeRange,
  comp: NodeId,
  items: &[NodeId],
  first: Located,
  range: TimeRange,
) -> Result<()> {
  let mut trims: SmallVec<[(NodeId, TimeRange); 2]> = SmallVec::new();
  let mut doomed = items.to_vec();
  let mut insert_index = first.index;

  if first.range.start_time() < range.start_time() {
    let source = tree.trimmed_range(first.id)?;
    trims.push((
      first.id,
      TimeRange::new(
        source.start_time(),
        range.start_time() - first.range.start_time(),
      ),
    ));
    doomed.retain(|&id| id != first.id);
    insert_index += 1;
  }

  if let Some(&last) = doomed.last() {
    let last_index = tree.index_of_child(comp, last)?;
    let last_range = tree.trimmed_range_of_child_at_index(comp, last_index as isize)?;
    if last_range.end_time_exclusive() > range.end_time_exclusive() {
      let source = tree.trimmed_range(last)?;
      let cut = range.end_time_exclusive() - last_range.start_time();
      trims.push((
        last,
        TimeRange::new(source.start_time() + cut, source.duration() - cut),
      ));
      doomed.pop();
    }
  }

  tracing::debug!(
    ?item,
    trimmed = trims.len(),
    removed = doomed.len(),
    "overwrite across items"
  );
  for (id, source_range) in trims {
    tree.set_source_range(id, Some(source_range))?;
  }
  for id in doomed {
    tree.delete(id)?;
  }

  tree.set_source_range(
    item,
    Some(TimeRange::new(item_range.start_time(), range.duration())),
  )?;
  tree.insert_child(comp, insert_index as isize, item)
}

/// Inserts `item` at `time`, pushing everything from `time` on later. An item
/// straddling `time` is split in two around the new one.
pub fn insert(
  tree: &mut Tree,
  item: NodeId,
  comp: NodeId,
  time: RationalTime,
  remove_transitions: bool,
  fill_template: Option<NodeId>,
) -> Result<()> {
  ensure_placeable(tree, item)?;
  if remove_transitions {
    remove_transitions_in(tree, comp, TimeRange::new(time, one_frame(time.rate())))?;
  }

  let comp_range = tree.trimmed_range(comp)?;
  let probed = probe_items(tree, comp, time)?;
  if probed.len() > 1 {
    return Err(TimelineError::InternalError(format!(
      "{} items overlap the frame at {time}",
      probed.len()
    )));
  }

  let Some(target) = probed.into_iter().find(|located| located.range.contains(time)) else {
    if time >= comp_range.end_time_exclusive() {
      tracing::debug!(?item, ?comp, %time, "insert appends");
      let fill_duration = time - comp_range.end_time_exclusive();
      if !is_zero(fill_duration) {
        let fill = make_fill(tree, fill_template, zero_based(fill_duration))?;
        tree.append_child(comp, fill)?;
      }
      tree.append_child(comp, item)?;
    } else if time < comp_range.start_time() {
      tracing::debug!(?item, ?comp, %time, "insert prepends");
      tree.insert_child(comp, 0, item)?;
    } else {
      tracing::warn!(?item, ?comp, %time, "no item at insert time, nothing inserted");
    }
    debug_assert!(tree.validate().is_ok());
    return Ok(());
  };

  let head = time - target.range.start_time();
  let mut insert_index = target.index;
  let mut remnant = None;
  if !is_zero(head) {
    let source = tree.trimmed_range(target.id)?;
    let tail = target.range.end_time_exclusive() - time;
    tracing::debug!(?item, target = ?target.id, %head, %tail, "insert splits item");
    if !is_zero(tail) {
      let copy = tree.clone_subtree(target.id)?;
      tree.set_source_range(
        copy,
        Some(TimeRange::new(source.start_time() + head, tail)),
      )?;
      remnant = Some(copy);
    }
    tree.set_source_range(
      target.id,
      Some(TimeRange::new(source.start_time(), head)),
    )?;
    insert_index += 1;
  }

  tree.insert_child(comp, insert_index as isize, item)?;
  if let Some(remnant) = remnant {
    tree.insert_child(comp, insert_index as isize + 1, remnant)?;
  }
  debug_assert!(tree.validate().is_ok());
  Ok(())
}

/// Moves `item`'s start by `delta_in` and its end by `delta_out`.
///
/// The start edit ripples into the previous sibling, which absorbs the same
/// amount. Shrinking the end hands the freed time to a following gap, or to a
/// new filler when the next sibling is not a gap. Growing the end into a
/// following gap extends the item and leaves the gap as it is. The last child
/// has nothing to hand its end to, so `delta_out` leaves it where it is.
pub fn trim(
  tree: &mut Tree,
  item: NodeId,
  delta_in: RationalTime,
  delta_out: RationalTime,
  fill_template: Option<NodeId>,
) -> Result<()> {
  ensure_item(tree, item)?;
  let (comp, index) = parent_and_index(tree, item)?;
  let range = tree.trimmed_range(item)?;
  let placed = tree.trimmed_range_of_child_at_index(comp, index as isize)?;
  let children = tree.children(comp)?;

  let previous = match (is_zero(delta_in), index.checked_sub(1)) {
    (false, Some(previous)) => Some(children[previous]),
    _ => None,
  };
  let next = if is_zero(delta_out) {
    None
  } else {
    children.get(index + 1).copied()
  };

  let previous = match previous {
    Some(previous) => {
      reject_transition(tree, previous, placed.start_time())?;
      Some((previous, tree.trimmed_range(previous)?))
    },
    None => None,
  };
  let next = match next {
    Some(next) => {
      reject_transition(tree, next, placed.end_time_exclusive())?;
      Some((next, tree.trimmed_range(next)?, tree.node(next)?.is_gap()))
    },
    None => None,
  };

  let mut start = range.start_time();
  let mut end = range.end_time_exclusive();

  if !is_zero(delta_in) {
    start += delta_in;
    if let Some((previous, previous_range)) = previous {
      tracing::debug!(?item, ?previous, %delta_in, "trim ripples into previous");
      tree.set_source_range(
        previous,
        Some(previous_range.duration_extended_by(delta_in)),
      )?;
    }
  }

  if !is_zero(delta_out) {
    match next {
      Some((gap, gap_range, true)) => {
        end += delta_out;
        if delta_out.value() < 0.0 {
          tracing::debug!(?item, ?gap, %delta_out, "trim grows following gap");
          tree.set_source_range(
            gap,
            Some(TimeRange::new(
              gap_range.start_time() + delta_out,
              gap_range.duration() - delta_out,
            )),
          )?;
        }
      },
      Some((next, ..)) => {
        if delta_out.value() < 0.0 {
          end += delta_out;
          tracing::debug!(?item, ?next, %delta_out, "trim inserts filler");
          let fill = make_fill(tree, fill_template, zero_based(-delta_out))?;
          tree.insert_child(comp, index as isize + 1, fill)?;
        } else {
          tracing::debug!(?item, ?next, "trim cannot grow into a non-gap sibling");
        }
      },
      None => tracing::debug!(?item, %delta_out, "trim has no next sibling, out point kept"),
    }
  }

  tree.set_source_range(
    item,
    Some(TimeRange::range_from_start_end_time(start, end)),
  )?;
  debug_assert!(tree.validate().is_ok());
  Ok(())
}

/// Splits the item at `time` in two. Slicing at an item's own start does
/// nothing.
pub fn slice(tree: &mut Tree, comp: NodeId, time: RationalTime, remove_transitions: bool) -> Result<()> {
  let target = item_at(tree, comp, time)?;
  let head = time - target.range.start_time();
  if is_zero(head) {
    tracing::debug!(item = ?target.id, %time, "slice at item start");
    return Ok(());
  }

  if let NodeKind::Track(_) = tree.node(comp)?.kind {
    let (previous, next) = tree.neighbors_of(comp, target.id, NeighborGapPolicy::Never)?;
    let mut spanning: SmallVec<[NodeId; 2]> = SmallVec::new();
    for neighbor in [next, previous].into_iter().flatten().filter_map(|n| n.child()) {
      if !tree.node(neighbor)?.is_transition() {
        continue;
      }
      if let Some(range) = tree.trimmed_range_of_child(comp, neighbor)?
        && range.contains(time)
      {
        spanning.push(neighbor);
      }
    }

    if let Some(&transition) = spanning.first() {
      if !remove_transitions {
        return Err(TimelineError::CannotTrimTransition { transition, time });
      }
      for transition in spanning {
        tracing::debug!(?transition, %time, "slice removes transition");
        tree.delete(transition)?;
      }
    }
  }

  let index = tree.index_of_child(comp, target.id)?;
  let source = tree.trimmed_range(target.id)?;
  let tail = target.range.duration() - head;
  let remnant = if is_zero(tail) {
    None
  } else {
    let copy = tree.clone_subtree(target.id)?;
    tree.set_source_range(
      copy,
      Some(TimeRange::new(source.start_time() + head, tail)),
    )?;
    Some(copy)
  };
  tree.set_source_range(
    target.id,
    Some(TimeRange::new(source.start_time(), head)),
  )?;
  if let Some(remnant) = remnant {
    tree.insert_child(comp, index as isize + 1, remnant)?;
  }

  debug_assert!(tree.validate().is_ok());
  Ok(())
}

/// Shifts `item`'s media window by `delta` without moving it in its parent.
/// The window stays inside the available range when one is known.
pub fn slip(tree: &mut Tree, item: NodeId, delta: RationalTime) -> Result<()> {
  ensure_item(tree, item)?;
  let range = tree.trimmed_range(item)?;
  let mut start = range.start_time() + delta;

  if let Some(available) = tree.known_available_range(item)? {
    if start < available.start_time() {
      tracing::trace!(?item, %start, "slip clamped to available start");
      start = available.start_time();
    } else if start + range.duration() > available.end_time_exclusive() {
      tracing::trace!(?item, %start, "slip clamped to available end");
      start -= start + range.duration() - available.end_time_exclusive();
    }
  }

  tree.set_source_range(item, Some(TimeRange::new(start, range.duration())))
}

/// Moves `item` later or earlier by growing or shrinking its previous
/// sibling by `delta`. `item` itself is untouched.
pub fn slide(tree: &mut Tree, item: NodeId, delta: RationalTime) -> Result<()> {
  ensure_item(tree, item)?;
  let (comp, index) = parent_and_index(tree, item)?;
  if index == 0 || is_zero(delta) {
    return Ok(());
  }

  let previous = tree.children(comp)?[index - 1];
  let placed = tree.trimmed_range_of_child_at_index(comp, index as isize)?;
  reject_transition(tree, previous, placed.start_time())?;
  let range = tree.trimmed_range(previous)?;

  let mut offset = delta;
  if delta.value() < 0.0 {
    if range.duration() <= -delta {
      tracing::debug!(?item, ?previous, %delta, "slide would consume previous sibling");
      return Ok(());
    }
  } else if let Some(available) = tree.known_available_range(previous)?
    && range.duration() + delta > available.duration()
  {
    offset = available.duration() - range.duration();
    tracing::trace!(?previous, %offset, "slide clamped to available duration");
  }

  tree.set_source_range(previous, Some(range.duration_extended_by(offset)))
}

/// Moves `item`'s own start and end without touching any sibling.
pub fn ripple(tree: &mut Tree, item: NodeId, delta_in: RationalTime, delta_out: RationalTime) -> Result<()> {
  ensure_item(tree, item)?;
  let range = tree.trimmed_range(item)?;
  let mut start = range.start_time();
  let mut end = range.end_time_exclusive();

  if !is_zero(delta_in) {
    let floor = start.min(zero(start.rate()));
    start = (start + delta_in).max(floor).min(end);
  }

  if !is_zero(delta_out) {
    let mut new_end = end + delta_out;
    if delta_out.value() > 0.0
      && let Some(available) = tree.known_available_range(item)?
    {
      let limit = (start + available.duration()).max(end);
      if new_end > limit {
        tracing::trace!(?item, %limit, "ripple clamped to available duration");
        new_end = limit;
      }
    }
    end = new_end.max(start);
  }

  tree.set_source_range(
    item,
    Some(TimeRange::range_from_start_end_time(start, end)),
  )
}

/// Moves the edit points between `item` and its neighbors: `delta_in` the one
/// with the previous sibling, `delta_out` the one with the next. Whatever
/// `item` gains a neighbor loses, so the composition's duration is kept.
///
/// All clamps are resolved before anything changes: neighbors keep at least
/// one frame, no media window starts before its available start (or zero
/// without media) and nothing grows past the end of its available range.
pub fn roll(tree: &mut Tree, item: NodeId, delta_in: RationalTime, delta_out: RationalTime) -> Result<()> {
  ensure_item(tree, item)?;
  let (comp, index) = parent_and_index(tree, item)?;
  let range = tree.trimmed_range(item)?;
  let available = tree.known_available_range(item)?;
  let placed = tree.trimmed_range_of_child_at_index(comp, index as isize)?;
  let children = tree.children(comp)?.to_vec();
  let frame = one_frame(range.duration().rate());

  let mut start = range.start_time();
  let mut end = range.end_time_exclusive();
  let mut previous_update = None;
  let mut next_update = None;

  if !is_zero(delta_in) {
    let media_start = available.map_or(zero(start.rate()), |available| available.start_time());
    let mut offset = delta_in.max(media_start.min(start) - start);
    offset = offset.min(end - frame - start);

    if let Some(previous) = index.checked_sub(1).map(|previous| children[previous]) {
      reject_transition(tree, previous, placed.start_time())?;
      let previous_range = tree.trimmed_range(previous)?;
      offset = offset.max(frame - previous_range.duration());
      if offset.value() > 0.0
        && let Some(previous_available) = tree.known_available_range(previous)?
      {
        let room = previous_available.end_time_exclusive() - previous_range.end_time_exclusive();
        offset = offset.min(room.max(zero(room.rate())));
      }
      previous_update = Some((previous, previous_range.duration_extended_by(offset)));
    }

    tracing::trace!(?item, %delta_in, %offset, "roll in point");
    start += offset;
  }

  if !is_zero(delta_out)
    && let Some(&next) = children.get(index + 1)
  {
    reject_transition(tree, next, placed.end_time_exclusive())?;
    let next_range = tree.trimmed_range(next)?;
    let next_start = next_range.start_time();
    let next_media_start = tree
      .known_available_range(next)?
      .map_or(zero(next_start.rate()), |available| available.start_time());

    let mut offset = delta_out.max(next_media_start.min(next_start) - next_start);
    offset = offset.min(next_range.duration() - frame);
    if offset.value() > 0.0
      && let Some(available) = available
    {
      let room = available.end_time_exclusive() - end;
      offset = offset.min(room.max(zero(room.rate())));
    }
    offset = offset.max(start + frame - end);

    tracing::trace!(?item, %delta_out, %offset, "roll out point");
    end += offset;
    next_update = Some((
      next,
      TimeRange::new(next_start + offset, next_range.duration() - offset),
    ));
  }

  for (id, source_range) in previous_update.into_iter().chain(next_update) {
    tree.set_source_range(id, Some(source_range))?;
  }
  tree.set_source_range(
    item,
    Some(TimeRange::range_from_start_end_time(start, end)),
  )?;
  debug_assert!(tree.validate().is_ok());
  Ok(())
}

/// Replaces the gap at `track_time` with `item`, mapped per
/// `reference_point`.
pub fn fill(
  tree: &mut Tree,
  item: NodeId,
  track: NodeId,
  track_time: RationalTime,
  reference_point: ReferencePoint,
) -> Result<()> {
  let clip_range = ensure_placeable(tree, item)?;
  let gap = match tree.child_at_time(track, track_time, true)? {
    Some(gap) if tree.node(gap)?.is_gap() => gap,
    _ => return Err(TimelineError::NotAGap { time: track_time }),
  };
  let gap_range = tree.trimmed_range(gap)?;
  let gap_index = tree.index_of_child(track, gap)?;
  let gap_track_range = tree.trimmed_range_of_child_at_index(track, gap_index as isize)?;
  let room = gap_track_range.end_time_exclusive() - track_time;

  match reference_point {
    ReferencePoint::Sequence => {
      let mut start = clip_range.start_time();
      let mut duration = clip_range.duration();
      if start < gap_range.start_time() {
        duration -= gap_range.start_time() - start;
        start = gap_range.start_time();
      }
      if clip_range.end_time_exclusive() > gap_range.end_time_exclusive() {
        duration = gap_range.end_time_exclusive() - start;
      }
      tree.set_source_range(item, Some(TimeRange::new(start, duration)))?;
      tracing::debug!(?item, ?gap, %duration, "fill trims item to gap");
      overwrite(
        tree,
        item,
        track,
        TimeRange::new(track_time, duration.min(room)),
        true,
        None,
      )
    },
    ReferencePoint::Fit => {
      let time_scalar = gap_range.duration().to_seconds() / clip_range.duration().to_seconds();
      let name = tree.name(item)?.to_owned();
      tree.add_effect(item, Effect::LinearTimeWarp {
        effect_name: format!("{name}_timeWarp"),
        name,
        time_scalar,
      })?;
      tracing::debug!(?item, ?gap, time_scalar, "fill time warps item");
      overwrite(
        tree,
        item,
        track,
        TimeRange::new(track_time, room),
        true,
        None,
      )
    },
    ReferencePoint::Source => {
      overwrite(
        tree,
        item,
        track,
        TimeRange::new(track_time, clip_range.duration()),
        true,
        None,
      )
    },
  }
}

/// Deletes the item at `time`. With `fill`, filler of the same length takes
/// its place so later items keep their position.
pub fn remove(
  tree: &mut Tree,
  comp: NodeId,
  time: RationalTime,
  fill: bool,
  fill_template: Option<NodeId>,
) -> Result<()> {
  let target = item_at(tree, comp, time)?;
  let source = tree.trimmed_range(target.id)?;
  tracing::debug!(item = ?target.id, %time, fill, "removing item");
  tree.delete(target.id)?;
  if fill {
    let filler = make_fill(tree, fill_template, source)?;
    tree.insert_child(comp, target.index as isize, filler)?;
  }
  debug_assert!(tree.validate().is_ok());
  Ok(())
}

/// A tree bound to an [`EditConfig`], forwarding to the edit functions with
/// the configured policies.
#[derive(Debug)]
pub struct Editor<'a> {
  tree:   &'a mut Tree,
  config: EditConfig,
}

impl<'a> Editor<'a> {
  pub fn new(tree: &'a mut Tree, config: EditConfig) -> Self {
    Self { tree, config }
  }

  pub fn tree(&self) -> &Tree {
    &*self.tree
  }

  pub fn tree_mut(&mut self) -> &mut Tree {
    &mut *self.tree
  }

  pub fn config(&self) -> &EditConfig {
    &self.config
  }

  pub fn overwrite(
    &mut self,
    item: NodeId,
    comp: NodeId,
    range: TimeRange,
    fill_template: Option<NodeId>,
  ) -> Result<()> {
    overwrite(
      self.tree,
      item,
      comp,
      range,
      self.config.remove_transitions,
      fill_template,
    )
  }

  pub fn insert(
    &mut self,
    item: NodeId,
    comp: NodeId,
    time: RationalTime,
    fill_template: Option<NodeId>,
  ) -> Result<()> {
    insert(
      self.tree,
      item,
      comp,
      time,
      self.config.remove_transitions,
      fill_template,
    )
  }

  pub fn trim(
    &mut self,
    item: NodeId,
    delta_in: RationalTime,
    delta_out: RationalTime,
    fill_template: Option<NodeId>,
  ) -> Result<()> {
    trim(self.tree, item, delta_in, delta_out, fill_template)
  }

  pub fn slice(&mut self, comp: NodeId, time: RationalTime) -> Result<()> {
    slice(self.tree, comp, time, self.config.remove_transitions)
  }

  pub fn slip(&mut self, item: NodeId, delta: RationalTime) -> Result<()> {
    slip(self.tree, item, delta)
  }

  pub fn slide(&mut self, item: NodeId, delta: RationalTime) -> Result<()> {
    slide(self.tree, item, delta)
  }

  pub fn ripple(&mut self, item: NodeId, delta_in: RationalTime, delta_out: RationalTime) -> Result<()> {
    ripple(self.tree, item, delta_in, delta_out)
  }

  pub fn roll(&mut self, item: NodeId, delta_in: RationalTime, delta_out: RationalTime) -> Result<()> {
    roll(self.tree, item, delta_in, delta_out)
  }

  pub fn fill(&mut self, item: NodeId, track: NodeId, track_time: RationalTime) -> Result<()> {
    fill(self.tree, item, track, track_time, self.config.reference_point)
  }

  pub fn remove(
    &mut self,
    comp: NodeId,
    time: RationalTime,
    fill: bool,
    fill_template: Option<NodeId>,
  ) -> Result<()> {
    remove(self.tree, comp, time, fill, fill_template)
  }

  pub fn neighbors_of(&self, track: NodeId, item: NodeId) -> Result<(Option<Neighbor>, Option<Neighbor>)> {
    self
      .tree
      .neighbors_of(track, item, self.config.neighbor_gap_policy)
  }
}
