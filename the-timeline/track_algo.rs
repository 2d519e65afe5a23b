use the_time::{
  DEFAULT_EPSILON_S,
  TimeRange,
};

use crate::{
  error::{
    Result,
    TimelineError,
  },
  track::TrackKind,
  tree::{
    Node,
    NodeId,
    NodeKind,
    Tree,
  },
};

/// Detached copy of `track` holding only what lies inside `range`.
///
/// Children entirely outside `range` are dropped and children straddling one
/// of its ends get their source range cut so the copy starts and ends with
/// `range`. A transition cannot be cut; if one straddles an end the copy is
/// discarded and the edit fails.
pub fn track_trimmed_to_range(tree: &mut Tree, track: NodeId, range: TimeRange) -> Result<NodeId> {
  let NodeKind::Track(_) = tree.node(track)?.kind else {
    return Err(TimelineError::TypeMismatch {
      node:     track,
      expected: "track",
    });
  };

  let copy = tree.clone_subtree(track)?;
  if let Err(err) = trim_copy(tree, copy, range) {
    tree.delete(copy)?;
    return Err(err);
  }
  Ok(copy)
}

fn trim_copy(tree: &mut Tree, copy: NodeId, range: TimeRange) -> Result<()> {
  let ranges = tree.range_of_all_children(copy)?;
  let children = tree.children(copy)?.to_vec();

  for (&child, child_range) in children.iter().zip(ranges).rev() {
    if !range.overlaps_range(&child_range, DEFAULT_EPSILON_S) {
      tracing::trace!(?child, %child_range, "dropping child outside range");
      tree.delete(child)?;
      continue;
    }
    if range.contains_range(&child_range) {
      continue;
    }
    if tree.node(child)?.is_transition() {
      return Err(TimelineError::CannotTrimTransition {
        transition: child,
        time:       if child_range.start_time() < range.start_time() {
          range.start_time()
        } else {
          range.end_time_exclusive()
        },
      });
    }

    let mut source = tree.trimmed_range(child)?;
    if range.start_time() > child_range.start_time() {
      let cut = range.start_time() - child_range.start_time();
      source = TimeRange::new(source.start_time() + cut, source.duration() - cut);
    }
    if range.end_time_exclusive() < child_range.end_time_exclusive() {
      let cut = child_range.end_time_exclusive() - range.end_time_exclusive();
      source = TimeRange::new(source.start_time(), source.duration() - cut);
    }
    tracing::trace!(?child, %source, "cutting child to range");
    tree.set_source_range(child, Some(source))?;
  }
  Ok(())
}

/// Composites the tracks of `stack` into one detached track named
/// `Flattened`. The last child is the top track.
///
/// Visible items and transitions of an upper track win. Wherever it has an
/// invisible item the tracks below show through, cut to that item's range.
/// Everything on the bottom track is kept, gaps included.
pub fn flatten_stack(tree: &mut Tree, stack: NodeId) -> Result<NodeId> {
  let NodeKind::Stack(_) = tree.node(stack)?.kind else {
    return Err(TimelineError::TypeMismatch {
      node:     stack,
      expected: "stack",
    });
  };
  let tracks = tree.children(stack)?.to_vec();
  flatten_tracks(tree, &tracks)
}

/// [`flatten_stack`] over a list of tracks ordered bottom to top.
pub fn flatten_tracks(tree: &mut Tree, tracks: &[NodeId]) -> Result<NodeId> {
  for &track in tracks {
    let NodeKind::Track(_) = tree.node(track)?.kind else {
      return Err(TimelineError::TypeMismatch {
        node:     track,
        expected: "track",
      });
    };
  }

  let flat = tree.add(Node::track("Flattened", TrackKind::Video));
  let Some(top) = tracks.len().checked_sub(1) else {
    return Ok(flat);
  };
  if let Err(err) = flatten_track(tree, flat, tracks, top, None) {
    tree.delete(flat)?;
    return Err(err);
  }
  tracing::debug!(?flat, tracks = tracks.len(), "flattened tracks");
  Ok(flat)
}

/// Appends `tracks[index]`, cut to `trim` when set, to `flat`.
fn flatten_track(
  tree: &mut Tree,
  flat: NodeId,
  tracks: &[NodeId],
  index: usize,
  trim: Option<TimeRange>,
) -> Result<()> {
  let track = match trim {
    Some(range) => track_trimmed_to_range(tree, tracks[index], range)?,
    None => tracks[index],
  };
  let result = flatten_children(tree, flat, tracks, index, track, trim);
  if trim.is_some() {
    tree.delete(track)?;
  }
  result
}

fn flatten_children(
  tree: &mut Tree,
  flat: NodeId,
  tracks: &[NodeId],
  index: usize,
  track: NodeId,
  trim: Option<TimeRange>,
) -> Result<()> {
  let ranges = tree.range_of_all_children(track)?;
  let children = tree.children(track)?.to_vec();

  for (child, child_range) in children.into_iter().zip(ranges) {
    if index == 0 || tree.node(child)?.is_transition() || tree.visible(child)? {
      let copy = tree.clone_subtree(child)?;
      tree.append_child(flat, copy)?;
      continue;
    }

    // Ranges of a trimmed copy start at zero.
    let below = match trim {
      Some(trim) => TimeRange::new(child_range.start_time() + trim.start_time(), child_range.duration()),
      None => child_range,
    };
    tracing::trace!(?child, %below, "flattening through invisible item");
    flatten_track(tree, flat, tracks, index - 1, Some(below))?;
  }
  Ok(())
}
