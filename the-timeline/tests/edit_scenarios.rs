use the_timeline::{
  Clip,
  Effect,
  EditConfig,
  Editor,
  Node,
  NodeId,
  RationalTime,
  ReferencePoint,
  TimeRange,
  TrackKind,
  Transition,
  Tree,
  edit,
  track_trimmed_to_range,
};

fn rt(value: f64) -> RationalTime {
  RationalTime::new(value, 24.0)
}

fn range(start: f64, duration: f64) -> TimeRange {
  TimeRange::new(rt(start), rt(duration))
}

fn clip(tree: &mut Tree, name: &str, duration: f64) -> NodeId {
  tree.add(Node::clip(name, Clip::new(Some(range(0.0, duration)))))
}

/// Track of clips with the given frame counts, each at least one frame.
fn track_of(tree: &mut Tree, durations: &[u8]) -> NodeId {
  let track = tree.add(Node::track("track", TrackKind::Video));
  for (index, &duration) in durations.iter().enumerate() {
    let clip = clip(tree, &format!("clip{index}"), f64::from(duration % 48) + 1.0);
    tree.append_child(track, clip).unwrap();
  }
  if durations.is_empty() {
    let clip = clip(tree, "only", 24.0);
    tree.append_child(track, clip).unwrap();
  }
  track
}

fn placed(tree: &Tree, track: NodeId) -> Vec<TimeRange> {
  tree.range_of_all_children(track).unwrap()
}

quickcheck::quickcheck! {
    fn insert_grows_by_inserted_duration(durations: Vec<u8>, at: u16, length: u8) -> bool {
        let mut tree = Tree::new();
        let track = track_of(&mut tree, &durations);
        let before = tree.duration(track).unwrap();
        let time = rt(f64::from(at) % (before.value() + 1.0));
        let inserted = f64::from(length % 48) + 1.0;
        let item = clip(&mut tree, "inserted", inserted);

        edit::insert(&mut tree, item, track, time, true, None).unwrap();

        tree.duration(track).unwrap() == before + rt(inserted)
          && tree.trimmed_range_in_parent(item).unwrap() == Some(TimeRange::new(time, rt(inserted)))
          && tree.validate().is_ok()
    }

    fn interior_overwrite_conserves_duration(durations: Vec<u8>, at: u16, length: u16, item_length: u8) -> bool {
        let mut tree = Tree::new();
        let track = track_of(&mut tree, &durations);
        let total = tree.duration(track).unwrap().value();
        let start = f64::from(at) % total;
        let length = f64::from(length) % (total - start) + 1.0;
        let length = length.min(total - start);
        let item = clip(&mut tree, "over", f64::from(item_length % 96) + 1.0);

        edit::overwrite(&mut tree, item, track, range(start, length), true, None).unwrap();

        tree.duration(track).unwrap() == rt(total)
          && tree.trimmed_range_in_parent(item).unwrap() == Some(range(start, length))
          && tree.validate().is_ok()
    }

    fn slice_then_remove_with_fill_keeps_layout(durations: Vec<u8>, at: u16) -> bool {
        let mut tree = Tree::new();
        let track = track_of(&mut tree, &durations);
        let total = tree.duration(track).unwrap();
        let time = rt(f64::from(at) % total.value());

        edit::slice(&mut tree, track, time, true).unwrap();
        let sliced = placed(&tree, track);
        edit::remove(&mut tree, track, time, true, None).unwrap();

        tree.duration(track).unwrap() == total
          && placed(&tree, track) == sliced
          && tree.validate().is_ok()
    }
}

#[test]
fn rough_cut_session() {
  let mut tree = Tree::new();
  let track = track_of(&mut tree, &[23, 23]);
  let config = EditConfig::from_toml_str(
    r#"
      remove-transitions = true
      reference-point = "sequence"
    "#,
  )
  .unwrap();
  let mut editor = Editor::new(&mut tree, config);

  // 48 frames of material, open a hole and fill it back in.
  editor.remove(track, rt(30.0), true, None).unwrap();
  let filler = clip(editor.tree_mut(), "filler", 100.0);
  editor.fill(filler, track, rt(24.0)).unwrap();
  assert_eq!(editor.tree().duration(track).unwrap(), rt(48.0));
  assert_eq!(
    editor.tree().trimmed_range_in_parent(filler).unwrap(),
    Some(range(24.0, 24.0))
  );

  // Split the filler and roll the cut between the halves.
  editor.slice(track, rt(36.0)).unwrap();
  let second = editor.tree().children(track).unwrap()[2];
  editor.roll(second, rt(-4.0), rt(0.0)).unwrap();
  assert_eq!(
    placed(editor.tree(), track),
    vec![range(0.0, 24.0), range(24.0, 8.0), range(32.0, 16.0)]
  );

  // Drop a dissolve on the cut and overwrite through it.
  let dissolve = editor
    .tree_mut()
    .add(Node::transition("dissolve", Transition::dissolve(rt(2.0), rt(2.0))));
  editor.tree_mut().insert_child(track, 1, dissolve).unwrap();
  let shot = clip(editor.tree_mut(), "shot", 10.0);
  editor.overwrite(shot, track, range(20.0, 10.0), None).unwrap();
  assert!(!editor.tree().contains(dissolve));
  assert_eq!(editor.tree().duration(track).unwrap(), rt(48.0));
  assert!(editor.tree().validate().is_ok());
}

#[test]
fn fit_fill_warps_into_a_nested_track() {
  let mut tree = Tree::new();
  let stack = tree.add(Node::stack("program"));
  let track = tree.add(Node::track("v1", TrackKind::Video));
  let a = clip(&mut tree, "a", 24.0);
  let gap = tree.add(Node::gap(range(0.0, 12.0)));
  for child in [a, gap] {
    tree.append_child(track, child).unwrap();
  }
  tree.append_child(stack, track).unwrap();

  let b = clip(&mut tree, "b", 48.0);
  edit::fill(&mut tree, b, track, rt(24.0), ReferencePoint::Fit).unwrap();

  assert_eq!(tree.children(track).unwrap(), &[a, b]);
  assert!(matches!(
    tree.effects(b).unwrap(),
    [Effect::LinearTimeWarp { time_scalar, .. }] if *time_scalar == 0.25
  ));
  assert_eq!(tree.child_at_time(stack, rt(30.0), false).unwrap(), Some(b));
}

#[test]
fn trimmed_copy_is_independent() {
  let mut tree = Tree::new();
  let track = track_of(&mut tree, &[47, 47, 47]);
  let copy = track_trimmed_to_range(&mut tree, track, range(30.0, 60.0)).unwrap();

  assert_eq!(tree.duration(copy).unwrap(), rt(60.0));
  assert_eq!(tree.duration(track).unwrap(), rt(144.0));

  let first = tree.children(copy).unwrap()[0];
  edit::slip(&mut tree, first, rt(5.0)).unwrap();
  let original_first = tree.children(track).unwrap()[0];
  assert_eq!(tree.source_range(original_first).unwrap(), Some(range(0.0, 48.0)));
}
