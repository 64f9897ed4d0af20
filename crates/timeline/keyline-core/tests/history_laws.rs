use keyline_core::history::{
    AddLayerCommand, AddShapeCommand, ConvertToSymbolCommand, KeyframeCommand, LayerProperty,
    LayerPropertyCommand, MoveLayerCommand, RemoveLayerCommand, RemoveShapesCommand,
    SetTweenCommand, TransformShapesCommand,
};
use keyline_core::{
    CompositeCommand, Config, Document, Easing, History, Shape, SymbolType, TweenType,
};
use serde_json::Value;

fn state(doc: &Document) -> Value {
    doc.to_json().expect("serialize document")
}

fn rect(x: f64) -> Shape {
    Shape::rectangle(x, 0.0, 10.0, 10.0)
}

/// Runs a mixed editing session through `history`, returning the state after each command.
fn session(doc: &mut Document, history: &mut History) -> Vec<Value> {
    let mut states = Vec::new();
    let original = doc.layers()[0].id;

    assert!(history.execute(AddLayerCommand::new(Some("Ink")), doc));
    let ink = doc.layers()[0].id;
    assert_ne!(ink, original);
    states.push(state(doc));

    let ball = rect(0.0);
    let ball_id = ball.id;
    assert!(history.execute(AddShapeCommand::new(ink, 1, ball), doc));
    states.push(state(doc));

    assert!(history.execute(AddShapeCommand::new(original, 1, rect(40.0)), doc));
    states.push(state(doc));

    assert!(history.execute(KeyframeCommand::insert(ink, 12), doc));
    states.push(state(doc));

    doc.set_current_frame(12);
    let carried = doc.layer(ink).unwrap().get_shapes_at_frame(12)[0].id;
    assert!(history.execute(TransformShapesCommand::translate(vec![carried], 120.0, 30.0), doc));
    states.push(state(doc));

    assert!(history.execute(
        SetTweenCommand::new(ink, 5, TweenType::Motion, Some(Easing::EaseInOutCubic)),
        doc
    ));
    states.push(state(doc));

    assert!(history.execute(
        LayerPropertyCommand::new(original, LayerProperty::Name("Backdrop".into())),
        doc
    ));
    states.push(state(doc));

    assert!(history.execute(
        ConvertToSymbolCommand::new(vec![carried], "Ball", SymbolType::Graphic),
        doc
    ));
    states.push(state(doc));

    doc.set_current_frame(1);
    let group = CompositeCommand::new("Extend and Clear")
        .with(KeyframeCommand::insert_frame(original, 30))
        .with(KeyframeCommand::insert_blank(original, 20))
        .with(RemoveShapesCommand::new(vec![ball_id]));
    assert!(history.execute(group, doc));
    states.push(state(doc));

    assert!(history.execute(MoveLayerCommand::new(original, 0), doc));
    states.push(state(doc));

    assert!(history.execute(KeyframeCommand::clear(ink, 12), doc));
    states.push(state(doc));

    assert!(history.execute(RemoveLayerCommand::new(original), doc));
    states.push(state(doc));

    states
}

#[test]
fn undo_all_then_redo_all_reproduces_state() {
    let mut doc = Document::new();
    let mut history = History::default();
    let initial = state(&doc);

    let states = session(&mut doc, &mut history);
    let n = states.len();
    assert_eq!(history.len(), n);
    let last = states.last().cloned().unwrap();

    for i in (0..n).rev() {
        assert!(history.undo(&mut doc));
        let expected = if i == 0 { &initial } else { &states[i - 1] };
        assert_eq!(&state(&doc), expected, "after undoing command {}", i + 1);
    }
    assert!(!history.undo(&mut doc));

    for (i, expected) in states.iter().enumerate() {
        assert!(history.redo(&mut doc));
        assert_eq!(&state(&doc), expected, "after redoing command {}", i + 1);
    }
    assert!(!history.redo(&mut doc));
    assert_eq!(state(&doc), last);

    // and once more around the loop
    while history.undo(&mut doc) {}
    assert_eq!(state(&doc), initial);
    while history.redo(&mut doc) {}
    assert_eq!(state(&doc), last);
}

#[test]
fn new_command_after_undo_discards_redo() {
    let mut doc = Document::new();
    let layer = doc.layers()[0].id;
    let mut history = History::default();
    history.execute(AddShapeCommand::new(layer, 1, rect(0.0)), &mut doc);
    history.execute(AddShapeCommand::new(layer, 1, rect(20.0)), &mut doc);
    history.undo(&mut doc);
    history.undo(&mut doc);
    assert_eq!(history.redo_len(), 2);

    history.execute(KeyframeCommand::insert_blank(layer, 4), &mut doc);
    assert!(!history.redo(&mut doc));
    assert!(!history.can_redo());
}

#[test]
fn undoing_everything_stops_at_the_oldest_retained_command() {
    const K: usize = 10;
    let config = Config {
        max_history: K,
        ..Config::default()
    };
    let mut doc = Document::with_config(config.clone());
    let layer = doc.layers()[0].id;
    let mut history = History::from_config(&config);

    let mut states = Vec::new();
    for i in 0..K + 5 {
        assert!(history.execute(AddShapeCommand::new(layer, 1, rect(i as f64)), &mut doc));
        states.push(state(&doc));
    }
    assert_eq!(history.len(), K);

    let mut undone = 0;
    while history.undo(&mut doc) {
        undone += 1;
    }
    assert_eq!(undone, K);
    // commands 6..=15 were retained, so everything up to command 5 stays applied
    assert_eq!(state(&doc), states[4]);
    assert_eq!(doc.layers()[0].get_shapes_at_frame(1).len(), 5);
}
