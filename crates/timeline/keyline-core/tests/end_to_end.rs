use approx::assert_abs_diff_eq;
use keyline_core::{
    interpolate, Document, DocumentEvent, Easing, EventType, Point, Shape, TweenType,
};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn motion_tween_midpoint_between_two_keyframes() {
    let mut doc = Document::new();
    let layer = doc.add_layer(None);

    // frame 1 already exists as a keyframe; inserting it again keeps it
    assert!(doc.insert_keyframe(layer, 1).is_some());
    let rect = Shape::rectangle(0.0, 0.0, 20.0, 20.0);
    let id = doc.add_shape_to(layer, 1, rect.clone()).expect("add rectangle");

    // keyframe 10 starts as a carried copy; swap it for the same shape moved to x = 100
    doc.insert_keyframe(layer, 10).expect("insert keyframe 10");
    let carried = doc.layer(layer).unwrap().get_shapes_at_frame(10)[0].id;
    assert_ne!(carried, id);
    doc.remove_shape(layer, 10, carried).expect("remove carried copy");
    let mut moved = rect;
    moved.transform.x = 100.0;
    doc.add_shape_to(layer, 10, moved).expect("add moved rectangle");

    assert_eq!(
        doc.set_tween(layer, 1, TweenType::Motion, Some(Easing::Linear)),
        Some(1)
    );

    let l = doc.layer(layer).unwrap();
    let start = l.get_frame(1).unwrap();
    let end = l.get_next_keyframe(1).unwrap();
    assert_eq!(end.index, 10);

    let samples = interpolate(start.shapes(), end.shapes(), 0.5, start.easing);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].shape.id, id);
    assert_abs_diff_eq!(samples[0].transform.x, 50.0);

    // the document's own evaluation agrees at the span ends
    assert_abs_diff_eq!(doc.evaluate_frame(1)[0].transform.x, 0.0);
    assert_abs_diff_eq!(doc.evaluate_frame(10)[0].transform.x, 100.0);
    let span = l.tween_span(4).unwrap();
    assert_abs_diff_eq!(span.progress, 3.0 / 9.0);
    assert_abs_diff_eq!(doc.evaluate_frame(4)[0].transform.x, 100.0 * 3.0 / 9.0, epsilon = 1e-9);
}

#[test]
fn three_layer_paint_order_and_hit_testing() {
    let mut doc = Document::new();
    let bottom = doc.layers()[0].id;
    let middle = doc.add_layer(Some("Middle"));
    let top = doc.add_layer(Some("Top"));
    assert_eq!(doc.layer_index(bottom), Some(2));

    let backdrop = Shape::rectangle(0.0, 0.0, 100.0, 100.0);
    let panel = Shape::rectangle(25.0, 25.0, 50.0, 50.0);
    let dot = Shape::ellipse(50.0, 50.0, 10.0, 10.0);
    let b = doc.add_shape_to(bottom, 1, backdrop).unwrap();
    let m = doc.add_shape_to(middle, 1, panel).unwrap();
    let t = doc.add_shape_to(top, 1, dot).unwrap();

    let order: Vec<_> = doc.get_visible_shapes().iter().map(|s| s.id).collect();
    assert_eq!(order, vec![b, m, t]);

    assert_eq!(doc.shape_at_point(Point::new(50.0, 50.0)), Some(t));
    assert_eq!(doc.shape_at_point(Point::new(30.0, 30.0)), Some(m));
    assert_eq!(doc.shape_at_point(Point::new(5.0, 5.0)), Some(b));
    assert_eq!(doc.shape_at_point(Point::new(500.0, 5.0)), None);
}

#[test]
fn editing_session_notifications() {
    let mut doc = Document::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    for event in [
        EventType::FrameChanged,
        EventType::LayersChanged,
        EventType::KeyframesChanged,
        EventType::ShapesChanged,
    ] {
        let sink = Rc::clone(&seen);
        doc.on(event, move |e| {
            sink.borrow_mut().push(e.event_type());
            Ok(())
        });
    }
    // a failing listener does not block the ones after it
    doc.on(EventType::FrameChanged, |_| Err("renderer not ready".to_string()));

    let layer = doc.layers()[0].id;
    doc.set_current_frame(5);
    doc.add_shape(Shape::rectangle(0.0, 0.0, 1.0, 1.0)).unwrap();
    doc.set_layer_locked(layer, true);
    assert!(doc.insert_keyframe(layer, 8).is_none());

    assert_eq!(
        *seen.borrow(),
        vec![
            EventType::FrameChanged,
            EventType::KeyframesChanged,
            EventType::ShapesChanged,
            EventType::LayersChanged,
        ]
    );
    assert_eq!(doc.emit(&DocumentEvent::FrameChanged { frame: 5 }), 1);
}

#[test]
fn carry_forward_copies_are_independent() {
    let mut doc = Document::new();
    let layer = doc.layers()[0].id;
    let square = Shape::rectangle(0.0, 0.0, 8.0, 8.0);
    let original = doc.add_shape_to(layer, 1, square).unwrap();
    doc.insert_keyframe(layer, 10);

    let copy = doc.layer(layer).unwrap().get_shapes_at_frame(10)[0].clone();
    assert_ne!(copy.id, original);
    assert_eq!(copy.paths, doc.layer(layer).unwrap().get_shapes_at_frame(1)[0].paths);

    let mut shifted = copy.transform;
    shifted.x = 42.0;
    doc.set_shape_transform(layer, 10, copy.id, shifted);
    let first = doc.shape(original).expect("original stays on frame 1");
    assert_eq!(first.transform.x, 0.0);

    doc.insert_blank_keyframe(layer, 20);
    assert!(doc.layer(layer).unwrap().get_shapes_at_frame(25).is_empty());
    assert!(doc.clear_keyframe(layer, 1).is_some());
    assert!(doc.layer(layer).unwrap().get_frame(1).is_some());
}
