use approx::assert_abs_diff_eq;
use keyline_core::{Document, EditorError, ProjectFile, TweenType, FORMAT_VERSION};

fn load(name: &str) -> Document {
    let json = keyline_test_fixtures::projects::json(name).expect("load project fixture");
    Document::from_json_str(&json).expect("parse project fixture")
}

#[test]
fn every_project_fixture_round_trips() {
    let mut keys = keyline_test_fixtures::projects::keys();
    keys.sort();
    assert!(!keys.is_empty());
    for key in keys {
        let doc = load(&key);
        let json = doc.to_json().unwrap();
        assert_eq!(json["version"], FORMAT_VERSION);

        let reloaded = Document::from_json(json.clone())
            .unwrap_or_else(|e| panic!("fixture {key} failed to reload: {e}"));
        assert_eq!(reloaded.to_json().unwrap(), json, "fixture {key}");

        let text = reloaded.to_json_string().unwrap();
        assert_eq!(Document::from_json_str(&text).unwrap().to_json().unwrap(), json);
    }
}

#[test]
fn typed_fixture_matches_document_model() {
    let project: ProjectFile =
        keyline_test_fixtures::projects::load("bouncing-ball").expect("typed fixture");
    assert_eq!(project.layers.len(), 2);
    assert_eq!(project.library.len(), 1);
    let doc = Document::from_project(project.clone()).unwrap();
    assert_eq!(doc.to_project(), project);
}

#[test]
fn bouncing_ball_evaluates_with_easing() {
    let doc = load("bouncing-ball");
    assert_eq!(doc.name(), "Bouncing Ball");
    assert_eq!(doc.total_frames(), 60);

    let ball_layer = &doc.layers()[0];
    assert_eq!(ball_layer.keyframe_indices(), vec![1, 13]);
    assert_eq!(ball_layer.get_frame_count(), 24);
    let first = ball_layer.get_frame(1).unwrap();
    assert_eq!(first.tween_type, TweenType::Motion);
    assert_eq!(first.duration, 12);

    // background rect, the star instance, then the ball on top
    let frame1 = doc.evaluate_frame(1);
    assert_eq!(frame1.len(), 3);
    assert_eq!(frame1[0].shape.name, "Sky");
    assert_eq!(frame1[1].shape.name, "Star");
    assert_eq!(frame1[1].parent.map(|t| (t.x, t.y)), Some((80.0, 60.0)));
    assert_eq!(frame1[2].shape.name, "Ball");
    assert_abs_diff_eq!(frame1[2].transform.y, 50.0);

    // halfway through the span: easeOutBounce(0.5) = 0.765625
    let frame7 = doc.evaluate_frame(7);
    assert_abs_diff_eq!(frame7[2].transform.y, 50.0 + 250.0 * 0.765625, epsilon = 1e-9);
    assert_abs_diff_eq!(frame7[2].transform.x, 275.0);

    // past the last keyframe the ball holds
    let frame20 = doc.evaluate_frame(20);
    assert_abs_diff_eq!(frame20[2].transform.y, 300.0);
}

#[test]
fn locked_background_ignores_edits() {
    let mut doc = load("bouncing-ball");
    let background = doc.layers()[1].id;
    assert!(doc.layer(background).unwrap().locked);
    assert!(doc.insert_keyframe(background, 5).is_none());
    assert!(doc.clear_keyframe(background, 1).is_none());
}

#[test]
fn malformed_fixtures_are_rejected() {
    let mut keys = keyline_test_fixtures::malformed::keys();
    keys.sort();
    assert!(!keys.is_empty());
    for key in keys {
        let json = keyline_test_fixtures::malformed::json(&key).expect("load malformed fixture");
        let err = match Document::from_json_str(&json) {
            Ok(_) => panic!("malformed fixture {key} was accepted"),
            Err(err) => err,
        };
        let expected = match key.as_str() {
            "truncated" | "invalid-id" => "serialization",
            "bad-path-command" => "validation",
            _ => "document",
        };
        assert_eq!(err.category(), expected, "fixture {key}: {err}");
        if key == "unsupported-version" {
            assert!(matches!(err, EditorError::UnsupportedVersion { .. }));
        }
    }
}
