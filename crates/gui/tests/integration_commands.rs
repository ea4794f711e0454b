//! Integration tests for the AgentCommand JSON protocol.
//!
//! Tests the full command pipeline: JSON string -> parse -> execute -> response.

use customizer_lib::command::{execute_json, execute_json_batch};
use customizer_lib::harness::TestHarness;

#[test]
fn test_command_select_then_recolor() {
    let mut h = TestHarness::new();

    let responses = execute_json_batch(
        &mut h,
        r##"[
            {"command": "select_part", "part": "sole"},
            {"command": "set_color", "part": "sole", "color": "#ff0000"},
            {"command": "get_color", "part": "sole"},
            {"command": "get_color", "part": "mesh"}
        ]"##,
    )
    .unwrap();

    assert!(responses.iter().all(|r| r.success));
    assert_eq!(responses[2].data.as_ref().unwrap()["color"], "#ff0000");
    assert_eq!(responses[3].data.as_ref().unwrap()["color"], "#ffffff");
}

#[test]
fn test_command_batch_continues_after_error() {
    let mut h = TestHarness::new();

    let responses = execute_json_batch(
        &mut h,
        r##"[
            {"command": "set_color", "part": "heel", "color": "#000000"},
            {"command": "set_color", "part": "laces", "color": "not-a-color"},
            {"command": "set_color", "part": "laces", "color": "#000"}
        ]"##,
    )
    .unwrap();

    assert!(!responses[0].success);
    assert!(responses[0].error.as_ref().unwrap().contains("unknown part"));
    assert!(!responses[1].success);
    assert!(responses[2].success);
    assert_eq!(h.get_color("laces").unwrap().as_str(), "#000000");
}

#[test]
fn test_command_pointer_flow() {
    let mut h = TestHarness::new();

    let resp = execute_json(
        &mut h,
        r#"{"command": "pointer_move", "hits": ["laces", "mesh"]}"#,
    )
    .unwrap();
    assert_eq!(resp.data.unwrap()["hovered"], "laces");

    let resp = execute_json(&mut h, r#"{"command": "pointer_move", "hits": []}"#).unwrap();
    assert!(resp.data.unwrap()["hovered"].is_null());

    let resp = execute_json(&mut h, r#"{"command": "pointer_down", "hits": ["band"]}"#).unwrap();
    assert_eq!(resp.data.unwrap()["selected"], "band");

    let resp = execute_json(&mut h, r#"{"command": "pointer_down"}"#).unwrap();
    assert!(resp.data.unwrap()["selected"].is_null());
}

#[test]
fn test_command_clear_selection_is_idempotent() {
    let mut h = TestHarness::new();
    for _ in 0..2 {
        let resp = execute_json(&mut h, r#"{"command": "clear_selection"}"#).unwrap();
        assert!(resp.success);
    }
    assert_eq!(h.current_part(), None);
}

#[test]
fn test_command_capture_flow() {
    let mut h = TestHarness::new();
    h.state.settings.capture.width = 32;
    h.state.settings.capture.height = 32;

    let resp = execute_json(&mut h, r#"{"command": "request_capture"}"#).unwrap();
    assert!(resp.success);
    assert_eq!(resp.data.unwrap()["phase"], "ResettingCamera");

    let resp = execute_json(&mut h, r#"{"command": "request_capture"}"#).unwrap();
    assert!(!resp.success);
    assert!(resp.error.unwrap().contains("already in progress"));

    let resp = execute_json(&mut h, r#"{"command": "advance", "ms": 1500}"#).unwrap();
    assert_eq!(resp.data.unwrap()["phase"], "AwaitingStableFrame");

    let resp = execute_json(&mut h, r#"{"command": "advance", "ms": 16}"#).unwrap();
    let data = resp.data.unwrap();
    assert_eq!(data["phase"], "Idle");
    assert_eq!(data["width"], 32);
    assert!(data["captured"].as_str().unwrap().ends_with(".png"));
}

#[test]
fn test_command_reset_and_inspect() {
    let mut h = TestHarness::new();
    execute_json(
        &mut h,
        r##"{"command": "set_color", "part": "patch", "color": "#123456"}"##,
    )
    .unwrap();
    execute_json(&mut h, r#"{"command": "reset_colors"}"#).unwrap();

    let resp = execute_json(&mut h, r#"{"command": "inspect"}"#).unwrap();
    let data = resp.data.unwrap();
    let colors = data["colors"].as_array().unwrap();
    assert!(colors.iter().all(|c| c["color"] == "#ffffff"));
    assert!(data["current"].is_null());
    assert!(data["cursor"].is_null());
}

#[test]
fn test_command_batch_invalid_json() {
    let mut h = TestHarness::new();
    assert!(execute_json_batch(&mut h, r#"{"command": "inspect"}"#).is_err());
}
