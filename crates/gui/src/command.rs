//! JSON command protocol for scripted sessions.
//!
//! Each command runs against a [`TestHarness`] and yields a
//! [`CommandResponse`]; failures are reported in the response instead of
//! aborting a batch.

use serde::{Deserialize, Serialize};

use crate::cursor::CursorStyle;
use crate::harness::TestHarness;

/// A command an automated client can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AgentCommand {
    /// Assign a color to a part
    SetColor { part: String, color: String },
    /// Read a part's color
    GetColor { part: String },
    /// Make a part the current selection
    SelectPart { part: String },
    /// Clear the selection
    ClearSelection,
    /// Pointer moved over `hits`, nearest first
    PointerMove {
        #[serde(default)]
        hits: Vec<String>,
    },
    /// Primary button pressed over `hits`, nearest first
    PointerDown {
        #[serde(default)]
        hits: Vec<String>,
    },
    /// Start a snapshot capture
    RequestCapture,
    /// Advance simulated time by one frame of `ms` milliseconds
    Advance { ms: u64 },
    /// Restore default colors
    ResetColors,
    /// Report colors, selection, hover and capture phase
    Inspect,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }

    fn from_result<T, E: std::fmt::Display>(
        result: Result<T, E>,
        data: impl FnOnce(T) -> Option<serde_json::Value>,
    ) -> Self {
        match result {
            Ok(value) => match data(value) {
                Some(data) => Self::ok_with_data(data),
                None => Self::ok(),
            },
            Err(e) => Self::err(e.to_string()),
        }
    }
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut TestHarness, cmd: AgentCommand) -> CommandResponse {
    tracing::debug!("Executing {cmd:?}");
    match cmd {
        AgentCommand::SetColor { part, color } => {
            CommandResponse::from_result(harness.set_color(&part, &color), |_| None)
        }

        AgentCommand::GetColor { part } => {
            CommandResponse::from_result(harness.get_color(&part), |color| {
                Some(serde_json::json!({ "part": part, "color": color }))
            })
        }

        AgentCommand::SelectPart { part } => {
            CommandResponse::from_result(harness.select(Some(part.as_str())), |_| {
                Some(serde_json::json!({ "selected": part }))
            })
        }

        AgentCommand::ClearSelection => {
            CommandResponse::from_result(harness.select(None), |_| None)
        }

        AgentCommand::PointerMove { hits } => {
            let hits: Vec<&str> = hits.iter().map(String::as_str).collect();
            CommandResponse::from_result(harness.pointer_move(&hits), |_| {
                Some(serde_json::json!({ "hovered": harness.hovered() }))
            })
        }

        AgentCommand::PointerDown { hits } => {
            let hits: Vec<&str> = hits.iter().map(String::as_str).collect();
            CommandResponse::from_result(harness.pointer_down(&hits), |_| {
                Some(serde_json::json!({ "selected": harness.current_part() }))
            })
        }

        AgentCommand::RequestCapture => {
            CommandResponse::from_result(harness.request_capture(), |_| {
                Some(serde_json::json!({ "phase": format!("{:?}", harness.capture_phase()) }))
            })
        }

        AgentCommand::Advance { ms } => {
            let outcome = harness.advance(std::time::Duration::from_millis(ms));
            let phase = format!("{:?}", harness.capture_phase());
            match outcome {
                None => CommandResponse::ok_with_data(serde_json::json!({ "phase": phase })),
                Some(Ok(report)) => CommandResponse::ok_with_data(serde_json::json!({
                    "phase": phase,
                    "captured": report.path,
                    "width": report.width,
                    "height": report.height,
                })),
                Some(Err(e)) => CommandResponse::err(e.to_string()),
            }
        }

        AgentCommand::ResetColors => {
            harness.reset_colors();
            CommandResponse::ok()
        }

        AgentCommand::Inspect => {
            let snapshot = harness.snapshot();
            let cursor = match harness.cursor_style() {
                CursorStyle::Default => serde_json::Value::Null,
                CursorStyle::Image(image) => serde_json::Value::String(image.data_uri()),
            };
            CommandResponse::ok_with_data(serde_json::json!({
                "current": snapshot.current,
                "colors": snapshot.colors,
                "hovered": harness.hovered(),
                "cursor": cursor,
                "capture_phase": format!("{:?}", harness.capture_phase()),
                "elapsed_ms": harness.elapsed().as_millis() as u64,
            }))
        }
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut TestHarness, json: &str) -> Result<CommandResponse, String> {
    let cmd: AgentCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(
    harness: &mut TestHarness,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<AgentCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds
        .into_iter()
        .map(|cmd| execute_command(harness, cmd))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serde_set_color() {
        let json = r##"{"command": "set_color", "part": "sole", "color": "#FF0000"}"##;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        match cmd {
            AgentCommand::SetColor { part, color } => {
                assert_eq!(part, "sole");
                assert_eq!(color, "#FF0000");
            }
            _ => panic!("Expected SetColor"),
        }
    }

    #[test]
    fn test_command_serde_pointer_move_defaults_hits() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"command": "pointer_move"}"#).unwrap();
        match cmd {
            AgentCommand::PointerMove { hits } => assert!(hits.is_empty()),
            _ => panic!("Expected PointerMove"),
        }
    }

    #[test]
    fn test_command_serde_unit_variants() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"command": "clear_selection"}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::ClearSelection));
        let cmd: AgentCommand = serde_json::from_str(r#"{"command": "request_capture"}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::RequestCapture));
    }

    #[test]
    fn test_execute_set_and_get_color() {
        let mut h = TestHarness::new();
        let resp = execute_json(
            &mut h,
            r##"{"command": "set_color", "part": "sole", "color": "#1A2B3C"}"##,
        )
        .unwrap();
        assert!(resp.success);

        let resp = execute_json(&mut h, r#"{"command": "get_color", "part": "sole"}"#).unwrap();
        assert_eq!(resp.data.unwrap()["color"], "#1a2b3c");
    }

    #[test]
    fn test_execute_invalid_color_reports_error() {
        let mut h = TestHarness::new();
        let resp = execute_json(
            &mut h,
            r#"{"command": "set_color", "part": "sole", "color": "red"}"#,
        )
        .unwrap();
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("invalid color"));
        assert_eq!(h.get_color("sole").unwrap().as_str(), "#ffffff");
    }

    #[test]
    fn test_execute_unknown_part_reports_error() {
        let mut h = TestHarness::new();
        let resp = execute_json(&mut h, r#"{"command": "get_color", "part": "heel"}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("heel"));
    }

    #[test]
    fn test_execute_pointer_down_reports_selection() {
        let mut h = TestHarness::new();
        let resp = execute_json(
            &mut h,
            r#"{"command": "pointer_down", "hits": ["laces", "mesh"]}"#,
        )
        .unwrap();
        assert_eq!(resp.data.unwrap()["selected"], "laces");
    }

    #[test]
    fn test_execute_inspect() {
        let mut h = TestHarness::new();
        h.pointer_move(&["caps"]).unwrap();

        let resp = execute_json(&mut h, r#"{"command": "inspect"}"#).unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data["colors"].as_array().unwrap().len(), 8);
        assert_eq!(data["hovered"], "caps");
        assert!(data["cursor"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,"));
        assert_eq!(data["capture_phase"], "Idle");
    }

    #[test]
    fn test_execute_invalid_json() {
        let mut h = TestHarness::new();
        assert!(execute_json(&mut h, r#"{"command": "teleport"}"#).is_err());
    }
}
