//! The event model (component C1): tagged event variants with a lossless,
//! map-shaped wire encoding.
//!
//! Every [`Event`] carries an `event_type` discriminator and a monotonic
//! `timestamp`. `to_dict`/`from_dict` are the sole wire format used by the
//! HITL handler, connection manager, streaming dispatcher, and message
//! persistence — round-tripping through them must be lossless per variant.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Outcome of a tool call or file operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The operation completed successfully.
    Success,
    /// The operation failed.
    Error,
}

/// A single action an executor wants approved before it proceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Name of the tool/action awaiting approval.
    pub tool_name: String,
    /// Arguments the tool would be invoked with.
    pub args: Value,
}

/// Tagged event variants emitted by an [`AgentExecutor`](crate::AgentExecutor)
/// during one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A chunk of assistant text.
    Text {
        /// The text content.
        content: String,
        /// Whether this is the final text chunk of the turn.
        is_final: bool,
    },
    /// The executor wants to invoke a tool.
    ToolCall {
        /// Name of the tool being called.
        tool_name: String,
        /// Arguments passed to the tool.
        args: Value,
        /// Correlates this call with its eventual result.
        call_id: String,
    },
    /// The result of a previously emitted tool call.
    ToolResult {
        /// The `call_id` of the originating `tool_call` event.
        call_id: String,
        /// The tool's return value.
        result: Value,
        /// Whether the call succeeded.
        status: OutcomeStatus,
    },
    /// A human-in-the-loop approval request.
    HitlRequest {
        /// Correlates the request with its eventual decision.
        interrupt_id: String,
        /// The actions awaiting approval.
        action_requests: Vec<ActionRequest>,
    },
    /// An update to the executor's todo/plan list.
    TodoUpdate {
        /// The current todo items, in executor-defined shape.
        todos: Vec<Value>,
    },
    /// A file-system operation performed by a tool.
    FileOperation {
        /// The kind of operation (e.g. `"write"`, `"read"`, `"delete"`).
        operation: String,
        /// Path the operation acted on.
        path: String,
        /// Operation metrics (e.g. bytes written, lines changed).
        metrics: Value,
        /// Optional unified diff, when the operation changed file content.
        diff: Option<String>,
        /// Whether the operation succeeded.
        status: OutcomeStatus,
    },
    /// A non-fatal or fatal error during the turn.
    Error {
        /// Human-readable error message.
        message: String,
        /// Whether the turn can continue after this error.
        recoverable: bool,
    },
    /// Terminal event for a turn.
    Done {
        /// Token usage for the turn, if the executor reports it.
        token_usage: Option<Value>,
        /// Whether the turn was cancelled rather than completed normally.
        cancelled: bool,
    },
}

impl EventKind {
    /// The wire discriminator for this variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::HitlRequest { .. } => "hitl_request",
            Self::TodoUpdate { .. } => "todo_update",
            Self::FileOperation { .. } => "file_operation",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }
}

/// Error decoding an [`Event`] from its map form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventDecodeError {
    /// The `event_type` discriminator was missing or not a recognized variant.
    #[error("unknown event type: {0:?}")]
    UnknownEventType(Option<String>),
    /// A required field for the matched variant was missing or malformed.
    #[error("malformed field {field:?} for event type {event_type:?}")]
    MalformedField {
        /// The event type being decoded.
        event_type: String,
        /// The field that failed to decode.
        field: String,
    },
}

/// A timestamped, tagged event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The event's payload.
    pub kind: EventKind,
    /// Monotonic timestamp (milliseconds since the Unix epoch) of emission.
    pub timestamp: i64,
}

impl Event {
    /// Build an event, stamping it with the given timestamp.
    #[must_use]
    pub fn new(kind: EventKind, timestamp: i64) -> Self {
        Self { kind, timestamp }
    }

    /// The wire discriminator for this event.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// Encode to the canonical map form: `event_type` + variant fields +
    /// `timestamp`, all at the top level.
    #[must_use]
    pub fn to_dict(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "event_type".to_string(),
            Value::String(self.event_type().to_string()),
        );
        map.insert("timestamp".to_string(), json!(self.timestamp));

        match &self.kind {
            EventKind::Text { content, is_final } => {
                map.insert("content".to_string(), json!(content));
                map.insert("is_final".to_string(), json!(is_final));
            },
            EventKind::ToolCall {
                tool_name,
                args,
                call_id,
            } => {
                map.insert("tool_name".to_string(), json!(tool_name));
                map.insert("args".to_string(), args.clone());
                map.insert("call_id".to_string(), json!(call_id));
            },
            EventKind::ToolResult {
                call_id,
                result,
                status,
            } => {
                map.insert("call_id".to_string(), json!(call_id));
                map.insert("result".to_string(), result.clone());
                map.insert("status".to_string(), json!(status));
            },
            EventKind::HitlRequest {
                interrupt_id,
                action_requests,
            } => {
                map.insert("interrupt_id".to_string(), json!(interrupt_id));
                map.insert("action_requests".to_string(), json!(action_requests));
            },
            EventKind::TodoUpdate { todos } => {
                map.insert("todos".to_string(), json!(todos));
            },
            EventKind::FileOperation {
                operation,
                path,
                metrics,
                diff,
                status,
            } => {
                map.insert("operation".to_string(), json!(operation));
                map.insert("path".to_string(), json!(path));
                map.insert("metrics".to_string(), metrics.clone());
                map.insert("diff".to_string(), json!(diff));
                map.insert("status".to_string(), json!(status));
            },
            EventKind::Error {
                message,
                recoverable,
            } => {
                map.insert("message".to_string(), json!(message));
                map.insert("recoverable".to_string(), json!(recoverable));
            },
            EventKind::Done {
                token_usage,
                cancelled,
            } => {
                map.insert("token_usage".to_string(), json!(token_usage));
                map.insert("cancelled".to_string(), json!(cancelled));
            },
        }

        Value::Object(map)
    }

    /// Decode from the canonical map form produced by [`Event::to_dict`].
    ///
    /// # Errors
    /// Returns [`EventDecodeError::UnknownEventType`] when the discriminator
    /// is missing or unrecognized, or [`EventDecodeError::MalformedField`]
    /// when a required field for the matched variant is missing or has the
    /// wrong shape.
    pub fn from_dict(value: &Value) -> Result<Self, EventDecodeError> {
        let obj = value.as_object().ok_or(EventDecodeError::UnknownEventType(None))?;
        let event_type = obj.get("event_type").and_then(Value::as_str);
        let timestamp = obj.get("timestamp").and_then(Value::as_i64).unwrap_or(0);

        let field = |name: &str| -> Result<&Value, EventDecodeError> {
            obj.get(name).ok_or_else(|| EventDecodeError::MalformedField {
                event_type: event_type.unwrap_or("").to_string(),
                field: name.to_string(),
            })
        };
        let str_field = |name: &str| -> Result<String, EventDecodeError> {
            field(name)?
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| EventDecodeError::MalformedField {
                    event_type: event_type.unwrap_or("").to_string(),
                    field: name.to_string(),
                })
        };
        let bool_field = |name: &str| -> Result<bool, EventDecodeError> {
            field(name)?
                .as_bool()
                .ok_or_else(|| EventDecodeError::MalformedField {
                    event_type: event_type.unwrap_or("").to_string(),
                    field: name.to_string(),
                })
        };
        let status_field = |name: &str| -> Result<OutcomeStatus, EventDecodeError> {
            serde_json::from_value(field(name)?.clone()).map_err(|_| {
                EventDecodeError::MalformedField {
                    event_type: event_type.unwrap_or("").to_string(),
                    field: name.to_string(),
                }
            })
        };

        let kind = match event_type {
            Some("text") => EventKind::Text {
                content: str_field("content")?,
                is_final: bool_field("is_final")?,
            },
            Some("tool_call") => EventKind::ToolCall {
                tool_name: str_field("tool_name")?,
                args: field("args")?.clone(),
                call_id: str_field("call_id")?,
            },
            Some("tool_result") => EventKind::ToolResult {
                call_id: str_field("call_id")?,
                result: field("result")?.clone(),
                status: status_field("status")?,
            },
            Some("hitl_request") => EventKind::HitlRequest {
                interrupt_id: str_field("interrupt_id")?,
                action_requests: serde_json::from_value(field("action_requests")?.clone())
                    .map_err(|_| EventDecodeError::MalformedField {
                        event_type: "hitl_request".to_string(),
                        field: "action_requests".to_string(),
                    })?,
            },
            Some("todo_update") => EventKind::TodoUpdate {
                todos: field("todos")?
                    .as_array()
                    .cloned()
                    .ok_or_else(|| EventDecodeError::MalformedField {
                        event_type: "todo_update".to_string(),
                        field: "todos".to_string(),
                    })?,
            },
            Some("file_operation") => EventKind::FileOperation {
                operation: str_field("operation")?,
                path: str_field("path")?,
                metrics: field("metrics")?.clone(),
                diff: obj.get("diff").and_then(Value::as_str).map(str::to_string),
                status: status_field("status")?,
            },
            Some("error") => EventKind::Error {
                message: str_field("message")?,
                recoverable: bool_field("recoverable")?,
            },
            Some("done") => EventKind::Done {
                token_usage: obj.get("token_usage").cloned().filter(|v| !v.is_null()),
                cancelled: bool_field("cancelled")?,
            },
            other => {
                return Err(EventDecodeError::UnknownEventType(
                    other.map(str::to_string),
                ));
            },
        };

        Ok(Event { kind, timestamp })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(kind: EventKind) {
        let event = Event::new(kind, 1_700_000_000_000);
        let decoded = Event::from_dict(&event.to_dict()).expect("decode");
        assert_eq!(event, decoded);
    }

    #[test]
    fn text_roundtrips() {
        roundtrip(EventKind::Text {
            content: "hello".to_string(),
            is_final: true,
        });
    }

    #[test]
    fn tool_call_roundtrips() {
        roundtrip(EventKind::ToolCall {
            tool_name: "read_file".to_string(),
            args: json!({"path": "/tmp/x"}),
            call_id: "call-1".to_string(),
        });
    }

    #[test]
    fn tool_result_roundtrips() {
        roundtrip(EventKind::ToolResult {
            call_id: "call-1".to_string(),
            result: json!({"ok": true}),
            status: OutcomeStatus::Success,
        });
    }

    #[test]
    fn hitl_request_roundtrips() {
        roundtrip(EventKind::HitlRequest {
            interrupt_id: "int-1".to_string(),
            action_requests: vec![ActionRequest {
                tool_name: "delete_file".to_string(),
                args: json!({"path": "/tmp/x"}),
            }],
        });
    }

    #[test]
    fn file_operation_roundtrips_with_and_without_diff() {
        roundtrip(EventKind::FileOperation {
            operation: "write".to_string(),
            path: "/tmp/x".to_string(),
            metrics: json!({"bytes": 12}),
            diff: Some("+hello".to_string()),
            status: OutcomeStatus::Success,
        });
        roundtrip(EventKind::FileOperation {
            operation: "read".to_string(),
            path: "/tmp/x".to_string(),
            metrics: json!({"bytes": 12}),
            diff: None,
            status: OutcomeStatus::Success,
        });
    }

    #[test]
    fn done_roundtrips_with_and_without_usage() {
        roundtrip(EventKind::Done {
            token_usage: Some(json!({"input": 10, "output": 5})),
            cancelled: false,
        });
        roundtrip(EventKind::Done {
            token_usage: None,
            cancelled: true,
        });
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let value = json!({"event_type": "bogus", "timestamp": 0});
        assert_eq!(
            Event::from_dict(&value),
            Err(EventDecodeError::UnknownEventType(Some("bogus".to_string())))
        );
    }

    #[test]
    fn missing_event_type_is_rejected() {
        let value = json!({"timestamp": 0});
        assert_eq!(
            Event::from_dict(&value),
            Err(EventDecodeError::UnknownEventType(None))
        );
    }
}
