use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::TaskConfig;

/// Request sent to the host to schedule one task invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub name: String,
    pub args: Vec<Value>,
    pub config: TaskConfig,
}

impl ScheduleRequest {
    pub fn new(config: &TaskConfig, args: Vec<Value>) -> Self {
        Self {
            name: config.name().to_string(),
            args,
            config: config.clone(),
        }
    }

    pub fn args_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.args)
    }

    pub fn config_json(&self) -> Result<String, serde_json::Error> {
        self.config.to_json()
    }
}

/// Strict form of a response envelope: exactly one of `result` or `error`.
///
/// Deserialization fails when both keys or neither key are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    Result(Value),
    Error(String),
}

impl Envelope {
    pub fn to_json(&self) -> String {
        match self {
            Envelope::Result(value) => json!({ "result": value }).to_string(),
            Envelope::Error(message) => json!({ "error": message }).to_string(),
        }
    }
}

/// What a caller gets back after interpreting a host response string.
///
/// Parsing is lenient:
/// - an object with a non-null `error` is [`ResponseOutcome::Error`], even if `result` is also present;
/// - an object with only `result` is [`ResponseOutcome::Result`];
/// - an object with neither key yields `Result(Value::Null)`;
/// - text that is not JSON, or JSON that is not an object, is kept as [`ResponseOutcome::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Result(Value),
    Error(String),
    Raw(String),
}

impl ResponseOutcome {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(mut map)) => match map.remove("error") {
                Some(Value::String(message)) => ResponseOutcome::Error(message),
                None | Some(Value::Null) => {
                    ResponseOutcome::Result(map.remove("result").unwrap_or(Value::Null))
                }
                Some(other) => ResponseOutcome::Error(other.to_string()),
            },
            _ => ResponseOutcome::Raw(raw.to_string()),
        }
    }
}
