use std::fmt;

use serde::{Deserialize, Serialize};

/// Status codes produced on this side of the engine boundary. Engines may
/// report codes outside this set; those travel as raw integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    InvalidArgument = 1,
    FileNotFound = 2,
    NotInitialized = 3,
    InvalidState = 4,
    IoFailure = 5,
    Internal = 6,
}

impl ErrorCode {
    pub fn value(self) -> i32 {
        self as i32
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.value()
    }
}

/// A failure as reported by the engine: numeric code, where it happened and
/// a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: i32,
    pub class_name: String,
    pub function_name: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(
        code: impl Into<i32>,
        class_name: impl Into<String>,
        function_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            class_name: class_name.into(),
            function_name: function_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error {} in {}::{}: {}",
            self.code, self.class_name, self.function_name, self.message
        )
    }
}

/// A failed engine operation: the returned code plus every record that came
/// with it. The first record is the one shown to users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineFailure {
    pub code: i32,
    pub records: Vec<ErrorRecord>,
}

impl EngineFailure {
    pub fn new(code: impl Into<i32>, records: Vec<ErrorRecord>) -> Self {
        Self {
            code: code.into(),
            records,
        }
    }

    /// Failure carrying a single record whose code becomes the result code.
    pub fn from_record(record: ErrorRecord) -> Self {
        Self {
            code: record.code,
            records: vec![record],
        }
    }

    pub fn primary(&self) -> Option<&ErrorRecord> {
        self.records.first()
    }

    pub fn status_text(&self) -> String {
        match self.primary() {
            Some(record) => record.to_string(),
            None => format!("engine returned error {} without details", self.code),
        }
    }
}

impl fmt::Display for EngineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_text())
    }
}

impl std::error::Error for EngineFailure {}
