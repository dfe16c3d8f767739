use serde_json::Value;

/// Scheduler response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    InvalidRequest,
    Ok,
    Error,
    Warning,
    AuthFailed,
    LockError,
    /// The scheduler is temporarily unable to serve (e.g. not leading, overloaded).
    ErrorTransient,
    Unknown(i32),
}

impl ResponseCode {
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => ResponseCode::InvalidRequest,
            1 => ResponseCode::Ok,
            2 => ResponseCode::Error,
            3 => ResponseCode::Warning,
            4 => ResponseCode::AuthFailed,
            5 => ResponseCode::LockError,
            6 => ResponseCode::ErrorTransient,
            other => ResponseCode::Unknown(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            ResponseCode::InvalidRequest => 0,
            ResponseCode::Ok => 1,
            ResponseCode::Error => 2,
            ResponseCode::Warning => 3,
            ResponseCode::AuthFailed => 4,
            ResponseCode::LockError => 5,
            ResponseCode::ErrorTransient => 6,
            ResponseCode::Unknown(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDetail {
    pub message: String,
}

/// Envelope every scheduler RPC returns. `result` and `server_info` stay in
/// their encoded form; interpreting them is up to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub response_code: ResponseCode,
    pub details: Vec<ResponseDetail>,
    pub result: Option<Value>,
    pub server_info: Option<Value>,
}

impl Response {
    pub fn new(response_code: ResponseCode) -> Self {
        Self {
            response_code,
            details: Vec::new(),
            result: None,
            server_info: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(ResponseCode::Ok)
    }

    pub fn transient(messages: &[&str]) -> Self {
        Self::new(ResponseCode::ErrorTransient).with_details(messages)
    }

    pub fn with_details(mut self, messages: &[&str]) -> Self {
        self.details = messages
            .iter()
            .map(|m| ResponseDetail {
                message: m.to_string(),
            })
            .collect();
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.response_code == ResponseCode::ErrorTransient
    }

    pub fn detail_messages(&self) -> Vec<&str> {
        self.details.iter().map(|d| d.message.as_str()).collect()
    }
}
