use serde::{Deserialize, Serialize};

/// Liveness probe body.
#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Error body returned by every HTTP endpoint on failure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, detail: Option<String>) -> Self {
        Self { error: error.into(), detail }
    }
}
