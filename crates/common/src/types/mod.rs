use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// `{status, message}` envelope shared by every mutating endpoint.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusBody {
    pub status: &'static str,
    pub message: String,
}

impl StatusBody {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: "success", message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: "error", message: message.into() }
    }
}
