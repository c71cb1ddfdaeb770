use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a single transcript turn.
///
/// `User` and `Assistant` turns are forwarded to completion engines. The
/// `App*` roles are authored by the application itself (status banners,
/// fallback warnings, errors) and are rendered in the transcript but never
/// transmitted to a remote engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TurnRole {
    User,
    Assistant,
    AppInfo,
    AppWarning,
    AppError,
}

/// One message within a session. Immutable once appended; ordering within a
/// session is append order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::AppInfo => "app/info",
            TurnRole::AppWarning => "app/warning",
            TurnRole::AppError => "app/error",
        }
    }

    /// Role string used on the wire, or `None` for app-authored turns.
    pub fn to_api_role(self) -> Option<&'static str> {
        match self {
            TurnRole::User => Some("user"),
            TurnRole::Assistant => Some("assistant"),
            _ => None,
        }
    }

    pub fn is_user(self) -> bool {
        self == TurnRole::User
    }

    pub fn is_assistant(self) -> bool {
        self == TurnRole::Assistant
    }

    pub fn is_app(self) -> bool {
        matches!(
            self,
            TurnRole::AppInfo | TurnRole::AppWarning | TurnRole::AppError
        )
    }
}

impl AsRef<str> for TurnRole {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for TurnRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            "app/info" => Ok(TurnRole::AppInfo),
            "app/warning" => Ok(TurnRole::AppWarning),
            "app/error" => Ok(TurnRole::AppError),
            _ => Err(format!("invalid turn role: {value}")),
        }
    }
}

impl TryFrom<String> for TurnRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TurnRole> for String {
    fn from(value: TurnRole) -> Self {
        value.as_str().to_string()
    }
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    pub fn app_info(content: impl Into<String>) -> Self {
        Self::new(TurnRole::AppInfo, content)
    }

    pub fn app_warning(content: impl Into<String>) -> Self {
        Self::new(TurnRole::AppWarning, content)
    }

    pub fn app_error(content: impl Into<String>) -> Self {
        Self::new(TurnRole::AppError, content)
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    /// True for user/assistant turns, the only ones that count as
    /// conversation history.
    pub fn is_conversation(&self) -> bool {
        self.role.to_api_role().is_some()
    }
}
