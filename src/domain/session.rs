// ============================================================
// Layer 3 - Chat Session
// ============================================================
// Everything one chat user accumulates while talking to the bot:
//
//   - the ordered conversation log (never persisted)
//   - whether the login gate has been passed
//   - who logged in
//   - the conversation mode they picked
//
// A session is an explicit value owned by the caller and passed
// into every handler. Nothing here is process-wide.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const GREETING: &str = "Hello! I'm your support assistant. How can I help you today?";

/// What the user sees whenever no answer can be produced.
pub const FALLBACK_APOLOGY: &str =
    "Sorry, I couldn't understand your question. Please try rephrasing it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role:    Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// How much detail the user wants back. Only the generative
/// answer source acts on it; canned answers are fixed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationMode {
    #[default]
    Standard,
    Detailed,
    Concise,
}

impl ConversationMode {
    pub fn prompt_suffix(self) -> &'static str {
        match self {
            ConversationMode::Standard => "",
            ConversationMode::Detailed => " Please provide a comprehensive and detailed explanation.",
            ConversationMode::Concise  => " Please provide a very brief and to-the-point answer.",
        }
    }
}

impl FromStr for ConversationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ConversationMode::Standard),
            "detailed" => Ok(ConversationMode::Detailed),
            "concise"  => Ok(ConversationMode::Concise),
            other => Err(format!("unknown conversation mode '{other}'")),
        }
    }
}

/// Presence-only login entry written to the configured store.
/// Column names match the spreadsheet the records end up in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Employee_ID")]
    pub employee_id: String,

    #[serde(rename = "Login_Time")]
    pub login_time: String,
}

impl LoginRecord {
    pub const TIME_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Stamp a record with the current local time
    pub fn now(name: impl Into<String>, employee_id: impl Into<String>) -> Self {
        Self {
            name:        name.into(),
            employee_id: employee_id.into(),
            login_time:  chrono::Local::now().format(Self::TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    turns:         Vec<ConversationTurn>,
    authenticated: bool,
    user:          Option<(String, String)>,
    mode:          ConversationMode,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// A fresh session starts logged out with the greeting as its only turn.
    pub fn new() -> Self {
        Self {
            turns:         vec![ConversationTurn::assistant(GREETING)],
            authenticated: false,
            user:          None,
            mode:          ConversationMode::default(),
        }
    }

    pub fn authenticate(&mut self, name: impl Into<String>, employee_id: impl Into<String>) {
        self.user          = Some((name.into(), employee_id.into()));
        self.authenticated = true;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Clear the conversation back to the greeting. Login survives.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(ConversationTurn::assistant(GREETING));
    }

    pub fn mode(&self) -> ConversationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ConversationMode) {
        self.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_logged_out_with_greeting() {
        let s = ChatSession::new();
        assert!(!s.is_authenticated());
        assert_eq!(s.turns(), &[ConversationTurn::assistant(GREETING)]);
    }

    #[test]
    fn test_turns_append_in_order() {
        let mut s = ChatSession::new();
        s.push(ConversationTurn::user("hi"));
        s.push(ConversationTurn::assistant("hello"));
        let roles: Vec<Role> = s.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn test_reset_keeps_login() {
        let mut s = ChatSession::new();
        s.authenticate("Asha", "E42");
        s.push(ConversationTurn::user("hi"));
        s.reset();
        assert!(s.is_authenticated());
        assert_eq!(s.user_name(), Some("Asha"));
        assert_eq!(s.turns().len(), 1);
    }

    #[test]
    fn test_mode_suffixes() {
        assert_eq!(ConversationMode::Standard.prompt_suffix(), "");
        assert!(ConversationMode::Concise.prompt_suffix().contains("brief"));
        assert!(ConversationMode::Detailed.prompt_suffix().contains("detailed"));
        assert_eq!("CONCISE".parse::<ConversationMode>().unwrap(), ConversationMode::Concise);
    }

    #[test]
    fn test_login_time_format() {
        let r = LoginRecord::now("Asha", "E42");
        assert!(chrono::NaiveDateTime::parse_from_str(&r.login_time, LoginRecord::TIME_FORMAT).is_ok());
    }
}
