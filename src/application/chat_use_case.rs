// ============================================================
// Layer 2 - ChatUseCase
// ============================================================
// The workflow behind the interactive chat surface, kept free of
// any terminal I/O so every front-end drives the same rules:
//
//   login  - name and employee id must both be non-empty; the
//            record goes to the configured LoginStore, and a
//            store failure only produces a warning
//   ask    - append the question, get an answer from the
//            configured source, append the answer
//   /mode  - switch Standard / Detailed / Concise
//   /reset - clear the log back to the greeting
//   /quit  - end the conversation
//
// State lives in the ChatSession the caller passes in.

use anyhow::{bail, Result};

use crate::domain::{
    language::Language,
    session::{ChatSession, ConversationMode, ConversationTurn, LoginRecord},
    traits::{LoginStore, QuestionAnswerer},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Granted,
    /// Access granted, but the login record could not be saved.
    GrantedWithWarning(String),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Mode(ConversationMode),
    Reset,
    Quit,
}

impl ChatCommand {
    /// Parse one line of user input. Anything not starting with
    /// `/` is a question.
    pub fn parse(line: &str) -> Result<ChatCommand, String> {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Ok(ChatCommand::Ask(line.to_string()));
        };

        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or("") {
            "mode" => {
                let arg = parts.next().ok_or("usage: /mode <standard|detailed|concise>")?;
                Ok(ChatCommand::Mode(arg.parse()?))
            }
            "reset" => Ok(ChatCommand::Reset),
            "quit" | "exit" => Ok(ChatCommand::Quit),
            other => Err(format!("unknown command '/{other}' (try /mode, /reset or /quit)")),
        }
    }
}

pub struct ChatService {
    answerer: Box<dyn QuestionAnswerer>,
    store:    Box<dyn LoginStore>,
    language: Language,
}

impl ChatService {
    pub fn new(answerer: Box<dyn QuestionAnswerer>, store: Box<dyn LoginStore>, language: Language) -> Self {
        Self { answerer, store, language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Presence-only login. Nothing is verified against a directory.
    pub fn login(&self, session: &mut ChatSession, name: &str, employee_id: &str) -> LoginOutcome {
        let (name, employee_id) = (name.trim(), employee_id.trim());
        if name.is_empty() || employee_id.is_empty() {
            return LoginOutcome::Rejected("Please enter both your name and employee ID.".to_string());
        }

        session.authenticate(name, employee_id);
        tracing::info!("User '{}' logged in", name);

        match self.store.record(&LoginRecord::now(name, employee_id)) {
            Ok(()) => LoginOutcome::Granted,
            Err(e) => {
                tracing::warn!("Could not save login record: {e}");
                LoginOutcome::GrantedWithWarning(format!("Your login could not be recorded ({e})."))
            }
        }
    }

    /// Answer one question and log both turns.
    pub fn ask(&self, session: &mut ChatSession, question: &str) -> Result<String> {
        if !session.is_authenticated() {
            bail!("log in before asking questions");
        }
        session.push(ConversationTurn::user(question));
        let answer = self.answerer.answer(question, self.language, session.mode());
        session.push(ConversationTurn::assistant(answer.clone()));
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::domain::error::{ChatbotError, ChatbotResult};
    use crate::domain::session::{Role, GREETING};

    struct EchoAnswerer;

    impl QuestionAnswerer for EchoAnswerer {
        fn answer(&self, question: &str, _language: Language, mode: ConversationMode) -> String {
            format!("{question}{}", mode.prompt_suffix())
        }
    }

    #[derive(Default, Clone)]
    struct MemoryStore {
        records: Arc<Mutex<Vec<LoginRecord>>>,
    }

    impl LoginStore for MemoryStore {
        fn record(&self, record: &LoginRecord) -> ChatbotResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    struct BrokenStore;

    impl LoginStore for BrokenStore {
        fn record(&self, _: &LoginRecord) -> ChatbotResult<()> {
            Err(ChatbotError::ExternalStore("disk full".into()))
        }

        fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>> {
            Ok(Vec::new())
        }
    }

    fn service(store: Box<dyn LoginStore>) -> ChatService {
        ChatService::new(Box::new(EchoAnswerer), store, Language::English)
    }

    #[test]
    fn test_login_requires_name_and_id() {
        let svc = service(Box::new(MemoryStore::default()));
        let mut session = ChatSession::new();
        assert!(matches!(svc.login(&mut session, "Asha", "  "), LoginOutcome::Rejected(_)));
        assert!(matches!(svc.login(&mut session, "", "E42"), LoginOutcome::Rejected(_)));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_login_records_presence() {
        let store = MemoryStore::default();
        let svc   = service(Box::new(store.clone()));
        let mut session = ChatSession::new();

        assert_eq!(svc.login(&mut session, " Asha ", "E42"), LoginOutcome::Granted);
        assert!(session.is_authenticated());

        let saved = store.load_all().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Asha");
        assert_eq!(saved[0].employee_id, "E42");
    }

    #[test]
    fn test_store_failure_still_grants_access() {
        let svc = service(Box::new(BrokenStore));
        let mut session = ChatSession::new();
        assert!(matches!(svc.login(&mut session, "Asha", "E42"), LoginOutcome::GrantedWithWarning(_)));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_ask_requires_login() {
        let svc = service(Box::new(MemoryStore::default()));
        let mut session = ChatSession::new();
        assert!(svc.ask(&mut session, "hi").is_err());
        assert_eq!(session.turns().len(), 1);
    }

    #[test]
    fn test_ask_logs_turns_and_applies_mode() {
        let svc = service(Box::new(MemoryStore::default()));
        let mut session = ChatSession::new();
        svc.login(&mut session, "Asha", "E42");
        session.set_mode(ConversationMode::Concise);

        let answer = svc.ask(&mut session, "rate?").unwrap();
        assert_eq!(answer, "rate? Please provide a very brief and to-the-point answer.");

        let roles: Vec<Role> = session.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);

        session.reset();
        assert_eq!(session.turns(), &[ConversationTurn::assistant(GREETING)]);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(ChatCommand::parse("  what is the rate? "), Ok(ChatCommand::Ask("what is the rate?".into())));
        assert_eq!(ChatCommand::parse("/mode detailed"), Ok(ChatCommand::Mode(ConversationMode::Detailed)));
        assert_eq!(ChatCommand::parse("/reset"), Ok(ChatCommand::Reset));
        assert_eq!(ChatCommand::parse("/quit"), Ok(ChatCommand::Quit));
        assert!(ChatCommand::parse("/mode").is_err());
        assert!(ChatCommand::parse("/mode loud").is_err());
        assert!(ChatCommand::parse("/dance").is_err());
    }
}
