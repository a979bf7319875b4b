// ============================================================
// Layer 1 - Terminal Chat Surface
// ============================================================
// One configurable chat front-end:
//
//   theme        dark | light         (ANSI colours)
//   persistence  file | spreadsheet | relational   (login store)
//   source       classifier | generative           (who answers)
//   language     English | Hindi
//
// The UI only reads lines and prints; the login gate, commands
// and answering rules live in ChatService. Generic over the
// reader and writer so it can be driven from tests.

use std::io::{BufRead, Write};

use anyhow::Result;
use clap::ValueEnum;

use crate::application::chat_use_case::{ChatCommand, ChatService, LoginOutcome};
use crate::domain::session::{ChatSession, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

struct Palette {
    title:   &'static str,
    user:    &'static str,
    bot:     &'static str,
    warning: &'static str,
}

const RESET: &str = "\x1b[0m";

impl Theme {
    fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                title:   "\x1b[1;38;5;183m",
                user:    "\x1b[38;5;255m",
                bot:     "\x1b[38;5;141m",
                warning: "\x1b[38;5;214m",
            },
            Theme::Light => Palette {
                title:   "\x1b[1;34m",
                user:    "\x1b[30m",
                bot:     "\x1b[34m",
                warning: "\x1b[31m",
            },
        }
    }
}

pub struct ChatUi<R, W> {
    input:   R,
    output:  W,
    palette: Palette,
}

impl<R: BufRead, W: Write> ChatUi<R, W> {
    pub fn new(input: R, output: W, theme: Theme) -> Self {
        Self { input, output, palette: theme.palette() }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the login gate, then the conversation, until /quit or EOF.
    pub fn run(&mut self, service: &ChatService) -> Result<()> {
        let mut session = ChatSession::new();
        writeln!(self.output, "{}Support Assistant{}", self.palette.title, RESET)?;

        // ── Login gate ────────────────────────────────────────────────────────
        while !session.is_authenticated() {
            let Some(name) = self.prompt("Name: ")? else { return Ok(()) };
            let Some(employee_id) = self.prompt("Employee ID: ")? else { return Ok(()) };

            match service.login(&mut session, &name, &employee_id) {
                LoginOutcome::Granted => {}
                LoginOutcome::GrantedWithWarning(warning) => self.warn(&warning)?,
                LoginOutcome::Rejected(reason) => self.warn(&reason)?,
            }
        }
        writeln!(
            self.output,
            "Welcome, {}! Commands: /mode <standard|detailed|concise>, /reset, /quit",
            session.user_name().unwrap_or_default(),
        )?;
        self.print_log(&session)?;

        // ── Conversation ──────────────────────────────────────────────────────
        while let Some(line) = self.prompt("> ")? {
            if line.trim().is_empty() {
                continue;
            }
            match ChatCommand::parse(&line) {
                Ok(ChatCommand::Ask(question)) => {
                    let answer = service.ask(&mut session, &question)?;
                    self.say(&answer)?;
                }
                Ok(ChatCommand::Mode(mode)) => {
                    session.set_mode(mode);
                    writeln!(self.output, "Mode set to {mode:?}.")?;
                }
                Ok(ChatCommand::Reset) => {
                    session.reset();
                    writeln!(self.output, "Conversation cleared.")?;
                    self.print_log(&session)?;
                }
                Ok(ChatCommand::Quit) => break,
                Err(message) => self.warn(&message)?,
            }
        }

        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    /// Print a prompt and read one line. None at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}{}{}", self.palette.user, label, RESET)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}Bot: {}{}", self.palette.bot, text, RESET)?;
        Ok(())
    }

    fn warn(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}{}{}", self.palette.warning, text, RESET)?;
        Ok(())
    }

    fn print_log(&mut self, session: &ChatSession) -> Result<()> {
        for turn in session.turns() {
            match turn.role {
                Role::Assistant => self.say(&turn.content)?,
                Role::User      => writeln!(self.output, "You: {}", turn.content)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::domain::error::{ChatbotError, ChatbotResult};
    use crate::domain::language::Language;
    use crate::domain::session::{ConversationMode, LoginRecord, GREETING};
    use crate::domain::traits::{LoginStore, QuestionAnswerer};

    struct ModeAnswerer;

    impl QuestionAnswerer for ModeAnswerer {
        fn answer(&self, question: &str, _language: Language, mode: ConversationMode) -> String {
            format!("[{mode:?}] {question}")
        }
    }

    struct NullStore;

    impl LoginStore for NullStore {
        fn record(&self, _: &LoginRecord) -> ChatbotResult<()> {
            Ok(())
        }

        fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>> {
            Ok(Vec::new())
        }
    }

    struct BrokenStore;

    impl LoginStore for BrokenStore {
        fn record(&self, _: &LoginRecord) -> ChatbotResult<()> {
            Err(ChatbotError::ExternalStore("read-only".into()))
        }

        fn load_all(&self) -> ChatbotResult<Vec<LoginRecord>> {
            Ok(Vec::new())
        }
    }

    fn run(script: &str, store: Box<dyn LoginStore>, theme: Theme) -> String {
        let service = ChatService::new(Box::new(ModeAnswerer), store, Language::English);
        let mut ui  = ChatUi::new(Cursor::new(script.to_string()), Vec::new(), theme);
        ui.run(&service).unwrap();
        String::from_utf8(ui.into_output()).unwrap()
    }

    #[test]
    fn test_full_conversation() {
        let out = run(
            "\n\nAsha\nE42\nwhat is the rate?\n/mode concise\nhow to apply?\n/reset\n/quit\nignored\n",
            Box::new(NullStore),
            Theme::Dark,
        );
        assert!(out.contains("Please enter both your name and employee ID."));
        assert!(out.contains("Welcome, Asha!"));
        assert!(out.contains("Bot: [Standard] what is the rate?"));
        assert!(out.contains("Mode set to Concise."));
        assert!(out.contains("Bot: [Concise] how to apply?"));
        assert!(out.contains("Conversation cleared."));
        assert_eq!(out.matches(GREETING).count(), 2);
        assert!(out.ends_with("Goodbye!\n"));
        assert!(!out.contains("ignored"));
    }

    #[test]
    fn test_store_failure_warns_and_continues() {
        let out = run("Asha\nE42\nrate?\n", Box::new(BrokenStore), Theme::Light);
        assert!(out.contains("Your login could not be recorded"));
        assert!(out.contains("Bot: [Standard] rate?"));
    }

    #[test]
    fn test_unknown_command_is_reported() {
        let out = run("Asha\nE42\n/dance\n/quit\n", Box::new(NullStore), Theme::Dark);
        assert!(out.contains("unknown command '/dance'"));
    }

    #[test]
    fn test_eof_during_login() {
        let out = run("Asha\n", Box::new(NullStore), Theme::Dark);
        assert!(!out.contains("Welcome"));
    }

    #[test]
    fn test_themes_use_different_colours() {
        let dark  = run("Asha\nE42\n/quit\n", Box::new(NullStore), Theme::Dark);
        let light = run("Asha\nE42\n/quit\n", Box::new(NullStore), Theme::Light);
        assert!(dark.contains("\x1b[38;5;141m"));
        assert!(light.contains("\x1b[34m"));
        assert_ne!(dark, light);
    }
}
