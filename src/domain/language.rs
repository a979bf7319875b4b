// ============================================================
// Layer 3 - Language
// ============================================================
// The languages a customer can talk to the bot in. The
// classifier only understands the working language (English);
// everything else is translated on the way in and out.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Hindi,
}

/// The single language the classifier was trained on.
pub const WORKING_LANGUAGE: Language = Language::English;

impl Language {
    /// ISO 639-1 code sent to the translation service
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi   => "hi",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi   => "Hindi",
        }
    }

    pub fn is_working_language(self) -> bool {
        self == WORKING_LANGUAGE
    }

    /// Messaging heuristic: a sender whose profile name contains
    /// "Hindi" is answered in Hindi, everyone else in English.
    /// The profile name is user-editable, so this is a hint only.
    pub fn from_profile_name(profile_name: &str) -> Self {
        if profile_name.contains("Hindi") {
            Language::Hindi
        } else {
            Language::English
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "hindi"   | "hi" => Ok(Language::Hindi),
            other => Err(format!("unsupported language '{other}' (expected English or Hindi)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_name_routing() {
        assert_eq!(Language::from_profile_name("Asha (Hindi)"), Language::Hindi);
        assert_eq!(Language::from_profile_name("Hindi"),        Language::Hindi);
        assert_eq!(Language::from_profile_name("Asha"),         Language::English);
        assert_eq!(Language::from_profile_name(""),             Language::English);
        // Substring match is case-sensitive
        assert_eq!(Language::from_profile_name("hindi"),        Language::English);
    }

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert_eq!("hi".parse::<Language>().unwrap(),      Language::Hindi);
        assert!("French".parse::<Language>().is_err());
    }

    #[test]
    fn test_working_language() {
        assert!(Language::English.is_working_language());
        assert!(!Language::Hindi.is_working_language());
    }
}
