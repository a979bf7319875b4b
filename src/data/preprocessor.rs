// ============================================================
// Layer 4 - Question Normaliser
// ============================================================
// Cleans a question before it is tokenised, both at training
// time and at inference time, so the tokenizer sees the same
// shape of text in both places.
//
// Steps:
//   1. Map tabs, newlines, non-breaking and zero-width spaces
//      and other control characters to a plain space
//   2. Collapse runs of spaces into one
//   3. Trim both ends
//
// Lowercasing is left to the tokenizer's normaliser.

#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true;

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() || c.is_whitespace() => ' ',
                c => c,
            };

            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // At most one trailing space can be left over
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}
