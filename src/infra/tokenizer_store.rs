// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Builds, saves and loads the word-level tokenizer that lives in
// the artifact directory as tokenizer.json, and turns questions
// into fixed-length id sequences.
//
// The tokenizer JSON is written by hand in HuggingFace format and
// loaded back with Tokenizer::from_file:
//   normalizer    BertNormalizer (lowercase, clean text, strip accents)
//   pre_tokenizer Whitespace (\w+ | [^\w\s]+)
//   model         WordLevel over the training questions
//
// Special token ids are fixed and dense:
//   [PAD]=0 [UNK]=1 [CLS]=2 [SEP]=3 [MASK]=4, words from 5

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::{
    normalizers::bert::BertNormalizer,
    pre_tokenizers::whitespace::Whitespace,
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer,
    Tokenizer,
};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub const PAD_TOKEN:  &str = "[PAD]";
pub const UNK_TOKEN:  &str = "[UNK]";
pub const CLS_TOKEN:  &str = "[CLS]";
pub const SEP_TOKEN:  &str = "[SEP]";
pub const MASK_TOKEN: &str = "[MASK]";

const SPECIAL_TOKENS: [&str; 5] = [PAD_TOKEN, UNK_TOKEN, CLS_TOKEN, SEP_TOKEN, MASK_TOKEN];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load a previously saved tokenizer
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Build a word-level vocabulary from the training questions,
    /// keeping at most `max_vocab` entries including special tokens,
    /// and write it as tokenizer.json.
    pub fn build_and_save(&self, texts: &[String], max_vocab: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Count pieces with the tokenizer's own front half ─────────
        let normalizer    = bert_normalizer();
        let pre_tokenizer = Whitespace::default();
        let freq = count_pieces(texts, &normalizer, &pre_tokenizer)?;

        // Most frequent first; ties alphabetical so rebuilds are stable
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(max_vocab.saturating_sub(SPECIAL_TOKENS.len()));

        // ── Step 2: Dense vocab, special tokens first ─────────────────────────
        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (word, _) in &words {
            if !vocab.contains_key(word) {
                let id = vocab.len();
                vocab.insert(word.clone(), serde_json::json!(id));
            }
        }
        let vocab_len = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false,
                "lstrip": false, "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": serde_json::to_value(&normalizer)?,
            "pre_tokenizer": serde_json::to_value(&pre_tokenizer)?,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.path();
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!("Tokenizer built with {} tokens, saved to '{}'", vocab_len, tok_path.display());

        self.load()
    }
}

/// Lowercases, cleans control characters, splits CJK characters and
/// strips accents (strip_accents follows lowercase when unset).
fn bert_normalizer() -> BertNormalizer {
    BertNormalizer::new(true, true, None, true)
}

/// Frequency of every piece the saved tokenizer would look up in its vocab.
fn count_pieces(
    texts:         &[String],
    normalizer:    &BertNormalizer,
    pre_tokenizer: &Whitespace,
) -> Result<HashMap<String, usize>> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        let mut normalized = NormalizedString::from(text.as_str());
        normalizer
            .normalize(&mut normalized)
            .map_err(|e| anyhow::anyhow!("Cannot normalise '{text}': {e}"))?;

        let mut pretokenized = PreTokenizedString::from(normalized);
        pre_tokenizer
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| anyhow::anyhow!("Cannot pre-tokenise '{text}': {e}"))?;

        for (piece, _, _) in pretokenized.get_splits(OffsetReferential::Original, OffsetType::Byte) {
            *freq.entry(piece.to_string()).or_insert(0) += 1;
        }
    }
    Ok(freq)
}

// ─── QuestionEncoder ──────────────────────────────────────────────────────────
/// Turns a question into `[CLS] tokens [SEP]`, truncated and
/// padded to exactly `max_seq_len` ids. Truncation drops the
/// trailing tokens silently.
pub struct QuestionEncoder {
    tokenizer:   Tokenizer,
    cls_id:      u32,
    sep_id:      u32,
    pad_id:      u32,
    max_seq_len: usize,
}

impl QuestionEncoder {
    pub fn new(tokenizer: Tokenizer, max_seq_len: usize) -> Result<Self> {
        anyhow::ensure!(max_seq_len >= 2, "max_seq_len must leave room for [CLS] and [SEP]");
        let id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| anyhow::anyhow!("tokenizer has no {token} token"))
        };
        let cls_id = id(CLS_TOKEN)?;
        let sep_id = id(SEP_TOKEN)?;
        let pad_id = id(PAD_TOKEN)?;
        Ok(Self { tokenizer, cls_id, sep_id, pad_id, max_seq_len })
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Returns (input_ids, attention_mask), both `max_seq_len` long.
    pub fn encode(&self, text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let enc = self.tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let body_len = enc.get_ids().len().min(self.max_seq_len - 2);
        if body_len < enc.get_ids().len() {
            tracing::debug!("Truncated question from {} to {} tokens", enc.get_ids().len(), body_len);
        }

        let mut input_ids = Vec::with_capacity(self.max_seq_len);
        input_ids.push(self.cls_id);
        input_ids.extend_from_slice(&enc.get_ids()[..body_len]);
        input_ids.push(self.sep_id);

        let mut attention_mask = vec![1u32; input_ids.len()];
        while input_ids.len() < self.max_seq_len {
            input_ids.push(self.pad_id);
            attention_mask.push(0);
        }

        Ok((input_ids, attention_mask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(texts: &[&str]) -> (tempfile::TempDir, Tokenizer) {
        let dir   = tempfile::tempdir().unwrap();
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let tok   = TokenizerStore::new(dir.path()).build_and_save(&texts, 1000).unwrap();
        (dir, tok)
    }

    #[test]
    fn test_pieces_follow_normalizer_and_pre_tokenizer() {
        let texts = vec!["What is the rate?".to_string(), "12% p.a.".to_string()];
        let freq  = count_pieces(&texts, &bert_normalizer(), &Whitespace::default()).unwrap();
        let mut pieces: Vec<&str> = freq.keys().map(String::as_str).collect();
        pieces.sort_unstable();
        assert_eq!(pieces, vec!["%", ".", "12", "?", "a", "is", "p", "rate", "the", "what"]);
        assert_eq!(freq["."], 2);
    }

    #[test]
    fn test_accented_words_are_not_unknown() {
        let (_dir, tok) = build(&["Café loan fees?"]);
        assert!(tok.token_to_id("cafe").is_some());
        assert!(tok.token_to_id("café").is_none());

        let enc = QuestionEncoder::new(tok, 8).unwrap();
        let (ids, mask) = enc.encode("Café loan fees?").unwrap();
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 1, 0, 0]);
        assert!(!ids.contains(&1), "unexpected [UNK] in {ids:?}");
    }

    #[test]
    fn test_special_token_ids() {
        let (_dir, tok) = build(&["What is the interest rate?"]);
        assert_eq!(tok.token_to_id(PAD_TOKEN), Some(0));
        assert_eq!(tok.token_to_id(CLS_TOKEN), Some(2));
        assert_eq!(tok.token_to_id(SEP_TOKEN), Some(3));
        assert!(tok.token_to_id("interest").is_some());
    }

    #[test]
    fn test_reload_matches() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let built = store.build_and_save(&["How do I apply?".to_string()], 100).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(built.get_vocab_size(true), loaded.get_vocab_size(true));
    }

    #[test]
    fn test_encode_pads_and_wraps() {
        let (_dir, tok) = build(&["What is the interest rate?"]);
        let enc = QuestionEncoder::new(tok, 10).unwrap();
        let (ids, mask) = enc.encode("what is the rate?").unwrap();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids[0], 2);
        assert_eq!(ids[6], 3);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_encode_truncates_silently() {
        let (_dir, tok) = build(&["a b c d e f g h"]);
        let enc = QuestionEncoder::new(tok, 4).unwrap();
        let (ids, mask) = enc.encode("a b c d e f g h").unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(ids[3], 3);
        assert_eq!(mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let (_dir, tok) = build(&["rate"]);
        let enc = QuestionEncoder::new(tok, 4).unwrap();
        let (ids, _) = enc.encode("zebra").unwrap();
        assert_eq!(ids[1], 1);
    }
}
