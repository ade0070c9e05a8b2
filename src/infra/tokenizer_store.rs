// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Resolves the WordPiece tokenizer that belongs to the pretrained
// checkpoint and keeps a copy next to our own checkpoints.
//
// Hub repositories ship the vocabulary in one of two forms:
//   - tokenizer.json  → loaded as-is
//   - vocab.txt only  → older uploads; we write the equivalent
//                       tokenizer JSON ourselves and load that
//
// Writing the JSON by hand (rather than assembling the pipeline
// through the tokenizers builder API) keeps us independent of
// the builder signatures, which move between tokenizers releases.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

const TOKENIZER_FILE: &str = "tokenizer.json";

const SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load the tokenizer saved by a previous training run
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path).map_err(|e| {
            anyhow!("Cannot load tokenizer from '{}': {}. Have you run 'train' first?", path.display(), e)
        })
    }

    /// Persist `tokenizer` into the store directory.
    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow!("Cannot write tokenizer to '{}': {e}", path.display()))?;
        tracing::debug!("Saved tokenizer to '{}'", path.display());
        Ok(())
    }

    /// Load a pretrained tokenizer from whichever file the model ships,
    /// then keep a copy in the store.
    pub fn import(&self, tokenizer_json: Option<&Path>, vocab_txt: Option<&Path>) -> Result<Tokenizer> {
        let tokenizer = match (tokenizer_json, vocab_txt) {
            (Some(json), _) => {
                tracing::info!("Loading pretrained tokenizer from '{}'", json.display());
                Tokenizer::from_file(json)
                    .map_err(|e| anyhow!("Cannot load tokenizer '{}': {e}", json.display()))?
            }
            (None, Some(vocab)) => {
                tracing::info!("Building WordPiece tokenizer from '{}'", vocab.display());
                self.build_from_vocab(vocab)?
            }
            (None, None) => {
                return Err(anyhow!("Pretrained model provides neither tokenizer.json nor vocab.txt"));
            }
        };

        self.save(&tokenizer)?;
        Ok(tokenizer)
    }

    /// Build an uncased BERT WordPiece tokenizer from a vocab.txt
    /// (one token per line, line number = id) and write it to the store.
    pub fn build_from_vocab(&self, vocab_path: &Path) -> Result<Tokenizer> {
        let text = std::fs::read_to_string(vocab_path)
            .with_context(|| format!("Cannot read vocabulary '{}'", vocab_path.display()))?;

        // ── Step 1: token → id from line order ────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (id, line) in text.lines().enumerate() {
            let token = line.trim_end_matches('\r');
            if !token.is_empty() && !vocab.contains_key(token) {
                vocab.insert(token.to_string(), serde_json::json!(id));
            }
        }

        let id_of = |tok: &str| vocab.get(tok).and_then(|v| v.as_u64());
        let cls   = id_of("[CLS]").ok_or_else(|| anyhow!("vocab.txt has no [CLS] token"))?;
        let sep   = id_of("[SEP]").ok_or_else(|| anyhow!("vocab.txt has no [SEP] token"))?;
        if id_of("[UNK]").is_none() {
            return Err(anyhow!("vocab.txt has no [UNK] token"));
        }

        // ── Step 2: special tokens the vocabulary actually contains ───────────
        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .filter_map(|tok| {
                id_of(tok).map(|id| {
                    serde_json::json!({
                        "id": id, "content": tok, "single_word": false, "lstrip": false,
                        "rstrip": false, "normalized": false, "special": true
                    })
                })
            })
            .collect();

        // ── Step 3: tokenizer JSON in Hugging Face format ─────────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "BertPreTokenizer" },
            "post_processor": {
                "type": "BertProcessing",
                "sep": ["[SEP]", sep],
                "cls": ["[CLS]", cls]
            },
            "decoder": { "type": "WordPiece", "prefix": "##", "cleanup": true },
            "model": {
                "type": "WordPiece",
                "unk_token": "[UNK]",
                "continuing_subword_prefix": "##",
                "max_input_chars_per_word": 100,
                "vocab": vocab
            }
        });

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::info!("WordPiece tokenizer with {} entries written to '{}'", vocab.len(), path.display());

        Tokenizer::from_file(&path).map_err(|e| anyhow!("Cannot reload tokenizer: {e}"))
    }
}
