// ============================================================
// Layer 4 — Pair Encoder
// ============================================================
// Turns a (question, answer) pair into fixed-length token ids.
//
// Sequence format (single segment, token type 0 everywhere):
//
//   [CLS] question tokens [SEP] answer tokens [SEP] [PAD] [PAD] ...
//   │◄──────────────────── max_length ─────────────────────────►│
//
// Long pairs are cut from the END of the content so the question
// always survives; the closing [SEP] is re-attached after the cut.
// Short pairs are right-padded with [PAD] and masked out.

use anyhow::{anyhow, bail, Result};
use tokenizers::Tokenizer;

use crate::data::dataset::ClassifySample;
use crate::domain::record::LabelledPair;

/// Default sequence length used by the reference run
pub const DEFAULT_MAX_LENGTH: usize = 25;

/// Ids of the special tokens the encoder inserts itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialIds {
    pub cls: u32,
    pub sep: u32,
    pub pad: u32,
}

impl SpecialIds {
    /// Look the ids up in the tokenizer's vocabulary.
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Result<Self> {
        let lookup = |tok: &str| {
            tokenizer
                .token_to_id(tok)
                .ok_or_else(|| anyhow!("Tokenizer vocabulary has no '{tok}' token"))
        };
        Ok(Self {
            cls: lookup("[CLS]")?,
            sep: lookup("[SEP]")?,
            pad: lookup("[PAD]")?,
        })
    }
}

/// Build (input_ids, attention_mask) from already-tokenised halves.
pub fn assemble(
    question_ids: &[u32],
    answer_ids:   &[u32],
    special:      SpecialIds,
    max_length:   usize,
) -> (Vec<u32>, Vec<u32>) {
    // Room left after [CLS] and the closing [SEP]
    let budget = max_length.saturating_sub(2);

    let mut content: Vec<u32> = Vec::with_capacity(question_ids.len() + answer_ids.len() + 1);
    content.extend_from_slice(question_ids);
    content.push(special.sep);
    content.extend_from_slice(answer_ids);
    content.truncate(budget);

    let mut input_ids = Vec::with_capacity(max_length);
    input_ids.push(special.cls);
    input_ids.extend_from_slice(&content);
    input_ids.push(special.sep);

    let mut attention_mask = vec![1u32; input_ids.len()];
    input_ids.resize(max_length, special.pad);
    attention_mask.resize(max_length, 0);

    (input_ids, attention_mask)
}

pub struct PairEncoder<'a> {
    tokenizer:  &'a Tokenizer,
    special:    SpecialIds,
    max_length: usize,
}

impl<'a> PairEncoder<'a> {
    pub fn new(tokenizer: &'a Tokenizer, max_length: usize) -> Result<Self> {
        if max_length < 3 {
            bail!("max_length must leave room for [CLS] and two [SEP] tokens (got {max_length})");
        }
        let special = SpecialIds::from_tokenizer(tokenizer)?;
        Ok(Self { tokenizer, special, max_length })
    }

    fn token_ids(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    /// Encode a single pair into (input_ids, attention_mask).
    pub fn encode(&self, question: &str, answer: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let q = self.token_ids(question)?;
        let a = self.token_ids(answer)?;
        Ok(assemble(&q, &a, self.special, self.max_length))
    }

    /// Encode labelled pairs into training samples.
    pub fn encode_all(&self, pairs: &[LabelledPair]) -> Result<Vec<ClassifySample>> {
        let mut truncated = 0usize;
        let mut samples   = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let (input_ids, attention_mask) = self.encode(&pair.question, &pair.answer)?;
            if attention_mask.iter().all(|&m| m == 1) {
                truncated += 1;
            }
            samples.push(ClassifySample { input_ids, attention_mask, label: pair.label });
        }

        tracing::debug!(
            "Encoded {} pairs, {} filled or exceeded max_length={}",
            samples.len(),
            truncated,
            self.max_length
        );
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECIAL: SpecialIds = SpecialIds { cls: 101, sep: 102, pad: 0 };

    #[test]
    fn test_short_pair_is_padded() {
        let (ids, mask) = assemble(&[7, 8], &[9], SPECIAL, 8);
        assert_eq!(ids, vec![101, 7, 8, 102, 9, 102, 0, 0]);
        assert_eq!(mask, vec![1, 1, 1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_long_pair_keeps_closing_sep() {
        let question: Vec<u32> = (1..=10).collect();
        let (ids, mask) = assemble(&question, &[50, 51], SPECIAL, 6);
        assert_eq!(ids, vec![101, 1, 2, 3, 4, 102]);
        assert!(mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_exact_fit() {
        let (ids, mask) = assemble(&[5], &[6], SPECIAL, 5);
        assert_eq!(ids, vec![101, 5, 102, 6, 102]);
        assert_eq!(mask.iter().sum::<u32>(), 5);
    }

    #[test]
    fn test_empty_answer() {
        let (ids, _) = assemble(&[5], &[], SPECIAL, 5);
        assert_eq!(ids, vec![101, 5, 102, 102, 0]);
    }

    #[test]
    fn test_encoder_with_vocab_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let vocab = "[PAD]\n[UNK]\n[CLS]\n[SEP]\n[MASK]\nare\nyou\nhungry\n?\ni\nate\n.\n";
        std::fs::write(dir.path().join("vocab.txt"), vocab).unwrap();
        let tokenizer = crate::infra::tokenizer_store::TokenizerStore::new(dir.path())
            .build_from_vocab(&dir.path().join("vocab.txt"))
            .unwrap();

        let encoder     = PairEncoder::new(&tokenizer, 12).unwrap();
        let (ids, mask) = encoder.encode("Are you hungry?", "I ate.").unwrap();
        // [CLS] are you hungry ? [SEP] i ate . [SEP] [PAD] [PAD]
        assert_eq!(ids, vec![2, 5, 6, 7, 8, 3, 9, 10, 11, 3, 0, 0]);
        assert_eq!(mask.iter().sum::<u32>(), 10);
    }

    #[test]
    fn test_rejects_tiny_max_length() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vocab.txt"), "[PAD]\n[UNK]\n[CLS]\n[SEP]\n").unwrap();
        let tokenizer = crate::infra::tokenizer_store::TokenizerStore::new(dir.path())
            .build_from_vocab(&dir.path().join("vocab.txt"))
            .unwrap();
        assert!(PairEncoder::new(&tokenizer, 2).is_err());
    }
}
