// ============================================================
// Layer 6 — Pretrained Model Hub
// ============================================================
// Finds the files of a pretrained BERT checkpoint, either in a
// local directory or on the Hugging Face Hub.
//
//   --model bert-base-uncased          → downloaded (and cached)
//   --model ./models/bert-base-uncased → used in place
//
// Files we need:
//   config.json         architecture (required)
//   model.safetensors   weights (required; pickle files are not read)
//   tokenizer.json      preferred tokenizer
//   vocab.txt           fallback when tokenizer.json is absent

use anyhow::{anyhow, bail, Context, Result};
use hf_hub::{
    api::sync::{ApiBuilder, ApiRepo},
    Repo, RepoType,
};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const TOKENIZER_FILE: &str = "tokenizer.json";
const VOCAB_FILE: &str = "vocab.txt";

/// Local paths of everything needed to build the pretrained encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct PretrainedFiles {
    pub config:         PathBuf,
    pub weights:        PathBuf,
    pub tokenizer_json: Option<PathBuf>,
    pub vocab_txt:      Option<PathBuf>,
}

impl PretrainedFiles {
    /// Collect files from a directory laid out like a hub repo.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let required = |name: &str| {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(anyhow!("'{}' has no {}", dir.display(), name))
            }
        };
        let optional = |name: &str| Some(dir.join(name)).filter(|p| p.is_file());

        let files = Self {
            config:         required(CONFIG_FILE)?,
            weights:        required(WEIGHTS_FILE)?,
            tokenizer_json: optional(TOKENIZER_FILE),
            vocab_txt:      optional(VOCAB_FILE),
        };
        files.check_tokenizer()?;
        Ok(files)
    }

    fn check_tokenizer(&self) -> Result<()> {
        if self.tokenizer_json.is_none() && self.vocab_txt.is_none() {
            bail!("Pretrained model has neither {TOKENIZER_FILE} nor {VOCAB_FILE}");
        }
        Ok(())
    }
}

pub struct ModelHub {
    revision:  Option<String>,
    cache_dir: Option<PathBuf>,
}

impl ModelHub {
    pub fn new(revision: Option<String>, cache_dir: Option<PathBuf>) -> Self {
        Self { revision, cache_dir }
    }

    /// Resolve `model` as a local directory first, then as a hub repo id.
    pub fn fetch(&self, model: &str) -> Result<PretrainedFiles> {
        let local = Path::new(model);
        if local.is_dir() {
            tracing::info!("Using local pretrained model at '{}'", local.display());
            return PretrainedFiles::from_dir(local);
        }
        self.download(model)
    }

    fn repo(&self, model_id: &str) -> Result<ApiRepo> {
        let mut builder = ApiBuilder::new().with_progress(true);
        if let Some(dir) = &self.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        if let Ok(token) = std::env::var("HF_TOKEN") {
            builder = builder.with_token(Some(token));
        }
        let api = builder
            .build()
            .map_err(|e| anyhow!("Failed to initialise Hugging Face Hub client: {e}"))?;

        let repo = match &self.revision {
            Some(rev) => Repo::with_revision(model_id.to_string(), RepoType::Model, rev.clone()),
            None      => Repo::model(model_id.to_string()),
        };
        Ok(api.repo(repo))
    }

    fn download(&self, model_id: &str) -> Result<PretrainedFiles> {
        tracing::info!(
            "Fetching '{}' ({}) from the Hugging Face Hub",
            model_id,
            self.revision.as_deref().unwrap_or("main")
        );
        let repo = self.repo(model_id)?;

        let get = |name: &str| {
            repo.get(name)
                .with_context(|| format!("Cannot download '{name}' from '{model_id}'"))
        };

        let config  = get(CONFIG_FILE)?;
        let weights = get(WEIGHTS_FILE).with_context(|| {
            format!("'{model_id}' must provide {WEIGHTS_FILE}; try a revision with a safetensors conversion")
        })?;

        // tokenizer.json is optional; older repos only have vocab.txt
        let tokenizer_json = get(TOKENIZER_FILE).ok();
        let vocab_txt = if tokenizer_json.is_none() { get(VOCAB_FILE).ok() } else { None };

        let files = PretrainedFiles { config, weights, tokenizer_json, vocab_txt };
        files.check_tokenizer()?;
        tracing::debug!("Pretrained files: {:?}", files);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "{}").unwrap();
    }

    #[test]
    fn test_local_dir_with_tokenizer_json() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), WEIGHTS_FILE);
        touch(dir.path(), TOKENIZER_FILE);

        let files = ModelHub::new(None, None)
            .fetch(dir.path().to_str().unwrap())
            .unwrap();
        assert_eq!(files.weights, dir.path().join(WEIGHTS_FILE));
        assert!(files.tokenizer_json.is_some());
        assert!(files.vocab_txt.is_none());
    }

    #[test]
    fn test_local_dir_with_vocab_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), WEIGHTS_FILE);
        touch(dir.path(), VOCAB_FILE);

        let files = PretrainedFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.vocab_txt, Some(dir.path().join(VOCAB_FILE)));
    }

    #[test]
    fn test_local_dir_without_weights_is_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), VOCAB_FILE);
        assert!(PretrainedFiles::from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_local_dir_without_tokenizer_is_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), CONFIG_FILE);
        touch(dir.path(), WEIGHTS_FILE);
        assert!(PretrainedFiles::from_dir(dir.path()).is_err());
    }
}
