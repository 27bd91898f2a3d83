//! Fixed-length text encoding.
//!
//! [`TextEncoder`] is the seam to the tokenizer provider. [`HfTextEncoder`]
//! backs it with a HuggingFace `tokenizers` tokenizer configured for
//! fixed-length padding and truncation.

use crate::error::{AdapterError, Result};
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// One encoded text row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
}

/// Encodes texts into rows of exactly [`TextEncoder::max_length`] tokens.
pub trait TextEncoder {
    fn max_length(&self) -> usize;

    fn encode_fixed(&self, texts: &[String]) -> Result<Vec<EncodedText>>;
}

/// `tokenizers`-backed encoder padding and truncating to one length.
pub struct HfTextEncoder {
    inner: Tokenizer,
    max_length: usize,
}

impl HfTextEncoder {
    /// Configure `tokenizer` for fixed-length output, keeping its pad token.
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(AdapterError::config("max_length must be positive"));
        }

        let mut padding = tokenizer.get_padding().cloned().unwrap_or_default();
        padding.strategy = PaddingStrategy::Fixed(max_length);
        let mut truncation = tokenizer.get_truncation().cloned().unwrap_or_default();
        truncation.max_length = max_length;

        tokenizer.with_padding(Some(padding));
        tokenizer
            .with_truncation(Some(truncation))
            .map_err(|e| AdapterError::tokenizer(e.to_string()))?;

        Ok(Self {
            inner: tokenizer,
            max_length,
        })
    }

    /// Load `tokenizer.json` from a model directory, or a tokenizer file directly.
    pub fn from_pretrained_path(path: &Path, max_length: usize) -> Result<Self> {
        let file = if path.is_dir() {
            path.join("tokenizer.json")
        } else {
            path.to_path_buf()
        };
        let tokenizer = Tokenizer::from_file(&file).map_err(|e| {
            AdapterError::tokenizer(format!("failed to load {}: {e}", file.display()))
        })?;
        tracing::debug!(path = %file.display(), max_length, "tokenizer loaded");
        Self::new(tokenizer, max_length)
    }

    pub fn padding(&self) -> Option<&PaddingParams> {
        self.inner.get_padding()
    }

    pub fn truncation(&self) -> Option<&TruncationParams> {
        self.inner.get_truncation()
    }
}

impl TextEncoder for HfTextEncoder {
    fn max_length(&self) -> usize {
        self.max_length
    }

    fn encode_fixed(&self, texts: &[String]) -> Result<Vec<EncodedText>> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self
            .inner
            .encode_batch(inputs, true)
            .map_err(|e| AdapterError::tokenizer(e.to_string()))?;
        Ok(encodings
            .into_iter()
            .map(|enc| EncodedText {
                input_ids: enc.get_ids().to_vec(),
                attention_mask: enc.get_attention_mask().to_vec(),
                token_type_ids: enc.get_type_ids().to_vec(),
            })
            .collect())
    }
}
