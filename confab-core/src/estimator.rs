//! Token cost estimation under the model's tokenizer.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};
use tracing::debug;

/// How many tokenizer families to keep alive at once. Model switches within
/// a session cycle through very few encodings.
const ENCODER_CACHE_SIZE: usize = 4;

/// Estimates token counts with the BPE family the target model expects.
///
/// Encoders are expensive to construct, so they are cached per model name;
/// estimation itself is cheap enough to run per-turn per-request.
pub struct TokenEstimator {
    encoders: Mutex<LruCache<String, Arc<CoreBPE>>>,
}

impl TokenEstimator {
    pub fn new() -> Self {
        let size = NonZeroUsize::new(ENCODER_CACHE_SIZE).expect("cache size is nonzero");
        Self {
            encoders: Mutex::new(LruCache::new(size)),
        }
    }

    /// Estimated token count of `text` under `model`'s tokenizer.
    ///
    /// Deterministic and total: unknown models fall back to the `cl100k_base`
    /// encoding, and an empty string costs zero.
    pub fn estimate(&self, model: &str, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.encoder_for(model) {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            // Tokenizer data unavailable: coarse ~4 chars per token.
            None => text.chars().count().div_ceil(4),
        }
    }

    fn encoder_for(&self, model: &str) -> Option<Arc<CoreBPE>> {
        let mut cache = self
            .encoders
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(bpe) = cache.get(model) {
            return Some(Arc::clone(bpe));
        }

        let bpe = get_bpe_from_model(model)
            .or_else(|err| {
                debug!(model, %err, "no tokenizer for model, using cl100k_base");
                cl100k_base()
            })
            .ok()?;
        let bpe = Arc::new(bpe);
        cache.put(model.to_string(), Arc::clone(&bpe));
        Some(bpe)
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}
