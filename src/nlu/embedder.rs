//! # Sentence Embedder
//!
//! The [`Embedder`] wraps **all-MiniLM-L6-v2**
//! (`sentence-transformers/all-MiniLM-L6-v2`), a small BERT trained for
//! sentence similarity. It maps text to a 384-dimensional L2-normalized
//! vector; texts with similar meaning land close together, which is what
//! the intent classifier relies on.
//!
//! ## Pipeline
//!
//! ```text
//! Text → Tokenizer → Token IDs → BERT Forward Pass → Mean Pooling → L2 Normalize
//!                                                         ↓
//!                                                   Vec<f32> (384-dim)
//! ```
//!
//! Mean pooling averages token vectors weighted by the attention mask,
//! which matches how the sentence-transformers export of this model is
//! meant to be used. L2 normalization makes cosine similarity a plain
//! dot product.
//!
//! ## Loading
//!
//! Weights and tokenizer come from the HuggingFace Hub on first run
//! (~90 MB) and are cached in `~/.cache/huggingface/`. Weights prefer
//! `model.safetensors` with a `pytorch_model.bin` fallback. Inference
//! runs on CPU; a BERT of this size does not need more.
//!
//! ## The [`Embed`] trait
//!
//! Everything downstream of the embedder (classifier, pipeline,
//! orchestrator) is generic over [`Embed`], so tests drive the whole
//! query path with a canned stub instead of a loaded model.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert;
use hf_hub::api::sync::Api;
use tokenizers::Tokenizer;

/// HuggingFace Hub repository the model is pulled from.
const MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Maps text to a fixed-length L2-normalized embedding vector.
///
/// Implemented by the real [`Embedder`] and, in tests, by a stub with
/// canned vectors. Implementations must be deterministic: the same text
/// always produces the same vector.
pub trait Embed {
    /// Embeds a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds several texts. The default loops over [`Embed::embed`];
    /// the model-backed implementation overrides this with a single
    /// batched forward pass.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// all-MiniLM-L6-v2 embedder backed by candle.
///
/// Load once via [`Embedder::load()`], then share behind an `Arc`; the
/// struct is immutable after construction and safe to use from any
/// thread. A single [`embed()`](Embed::embed) call is one forward pass
/// (a few milliseconds on CPU).
pub struct Embedder {
    /// Candle `BertModel` with the MiniLM weights.
    model: bert::BertModel,
    /// WordPiece tokenizer shipped with the model.
    tokenizer: Tokenizer,
    /// Execution device (CPU).
    device: Device,
}

impl Embedder {
    /// Downloads (first run) and loads the model from the HuggingFace Hub.
    ///
    /// This does heavy I/O and allocation, so callers run it inside
    /// `tokio::task::spawn_blocking` rather than on the async runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the Hub is unreachable, a model file is
    /// missing or corrupt, or the weights fail to load.
    pub fn load() -> Result<Self> {
        let device = Device::Cpu;

        tracing::info!(repo = MODEL_REPO, "Loading sentence embedder from HuggingFace Hub...");
        let api = Api::new().context("Failed to create HF Hub API")?;
        let repo = api.model(MODEL_REPO.to_string());

        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer.json")?;
        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| anyhow::anyhow!("{}", e))?;

        let config_path = repo
            .get("config.json")
            .context("Failed to download config.json")?;
        let config_str = std::fs::read_to_string(&config_path)?;
        let config: bert::Config =
            serde_json::from_str(&config_str).context("Failed to parse model config")?;

        // Prefer safetensors (fast, safe) over pytorch_model.bin (pickle)
        let vb = match repo.get("model.safetensors") {
            Ok(safetensors_path) => unsafe {
                VarBuilder::from_mmaped_safetensors(&[safetensors_path], DType::F32, &device)
                    .context("Failed to load safetensors weights")?
            },
            Err(_) => {
                tracing::info!("model.safetensors not available, falling back to pytorch_model.bin...");
                let weights_path = repo
                    .get("pytorch_model.bin")
                    .context("Failed to download pytorch_model.bin")?;
                VarBuilder::from_pth(&weights_path, DType::F32, &device)
                    .context("Failed to load pytorch weights")?
            }
        };

        let model = bert::BertModel::load(vb, &config).context("Failed to load BERT model")?;

        tracing::info!("Sentence embedder loaded on {:?}", device);
        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Mean-pools token vectors over the attention mask and L2-normalizes.
    ///
    /// `output` has shape `[batch, seq_len, hidden]`; the result keeps
    /// `[batch, hidden]`.
    fn pool_and_normalize(&self, output: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .to_dtype(DType::F32)?
            .broadcast_as(output.shape())?;

        // Zero out padding tokens, then average over the real ones
        let masked = (output * mask_expanded.clone())?;
        let summed = masked.sum(1)?;
        let mask_sum = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = (summed / mask_sum)?;

        // L2 normalize so cosine_similarity(a, b) reduces to dot(a, b)
        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        Ok(pooled.broadcast_div(&norm)?)
    }
}

impl Embed for Embedder {
    /// Embeds a single text → 384-dim normalized vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenizer error: {}", e))?;

        let ids = encoding.get_ids();
        let attention_mask_vec: Vec<u32> = encoding.get_attention_mask().to_vec();
        // Single segment, no sentence pairs
        let token_type_ids_vec: Vec<u32> = vec![0u32; ids.len()];

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(&token_type_ids_vec[..], &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(&attention_mask_vec[..], &self.device)?.unsqueeze(0)?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let normalized = self.pool_and_normalize(&output, &attention_mask)?;
        let embedding: Vec<f32> = normalized.squeeze(0)?.to_vec1()?;
        Ok(embedding)
    }

    /// Embeds several texts in one forward pass.
    ///
    /// Shorter texts are zero-padded to the longest in the batch; the
    /// attention mask keeps padding out of the pooled result. Used at
    /// startup to embed the whole example corpus at once.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        // A lone text needs no padding; take the simple path
        if texts.len() == 1 {
            return Ok(vec![self.embed(&texts[0])?]);
        }

        let encodings: Vec<_> = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenizer error: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = encodings.len();

        let mut all_ids = vec![0u32; batch_size * max_len];
        let all_type_ids = vec![0u32; batch_size * max_len];
        let mut all_mask = vec![0u32; batch_size * max_len];

        for (i, enc) in encodings.iter().enumerate() {
            let ids = enc.get_ids();
            let mask = enc.get_attention_mask();
            let offset = i * max_len;
            for (j, &id) in ids.iter().enumerate() {
                all_ids[offset + j] = id;
                all_mask[offset + j] = mask[j];
            }
        }

        let input_ids = Tensor::from_vec(all_ids, (batch_size, max_len), &self.device)?;
        let token_type_ids = Tensor::from_vec(all_type_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(all_mask, (batch_size, max_len), &self.device)?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let normalized = self.pool_and_normalize(&output, &attention_mask)?;

        let mut results = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let emb: Vec<f32> = normalized.get(i)?.to_vec1()?;
            results.push(emb);
        }

        Ok(results)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic stand-in for the model, shared by the classifier,
    //! pipeline, and orchestrator tests.

    use std::collections::HashMap;

    use anyhow::{bail, Result};

    use super::Embed;

    /// Embedder stub returning canned vectors for exact texts.
    ///
    /// Unknown texts are an error rather than a default vector: a test
    /// that embeds something unexpected should fail loudly.
    pub struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
    }

    impl StubEmbedder {
        pub fn new(entries: &[(&str, &[f32])]) -> Self {
            let vectors = entries
                .iter()
                .map(|(text, vec)| (text.to_string(), vec.to_vec()))
                .collect();
            Self { vectors }
        }
    }

    impl Embed for StubEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            match self.vectors.get(text) {
                Some(v) => Ok(v.clone()),
                None => bail!("StubEmbedder has no vector for {:?}", text),
            }
        }
    }
}
