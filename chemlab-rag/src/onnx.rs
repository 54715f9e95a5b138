//! Local sentence embeddings with `all-MiniLM-L6-v2` on ONNX Runtime.
//!
//! Only available with the `onnx` feature. The model and tokenizer are
//! fetched from Hugging Face into a model directory on first use and loaded
//! from there afterwards. Token states are mean-pooled over the attention
//! mask and L2-normalised, so cosine similarity matches the
//! sentence-transformers model.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "ONNX";

/// The sentence-transformers model loaded by default.
pub const DEFAULT_ONNX_MODEL: &str = "all-MiniLM-L6-v2";

const DIMENSIONS: usize = 384;
const MAX_LENGTH: usize = 256;
const BATCH_SIZE: usize = 32;
const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

fn onnx_error(message: impl Into<String>) -> RagError {
    RagError::Embedding { provider: PROVIDER.to_string(), message: message.into() }
}

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

/// An in-process [`EmbeddingProvider`] running MiniLM through `ort`.
///
/// Inference runs on the blocking thread pool. One session is shared by all
/// clones and calls are serialised on it.
///
/// ```rust,ignore
/// use chemlab_rag::OnnxEmbeddingProvider;
///
/// let provider = OnnxEmbeddingProvider::load("models/all-MiniLM-L6-v2").await?;
/// let v = provider.embed("Zn + HCl").await?;
/// assert_eq!(v.len(), 384);
/// ```
#[derive(Clone)]
pub struct OnnxEmbeddingProvider {
    model: Arc<OnnxModel>,
}

impl std::fmt::Debug for OnnxEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingProvider").field("dimensions", &DIMENSIONS).finish()
    }
}

impl OnnxEmbeddingProvider {
    /// Load `all-MiniLM-L6-v2` from `model_dir`, downloading missing files first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] when a download fails or the files
    /// cannot be loaded, and [`RagError::Io`] when the directory is unusable.
    pub async fn load(model_dir: impl Into<PathBuf>) -> Result<Self> {
        let model_dir = model_dir.into();
        tokio::fs::create_dir_all(&model_dir).await?;

        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        fetch_if_missing(&model_path, &format!("onnx/{MODEL_FILE}")).await?;
        fetch_if_missing(&tokenizer_path, TOKENIZER_FILE).await?;

        tokio::task::spawn_blocking(move || Self::from_files(&model_path, &tokenizer_path))
            .await
            .map_err(|e| onnx_error(format!("model loading task failed: {e}")))?
    }

    /// Load an already downloaded model and tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if either file is missing or invalid.
    pub fn from_files(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        for path in [model_path, tokenizer_path] {
            if !path.is_file() {
                return Err(onnx_error(format!("{} not found", path.display())));
            }
        }

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| onnx_error(format!("failed to load tokenizer: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..PaddingParams::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: MAX_LENGTH, ..TruncationParams::default() }))
            .map_err(|e| onnx_error(format!("failed to configure truncation: {e}")))?;

        let threads = std::thread::available_parallelism().map_or(1, |n| n.get().min(4));
        let session = Session::builder()
            .map_err(|e| onnx_error(format!("failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| onnx_error(format!("failed to set optimization level: {e}")))?
            .with_intra_threads(threads)
            .map_err(|e| onnx_error(format!("failed to set threads: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| onnx_error(format!("failed to load model: {e}")))?;

        info!(model = %model_path.display(), threads, "ONNX embedder ready");
        Ok(Self { model: Arc::new(OnnxModel { session: Mutex::new(session), tokenizer }) })
    }
}

async fn fetch_if_missing(path: &Path, remote: &str) -> Result<()> {
    if tokio::fs::try_exists(path).await? {
        return Ok(());
    }
    let url = format!("https://huggingface.co/sentence-transformers/{DEFAULT_ONNX_MODEL}/resolve/main/{remote}");
    info!(%url, "downloading embedding model file");

    let response = reqwest::get(&url).await.map_err(|e| onnx_error(format!("download of {url} failed: {e}")))?;
    if !response.status().is_success() {
        return Err(onnx_error(format!("download of {url} failed: HTTP {}", response.status())));
    }
    let bytes = response.bytes().await.map_err(|e| onnx_error(format!("download of {url} failed: {e}")))?;

    let tmp = path.with_extension("part");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    info!(path = %path.display(), bytes = bytes.len(), "saved embedding model file");
    Ok(())
}

impl OnnxModel {
    fn embed_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            embeddings.extend(self.embed_batch(batch)?);
        }
        Ok(embeddings)
    }

    fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(batch.to_vec(), true)
            .map_err(|e| onnx_error(format!("tokenization failed: {e}")))?;

        let rows = encodings.len();
        let seq_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        if rows == 0 || seq_len == 0 {
            return Ok(vec![vec![0.0; DIMENSIONS]; rows]);
        }

        let mut ids = Vec::with_capacity(rows * seq_len);
        let mut mask = Vec::with_capacity(rows * seq_len);
        let mut type_ids = Vec::with_capacity(rows * seq_len);
        for encoding in &encodings {
            for i in 0..seq_len {
                ids.push(i64::from(encoding.get_ids().get(i).copied().unwrap_or(0)));
                mask.push(i64::from(encoding.get_attention_mask().get(i).copied().unwrap_or(0)));
                type_ids.push(i64::from(encoding.get_type_ids().get(i).copied().unwrap_or(0)));
            }
        }

        let tensor = |data: Vec<i64>| {
            Tensor::from_array((vec![rows, seq_len], data.into_boxed_slice()))
                .map_err(|e| onnx_error(format!("failed to build input tensor: {e}")))
        };
        let inputs = vec![
            ("input_ids", tensor(ids)?.into_dyn()),
            ("attention_mask", tensor(mask.clone())?.into_dyn()),
            ("token_type_ids", tensor(type_ids)?.into_dyn()),
        ];

        let mut session = self.session.lock().map_err(|_| onnx_error("ONNX session lock poisoned"))?;
        let outputs = session.run(inputs).map_err(|e| onnx_error(format!("inference failed: {e}")))?;
        let (shape, hidden) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| onnx_error(format!("failed to read model output: {e}")))?;

        let width = shape.get(2).map_or(0, |&d| d as usize);
        if width != DIMENSIONS || hidden.len() != rows * seq_len * width {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Err(onnx_error(format!("unexpected output shape {dims:?}")));
        }
        Ok(mean_pool(hidden, &mask, seq_len, width))
    }
}

/// Average the token vectors of each row over its attention mask, then
/// L2-normalise. `hidden` is `[rows, seq_len, width]` flattened row-major.
fn mean_pool(hidden: &[f32], mask: &[i64], seq_len: usize, width: usize) -> Vec<Vec<f32>> {
    hidden
        .chunks(seq_len * width)
        .zip(mask.chunks(seq_len))
        .map(|(tokens, row_mask)| {
            let mut pooled = vec![0.0f32; width];
            let mut count = 0.0f32;
            for (token, &m) in tokens.chunks(width).zip(row_mask) {
                if m == 0 {
                    continue;
                }
                count += 1.0;
                pooled.iter_mut().zip(token).for_each(|(sum, v)| *sum += v);
            }
            if count > 0.0 {
                pooled.iter_mut().for_each(|v| *v /= count);
            }
            let norm = pooled.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                pooled.iter_mut().for_each(|v| *v /= norm);
            }
            pooled
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| onnx_error("model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, batch_size = texts.len(), "embedding batch");

        let model = self.model.clone();
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        tokio::task::spawn_blocking(move || model.embed_blocking(&owned))
            .await
            .map_err(|e| onnx_error(format!("embedding task failed: {e}")))?
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_skips_padding() {
        // Two rows, three tokens, width two. Row 0 has one padding token.
        let hidden = [3.0, 0.0, 1.0, 0.0, 100.0, 100.0, 0.0, 2.0, 0.0, 2.0, 0.0, 2.0];
        let mask = [1, 1, 0, 1, 1, 1];
        let pooled = mean_pool(&hidden, &mask, 3, 2);
        assert_eq!(pooled, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn mean_pool_of_fully_masked_row_is_zero() {
        let pooled = mean_pool(&[1.0, 1.0], &[0], 1, 2);
        assert_eq!(pooled, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxEmbeddingProvider::from_files(&dir.path().join(MODEL_FILE), &dir.path().join(TOKENIZER_FILE))
            .unwrap_err();
        match err {
            RagError::Embedding { provider, message } => {
                assert_eq!(provider, "ONNX");
                assert!(message.contains("model.onnx"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
