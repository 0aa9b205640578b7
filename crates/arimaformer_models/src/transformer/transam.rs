//! TransAm: Transformer refinement of ARIMA predictions.

use arimaformer_core::{CoreError, Result};
use burn::module::{Ignored, Param};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use super::encoder::{square_subsequent_mask, TransformerEncoderLayer};
use super::positional::PositionalEncoding;

/// Configuration for [`TransAm`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransAmConfig {
    /// Embedding width; the scalar input is broadcast to this size.
    pub feature_size: usize,
    /// Number of encoder layers.
    pub n_layers: usize,
    /// Attention heads (must divide `feature_size`).
    pub n_heads: usize,
    /// Feed-forward hidden width.
    pub d_ff: usize,
    /// Dropout rate.
    pub dropout: f64,
    /// Longest supported window.
    pub max_len: usize,
    /// Decoder weights are drawn from `U(-r, r)`.
    pub decoder_init_range: f64,
}

impl Default for TransAmConfig {
    fn default() -> Self {
        Self {
            feature_size: 250,
            n_layers: 1,
            n_heads: 10,
            d_ff: 2048,
            dropout: 0.0,
            max_len: 5000,
            decoder_init_range: 0.1,
        }
    }
}

impl TransAmConfig {
    /// Set embedding width.
    pub fn with_feature_size(mut self, feature_size: usize) -> Self {
        self.feature_size = feature_size;
        self
    }

    /// Set number of attention heads.
    pub fn with_n_heads(mut self, n_heads: usize) -> Self {
        self.n_heads = n_heads;
        self
    }

    /// Set number of layers.
    pub fn with_n_layers(mut self, n_layers: usize) -> Self {
        self.n_layers = n_layers;
        self
    }

    /// Set feed-forward width.
    pub fn with_d_ff(mut self, d_ff: usize) -> Self {
        self.d_ff = d_ff;
        self
    }

    /// Set dropout rate.
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Check that the configuration describes a buildable model.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for zero sizes, a head count that
    /// does not divide `feature_size`, or a dropout outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if self.feature_size == 0 || self.n_layers == 0 || self.n_heads == 0 || self.d_ff == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "model sizes must be non-zero: {self:?}"
            )));
        }
        if self.feature_size % self.n_heads != 0 {
            return Err(CoreError::InvalidConfig(format!(
                "n_heads ({}) must divide feature_size ({})",
                self.n_heads, self.feature_size
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(CoreError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    /// Check that windows of `window` steps fit the positional table.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `window > max_len`.
    pub fn check_window(&self, window: usize) -> Result<()> {
        if window > self.max_len {
            return Err(CoreError::InvalidConfig(format!(
                "window {} exceeds max_len {}",
                window, self.max_len
            )));
        }
        Ok(())
    }

    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransAm<B> {
        TransAm::new(self, device)
    }
}

/// Transformer encoder regressing observed values from ARIMA predictions.
///
/// Input `[batch, window, 1]` is broadcast to `feature_size`, positionally
/// encoded and passed through the encoder under a causal mask, so the output
/// at position `t` depends only on inputs `0..=t`. A linear decoder maps each
/// position back to a scalar: output `[batch, window, 1]`.
///
/// # Example
///
/// ```rust,ignore
/// use arimaformer_models::TransAmConfig;
///
/// let model = TransAmConfig::default().init::<NdArray>(&device);
/// let output = model.forward(input); // [batch, 20, 1]
/// ```
#[derive(Module, Debug)]
pub struct TransAm<B: Backend> {
    encoder_layers: Vec<TransformerEncoderLayer<B>>,
    decoder: Linear<B>,
    pos_encoder: Ignored<PositionalEncoding>,
    #[module(skip)]
    feature_size: usize,
}

impl<B: Backend> TransAm<B> {
    /// Create a new model.
    pub fn new(config: &TransAmConfig, device: &B::Device) -> Self {
        let encoder_layers = (0..config.n_layers)
            .map(|_| {
                TransformerEncoderLayer::new(
                    config.feature_size,
                    config.n_heads,
                    config.d_ff,
                    config.dropout,
                    device,
                )
            })
            .collect();

        let range = config.decoder_init_range;
        let mut decoder = LinearConfig::new(config.feature_size, 1)
            .with_initializer(Initializer::Uniform {
                min: -range,
                max: range,
            })
            .init(device);
        decoder.bias = Some(Param::from_tensor(Tensor::zeros([1], device)));

        Self {
            encoder_layers,
            decoder,
            pos_encoder: Ignored(PositionalEncoding::new(config.feature_size, config.max_len)),
            feature_size: config.feature_size,
        }
    }

    /// Forward pass, `[batch, window, 1] -> [batch, window, 1]`.
    pub fn forward(&self, src: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq_len, _] = src.dims();
        let device = src.device();

        let x = src.repeat_dim(2, self.feature_size);
        let mut x = self.pos_encoder.forward(x);

        let mask = square_subsequent_mask::<B>(batch, seq_len, &device);
        for layer in &self.encoder_layers {
            x = layer.forward(x, Some(mask.clone()));
        }

        self.decoder.forward(x)
    }
}
