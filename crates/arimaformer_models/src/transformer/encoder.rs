//! Transformer encoder layer with optional attention mask.

use burn::nn::attention::{
    generate_autoregressive_mask, MhaInput, MultiHeadAttention, MultiHeadAttentionConfig,
};
use burn::nn::{Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

/// Causal mask of shape `[batch, len, len]`.
///
/// Entry `(i, j)` is `true` when position `i` must not attend to `j`, i.e.
/// for every `j > i`.
pub fn square_subsequent_mask<B: Backend>(
    batch: usize,
    len: usize,
    device: &B::Device,
) -> Tensor<B, 3, Bool> {
    generate_autoregressive_mask::<B>(batch, len, device)
}

/// Post-norm encoder layer: attention -> residual -> norm -> ReLU FFN -> residual -> norm.
#[derive(Module, Debug)]
pub struct TransformerEncoderLayer<B: Backend> {
    attention: MultiHeadAttention<B>,
    norm1: LayerNorm<B>,
    ff_linear1: Linear<B>,
    ff_linear2: Linear<B>,
    norm2: LayerNorm<B>,
    dropout1: Dropout,
    dropout_ff: Dropout,
    dropout2: Dropout,
}

impl<B: Backend> TransformerEncoderLayer<B> {
    /// Create a layer.
    pub fn new(d_model: usize, n_heads: usize, d_ff: usize, dropout: f64, device: &B::Device) -> Self {
        Self {
            attention: MultiHeadAttentionConfig::new(d_model, n_heads)
                .with_dropout(dropout)
                .init(device),
            norm1: LayerNormConfig::new(d_model).init(device),
            ff_linear1: LinearConfig::new(d_model, d_ff).init(device),
            ff_linear2: LinearConfig::new(d_ff, d_model).init(device),
            norm2: LayerNormConfig::new(d_model).init(device),
            dropout1: DropoutConfig::new(dropout).init(),
            dropout_ff: DropoutConfig::new(dropout).init(),
            dropout2: DropoutConfig::new(dropout).init(),
        }
    }

    /// Forward pass over `[batch, seq_len, d_model]`.
    pub fn forward(&self, x: Tensor<B, 3>, mask: Option<Tensor<B, 3, Bool>>) -> Tensor<B, 3> {
        let mut attn_input = MhaInput::self_attn(x.clone());
        if let Some(mask) = mask {
            attn_input = attn_input.mask_attn(mask);
        }
        let attn_out = self.attention.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout1.forward(attn_out));

        let ff_out = relu(self.ff_linear1.forward(x.clone()));
        let ff_out = self.ff_linear2.forward(self.dropout_ff.forward(ff_out));

        self.norm2.forward(x + self.dropout2.forward(ff_out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_mask_blocks_future() {
        let device = Default::default();
        let mask = square_subsequent_mask::<TestBackend>(1, 3, &device);
        let values: Vec<bool> = mask.into_data().to_vec().unwrap();
        assert_eq!(
            values,
            vec![false, true, true, false, false, true, false, false, false]
        );
    }

    #[test]
    fn test_layer_preserves_shape() {
        let device = Default::default();
        let layer = TransformerEncoderLayer::<TestBackend>::new(8, 2, 16, 0.0, &device);
        let x = Tensor::random([3, 5, 8], burn::tensor::Distribution::Normal(0.0, 1.0), &device);
        let mask = square_subsequent_mask::<TestBackend>(3, 5, &device);
        assert_eq!(layer.forward(x, Some(mask)).dims(), [3, 5, 8]);
    }
}
