//! Sinusoidal positional encoding.

use burn::prelude::*;

/// Fixed sinusoidal position table, `(max_len, d_model)`.
///
/// `pe[pos, 2i] = sin(pos / 10000^(2i / d))`, `pe[pos, 2i + 1] = cos(pos / 10000^(2i / d))`.
/// The table is built once on the host and added to the first `L` positions
/// of each sequence; it holds no trainable state.
#[derive(Debug, Clone)]
pub struct PositionalEncoding {
    table: Vec<f32>,
    d_model: usize,
    max_len: usize,
}

impl PositionalEncoding {
    /// Precompute the table.
    pub fn new(d_model: usize, max_len: usize) -> Self {
        let mut table = vec![0.0f32; max_len * d_model];
        for pos in 0..max_len {
            for i in 0..d_model {
                let exponent = (2 * (i / 2)) as f64 / d_model as f64;
                let angle = pos as f64 / 10000.0f64.powf(exponent);
                let value = if i % 2 == 0 { angle.sin() } else { angle.cos() };
                table[pos * d_model + i] = value as f32;
            }
        }

        Self {
            table,
            d_model,
            max_len,
        }
    }

    /// Encoding of a single position.
    pub fn row(&self, pos: usize) -> &[f32] {
        &self.table[pos * self.d_model..(pos + 1) * self.d_model]
    }

    /// The first `seq_len` rows as a `[seq_len, d_model]` tensor.
    ///
    /// # Panics
    ///
    /// Panics if `seq_len > max_len`.
    pub fn encoding<B: Backend>(&self, seq_len: usize, device: &B::Device) -> Tensor<B, 2> {
        assert!(
            seq_len <= self.max_len,
            "sequence length {} exceeds positional table length {}",
            seq_len,
            self.max_len
        );
        let rows = &self.table[..seq_len * self.d_model];
        Tensor::<B, 1>::from_floats(rows, device).reshape([seq_len, self.d_model])
    }

    /// Add the encoding to `x` of shape `[batch, seq_len, d_model]`.
    pub fn forward<B: Backend>(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [_batch, seq_len, _d_model] = x.dims();
        let pe = self.encoding::<B>(seq_len, &x.device());
        x + pe.unsqueeze::<3>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_table_values() {
        let pe = PositionalEncoding::new(6, 10);
        let first = pe.row(0);
        assert_eq!(first, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);

        let second = pe.row(1);
        assert!((second[0] - 1.0f32.sin()).abs() < 1e-6);
        assert!((second[1] - 1.0f32.cos()).abs() < 1e-6);
        let angle = 1.0 / 10000.0f64.powf(2.0 / 6.0);
        assert!((second[2] as f64 - angle.sin()).abs() < 1e-6);
        assert!((second[3] as f64 - angle.cos()).abs() < 1e-6);
    }

    #[test]
    fn test_forward_adds_rows() {
        let device = Default::default();
        let pe = PositionalEncoding::new(4, 16);
        let x = Tensor::<TestBackend, 3>::zeros([2, 3, 4], &device);
        let out = pe.forward(x);
        assert_eq!(out.dims(), [2, 3, 4]);

        let values: Vec<f32> = out.into_data().to_vec().unwrap();
        // second batch element, position 2
        assert_eq!(&values[12 + 8..12 + 12], pe.row(2));
    }

    #[test]
    #[should_panic(expected = "exceeds positional table length")]
    fn test_sequence_longer_than_table() {
        let device = Default::default();
        let pe = PositionalEncoding::new(4, 2);
        let _ = pe.encoding::<TestBackend>(3, &device);
    }
}
