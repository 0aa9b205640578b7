//! Sequential batch iteration over windowed series.

use burn::prelude::*;
use ndarray::{s, Array2};

use crate::error::{DataError, Result};
use crate::window::WindowedSeries;

/// A batch of windows as batch-first tensors.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Inputs, `[batch, window, 1]`.
    pub inputs: Tensor<B, 3>,
    /// Targets, `[batch, window, 1]`.
    pub targets: Tensor<B, 3>,
}

impl<B: Backend> SequenceBatch<B> {
    /// Number of windows in the batch.
    pub fn len(&self) -> usize {
        self.inputs.dims()[0]
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walks a [`WindowedSeries`] in order, producing consecutive chunks.
///
/// Batches start at `0, batch_size, 2 * batch_size, ...` below `N - 1` and
/// hold `min(batch_size, N - 1 - start)` windows, so the final window of the
/// series is never batched.
///
/// # Example
///
/// ```rust,ignore
/// use arimaformer_data::SequenceLoader;
///
/// let loader = SequenceLoader::builder(windows).batch_size(64).build()?;
/// for batch in loader.iter::<NdArray>(&device) {
///     let output = model.forward(batch.inputs);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SequenceLoader {
    series: WindowedSeries,
    batch_size: usize,
}

impl SequenceLoader {
    /// Create a new loader builder.
    #[must_use]
    pub fn builder(series: WindowedSeries) -> SequenceLoaderBuilder {
        SequenceLoaderBuilder::new(series)
    }

    /// Get the underlying windows.
    #[must_use]
    pub fn series(&self) -> &WindowedSeries {
        &self.series
    }

    /// Get the batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of windows that end up in some batch.
    #[must_use]
    pub fn batchable_len(&self) -> usize {
        self.series.len().saturating_sub(1)
    }

    /// Get the number of batches.
    #[must_use]
    pub fn n_batches(&self) -> usize {
        self.batchable_len().div_ceil(self.batch_size)
    }

    /// Total number of windows, including the one never batched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Check if the loader holds no windows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Create an iterator over batches.
    #[must_use]
    pub fn iter<B: Backend>(&self, device: &B::Device) -> SequenceLoaderIter<'_, B> {
        SequenceLoaderIter {
            loader: self,
            device: device.clone(),
            current_batch: 0,
            n_batches: self.n_batches(),
        }
    }
}

/// Builder for [`SequenceLoader`].
#[derive(Debug)]
pub struct SequenceLoaderBuilder {
    series: WindowedSeries,
    batch_size: usize,
}

impl SequenceLoaderBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(series: WindowedSeries) -> Self {
        Self {
            series,
            batch_size: 64,
        }
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Build the loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch size is zero or the series is empty.
    pub fn build(self) -> Result<SequenceLoader> {
        if self.batch_size == 0 {
            return Err(DataError::InvalidBatchSize(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if self.series.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        Ok(SequenceLoader {
            series: self.series,
            batch_size: self.batch_size,
        })
    }
}

/// Iterator over batches from a [`SequenceLoader`].
pub struct SequenceLoaderIter<'a, B: Backend> {
    loader: &'a SequenceLoader,
    device: B::Device,
    current_batch: usize,
    n_batches: usize,
}

impl<'a, B: Backend> SequenceLoaderIter<'a, B> {
    fn to_tensor(&self, rows: &Array2<f32>, start: usize, end: usize) -> Tensor<B, 3> {
        let window = rows.ncols();
        let flat: Vec<f32> = rows.slice(s![start..end, ..]).iter().copied().collect();
        Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([end - start, window, 1])
    }
}

impl<'a, B: Backend> Iterator for SequenceLoaderIter<'a, B> {
    type Item = SequenceBatch<B>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_batch >= self.n_batches {
            return None;
        }

        let start = self.current_batch * self.loader.batch_size;
        let end = (start + self.loader.batch_size).min(self.loader.batchable_len());
        self.current_batch += 1;

        let series = &self.loader.series;
        Some(SequenceBatch {
            inputs: self.to_tensor(series.inputs(), start, end),
            targets: self.to_tensor(series.labels(), start, end),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_batches - self.current_batch;
        (remaining, Some(remaining))
    }
}

impl<'a, B: Backend> ExactSizeIterator for SequenceLoaderIter<'a, B> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::create_inout_sequences;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn windows(len: usize, window: usize) -> WindowedSeries {
        let inputs: Vec<f32> = (0..len).map(|v| v as f32).collect();
        let labels: Vec<f32> = (0..len).map(|v| -(v as f32)).collect();
        create_inout_sequences(&inputs, &labels, window).unwrap()
    }

    #[test]
    fn test_batch_sizes_skip_final_window() {
        // 25 windows -> 24 batchable -> 10 + 10 + 4
        let loader = SequenceLoader::builder(windows(30, 5)).batch_size(10).build().unwrap();
        assert_eq!(loader.len(), 25);
        assert_eq!(loader.n_batches(), 3);

        let device = Default::default();
        let sizes: Vec<usize> = loader.iter::<TestBackend>(&device).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10, 10, 4]);
    }

    #[test]
    fn test_batch_layout_is_batch_first() {
        let loader = SequenceLoader::builder(windows(12, 4)).batch_size(3).build().unwrap();
        let device = Default::default();
        let batch = loader.iter::<TestBackend>(&device).nth(1).unwrap();

        assert_eq!(batch.inputs.dims(), [3, 4, 1]);
        assert_eq!(batch.targets.dims(), [3, 4, 1]);

        // Second batch starts at window 3.
        let values: Vec<f32> = batch.inputs.into_data().to_vec().unwrap();
        assert_eq!(&values[..4], &[3.0, 4.0, 5.0, 6.0]);
        let targets: Vec<f32> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(&targets[..4], &[-3.0, -4.0, -5.0, -6.0]);
    }

    #[test]
    fn test_single_window_has_no_batches() {
        let loader = SequenceLoader::builder(windows(4, 3)).batch_size(8).build().unwrap();
        assert_eq!(loader.len(), 1);
        assert_eq!(loader.n_batches(), 0);
        let device = Default::default();
        assert_eq!(loader.iter::<TestBackend>(&device).count(), 0);
    }

    #[test]
    fn test_invalid_builder() {
        assert!(SequenceLoader::builder(windows(10, 2)).batch_size(0).build().is_err());
        let empty = windows(10, 2).drop_last(100);
        assert!(matches!(
            SequenceLoader::builder(empty).build(),
            Err(DataError::EmptyDataset)
        ));
    }
}
