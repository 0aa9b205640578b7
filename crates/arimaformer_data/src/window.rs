//! Sliding-window sequence construction.

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{DataError, Result};

/// Overlapping input/label windows cut from a pair of aligned series.
///
/// Row `i` of `inputs` is `input[i..i + window]` and row `i` of `labels` is
/// `label[i..i + window]`, so every position of an input window has a label.
#[derive(Debug, Clone)]
pub struct WindowedSeries {
    inputs: Array2<f32>,
    labels: Array2<f32>,
}

impl WindowedSeries {
    /// Build from pre-windowed arrays of shape `(N, window)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the two arrays differ in shape.
    pub fn from_arrays(inputs: Array2<f32>, labels: Array2<f32>) -> Result<Self> {
        if inputs.shape() != labels.shape() {
            return Err(DataError::InvalidShape(format!(
                "inputs {:?} and labels {:?} differ",
                inputs.shape(),
                labels.shape()
            )));
        }
        Ok(Self { inputs, labels })
    }

    /// Number of windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    /// Check if there are no windows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Window length.
    #[must_use]
    pub fn window(&self) -> usize {
        self.inputs.ncols()
    }

    /// Input windows, `(N, window)`.
    #[must_use]
    pub fn inputs(&self) -> &Array2<f32> {
        &self.inputs
    }

    /// Label windows, `(N, window)`.
    #[must_use]
    pub fn labels(&self) -> &Array2<f32> {
        &self.labels
    }

    /// The `i`-th (input, label) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if `i` is out of bounds.
    pub fn get(&self, i: usize) -> Result<(ArrayView1<'_, f32>, ArrayView1<'_, f32>)> {
        if i >= self.len() {
            return Err(DataError::InvalidInput(format!(
                "window {i} out of bounds for {} windows",
                self.len()
            )));
        }
        Ok((self.inputs.row(i), self.labels.row(i)))
    }

    /// Drop the trailing `k` windows.
    #[must_use]
    pub fn drop_last(self, k: usize) -> Self {
        let keep = self.len().saturating_sub(k);
        Self {
            inputs: self.inputs.slice_axis(Axis(0), (0..keep).into()).to_owned(),
            labels: self.labels.slice_axis(Axis(0), (0..keep).into()).to_owned(),
        }
    }
}

/// Slice aligned input and label series into overlapping windows.
///
/// Produces `len - window` windows; the last possible window (ending at the
/// final observation) is not emitted.
///
/// # Errors
///
/// Returns an error if the series lengths differ, `window` is zero, or the
/// series is not longer than `window`.
pub fn create_inout_sequences(inputs: &[f32], labels: &[f32], window: usize) -> Result<WindowedSeries> {
    if inputs.len() != labels.len() {
        return Err(DataError::InvalidShape(format!(
            "input series has {} values but label series has {}",
            inputs.len(),
            labels.len()
        )));
    }
    if window == 0 {
        return Err(DataError::InvalidInput("window size must be greater than 0".to_string()));
    }
    let len = inputs.len();
    if len <= window {
        return Err(DataError::SeriesTooShort { len, window });
    }

    let n = len - window;
    let mut x = Vec::with_capacity(n * window);
    let mut y = Vec::with_capacity(n * window);
    for i in 0..n {
        x.extend_from_slice(&inputs[i..i + window]);
        y.extend_from_slice(&labels[i..i + window]);
    }

    let inputs = Array2::from_shape_vec((n, window), x)
        .map_err(|e| DataError::InvalidShape(e.to_string()))?;
    let labels = Array2::from_shape_vec((n, window), y)
        .map_err(|e| DataError::InvalidShape(e.to_string()))?;

    WindowedSeries::from_arrays(inputs, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_contents() {
        let inputs: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let labels: Vec<f32> = (0..6).map(|v| v as f32 * 10.0).collect();
        let windows = create_inout_sequences(&inputs, &labels, 3).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows.window(), 3);
        let (x, y) = windows.get(2).unwrap();
        assert_eq!(x.to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(y.to_vec(), vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_drop_last() {
        let series: Vec<f32> = (0..10).map(|v| v as f32).collect();
        let windows = create_inout_sequences(&series, &series, 4).unwrap().drop_last(1);
        assert_eq!(windows.len(), 5);
        assert_eq!(windows.get(4).unwrap().0.to_vec(), vec![4.0, 5.0, 6.0, 7.0]);
        assert!(windows.clone().drop_last(10).is_empty());
    }

    #[test]
    fn test_from_arrays_checks_shapes() {
        let inputs = Array2::<f32>::zeros((4, 3));
        assert!(matches!(
            WindowedSeries::from_arrays(inputs.clone(), Array2::zeros((4, 2))),
            Err(DataError::InvalidShape(_))
        ));
        let windows = WindowedSeries::from_arrays(inputs.clone(), inputs).unwrap();
        assert_eq!(windows.len(), 4);
        assert_eq!(windows.window(), 3);
    }

    #[test]
    fn test_rejects_bad_input() {
        let a = [1.0f32, 2.0, 3.0];
        assert!(create_inout_sequences(&a, &a[..2], 1).is_err());
        assert!(create_inout_sequences(&a, &a, 0).is_err());
        assert!(matches!(
            create_inout_sequences(&a, &a, 3),
            Err(DataError::SeriesTooShort { len: 3, window: 3 })
        ));
    }
}
