//! PNG rendering of predictions against ground truth.

use std::path::Path;
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use crate::error::{AnalysisError, Result};

/// Image settings for [`plot_forecast`].
#[derive(Debug, Clone)]
pub struct PlotStyle {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Chart caption.
    pub caption: Option<String>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            caption: None,
        }
    }
}

impl PlotStyle {
    /// Set the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::Plot(e.to_string())
}

/// Family every text element of the chart is drawn with.
const FONT_FAMILY: &str = "sans-serif";

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Register the bundled DejaVu Sans as the sans-serif family, once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, DEJAVU_SANS).is_ok());
    if ok {
        Ok(())
    } else {
        Err(AnalysisError::Plot("bundled font could not be loaded".to_string()))
    }
}

/// Draw `preds` (red) over `truth` (blue) with a grid, a zero line and a legend.
///
/// Missing parent directories of `path` are created.
///
/// # Errors
///
/// Fails on empty or mismatched input, and when the image cannot be written.
pub fn plot_forecast(path: &Path, truth: &[f32], preds: &[f32], style: &PlotStyle) -> Result<()> {
    if truth.len() != preds.len() {
        return Err(AnalysisError::LengthMismatch {
            truth: truth.len(),
            preds: preds.len(),
        });
    }
    if truth.is_empty() {
        return Err(AnalysisError::Empty);
    }
    ensure_font()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let n = truth.len();
    // Zero stays inside the y range so the reference line is visible.
    let (mut y_min, mut y_max) = truth
        .iter()
        .chain(preds)
        .filter(|v| v.is_finite())
        .fold((0.0f32, 0.0f32), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let pad = ((y_max - y_min) * 0.05).max(1e-3);
    y_min -= pad;
    y_max += pad;
    let x_max = n.max(2) as f32 - 1.0;

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    {
        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 40);
        if let Some(caption) = &style.caption {
            builder.caption(caption, (FONT_FAMILY, 20));
        }
        let mut chart = builder
            .build_cartesian_2d(0f32..x_max, y_min..y_max)
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .light_line_style(BLACK.mix(0.1))
            .label_style((FONT_FAMILY, 12))
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(LineSeries::new(
                truth.iter().enumerate().map(|(i, &v)| (i as f32, v)),
                &BLUE,
            ))
            .map_err(plot_err)?
            .label("truth")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .draw_series(LineSeries::new(
                preds.iter().enumerate().map(|(i, &v)| (i as f32, v)),
                &RED,
            ))
            .map_err(plot_err)?
            .label("prediction")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

        chart
            .draw_series(LineSeries::new(vec![(0.0, 0.0), (x_max, 0.0)], &BLACK))
            .map_err(plot_err)?;

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT_FAMILY, 14))
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    tracing::debug!(path = %path.display(), points = n, "forecast plot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::style::FontDesc;

    #[test]
    fn test_writes_png_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("forecast.png");
        let truth: Vec<f32> = (0..50).map(|i| (i as f32 * 0.2).sin()).collect();
        let preds: Vec<f32> = truth.iter().map(|v| v * 0.9).collect();

        plot_forecast(&path, &truth, &preds, &PlotStyle::default().with_caption("epoch 1")).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_bundled_font_measures_text() {
        ensure_font().unwrap();
        let font: FontDesc<'_> = (FONT_FAMILY, 14.0).into();
        let (width, height) = font.box_size("prediction").unwrap();
        assert!(width > 0 && height > 0);
        // Registering twice is harmless.
        ensure_font().unwrap();
    }

    #[test]
    fn test_text_is_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain.png");
        let labelled = dir.path().join("labelled.png");
        let truth: Vec<f32> = (0..20).map(|i| i as f32).collect();

        plot_forecast(&plain, &truth, &truth, &PlotStyle::default()).unwrap();
        plot_forecast(&labelled, &truth, &truth, &PlotStyle::default().with_caption("epoch 10")).unwrap();

        // The caption adds glyph pixels, so the two images must differ.
        assert_ne!(std::fs::read(&plain).unwrap(), std::fs::read(&labelled).unwrap());
    }

    #[test]
    fn test_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.png");
        assert!(matches!(
            plot_forecast(&path, &[], &[], &PlotStyle::default()),
            Err(AnalysisError::Empty)
        ));
        assert!(plot_forecast(&path, &[1.0], &[], &PlotStyle::default()).is_err());
        assert!(!path.exists());
    }
}
