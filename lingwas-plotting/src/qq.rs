//! QQ plot rendering: observed vs expected p-value quantiles.

use crate::{neg_log10, PlotConfig};
use anyhow::{bail, Context, Result};
use plotters::prelude::*;
use std::path::Path;

/// Expected and observed -log10(p) pairs for the QQ scatter.
///
/// Observed p-values are sorted ascending and paired with the uniform
/// quantiles rank/n. A p-value of exactly 0 (or anything outside
/// (0, 1]) is an error here, before any log transform runs.
fn qq_coordinates(p_values: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = p_values.len();
    let mut sorted = p_values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut expected = Vec::with_capacity(n);
    let mut observed = Vec::with_capacity(n);
    for (rank, &p) in sorted.iter().enumerate() {
        expected.push(-((rank as f64 + 1.0) / n as f64).log10());
        observed.push(neg_log10(p, None)?);
    }
    Ok((expected, observed))
}

/// Render a QQ plot of the observed p-value distribution against the
/// uniform expectation, with a y = x reference line.
pub fn qq_plot<P: AsRef<Path>>(
    p_values: &[f64],
    output_path: P,
    config: &PlotConfig,
) -> Result<()> {
    let output_path = output_path.as_ref();
    if p_values.is_empty() {
        bail!("no p-values to plot");
    }

    let (expected, observed) = qq_coordinates(p_values)?;
    let max_val = expected
        .iter()
        .chain(observed.iter())
        .cloned()
        .fold(0.0f64, f64::max);
    let axis_max = (max_val * 1.05).max(1.0);

    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("svg")
        .to_ascii_lowercase();

    let side = config.height.max(400);
    match ext.as_str() {
        "svg" => {
            let root = SVGBackend::new(output_path, (side, side)).into_drawing_area();
            draw(&root, &expected, &observed, config, axis_max)
                .context("failed to draw QQ plot")?;
            root.present().context("failed to write QQ SVG")?;
            Ok(())
        }
        #[cfg(feature = "png")]
        "png" => {
            let root = BitMapBackend::new(output_path, (side, side)).into_drawing_area();
            draw(&root, &expected, &observed, config, axis_max)
                .context("failed to draw QQ plot")?;
            root.present().context("failed to write QQ PNG")?;
            Ok(())
        }
        _ => bail!("unsupported plot format: {}", ext),
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    expected: &[f64],
    observed: &[f64],
    config: &PlotConfig,
    axis_max: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&config.theme.background)?;

    let title = config.title.as_deref().unwrap_or("QQ Plot");
    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 22).into_font().color(&config.theme.text))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0.0..axis_max, 0.0..axis_max)?;

    chart
        .configure_mesh()
        .x_desc("Expected -log10(p)")
        .y_desc("Observed -log10(p)")
        .x_label_style(("sans-serif", 14).into_font().color(&config.theme.text))
        .y_label_style(("sans-serif", 14).into_font().color(&config.theme.text))
        .axis_style(&config.theme.axis)
        .draw()?;

    chart.draw_series(LineSeries::new(
        vec![(0.0, 0.0), (axis_max, axis_max)],
        config.theme.reference_line.stroke_width(1),
    ))?;

    let color = config.theme.chromosome_colors[0];
    chart.draw_series(
        expected
            .iter()
            .zip(observed.iter())
            .map(|(&e, &o)| Circle::new((e, o), config.point_size, color.filled())),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_sort_and_transform() {
        let (expected, observed) = qq_coordinates(&[0.5, 0.01, 0.1]).unwrap();
        // Observed sorted ascending: 0.01, 0.1, 0.5 -> 2, 1, 0.301.
        assert!((observed[0] - 2.0).abs() < 1e-12);
        assert!((observed[1] - 1.0).abs() < 1e-12);
        // Expected quantiles: 1/3, 2/3, 3/3.
        assert!((expected[2] - 0.0).abs() < 1e-12);
        assert!(expected[0] > expected[1]);
    }

    #[test]
    fn zero_p_value_is_a_defined_error() {
        assert!(qq_coordinates(&[0.5, 0.0, 0.1]).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qq.svg");
        let err = qq_plot(&[0.2, 0.0], &path, &PlotConfig::default());
        assert!(err.is_err());
        assert!(!path.exists(), "no artifact should be left behind");
    }

    #[test]
    fn empty_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qq.svg");
        assert!(qq_plot(&[], &path, &PlotConfig::default()).is_err());
    }

    #[test]
    fn renders_svg_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qq.svg");
        let p_values: Vec<f64> = (1..=50).map(|i| i as f64 / 100.0).collect();
        qq_plot(&p_values, &path, &PlotConfig::default()).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
