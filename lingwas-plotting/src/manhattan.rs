//! Manhattan plot rendering.

use crate::{neg_log10, OrderedPoint, PlotConfig};
use anyhow::{bail, Context, Result};
use plotters::prelude::*;
use std::path::Path;

/// Per-chromosome tick position and scatter data, derived once before
/// rendering.
struct ManhattanData {
    /// (cumulative position, -log10 p, chromosome) per variant.
    points: Vec<(f64, f64, u32)>,
    /// (chromosome, median cumulative position) for the x-axis labels.
    ticks: Vec<(u32, f64)>,
    max_x: f64,
    max_y: f64,
}

fn prepare(ordered: &[OrderedPoint]) -> Result<ManhattanData> {
    let mut points = Vec::with_capacity(ordered.len());
    let mut max_y = 0.0f64;
    for o in ordered {
        let score = neg_log10(o.p, Some(&o.snp))?;
        max_y = max_y.max(score);
        points.push((o.cum_pos as f64, score, o.chr));
    }

    // Median cumulative coordinate per chromosome; the input is already
    // sorted, so each chromosome's positions form a contiguous run.
    let mut ticks = Vec::new();
    let mut start = 0;
    while start < ordered.len() {
        let chr = ordered[start].chr;
        let mut end = start;
        while end < ordered.len() && ordered[end].chr == chr {
            end += 1;
        }
        let run = &ordered[start..end];
        let median = run[run.len() / 2].cum_pos as f64;
        ticks.push((chr, median));
        start = end;
    }

    let max_x = ordered.last().map(|o| o.cum_pos as f64).unwrap_or(0.0);
    Ok(ManhattanData {
        points,
        ticks,
        max_x,
        max_y,
    })
}

/// Render a Manhattan plot: -log10(p) against the cumulative genome
/// coordinate, points colored by chromosome parity, threshold lines at
/// the configured significance levels, and one x tick per chromosome
/// at its median coordinate.
pub fn manhattan_plot<P: AsRef<Path>>(
    ordered: &[OrderedPoint],
    output_path: P,
    config: &PlotConfig,
) -> Result<()> {
    let output_path = output_path.as_ref();
    if ordered.is_empty() {
        bail!("no association results to plot");
    }

    let data = prepare(ordered)?;
    let y_max = (data.max_y * 1.1).max(config.significance_threshold + 1.0);

    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("svg")
        .to_ascii_lowercase();

    match ext.as_str() {
        "svg" => {
            let root =
                SVGBackend::new(output_path, (config.width, config.height)).into_drawing_area();
            draw(&root, &data, config, y_max).context("failed to draw Manhattan plot")?;
            root.present().context("failed to write Manhattan SVG")?;
            Ok(())
        }
        #[cfg(feature = "png")]
        "png" => {
            let root =
                BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
            draw(&root, &data, config, y_max).context("failed to draw Manhattan plot")?;
            root.present().context("failed to write Manhattan PNG")?;
            Ok(())
        }
        _ => bail!("unsupported plot format: {}", ext),
    }
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    data: &ManhattanData,
    config: &PlotConfig,
    y_max: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&config.theme.background)?;

    let title = config.title.as_deref().unwrap_or("Manhattan Plot");
    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 22).into_font().color(&config.theme.text))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0.0..data.max_x * 1.01, 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Chromosome")
        .y_desc("-log10(p)")
        .x_labels(0)
        .y_label_style(("sans-serif", 14).into_font().color(&config.theme.text))
        .axis_style(&config.theme.axis)
        .draw()?;

    // Threshold lines: suggestive below, genome-wide above.
    for (level, color) in [
        (config.suggestive_threshold, &config.theme.suggestive_line),
        (config.significance_threshold, &config.theme.significance_line),
    ] {
        chart.draw_series(LineSeries::new(
            vec![(0.0, level), (data.max_x * 1.01, level)],
            color.stroke_width(1),
        ))?;
    }

    // Points, alternating color by chromosome parity.
    let colors = &config.theme.chromosome_colors;
    chart.draw_series(data.points.iter().map(|&(x, y, chr)| {
        let color = colors[(chr % 2) as usize];
        Circle::new((x, y), config.point_size, color.filled())
    }))?;

    // Chromosome labels at each chromosome's median coordinate.
    for &(chr, x) in &data.ticks {
        chart.draw_series(std::iter::once(Text::new(
            chr.to_string(),
            (x, -y_max * 0.04),
            ("sans-serif", 13).into_font().color(&config.theme.text),
        )))?;
    }

    Ok(())
}
