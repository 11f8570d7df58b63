//! lingwas-plotting: result ordering and visualization for GWAS output.
//!
//! Plots are generated either directly from an in-memory run or by
//! reloading a saved results table, so a finished analysis can be
//! re-plotted without re-running the regressions.
//!
//! Output is SVG by default; enable the `png` feature for bitmap output
//! selected by file extension.

pub mod manhattan;
pub mod qq;
pub mod themes;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub use manhattan::manhattan_plot;
pub use qq::qq_plot;

/// One row of the association results table, as needed for plotting.
///
/// Extra columns in the CSV (TEST, NMISS, BETA, STAT) are ignored on
/// load.
#[derive(Clone, Debug, Deserialize)]
pub struct ResultPoint {
    #[serde(rename = "CHR")]
    pub chr: u32,
    #[serde(rename = "SNP")]
    pub snp: String,
    #[serde(rename = "BP")]
    pub bp: u64,
    #[serde(rename = "P")]
    pub p: f64,
}

impl ResultPoint {
    /// Build a point from raw fields, coercing the chromosome label to
    /// an integer. Non-numeric labels ("X", "MT") are out of scope and
    /// rejected.
    pub fn new(chrom: &str, snp: &str, bp: u64, p: f64) -> Result<Self> {
        let chr: u32 = chrom
            .trim()
            .parse()
            .map_err(|_| anyhow!("non-numeric chromosome label '{}' for {}", chrom, snp))?;
        Ok(Self {
            chr,
            snp: snp.to_string(),
            bp,
            p,
        })
    }
}

/// A result point annotated with its genome-wide plotting coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedPoint {
    pub chr: u32,
    pub snp: String,
    pub bp: u64,
    /// Position plus the summed maximum position of all preceding
    /// chromosomes; strictly increasing across a sorted result set.
    pub cum_pos: u64,
    pub p: f64,
}

/// Sort results by (chromosome, position) and attach the cumulative
/// genome coordinate.
///
/// The offset of a chromosome is the running sum of the maximum
/// position seen on every *earlier* chromosome, so coordinates from
/// different chromosomes never interleave. Deterministic and
/// idempotent: re-running on the same set reproduces the same order
/// and coordinates.
pub fn annotate_and_order(points: &[ResultPoint]) -> Result<Vec<OrderedPoint>> {
    if points.is_empty() {
        bail!("no association results to order");
    }

    let mut max_bp: BTreeMap<u32, u64> = BTreeMap::new();
    for point in points {
        let entry = max_bp.entry(point.chr).or_insert(0);
        *entry = (*entry).max(point.bp);
    }

    let mut offsets: BTreeMap<u32, u64> = BTreeMap::new();
    let mut running = 0u64;
    for (&chr, &max) in &max_bp {
        offsets.insert(chr, running);
        running += max;
    }

    let mut ordered: Vec<OrderedPoint> = points
        .iter()
        .map(|point| OrderedPoint {
            chr: point.chr,
            snp: point.snp.clone(),
            bp: point.bp,
            cum_pos: point.bp + offsets[&point.chr],
            p: point.p,
        })
        .collect();
    ordered.sort_by(|a, b| (a.chr, a.bp).cmp(&(b.chr, b.bp)));

    Ok(ordered)
}

/// Load plotting rows back from a saved results table.
pub fn load_results<P: AsRef<Path>>(path: P) -> Result<Vec<ResultPoint>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open results table {}", path.display()))?;

    let mut points = Vec::new();
    for record in reader.deserialize() {
        let point: ResultPoint = record?;
        points.push(point);
    }
    Ok(points)
}

/// Plot appearance settings shared by both renderers.
#[derive(Clone, Debug)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// Genome-wide significance line as -log10(p); default 7.0 (p = 1e-7).
    pub significance_threshold: f64,
    /// Suggestive line as -log10(p); default 5.0 (p = 1e-5).
    pub suggestive_threshold: f64,
    pub title: Option<String>,
    pub theme: themes::Theme,
    pub point_size: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 500,
            significance_threshold: 7.0,
            suggestive_threshold: 5.0,
            title: None,
            theme: themes::Theme::default(),
            point_size: 2,
        }
    }
}

/// -log10 transform, rejecting values the transform cannot represent.
/// Shared guard for both plots: a degenerate p-value must fail before
/// the log, not render as infinity.
pub(crate) fn neg_log10(p: f64, snp_hint: Option<&str>) -> Result<f64> {
    if !(p > 0.0) || p > 1.0 {
        match snp_hint {
            Some(snp) => bail!("p-value {} for {} cannot be -log10 transformed", p, snp),
            None => bail!("p-value {} cannot be -log10 transformed", p),
        }
    }
    Ok(-p.log10())
}
