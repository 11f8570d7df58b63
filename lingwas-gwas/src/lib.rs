//! lingwas-gwas: end-to-end pipeline orchestration.
//!
//! Wires the stages together in their fixed order (load, QC, optional
//! PCA, association testing, results table, plots), with each stage's
//! failures attributed by context. Data flows strictly forward; every
//! stage returns a fresh table and nothing is mutated across stage
//! boundaries.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use lingwas_assoc::{test_variants, AssocConfig, DosageConvention};
use lingwas_core::qc::{filter_samples, filter_variants};
use lingwas_core::{pca::compute_pcs, AssociationResult};
use lingwas_io::{read_phenotypes, read_vcf, write_results};
use lingwas_plotting::{annotate_and_order, manhattan_plot, qq_plot, PlotConfig, ResultPoint};

/// One run's worth of settings.
#[derive(Clone, Debug)]
pub struct GwasParams {
    pub vcf: PathBuf,
    pub pheno: PathBuf,
    pub maf_threshold: f64,
    pub missingness_threshold: f64,
    /// Number of principal-component covariates; 0 disables the PCA
    /// stage entirely.
    pub n_pcs: usize,
    pub convention: DosageConvention,
    /// Output files are written as `{out_prefix}_results.csv`,
    /// `{out_prefix}_manhattan_plot.svg`, `{out_prefix}_qq_plot.svg`.
    pub out_prefix: String,
}

impl GwasParams {
    pub fn new<V: Into<PathBuf>, P: Into<PathBuf>, O: Into<String>>(
        vcf: V,
        pheno: P,
        out_prefix: O,
    ) -> Self {
        Self {
            vcf: vcf.into(),
            pheno: pheno.into(),
            maf_threshold: 0.05,
            missingness_threshold: 0.1,
            n_pcs: 0,
            convention: DosageConvention::MinorFlip,
            out_prefix: out_prefix.into(),
        }
    }
}

/// What a finished run produced, for the CLI's closing report.
#[derive(Clone, Debug)]
pub struct GwasSummary {
    pub n_samples_loaded: usize,
    pub n_variants_loaded: usize,
    pub n_samples_qc: usize,
    pub n_variants_qc: usize,
    pub n_tested: usize,
    pub n_skipped: usize,
    pub results_path: PathBuf,
    pub manhattan_path: PathBuf,
    pub qq_path: PathBuf,
}

/// Run the full pipeline.
///
/// Per-variant data-quality problems are skipped with a diagnostic
/// inside the association stage; everything else aborts the run with a
/// stage-attributed error, and output files are only written once the
/// stage producing them has fully succeeded.
pub fn run_gwas(params: &GwasParams) -> Result<GwasSummary> {
    let (geno, sites) = read_vcf(&params.vcf).context("genotype loading failed")?;
    let pheno = read_phenotypes(&params.pheno).context("phenotype loading failed")?;

    let n_samples_loaded = geno.n_samples();
    let n_variants_loaded = geno.n_snps();

    let geno = filter_variants(&geno, params.maf_threshold, params.missingness_threshold);
    let geno = filter_samples(&geno, params.missingness_threshold);
    if geno.n_snps() == 0 {
        bail!("QC filtering removed every variant; no variants to test");
    }
    if geno.n_samples() == 0 {
        bail!("QC filtering removed every sample; no samples to test");
    }

    let pcs = match params.n_pcs {
        0 => None,
        k => Some(compute_pcs(&geno, k).context("population structure estimation failed")?),
    };

    let config = AssocConfig {
        convention: params.convention,
        pcs: pcs.as_ref(),
    };
    let results =
        test_variants(&pheno, &geno, &config, &sites).context("association testing failed")?;
    if results.is_empty() {
        bail!("every variant was skipped during testing; no results to report");
    }

    let results_path = PathBuf::from(format!("{}_results.csv", params.out_prefix));
    let manhattan_path = PathBuf::from(format!("{}_manhattan_plot.svg", params.out_prefix));
    let qq_path = PathBuf::from(format!("{}_qq_plot.svg", params.out_prefix));

    // A failed run must not leave a subset of its output files behind.
    if let Err(err) = write_outputs(&results, &results_path, &manhattan_path, &qq_path) {
        for path in [&results_path, &manhattan_path, &qq_path] {
            let _ = std::fs::remove_file(path);
        }
        return Err(err);
    }

    Ok(GwasSummary {
        n_samples_loaded,
        n_variants_loaded,
        n_samples_qc: geno.n_samples(),
        n_variants_qc: geno.n_snps(),
        n_tested: results.len(),
        n_skipped: geno.n_snps() - results.len(),
        results_path,
        manhattan_path,
        qq_path,
    })
}

fn write_outputs(
    results: &[AssociationResult],
    results_path: &Path,
    manhattan_path: &Path,
    qq_path: &Path,
) -> Result<()> {
    write_results(results_path, results).context("writing the results table failed")?;

    let points = to_plot_points(results).context("result formatting failed")?;
    let ordered = annotate_and_order(&points).context("result ordering failed")?;
    let plot_config = PlotConfig::default();
    manhattan_plot(&ordered, manhattan_path, &plot_config)
        .context("Manhattan plot rendering failed")?;

    let p_values: Vec<f64> = results.iter().map(|r| r.p).collect();
    qq_plot(&p_values, qq_path, &plot_config).context("QQ plot rendering failed")?;
    Ok(())
}

fn to_plot_points(results: &[AssociationResult]) -> Result<Vec<ResultPoint>> {
    results
        .iter()
        .map(|r| ResultPoint::new(&r.chrom, &r.snp, r.bp, r.p))
        .collect()
}
