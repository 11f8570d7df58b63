use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;

use lingwas_assoc::DosageConvention;
use lingwas_gwas::{run_gwas, GwasParams};

/// lingwas: GWAS for a single continuous phenotype via per-variant
/// linear regression.
#[derive(Parser)]
#[command(
    name = "lingwas",
    version,
    about = "Linear-regression GWAS: QC, optional PCA covariates, per-SNP OLS, Manhattan and QQ plots"
)]
struct Cli {
    /// Genotype VCF file (plain or gzipped)
    #[arg(long)]
    vcf: String,

    /// Phenotype file (whitespace-delimited: FID IID trait, no header)
    #[arg(long)]
    pheno: String,

    /// Minimum minor allele frequency for a variant to be tested
    #[arg(long, default_value_t = 0.05)]
    maf: f64,

    /// Maximum per-variant and per-sample missingness proportion
    #[arg(long, default_value_t = 0.1)]
    missing: f64,

    /// Number of principal components to include as covariates (0 = none)
    #[arg(long, default_value_t = 0)]
    pcs: usize,

    /// Regress on raw alternate-allele dosage instead of flipping to
    /// the PLINK-style minor-allele dosage
    #[arg(long, default_value_t = false)]
    keep_alt_dosage: bool,

    /// Output path prefix for the results table and plots
    #[arg(long)]
    out: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !Path::new(&cli.vcf).exists() {
        bail!("genotype file not found: {}", cli.vcf);
    }
    if !Path::new(&cli.pheno).exists() {
        bail!("phenotype file not found: {}", cli.pheno);
    }
    if !(0.0..=0.5).contains(&cli.maf) {
        bail!("--maf must be between 0.0 and 0.5, got {}", cli.maf);
    }
    if !(0.0..=1.0).contains(&cli.missing) {
        bail!("--missing must be between 0.0 and 1.0, got {}", cli.missing);
    }

    let params = GwasParams {
        vcf: cli.vcf.into(),
        pheno: cli.pheno.into(),
        maf_threshold: cli.maf,
        missingness_threshold: cli.missing,
        n_pcs: cli.pcs,
        convention: if cli.keep_alt_dosage {
            DosageConvention::AlternateCount
        } else {
            DosageConvention::MinorFlip
        },
        out_prefix: cli.out,
    };

    let summary = run_gwas(&params)?;

    println!(
        "Tested {} of {} variants ({} samples after QC, {} skipped)",
        summary.n_tested, summary.n_variants_loaded, summary.n_samples_qc, summary.n_skipped
    );
    println!("Results saved to {}", summary.results_path.display());
    println!("Manhattan plot saved to {}", summary.manhattan_path.display());
    println!("QQ plot saved to {}", summary.qq_path.display());

    Ok(())
}
