//! lingwas-assoc: per-variant linear-regression association testing.
//!
//! For each variant in the QC-passed genotype matrix, the phenotype is
//! regressed on an intercept, optional principal-component covariates,
//! and the variant's dosage. The reported beta, t statistic, and
//! two-sided p-value belong to the dosage column only.
//!
//! Each variant's regression is independent, so the loop runs in
//! parallel with rayon; output order always follows genotype column
//! order regardless of completion order.

use anyhow::{anyhow, bail, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::Axis;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

use lingwas_core::{AssociationResult, GenotypeMatrix, PcMatrix, PhenotypeTable, SiteMap};

/// Which allele the dosage column counts during regression.
///
/// The loader always emits alternate-allele counts. `MinorFlip` flips
/// each dosage to `2 - g` before the fit, the PLINK convention of
/// testing against the A1 (minor/reference) allele; this negates beta
/// and the t statistic but leaves p-values unchanged. One convention is
/// fixed per run. MAF filtering is symmetric under the flip, so QC and
/// regression stay consistent either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DosageConvention {
    AlternateCount,
    MinorFlip,
}

/// Per-run association settings.
#[derive(Clone, Copy, Debug)]
pub struct AssocConfig<'a> {
    pub convention: DosageConvention,
    /// Principal-component covariates; row order must match the
    /// genotype matrix sample order.
    pub pcs: Option<&'a PcMatrix>,
}

impl Default for AssocConfig<'_> {
    fn default() -> Self {
        Self {
            convention: DosageConvention::MinorFlip,
            pcs: None,
        }
    }
}

/// The dosage-column fit extracted from one OLS regression.
struct DosageFit {
    beta: f64,
    stat: f64,
    p: f64,
}

/// Ordinary least squares of `y` on `design`, returning the
/// coefficient, t statistic, and two-sided p-value of the LAST design
/// column. `None` means the fit is degenerate (singular XᵀX or no
/// residual degrees of freedom) and the variant should be skipped.
fn ols_last_column(design: &DMatrix<f64>, y: &DVector<f64>) -> Option<DosageFit> {
    let n = design.nrows();
    let p = design.ncols();
    if n <= p {
        return None;
    }

    let xtx = design.transpose() * design;
    let xtx_inv = xtx.try_inverse()?;
    let beta_hat = &xtx_inv * design.transpose() * y;

    let residuals = y - design * &beta_hat;
    let df = (n - p) as f64;
    let sigma2 = residuals.norm_squared() / df;

    let j = p - 1;
    let var_j = sigma2 * xtx_inv[(j, j)];
    if !var_j.is_finite() || var_j < 0.0 {
        return None;
    }

    let beta = beta_hat[j];
    let se = var_j.sqrt();
    let stat = beta / se;

    // Two-sided p through the lower tail: cdf(-|t|) keeps precision
    // where 1 - cdf(|t|) rounds to zero for large statistics. The clamp
    // floor keeps extreme hits representable under -log10; p is never
    // exactly 0, even for a perfect fit with an infinite t.
    let p_value = if stat.is_finite() {
        let t_dist = StudentsT::new(0.0, 1.0, df).ok()?;
        (2.0 * t_dist.cdf(-stat.abs())).clamp(f64::MIN_POSITIVE, 1.0)
    } else {
        f64::MIN_POSITIVE
    };

    Some(DosageFit {
        beta,
        stat,
        p: p_value,
    })
}

/// Test every variant in `geno` for association with the phenotype.
///
/// Samples are joined once by sample ID (inner join; phenotype rows
/// with a missing trait value never enter the join). Variants with any
/// missing dosage among the joined samples are skipped with a
/// diagnostic, as are variants whose design matrix is singular. Both
/// are per-variant conditions; the run continues.
pub fn test_variants(
    pheno: &PhenotypeTable,
    geno: &GenotypeMatrix,
    config: &AssocConfig,
    sites: &SiteMap,
) -> Result<Vec<AssociationResult>> {
    if geno.is_empty() || pheno.n_samples() == 0 {
        return Ok(Vec::new());
    }

    if let Some(pcs) = config.pcs {
        if pcs.sample_ids != geno.sample_ids {
            bail!("principal components were computed for a different sample set");
        }
    }

    // Inner join on sample ID: (genotype row, trait value), in genotype
    // row order. Relying on matching row order across the two tables is
    // exactly the bug this join exists to prevent.
    let mut trait_by_id = std::collections::HashMap::with_capacity(pheno.n_samples());
    for (idx, id) in pheno.sample_ids.iter().enumerate() {
        if pheno.values[idx].is_finite() {
            trait_by_id.insert(id.as_str(), pheno.values[idx]);
        }
    }
    let joined: Vec<(usize, f64)> = geno
        .sample_ids
        .iter()
        .enumerate()
        .filter_map(|(row, id)| trait_by_id.get(id.as_str()).map(|&y| (row, y)))
        .collect();

    let n = joined.len();
    let n_covariates = config.pcs.map(|p| p.n_pcs()).unwrap_or(0);
    let y = DVector::from_iterator(n, joined.iter().map(|&(_, v)| v));

    // Intercept and PC columns are shared by every variant; only the
    // dosage column changes per fit.
    let n_cols = 1 + n_covariates + 1;
    let mut base = DMatrix::<f64>::zeros(n, n_cols);
    for i in 0..n {
        base[(i, 0)] = 1.0;
    }
    if let Some(pcs) = config.pcs {
        for (i, &(row, _)) in joined.iter().enumerate() {
            for c in 0..n_covariates {
                base[(i, 1 + c)] = pcs.pcs[(row, c)];
            }
        }
    }

    let fits: Vec<Result<Option<AssociationResult>>> = (0..geno.n_snps())
        .into_par_iter()
        .map(|snp_idx| {
            let snp = &geno.snp_ids[snp_idx];
            let site = sites
                .get(snp)
                .ok_or_else(|| anyhow!("variant '{}' has no chromosome/position entry", snp))?;

            let column = geno.dosages.index_axis(Axis(1), snp_idx);
            let mut design = base.clone();
            for (i, &(row, _)) in joined.iter().enumerate() {
                let g = column[row];
                if !g.is_finite() {
                    eprintln!(
                        "Warning: variant {} has missing genotypes after the join; skipped",
                        snp
                    );
                    return Ok(None);
                }
                design[(i, n_cols - 1)] = match config.convention {
                    DosageConvention::AlternateCount => g,
                    DosageConvention::MinorFlip => 2.0 - g,
                };
            }

            let Some(fit) = ols_last_column(&design, &y) else {
                eprintln!(
                    "Warning: variant {} has a singular or degenerate design matrix; skipped",
                    snp
                );
                return Ok(None);
            };

            Ok(Some(AssociationResult {
                chrom: site.chrom.clone(),
                snp: snp.clone(),
                bp: site.pos,
                test: "ADD".to_string(),
                nmiss: n,
                beta: fit.beta,
                stat: fit.stat,
                p: fit.p,
            }))
        })
        .collect();

    let mut results = Vec::with_capacity(geno.n_snps());
    for fit in fits {
        if let Some(result) = fit? {
            results.push(result);
        }
    }
    Ok(results)
}
