//! Genotype quality control: MAF and missingness filters.
//!
//! MAF uses the PLINK-like definition: alleles are counted only from
//! non-missing genotypes, then the minor-allele count is divided by the
//! total non-missing allele count. Treating missing calls as dosage 0
//! deflates the frequency and is deliberately not done here.

use crate::GenotypeMatrix;
use ndarray::{ArrayView1, Axis};

/// Minor allele frequency of one variant column, from non-missing
/// dosages only. Returns 0.0 when every call is missing. Always in
/// [0, 0.5].
pub fn compute_maf(column: ArrayView1<f64>) -> f64 {
    let mut alt_alleles = 0u64;
    let mut total_alleles = 0u64;
    for &g in column.iter() {
        if g.is_finite() {
            alt_alleles += g.round() as u64;
            total_alleles += 2;
        }
    }
    if total_alleles == 0 {
        return 0.0;
    }
    let alt_freq = alt_alleles as f64 / total_alleles as f64;
    alt_freq.min(1.0 - alt_freq)
}

/// Fraction of missing calls in a dosage slice.
pub fn missingness(values: ArrayView1<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let missing = values.iter().filter(|v| !v.is_finite()).count();
    missing as f64 / values.len() as f64
}

/// Keep variants with MAF >= `maf_threshold` (boundary retained) and
/// missingness < `missingness_threshold` (boundary dropped).
///
/// An empty result is a valid output; downstream stages are expected to
/// detect it and report "no variants to test".
pub fn filter_variants(
    geno: &GenotypeMatrix,
    maf_threshold: f64,
    missingness_threshold: f64,
) -> GenotypeMatrix {
    let kept: Vec<usize> = (0..geno.n_snps())
        .filter(|&j| {
            let col = geno.dosages.index_axis(Axis(1), j);
            compute_maf(col) >= maf_threshold && missingness(col) < missingness_threshold
        })
        .collect();

    GenotypeMatrix {
        sample_ids: geno.sample_ids.clone(),
        snp_ids: kept.iter().map(|&j| geno.snp_ids[j].clone()).collect(),
        dosages: geno.dosages.select(Axis(1), &kept),
    }
}

/// Keep samples whose missingness over the (already variant-filtered)
/// matrix is < `missingness_threshold`.
pub fn filter_samples(geno: &GenotypeMatrix, missingness_threshold: f64) -> GenotypeMatrix {
    let kept: Vec<usize> = (0..geno.n_samples())
        .filter(|&i| {
            let row = geno.dosages.index_axis(Axis(0), i);
            missingness(row) < missingness_threshold
        })
        .collect();

    GenotypeMatrix {
        sample_ids: kept.iter().map(|&i| geno.sample_ids[i].clone()).collect(),
        snp_ids: geno.snp_ids.clone(),
        dosages: geno.dosages.select(Axis(0), &kept),
    }
}
