//! Population structure estimation via principal component analysis.
//!
//! Missing dosages are imputed to 0 in a local copy for this
//! computation only; the QC'd genotype matrix used for association
//! testing is never modified.

use crate::{GenotypeMatrix, PcMatrix};
use anyhow::{bail, Result};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;

/// Compute the top `k` principal components of the sample × variant
/// dosage matrix.
///
/// Columns are centered after zero-imputation, the sample covariance
/// structure `X Xᵀ` is eigendecomposed, and samples are scored on the
/// `k` eigenvectors with the largest eigenvalues. Row order of the
/// output matches the input sample order.
///
/// Component signs are not stable between equivalent decompositions;
/// callers (and tests) must not rely on them.
pub fn compute_pcs(geno: &GenotypeMatrix, k: usize) -> Result<PcMatrix> {
    let n = geno.n_samples();
    let m = geno.n_snps();
    if n == 0 || m == 0 {
        bail!("cannot compute PCs: genotype matrix is empty");
    }
    if k == 0 {
        bail!("number of principal components must be at least 1");
    }
    if k > n.min(m) {
        bail!(
            "requested {} PCs but the matrix supports at most {} ({} samples x {} variants)",
            k,
            n.min(m),
            n,
            m
        );
    }

    // Local zero-imputed, column-centered copy.
    let mut centered = DMatrix::<f64>::zeros(n, m);
    for j in 0..m {
        let mut sum = 0.0;
        for i in 0..n {
            let g = geno.dosages[(i, j)];
            let g = if g.is_finite() { g } else { 0.0 };
            centered[(i, j)] = g;
            sum += g;
        }
        let mean = sum / n as f64;
        for i in 0..n {
            centered[(i, j)] -= mean;
        }
    }

    // Eigendecompose X Xᵀ (n x n); eigenvalues are squared singular
    // values of X, so sample scores are u_j * sqrt(lambda_j).
    let gram = &centered * centered.transpose();
    let eig = SymmetricEigen::new(gram);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut pcs = Array2::<f64>::zeros((n, k));
    for (rank, &idx) in order.iter().take(k).enumerate() {
        let scale = eig.eigenvalues[idx].max(0.0).sqrt();
        for i in 0..n {
            pcs[(i, rank)] = eig.eigenvectors[(i, idx)] * scale;
        }
    }

    Ok(PcMatrix {
        sample_ids: geno.sample_ids.clone(),
        pcs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn two_cluster_matrix() -> GenotypeMatrix {
        // Samples 0-4 carry dosage 0 everywhere, samples 5-9 dosage 2:
        // PC1 must separate the two clusters.
        let mut dosages = Array2::<f64>::zeros((10, 6));
        for i in 5..10 {
            for j in 0..6 {
                dosages[(i, j)] = 2.0;
            }
        }
        GenotypeMatrix {
            sample_ids: (0..10).map(|i| format!("S{}", i)).collect(),
            snp_ids: (0..6).map(|j| format!("rs{}", j)).collect(),
            dosages,
        }
    }

    #[test]
    fn pc1_separates_clusters_up_to_sign() {
        let geno = two_cluster_matrix();
        let pcs = compute_pcs(&geno, 2).unwrap();
        assert_eq!(pcs.pcs.dim(), (10, 2));
        assert_eq!(pcs.sample_ids, geno.sample_ids);

        // Signs may flip between decompositions; compare structure.
        let first = pcs.pcs[(0, 0)];
        for i in 0..5 {
            assert!(pcs.pcs[(i, 0)] * first > 0.0, "cluster A not coherent");
        }
        for i in 5..10 {
            assert!(pcs.pcs[(i, 0)] * first < 0.0, "cluster B not separated");
        }

        // Cluster separation dominates the second component.
        let spread1: f64 = (0..10).map(|i| pcs.pcs[(i, 0)].abs()).sum();
        let spread2: f64 = (0..10).map(|i| pcs.pcs[(i, 1)].abs()).sum();
        assert!(spread1 > spread2);
    }

    #[test]
    fn missing_dosages_do_not_poison_scores() {
        let mut geno = two_cluster_matrix();
        geno.dosages[(3, 2)] = f64::NAN;
        let pcs = compute_pcs(&geno, 1).unwrap();
        assert!(pcs.pcs.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn rejects_degenerate_requests() {
        let geno = two_cluster_matrix();
        assert!(compute_pcs(&geno, 0).is_err());
        assert!(compute_pcs(&geno, 7).is_err());

        let empty = GenotypeMatrix {
            sample_ids: vec![],
            snp_ids: vec![],
            dosages: Array2::zeros((0, 0)),
        };
        assert!(compute_pcs(&empty, 1).is_err());
    }
}
