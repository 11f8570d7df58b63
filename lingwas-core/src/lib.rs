//! lingwas-core: shared data structures, genotype QC, and PCA for the
//! lingwas toolkit.
//!
//! Everything downstream of the loaders works with the types defined
//! here: a samples × variants dosage matrix, a phenotype table keyed by
//! sample ID, an immutable variant coordinate map, and the per-variant
//! association record.

pub mod pca;
pub mod qc;

use ndarray::Array2;
use std::collections::HashMap;

pub type SampleId = String;
pub type SnpId = String;

/// Genomic coordinates for one variant.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantSite {
    pub chrom: String,
    /// 1-based position on the chromosome.
    pub pos: u64,
}

/// Read-only chromosome/position lookup, built once by the loader and
/// passed by reference into the association tester and the formatter.
#[derive(Clone, Debug, Default)]
pub struct SiteMap {
    sites: HashMap<SnpId, VariantSite>,
}

impl SiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant's coordinates. Returns false if the ID was
    /// already present (callers treat duplicate IDs as an input error).
    pub fn insert(&mut self, snp: SnpId, site: VariantSite) -> bool {
        self.sites.insert(snp, site).is_none()
    }

    pub fn get(&self, snp: &str) -> Option<&VariantSite> {
        self.sites.get(snp)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Diploid dosage matrix: samples × variants.
///
/// Each cell is the alternate-allele count for that sample at that
/// variant (0.0, 1.0 or 2.0); `f64::NAN` marks a missing call. Sample
/// and SNP IDs are unique within a matrix.
#[derive(Clone, Debug)]
pub struct GenotypeMatrix {
    pub sample_ids: Vec<SampleId>,
    pub snp_ids: Vec<SnpId>,
    /// Shape: (n_samples, n_snps).
    pub dosages: Array2<f64>,
}

impl GenotypeMatrix {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn n_snps(&self) -> usize {
        self.snp_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty() || self.snp_ids.is_empty()
    }
}

/// Phenotype table for a single continuous trait.
///
/// Rows correspond 1:1 across the three vectors. Trait values that
/// failed numeric coercion at load time are stored as `f64::NAN` and
/// are dropped by the association join.
#[derive(Clone, Debug)]
pub struct PhenotypeTable {
    pub family_ids: Vec<String>,
    pub sample_ids: Vec<SampleId>,
    pub values: Vec<f64>,
}

impl PhenotypeTable {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }
}

/// Principal components matrix.
#[derive(Clone, Debug)]
pub struct PcMatrix {
    pub sample_ids: Vec<SampleId>,
    /// Shape: (n_samples, n_pcs), row order matches the genotype matrix
    /// the PCs were computed from.
    pub pcs: Array2<f64>,
}

impl PcMatrix {
    pub fn n_pcs(&self) -> usize {
        self.pcs.ncols()
    }
}

/// One tested variant, immutable once emitted.
#[derive(Clone, Debug)]
pub struct AssociationResult {
    pub chrom: String,
    pub snp: SnpId,
    pub bp: u64,
    /// Test label, "ADD" for the additive dosage test.
    pub test: String,
    /// Samples used for this variant after the phenotype join.
    pub nmiss: usize,
    pub beta: f64,
    pub stat: f64,
    pub p: f64,
}
