//! lingwas-io: file I/O for the lingwas toolkit.
//!
//! - Whitespace-delimited phenotype files (FID, IID, trait).
//! - VCF genotype files, plain or gzipped (see [`vcf`]).
//! - The PLINK-style association results table.

pub mod vcf;

use anyhow::{anyhow, Context, Result};
use lingwas_core::{AssociationResult, PhenotypeTable};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub use vcf::read_vcf;

/// Read a phenotype file: whitespace-delimited, no header, three
/// columns per line (family ID, sample ID, trait value).
///
/// Trait values that fail numeric coercion become `NAN` and are later
/// excluded by the association join rather than aborting the load.
pub fn read_phenotypes<P: AsRef<Path>>(path: P) -> Result<PhenotypeTable> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open phenotype file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut family_ids = Vec::new();
    let mut sample_ids = Vec::new();
    let mut values = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let fid = fields
            .next()
            .ok_or_else(|| anyhow!("phenotype line {} is empty", lineno + 1))?;
        let iid = fields.next().ok_or_else(|| {
            anyhow!("phenotype line {} is missing the sample ID column", lineno + 1)
        })?;
        let raw = fields.next().ok_or_else(|| {
            anyhow!("phenotype line {} is missing the trait column", lineno + 1)
        })?;

        family_ids.push(fid.to_string());
        sample_ids.push(iid.to_string());
        values.push(raw.parse::<f64>().unwrap_or(f64::NAN));
    }

    Ok(PhenotypeTable {
        family_ids,
        sample_ids,
        values,
    })
}

/// Write the association results table: CSV with header
/// `CHR,SNP,BP,TEST,NMISS,BETA,STAT,P`, one row per tested variant.
pub fn write_results<P: AsRef<Path>>(path: P, results: &[AssociationResult]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create results file {}", path.display()))?;

    wtr.write_record(["CHR", "SNP", "BP", "TEST", "NMISS", "BETA", "STAT", "P"])?;
    for r in results {
        wtr.write_record([
            r.chrom.as_str(),
            r.snp.as_str(),
            &r.bp.to_string(),
            r.test.as_str(),
            &r.nmiss.to_string(),
            &r.beta.to_string(),
            &r.stat.to_string(),
            &r.p.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn phenotypes_parse_three_columns() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "FAM1 S1 1.25").unwrap();
        writeln!(f, "FAM1\tS2\t-0.5").unwrap();
        f.flush().unwrap();

        let pheno = read_phenotypes(f.path()).unwrap();
        assert_eq!(pheno.sample_ids, vec!["S1", "S2"]);
        assert_eq!(pheno.family_ids, vec!["FAM1", "FAM1"]);
        assert_eq!(pheno.values, vec![1.25, -0.5]);
    }

    #[test]
    fn non_numeric_trait_becomes_missing() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "FAM1 S1 NA").unwrap();
        writeln!(f, "FAM1 S2 2.0").unwrap();
        f.flush().unwrap();

        let pheno = read_phenotypes(f.path()).unwrap();
        assert!(pheno.values[0].is_nan());
        assert_eq!(pheno.values[1], 2.0);
    }

    #[test]
    fn truncated_phenotype_line_is_an_error() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "FAM1 S1").unwrap();
        f.flush().unwrap();

        assert!(read_phenotypes(f.path()).is_err());
    }

    #[test]
    fn results_table_round_trips_header_and_rows() {
        let results = vec![AssociationResult {
            chrom: "1".into(),
            snp: "rs1".into(),
            bp: 1234,
            test: "ADD".into(),
            nmiss: 100,
            beta: 0.5,
            stat: 3.2,
            p: 0.0014,
        }];

        let f = NamedTempFile::new().unwrap();
        write_results(f.path(), &results).unwrap();

        let text = std::fs::read_to_string(f.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "CHR,SNP,BP,TEST,NMISS,BETA,STAT,P");
        assert_eq!(lines.next().unwrap(), "1,rs1,1234,ADD,100,0.5,3.2,0.0014");
    }
}
