//! VCF genotype loading.
//!
//! The core pipeline consumes exactly one tuple per variant: ID, CHROM,
//! POS, and a per-sample diploid genotype converted to an
//! alternate-allele dosage in {0, 1, 2} or missing. Everything else in
//! the record (REF/ALT/QUAL/FILTER/INFO) is ignored.

use anyhow::{anyhow, bail, Context, Result};
use flate2::read::MultiGzDecoder;
use lingwas_core::{GenotypeMatrix, SiteMap, VariantSite};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn open_vcf(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .with_context(|| format!("cannot open genotype file {}", path.display()))?;
    let lower = path.to_string_lossy().to_ascii_lowercase();
    if lower.ends_with(".gz") || lower.ends_with(".bgz") {
        Ok(Box::new(BufReader::with_capacity(
            64 * 1024,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(64 * 1024, file)))
    }
}

/// Convert a GT string ("0|1", "1/1", "./.", ...) to an
/// alternate-allele dosage. Any missing allele makes the whole call
/// missing.
fn gt_to_dosage(gt: &str) -> Option<f64> {
    let mut dosage = 0u8;
    for allele in gt.split(|c| c == '|' || c == '/') {
        if allele == "." || allele.is_empty() {
            return None;
        }
        let idx: u8 = allele.parse().ok()?;
        if idx > 0 {
            dosage += 1;
        }
    }
    Some(dosage as f64)
}

/// Read a VCF (plain or gzipped) into a samples × variants dosage
/// matrix plus the chromosome/position lookup.
///
/// Records without an ID get `chrom:pos` as a fallback; duplicate
/// variant IDs are an input error because the ID is the join key for
/// every downstream table.
pub fn read_vcf<P: AsRef<Path>>(path: P) -> Result<(GenotypeMatrix, SiteMap)> {
    let path = path.as_ref();
    let reader = open_vcf(path)?;

    let mut sample_ids: Vec<String> = Vec::new();
    let mut snp_ids: Vec<String> = Vec::new();
    let mut sites = SiteMap::new();
    let mut dosage_cols: Vec<Vec<f64>> = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read error at VCF line {}", lineno + 1))?;
        if line.starts_with("##") || line.trim().is_empty() {
            continue;
        }
        if line.starts_with("#CHROM") {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 10 {
                bail!("VCF header has no sample columns");
            }
            sample_ids = fields[9..].iter().map(|s| s.to_string()).collect();
            continue;
        }

        if sample_ids.is_empty() {
            bail!("VCF data line {} appears before the #CHROM header", lineno + 1);
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 10 {
            bail!(
                "VCF line {} has {} columns, expected at least 10",
                lineno + 1,
                fields.len()
            );
        }

        let chrom = fields[0].to_string();
        let pos: u64 = fields[1]
            .parse()
            .with_context(|| format!("invalid POS '{}' at VCF line {}", fields[1], lineno + 1))?;
        let id = if fields[2] == "." || fields[2].is_empty() {
            format!("{}:{}", chrom, pos)
        } else {
            fields[2].to_string()
        };

        let gt_index = fields[8]
            .split(':')
            .position(|key| key == "GT")
            .ok_or_else(|| anyhow!("no GT field in FORMAT at VCF line {}", lineno + 1))?;

        let mut column = Vec::with_capacity(sample_ids.len());
        for sample in &fields[9..] {
            let gt = sample.split(':').nth(gt_index).unwrap_or(".");
            column.push(gt_to_dosage(gt).unwrap_or(f64::NAN));
        }
        if column.len() != sample_ids.len() {
            bail!(
                "VCF line {} has {} genotype calls for {} samples",
                lineno + 1,
                column.len(),
                sample_ids.len()
            );
        }

        if !sites.insert(id.clone(), VariantSite { chrom, pos }) {
            bail!("duplicate variant ID '{}' at VCF line {}", id, lineno + 1);
        }
        snp_ids.push(id);
        dosage_cols.push(column);
    }

    if sample_ids.is_empty() {
        bail!("no #CHROM header found in {}", path.display());
    }

    let n_samples = sample_ids.len();
    let n_snps = snp_ids.len();
    let dosages = Array2::from_shape_fn((n_samples, n_snps), |(i, j)| dosage_cols[j][i]);

    Ok((
        GenotypeMatrix {
            sample_ids,
            snp_ids,
            dosages,
        },
        sites,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3";

    fn write_vcf(lines: &[&str]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "##fileformat=VCFv4.2").unwrap();
        writeln!(f, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        f.flush().unwrap();
        f
    }

    #[test]
    fn gt_dosages_handle_both_separators() {
        assert_eq!(gt_to_dosage("0|0"), Some(0.0));
        assert_eq!(gt_to_dosage("0/1"), Some(1.0));
        assert_eq!(gt_to_dosage("1|1"), Some(2.0));
        assert_eq!(gt_to_dosage("./."), None);
        assert_eq!(gt_to_dosage(".|1"), None);
    }

    #[test]
    fn reads_dosages_and_coordinates() {
        let f = write_vcf(&[
            "1\t100\trs1\tA\tG\t.\tPASS\t.\tGT\t0|0\t0|1\t1|1",
            "2\t250\trs2\tC\tT\t.\tPASS\t.\tGT:DP\t1/1:10\t0/0:12\t./.:0",
        ]);

        let (geno, sites) = read_vcf(f.path()).unwrap();
        assert_eq!(geno.sample_ids, vec!["S1", "S2", "S3"]);
        assert_eq!(geno.snp_ids, vec!["rs1", "rs2"]);
        assert_eq!(geno.dosages[(0, 0)], 0.0);
        assert_eq!(geno.dosages[(1, 0)], 1.0);
        assert_eq!(geno.dosages[(2, 0)], 2.0);
        assert_eq!(geno.dosages[(0, 1)], 2.0);
        assert!(geno.dosages[(2, 1)].is_nan());

        let site = sites.get("rs2").unwrap();
        assert_eq!(site.chrom, "2");
        assert_eq!(site.pos, 250);
    }

    #[test]
    fn missing_id_falls_back_to_coordinates() {
        let f = write_vcf(&["3\t42\t.\tA\tG\t.\tPASS\t.\tGT\t0|0\t0|0\t0|1"]);
        let (geno, sites) = read_vcf(f.path()).unwrap();
        assert_eq!(geno.snp_ids, vec!["3:42"]);
        assert!(sites.get("3:42").is_some());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let f = write_vcf(&[
            "1\t100\trs1\tA\tG\t.\tPASS\t.\tGT\t0|0\t0|1\t1|1",
            "1\t200\trs1\tA\tG\t.\tPASS\t.\tGT\t0|0\t0|1\t1|1",
        ]);
        assert!(read_vcf(f.path()).is_err());
    }

    #[test]
    fn data_before_header_is_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "1\t100\trs1\tA\tG\t.\tPASS\t.\tGT\t0|0").unwrap();
        f.flush().unwrap();
        assert!(read_vcf(f.path()).is_err());
    }
}
