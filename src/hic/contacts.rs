//! Reformatting and filtering of contact count files.

use std::{
    fs::File,
    io::{BufRead, BufWriter, Write},
    path::Path,
};
use crate::{
    err::{add_path, error},
    ext,
};
use super::ChromPair;

/// Rewrites three-field dump output (`bin1 bin2 count`) into the five-field layout
/// `chrom1 bin1 chrom2 bin2 count`, prefixing both chromosome labels of the pair.
/// Returns the number of records written.
pub fn reformat(raw_path: &Path, out_path: &Path, pair: &ChromPair) -> crate::Result<u64> {
    let reader = ext::sys::open(raw_path).map_err(add_path!(raw_path))?;
    let mut writer = BufWriter::new(File::create(out_path).map_err(add_path!(out_path))?);
    let mut count = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(add_path!(raw_path))?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(bin1), Some(bin2), Some(value)) => {
                writeln!(writer, "{} {} {} {} {}", pair.first(), bin1, pair.second(), bin2, value)
                    .map_err(add_path!(out_path))?;
                count += 1;
            }
            _ => return Err(error!(MalformedRecord,
                "{}: line {} has fewer than three fields", ext::fmt::path(raw_path), i + 1)),
        }
    }
    writer.flush().map_err(add_path!(out_path))?;
    Ok(count)
}

/// Drops every record whose fifth field is the literal token `Infinity`
/// (normalization artifact for bins with no coverage).
/// Rewrites the file in place through a temporary file, idempotent.
/// Returns the numbers of kept and dropped records.
pub fn filter_infinity(path: &Path) -> crate::Result<(u64, u64)> {
    let tmp_path = ext::sys::append_path(path, ".tmp");
    let reader = ext::sys::open(path).map_err(add_path!(path))?;
    let mut writer = BufWriter::new(File::create(&tmp_path).map_err(add_path!(tmp_path))?);
    let mut kept = 0;
    let mut dropped = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(add_path!(path))?;
        if line.trim().is_empty() {
            continue;
        }
        let value = line.split_whitespace().nth(4).ok_or_else(|| error!(MalformedRecord,
            "{}: line {} has fewer than five fields", ext::fmt::path(path), i + 1))?;
        if value == "Infinity" {
            dropped += 1;
        } else {
            writeln!(writer, "{}", line).map_err(add_path!(tmp_path))?;
            kept += 1;
        }
    }
    writer.flush().map_err(add_path!(tmp_path))?;
    drop(writer);
    std::fs::rename(&tmp_path, path).map_err(add_path!(tmp_path, path))?;
    Ok((kept, dropped))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn reformat_prefixes_labels() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("chr1_chr2_counts.txt");
        let out = dir.path().join("modified.txt");
        fs::write(&raw, "0\t500000\t12.5\n500000 1000000 3.0\n").unwrap();

        let pair = ChromPair::new("chr1", "chr2");
        let n = reformat(&raw, &out, &pair).unwrap();
        assert_eq!(n, 2);
        assert_eq!(fs::read_to_string(&out).unwrap(),
            "chr1 0 chr2 500000 12.5\nchr1 500000 chr2 1000000 3.0\n");
    }

    #[test]
    fn reformat_rejects_short_lines() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.txt");
        let out = dir.path().join("modified.txt");
        fs::write(&raw, "0 500000 1.0\n500000 1000000\n").unwrap();

        let pair = ChromPair::new("chr1", "chr1");
        match reformat(&raw, &out, &pair) {
            Err(crate::Error::MalformedRecord(msg)) => assert!(msg.contains("line 2")),
            other => panic!("Expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn filter_drops_infinite_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.txt");
        fs::write(&path,
            "chr1 0 chr1 500000 2.5\n\
            chr1 0 chr1 1000000 Infinity\n\
            chr1 500000 chr1 500000 7.0\n").unwrap();

        let (kept, dropped) = filter_infinity(&path).unwrap();
        assert_eq!((kept, dropped), (2, 1));
        let first_pass = fs::read_to_string(&path).unwrap();
        assert_eq!(first_pass, "chr1 0 chr1 500000 2.5\nchr1 500000 chr1 500000 7.0\n");

        // Idempotent: the second pass changes nothing.
        let (kept, dropped) = filter_infinity(&path).unwrap();
        assert_eq!((kept, dropped), (2, 0));
        assert_eq!(fs::read_to_string(&path).unwrap(), first_pass);
    }

    #[test]
    fn filter_rejects_short_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.txt");
        fs::write(&path, "chr1 0 chr1 500000\n").unwrap();
        assert!(matches!(filter_infinity(&path), Err(crate::Error::MalformedRecord(_))));
    }
}
