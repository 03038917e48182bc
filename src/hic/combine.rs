//! Aggregation of per-pair significant interaction files into one combined file.

use std::{
    fs,
    io::{BufRead, Write},
    path::{Path, PathBuf},
};
use crate::{
    FailurePolicy,
    err::add_path,
    ext,
};

/// Aggregation counters, reported after the stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CombineStats {
    pub n_files: usize,
    pub n_lines: u64,
    pub n_skipped: usize,
}

/// Concatenates every gzip result file under each root's immediate subdirectories into `out_path`.
/// Roots are visited in the given order, subdirectories and files in sorted order,
/// so the output is reproducible across platforms.
/// Under `FailurePolicy::Skip` an unreadable file loses its contribution and aggregation continues.
pub fn combine(roots: &[PathBuf], out_path: &Path, policy: FailurePolicy) -> crate::Result<CombineStats> {
    let mut writer = ext::sys::create_uncompressed(out_path).map_err(add_path!(out_path))?;
    let mut stats = CombineStats::default();
    for root in roots.iter() {
        let mut subdirs = Vec::new();
        for entry in fs::read_dir(root).map_err(add_path!(root))? {
            let entry = entry.map_err(add_path!(root))?;
            if entry.file_type().map_err(add_path!(root))?.is_dir() {
                subdirs.push(entry.path());
            }
        }
        subdirs.sort();
        for subdir in subdirs.iter() {
            let mut files = ext::sys::filenames_with_ext(subdir, "gz").map_err(add_path!(subdir))?;
            files.sort();
            for file in files.iter() {
                match append_lines(file, &mut writer, out_path) {
                    Ok(n) => {
                        stats.n_files += 1;
                        stats.n_lines += n;
                    }
                    Err(e) => match policy {
                        FailurePolicy::Skip => {
                            log::error!("Skipping {}: {}", ext::fmt::path(file), e.display());
                            stats.n_skipped += 1;
                        }
                        FailurePolicy::Abort => return Err(e),
                    }
                }
            }
        }
    }
    writer.flush().map_err(add_path!(out_path))?;
    Ok(stats)
}

fn append_lines(path: &Path, writer: &mut impl Write, out_path: &Path) -> crate::Result<u64> {
    let reader = ext::sys::open(path).map_err(add_path!(path))?;
    let mut count = 0;
    for line in reader.lines() {
        let line = line.map_err(add_path!(path))?;
        writeln!(writer, "{}", line).map_err(add_path!(out_path))?;
        count += 1;
    }
    Ok(count)
}
