//! Sample manifest: a flat text file with one line per sample,
//! two whitespace-separated tokens: matrix file path and sample name.

use std::{
    io::BufRead,
    path::{Path, PathBuf},
};
use crate::{
    err::{add_path, error},
    ext,
};

/// One Hi-C sample: path to the raw contact matrix and a unique name.
/// The name doubles as a directory key under the output root.
#[derive(Debug, Clone)]
pub struct Sample {
    matrix: PathBuf,
    name: String,
}

impl Sample {
    pub fn matrix(&self) -> &Path {
        &self.matrix
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered list of samples, loaded from the manifest.
#[derive(Debug, Clone)]
pub struct SampleList {
    samples: Vec<Sample>,
}

impl SampleList {
    /// Loads the manifest, preserving sample order.
    /// Empty lines and `#` comments are skipped, sample names must be unique.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let reader = ext::sys::open(path).map_err(add_path!(path))?;
        Self::from_reader(reader).map_err(|e| match e {
            crate::Error::MalformedRecord(msg) =>
                error!(MalformedRecord, "{}: {}", ext::fmt::path(path), msg),
            crate::Error::InvalidInput(msg) =>
                error!(InvalidInput, "{}: {}", ext::fmt::path(path), msg),
            e => e,
        })
    }

    fn from_reader(reader: impl BufRead) -> crate::Result<Self> {
        let mut samples: Vec<Sample> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(add_path!(!))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<_> = line.split_whitespace().collect();
            if fields.len() != 2 {
                return Err(error!(MalformedRecord,
                    "line {}: expected `<matrix path> <sample name>`, found {:?}", i + 1, line));
            }
            let (matrix, name) = (fields[0], fields[1]);
            if name.contains('/') || name == "." || name == ".." {
                return Err(error!(InvalidInput, "line {}: sample name {:?} cannot be used as a directory",
                    i + 1, name));
            }
            if samples.iter().any(|sample| sample.name == name) {
                return Err(error!(InvalidInput, "line {}: duplicate sample name {:?}", i + 1, name));
            }
            samples.push(Sample {
                matrix: PathBuf::from(matrix),
                name: name.to_owned(),
            });
        }
        if samples.is_empty() {
            return Err(error!(InvalidInput, "no samples found"));
        }
        Ok(Self { samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn order_preserved() {
        let text = "\
            # Hi-C matrices\n\
            /data/b.hic second\n\
            \n\
            /data/a.hic first\n";
        let samples = SampleList::from_reader(text.as_bytes()).unwrap();
        assert_eq!(samples.len(), 2);
        let names: Vec<_> = samples.iter().map(Sample::name).collect();
        assert_eq!(names, ["second", "first"]);
        assert_eq!(samples.iter().next().unwrap().matrix(), Path::new("/data/b.hic"));
    }

    #[test]
    fn duplicate_names() {
        let text = "/data/a.hic s1\n/data/b.hic s1\n";
        assert!(SampleList::from_reader(text.as_bytes()).is_err());
    }

    #[test]
    fn malformed_line() {
        let text = "/data/a.hic s1\n/data/b.hic\n";
        match SampleList::from_reader(text.as_bytes()) {
            Err(crate::Error::MalformedRecord(msg)) => assert!(msg.contains("line 2")),
            other => panic!("Expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn empty_manifest() {
        assert!(SampleList::from_reader("# nothing here\n".as_bytes()).is_err());
    }
}
