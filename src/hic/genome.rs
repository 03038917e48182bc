//! Chromosome sets and contact pairs.

use std::{
    fmt,
    collections::HashSet,
    io::BufRead,
    path::Path,
};
use crate::{
    Error,
    err::{add_path, error},
    ext,
};

/// Intra- or inter-chromosomal contact.
/// Passed to the significance caller as a discrete parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    Intra,
    Inter,
}

impl ContactType {
    /// Argument value, expected by the significance caller.
    pub fn arg(self) -> &'static str {
        match self {
            Self::Intra => "intraOnly",
            Self::Inter => "interOnly",
        }
    }
}

/// Unordered pair of chromosome labels.
/// Always stored in generation order: `first` does not come after `second` in the source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromPair {
    first: String,
    second: String,
}

impl ChromPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Pairs of a chromosome with itself are intra-chromosomal, all others inter-chromosomal.
    pub fn contact_type(&self) -> ContactType {
        if self.first == self.second { ContactType::Intra } else { ContactType::Inter }
    }

    /// Name of the per-pair counts file.
    pub fn counts_filename(&self) -> String {
        format!("{}_{}_counts.txt", self.first, self.second)
    }

    /// Recovers the pair from a counts file name (first two `_`-delimited tokens).
    /// Returns None if the name does not contain two non-empty tokens.
    pub fn from_counts_filename(name: &str) -> Option<Self> {
        let mut tokens = name.split('_');
        match (tokens.next(), tokens.next()) {
            (Some(first), Some(second)) if !first.is_empty() && !second.is_empty() =>
                Some(Self::new(first, second)),
            _ => None,
        }
    }
}

impl fmt::Display for ChromPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Ordered set of unique chromosome labels.
#[derive(Debug, Clone)]
pub struct ChromSet {
    names: Vec<String>,
}

impl ChromSet {
    /// Creates a chromosome set from preordered labels.
    /// Labels must be unique, non-empty and usable as file name components.
    pub fn new(names: Vec<String>) -> crate::Result<Self> {
        if names.is_empty() {
            return Err(error!(InvalidInput, "Chromosome set is empty"));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in names.iter() {
            if name.is_empty() || name.contains(char::is_whitespace) || name.contains('/') {
                return Err(error!(InvalidInput, "Invalid chromosome label {:?}", name));
            }
            if !seen.insert(name) {
                return Err(error!(InvalidInput, "Duplicate chromosome label {:?}", name));
            }
        }
        Ok(Self { names })
    }

    /// Reads labels from the first column of a chromosome sizes file, preserving file order.
    /// Empty lines and `#` comments are skipped.
    pub fn from_chrom_sizes(path: &Path) -> crate::Result<Self> {
        let reader = ext::sys::open(path).map_err(add_path!(path))?;
        let mut names = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(add_path!(path))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // First token is the label, the remaining columns belong to the sizes format.
            names.push(line.split_whitespace().next().unwrap().to_owned());
        }
        Self::new(names).map_err(|e| match e {
            Error::InvalidInput(msg) => error!(InvalidInput, "{}: {}", ext::fmt::path(path), msg),
            e => e,
        })
    }

    /// Parses a comma-separated list of labels, such as `chr1,chr2,chrX`.
    pub fn from_list(s: &str) -> crate::Result<Self> {
        Self::new(s.split(',').map(|name| name.trim().to_owned()).collect())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// All pairs `(i, j)` with `i <= j`: the upper triangle including the diagonal.
    /// For `n` chromosomes produces `n * (n + 1) / 2` pairs, each unordered pair exactly once.
    pub fn pairs(&self) -> Vec<ChromPair> {
        let n = self.names.len();
        let mut pairs = Vec::with_capacity(n * (n + 1) / 2);
        for (i, first) in self.names.iter().enumerate() {
            for second in self.names[i..].iter() {
                pairs.push(ChromPair::new(first.clone(), second.clone()));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use super::*;

    #[rstest]
    #[case(1, 1)]
    #[case(2, 3)]
    #[case(5, 15)]
    #[case(21, 231)]
    fn pair_count(#[case] n: usize, #[case] expected: usize) {
        let names = (1..=n).map(|i| format!("chr{}", i)).collect();
        let chroms = ChromSet::new(names).unwrap();
        let pairs = chroms.pairs();
        assert_eq!(pairs.len(), expected);
        // Each unordered pair appears exactly once.
        let mut seen = HashSet::new();
        for pair in pairs.iter() {
            let key = (pair.first().to_owned(), pair.second().to_owned());
            assert!(seen.insert(key), "Pair {} produced twice", pair);
        }
    }

    #[test]
    fn pair_order() {
        let chroms = ChromSet::from_list("chr1,chr2").unwrap();
        let pairs = chroms.pairs();
        assert_eq!(pairs, vec![
            ChromPair::new("chr1", "chr1"),
            ChromPair::new("chr1", "chr2"),
            ChromPair::new("chr2", "chr2"),
        ]);
    }

    #[rstest]
    #[case("chr1_chr1_counts.txt", ContactType::Intra)]
    #[case("chr1_chr2_counts.txt", ContactType::Inter)]
    #[case("chrX_chrX_counts.txt", ContactType::Intra)]
    #[case("chr19_chrY_counts.txt", ContactType::Inter)]
    fn contact_type_from_filename(#[case] name: &str, #[case] expected: ContactType) {
        let pair = ChromPair::from_counts_filename(name).unwrap();
        assert_eq!(pair.contact_type(), expected);
    }

    #[test]
    fn filename_roundtrip() {
        for pair in ChromSet::from_list("chr1,chr2,chrX").unwrap().pairs() {
            let recovered = ChromPair::from_counts_filename(&pair.counts_filename()).unwrap();
            assert_eq!(recovered, pair);
            assert_eq!(recovered.contact_type(), pair.contact_type());
        }
    }

    #[test]
    fn bad_filenames() {
        assert!(ChromPair::from_counts_filename("counts.txt").is_none());
        assert!(ChromPair::from_counts_filename("_chr1_counts.txt").is_none());
    }

    #[test]
    fn duplicate_labels() {
        assert!(ChromSet::from_list("chr1,chr2,chr1").is_err());
        assert!(ChromSet::from_list("chr1,,chr2").is_err());
    }

    #[test]
    fn from_chrom_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.chrom.sizes");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "# assembly mm10").unwrap();
        writeln!(f, "chr1\t195471971").unwrap();
        writeln!(f, "chr2\t182113224").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "chrX\t171031299").unwrap();
        drop(f);

        let chroms = ChromSet::from_chrom_sizes(&path).unwrap();
        assert_eq!(chroms.names(), ["chr1", "chr2", "chrX"]);
        assert_eq!(chroms.pairs().len(), 6);
    }
}
