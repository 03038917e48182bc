//! Typed builder for every path inside the output directory.

use std::path::{Path, PathBuf};
use crate::hic::ChromPair;

/// Subprocess output across the whole run is appended to `<output>/LOG`.
const LOG: &'static str = "log.txt";
/// Resolved run parameters are stored in `<output>/PARAMS`.
const PARAMS: &'static str = "params.json";
/// Shared fragments reference, generated once per run.
const FRAGMENTS: &'static str = "fragments.txt";
/// File, created on the successful completion.
const SUCCESS: &'static str = "success";
/// Raw counts are stored in `<output>/<sample>/CONTACT_COUNTS/<c1>_<c2>_counts.txt`.
const CONTACT_COUNTS: &'static str = "contactcounts";
/// Reformatted counts are stored in `<output>/<sample>/contactcounts/MODIFIED/`.
const MODIFIED: &'static str = "modified";
/// Per-pair significance outputs are stored in `<output>/<sample>/SIG_INTERACTIONS/<pair file>/`.
const SIG_INTERACTIONS: &'static str = "chr_sig_interactions";
/// Combined results are stored in `<output>/COMBINED_DIR/<sample>/COMBINED_FILE`.
const COMBINED_DIR: &'static str = "Significant_Interactions";
const COMBINED_FILE: &'static str = "significant_interactions.txt";

/// Path builder, keyed by the output root; all run paths come from here.
#[derive(Debug, Clone)]
pub(super) struct OutPaths {
    root: PathBuf,
}

impl OutPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tool_log(&self) -> PathBuf {
        self.root.join(LOG)
    }

    pub fn params(&self) -> PathBuf {
        self.root.join(PARAMS)
    }

    pub fn fragments(&self) -> PathBuf {
        self.root.join(FRAGMENTS)
    }

    pub fn success(&self) -> PathBuf {
        self.root.join(SUCCESS)
    }

    pub fn contact_counts_dir(&self, sample: &str) -> PathBuf {
        self.root.join(sample).join(CONTACT_COUNTS)
    }

    pub fn modified_dir(&self, sample: &str) -> PathBuf {
        self.contact_counts_dir(sample).join(MODIFIED)
    }

    pub fn raw_counts(&self, sample: &str, pair: &ChromPair) -> PathBuf {
        self.contact_counts_dir(sample).join(pair.counts_filename())
    }

    pub fn modified_counts(&self, sample: &str, pair: &ChromPair) -> PathBuf {
        self.modified_dir(sample).join(pair.counts_filename())
    }

    pub fn sig_dir(&self, sample: &str) -> PathBuf {
        self.root.join(sample).join(SIG_INTERACTIONS)
    }

    /// Output directory of the significance caller, keyed by the contact file name.
    pub fn pair_sig_dir(&self, sample: &str, counts_filename: &str) -> PathBuf {
        self.sig_dir(sample).join(counts_filename)
    }

    pub fn combined(&self, sample: &str) -> PathBuf {
        self.root.join(COMBINED_DIR).join(sample).join(COMBINED_FILE)
    }
}
