//! Locations and invocation of the three external tools:
//! matrix dump (Juicer Tools), fragment generation and significance calling (Fit-Hi-C).

use std::{
    path::{Path, PathBuf},
    process::Command,
    time::Instant,
};
use crate::{
    Error,
    err::add_path,
    ext,
    hic::{ChromPair, ContactType},
};
use super::ToolLog;

/// Significance caller script, relative to the Fit-Hi-C installation directory.
const FITHIC_SCRIPT: &'static str = "fithic/fithic.py";
/// Fixed-size fragment generator, relative to the Fit-Hi-C installation directory.
const FRAGMENTS_SCRIPT: &'static str = "fithic/utils/createFitHiCFragments-fixedsize.py";

/// Resolved locations of everything needed to start the external tools.
#[derive(Debug)]
pub struct Tools {
    java: PathBuf,
    python: PathBuf,
    juicer_jar: PathBuf,
    fithic_dir: PathBuf,
}

impl Tools {
    fn new(java: PathBuf, python: PathBuf, juicer_jar: PathBuf, fithic_dir: PathBuf) -> Self {
        Self { java, python, juicer_jar, fithic_dir }
    }

    /// Locates the interpreters on PATH and checks that the jar and both scripts exist.
    pub fn resolve(
        java: &Path,
        python: &Path,
        juicer_jar: PathBuf,
        fithic_dir: PathBuf,
    ) -> crate::Result<Self>
    {
        let java = ext::sys::find_exe(java)?;
        let python = ext::sys::find_exe(python)?;
        if !juicer_jar.exists() {
            return Err(Error::MissingFile(juicer_jar));
        }
        for script in [FITHIC_SCRIPT, FRAGMENTS_SCRIPT] {
            let path = fithic_dir.join(script);
            if !path.exists() {
                return Err(Error::MissingFile(path));
            }
        }
        Ok(Self::new(java, python, juicer_jar, fithic_dir))
    }

    /// Matrix dump command: VC-normalized observed counts for one chromosome pair
    /// at base-pair resolution, written to `out_path`.
    pub fn dump_command(&self, matrix: &Path, pair: &ChromPair, resolution: u32, out_path: &Path) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.arg("-jar").arg(&self.juicer_jar)
            .args(&["dump", "observed", "VC"])
            .arg(matrix)
            .args(&[pair.first(), pair.second()])
            .args(&["BP", &resolution.to_string()])
            .arg("-p").arg(out_path);
        cmd
    }

    /// Fragment generation command: fixed-size bins over the whole genome.
    pub fn fragments_command(&self, chrom_sizes: &Path, out_path: &Path, resolution: u32) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg(self.fithic_dir.join(FRAGMENTS_SCRIPT))
            .arg("--chrLens").arg(chrom_sizes)
            .arg("--outFile").arg(out_path)
            .args(&["--resolution", &resolution.to_string()]);
        cmd
    }

    /// Significance calling command for one gzipped contact file.
    pub fn significance_command(
        &self,
        interactions: &Path,
        fragments: &Path,
        out_dir: &Path,
        resolution: u32,
        contact_type: ContactType,
    ) -> Command
    {
        let mut cmd = Command::new(&self.python);
        cmd.arg(self.fithic_dir.join(FITHIC_SCRIPT))
            .arg("--interactions").arg(interactions)
            .arg("--fragments").arg(fragments)
            .arg("--outdir").arg(out_dir)
            .args(&["--resolution", &resolution.to_string()])
            .args(&["--contactType", contact_type.arg()]);
        cmd
    }
}

/// Runs a tool to completion, appending its captured output to the tool log.
/// Non-zero exit status becomes `Error::ToolFail`.
pub fn run_tool(name: &'static str, mut cmd: Command, tool_log: &ToolLog) -> crate::Result<()> {
    log::debug!("    {}", ext::fmt::command(&cmd));
    let start = Instant::now();
    let output = cmd.output().map_err(add_path!(!))?;
    log::debug!("    Finished in {}", ext::fmt::Duration(start.elapsed()));
    tool_log.record(&cmd, &output)?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::ToolFail(name, output))
    }
}
