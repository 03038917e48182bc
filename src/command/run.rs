//! Run the full pipeline: contact extraction, fragment generation,
//! significance calling and aggregation.

use std::{
    cmp::max,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use colored::Colorize;
use const_format::str_repeat;
use crate::{
    Error,
    err::{add_path, error, validate_param},
    ext,
    hic::{ChromSet, ChromPair, Sample, SampleList, contacts, combine},
    pipeline::{self, Policies, ToolLog, tools::{self, Tools}, extract::{self, ExtractJob}},
};
use super::paths::OutPaths;

struct Args {
    samples: Option<PathBuf>,
    output: Option<PathBuf>,
    chrom_sizes: Option<PathBuf>,
    juicer_jar: Option<PathBuf>,
    fithic_dir: Option<PathBuf>,
    resolution: Option<u32>,

    chromosomes: Option<String>,
    threads: u16,
    strict: bool,
    java: PathBuf,
    python: PathBuf,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            samples: None,
            output: None,
            chrom_sizes: None,
            juicer_jar: None,
            fithic_dir: None,
            resolution: None,

            chromosomes: None,
            threads: 4,
            strict: false,
            java: PathBuf::from("java"),
            python: PathBuf::from("python3"),
        }
    }
}

fn print_help() {
    const KEY: usize = 18;
    const VAL: usize = 4;
    const EMPTY: &'static str = str_repeat!(" ", KEY + VAL + 5);

    let defaults = Args::default();
    println!("{}", "Call significant Hi-C interactions for every sample in a manifest.".yellow());

    println!("\n{} {} run -s samples.txt -o out -g sizes -j juicer.jar -f fithic -r 500000",
        "Usage:".bold(), env!("CARGO_PKG_NAME"));

    println!("\n{}", "Input/output arguments:".bold());
    println!("    {:KEY$} {:VAL$}  Sample manifest: one `<matrix path> <sample name>` per line.",
        "-s, --samples".green(), "FILE".yellow());
    println!("    {:KEY$} {:VAL$}  Output directory.",
        "-o, --output".green(), "DIR".yellow());
    println!("    {:KEY$} {:VAL$}  Chromosome sizes file of the genome assembly.",
        "-g, --chrom-sizes".green(), "FILE".yellow());
    println!("    {:KEY$} {:VAL$}  Juicer Tools jar file (matrix dump).",
        "-j, --juicer".green(), "FILE".yellow());
    println!("    {:KEY$} {:VAL$}  Fit-Hi-C installation directory (significance calling).",
        "-f, --fithic".green(), "DIR".yellow());
    println!("    {:KEY$} {:VAL$}  Bin size in base pairs.",
        "-r, --resolution".green(), "INT".yellow());

    println!("\n{}", "Optional parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Comma-separated chromosome labels.\n\
        {EMPTY}  Defaults to: all chromosomes from the sizes file, in file order.",
        "-c, --chromosomes".green(), "STR".yellow());

    println!("\n{}", "Execution parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Number of extraction threads [{}].",
        "-@, --threads".green(), "INT".yellow(), defaults.threads);
    println!("    {:KEY$} {:VAL$}  Abort on any failed unit of work,\n\
        {EMPTY}  instead of skipping failed extractions and unreadable result files.",
        "-S, --strict".green(), "");
    println!("    {:KEY$} {:VAL$}  Java executable [{}].",
        "    --java".green(), "EXE".yellow(), defaults.java.display());
    println!("    {:KEY$} {:VAL$}  Python executable [{}].",
        "    --python".green(), "EXE".yellow(), defaults.python.display());

    println!("\n{}", "Other parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Show this help message.", "-h, --help".green(), "");
    println!("    {:KEY$} {:VAL$}  Show version.", "-V, --version".green(), "");
}

fn parse_args(argv: &[String]) -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;
    let mut args = Args::default();
    let mut parser = lexopt::Parser::from_args(argv);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('s') | Long("samples") => args.samples = Some(parser.value()?.parse()?),
            Short('o') | Long("output") => args.output = Some(parser.value()?.parse()?),
            Short('g') | Long("chrom-sizes") => args.chrom_sizes = Some(parser.value()?.parse()?),
            Short('j') | Long("juicer") => args.juicer_jar = Some(parser.value()?.parse()?),
            Short('f') | Long("fithic") => args.fithic_dir = Some(parser.value()?.parse()?),
            Short('r') | Long("resolution") => args.resolution = Some(parser.value()?.parse()?),

            Short('c') | Long("chromosomes") => args.chromosomes = Some(parser.value()?.parse()?),
            Short('@') | Long("threads") => args.threads = parser.value()?.parse()?,
            Short('S') | Long("strict") => args.strict = true,
            Long("java") => args.java = parser.value()?.parse()?,
            Long("python") => args.python = parser.value()?.parse()?,

            Short('V') | Long("version") => {
                super::print_version();
                std::process::exit(0);
            }
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            _ => Err(arg.unexpected())?,
        }
    }
    Ok(args)
}

fn process_args(mut args: Args) -> crate::Result<Args> {
    args.threads = max(args.threads, 1);
    if args.samples.is_none() {
        Err(lexopt::Error::from("Sample manifest is not provided (see -s/--samples)"))?;
    }
    if args.output.is_none() {
        Err(lexopt::Error::from("Output directory is not provided (see -o/--output)"))?;
    }
    if args.chrom_sizes.is_none() {
        Err(lexopt::Error::from("Chromosome sizes file is not provided (see -g/--chrom-sizes)"))?;
    }
    if args.juicer_jar.is_none() {
        Err(lexopt::Error::from("Juicer Tools jar is not provided (see -j/--juicer)"))?;
    }
    if args.fithic_dir.is_none() {
        Err(lexopt::Error::from("Fit-Hi-C directory is not provided (see -f/--fithic)"))?;
    }
    if args.resolution.is_none() {
        Err(lexopt::Error::from("Resolution is not provided (see -r/--resolution)"))?;
    }
    validate_param!(args.resolution != Some(0), "Resolution must be positive");
    Ok(args)
}

fn write_params(args: &Args, chroms: &ChromSet, out: &OutPaths) -> crate::Result<()> {
    fn path_str(path: &Option<PathBuf>) -> String {
        // unwrap as all input paths were previously checked to be Some.
        path.as_ref().unwrap().to_string_lossy().into_owned()
    }

    let params = json::object! {
        samples: path_str(&args.samples),
        output: path_str(&args.output),
        chrom_sizes: path_str(&args.chrom_sizes),
        juicer_jar: path_str(&args.juicer_jar),
        fithic_dir: path_str(&args.fithic_dir),
        resolution: args.resolution.unwrap(),
        chromosomes: chroms.names().to_vec(),
        threads: args.threads,
        strict: args.strict,
    };
    let params_path = out.params();
    let mut params_file = fs::File::create(&params_path).map_err(add_path!(params_path))?;
    params.write_pretty(&mut params_file, 4).map_err(add_path!(params_path))?;
    Ok(())
}

/// Creates per-sample directories and collects all (sample, pair) extraction units.
fn build_jobs(samples: &SampleList, pairs: &[ChromPair], out: &OutPaths) -> crate::Result<Vec<ExtractJob>> {
    let mut jobs = Vec::with_capacity(samples.len() * pairs.len());
    for sample in samples.iter() {
        let modified_dir = out.modified_dir(sample.name());
        ext::sys::mkdir(&modified_dir).map_err(add_path!(modified_dir))?;
        for pair in pairs.iter() {
            jobs.push(ExtractJob {
                sample: sample.name().to_owned(),
                matrix: sample.matrix().to_owned(),
                pair: pair.clone(),
                raw_path: out.raw_counts(sample.name(), pair),
                modified_path: out.modified_counts(sample.name(), pair),
            });
        }
    }
    Ok(jobs)
}

/// Generates the shared fragments reference. Failure is fatal to the whole run:
/// every significance call depends on this file.
fn generate_fragments(
    tools: &Tools,
    tool_log: &ToolLog,
    chrom_sizes: &Path,
    out_path: &Path,
    resolution: u32,
) -> crate::Result<()>
{
    log::info!("Generating fragments reference {}", ext::fmt::path(out_path));
    tools::run_tool("fragment generation",
        tools.fragments_command(chrom_sizes, out_path, resolution), tool_log)?;
    if !out_path.exists() {
        return Err(Error::MissingFile(out_path.to_owned()));
    }
    Ok(())
}

/// Filters, packages and submits one modified contact file to the significance caller.
fn call_file(
    file: &Path,
    sample: &Sample,
    out: &OutPaths,
    tools: &Tools,
    tool_log: &ToolLog,
    resolution: u32,
    fragments: &Path,
) -> crate::Result<()>
{
    // unwrap as globbed *.txt paths always carry a file name.
    let filename = file.file_name().unwrap().to_string_lossy().into_owned();
    // Pair identity travels with the file name.
    let pair = ChromPair::from_counts_filename(&filename).ok_or_else(|| error!(MalformedRecord,
        "Cannot infer the contact pair from file name {:?}", filename))?;

    let (kept, dropped) = contacts::filter_infinity(file)?;
    if dropped > 0 {
        log::debug!("    {}: dropped {} infinite records, {} left", filename, dropped, kept);
    }

    let out_dir = out.pair_sig_dir(sample.name(), &filename);
    ext::sys::mkdir(&out_dir).map_err(add_path!(out_dir))?;

    let gz_path = ext::sys::append_path(file, ".gz");
    ext::sys::gzip_file(file, &gz_path).map_err(add_path!(file, gz_path))?;
    tools::run_tool("significance calling",
        tools.significance_command(&gz_path, fragments, &out_dir, resolution, pair.contact_type()),
        tool_log)?;
    fs::remove_file(&gz_path).map_err(add_path!(gz_path))?;
    Ok(())
}

/// Calls significant interactions for every modified contact file of one sample,
/// in sorted file order. Any failure aborts the run.
fn call_sample(
    sample: &Sample,
    out: &OutPaths,
    tools: &Tools,
    tool_log: &ToolLog,
    resolution: u32,
    fragments: &Path,
) -> crate::Result<()>
{
    log::info!("Calling significant interactions for {}", sample.name().bold());
    let pattern = out.modified_dir(sample.name()).join("*.txt");
    let mut files = Vec::new();
    for entry in glob::glob(&pattern.to_string_lossy())
        .map_err(|e| error!(InvalidInput, "Invalid pattern {}: {}", pattern.display(), e))?
    {
        match entry {
            Ok(path) => files.push(path),
            Err(e) => {
                let path = e.path().to_owned();
                return Err(Error::Io(e.into_error(), vec![path]));
            }
        }
    }
    files.sort();
    for file in files.iter() {
        call_file(file, sample, out, tools, tool_log, resolution, fragments).map_err(|e| {
            log::error!("Significance calling failed for sample {}, file {}",
                sample.name(), ext::fmt::path(file));
            e
        })?;
    }
    Ok(())
}

/// Concatenates all per-pair results of one sample into the combined output file.
fn combine_sample(sample: &Sample, out: &OutPaths, policy: crate::FailurePolicy) -> crate::Result<()> {
    let combined_path = out.combined(sample.name());
    // unwrap as the combined path always has a parent directory.
    let combined_dir = combined_path.parent().unwrap();
    ext::sys::mkdir(combined_dir).map_err(add_path!(combined_dir))?;

    let roots = [out.sig_dir(sample.name())];
    let stats = combine::combine(&roots, &combined_path, policy)?;
    log::info!("{}: combined {} interactions from {} files into {}",
        sample.name(), stats.n_lines, stats.n_files, ext::fmt::path(&combined_path));
    if stats.n_skipped > 0 {
        log::warn!("{}: could not read {} result file(s)", sample.name(), stats.n_skipped);
    }
    Ok(())
}

pub(super) fn run(argv: &[String]) -> crate::Result<()> {
    let args = process_args(parse_args(argv)?)?;
    let total_start = Instant::now();

    // unwraps as all required arguments were previously checked in `process_args`.
    let out = OutPaths::new(args.output.clone().unwrap());
    let chrom_sizes = args.chrom_sizes.as_ref().unwrap();
    let resolution = args.resolution.unwrap();
    ext::sys::mkdir(out.root()).map_err(add_path!(out.root()))?;

    let samples = SampleList::load(args.samples.as_ref().unwrap())?;
    for sample in samples.iter() {
        if !sample.matrix().exists() {
            return Err(Error::MissingFile(sample.matrix().to_owned()));
        }
    }
    let chroms = match &args.chromosomes {
        Some(list) => ChromSet::from_list(list)?,
        None => ChromSet::from_chrom_sizes(chrom_sizes)?,
    };
    let pairs = chroms.pairs();
    log::info!("{} sample(s), {} chromosomes, {} contact pairs at {} bp resolution",
        samples.len(), chroms.len(), pairs.len(), resolution);

    let tools = Arc::new(Tools::resolve(&args.java, &args.python,
        args.juicer_jar.clone().unwrap(), args.fithic_dir.clone().unwrap())?);
    let tool_log = Arc::new(ToolLog::create(out.tool_log())?);
    log::debug!("Tool output goes to {}", ext::fmt::path(tool_log.path()));
    let policies = Policies::new(args.strict);
    write_params(&args, &chroms, &out)?;

    let jobs = build_jobs(&samples, &pairs, &out)?;
    extract::run(jobs, &tools, &tool_log, resolution, args.threads, policies.extract)?;

    pipeline::apply_policy(
        generate_fragments(&tools, &tool_log, chrom_sizes, &out.fragments(), resolution),
        policies.fragments, "Fragment generation failed")?;

    for sample in samples.iter() {
        pipeline::apply_policy(
            call_sample(sample, &out, &tools, &tool_log, resolution, &out.fragments()),
            policies.significance, "Significance calling failed")?;
    }

    for sample in samples.iter() {
        combine_sample(sample, &out, policies.combine)?;
    }

    fs::write(out.success(), "").map_err(add_path!(out.success()))?;
    log::info!("Finished in {}", ext::fmt::Duration(total_start.elapsed()));
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::{
        io::Write,
        os::unix::fs::PermissionsExt,
    };
    use flate2::{write::GzEncoder, Compression};
    use pretty_assertions::assert_eq;
    use super::*;

    /// Dump stub: writes three fixed records (one with an infinite count)
    /// to the path given after `-p`.
    const DUMP_STUB: &'static str = "\
#!/bin/sh
out=
prev=
for a in \"$@\"; do
    if [ \"$prev\" = \"-p\" ]; then out=\"$a\"; fi
    prev=\"$a\"
done
printf '0 500000 2.5\\n500000 1000000 Infinity\\n1000000 1500000 4.0\\n' > \"$out\"
echo 'dump done'
";

    /// Interpreter stub for both Fit-Hi-C scripts: writes the fragments file,
    /// and copies a prepared gzip result into the significance output directory.
    const PYTHON_STUB: &'static str = "\
#!/bin/sh
out=
outdir=
prev=
for a in \"$@\"; do
    if [ \"$prev\" = '--outFile' ]; then out=\"$a\"; fi
    if [ \"$prev\" = '--outdir' ]; then outdir=\"$a\"; fi
    prev=\"$a\"
done
case \"$1\" in
    *createFitHiCFragments-fixedsize.py) printf 'fragments\\n' > \"$out\" ;;
    *fithic.py) cp \"$(dirname \"$1\")/../../sig-fixture.txt.gz\" \"$outdir/significances.txt.gz\" ;;
esac
";

    /// Same stub, but significance calling fails.
    const FAILING_PYTHON_STUB: &'static str = "\
#!/bin/sh
out=
prev=
for a in \"$@\"; do
    if [ \"$prev\" = '--outFile' ]; then out=\"$a\"; fi
    prev=\"$a\"
done
case \"$1\" in
    *createFitHiCFragments-fixedsize.py) printf 'fragments\\n' > \"$out\" ;;
    *fithic.py) echo 'no convergence' >&2; exit 1 ;;
esac
";

    fn write_script(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    struct Setup {
        dir: tempfile::TempDir,
        argv: Vec<String>,
    }

    fn setup(sample_names: &[&str], python_stub: &str) -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::write(root.join("mm10.chrom.sizes"), "chr1\t1500000\nchr2\t1000000\n").unwrap();
        let mut manifest = fs::File::create(root.join("samples.txt")).unwrap();
        for name in sample_names {
            let matrix = root.join(format!("{}.hic", name));
            fs::write(&matrix, "").unwrap();
            writeln!(manifest, "{} {}", matrix.display(), name).unwrap();
        }
        drop(manifest);

        fs::write(root.join("juicer_tools.jar"), "").unwrap();
        let fithic_dir = root.join("fithic-install");
        fs::create_dir_all(fithic_dir.join("fithic/utils")).unwrap();
        fs::write(fithic_dir.join("fithic/fithic.py"), "").unwrap();
        fs::write(fithic_dir.join("fithic/utils/createFitHiCFragments-fixedsize.py"), "").unwrap();

        write_script(&root.join("java-stub.sh"), DUMP_STUB);
        write_script(&root.join("python-stub.sh"), python_stub);

        let mut sig_gz = GzEncoder::new(
            fs::File::create(root.join("sig-fixture.txt.gz")).unwrap(), Compression::default());
        sig_gz.write_all(b"chr1 0 chr1 500000 0.0001\nchr1 0 chr1 1000000 0.005\n").unwrap();
        sig_gz.finish().unwrap();

        let argv = vec![
            "-s".to_owned(), root.join("samples.txt").display().to_string(),
            "-o".to_owned(), root.join("out").display().to_string(),
            "-g".to_owned(), root.join("mm10.chrom.sizes").display().to_string(),
            "-j".to_owned(), root.join("juicer_tools.jar").display().to_string(),
            "-f".to_owned(), fithic_dir.display().to_string(),
            "-r".to_owned(), "500000".to_owned(),
            "-@".to_owned(), "2".to_owned(),
            "--java".to_owned(), root.join("java-stub.sh").display().to_string(),
            "--python".to_owned(), root.join("python-stub.sh").display().to_string(),
        ];
        Setup { dir, argv }
    }

    #[test]
    fn full_pipeline() {
        let setup = setup(&["s1"], PYTHON_STUB);
        run(&setup.argv).unwrap();
        let out = setup.dir.path().join("out");

        // Three contact pairs for two chromosomes: (1,1), (1,2), (2,2).
        let pair_files = ["chr1_chr1_counts.txt", "chr1_chr2_counts.txt", "chr2_chr2_counts.txt"];
        for name in pair_files {
            let raw = fs::read_to_string(out.join("s1/contactcounts").join(name)).unwrap();
            assert_eq!(raw.lines().count(), 3);

            // Reformatted and filtered in place: the infinite record is gone.
            let modified = fs::read_to_string(out.join("s1/contactcounts/modified").join(name)).unwrap();
            assert_eq!(modified.lines().count(), 2);
            // The temporary gzip is removed after a successful call.
            assert!(!out.join("s1/contactcounts/modified").join(format!("{}.gz", name)).exists());

            assert!(out.join("s1/chr_sig_interactions").join(name).join("significances.txt.gz").exists());
        }
        let modified = fs::read_to_string(out.join("s1/contactcounts/modified/chr1_chr2_counts.txt")).unwrap();
        assert_eq!(modified, "chr1 0 chr2 500000 2.5\nchr1 1000000 chr2 1500000 4.0\n");

        // Fragments reference generated once, at the shared location.
        assert_eq!(fs::read_to_string(out.join("fragments.txt")).unwrap(), "fragments\n");

        // Combined output holds the lines of all three pairs.
        let combined = fs::read_to_string(
            out.join("Significant_Interactions/s1/significant_interactions.txt")).unwrap();
        assert_eq!(combined.lines().count(), 6);
        assert_eq!(combined.matches("chr1 0 chr1 500000 0.0001").count(), 3);

        // Run metadata: parameters, tool log, success marker.
        assert!(out.join("params.json").exists());
        assert!(out.join("success").exists());
        let tool_log = fs::read_to_string(out.join("log.txt")).unwrap();
        assert_eq!(tool_log.matches("dump done").count(), 3);
        assert_eq!(tool_log.matches("createFitHiCFragments").count(), 1);
        assert_eq!(tool_log.matches("--contactType intraOnly").count(), 2);
        assert_eq!(tool_log.matches("--contactType interOnly").count(), 1);
    }

    #[test]
    fn significance_failure_halts_run() {
        let setup = setup(&["s1", "s2"], FAILING_PYTHON_STUB);
        match run(&setup.argv) {
            Err(Error::ToolFail(tool, _)) => assert_eq!(tool, "significance calling"),
            other => panic!("Expected ToolFail, got {:?}", other),
        }
        let out = setup.dir.path().join("out");

        // Extraction and fragment generation ran for everything.
        assert!(out.join("s2/contactcounts/modified/chr2_chr2_counts.txt").exists());
        assert!(out.join("fragments.txt").exists());

        // The run stopped at the first failed call: no later samples, no aggregation.
        assert!(!out.join("s2/chr_sig_interactions").exists());
        assert!(!out.join("Significant_Interactions").exists());
        assert!(!out.join("success").exists());
    }
}
