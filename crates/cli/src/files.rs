//! Input expansion, output naming and the parallel per-file runner.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use wtt_io::{ContainerKind, Options, Wavetable};

/// Expand the command-line inputs into a list of files.
///
/// Files are kept as given. Directories contribute their `.wav` and `.wt`
/// files, sorted by name, without descending into subdirectories.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("Failed to list directory: {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && has_wavetable_extension(path))
                .collect();
            found.sort();
            debug!(dir = %input.display(), files = found.len(), "expanded directory");
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            bail!("No such file or directory: {}", input.display());
        }
    }

    if files.is_empty() {
        bail!("No .wav or .wt files found in the given inputs");
    }
    Ok(files)
}

fn has_wavetable_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ContainerKind::from_extension)
        .is_some()
}

/// Build `<dir>/<stem><suffix>.<ext>` next to `input`.
pub fn sibling_path(input: &Path, suffix: &str, ext: &str) -> PathBuf {
    input.with_file_name(format!("{}{}.{}", file_stem(input), suffix, ext))
}

/// Directory that receives the slices of `input`: `<stem>_<ext>_cycles`.
pub fn cycles_dir(input: &Path) -> PathBuf {
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    input.with_file_name(format!("{}_{}_cycles", file_stem(input), ext))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether two paths name the same file, resolving links when both exist.
pub fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Whether an output file was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped,
}

/// Write `bytes` to `path`, leaving an existing file alone unless `force`.
pub fn write_output(path: &Path, bytes: &[u8], force: bool) -> Result<WriteOutcome> {
    if path.exists() && !force {
        warn!(path = %path.display(), "output exists, skipping (use --force to overwrite)");
        return Ok(WriteOutcome::Skipped);
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write: {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(WriteOutcome::Written)
}

/// Read and decode one file, sniffing its container from the content.
pub fn load(path: &Path, options: &Options) -> Result<(ContainerKind, Wavetable)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    wtt_io::container::decode(&bytes, &options.decode_options())
        .with_context(|| format!("Failed to decode: {}", path.display()))
}

/// Load a file that must be of the given container kind.
pub fn load_kind(path: &Path, options: &Options, expected: ContainerKind) -> Result<Wavetable> {
    let (kind, wavetable) = load(path, options)?;
    if kind != expected {
        bail!(
            "{} is a {} file, expected {}",
            path.display(),
            kind,
            expected
        );
    }
    Ok(wavetable)
}

/// Totals for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Turn a batch with failures into an error for the exit status.
    pub fn into_result(self) -> Result<()> {
        if self.failed > 0 {
            bail!("{} of {} file(s) failed", self.failed, self.total);
        }
        Ok(())
    }
}

/// Run `job` over every file in parallel, logging failures as they happen.
pub fn run_batch<F>(files: &[PathBuf], job: F) -> BatchSummary
where
    F: Fn(&Path) -> Result<()> + Sync,
{
    let failed = files
        .par_iter()
        .filter(|path| match job(path.as_path()) {
            Ok(()) => false,
            Err(err) => {
                error!("{:#}", err);
                true
            }
        })
        .count();

    BatchSummary {
        total: files.len(),
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path() {
        let input = Path::new("/tmp/tables/saw.wt");
        assert_eq!(
            sibling_path(input, "_dedupe", "wt"),
            PathBuf::from("/tmp/tables/saw_dedupe.wt")
        );
        assert_eq!(
            sibling_path(input, "", "wav"),
            PathBuf::from("/tmp/tables/saw.wav")
        );
    }

    #[test]
    fn test_cycles_dir() {
        assert_eq!(
            cycles_dir(Path::new("/tmp/tables/Saw.WAV")),
            PathBuf::from("/tmp/tables/Saw_wav_cycles")
        );
    }

    #[test]
    fn test_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.wav");
        fs::write(&file, b"x").unwrap();

        assert!(same_path(&file, &dir.path().join(".").join("a.wav")));
        assert!(!same_path(&file, &dir.path().join("b.wav")));
        assert!(same_path(Path::new("missing.wav"), Path::new("missing.wav")));
    }

    #[test]
    fn test_batch_summary() {
        let ok = BatchSummary { total: 3, failed: 0 };
        assert!(ok.into_result().is_ok());
        let bad = BatchSummary { total: 3, failed: 1 };
        assert_eq!(
            bad.into_result().unwrap_err().to_string(),
            "1 of 3 file(s) failed"
        );
    }

    #[test]
    fn test_run_batch_counts_failures() {
        let files: Vec<PathBuf> = ["a.wav", "b.wt", "c.wav"].iter().map(PathBuf::from).collect();
        let summary = run_batch(&files, |path| {
            if path.extension().is_some_and(|e| e == "wt") {
                bail!("not today");
            }
            Ok(())
        });
        assert_eq!(summary, BatchSummary { total: 3, failed: 1 });
    }
}
