//! md2nb-batch: File and directory conversion of Markdown to Jupyter notebooks
//!
//! This crate wraps the pure conversion in `md2nb-core` with everything
//! that touches the filesystem:
//! - Reading and UTF-8 decoding of Markdown files
//! - Output filename derivation (`notes.md` -> `notes.ipynb`)
//! - Collection of Markdown files in a directory
//! - Batch conversion with parallel processing
//!
//! This crate is designed to be used by various interfaces (CLI, services, etc.)

use md2nb_core::{NotebookError, convert, serialize};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Default extension of written notebooks
pub const DEFAULT_OUTPUT_EXTENSION: &str = "ipynb";

/// Default extensions of Markdown files picked up in directory mode
pub const DEFAULT_INPUT_EXTENSIONS: &[&str] = &["md"];

/// UTF-8 byte-order mark, dropped from the start of input files
const BOM: &str = "\u{feff}";

/// Errors that can occur during file conversion
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{} is not valid UTF-8 text: {source}", .file.display())]
    Decode {
        file: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error(transparent)]
    Notebook(#[from] NotebookError),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Output would overwrite an input file: {}", .0.display())]
    OverwritesInput(PathBuf),

    #[error("Output {} is also the target of {}", .output.display(), .other.display())]
    OutputConflict { output: PathBuf, other: PathBuf },
}

/// Result type for batch operations
pub type Result<T> = std::result::Result<T, BatchError>;

/// Derive the notebook path for a Markdown file
///
/// Replaces the last extension of `input`, or appends one if there is none.
pub fn output_path_for(input: &Path, extension: &str) -> PathBuf {
    input.with_extension(extension)
}

/// Key under which two paths naming the same file compare equal
///
/// Existing paths are canonicalized. For a path that does not exist yet, the
/// parent directory is canonicalized and the file name appended.
fn path_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            fs::canonicalize(parent)
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

/// Check whether two paths name the same file
///
/// `./notes.md`, `notes.md` and an absolute path to it are all the same file.
pub fn same_path(a: &Path, b: &Path) -> bool {
    a == b || path_key(a) == path_key(b)
}

/// Decode Markdown bytes as UTF-8 text
///
/// `origin` names the source in the error message.
pub fn decode_markdown(bytes: Vec<u8>, origin: &Path) -> Result<String> {
    let text = String::from_utf8(bytes).map_err(|e| BatchError::Decode {
        file: origin.to_path_buf(),
        source: e.utf8_error(),
    })?;

    match text.strip_prefix(BOM) {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(text),
    }
}

/// Summary of one written notebook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookSummary {
    /// Path of the written notebook
    pub output: PathBuf,
    /// Number of cells in the notebook
    pub cells: usize,
}

/// Convert a single Markdown file and write the notebook to `output`
///
/// Parent directories of `output` are created as needed.
pub fn convert_file(input: &Path, output: &Path) -> Result<NotebookSummary> {
    log::debug!("Converting: {} -> {}", input.display(), output.display());

    let text = decode_markdown(fs::read(input)?, input)?;
    let notebook = convert(&text);
    let bytes = serialize(&notebook)?;

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes)?;

    Ok(NotebookSummary {
        output: output.to_path_buf(),
        cells: notebook.cells.len(),
    })
}

/// Markdown files found under a directory
#[derive(Debug, Clone)]
pub struct MarkdownCollection {
    /// Root directory the files were collected from
    pub root: PathBuf,
    /// Markdown files, sorted by path
    pub files: Vec<PathBuf>,
}

impl MarkdownCollection {
    /// Collect Markdown files from a directory
    ///
    /// A file is picked up when its extension matches one of `extensions`,
    /// ignoring ASCII case.
    pub fn from_directory<S: AsRef<str>>(
        path: &Path,
        extensions: &[S],
        recursive: bool,
    ) -> Result<Self> {
        if !path.is_dir() {
            return Err(BatchError::DirectoryNotFound(path.to_path_buf()));
        }

        let mut files = collect_markdown_files(path, extensions, recursive)?;
        files.sort();

        Ok(Self {
            root: path.to_path_buf(),
            files,
        })
    }
}

/// Collect Markdown files in a directory
fn collect_markdown_files<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|e| e.to_str())
                && extensions
                    .iter()
                    .any(|wanted| ext.eq_ignore_ascii_case(wanted.as_ref()))
            {
                files.push(path);
            }
        } else if path.is_dir() && recursive {
            files.extend(collect_markdown_files(&path, extensions, recursive)?);
        }
    }

    Ok(files)
}

/// Options for batch conversion
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Output directory for converted files
    pub output_dir: PathBuf,
    /// File extension for output files
    pub output_extension: String,
    /// Number of parallel jobs (None = use all CPUs)
    pub parallel_jobs: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            parallel_jobs: None,
        }
    }
}

/// Result of a batch conversion
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Number of successfully converted files
    pub success_count: usize,
    /// Files that failed to convert, with their errors
    pub failed_files: Vec<(PathBuf, String)>,
    /// Notebooks that were written
    pub output_files: Vec<NotebookSummary>,
}

/// Output targets of a collection, split into writable ones and rejects
struct OutputPlan<'a> {
    jobs: Vec<(&'a PathBuf, PathBuf)>,
    rejected: Vec<(&'a PathBuf, BatchError)>,
}

/// Assign an output path to every file of a collection
///
/// A file is rejected when its output is one of the collection's inputs, or
/// when another file maps to the same output. Colliding files are all
/// rejected so no notebook silently replaces another.
fn plan_outputs<'a>(collection: &'a MarkdownCollection, options: &BatchOptions) -> OutputPlan<'a> {
    let targets: Vec<(&PathBuf, PathBuf)> = collection
        .files
        .iter()
        .map(|file| {
            let relative = file.strip_prefix(&collection.root).unwrap_or(file);
            let output =
                output_path_for(&options.output_dir.join(relative), &options.output_extension);
            (file, output)
        })
        .collect();

    let inputs: HashSet<PathBuf> = collection.files.iter().map(|f| path_key(f)).collect();
    let keys: Vec<PathBuf> = targets.iter().map(|(_, output)| path_key(output)).collect();
    let mut owners: HashMap<&PathBuf, Vec<&PathBuf>> = HashMap::new();
    for ((file, _), key) in targets.iter().zip(&keys) {
        owners.entry(key).or_default().push(*file);
    }

    let mut plan = OutputPlan {
        jobs: Vec::new(),
        rejected: Vec::new(),
    };
    for ((file, output), key) in targets.iter().zip(&keys) {
        if inputs.contains(key) {
            plan.rejected
                .push((*file, BatchError::OverwritesInput(output.clone())));
        } else if let Some(other) = owners[key].iter().find(|other| **other != *file) {
            plan.rejected.push((
                *file,
                BatchError::OutputConflict {
                    output: output.clone(),
                    other: other.to_path_buf(),
                },
            ));
        } else {
            plan.jobs.push((*file, output.clone()));
        }
    }
    plan
}

/// Convert every file of a collection
///
/// Files are converted in parallel. The directory layout below the
/// collection root is mirrored under `options.output_dir`. A failing file
/// does not stop the others; it is reported in [`BatchResult::failed_files`].
/// Files whose output would overwrite an input, or would be written by
/// another file too, are not converted and are reported as failed.
pub fn convert_collection(
    collection: &MarkdownCollection,
    options: &BatchOptions,
) -> Result<BatchResult> {
    fs::create_dir_all(&options.output_dir)?;
    let plan = plan_outputs(collection, options);

    let run = || -> Vec<_> {
        plan.jobs
            .par_iter()
            .map(|(file, output)| (*file, convert_file(file, output)))
            .collect()
    };

    let results = match options.parallel_jobs {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()?
            .install(run),
        None => run(),
    };

    let mut result = BatchResult::default();
    for (file, e) in &plan.rejected {
        log::debug!("Skipping {}: {}", file.display(), e);
        result.failed_files.push(((*file).clone(), e.to_string()));
    }
    for (file, outcome) in results {
        match outcome {
            Ok(summary) => {
                result.success_count += 1;
                result.output_files.push(summary);
            }
            Err(e) => {
                log::debug!("Failed to convert {}: {}", file.display(), e);
                result.failed_files.push((file.clone(), e.to_string()));
            }
        }
    }

    Ok(result)
}
