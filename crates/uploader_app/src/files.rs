use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Expands command-line inputs into the ordered list of files to upload.
///
/// Files are taken as given. Folders contribute their direct children whose
/// extension matches one of `extensions` (case-insensitive), sorted by name.
/// A path seen twice is kept at its first position only.
pub fn collect_files(inputs: &[PathBuf], extensions: &[String]) -> io::Result<Vec<PathBuf>> {
    let wanted: Vec<String> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for input in inputs {
        let meta = fs::metadata(input).map_err(|err| {
            io::Error::new(err.kind(), format!("{}: {err}", input.display()))
        })?;
        let batch = if meta.is_dir() {
            folder_files(input, &wanted)?
        } else {
            vec![input.clone()]
        };
        for path in batch {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

fn folder_files(dir: &Path, wanted: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if matches_extension(&path, wanted) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn matches_extension(path: &Path, wanted: &[String]) -> bool {
    if wanted.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| wanted.iter().any(|w| w.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
