use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use uploader_app::files::collect_files;

fn csv() -> Vec<String> {
    vec!["csv".to_string()]
}

#[test]
fn folder_contributes_matching_files_sorted() {
    let dir = TempDir::new().unwrap();
    for name in ["b.csv", "a.CSV", "notes.txt", "c.csv"] {
        fs::write(dir.path().join(name), "x").unwrap();
    }
    fs::create_dir(dir.path().join("sub.csv")).unwrap();

    let files = collect_files(&[dir.path().to_path_buf()], &csv()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.CSV", "b.csv", "c.csv"]);
}

#[test]
fn explicit_files_keep_order_and_ignore_extension_filter() {
    let dir = TempDir::new().unwrap();
    let second = dir.path().join("z.txt");
    let first = dir.path().join("m.csv");
    fs::write(&second, "x").unwrap();
    fs::write(&first, "x").unwrap();

    let files = collect_files(&[second.clone(), first.clone()], &csv()).unwrap();
    assert_eq!(files, vec![second, first]);
}

#[test]
fn duplicates_keep_first_position() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    fs::write(&a, "x").unwrap();
    fs::write(&b, "x").unwrap();

    let files = collect_files(&[b.clone(), dir.path().to_path_buf(), b.clone()], &csv()).unwrap();
    assert_eq!(files, vec![b, a]);
}

#[test]
fn extension_list_accepts_dots_and_empty_means_all() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.csv"), "x").unwrap();
    fs::write(dir.path().join("b.txt"), "x").unwrap();
    let folder = vec![dir.path().to_path_buf()];

    let txt = collect_files(&folder, &[".txt".to_string()]).unwrap();
    assert_eq!(txt, vec![dir.path().join("b.txt")]);

    let all = collect_files(&folder, &[]).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn missing_input_is_an_error_naming_the_path() {
    let err = collect_files(&[PathBuf::from("/definitely/not/here.csv")], &csv()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    assert!(err.to_string().contains("here.csv"));
}
