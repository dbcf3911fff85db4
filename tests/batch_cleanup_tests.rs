//! Tests for folder parsing and bulk cleanup.

use cvrp3l_gen::batch::{instance_files, load_folder, load_folders};
use cvrp3l_gen::cleanup::{clean_subfolders, find_target_dirs, CleanupOptions};
use cvrp3l_gen::error::Error;
use cvrp3l_gen::ParserOptions;
use std::fs;
use std::path::{Path, PathBuf};

fn create_test_instance_text(name: &str) -> String {
    format!(
        "Name {}
Number_of_Customers 2
Number_of_Vehicles 1
VEHICLE
Mass_Capacity 50
CargoSpace_Length 4
CargoSpace_Width 4
CargoSpace_Height 4
CUSTOMERS
Node X Y Demand ReadyTime DueDate Service DemandedMass DemandedVolume
0 0 0 0 0 100 0 0 0
1 1 1 5 0 100 1 5 8
2 2 2 5 0 100 1 5 8
ITEMS
Type Length Width Height Mass Fragility
A 2 2 2 5 0
DEMANDS PER CUSTOMER
Customer Type Quantity
1 A 1
2 A 1
",
        name
    )
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cvrp3l_gen_batch_{}_{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A dataset folder with two good files, a broken one and an overview.
fn create_test_dataset(name: &str) -> PathBuf {
    let dir = temp_dir(name);
    write(&dir.join("B.txt"), &create_test_instance_text("B"));
    write(&dir.join("A.txt"), &create_test_instance_text("A"));
    write(&dir.join("C.txt"), "Name C\nITEMS\nType\nA 1 1 1 1 0\n");
    write(&dir.join("Overview.txt"), "not an instance");
    write(&dir.join("notes.md"), "ignored");
    dir
}

/// A result tree with generated files in input/output folders.
fn create_test_tree(name: &str) -> PathBuf {
    let root = temp_dir(name);
    write(&root.join("run_1/input/a.json"), "12345");
    write(&root.join("run_1/output/sub/b.json"), "123");
    write(&root.join("run_2/Input/c.txt"), "1");
    write(&root.join("run_2/keep/d.txt"), "keep");
    root
}

#[test]
fn test_instance_files_skip_overview() {
    let dir = create_test_dataset("files");

    let files = instance_files(&dir).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["A.txt", "B.txt", "C.txt"]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_batch_continues_after_bad_file() {
    let dir = create_test_dataset("continue");

    let (instances, report) = load_folder(&dir, &ParserOptions::new()).unwrap();

    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].name(), "A");
    assert_eq!(instances[1].name(), "B");
    assert_eq!(report.parsed, 2);
    assert!(!report.is_clean());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("C.txt"));
    assert!(matches!(report.failures[0].error, Error::MalformedInstance { .. }));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_folders_merges_tables() {
    let first = create_test_dataset("merge_1");
    let second = temp_dir("merge_2");
    write(&second.join("D.txt"), &create_test_instance_text("D"));

    let (tables, report) = load_folders(&[&first, &second], &ParserOptions::new()).unwrap();

    assert_eq!(tables.instance_names().collect::<Vec<_>>(), vec!["A", "B", "D"]);
    assert_eq!(report.parsed, 3);
    assert_eq!(report.failures.len(), 1);

    fs::remove_dir_all(&first).unwrap();
    fs::remove_dir_all(&second).unwrap();
}

#[test]
fn test_find_target_dirs_ignores_case() {
    let root = create_test_tree("targets");

    let mut dirs = find_target_dirs(&root, &["input".to_string(), "output".to_string()]).unwrap();
    dirs.sort();

    assert_eq!(
        dirs,
        vec![
            root.join("run_1/input"),
            root.join("run_1/output"),
            root.join("run_2/Input"),
        ]
    );

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_dry_run_keeps_files() {
    let root = create_test_tree("dry_run");
    let options = CleanupOptions::new().with_workers(2).with_dry_run(true);

    let report = clean_subfolders(&root, &options).unwrap();

    assert_eq!(report.matched_dirs, 3);
    assert_eq!(report.files, 3);
    assert_eq!(report.deleted, 3);
    assert_eq!(report.bytes_freed, 9);
    assert_eq!(report.failed, 0);
    assert!(root.join("run_1/input/a.json").exists());
    assert!(root.join("run_1/output/sub/b.json").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_cleanup_deletes_target_files_only() {
    let root = create_test_tree("delete");
    let options = CleanupOptions::new().with_workers(2);

    let report = clean_subfolders(&root, &options).unwrap();

    assert_eq!(report.deleted, 3);
    assert_eq!(report.pruned_dirs, 0);
    assert!(!root.join("run_1/input/a.json").exists());
    assert!(!root.join("run_2/Input/c.txt").exists());
    assert!(root.join("run_2/keep/d.txt").exists());
    assert!(root.join("run_1/input").is_dir());
    assert!(root.join("run_1/output/sub").is_dir());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_cleanup_prunes_empty_dirs() {
    let root = create_test_tree("prune");
    let options = CleanupOptions::new().with_prune_empty_dirs(true);

    let report = clean_subfolders(&root, &options).unwrap();

    assert_eq!(report.pruned_dirs, 1);
    assert!(!root.join("run_1/output/sub").exists());
    assert!(root.join("run_1/output").is_dir());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_cleanup_custom_targets() {
    let root = create_test_tree("custom");
    let options = CleanupOptions::new().with_targets(["keep"]);

    let report = clean_subfolders(&root, &options).unwrap();

    assert_eq!(report.matched_dirs, 1);
    assert_eq!(report.deleted, 1);
    assert!(!root.join("run_2/keep/d.txt").exists());
    assert!(root.join("run_1/input/a.json").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_cleanup_missing_root_fails() {
    let base = temp_dir("missing");
    let root = base.join("absent");

    let result = clean_subfolders(&root, &CleanupOptions::new());

    match result {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(find_target_dirs(&root, &["input".to_string()]).is_err());

    fs::remove_dir_all(&base).unwrap();
}

/// A tree whose input folder links to a file and a folder outside of it.
#[cfg(unix)]
fn create_test_linked_tree(name: &str) -> (PathBuf, PathBuf) {
    use std::os::unix::fs::symlink;

    let base = temp_dir(name);
    let root = base.join("tree");
    let outside = base.join("precious");
    write(&root.join("run/input/gen.json"), "generated");
    write(&outside.join("keep.txt"), "keep");
    write(&outside.join("input/nested.txt"), "nested");
    symlink(outside.join("keep.txt"), root.join("run/input/linked_file.txt")).unwrap();
    symlink(&outside, root.join("run/input/linked_dir")).unwrap();
    symlink(&outside, root.join("run/linked_run")).unwrap();
    (base, root)
}

#[cfg(unix)]
#[test]
fn test_cleanup_skips_symlinks() {
    let (base, root) = create_test_linked_tree("symlinks");
    let options = CleanupOptions::new().with_workers(2);

    let report = clean_subfolders(&root, &options).unwrap();

    assert_eq!(report.matched_dirs, 1);
    assert_eq!(report.files, 1);
    assert_eq!(report.deleted, 1);
    assert!(!root.join("run/input/gen.json").exists());
    assert!(base.join("precious/keep.txt").exists());
    assert!(base.join("precious/input/nested.txt").exists());
    assert!(fs::symlink_metadata(root.join("run/input/linked_file.txt")).is_ok());
    assert!(fs::symlink_metadata(root.join("run/input/linked_dir")).is_ok());

    fs::remove_dir_all(&base).unwrap();
}

#[cfg(unix)]
#[test]
fn test_cleanup_removes_file_links_not_targets() {
    let (base, root) = create_test_linked_tree("symlinks_included");
    let options = CleanupOptions::new()
        .with_workers(2)
        .with_include_symlinks(true)
        .with_prune_empty_dirs(true);

    let report = clean_subfolders(&root, &options).unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(report.deleted, 2);
    assert_eq!(report.failed, 0);
    assert!(fs::symlink_metadata(root.join("run/input/linked_file.txt")).is_err());
    assert!(base.join("precious/keep.txt").exists());
    // Links to folders are never followed nor removed.
    assert!(fs::symlink_metadata(root.join("run/input/linked_dir")).is_ok());
    assert!(base.join("precious/input/nested.txt").exists());

    fs::remove_dir_all(&base).unwrap();
}

#[cfg(unix)]
#[test]
fn test_cleanup_survives_symlink_loop() {
    let root = create_test_tree("loop");
    std::os::unix::fs::symlink(root.join("run_1"), root.join("run_1/input/loop")).unwrap();

    let report = clean_subfolders(&root, &CleanupOptions::new().with_dry_run(true)).unwrap();

    assert_eq!(report.matched_dirs, 3);
    assert_eq!(report.files, 3);

    fs::remove_dir_all(&root).unwrap();
}
