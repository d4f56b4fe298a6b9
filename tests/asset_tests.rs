use std::path::Path;

use embed_registry::assets::{classify, AssetError, AssetKind};

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_classify_mixed_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("a.js"), b"console.log(1);");
    write_file(&dir.path().join("b.css"), b"body { margin: 0; }");
    write_file(&dir.path().join("c.txt"), b"readme");

    let summary = classify(dir.path()).unwrap();
    assert_eq!(summary.js_count, 1);
    assert_eq!(summary.css_count, 1);
    assert_eq!(summary.other_count, 1);
    assert_eq!(summary.file_count(), 3);
    assert_eq!(summary.total_bytes, 15 + 19 + 6);
}

#[test]
fn test_classify_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let summary = classify(dir.path()).unwrap();
    assert_eq!(summary.file_count(), 0);
    assert_eq!(summary.total_bytes, 0);
}

#[test]
fn test_classify_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-dir");
    let err = classify(&missing).unwrap_err();
    assert!(matches!(err, AssetError::DirectoryNotFound { .. }));
}

#[test]
fn test_classify_path_is_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("plain.js");
    write_file(&file, b"x");
    let err = classify(&file).unwrap_err();
    assert!(matches!(err, AssetError::DirectoryNotFound { .. }));
}

#[test]
fn test_classify_recurses_into_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("index.js"), b"entry");
    write_file(&dir.path().join("static/js/vendor.js"), b"vendor bundle");
    write_file(&dir.path().join("static/css/main.css"), b"styles");

    let summary = classify(dir.path()).unwrap();
    assert_eq!(summary.js_count, 2);
    assert_eq!(summary.css_count, 1);
    assert_eq!(summary.other_count, 0);
    assert_eq!(summary.total_bytes, 5 + 13 + 6);
}

#[test]
fn test_classify_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("app.js"), b"app");

    let first = classify(dir.path()).unwrap();
    let second = classify(dir.path()).unwrap();
    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn test_classify_does_not_follow_symlinks() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    write_file(&outside.path().join("huge.js"), b"should not be counted");
    write_file(&dir.path().join("real.js"), b"counted");

    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();

    let summary = classify(dir.path()).unwrap();
    assert_eq!(summary.js_count, 1);
    assert_eq!(summary.total_bytes, 7);
}

#[test]
fn test_asset_kind_from_path() {
    assert_eq!(AssetKind::from_path(Path::new("app.js")), AssetKind::Js);
    assert_eq!(AssetKind::from_path(Path::new("module.mjs")), AssetKind::Js);
    assert_eq!(AssetKind::from_path(Path::new("UPPER.JS")), AssetKind::Js);
    assert_eq!(AssetKind::from_path(Path::new("style.css")), AssetKind::Css);
    assert_eq!(
        AssetKind::from_path(Path::new("index.html")),
        AssetKind::Other
    );
    assert_eq!(AssetKind::from_path(Path::new("LICENSE")), AssetKind::Other);
    assert_eq!(
        AssetKind::from_path(Path::new("archive.js.map")),
        AssetKind::Other
    );
}
