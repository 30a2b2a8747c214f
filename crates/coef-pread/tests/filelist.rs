use std::fs;
use std::path::PathBuf;

use coef_core::CoefError;
use coef_pread::BatchFileList;
use tempfile::tempdir;

#[test]
fn preserves_manifest_order_and_skips_comments() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("file.list");
    fs::write(
        &manifest,
        "# snapshots for the halo run\n\nsnap_002.asc\n  snap_000.asc time=0.5\n/abs/snap_001.asc\n",
    )
    .unwrap();

    let list = BatchFileList::parse(&manifest, None).unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.source(), Some(manifest.as_path()));

    let groups: Vec<_> = list.iter().collect();
    assert_eq!(groups[0].files, vec![dir.path().join("snap_002.asc")]);
    assert_eq!(groups[1].files, vec![dir.path().join("snap_000.asc")]);
    assert_eq!(groups[1].time_hint, Some(0.5));
    assert_eq!(groups[2].files, vec![PathBuf::from("/abs/snap_001.asc")]);
    assert_eq!(
        groups.iter().map(|g| g.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    // Restartable: a second pass sees the same sequence.
    let again: Vec<_> = (&list).into_iter().map(|g| g.index).collect();
    assert_eq!(again, vec![0, 1, 2]);
}

#[test]
fn several_files_on_one_line_form_one_group() {
    let list = BatchFileList::parse_str("a.0 a.1 a.2\nb.0\n", std::path::Path::new("/d"), None)
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.groups()[0].files.len(), 3);
}

#[test]
fn delimiter_merges_consecutive_split_files() {
    let text = "run.snap_000.0\nrun.snap_000.1\nrun.snap_001.0\nrun.snap_001.1\nrun.snap_000.2\n";
    let list = BatchFileList::parse_str(text, std::path::Path::new(""), Some(".")).unwrap();
    let sizes: Vec<_> = list.iter().map(|g| g.files.len()).collect();
    // Only consecutive entries merge; the trailing stray file starts a new group.
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[test]
fn missing_manifest_is_reported() {
    let dir = tempdir().unwrap();
    let err = BatchFileList::parse(&dir.path().join("nope.list"), None).unwrap_err();
    assert!(matches!(err, CoefError::ManifestNotFound(_)));
}

#[test]
fn unreadable_manifest_contents_are_parse_errors() {
    let dir = tempdir().unwrap();
    let binary = dir.path().join("binary.list");
    fs::write(&binary, [b's', b'n', 0xff, 0xfe, b'\n']).unwrap();
    let err = BatchFileList::parse(&binary, None).unwrap_err();
    assert!(matches!(
        err,
        CoefError::ManifestParse(ref info) if info.code == "manifest-encoding"
    ));

    let err = BatchFileList::parse(dir.path(), None).unwrap_err();
    assert!(matches!(
        err,
        CoefError::ManifestParse(ref info) if info.code == "manifest-not-a-file"
    ));
}

#[test]
fn malformed_time_reports_offending_line() {
    let text = "ok.asc\n# comment\nbad.asc time=soon\n";
    let err = BatchFileList::parse_str(text, std::path::Path::new(""), None).unwrap_err();
    match err {
        CoefError::ManifestParse(info) => {
            assert_eq!(info.context["line"], "3");
            assert_eq!(info.context["text"], "bad.asc time=soon");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn empty_manifest_has_no_groups() {
    let list = BatchFileList::parse_str("# nothing\n\n", std::path::Path::new(""), None).unwrap();
    assert!(list.is_empty());
    assert_eq!(list.iter().count(), 0);
}
