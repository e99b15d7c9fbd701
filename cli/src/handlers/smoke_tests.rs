use std::path::Path;

use clap::Parser;
use ornitag_core::{
    config::RunOptions,
    test_utils::{MockService, details, sample_store, touch},
};
use pretty_assertions::{assert_eq, assert_str_eq};
use rstest::rstest;
use tempfile::tempdir;

use crate::Flags;

use super::{prepare, resolve_and_validate, upload};

#[rstest]
#[case(&["ornitag", "photos"])]
#[case(&["ornitag", "photos", "--dry-run", "--swap"])]
#[case(&["ornitag", "photos", "-n", "-s", "-v"])]
#[case(&["ornitag", "photos", "--validate"])]
#[case(&["ornitag", "photos", "--trace", "--token-file", "token", "--spreadsheet", "birds.ods"])]
fn test_flags_parse(#[case] args: &[&str]) {
    let flags = Flags::try_parse_from(args);
    assert!(flags.is_ok(), "{:?}", flags.err());
}

#[rstest]
#[case(&["ornitag"])]
#[case(&["ornitag", "photos", "--verbose", "--trace"])]
#[case(&["ornitag", "photos", "--unknown"])]
fn test_flags_reject(#[case] args: &[&str]) {
    assert!(Flags::try_parse_from(args).is_err());
}

#[test]
fn test_check_alias_and_log_level() {
    let flags = Flags::try_parse_from(["ornitag", "photos", "--validate", "-v"]).unwrap();
    assert!(flags.check);
    assert_eq!(flags.log_level(), Some(log::LevelFilter::Debug));

    let flags = Flags::try_parse_from(["ornitag", "photos"]).unwrap();
    assert_eq!(flags.log_level(), None);
}

#[test]
fn test_prepare_missing_directory() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = prepare(&missing, &missing.join("birds.xlsx")).unwrap_err();

    assert_str_eq!(err.to_string(), format!("{} is not a directory", missing.display()));
}

#[test]
fn test_prepare_missing_spreadsheet() {
    let dir = tempdir().unwrap();

    let err = prepare(dir.path(), &dir.path().join("birds.xlsx")).unwrap_err();

    assert!(err.to_string().starts_with("Failed to load metadata from "));
}

#[test]
fn test_resolve_and_validate_reports_every_invalid_photo() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("B1/T1/good.jpg"));
    touch(&dir.path().join("BX/T1/bad.jpg"));
    touch(&dir.path().join("B1/T9/worse.JPG"));
    let mut stderr = String::new();

    let err = resolve_and_validate(dir.path(), &sample_store(), &RunOptions::default(), &mut stderr)
        .unwrap_err();

    assert_str_eq!(err.to_string(), "2 of 3 photos are invalid, nothing was uploaded");
    let path = |rel: &str| dir.path().join(rel).display().to_string();
    assert_str_eq!(
        stderr,
        format!(
            "{}: tag code \"T9\" is not in the spreadsheet\n{}: bird code \"BX\" is not in the spreadsheet\n",
            path("B1/T9/worse.JPG"),
            path("BX/T1/bad.jpg"),
        )
    );
}

#[test]
fn test_resolve_and_validate_swapped() {
    let dir = tempdir().unwrap();
    touch(&dir.path().join("T1/B1/a.jpg"));
    touch(&dir.path().join("T2/B2/b.jpeg"));
    let options = RunOptions {
        roles_swapped: true,
        ..RunOptions::default()
    };
    let mut stderr = String::new();

    let records = resolve_and_validate(dir.path(), &sample_store(), &options, &mut stderr).unwrap();

    assert_str_eq!(stderr, "");
    let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Blåmes / Blue Tit", "Talgoxe / Great Tit"]);
}

#[tokio::test]
async fn test_upload_prints_summary() {
    let service = MockService::with_albums(&[("Talgoxe / Great Tit", "existing")]);
    let records = vec![
        details("photos/B1/T1/a.jpg", "B1"),
        details("photos/B1/T1/b.jpg", "B1"),
        details("photos/B2/T1/c.jpg", "B2"),
    ];
    let (mut stdout, mut stderr) = (String::new(), String::new());

    upload(&service, &records, RunOptions::default(), &mut stdout, &mut stderr)
        .await
        .unwrap();

    assert_str_eq!(stderr, "");
    assert_str_eq!(
        stdout,
        "3 photos uploaded, 1 albums created, 2 of 2 albums reordered, 0 failures\nNew albums:\n\tBlåmes / Blue Tit\n"
    );
    assert_eq!(service.created_albums(), vec!["Blåmes / Blue Tit".to_string()]);
}

#[tokio::test]
async fn test_upload_dry_run_changes_nothing() {
    let service = MockService::default();
    let records = vec![details("photos/B1/T1/a.jpg", "B1")];
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let (mut stdout, mut stderr) = (String::new(), String::new());

    upload(&service, &records, options, &mut stdout, &mut stderr)
        .await
        .unwrap();

    assert_eq!(service.mutating_calls(), 0);
    assert!(
        stdout.starts_with("Dry run, nothing was changed: 1 photos uploaded, 1 albums created")
    );
}

#[tokio::test]
async fn test_upload_failure_is_reported() {
    let service = MockService::default();
    service.fail_upload_of("b.jpg");
    let records = vec![
        details("photos/B1/T1/a.jpg", "B1"),
        details("photos/B1/T1/b.jpg", "B1"),
    ];
    let (mut stdout, mut stderr) = (String::new(), String::new());

    let err = upload(&service, &records, RunOptions::default(), &mut stdout, &mut stderr)
        .await
        .unwrap_err();

    assert_str_eq!(err.to_string(), "1 steps of the upload failed");
    assert!(stderr.starts_with(&format!("{}: ", Path::new("photos/B1/T1/b.jpg").display())));
    assert!(stdout.starts_with("1 photos uploaded"));
}

#[tokio::test]
async fn test_upload_listing_failure_stops_early() {
    let service = MockService::default();
    service.fail_listing();
    let records = vec![details("photos/B1/T1/a.jpg", "B1")];
    let (mut stdout, mut stderr) = (String::new(), String::new());

    let err = upload(&service, &records, RunOptions::default(), &mut stdout, &mut stderr)
        .await
        .unwrap_err();

    assert_str_eq!(err.to_string(), "Failed to list the existing albums");
    assert_eq!(service.mutating_calls(), 0);
    assert_str_eq!(stdout, "");
}
