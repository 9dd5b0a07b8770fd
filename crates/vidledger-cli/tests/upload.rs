use std::fs;

use serial_test::serial;

mod common;

use common::{parse_json, vidledger, write_videos};

#[test]
fn missing_configuration_exits_with_user_error() {
    let temp = tempfile::tempdir().expect("tempdir");

    let assert = vidledger(temp.path())
        .args(["--json", "upload"])
        .assert()
        .code(1);

    let payload = parse_json(&assert.get_output().stdout);
    assert_eq!(payload["status"], "user-error");
    assert_eq!(payload["details"]["reason"], "missing_config");
    assert_eq!(
        payload["details"]["missing"],
        serde_json::json!(["LABELBOX_API_KEY", "VIDEO_FOLDER_PATH", "INVENTORY_CSV"])
    );
}

#[test]
fn dotenv_file_supplies_configuration() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("nowhere");
    fs::write(
        temp.path().join(".env"),
        format!(
            "LABELBOX_API_KEY=from-dotenv\nVIDEO_FOLDER_PATH={}\nINVENTORY_CSV=ledger.csv\n",
            missing.display()
        ),
    )
    .expect("dotenv");

    let assert = vidledger(temp.path())
        .args(["--json", "upload"])
        .assert()
        .code(1);

    let payload = parse_json(&assert.get_output().stdout);
    assert_eq!(payload["details"]["reason"], "missing_folder");
}

#[test]
fn missing_folder_is_reported_before_any_remote_call() {
    let temp = tempfile::tempdir().expect("tempdir");
    let folder = temp.path().join("does-not-exist");

    let assert = vidledger(temp.path())
        .env("LABELBOX_API_KEY", "key")
        .env("LABELBOX_ENDPOINT", "http://127.0.0.1:9/graphql")
        .env("INVENTORY_CSV", temp.path().join("ledger.csv"))
        .args(["--json", "upload", "--folder"])
        .arg(&folder)
        .assert()
        .code(1);

    let payload = parse_json(&assert.get_output().stdout);
    assert_eq!(payload["details"]["reason"], "missing_folder");
    assert!(!temp.path().join("ledger.csv").exists());
}

#[test]
fn dry_run_lists_new_videos_without_remote_calls() {
    let temp = tempfile::tempdir().expect("tempdir");
    let folder = temp.path().join("site_visits");
    write_videos(&folder, &["a.mov", "b.avi", "notes.txt"]);
    let ledger = temp.path().join("ledger.csv");
    fs::write(
        &ledger,
        "dataset_name,video_name,data_row_id,dataset_id\nsite_visits,a.mp4,row-a,ds-1\n",
    )
    .expect("ledger");

    let assert = vidledger(temp.path())
        .env("LABELBOX_API_KEY", "key")
        .env("LABELBOX_ENDPOINT", "http://127.0.0.1:9/graphql")
        .env("VIDEO_FOLDER_PATH", &folder)
        .env("INVENTORY_CSV", &ledger)
        .args(["--json", "upload", "--dry-run"])
        .assert()
        .success();

    let payload = parse_json(&assert.get_output().stdout);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["details"]["found"], 2);
    assert_eq!(payload["details"]["pending"], 1);
    assert_eq!(payload["details"]["skipped"], 1);
    assert_eq!(payload["details"]["files"][1]["video_name"], "b.mp4");
    assert!(!temp.path().join("converted_videos").exists());
}

#[test]
fn human_output_prints_why_and_fix_for_missing_config() {
    let temp = tempfile::tempdir().expect("tempdir");

    let assert = vidledger(temp.path()).args(["inventory"]).assert().code(1);

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(
        stdout.contains("✗ vidledger inventory: missing required configuration: LABELBOX_API_KEY"),
        "status line missing: {stdout}"
    );
    assert!(stdout.contains("Why:"), "why section missing: {stdout}");
    assert!(stdout.contains("Fix:"), "fix section missing: {stdout}");
}

#[cfg(unix)]
mod end_to_end {
    use super::*;
    use crate::common::{fake_ffmpeg, mock_server, COPYING_FFMPEG, FAILING_FFMPEG};
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;
    use vidledger_domain::read_records;

    fn expect_dataset_lookup(server: &Server) {
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(matches("ListDatasets")),
            ])
            .respond_with(json_encoded(json!({
                "data": { "datasets": [ { "id": "ds-other", "name": "elsewhere" } ] }
            }))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(matches("createDataset")),
                request::body(matches("site_visits")),
            ])
            .respond_with(json_encoded(json!({
                "data": { "createDataset": { "id": "ds-new", "name": "site_visits" } }
            }))),
        );
    }

    #[test]
    #[serial]
    fn upload_converts_uploads_and_extends_the_ledger() {
        let Some(server) = mock_server("upload_converts_uploads_and_extends_the_ledger") else {
            return;
        };
        expect_dataset_lookup(&server);
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(matches("uploadFile")),
                request::body(matches("bytes of fresh.mov")),
            ])
            .respond_with(json_encoded(json!({
                "data": { "uploadFile": { "url": "https://storage.example/fresh.mp4", "filename": "fresh.mp4" } }
            }))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/graphql"),
                request::body(matches("createDataRow")),
                request::body(matches("\"externalId\":\"fresh.mp4\"")),
                request::body(matches("\"datasetId\":\"ds-new\"")),
            ])
            .respond_with(json_encoded(json!({
                "data": { "createDataRow": { "id": "row-fresh", "externalId": "fresh.mp4" } }
            }))),
        );

        let temp = tempfile::tempdir().expect("tempdir");
        let folder = temp.path().join("site_visits");
        write_videos(&folder, &["fresh.mov", "known.avi"]);
        let ledger = temp.path().join("ledger.csv");
        fs::write(
            &ledger,
            "dataset_name,video_name,data_row_id,dataset_id\nsite_visits,known.mp4,row-known,ds-old\n",
        )
        .expect("ledger");
        let ffmpeg = fake_ffmpeg(temp.path(), COPYING_FFMPEG);
        let work_dir = temp.path().join("work");

        let assert = vidledger(temp.path())
            .env("LABELBOX_API_KEY", "secret-key")
            .env("LABELBOX_ENDPOINT", server.url_str("/graphql"))
            .env("VIDEO_FOLDER_PATH", &folder)
            .env("INVENTORY_CSV", &ledger)
            .env("VIDLEDGER_FFMPEG", &ffmpeg)
            .env("VIDLEDGER_WORK_DIR", &work_dir)
            .args(["--json", "upload"])
            .assert()
            .success();

        let payload = parse_json(&assert.get_output().stdout);
        assert_eq!(payload["status"], "ok", "payload: {payload}");
        assert_eq!(payload["details"]["uploaded"], 1);
        assert_eq!(payload["details"]["skipped"], 1);
        assert_eq!(payload["details"]["ledger_rows"], 2);

        let rows = read_records(&ledger).expect("ledger rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].video_name, "known.mp4");
        assert_eq!(rows[1].video_name, "fresh.mp4");
        assert_eq!(rows[1].data_row_id, "row-fresh");
        assert_eq!(rows[1].dataset_id, "ds-new");
        assert_eq!(rows[1].dataset_name, "site_visits");
        let leftovers = fs::read_dir(&work_dir).expect("work dir").count();
        assert_eq!(leftovers, 0, "converted files should be removed");
    }

    #[test]
    #[serial]
    fn transcode_failure_exits_with_failure_and_keeps_the_ledger() {
        let Some(server) = mock_server("transcode_failure_exits_with_failure_and_keeps_the_ledger")
        else {
            return;
        };
        expect_dataset_lookup(&server);

        let temp = tempfile::tempdir().expect("tempdir");
        let folder = temp.path().join("site_visits");
        write_videos(&folder, &["broken.mov"]);
        let ledger = temp.path().join("ledger.csv");
        let ffmpeg = fake_ffmpeg(temp.path(), FAILING_FFMPEG);

        let assert = vidledger(temp.path())
            .env("LABELBOX_API_KEY", "secret-key")
            .env("LABELBOX_ENDPOINT", server.url_str("/graphql"))
            .env("VIDEO_FOLDER_PATH", &folder)
            .env("INVENTORY_CSV", &ledger)
            .env("VIDLEDGER_FFMPEG", &ffmpeg)
            .args(["--json", "upload"])
            .assert()
            .code(2);

        let payload = parse_json(&assert.get_output().stdout);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["details"]["failed"], 1);
        let file = &payload["details"]["files"][0];
        assert_eq!(file["result"], "transcode_failed");
        assert!(
            file["stderr_tail"]
                .as_str()
                .is_some_and(|tail| tail.contains("Invalid data found")),
            "stderr tail missing: {file}"
        );
        assert!(!ledger.exists(), "no rows means no ledger write");
    }
}
