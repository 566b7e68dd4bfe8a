//! End-to-end snapshot tests against fake process roots.
//!
//! The binary is pointed at a synthetic `/proc` with `--proc-root` and an
//! empty device directory with `--dev-root`, so output depends only on the
//! fixture (plus the host clock for start labels).

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

mod support;
use support::fake_proc::FakeRoot;

const HEADER: &str = "UID        PID      PPID     C  STIME  TTY      TIME       CMD";

/// showproc against `root`, isolated from the caller's environment.
fn showproc(root: &FakeRoot) -> Command {
    let mut cmd = cargo_bin_cmd!("showproc");
    for key in [
        "RUST_LOG",
        "SHOWPROC_LOG",
        "SHOWPROC_LOG_FORMAT",
        "SHOWPROC_CONFIG",
        "SHOWPROC_FORMAT",
        "SHOWPROC_JOBS",
        "SHOWPROC_PROC_ROOT",
        "SHOWPROC_DEV_ROOT",
        "SHOWPROC_CMDLINE_MAX_BYTES",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("XDG_CONFIG_HOME", root.xdg_home())
        .arg("--proc-root")
        .arg(root.proc_root())
        .arg("--dev-root")
        .arg(root.dev_root());
    cmd
}

fn jsonl_rows(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("row is JSON"))
        .collect()
}

fn sorted_pids(rows: &[Value]) -> Vec<u64> {
    let mut pids: Vec<u64> = rows.iter().map(|r| r["pid"].as_u64().unwrap()).collect();
    pids.sort_unstable();
    pids
}

mod table {
    use super::*;

    #[test]
    fn prints_header_and_one_line_per_process() {
        let root = FakeRoot::populated();
        let output = showproc(&root).assert().success().get_output().stdout.clone();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 4);

        let init = lines.iter().find(|l| l.ends_with("/sbin/init splash")).unwrap();
        assert!(init.starts_with("root       1        0        0  "));
        assert!(init.contains(" ?        00:00:00   /sbin/init splash"));

        assert!(lines.iter().any(|l| l.ends_with(" [kthreadd]")));
        assert!(lines.iter().any(|l| l.ends_with(" /usr/sbin/cron -f")));
    }

    #[test]
    fn empty_root_prints_only_header() {
        let root = FakeRoot::new();
        showproc(&root)
            .assert()
            .success()
            .stdout(format!("{HEADER}\n"));
    }

    #[test]
    fn clean_run_is_silent_on_stderr() {
        let root = FakeRoot::populated();
        showproc(&root).assert().success().stderr("");
    }
}

mod formats {
    use super::*;

    #[test]
    fn jsonl_rows_carry_columns() {
        let root = FakeRoot::populated();
        let output = showproc(&root)
            .args(["--format", "jsonl"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let rows = jsonl_rows(&output);
        assert_eq!(sorted_pids(&rows), vec![1, 2, 812]);

        let cron = rows.iter().find(|r| r["pid"] == 812).unwrap();
        assert_eq!(cron["uid"], "root");
        assert_eq!(cron["ppid"], 1);
        assert_eq!(cron["c"], 0);
        assert_eq!(cron["tty"], "?");
        assert_eq!(cron["time"], "00:00:00");
        assert_eq!(cron["cmd"], "/usr/sbin/cron -f");
        assert_eq!(cron["state"], "S");
    }

    #[test]
    fn json_document_has_metadata() {
        let root = FakeRoot::populated();
        let output = showproc(&root)
            .args(["--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let doc: Value = serde_json::from_slice(&output).unwrap();
        assert!(doc["run_id"].as_str().unwrap().starts_with("run-"));
        assert!(doc["generated_at"].is_string());
        assert_eq!(doc["rows"].as_array().unwrap().len(), 3);
        assert!(doc["skipped"].as_array().unwrap().is_empty());
        assert!(doc["missing"].as_array().unwrap().is_empty());
    }

    #[test]
    fn format_from_environment() {
        let root = FakeRoot::populated();
        let output = showproc(&root)
            .env("SHOWPROC_FORMAT", "jsonl")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(jsonl_rows(&output).len(), 3);
    }

    #[test]
    fn format_from_config_file_and_cli_wins() {
        let root = FakeRoot::populated();
        let config = root.path().join("showproc.json");
        std::fs::write(&config, r#"{"format": "jsonl", "jobs": 2}"#).unwrap();

        let output = showproc(&root)
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(jsonl_rows(&output).len(), 3);

        showproc(&root)
            .arg("--config")
            .arg(&config)
            .args(["--format", "table"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with(HEADER));
    }

    #[test]
    fn xdg_config_file_is_read() {
        let root = FakeRoot::populated();
        let dir = root.xdg_home().join("showproc");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.json"), r#"{"format": "json"}"#).unwrap();

        let output = showproc(&root).assert().success().get_output().stdout.clone();
        let doc: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(doc["rows"].as_array().unwrap().len(), 3);
    }
}

mod selection {
    use super::*;

    #[test]
    fn pid_filter_limits_rows() {
        let root = FakeRoot::populated();
        let output = showproc(&root)
            .args(["--format", "jsonl", "--pid", "1,812"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(sorted_pids(&jsonl_rows(&output)), vec![1, 812]);
    }

    #[test]
    fn missing_requested_pid_is_partial() {
        let root = FakeRoot::populated();
        showproc(&root)
            .args(["--format", "jsonl", "-p", "1", "-p", "4000"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("1 requested pid(s) not found"));
    }

    #[test]
    fn parallel_output_matches_sequential() {
        let root = FakeRoot::new();
        for pid in 100..180 {
            root.add_process(pid, 1, &format!("w{pid}"), format!("worker\0{pid}\0").as_bytes());
        }
        let run = |jobs: &str| -> Vec<(u64, String)> {
            let output = showproc(&root)
                .args(["--format", "jsonl", "--jobs", jobs])
                .assert()
                .success()
                .get_output()
                .stdout
                .clone();
            jsonl_rows(&output)
                .iter()
                .map(|r| (r["pid"].as_u64().unwrap(), r["cmd"].as_str().unwrap().to_string()))
                .collect()
        };
        let sequential = run("1");
        assert_eq!(sequential.len(), 80);
        assert_eq!(run("4"), sequential);
        assert_eq!(run("16"), sequential);
    }

    #[test]
    fn cmdline_is_capped() {
        let root = FakeRoot::new();
        root.add_process(9, 1, "long", b"abcdefghij\0klmnop\0");
        let output = showproc(&root)
            .args(["--format", "jsonl", "--cmdline-max-bytes", "12"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(jsonl_rows(&output)[0]["cmd"], "abcdefghij k");
    }
}

mod skips {
    use super::*;

    #[test]
    fn malformed_record_is_skipped_and_partial() {
        let root = FakeRoot::populated();
        root.write_record(812, "stat", b"812 (cron S 1");
        let output = showproc(&root)
            .args(["--format", "jsonl"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("1 process(es) skipped"))
            .get_output()
            .stdout
            .clone();
        assert_eq!(sorted_pids(&jsonl_rows(&output)), vec![1, 2]);
    }

    #[test]
    fn vanished_process_is_counted_but_clean() {
        let root = FakeRoot::populated();
        // Listed but its records are already gone
        std::fs::create_dir_all(root.proc_root().join("4444")).unwrap();
        let output = showproc(&root)
            .args(["--format", "json"])
            .assert()
            .success()
            .stderr(predicate::str::contains(
                "1 process(es) skipped (1 exited during the scan)",
            ))
            .get_output()
            .stdout
            .clone();
        let doc: Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(doc["rows"].as_array().unwrap().len(), 3);
        assert_eq!(doc["skipped"][0]["pid"], 4444);
        assert_eq!(doc["skipped"][0]["reason"], "record_unavailable");
        assert_eq!(doc["skipped"][0]["category"], "collection");
    }

    #[test]
    fn skip_is_logged_as_jsonl() {
        let root = FakeRoot::populated();
        root.write_record(2, "status", b"Name:\tkthreadd\n");
        let output = showproc(&root)
            .args(["--log-format", "jsonl"])
            .assert()
            .code(1)
            .get_output()
            .stderr
            .clone();
        let events: Vec<Value> = String::from_utf8_lossy(&output)
            .lines()
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect();
        let skipped = events
            .iter()
            .find(|e| e["event"] == "scan.record_skipped")
            .expect("skip event");
        assert_eq!(skipped["level"], "warn");
        assert_eq!(skipped["pid"], 2);
        assert_eq!(skipped["stage"], "scan");
        assert_eq!(skipped["fields"]["category"], "collection");
        assert!(skipped["run_id"].as_str().unwrap().starts_with("run-"));
    }

    #[test]
    fn quiet_flag_beats_rust_log() {
        let root = FakeRoot::populated();
        showproc(&root)
            .env("RUST_LOG", "debug")
            .arg("-q")
            .assert()
            .success()
            .stderr("");
    }

    #[test]
    fn verbose_flag_beats_rust_log() {
        let root = FakeRoot::populated();
        showproc(&root)
            .env("RUST_LOG", "error")
            .args(["-vv", "--log-format", "jsonl"])
            .assert()
            .success()
            .stderr(predicate::str::contains("\"event\":\"scan.started\""));
    }

    #[test]
    fn showproc_log_beats_rust_log() {
        let root = FakeRoot::populated();
        showproc(&root)
            .env("RUST_LOG", "debug")
            .env("SHOWPROC_LOG", "error")
            .assert()
            .success()
            .stderr("");
    }

    #[test]
    fn rust_log_applies_without_other_settings() {
        let root = FakeRoot::populated();
        showproc(&root)
            .env("RUST_LOG", "debug")
            .args(["--log-format", "jsonl"])
            .assert()
            .success()
            .stderr(predicate::str::contains("\"event\":\"clock.read\""));
    }

    #[test]
    fn verbose_logging_reports_run_events() {
        let root = FakeRoot::populated();
        let output = showproc(&root)
            .args(["-vv", "--log-format", "jsonl"])
            .assert()
            .success()
            .get_output()
            .stderr
            .clone();
        let text = String::from_utf8_lossy(&output);
        for event in ["run.started", "config.loaded", "clock.read", "scan.started", "scan.finished", "run.finished"] {
            assert!(text.contains(&format!("\"event\":\"{event}\"")), "missing {event}");
        }
    }
}
