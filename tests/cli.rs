// Command-line behavior, driving the built binary.
use std::fs;
use std::process::Command;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_data-sweeper");
    Command::new(exe)
}

#[test]
fn converts_and_charts_into_out_dir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("sales.csv");
    fs::write(&input, "a,b\n1,2\n1,2\n3,\n").expect("write input");
    let out = temp.path().join("out");

    let output = cmd()
        .arg(&input)
        .args([
            "--clean",
            "remove-duplicates",
            "--clean",
            "fill-missing",
            "--chart",
            "--to",
            "csv",
            "--out-dir",
        ])
        .arg(&out)
        .output()
        .expect("run");
    assert!(output.status.success(), "{:?}", output);

    let csv = fs::read_to_string(out.join("sales.csv")).expect("converted file");
    assert_eq!(csv, "a,b\n1,2\n3,2\n");

    let png = fs::read(out.join("sales_chart.png")).expect("chart file");
    assert_eq!(&png[..4], b"\x89PNG");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Duplicates removed (1 rows)"));
}

#[test]
fn unsupported_file_fails_the_run_but_not_the_batch() {
    let temp = tempfile::tempdir().expect("tempdir");
    let bad = temp.path().join("notes.txt");
    let good = temp.path().join("ok.csv");
    fs::write(&bad, "hello").expect("write");
    fs::write(&good, "x\n1\n").expect("write");

    let output = cmd()
        .arg(&bad)
        .arg(&good)
        .args(["--to", "xlsx", "--json", "--out-dir"])
        .arg(temp.path())
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    assert!(temp.path().join("ok.xlsx").exists());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    let files = report["files"].as_array().expect("files");
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["notices"][0]["level"], "error");
    assert_eq!(files[0]["notices"][0]["message"], "Unsupported file type: .txt");
    assert_eq!(files[1]["download"]["file_name"], "ok.xlsx");
}

#[test]
fn invalid_config_is_reported() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("a.csv");
    let config = temp.path().join("settings.json");
    fs::write(&input, "x\n1\n").expect("write");
    fs::write(&config, r#"{"unknown": true}"#).expect("write");

    let output = cmd()
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load settings"));
}
