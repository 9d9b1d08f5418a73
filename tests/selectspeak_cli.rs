use std::io::Write;
use std::process::{Command, Stdio};

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn selectspeak_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_selectspeak").expect("selectspeak test binary not built")
}

#[test]
fn selectspeak_help_mentions_flags() {
    let output = Command::new(selectspeak_bin())
        .arg("--help")
        .output()
        .expect("run selectspeak --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("--speech-rate"));
    assert!(combined.contains("--document"));
}

#[test]
fn selectspeak_version_prints_package_version() {
    let output = Command::new(selectspeak_bin())
        .arg("--version")
        .output()
        .expect("run selectspeak --version");
    assert!(output.status.success());
    assert!(combined_output(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn selectspeak_rejects_out_of_range_speech_rate() {
    let output = Command::new(selectspeak_bin())
        .args(["--speech-rate", "50"])
        .stdin(Stdio::null())
        .output()
        .expect("run selectspeak --speech-rate 50");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("speech-rate"));
}

#[test]
fn selectspeak_answers_capabilities_over_stdio() {
    let mut child = Command::new(selectspeak_bin())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn selectspeak");
    {
        let mut stdin = child.stdin.take().expect("child stdin");
        writeln!(stdin, r#"{{"cmd":"get_capabilities"}}"#).expect("write command");
        writeln!(stdin, "garbage").expect("write garbage");
    }
    let output = child.wait_with_output().expect("wait for selectspeak");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("event is JSON"))
        .collect();
    assert_eq!(events[0]["event"], "capabilities");
    let capabilities = events.iter().filter(|e| e["event"] == "capabilities").count();
    assert_eq!(capabilities, 2);
    assert!(events
        .iter()
        .any(|e| e["event"] == "error" && e["recoverable"] == true));
}
