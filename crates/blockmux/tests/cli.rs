#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "blockmux-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn blockmux(args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_blockmux"));
    cmd.arg("--log-level").arg("error").args(args);
    cmd
}

/// Run with `input` on stdin and collect stdout/stderr.
fn run_with_stdin(mut cmd: Command, input: &[u8]) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("blockmux should start");

    let mut stdin = child.stdin.take().expect("stdin should be piped");
    let input = input.to_vec();
    let feeder = std::thread::spawn(move || {
        // The child may exit early on bad input; a broken pipe is fine here.
        let _ = stdin.write_all(&input);
    });

    let output = child.wait_with_output().expect("blockmux should finish");
    feeder.join().expect("stdin feeder should not panic");
    output
}

fn sample(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

#[test]
fn version_prints_package_version() {
    let output = blockmux(&["version"]).output().expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("blockmux {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_lists_defaults() {
    let output = blockmux(&["version", "--extended"])
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: blockmux"));
    assert!(stdout.contains("hwm=90%"));
}

#[test]
fn mbuffer_copies_stdin_to_stdout() {
    let data = sample(300_000, 7);
    let output = run_with_stdin(blockmux(&["mbuffer", "-m", "64KiB", "-b", "4KiB"]), &data);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(output.stdout, data);
}

#[test]
fn mbuffer_reads_and_writes_files() {
    let dir = unique_temp_dir("mbuffer-files");
    let input = dir.join("in.bin");
    let out = dir.join("out.bin");
    let data = sample(10_001, 3);
    std::fs::write(&input, &data).expect("input should be writable");
    std::fs::write(&out, b"stale").expect("output should be writable");

    let output = blockmux(&["mbuffer", "-m", "10k", "-b", "1000", "--hwm", "50"])
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .output()
        .expect("mbuffer should run");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(std::fs::read(&out).expect("output should exist"), data);
}

#[test]
fn mbuffer_requires_buffer_size() {
    let output = blockmux(&["mbuffer"]).output().expect("mbuffer should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--buffer-size"), "stderr: {stderr}");
}

#[test]
fn mbuffer_bad_size_is_usage_error() {
    let output = blockmux(&["mbuffer", "-m", "plenty"])
        .output()
        .expect("mbuffer should run");
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "stderr: {stderr}");
}

#[test]
fn mux_then_demux_round_trips_files() {
    let dir = unique_temp_dir("roundtrip");
    let inputs = [sample(70_000, 1), sample(5, 2), Vec::new(), sample(32 * 1024, 4)];
    let mut in_paths = Vec::new();
    for (i, data) in inputs.iter().enumerate() {
        let path = dir.join(format!("in{i}"));
        std::fs::write(&path, data).expect("input should be writable");
        in_paths.push(path);
    }

    let muxed = blockmux(&["mux", "-b", "8KiB"])
        .args(&in_paths)
        .output()
        .expect("mux should run");
    assert!(
        muxed.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&muxed.stderr)
    );
    let payload: usize = inputs.iter().map(Vec::len).sum();
    assert!(muxed.stdout.len() > payload);

    let out_paths: Vec<PathBuf> = (0..inputs.len())
        .map(|i| dir.join(format!("out{i}")))
        .collect();
    let mut demux = blockmux(&["demux"]);
    demux.args(&out_paths);
    let demuxed = run_with_stdin(demux, &muxed.stdout);
    assert!(
        demuxed.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&demuxed.stderr)
    );

    for (data, path) in inputs.iter().zip(&out_paths) {
        assert_eq!(&std::fs::read(path).expect("output should exist"), data);
    }
}

#[test]
fn demux_appends_to_existing_outputs() {
    let dir = unique_temp_dir("append");
    let input = dir.join("in");
    std::fs::write(&input, b"world").expect("input should be writable");
    let out = dir.join("out");
    std::fs::write(&out, b"hello ").expect("output should be writable");

    let muxed = blockmux(&["mux"]).arg(&input).output().expect("mux should run");
    assert!(muxed.status.success());

    let mut demux = blockmux(&["demux"]);
    demux.arg(&out);
    let demuxed = run_with_stdin(demux, &muxed.stdout);
    assert!(demuxed.status.success());
    assert_eq!(std::fs::read(&out).expect("output should exist"), b"hello world");
}

#[test]
fn demux_truncated_stream_is_data_invalid() {
    let dir = unique_temp_dir("truncated");
    let out = dir.join("out");
    // header promises 8 bytes, only 3 follow
    let stream = [0, 0, 0, 0, 8, 0, 0, 0, 0, 0, 0, 0, b'a', b'b', b'c'];

    let mut demux = blockmux(&["demux"]);
    demux.arg(&out);
    let output = run_with_stdin(demux, &stream);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("truncated payload"), "stderr: {stderr}");
}

#[test]
fn demux_unknown_stream_is_data_invalid() {
    let dir = unique_temp_dir("unknown-stream");
    let out = dir.join("out");
    let stream = [3, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, b'x'];

    let mut demux = blockmux(&["demux"]);
    demux.arg(&out);
    let output = run_with_stdin(demux, &stream);

    assert_eq!(output.status.code(), Some(60));
    assert!(std::fs::read(&out).expect("output is created").is_empty());
}

#[test]
fn demux_enforces_max_frame_size() {
    let dir = unique_temp_dir("max-frame");
    let out = dir.join("out");
    let stream = [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0];

    let mut demux = blockmux(&["demux", "--max-frame-size", "1MiB"]);
    demux.arg(&out);
    let output = run_with_stdin(demux, &stream);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("payload too large"), "stderr: {stderr}");
}

#[test]
fn mux_missing_input_fails() {
    let dir = unique_temp_dir("missing-input");
    let output = blockmux(&["mux"])
        .arg(dir.join("does-not-exist"))
        .output()
        .expect("mux should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mux input"), "stderr: {stderr}");
}

#[test]
fn mux_block_size_beyond_frame_limit_is_usage_error() {
    let dir = unique_temp_dir("mux-huge-block");
    let input = dir.join("in");
    std::fs::write(&input, b"small").expect("input should be writable");

    let output = blockmux(&["mux", "-b", "32MiB"])
        .arg(&input)
        .output()
        .expect("mux should run");

    assert_eq!(output.status.code(), Some(64));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("exceeds the maximum frame payload"), "stderr: {stderr}");
}
