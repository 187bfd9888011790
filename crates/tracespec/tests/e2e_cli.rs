use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

use serde_json::Value;
use serial_test::serial;

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_tracespec")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not json ({e}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn spawn_server(temp: &Path) -> (Child, u16) {
    let port = free_port();
    let child = Command::new(bin())
        .arg("serve")
        .arg("--trace-dir")
        .arg(temp)
        .arg("--query-tcp-addr")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--query-uds-path")
        .arg(temp.join("tracespec.sock"))
        .env_remove("TRACESPEC_CONFIG")
        .env_remove("TRACESPEC_SPEC_DIR")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    (child, port)
}

fn query(port: u16, args: &[&str]) -> Output {
    Command::new(bin())
        .arg("--json")
        .arg("--addr")
        .arg(format!("127.0.0.1:{port}"))
        .args(args)
        .env_remove("TRACESPEC_QUERY_UDS_PATH")
        .output()
        .unwrap()
}

fn wait_ready(port: u16, child: &mut Child) {
    for _ in 0..100 {
        assert!(child.try_wait().unwrap().is_none(), "tracespec exited early");
        if query(port, &["status"]).status.success() {
            return;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    panic!("query server never became ready");
}

#[test]
#[serial]
fn check_scores_fixture_traces_offline() {
    let temp = tempfile::tempdir().unwrap();
    let (traces, spec) = testkit::write_fixtures(temp.path()).unwrap();

    let out = Command::new(bin())
        .arg("--json")
        .arg("check")
        .arg("--trace")
        .arg(&traces)
        .arg("--spec")
        .arg(&spec)
        .arg("--trace-id")
        .arg(testkit::PROBLEM_TRACE_ID)
        .output()
        .unwrap();
    assert!(out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["matches_specification"], false);
    assert_eq!(v["score"].as_f64(), Some(0.6));
    assert_eq!(v["missing_spans"], serde_json::json!(["inventory.reserve"]));
    assert_eq!(v["performance_issues"].as_array().map(Vec::len), Some(3));

    let out = Command::new(bin())
        .arg("--json")
        .arg("check")
        .arg("--trace")
        .arg(&traces)
        .arg("--spec")
        .arg(&spec)
        .arg("--trace-id")
        .arg(testkit::GOOD_TRACE_ID)
        .arg("--fail-on-mismatch")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(stdout_json(&out)["score"].as_f64(), Some(1.0));
}

#[test]
#[serial]
fn check_fails_on_mismatch_when_asked() {
    let temp = tempfile::tempdir().unwrap();
    let (traces, spec) = testkit::write_fixtures(temp.path()).unwrap();

    let out = Command::new(bin())
        .arg("check")
        .arg("--trace")
        .arg(&traces)
        .arg("--spec")
        .arg(&spec)
        .arg("--trace-id")
        .arg(testkit::PROBLEM_TRACE_ID)
        .arg("--fail-on-mismatch")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("score=0.60/1.0"));
    assert!(stdout.contains("missing: inventory.reserve"));
}

#[test]
#[serial]
fn serve_answers_compare_and_define() {
    let temp = tempfile::tempdir().unwrap();
    testkit::write_fixtures(temp.path()).unwrap();
    let (mut child, port) = spawn_server(temp.path());
    wait_ready(port, &mut child);

    let status = stdout_json(&query(port, &["status"]));
    assert_eq!(status["traces_count"], 2);
    assert_eq!(status["specs_count"], 1);

    let out = query(
        port,
        &["compare", testkit::GOOD_TRACE_ID, testkit::CHECKOUT_SPEC],
    );
    assert!(out.status.success());
    let v = stdout_json(&out);
    assert_eq!(v["matches_specification"], true);
    assert_eq!(v["score"].as_f64(), Some(1.0));

    let loose = temp.path().join("loose.spec");
    std::fs::write(
        &loose,
        serde_json::json!({
            "name": "checkout_loose",
            "description": "payment only",
            "expected_spans": [
                {"operation_name": "payment.process", "service_name": "payment-service"}
            ]
        })
        .to_string(),
    )
    .unwrap();
    let defined = stdout_json(&query(port, &["define", loose.to_str().unwrap()]));
    assert_eq!(
        defined["message"],
        "Trace specification 'checkout_loose' defined successfully"
    );

    let v = stdout_json(&query(
        port,
        &["compare", testkit::PROBLEM_TRACE_ID, "checkout_loose"],
    ));
    assert_eq!(v["matches_specification"], true);
    assert_eq!(v["score"].as_f64(), Some(1.0));
    assert!(
        v["unexpected_spans"]
            .as_array()
            .is_some_and(|spans| !spans.is_empty())
    );

    let missing = stdout_json(&query(port, &["compare", "nope", "checkout_loose"]));
    assert_eq!(missing["error"], "Trace nope not found");

    let _ = child.kill();
    let _ = child.wait();
}

#[test]
#[serial]
fn mcp_serves_tools_over_stdio() {
    let temp = tempfile::tempdir().unwrap();
    testkit::write_fixtures(temp.path()).unwrap();

    let mut child = Command::new(bin())
        .arg("mcp")
        .arg("--trace-dir")
        .arg(temp.path())
        .env_remove("TRACESPEC_CONFIG")
        .env_remove("TRACESPEC_SPEC_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let requests = [
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": "compare_trace_to_spec",
                "arguments": {
                    "trace_id": testkit::PROBLEM_TRACE_ID,
                    "spec_name": testkit::CHECKOUT_SPEC
                }
            }
        }),
    ];
    {
        let mut stdin = child.stdin.take().unwrap();
        for req in &requests {
            writeln!(stdin, "{req}").unwrap();
        }
    }

    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    let replies = String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(|l| serde_json::from_str::<Value>(l).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[1]["result"]["tools"].as_array().map(Vec::len), Some(6));

    let text = replies[2]["result"]["content"][0]["text"].as_str().unwrap();
    let result: Value = serde_json::from_str(text).unwrap();
    assert_eq!(result["score"].as_f64(), Some(0.6));
    assert_eq!(replies[2]["result"]["isError"], false);
}
