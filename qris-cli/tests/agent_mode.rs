use std::process::{Command, Output, Stdio};

use mockito::{Matcher, ServerGuard};
use serde_json::Value;

const SUCCESS_BODY: &str = r#"{"status":"success","nominal":"10250","link_qris":"https://x/10250.png","converted_qris":"00020101021226570011ID.DANA.WWW6304ABCD"}"#;

fn run_agent(args: &[&str]) -> Output {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("qris"));
    cmd.arg("--output")
        .arg("json")
        .args(args)
        .stdin(Stdio::null())
        .env_remove("RUST_LOG");
    cmd.output().expect("failed to run qris")
}

fn parse_stdout(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8");
    serde_json::from_str(stdout.trim()).expect("stdout should contain the JSON envelope")
}

fn endpoint(server: &ServerGuard) -> String {
    format!("{}/api/", server.url())
}

fn nominal(value: &str) -> Matcher {
    Matcher::UrlEncoded("nominal".into(), value.into())
}

#[test]
fn preview_reports_breakdown_envelope() {
    let output = run_agent(&[
        "preview",
        "--amount",
        "10000",
        "--fee-mode",
        "percentage",
        "--fee-value",
        "2.5",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let payload = parse_stdout(&output);
    assert_eq!(payload["success"], true);
    assert_eq!(payload["mode"], "agent");
    assert_eq!(payload["operation"], "preview");
    assert_eq!(payload["result"]["originalAmount"], "10000");
    assert_eq!(payload["result"]["fee"], "250");
    assert_eq!(payload["result"]["total"], "10250");
    assert_eq!(payload["result"]["submittable"], true);
    assert_eq!(payload["request_state"], "idle");
}

#[test]
fn preview_of_unparseable_amount_is_zero() {
    let output = run_agent(&["preview", "--amount", "abc"]);
    assert_eq!(output.status.code(), Some(0));

    let payload = parse_stdout(&output);
    assert_eq!(payload["result"]["total"], "0");
    assert_eq!(payload["result"]["submittable"], false);
    assert_eq!(payload["result"]["issue"]["code"], "E_AMOUNT_REQUIRED");
}

#[test]
fn generate_returns_image_url_and_snapshot() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/")
        .match_query(nominal("10250"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SUCCESS_BODY)
        .expect(1)
        .create();

    let url = endpoint(&server);
    let output = run_agent(&[
        "--endpoint",
        &url,
        "generate",
        "--amount",
        "10000",
        "--fee-mode",
        "percentage",
        "--fee-value",
        "2.5",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let payload = parse_stdout(&output);
    assert_eq!(payload["success"], true);
    assert_eq!(payload["request_state"], "succeeded");
    assert_eq!(payload["result"]["imageUrl"], "https://x/10250.png");
    assert_eq!(payload["result"]["breakdown"]["total"], "10250");
    assert_eq!(
        payload["result"]["message"],
        "QRIS generated for a total payment of Rp10.250."
    );
    assert!(payload["result"].get("encodedPayload").is_none());
    mock.assert();
}

#[test]
fn generate_with_show_payload_includes_encoded_qris() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/")
        .match_query(nominal("10250"))
        .with_status(200)
        .with_body(SUCCESS_BODY)
        .create();

    let url = endpoint(&server);
    let output = run_agent(&[
        "--endpoint",
        &url,
        "--force",
        "generate",
        "--amount",
        "10250",
        "--show-payload",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let payload = parse_stdout(&output);
    assert_eq!(
        payload["result"]["encodedPayload"],
        "00020101021226570011ID.DANA.WWW6304ABCD"
    );
    mock.assert();
}

#[test]
fn remote_error_exits_with_transport_code() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"server busy"}"#)
        .create();

    let url = endpoint(&server);
    let output = run_agent(&["--endpoint", &url, "--force", "generate", "--amount", "10000"]);
    assert_eq!(output.status.code(), Some(3));

    let payload = parse_stdout(&output);
    assert_eq!(payload["success"], false);
    assert_eq!(payload["error"]["code"], 3001);
    assert_eq!(payload["error"]["name"], "TRANSPORT_FAILED");
    assert_eq!(payload["error"]["message"], "server busy");
    assert_eq!(payload["error"]["details"]["status"], 500);
    mock.assert();
}

#[test]
fn unsuccessful_status_exits_with_protocol_code() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status":"error"}"#)
        .create();

    let url = endpoint(&server);
    let output = run_agent(&["--endpoint", &url, "--force", "generate", "--amount", "10000"]);
    assert_eq!(output.status.code(), Some(3));

    let payload = parse_stdout(&output);
    assert_eq!(payload["error"]["code"], 3002);
    assert_eq!(
        payload["error"]["message"],
        "invalid or unsuccessful API response"
    );
    mock.assert();
}

#[test]
fn invalid_entry_is_rejected_without_a_request() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create();

    let url = endpoint(&server);
    let output = run_agent(&[
        "--endpoint",
        &url,
        "--force",
        "generate",
        "--amount",
        "10000",
        "--fee-mode",
        "percentage",
        "--fee-value",
        "150",
    ]);
    assert_eq!(output.status.code(), Some(1));

    let payload = parse_stdout(&output);
    assert_eq!(payload["error"]["code"], 1004);
    assert_eq!(payload["error"]["name"], "FEE_PERCENT_TOO_HIGH");
    assert_eq!(payload["request_state"], "failed");
    mock.assert();
}

#[test]
fn amount_rounding_to_zero_is_rejected_without_a_request() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", Matcher::Any).expect(0).create();

    let url = endpoint(&server);
    let output = run_agent(&["--endpoint", &url, "--force", "generate", "--amount", "0.4"]);
    assert_eq!(output.status.code(), Some(1));

    let payload = parse_stdout(&output);
    assert_eq!(payload["error"]["code"], 1006);
    assert_eq!(payload["error"]["name"], "TOTAL_TOO_SMALL");
    mock.assert();
}

#[test]
fn invalid_endpoint_is_a_configuration_error() {
    let output = run_agent(&[
        "--endpoint",
        "ftp://example.com/api/",
        "--force",
        "generate",
        "--amount",
        "10000",
    ]);
    assert_eq!(output.status.code(), Some(2));

    let payload = parse_stdout(&output);
    assert_eq!(payload["error"]["code"], 2005);
    assert_eq!(payload["error"]["name"], "INVALID_CONFIGURATION");
    assert!(payload.get("request_state").is_none());
}

#[test]
fn interactive_without_terminal_is_blocked() {
    let output = run_agent(&["interactive"]);
    assert_eq!(output.status.code(), Some(11));

    let payload = parse_stdout(&output);
    assert_eq!(payload["operation"], "interactive");
    assert_eq!(payload["error"]["code"], 2004);
    assert_eq!(payload["error"]["name"], "STDIN_BLOCKED");
}

#[test]
fn unknown_flag_reports_json_usage_error() {
    let output = run_agent(&["preview", "--tip", "5"]);
    assert_eq!(output.status.code(), Some(2));

    let payload = parse_stdout(&output);
    assert_eq!(payload["operation"], "preview");
    assert_eq!(payload["error"]["code"], 2002);
}
