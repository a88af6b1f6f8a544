// Copyright (C) 2024 The apca Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end tests running the `apca` binary against a mock server.

use std::process::Command;
use std::process::Output;

use serde_json::json;
use serde_json::Value;

use test_log::test;

use tokio::task::spawn_blocking;

use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;


/// Run the binary with the given arguments, pointed at the provided
/// base URL and with credentials set.
async fn apca(base_url: Option<String>, args: &[&str]) -> Output {
  let args = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();

  spawn_blocking(move || {
    let mut command = Command::new(env!("CARGO_BIN_EXE_apca"));
    let _ = command
      .args(&args)
      .env("ALPACA_API_KEY", "key-id")
      .env("ALPACA_API_SECRET", "secret")
      .env_remove("RUST_LOG");

    match base_url {
      Some(base_url) => command.env("ALPACA_BASE_URL", base_url),
      None => command.env_remove("ALPACA_BASE_URL"),
    };
    command.output().unwrap()
  })
  .await
  .unwrap()
}


/// Check that submitting an order prints the response and succeeds.
#[test(tokio::test(flavor = "multi_thread"))]
async fn submit_order() {
  let server = MockServer::start().await;
  let accepted = json!({
    "id": "61e69015-8549-4bfd-b9c3-01e75843f47d",
    "symbol": "AAPL",
    "status": "accepted",
  });

  Mock::given(method("POST"))
    .and(path("/v2/orders"))
    .and(header("APCA-API-KEY-ID", "key-id"))
    .and(header("APCA-API-SECRET-KEY", "secret"))
    .and(body_json(json!({
      "symbol": "AAPL",
      "qty": "10",
      "side": "buy",
      "type": "market",
      "time_in_force": "gtc",
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(&accepted))
    .expect(1)
    .mount(&server)
    .await;

  let output = apca(
    Some(server.uri()),
    &[
      "order",
      "submit",
      "--symbol",
      "AAPL",
      "--qty",
      "10",
      "--side",
      "buy",
      "--time-in-force",
      "gtc",
    ],
  )
  .await;

  assert_eq!(output.status.code(), Some(0), "{output:?}");
  let stdout = String::from_utf8(output.stdout).unwrap();
  assert_eq!(serde_json::from_str::<Value>(&stdout).unwrap(), accepted);
  // Output is pretty printed with an indentation of two spaces.
  assert!(stdout.contains("\n  \"id\""), "{stdout}");
}


/// Check that the raw `call` command forwards body and query.
#[test(tokio::test(flavor = "multi_thread"))]
async fn raw_call() {
  let server = MockServer::start().await;
  Mock::given(method("PATCH"))
    .and(path("/v2/orders/abc"))
    .and(body_json(json!({"qty": "2"})))
    .respond_with(ResponseTemplate::new(200).set_body_string("replaced"))
    .expect(1)
    .mount(&server)
    .await;

  let output = apca(
    Some(server.uri()),
    &[
      "call",
      "PATCH",
      "/v2/orders/{order_id}",
      "--param",
      "order_id=abc",
      "--data",
      r#"{"qty": "2"}"#,
    ],
  )
  .await;

  assert_eq!(output.status.code(), Some(0), "{output:?}");
  assert_eq!(String::from_utf8(output.stdout).unwrap(), "replaced\n");
}


/// Check that canceling a non-existent order maps to the not-found
/// exit code.
#[test(tokio::test(flavor = "multi_thread"))]
async fn cancel_non_existent_order() {
  let server = MockServer::start().await;
  Mock::given(method("DELETE"))
    .and(path("/v2/orders/zzz"))
    .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "order not found"})))
    .expect(1)
    .mount(&server)
    .await;

  let output = apca(Some(server.uri()), &["order", "cancel", "zzz"]).await;

  assert_eq!(output.status.code(), Some(9), "{output:?}");
  assert!(output.stdout.is_empty());
  let stderr = String::from_utf8(output.stderr).unwrap();
  assert!(stderr.contains("NotFoundError"), "{stderr}");
  assert!(stderr.contains("order not found"), "{stderr}");
}


/// Check that missing credentials are reported without any request
/// being issued.
#[test(tokio::test(flavor = "multi_thread"))]
async fn missing_credentials() {
  let server = MockServer::start().await;
  let base_url = server.uri();

  let output = spawn_blocking(move || {
    Command::new(env!("CARGO_BIN_EXE_apca"))
      .args(["account"])
      .env_remove("ALPACA_API_KEY")
      .env_remove("ALPACA_API_SECRET")
      .env("ALPACA_BASE_URL", base_url)
      .output()
      .unwrap()
  })
  .await
  .unwrap();

  assert_eq!(output.status.code(), Some(3), "{output:?}");
  let stderr = String::from_utf8(output.stderr).unwrap();
  assert!(stderr.contains("CredentialError"), "{stderr}");

  let requests = server.received_requests().await.unwrap();
  assert_eq!(requests.len(), 0);
}


/// Check that an invalid base URL is a configuration error.
#[test(tokio::test(flavor = "multi_thread"))]
async fn invalid_base_url() {
  let output = apca(Some("paper-api.alpaca.markets".to_string()), &["account"]).await;
  assert_eq!(output.status.code(), Some(4), "{output:?}");
}


/// Check that a missing path parameter is reported before sending.
#[test(tokio::test(flavor = "multi_thread"))]
async fn missing_path_parameter() {
  let server = MockServer::start().await;
  let output = apca(Some(server.uri()), &["call", "GET", "/v2/orders/{order_id}"]).await;

  assert_eq!(output.status.code(), Some(5), "{output:?}");
  let requests = server.received_requests().await.unwrap();
  assert_eq!(requests.len(), 0);
}


/// Check that invalid JSON input is a usage error.
#[test(tokio::test(flavor = "multi_thread"))]
async fn invalid_json_argument() {
  let output = apca(None, &["call", "POST", "/v2/orders", "--data", "[]"]).await;
  assert_eq!(output.status.code(), Some(2), "{output:?}");
}


/// Check that an unreachable server is reported as a transport error.
#[test(tokio::test(flavor = "multi_thread"))]
async fn unreachable_server() {
  let port = std::net::TcpListener::bind("127.0.0.1:0")
    .unwrap()
    .local_addr()
    .unwrap()
    .port();

  let output = apca(
    Some(format!("http://127.0.0.1:{port}")),
    &["position", "list", "--timeout", "5"],
  )
  .await;
  assert_eq!(output.status.code(), Some(6), "{output:?}");
}
