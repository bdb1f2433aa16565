//! End-to-end sessions: JSON-RPC frames in, JSON-RPC frames out, with the
//! upstream API mocked.

use insumer_client::ClientConfig;
use insumer_mcp::build_server;
use insumer_mcp_types::{ErrorCode, LATEST_PROTOCOL_VERSION};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Session {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    server: JoinHandle<anyhow::Result<()>>,
    next_id: i64,
}

impl Session {
    fn start(config: ClientConfig) -> Self {
        let server = build_server(config).expect("server");
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (client_read, client_write) = tokio::io::split(client_side);

        Self {
            writer: client_write,
            lines: BufReader::new(client_read).lines(),
            server: tokio::spawn(server.serve(server_read, server_write)),
            next_id: 1,
        }
    }

    async fn send(&mut self, frame: &str) {
        self.writer.write_all(frame.as_bytes()).await.expect("write");
        self.writer.write_all(b"\n").await.expect("write");
        self.writer.flush().await.expect("flush");
    }

    async fn receive(&mut self) -> Value {
        let line = self
            .lines
            .next_line()
            .await
            .expect("read")
            .expect("server closed the stream");
        serde_json::from_str(&line).expect("response frame is JSON")
    }

    async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        let frame = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        self.send(&frame.to_string()).await;

        let response = self.receive().await;
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], id);
        response
    }

    async fn notify(&mut self, method: &str) {
        let frame = json!({ "jsonrpc": "2.0", "method": method });
        self.send(&frame.to_string()).await;
    }

    async fn initialize(&mut self) -> Value {
        let response = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": { "name": "session-test", "version": "1.0.0" }
                }),
            )
            .await;
        self.notify("notifications/initialized").await;
        response
    }

    async fn call(&mut self, tool: &str, arguments: Value) -> Value {
        self.request("tools/call", json!({ "name": tool, "arguments": arguments }))
            .await
    }

    /// Close stdin and wait for the server to drain.
    async fn finish(self) {
        let Self {
            mut writer, server, ..
        } = self;
        writer.shutdown().await.expect("shutdown");
        server
            .await
            .expect("server task")
            .expect("server exits cleanly on EOF");
    }
}

fn config(server: &MockServer, key: Option<&str>) -> ClientConfig {
    ClientConfig::new(key.map(str::to_string)).with_base_url(server.uri())
}

#[tokio::test]
async fn test_handshake_and_tool_listing() {
    let upstream = MockServer::start().await;
    let mut session = Session::start(config(&upstream, None));

    let init = session.initialize().await;
    assert_eq!(init["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(init["result"]["serverInfo"]["name"], "insumer");
    assert!(
        init["result"]["instructions"]
            .as_str()
            .unwrap()
            .contains("INSUMER_API_KEY")
    );
    assert!(init["result"]["capabilities"]["tools"].is_object());
    assert!(init["result"]["capabilities"].get("logging").is_none());

    let listed = session.request("tools/list", json!({})).await;
    let tools = listed["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 25);

    let attest = tools
        .iter()
        .find(|tool| tool["name"] == "insumer_attest")
        .expect("insumer_attest listed");
    assert_eq!(attest["inputSchema"]["additionalProperties"], false);
    assert_eq!(attest["inputSchema"]["required"], json!(["conditions"]));
    assert_eq!(attest["inputSchema"]["properties"]["conditions"]["maxItems"], 10);

    assert_eq!(session.request("ping", json!({})).await["result"], json!({}));

    session.finish().await;
}

#[tokio::test]
async fn test_unknown_protocol_version_negotiates_latest() {
    let upstream = MockServer::start().await;
    let mut session = Session::start(config(&upstream, None));

    let init = session
        .request(
            "initialize",
            json!({
                "protocolVersion": "1999-01-01",
                "capabilities": {},
                "clientInfo": { "name": "future-client", "version": "9.0.0" }
            }),
        )
        .await;
    assert_eq!(init["result"]["protocolVersion"], LATEST_PROTOCOL_VERSION);

    let again = session
        .request(
            "initialize",
            json!({
                "protocolVersion": LATEST_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": "future-client", "version": "9.0.0" }
            }),
        )
        .await;
    assert_eq!(again["error"]["code"], ErrorCode::INVALID_REQUEST);

    session.finish().await;
}

#[tokio::test]
async fn test_validate_code_scenario_without_key() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/codes/INSR-AB12C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "data": { "valid": true, "code": "INSR-AB12C", "merchantId": "acme", "discountPercent": 10 }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let mut session = Session::start(config(&upstream, None));
    session.initialize().await;

    let response = session
        .call("insumer_validate_code", json!({ "code": "INSR-AB12C" }))
        .await;
    let result = &response["result"];
    assert!(result.get("isError").is_none());

    let body: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(body["data"]["merchantId"], "acme");

    session.finish().await;
}

#[tokio::test]
async fn test_limit_above_maximum_is_invalid_params() {
    let upstream = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let mut session = Session::start(config(&upstream, Some("test-key")));
    session.initialize().await;

    let response = session
        .call("insumer_list_merchants", json!({ "token": "UNI", "limit": 250 }))
        .await;
    assert_eq!(response["error"]["code"], ErrorCode::INVALID_PARAMS);
    assert_eq!(
        response["error"]["message"],
        "insumer_list_merchants: limit: must be at most 200"
    );
    assert_eq!(response["error"]["data"]["path"], "limit");

    session.finish().await;
}

#[tokio::test]
async fn test_missing_key_reported_per_call() {
    let upstream = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let mut session = Session::start(config(&upstream, None));
    session.initialize().await;

    let response = session.call("insumer_credits", json!({})).await;
    assert_eq!(response["result"]["isError"], true);
    assert!(
        response["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("INSUMER_API_KEY is not set.")
    );

    session.finish().await;
}

#[tokio::test]
async fn test_configure_tokens_round_trip() {
    let upstream = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/merchants/acme/tokens"))
        .and(header("x-api-key", "test-key"))
        .and(body_json(json!({ "ownToken": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "data": { "ownToken": null, "partnerTokens": [] }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let mut session = Session::start(config(&upstream, Some("test-key")));
    session.initialize().await;

    let response = session
        .call("insumer_configure_tokens", json!({ "merchantId": "acme", "ownToken": null }))
        .await;
    assert!(response["result"].get("isError").is_none());

    session.finish().await;
}

#[tokio::test]
async fn test_protocol_errors() {
    let upstream = MockServer::start().await;
    let mut session = Session::start(config(&upstream, None));
    session.initialize().await;

    let unknown_tool = session.call("insumer_teleport", json!({})).await;
    assert_eq!(unknown_tool["error"]["code"], ErrorCode::INVALID_PARAMS);

    let unknown_method = session.request("resources/list", json!({})).await;
    assert_eq!(unknown_method["error"]["code"], ErrorCode::METHOD_NOT_FOUND);

    session.send("this is not json").await;
    let parse_error = session.receive().await;
    assert_eq!(parse_error["error"]["code"], ErrorCode::PARSE_ERROR);
    assert_eq!(parse_error["id"], Value::Null);

    session.finish().await;
}

#[tokio::test]
async fn test_malformed_frames_are_always_answered() {
    let upstream = MockServer::start().await;
    let mut session = Session::start(config(&upstream, None));
    session.initialize().await;

    session
        .send(r#"{"jsonrpc":"2.0","id":18446744073709551615,"method":"ping"}"#)
        .await;
    let wide = session.receive().await;
    assert_eq!(wide["id"], json!(u64::MAX));
    assert_eq!(wide["result"], json!({}));

    session.send(r#"{"jsonrpc":"2.0","id":2.5,"method":42}"#).await;
    let invalid = session.receive().await;
    assert_eq!(invalid["id"], json!(2.5));
    assert_eq!(invalid["error"]["code"], ErrorCode::INVALID_REQUEST);

    let level = session
        .request("logging/setLevel", json!({ "level": "warning" }))
        .await;
    assert_eq!(level["result"], json!({}));

    session.finish().await;
}
