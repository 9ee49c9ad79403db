mod common;

use common::{read_block, read_lines, TestServer};
use pipeline_inspector_core::proto::{
    step_meta, CompositionMeta, EmitRequestRequest, EmitResponseRequest, OperationMeta, StepMeta,
};
use pipeline_inspector_core::{RenderMode, StopReason};
use std::time::Duration;
use tokio::io::BufReader;
use tonic::Request;

fn composition_meta(namespace: &str) -> StepMeta {
    StepMeta {
        trace_id: "4bf92f3577b34da6a3ce929d0e0e4736".to_string(),
        span_id: "00f067aa0ba902b7".to_string(),
        step_index: 1,
        iteration: 0,
        function_name: "function-patch-and-transform".to_string(),
        step_name: "patch".to_string(),
        timestamp: Some(prost_types::Timestamp {
            seconds: 1_768_473_000,
            nanos: 123_000_000,
        }),
        context: Some(step_meta::Context::CompositionMeta(CompositionMeta {
            composite_resource_api_version: "x/v1".to_string(),
            composite_resource_kind: "XDatabase".to_string(),
            composite_resource_name: "my-db".to_string(),
            composite_resource_uid: "5b9a1c2e".to_string(),
            composite_resource_namespace: namespace.to_string(),
            composition_name: "databases".to_string(),
        })),
    }
}

#[tokio::test]
async fn test_block_request_with_namespace() {
    let (writer, reader) = tokio::io::duplex(64 * 1024);
    let server = TestServer::start(RenderMode::Block, writer, Duration::from_secs(5)).await;
    let mut client = server.client().await;

    client
        .emit_request(Request::new(EmitRequestRequest {
            request: br#"{"apiVersion":"x/v1"}"#.to_vec(),
            meta: Some(composition_meta("default")),
        }))
        .await
        .unwrap();

    let mut reader = BufReader::new(reader);
    let block = read_block(&mut reader).await;
    let want = concat!(
        "=== REQUEST ===\n",
        "  XR:          x/v1/XDatabase (my-db)\n",
        "  XR UID:      5b9a1c2e\n",
        "  XR NS:       default\n",
        "  Composition: databases\n",
        "  Step:        patch (index 1, iteration 0)\n",
        "  Function:    function-patch-and-transform\n",
        "  Trace ID:    4bf92f3577b34da6a3ce929d0e0e4736\n",
        "  Span ID:     00f067aa0ba902b7\n",
        "  Timestamp:   2026-01-15T10:30:00.123Z\n",
        "  Payload:\n",
        "    apiVersion: x/v1\n",
        "\n",
    );
    assert_eq!(block, want);

    assert_eq!(server.stop().await.unwrap(), StopReason::Drained);
}

#[tokio::test]
async fn test_block_cluster_scoped_and_error_response() {
    let (writer, reader) = tokio::io::duplex(64 * 1024);
    let server = TestServer::start(RenderMode::Block, writer, Duration::from_secs(5)).await;
    let mut client = server.client().await;

    client
        .emit_request(Request::new(EmitRequestRequest {
            request: br#"{"apiVersion":"x/v1"}"#.to_vec(),
            meta: Some(composition_meta("")),
        }))
        .await
        .unwrap();
    client
        .emit_response(Request::new(EmitResponseRequest {
            response: Vec::new(),
            error: "boom".to_string(),
            meta: Some(composition_meta("default")),
        }))
        .await
        .unwrap();

    let mut reader = BufReader::new(reader);
    let request = read_block(&mut reader).await;
    assert!(request.starts_with("=== REQUEST ===\n"));
    assert!(!request.contains("XR NS:"));

    let response = read_block(&mut reader).await;
    assert!(response.starts_with("=== RESPONSE ===\n"));
    assert!(response.contains("\n  Error:       boom\n"));
    assert!(!response.contains("Payload:"));
}

#[tokio::test]
async fn test_line_records() {
    let (writer, reader) = tokio::io::duplex(64 * 1024);
    let server = TestServer::start(RenderMode::Line, writer, Duration::from_secs(5)).await;
    let mut client = server.client().await;

    client
        .emit_request(Request::new(EmitRequestRequest {
            request: br#"{"apiVersion":"x/v1","spec":{"replicas":3}}"#.to_vec(),
            meta: Some(composition_meta("default")),
        }))
        .await
        .unwrap();
    client
        .emit_response(Request::new(EmitResponseRequest {
            response: b"not json".to_vec(),
            error: String::new(),
            meta: Some(StepMeta {
                step_name: "rotate".to_string(),
                context: Some(step_meta::Context::OperationMeta(OperationMeta {
                    operation_name: "rotate-keys".to_string(),
                    operation_uid: "op-1".to_string(),
                })),
                ..Default::default()
            }),
        }))
        .await
        .unwrap();

    let lines = read_lines(reader, 2).await;
    let request: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(request["type"], "REQUEST");
    assert_eq!(request["meta"]["compositionMeta"]["compositeResourceKind"], "XDatabase");
    assert_eq!(request["meta"]["compositionMeta"]["compositeResourceNamespace"], "default");
    assert_eq!(request["meta"]["timestamp"], "2026-01-15T10:30:00.123Z");
    assert_eq!(request["payload"]["spec"]["replicas"], 3);
    assert!(request.get("error").is_none());

    let response: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(response["type"], "RESPONSE");
    assert_eq!(response["meta"]["operationMeta"]["operationName"], "rotate-keys");
    assert_eq!(response["payload"], "not json");
    assert!(response.get("error").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clients_produce_intact_records() {
    const CLIENTS: usize = 5;
    const CALLS_PER_CLIENT: usize = 20;

    let (writer, reader) = tokio::io::duplex(256);
    let server = TestServer::start(RenderMode::Line, writer, Duration::from_secs(5)).await;
    let reader_task =
        tokio::spawn(async move { read_lines(reader, CLIENTS * CALLS_PER_CLIENT).await });

    let mut handles = Vec::new();
    for client_id in 0..CLIENTS {
        let mut client = server.client().await;
        handles.push(tokio::spawn(async move {
            for call in 0..CALLS_PER_CLIENT {
                let payload = serde_json::json!({
                    "client": client_id,
                    "call": call,
                    "padding": "x".repeat(200),
                });
                client
                    .emit_response(Request::new(EmitResponseRequest {
                        response: serde_json::to_vec(&payload).unwrap(),
                        meta: Some(composition_meta("default")),
                        ..Default::default()
                    }))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in futures::future::join_all(handles).await {
        handle.unwrap();
    }

    let lines = reader_task.await.unwrap();
    let mut seen = std::collections::HashSet::new();
    for line in &lines {
        let record: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(record["type"], "RESPONSE");
        let key = (
            record["payload"]["client"].as_u64().unwrap(),
            record["payload"]["call"].as_u64().unwrap(),
        );
        assert!(seen.insert(key), "duplicate record {:?}", key);
    }
    assert_eq!(seen.len(), CLIENTS * CALLS_PER_CLIENT);

    assert_eq!(server.stop().await.unwrap(), StopReason::Drained);
}

#[tokio::test]
async fn test_oversized_message_is_rejected() {
    let (writer, _reader) = tokio::io::duplex(1024);
    let server = TestServer::start(RenderMode::Line, writer, Duration::from_secs(5)).await;
    let mut client = server.client().await;

    let status = client
        .emit_request(Request::new(EmitRequestRequest {
            request: vec![b'a'; 5 * 1024 * 1024],
            meta: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::OutOfRange);
}
