//! Integration tests for HTTP API endpoints.

mod common;

use axum::http::StatusCode;
use cabinet_core::FileStatus;
use cabinet_metadata::repos::{BucketRepo, FileRepo};
use common::{create_file_body, TestServer, DEVICE_1, TENANT_1};
use serde_json::json;
use std::collections::HashMap;

#[tokio::test]
async fn create_then_read_returns_new_file() {
    let server = TestServer::new().await;

    let (status, body) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(create_file_body("report.pdf", "AAAA", 10)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "new");
    assert_eq!(body["size"], 10);
    assert_eq!(body["checksum"], "AAAA");
    assert_eq!(body["tenant_id"], TENANT_1);
    assert!(body["signed_url"].as_str().unwrap().contains("method=PUT"));
    assert!(body["bucket_name"].as_str().unwrap().starts_with("test-bucket-"));

    let file_id = body["file_id"].as_i64().unwrap();
    let (status, body) = server
        .request("GET", &format!("/api/v1/files/{file_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_id"], file_id);
    assert_eq!(body["status"], "new");
    assert_eq!(body["size"], 10);
    assert!(body.get("signed_url").is_none());
}

#[tokio::test]
async fn file_ids_are_monotonically_increasing() {
    let server = TestServer::new().await;

    let mut last_id = 0;
    for i in 0..3 {
        let (status, body) = server
            .request(
                "POST",
                "/api/v1/files",
                Some(create_file_body(&format!("file-{i}"), "AAAA", 1)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["file_id"].as_i64().unwrap();
        assert!(id > last_id);
        last_id = id;
    }
}

#[tokio::test]
async fn buckets_rotate_round_robin_across_creates() {
    let server = TestServer::new().await;

    let mut seen: HashMap<String, usize> = HashMap::new();
    for i in 0..4 {
        let (status, body) = server
            .request(
                "POST",
                "/api/v1/files",
                Some(create_file_body(&format!("file-{i}"), "AAAA", 1)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        *seen
            .entry(body["bucket_name"].as_str().unwrap().to_string())
            .or_default() += 1;
    }

    // Two configured buckets, four creates: each bucket exactly twice.
    assert_eq!(seen.len(), 2);
    assert!(seen.values().all(|&count| count == 2));
}

#[tokio::test]
async fn create_rejects_invalid_requests() {
    let server = TestServer::new().await;

    // Non-UUID tenant
    let (status, body) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(json!({
                "tenant_id": "T1",
                "device_id": DEVICE_1,
                "name": "a.txt",
                "checksum": "AAAA",
                "size": 1,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    // Zero size
    let (status, _) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(create_file_body("a.txt", "AAAA", 0)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Checksum that is not base64
    let (status, _) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(create_file_body("a.txt", "!!!!", 1)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // File name with a path separator
    let (status, _) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(create_file_body("../etc/passwd", "AAAA", 1)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_missing_file_is_not_found() {
    let server = TestServer::new().await;
    let (status, body) = server.request("GET", "/api/v1/files/424242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn list_files_scopes_to_tenant_and_device() {
    let server = TestServer::new().await;

    for i in 0..2 {
        let (status, _) = server
            .request(
                "POST",
                "/api/v1/files",
                Some(create_file_body(&format!("file-{i}"), "AAAA", 1)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = server
        .request(
            "GET",
            &format!("/api/internal/v1/files?tenant_id={TENANT_1}&device_id={DEVICE_1}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["files"].as_array().unwrap().len(), 2);

    // A different device sees nothing.
    let (status, body) = server
        .request(
            "GET",
            &format!("/api/internal/v1/files?tenant_id={TENANT_1}&device_id={TENANT_1}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn delete_removes_the_row() {
    let server = TestServer::new().await;

    let (_, body) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(create_file_body("doomed.txt", "AAAA", 1)),
        )
        .await;
    let file_id = body["file_id"].as_i64().unwrap();

    let (status, _) = server
        .request("DELETE", &format!("/api/internal/v1/files/{file_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Cache invalidation is fire-and-forget; wait for it so the read below
    // exercises the authoritative store.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while server
        .cache
        .get::<cabinet_metadata::models::FileRow>(file_id)
        .await
        .is_some()
    {
        assert!(
            tokio::time::Instant::now() < deadline,
            "cache invalidation never landed"
        );
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let (status, _) = server
        .request("GET", &format!("/api/v1/files/{file_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again reports not found.
    let (status, _) = server
        .request("DELETE", &format!("/api/internal/v1/files/{file_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signed_url_follows_file_status() {
    let server = TestServer::new().await;

    let (_, body) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(create_file_body("scan-me.bin", "AAAA", 8)),
        )
        .await;
    let file_id = body["file_id"].as_i64().unwrap();

    // Let the create's fire-and-forget cache population land so the
    // invalidation below is not racing it.
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    while server
        .cache
        .get::<cabinet_metadata::models::FileRow>(file_id)
        .await
        .is_none()
    {
        assert!(
            tokio::time::Instant::now() < deadline,
            "cache population never landed"
        );
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    // A new file can be signed for any supported method.
    let (status, body) = server
        .request(
            "GET",
            &format!("/api/internal/v1/files/{file_id}/signed_url?method=GET"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_name"], "scan-me.bin");
    assert!(body["signed_url"].as_str().unwrap().contains("method=GET"));

    // Unsupported method
    let (status, _) = server
        .request(
            "GET",
            &format!("/api/internal/v1/files/{file_id}/signed_url?method=DELETE"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Quarantine the file; its cached snapshot is invalidated alongside the
    // authoritative update, as the reconciler does.
    server
        .metadata
        .update_file_status(file_id, FileStatus::Quarantined, 8)
        .await
        .unwrap();
    server.cache.remove(file_id).await;

    let (status, body) = server
        .request(
            "GET",
            &format!("/api/internal/v1/files/{file_id}/signed_url?method=GET"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    // Unknown file
    let (status, _) = server
        .request(
            "GET",
            "/api/internal/v1/files/999999/signed_url?method=GET",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archive_bucket_flips_the_flag() {
    let server = TestServer::new().await;

    let (status, _) = server
        .request(
            "POST",
            "/api/internal/v1/buckets/test-bucket-1/archive",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let active = server.metadata.list_active_buckets().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].bucket_name, "test-bucket-2");

    // The running rotation is immutable until restart: creates still use
    // both buckets.
    let (status, _) = server
        .request(
            "POST",
            "/api/v1/files",
            Some(create_file_body("still-works.txt", "AAAA", 1)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = server
        .request("POST", "/api/internal/v1/buckets/nope/archive", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scavenger_trigger_is_accepted() {
    let server = TestServer::new().await;
    let (status, _) = server
        .request("POST", "/api/internal/v1/scavenger", None)
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let server = TestServer::new().await;

    let (status, body) = server.request("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = server.request("GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
}
