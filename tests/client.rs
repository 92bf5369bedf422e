mod common;

use common::{serve, CannedResponse};
use font_sync::client::KintoClient;
use font_sync::config::{CollectionRef, Credentials};
use font_sync::contract::{AttachmentUpload, RecordStore};
use font_sync::SyncError;
use serde_json::json;

fn client() -> KintoClient {
    KintoClient::new("u:p".parse::<Credentials>().unwrap()).unwrap()
}

fn collection(base: &str) -> CollectionRef {
    CollectionRef::parse(&format!("{base}/v1/buckets/b/collections/c")).unwrap()
}

fn font_upload() -> AttachmentUpload {
    AttachmentUpload {
        record_id: "rid".to_string(),
        filename: "f.ttf".to_string(),
        mimetype: "application/x-font-ttf".to_string(),
        content: b"glyphs".to_vec(),
        data: r#"{"platforms":["linux"]}"#.to_string(),
        permissions: "{}".to_string(),
    }
}

#[tokio::test]
async fn fetch_records_follows_next_page() {
    let (base, server) = serve(|base| {
        vec![
            CannedResponse::json(200, json!({ "data": [{ "id": "x1" }] })).with_header(
                "Next-Page",
                &format!("{base}/v1/buckets/b/collections/c/records?_token=page2"),
            ),
            CannedResponse::json(200, json!({ "data": [{ "id": "x2" }] })),
        ]
    });

    let records = client().fetch_records(&collection(&base)).await.unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["x1", "x2"]);

    let requests = server.join().unwrap();
    assert_eq!(
        requests[0].request_line,
        "GET /v1/buckets/b/collections/c/records HTTP/1.1"
    );
    assert_eq!(
        requests[1].request_line,
        "GET /v1/buckets/b/collections/c/records?_token=page2 HTTP/1.1"
    );
    for request in &requests {
        assert_eq!(request.header("authorization"), Some("Basic dTpw"));
    }
}

#[tokio::test]
async fn upload_sends_multipart_form_to_gzipped_attachment_endpoint() {
    let (base, server) = serve(|_| {
        vec![CannedResponse::json(
            201,
            json!({ "id": "rid", "location": "fonts/f.ttf" }),
        )]
    });

    let response = client()
        .upload_attachment(&collection(&base), font_upload())
        .await
        .unwrap();
    assert_eq!(response["id"], "rid");

    let requests = server.join().unwrap();
    let request = &requests[0];
    assert_eq!(
        request.request_line,
        "POST /v1/buckets/b/collections/c/records/rid/attachment?gzipped=true HTTP/1.1"
    );
    assert_eq!(request.header("authorization"), Some("Basic dTpw"));
    assert!(request
        .header("content-type")
        .is_some_and(|v| v.starts_with("multipart/form-data; boundary=")));

    let body = request.body_text();
    assert!(body.contains(r#"name="data""#));
    assert!(body.contains(r#"{"platforms":["linux"]}"#));
    assert!(body.contains(r#"name="permissions""#));
    assert!(body.contains(r#"name="attachment"; filename="f.ttf""#));
    assert!(body.to_ascii_lowercase().contains("application/x-font-ttf"));
    assert!(body.contains("glyphs"));
}

#[tokio::test]
async fn unreadable_bucket_is_reported_as_absent() {
    let (base, server) = serve(|_| {
        vec![CannedResponse::json(
            403,
            json!({ "code": 403, "errno": 121, "error": "Forbidden" }),
        )]
    });

    let bucket = client().fetch_bucket(&collection(&base)).await.unwrap();
    assert!(bucket.is_none());

    let requests = server.join().unwrap();
    assert_eq!(requests[0].request_line, "GET /v1/buckets/b HTTP/1.1");
}

#[tokio::test]
async fn readable_bucket_exposes_its_permissions() {
    let (base, server) = serve(|_| {
        vec![CannedResponse::json(
            200,
            json!({
                "data": { "id": "b", "last_modified": 1 },
                "permissions": { "read": ["system.Everyone"], "write": ["account:admin"] }
            }),
        )]
    });

    let bucket = client()
        .fetch_bucket(&collection(&base))
        .await
        .unwrap()
        .expect("bucket should be present");
    assert!(bucket.permissions.grants_public_read());
    server.join().unwrap();
}

#[tokio::test]
async fn failed_upload_surfaces_status_and_body() {
    let (base, server) = serve(|_| {
        vec![CannedResponse::json(500, json!({ "error": "boom" }))]
    });

    let err = client()
        .upload_attachment(&collection(&base), font_upload())
        .await
        .unwrap_err();
    match err {
        SyncError::Transport {
            method,
            status,
            body,
            url,
        } => {
            assert_eq!(method, "POST");
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
            assert!(url.ends_with("/records/rid/attachment?gzipped=true"));
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
    server.join().unwrap();
}

#[tokio::test]
async fn create_collection_posts_id_and_permissions() {
    let (base, server) = serve(|_| {
        vec![CannedResponse::json(201, json!({ "data": { "id": "c" } }))]
    });

    let permissions = font_sync::contract::Permissions::public_read();
    client()
        .create_collection(&collection(&base), &permissions)
        .await
        .unwrap();

    let requests = server.join().unwrap();
    let request = &requests[0];
    assert_eq!(
        request.request_line,
        "POST /v1/buckets/b/collections HTTP/1.1"
    );
    let sent: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(sent["data"]["id"], "c");
    assert_eq!(sent["permissions"]["read"], json!(["system.Everyone"]));
}
