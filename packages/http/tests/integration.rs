use serde_json::json;
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tagfs_http::{Error, HttpObjectService};
use tagfs_object_service::{
    queries, NewAnnotation, ObjectRef, ObjectService, Params, Scalar, ServiceError,
};

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_json(json!({"username": "alice", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"session_key": "key-1"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_session_key_sent_with_requests() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/annotations"))
        .and(header("X-Session-Key", "key-1"))
        .and(query_param("ns", "test-ns"))
        .and(query_param("text_value", "/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 4, "ns": "test-ns", "text_value": "/a", "created": 1500}
        ])))
        .mount(&server)
        .await;

    let uri = server.uri();
    let found = tokio::task::spawn_blocking(move || {
        let service = HttpObjectService::connect(&uri, "alice", "secret").unwrap();
        service.find_annotations("test-ns", "/a").unwrap()
    })
    .await
    .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 4);
    assert_eq!(found[0].created.millis(), 1500);
}

#[tokio::test]
async fn test_rejected_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "bad password"})))
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        HttpObjectService::connect(&uri, "alice", "wrong").map(|_| ())
    })
    .await
    .unwrap();

    match result {
        Err(Error::Session { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "bad password");
        }
        other => panic!("expected session error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_annotation() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/annotations"))
        .and(body_json(json!({"ns": "n", "text_value": "/d"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 10, "ns": "n", "text_value": "/d", "created": 0
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let created = tokio::task::spawn_blocking(move || {
        let service = HttpObjectService::connect(&uri, "alice", "secret").unwrap();
        service
            .create_annotation(NewAnnotation {
                ns: "n".to_string(),
                text_value: "/d".to_string(),
            })
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(created.id, 10);
    assert_eq!(created.text_value, "/d");
}

#[tokio::test]
async fn test_missing_object_maps_to_not_found() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/files/77"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let service = HttpObjectService::connect(&uri, "alice", "secret").unwrap();
        service.get_file(77)
    })
    .await
    .unwrap();

    match result {
        Err(ServiceError::NotFound(object)) => assert_eq!(object, ObjectRef::original_file(77)),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_projection_posts_query_and_params() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/query/projection"))
        .and(body_json(json!({
            "query": queries::CHILD_MARKERS,
            "params": {"id": 3, "ns": "n"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[5, "/a"], [6, "/b"]])))
        .mount(&server)
        .await;

    let uri = server.uri();
    let rows = tokio::task::spawn_blocking(move || {
        let service = HttpObjectService::connect(&uri, "alice", "secret").unwrap();
        let params = Params::new().add_id(3).add_string("ns", "n");
        service.projection(queries::CHILD_MARKERS, &params).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(
        rows,
        vec![
            vec![Scalar::Long(5), Scalar::from("/a")],
            vec![Scalar::Long(6), Scalar::from("/b")],
        ]
    );
}

#[tokio::test]
async fn test_ranged_file_content() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/files/3/data"))
        .and(query_param("offset", "2"))
        .and(query_param("length", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"llo".to_vec()))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/files/3/data"))
        .and(query_param("offset", "5"))
        .and(query_param("length", "6"))
        .and(body_bytes(b" world".to_vec()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/3/size"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"size": 11})))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (read, size) = tokio::task::spawn_blocking(move || {
        let service = HttpObjectService::connect(&uri, "alice", "secret").unwrap();
        let read = service.read_file(3, 2, 3).unwrap();
        service.write_file(3, 5, b" world").unwrap();
        (read, service.file_size(3).unwrap())
    })
    .await
    .unwrap();

    assert_eq!(read, b"llo");
    assert_eq!(size, 11);
}

#[tokio::test]
async fn test_delete_and_close() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/objects/annotation/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let after_close = tokio::task::spawn_blocking(move || {
        let service = HttpObjectService::connect(&uri, "alice", "secret").unwrap();
        service.delete(ObjectRef::annotation(9)).unwrap();
        service.close().unwrap();
        // a second close does not reach the server
        service.close().unwrap();
        service.file_size(9)
    })
    .await
    .unwrap();

    assert!(matches!(after_close, Err(ServiceError::Closed)));
}

#[tokio::test]
async fn test_server_error_is_remote() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("POST"))
        .and(path("/query/projection"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "query failed"})),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let service = HttpObjectService::connect(&uri, "alice", "secret").unwrap();
        service.projection("SELECT nothing", &Params::new())
    })
    .await
    .unwrap();

    match result {
        Err(ServiceError::Remote { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "query failed");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}
