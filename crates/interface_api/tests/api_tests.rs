//! HTTP tests for the sales order endpoints against the in-memory record port

use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};

use core_kernel::{EntityId, ItemId, PortError, RecordType};
use domain_sales_order::{MockRecordPort, PortCall, RecordChange};
use interface_api::auth::{create_token, permissions};
use interface_api::config::ApiConfig;
use interface_api::create_router;
use test_utils::{
    assert_entity, assert_failure_envelope, assert_item_lines, assert_success_envelope,
    update_sales_order_body, CreateSalesOrderBodyBuilder, IdFixtures, MockRecordPortBuilder,
};

const PATH: &str = "/api/v1/sales-orders";

fn config() -> ApiConfig {
    ApiConfig {
        jwt_secret: "api-test-secret".to_string(),
        ..ApiConfig::default()
    }
}

fn bearer(roles: &[&str]) -> HeaderValue {
    let config = config();
    let token = create_token(
        "clerk-7",
        roles.iter().map(|r| r.to_string()).collect(),
        &config.jwt_secret,
        config.jwt_expiration_secs,
    )
    .unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn as_writer(request: TestRequest) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        bearer(&[permissions::SALES_ORDER_READ, permissions::SALES_ORDER_WRITE]),
    )
}

fn as_reader(request: TestRequest) -> TestRequest {
    request.add_header(header::AUTHORIZATION, bearer(&[permissions::SALES_ORDER_READ]))
}

async fn server_with(port: Arc<MockRecordPort>) -> TestServer {
    TestServer::new(create_router(port, config())).unwrap()
}

async fn seeded() -> (Arc<MockRecordPort>, TestServer) {
    let port = MockRecordPortBuilder::new()
        .with_fixture_sales_order()
        .build()
        .await;
    let server = server_with(port.clone()).await;
    (port, server)
}

mod get {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_record_representation() {
        let (_port, server) = seeded().await;

        let response = as_reader(server.get(PATH))
            .add_query_param("so_id_postman", "23327")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], json!(23327));
        assert_eq!(body["type"], json!("salesorder"));
        assert_entity(&body, 534);
        assert_item_lines(&body, &[338, 12, 99]);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_failure_envelope() {
        let (_port, server) = seeded().await;

        let response = as_reader(server.get(PATH))
            .add_query_param("so_id_postman", IdFixtures::missing_sales_order_id().value())
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_failure_envelope(&response.json::<Value>(), "not_found");
    }

    #[tokio::test]
    async fn test_get_rejects_malformed_id() {
        let (port, server) = seeded().await;

        for bad in ["abc", "0", "-4"] {
            let response = as_reader(server.get(PATH))
                .add_query_param("so_id_postman", bad)
                .expect_failure()
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_failure_envelope(&response.json::<Value>(), "bad_request");
        }
        assert!(port.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_without_id_is_bad_request() {
        let (_port, server) = seeded().await;

        let response = as_reader(server.get(PATH)).expect_failure().await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_failure_envelope(&response.json::<Value>(), "bad_request");
    }
}

mod put {
    use super::*;

    #[tokio::test]
    async fn test_put_changes_only_entity() {
        let (port, server) = seeded().await;

        let response = as_writer(server.put(PATH))
            .json(&update_sales_order_body(
                IdFixtures::sales_order_id(),
                IdFixtures::other_customer_id(),
            ))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(assert_success_envelope(&body, "updated_so_id"), 23327);

        let stored = port
            .stored(RecordType::SalesOrder, IdFixtures::sales_order_id().into())
            .await
            .unwrap();
        assert_eq!(stored.fields["entity"], json!(777));
        assert_eq!(stored.fields["memo"], json!("Existing order"));
        assert_eq!(stored.sublists["item"].len(), 3);

        let Some(PortCall::Save { changes, .. }) = port.calls().await.pop() else {
            panic!("expected the last call to be a save");
        };
        assert_eq!(
            changes,
            vec![RecordChange::SetValue {
                field_id: "entity".to_string(),
                value: json!(777),
            }]
        );
    }

    #[tokio::test]
    async fn test_put_accepts_string_ids() {
        let (_port, server) = seeded().await;

        let response = as_writer(server.put(PATH))
            .json(&json!({ "sales_order_id": "23327", "entity": "777" }))
            .await;

        response.assert_status_ok();
        assert_success_envelope(&response.json::<Value>(), "updated_so_id");
    }

    #[tokio::test]
    async fn test_put_unknown_sales_order_fails() {
        let (_port, server) = seeded().await;

        let response = as_writer(server.put(PATH))
            .json(&update_sales_order_body(
                IdFixtures::missing_sales_order_id(),
                IdFixtures::customer_id(),
            ))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_failure_envelope(&response.json::<Value>(), "not_found");
    }

    #[tokio::test]
    async fn test_put_missing_entity_is_bad_request() {
        let (port, server) = seeded().await;

        let response = as_writer(server.put(PATH))
            .json(&json!({ "sales_order_id": 23327 }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_failure_envelope(&response.json::<Value>(), "bad_request");
        assert!(port.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_put_requires_write_role() {
        let (port, server) = seeded().await;

        let response = as_reader(server.put(PATH))
            .json(&update_sales_order_body(
                IdFixtures::sales_order_id(),
                IdFixtures::other_customer_id(),
            ))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert_failure_envelope(&response.json::<Value>(), "forbidden");
        assert!(port.calls().await.is_empty());
    }
}

mod post {
    use super::*;

    #[tokio::test]
    async fn test_post_creates_order_with_lines_in_order() {
        let (port, server) = seeded().await;
        let items: Vec<ItemId> = [5, 41, 7, 41]
            .into_iter()
            .map(|id| ItemId::new(id).unwrap())
            .collect();

        let response = as_writer(server.post(PATH))
            .json(
                &CreateSalesOrderBodyBuilder::new()
                    .with_entity(EntityId::new(534).unwrap())
                    .with_items(&items)
                    .build(),
            )
            .await;

        response.assert_status_ok();
        let id = assert_success_envelope(&response.json::<Value>(), "sales_order_id");
        assert_eq!(id, IdFixtures::next_sales_order_id());

        let calls = port.calls().await;
        let Some(PortCall::Save { changes, id: None, .. }) = calls.last() else {
            panic!("expected a save of a new record, got {calls:?}");
        };
        let committed: Vec<usize> = changes
            .iter()
            .filter_map(|c| match c {
                RecordChange::CommitLine { line, .. } => Some(*line),
                _ => None,
            })
            .collect();
        assert_eq!(committed, vec![0, 1, 2, 3]);

        let read = as_reader(server.get(PATH))
            .add_query_param("so_id_postman", id)
            .await;
        read.assert_status_ok();
        let record: Value = read.json();
        assert_entity(&record, 534);
        assert_item_lines(&record, &[5, 41, 7, 41]);
    }

    #[tokio::test]
    async fn test_post_without_items_saves_header_only() {
        let port = MockRecordPortBuilder::new().starting_at(41000).build().await;
        let server = server_with(port.clone()).await;

        let response = as_writer(server.post(PATH))
            .json(&CreateSalesOrderBodyBuilder::new().without_items().build())
            .await;

        response.assert_status_ok();
        let id = assert_success_envelope(&response.json::<Value>(), "sales_order_id");
        assert_eq!(id, 41000);

        let calls = port.calls().await;
        assert_eq!(calls.len(), 2, "unexpected calls: {calls:?}");
        assert!(matches!(calls[0], PortCall::Create { .. }));
        let PortCall::Save { changes, id: None, .. } = &calls[1] else {
            panic!("expected a save of a new record, got {calls:?}");
        };
        assert!(!changes
            .iter()
            .any(|c| matches!(c, RecordChange::CommitLine { .. })));
    }

    #[tokio::test]
    async fn test_post_with_bad_entity_is_bad_request() {
        let (_port, server) = seeded().await;

        let response = as_writer(server.post(PATH))
            .json(
                &CreateSalesOrderBodyBuilder::new()
                    .with_raw_entity(json!("customer-534"))
                    .build(),
            )
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_failure_envelope(&response.json::<Value>(), "bad_request");
    }

    #[tokio::test]
    async fn test_record_service_failure_keeps_its_category() {
        let port = MockRecordPortBuilder::new()
            .failing_with(PortError::RateLimited { retry_after_secs: 9 })
            .build()
            .await;
        let server = server_with(port).await;

        let response = as_writer(server.post(PATH))
            .json(&CreateSalesOrderBodyBuilder::new().build())
            .expect_failure()
            .await;

        response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.header(header::RETRY_AFTER), "9");
        assert_failure_envelope(&response.json::<Value>(), "rate_limited");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_reports_deleted_id_then_read_fails() {
        let (_port, server) = seeded().await;

        let response = as_writer(server.delete(PATH))
            .add_query_param("so_id_to_dlt", 23327)
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(assert_success_envelope(&body, "deleted_so_id"), 23327);

        let read = as_reader(server.get(PATH))
            .add_query_param("so_id_postman", 23327)
            .expect_failure()
            .await;
        read.assert_status(StatusCode::NOT_FOUND);
        assert_failure_envelope(&read.json::<Value>(), "not_found");
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let (_port, server) = seeded().await;

        let response = as_writer(server.delete(PATH))
            .add_query_param("so_id_to_dlt", IdFixtures::missing_sales_order_id().value())
            .expect_failure()
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_failure_envelope(&response.json::<Value>(), "not_found");
    }

    #[tokio::test]
    async fn test_delete_with_wrong_parameter_name_is_bad_request() {
        let (port, server) = seeded().await;

        let response = as_writer(server.delete(PATH))
            .add_query_param("so_id_postman", 23327)
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_failure_envelope(&response.json::<Value>(), "bad_request");
        assert!(port.calls().await.is_empty());
    }
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (_port, server) = seeded().await;

        let response = server
            .get(PATH)
            .add_query_param("so_id_postman", 23327)
            .expect_failure()
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_failure_envelope(&response.json::<Value>(), "unauthorized");
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_unauthorized() {
        let (_port, server) = seeded().await;
        let token = create_token(
            "intruder",
            vec![permissions::ADMIN.to_string()],
            "some-other-secret",
            60,
        )
        .unwrap();

        let response = server
            .get(PATH)
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
            )
            .add_query_param("so_id_postman", 23327)
            .expect_failure()
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_can_write() {
        let (_port, server) = seeded().await;

        let response = server
            .delete(PATH)
            .add_header(header::AUTHORIZATION, bearer(&[permissions::ADMIN]))
            .add_query_param("so_id_to_dlt", 23327)
            .await;

        response.assert_status_ok();
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let (_port, server) = seeded().await;

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_readiness_reports_record_service() {
        let (_port, server) = seeded().await;

        let response = server.get("/health/ready").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], json!("ready"));
        assert_eq!(body["record_service"]["adapter_id"], json!("mock-record-port"));
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let (_port, server) = seeded().await;

        let response = server.get("/health").await;

        assert!(!response.header("x-request-id").is_empty());
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use test_utils::{entity_id_strategy, item_list_strategy};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn post_commits_one_line_per_item(
            entity in entity_id_strategy(),
            items in item_list_strategy(12),
        ) {
            let (calls, record) = runtime().block_on(async {
                let port = MockRecordPortBuilder::new().build().await;
                let server = server_with(port.clone()).await;

                let response = as_writer(server.post(PATH))
                    .json(
                        &CreateSalesOrderBodyBuilder::new()
                            .with_entity(entity)
                            .with_items(&items)
                            .build(),
                    )
                    .await;
                response.assert_status_ok();
                let id = assert_success_envelope(&response.json::<Value>(), "sales_order_id");

                let read = as_reader(server.get(PATH))
                    .add_query_param("so_id_postman", id)
                    .await;
                read.assert_status_ok();
                (port.calls().await, read.json::<Value>())
            });

            let committed = calls
                .iter()
                .filter_map(|call| match call {
                    PortCall::Save { id: None, changes, .. } => Some(changes),
                    _ => None,
                })
                .flatten()
                .filter(|c| matches!(c, RecordChange::CommitLine { .. }))
                .count();
            prop_assert_eq!(committed, items.len());

            let expected: Vec<u64> = items.iter().map(|i| i.value()).collect();
            assert_entity(&record, entity.value());
            assert_item_lines(&record, &expected);
        }
    }
}
