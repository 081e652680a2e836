use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use assert_json_diff::assert_json_eq;
use envconfig::Envconfig;
use helpdesk_common::auth::{AuthContext, AUTH_HEADER};
use helpdesk_common::client::DeskClient;
use helpdesk_common::config::Config;
use helpdesk_common::error::{SubmitError, GENERIC_SUBMIT_ERROR};
use helpdesk_common::fields::FieldValue;
use helpdesk_common::reference::{fetch_services, ReferenceData, StructureData};
use helpdesk_common::resolver::{fetch_fields, FieldResolver};
use helpdesk_common::submission::{assemble, SubmissionInput};
use helpdesk_common::models::{Service, TicketService};
use helpdesk_common::tickets::{create_ticket, fetch_tickets};
use helpdesk_common::wizard::{TicketWizard, WizardStep};
use httpmock::{Method, MockServer};
use serde_json::json;

fn client_for(server: &MockServer, extra: &[(&str, String)], token: &str) -> DeskClient {
    let mut env = HashMap::from([
        ("HELPDESK_API_URL".to_owned(), server.url("/api")),
        ("HELPDESK_STRUCTURE_URL".to_owned(), server.url("/structure")),
        ("HELPDESK_REQUEST_TIMEOUT_MS".to_owned(), "2000".to_owned()),
    ]);
    for (key, value) in extra {
        env.insert((*key).to_owned(), value.clone());
    }
    let config = Config::init_from_hashmap(&env).unwrap();
    DeskClient::new(&config, AuthContext::new(token)).unwrap()
}

fn mapping_rows() -> serde_json::Value {
    json!([
        {"id": 1, "ticket_service_id": 1, "service_id": 10, "field_group_id": 100},
        {"id": 2, "ticket_service_id": 1, "service_id": 20, "field_group_id": 200},
        {"id": 3, "ticket_service_id": 2, "service_id": 10, "field_group_id": 300}
    ])
}

fn field_groups() -> serde_json::Value {
    json!([
        {"id": 100, "name": "Доступ", "fields": [
            {"id": 1, "name": "Логин", "field_type": "text", "is_required": true},
            {"id": 2, "name": "Уровень", "field_type": "select", "options": "Чтение\nЗапись"}
        ]},
        {"id": 200, "name": "Оборудование", "fields": [
            {"id": 2, "name": "Уровень", "field_type": "select", "options": ["Чтение", "Запись"]},
            {"id": 3, "name": "Телефон", "field_type": "phone"}
        ]},
        {"id": 300, "name": "Прочее", "fields": null}
    ])
}

#[tokio::test]
async fn requests_carry_the_auth_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/api")
                .query_param("endpoint", "tickets")
                .header(AUTH_HEADER, "secret-token");
            then.status(200).json_body(json!({"tickets": [
                {"id": 5, "title": "Нет доступа к 1С", "status_name": "Новая"}
            ]}));
        })
        .await;

    let client = client_for(&server, &[], "secret-token");
    let tickets = fetch_tickets(&client).await.unwrap();

    mock.assert_async().await;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].status_name.as_deref(), Some("Новая"));
}

#[tokio::test]
async fn overridden_endpoint_goes_to_its_own_base() {
    let server = MockServer::start_async().await;
    let redirected = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/services-fn")
                .query_param("endpoint", "services");
            then.status(200)
                .json_body(json!({"services": [{"id": 10, "name": "1С"}]}));
        })
        .await;

    let client = client_for(
        &server,
        &[("HELPDESK_SERVICES_URL", server.url("/services-fn"))],
        "t",
    );
    let services = fetch_services(&client).await.unwrap();

    redirected.assert_async().await;
    assert_eq!(services[0].name, "1С");
}

#[tokio::test]
async fn fields_resolve_from_mappings_and_groups() {
    let server = MockServer::start_async().await;
    let mappings = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/api")
                .query_param("endpoint", "service-field-mappings");
            then.status(200).json_body(mapping_rows());
        })
        .await;
    let groups = server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/api")
                .query_param("endpoint", "field-groups");
            then.status(200).json_body(field_groups());
        })
        .await;

    let client = client_for(&server, &[], "t");
    let fields = fetch_fields(&client, 1, &[10, 20]).await.unwrap();

    let ids: Vec<i64> = fields.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(fields[1].options, vec!["Чтение", "Запись"]);
    mappings.assert_hits_async(1).await;
    groups.assert_hits_async(1).await;

    // Nothing mapped for this pair, so the groups are not even fetched
    let fields = fetch_fields(&client, 2, &[20]).await.unwrap();
    assert!(fields.is_empty());
    groups.assert_hits_async(1).await;
}

#[tokio::test]
async fn failed_resolution_leaves_no_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/api")
                .query_param("endpoint", "service-field-mappings");
            then.status(500).body("boom");
        })
        .await;

    let resolver = FieldResolver::new(Arc::new(client_for(&server, &[], "t")));
    assert!(resolver.refresh(1, &[10]).await);
    assert!(resolver.fields().is_empty());
}

#[tokio::test]
async fn dictionaries_fall_back_on_error_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/api")
                .query_param("endpoint", "ticket-dictionaries-api");
            then.status(503).body("unavailable");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/api")
                .query_param("endpoint", "ticket-services");
            then.status(200).json_body(json!([
                {"id": 1, "name": "Доступ к системам", "service_ids": [10, 20]}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(Method::GET)
                .path("/api")
                .query_param("endpoint", "services");
            then.status(200).json_body(json!([{"id": 10, "name": "1С"}]));
        })
        .await;

    let reference = ReferenceData::load(&client_for(&server, &[], "t")).await;

    assert_eq!(reference.ticket_services.len(), 1);
    assert_eq!(reference.services.len(), 1);
    assert_eq!(reference.dictionaries.priorities.len(), 4);
    assert_eq!(reference.dictionaries.statuses[0].name, "Новая");
}

#[tokio::test]
async fn structure_data_loads_all_four_lists() {
    let server = MockServer::start_async().await;
    for (path, body) in [
        ("/structure/companies", json!([{"id": 1, "name": "Альфа"}])),
        (
            "/structure/departments",
            json!([
                {"id": 10, "name": "ИТ", "parent_id": null, "company_id": 1},
                {"id": 11, "name": "Сети", "parent_id": 10, "company_id": 1}
            ]),
        ),
        ("/structure/positions", json!({"error": "not an array"})),
        (
            "/structure/department-positions",
            json!([{"department_id": 11, "position_id": 100}]),
        ),
    ] {
        server
            .mock_async(move |when, then| {
                when.method(Method::GET).path(path);
                then.status(200).json_body(body);
            })
            .await;
    }

    let data = StructureData::load(&client_for(&server, &[], "t"))
        .await
        .unwrap();

    assert_eq!(data.companies.len(), 1);
    assert_eq!(data.departments[1].parent_id, Some(10));
    assert!(data.positions.is_empty());
    assert_eq!(data.department_positions.len(), 1);
}

#[tokio::test]
async fn create_ticket_posts_the_assembled_payload() {
    let server = MockServer::start_async().await;
    let mut custom_fields = BTreeMap::new();
    custom_fields.insert(1, FieldValue::Text("ivanov".to_owned()));
    custom_fields.insert(3, FieldValue::Phone("+79123456789".to_owned()));
    let payload = assemble(SubmissionInput {
        ticket_service: None,
        service_ids: &[10, 20],
        title: Some("Доступ к 1С"),
        description: "Нужен доступ",
        priority_id: Some(2),
        due_date: Some("2025-01-31"),
        custom_fields: &custom_fields,
    });

    let expected = json!({
        "title": "Доступ к 1С",
        "description": "Нужен доступ",
        "category_id": "",
        "priority_id": 2,
        "status_id": 1,
        "service_id": null,
        "service_ids": [10, 20],
        "due_date": "2025-01-31",
        "custom_fields": {"1": "ivanov", "3": "+79123456789"}
    });
    assert_json_eq!(serde_json::to_value(&payload).unwrap(), expected.clone());

    let mock = server
        .mock_async(|when, then| {
            when.method(Method::POST)
                .path("/api")
                .query_param("endpoint", "tickets")
                .json_body(expected);
            then.status(201)
                .json_body(json!({"id": 77, "title": "Доступ к 1С", "status_id": 1}));
        })
        .await;

    let created = create_ticket(&client_for(&server, &[], "t"), &payload)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created.id, Some(77));
}

#[tokio::test]
async fn any_success_status_creates_the_ticket() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(Method::POST)
                .path("/api")
                .query_param("endpoint", "tickets");
            then.status(201)
                .json_body(json!({"message": "Заявка создана", "ticket_id": 5}));
        })
        .await;

    let ticket_service: TicketService = serde_json::from_value(
        json!({"id": 1, "name": "Запрос доступа", "service_ids": [10]}),
    )
    .unwrap();
    let service: Service = serde_json::from_value(json!({"id": 10, "name": "1C"})).unwrap();
    let mut wizard = TicketWizard::new(vec![ticket_service], vec![service]);
    wizard.open();
    wizard.select_ticket_service(1).unwrap();
    wizard.next().unwrap();
    wizard.toggle_service(10).unwrap();
    wizard.next().unwrap();
    let payload = wizard.assemble(&[]).unwrap();

    let created = create_ticket(&client_for(&server, &[], "t"), &payload)
        .await
        .unwrap();
    wizard.submission_succeeded();

    mock.assert_async().await;
    assert_eq!(created.id, Some(5));
    assert_eq!(created.message.as_deref(), Some("Заявка создана"));
    assert!(!wizard.is_open());
    assert_eq!(wizard.step(), WizardStep::ServiceSelect);
}

#[tokio::test]
async fn success_with_an_unreadable_body_is_still_created() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/api");
            then.status(200).body("OK");
        })
        .await;

    let payload = assemble(SubmissionInput {
        ticket_service: None,
        service_ids: &[10],
        title: None,
        description: "",
        priority_id: None,
        due_date: None,
        custom_fields: &BTreeMap::new(),
    });
    let created = create_ticket(&client_for(&server, &[], "t"), &payload)
        .await
        .unwrap();

    assert_eq!(created.id, None);
}

#[tokio::test]
async fn rejected_ticket_reports_the_server_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/api");
            then.status(400)
                .json_body(json!({"error": "Сервис с ID 7 не найден"}));
        })
        .await;

    let payload = assemble(SubmissionInput {
        ticket_service: None,
        service_ids: &[7],
        title: None,
        description: "",
        priority_id: None,
        due_date: None,
        custom_fields: &BTreeMap::new(),
    });
    let err = create_ticket(&client_for(&server, &[], "t"), &payload)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::Rejected(ref msg) if msg == "Сервис с ID 7 не найден"));
}

#[tokio::test]
async fn rejected_ticket_without_message_uses_generic_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(Method::POST).path("/api");
            then.status(500).body("Internal Server Error");
        })
        .await;

    let payload = assemble(SubmissionInput {
        ticket_service: None,
        service_ids: &[7],
        title: None,
        description: "",
        priority_id: None,
        due_date: None,
        custom_fields: &BTreeMap::new(),
    });
    let err = create_ticket(&client_for(&server, &[], "t"), &payload)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), GENERIC_SUBMIT_ERROR);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let config = Config::init_from_hashmap(&HashMap::from([
        ("HELPDESK_API_URL".to_owned(), "http://127.0.0.1:9/api".to_owned()),
        ("HELPDESK_REQUEST_TIMEOUT_MS".to_owned(), "500".to_owned()),
    ]))
    .unwrap();
    let client = DeskClient::new(&config, AuthContext::anonymous()).unwrap();

    let payload = assemble(SubmissionInput {
        ticket_service: None,
        service_ids: &[7],
        title: None,
        description: "",
        priority_id: None,
        due_date: None,
        custom_fields: &BTreeMap::new(),
    });
    let err = create_ticket(&client, &payload).await.unwrap_err();
    assert!(matches!(err, SubmitError::Network(_)));
}
