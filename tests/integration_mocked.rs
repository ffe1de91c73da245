/// Integration tests with a mocked Twenty GraphQL endpoint
/// Exercises lead reconciliation end to end without hitting a real CRM
use contact_lead_api::crm_client::CrmClient;
use contact_lead_api::crm_models::CreatePersonData;
use contact_lead_api::errors::{CrmError, LeadError};
use contact_lead_api::models::Submission;
use contact_lead_api::reconciler::{reconcile_lead, MatchPolicy};
use serde_json::{json, Value};
use wiremock::matchers::{bearer_token, body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

const FIND_COMPANY: &str = "query FindCompany";
const CREATE_COMPANY: &str = "mutation CreateCompany";
const FIND_PERSON: &str = "query FindPerson";
const CREATE_PERSON: &str = "mutation CreatePerson";
const CREATE_OPPORTUNITY: &str = "mutation CreateOpportunity";

fn jane() -> Submission {
    Submission {
        name: "Jane Doe".to_string(),
        email: "jane@x.com".to_string(),
        company: Some("Acme".to_string()),
        phone: Some("555-123-4567".to_string()),
        message: "hi".to_string(),
        service: None,
    }
}

fn client(server: &MockServer) -> CrmClient {
    CrmClient::new(&server.uri(), API_KEY.to_string()).unwrap()
}

fn graphql(operation: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(bearer_token(API_KEY))
        .and(body_string_contains(operation))
}

fn data(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": value }))
}

fn empty_companies() -> ResponseTemplate {
    data(json!({ "companies": { "edges": [] } }))
}

fn empty_people() -> ResponseTemplate {
    data(json!({ "people": { "edges": [] } }))
}

/// Bodies of the requests whose GraphQL document contains `operation`.
async fn requests_for(server: &MockServer, operation: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap())
        .filter(|body| body["query"].as_str().unwrap_or_default().contains(operation))
        .collect()
}

#[tokio::test]
async fn test_empty_crm_creates_company_person_and_opportunity() {
    let server = MockServer::start().await;

    graphql(FIND_COMPANY)
        .and(body_partial_json(json!({
            "variables": { "filter": { "name": { "ilike": "%Acme%" } } }
        })))
        .respond_with(empty_companies())
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_COMPANY)
        .respond_with(data(json!({ "createCompany": { "id": "company-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(FIND_PERSON)
        .respond_with(empty_people())
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_PERSON)
        .and(body_partial_json(json!({
            "variables": { "input": {
                "name": { "firstName": "Jane", "lastName": "Doe" },
                "emails": { "primaryEmail": "jane@x.com" },
                "phones": { "primaryPhoneNumber": "+15551234567" },
                "companyId": "company-1"
            } }
        })))
        .respond_with(data(json!({ "createPerson": { "id": "person-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .and(body_partial_json(json!({
            "variables": { "input": {
                "name": "Jane Doe - Website Inquiry",
                "stage": "NEW",
                "pointOfContactId": "person-1",
                "companyId": "company-1"
            } }
        })))
        .respond_with(data(json!({ "createOpportunity": { "id": "opp-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconcile_lead(&client(&server), &jane(), MatchPolicy::FirstResult)
        .await
        .unwrap();

    assert_eq!(outcome.company_id.unwrap().as_str(), "company-1");
    assert_eq!(outcome.person_id.as_str(), "person-1");
    assert_eq!(outcome.opportunity_id.as_str(), "opp-1");
    assert!(outcome.is_new_person);
}

#[tokio::test]
async fn test_existing_person_is_reused() {
    let server = MockServer::start().await;

    graphql(FIND_COMPANY)
        .respond_with(data(json!({ "companies": { "edges": [
            { "node": { "id": "company-7", "name": "Acme Inc" } }
        ] } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_COMPANY).respond_with(empty_companies()).expect(0).mount(&server).await;
    graphql(FIND_PERSON)
        .and(body_partial_json(json!({
            "variables": { "filter": { "emails": { "primaryEmail": { "ilike": "%jane@x.com%" } } } }
        })))
        .respond_with(data(json!({ "people": { "edges": [
            { "node": { "id": "person-9", "emails": { "primaryEmail": "Jane@X.com" } } }
        ] } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_PERSON).respond_with(empty_people()).expect(0).mount(&server).await;
    graphql(CREATE_OPPORTUNITY)
        .and(body_partial_json(json!({
            "variables": { "input": { "pointOfContactId": "person-9", "companyId": "company-7" } }
        })))
        .respond_with(data(json!({ "createOpportunity": { "id": "opp-2" } })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconcile_lead(&client(&server), &jane(), MatchPolicy::FirstResult)
        .await
        .unwrap();

    assert_eq!(outcome.person_id.as_str(), "person-9");
    assert_eq!(outcome.company_id.unwrap().as_str(), "company-7");
    assert!(!outcome.is_new_person);
}

#[tokio::test]
async fn test_company_failures_are_absorbed() {
    let server = MockServer::start().await;

    graphql(FIND_COMPANY)
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_COMPANY)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "duplicate company" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(FIND_PERSON).respond_with(empty_people()).expect(1).mount(&server).await;
    graphql(CREATE_PERSON)
        .respond_with(data(json!({ "createPerson": { "id": "person-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .respond_with(data(json!({ "createOpportunity": { "id": "opp-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconcile_lead(&client(&server), &jane(), MatchPolicy::FirstResult)
        .await
        .unwrap();

    assert!(outcome.company_id.is_none());
    assert_eq!(outcome.person_id.as_str(), "person-1");
    assert_eq!(outcome.opportunity_id.as_str(), "opp-1");

    let people = requests_for(&server, CREATE_PERSON).await;
    assert!(people[0]["variables"]["input"].get("companyId").is_none());
    let opportunities = requests_for(&server, CREATE_OPPORTUNITY).await;
    assert!(opportunities[0]["variables"]["input"].get("companyId").is_none());
}

#[tokio::test]
async fn test_no_company_skips_company_calls() {
    let server = MockServer::start().await;

    graphql(FIND_COMPANY).respond_with(empty_companies()).expect(0).mount(&server).await;
    graphql(CREATE_COMPANY).respond_with(empty_companies()).expect(0).mount(&server).await;
    graphql(FIND_PERSON).respond_with(empty_people()).expect(1).mount(&server).await;
    graphql(CREATE_PERSON)
        .respond_with(data(json!({ "createPerson": { "id": "person-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .and(body_partial_json(json!({
            "variables": { "input": { "name": "Prince - Consulting" } }
        })))
        .respond_with(data(json!({ "createOpportunity": { "id": "opp-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let submission = Submission {
        name: "Prince".to_string(),
        company: None,
        phone: Some("12345".to_string()),
        service: Some("Consulting".to_string()),
        ..jane()
    };

    let outcome = reconcile_lead(&client(&server), &submission, MatchPolicy::FirstResult)
        .await
        .unwrap();
    assert!(outcome.company_id.is_none());

    // Unusable phone is left out, single-token name has an empty last name
    let people = requests_for(&server, CREATE_PERSON).await;
    let input = &people[0]["variables"]["input"];
    assert!(input.get("phones").is_none());
    assert_eq!(input["name"], json!({ "firstName": "Prince", "lastName": "" }));
}

#[tokio::test]
async fn test_person_create_failure_is_fatal() {
    let server = MockServer::start().await;

    graphql(FIND_COMPANY).respond_with(empty_companies()).mount(&server).await;
    graphql(CREATE_COMPANY)
        .respond_with(data(json!({ "createCompany": { "id": "company-1" } })))
        .mount(&server)
        .await;
    graphql(FIND_PERSON).respond_with(empty_people()).expect(1).mount(&server).await;
    graphql(CREATE_PERSON)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "invalid email" }, { "message": "second" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .respond_with(data(json!({ "createOpportunity": { "id": "opp-1" } })))
        .expect(0)
        .mount(&server)
        .await;

    let result = reconcile_lead(&client(&server), &jane(), MatchPolicy::FirstResult).await;

    match result {
        Err(LeadError::PersonCreate(CrmError::GraphQl(message))) => {
            assert_eq!(message, "invalid email");
        }
        other => panic!("Expected fatal person error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_opportunity_failure_is_fatal() {
    let server = MockServer::start().await;

    graphql(FIND_PERSON).respond_with(empty_people()).mount(&server).await;
    graphql(CREATE_PERSON)
        .respond_with(data(json!({ "createPerson": { "id": "person-1" } })))
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .respond_with(ResponseTemplate::new(400).set_body_string("bad stage"))
        .expect(1)
        .mount(&server)
        .await;

    let submission = Submission {
        company: None,
        ..jane()
    };
    let result = reconcile_lead(&client(&server), &submission, MatchPolicy::FirstResult).await;

    match result {
        Err(LeadError::OpportunityCreate(CrmError::Status { status, body })) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(body, "bad stage");
        }
        other => panic!("Expected fatal opportunity error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_person_search_falls_through_to_create() {
    let server = MockServer::start().await;

    graphql(FIND_PERSON)
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_PERSON)
        .respond_with(data(json!({ "createPerson": { "id": "person-2" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .respond_with(data(json!({ "createOpportunity": { "id": "opp-3" } })))
        .expect(1)
        .mount(&server)
        .await;

    let submission = Submission {
        company: None,
        ..jane()
    };
    let outcome = reconcile_lead(&client(&server), &submission, MatchPolicy::FirstResult)
        .await
        .unwrap();

    assert_eq!(outcome.person_id.as_str(), "person-2");
    assert!(outcome.is_new_person);
}

#[tokio::test]
async fn test_exact_first_policy_prefers_exact_company() {
    let server = MockServer::start().await;

    graphql(FIND_COMPANY)
        .respond_with(data(json!({ "companies": { "edges": [
            { "node": { "id": "company-1", "name": "Acme Rockets" } },
            { "node": { "id": "company-2", "name": "ACME" } }
        ] } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(FIND_PERSON).respond_with(empty_people()).mount(&server).await;
    graphql(CREATE_PERSON)
        .and(body_partial_json(json!({ "variables": { "input": { "companyId": "company-2" } } })))
        .respond_with(data(json!({ "createPerson": { "id": "person-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .respond_with(data(json!({ "createOpportunity": { "id": "opp-1" } })))
        .mount(&server)
        .await;

    let exact = reconcile_lead(&client(&server), &jane(), MatchPolicy::ExactFirst)
        .await
        .unwrap();
    assert_eq!(exact.company_id.unwrap().as_str(), "company-2");
}

#[tokio::test]
async fn test_crm_client_surfaces_decode_errors() {
    let server = MockServer::start().await;

    graphql(FIND_PERSON)
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    graphql(CREATE_PERSON)
        .respond_with(data(json!({ "createPerson": { "unexpected": true } })))
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let crm = client(&server);

    let result = crm.find_people_by_email("jane@x.com").await;
    assert!(matches!(result, Err(CrmError::Decode(_))));

    // `data` present but missing the selected id
    let result = crm
        .execute::<CreatePersonData>("mutation CreatePerson { createPerson { id } }", Value::Null)
        .await;
    assert!(matches!(result, Err(CrmError::Decode(_))));

    let result = crm
        .execute::<Value>("mutation CreateOpportunity { x }", Value::Null)
        .await;
    assert!(matches!(result, Err(CrmError::Decode(msg)) if msg.contains("no data")));
}

#[tokio::test]
async fn test_null_errors_field_counts_as_success() {
    let server = MockServer::start().await;

    let null_errors = |value: Value| {
        ResponseTemplate::new(200).set_body_json(json!({ "data": value, "errors": null }))
    };
    graphql(FIND_COMPANY)
        .respond_with(null_errors(json!({ "companies": { "edges": [] } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_COMPANY)
        .respond_with(null_errors(json!({ "createCompany": { "id": "company-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(FIND_PERSON)
        .respond_with(null_errors(json!({ "people": { "edges": [] } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_PERSON)
        .respond_with(null_errors(json!({ "createPerson": { "id": "person-1" } })))
        .expect(1)
        .mount(&server)
        .await;
    graphql(CREATE_OPPORTUNITY)
        .respond_with(null_errors(json!({ "createOpportunity": { "id": "opp-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconcile_lead(&client(&server), &jane(), MatchPolicy::FirstResult)
        .await
        .unwrap();

    assert_eq!(outcome.company_id.unwrap().as_str(), "company-1");
    assert_eq!(outcome.person_id.as_str(), "person-1");
    assert_eq!(outcome.opportunity_id.as_str(), "opp-1");
    assert!(outcome.is_new_person);
}

#[tokio::test]
async fn test_crm_client_requires_bearer_token() {
    let server = MockServer::start().await;

    graphql(FIND_COMPANY).respond_with(empty_companies()).mount(&server).await;

    let wrong_key = CrmClient::new(&server.uri(), "wrong".to_string()).unwrap();
    let result = wrong_key.find_companies_by_name("Acme").await;
    assert!(matches!(result, Err(CrmError::Status { status, .. }) if status.as_u16() == 404));

    let result = client(&server).find_companies_by_name("Acme").await;
    assert!(result.unwrap().is_empty());
}

#[tokio::test]
async fn test_crm_client_transport_error() {
    // Nothing listens on port 1
    let crm = CrmClient::new("http://127.0.0.1:1", API_KEY.to_string()).unwrap();
    let result = crm.create_company("Acme").await;
    assert!(matches!(result, Err(CrmError::Transport(_))));
}
