//! End-to-end issuance through the real HTTP client against a mock
//! issuance endpoint and the in-memory profile store.

use std::sync::Arc;

use samriddhi_core::{UserId, UserProfile};
use samriddhi_dashboard::{CredentialWorkflow, ErrorClass, IssuanceError};
use samriddhi_issuance_client::{IssuanceClient, IssuanceConfig};
use samriddhi_store::{InMemoryProfileRepository, ProfileRepository};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn uid() -> UserId {
    UserId::new("uid-42").unwrap()
}

fn workflow(
    server: &MockServer,
) -> (
    CredentialWorkflow<InMemoryProfileRepository, IssuanceClient>,
    InMemoryProfileRepository,
) {
    let repo = InMemoryProfileRepository::new();
    let client = IssuanceClient::new(IssuanceConfig::local_mock(&server.uri()).unwrap()).unwrap();
    (
        CredentialWorkflow::new(Arc::new(repo.clone()), Arc::new(client)),
        repo,
    )
}

fn profile(nationality: Option<&str>) -> UserProfile {
    let mut p = UserProfile::new();
    p.full_name = Some("A".into());
    p.nationality = nationality.map(Into::into);
    p.phone = Some("555".into());
    p
}

#[tokio::test]
async fn phone_fallback_profile_is_issued_and_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/issue-vc"))
        .and(body_partial_json(serde_json::json!({
            "fullName": "A",
            "nationality": "IN",
            "emergencyContact": "555",
            "userId": "uid-42"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "vcId": "V1",
            "issuerDid": "did:x",
            "touristDid": "did:y",
            "credential": {"id": "urn:uuid:1"},
            "qrCode": "Q",
            "pdf": {"downloadUrl": "U"},
            "verification": {"verifyUrl": "W"},
            "accessToken": "T"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (wf, repo) = workflow(&server);
    repo.insert(uid(), profile(Some("IN")));

    let outcome = wf.issue_credential(&uid(), &profile(Some("IN"))).await.unwrap();
    assert_eq!(outcome.bundle.vc_id, "V1");

    let stored = repo.get(&uid()).await.unwrap().unwrap();
    assert!(stored.credential_issued());
    let doc = serde_json::to_value(&stored).unwrap();
    assert_eq!(doc["vcIssued"], true);
    assert_eq!(doc["vcId"], "V1");
    assert_eq!(doc["issuerDid"], "did:x");
    assert_eq!(doc["touristDid"], "did:y");
    assert_eq!(doc["vcQRCode"], "Q");
    assert_eq!(doc["vcPDFUrl"], "U");
    assert_eq!(doc["vcVerifyUrl"], "W");
    assert_eq!(doc["vcAccessToken"], "T");
    assert_eq!(doc["vcData"]["id"], "urn:uuid:1");
}

#[tokio::test]
async fn missing_nationality_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (wf, repo) = workflow(&server);
    let err = wf.issue_credential(&uid(), &profile(None)).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Validation);
    assert!(repo.is_empty());
}

#[tokio::test]
async fn endpoint_failure_leaves_profile_unissued() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/issue-vc"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "success": false,
            "error": "SIGNING_FAILED",
            "message": "Failed to sign credential"
        })))
        .mount(&server)
        .await;

    let (wf, repo) = workflow(&server);
    repo.insert(uid(), profile(Some("IN")));

    let err = wf.issue_credential(&uid(), &profile(Some("IN"))).await.unwrap_err();

    assert!(matches!(err, IssuanceError::EndpointRejected(ref m) if m == "Failed to sign credential"));
    assert_eq!(err.class(), ErrorClass::Network);
    let doc = serde_json::to_value(repo.get(&uid()).await.unwrap().unwrap()).unwrap();
    assert!(doc.get("vcIssued").map_or(true, |v| *v == false));
    assert!(doc.get("vcId").is_none());
}

#[tokio::test]
async fn unreachable_endpoint_is_network_class() {
    let repo = InMemoryProfileRepository::new();
    let client =
        IssuanceClient::new(IssuanceConfig::local_mock("http://127.0.0.1:1").unwrap()).unwrap();
    let wf = CredentialWorkflow::new(Arc::new(repo.clone()), Arc::new(client));

    let err = wf.issue_credential(&uid(), &profile(Some("IN"))).await.unwrap_err();

    assert!(matches!(err, IssuanceError::EndpointUnreachable(_)));
    assert_eq!(err.class(), ErrorClass::Network);
}
