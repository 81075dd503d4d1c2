use docker_manifest_headers::{
    Digest, MANIFEST_DIGEST_HEADER, MANIFEST_TAG_HEADER, ModifyingTransport, Reference,
    RegistryError, TrackedRepository, restore_manifest_info, checkpoint_manifest_info,
};
use reqwest::Client;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";
const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";
const LIST_DIGEST: &str = "sha256:1111111111111111111111111111111111111111111111111111111111111111";
const CHILD_DIGEST: &str = "sha256:2222222222222222222222222222222222222222222222222222222222222222";

fn repository(server: &MockServer) -> TrackedRepository {
    TrackedRepository::new(
        Url::parse(&server.uri()).unwrap(),
        "project/app",
        ModifyingTransport::new(Client::new()),
    )
}

fn header_values(request: &Request, name: &str) -> Vec<String> {
    request
        .headers
        .get_all(name)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

async fn mount_manifest(server: &MockServer, reference: &str, digest: &str, media_type: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/project/app/manifests/{}", reference)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("docker-content-digest", digest)
                .set_body_raw("{}", media_type),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_manifest_list_resolution_headers() {
    let server = MockServer::start().await;
    mount_manifest(&server, "1.0", LIST_DIGEST, INDEX_MEDIA_TYPE).await;
    mount_manifest(&server, CHILD_DIGEST, CHILD_DIGEST, MANIFEST_MEDIA_TYPE).await;

    let repo = repository(&server);
    let list = repo
        .get_manifest(&Reference::named("project/app").with_tag("1.0"))
        .await
        .unwrap();
    assert_eq!(list.content_type, INDEX_MEDIA_TYPE);
    assert_eq!(list.digest, Some(Digest::from(LIST_DIGEST)));

    let child = repo.get_child_manifest(&Digest::from(CHILD_DIGEST)).await.unwrap();
    assert_eq!(child.content_type, MANIFEST_MEDIA_TYPE);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    // The tag request goes out before any digest is known
    assert_eq!(header_values(&requests[0], MANIFEST_TAG_HEADER), ["1.0"]);
    assert!(header_values(&requests[0], MANIFEST_DIGEST_HEADER).is_empty());

    // The platform request carries the whole chain, oldest first
    assert_eq!(header_values(&requests[1], MANIFEST_TAG_HEADER), ["1.0"]);
    assert_eq!(
        header_values(&requests[1], MANIFEST_DIGEST_HEADER),
        [LIST_DIGEST, CHILD_DIGEST]
    );

    let info = repo.tracker().snapshot();
    assert_eq!(info.tag(), Some("1.0"));
    assert_eq!(info.digests(), [LIST_DIGEST, CHILD_DIGEST]);
}

#[tokio::test]
async fn test_failed_child_manifest_rolls_back() {
    let server = MockServer::start().await;
    mount_manifest(&server, "1.0", LIST_DIGEST, INDEX_MEDIA_TYPE).await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/project/app/manifests/{}", CHILD_DIGEST)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let repo = repository(&server);
    repo.get_manifest(&Reference::named("project/app").with_tag("1.0"))
        .await
        .unwrap();

    let result = repo.get_child_manifest(&Digest::from(CHILD_DIGEST)).await;
    assert!(matches!(result, Err(RegistryError::NotFound(_))));

    let info = repo.tracker().snapshot();
    assert_eq!(info.tag(), Some("1.0"));
    assert_eq!(info.digests(), [LIST_DIGEST]);
}

#[tokio::test]
async fn test_put_manifest_sends_content_digest() {
    let server = MockServer::start().await;
    let body = br#"{"schemaVersion":2}"#.to_vec();
    let expected = Digest::from_content(&body);

    Mock::given(method("PUT"))
        .and(path("/v2/project/app/manifests/2.0"))
        .and(header("docker-manifest-tag", "2.0"))
        .and(header("docker-manifest-digest", expected.as_str()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(&server);
    let digest = repo
        .put_manifest(
            &Reference::named("project/app").with_tag("2.0"),
            body,
            MANIFEST_MEDIA_TYPE,
        )
        .await
        .unwrap();
    assert_eq!(digest, expected);
}

#[tokio::test]
async fn test_registry_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/project/app/manifests/1.0"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let repo = repository(&server);
    let checkpoint = checkpoint_manifest_info(&repo);
    let result = repo
        .get_manifest(&Reference::named("project/app").with_tag("1.0"))
        .await;
    match result {
        Err(RegistryError::Registry(msg)) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("boom"));
        }
        other => panic!("unexpected result: {:?}", other.map(|m| m.content_type)),
    }

    // The tag was recorded before the request went out
    assert_eq!(repo.tracker().snapshot().tag(), Some("1.0"));
    restore_manifest_info(&repo, &checkpoint);
    assert!(repo.tracker().snapshot().is_empty());
}

#[tokio::test]
async fn test_plain_transport_sends_no_manifest_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = ModifyingTransport::new(Client::new());
    let url = format!("{}/v2/", server.uri());
    let response = transport.send(transport.client().get(url)).await.unwrap();
    assert!(response.status().is_success());

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get(MANIFEST_TAG_HEADER).is_none());
    assert!(requests[0].headers.get(MANIFEST_DIGEST_HEADER).is_none());
}
