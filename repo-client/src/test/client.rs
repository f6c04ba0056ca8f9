use claims::{assert_err, assert_matches, assert_ok};
use httptest::{matchers::*, responders::*, Expectation, Server};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::{client_for, OBJECT_PROFILE_NAMESPACED};
use crate::client::truncate_label;
use crate::{format_repository_date, parse_repository_date, RepositoryError};

const SPARQL_RESULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sparql xmlns="http://www.w3.org/2001/sw/DataAccess/rf1/result">
  <results>
    <result><child uri="info:fedora/demo:2"/></result>
  </results>
</sparql>"#;

#[tokio::test]
async fn lookup_object_binds_handle() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/objects/demo:1"))
            .respond_with(status_code(200).body(OBJECT_PROFILE_NAMESPACED)),
    );
    let client = client_for(&server);
    let handle = assert_ok!(client.lookup_object("demo:1").await);
    assert_eq!(handle.id(), Some("demo:1"));
}

#[tokio::test]
async fn lookup_object_not_found_is_distinct() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/objects/demo:gone"))
            .respond_with(status_code(404)),
    );
    let client = client_for(&server);
    let err = assert_err!(client.lookup_object("demo:gone").await);
    assert_matches!(err, RepositoryError::NotFound(_));
}

#[tokio::test]
async fn lookup_object_other_status_is_repository_error() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/objects/demo:1"))
            .respond_with(status_code(500)),
    );
    let client = client_for(&server);
    let err = assert_err!(client.lookup_object("demo:1").await);
    assert_matches!(err, RepositoryError::Status { .. });
}

#[tokio::test]
async fn find_related_requires_exactly_one_endpoint() {
    // no expectations: validation must fail before any network call
    let server = Server::run();
    let client = client_for(&server);
    let err = assert_err!(
        client
            .find_related(None, "info:fedora/fedora-system:def/relations-external#isMemberOf", None)
            .await
    );
    assert_matches!(err, RepositoryError::InvalidArgument(_));
    let err = assert_err!(
        client
            .find_related(
                Some("demo:1"),
                "info:fedora/fedora-system:def/relations-external#isMemberOf",
                Some("demo:2"),
            )
            .await
    );
    assert_matches!(err, RepositoryError::InvalidArgument(_));
}

#[tokio::test]
async fn find_related_maps_result_uris_to_handles() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/risearch"),
            request::query(url_decoded(contains(("lang", "itql")))),
            request::query(url_decoded(contains(("query", matches("info:fedora/demo:1")))))
        ])
        .respond_with(status_code(200).body(SPARQL_RESULT)),
    );
    // each result uri is resolved to a handle, which fetches its profile
    server.expect(
        Expectation::matching(request::method_path("GET", "/objects/demo:2"))
            .respond_with(status_code(200).body(OBJECT_PROFILE_NAMESPACED)),
    );
    let client = client_for(&server);
    let handles = assert_ok!(
        client
            .find_related(
                Some("demo:1"),
                "info:fedora/fedora-system:def/relations-external#isMemberOf",
                None,
            )
            .await
    );
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].id(), Some("demo:2"));
}

#[tokio::test]
async fn create_object_returns_new_id() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/objects/new"),
            request::query(url_decoded(contains(("label", "my object")))),
            request::query(url_decoded(contains(("namespace", "demo")))),
            request::query(url_decoded(contains(("ownerId", "admin"))))
        ])
        .respond_with(status_code(201).body("demo:5")),
    );
    let client = client_for(&server);
    let id = assert_ok!(
        client
            .create_object(None, Some("my object"), Some("admin"), Some("demo"))
            .await
    );
    assert_eq!(id, "demo:5");
}

#[tokio::test]
async fn create_object_requires_created_status() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/objects/demo:5"))
            .respond_with(status_code(200).body("demo:5")),
    );
    let client = client_for(&server);
    let err = assert_err!(client.create_object(Some("demo:5"), None, None, None).await);
    assert_matches!(err, RepositoryError::Status { .. });
}

#[tokio::test]
async fn create_object_transmits_truncated_label() {
    let long_label: String = "x".repeat(300);
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/objects/new"),
            // 250 kept characters plus the three-character ellipsis marker
            request::query(url_decoded(contains(("label", matches("^x{250}\\.{3}$")))))
        ])
        .respond_with(status_code(201).body("demo:6")),
    );
    let client = client_for(&server);
    assert_ok!(client.create_object(None, Some(&long_label), None, None).await);
}

#[test]
fn truncate_label_is_bit_exact() {
    assert_eq!(truncate_label(""), "");
    assert_eq!(truncate_label("   "), "");
    assert_eq!(truncate_label("short"), "short");
    proptest!(|(label in "[a-zA-Z0-9 ]{1,400}")| {
        let truncated = truncate_label(&label);
        if label.trim().is_empty() {
            prop_assert_eq!(truncated, "");
        } else if label.chars().count() <= 255 {
            prop_assert_eq!(truncated, label);
        } else {
            prop_assert_eq!(truncated.chars().count(), 253);
            prop_assert!(truncated.ends_with("..."));
            prop_assert!(label.starts_with(truncated.trim_end_matches("...")));
        }
    });
}

#[test]
fn dissemination_url_is_pure_string_construction() {
    let client = crate::RepositoryClient::new(crate::RepositoryConfig {
        base_url: "http://repo.example.edu/fedora/".to_string(),
        username: None,
        password: None,
        read_only: false,
    })
    .unwrap();
    assert_eq!(
        client.datastream_dissemination_url("demo:1", "DS1"),
        "http://repo.example.edu/fedora/get/demo:1/DS1"
    );
}

#[test]
fn repository_date_round_trips() {
    let date = assert_ok!(parse_repository_date("2010-10-01T19:55:00.808Z"));
    assert_eq!(format_repository_date(date), "2010-10-01T19:55:00.808Z");
    assert_err!(parse_repository_date("not a date"));
}
