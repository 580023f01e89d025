//! Integration tests for record validation against a mock catalog

use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sdxmon::probe::HttpFetcher;
use sdxmon::validator::{RecordValidator, Schema};

const TEST_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:gmd="http://www.isotc211.org/2005/gmd"
           targetNamespace="http://www.isotc211.org/2005/gmd">
  <xs:element name="MD_Metadata" type="gmd:MD_Metadata_Type"/>
  <xs:complexType name="MD_Metadata_Type">
    <xs:sequence>
      <xs:element name="fileIdentifier"/>
      <xs:element name="identificationInfo"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

fn valid_record(title: &str) -> String {
    format!(
        r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
                 xmlns:gco="http://www.isotc211.org/2005/gco">
  <gmd:fileIdentifier>abc-123</gmd:fileIdentifier>
  <gmd:identificationInfo>
    <gmd:MD_DataIdentification>
      <gmd:citation>
        <gmd:CI_Citation>
          <gmd:title><gco:CharacterString>{title}</gco:CharacterString></gmd:title>
        </gmd:CI_Citation>
      </gmd:citation>
    </gmd:MD_DataIdentification>
  </gmd:identificationInfo>
</gmd:MD_Metadata>"#
    )
}

fn validator() -> RecordValidator {
    let fetcher = HttpFetcher::new(Duration::from_secs(2), 1000, "sdxmon-test").unwrap();
    let schema = Schema::compile(TEST_XSD).unwrap();
    RecordValidator::new(Arc::new(fetcher), Arc::new(schema))
}

#[tokio::test]
async fn test_valid_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records/ok/formatters/xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(valid_record("Coastal Bathymetry")),
        )
        .mount(&server)
        .await;

    let url = format!("{}/records/ok/formatters/xml", server.uri());
    let outcome = validator().validate(&url).await;

    assert!(outcome.was_fetchable);
    assert!(outcome.is_well_formed_xml);
    assert!(outcome.is_schema_valid);
    assert_eq!(outcome.title.as_deref(), Some("Coastal Bathymetry"));
    assert!(outcome.invalid_reason.is_none());
}

#[tokio::test]
async fn test_invalid_record_carries_reason_and_title() {
    let server = MockServer::start().await;
    // Well-formed, titled, but missing the required fileIdentifier.
    let body = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
                 xmlns:gco="http://www.isotc211.org/2005/gco">
  <gmd:identificationInfo>
    <gmd:MD_DataIdentification>
      <gmd:citation>
        <gmd:CI_Citation>
          <gmd:title><gco:CharacterString>Orphaned Dataset</gco:CharacterString></gmd:title>
        </gmd:CI_Citation>
      </gmd:citation>
    </gmd:MD_DataIdentification>
  </gmd:identificationInfo>
</gmd:MD_Metadata>"#;
    Mock::given(method("GET"))
        .and(path("/records/bad/formatters/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let url = format!("{}/records/bad/formatters/xml", server.uri());
    let outcome = validator().validate(&url).await;

    assert!(outcome.is_well_formed_xml);
    assert!(!outcome.is_schema_valid);
    assert_eq!(outcome.title.as_deref(), Some("Orphaned Dataset"));
    let reason = outcome.invalid_reason.unwrap();
    assert!(reason.contains("fileIdentifier"));
    assert!(!reason.contains('\n'));
}

#[tokio::test]
async fn test_malformed_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records/broken/formatters/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<gmd:MD_Metadata><unclosed>"))
        .mount(&server)
        .await;

    let url = format!("{}/records/broken/formatters/xml", server.uri());
    let outcome = validator().validate(&url).await;

    assert!(outcome.was_fetchable);
    assert!(!outcome.is_well_formed_xml);
    assert!(!outcome.is_schema_valid);
    assert!(outcome.invalid_reason.is_none());
}

#[tokio::test]
async fn test_unfetchable_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records/gone/formatters/xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/records/gone/formatters/xml", server.uri());
    let outcome = validator().validate(&url).await;

    assert!(!outcome.was_fetchable);
    assert!(!outcome.is_well_formed_xml);
    assert!(outcome.title.is_none());
}
