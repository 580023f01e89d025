//! End-to-end monitoring cycle tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sdxmon::config::Config;
use sdxmon::runner::Coordinator;

const TEST_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="MD_Metadata"/>
</xs:schema>"#;

fn test_config(nodes: Vec<String>, sitemap: String, schema: String) -> Config {
    let mut config = Config::default();
    config.network.nodes = nodes;
    config.network.authoritative_sitemap = sitemap;
    config.network.schema_url = schema;
    config.probe.request_timeout_secs = 2;
    config.probe.requests_per_second = 1000;
    config
}

async fn start_up_node(count: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geonetwork"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geonetwork/srv/eng/csw"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<csw:GetRecordsResponse xmlns:csw="http://www.opengis.net/cat/csw/2.0.2">
  <csw:SearchStatus timestamp="2022-01-01T00:00:00"/>
  <csw:SearchResults numberOfRecordsMatched="{count}"/>
</csw:GetRecordsResponse>"#
        )))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_cycle_mixed_node_outcomes() {
    let up = start_up_node(10).await;
    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geonetwork"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&down)
        .await;
    let stalled = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geonetwork"))
        .respond_with(
            ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(10)),
        )
        .mount(&stalled)
        .await;

    let config = test_config(
        vec![
            format!("{}/geonetwork", up.uri()),
            format!("{}/geonetwork", down.uri()),
            format!("{}/geonetwork", stalled.uri()),
        ],
        // No sitemap available: the cycle degrades to node health only.
        format!("{}/missing.sitemap", down.uri()),
        format!("{}/missing.xsd", down.uri()),
    );

    let coordinator = Coordinator::new(config).unwrap();
    let cycle = coordinator.run_cycle().await;

    assert_eq!(cycle.nodes.len(), 3);
    assert!(cycle.nodes[0].is_up());
    assert_eq!(cycle.nodes[0].record_count, Some(10));
    assert_eq!(cycle.nodes[1].http_status, Some(503));
    assert!(cycle.nodes[2].http_status.is_none());
    assert!(cycle.records.is_empty());

    let summary = cycle.summary();
    assert_eq!(summary.nodes_up, 1);
    assert_eq!(summary.nodes_down, 2);
}

#[tokio::test]
async fn test_cycle_enumerates_records_in_sitemap_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/portal.sitemap"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>http://catalog.test.invalid/records/first</loc></url>
  <url><loc>http://catalog.test.invalid/records/second</loc></url>
</urlset>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gmd.xsd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TEST_XSD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/geonetwork"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/geonetwork", server.uri())],
        format!("{}/portal.sitemap", server.uri()),
        format!("{}/gmd.xsd", server.uri()),
    );

    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.validate_records().await;

    // Sitemap locations are canonicalised to the XML formatter URL and
    // kept in enumeration order; the hosts do not resolve here, so every
    // outcome is a fetch failure.
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].record_url,
        "https://www.catalog.test.invalid/records/first/formatters/xml"
    );
    assert_eq!(
        records[1].record_url,
        "https://www.catalog.test.invalid/records/second/formatters/xml"
    );
    assert!(records.iter().all(|r| !r.was_fetchable));
}

#[tokio::test]
async fn test_load_schema_resolves_include_chain() {
    let server = MockServer::start().await;
    // Aggregation root carrying no declarations of its own.
    Mock::given(method("GET"))
        .and(path("/iso/gmd/gmd.xsd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.isotc211.org/2005/gmd">
  <xs:include schemaLocation="metadataEntity.xsd"/>
</xs:schema>"#,
        ))
        .mount(&server)
        .await;
    // First hop declares the root element and includes a second hop.
    Mock::given(method("GET"))
        .and(path("/iso/gmd/metadataEntity.xsd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:gmd="http://www.isotc211.org/2005/gmd"
           targetNamespace="http://www.isotc211.org/2005/gmd">
  <xs:include schemaLocation="citation.xsd"/>
  <xs:element name="MD_Metadata" type="gmd:MD_Metadata_Type"/>
</xs:schema>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/iso/gmd/citation.xsd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://www.isotc211.org/2005/gmd">
  <xs:complexType name="MD_Metadata_Type">
    <xs:sequence>
      <xs:element name="fileIdentifier"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#,
        ))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/geonetwork", server.uri())],
        format!("{}/portal.sitemap", server.uri()),
        format!("{}/iso/gmd/gmd.xsd", server.uri()),
    );
    let coordinator = Coordinator::new(config).unwrap();
    let schema = coordinator.load_schema().await.unwrap();

    assert!(!schema.is_vacuous());
    let valid = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd">
  <gmd:fileIdentifier>abc</gmd:fileIdentifier>
</gmd:MD_Metadata>"#;
    assert!(schema.validate(valid).is_ok());
    let invalid = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"/>"#;
    assert!(schema.validate(invalid).is_err());
}

#[tokio::test]
async fn test_unresolvable_schema_skips_record_checks() {
    let server = MockServer::start().await;
    // Aggregation root whose single include cannot be fetched: the
    // resolved schema stays empty and must not silently pass records.
    Mock::given(method("GET"))
        .and(path("/gmd.xsd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:include schemaLocation="metadataEntity.xsd"/>
</xs:schema>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/portal.sitemap"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>http://catalog.test.invalid/records/first</loc></url>
</urlset>"#,
        ))
        .mount(&server)
        .await;

    let config = test_config(
        vec![format!("{}/geonetwork", server.uri())],
        format!("{}/portal.sitemap", server.uri()),
        format!("{}/gmd.xsd", server.uri()),
    );
    let coordinator = Coordinator::new(config).unwrap();
    let records = coordinator.validate_records().await;

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_probe_order_is_independent_of_concurrency() {
    let a = start_up_node(1).await;
    let b = start_up_node(2).await;
    let c = start_up_node(3).await;

    let nodes = vec![
        format!("{}/geonetwork", a.uri()),
        "http://127.0.0.1:1/geonetwork".to_string(),
        format!("{}/geonetwork", b.uri()),
        format!("{}/geonetwork", c.uri()),
    ];
    let sitemap = format!("{}/missing.sitemap", a.uri());
    let schema = format!("{}/missing.xsd", a.uri());

    let serial = Coordinator::new({
        let mut cfg = test_config(nodes.clone(), sitemap.clone(), schema.clone());
        cfg.probe.concurrency = 1;
        cfg
    })
    .unwrap()
    .probe_nodes()
    .await;

    let parallel = Coordinator::new({
        let mut cfg = test_config(nodes, sitemap, schema);
        cfg.probe.concurrency = 16;
        cfg
    })
    .unwrap()
    .probe_nodes()
    .await;

    assert_eq!(serial, parallel);
    assert_eq!(serial[3].record_count, Some(3));
}
