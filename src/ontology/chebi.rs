//! Blocking client for the EBI ChEBI web service.
//!
//! Uses the service's HTTP GET bindings (`getCompleteEntity`,
//! `getLiteEntity`), which answer with a SOAP envelope. The envelope is
//! deserialized with quick-xml; serde aliases cover the prefixed and
//! unprefixed spellings the service emits.

use serde::Deserialize;
use url::Url;

use crate::ontology::client::{LiteEntity, OntologyClient, OntologyEntity, OntologyRelation};
use crate::ontology::error::OntologyError;

const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/webservices/chebi/2.0/test";

/// Blocking ChEBI web-service client.
pub struct ChebiClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl Default for ChebiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ChebiClient {
    /// Creates a client against the public EBI endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom endpoint, e.g. a mock server in
    /// tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn endpoint(&self, operation: &str, params: &[(&str, &str)]) -> Result<Url, OntologyError> {
        let base = self.base_url.trim_end_matches('/');
        Url::parse_with_params(&format!("{}/{}", base, operation), params)
            .map_err(|e| OntologyError::InvalidUrl(format!("{}/{}: {}", base, operation, e)))
    }

    fn get(&self, url: Url) -> Result<String, OntologyError> {
        let response = self.client.get(url.clone()).send()?;
        if !response.status().is_success() {
            return Err(OntologyError::ServiceStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text()?)
    }
}

impl OntologyClient for ChebiClient {
    fn complete_entity(&self, id: &str) -> Result<OntologyEntity, OntologyError> {
        let url = self.endpoint("getCompleteEntity", &[("chebiId", id)])?;
        let body = self.get(url)?;
        let envelope: CompleteEntityEnvelope = quick_xml::de::from_str(&body)?;
        let payload = envelope.body.response.entity;
        if payload.chebi_id.is_empty() {
            return Err(OntologyError::MissingEntity(id.to_string()));
        }
        Ok(payload.into())
    }

    fn search(&self, text: &str) -> Result<Vec<LiteEntity>, OntologyError> {
        let url = self.endpoint(
            "getLiteEntity",
            &[
                ("search", text),
                ("searchCategory", "ALL"),
                ("maximumResults", "50"),
                ("stars", "ALL"),
            ],
        )?;
        let body = self.get(url)?;
        let envelope: LiteEntityEnvelope = quick_xml::de::from_str(&body)?;
        Ok(envelope
            .body
            .response
            .list
            .elements
            .into_iter()
            .map(|e| LiteEntity {
                chebi_id: e.chebi_id,
                chebi_ascii_name: e.chebi_ascii_name,
                search_score: e.search_score,
            })
            .collect())
    }
}

// ================================================================================================
// WIRE FORMAT
// ================================================================================================

#[derive(Debug, Deserialize)]
struct CompleteEntityEnvelope {
    #[serde(rename = "Body", alias = "S:Body", alias = "soapenv:Body", alias = "SOAP-ENV:Body")]
    body: CompleteEntityBody,
}

#[derive(Debug, Deserialize)]
struct CompleteEntityBody {
    #[serde(
        rename = "getCompleteEntityResponse",
        alias = "chebi:getCompleteEntityResponse"
    )]
    response: CompleteEntityResponse,
}

#[derive(Debug, Deserialize)]
struct CompleteEntityResponse {
    #[serde(rename = "return", alias = "chebi:return")]
    entity: EntityPayload,
}

#[derive(Debug, Deserialize, Default)]
struct EntityPayload {
    #[serde(rename = "chebiId", default)]
    chebi_id: String,
    #[serde(rename = "chebiAsciiName", default)]
    chebi_ascii_name: String,
    #[serde(rename = "OntologyChildren", default)]
    children: Vec<RelationPayload>,
    #[serde(rename = "OntologyParents", default)]
    parents: Vec<RelationPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct RelationPayload {
    #[serde(rename = "chebiId", default)]
    chebi_id: String,
    #[serde(rename = "chebiName", default)]
    chebi_name: String,
    #[serde(rename = "type", default)]
    relation_type: String,
    #[serde(rename = "status", default)]
    status: Option<String>,
    #[serde(rename = "cyclicRelationship", default)]
    cyclic: Option<bool>,
}

impl From<EntityPayload> for OntologyEntity {
    fn from(payload: EntityPayload) -> Self {
        OntologyEntity {
            chebi_id: payload.chebi_id,
            chebi_ascii_name: payload.chebi_ascii_name,
            children: payload.children.into_iter().map(Into::into).collect(),
            parents: payload.parents.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RelationPayload> for OntologyRelation {
    fn from(payload: RelationPayload) -> Self {
        OntologyRelation {
            chebi_id: payload.chebi_id,
            chebi_name: payload.chebi_name,
            relation_type: payload.relation_type,
            status: payload.status,
            cyclic: payload.cyclic,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LiteEntityEnvelope {
    #[serde(rename = "Body", alias = "S:Body", alias = "soapenv:Body", alias = "SOAP-ENV:Body")]
    body: LiteEntityBody,
}

#[derive(Debug, Deserialize)]
struct LiteEntityBody {
    #[serde(rename = "getLiteEntityResponse", alias = "chebi:getLiteEntityResponse")]
    response: LiteEntityResponse,
}

#[derive(Debug, Deserialize)]
struct LiteEntityResponse {
    #[serde(rename = "return", alias = "chebi:return")]
    list: LiteEntityList,
}

#[derive(Debug, Deserialize, Default)]
struct LiteEntityList {
    #[serde(rename = "ListElement", default)]
    elements: Vec<LiteEntityPayload>,
}

#[derive(Debug, Deserialize, Default)]
struct LiteEntityPayload {
    #[serde(rename = "chebiId", default)]
    chebi_id: String,
    #[serde(rename = "chebiAsciiName", default)]
    chebi_ascii_name: String,
    #[serde(rename = "searchScore", default)]
    search_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;

    use super::*;

    const COMPLETE_ENTITY_XML: &str = r#"
        <S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
          <S:Body>
            <getCompleteEntityResponse xmlns="https://www.ebi.ac.uk/webservices/chebi">
              <return>
                <chebiId>CHEBI:17234</chebiId>
                <chebiAsciiName>glucose</chebiAsciiName>
                <OntologyChildren>
                  <chebiName>D-glucose</chebiName>
                  <chebiId>CHEBI:4167</chebiId>
                  <type>is a</type>
                  <status>C</status>
                  <cyclicRelationship>false</cyclicRelationship>
                </OntologyChildren>
                <OntologyParents>
                  <chebiName>aldohexose</chebiName>
                  <chebiId>CHEBI:33917</chebiId>
                  <type>is a</type>
                  <status>C</status>
                  <cyclicRelationship>false</cyclicRelationship>
                </OntologyParents>
              </return>
            </getCompleteEntityResponse>
          </S:Body>
        </S:Envelope>
    "#;

    #[test]
    fn test_complete_entity() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/getCompleteEntity")
                .query_param("chebiId", "CHEBI:17234");
            then.status(200).body(COMPLETE_ENTITY_XML);
        });

        let client = ChebiClient::with_base_url(server.base_url());
        let entity = client
            .complete_entity("CHEBI:17234")
            .expect("Failed to fetch entity");

        assert_eq!(entity.chebi_id, "CHEBI:17234");
        assert_eq!(entity.chebi_ascii_name, "glucose");
        assert_eq!(entity.children.len(), 1);
        assert_eq!(entity.children[0].chebi_id, "CHEBI:4167");
        assert_eq!(entity.children[0].relation_type, "is a");
        assert_eq!(entity.parents.len(), 1);
        assert_eq!(entity.parents[0].chebi_id, "CHEBI:33917");

        mock.assert();
    }

    #[test]
    fn test_complete_entity_service_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/getCompleteEntity");
            then.status(500).body("boom");
        });

        let client = ChebiClient::with_base_url(server.base_url());
        let err = client
            .complete_entity("CHEBI:0")
            .expect_err("Should have failed");
        assert!(matches!(err, OntologyError::ServiceStatus { status: 500, .. }));
    }

    #[test]
    fn test_search() {
        let server = MockServer::start();
        let body = r#"
            <S:Envelope xmlns:S="http://schemas.xmlsoap.org/soap/envelope/">
              <S:Body>
                <getLiteEntityResponse xmlns="https://www.ebi.ac.uk/webservices/chebi">
                  <return>
                    <ListElement>
                      <chebiId>CHEBI:17234</chebiId>
                      <chebiAsciiName>glucose</chebiAsciiName>
                      <searchScore>4.5</searchScore>
                    </ListElement>
                    <ListElement>
                      <chebiId>CHEBI:4167</chebiId>
                      <chebiAsciiName>D-glucopyranose</chebiAsciiName>
                    </ListElement>
                  </return>
                </getLiteEntityResponse>
              </S:Body>
            </S:Envelope>
        "#;
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/getLiteEntity")
                .query_param("search", "glucose");
            then.status(200).body(body);
        });

        let client = ChebiClient::with_base_url(server.base_url());
        let hits = client.search("glucose").expect("Failed to search");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chebi_id, "CHEBI:17234");
        assert_eq!(hits[0].search_score, Some(4.5));
        assert_eq!(hits[1].search_score, None);

        mock.assert();
    }
}
