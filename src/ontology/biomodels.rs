//! Blocking client for the BioModels REST API.

use serde::Deserialize;
use url::Url;

use crate::ontology::client::ModelRepository;
use crate::ontology::error::OntologyError;

const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/biomodels";

/// Blocking BioModels repository client.
pub struct BioModelsClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl Default for BioModelsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BioModelsClient {
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

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, OntologyError> {
        let base = self.base_url.trim_end_matches('/');
        Url::parse_with_params(&format!("{}/{}", base, path), params)
            .map_err(|e| OntologyError::InvalidUrl(format!("{}/{}: {}", base, path, e)))
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

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    models: Vec<SearchModel>,
}

#[derive(Debug, Deserialize)]
struct SearchModel {
    id: String,
}

impl ModelRepository for BioModelsClient {
    fn models_by_ontology_term(&self, term: &str) -> Result<Vec<String>, OntologyError> {
        let url = self.endpoint("search", &[("query", term), ("format", "json")])?;
        let body = self.get(url)?;
        let response: SearchResponse = serde_json::from_str(&body)?;
        Ok(response.models.into_iter().map(|m| m.id).collect())
    }

    fn model_xml_by_id(&self, id: &str) -> Result<String, OntologyError> {
        let url = self.endpoint(&format!("model/download/{}", id), &[])?;
        self.get(url)
    }
}
