//! Capability interfaces for the remote services.
//!
//! The matching logic never talks to a concrete HTTP client; it goes through
//! these narrow traits so it can be exercised against in-memory fakes. The
//! blocking implementations live in [`crate::ontology::chebi`] and
//! [`crate::ontology::biomodels`].

use serde::{Deserialize, Serialize};

use crate::ontology::error::OntologyError;

/// A complete ontology entity record: identifier, display name, and the
/// declared parent/child relations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OntologyEntity {
    pub chebi_id: String,
    pub chebi_ascii_name: String,
    pub children: Vec<OntologyRelation>,
    pub parents: Vec<OntologyRelation>,
}

/// One declared ontology relation, e.g. an "is a" edge to another entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OntologyRelation {
    pub chebi_id: String,
    pub chebi_name: String,
    /// Relation type as declared by the ontology, e.g. `is a`, `has part`.
    #[serde(rename = "type")]
    pub relation_type: String,
    pub status: Option<String>,
    pub cyclic: Option<bool>,
}

/// A search hit from a free-text ontology query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LiteEntity {
    pub chebi_id: String,
    pub chebi_ascii_name: String,
    pub search_score: Option<f64>,
}

/// Entity lookup and free-text search against an ontology service.
pub trait OntologyClient {
    /// Fetches the full entity record for an ontology identifier.
    fn complete_entity(&self, id: &str) -> Result<OntologyEntity, OntologyError>;

    /// Searches the ontology by free text, returning lightweight hits.
    fn search(&self, text: &str) -> Result<Vec<LiteEntity>, OntologyError>;
}

/// Lookup of published models in a public model repository.
pub trait ModelRepository {
    /// Returns ids of models annotated with the given ontology term.
    fn models_by_ontology_term(&self, term: &str) -> Result<Vec<String>, OntologyError>;

    /// Fetches the SBML source of a model by repository id.
    fn model_xml_by_id(&self, id: &str) -> Result<String, OntologyError>;
}
