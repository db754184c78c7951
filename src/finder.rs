//! Reaction discovery across a public model repository.
//!
//! [`ReactionFinder`] chains the steps the interactive search flow needs:
//! free-text ontology search, repository lookup of models annotated with the
//! chosen term, URI matching of their reactions, and finally sub-model
//! extraction plus diagram export for a selected reaction. Results of the
//! last search are kept on the finder for the duration of the session, so
//! selecting a reaction does not re-download its model.

use std::collections::HashMap;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::annotations::biomodel_id;
use crate::analysis::compare::matching_reactions_by_uri;
use crate::analysis::submodel::make_submodel;
use crate::ontology::client::{LiteEntity, ModelRepository, OntologyClient};
use crate::ontology::error::OntologyError;
use crate::sbml::error::SbmlError;
use crate::sbml::reader;
use crate::sbml::schema::SbmlDocument;
use crate::sbml::writer::to_xml_string;
use crate::visualization::diagram::{DiagramStyle, NetworkDiagram};

/// Errors from the finder pipeline.
#[derive(Debug, Error)]
pub enum FinderError {
    /// A remote service call failed
    #[error(transparent)]
    Ontology(#[from] OntologyError),

    /// A fetched model could not be processed
    #[error(transparent)]
    Sbml(#[from] SbmlError),

    /// A reaction was selected from a model that is not in the last search
    #[error("Model {0} is not part of the current search results")]
    UnknownModel(String),
}

/// One reaction matched during a repository search.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReactionHit {
    /// Repository id of the model the reaction belongs to.
    pub model_id: String,
    pub reaction_id: String,
    pub reaction_name: Option<String>,
}

/// A selected reaction, extracted as a standalone sub-model.
#[derive(Debug)]
pub struct SubmodelSelection {
    pub document: SbmlDocument,
    /// The sub-model serialized as SBML.
    pub xml: String,
    /// A DOT rendering of the sub-model's network.
    pub dot: String,
}

/// Session-scoped search driver over an ontology and a model repository.
pub struct ReactionFinder<'a> {
    ontology: &'a dyn OntologyClient,
    repository: &'a dyn ModelRepository,
    /// Fetched documents of the last search, keyed by repository model id.
    documents: HashMap<String, SbmlDocument>,
    last_terms: Vec<LiteEntity>,
    last_hits: Vec<ReactionHit>,
}

impl<'a> ReactionFinder<'a> {
    pub fn new(ontology: &'a dyn OntologyClient, repository: &'a dyn ModelRepository) -> Self {
        Self {
            ontology,
            repository,
            documents: HashMap::new(),
            last_terms: Vec::new(),
            last_hits: Vec::new(),
        }
    }

    /// Free-text ontology search; hits are retained as the session's term
    /// candidates.
    pub fn search_terms(&mut self, text: &str) -> Result<&[LiteEntity], FinderError> {
        self.last_terms = self.ontology.search(text)?;
        Ok(&self.last_terms)
    }

    /// Terms found by the last [`Self::search_terms`] call.
    pub fn last_terms(&self) -> &[LiteEntity] {
        &self.last_terms
    }

    /// Finds reactions annotated with the given ontology term across the
    /// repository's models.
    ///
    /// An empty result is a normal terminal state, not an error. Models
    /// that fail to download or parse are skipped with a warning so one
    /// broken repository entry does not abort the search.
    pub fn find_reactions(&mut self, term: &str) -> Result<&[ReactionHit], FinderError> {
        self.documents.clear();
        self.last_hits.clear();

        let model_ids = self.repository.models_by_ontology_term(term)?;
        if model_ids.is_empty() {
            info!("no biomodels containing {}", term);
            return Ok(&self.last_hits);
        }

        for model_id in model_ids {
            let xml = match self.repository.model_xml_by_id(&model_id) {
                Ok(xml) => xml,
                Err(e) => {
                    warn!("skipping model {}: {}", model_id, e);
                    continue;
                }
            };
            let doc = match reader::from_str(&xml) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("skipping model {}: {}", model_id, e);
                    continue;
                }
            };

            // Prefer the id the model declares about itself over the
            // repository handle.
            let declared_id = biomodel_id(&doc).unwrap_or_else(|| model_id.clone());

            let hits: Vec<ReactionHit> = matching_reactions_by_uri(&doc, term)?
                .into_iter()
                .map(|reaction| ReactionHit {
                    model_id: declared_id.clone(),
                    reaction_id: reaction.id.clone(),
                    reaction_name: reaction.name.clone(),
                })
                .collect();

            self.documents.insert(declared_id, doc);
            self.last_hits.extend(hits);
        }

        Ok(&self.last_hits)
    }

    /// Reactions found by the last [`Self::find_reactions`] call.
    pub fn last_hits(&self) -> &[ReactionHit] {
        &self.last_hits
    }

    /// Extracts the selected reaction as a sub-model and renders its
    /// diagram.
    pub fn select(
        &mut self,
        model_id: &str,
        reaction_id: &str,
    ) -> Result<SubmodelSelection, FinderError> {
        let doc = self
            .documents
            .get(model_id)
            .ok_or_else(|| FinderError::UnknownModel(model_id.to_string()))?;

        let submodel = make_submodel(doc, reaction_id)?;
        let xml = to_xml_string(&submodel)?;
        let style = DiagramStyle {
            reaction_shape: Some("box".to_string()),
            ..Default::default()
        };
        let diagram = NetworkDiagram::from_model(submodel.require_model()?, &style);

        Ok(SubmodelSelection {
            dot: diagram.to_dot(),
            xml,
            document: submodel,
        })
    }
}
