//! Extraction of ontology identifiers from element annotations.

use lazy_static::lazy_static;
use regex::Regex;

use crate::sbml::annotations::Annotated;
use crate::sbml::schema::SbmlDocument;

lazy_static! {
    static ref CHEBI_RE: Regex = Regex::new(r"(CHEBI:\d+)").unwrap();
    static ref BIOMODEL_RE: Regex = Regex::new(r"((?:BIOMD|MODEL)\d+)").unwrap();
}

/// Returns all resource URIs attached to the element, across all of its CV
/// terms, in term-then-resource order. No filtering by qualifier type is
/// applied.
pub fn resource_uris<T: Annotated + ?Sized>(element: &T) -> Vec<String> {
    element
        .cv_terms()
        .iter()
        .flat_map(|term| term.resources.iter().cloned())
        .collect()
}

/// Returns the first ChEBI identifier (`CHEBI:<digits>`, case-sensitive)
/// found among the element's resource URIs. Only the first match is
/// returned, even if several CV terms carry distinct ChEBI ids.
pub fn chebi_id<T: Annotated + ?Sized>(element: &T) -> Option<String> {
    element
        .cv_terms()
        .iter()
        .flat_map(|term| term.resources.iter())
        .find_map(|uri| CHEBI_RE.captures(uri).map(|c| c[1].to_string()))
}

/// Returns the BioModels identifier (`BIOMD...`/`MODEL...`) declared in the
/// model-level annotations, if any.
pub fn biomodel_id(doc: &SbmlDocument) -> Option<String> {
    let model = doc.model.as_ref()?;
    resource_uris(model)
        .iter()
        .find_map(|uri| BIOMODEL_RE.captures(uri).map(|c| c[1].to_string()))
}
