//! sbmlkit
//!
//! This library provides functionality for working with annotated SBML
//! models, including:
//! - Extracting ontology identifiers (ChEBI, BioModels) from model elements
//! - Matching species and reactions across two models via a remote ontology
//! - Extracting a single reaction into a minimal standalone sub-model
//! - Projecting models onto directed graphs exported as Graphviz DOT
//! - Searching public model repositories for reactions by ontology term

#![warn(unused_imports)]

/// SBML core: owned document model, MathML, annotations, reading, writing
pub mod sbml {
    /// CV-term annotations and qualifiers
    pub mod annotations;
    /// Error types for SBML processing
    pub mod error;
    /// MathML expression trees
    pub mod math;
    /// Input normalization and parsing
    pub mod reader;
    /// Core document/model structures
    pub mod schema;
    /// Serialization back to SBML XML
    pub mod writer;
}

/// Remote ontology and model-repository clients
pub mod ontology {
    /// BioModels REST client
    pub mod biomodels;
    /// EBI ChEBI web-service client
    pub mod chebi;
    /// Capability traits and wire records
    pub mod client;
    /// Error types for remote services
    pub mod error;
}

/// Annotation analysis: identifier extraction, matching, sub-models
pub mod analysis {
    /// Resource-URI and identifier extraction
    pub mod annotations;
    /// Cross-model species and reaction matching
    pub mod compare;
    /// ChEBI relationship matcher
    pub mod matcher;
    /// Single-reaction sub-model extraction
    pub mod submodel;
}

/// Network and diff diagrams
pub mod visualization {
    /// Single-model network diagrams
    pub mod diagram;
    /// Two-model diff diagrams
    pub mod diff;
}

/// Repository search pipeline
pub mod finder;

/// Human-readable summaries
pub mod info;

/// IO functionality
pub mod io;

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::analysis::annotations::{biomodel_id, chebi_id, resource_uris};
    pub use crate::analysis::compare::{
        matching_reactions_by_species, matching_reactions_by_uri, matching_species,
    };
    pub use crate::analysis::matcher::{SpeciesMatch, SpeciesMatcher};
    pub use crate::analysis::submodel::make_submodel;
    pub use crate::finder::ReactionFinder;
    pub use crate::io::{load_sbml, save_sbml};
    pub use crate::ontology::biomodels::BioModelsClient;
    pub use crate::ontology::chebi::ChebiClient;
    pub use crate::ontology::client::{ModelRepository, OntologyClient};
    pub use crate::sbml::annotations::{append_annotations, Annotated, CvTerm, Qualifier};
    pub use crate::sbml::error::SbmlError;
    pub use crate::sbml::reader::{from_file, from_str, SbmlSource};
    pub use crate::sbml::schema::*;
    pub use crate::sbml::writer::to_xml_string;
    pub use crate::visualization::diagram::{DiagramStyle, NetworkDiagram};
    pub use crate::visualization::diff::DiffDiagram;
}
