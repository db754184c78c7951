//! Owned SBML core document model.
//!
//! Unlike wrapper libraries where every element carries a back-reference to
//! its owning model, this module keeps ownership explicit: an [`SbmlDocument`]
//! owns its [`Model`], the model owns plain vectors of elements, and lookups
//! go through id-based accessors on the model. Operations that need the
//! owning document take it as an argument.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::sbml::annotations::{Annotated, CvTerm};
use crate::sbml::math::MathNode;

/// Root container for an SBML model, tracking the SBML level/version the
/// document was read with (or should be written as).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SbmlDocument {
    /// SBML level of the document.
    pub level: u32,

    /// SBML version within the level.
    pub version: u32,

    /// The contained model, if any.
    pub model: Option<Model>,
}

impl Default for SbmlDocument {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

impl SbmlDocument {
    /// Creates an empty document with the given SBML level and version.
    pub fn new(level: u32, version: u32) -> Self {
        Self {
            level,
            version,
            model: None,
        }
    }

    /// Returns the contained model, or [`crate::sbml::error::SbmlError::MissingModel`].
    pub fn require_model(&self) -> Result<&Model, crate::sbml::error::SbmlError> {
        self.model
            .as_ref()
            .ok_or(crate::sbml::error::SbmlError::MissingModel)
    }
}

/// An SBML model: the collection of compartments, species, parameters,
/// reactions, unit definitions, and function definitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct Model {
    /// Identifier of the model.
    #[builder(setter(into))]
    pub id: String,

    /// Human-readable name.
    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    /// Meta id used to address the model from RDF annotations.
    #[builder(setter(into, strip_option))]
    pub meta_id: Option<String>,

    /// Controlled-vocabulary annotations attached to the model itself.
    #[builder(setter(into))]
    pub cv_terms: Vec<CvTerm>,

    #[builder(setter(into, each(name = "to_function_definitions")))]
    pub function_definitions: Vec<FunctionDefinition>,

    #[builder(setter(into, each(name = "to_unit_definitions")))]
    pub unit_definitions: Vec<UnitDefinition>,

    #[builder(setter(into, each(name = "to_compartments")))]
    pub compartments: Vec<Compartment>,

    #[builder(setter(into, each(name = "to_species")))]
    pub species: Vec<Species>,

    #[builder(setter(into, each(name = "to_parameters")))]
    pub parameters: Vec<Parameter>,

    #[builder(setter(into, each(name = "to_reactions")))]
    pub reactions: Vec<Reaction>,
}

impl Model {
    pub fn species_by_id(&self, id: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn reaction_by_id(&self, id: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.id == id)
    }

    pub fn compartment_by_id(&self, id: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.id == id)
    }

    pub fn parameter_by_id(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub fn unit_definition_by_id(&self, id: &str) -> Option<&UnitDefinition> {
        self.unit_definitions.iter().find(|u| u.id == id)
    }

    pub fn function_definition_by_id(&self, id: &str) -> Option<&FunctionDefinition> {
        self.function_definitions.iter().find(|f| f.id == id)
    }
}

/// A chemical species located in a compartment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct Species {
    /// Unique identifier of the species.
    #[builder(setter(into))]
    pub id: String,

    /// Human-readable name.
    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    /// Meta id used to address the species from RDF annotations.
    #[builder(setter(into, strip_option))]
    pub meta_id: Option<String>,

    /// Identifier of the compartment the species lives in.
    #[builder(setter(into))]
    pub compartment: String,

    #[builder(setter(strip_option))]
    pub initial_concentration: Option<f64>,

    #[builder(setter(strip_option))]
    pub initial_amount: Option<f64>,

    #[builder(setter(strip_option))]
    pub boundary_condition: Option<bool>,

    #[builder(setter(strip_option))]
    pub constant: Option<bool>,

    /// Controlled-vocabulary annotations.
    #[builder(setter(into))]
    pub cv_terms: Vec<CvTerm>,
}

/// A reaction transforming reactant species into product species, optionally
/// influenced by modifier species and governed by a kinetic law.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct Reaction {
    /// Unique identifier of the reaction.
    #[builder(setter(into))]
    pub id: String,

    /// Human-readable name.
    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    /// Meta id used to address the reaction from RDF annotations.
    #[builder(setter(into, strip_option))]
    pub meta_id: Option<String>,

    #[builder(setter(strip_option))]
    pub reversible: Option<bool>,

    #[builder(setter(into, each(name = "to_reactants")))]
    pub reactants: Vec<SpeciesReference>,

    #[builder(setter(into, each(name = "to_products")))]
    pub products: Vec<SpeciesReference>,

    #[builder(setter(into, each(name = "to_modifiers")))]
    pub modifiers: Vec<ModifierSpeciesReference>,

    /// The rate expression and its local parameters.
    #[builder(setter(strip_option))]
    pub kinetic_law: Option<KineticLaw>,

    /// Controlled-vocabulary annotations.
    #[builder(setter(into))]
    pub cv_terms: Vec<CvTerm>,
}

/// A stoichiometric reference to a species acting as reactant or product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct SpeciesReference {
    /// Identifier of the referenced species.
    #[builder(setter(into))]
    pub species: String,

    #[builder(setter(strip_option))]
    pub stoichiometry: Option<f64>,

    #[builder(setter(strip_option))]
    pub constant: Option<bool>,
}

impl SpeciesReference {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            ..Default::default()
        }
    }
}

/// A reference to a species that modifies a reaction without being consumed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct ModifierSpeciesReference {
    /// Identifier of the modifying species.
    #[builder(setter(into))]
    pub species: String,
}

impl ModifierSpeciesReference {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
        }
    }
}

/// The mathematical expression governing a reaction's rate, together with
/// parameters scoped to the law itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct KineticLaw {
    /// The rate expression.
    #[builder(setter(strip_option))]
    pub math: Option<MathNode>,

    /// Parameters visible only inside this law.
    #[builder(setter(into, each(name = "to_local_parameters")))]
    pub local_parameters: Vec<LocalParameter>,
}

/// A parameter scoped to a single kinetic law.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct LocalParameter {
    #[builder(setter(into))]
    pub id: String,

    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    #[builder(setter(strip_option))]
    pub value: Option<f64>,

    /// Identifier of a unit definition, or a builtin unit kind.
    #[builder(setter(into, strip_option))]
    pub units: Option<String>,
}

/// A model-level parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct Parameter {
    #[builder(setter(into))]
    pub id: String,

    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    #[builder(setter(into, strip_option))]
    pub meta_id: Option<String>,

    #[builder(setter(strip_option))]
    pub value: Option<f64>,

    /// Identifier of a unit definition, or a builtin unit kind.
    #[builder(setter(into, strip_option))]
    pub units: Option<String>,

    #[builder(setter(strip_option))]
    pub constant: Option<bool>,

    /// Controlled-vocabulary annotations.
    #[builder(setter(into))]
    pub cv_terms: Vec<CvTerm>,
}

/// A compartment in which species are located. A compartment may declare an
/// enclosing parent compartment via `outside`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct Compartment {
    #[builder(setter(into))]
    pub id: String,

    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    #[builder(setter(into, strip_option))]
    pub meta_id: Option<String>,

    #[builder(setter(strip_option))]
    pub size: Option<f64>,

    #[builder(setter(strip_option))]
    pub spatial_dimensions: Option<f64>,

    #[builder(setter(strip_option))]
    pub constant: Option<bool>,

    /// Identifier of the enclosing compartment, if any.
    #[builder(setter(into, strip_option))]
    pub outside: Option<String>,

    /// Controlled-vocabulary annotations.
    #[builder(setter(into))]
    pub cv_terms: Vec<CvTerm>,
}

/// A named unit built from one or more base units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct UnitDefinition {
    #[builder(setter(into))]
    pub id: String,

    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    #[builder(setter(into, strip_option))]
    pub meta_id: Option<String>,

    #[builder(setter(into, each(name = "to_units")))]
    pub units: Vec<Unit>,

    /// Controlled-vocabulary annotations.
    #[builder(setter(into))]
    pub cv_terms: Vec<CvTerm>,
}

/// A single base-unit factor of a unit definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct Unit {
    /// Base unit kind, e.g. `mole`, `litre`, `second`.
    #[builder(setter(into))]
    pub kind: String,

    #[builder(setter(strip_option))]
    pub exponent: Option<f64>,

    #[builder(setter(strip_option))]
    pub scale: Option<i32>,

    #[builder(setter(strip_option))]
    pub multiplier: Option<f64>,
}

/// A reusable function defined as a MathML lambda.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Builder)]
#[builder(default)]
pub struct FunctionDefinition {
    #[builder(setter(into))]
    pub id: String,

    #[builder(setter(into, strip_option))]
    pub name: Option<String>,

    #[builder(setter(into, strip_option))]
    pub meta_id: Option<String>,

    /// The lambda expression defining the function body.
    #[builder(setter(strip_option))]
    pub math: Option<MathNode>,

    /// Controlled-vocabulary annotations.
    #[builder(setter(into))]
    pub cv_terms: Vec<CvTerm>,
}

/// Wires up [`Annotated`] for every element type that carries CV terms.
macro_rules! impl_annotated {
    ($($ty:ty),* $(,)?) => {
        $(impl Annotated for $ty {
            fn meta_id(&self) -> Option<&str> {
                self.meta_id.as_deref()
            }

            fn set_meta_id(&mut self, meta_id: &str) {
                self.meta_id = Some(meta_id.to_string());
            }

            fn cv_terms(&self) -> &[CvTerm] {
                &self.cv_terms
            }

            fn add_cv_term(&mut self, term: CvTerm) {
                self.cv_terms.push(term);
            }
        })*
    };
}

impl_annotated!(
    Model,
    Species,
    Reaction,
    Parameter,
    Compartment,
    UnitDefinition,
    FunctionDefinition,
);
