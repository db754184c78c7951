//! Reading SBML documents.
//!
//! Accepts the three input shapes callers actually have at hand: raw SBML
//! text, an already-parsed [`SbmlDocument`], or a bare [`Model`]. The
//! [`SbmlSource`] enum normalizes them; [`from_str`] and [`from_file`] are
//! the plain entry points. Anything that is not a recognized SBML document
//! is an immediate error, never silently coerced.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::sbml::annotations::parse_annotation;
use crate::sbml::error::SbmlError;
use crate::sbml::math::{attr_value, parse_math};
use crate::sbml::schema::{
    Compartment, FunctionDefinition, KineticLaw, LocalParameter, Model, ModifierSpeciesReference,
    Parameter, Reaction, SbmlDocument, Species, SpeciesReference, Unit, UnitDefinition,
};

/// The accepted input shapes, normalized via [`SbmlSource::into_document`].
#[derive(Debug, Clone)]
pub enum SbmlSource {
    /// Raw SBML text.
    Xml(String),
    /// An already-parsed document.
    Document(SbmlDocument),
    /// A bare model; wrapped into a default-level document.
    Model(Model),
}

impl From<&str> for SbmlSource {
    fn from(xml: &str) -> Self {
        SbmlSource::Xml(xml.to_string())
    }
}

impl From<String> for SbmlSource {
    fn from(xml: String) -> Self {
        SbmlSource::Xml(xml)
    }
}

impl From<SbmlDocument> for SbmlSource {
    fn from(doc: SbmlDocument) -> Self {
        SbmlSource::Document(doc)
    }
}

impl From<Model> for SbmlSource {
    fn from(model: Model) -> Self {
        SbmlSource::Model(model)
    }
}

impl SbmlSource {
    /// Normalizes the source into a document, parsing raw text if needed.
    pub fn into_document(self) -> Result<SbmlDocument, SbmlError> {
        match self {
            SbmlSource::Xml(xml) => from_str(&xml),
            SbmlSource::Document(doc) => Ok(doc),
            SbmlSource::Model(model) => {
                let mut doc = SbmlDocument::default();
                doc.model = Some(model);
                Ok(doc)
            }
        }
    }
}

/// Parses an SBML document from text.
pub fn from_str(xml: &str) -> Result<SbmlDocument, SbmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Locate the <sbml> root.
    let root = loop {
        match reader.read_event()? {
            Event::Start(e) => break e.to_owned(),
            Event::Decl(_) | Event::Comment(_) | Event::DocType(_) | Event::Text(_) => {}
            Event::Empty(e) if e.local_name().as_ref() == b"sbml" => {
                return Ok(SbmlDocument::new(3, 2))
            }
            Event::Eof => return Err(SbmlError::InvalidDocument("empty input".into())),
            _ => return Err(SbmlError::InvalidDocument("no <sbml> root element".into())),
        }
    };

    if root.local_name().as_ref() != b"sbml" {
        return Err(SbmlError::InvalidDocument(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(root.local_name().as_ref())
        )));
    }

    let level = parse_u32_attr(&root, b"level")?.unwrap_or(3);
    let version = parse_u32_attr(&root, b"version")?.unwrap_or(2);
    let mut doc = SbmlDocument::new(level, version);

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"model" => doc.model = Some(parse_model(&mut reader, &e)?),
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"model" {
                    doc.model = Some(model_from_attrs(&e)?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"sbml" => break,
            Event::Eof => return Err(SbmlError::UnexpectedEof("sbml".into())),
            _ => {}
        }
    }

    Ok(doc)
}

/// Parses an SBML document from a file.
pub fn from_file(path: impl AsRef<Path>) -> Result<SbmlDocument, SbmlError> {
    let xml = fs::read_to_string(path)?;
    from_str(&xml)
}

fn model_from_attrs(e: &BytesStart) -> Result<Model, SbmlError> {
    Ok(Model {
        id: attr_value(e, b"id")?.unwrap_or_default(),
        name: attr_value(e, b"name")?,
        meta_id: attr_value(e, b"metaid")?,
        ..Default::default()
    })
}

fn parse_model(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Model, SbmlError> {
    let mut model = model_from_attrs(start)?;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"listOfFunctionDefinitions" => parse_function_definitions(reader, &mut model)?,
                b"listOfUnitDefinitions" => parse_unit_definitions(reader, &mut model)?,
                b"listOfCompartments" => parse_compartments(reader, &mut model)?,
                b"listOfSpecies" => parse_species_list(reader, &mut model)?,
                b"listOfParameters" => parse_parameters(reader, &mut model)?,
                b"listOfReactions" => parse_reactions(reader, &mut model)?,
                b"annotation" => model.cv_terms = parse_annotation(reader)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(_) => {}
            Event::End(e) if e.local_name().as_ref() == b"model" => return Ok(model),
            Event::Eof => return Err(SbmlError::UnexpectedEof("model".into())),
            _ => {}
        }
    }
}

fn parse_species_list(reader: &mut Reader<&[u8]>, model: &mut Model) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"species" => {
                let mut species = species_from_attrs(&e)?;
                parse_element_body(reader, b"species", &mut species.cv_terms)?;
                model.species.push(species);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"species" => {
                model.species.push(species_from_attrs(&e)?);
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"listOfSpecies" => return Ok(()),
            Event::Eof => return Err(SbmlError::UnexpectedEof("listOfSpecies".into())),
            _ => {}
        }
    }
}

fn species_from_attrs(e: &BytesStart) -> Result<Species, SbmlError> {
    Ok(Species {
        id: require_attr(e, b"id")?,
        name: attr_value(e, b"name")?,
        meta_id: attr_value(e, b"metaid")?,
        compartment: attr_value(e, b"compartment")?.unwrap_or_default(),
        initial_concentration: parse_f64_attr(e, b"initialConcentration")?,
        initial_amount: parse_f64_attr(e, b"initialAmount")?,
        boundary_condition: parse_bool_attr(e, b"boundaryCondition")?,
        constant: parse_bool_attr(e, b"constant")?,
        cv_terms: Vec::new(),
    })
}

fn parse_compartments(reader: &mut Reader<&[u8]>, model: &mut Model) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"compartment" => {
                let mut compartment = compartment_from_attrs(&e)?;
                parse_element_body(reader, b"compartment", &mut compartment.cv_terms)?;
                model.compartments.push(compartment);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"compartment" => {
                model.compartments.push(compartment_from_attrs(&e)?);
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"listOfCompartments" => return Ok(()),
            Event::Eof => return Err(SbmlError::UnexpectedEof("listOfCompartments".into())),
            _ => {}
        }
    }
}

fn compartment_from_attrs(e: &BytesStart) -> Result<Compartment, SbmlError> {
    Ok(Compartment {
        id: require_attr(e, b"id")?,
        name: attr_value(e, b"name")?,
        meta_id: attr_value(e, b"metaid")?,
        size: parse_f64_attr(e, b"size")?,
        spatial_dimensions: parse_f64_attr(e, b"spatialDimensions")?,
        constant: parse_bool_attr(e, b"constant")?,
        outside: attr_value(e, b"outside")?,
        cv_terms: Vec::new(),
    })
}

fn parse_parameters(reader: &mut Reader<&[u8]>, model: &mut Model) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"parameter" => {
                let mut parameter = parameter_from_attrs(&e)?;
                parse_element_body(reader, b"parameter", &mut parameter.cv_terms)?;
                model.parameters.push(parameter);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"parameter" => {
                model.parameters.push(parameter_from_attrs(&e)?);
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"listOfParameters" => return Ok(()),
            Event::Eof => return Err(SbmlError::UnexpectedEof("listOfParameters".into())),
            _ => {}
        }
    }
}

fn parameter_from_attrs(e: &BytesStart) -> Result<Parameter, SbmlError> {
    Ok(Parameter {
        id: require_attr(e, b"id")?,
        name: attr_value(e, b"name")?,
        meta_id: attr_value(e, b"metaid")?,
        value: parse_f64_attr(e, b"value")?,
        units: attr_value(e, b"units")?,
        constant: parse_bool_attr(e, b"constant")?,
        cv_terms: Vec::new(),
    })
}

fn parse_unit_definitions(reader: &mut Reader<&[u8]>, model: &mut Model) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"unitDefinition" => {
                let mut unit_def = UnitDefinition {
                    id: require_attr(&e, b"id")?,
                    name: attr_value(&e, b"name")?,
                    meta_id: attr_value(&e, b"metaid")?,
                    ..Default::default()
                };
                parse_unit_definition_body(reader, &mut unit_def)?;
                model.unit_definitions.push(unit_def);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"unitDefinition" => {
                model.unit_definitions.push(UnitDefinition {
                    id: require_attr(&e, b"id")?,
                    name: attr_value(&e, b"name")?,
                    meta_id: attr_value(&e, b"metaid")?,
                    ..Default::default()
                });
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"listOfUnitDefinitions" => return Ok(()),
            Event::Eof => return Err(SbmlError::UnexpectedEof("listOfUnitDefinitions".into())),
            _ => {}
        }
    }
}

fn parse_unit_definition_body(
    reader: &mut Reader<&[u8]>,
    unit_def: &mut UnitDefinition,
) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"unit" => {
                unit_def.units.push(Unit {
                    kind: require_attr(&e, b"kind")?,
                    exponent: parse_f64_attr(&e, b"exponent")?,
                    scale: parse_i32_attr(&e, b"scale")?,
                    multiplier: parse_f64_attr(&e, b"multiplier")?,
                });
            }
            Event::Start(e) if e.local_name().as_ref() == b"annotation" => {
                unit_def.cv_terms = parse_annotation(reader)?;
            }
            Event::Start(e) if e.local_name().as_ref() == b"listOfUnits" => {}
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"unitDefinition" => return Ok(()),
            Event::Eof => return Err(SbmlError::UnexpectedEof("unitDefinition".into())),
            _ => {}
        }
    }
}

fn parse_function_definitions(
    reader: &mut Reader<&[u8]>,
    model: &mut Model,
) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"functionDefinition" => {
                let mut func = FunctionDefinition {
                    id: require_attr(&e, b"id")?,
                    name: attr_value(&e, b"name")?,
                    meta_id: attr_value(&e, b"metaid")?,
                    ..Default::default()
                };
                loop {
                    match reader.read_event()? {
                        Event::Start(inner) if inner.local_name().as_ref() == b"math" => {
                            func.math = Some(parse_math(reader)?);
                        }
                        Event::Start(inner) if inner.local_name().as_ref() == b"annotation" => {
                            func.cv_terms = parse_annotation(reader)?;
                        }
                        Event::Start(inner) => {
                            reader.read_to_end(inner.name())?;
                        }
                        Event::End(inner) if inner.local_name().as_ref() == b"functionDefinition" => {
                            break
                        }
                        Event::Eof => {
                            return Err(SbmlError::UnexpectedEof("functionDefinition".into()))
                        }
                        _ => {}
                    }
                }
                model.function_definitions.push(func);
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"listOfFunctionDefinitions" => {
                return Ok(())
            }
            Event::Eof => {
                return Err(SbmlError::UnexpectedEof("listOfFunctionDefinitions".into()))
            }
            _ => {}
        }
    }
}

fn parse_reactions(reader: &mut Reader<&[u8]>, model: &mut Model) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"reaction" => {
                let reaction = parse_reaction(reader, &e)?;
                model.reactions.push(reaction);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"reaction" => {
                model.reactions.push(Reaction {
                    id: require_attr(&e, b"id")?,
                    name: attr_value(&e, b"name")?,
                    meta_id: attr_value(&e, b"metaid")?,
                    reversible: parse_bool_attr(&e, b"reversible")?,
                    ..Default::default()
                });
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"listOfReactions" => return Ok(()),
            Event::Eof => return Err(SbmlError::UnexpectedEof("listOfReactions".into())),
            _ => {}
        }
    }
}

fn parse_reaction(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<Reaction, SbmlError> {
    let mut reaction = Reaction {
        id: require_attr(start, b"id")?,
        name: attr_value(start, b"name")?,
        meta_id: attr_value(start, b"metaid")?,
        reversible: parse_bool_attr(start, b"reversible")?,
        ..Default::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"listOfReactants" => {
                    parse_species_references(reader, b"listOfReactants", &mut reaction.reactants)?
                }
                b"listOfProducts" => {
                    parse_species_references(reader, b"listOfProducts", &mut reaction.products)?
                }
                b"listOfModifiers" => parse_modifiers(reader, &mut reaction.modifiers)?,
                b"kineticLaw" => reaction.kinetic_law = Some(parse_kinetic_law(reader)?),
                b"annotation" => reaction.cv_terms = parse_annotation(reader)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(_) => {}
            Event::End(e) if e.local_name().as_ref() == b"reaction" => return Ok(reaction),
            Event::Eof => return Err(SbmlError::UnexpectedEof("reaction".into())),
            _ => {}
        }
    }
}

fn parse_species_references(
    reader: &mut Reader<&[u8]>,
    list_tag: &[u8],
    out: &mut Vec<SpeciesReference>,
) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"speciesReference" => {
                out.push(SpeciesReference {
                    species: require_attr(&e, b"species")?,
                    stoichiometry: parse_f64_attr(&e, b"stoichiometry")?,
                    constant: parse_bool_attr(&e, b"constant")?,
                });
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == list_tag => return Ok(()),
            Event::Eof => {
                return Err(SbmlError::UnexpectedEof(
                    String::from_utf8_lossy(list_tag).into_owned(),
                ))
            }
            _ => {}
        }
    }
}

fn parse_modifiers(
    reader: &mut Reader<&[u8]>,
    out: &mut Vec<ModifierSpeciesReference>,
) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"modifierSpeciesReference" =>
            {
                out.push(ModifierSpeciesReference {
                    species: require_attr(&e, b"species")?,
                });
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == b"listOfModifiers" => return Ok(()),
            Event::Eof => return Err(SbmlError::UnexpectedEof("listOfModifiers".into())),
            _ => {}
        }
    }
}

fn parse_kinetic_law(reader: &mut Reader<&[u8]>) -> Result<KineticLaw, SbmlError> {
    let mut law = KineticLaw::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"math" => law.math = Some(parse_math(reader)?),
                // L3 uses listOfLocalParameters, L2 plain listOfParameters
                b"listOfLocalParameters" | b"listOfParameters" => {
                    parse_local_parameters(reader, e.local_name().as_ref().to_vec(), &mut law)?
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(_) => {}
            Event::End(e) if e.local_name().as_ref() == b"kineticLaw" => return Ok(law),
            Event::Eof => return Err(SbmlError::UnexpectedEof("kineticLaw".into())),
            _ => {}
        }
    }
}

fn parse_local_parameters(
    reader: &mut Reader<&[u8]>,
    list_tag: Vec<u8>,
    law: &mut KineticLaw,
) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e)
                if matches!(e.local_name().as_ref(), b"localParameter" | b"parameter") =>
            {
                law.local_parameters.push(LocalParameter {
                    id: require_attr(&e, b"id")?,
                    name: attr_value(&e, b"name")?,
                    value: parse_f64_attr(&e, b"value")?,
                    units: attr_value(&e, b"units")?,
                });
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == list_tag.as_slice() => return Ok(()),
            Event::Eof => {
                return Err(SbmlError::UnexpectedEof(
                    String::from_utf8_lossy(&list_tag).into_owned(),
                ))
            }
            _ => {}
        }
    }
}

/// Consumes the body of a leaf element (species, compartment, parameter),
/// picking up CV terms and skipping everything else.
fn parse_element_body(
    reader: &mut Reader<&[u8]>,
    end_tag: &[u8],
    cv_terms: &mut Vec<crate::sbml::annotations::CvTerm>,
) -> Result<(), SbmlError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"annotation" => {
                *cv_terms = parse_annotation(reader)?;
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(e) if e.local_name().as_ref() == end_tag => return Ok(()),
            Event::Eof => {
                return Err(SbmlError::UnexpectedEof(
                    String::from_utf8_lossy(end_tag).into_owned(),
                ))
            }
            _ => {}
        }
    }
}

fn require_attr(e: &BytesStart, name: &[u8]) -> Result<String, SbmlError> {
    attr_value(e, name)?.ok_or_else(|| SbmlError::MissingAttribute {
        element: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
        attribute: String::from_utf8_lossy(name).into_owned(),
    })
}

fn parse_f64_attr(e: &BytesStart, name: &[u8]) -> Result<Option<f64>, SbmlError> {
    match attr_value(e, name)? {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| SbmlError::InvalidNumber(value)),
        None => Ok(None),
    }
}

fn parse_i32_attr(e: &BytesStart, name: &[u8]) -> Result<Option<i32>, SbmlError> {
    match attr_value(e, name)? {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| SbmlError::InvalidNumber(value)),
        None => Ok(None),
    }
}

fn parse_u32_attr(e: &BytesStart, name: &[u8]) -> Result<Option<u32>, SbmlError> {
    match attr_value(e, name)? {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| SbmlError::InvalidNumber(value)),
        None => Ok(None),
    }
}

fn parse_bool_attr(e: &BytesStart, name: &[u8]) -> Result<Option<bool>, SbmlError> {
    match attr_value(e, name)? {
        Some(value) => match value.as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(SbmlError::InvalidDocument(format!(
                "invalid boolean '{}'",
                value
            ))),
        },
        None => Ok(None),
    }
}
