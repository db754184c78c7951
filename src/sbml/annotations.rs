//! Controlled-vocabulary (CV term) annotations.
//!
//! SBML elements carry ontology references as RDF blocks inside their
//! `<annotation>` element, following the MIRIAM qualifier convention:
//!
//! ```xml
//! <annotation>
//!   <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
//!            xmlns:bqbiol="http://biomodels.net/biology-qualifiers/">
//!     <rdf:Description rdf:about="#glu_meta">
//!       <bqbiol:is>
//!         <rdf:Bag>
//!           <rdf:li rdf:resource="http://identifiers.org/chebi/CHEBI:17234"/>
//!         </rdf:Bag>
//!       </bqbiol:is>
//!     </rdf:Description>
//!   </rdf:RDF>
//! </annotation>
//! ```
//!
//! This module parses such blocks into [`CvTerm`] values, writes them back,
//! and provides [`append_annotations`] to attach qualifier/URI pairs to
//! elements addressed by id.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use crate::sbml::error::SbmlError;
use crate::sbml::math::attr_value;
use crate::sbml::schema::SbmlDocument;

const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const BQBIOL_NS: &str = "http://biomodels.net/biology-qualifiers/";
const BQMODEL_NS: &str = "http://biomodels.net/model-qualifiers/";

/// Any model element that can carry CV-term annotations.
pub trait Annotated {
    fn meta_id(&self) -> Option<&str>;
    fn set_meta_id(&mut self, meta_id: &str);
    fn cv_terms(&self) -> &[CvTerm];
    fn add_cv_term(&mut self, term: CvTerm);
}

/// A single CV term: one qualifier and the resource URIs it qualifies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CvTerm {
    pub qualifier: Qualifier,
    pub resources: Vec<String>,
}

impl CvTerm {
    pub fn new(qualifier: Qualifier, resource: impl Into<String>) -> Self {
        Self {
            qualifier,
            resources: vec![resource.into()],
        }
    }
}

/// MIRIAM annotation qualifier, either biological (`bqbiol:*`) or
/// model-level (`bqmodel:*`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Qualifier {
    Biological(BiologicalQualifier),
    Model(ModelQualifier),
}

impl Qualifier {
    /// XML prefix and element name of the qualifier.
    pub fn tag(&self) -> (&'static str, &str) {
        match self {
            Qualifier::Biological(q) => ("bqbiol", q.tag()),
            Qualifier::Model(q) => ("bqmodel", q.tag()),
        }
    }
}

/// Biological qualifiers from the biomodels.net vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum BiologicalQualifier {
    Is,
    HasPart,
    IsPartOf,
    IsVersionOf,
    HasVersion,
    IsHomologTo,
    IsDescribedBy,
    IsEncodedBy,
    Encodes,
    OccursIn,
    HasProperty,
    IsPropertyOf,
    HasTaxon,
    Other(String),
}

impl BiologicalQualifier {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "is" => Self::Is,
            "hasPart" => Self::HasPart,
            "isPartOf" => Self::IsPartOf,
            "isVersionOf" => Self::IsVersionOf,
            "hasVersion" => Self::HasVersion,
            "isHomologTo" => Self::IsHomologTo,
            "isDescribedBy" => Self::IsDescribedBy,
            "isEncodedBy" => Self::IsEncodedBy,
            "encodes" => Self::Encodes,
            "occursIn" => Self::OccursIn,
            "hasProperty" => Self::HasProperty,
            "isPropertyOf" => Self::IsPropertyOf,
            "hasTaxon" => Self::HasTaxon,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Is => "is",
            Self::HasPart => "hasPart",
            Self::IsPartOf => "isPartOf",
            Self::IsVersionOf => "isVersionOf",
            Self::HasVersion => "hasVersion",
            Self::IsHomologTo => "isHomologTo",
            Self::IsDescribedBy => "isDescribedBy",
            Self::IsEncodedBy => "isEncodedBy",
            Self::Encodes => "encodes",
            Self::OccursIn => "occursIn",
            Self::HasProperty => "hasProperty",
            Self::IsPropertyOf => "isPropertyOf",
            Self::HasTaxon => "hasTaxon",
            Self::Other(tag) => tag,
        }
    }
}

/// Model qualifiers from the biomodels.net vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ModelQualifier {
    Is,
    IsDerivedFrom,
    IsDescribedBy,
    IsInstanceOf,
    HasInstance,
    Other(String),
}

impl ModelQualifier {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "is" => Self::Is,
            "isDerivedFrom" => Self::IsDerivedFrom,
            "isDescribedBy" => Self::IsDescribedBy,
            "isInstanceOf" => Self::IsInstanceOf,
            "hasInstance" => Self::HasInstance,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Is => "is",
            Self::IsDerivedFrom => "isDerivedFrom",
            Self::IsDescribedBy => "isDescribedBy",
            Self::IsInstanceOf => "isInstanceOf",
            Self::HasInstance => "hasInstance",
            Self::Other(tag) => tag,
        }
    }
}

/// Splits an XML qualified name into prefix and local parts.
fn split_qname(qname: &[u8]) -> (Option<&[u8]>, &[u8]) {
    match qname.iter().position(|b| *b == b':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

fn qualifier_from_qname(qname: &[u8]) -> Option<Qualifier> {
    let (prefix, local) = split_qname(qname);
    let local = String::from_utf8_lossy(local).into_owned();
    match prefix {
        Some(b"bqbiol") => Some(Qualifier::Biological(BiologicalQualifier::from_tag(&local))),
        Some(b"bqmodel") => Some(Qualifier::Model(ModelQualifier::from_tag(&local))),
        _ => None,
    }
}

/// Parses the content of an `<annotation>` element into CV terms. The caller
/// must already have consumed the opening tag; parsing stops at the matching
/// `</annotation>`. Foreign annotation content is skipped.
pub(crate) fn parse_annotation(reader: &mut Reader<&[u8]>) -> Result<Vec<CvTerm>, SbmlError> {
    let mut terms = Vec::new();
    let mut current: Option<CvTerm> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let qname = e.name().as_ref().to_vec();
                if let Some(qualifier) = qualifier_from_qname(&qname) {
                    current = Some(CvTerm {
                        qualifier,
                        resources: Vec::new(),
                    });
                } else {
                    match e.local_name().as_ref() {
                        b"RDF" | b"Description" | b"Bag" => {}
                        b"li" => collect_resource(&e, &mut current)?,
                        // foreign sub-tree inside the annotation, skip whole
                        _ if current.is_none() => {
                            reader.read_to_end(e.name())?;
                        }
                        _ => {}
                    }
                }
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"li" {
                    collect_resource(&e, &mut current)?;
                }
            }
            Event::End(e) => {
                let qname = e.name().as_ref().to_vec();
                if e.local_name().as_ref() == b"annotation" {
                    return Ok(terms);
                }
                if qualifier_from_qname(&qname).is_some() {
                    if let Some(term) = current.take() {
                        terms.push(term);
                    }
                }
            }
            Event::Eof => return Err(SbmlError::UnexpectedEof("annotation".into())),
            _ => {}
        }
    }
}

fn collect_resource(e: &BytesStart, current: &mut Option<CvTerm>) -> Result<(), SbmlError> {
    if let Some(term) = current {
        let resource = match attr_value(e, b"rdf:resource")? {
            Some(r) => Some(r),
            None => attr_value(e, b"resource")?,
        };
        if let Some(resource) = resource {
            term.resources.push(resource);
        }
    }
    Ok(())
}

/// Writes an `<annotation>` block with an RDF description of the CV terms.
pub(crate) fn write_annotation<W: Write>(
    writer: &mut Writer<W>,
    meta_id: Option<&str>,
    terms: &[CvTerm],
) -> Result<(), SbmlError> {
    if terms.is_empty() {
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("annotation")))?;

    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", RDF_NS));
    rdf.push_attribute(("xmlns:bqbiol", BQBIOL_NS));
    rdf.push_attribute(("xmlns:bqmodel", BQMODEL_NS));
    writer.write_event(Event::Start(rdf))?;

    let mut description = BytesStart::new("rdf:Description");
    if let Some(meta_id) = meta_id {
        description.push_attribute(("rdf:about", format!("#{}", meta_id).as_str()));
    }
    writer.write_event(Event::Start(description))?;

    for term in terms {
        let (prefix, local) = term.qualifier.tag();
        let qname = format!("{}:{}", prefix, local);
        writer.write_event(Event::Start(BytesStart::new(qname.as_str())))?;
        writer.write_event(Event::Start(BytesStart::new("rdf:Bag")))?;
        for resource in &term.resources {
            let mut li = BytesStart::new("rdf:li");
            li.push_attribute(("rdf:resource", resource.as_str()));
            writer.write_event(Event::Empty(li))?;
        }
        writer.write_event(Event::End(BytesEnd::new("rdf:Bag")))?;
        writer.write_event(Event::End(BytesEnd::new(qname.as_str())))?;
    }

    writer.write_event(Event::End(BytesEnd::new("rdf:Description")))?;
    writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
    writer.write_event(Event::End(BytesEnd::new("annotation")))?;
    Ok(())
}

/// One annotation to attach: the id of the target element, the qualifier,
/// and the resource URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementAnnotation {
    /// Id of the species, reaction, compartment, or parameter to annotate.
    pub element: String,
    pub qualifier: Qualifier,
    pub resource: String,
}

/// Appends CV terms to elements of the document, addressed by id. Elements
/// without a meta id get a default `<id>_meta` one so the RDF description
/// has something to point at.
///
/// # Errors
///
/// Returns [`SbmlError::UnknownElement`] if an id does not resolve to an
/// annotatable element of the model.
pub fn append_annotations(
    doc: &mut SbmlDocument,
    annotations: &[ElementAnnotation],
) -> Result<(), SbmlError> {
    let model = doc.model.as_mut().ok_or(SbmlError::MissingModel)?;

    for annotation in annotations {
        let element = find_annotated_mut(model, &annotation.element)
            .ok_or_else(|| SbmlError::UnknownElement(annotation.element.clone()))?;
        if element.meta_id().is_none() {
            element.set_meta_id(&format!("{}_meta", annotation.element));
        }
        element.add_cv_term(CvTerm::new(
            annotation.qualifier.clone(),
            annotation.resource.clone(),
        ));
    }
    Ok(())
}

/// Resolves an element id to its annotatable element, searching species,
/// reactions, compartments, parameters, and finally the model itself.
fn find_annotated_mut<'m>(
    model: &'m mut crate::sbml::schema::Model,
    id: &str,
) -> Option<&'m mut dyn Annotated> {
    if let Some(pos) = model.species.iter().position(|s| s.id == id) {
        return Some(&mut model.species[pos]);
    }
    if let Some(pos) = model.reactions.iter().position(|r| r.id == id) {
        return Some(&mut model.reactions[pos]);
    }
    if let Some(pos) = model.compartments.iter().position(|c| c.id == id) {
        return Some(&mut model.compartments[pos]);
    }
    if let Some(pos) = model.parameters.iter().position(|p| p.id == id) {
        return Some(&mut model.parameters[pos]);
    }
    if model.id == id {
        return Some(model);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbml::reader;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_cv_terms() {
        let xml = r##"
            <sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
              <model id="m">
                <listOfSpecies>
                  <species id="glu" metaid="glu_meta" compartment="c">
                    <annotation>
                      <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
                               xmlns:bqbiol="http://biomodels.net/biology-qualifiers/">
                        <rdf:Description rdf:about="#glu_meta">
                          <bqbiol:is>
                            <rdf:Bag>
                              <rdf:li rdf:resource="http://identifiers.org/chebi/CHEBI:17234"/>
                            </rdf:Bag>
                          </bqbiol:is>
                        </rdf:Description>
                      </rdf:RDF>
                    </annotation>
                  </species>
                </listOfSpecies>
              </model>
            </sbml>
        "##;

        let doc = reader::from_str(xml).unwrap();
        let species = &doc.model.unwrap().species[0];
        assert_eq!(species.cv_terms.len(), 1);
        assert_eq!(
            species.cv_terms[0].qualifier,
            Qualifier::Biological(BiologicalQualifier::Is)
        );
        assert_eq!(
            species.cv_terms[0].resources,
            vec!["http://identifiers.org/chebi/CHEBI:17234".to_string()]
        );
    }

    #[test]
    fn test_append_annotations_sets_default_meta_id() {
        let xml = r#"
            <sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
              <model id="m">
                <listOfCompartments>
                  <compartment id="c"/>
                </listOfCompartments>
                <listOfSpecies>
                  <species id="glu" compartment="c"/>
                </listOfSpecies>
              </model>
            </sbml>
        "#;

        let mut doc = reader::from_str(xml).unwrap();
        append_annotations(
            &mut doc,
            &[ElementAnnotation {
                element: "glu".into(),
                qualifier: Qualifier::Biological(BiologicalQualifier::Is),
                resource: "http://identifiers.org/chebi/CHEBI:17234".into(),
            }],
        )
        .unwrap();

        let species = &doc.model.as_ref().unwrap().species[0];
        assert_eq!(species.meta_id.as_deref(), Some("glu_meta"));
        assert_eq!(species.cv_terms.len(), 1);
    }

    #[test]
    fn test_append_annotations_unknown_element() {
        let mut doc = reader::from_str(
            r#"<sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
                 <model id="m"/>
               </sbml>"#,
        )
        .unwrap();

        let err = append_annotations(
            &mut doc,
            &[ElementAnnotation {
                element: "missing".into(),
                qualifier: Qualifier::Biological(BiologicalQualifier::Is),
                resource: "http://identifiers.org/chebi/CHEBI:1".into(),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, SbmlError::UnknownElement(_)));
    }
}
