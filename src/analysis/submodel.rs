//! Extraction of a single reaction into a minimal standalone document.
//!
//! The sub-model carries the reaction plus the transitive closure of what
//! its math and participant list reference: species, their compartments
//! (following `outside` chains), model-level parameters named in the kinetic
//! law, function definitions called by the law, and unit definitions of any
//! collected parameter. Nothing unreferenced is copied.

use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::sbml::error::SbmlError;
use crate::sbml::math::MathNode;
use crate::sbml::schema::{KineticLaw, Model, SbmlDocument};

/// Builds a minimal document around one reaction of the source document.
///
/// # Errors
///
/// Fails with an explicit error (and no partial output) when the document
/// has no model, the reaction id does not resolve, or a participant species
/// or compartment reference dangles.
pub fn make_submodel(doc: &SbmlDocument, reaction_id: &str) -> Result<SbmlDocument, SbmlError> {
    let model = doc.require_model()?;
    let reaction = model
        .reaction_by_id(reaction_id)
        .ok_or_else(|| SbmlError::UnknownReaction(reaction_id.to_string()))?;

    // Participant species and their compartments, in reference order.
    let mut species_ids: IndexSet<String> = IndexSet::new();
    let mut compartment_seeds: IndexSet<String> = IndexSet::new();

    let participant_ids = reaction
        .reactants
        .iter()
        .chain(reaction.products.iter())
        .map(|r| r.species.clone())
        .chain(reaction.modifiers.iter().map(|m| m.species.clone()));
    for species_id in participant_ids {
        let species = model
            .species_by_id(&species_id)
            .ok_or_else(|| SbmlError::UnknownSpecies(species_id.clone()))?;
        species_ids.insert(species_id);
        if !species.compartment.is_empty() {
            compartment_seeds.insert(species.compartment.clone());
        }
    }

    // Parameters and functions referenced by the kinetic law.
    let mut parameter_ids: IndexSet<String> = IndexSet::new();
    let mut function_ids: IndexSet<String> = IndexSet::new();
    let mut unit_ids: IndexSet<String> = IndexSet::new();

    if let Some(law) = &reaction.kinetic_law {
        collect_law_parameters(model, law, &mut parameter_ids);
        collect_law_functions(model, law, &mut function_ids);

        for parameter_id in &parameter_ids {
            if let Some(parameter) = model.parameter_by_id(parameter_id) {
                if let Some(units) = &parameter.units {
                    if model.unit_definition_by_id(units).is_some() {
                        unit_ids.insert(units.clone());
                    }
                }
            }
        }
        for local in &law.local_parameters {
            if let Some(units) = &local.units {
                if model.unit_definition_by_id(units).is_some() {
                    unit_ids.insert(units.clone());
                }
            }
        }
    }

    // Compartment closure over "outside" chains. The work queue plus the
    // seen set makes chains and cycles terminate without duplicates.
    let mut compartment_ids: IndexSet<String> = IndexSet::new();
    let mut queue: VecDeque<String> = compartment_seeds.into_iter().collect();
    while let Some(compartment_id) = queue.pop_front() {
        if !compartment_ids.insert(compartment_id.clone()) {
            continue;
        }
        let compartment = model
            .compartment_by_id(&compartment_id)
            .ok_or_else(|| SbmlError::UnknownElement(compartment_id.clone()))?;
        if let Some(outside) = &compartment.outside {
            if !outside.is_empty() {
                queue.push_back(outside.clone());
            }
        }
    }

    // Assemble the new document from clones of exactly the collected
    // elements.
    let mut submodel = Model {
        id: format!("{}_{}", model.id, reaction.id),
        ..Default::default()
    };
    submodel.reactions.push(reaction.clone());
    for species_id in &species_ids {
        if let Some(species) = model.species_by_id(species_id) {
            submodel.species.push(species.clone());
        }
    }
    for parameter_id in &parameter_ids {
        if let Some(parameter) = model.parameter_by_id(parameter_id) {
            submodel.parameters.push(parameter.clone());
        }
    }
    for compartment_id in &compartment_ids {
        if let Some(compartment) = model.compartment_by_id(compartment_id) {
            submodel.compartments.push(compartment.clone());
        }
    }
    for unit_id in &unit_ids {
        if let Some(unit_def) = model.unit_definition_by_id(unit_id) {
            submodel.unit_definitions.push(unit_def.clone());
        }
    }
    for function_id in &function_ids {
        if let Some(func) = model.function_definition_by_id(function_id) {
            submodel.function_definitions.push(func.clone());
        }
    }

    let mut out = SbmlDocument::new(doc.level, doc.version);
    out.model = Some(submodel);
    Ok(out)
}

/// Collects model-level parameters named anywhere in the law's math, using
/// an explicit frontier rather than recursion.
fn collect_law_parameters(model: &Model, law: &KineticLaw, out: &mut IndexSet<String>) {
    let Some(math) = &law.math else { return };

    let mut frontier: Vec<&MathNode> = vec![math];
    while let Some(node) = frontier.pop() {
        match node {
            MathNode::Apply { args, .. } => {
                // The head is the operator or function being applied, never
                // a parameter reference.
                frontier.extend(args.iter());
            }
            MathNode::Lambda { body, .. } => frontier.push(&**body),
            MathNode::Identifier(name) => {
                if model.parameter_by_id(name).is_some() {
                    out.insert(name.clone());
                }
            }
            _ => {}
        }
    }
}

/// Collects function definitions called anywhere in the law's math, using
/// an explicit frontier rather than recursion.
fn collect_law_functions(model: &Model, law: &KineticLaw, out: &mut IndexSet<String>) {
    let Some(math) = &law.math else { return };

    let mut frontier: Vec<&MathNode> = vec![math];
    while let Some(node) = frontier.pop() {
        match node {
            MathNode::Apply { head, args } => {
                if let Some(name) = head.identifier() {
                    if model.function_definition_by_id(name).is_some() {
                        out.insert(name.to_string());
                    }
                }
                frontier.extend(args.iter());
            }
            MathNode::Lambda { body, .. } => frontier.push(&**body),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbml::reader;
    use pretty_assertions::assert_eq;

    const SOURCE: &str = r#"
        <sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
          <model id="glycolysis">
            <listOfFunctionDefinitions>
              <functionDefinition id="michaelis">
                <math xmlns="http://www.w3.org/1998/Math/MathML">
                  <lambda>
                    <bvar><ci> S </ci></bvar>
                    <bvar><ci> Km </ci></bvar>
                    <apply>
                      <divide/>
                      <ci> S </ci>
                      <apply>
                        <plus/>
                        <ci> Km </ci>
                        <ci> S </ci>
                      </apply>
                    </apply>
                  </lambda>
                </math>
              </functionDefinition>
              <functionDefinition id="unused_function">
                <math xmlns="http://www.w3.org/1998/Math/MathML">
                  <lambda>
                    <bvar><ci> x </ci></bvar>
                    <ci> x </ci>
                  </lambda>
                </math>
              </functionDefinition>
            </listOfFunctionDefinitions>
            <listOfUnitDefinitions>
              <unitDefinition id="per_second">
                <listOfUnits>
                  <unit kind="second" exponent="-1"/>
                </listOfUnits>
              </unitDefinition>
              <unitDefinition id="millimolar">
                <listOfUnits>
                  <unit kind="mole" scale="-3"/>
                  <unit kind="litre" exponent="-1"/>
                </listOfUnits>
              </unitDefinition>
              <unitDefinition id="unused_unit">
                <listOfUnits>
                  <unit kind="gram"/>
                </listOfUnits>
              </unitDefinition>
            </listOfUnitDefinitions>
            <listOfCompartments>
              <compartment id="organism"/>
              <compartment id="cell" outside="organism"/>
              <compartment id="cytosol" outside="cell"/>
              <compartment id="unrelated"/>
            </listOfCompartments>
            <listOfSpecies>
              <species id="glu" compartment="cytosol"/>
              <species id="atp" compartment="cytosol"/>
              <species id="g6p" compartment="cell"/>
              <species id="spectator" compartment="unrelated"/>
            </listOfSpecies>
            <listOfParameters>
              <parameter id="vmax" value="10" units="per_second"/>
              <parameter id="other_param" value="1" units="unused_unit"/>
            </listOfParameters>
            <listOfReactions>
              <reaction id="hexokinase">
                <listOfReactants>
                  <speciesReference species="glu"/>
                  <speciesReference species="atp"/>
                </listOfReactants>
                <listOfProducts>
                  <speciesReference species="g6p"/>
                </listOfProducts>
                <kineticLaw>
                  <math xmlns="http://www.w3.org/1998/Math/MathML">
                    <apply>
                      <times/>
                      <ci> vmax </ci>
                      <apply>
                        <ci> michaelis </ci>
                        <ci> glu </ci>
                        <ci> km_local </ci>
                      </apply>
                    </apply>
                  </math>
                  <listOfLocalParameters>
                    <localParameter id="km_local" value="0.3" units="millimolar"/>
                  </listOfLocalParameters>
                </kineticLaw>
              </reaction>
              <reaction id="isomerase">
                <listOfReactants>
                  <speciesReference species="g6p"/>
                </listOfReactants>
                <listOfProducts>
                  <speciesReference species="spectator"/>
                </listOfProducts>
              </reaction>
            </listOfReactions>
          </model>
        </sbml>
    "#;

    #[test]
    fn test_submodel_contains_exactly_the_closure() {
        let doc = reader::from_str(SOURCE).unwrap();
        let sub = make_submodel(&doc, "hexokinase").unwrap();
        let model = sub.model.unwrap();

        assert_eq!(model.id, "glycolysis_hexokinase");
        assert_eq!(model.reactions.len(), 1);
        assert_eq!(model.reactions[0].id, "hexokinase");

        let species: Vec<&str> = model.species.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(species, vec!["glu", "atp", "g6p"]);

        let params: Vec<&str> = model.parameters.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(params, vec!["vmax"]);

        let functions: Vec<&str> = model
            .function_definitions
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(functions, vec!["michaelis"]);

        // Units from the model parameter and from the law-local parameter.
        let units: Vec<&str> = model
            .unit_definitions
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(units, vec!["per_second", "millimolar"]);
    }

    #[test]
    fn test_outside_chain_is_closed_without_duplicates() {
        let doc = reader::from_str(SOURCE).unwrap();
        let sub = make_submodel(&doc, "hexokinase").unwrap();
        let model = sub.model.unwrap();

        // glu and atp share cytosol; the chain cytosol -> cell -> organism
        // is followed to the root and each compartment appears once.
        let compartments: Vec<&str> =
            model.compartments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(compartments, vec!["cytosol", "cell", "organism"]);
    }

    #[test]
    fn test_cyclic_outside_terminates() {
        let xml = r#"
            <sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
              <model id="m">
                <listOfCompartments>
                  <compartment id="a" outside="b"/>
                  <compartment id="b" outside="a"/>
                </listOfCompartments>
                <listOfSpecies>
                  <species id="s" compartment="a"/>
                </listOfSpecies>
                <listOfReactions>
                  <reaction id="r">
                    <listOfReactants>
                      <speciesReference species="s"/>
                    </listOfReactants>
                  </reaction>
                </listOfReactions>
              </model>
            </sbml>
        "#;

        let doc = reader::from_str(xml).unwrap();
        let sub = make_submodel(&doc, "r").unwrap();
        let model = sub.model.unwrap();
        assert_eq!(model.compartments.len(), 2);
    }

    #[test]
    fn test_unknown_reaction_is_fatal() {
        let doc = reader::from_str(SOURCE).unwrap();
        let err = make_submodel(&doc, "nonexistent").unwrap_err();
        assert!(matches!(err, SbmlError::UnknownReaction(_)));
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let doc = SbmlDocument::default();
        let err = make_submodel(&doc, "r").unwrap_err();
        assert!(matches!(err, SbmlError::MissingModel));
    }

    #[test]
    fn test_level_and_version_carry_over() {
        let xml = r#"
            <sbml xmlns="http://www.sbml.org/sbml/level2/version4" level="2" version="4">
              <model id="m">
                <listOfCompartments>
                  <compartment id="c"/>
                </listOfCompartments>
                <listOfSpecies>
                  <species id="s" compartment="c"/>
                </listOfSpecies>
                <listOfReactions>
                  <reaction id="r">
                    <listOfProducts>
                      <speciesReference species="s"/>
                    </listOfProducts>
                  </reaction>
                </listOfReactions>
              </model>
            </sbml>
        "#;

        let doc = reader::from_str(xml).unwrap();
        let sub = make_submodel(&doc, "r").unwrap();
        assert_eq!(sub.level, 2);
        assert_eq!(sub.version, 4);
    }
}
