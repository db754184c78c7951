//! Writing SBML documents back to XML.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::sbml::annotations::write_annotation;
use crate::sbml::error::SbmlError;
use crate::sbml::math::write_math;
use crate::sbml::schema::{
    Compartment, FunctionDefinition, Model, Parameter, Reaction, SbmlDocument, Species,
    UnitDefinition,
};

/// Serializes a document as SBML core XML.
pub fn to_xml_string(doc: &SbmlDocument) -> Result<String, SbmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let namespace = format!(
        "http://www.sbml.org/sbml/level{}/version{}/core",
        doc.level, doc.version
    );
    let mut root = BytesStart::new("sbml");
    root.push_attribute(("xmlns", namespace.as_str()));
    root.push_attribute(("level", doc.level.to_string().as_str()));
    root.push_attribute(("version", doc.version.to_string().as_str()));
    writer.write_event(Event::Start(root))?;

    if let Some(model) = &doc.model {
        write_model(&mut writer, model)?;
    }

    writer.write_event(Event::End(BytesEnd::new("sbml")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_model<W: Write>(writer: &mut Writer<W>, model: &Model) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("model");
    if !model.id.is_empty() {
        el.push_attribute(("id", model.id.as_str()));
    }
    push_opt_attr(&mut el, "name", model.name.as_deref());
    push_opt_attr(&mut el, "metaid", model.meta_id.as_deref());
    writer.write_event(Event::Start(el))?;

    write_annotation(writer, model.meta_id.as_deref(), &model.cv_terms)?;

    if !model.function_definitions.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfFunctionDefinitions")))?;
        for func in &model.function_definitions {
            write_function_definition(writer, func)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfFunctionDefinitions")))?;
    }

    if !model.unit_definitions.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfUnitDefinitions")))?;
        for unit_def in &model.unit_definitions {
            write_unit_definition(writer, unit_def)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfUnitDefinitions")))?;
    }

    if !model.compartments.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfCompartments")))?;
        for compartment in &model.compartments {
            write_compartment(writer, compartment)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfCompartments")))?;
    }

    if !model.species.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfSpecies")))?;
        for species in &model.species {
            write_species(writer, species)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfSpecies")))?;
    }

    if !model.parameters.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfParameters")))?;
        for parameter in &model.parameters {
            write_parameter(writer, parameter)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfParameters")))?;
    }

    if !model.reactions.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfReactions")))?;
        for reaction in &model.reactions {
            write_reaction(writer, reaction)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfReactions")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("model")))?;
    Ok(())
}

fn write_species<W: Write>(writer: &mut Writer<W>, species: &Species) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("species");
    el.push_attribute(("id", species.id.as_str()));
    push_opt_attr(&mut el, "name", species.name.as_deref());
    push_opt_attr(&mut el, "metaid", species.meta_id.as_deref());
    if !species.compartment.is_empty() {
        el.push_attribute(("compartment", species.compartment.as_str()));
    }
    push_num_attr(&mut el, "initialConcentration", species.initial_concentration);
    push_num_attr(&mut el, "initialAmount", species.initial_amount);
    push_bool_attr(&mut el, "boundaryCondition", species.boundary_condition);
    push_bool_attr(&mut el, "constant", species.constant);

    if species.cv_terms.is_empty() {
        writer.write_event(Event::Empty(el))?;
    } else {
        writer.write_event(Event::Start(el))?;
        write_annotation(writer, species.meta_id.as_deref(), &species.cv_terms)?;
        writer.write_event(Event::End(BytesEnd::new("species")))?;
    }
    Ok(())
}

fn write_compartment<W: Write>(
    writer: &mut Writer<W>,
    compartment: &Compartment,
) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("compartment");
    el.push_attribute(("id", compartment.id.as_str()));
    push_opt_attr(&mut el, "name", compartment.name.as_deref());
    push_opt_attr(&mut el, "metaid", compartment.meta_id.as_deref());
    push_num_attr(&mut el, "size", compartment.size);
    push_num_attr(&mut el, "spatialDimensions", compartment.spatial_dimensions);
    push_bool_attr(&mut el, "constant", compartment.constant);
    push_opt_attr(&mut el, "outside", compartment.outside.as_deref());

    if compartment.cv_terms.is_empty() {
        writer.write_event(Event::Empty(el))?;
    } else {
        writer.write_event(Event::Start(el))?;
        write_annotation(writer, compartment.meta_id.as_deref(), &compartment.cv_terms)?;
        writer.write_event(Event::End(BytesEnd::new("compartment")))?;
    }
    Ok(())
}

fn write_parameter<W: Write>(writer: &mut Writer<W>, parameter: &Parameter) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("parameter");
    el.push_attribute(("id", parameter.id.as_str()));
    push_opt_attr(&mut el, "name", parameter.name.as_deref());
    push_opt_attr(&mut el, "metaid", parameter.meta_id.as_deref());
    push_num_attr(&mut el, "value", parameter.value);
    push_opt_attr(&mut el, "units", parameter.units.as_deref());
    push_bool_attr(&mut el, "constant", parameter.constant);

    if parameter.cv_terms.is_empty() {
        writer.write_event(Event::Empty(el))?;
    } else {
        writer.write_event(Event::Start(el))?;
        write_annotation(writer, parameter.meta_id.as_deref(), &parameter.cv_terms)?;
        writer.write_event(Event::End(BytesEnd::new("parameter")))?;
    }
    Ok(())
}

fn write_unit_definition<W: Write>(
    writer: &mut Writer<W>,
    unit_def: &UnitDefinition,
) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("unitDefinition");
    el.push_attribute(("id", unit_def.id.as_str()));
    push_opt_attr(&mut el, "name", unit_def.name.as_deref());
    push_opt_attr(&mut el, "metaid", unit_def.meta_id.as_deref());
    writer.write_event(Event::Start(el))?;

    write_annotation(writer, unit_def.meta_id.as_deref(), &unit_def.cv_terms)?;

    if !unit_def.units.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfUnits")))?;
        for unit in &unit_def.units {
            let mut unit_el = BytesStart::new("unit");
            unit_el.push_attribute(("kind", unit.kind.as_str()));
            push_num_attr(&mut unit_el, "exponent", unit.exponent);
            if let Some(scale) = unit.scale {
                unit_el.push_attribute(("scale", scale.to_string().as_str()));
            }
            push_num_attr(&mut unit_el, "multiplier", unit.multiplier);
            writer.write_event(Event::Empty(unit_el))?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfUnits")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("unitDefinition")))?;
    Ok(())
}

fn write_function_definition<W: Write>(
    writer: &mut Writer<W>,
    func: &FunctionDefinition,
) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("functionDefinition");
    el.push_attribute(("id", func.id.as_str()));
    push_opt_attr(&mut el, "name", func.name.as_deref());
    push_opt_attr(&mut el, "metaid", func.meta_id.as_deref());
    writer.write_event(Event::Start(el))?;

    write_annotation(writer, func.meta_id.as_deref(), &func.cv_terms)?;
    if let Some(math) = &func.math {
        write_math(writer, math)?;
    }

    writer.write_event(Event::End(BytesEnd::new("functionDefinition")))?;
    Ok(())
}

fn write_reaction<W: Write>(writer: &mut Writer<W>, reaction: &Reaction) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("reaction");
    el.push_attribute(("id", reaction.id.as_str()));
    push_opt_attr(&mut el, "name", reaction.name.as_deref());
    push_opt_attr(&mut el, "metaid", reaction.meta_id.as_deref());
    push_bool_attr(&mut el, "reversible", reaction.reversible);
    writer.write_event(Event::Start(el))?;

    write_annotation(writer, reaction.meta_id.as_deref(), &reaction.cv_terms)?;

    if !reaction.reactants.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfReactants")))?;
        for reference in &reaction.reactants {
            write_species_reference(writer, reference)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfReactants")))?;
    }

    if !reaction.products.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfProducts")))?;
        for reference in &reaction.products {
            write_species_reference(writer, reference)?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfProducts")))?;
    }

    if !reaction.modifiers.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("listOfModifiers")))?;
        for modifier in &reaction.modifiers {
            let mut mod_el = BytesStart::new("modifierSpeciesReference");
            mod_el.push_attribute(("species", modifier.species.as_str()));
            writer.write_event(Event::Empty(mod_el))?;
        }
        writer.write_event(Event::End(BytesEnd::new("listOfModifiers")))?;
    }

    if let Some(law) = &reaction.kinetic_law {
        writer.write_event(Event::Start(BytesStart::new("kineticLaw")))?;
        if let Some(math) = &law.math {
            write_math(writer, math)?;
        }
        if !law.local_parameters.is_empty() {
            writer.write_event(Event::Start(BytesStart::new("listOfLocalParameters")))?;
            for local in &law.local_parameters {
                let mut local_el = BytesStart::new("localParameter");
                local_el.push_attribute(("id", local.id.as_str()));
                push_opt_attr(&mut local_el, "name", local.name.as_deref());
                push_num_attr(&mut local_el, "value", local.value);
                push_opt_attr(&mut local_el, "units", local.units.as_deref());
                writer.write_event(Event::Empty(local_el))?;
            }
            writer.write_event(Event::End(BytesEnd::new("listOfLocalParameters")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("kineticLaw")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("reaction")))?;
    Ok(())
}

fn write_species_reference<W: Write>(
    writer: &mut Writer<W>,
    reference: &crate::sbml::schema::SpeciesReference,
) -> Result<(), SbmlError> {
    let mut el = BytesStart::new("speciesReference");
    el.push_attribute(("species", reference.species.as_str()));
    push_num_attr(&mut el, "stoichiometry", reference.stoichiometry);
    push_bool_attr(&mut el, "constant", reference.constant);
    writer.write_event(Event::Empty(el))?;
    Ok(())
}

fn push_opt_attr(el: &mut BytesStart, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        el.push_attribute((name, value));
    }
}

fn push_num_attr(el: &mut BytesStart, name: &str, value: Option<f64>) {
    if let Some(value) = value {
        el.push_attribute((name, value.to_string().as_str()));
    }
}

fn push_bool_attr(el: &mut BytesStart, name: &str, value: Option<bool>) {
    if let Some(value) = value {
        el.push_attribute((name, if value { "true" } else { "false" }));
    }
}
