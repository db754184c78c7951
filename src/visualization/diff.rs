//! Two-model diff diagrams.
//!
//! Projects a pair of models onto one graph: elements of the first model are
//! drawn in blue, elements of the second in red, and species matched across
//! the models (per [`SpeciesMatch`] records) are drawn once, in green, with
//! a label describing the ontology relation. Edges from the second model
//! that touch a matched species are re-targeted to the merged node instead
//! of duplicating it.

use std::collections::HashMap;

use petgraph::graph::DiGraph;

use crate::analysis::compare::matching_species;
use crate::analysis::matcher::{SpeciesMatch, SpeciesMatcher};
use crate::sbml::error::SbmlError;
use crate::sbml::schema::{Model, SbmlDocument};
use crate::visualization::diagram::{
    graph_to_dot, reaction_label, species_label, DiagramEdge, DiagramNode, EdgeRole, NodeKind,
};

const FIRST_COLOR: &str = "blue";
const SECOND_COLOR: &str = "red";
const MATCH_COLOR: &str = "green";

/// A merged diff graph over two models.
pub struct DiffDiagram {
    pub graph: DiGraph<DiagramNode, DiagramEdge>,
    /// Match records keyed by first-model species id.
    by_first: HashMap<String, SpeciesMatch>,
    /// First-model counterpart for each matched second-model species id.
    by_second: HashMap<String, String>,
    index: HashMap<String, petgraph::graph::NodeIndex>,
}

impl DiffDiagram {
    /// Builds the diff graph from two models and precomputed match records.
    pub fn new(first: &Model, second: &Model, matches: &[SpeciesMatch]) -> Self {
        let mut by_first = HashMap::new();
        let mut by_second = HashMap::new();
        for record in matches {
            for entry in &record.exact {
                by_second.insert(entry.id.clone(), record.id.clone());
            }
            for entry in record.children.iter().chain(record.parents.iter()) {
                by_second.insert(entry.id.clone(), record.id.clone());
            }
            by_first.insert(record.id.clone(), record.clone());
        }

        let mut diagram = Self {
            graph: DiGraph::new(),
            by_first,
            by_second,
            index: HashMap::new(),
        };
        diagram.add_first_model(first);
        diagram.add_second_model(second);
        diagram
    }

    /// Convenience constructor that computes the species matches itself.
    pub fn from_documents(
        first: &SbmlDocument,
        second: &SbmlDocument,
        matcher: &mut SpeciesMatcher,
    ) -> Result<Self, SbmlError> {
        let first_model = first.require_model()?;
        let second_model = second.require_model()?;
        let matches = matching_species(matcher, first_model, second_model);
        Ok(Self::new(first_model, second_model, &matches))
    }

    fn add_first_model(&mut self, model: &Model) {
        for species in &model.species {
            let matched = self.by_first.get(&species.id);
            let mut label = species_label(species);
            if let Some(record) = matched {
                if let Some(description) = matched_description(record) {
                    label = format!("{} ({})", label, description);
                }
            }
            let color = if matched.is_some() {
                MATCH_COLOR
            } else {
                FIRST_COLOR
            };
            self.ensure_node(&species.id.clone(), label, NodeKind::Species, color);
        }

        for reaction in &model.reactions {
            self.add_reaction(reaction, FIRST_COLOR, false);
        }
    }

    fn add_second_model(&mut self, model: &Model) {
        for species in &model.species {
            // Matched species merge into their first-model counterpart.
            if self.by_second.contains_key(&species.id) {
                continue;
            }
            self.ensure_node(
                &species.id.clone(),
                species_label(species),
                NodeKind::Species,
                SECOND_COLOR,
            );
        }

        for reaction in &model.reactions {
            self.add_reaction(reaction, SECOND_COLOR, true);
        }
    }

    fn add_reaction(&mut self, reaction: &crate::sbml::schema::Reaction, color: &str, remap: bool) {
        let reaction_idx = self.ensure_reaction_node(reaction, color);

        for reference in &reaction.reactants {
            let species_idx = self.species_node(&reference.species, color, remap);
            self.graph.add_edge(
                species_idx,
                reaction_idx,
                DiagramEdge {
                    role: EdgeRole::Reactant,
                    color: Some(color.to_string()),
                    arrowhead: Some("none".to_string()),
                },
            );
        }
        for reference in &reaction.products {
            let species_idx = self.species_node(&reference.species, color, remap);
            self.graph.add_edge(
                reaction_idx,
                species_idx,
                DiagramEdge {
                    role: EdgeRole::Product,
                    color: Some(color.to_string()),
                    arrowhead: None,
                },
            );
        }
        for modifier in &reaction.modifiers {
            let species_idx = self.species_node(&modifier.species, color, remap);
            self.graph.add_edge(
                species_idx,
                reaction_idx,
                DiagramEdge {
                    role: EdgeRole::Modifier,
                    color: Some(color.to_string()),
                    arrowhead: Some("odot".to_string()),
                },
            );
        }
    }

    fn ensure_reaction_node(
        &mut self,
        reaction: &crate::sbml::schema::Reaction,
        color: &str,
    ) -> petgraph::graph::NodeIndex {
        let label = reaction_label(reaction);
        if let Some(idx) = self.index.get(&reaction.id) {
            return *idx;
        }
        let idx = self.graph.add_node(DiagramNode {
            id: reaction.id.clone(),
            label,
            kind: NodeKind::Reaction,
            color: Some(color.to_string()),
            shape: Some("box".to_string()),
        });
        self.index.insert(reaction.id.clone(), idx);
        idx
    }

    /// Resolves a species id to its node, applying the matched-species remap
    /// for second-model edges.
    fn species_node(
        &mut self,
        species_id: &str,
        color: &str,
        remap: bool,
    ) -> petgraph::graph::NodeIndex {
        let target_id = if remap {
            self.by_second
                .get(species_id)
                .cloned()
                .unwrap_or_else(|| species_id.to_string())
        } else {
            species_id.to_string()
        };
        if let Some(idx) = self.index.get(&target_id) {
            return *idx;
        }
        let label = target_id.clone();
        self.ensure_node(&target_id, label, NodeKind::Species, color)
    }

    fn ensure_node(
        &mut self,
        id: &str,
        label: String,
        kind: NodeKind,
        color: &str,
    ) -> petgraph::graph::NodeIndex {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(DiagramNode {
            id: id.to_string(),
            label,
            kind,
            color: Some(color.to_string()),
            shape: None,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    pub fn node_index(&self, id: &str) -> Option<petgraph::graph::NodeIndex> {
        self.index.get(id).copied()
    }

    /// Exports the merged graph as Graphviz DOT text.
    pub fn to_dot(&self) -> String {
        graph_to_dot(&self.graph, "diff")
    }
}

/// Human-readable description of a match record, used to annotate the
/// merged node's label.
fn matched_description(record: &SpeciesMatch) -> Option<String> {
    if let Some(entry) = record.children.first() {
        return Some(format!(
            "{} {} {}",
            entry.id, entry.data.relation_type, record.id
        ));
    }
    if let Some(entry) = record.parents.first() {
        return Some(format!(
            "{} {} {}",
            record.id, entry.data.relation_type, entry.id
        ));
    }
    record
        .exact
        .first()
        .map(|entry| format!("{} exactly matches {}", record.id, entry.id))
}
