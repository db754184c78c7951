//! Network diagrams of a single model.
//!
//! Species and reactions become nodes of a directed graph; reactant,
//! product, and modifier references become edges. Layout and rasterization
//! stay external: the graph is exported as Graphviz DOT text and any of the
//! graphviz layout engines (`neato`, `dot`, ...) can render it.

use std::collections::HashMap;
use std::fmt::Write as _;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::sbml::error::SbmlError;
use crate::sbml::reader::SbmlSource;
use crate::sbml::schema::{Model, Reaction, Species};

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Species,
    Reaction,
}

/// How an edge connects a species to a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRole {
    Reactant,
    Product,
    Modifier,
}

/// A rendered node with its display attributes.
#[derive(Debug, Clone)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub color: Option<String>,
    pub shape: Option<String>,
}

/// A rendered edge with its display attributes.
#[derive(Debug, Clone)]
pub struct DiagramEdge {
    pub role: EdgeRole,
    pub color: Option<String>,
    pub arrowhead: Option<String>,
}

/// Per-class display attributes applied while projecting a model.
#[derive(Debug, Clone)]
pub struct DiagramStyle {
    pub species_color: Option<String>,
    pub species_shape: Option<String>,
    pub reaction_color: Option<String>,
    pub reaction_shape: Option<String>,
    pub reactant_arrowhead: Option<String>,
    pub product_arrowhead: Option<String>,
    pub modifier_arrowhead: Option<String>,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self {
            species_color: None,
            species_shape: None,
            reaction_color: None,
            reaction_shape: None,
            reactant_arrowhead: None,
            product_arrowhead: None,
            // Modifier edges get a visually distinct head by default.
            modifier_arrowhead: Some("odot".to_string()),
        }
    }
}

/// A directed species/reaction graph built from one model.
pub struct NetworkDiagram {
    pub graph: DiGraph<DiagramNode, DiagramEdge>,
    index: HashMap<String, NodeIndex>,
}

impl NetworkDiagram {
    /// Builds a diagram from any accepted SBML input shape.
    pub fn from_source(
        source: impl Into<SbmlSource>,
        style: &DiagramStyle,
    ) -> Result<Self, SbmlError> {
        let doc = source.into().into_document()?;
        let model = doc.require_model()?;
        Ok(Self::from_model(model, style))
    }

    /// Builds a diagram from a model.
    pub fn from_model(model: &Model, style: &DiagramStyle) -> Self {
        let mut diagram = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };

        for species in &model.species {
            diagram.ensure_node(DiagramNode {
                id: species.id.clone(),
                label: species_label(species),
                kind: NodeKind::Species,
                color: style.species_color.clone(),
                shape: style.species_shape.clone(),
            });
        }

        for reaction in &model.reactions {
            let reaction_idx = diagram.ensure_node(DiagramNode {
                id: reaction.id.clone(),
                label: reaction_label(reaction),
                kind: NodeKind::Reaction,
                color: style.reaction_color.clone(),
                shape: style.reaction_shape.clone(),
            });

            for reference in &reaction.reactants {
                let species_idx = diagram.ensure_placeholder(&reference.species);
                diagram.graph.add_edge(
                    species_idx,
                    reaction_idx,
                    DiagramEdge {
                        role: EdgeRole::Reactant,
                        color: None,
                        arrowhead: style.reactant_arrowhead.clone(),
                    },
                );
            }
            for reference in &reaction.products {
                let species_idx = diagram.ensure_placeholder(&reference.species);
                diagram.graph.add_edge(
                    reaction_idx,
                    species_idx,
                    DiagramEdge {
                        role: EdgeRole::Product,
                        color: None,
                        arrowhead: style.product_arrowhead.clone(),
                    },
                );
            }
            for modifier in &reaction.modifiers {
                let species_idx = diagram.ensure_placeholder(&modifier.species);
                diagram.graph.add_edge(
                    species_idx,
                    reaction_idx,
                    DiagramEdge {
                        role: EdgeRole::Modifier,
                        color: None,
                        arrowhead: style.modifier_arrowhead.clone(),
                    },
                );
            }
        }

        diagram
    }

    /// Adds a node unless one with the same id already exists.
    pub(crate) fn ensure_node(&mut self, node: DiagramNode) -> NodeIndex {
        if let Some(idx) = self.index.get(&node.id) {
            return *idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Resolves an id to its node, creating a bare species node for ids that
    /// were referenced before being declared.
    fn ensure_placeholder(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        self.ensure_node(DiagramNode {
            id: id.to_string(),
            label: id.to_string(),
            kind: NodeKind::Species,
            color: None,
            shape: None,
        })
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Exports the graph as Graphviz DOT text.
    pub fn to_dot(&self) -> String {
        graph_to_dot(&self.graph, "network")
    }
}

/// Species label: prefer the name, annotated with the id; fall back to the
/// bare id.
pub(crate) fn species_label(species: &Species) -> String {
    match species.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => format!("{} ({})", name, species.id),
        None => species.id.clone(),
    }
}

pub(crate) fn reaction_label(reaction: &Reaction) -> String {
    match reaction.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => format!("{} ({})", name, reaction.id),
        None => reaction.id.clone(),
    }
}

/// Serializes any species/reaction graph as DOT.
pub(crate) fn graph_to_dot(graph: &DiGraph<DiagramNode, DiagramEdge>, name: &str) -> String {
    let mut dot = String::new();
    let _ = writeln!(dot, "digraph {} {{", name);
    let _ = writeln!(dot, "  overlap=false;");

    for node in graph.node_weights() {
        let mut attrs = vec![format!("label=\"{}\"", escape(&node.label))];
        if let Some(color) = &node.color {
            attrs.push(format!("color=\"{}\"", escape(color)));
        }
        if let Some(shape) = &node.shape {
            attrs.push(format!("shape=\"{}\"", escape(shape)));
        }
        let _ = writeln!(dot, "  \"{}\" [{}];", escape(&node.id), attrs.join(", "));
    }

    for edge in graph.edge_references() {
        let source = &graph[edge.source()].id;
        let target = &graph[edge.target()].id;
        let mut attrs = Vec::new();
        if let Some(color) = &edge.weight().color {
            attrs.push(format!("color=\"{}\"", escape(color)));
        }
        if let Some(arrowhead) = &edge.weight().arrowhead {
            attrs.push(format!("arrowhead=\"{}\"", escape(arrowhead)));
        }
        if attrs.is_empty() {
            let _ = writeln!(dot, "  \"{}\" -> \"{}\";", escape(source), escape(target));
        } else {
            let _ = writeln!(
                dot,
                "  \"{}\" -> \"{}\" [{}];",
                escape(source),
                escape(target),
                attrs.join(", ")
            );
        }
    }

    dot.push_str("}\n");
    dot
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbml::reader;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = r#"
        <sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
          <model id="m">
            <listOfCompartments>
              <compartment id="c"/>
            </listOfCompartments>
            <listOfSpecies>
              <species id="glu" name="glucose" compartment="c"/>
              <species id="g6p" compartment="c"/>
              <species id="hk" compartment="c"/>
            </listOfSpecies>
            <listOfReactions>
              <reaction id="J1" name="hexokinase">
                <listOfReactants>
                  <speciesReference species="glu"/>
                </listOfReactants>
                <listOfProducts>
                  <speciesReference species="g6p"/>
                </listOfProducts>
                <listOfModifiers>
                  <modifierSpeciesReference species="hk"/>
                </listOfModifiers>
              </reaction>
            </listOfReactions>
          </model>
        </sbml>
    "#;

    #[test]
    fn test_nodes_and_edges() {
        let doc = reader::from_str(FIXTURE).unwrap();
        let diagram =
            NetworkDiagram::from_model(doc.model.as_ref().unwrap(), &DiagramStyle::default());

        // 3 species + 1 reaction, 3 edges.
        assert_eq!(diagram.graph.node_count(), 4);
        assert_eq!(diagram.graph.edge_count(), 3);

        let glu = diagram.node_index("glu").unwrap();
        assert_eq!(diagram.graph[glu].label, "glucose (glu)");
        let j1 = diagram.node_index("J1").unwrap();
        assert_eq!(diagram.graph[j1].kind, NodeKind::Reaction);
    }

    #[test]
    fn test_dot_output() {
        let doc = reader::from_str(FIXTURE).unwrap();
        let style = DiagramStyle {
            reaction_shape: Some("box".into()),
            ..Default::default()
        };
        let diagram = NetworkDiagram::from_model(doc.model.as_ref().unwrap(), &style);
        let dot = diagram.to_dot();

        assert!(dot.starts_with("digraph network {"));
        assert!(dot.contains("\"glu\" [label=\"glucose (glu)\"];"));
        assert!(dot.contains("\"J1\" [label=\"hexokinase (J1)\", shape=\"box\"];"));
        assert!(dot.contains("\"glu\" -> \"J1\""));
        assert!(dot.contains("\"J1\" -> \"g6p\""));
        // Modifier edges carry the distinct arrowhead.
        assert!(dot.contains("\"hk\" -> \"J1\" [arrowhead=\"odot\"];"));
    }

    #[test]
    fn test_from_source_accepts_raw_xml() {
        let diagram = NetworkDiagram::from_source(FIXTURE, &DiagramStyle::default()).unwrap();
        assert_eq!(diagram.graph.node_count(), 4);
    }
}
