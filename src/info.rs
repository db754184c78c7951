//! Human-readable summaries of documents and match reports.
//!
//! Implements `Display` for [`SbmlDocument`] and provides table formatting
//! for species match records, used by the CLI.

use std::fmt::{self, Display};

use tabled::{builder::Builder, settings::Style};

use crate::analysis::matcher::SpeciesMatch;
use crate::sbml::schema::{Reaction, SbmlDocument, Species};

/// Trait for converting model components to table records
trait TableRecord {
    /// Get the column headers for the table
    fn columns() -> Vec<String>;

    /// Convert the instance to a record for display in a table
    fn to_record(&self) -> Vec<String>;
}

impl Display for SbmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();

        let Some(model) = &self.model else {
            return write!(f, "SBML L{}V{} document without a model", self.level, self.version);
        };

        builder.push_record(vec![format!(
            "SBML L{}V{} model '{}'",
            self.level, self.version, model.id
        )]);

        if !model.species.is_empty() {
            builder.push_record(vec!["Species".to_string()]);
            builder.push_record(vec![to_table(&model.species)]);
        }

        if !model.reactions.is_empty() {
            builder.push_record(vec!["Reactions".to_string()]);
            builder.push_record(vec![to_table(&model.reactions)]);
        }

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{}", table)
    }
}

impl TableRecord for Species {
    fn columns() -> Vec<String> {
        vec![
            "ID".to_string(),
            "Name".to_string(),
            "Compartment".to_string(),
            "Annotations".to_string(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            self.compartment.clone(),
            self.cv_terms
                .iter()
                .map(|t| t.resources.len())
                .sum::<usize>()
                .to_string(),
        ]
    }
}

impl TableRecord for Reaction {
    fn columns() -> Vec<String> {
        vec![
            "ID".to_string(),
            "Name".to_string(),
            "Reactants".to_string(),
            "Products".to_string(),
            "Modifiers".to_string(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        let join = |refs: Vec<&str>| refs.join(", ");
        vec![
            self.id.clone(),
            self.name.clone().unwrap_or_default(),
            join(self.reactants.iter().map(|r| r.species.as_str()).collect()),
            join(self.products.iter().map(|p| p.species.as_str()).collect()),
            join(self.modifiers.iter().map(|m| m.species.as_str()).collect()),
        ]
    }
}

impl Display for SpeciesMatch {
    /// One line per relation kind, in the style of a comparison report:
    /// `a exactly matches b`, `child is a parent`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if let Some(entry) = self.exact.first() {
            lines.push(format!("{} exactly matches {}", entry.id, self.id));
        }
        if let Some(entry) = self.parents.first() {
            lines.push(format!("{} {} {}", entry.id, entry.data.relation_type, self.id));
        }
        if let Some(entry) = self.children.first() {
            lines.push(format!("{} {} {}", entry.id, entry.data.relation_type, self.id));
        }
        write!(f, "{}", lines.join("\n"))
    }
}

fn to_table<T: TableRecord>(records: &[T]) -> String {
    let mut builder = Builder::default();
    builder.push_record(T::columns());
    for record in records {
        builder.push_record(record.to_record());
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Formats species match records as one table.
pub fn match_table(matches: &[SpeciesMatch]) -> String {
    let mut builder = Builder::default();
    builder.push_record(vec!["Species", "Entity", "Exact", "Children", "Parents"]);
    for record in matches {
        builder.push_record(vec![
            record.id.clone(),
            record.chebi_name.clone(),
            record
                .exact
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            record
                .children
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            record
                .parents
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}
