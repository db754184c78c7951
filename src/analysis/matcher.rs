//! ChEBI relationship matching between two annotated species.
//!
//! Two historical variants of this matcher existed; the one implemented here
//! returns immediately on an exact identifier match and detects parent/child
//! relations from both directions: the subject entity's own relation lists,
//! cross-checked against reciprocal "is a" declarations on the counterpart
//! entity. See DESIGN.md for the rationale.

use std::collections::HashMap;

use log::{debug, warn};
use serde::Serialize;

use crate::analysis::annotations::chebi_id;
use crate::ontology::client::{OntologyClient, OntologyEntity, OntologyRelation};
use crate::sbml::schema::Species;

/// Relation type used for reciprocal parent/child detection.
const IS_A: &str = "is a";

/// An exact-identifier match entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExactEntry {
    /// Id of the counterpart species.
    pub id: String,
}

/// A parent or child match entry, carrying the declared ontology relation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelationEntry {
    /// Id of the counterpart species.
    pub id: String,
    /// The ontology relation connecting the two entities.
    pub data: OntologyRelation,
}

/// The result of comparing one species against another.
///
/// `exact`, `children`, and `parents` are mutually informative, not mutually
/// exclusive; callers must check all three. A record with no entry in any of
/// them carries no meaningful match and should be discarded.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpeciesMatch {
    /// Id of the subject species (from the first model).
    pub id: String,
    /// Display name of the subject's ontology entity.
    pub chebi_name: String,
    pub exact: Vec<ExactEntry>,
    pub children: Vec<RelationEntry>,
    pub parents: Vec<RelationEntry>,
}

impl SpeciesMatch {
    /// Whether any of the three entry lists is non-empty.
    pub fn is_meaningful(&self) -> bool {
        !(self.exact.is_empty() && self.children.is_empty() && self.parents.is_empty())
    }
}

/// Matches species pairs through an [`OntologyClient`], memoizing entity
/// lookups per identifier. Pairwise matching over two models is quadratic in
/// remote calls without the cache; with it, each distinct identifier costs
/// one round trip.
pub struct SpeciesMatcher<'a> {
    client: &'a dyn OntologyClient,
    cache: HashMap<String, Option<OntologyEntity>>,
}

impl<'a> SpeciesMatcher<'a> {
    pub fn new(client: &'a dyn OntologyClient) -> Self {
        Self {
            client,
            cache: HashMap::new(),
        }
    }

    /// Cached entity lookup. Lookup failures are logged and remembered as
    /// negative entries so a flaky identifier is not retried for every pair.
    fn entity(&mut self, id: &str) -> Option<OntologyEntity> {
        if let Some(cached) = self.cache.get(id) {
            return cached.clone();
        }
        let fetched = match self.client.complete_entity(id) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!("ontology lookup for {} failed: {}", id, e);
                None
            }
        };
        self.cache.insert(id.to_string(), fetched.clone());
        fetched
    }

    /// Compares two species by their ChEBI annotations.
    ///
    /// Returns `None` when either species has no resolvable ChEBI identifier
    /// or a required ontology lookup fails; both are "no match", not errors,
    /// so batch comparisons proceed past individual failures.
    pub fn match_species(&mut self, s1: &Species, s2: &Species) -> Option<SpeciesMatch> {
        let ch1 = chebi_id(s1)?;
        let ch2 = chebi_id(s2)?;

        debug!(
            "comparing {} ({}) with {} ({})",
            s1.id, ch1, s2.id, ch2
        );

        if ch1 == ch2 {
            // Identical identifiers need no relation lookup; the entity is
            // only fetched for its display name and may fail harmlessly.
            let chebi_name = self
                .entity(&ch1)
                .map(|e| e.chebi_ascii_name)
                .unwrap_or_else(|| ch1.clone());
            return Some(SpeciesMatch {
                id: s1.id.clone(),
                chebi_name,
                exact: vec![ExactEntry { id: s2.id.clone() }],
                children: Vec::new(),
                parents: Vec::new(),
            });
        }

        let entity1 = self.entity(&ch1)?;
        let entity2 = self.entity(&ch2)?;

        let mut children: Vec<RelationEntry> = entity1
            .children
            .iter()
            .filter(|c| c.chebi_id == ch2)
            .map(|c| RelationEntry {
                id: s2.id.clone(),
                data: c.clone(),
            })
            .collect();
        if children.is_empty() {
            // Reciprocal direction: the counterpart declares "is a" subject.
            children.extend(
                entity2
                    .parents
                    .iter()
                    .filter(|p| p.chebi_id == ch1 && p.relation_type == IS_A)
                    .map(|p| RelationEntry {
                        id: s2.id.clone(),
                        data: p.clone(),
                    }),
            );
        }

        let mut parents: Vec<RelationEntry> = entity1
            .parents
            .iter()
            .filter(|p| p.chebi_id == ch2)
            .map(|p| RelationEntry {
                id: s2.id.clone(),
                data: p.clone(),
            })
            .collect();
        if parents.is_empty() {
            reciprocal_parents(&entity2, &ch1, &s2.id, &mut parents);
        }

        Some(SpeciesMatch {
            id: s1.id.clone(),
            chebi_name: entity1.chebi_ascii_name,
            exact: Vec::new(),
            children,
            parents,
        })
    }
}

/// Records a parent relation when the counterpart entity declares the
/// subject among its "is a" children.
fn reciprocal_parents(
    entity2: &OntologyEntity,
    ch1: &str,
    counterpart_id: &str,
    parents: &mut Vec<RelationEntry>,
) {
    parents.extend(
        entity2
            .children
            .iter()
            .filter(|c| c.chebi_id == ch1 && c.relation_type == IS_A)
            .map(|c| RelationEntry {
                id: counterpart_id.to_string(),
                data: c.clone(),
            }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::error::OntologyError;
    use crate::sbml::annotations::{BiologicalQualifier, CvTerm, Qualifier};
    use crate::sbml::schema::SpeciesBuilder;
    use pretty_assertions::assert_eq;

    /// In-memory ontology fake, keyed by ChEBI id.
    pub(crate) struct FakeOntology {
        pub entities: HashMap<String, OntologyEntity>,
    }

    impl OntologyClient for FakeOntology {
        fn complete_entity(&self, id: &str) -> Result<OntologyEntity, OntologyError> {
            self.entities
                .get(id)
                .cloned()
                .ok_or_else(|| OntologyError::MissingEntity(id.to_string()))
        }

        fn search(
            &self,
            _text: &str,
        ) -> Result<Vec<crate::ontology::client::LiteEntity>, OntologyError> {
            Ok(Vec::new())
        }
    }

    fn annotated_species(id: &str, chebi: &str) -> Species {
        let mut species = SpeciesBuilder::default()
            .id(id)
            .compartment("c")
            .build()
            .unwrap();
        species.cv_terms.push(CvTerm::new(
            Qualifier::Biological(BiologicalQualifier::Is),
            format!("http://identifiers.org/chebi/{}", chebi),
        ));
        species
    }

    fn relation(id: &str, name: &str, relation_type: &str) -> OntologyRelation {
        OntologyRelation {
            chebi_id: id.into(),
            chebi_name: name.into(),
            relation_type: relation_type.into(),
            status: Some("C".into()),
            cyclic: Some(false),
        }
    }

    fn glucose_ontology() -> FakeOntology {
        let mut entities = HashMap::new();
        entities.insert(
            "CHEBI:17234".to_string(),
            OntologyEntity {
                chebi_id: "CHEBI:17234".into(),
                chebi_ascii_name: "glucose".into(),
                children: vec![relation("CHEBI:4167", "D-glucopyranose", "is a")],
                parents: vec![relation("CHEBI:33917", "aldohexose", "is a")],
            },
        );
        entities.insert(
            "CHEBI:4167".to_string(),
            OntologyEntity {
                chebi_id: "CHEBI:4167".into(),
                chebi_ascii_name: "D-glucopyranose".into(),
                children: Vec::new(),
                parents: vec![relation("CHEBI:17234", "glucose", "is a")],
            },
        );
        FakeOntology { entities }
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let ontology = glucose_ontology();
        let mut matcher = SpeciesMatcher::new(&ontology);

        let s1 = annotated_species("glu_a", "CHEBI:17234");
        let s2 = annotated_species("glu_b", "CHEBI:17234");
        let result = matcher.match_species(&s1, &s2).unwrap();

        assert_eq!(result.id, "glu_a");
        assert_eq!(result.chebi_name, "glucose");
        assert_eq!(result.exact, vec![ExactEntry { id: "glu_b".into() }]);
        assert!(result.children.is_empty());
        assert!(result.parents.is_empty());
    }

    #[test]
    fn test_no_identifier_means_no_match() {
        let ontology = glucose_ontology();
        let mut matcher = SpeciesMatcher::new(&ontology);

        let s1 = SpeciesBuilder::default()
            .id("bare1")
            .compartment("c")
            .build()
            .unwrap();
        let s2 = SpeciesBuilder::default()
            .id("bare2")
            .compartment("c")
            .build()
            .unwrap();
        assert!(matcher.match_species(&s1, &s2).is_none());
    }

    #[test]
    fn test_child_relation_from_subject_entity() {
        let ontology = glucose_ontology();
        let mut matcher = SpeciesMatcher::new(&ontology);

        let s1 = annotated_species("glu", "CHEBI:17234");
        let s2 = annotated_species("glcp", "CHEBI:4167");
        let result = matcher.match_species(&s1, &s2).unwrap();

        assert!(result.exact.is_empty());
        assert_eq!(result.children.len(), 1);
        assert_eq!(result.children[0].id, "glcp");
        assert_eq!(result.children[0].data.relation_type, "is a");
    }

    #[test]
    fn test_reciprocal_is_a_detection() {
        // Subject entity lists nothing, but the counterpart declares
        // "is a" towards the subject.
        let mut entities = HashMap::new();
        entities.insert(
            "CHEBI:100".to_string(),
            OntologyEntity {
                chebi_id: "CHEBI:100".into(),
                chebi_ascii_name: "parent compound".into(),
                children: Vec::new(),
                parents: Vec::new(),
            },
        );
        entities.insert(
            "CHEBI:200".to_string(),
            OntologyEntity {
                chebi_id: "CHEBI:200".into(),
                chebi_ascii_name: "child compound".into(),
                children: Vec::new(),
                parents: vec![relation("CHEBI:100", "parent compound", "is a")],
            },
        );
        let ontology = FakeOntology { entities };
        let mut matcher = SpeciesMatcher::new(&ontology);

        let s1 = annotated_species("p", "CHEBI:100");
        let s2 = annotated_species("c", "CHEBI:200");
        let result = matcher.match_species(&s1, &s2).unwrap();

        assert_eq!(result.children.len(), 1);
        assert_eq!(result.children[0].id, "c");
        assert!(result.parents.is_empty());
    }

    #[test]
    fn test_lookup_failure_is_no_match() {
        let ontology = FakeOntology {
            entities: HashMap::new(),
        };
        let mut matcher = SpeciesMatcher::new(&ontology);

        let s1 = annotated_species("a", "CHEBI:1");
        let s2 = annotated_species("b", "CHEBI:2");
        assert!(matcher.match_species(&s1, &s2).is_none());
    }

    #[test]
    fn test_unrelated_entities_yield_empty_record() {
        let mut ontology = glucose_ontology();
        ontology.entities.insert(
            "CHEBI:999".to_string(),
            OntologyEntity {
                chebi_id: "CHEBI:999".into(),
                chebi_ascii_name: "unrelated".into(),
                ..Default::default()
            },
        );
        let mut matcher = SpeciesMatcher::new(&ontology);

        let s1 = annotated_species("glu", "CHEBI:17234");
        let s2 = annotated_species("x", "CHEBI:999");
        let result = matcher.match_species(&s1, &s2).unwrap();
        assert!(!result.is_meaningful());
    }
}
