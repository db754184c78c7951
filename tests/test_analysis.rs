#[cfg(test)]
mod test_analysis {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use sbmlkit::analysis::compare::{matching_reactions_by_species, matching_species};
    use sbmlkit::analysis::matcher::SpeciesMatcher;
    use sbmlkit::analysis::submodel::make_submodel;
    use sbmlkit::io::{load_sbml, save_sbml};
    use sbmlkit::ontology::client::{
        LiteEntity, OntologyClient, OntologyEntity, OntologyRelation,
    };
    use sbmlkit::ontology::error::OntologyError;
    use sbmlkit::prelude::from_file;

    /// In-memory stand-in for the ChEBI service with a small glucose
    /// hierarchy: CHEBI:17234 (glucose) has child CHEBI:4167.
    struct FakeOntology {
        entities: HashMap<String, OntologyEntity>,
    }

    impl FakeOntology {
        fn glucose() -> Self {
            let mut entities = HashMap::new();
            entities.insert(
                "CHEBI:17234".to_string(),
                OntologyEntity {
                    chebi_id: "CHEBI:17234".into(),
                    chebi_ascii_name: "glucose".into(),
                    children: vec![OntologyRelation {
                        chebi_id: "CHEBI:4167".into(),
                        chebi_name: "D-glucopyranose".into(),
                        relation_type: "is a".into(),
                        status: Some("C".into()),
                        cyclic: Some(false),
                    }],
                    parents: Vec::new(),
                },
            );
            entities.insert(
                "CHEBI:4167".to_string(),
                OntologyEntity {
                    chebi_id: "CHEBI:4167".into(),
                    chebi_ascii_name: "D-glucopyranose".into(),
                    children: Vec::new(),
                    parents: vec![OntologyRelation {
                        chebi_id: "CHEBI:17234".into(),
                        chebi_name: "glucose".into(),
                        relation_type: "is a".into(),
                        status: Some("C".into()),
                        cyclic: Some(false),
                    }],
                },
            );
            entities.insert(
                "CHEBI:17665".to_string(),
                OntologyEntity {
                    chebi_id: "CHEBI:17665".into(),
                    chebi_ascii_name: "alpha-D-glucose 6-phosphate".into(),
                    ..Default::default()
                },
            );
            entities.insert(
                "CHEBI:15422".to_string(),
                OntologyEntity {
                    chebi_id: "CHEBI:15422".into(),
                    chebi_ascii_name: "ATP".into(),
                    ..Default::default()
                },
            );
            Self { entities }
        }
    }

    impl OntologyClient for FakeOntology {
        fn complete_entity(&self, id: &str) -> Result<OntologyEntity, OntologyError> {
            self.entities
                .get(id)
                .cloned()
                .ok_or_else(|| OntologyError::MissingEntity(id.to_string()))
        }

        fn search(&self, _text: &str) -> Result<Vec<LiteEntity>, OntologyError> {
            Ok(Vec::new())
        }
    }

    /// Matches the species of the two fixture models and checks that
    /// exactly the glucose pair (exact) and the glucose/D-glucopyranose
    /// pair (child) survive.
    #[test]
    fn test_cross_model_species_matching() {
        // ARRANGE
        let doc_a = from_file("tests/data/glycolysis_a.xml").unwrap();
        let doc_b = from_file("tests/data/glycolysis_b.xml").unwrap();
        let ontology = FakeOntology::glucose();
        let mut matcher = SpeciesMatcher::new(&ontology);

        // ACT
        let matches = matching_species(
            &mut matcher,
            doc_a.require_model().unwrap(),
            doc_b.require_model().unwrap(),
        );

        // ASSERT
        assert_eq!(matches.len(), 2);

        let exact = matches
            .iter()
            .find(|m| !m.exact.is_empty())
            .expect("expected an exact match");
        assert_eq!(exact.id, "glu");
        assert_eq!(exact.chebi_name, "glucose");
        assert_eq!(exact.exact[0].id, "glc");
        assert!(exact.children.is_empty());
        assert!(exact.parents.is_empty());

        let child = matches
            .iter()
            .find(|m| !m.children.is_empty())
            .expect("expected a child match");
        assert_eq!(child.id, "glu");
        assert_eq!(child.children[0].id, "dglc");
        assert_eq!(child.children[0].data.relation_type, "is a");
    }

    #[test]
    fn test_reaction_filtering_by_participant() {
        let doc = from_file("tests/data/glycolysis_a.xml").unwrap();
        let model = doc.require_model().unwrap();

        // g6p sits in exactly two of the three reactions.
        let hits = matching_reactions_by_species(model, "g6p");
        let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["J1", "J2"]);
    }

    /// Extracts the hexokinase reaction and round-trips the sub-model
    /// through a file.
    #[test]
    fn test_submodel_extraction_and_roundtrip() {
        let doc = from_file("tests/data/glycolysis_a.xml").unwrap();
        let sub = make_submodel(&doc, "J1").unwrap();

        let model = sub.require_model().unwrap();
        assert_eq!(model.id, "glycolysis_a_J1");

        let species: Vec<&str> = model.species.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(species, vec!["glu", "atp", "g6p"]);

        // The whole outside chain of cytosol comes along, nothing else.
        let compartments: Vec<&str> =
            model.compartments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(compartments, vec!["cytosol", "cell", "organism"]);

        let params: Vec<&str> = model.parameters.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(params, vec!["vmax"]);
        assert_eq!(model.function_definitions.len(), 1);
        assert_eq!(model.unit_definitions.len(), 2);

        // f6p and the other reactions must not be copied.
        assert!(model.species_by_id("f6p").is_none());
        assert!(model.reaction_by_id("J2").is_none());

        // Survives serialization.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submodel.xml");
        save_sbml(&path, &sub).unwrap();
        let reloaded = load_sbml(&path).unwrap();
        assert_eq!(reloaded, sub);
    }

    /// Species annotations survive the file round trip, so matching works
    /// the same on a re-read document.
    #[test]
    fn test_annotations_survive_roundtrip() {
        let doc = from_file("tests/data/glycolysis_a.xml").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy.xml");
        save_sbml(&path, &doc).unwrap();
        let copy = load_sbml(&path).unwrap();

        let model = copy.require_model().unwrap();
        let glu = model.species_by_id("glu").unwrap();
        assert_eq!(glu.cv_terms.len(), 1);
        assert_eq!(
            glu.cv_terms[0].resources[0],
            "http://identifiers.org/chebi/CHEBI:17234"
        );
    }
}
