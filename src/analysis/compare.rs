//! Cross-model species and reaction matching.

use itertools::Itertools;

use crate::analysis::annotations::resource_uris;
use crate::analysis::matcher::{SpeciesMatch, SpeciesMatcher};
use crate::sbml::error::SbmlError;
use crate::sbml::schema::{Model, Reaction, SbmlDocument};

/// Compares every ordered species pair of the two models and keeps the
/// records that carry at least one exact, child, or parent entry.
///
/// Remote cost is at worst one ontology lookup per distinct ChEBI id thanks
/// to the matcher's memoization; the pair loop itself stays O(|A|·|B|).
pub fn matching_species(
    matcher: &mut SpeciesMatcher,
    first: &Model,
    second: &Model,
) -> Vec<SpeciesMatch> {
    first
        .species
        .iter()
        .cartesian_product(second.species.iter())
        .filter_map(|(s1, s2)| matcher.match_species(s1, s2))
        .filter(SpeciesMatch::is_meaningful)
        .collect()
}

/// Returns every reaction of the model that references the given species id
/// as reactant, product, or modifier.
pub fn matching_reactions_by_species<'m>(model: &'m Model, species_id: &str) -> Vec<&'m Reaction> {
    model
        .reactions
        .iter()
        .filter(|reaction| references_species(reaction, species_id))
        .collect()
}

fn references_species(reaction: &Reaction, species_id: &str) -> bool {
    reaction.reactants.iter().any(|r| r.species == species_id)
        || reaction.products.iter().any(|p| p.species == species_id)
        || reaction.modifiers.iter().any(|m| m.species == species_id)
}

/// Returns every reaction of the document whose own annotations, or those of
/// any participant species, carry a resource URI containing the given
/// fragment. The match is deliberately loose substring containment.
pub fn matching_reactions_by_uri<'d>(
    doc: &'d SbmlDocument,
    uri_fragment: &str,
) -> Result<Vec<&'d Reaction>, SbmlError> {
    let model = doc.require_model()?;

    let matches = model
        .reactions
        .iter()
        .filter(|reaction| {
            let mut uris = resource_uris(*reaction);
            for reference in reaction.reactants.iter().chain(reaction.products.iter()) {
                if let Some(species) = model.species_by_id(&reference.species) {
                    uris.extend(resource_uris(species));
                }
            }
            for modifier in &reaction.modifiers {
                if let Some(species) = model.species_by_id(&modifier.species) {
                    uris.extend(resource_uris(species));
                }
            }
            uris.iter().any(|uri| uri.contains(uri_fragment))
        })
        .collect();

    Ok(matches)
}
