//! Command-line interface for the sbmlkit library
//!
//! This binary provides a CLI to inspect, annotate, compare, and extract
//! SBML models:
//!
//! ```bash
//! # Summarize a model
//! sbmlkit info model.xml
//!
//! # Match species of two models through the ChEBI ontology
//! sbmlkit match-species a.xml b.xml
//!
//! # Extract one reaction as a standalone sub-model
//! sbmlkit submodel model.xml --reaction J1 --output submodel.xml
//!
//! # Search BioModels for reactions annotated with an ontology term
//! sbmlkit search glucose
//! ```

use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use sbmlkit::analysis::compare::{
    matching_reactions_by_species, matching_reactions_by_uri, matching_species,
};
use sbmlkit::analysis::matcher::SpeciesMatcher;
use sbmlkit::analysis::submodel::make_submodel;
use sbmlkit::finder::ReactionFinder;
use sbmlkit::info::match_table;
use sbmlkit::io::{load_sbml, save_sbml};
use sbmlkit::ontology::biomodels::BioModelsClient;
use sbmlkit::ontology::chebi::ChebiClient;
use sbmlkit::sbml::annotations::{append_annotations, ElementAnnotation};
use sbmlkit::sbml::writer::to_xml_string;
use sbmlkit::visualization::diagram::{DiagramStyle, NetworkDiagram};
use sbmlkit::visualization::diff::DiffDiagram;

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Print a summary of an SBML model
    Info {
        /// Path to the SBML file
        path: PathBuf,
    },
    /// Attach ontology annotations to model elements
    Annotate {
        /// Path to the SBML file
        path: PathBuf,

        /// JSON file with a list of {element, qualifier, resource} entries
        #[arg(short, long)]
        map: PathBuf,

        /// Path to write the annotated model to
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Match species of two models by their ChEBI annotations
    MatchSpecies {
        /// First SBML file
        first: PathBuf,

        /// Second SBML file
        second: PathBuf,

        /// Print match records as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Override the ChEBI service base URL
        #[arg(long)]
        chebi_url: Option<String>,
    },
    /// List reactions referencing a species or a resource URI fragment
    Reactions {
        /// Path to the SBML file
        path: PathBuf,

        /// Species id to look for among reactants, products, and modifiers
        #[arg(short, long, conflicts_with = "uri")]
        species: Option<String>,

        /// Resource URI fragment to look for in annotations
        #[arg(short, long)]
        uri: Option<String>,
    },
    /// Extract one reaction into a minimal standalone sub-model
    Submodel {
        /// Path to the SBML file
        path: PathBuf,

        /// Id of the reaction to extract
        #[arg(short, long)]
        reaction: String,

        /// Path to write the sub-model to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a model's network as Graphviz DOT
    Diagram {
        /// Path to the SBML file
        path: PathBuf,

        /// Path to write the DOT text to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a two-model diff diagram as Graphviz DOT
    Diff {
        /// First SBML file
        first: PathBuf,

        /// Second SBML file
        second: PathBuf,

        /// Path to write the DOT text to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the ChEBI service base URL
        #[arg(long)]
        chebi_url: Option<String>,
    },
    /// Search BioModels for reactions annotated with an ontology term
    Search {
        /// Free text to search the ontology for, e.g. "glucose"
        term: String,

        /// Pick an ontology id directly instead of searching, e.g. CHEBI:17234
        #[arg(long)]
        chebi_id: Option<String>,

        /// Extract this reaction (format: <model-id>:<reaction-id>) after
        /// the search and print its sub-model
        #[arg(long)]
        select: Option<String>,

        /// Override the ChEBI service base URL
        #[arg(long)]
        chebi_url: Option<String>,

        /// Override the BioModels service base URL
        #[arg(long)]
        biomodels_url: Option<String>,
    },
}

fn chebi_client(url: &Option<String>) -> ChebiClient {
    match url {
        Some(url) => ChebiClient::with_base_url(url.clone()),
        None => ChebiClient::new(),
    }
}

fn write_or_print(output: &Option<PathBuf>, content: &str) {
    match output {
        Some(path) => {
            let mut file = File::create(path).expect("Failed to create output file");
            file.write_all(content.as_bytes())
                .expect("Failed to write output file");
        }
        None => println!("{}", content),
    }
}

/// Main entry point for the CLI application
pub fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Info { path } => {
            let doc = load_sbml(path).expect("Failed to load SBML document");
            println!("{}", doc);
        }
        Commands::Annotate { path, map, output } => {
            let mut doc = load_sbml(path).expect("Failed to load SBML document");
            let file = File::open(map).expect("Failed to open annotation map");
            let annotations: Vec<ElementAnnotation> =
                serde_json::from_reader(file).expect("Failed to parse annotation map");
            append_annotations(&mut doc, &annotations).expect("Failed to annotate document");
            save_sbml(output, &doc).expect("Failed to save annotated document");
            println!(
                "{} {} annotation(s) written to {}",
                "ok:".green(),
                annotations.len(),
                output.display()
            );
        }
        Commands::MatchSpecies {
            first,
            second,
            json,
            chebi_url,
        } => {
            let doc_a = load_sbml(first).expect("Failed to load first document");
            let doc_b = load_sbml(second).expect("Failed to load second document");
            let model_a = doc_a.require_model().expect("First document has no model");
            let model_b = doc_b.require_model().expect("Second document has no model");

            let client = chebi_client(chebi_url);
            let mut matcher = SpeciesMatcher::new(&client);
            let matches = matching_species(&mut matcher, model_a, model_b);

            if matches.is_empty() {
                println!("{}", "No matching species found".yellow());
            } else if *json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&matches).expect("Failed to serialize matches")
                );
            } else {
                println!("{}", match_table(&matches));
            }
        }
        Commands::Reactions { path, species, uri } => {
            let doc = load_sbml(path).expect("Failed to load SBML document");
            let model = doc.require_model().expect("Document has no model");

            let hits = match (species, uri) {
                (Some(species_id), None) => matching_reactions_by_species(model, species_id),
                (None, Some(fragment)) => {
                    matching_reactions_by_uri(&doc, fragment).expect("Failed to match reactions")
                }
                _ => {
                    eprintln!("{}", "Provide exactly one of --species or --uri".red());
                    std::process::exit(2);
                }
            };

            if hits.is_empty() {
                println!("{}", "No matching reactions".yellow());
            }
            for reaction in hits {
                match &reaction.name {
                    Some(name) => println!("{} ({})", reaction.id, name),
                    None => println!("{}", reaction.id),
                }
            }
        }
        Commands::Submodel {
            path,
            reaction,
            output,
        } => {
            let doc = load_sbml(path).expect("Failed to load SBML document");
            let submodel = make_submodel(&doc, reaction).expect("Failed to extract sub-model");
            let xml = to_xml_string(&submodel).expect("Failed to serialize sub-model");
            write_or_print(output, &xml);
        }
        Commands::Diagram { path, output } => {
            let doc = load_sbml(path).expect("Failed to load SBML document");
            let model = doc.require_model().expect("Document has no model");
            let style = DiagramStyle {
                reaction_shape: Some("box".to_string()),
                ..Default::default()
            };
            let diagram = NetworkDiagram::from_model(model, &style);
            write_or_print(output, &diagram.to_dot());
        }
        Commands::Diff {
            first,
            second,
            output,
            chebi_url,
        } => {
            let doc_a = load_sbml(first).expect("Failed to load first document");
            let doc_b = load_sbml(second).expect("Failed to load second document");

            let client = chebi_client(chebi_url);
            let mut matcher = SpeciesMatcher::new(&client);
            let diagram = DiffDiagram::from_documents(&doc_a, &doc_b, &mut matcher)
                .expect("Failed to build diff diagram");
            write_or_print(output, &diagram.to_dot());
        }
        Commands::Search {
            term,
            chebi_id,
            select,
            chebi_url,
            biomodels_url,
        } => {
            let ontology = chebi_client(chebi_url);
            let repository = match biomodels_url {
                Some(url) => BioModelsClient::with_base_url(url.clone()),
                None => BioModelsClient::new(),
            };
            let mut finder = ReactionFinder::new(&ontology, &repository);

            let term_id = match chebi_id {
                Some(id) => id.clone(),
                None => {
                    let terms = finder.search_terms(term).expect("Ontology search failed");
                    if terms.is_empty() {
                        println!("{} no ontology terms match '{}'", "note:".yellow(), term);
                        return;
                    }
                    for entity in terms {
                        println!("{} ({})", entity.chebi_id.bold(), entity.chebi_ascii_name);
                    }
                    terms[0].chebi_id.clone()
                }
            };

            println!("Searching models annotated with {}", term_id.bold());
            let hits = finder
                .find_reactions(&term_id)
                .expect("Repository search failed")
                .to_vec();
            if hits.is_empty() {
                println!("No biomodels containing {}", term_id);
                return;
            }
            for hit in &hits {
                match &hit.reaction_name {
                    Some(name) => println!("{}: {} ({})", hit.model_id, hit.reaction_id, name),
                    None => println!("{}: {}", hit.model_id, hit.reaction_id),
                }
            }

            if let Some(selection) = select {
                let (model_id, reaction_id) = selection
                    .split_once(':')
                    .expect("Selection must be <model-id>:<reaction-id>");
                let extracted = finder
                    .select(model_id, reaction_id)
                    .expect("Failed to extract sub-model");
                println!("{}", extracted.xml);
                println!("{}", extracted.dot);
            }
        }
    }
}
