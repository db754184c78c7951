use std::path::PathBuf;

use thiserror::Error;

use crate::sbml::error::SbmlError;
use crate::sbml::reader;
use crate::sbml::schema::SbmlDocument;
use crate::sbml::writer::to_xml_string;

/// Loads and parses an SBML document from a file.
///
/// # Arguments
///
/// * `path` - Path to the SBML file
///
/// # Errors
///
/// Returns [`IOError::FileNotFound`] if the file cannot be read and
/// [`IOError::ParseError`] if its contents are not a valid SBML document.
pub fn load_sbml(path: impl Into<PathBuf>) -> Result<SbmlDocument, IOError> {
    let path = path.into();
    let xml = std::fs::read_to_string(path).map_err(IOError::FileNotFound)?;
    reader::from_str(&xml).map_err(IOError::ParseError)
}

/// Serializes an SBML document to a file.
///
/// # Arguments
///
/// * `path` - Path of the file to write
/// * `doc` - The document to save
///
/// # Errors
///
/// Returns [`IOError::ParseError`] if serialization fails and
/// [`IOError::FileNotFound`] if the file cannot be written.
pub fn save_sbml(path: impl Into<PathBuf>, doc: &SbmlDocument) -> Result<(), IOError> {
    let path = path.into();
    let xml = to_xml_string(doc).map_err(IOError::ParseError)?;
    std::fs::write(path, xml).map_err(IOError::FileNotFound)
}

/// Represents errors that can occur during SBML document I/O operations.
#[derive(Error, Debug)]
pub enum IOError {
    /// Indicates that the specified file could not be read or written.
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    /// Indicates that the file contents could not be parsed as SBML.
    #[error("Failed to parse SBML: {0}")]
    ParseError(#[from] SbmlError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let xml = r#"
            <sbml xmlns="http://www.sbml.org/sbml/level3/version2/core" level="3" version="2">
              <model id="io_test">
                <listOfCompartments><compartment id="c"/></listOfCompartments>
                <listOfSpecies><species id="s" compartment="c"/></listOfSpecies>
              </model>
            </sbml>
        "#;
        let doc = reader::from_str(xml).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.xml");
        save_sbml(&path, &doc).unwrap();

        let loaded = load_sbml(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_sbml("/nonexistent/model.xml").unwrap_err();
        assert!(matches!(err, IOError::FileNotFound(_)));
    }
}
