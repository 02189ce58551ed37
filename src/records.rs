//! Task records and their JSON files
//!
//! Inputs are JSON arrays of objects; a missing or null key reads as an empty
//! string.
//! Outputs are written as indented JSON with fields in declaration order and
//! non-ASCII text kept literal.

use crate::error::{Nl2SqlError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Natural-language question to turn into SQL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationInput {
    #[serde(rename = "NL", default, deserialize_with = "null_as_empty")]
    pub nl: String,
}

/// Question plus a known-incorrect query for it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionInput {
    #[serde(rename = "NL", default, deserialize_with = "null_as_empty")]
    pub nl: String,
    #[serde(rename = "IncorrectQuery", default, deserialize_with = "null_as_empty")]
    pub incorrect_query: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    #[serde(rename = "NL")]
    pub nl: String,
    /// Empty when no query could be produced
    #[serde(rename = "Query")]
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutput {
    #[serde(rename = "NL")]
    pub nl: String,
    #[serde(rename = "IncorrectQuery")]
    pub incorrect_query: String,
    /// Empty on failure or when the response was not a SELECT
    #[serde(rename = "CorrectQuery")]
    pub correct_query: String,
}

impl GenerationOutput {
    pub fn empty_for(input: &GenerationInput) -> Self {
        Self {
            nl: input.nl.clone(),
            query: String::new(),
        }
    }
}

impl CorrectionOutput {
    pub fn empty_for(input: &CorrectionInput) -> Self {
        Self {
            nl: input.nl.clone(),
            incorrect_query: input.incorrect_query.clone(),
            correct_query: String::new(),
        }
    }
}

/// Load a JSON array of records.
///
/// Fails with `InputNotFound` when the file is absent and `InputMalformed`
/// when it is not a JSON array of objects.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(Nl2SqlError::InputNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| Nl2SqlError::InputMalformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Write records as a pretty-printed JSON array.
pub fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
