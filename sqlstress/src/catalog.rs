//! The catalog of weighted [`CommandSequence`]s a stresstest draws from.
//!
//! Sequences are loaded once from a static file and never change afterwards. The file contains a
//! list of entries, each with an ordered list of SQL statements and a weight:
//!
//! ```json
//! [
//!   { "sequence": ["INSERT INTO t VALUES (1)"], "weight": 8 },
//!   { "name": "readback", "sequence": ["SELECT * FROM t"], "weight": 2 }
//! ]
//! ```
//!
//! Files ending in `.yaml` or `.yml` are parsed as YAML with the same structure, everything else
//! as JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use serde::Deserialize;

use crate::error::{Error, Result};

/// An ordered list of SQL statements that one worker executes as a single transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSequence {
    /// Name used to identify the sequence in logs.
    pub name: String,
    /// The statements, in execution order.
    pub statements: Vec<String>,
    /// Relative selection weight. Never negative.
    pub weight: f64,
}

impl CommandSequence {
    /// Creates a new sequence with the given name, statements and weight.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        statements: impl IntoIterator<Item = S>,
        weight: f64,
    ) -> Self {
        Self {
            name: name.into(),
            statements: statements.into_iter().map(Into::into).collect(),
            weight,
        }
    }
}

/// A single entry as it appears in the sequence file.
#[derive(Debug, Deserialize)]
struct SequenceEntry {
    #[serde(default)]
    name: Option<String>,
    sequence: Vec<String>,
    weight: f64,
}

/// An immutable, insertion-ordered collection of weighted sequences.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sequences: Vec<Arc<CommandSequence>>,
    total_weight: f64,
}

impl Catalog {
    /// Loads the catalog from a JSON or YAML sequence file.
    ///
    /// Fails with [`Error::CatalogLoad`] if the file is missing, cannot be parsed, or contains a
    /// negative or non-finite weight, or if the weights sum to infinity. An empty list is accepted
    /// here and rejected on selection.
    pub fn load(path: &Path) -> Result<Self> {
        let load_error = |context: &str, cause: Option<crate::error::DriverError>| {
            Error::CatalogLoad {
                path: path.to_owned(),
                context: context.to_owned(),
                cause,
            }
        };

        let file = File::open(path).map_err(|e| load_error("cannot open file", Some(e.into())))?;
        let reader = BufReader::new(file);

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let entries: Vec<SequenceEntry> = if is_yaml {
            serde_yaml::from_reader(reader)
                .map_err(|e| load_error("malformed YAML sequence list", Some(e.into())))?
        } else {
            serde_json::from_reader(reader)
                .map_err(|e| load_error("malformed JSON sequence list", Some(e.into())))?
        };

        let mut sequences = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                let context = format!("sequence #{index} has invalid weight {}", entry.weight);
                return Err(load_error(&context, None));
            }

            let name = entry.name.unwrap_or_else(|| format!("sequence-{index}"));
            sequences.push(CommandSequence::new(name, entry.sequence, entry.weight));
        }

        let catalog = Self::from_sequences(sequences);
        if !catalog.total_weight.is_finite() {
            return Err(load_error("total weight is not finite", None));
        }

        tracing::debug!(path = %path.display(), count = catalog.len(), "loaded sequences");
        Ok(catalog)
    }

    /// Builds a catalog from sequences that are already in memory.
    pub fn from_sequences(sequences: Vec<CommandSequence>) -> Self {
        let sequences: Vec<_> = sequences.into_iter().map(Arc::new).collect();
        let total_weight = sequences.iter().map(|s| s.weight).sum();

        Self {
            sequences,
            total_weight,
        }
    }

    /// Returns the number of sequences in the catalog.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Returns `true` if the catalog contains no sequences.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Returns the sequences in insertion order.
    pub fn sequences(&self) -> &[Arc<CommandSequence>] {
        &self.sequences
    }

    /// Picks a sequence with probability proportional to its weight.
    ///
    /// Draws a value uniformly from `[0, total_weight)` and returns the first entry whose
    /// cumulative weight exceeds it, so entries with zero weight are never picked.
    ///
    /// Fails with [`Error::DegenerateWeights`] unless the total weight is positive and finite.
    pub fn select_weighted<R: Rng>(&self, rng: &mut R) -> Result<&Arc<CommandSequence>> {
        if self.sequences.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        if !self.total_weight.is_finite() || self.total_weight <= 0.0 {
            return Err(Error::DegenerateWeights {
                total: self.total_weight,
            });
        }

        let draw = rng.random_range(0.0..self.total_weight);

        let mut cumulative = 0.0;
        for sequence in &self.sequences {
            cumulative += sequence.weight;
            if cumulative > draw {
                return Ok(sequence);
            }
        }

        // Rounding in the running sum can leave `draw` just above the last cumulative weight.
        self.sequences
            .iter()
            .rev()
            .find(|s| s.weight > 0.0)
            .ok_or(Error::DegenerateWeights {
                total: self.total_weight,
            })
    }
}
