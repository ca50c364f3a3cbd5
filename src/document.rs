//! Source documents, chunks, and the maane record shape.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata keys the pipeline reads.
pub mod meta {
    /// Origin identifier (source file path).
    pub const SOURCE: &str = "source";
    /// Loader kind: `text` or `json`.
    pub const TYPE: &str = "type";
    /// Originating record position within a JSON source.
    pub const INDEX: &str = "index";
    /// Population tag used as a retrieval pre-filter.
    pub const POPULATION: &str = "אוכלוסיה";
    /// Maane record identifier.
    pub const CODE_MAANE: &str = "code_maane";
    /// Maane display name.
    pub const NAME_MAANE: &str = "name_maane";
    /// Rendered budget descriptors of a maane.
    pub const BUDGETS: &str = "budgetsOfMaane";
}

/// Coarse classification of a source record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Population {
    Institution,
    Authority,
    District,
}

impl Population {
    /// Wire value stored under the [`meta::POPULATION`] metadata key.
    pub fn as_str(self) -> &'static str {
        match self {
            Population::Institution => "מוסד",
            Population::Authority => "רשות",
            Population::District => "מחוז",
        }
    }
}

/// Assigns a population tag to a record from its position in the source.
///
/// Swapping the function swaps the policy without touching the loader;
/// the positional default below stands in until records carry a real
/// population field.
pub type PopulationClassifier = fn(usize) -> Population;

/// Default bucketing: first ten records institutional, next ten
/// authority, the rest district.
pub fn positional_population(index: usize) -> Population {
    if index < 10 {
        Population::Institution
    } else if index < 20 {
        Population::Authority
    } else {
        Population::District
    }
}

/// A normalized text unit with attached structured metadata.
///
/// Produced by the loader (one per source record) or by the chunker (one
/// per window of a source document). Metadata is set at creation and
/// never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: FxHashMap<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: FxHashMap::default(),
        }
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String view of a metadata value, if present and textual.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// A bounded substring of a document, the unit embedded and retrieved.
///
/// Structurally identical to [`Document`]; the alias marks which side of
/// the chunker a value sits on.
pub type Chunk = Document;

/// One maane record as it appears in the production source file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaaneRecord {
    #[serde(rename = "שם_מענה")]
    pub name: String,
    #[serde(rename = "קוד_מענה")]
    pub code: Value,
    #[serde(rename = "תקציבים_מהם_ניתן_לקנות_את_המענה", default)]
    pub budgets: Vec<BudgetRef>,
}

impl MaaneRecord {
    /// The text indexed for this record: name, code, and the budget
    /// lines joined with `" | "`.
    pub fn searchable_text(&self) -> String {
        let budgets = self
            .budgets
            .iter()
            .map(BudgetRef::render)
            .collect::<Vec<_>>()
            .join(" | ");
        format!("{}\n{}\n{}", self.name, self.code_text(), budgets)
    }

    pub fn code_text(&self) -> String {
        scalar_text(&self.code)
    }

    /// Budget descriptors as stored under [`meta::BUDGETS`].
    pub fn budget_lines(&self) -> Vec<String> {
        self.budgets.iter().map(BudgetRef::render).collect()
    }
}

/// A budget a maane can be purchased from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BudgetRef {
    #[serde(rename = "קוד_תקציב")]
    pub code: Value,
    #[serde(rename = "שם_תקציב")]
    pub name: String,
}

impl BudgetRef {
    /// `"<code> <name>"` as it appears in the searchable text.
    pub fn render(&self) -> String {
        format!("{} {}", scalar_text(&self.code), self.name)
    }
}

// Source files carry codes as either strings or bare numbers.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
