use std::collections::{HashMap, HashSet};

use regex::{Regex, RegexBuilder};

use super::CatalogueError;
use crate::models::{LabCategory, ReferenceRange};

/// Default magnitude grammar: ASCII digits with an optional decimal part.
pub const DEFAULT_NUMBER_PATTERN: &str = r"[0-9]+(?:\.[0-9]+)?";

/// Uncompiled pattern-table row for one lab test.
#[derive(Debug, Clone)]
pub struct PatternEntry {
    pub key: String,
    /// Regex source for the test name, matched case-insensitively.
    pub name: String,
    /// Accepted unit spellings, matched literally and case-insensitively.
    pub units: Vec<String>,
    /// Regex source for the magnitude that precedes the unit.
    pub number: String,
    pub category: LabCategory,
}

impl PatternEntry {
    pub fn new(key: &str, name: &str, units: &[&str], category: LabCategory) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            units: units.iter().map(|u| u.to_string()).collect(),
            number: DEFAULT_NUMBER_PATTERN.to_string(),
            category,
        }
    }

    pub fn with_number_pattern(mut self, number: &str) -> Self {
        self.number = number.to_string();
        self
    }
}

/// Pattern table for the standard Brazilian lab report vocabulary.
pub fn standard_patterns() -> Vec<PatternEntry> {
    use LabCategory::*;

    vec![
        PatternEntry::new("glucose", "glicose", &["mg/dl", "mmol/l"], Glucose),
        PatternEntry::new("cholesterol", "colesterol total", &["mg/dl", "mmol/l"], Lipid),
        PatternEntry::new("hdl", "hdl", &["mg/dl", "mmol/l"], Lipid),
        PatternEntry::new("ldl", "ldl", &["mg/dl", "mmol/l"], Lipid),
        PatternEntry::new("triglycerides", "triglicerídeos", &["mg/dl", "mmol/l"], Lipid),
        PatternEntry::new("hemoglobin", "hemoglobina", &["g/dl", "g/l"], Other),
        PatternEntry::new("creatinine", "creatinina", &["mg/dl", "μmol/l"], Kidney),
        PatternEntry::new("urea", "ureia", &["mg/dl", "mmol/l"], Kidney),
        PatternEntry::new("tsh", "tsh", &["μui/ml", "mui/l"], Thyroid),
        PatternEntry::new("t4", "t4", &["ng/dl", "pmol/l"], Thyroid),
    ]
}

/// Reference-range table matching `standard_patterns`, keyed the same way.
pub fn standard_reference_ranges() -> Vec<(String, ReferenceRange)> {
    [
        ("glucose", ReferenceRange::new(70.0, 99.0, "mg/dl")),
        ("cholesterol", ReferenceRange::new(0.0, 190.0, "mg/dl")),
        ("hdl", ReferenceRange::new(40.0, 999.0, "mg/dl")),
        ("ldl", ReferenceRange::new(0.0, 130.0, "mg/dl")),
        ("triglycerides", ReferenceRange::new(0.0, 150.0, "mg/dl")),
        ("hemoglobin", ReferenceRange::new(12.0, 16.0, "g/dl")),
        ("creatinine", ReferenceRange::new(0.6, 1.2, "mg/dl")),
        ("urea", ReferenceRange::new(15.0, 45.0, "mg/dl")),
        ("tsh", ReferenceRange::new(0.4, 4.0, "μUI/ml")),
        ("t4", ReferenceRange::new(4.5, 12.0, "ng/dl")),
    ]
    .into_iter()
    .map(|(key, range)| (key.to_string(), range))
    .collect()
}

/// A compiled, immutable lab test definition.
#[derive(Debug, Clone)]
pub struct LabTestDefinition {
    pub key: String,
    /// Key with its first character upper-cased (`hdl` → `Hdl`).
    pub display_name: String,
    pub reference_range: ReferenceRange,
    pub category: LabCategory,
    name_pattern: Regex,
    measurement_pattern: Regex,
}

impl LabTestDefinition {
    /// Locates occurrences of the test name.
    pub fn name_pattern(&self) -> &Regex {
        &self.name_pattern
    }

    /// Matches `<number> <unit>` with capture groups `value` and `unit`.
    pub fn measurement_pattern(&self) -> &Regex {
        &self.measurement_pattern
    }
}

/// The frozen set of recognised lab tests, built once at startup and shared
/// by reference.
#[derive(Debug, Clone)]
pub struct LabCatalogue {
    definitions: Vec<LabTestDefinition>,
}

impl LabCatalogue {
    /// Build the standard catalogue.
    pub fn standard() -> Result<Self, CatalogueError> {
        Self::build(standard_patterns(), standard_reference_ranges())
    }

    /// Join a pattern table with a reference-range table.
    ///
    /// Both tables must carry exactly the same keys, each once. Definition
    /// order follows the pattern table.
    pub fn build(
        patterns: Vec<PatternEntry>,
        ranges: Vec<(String, ReferenceRange)>,
    ) -> Result<Self, CatalogueError> {
        let mut range_by_key: HashMap<String, ReferenceRange> = HashMap::with_capacity(ranges.len());
        for (key, range) in ranges {
            if range.min > range.max {
                return Err(CatalogueError::InvertedRange {
                    key,
                    min: range.min,
                    max: range.max,
                });
            }
            if range_by_key.insert(key.clone(), range).is_some() {
                return Err(CatalogueError::DuplicateKey(key));
            }
        }

        let mut seen = HashSet::with_capacity(patterns.len());
        let mut definitions = Vec::with_capacity(patterns.len());
        for entry in patterns {
            if !seen.insert(entry.key.clone()) {
                return Err(CatalogueError::DuplicateKey(entry.key));
            }
            let reference_range = range_by_key
                .remove(&entry.key)
                .ok_or_else(|| CatalogueError::MissingReferenceRange(entry.key.clone()))?;
            definitions.push(compile(entry, reference_range)?);
        }

        // Anything left has no pattern. Report the lexicographically first for stable errors.
        if let Some(orphan) = range_by_key.into_keys().min() {
            return Err(CatalogueError::OrphanReferenceRange(orphan));
        }

        Ok(Self { definitions })
    }

    pub fn definitions(&self) -> &[LabTestDefinition] {
        &self.definitions
    }

    pub fn get(&self, key: &str) -> Option<&LabTestDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn compile(
    entry: PatternEntry,
    reference_range: ReferenceRange,
) -> Result<LabTestDefinition, CatalogueError> {
    if entry.units.is_empty() {
        return Err(CatalogueError::NoUnits(entry.key));
    }

    let invalid = |source| CatalogueError::InvalidPattern {
        key: entry.key.clone(),
        source,
    };

    let name_pattern = RegexBuilder::new(&entry.name)
        .case_insensitive(true)
        .build()
        .map_err(invalid)?;

    let units = entry
        .units
        .iter()
        .map(|u| regex::escape(u))
        .collect::<Vec<_>>()
        .join("|");
    let measurement_pattern = RegexBuilder::new(&format!(
        r"(?P<value>{})\s*(?P<unit>{})",
        entry.number, units
    ))
    .case_insensitive(true)
    .build()
    .map_err(invalid)?;

    Ok(LabTestDefinition {
        display_name: display_name(&entry.key),
        key: entry.key,
        reference_range,
        category: entry.category,
        name_pattern,
        measurement_pattern,
    })
}

/// Upper-case the first character, keep the rest as written.
pub fn display_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
