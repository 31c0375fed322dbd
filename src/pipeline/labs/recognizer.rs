use serde::Serialize;

use super::catalogue::{LabCatalogue, LabTestDefinition};
use crate::clock::Clock;
use crate::models::LabResultRecord;

/// What to do with a matched value that does not parse as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Discard the match without telling the caller.
    #[default]
    Drop,
    /// Discard the match but return it in `LabScan::skipped`.
    Report,
}

/// A name + number + unit hit whose number could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedMatch {
    pub test_key: String,
    pub raw_value: String,
    pub raw_unit: String,
}

/// Outcome of one recognition pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabScan {
    pub records: Vec<LabResultRecord>,
    pub skipped: Vec<SkippedMatch>,
}

/// A `<number> <unit>` pair located after a test name.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement<'t> {
    pub raw_value: &'t str,
    pub raw_unit: &'t str,
    /// Byte offset in the scanned text just past the unit.
    pub end: usize,
}

/// Best-effort miner of lab values in free text.
///
/// Matching is loose: a test name followed, on the same line, by the first
/// `<number> <unit>` pair with an accepted unit. A reference bound printed
/// before the result is picked up as the value.
pub struct LabRecognizer<'a> {
    catalogue: &'a LabCatalogue,
    clock: &'a dyn Clock,
    policy: ParseFailurePolicy,
}

impl<'a> LabRecognizer<'a> {
    pub fn new(catalogue: &'a LabCatalogue, clock: &'a dyn Clock) -> Self {
        Self {
            catalogue,
            clock,
            policy: ParseFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ParseFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Records for every recognised value. Never fails; no match yields an empty list.
    pub fn recognize(&self, text: &str) -> Vec<LabResultRecord> {
        self.scan(text).records
    }

    /// Records in catalogue order, then text order within each test.
    pub fn scan(&self, text: &str) -> LabScan {
        let date = self.clock.today();
        let mut scan = LabScan::default();

        for definition in self.catalogue.definitions() {
            for measurement in find_measurements(definition, text) {
                let Some(value) = parse_value(measurement.raw_value) else {
                    self.skip(definition, &measurement, &mut scan);
                    continue;
                };

                let range = &definition.reference_range;
                if measurement.raw_unit.to_lowercase() != range.unit.to_lowercase() {
                    // No conversion: the canonical unit and range are reported as-is.
                    tracing::debug!(
                        test = %definition.key,
                        found_unit = measurement.raw_unit,
                        canonical_unit = %range.unit,
                        "Lab value reported in non-canonical unit"
                    );
                }

                scan.records.push(LabResultRecord {
                    test_name: definition.display_name.clone(),
                    value,
                    unit: range.unit.clone(),
                    reference_min: range.min,
                    reference_max: range.max,
                    is_abnormal: range.is_abnormal(value),
                    date,
                    category: definition.category,
                });
            }
        }

        tracing::debug!(
            records = scan.records.len(),
            skipped = scan.skipped.len(),
            text_length = text.len(),
            "Lab recognition complete"
        );

        scan
    }

    fn skip(&self, definition: &LabTestDefinition, measurement: &Measurement<'_>, scan: &mut LabScan) {
        match self.policy {
            ParseFailurePolicy::Drop => {
                tracing::debug!(
                    test = %definition.key,
                    raw_value = measurement.raw_value,
                    "Dropping lab match with unparseable value"
                );
            }
            ParseFailurePolicy::Report => {
                tracing::warn!(
                    test = %definition.key,
                    raw_value = measurement.raw_value,
                    "Lab match with unparseable value"
                );
                scan.skipped.push(SkippedMatch {
                    test_key: definition.key.clone(),
                    raw_value: measurement.raw_value.to_string(),
                    raw_unit: measurement.raw_unit.to_string(),
                });
            }
        }
    }
}

/// All non-overlapping measurements for one test, in text order.
///
/// Each occurrence of the test name is paired with the first measurement
/// starting on the rest of its line. After a hit the scan resumes past the
/// unit; after a name with no measurement it resumes past the name.
pub fn find_measurements<'t>(definition: &LabTestDefinition, text: &'t str) -> Vec<Measurement<'t>> {
    let mut found = Vec::new();
    let mut pos = 0;

    while pos <= text.len() {
        let Some(name) = definition.name_pattern().find_at(text, pos) else {
            break;
        };

        let next = match measurement_after(definition, text, name.end()) {
            Some(measurement) => {
                let end = measurement.end;
                found.push(measurement);
                end
            }
            None => name.end(),
        };

        pos = if next > pos { next } else { next_char_boundary(text, pos) };
    }

    found
}

/// The first `<number> <unit>` whose number starts before the end of the line
/// that begins at `from`. Whitespace between number and unit may span lines.
pub fn measurement_after<'t>(
    definition: &LabTestDefinition,
    text: &'t str,
    from: usize,
) -> Option<Measurement<'t>> {
    let rest = &text[from..];
    let line_len = rest.find(is_line_terminator).unwrap_or(rest.len());

    let caps = definition.measurement_pattern().captures(rest)?;
    let whole = caps.get(0)?;
    if whole.start() > line_len {
        return None;
    }

    Some(Measurement {
        raw_value: caps.name("value")?.as_str(),
        raw_unit: caps.name("unit")?.as_str(),
        end: from + whole.end(),
    })
}

/// Parse a captured magnitude. `None` for anything that is not a finite decimal.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}
