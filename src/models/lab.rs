use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::LabCategory;

/// Inclusive "normal" interval for a lab test, in its canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

impl ReferenceRange {
    pub fn new(min: f64, max: f64, unit: &str) -> Self {
        Self {
            min,
            max,
            unit: unit.to_string(),
        }
    }

    /// Strictly below `min` or strictly above `max`. The bounds themselves are normal.
    pub fn is_abnormal(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }
}

/// One lab value recognised in a document. Produced per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResultRecord {
    pub test_name: String,
    pub value: f64,
    /// Canonical unit of the reference range, not the spelling found in the text.
    pub unit: String,
    pub reference_min: f64,
    pub reference_max: f64,
    pub is_abnormal: bool,
    pub date: NaiveDate,
    pub category: LabCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_not_abnormal() {
        let range = ReferenceRange::new(70.0, 99.0, "mg/dl");
        assert!(!range.is_abnormal(70.0));
        assert!(!range.is_abnormal(99.0));
        assert!(range.is_abnormal(69.9));
        assert!(range.is_abnormal(99.1));
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = LabResultRecord {
            test_name: "Glucose".into(),
            value: 105.0,
            unit: "mg/dl".into(),
            reference_min: 70.0,
            reference_max: 99.0,
            is_abnormal: true,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            category: LabCategory::Glucose,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["testName"], "Glucose");
        assert_eq!(json["referenceMin"], 70.0);
        assert_eq!(json["referenceMax"], 99.0);
        assert_eq!(json["isAbnormal"], true);
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["category"], "glucose");
    }
}
