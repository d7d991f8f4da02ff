use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field – a categorical column of the audit dataset
// ---------------------------------------------------------------------------

/// Categorical (text) columns a record can be grouped or filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    EmployeeName,
    Store,
    EntityId,
    Country,
    AuditStatus,
}

impl Field {
    /// Fields offered as filter widgets, in sidebar order.
    pub const FILTERABLE: [Field; 4] = [
        Field::Country,
        Field::Store,
        Field::EntityId,
        Field::AuditStatus,
    ];

    pub const ALL: [Field; 5] = [
        Field::EmployeeName,
        Field::Store,
        Field::EntityId,
        Field::Country,
        Field::AuditStatus,
    ];

    /// Header text of this column in the source file.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::EmployeeName => "Employee Name",
            Field::Store => "Store",
            Field::EntityId => "Entity Id",
            Field::Country => "Country",
            Field::AuditStatus => "Audit Status",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Numeric columns. The dataset carries a single score column today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericField {
    Result,
}

impl NumericField {
    pub fn column_name(self) -> &'static str {
        match self {
            NumericField::Result => "Result",
        }
    }

    /// The value of this column, `None` when the source cell was not numeric.
    pub fn get(self, record: &Record) -> Option<f64> {
        match self {
            NumericField::Result => record.result,
        }
    }
}

// ---------------------------------------------------------------------------
// AuditStatus – the canonical ordered performance tiers
// ---------------------------------------------------------------------------

/// Performance tier, ordered from worst to best.
///
/// The derived `Ord` follows declaration order, which is the stacking order
/// of every status chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "Below Expectation")]
    BelowExpectation,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    #[serde(rename = "Meets Expectation")]
    MeetsExpectation,
    #[serde(rename = "Outstanding")]
    Outstanding,
}

impl AuditStatus {
    pub fn label(self) -> &'static str {
        match self {
            AuditStatus::BelowExpectation => "Below Expectation",
            AuditStatus::NeedsImprovement => "Needs Improvement",
            AuditStatus::MeetsExpectation => "Meets Expectation",
            AuditStatus::Outstanding => "Outstanding",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A closed, explicitly ordered enumeration over the values of one field.
///
/// Grouped and stacked aggregates iterate `ALL` so that every category is
/// reported (zeros included) in a fixed order.
pub trait OrderedCategory: Copy + Ord + fmt::Display + 'static {
    /// Column the categories are read from.
    const FIELD: Field;
    const ALL: &'static [Self];

    /// Category named by `text`, or `None` when it is outside the enumeration.
    fn parse(text: &str) -> Option<Self>;

    fn of(record: &Record) -> Option<Self> {
        Self::parse(record.get(Self::FIELD))
    }
}

impl OrderedCategory for AuditStatus {
    const FIELD: Field = Field::AuditStatus;
    const ALL: &'static [Self] = &[
        AuditStatus::BelowExpectation,
        AuditStatus::NeedsImprovement,
        AuditStatus::MeetsExpectation,
        AuditStatus::Outstanding,
    ];

    /// Case-insensitive match against the canonical labels.
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.label().eq_ignore_ascii_case(text))
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the audit results
// ---------------------------------------------------------------------------

/// A single employee audit result.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub employee_name: String,
    pub store: String,
    pub entity_id: String,
    pub country: String,
    /// Raw status text; see [`OrderedCategory::of`] for the typed view.
    pub audit_status: String,
    /// Performance score (0–100). `None` when the source value was not numeric.
    pub result: Option<f64>,
}

impl Record {
    /// Text value of a categorical column.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::EmployeeName => &self.employee_name,
            Field::Store => &self.store,
            Field::EntityId => &self.entity_id,
            Field::Country => &self.country,
            Field::AuditStatus => &self.audit_status,
        }
    }
}

// ---------------------------------------------------------------------------
// RecordSet – an ordered collection with a distinct-value index
// ---------------------------------------------------------------------------

/// Records in load order, plus the sorted distinct values of every field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Record>,
    distinct: BTreeMap<Field, BTreeSet<String>>,
}

impl RecordSet {
    /// Build the distinct-value index from the records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut distinct: BTreeMap<Field, BTreeSet<String>> = BTreeMap::new();
        for rec in &records {
            for field in Field::ALL {
                distinct
                    .entry(field)
                    .or_default()
                    .insert(rec.get(field).to_string());
            }
        }
        RecordSet { records, distinct }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Sorted distinct values observed for `field`; `None` for an empty set.
    pub fn distinct(&self, field: Field) -> Option<&BTreeSet<String>> {
        self.distinct.get(&field)
    }

    /// Number of records whose score could not be parsed.
    pub fn missing_results(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_none()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
