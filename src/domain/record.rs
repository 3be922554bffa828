//! Data-dictionary records: column roles and cell coercion.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::domain::error::{DomainError, DomainResult};

/// Cell texts read as missing values.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// Largest integer an f64 represents exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// How flat dictionary rows become tree nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuilderConfig {
    /// Label of the tree root
    pub root_name: String,
    /// Columns defining the hierarchy, outermost first
    pub category_columns: Vec<String>,
    /// Columns dropped from leaf payloads
    pub excluded_columns: Vec<String>,
    /// Columns coerced to numbers
    pub numeric_columns: Vec<String>,
    /// Columns holding `TRUE`/`FALSE`
    pub boolean_columns: Vec<String>,
    /// Columns normalized to `YYYY-MM-DD`
    pub date_columns: Vec<String>,
    /// Columns split into lists
    pub array_columns: Vec<String>,
    pub array_separator: String,
    /// Column identifying a field; its presence in a payload marks a field leaf
    pub field_id_column: String,
    pub title_column: String,
    /// Column copied to the leaf `size`
    pub size_column: String,
    /// Rows per progress report while streaming
    pub chunk_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            root_name: "UKB".into(),
            category_columns: (1..=6).map(|i| format!("category_level_{i}")).collect(),
            excluded_columns: strings(&[
                "main_category",
                "is_recommended",
                "is_origin",
                "availability",
                "stability",
                "private",
                "value_type",
                "base_type",
                "item_type",
                "strata",
                "units",
                "encoding_id",
                "instance_id",
                "instance_min",
                "instance_max",
                "array_min",
                "array_max",
                "notes",
                "item_count",
                "showcase_order",
                "cost_do",
                "cost_on",
                "cost_sc",
                "category_id_x",
                "image_name",
                "description",
                "prop_participants",
                "participants",
                "prop_value_type",
                "value type",
                "prop_sexed",
                "prop_debut",
                "prop_item_count",
                "item count",
                "prop_item_type",
                "prop_instances",
                "instances",
                "prop_version",
                "prop_stability",
                "prop_strata",
                "prop_array",
                "prop_cost_tier",
                "array",
                "cost tier",
                "related_field_id",
                "category_id_y",
                "AI_description",
                "item type",
            ]),
            numeric_columns: strings(&[
                "field_id",
                "main_category",
                "availability",
                "stability",
                "private",
                "value_type",
                "base_type",
                "item_type",
                "strata",
                "instanced",
                "arrayed",
                "sexed",
                "encoding_id",
                "instance_id",
                "instance_min",
                "instance_max",
                "array_min",
                "array_max",
                "num_participants",
                "item_count",
                "showcase_order",
                "cost_do",
                "cost_on",
                "cost_sc",
                "category_id_x",
                "category_id_y",
            ]),
            boolean_columns: strings(&["is_recommended", "is_origin"]),
            date_columns: strings(&["debut", "version"]),
            array_columns: strings(&["extract_id"]),
            array_separator: ";".into(),
            field_id_column: "field_id".into(),
            title_column: "title".into(),
            size_column: "num_participants".into(),
            chunk_size: 10_000,
        }
    }
}

/// Role of a payload column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Boolean,
    Date,
    Array,
    Text,
}

#[derive(Debug, Clone)]
struct PayloadColumn {
    index: usize,
    name: String,
    kind: ColumnKind,
}

/// One dictionary row ready to be placed in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    /// Category path, outermost first, never empty
    pub categories: Vec<String>,
    /// Leaf label: `"{field_id}: {title}"`
    pub label: String,
    pub data: Map<String, Value>,
    pub size: Option<Number>,
}

/// Header-resolved plan for turning rows into [`FieldRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    category_indices: Vec<usize>,
    field_id_index: usize,
    field_id_column: String,
    title_column: String,
    size_column: String,
    payload: Vec<PayloadColumn>,
    array_separator: String,
}

impl RecordSchema {
    /// Resolve column roles against a CSV header.
    ///
    /// All category columns and the field id column must be present.
    pub fn from_header<S: AsRef<str>>(header: &[S], config: &BuilderConfig) -> DomainResult<Self> {
        let position = |column: &str| {
            header
                .iter()
                .position(|h| AsRef::<str>::as_ref(h) == column)
        };
        let require = |column: &str| {
            position(column).ok_or_else(|| DomainError::MissingColumn {
                column: column.to_string(),
            })
        };

        let category_indices = config
            .category_columns
            .iter()
            .map(|c| require(c))
            .collect::<DomainResult<Vec<_>>>()?;
        let field_id_index = require(&config.field_id_column)?;

        let contains = |list: &[String], name: &str| list.iter().any(|c| c == name);
        let payload = header
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                let name: &str = AsRef::<str>::as_ref(*name);
                !contains(&config.category_columns, name) && !contains(&config.excluded_columns, name)
            })
            .map(|(index, name)| {
                let name: &str = name.as_ref();
                let kind = if contains(&config.array_columns, name) {
                    ColumnKind::Array
                } else if contains(&config.numeric_columns, name) {
                    ColumnKind::Numeric
                } else if contains(&config.boolean_columns, name) {
                    ColumnKind::Boolean
                } else if contains(&config.date_columns, name) {
                    ColumnKind::Date
                } else {
                    ColumnKind::Text
                };
                PayloadColumn {
                    index,
                    name: name.to_string(),
                    kind,
                }
            })
            .collect();

        Ok(Self {
            category_indices,
            field_id_index,
            field_id_column: config.field_id_column.clone(),
            title_column: config.title_column.clone(),
            size_column: config.size_column.clone(),
            payload,
            array_separator: config.array_separator.clone(),
        })
    }

    /// Turn a row into a record. Rows without a first category yield `None`.
    ///
    /// Categories are read up to the first missing one.
    pub fn parse_row<S: AsRef<str>>(&self, row: &[S]) -> Option<FieldRecord> {
        let cell = |index: usize| row.get(index).map(AsRef::<str>::as_ref).unwrap_or("");

        let categories: Vec<String> = self
            .category_indices
            .iter()
            .map(|&i| cell(i))
            .take_while(|c| !is_missing(c))
            .map(str::to_string)
            .collect();
        if categories.is_empty() {
            return None;
        }

        let mut data = Map::new();
        for column in &self.payload {
            let raw = cell(column.index);
            let value = match column.kind {
                ColumnKind::Numeric => coerce_numeric(raw),
                ColumnKind::Boolean => coerce_bool(raw),
                ColumnKind::Date => coerce_date(raw),
                ColumnKind::Array => split_array(raw, &self.array_separator),
                ColumnKind::Text => coerce_text(raw),
            };
            data.insert(column.name.clone(), value);
        }

        data.insert(
            self.field_id_column.clone(),
            coerce_field_id(cell(self.field_id_index)),
        );

        let label = format!(
            "{}: {}",
            display_value(data.get(&self.field_id_column)),
            display_value(data.get(&self.title_column))
        );
        let size = data.get(&self.size_column).and_then(truncate_to_int);

        Some(FieldRecord {
            categories,
            label,
            data,
            size,
        })
    }
}

pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}

fn coerce_text(raw: &str) -> Value {
    if is_missing(raw) {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

/// Integral numbers become integers, other numbers floats, anything else stays text.
pub fn coerce_numeric(raw: &str) -> Value {
    if is_missing(raw) {
        return Value::Null;
    }
    match raw.trim().parse::<f64>() {
        Ok(n) if !n.is_finite() => Value::Null,
        Ok(n) => number_value(n),
        Err(_) => Value::String(raw.to_string()),
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

pub fn coerce_bool(raw: &str) -> Value {
    match raw.trim() {
        "TRUE" | "True" | "true" => Value::Bool(true),
        "FALSE" | "False" | "false" => Value::Bool(false),
        _ => Value::Null,
    }
}

/// Normalize recognizable dates to `YYYY-MM-DD`; unrecognized text is kept.
pub fn coerce_date(raw: &str) -> Value {
    if is_missing(raw) {
        return Value::Null;
    }
    let text = raw.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.date())
        });
    match date {
        Some(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        None => Value::String(raw.to_string()),
    }
}

/// Split a list cell; a missing cell is an empty list, empty segments are null.
pub fn split_array(raw: &str, separator: &str) -> Value {
    if is_missing(raw) {
        return Value::Array(Vec::new());
    }
    Value::Array(
        raw.split(separator)
            .map(|item| {
                if item.is_empty() {
                    Value::Null
                } else {
                    Value::String(item.to_string())
                }
            })
            .collect(),
    )
}

/// Field ids are integers when numeric (fractions truncate), else kept as-is.
pub fn coerce_field_id(raw: &str) -> Value {
    match coerce_numeric(raw) {
        number @ Value::Number(_) => truncate_to_int(&number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        other => other,
    }
}

fn truncate_to_int(value: &Value) -> Option<Number> {
    let n = value.as_number()?;
    if let Some(i) = n.as_i64() {
        return Some(Number::from(i));
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.abs() <= MAX_EXACT_INT).then(|| Number::from(f.trunc() as i64))
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn header() -> Vec<&'static str> {
        vec![
            "field_id",
            "title",
            "category_level_1",
            "category_level_2",
            "category_level_3",
            "category_level_4",
            "category_level_5",
            "category_level_6",
            "num_participants",
            "is_recommended",
            "debut",
            "extract_id",
            "notes",
            "sexed",
        ]
    }

    fn schema() -> RecordSchema {
        RecordSchema::from_header(&header(), &BuilderConfig::default()).unwrap()
    }

    #[rstest]
    #[case("12", json!(12))]
    #[case("12.0", json!(12))]
    #[case(" 3.5 ", json!(3.5))]
    #[case("1e3", json!(1000))]
    #[case("", Value::Null)]
    #[case("NA", Value::Null)]
    #[case("abc", json!("abc"))]
    fn given_numeric_cell_when_coercing_then_number_or_text(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(coerce_numeric(raw), expected);
    }

    #[rstest]
    #[case("2006-04-21", json!("2006-04-21"))]
    #[case("2006/04/21", json!("2006-04-21"))]
    #[case("2006-04-21 10:30:00", json!("2006-04-21"))]
    #[case("2006-04-21T10:30:00.5", json!("2006-04-21"))]
    #[case("not a date", json!("not a date"))]
    #[case("", Value::Null)]
    fn given_date_cell_when_coercing_then_normalized(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(coerce_date(raw), expected);
    }

    #[test]
    fn given_bool_cells_when_coercing_then_true_false_or_null() {
        assert_eq!(coerce_bool("TRUE"), json!(true));
        assert_eq!(coerce_bool("FALSE"), json!(false));
        assert_eq!(coerce_bool("maybe"), Value::Null);
    }

    #[test]
    fn given_array_cells_when_splitting_then_list() {
        assert_eq!(split_array("1;2;3", ";"), json!(["1", "2", "3"]));
        assert_eq!(split_array("1;;3", ";"), json!(["1", null, "3"]));
        assert_eq!(split_array("", ";"), json!([]));
    }

    #[test]
    fn given_fractional_field_id_when_coercing_then_truncated() {
        assert_eq!(coerce_field_id("31.9"), json!(31));
        assert_eq!(coerce_field_id("x-31"), json!("x-31"));
        assert_eq!(coerce_field_id(""), Value::Null);
    }

    #[test]
    fn given_full_row_when_parsing_then_record_built() {
        let row = [
            "31", "Sex", "Population", "Baseline", "", "Ignored", "", "", "502000", "TRUE",
            "2012-01-01", "a;b", "note", "1",
        ];
        let record = schema().parse_row(&row).unwrap();

        assert_eq!(record.categories, vec!["Population", "Baseline"]);
        assert_eq!(record.label, "31: Sex");
        assert_eq!(record.size, Some(Number::from(502000)));
        assert_eq!(record.data["field_id"], json!(31));
        assert_eq!(record.data["debut"], json!("2012-01-01"));
        assert_eq!(record.data["extract_id"], json!(["a", "b"]));
        assert_eq!(record.data["sexed"], json!(1));
        // excluded and category columns are not part of the payload
        assert!(!record.data.contains_key("notes"));
        assert!(!record.data.contains_key("is_recommended"));
        assert!(!record.data.contains_key("category_level_1"));
        // payload keeps header order
        let keys: Vec<&str> = record.data.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["field_id", "title", "num_participants", "debut", "extract_id", "sexed"]
        );
    }

    #[test]
    fn given_row_without_categories_when_parsing_then_skipped() {
        let row = ["31", "Sex", "", "Baseline", "", "", "", "", "", "", "", "", "", ""];
        assert!(schema().parse_row(&row).is_none());
    }

    #[test]
    fn given_missing_title_and_size_when_parsing_then_label_and_size_degrade() {
        let row = ["40", "", "Cat", "", "", "", "", "", "", "", "", "", "", ""];
        let record = schema().parse_row(&row).unwrap();
        assert_eq!(record.label, "40: ");
        assert_eq!(record.size, None);
        assert_eq!(record.data["title"], Value::Null);
        assert_eq!(record.data["extract_id"], json!([]));
    }

    #[test]
    fn given_header_without_category_column_when_resolving_then_missing_column() {
        let err = RecordSchema::from_header(&["field_id", "title"], &BuilderConfig::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::MissingColumn { ref column } if column == "category_level_1"));
    }
}
