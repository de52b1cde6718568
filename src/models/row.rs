use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// Raw spreadsheet cell as handed over by a tabular reader
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl RawValue {
    /// Numbers and dates are always present; text only if non-blank
    pub fn is_present(&self) -> bool {
        match self {
            RawValue::Empty => false,
            RawValue::Number(_) | RawValue::Date(_) => true,
            RawValue::Text(s) => !s.trim().is_empty(),
        }
    }

    /// Text rendering used for identifier-like fields (invoice number, codes)
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Empty => None,
            RawValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            // 12345.0 renders as "12345"
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(d: NaiveDate) -> Self {
        RawValue::Date(d)
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Null => RawValue::Empty,
            serde_json::Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Empty),
            serde_json::Value::String(s) => RawValue::Text(s),
            serde_json::Value::Bool(b) => RawValue::Text(b.to_string()),
            other => RawValue::Text(other.to_string()),
        })
    }
}

/// One input line: column label -> raw value, in the sheet's column order
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    cells: IndexMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<RawValue>) {
        self.cells.insert(label.into(), value.into());
    }

    /// Builder-style insert, handy when assembling rows in code
    pub fn with(mut self, label: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(label, value);
        self
    }

    /// Cells in native column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}
