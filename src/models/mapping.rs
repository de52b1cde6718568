use crate::models::row::{RawRow, RawValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Logical glosa fields a spreadsheet column can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    InvoiceNumber,
    GlosaCode,
    Description,
    GlossedAmount,
    GlosaDate,
    DueDate,
    BatchLabel,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::InvoiceNumber,
        Field::GlosaCode,
        Field::Description,
        Field::GlossedAmount,
        Field::GlosaDate,
        Field::DueDate,
        Field::BatchLabel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::InvoiceNumber => "invoice_number",
            Field::GlosaCode => "glosa_code",
            Field::Description => "description",
            Field::GlossedAmount => "glossed_amount",
            Field::GlosaDate => "glosa_date",
            Field::DueDate => "due_date",
            Field::BatchLabel => "batch_label",
        }
    }

    /// Built-in synonyms: the labels insurers actually export, then English ones
    fn default_synonyms(&self) -> &'static [&'static str] {
        match self {
            Field::InvoiceNumber => &[
                "numero_factura", "factura", "nro_factura", "no_factura", "numero factura",
                "invoice_number", "invoice number", "invoice",
            ],
            Field::GlosaCode => &[
                "codigo_glosa", "codigo", "cod_glosa", "glosa", "código glosa",
                "glosa_code", "glosa code",
            ],
            Field::Description => &[
                "descripcion", "descripción", "detalle", "observacion", "observación",
                "description",
            ],
            Field::GlossedAmount => &[
                "valor_glosado", "valor", "valor glosado", "monto", "valor_objecion",
                "glossed_amount", "glossed amount", "amount",
            ],
            Field::GlosaDate => &[
                "fecha_glosa", "fecha", "fecha glosa", "fec_glosa",
                "glosa_date", "glosa date",
            ],
            Field::DueDate => &[
                "fecha_vencimiento", "vencimiento", "fecha_limite", "fecha límite",
                "due_date", "due date", "deadline",
            ],
            Field::BatchLabel => &["lote", "numero_lote", "nro_lote", "batch", "batch_label"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// A field and the column labels accepted for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: Field,
    pub synonyms: Vec<String>,
}

/// Per-insurer synonym overrides, keyed by field
pub type FieldOverrides = HashMap<Field, Vec<String>>;

/// Full column mapping for one parse run. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    specs: Vec<FieldSpec>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        let specs = Field::ALL
            .iter()
            .map(|&field| FieldSpec {
                field,
                synonyms: field.default_synonyms().iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self { specs }
    }
}

impl ColumnMapping {
    /// Default mapping with each overridden field's synonyms replaced wholesale
    pub fn with_overrides(overrides: &FieldOverrides) -> Self {
        let mut mapping = Self::default();
        for spec in &mut mapping.specs {
            if let Some(synonyms) = overrides.get(&spec.field) {
                if !synonyms.is_empty() {
                    spec.synonyms = synonyms.clone();
                }
            }
        }
        mapping
    }

    pub fn synonyms(&self, field: Field) -> &[String] {
        self.specs
            .iter()
            .find(|s| s.field == field)
            .map(|s| s.synonyms.as_slice())
            .unwrap_or(&[])
    }

    /// Finds the cell for `field` in `row`.
    ///
    /// Pass 1 looks for a label equal to a synonym, pass 2 for a label that
    /// contains one. Both compare case-insensitively and the first label in
    /// the row's own column order wins, so two sheets carrying both "valor"
    /// and "valor glosado" can resolve differently if their columns are
    /// swapped. That order dependence is accepted behaviour.
    pub fn locate<'r>(&self, field: Field, row: &'r RawRow) -> Option<&'r RawValue> {
        let synonyms: Vec<String> = self
            .synonyms(field)
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        if synonyms.is_empty() {
            return None;
        }

        let labels: Vec<(String, &RawValue)> = row
            .iter()
            .map(|(label, value)| (label.trim().to_lowercase(), value))
            .collect();

        labels
            .iter()
            .find(|(label, _)| synonyms.iter().any(|s| label == s))
            .or_else(|| {
                labels
                    .iter()
                    .find(|(label, _)| synonyms.iter().any(|s| label.contains(s.as_str())))
            })
            .map(|(_, value)| *value)
    }
}
