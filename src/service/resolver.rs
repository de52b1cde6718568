use crate::models::candidate::*;
use crate::models::{ColumnMapping, Field, HolidaySet, InvoiceIndex, RawRow, RawValue};
use crate::service::classifier;
use bigdecimal::{BigDecimal, Zero};
use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

/// Calendar days added to the glosa date when a sheet carries no due date
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 30;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap());
static DMY_SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").unwrap());
static DMY_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").unwrap());

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '¢', '₡', '₱'];

/// Amounts must stay below this to fit the store's `NUMERIC(18, 2)` column
const AMOUNT_LIMIT: i64 = 10_000_000_000_000_000;

/// Day 0 of spreadsheet serial dates (1900 date system with the leap-year offset applied)
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Calendar date of a spreadsheet serial; the time-of-day fraction is dropped
pub fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    serial_epoch()?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Whether a normalized amount can be stored
pub fn amount_fits_store(amount: &BigDecimal) -> bool {
    amount.abs() < BigDecimal::from(AMOUNT_LIMIT)
}

/// Normalizes an amount cell. Numbers pass through; text loses currency
/// symbols and thousands separators. Unparsable text yields zero.
pub fn normalize_amount(value: &RawValue) -> BigDecimal {
    let parsed = match value {
        RawValue::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        RawValue::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
                .collect();
            BigDecimal::from_str(&cleaned).ok()
        }
        RawValue::Empty | RawValue::Date(_) => None,
    };
    parsed.map(|d| d.abs()).unwrap_or_else(BigDecimal::zero)
}

/// Normalizes a date cell: spreadsheet serial, `YYYY-MM-DD`, `DD/MM/YYYY`
/// or `DD-MM-YYYY`. Anything else is rejected.
pub fn normalize_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Date(d) => Some(*d),
        RawValue::Number(n) => date_from_serial(*n),
        RawValue::Text(s) => parse_date_text(s.trim()),
        RawValue::Empty => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let (year, month, day) = if let Some(c) = ISO_DATE.captures(s) {
        (c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
    } else if let Some(c) = DMY_SLASH.captures(s).or_else(|| DMY_DASH.captures(s)) {
        (c[3].parse().ok()?, c[2].parse().ok()?, c[1].parse().ok()?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Holidays plus the reference day used to pre-populate tiers
#[derive(Debug, Clone, Copy)]
pub struct Calendar<'a> {
    pub holidays: &'a HolidaySet,
    pub today: NaiveDate,
}

/// Turns raw spreadsheet rows into reviewed-ready candidates
#[derive(Debug, Clone)]
pub struct Resolver {
    mapping: ColumnMapping,
    grace_period_days: u32,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ColumnMapping::default())
    }
}

impl Resolver {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self {
            mapping,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
        }
    }

    pub fn with_grace_period(mut self, days: u32) -> Self {
        self.grace_period_days = days;
        self
    }

    pub fn default_due_date(&self, glosa_date: NaiveDate) -> Option<NaiveDate> {
        glosa_date.checked_add_days(Days::new(u64::from(self.grace_period_days)))
    }

    /// One candidate per row, same order as the input
    pub fn resolve(
        &self,
        rows: &[RawRow],
        insurer_id: i64,
        index: &InvoiceIndex,
        calendar: Option<Calendar<'_>>,
    ) -> Vec<CandidateDispute> {
        let candidates: Vec<CandidateDispute> = rows
            .par_iter()
            .enumerate()
            .map(|(i, row)| self.resolve_row(i, row, insurer_id, index, calendar))
            .collect();

        let errors = candidates.iter().filter(|c| c.status == CandidateStatus::Error).count();
        let warnings = candidates.iter().filter(|c| c.status == CandidateStatus::Warning).count();
        tracing::info!(
            "Insurer {}: resolved {} rows ({} valid, {} warnings, {} errors)",
            insurer_id,
            candidates.len(),
            candidates.len() - errors - warnings,
            warnings,
            errors
        );

        candidates
    }

    /// Latest due date any row resolves to, used to size the holiday fetch
    pub fn latest_due_date(&self, rows: &[RawRow]) -> Option<NaiveDate> {
        rows.iter().filter_map(|row| self.due_date_for(row)).max()
    }

    fn locate<'r>(&self, field: Field, row: &'r RawRow) -> Option<&'r RawValue> {
        self.mapping.locate(field, row).filter(|v| v.is_present())
    }

    fn due_date_for(&self, row: &RawRow) -> Option<NaiveDate> {
        self.locate(Field::DueDate, row)
            .and_then(normalize_date)
            .or_else(|| {
                self.locate(Field::GlosaDate, row)
                    .and_then(normalize_date)
                    .and_then(|d| self.default_due_date(d))
            })
    }

    pub fn resolve_row(
        &self,
        position: usize,
        row: &RawRow,
        insurer_id: i64,
        index: &InvoiceIndex,
        calendar: Option<Calendar<'_>>,
    ) -> CandidateDispute {
        let invoice_number = self.locate(Field::InvoiceNumber, row).and_then(RawValue::as_text);
        let glosa_code = self.locate(Field::GlosaCode, row).and_then(RawValue::as_text);
        let description = self
            .locate(Field::Description, row)
            .and_then(RawValue::as_text)
            .unwrap_or_default();
        let amount_raw = self.locate(Field::GlossedAmount, row);
        let glossed_amount = amount_raw.map(normalize_amount).unwrap_or_else(BigDecimal::zero);
        let glosa_date_raw = self.locate(Field::GlosaDate, row);
        let glosa_date = glosa_date_raw.and_then(normalize_date);
        let due_date = self.due_date_for(row);
        let batch_label = self.locate(Field::BatchLabel, row).and_then(RawValue::as_text);
        let invoice_id = invoice_number
            .as_deref()
            .and_then(|number| index.lookup(insurer_id, number));

        let (status, message) = if invoice_number.is_none() {
            (CandidateStatus::Error, MSG_INVOICE_NUMBER_MISSING)
        } else if glosa_code.is_none() {
            (CandidateStatus::Error, MSG_GLOSA_CODE_MISSING)
        } else if amount_raw.is_none() {
            (CandidateStatus::Error, MSG_AMOUNT_MISSING)
        } else if !amount_fits_store(&glossed_amount) {
            (CandidateStatus::Error, MSG_AMOUNT_OUT_OF_RANGE)
        } else if glosa_date_raw.is_none() {
            (CandidateStatus::Error, MSG_GLOSA_DATE_MISSING)
        } else if glosa_date.is_none() {
            (CandidateStatus::Error, MSG_GLOSA_DATE_INVALID)
        } else if invoice_id.is_none() {
            (CandidateStatus::Warning, MSG_INVOICE_UNMATCHED)
        } else {
            (CandidateStatus::Valid, MSG_READY)
        };

        let tier = match (status, due_date, calendar) {
            (CandidateStatus::Error, _, _) => None,
            (_, Some(due), Some(cal)) => Some(classifier::classify(due, cal.holidays, cal.today)),
            _ => None,
        };

        if status == CandidateStatus::Warning {
            tracing::debug!(
                "Row {}: invoice {:?} not indexed for insurer {}",
                position, invoice_number, insurer_id
            );
        }

        CandidateDispute {
            row: position,
            invoice_number: invoice_number.unwrap_or_default(),
            glosa_code: glosa_code.unwrap_or_default(),
            description,
            glossed_amount,
            glosa_date,
            due_date,
            invoice_id,
            batch_label,
            tier,
            status,
            message: message.to_string(),
        }
    }
}

/// Resolves with the default mapping and grace period, without tiers
pub fn resolve(rows: &[RawRow], insurer_id: i64, index: &InvoiceIndex) -> Vec<CandidateDispute> {
    Resolver::default().resolve(rows, insurer_id, index, None)
}
