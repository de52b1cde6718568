use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use glosa_import::models::{
    ActiveDispute, CandidateStatus, ColumnMapping, Field, FieldOverrides, HolidaySet, InvoiceIndex,
    RawRow, RawValue, UrgencyTier,
};
use glosa_import::service::classifier::{business_days_remaining, classify, recompute_tiers};
use glosa_import::service::importer::{build_new_disputes, CommitContext};
use glosa_import::service::resolver::{resolve, Calendar, Resolver};
use glosa_import::service::tabular::read_csv_rows;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn insurer_index() -> InvoiceIndex {
    InvoiceIndex::for_insurer(
        5,
        vec![(501, "FE-1001".to_string()), (502, "FE-1002".to_string())],
    )
}

// -------------------------------------------------------------------------
// Resolution
// -------------------------------------------------------------------------

#[test]
fn one_candidate_per_row_in_input_order() {
    let rows = vec![
        RawRow::new().with("codigo", "X").with("valor", "1"),
        RawRow::new().with("factura", "FE-1001").with("valor", "1"),
        RawRow::new().with("factura", "FE-1001").with("codigo", "X"),
        RawRow::new()
            .with("factura", "FE-1002")
            .with("codigo", "X")
            .with("valor", "10")
            .with("fecha", "2024-01-10"),
    ];

    let out = resolve(&rows, 5, &insurer_index());

    assert_eq!(out.len(), rows.len());
    let messages: Vec<&str> = out.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "invoice number not found",
            "glosa code not found",
            "glossed amount not found",
            "ready to import",
        ]
    );
    for (i, c) in out.iter().enumerate() {
        assert_eq!(c.row, i);
    }
    assert_eq!(out[3].invoice_id, Some(502));
}

#[test]
fn same_day_in_every_accepted_shape() {
    let shapes: Vec<RawValue> = vec![
        "2024-01-10".into(),
        "10/01/2024".into(),
        "10-01-2024".into(),
        RawValue::Number(45301.0),
    ];

    for shape in shapes {
        let row = RawRow::new()
            .with("numero_factura", "FE-1001")
            .with("codigo_glosa", "FA01")
            .with("valor_glosado", "$1,234.50")
            .with("fecha_glosa", shape.clone());
        let out = resolve(&[row], 5, &insurer_index());

        assert_eq!(out[0].status, CandidateStatus::Valid, "shape {shape:?}");
        assert_eq!(out[0].glosa_date, Some(date("2024-01-10")));
        assert_eq!(out[0].due_date, Some(date("2024-02-09")));
        assert_eq!(out[0].glossed_amount, BigDecimal::from_str("1234.50").unwrap());
    }
}

#[test]
fn invoice_from_another_insurer_is_a_warning() {
    let row = RawRow::new()
        .with("Invoice Number", "FE-1001")
        .with("Glosa Code", "FA01")
        .with("Amount", 50.0)
        .with("Glosa Date", "2024-01-10");

    let out = resolve(&[row], 6, &insurer_index());
    assert_eq!(out[0].status, CandidateStatus::Warning);
    assert_eq!(out[0].invoice_id, None);
}

#[test]
fn insurer_overrides_drive_resolution() {
    let mut overrides = FieldOverrides::new();
    overrides.insert(Field::GlossedAmount, vec!["vlr_objetado".to_string()]);
    let resolver = Resolver::new(ColumnMapping::with_overrides(&overrides));

    let row = RawRow::new()
        .with("factura", "FE-1001")
        .with("codigo", "FA01")
        .with("valor", "999")
        .with("VLR_OBJETADO", "120")
        .with("fecha", "2024-01-10");

    let out = resolver.resolve(&[row], 5, &insurer_index(), None);
    assert_eq!(out[0].glossed_amount, BigDecimal::from(120));
}

// -------------------------------------------------------------------------
// Classification
// -------------------------------------------------------------------------

#[test]
fn monday_to_monday_two_weeks_out_is_yellow() {
    let today = date("2024-06-03");
    let due = date("2024-06-17");
    assert_eq!(business_days_remaining(due, &HolidaySet::new(), today), Some(10));
    assert_eq!(classify(due, &HolidaySet::new(), today), UrgencyTier::Yellow);
}

#[test]
fn expired_is_black_whatever_the_holidays() {
    let holidays: HolidaySet = [date("2024-06-03"), date("2024-06-04")].into_iter().collect();
    assert_eq!(classify(date("2024-06-01"), &holidays, date("2024-06-05")), UrgencyTier::Black);
    assert_eq!(
        classify(date("2024-06-01"), &HolidaySet::new(), date("2024-06-05")),
        UrgencyTier::Black
    );
}

#[test]
fn recompute_twice_gives_identical_tiers() {
    let active: Vec<ActiveDispute> = (0..50)
        .map(|i| ActiveDispute {
            id: i,
            due_date: date("2024-05-20") + chrono::Days::new(i as u64),
        })
        .collect();
    let holidays: HolidaySet = [date("2024-06-10"), date("2024-07-01")].into_iter().collect();
    let today = date("2024-06-03");

    let first = recompute_tiers(&active, &holidays, today);
    let second = recompute_tiers(&active, &holidays, today);
    assert_eq!(first, second);
    assert_eq!(first.len(), 50);
    assert!(first.iter().zip(&active).all(|(u, d)| u.dispute_id == d.id));
}

// -------------------------------------------------------------------------
// End to end: CSV sheet -> preview -> commit records
// -------------------------------------------------------------------------

#[test]
fn csv_sheet_to_write_requests() {
    let sheet = "\
FACTURA,COD_GLOSA,DETALLE,VALOR,FECHA,FECHA_LIMITE,LOTE
FE-1001,TA0201,Tarifa,\"$250,000\",03/06/2024,,L1
FE-9999,SO0101,Soportes,80000,03/06/2024,14/06/2024,L1
FE-1002,FA0701,,12000,yesterday,,L2
";
    let rows = read_csv_rows(sheet.as_bytes()).unwrap();
    let holidays: HolidaySet = [date("2024-06-10")].into_iter().collect();
    let today = date("2024-06-03");
    let calendar = Calendar {
        holidays: &holidays,
        today,
    };
    let index = insurer_index();

    let candidates = Resolver::default().resolve(&rows, 5, &index, Some(calendar));
    let statuses: Vec<CandidateStatus> = candidates.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![CandidateStatus::Valid, CandidateStatus::Warning, CandidateStatus::Error]
    );
    // 2024-06-03 -> 2024-06-14 with the 10th off: 8 business days
    assert_eq!(candidates[1].tier, Some(UrgencyTier::Yellow));
    assert_eq!(candidates[0].tier, Some(UrgencyTier::Green));

    let ctx = CommitContext {
        insurer_id: 5,
        actor_id: 77,
        index: &index,
        holidays: &holidays,
        today,
        grace_period_days: 30,
    };
    let (records, summary) = build_new_disputes(&candidates, &ctx);

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(records[0].invoice_id, Some(501));
    assert_eq!(records[0].glossed_amount, BigDecimal::from(250000));
    assert_eq!(records[0].due_date, date("2024-07-03"));
    assert_eq!(records[0].batch_label.as_deref(), Some("L1"));
    assert_eq!(records[1].invoice_id, None);
    assert_eq!(records[1].business_days_remaining, 8);
}
