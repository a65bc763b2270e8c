use std::fs;
use std::path::PathBuf;

use crate::classifier::{classify_readings, classify_row, leading_number};
use crate::columns::{ColumnMapping, SemanticField};
use crate::errors::ParserError;
use crate::model::{EquipmentRecord, Status, StatusKind};
use crate::parse_equipment_csv;

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn permutations(items: &[&'static str]) -> Vec<Vec<&'static str>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for (i, head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, *head);
            out.push(tail);
        }
    }
    out
}

#[test]
fn column_mapping_ignores_header_order() {
    let headers = [
        ("Equipment", SemanticField::Name),
        ("Type", SemanticField::Type),
        ("Flowrate", SemanticField::Flow),
        ("Pressure", SemanticField::Pressure),
        ("Temperature", SemanticField::Temp),
        ("Status", SemanticField::Status),
    ];
    let labels: Vec<&'static str> = headers.iter().map(|(label, _)| *label).collect();

    for order in permutations(&labels) {
        let mapping = ColumnMapping::analyze(&order);
        for (label, field) in &headers {
            let expected = order.iter().position(|header| header == label);
            assert_eq!(mapping.matched(*field), expected, "order {order:?}");
        }
    }
}

#[test]
fn column_mapping_normalizes_and_takes_first_match() {
    let mapping = ColumnMapping::analyze(&["  ID ", "Inlet Pressure", "Outlet PRESSURE", "temp_c"]);

    assert_eq!(mapping.matched(SemanticField::Pressure), Some(1));
    assert_eq!(mapping.matched(SemanticField::Temp), Some(3));
    assert_eq!(mapping.matched(SemanticField::Name), None);
}

#[test]
fn unmatched_fields_fall_back_to_their_slot() {
    let mapping = ColumnMapping::analyze(&["a", "b", "c", "d", "e", "f"]);

    assert_eq!(mapping.resolve(SemanticField::Name), Some(0));
    assert_eq!(mapping.resolve(SemanticField::Type), Some(1));
    assert_eq!(mapping.resolve(SemanticField::Flow), Some(2));
    assert_eq!(mapping.resolve(SemanticField::Pressure), Some(3));
    assert_eq!(mapping.resolve(SemanticField::Temp), Some(4));
    assert_eq!(mapping.resolve(SemanticField::Status), None);
    assert_eq!(mapping.unmatched().len(), 6);
}

#[test]
fn parses_sample_equipment_file() {
    let content = fixture("sample_equipment_data.csv");
    let parsed = parse_equipment_csv(&content).expect("sample parse failed");

    assert_eq!(parsed.records.len(), 7);
    assert_eq!(parsed.dropped_rows, 0);
    assert_eq!(parsed.headers[0], "equipment name");

    let statuses: Vec<&str> = parsed.records.iter().map(|r| r.status.as_str()).collect();
    assert_eq!(
        statuses,
        ["Stable", "Stable", "Stable", "Warning", "Critical", "Warning", "Stable"]
    );
    assert_eq!(parsed.critical_count(), 1);

    let reactor = &parsed.records[4];
    assert_eq!(reactor.name, "Reactor-1");
    assert_eq!(reactor.equipment_type, "Reactor");
    assert_eq!(reactor.flow, "140");
    assert_eq!(reactor.pressure, "16.5");
    assert_eq!(reactor.temp, "140");
}

#[test]
fn shuffled_columns_with_status_header() {
    let content = fixture("shuffled_with_status.csv");
    let parsed = parse_equipment_csv(&content).expect("shuffled parse failed");

    let names: Vec<&str> = parsed.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Boiler-1", "Pump-9", "Tank-3", "Valve-A9", "Mixer-2"]);

    // supplied status wins over readings
    assert_eq!(parsed.records[0].status, Status::Known(StatusKind::Stable));
    // empty status cell, numeric sixth cell: derived from pressure 12
    assert_eq!(parsed.records[1].status, Status::Known(StatusKind::Warning));
    // "404" is a stray number, recomputed from pressure 20
    assert_eq!(parsed.records[2].status, Status::Known(StatusKind::Critical));
    assert_eq!(parsed.records[3].status, Status::Raw("Maintenance".into()));
    // lower-case kind names are operator text, not a known kind
    assert_eq!(parsed.records[4].status, Status::Raw("critical".into()));

    assert_eq!(parsed.records[1].equipment_type, "Centrifugal");
    assert_eq!(parsed.records[1].flow, "45");
    assert_eq!(parsed.critical_count(), 1);
}

#[test]
fn short_rows_are_dropped_and_long_rows_kept() {
    let content = fixture("ragged.csv");
    let parsed = parse_equipment_csv(&content).expect("ragged parse failed");

    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.dropped_rows, 2);
    assert_eq!(parsed.records[0].name, "Reactor-1");
    assert_eq!(parsed.records[0].status, Status::Raw("Offline".into()));
    assert_eq!(parsed.records[1].name, "Tank-2");
    assert_eq!(parsed.records[1].status, Status::Known(StatusKind::Stable));
}

#[test]
fn row_cell_count_decides_acceptance() {
    for extra in 0..3 {
        let mut row = vec!["P", "Pump", "1", "2", "3"];
        row.extend(std::iter::repeat("x").take(extra));
        let content = format!("name,type,flow,pressure,temp\n{}\n", row.join(","));
        let parsed = parse_equipment_csv(&content).expect("row should be accepted");
        assert_eq!(parsed.records.len(), 1);
    }

    for cells in 1..5 {
        let row = ["P", "Pump", "1", "2", "3"][..cells].join(",");
        let content = format!("name,type,flow,pressure,temp\n{row}\nOK,Pump,1,2,3\n");
        let parsed = parse_equipment_csv(&content).expect("second row should be accepted");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].name, "OK");
        assert_eq!(parsed.dropped_rows, 1);
    }
}

#[test]
fn narrow_header_leaves_missing_slots_empty() {
    let parsed = parse_equipment_csv("name,pressure\nP1,20\n").expect("parse failed");
    let record = &parsed.records[0];

    assert_eq!(record.pressure, "20");
    assert_eq!(record.temp, "");
    assert_eq!(record.status, Status::Known(StatusKind::Critical));
}

#[test]
fn no_qualifying_rows_is_a_parse_failure() {
    let content = fixture("header_only.csv");
    let err = parse_equipment_csv(&content).expect_err("should fail");
    assert!(matches!(
        err,
        ParserError::NoQualifyingRows {
            expected: 5,
            dropped: 1
        }
    ));

    let err = parse_equipment_csv("\n   \n").expect_err("should fail");
    assert!(matches!(err, ParserError::MissingHeader));
}

#[test]
fn upload_scenario_pump_nine_is_critical() {
    let parsed = parse_equipment_csv("Equipment,Kind,Flow,Press,Temperature\nPump-9,Centrifugal,10,16,90\n")
        .expect("parse failed");
    let record = &parsed.records[0];

    assert_eq!(record.name, "Pump-9");
    assert_eq!(record.equipment_type, "Centrifugal");
    assert_eq!(record.pressure, "16");
    assert_eq!(record.temp, "90");
    assert_eq!(record.status, Status::Known(StatusKind::Critical));
}

#[test]
fn pressure_sweep_only_moves_up_the_bands() {
    let mut previous = StatusKind::Stable;
    let rank = |kind: StatusKind| match kind {
        StatusKind::Stable => 0,
        StatusKind::Warning => 1,
        StatusKind::Critical => 2,
    };

    for tenths in 0..=250 {
        let pressure = format!("{:.1}", tenths as f64 / 10.0);
        let kind = classify_readings(&pressure, "100");
        assert!(rank(kind) >= rank(previous), "regressed at {pressure}");

        let value = tenths as f64 / 10.0;
        let expected = if value > 15.0 {
            StatusKind::Critical
        } else if value > 9.0 {
            StatusKind::Warning
        } else {
            StatusKind::Stable
        };
        assert_eq!(kind, expected, "pressure {pressure}");
        previous = kind;
    }
}

#[test]
fn temperature_bands_and_non_numeric_readings() {
    assert_eq!(classify_readings("1", "131"), StatusKind::Critical);
    assert_eq!(classify_readings("1", "130"), StatusKind::Warning);
    assert_eq!(classify_readings("1", "115"), StatusKind::Stable);
    assert_eq!(classify_readings("n/a", ""), StatusKind::Stable);
    assert_eq!(classify_readings("16 bar", "20"), StatusKind::Critical);
}

#[test]
fn stray_number_cleanup_uses_character_count() {
    // shorter than four characters: discarded and recomputed
    assert_eq!(
        classify_row(Some("404"), None, "1", "20"),
        Status::Known(StatusKind::Stable)
    );
    assert_eq!(
        classify_row(Some("3rd"), None, "10", "20"),
        Status::Known(StatusKind::Warning)
    );
    // four characters or more: kept verbatim
    assert_eq!(
        classify_row(Some("1500"), None, "1", "20"),
        Status::Raw("1500".into())
    );
}

#[test]
fn sixth_cell_needs_non_numeric_text_longer_than_two() {
    assert_eq!(
        classify_row(None, Some("Offline"), "20", "20"),
        Status::Raw("Offline".into())
    );
    assert_eq!(
        classify_row(None, Some("ok"), "20", "20"),
        Status::Known(StatusKind::Critical)
    );
    assert_eq!(
        classify_row(None, Some("7.5"), "1", "1"),
        Status::Known(StatusKind::Stable)
    );
    assert_eq!(
        classify_row(Some(""), Some("Tripped"), "1", "1"),
        Status::Raw("Tripped".into())
    );
}

#[test]
fn leading_number_reads_numeric_prefixes() {
    assert_eq!(leading_number("16"), Some(16.0));
    assert_eq!(leading_number("  -2.5e1x"), Some(-25.0));
    assert_eq!(leading_number(".5"), Some(0.5));
    assert_eq!(leading_number("7e"), Some(7.0));
    assert_eq!(leading_number("Infinity"), Some(f64::INFINITY));
    assert_eq!(leading_number("abc"), None);
    assert_eq!(leading_number("."), None);
    assert_eq!(leading_number(""), None);
}

#[test]
fn status_serializes_as_plain_text() {
    let record = EquipmentRecord {
        name: "Pump-2".into(),
        equipment_type: "Centrifugal".into(),
        flow: "45.0".into(),
        pressure: "2.1".into(),
        temp: "32.4".into(),
        status: Status::Raw("Maintenance".into()),
    };

    let json = serde_json::to_value(&record).expect("serialize");
    assert_eq!(json["type"], "Centrifugal");
    assert_eq!(json["status"], "Maintenance");

    let restored: EquipmentRecord = serde_json::from_value(serde_json::json!({
        "name": "Boiler-01",
        "type": "Steam Generator",
        "flow": "0.0",
        "pressure": "8.5",
        "temp": "120.2",
        "status": "Critical"
    }))
    .expect("deserialize");
    assert_eq!(restored.status, Status::Known(StatusKind::Critical));
}

#[test]
fn supplied_status_text_is_kept_verbatim() {
    let parsed = parse_equipment_csv(
        "name,type,flow,pressure,temp,status
Pump,P,1,2,3,CRITICAL
Tank,S,1,2,3,warning
Mixer,A,1,2,3,Critical
",
    )
    .expect("parse failed");

    let statuses: Vec<&str> = parsed.records.iter().map(|r| r.status.as_str()).collect();
    assert_eq!(statuses, ["CRITICAL", "warning", "Critical"]);
    assert_eq!(parsed.records[0].status, Status::Raw("CRITICAL".into()));
    assert_eq!(parsed.records[1].status.kind(), None);
    assert_eq!(parsed.critical_count(), 1);
}
