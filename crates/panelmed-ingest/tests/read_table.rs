//! Integration tests for dataset loading.

use std::fs;

use panelmed_ingest::{
    IngestError, column_f64_values, column_key_values, column_names, read_table,
};
use tempfile::TempDir;
use xportrs::{Column as XptColumn, ColumnData, Dataset, Xpt};

#[test]
fn csv_panel_loads_with_numeric_and_string_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("panel.csv");
    fs::write(
        &path,
        "firm,year,x,m,y\nA,2001,1.0,0.5,2.0\nA,2002,2.0,,3.0\nB,2001,0.5,0.1,1.0\n",
    )
    .unwrap();

    let df = read_table(&path).unwrap();
    assert_eq!(df.height(), 3);
    assert_eq!(column_key_values(&df, "firm").unwrap(), vec!["A", "A", "B"]);
    assert_eq!(
        column_f64_values(&df, "m").unwrap(),
        vec![Some(0.5), None, Some(0.1)]
    );
}

#[test]
fn tsv_extension_uses_tab_separator() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("panel.tsv");
    fs::write(&path, "id\tt\tx\n1\t1\t3.5\n1\t2\t4.5\n").unwrap();

    let df = read_table(&path).unwrap();
    assert_eq!(df.width(), 3);
    assert_eq!(
        column_f64_values(&df, "x").unwrap(),
        vec![Some(3.5), Some(4.5)]
    );
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("panel.sav");
    fs::write(&path, "not read").unwrap();

    let err = read_table(&path).unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedExtension { ref extension, .. } if extension == "sav"));
    assert!(err.to_string().contains("panel.sav"));
}

#[test]
fn garbage_xpt_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("panel.xpt");
    fs::write(&path, vec![b' '; 800]).unwrap();

    assert!(matches!(
        read_table(&path),
        Err(IngestError::Malformed { .. })
    ));
}

#[test]
fn xpt_member_loads_numeric_and_character_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("panel.xpt");
    let columns = vec![
        XptColumn::new(
            "ID",
            ColumnData::String(vec![Some("A".to_string()), Some("B".to_string()), None]),
        )
        .with_label("Firm")
        .with_length(8),
        XptColumn::new("X", ColumnData::F64(vec![Some(1.5), None, Some(-2.0)]))
            .with_label("Treatment")
            .with_length(8),
    ];
    let dataset = Dataset::with_label("PANEL", "Panel data", columns).unwrap();
    Xpt::writer(dataset)
        .finalize()
        .unwrap()
        .write_path(&path)
        .unwrap();

    let df = read_table(&path).unwrap();
    assert_eq!(column_names(&df), vec!["ID", "X"]);
    assert_eq!(
        column_f64_values(&df, "X").unwrap(),
        vec![Some(1.5), None, Some(-2.0)]
    );
    assert_eq!(column_key_values(&df, "ID").unwrap(), vec!["A", "B", ""]);
}

#[test]
fn missing_xpt_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        read_table(&dir.path().join("absent.xpt")),
        Err(IngestError::FileNotFound { .. })
    ));
}
