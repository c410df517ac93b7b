#[allow(dead_code)]
mod common;

use approx::assert_relative_eq;

use pvreduce_core::aggregate::average::{average_by_column, average_experiments};
use pvreduce_core::aggregate::groups::assign_group_codes;
use pvreduce_core::dataset::{Column, Dataset, Index, Value};
use pvreduce_core::error::PvError;

use common::{datetime, floats, readings_dataset, rows_dataset, text};

fn experiment_readings() -> Dataset {
    readings_dataset(
        &["EXP002", "EXP002", "EXP001", "EXP001", "EXP001"],
        vec![
            ("timestamp", floats(&[10.0, 11.0, 1.0, 2.0, 3.0])),
            ("isc_fit", floats(&[4.0, 6.0, 1.0, 2.0, 3.0])),
            ("voc_fit", floats(&[600.0, 600.0, 500.0, 510.0, 520.0])),
            ("pmax_fit", floats(&[5.0, f64::NAN, 2.0, 2.0, 2.0])),
            ("name", text(&["Film A", "Film A", "PV masked", "PV masked", "PV masked"])),
            ("film_id", floats(&[2.0, 2.0, 1.0, 1.0, 1.0])),
            ("t_room", floats(&[21.0, 22.0, 20.0, 20.0, 20.0])),
            ("rh_room", floats(&[40.0, 41.0, 30.0, 30.0, 30.0])),
            (
                "datetime",
                Column::DateTime(vec![
                    Some(datetime(2, 9)),
                    Some(datetime(2, 10)),
                    Some(datetime(1, 9)),
                    Some(datetime(1, 10)),
                    Some(datetime(1, 11)),
                ]),
            ),
        ],
    )
}

#[test]
fn averages_each_experiment_in_key_order() {
    let avg = average_experiments(&experiment_readings()).unwrap();

    assert_eq!(
        avg.index(),
        &Index::Experiment(vec!["EXP001".to_string(), "EXP002".to_string()])
    );
    let names: Vec<&str> = avg.column_names().collect();
    assert_eq!(
        names,
        vec![
            "timestamp", "isc", "disc", "voc", "dvoc", "pmax", "dpmax", "name", "film_id",
            "t_room", "rh_room", "datetime"
        ]
    );

    let isc = avg.float("isc").unwrap();
    let disc = avg.float("disc").unwrap();
    assert_relative_eq!(isc[0], 2.0);
    assert_relative_eq!(disc[0], 1.0);
    assert_relative_eq!(isc[1], 5.0);
    assert_relative_eq!(disc[1], 2.0_f64.sqrt(), epsilon = 1e-12);

    // A single usable reading has a mean but no deviation.
    assert_relative_eq!(avg.float("pmax").unwrap()[1], 5.0);
    assert!(avg.float("dpmax").unwrap()[1].is_nan());

    // Descriptive columns take the first reading.
    assert_relative_eq!(avg.float("timestamp").unwrap()[1], 10.0);
    assert_relative_eq!(avg.float("t_room").unwrap()[1], 21.0);
    assert_eq!(avg.value(0, "datetime").unwrap(), Value::DateTime(datetime(1, 9)));
}

#[test]
fn experiment_average_needs_experiment_keys() {
    let ds = experiment_readings();
    let mut rows = ds.clone();
    rows.reset_index();
    let err = average_experiments(&rows).unwrap_err();
    assert!(matches!(err, PvError::Precondition(_)));
}

fn per_experiment(names: &[&str], days: &[u32], isc: &[f64]) -> Dataset {
    let n = names.len();
    let mut ds = rows_dataset(
        n,
        vec![
            ("timestamp", floats(&vec![0.0; n])),
            ("isc", floats(isc)),
            ("disc", floats(&vec![0.1; n])),
            ("voc", floats(&vec![600.0; n])),
            ("dvoc", floats(&vec![1.0; n])),
            ("pmax", floats(&vec![5.0; n])),
            ("dpmax", floats(&vec![0.2; n])),
            ("name", text(names)),
            ("film_id", floats(&(0..n).map(|i| i as f64).collect::<Vec<_>>())),
            ("t_room", floats(&(0..n).map(|i| 20.0 + i as f64).collect::<Vec<_>>())),
            ("rh_room", floats(&vec![35.0; n])),
            (
                "datetime",
                Column::DateTime(days.iter().map(|&d| Some(datetime(d, 12))).collect()),
            ),
        ],
    );
    ds.insert("note", text(&vec!["kept"; n])).unwrap();
    ds
}

#[test]
fn all_unique_values_pass_through_sorted_by_datetime() {
    let ds = per_experiment(&["c", "a", "b"], &[3, 1, 2], &[3.0, 1.0, 2.0]);
    let avg = average_by_column(&ds, "name").unwrap();

    let expected = ds.sort_by_datetime().unwrap();
    let mut expected = expected;
    expected.reset_index();
    assert_eq!(avg, expected);
}

#[test]
fn repeated_values_are_averaged() {
    let ds = per_experiment(&["ref", "film", "ref"], &[1, 2, 3], &[1.0, 7.0, 3.0]);
    let avg = average_by_column(&ds, "name").unwrap();

    assert_eq!(avg.len(), 2);
    assert_eq!(avg.index(), &Index::Rows(vec![0, 1]));
    // The averaged "ref" row carries the first datetime (day 1) and sorts first.
    assert_eq!(avg.value(0, "name").unwrap(), Value::Text("ref".into()));
    assert_relative_eq!(avg.float("isc").unwrap()[0], 2.0);
    assert_relative_eq!(avg.float("disc").unwrap()[0], 2.0_f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(avg.float("t_room").unwrap()[0], 21.0);
    assert_relative_eq!(avg.float("isc").unwrap()[1], 7.0);
    // Columns outside the averaged set survive on pass-through rows only.
    assert_eq!(avg.value(1, "note").unwrap(), Value::Text("kept".into()));
    assert!(avg.value(0, "note").unwrap().is_missing());
}

#[test]
fn group_codes_follow_first_appearance() {
    let attrs = [
        "Matrix",
        "Solvent",
        "QD Type",
        "QD Batch",
        "QD Manufacturer",
        "QD Concentration (mg/g)",
        "Nominal Emission (nm)",
        "Manufactured",
    ];
    let mut columns: Vec<(&str, Column)> = attrs
        .iter()
        .map(|&a| (a, text(&["x", "x", "x", "x"])))
        .collect();
    columns[0] = ("Matrix", text(&["PS", "PMMA", "PS", "PMMA"]));
    columns[5] = ("QD Concentration (mg/g)", floats(&[0.5, 0.5, 0.5, f64::NAN]));
    let mut ds = rows_dataset(4, columns);

    assign_group_codes(&mut ds).unwrap();
    assert_eq!(ds.float("group").unwrap().to_vec(), vec![0.0, 1.0, 0.0, 2.0]);
}
