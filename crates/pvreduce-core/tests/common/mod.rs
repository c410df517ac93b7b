use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use ndarray::Array1;
use pvreduce_core::dataset::{Column, Dataset, Index};
use rust_xlsxwriter::Workbook;

/// One IV-tracer reading as written to an `IV_Summary.xlsx` row.
#[derive(Clone, Debug)]
pub struct Reading {
    pub timestamp: f64,
    pub isc: f64,
    pub voc: f64,
    pub pmax: f64,
    pub t_sample: f64,
    pub irrad: f64,
    pub name: &'static str,
    pub film_id: f64,
}

impl Reading {
    pub fn new(name: &'static str, film_id: f64, timestamp: f64) -> Self {
        Self {
            timestamp,
            isc: 10.0,
            voc: 600.0,
            pmax: 5.0,
            t_sample: 25.0,
            irrad: 515.0,
            name,
            film_id,
        }
    }

    pub fn with_metrics(mut self, isc: f64, voc: f64, pmax: f64) -> Self {
        self.isc = isc;
        self.voc = voc;
        self.pmax = pmax;
        self
    }

    pub fn with_irrad(mut self, irrad: f64) -> Self {
        self.irrad = irrad;
        self
    }
}

const SUMMARY_HEADERS: [&str; 13] = [
    "timestamp",
    "isc_fit",
    "voc_fit",
    "pmax_fit",
    "t_sample",
    "irrad2",
    "name",
    "film_id",
    "t_room",
    "rh_room",
    "count",
    "cycle",
    "cell_id",
];

/// Write an instrument summary sheet the way the IV tracer does: a blank
/// index header in A1, then the measurement columns.
pub fn write_summary(path: &Path, readings: &[Reading]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, header) in SUMMARY_HEADERS.iter().enumerate() {
        sheet.write_string(0, c as u16 + 1, *header).unwrap();
    }
    for (i, r) in readings.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, i as f64).unwrap();
        let numbers = [r.timestamp, r.isc, r.voc, r.pmax, r.t_sample, r.irrad];
        for (c, v) in numbers.iter().enumerate() {
            sheet.write_number(row, c as u16 + 1, *v).unwrap();
        }
        sheet.write_string(row, 7, r.name).unwrap();
        sheet.write_number(row, 8, r.film_id).unwrap();
        sheet.write_number(row, 9, 22.0).unwrap();
        sheet.write_number(row, 10, 40.0).unwrap();
        sheet.write_number(row, 11, i as f64).unwrap();
        sheet.write_number(row, 12, 1.0).unwrap();
        sheet.write_number(row, 13, 3.0).unwrap();
    }
    workbook.save(path).unwrap();
}

/// Create `<root>/<dir_name>/IV_Summary.xlsx`.
pub fn write_experiment(root: &Path, dir_name: &str, readings: &[Reading]) -> PathBuf {
    let dir = root.join(dir_name);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("IV_Summary.xlsx");
    write_summary(&path, readings);
    path
}

/// Three experiments: the masked reference twice and one film, three
/// readings each, one hour apart.
pub fn sample_tree(root: &Path) {
    let base = 1_600_000_000.0;
    write_experiment(
        root,
        "EXP001 reference",
        &[
            Reading::new("PV masked", 1.0, base).with_irrad(505.0),
            Reading::new("PV masked", 1.0, base + 60.0).with_irrad(515.0),
            Reading::new("PV masked", 1.0, base + 120.0).with_irrad(525.0),
        ],
    );
    write_experiment(
        root,
        "EXP002 film",
        &[
            Reading::new("Film A", 2.0, base + 3600.0).with_metrics(11.0, 610.0, 5.5),
            Reading::new("Film A", 2.0, base + 3660.0).with_metrics(11.2, 612.0, 5.6),
            Reading::new("Film A", 2.0, base + 3720.0).with_metrics(10.8, 608.0, 5.4),
        ],
    );
    write_experiment(
        root,
        "EXP003 reference again",
        &[
            Reading::new("PV masked", 1.0, base + 7200.0),
            Reading::new("PV masked", 1.0, base + 7260.0),
            Reading::new("PV masked", 1.0, base + 7320.0),
        ],
    );
}

/// Film database with the composition attributes used for grouping.
pub fn write_film_db(path: &Path, films: &[(f64, &str, &str)]) {
    let headers = [
        "Film ID",
        "Matrix",
        "Solvent",
        "QD Type",
        "QD Batch",
        "QD Manufacturer",
        "QD Concentration (mg/g)",
        "Nominal Emission (nm)",
        "Manufactured",
        "Additives",
        "Additive concentration (%)",
        "Film Length (mm)",
        "Film width (mm)",
        "Comment",
    ];
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, header) in headers.iter().enumerate() {
        sheet.write_string(0, c as u16, *header).unwrap();
    }
    for (i, (id, matrix, qd)) in films.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, *id).unwrap();
        sheet.write_string(row, 1, *matrix).unwrap();
        sheet.write_string(row, 2, "toluene").unwrap();
        sheet.write_string(row, 3, *qd).unwrap();
        sheet.write_string(row, 4, "B1").unwrap();
        sheet.write_string(row, 5, "Acme").unwrap();
        sheet.write_number(row, 6, 0.5).unwrap();
        sheet.write_number(row, 7, 620.0).unwrap();
        sheet.write_string(row, 8, "2021-03-01").unwrap();
        sheet.write_string(row, 9, "none").unwrap();
        sheet.write_number(row, 10, 0.0).unwrap();
        sheet.write_number(row, 11, 100.0).unwrap();
        sheet.write_number(row, 12, 50.0).unwrap();
        sheet.write_string(row, 13, "ok").unwrap();
    }
    workbook.save(path).unwrap();
}

pub fn datetime(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn text(values: &[&str]) -> Column {
    Column::Text(values.iter().map(|v| Some(v.to_string())).collect())
}

pub fn floats(values: &[f64]) -> Column {
    Column::Float(Array1::from(values.to_vec()))
}

/// Raw-stage dataset keyed by (experiment, reading).
pub fn readings_dataset(experiments: &[&str], columns: Vec<(&str, Column)>) -> Dataset {
    let mut readings = Vec::new();
    let mut last: Option<&str> = None;
    let mut n = 0;
    for key in experiments {
        if last != Some(*key) {
            n = 0;
        }
        readings.push(n);
        n += 1;
        last = Some(*key);
    }
    let mut ds = Dataset::new(Index::Reading {
        experiments: experiments.iter().map(|k| k.to_string()).collect(),
        readings,
    });
    for (name, column) in columns {
        ds.insert(name, column).unwrap();
    }
    ds
}

/// Dataset with plain `0..n` row labels.
pub fn rows_dataset(len: usize, columns: Vec<(&str, Column)>) -> Dataset {
    let mut ds = Dataset::new(Index::range(len));
    for (name, column) in columns {
        ds.insert(name, column).unwrap();
    }
    ds
}
