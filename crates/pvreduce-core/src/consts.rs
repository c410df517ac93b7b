/// Standard test condition temperature in degrees Celsius.
pub const REFERENCE_TEMPERATURE: f64 = 25.0;

/// Relative Isc temperature coefficient (per degree C).
pub const ISC_TEMP_COEFF: f64 = 0.0006;

/// Absolute Voc temperature coefficient (mV per degree C).
pub const VOC_TEMP_COEFF: f64 = 2.2;

/// Relative Pmax temperature coefficient (per degree C).
pub const PMAX_TEMP_COEFF: f64 = 0.0045;

/// File name of the per-experiment summary written by the IV tracer.
pub const SUMMARY_FILE_NAME: &str = "IV_Summary.xlsx";

/// File name used for the film-database merge output and for merged files.
pub const PROCESSED_FILE_NAME: &str = "Processed_IV.xlsx";

/// Raw electrical readings, in the order fits and corrections report them.
pub const RAW_METRICS: [&str; 3] = ["isc_fit", "voc_fit", "pmax_fit"];

/// Columns every source summary sheet must carry.
pub const REQUIRED_SOURCE_COLUMNS: [&str; 9] = [
    "timestamp",
    "isc_fit",
    "voc_fit",
    "pmax_fit",
    "t_sample",
    "name",
    "film_id",
    "t_room",
    "rh_room",
];

/// Instrument and diagnostic columns not needed past ingestion.
pub const INSTRUMENT_COLUMNS: [&str; 14] = [
    "Unnamed: 0",
    "count",
    "cycle",
    "cell_id",
    "location",
    "cal_date",
    "cal_value",
    "pid_pb",
    "pid_int",
    "pid_der",
    "pid_fuoc",
    "pid_tcr1",
    "pid_tcr2",
    "pid_sp",
];

/// Film-database key column.
pub const FILM_ID_COLUMN: &str = "Film ID";

/// Film-database columns dropped after the join.
pub const FILM_REDUNDANT_COLUMNS: [&str; 4] = [
    "Film ID",
    "Film Length (mm)",
    "Film width (mm)",
    "Comment",
];

/// Film attributes that together define a group, in key order.
pub const GROUP_ATTRIBUTES: [&str; 8] = [
    "Matrix",
    "Solvent",
    "QD Type",
    "QD Batch",
    "QD Manufacturer",
    "QD Concentration (mg/g)",
    "Nominal Emission (nm)",
    "Manufactured",
];

/// Film attributes listed in the group summary table.
pub const SUMMARY_ATTRIBUTES: [&str; 7] = [
    "Matrix",
    "QD Type",
    "Nominal Emission (nm)",
    "QD Concentration (mg/g)",
    "Solvent",
    "Additives",
    "Additive concentration (%)",
];

/// Separator between attribute values in a composite group key.
pub const GROUP_KEY_SEPARATOR: char = '\u{1f}';

/// Number format applied to datetime cells in written spreadsheets.
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
