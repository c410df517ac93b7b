pub mod average;
pub mod groups;

pub use average::{average_by, average_by_experiment, mean_std};
pub use groups::{assign_group_codes, factorize};
