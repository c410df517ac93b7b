pub mod cache;
pub mod xlsx;

pub use cache::{Stage, StageCache};
pub use xlsx::{read_dataset, read_table, write_dataset};
