pub mod aggregate;
pub mod consts;
pub mod correct;
pub mod dataset;
pub mod efficiency;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod report;
