pub mod config;
pub mod groups;
pub mod improve;
pub mod info;
pub mod merge;
pub mod pipeline;
