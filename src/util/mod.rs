pub mod dedup;
pub mod human;
pub mod json;
pub mod logfiles;
pub mod matcher;
pub mod report;
