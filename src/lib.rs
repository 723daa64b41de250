pub mod cli;
pub mod error;
pub mod export;
pub mod git;
pub mod model;
pub mod period;
pub mod report;
pub mod run;
pub mod stats;
