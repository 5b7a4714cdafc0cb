pub mod analyze;
pub mod compare;
pub mod correlate;
pub mod dataset;
pub mod run;
pub mod script;
pub mod versus;
