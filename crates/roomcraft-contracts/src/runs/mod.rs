pub mod naming;
pub mod report;
