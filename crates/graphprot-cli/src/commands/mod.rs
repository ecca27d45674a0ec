pub mod coarsen;
pub mod merge;
