/// Aggregation layer: pure statistics over a slice of records.
///
/// Every function takes already-filtered records and returns plain data
/// (vectors and maps) ready for charting. Empty input yields empty or zero
/// results; only statistically undefined quantities return an error.

pub mod counts;
pub mod density;
pub mod groups;
pub mod histogram;
