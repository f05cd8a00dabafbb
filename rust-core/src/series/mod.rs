//! Sample series input: table access and preprocessing

pub mod preprocess;
pub mod table;

pub use preprocess::{detrend_linear, prepare, PreparedSeries, TimeRange};
pub use table::{Column, DataTable, SampleTable};
