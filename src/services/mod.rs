pub(crate) mod grading;
pub(crate) mod result_filters;
pub(crate) mod result_ingest;
pub(crate) mod result_stats;
