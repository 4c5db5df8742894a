pub(crate) mod results;
pub(crate) mod students;
