pub(crate) mod schedule;
pub(crate) mod working;
