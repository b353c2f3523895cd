/// Landmark CSV reader and writer module.
pub mod csv;
