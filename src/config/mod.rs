// src/config/mod.rs
pub mod curation;

pub use curation::{load_default, load_from, CurationConfig};
