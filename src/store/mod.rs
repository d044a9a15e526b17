pub mod counters;
pub mod pins;
pub mod saved;
