// Serializable views of traces for machine-readable output.

pub mod dto;
