// Price bars and validation
pub mod bar;

// Feature table types
pub mod features;

// Domain-specific error types
pub mod errors;

// Port interfaces
pub mod ports;

// Prediction output types
pub mod prediction;

// Signal classes and probability mapping
pub mod signal;
