// Instruments and bar data
pub mod market;

// Near-high signals
pub mod signal;

// Persisted watchlist rows
pub mod watchlist;

// Price alert rules
pub mod alert;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
