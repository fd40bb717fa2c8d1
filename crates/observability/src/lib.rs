//! chorus-observability – Strukturiertes Logging
//!
//! Einheitliches tracing-Setup fuer alle chorus-Binaries.

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat, LoggingError};
