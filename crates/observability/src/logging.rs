//! Logging-Setup via tracing-subscriber
//!
//! Umgebungsvariablen haben Vorrang vor den uebergebenen Werten:
//! - `CHORUS_LOG_LEVEL`: Filter-Direktive (`info`, `chorus_audio=debug`, ...)
//! - `CHORUS_LOG_FORMAT`: `text` oder `json`

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const LEVEL_VARIABLE: &str = "CHORUS_LOG_LEVEL";
pub const FORMAT_VARIABLE: &str = "CHORUS_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unbekanntes Log-Format: '{0}' (erlaubt: text, json)")]
    UnbekanntesFormat(String),

    #[error("Logging bereits initialisiert: {0}")]
    BereitsInitialisiert(String),
}

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::UnbekanntesFormat(s.to_string())),
        }
    }
}

/// Bestimmt Filter-Direktive und Format aus Umgebung und Vorgaben
pub fn einstellungen_ermitteln(level: &str, format: &str) -> (String, LogFormat) {
    let level = std::env::var(LEVEL_VARIABLE)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| level.to_string());

    let format_text = std::env::var(FORMAT_VARIABLE).unwrap_or_else(|_| format.to_string());
    let format = format_text.parse().unwrap_or_else(|e: LoggingError| {
        eprintln!("{e}, verwende text");
        LogFormat::Text
    });

    (level, format)
}

/// Initialisiert den globalen Subscriber
///
/// Ungueltige Filter-Direktiven fallen auf `info` zurueck. Ein zweiter
/// Aufruf liefert `BereitsInitialisiert` statt zu paniken.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingError> {
    let (level, format) = einstellungen_ermitteln(level, format);
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    ergebnis.map_err(|e| LoggingError::BereitsInitialisiert(e.to_string()))?;
    tracing::debug!(level = %level, format = ?format, "Logging initialisiert");
    Ok(())
}
