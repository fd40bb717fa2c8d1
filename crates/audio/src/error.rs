//! Fehlertypen fuer Codec und Dekodierung

use thiserror::Error;

/// Alle moeglichen Fehler von Codec und Dekodier-Zustandsmaschine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Nativer Codec-Kontext konnte nicht erstellt oder konfiguriert werden
    #[error("Codec-Erstellung fehlgeschlagen: {0}")]
    Erstellung(String),

    #[error("Encoding fehlgeschlagen: {0}")]
    Encode(String),

    /// Auch fuer veraltete und luecken-behaftete Pakete
    #[error("Decoding fehlgeschlagen: {0}")]
    Decode(String),

    /// Erstes Paket einer Quelle; Zustand ist jetzt initialisiert
    #[error("Erstes Paket von SSRC {ssrc}, noch kein Audio")]
    InitialesPaket { ssrc: u32 },
}

pub type AudioResult<T> = Result<T, AudioError>;
