//! Fehlertypen fuer chorus-protocol

use thiserror::Error;

/// Ergebnis-Typ fuer Protokoll-Operationen
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Fehler beim Lesen oder Pruefen von Protokolldaten
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Datagramm zu kurz: {laenge} Bytes (mindestens {minimum})")]
    DatagrammZuKurz { laenge: usize, minimum: usize },

    #[error("Ungueltige Codec-Konfiguration: {0}")]
    UngueltigeKonfiguration(String),
}
