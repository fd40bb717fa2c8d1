//! Fehlertypen fuer chorus-voice

use chorus_audio::AudioError;
use chorus_protocol::ProtocolError;
use thiserror::Error;

/// Ergebnis-Typ fuer Voice-Operationen
pub type VoiceResult<T> = std::result::Result<T, VoiceError>;

/// Fehler im Voice-Stack
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtocolError),

    #[error("Audiofehler: {0}")]
    Audio(#[from] AudioError),

    #[error("Verbindung fehlgeschlagen: {0}")]
    Verbindung(String),
}
