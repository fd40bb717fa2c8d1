//! Empfangspfad einer Voice-Engine
//!
//! Nimmt entschluesselte Datagramme entgegen, parst den RTP-Header und
//! reicht das Paket je nach [`EngineConfig`] als Opus oder dekodiert als
//! PCM an den Engine-Delegate weiter.
//!
//! Erste Pakete und nicht dekodierbare Pakete sind im normalen Betrieb
//! erwartbar und werden nur protokolliert. Alle anderen Fehler gehen an die
//! Engine zurueck, die daraufhin die Verbindung trennen sollte.

use std::sync::Arc;

use chorus_audio::{AudioError, DecoderStatistik, SessionDecoder};
use chorus_protocol::rtp::RtpPacket;

use crate::delegate::VoiceEngineDelegate;
use crate::engine::{EngineConfig, VoiceEngine};
use crate::error::VoiceResult;

/// Was mit einem Datagramm passiert ist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Empfang {
    /// Opus-Paket weitergereicht
    Opus,
    /// Dekodiertes PCM weitergereicht
    Pcm,
    /// Empfang abgeschaltet, Datagramm ignoriert
    Ignoriert,
    /// Erstes Paket oder Decode-Fehler, nichts weitergereicht
    Verworfen,
}

/// Empfangszustand einer Engine (nicht thread-safe, eine Instanz pro Engine)
pub struct VoiceReceiver {
    config: EngineConfig,
    decoder: SessionDecoder,
}

impl VoiceReceiver {
    pub fn neu(config: EngineConfig) -> Self {
        let decoder = SessionDecoder::new(config.codec.clone());
        Self { config, decoder }
    }

    /// Verarbeitet ein eingehendes, bereits entschluesseltes Datagramm
    ///
    /// # Fehler
    /// - Protokollfehler bei zu kurzen Datagrammen
    /// - `Erstellung` wenn kein Decoder fuer eine neue Quelle erstellt werden kann
    pub fn datagramm_verarbeiten(
        &mut self,
        engine: &Arc<dyn VoiceEngine>,
        delegate: &dyn VoiceEngineDelegate,
        datagramm: &[u8],
    ) -> VoiceResult<Empfang> {
        if !self.config.stimme_empfangen {
            return Ok(Empfang::Ignoriert);
        }

        let paket = RtpPacket::parse(datagramm)?;

        if !self.config.stimme_dekodieren {
            delegate.opus_data(engine, paket);
            return Ok(Empfang::Opus);
        }

        match self.decoder.decode(&paket) {
            Ok(dekodiert) => {
                delegate.raw_data(engine, dekodiert);
                Ok(Empfang::Pcm)
            }
            Err(AudioError::InitialesPaket { ssrc }) => {
                tracing::debug!(ssrc, "Erstes Paket einer Quelle empfangen");
                Ok(Empfang::Verworfen)
            }
            Err(AudioError::Decode(grund)) => {
                tracing::debug!(ssrc = paket.ssrc(), grund = %grund, "Paket nicht dekodiert");
                Ok(Empfang::Verworfen)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn statistik(&self) -> &DecoderStatistik {
        self.decoder.statistik()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
