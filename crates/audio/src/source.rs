//! Datenquellen fuer ausgehendes Audio
//!
//! Eine Voice-Engine fragt pro Sende-Takt ihre aktuelle Quelle nach dem
//! naechsten Opus-Frame. Quellen werden beim Ersetzen einer Engine an die
//! neue Engine weitergereicht; es besitzt immer genau eine Engine eine Quelle.
//!
//! - [`PcmVoiceDataSource`] – PCM-Frames ueber einen crossbeam-Kanal, Opus-Encoding
//!   beim Abholen
//! - [`SilenceDataSource`] – fuenf Opus-Stille-Frames, danach optional Rueckgabe
//!   einer vorherigen Quelle
//! - [`SendeQuelle`] – Zustandsverwaltung der aktiven Quelle einer Engine

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use thiserror::Error;
use tracing::{debug, error};

use crate::codec::OpusEncoder;

/// Standard-Puffergroesse einer PCM-Quelle in Frames
pub const STANDARD_PUFFER_FRAMES: usize = 15_000;

/// Opus-Frame fuer digitale Stille
pub const STILLE_FRAME: [u8; 3] = [0xF8, 0xFF, 0xFE];

/// Anzahl der Stille-Frames nach dem Ende einer Quelle
pub const STILLE_FRAMES: usize = 5;

// ---------------------------------------------------------------------------
// Trait und Status
// ---------------------------------------------------------------------------

/// Grund, warum eine Quelle keinen Frame liefert
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuellenStatus {
    /// Quelle ist erschoepft und geschlossen
    #[error("Quelle beendet")]
    Fertig,

    /// Momentan kein Frame verfuegbar
    #[error("Keine Daten verfuegbar")]
    KeineDaten,

    /// Stille-Quelle hat alle Frames geliefert
    #[error("Stille beendet")]
    StilleBeendet,

    #[error("Quellen-Fehler: {0}")]
    Fehler(String),
}

/// Lieferant kodierter Opus-Frames fuer eine Voice-Engine
pub trait VoiceDataSource: Send {
    /// Samples pro Kanal je Frame; bestimmt den RTP-Zeitstempel-Schritt
    fn frame_size(&self) -> usize;

    /// Naechster kodierter Frame
    fn naechster_frame(&mut self) -> Result<Vec<u8>, QuellenStatus>;

    /// Keine neuen Daten mehr annehmen; Gepuffertes wird noch geliefert
    fn beenden(&mut self);

    /// Beginnt mit dem Einlesen, falls die Quelle das braucht
    fn lesen_starten(&mut self) {}

    /// Nachfolgende Quelle nach `StilleBeendet`
    fn nachfolger_nehmen(&mut self) -> Option<Box<dyn VoiceDataSource>> {
        None
    }
}

impl fmt::Debug for dyn VoiceDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceDataSource")
            .field("frame_size", &self.frame_size())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PCM-Quelle
// ---------------------------------------------------------------------------

/// Einspeise-Seite einer [`PcmVoiceDataSource`]
///
/// Wird der letzte Einspeiser gedroppt, liefert die Quelle nach dem Leeren
/// des Puffers `Fertig`.
#[derive(Clone)]
pub struct PcmEinspeiser {
    tx: Sender<Vec<i16>>,
}

impl PcmEinspeiser {
    /// Reiht einen interleaved PCM-Frame ein; blockiert bei vollem Puffer
    pub fn senden(&self, frame: Vec<i16>) -> Result<(), QuellenStatus> {
        self.tx.send(frame).map_err(|_| QuellenStatus::Fertig)
    }

    /// Nicht-blockierende Variante; `false` wenn der Puffer voll oder geschlossen ist
    pub fn try_senden(&self, frame: Vec<i16>) -> bool {
        self.tx.try_send(frame).is_ok()
    }

    /// Anzahl wartender Frames
    pub fn wartend(&self) -> usize {
        self.tx.len()
    }
}

/// Quelle fuer PCM-Audio (48 kHz, interleaved i16)
pub struct PcmVoiceDataSource {
    encoder: OpusEncoder,
    frame_size: usize,
    rx: Receiver<Vec<i16>>,
    geschlossen: bool,
}

impl PcmVoiceDataSource {
    /// Erstellt Quelle und Einspeiser mit der Standard-Puffergroesse
    pub fn neu(encoder: OpusEncoder, frame_size: usize) -> (Self, PcmEinspeiser) {
        Self::mit_puffer(encoder, frame_size, STANDARD_PUFFER_FRAMES)
    }

    /// Erstellt Quelle und Einspeiser mit begrenztem Puffer
    pub fn mit_puffer(
        encoder: OpusEncoder,
        frame_size: usize,
        puffer_frames: usize,
    ) -> (Self, PcmEinspeiser) {
        let (tx, rx) = bounded(puffer_frames);
        let quelle = Self {
            encoder,
            frame_size,
            rx,
            geschlossen: false,
        };
        (quelle, PcmEinspeiser { tx })
    }

    /// Anzahl gepufferter Frames
    pub fn gepuffert(&self) -> usize {
        self.rx.len()
    }
}

impl VoiceDataSource for PcmVoiceDataSource {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn naechster_frame(&mut self) -> Result<Vec<u8>, QuellenStatus> {
        let pcm = match self.rx.try_recv() {
            Ok(pcm) => pcm,
            Err(TryRecvError::Empty) if self.geschlossen => return Err(QuellenStatus::Fertig),
            Err(TryRecvError::Empty) => return Err(QuellenStatus::KeineDaten),
            Err(TryRecvError::Disconnected) => return Err(QuellenStatus::Fertig),
        };

        self.encoder.encode(&pcm, self.frame_size).map_err(|e| {
            error!(fehler = %e, "PCM-Frame konnte nicht kodiert werden");
            QuellenStatus::Fehler(e.to_string())
        })
    }

    fn beenden(&mut self) {
        debug!(gepuffert = self.rx.len(), "PCM-Quelle wird geschlossen");
        self.geschlossen = true;
    }
}

// ---------------------------------------------------------------------------
// Stille-Quelle
// ---------------------------------------------------------------------------

/// Liefert fuenf Stille-Frames, um den Empfaenger-Decoder sauber abzuschliessen
///
/// Traegt optional die vorherige Quelle mit, die danach wieder aktiv wird.
pub struct SilenceDataSource {
    verbleibend: usize,
    vorherige: Option<Box<dyn VoiceDataSource>>,
}

impl SilenceDataSource {
    pub fn neu(vorherige: Option<Box<dyn VoiceDataSource>>) -> Self {
        Self {
            verbleibend: STILLE_FRAMES,
            vorherige,
        }
    }
}

impl VoiceDataSource for SilenceDataSource {
    fn frame_size(&self) -> usize {
        960
    }

    fn naechster_frame(&mut self) -> Result<Vec<u8>, QuellenStatus> {
        if self.verbleibend == 0 {
            return Err(QuellenStatus::StilleBeendet);
        }
        self.verbleibend -= 1;
        Ok(STILLE_FRAME.to_vec())
    }

    fn beenden(&mut self) {
        self.verbleibend = 0;
    }

    fn nachfolger_nehmen(&mut self) -> Option<Box<dyn VoiceDataSource>> {
        self.vorherige.take()
    }
}

// ---------------------------------------------------------------------------
// SendeQuelle
// ---------------------------------------------------------------------------

/// Ergebnis eines Sende-Takts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendeSchritt {
    /// Frame senden; Zeitstempel danach um `frame_size` erhoehen
    Senden { frame: Vec<u8>, frame_size: usize },
    /// In diesem Takt nichts senden (Sprechstatus zuruecksetzen)
    Pause,
    /// Keine Quelle mehr; beim Delegate eine neue anfordern
    NeueQuelleBenoetigt,
}

/// Aktive Quelle einer Engine samt Uebergaengen
///
/// Endet eine Quelle, folgen Stille-Frames; danach wird entweder die
/// mitgetragene Quelle wieder aktiv oder eine neue Quelle benoetigt.
#[derive(Default)]
pub struct SendeQuelle {
    aktiv: Option<Box<dyn VoiceDataSource>>,
}

impl SendeQuelle {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Setzt eine neue Quelle und startet deren Einlesen
    pub fn setzen(&mut self, mut quelle: Box<dyn VoiceDataSource>) {
        quelle.lesen_starten();
        self.aktiv = Some(quelle);
    }

    /// Schaltet Stille vor die bisherige Quelle (z.B. nach Uebernahme durch eine neue Engine)
    pub fn stille_voranstellen(&mut self) {
        let vorherige = self.aktiv.take();
        self.aktiv = Some(Box::new(SilenceDataSource::neu(vorherige)));
    }

    /// Entnimmt die Quelle zur Uebergabe an eine andere Engine
    pub fn nehmen(&mut self) -> Option<Box<dyn VoiceDataSource>> {
        self.aktiv.take()
    }

    pub fn hat_quelle(&self) -> bool {
        self.aktiv.is_some()
    }

    /// Fuehrt einen Sende-Takt aus
    pub fn takt(&mut self) -> SendeSchritt {
        let Some(quelle) = self.aktiv.as_mut() else {
            return SendeSchritt::Pause;
        };

        match quelle.naechster_frame() {
            Ok(frame) => SendeSchritt::Senden {
                frame,
                frame_size: quelle.frame_size(),
            },
            Err(QuellenStatus::KeineDaten) => SendeSchritt::Pause,
            Err(QuellenStatus::Fertig) => {
                debug!("Quelle beendet, sende Stille");
                self.aktiv = Some(Box::new(SilenceDataSource::neu(None)));
                SendeSchritt::Pause
            }
            Err(QuellenStatus::StilleBeendet) => match quelle.nachfolger_nehmen() {
                Some(vorherige) => {
                    debug!("Stille beendet, vorherige Quelle wieder aktiv");
                    self.aktiv = Some(vorherige);
                    SendeSchritt::Pause
                }
                None => {
                    debug!("Stille beendet, neue Quelle benoetigt");
                    self.aktiv = None;
                    SendeSchritt::NeueQuelleBenoetigt
                }
            },
            Err(QuellenStatus::Fehler(e)) => {
                error!(fehler = %e, "Fehler beim Abrufen der Voice-Daten");
                SendeSchritt::Pause
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_protocol::codec::CodecConfig;

    fn pcm_quelle(puffer: usize) -> (PcmVoiceDataSource, PcmEinspeiser) {
        let encoder = OpusEncoder::new(&CodecConfig::default()).unwrap();
        PcmVoiceDataSource::mit_puffer(encoder, 960, puffer)
    }

    #[test]
    fn pcm_quelle_kodiert_frames() {
        let (mut quelle, einspeiser) = pcm_quelle(4);
        assert_eq!(quelle.naechster_frame(), Err(QuellenStatus::KeineDaten));

        einspeiser.senden(vec![0i16; 960 * 2]).unwrap();
        assert_eq!(quelle.gepuffert(), 1);
        let frame = quelle.naechster_frame().unwrap();
        assert!(!frame.is_empty());
    }

    #[test]
    fn pcm_quelle_puffer_begrenzt() {
        let (_quelle, einspeiser) = pcm_quelle(2);
        assert!(einspeiser.try_senden(vec![0; 1920]));
        assert!(einspeiser.try_senden(vec![0; 1920]));
        assert!(!einspeiser.try_senden(vec![0; 1920]));
        assert_eq!(einspeiser.wartend(), 2);
    }

    #[test]
    fn pcm_quelle_fertig_nach_einspeiser_drop() {
        let (mut quelle, einspeiser) = pcm_quelle(4);
        einspeiser.senden(vec![0; 1920]).unwrap();
        drop(einspeiser);

        assert!(quelle.naechster_frame().is_ok());
        assert_eq!(quelle.naechster_frame(), Err(QuellenStatus::Fertig));
    }

    #[test]
    fn pcm_quelle_beenden() {
        let (mut quelle, _einspeiser) = pcm_quelle(4);
        quelle.beenden();
        assert_eq!(quelle.naechster_frame(), Err(QuellenStatus::Fertig));
    }

    #[test]
    fn pcm_quelle_falsche_frame_laenge() {
        let (mut quelle, einspeiser) = pcm_quelle(4);
        einspeiser.senden(vec![0; 10]).unwrap();
        assert!(matches!(
            quelle.naechster_frame(),
            Err(QuellenStatus::Fehler(_))
        ));
    }

    #[test]
    fn stille_liefert_fuenf_frames() {
        let mut stille = SilenceDataSource::neu(None);
        for _ in 0..STILLE_FRAMES {
            assert_eq!(stille.naechster_frame().unwrap(), STILLE_FRAME.to_vec());
        }
        assert_eq!(stille.naechster_frame(), Err(QuellenStatus::StilleBeendet));
        assert!(stille.nachfolger_nehmen().is_none());
    }

    #[test]
    fn sende_quelle_ablauf_bis_neue_quelle() {
        let (quelle, einspeiser) = pcm_quelle(4);
        let mut sende = SendeQuelle::neu();
        sende.setzen(Box::new(quelle));

        einspeiser.senden(vec![0; 1920]).unwrap();
        drop(einspeiser);

        assert!(matches!(
            sende.takt(),
            SendeSchritt::Senden { frame_size: 960, .. }
        ));
        // Quelle erschoepft -> Stille
        assert_eq!(sende.takt(), SendeSchritt::Pause);
        for _ in 0..STILLE_FRAMES {
            assert!(matches!(sende.takt(), SendeSchritt::Senden { .. }));
        }
        assert_eq!(sende.takt(), SendeSchritt::NeueQuelleBenoetigt);
        assert!(!sende.hat_quelle());
    }

    #[test]
    fn stille_vor_uebernommener_quelle() {
        let (quelle, einspeiser) = pcm_quelle(4);
        let mut sende = SendeQuelle::neu();
        sende.setzen(Box::new(quelle));
        sende.stille_voranstellen();

        for _ in 0..STILLE_FRAMES {
            assert!(matches!(sende.takt(), SendeSchritt::Senden { .. }));
        }
        // Vorherige Quelle wird wieder aktiv
        assert_eq!(sende.takt(), SendeSchritt::Pause);
        einspeiser.senden(vec![0; 1920]).unwrap();
        assert!(matches!(sende.takt(), SendeSchritt::Senden { .. }));
    }
}
