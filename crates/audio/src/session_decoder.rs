//! Dekodier-Zustandsmaschine pro Voice-Session
//!
//! Haelt pro SSRC einen eigenen Opus-Decoder und verfolgt Sequenznummer und
//! Zeitstempel des zuletzt gesehenen Pakets.
//!
//! ## Ablauf pro Paket
//! 1. Erstes Paket einer Quelle: Zustand merken, `InitialesPaket`
//! 2. Sequenz = letzte + 1: dekodieren mit `frame_size = ts - letzter_ts`
//! 3. Sequenz aelter oder gleich: verwerfen, Zustand bleibt
//! 4. Vorwaerts-Luecke: Zustand nachziehen, je fehlendem Paket ein
//!    Verschleierungs-Decode (Ausgabe verworfen), dann `Decode`
//!
//! Nicht thread-safe: Aufrufer muessen `decode` pro Instanz serialisieren.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::codec::OpusDecoder;
use crate::error::{AudioError, AudioResult};
use chorus_protocol::codec::{ChannelCount, CodecConfig, SampleRate};
use chorus_protocol::rtp::RtpPacket;

// ---------------------------------------------------------------------------
// Dekodiertes Paket
// ---------------------------------------------------------------------------

/// Erfolgreich dekodiertes Voice-Paket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedVoicePacket {
    pub sequence: u16,
    pub ssrc: u32,
    pub timestamp: u32,
    /// Interleaved i16-PCM (48 kHz Stereo)
    pub samples: Vec<i16>,
}

// ---------------------------------------------------------------------------
// Statistiken
// ---------------------------------------------------------------------------

/// Zaehler einer Session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStatistik {
    /// Erfolgreich dekodierte Pakete
    pub dekodiert: u64,
    /// Erste Pakete neuer Quellen
    pub initiale_pakete: u64,
    /// Veraltete oder doppelte Pakete
    pub veraltet: u64,
    /// Erkannte Vorwaerts-Luecken
    pub luecken: u64,
    /// Ausgefuehrte Verschleierungs-Decodes
    pub verschleiert: u64,
    /// Fehlgeschlagene Decodes regulaerer Pakete
    pub fehlgeschlagen: u64,
}

impl DecoderStatistik {
    /// Anteil verschleierter Frames an allen Frames (0.0–1.0)
    pub fn verlust_rate(&self) -> f64 {
        let gesamt = self.dekodiert + self.verschleiert;
        if gesamt == 0 {
            0.0
        } else {
            self.verschleiert as f64 / gesamt as f64
        }
    }
}

// ---------------------------------------------------------------------------
// SessionDecoder
// ---------------------------------------------------------------------------

/// Zustand einer einzelnen Quelle
struct DecoderSlot {
    decoder: OpusDecoder,
    letzte_sequenz: Option<u16>,
    letzter_timestamp: Option<u32>,
}

/// Dekodiert eingehende Pakete aller Quellen einer Voice-Session
pub struct SessionDecoder {
    config: CodecConfig,
    slots: HashMap<u32, DecoderSlot>,
    statistik: DecoderStatistik,
}

impl SessionDecoder {
    /// Erstellt eine Session mit der gegebenen Konfiguration
    ///
    /// Quellen werden immer mit 48 kHz Stereo dekodiert; Gain und
    /// Verschleierungs-Frame-Groesse kommen aus `config`.
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config: CodecConfig {
                sample_rate: SampleRate::Hz48000,
                channels: ChannelCount::Stereo,
                ..config
            },
            slots: HashMap::new(),
            statistik: DecoderStatistik::default(),
        }
    }

    /// Dekodiert ein Paket
    ///
    /// # Fehler
    /// - `InitialesPaket` beim ersten Paket einer Quelle
    /// - `Decode` bei veralteten Paketen, Luecken oder Codec-Fehlern
    /// - `Erstellung` wenn der Decoder fuer eine neue Quelle nicht erstellt werden kann
    pub fn decode(&mut self, paket: &RtpPacket) -> AudioResult<DecodedVoicePacket> {
        let ssrc = paket.ssrc();
        let seq = paket.sequence();
        let ts = paket.timestamp();

        let slot = match self.slots.entry(ssrc) {
            std::collections::hash_map::Entry::Occupied(e) => {
                trace!(ssrc, seq, ts, "Decoder wiederverwendet");
                e.into_mut()
            }
            std::collections::hash_map::Entry::Vacant(e) => {
                debug!(ssrc, seq, ts, "Neuer Decoder fuer Quelle");
                e.insert(DecoderSlot {
                    decoder: OpusDecoder::new(&self.config)?,
                    letzte_sequenz: None,
                    letzter_timestamp: None,
                })
            }
        };

        let (letzte_seq, letzter_ts) = match (slot.letzte_sequenz, slot.letzter_timestamp) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                slot.letzte_sequenz = Some(seq);
                slot.letzter_timestamp = Some(ts);
                self.statistik.initiale_pakete += 1;
                return Err(AudioError::InitialesPaket { ssrc });
            }
        };

        let abstand = seq.wrapping_sub(letzte_seq);

        if abstand == 1 {
            let frame_size = ts.wrapping_sub(letzter_ts) as usize;
            let samples = match slot.decoder.decode(Some(paket.payload()), frame_size) {
                Ok(samples) => samples,
                Err(e) => {
                    self.statistik.fehlgeschlagen += 1;
                    return Err(e);
                }
            };

            slot.letzte_sequenz = Some(seq);
            slot.letzter_timestamp = Some(ts);
            self.statistik.dekodiert += 1;

            return Ok(DecodedVoicePacket {
                sequence: seq,
                ssrc,
                timestamp: ts,
                samples,
            });
        }

        if ist_sequenz_alt(abstand) {
            self.statistik.veraltet += 1;
            trace!(ssrc, seq, letzte_seq, "Veraltetes Paket verworfen");
            return Err(AudioError::Decode(format!(
                "Veraltetes Paket: Sequenz {seq}, zuletzt {letzte_seq}"
            )));
        }

        slot.letzte_sequenz = Some(seq);
        slot.letzter_timestamp = Some(ts);

        let fehlend = abstand - 1;
        debug!(ssrc, seq, letzte_seq, fehlend, "Luecke in Paketfolge");

        let frame_size = self.config.concealment_frame_size as usize;
        for _ in 0..fehlend {
            // Ausgabe dient nur der Synchronisation des Decoder-Zustands
            if slot.decoder.decode_plc(frame_size).is_ok() {
                self.statistik.verschleiert += 1;
            }
        }
        self.statistik.luecken += 1;

        Err(AudioError::Decode(format!(
            "Luecke vor Sequenz {seq}: {fehlend} Pakete fehlen"
        )))
    }

    /// Letzte bekannte Sequenznummer einer Quelle
    pub fn letzte_sequenz(&self, ssrc: u32) -> Option<u16> {
        self.slots.get(&ssrc).and_then(|s| s.letzte_sequenz)
    }

    /// Anzahl bekannter Quellen
    pub fn quellen_anzahl(&self) -> usize {
        self.slots.len()
    }

    /// Entfernt eine Quelle samt Decoder
    pub fn quelle_entfernen(&mut self, ssrc: u32) -> bool {
        self.slots.remove(&ssrc).is_some()
    }

    pub fn statistik(&self) -> &DecoderStatistik {
        &self.statistik
    }
}

impl Default for SessionDecoder {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

/// `true` wenn der Abstand auf ein gleiches oder aelteres Paket zeigt
fn ist_sequenz_alt(abstand: u16) -> bool {
    abstand == 0 || abstand > u16::MAX / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::OpusEncoder;

    const SSRC: u32 = 0xABCD;

    fn opus_frame(enc: &mut OpusEncoder) -> Vec<u8> {
        let pcm: Vec<i16> = (0..960 * 2)
            .map(|i| ((i as f32 / 30.0).sin() * 6000.0) as i16)
            .collect();
        enc.encode(&pcm, 960).unwrap()
    }

    fn paket(enc: &mut OpusEncoder, seq: u16, ts: u32) -> RtpPacket {
        RtpPacket::new(seq, ts, SSRC, opus_frame(enc))
    }

    fn encoder() -> OpusEncoder {
        OpusEncoder::new(&CodecConfig::default()).unwrap()
    }

    #[test]
    fn erstes_paket_ist_initial() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();
        let fehler = session.decode(&paket(&mut enc, 10, 0)).unwrap_err();
        assert_eq!(fehler, AudioError::InitialesPaket { ssrc: SSRC });
        assert_eq!(session.letzte_sequenz(SSRC), Some(10));
        assert_eq!(session.statistik().initiale_pakete, 1);
    }

    #[test]
    fn fortlaufende_folge_dekodiert() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, 100, 0)).is_err());
        for i in 1..5u16 {
            let decoded = session
                .decode(&paket(&mut enc, 100 + i, u32::from(i) * 960))
                .unwrap();
            assert_eq!(decoded.sequence, 100 + i);
            assert_eq!(decoded.ssrc, SSRC);
            assert_eq!(decoded.samples.len(), 960 * 2);
        }
        assert_eq!(session.statistik().dekodiert, 4);
    }

    #[test]
    fn sequenz_ueberlauf() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, u16::MAX, u32::MAX - 959)).is_err());
        let decoded = session.decode(&paket(&mut enc, 0, 1)).unwrap();
        assert_eq!(decoded.sequence, 0);
        assert_eq!(decoded.samples.len(), 960 * 2);
    }

    #[test]
    fn veraltetes_paket_aendert_zustand_nicht() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, 50, 0)).is_err());
        session.decode(&paket(&mut enc, 51, 960)).unwrap();

        let fehler = session.decode(&paket(&mut enc, 50, 0)).unwrap_err();
        assert!(matches!(fehler, AudioError::Decode(_)));
        assert_eq!(session.letzte_sequenz(SSRC), Some(51));

        // Duplikat ebenfalls verworfen
        assert!(session.decode(&paket(&mut enc, 51, 960)).is_err());
        assert_eq!(session.statistik().veraltet, 2);

        session.decode(&paket(&mut enc, 52, 1920)).unwrap();
    }

    #[test]
    fn luecke_zieht_zustand_nach() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, 7, 0)).is_err());
        session.decode(&paket(&mut enc, 8, 960)).unwrap();

        let fehler = session.decode(&paket(&mut enc, 11, 3840)).unwrap_err();
        assert!(matches!(fehler, AudioError::Decode(_)));
        assert_eq!(session.letzte_sequenz(SSRC), Some(11));
        assert_eq!(session.statistik().luecken, 1);
        assert_eq!(session.statistik().verschleiert, 2);

        let decoded = session.decode(&paket(&mut enc, 12, 4800)).unwrap();
        assert_eq!(decoded.sequence, 12);
    }

    #[test]
    fn rueckwaerts_laufender_zeitstempel() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, 20, 1000)).is_err());

        // Sequenz +1, Zeitstempel -1: Frame-Groesse waere u32::MAX
        let fehler = session.decode(&paket(&mut enc, 21, 999)).unwrap_err();
        assert!(matches!(fehler, AudioError::Decode(_)));
        assert_eq!(session.letzte_sequenz(SSRC), Some(20));
        assert_eq!(session.statistik().fehlgeschlagen, 1);

        // Zustand unveraendert: naechstes Paket rechnet ab ts 1000
        let decoded = session.decode(&paket(&mut enc, 21, 1960)).unwrap();
        assert_eq!(decoded.samples.len(), 960 * 2);
    }

    #[test]
    fn veraltet_ueber_den_ueberlauf() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, 0, 0)).is_err());
        session.decode(&paket(&mut enc, 1, 960)).unwrap();

        let fehler = session.decode(&paket(&mut enc, u16::MAX, 0)).unwrap_err();
        assert!(matches!(fehler, AudioError::Decode(_)));
        assert_eq!(session.letzte_sequenz(SSRC), Some(1));
        assert_eq!(session.statistik().veraltet, 1);
        assert_eq!(session.statistik().luecken, 0);
    }

    #[test]
    fn luecke_ueber_den_ueberlauf() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, 65533, 0)).is_err());
        session.decode(&paket(&mut enc, 65534, 960)).unwrap();

        // 65535, 0 und 1 fehlen
        let fehler = session.decode(&paket(&mut enc, 2, 4 * 960)).unwrap_err();
        assert!(matches!(fehler, AudioError::Decode(_)));
        assert_eq!(session.letzte_sequenz(SSRC), Some(2));
        assert_eq!(session.statistik().luecken, 1);
        assert_eq!(session.statistik().verschleiert, 3);

        assert_eq!(session.decode(&paket(&mut enc, 3, 5 * 960)).unwrap().sequence, 3);
    }

    #[test]
    fn quellen_getrennt() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&RtpPacket::new(1, 0, 1, opus_frame(&mut enc))).is_err());
        assert!(session.decode(&RtpPacket::new(1, 0, 2, opus_frame(&mut enc))).is_err());
        assert!(session.decode(&RtpPacket::new(2, 960, 1, opus_frame(&mut enc))).is_ok());
        assert_eq!(session.quellen_anzahl(), 2);

        assert!(session.quelle_entfernen(2));
        assert_eq!(session.quellen_anzahl(), 1);
    }

    #[test]
    fn leere_nutzdaten_werden_verschleiert() {
        let mut enc = encoder();
        let mut session = SessionDecoder::default();

        assert!(session.decode(&paket(&mut enc, 1, 0)).is_err());
        let decoded = session.decode(&RtpPacket::new(2, 960, SSRC, Vec::new())).unwrap();
        assert_eq!(decoded.samples.len(), 960 * 2);
    }

    #[test]
    fn verlust_rate() {
        let statistik = DecoderStatistik {
            dekodiert: 3,
            verschleiert: 1,
            ..Default::default()
        };
        assert!((statistik.verlust_rate() - 0.25).abs() < f64::EPSILON);
        assert_eq!(DecoderStatistik::default().verlust_rate(), 0.0);
    }
}
