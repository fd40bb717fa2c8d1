//! RTP-Frames fuer die Voice-Uebertragung (UDP)
//!
//! Eingehende Datagramme werden nur minimal interpretiert: Sequenznummer,
//! Zeitstempel und SSRC. Padding, Extensions und CSRC-Listen werden nicht
//! ausgewertet, die ersten 12 Bytes gelten immer als Header.
//!
//! ## Paketformat (Header = 12 Bytes, big-endian)
//!
//! ```text
//! Offset  Len  Beschreibung
//! ------  ---  -----------
//!  0       1   Version/Flags (beim Senden 0x80)
//!  1       1   Payload-Typ (beim Senden 0x78)
//!  2       2   Sequenznummer
//!  4       4   Zeitstempel (Samples pro Kanal)
//!  8       4   SSRC – Synchronisation Source
//! 12+      N   Nutzdaten (Opus-Bytes, darf leer sein)
//! ```

use crate::error::{ProtocolError, ProtocolResult};

/// Laenge des festen RTP-Headers in Bytes
pub const RTP_HEADER_LAENGE: usize = 12;

/// Erstes Header-Byte ausgehender Pakete (RTP-Version 2)
pub const RTP_VERSION_BYTE: u8 = 0x80;

/// Payload-Typ ausgehender Opus-Pakete
pub const RTP_PAYLOAD_TYP: u8 = 0x78;

// ---------------------------------------------------------------------------
// RtpPacket (eingehend)
// ---------------------------------------------------------------------------

/// Geparstes, unveraenderliches Voice-Paket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    sequence: u16,
    timestamp: u32,
    ssrc: u32,
    payload: Vec<u8>,
}

impl RtpPacket {
    /// Erstellt ein Paket aus bereits bekannten Feldern
    pub fn new(sequence: u16, timestamp: u32, ssrc: u32, payload: Vec<u8>) -> Self {
        Self {
            sequence,
            timestamp,
            ssrc,
            payload,
        }
    }

    /// Parst ein rohes Datagramm
    ///
    /// # Fehler
    /// - `DatagrammZuKurz` wenn weniger als 12 Bytes vorliegen
    pub fn parse(datagramm: &[u8]) -> ProtocolResult<Self> {
        if datagramm.len() < RTP_HEADER_LAENGE {
            return Err(ProtocolError::DatagrammZuKurz {
                laenge: datagramm.len(),
                minimum: RTP_HEADER_LAENGE,
            });
        }

        let sequence = u16::from_be_bytes([datagramm[2], datagramm[3]]);
        let timestamp =
            u32::from_be_bytes([datagramm[4], datagramm[5], datagramm[6], datagramm[7]]);
        let ssrc = u32::from_be_bytes([datagramm[8], datagramm[9], datagramm[10], datagramm[11]]);

        Ok(Self {
            sequence,
            timestamp,
            ssrc,
            payload: datagramm[RTP_HEADER_LAENGE..].to_vec(),
        })
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    /// Opus-Nutzdaten; leer bei verlorenem oder leerem Frame
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Gibt die Nutzdaten unter Aufgabe des Pakets zurueck
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

// ---------------------------------------------------------------------------
// RtpHeader (ausgehend)
// ---------------------------------------------------------------------------

/// Header eines ausgehenden Voice-Pakets
///
/// Direkte Byte-Serialisierung, kein serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpHeader {
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
}

impl RtpHeader {
    /// Serialisiert den Header in ein 12-Byte-Array
    pub fn encode(&self) -> [u8; RTP_HEADER_LAENGE] {
        let mut buf = [0u8; RTP_HEADER_LAENGE];
        buf[0] = RTP_VERSION_BYTE;
        buf[1] = RTP_PAYLOAD_TYP;
        buf[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        buf[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[8..12].copy_from_slice(&self.ssrc.to_be_bytes());
        buf
    }

    /// Baut ein komplettes Datagramm aus Header und Nutzdaten
    pub fn mit_nutzdaten(&self, nutzdaten: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RTP_HEADER_LAENGE + nutzdaten.len());
        buf.extend_from_slice(&self.encode());
        buf.extend_from_slice(nutzdaten);
        buf
    }
}

/// Fortlaufende Header-Erzeugung fuer einen Sender
///
/// Nach jedem Paket steigt die Sequenznummer um 1 und der Zeitstempel um
/// die Frame-Groesse; beide laufen modular ueber.
#[derive(Debug, Clone)]
pub struct RtpSequencer {
    ssrc: u32,
    sequence: u16,
    timestamp: u32,
}

impl RtpSequencer {
    /// Erstellt einen Sequencer mit Startwerten
    ///
    /// Die Startwerte sollten zufaellig gewaehlt werden; das ist Sache des
    /// Aufrufers.
    pub fn neu(ssrc: u32, start_sequence: u16, start_timestamp: u32) -> Self {
        Self {
            ssrc,
            sequence: start_sequence,
            timestamp: start_timestamp,
        }
    }

    /// Header fuer das naechste Paket; schaltet danach weiter
    pub fn naechster_header(&mut self, frame_size: u32) -> RtpHeader {
        let header = RtpHeader {
            sequence: self.sequence,
            timestamp: self.timestamp,
            ssrc: self.ssrc,
        };
        self.sequence = self.sequence.wrapping_add(1);
        self.timestamp = self.timestamp.wrapping_add(frame_size);
        header
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_liest_header_felder() {
        let mut datagramm = vec![0x80, 0x78, 0x12, 0x34, 0, 0, 0x03, 0xC0, 0xDE, 0xAD, 0xBE, 0xEF];
        datagramm.extend_from_slice(&[1, 2, 3]);

        let paket = RtpPacket::parse(&datagramm).unwrap();
        assert_eq!(paket.sequence(), 0x1234);
        assert_eq!(paket.timestamp(), 960);
        assert_eq!(paket.ssrc(), 0xDEADBEEF);
        assert_eq!(paket.payload(), &[1, 2, 3]);
    }

    #[test]
    fn parse_ignoriert_erste_zwei_bytes() {
        let a = RtpPacket::parse(&[0x00; 12]).unwrap();
        let mut b_roh = [0x00; 12];
        b_roh[0] = 0xFF;
        b_roh[1] = 0xFF;
        let b = RtpPacket::parse(&b_roh).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_leere_nutzdaten_gueltig() {
        let paket = RtpPacket::parse(&[0u8; 12]).unwrap();
        assert!(paket.payload().is_empty());
    }

    #[test]
    fn parse_zu_kurz() {
        let fehler = RtpPacket::parse(&[0u8; 11]).unwrap_err();
        assert_eq!(
            fehler,
            ProtocolError::DatagrammZuKurz {
                laenge: 11,
                minimum: 12
            }
        );
        assert!(RtpPacket::parse(&[]).is_err());
    }

    #[test]
    fn header_encode_layout() {
        let header = RtpHeader {
            sequence: 0x0102,
            timestamp: 0x03040506,
            ssrc: 0x0708090A,
        };
        assert_eq!(
            header.encode(),
            [0x80, 0x78, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A]
        );
    }

    #[test]
    fn header_und_parse_passen_zusammen() {
        let header = RtpHeader {
            sequence: 7,
            timestamp: 48_000,
            ssrc: 42,
        };
        let paket = RtpPacket::parse(&header.mit_nutzdaten(&[9, 9])).unwrap();
        assert_eq!(paket.sequence(), 7);
        assert_eq!(paket.timestamp(), 48_000);
        assert_eq!(paket.ssrc(), 42);
        assert_eq!(paket.into_payload(), vec![9, 9]);
    }

    #[test]
    fn sequencer_laeuft_modular_ueber() {
        let mut seq = RtpSequencer::neu(1, u16::MAX, u32::MAX - 100);
        let erster = seq.naechster_header(960);
        assert_eq!(erster.sequence, u16::MAX);
        assert_eq!(erster.timestamp, u32::MAX - 100);

        let zweiter = seq.naechster_header(960);
        assert_eq!(zweiter.sequence, 0);
        assert_eq!(zweiter.timestamp, 859);
        assert_eq!(zweiter.ssrc, 1);
    }
}
