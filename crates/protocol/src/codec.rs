//! Codec-Konfiguration fuer die Voice-Uebertragung
//!
//! Die Konfiguration wird beim Erstellen von Encoder und Decoder uebergeben
//! und danach nicht mehr veraendert.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

// ---------------------------------------------------------------------------
// Opus-Parameter
// ---------------------------------------------------------------------------

/// Abtastrate fuer Opus
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRate {
    /// 8 kHz – Schmalband
    Hz8000 = 8000,
    /// 12 kHz – Mittelband
    Hz12000 = 12000,
    /// 16 kHz – Breitband
    Hz16000 = 16000,
    /// 24 kHz – Superbreitband
    Hz24000 = 24000,
    /// 48 kHz – Vollband, von der Plattform verwendet
    #[default]
    Hz48000 = 48000,
}

impl SampleRate {
    pub fn als_hz(&self) -> u32 {
        *self as u32
    }
}

/// Anzahl der Audio-Kanaele
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCount {
    Mono = 1,
    /// Stereo – Standard der Plattform
    #[default]
    Stereo = 2,
}

impl ChannelCount {
    pub fn anzahl(&self) -> usize {
        *self as usize
    }
}

/// Frame-Groesse in Millisekunden
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSizeMs {
    Ms10 = 10,
    /// 20 ms – Standard
    #[default]
    Ms20 = 20,
    Ms40 = 40,
    Ms60 = 60,
}

impl FrameSizeMs {
    /// Berechnet die Samples pro Kanal und Frame bei gegebener Abtastrate
    pub fn samples_per_frame(&self, sample_rate: SampleRate) -> u32 {
        *self as u32 * sample_rate.als_hz() / 1000
    }
}

// ---------------------------------------------------------------------------
// CodecConfig
// ---------------------------------------------------------------------------

/// Vollstaendige Opus-Codec-Konfiguration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Ziel-Bitrate in kbps (6–510)
    pub bitrate_kbps: u16,
    pub sample_rate: SampleRate,
    pub channels: ChannelCount,
    /// Frame-Groesse ausgehender Pakete
    pub frame_size: FrameSizeMs,
    /// Variable Bitrate (nur Encoder)
    pub vbr: bool,
    /// Verstaerkung in Q8-dB (nur Decoder, -32768..=32767)
    pub gain: i32,
    /// Samples pro Kanal fuer jeden Verschleierungs-Decode bei Paketluecken
    pub concealment_frame_size: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            bitrate_kbps: 64,
            sample_rate: SampleRate::Hz48000,
            channels: ChannelCount::Stereo,
            frame_size: FrameSizeMs::Ms20,
            vbr: false,
            gain: 0,
            concealment_frame_size: 960,
        }
    }
}

impl CodecConfig {
    /// Validiert die Konfiguration
    pub fn validieren(&self) -> ProtocolResult<()> {
        if !(6..=510).contains(&self.bitrate_kbps) {
            return Err(ProtocolError::UngueltigeKonfiguration(format!(
                "Bitrate muss zwischen 6 und 510 kbps liegen (war: {})",
                self.bitrate_kbps
            )));
        }
        if !(i16::MIN as i32..=i16::MAX as i32).contains(&self.gain) {
            return Err(ProtocolError::UngueltigeKonfiguration(format!(
                "Gain ausserhalb des Q8-Bereichs (war: {})",
                self.gain
            )));
        }
        if self.concealment_frame_size == 0 {
            return Err(ProtocolError::UngueltigeKonfiguration(
                "Verschleierungs-Frame-Groesse darf nicht 0 sein".to_string(),
            ));
        }
        Ok(())
    }

    /// Bitrate in Bit pro Sekunde
    pub fn bitrate_bps(&self) -> i32 {
        i32::from(self.bitrate_kbps) * 1000
    }

    /// Samples pro Kanal eines ausgehenden Frames
    pub fn samples_pro_frame(&self) -> u32 {
        self.frame_size.samples_per_frame(self.sample_rate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
