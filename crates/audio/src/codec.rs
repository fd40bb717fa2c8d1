//! Opus Encoder/Decoder Wrapper
//!
//! Kapselt audiopus und stellt eine i16-PCM basierte API bereit.
//! Jede Instanz besitzt genau einen nativen Codec-Kontext; dieser wird beim
//! Drop des audiopus-Handles freigegeben, auch wenn die Konfiguration nach
//! dem Erstellen fehlschlaegt.

use audiopus::{
    coder::{Decoder, Encoder},
    Application, Bitrate, Channels, SampleRate,
};
use tracing::debug;

use crate::error::{AudioError, AudioResult};
use chorus_protocol::codec::{ChannelCount, CodecConfig, SampleRate as ProtocolSampleRate};

/// Feste Obergrenze fuer ein kodiertes Opus-Paket in Bytes
pub const MAX_PAKET_GROESSE: usize = 4000;

/// Laengster Opus-Frame in Millisekunden
pub const MAX_FRAME_DAUER_MS: u32 = 120;

/// Groesste zulaessige Frame-Groesse (Samples pro Kanal) bei `rate`
pub fn max_samples_pro_frame(rate: ProtocolSampleRate) -> usize {
    (rate.als_hz() * MAX_FRAME_DAUER_MS / 1000) as usize
}

/// Groesse des Ausgabepuffers in Bytes fuer `frame_size` Samples pro Kanal
pub fn max_frame_size(frame_size: usize, channels: ChannelCount) -> usize {
    frame_size * channels.anzahl() * std::mem::size_of::<i16>()
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Opus-Encoder: kodiert interleaved i16-PCM zu Opus-Bytes
pub struct OpusEncoder {
    encoder: Encoder,
    channels: ChannelCount,
}

impl OpusEncoder {
    /// Erstellt einen neuen Encoder mit der gegebenen Konfiguration
    pub fn new(config: &CodecConfig) -> AudioResult<Self> {
        let mut encoder = Encoder::new(
            protocol_rate_to_audiopus(config.sample_rate),
            protocol_channels_to_audiopus(config.channels),
            Application::Voip,
        )
        .map_err(|e| AudioError::Erstellung(e.to_string()))?;

        encoder
            .set_bitrate(Bitrate::BitsPerSecond(config.bitrate_bps()))
            .map_err(|e| AudioError::Erstellung(format!("Bitrate: {e}")))?;

        encoder
            .set_vbr(config.vbr)
            .map_err(|e| AudioError::Erstellung(format!("VBR: {e}")))?;

        debug!(
            bitrate_kbps = config.bitrate_kbps,
            vbr = config.vbr,
            "OpusEncoder erstellt: {:?} {:?}",
            config.sample_rate,
            config.channels
        );

        Ok(Self {
            encoder,
            channels: config.channels,
        })
    }

    /// Kodiert einen PCM-Frame mit `frame_size` Samples pro Kanal
    ///
    /// `pcm` muss mindestens `frame_size * channels` Samples enthalten.
    pub fn encode(&mut self, pcm: &[i16], frame_size: usize) -> AudioResult<Vec<u8>> {
        let benoetigt = frame_size * self.channels.anzahl();
        if frame_size == 0 || pcm.len() < benoetigt {
            return Err(AudioError::Encode(format!(
                "PCM-Frame zu kurz: {} Samples (benoetigt {})",
                pcm.len(),
                benoetigt
            )));
        }

        let mut output = vec![0u8; MAX_PAKET_GROESSE];
        let geschrieben = self
            .encoder
            .encode(&pcm[..benoetigt], &mut output[..])
            .map_err(|e| AudioError::Encode(e.to_string()))?;

        if geschrieben == 0 {
            return Err(AudioError::Encode("Encoder lieferte 0 Bytes".to_string()));
        }

        output.truncate(geschrieben);
        Ok(output)
    }

    pub fn channels(&self) -> ChannelCount {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Opus-Decoder: dekodiert Opus-Bytes zu interleaved i16-PCM
pub struct OpusDecoder {
    decoder: Decoder,
    channels: ChannelCount,
    max_frame_size: usize,
}

impl OpusDecoder {
    /// Erstellt einen neuen Decoder mit der gegebenen Konfiguration
    pub fn new(config: &CodecConfig) -> AudioResult<Self> {
        let mut decoder = Decoder::new(
            protocol_rate_to_audiopus(config.sample_rate),
            protocol_channels_to_audiopus(config.channels),
        )
        .map_err(|e| AudioError::Erstellung(e.to_string()))?;

        decoder
            .set_gain(config.gain)
            .map_err(|e| AudioError::Erstellung(format!("Gain: {e}")))?;

        debug!(
            gain = config.gain,
            "OpusDecoder erstellt: {:?} {:?}", config.sample_rate, config.channels
        );

        Ok(Self {
            decoder,
            channels: config.channels,
            max_frame_size: max_samples_pro_frame(config.sample_rate),
        })
    }

    /// Dekodiert ein Paket zu `frame_size` Samples pro Kanal
    ///
    /// `None` fuehrt einen Verschleierungs-Decode fuer ein verlorenes Paket
    /// aus. Ein leeres Paket wird genauso behandelt. `frame_size` ueber
    /// 120 ms wird vor jeder Allokation abgelehnt.
    pub fn decode(&mut self, daten: Option<&[u8]>, frame_size: usize) -> AudioResult<Vec<i16>> {
        if frame_size > self.max_frame_size {
            return Err(AudioError::Decode(format!(
                "Frame-Groesse {frame_size} ueber Maximum {}",
                self.max_frame_size
            )));
        }

        let kapazitaet = max_frame_size(frame_size, self.channels) / std::mem::size_of::<i16>();
        if kapazitaet == 0 {
            return Err(AudioError::Decode("Frame-Groesse 0".to_string()));
        }

        let mut output = vec![0i16; kapazitaet];
        let daten = daten.filter(|d| !d.is_empty());
        let dekodiert = self
            .decoder
            .decode(daten, &mut output[..], false)
            .map_err(|e| AudioError::Decode(e.to_string()))?;

        let samples = dekodiert * self.channels.anzahl();
        if dekodiert == 0 || samples > kapazitaet {
            return Err(AudioError::Decode(format!(
                "Ungueltige Decode-Laenge: {dekodiert} Samples pro Kanal"
            )));
        }

        output.truncate(samples);
        Ok(output)
    }

    /// Verschleierungs-Decode fuer ein verlorenes Paket
    pub fn decode_plc(&mut self, frame_size: usize) -> AudioResult<Vec<i16>> {
        self.decode(None, frame_size)
    }

    pub fn channels(&self) -> ChannelCount {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// Konvertierungs-Hilfsfunktionen
// ---------------------------------------------------------------------------

fn protocol_rate_to_audiopus(rate: ProtocolSampleRate) -> SampleRate {
    match rate {
        ProtocolSampleRate::Hz8000 => SampleRate::Hz8000,
        ProtocolSampleRate::Hz12000 => SampleRate::Hz12000,
        ProtocolSampleRate::Hz16000 => SampleRate::Hz16000,
        ProtocolSampleRate::Hz24000 => SampleRate::Hz24000,
        ProtocolSampleRate::Hz48000 => SampleRate::Hz48000,
    }
}

fn protocol_channels_to_audiopus(ch: ChannelCount) -> Channels {
    match ch {
        ChannelCount::Mono => Channels::Mono,
        ChannelCount::Stereo => Channels::Stereo,
    }
}
