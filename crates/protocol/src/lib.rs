//! chorus-protocol – Protokoll-Definitionen
//!
//! Dieses Crate definiert die Datenformate, die der Voice-Stack mit der
//! Plattform austauscht:
//! - [`rtp`] – RTP-Frames der eingehenden und ausgehenden UDP-Datagramme
//! - [`codec`] – Opus-Konfiguration
//! - [`gateway`] – Voice-State und Voice-Server-Daten aus dem Gateway

pub mod codec;
pub mod error;
pub mod gateway;
pub mod rtp;

pub use codec::{ChannelCount, CodecConfig, FrameSizeMs, SampleRate};
pub use error::{ProtocolError, ProtocolResult};
pub use gateway::{VoiceServerInfo, VoiceState};
pub use rtp::{RtpHeader, RtpPacket, RtpSequencer};
