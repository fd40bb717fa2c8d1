//! chorus-audio – Opus-Codec und Dekodierung
//!
//! - Opus Encoding/Decoding mit i16-PCM ([`codec`])
//! - Dekodier-Zustandsmaschine pro Voice-Session ([`session_decoder`])
//! - Datenquellen fuer ausgehendes Audio ([`source`])

pub mod codec;
pub mod error;
pub mod session_decoder;
pub mod source;

// Bequeme Re-Exporte der wichtigsten Typen
pub use codec::{
    max_frame_size, max_samples_pro_frame, OpusDecoder, OpusEncoder, MAX_FRAME_DAUER_MS,
    MAX_PAKET_GROESSE,
};
pub use error::{AudioError, AudioResult};
pub use session_decoder::{DecodedVoicePacket, DecoderStatistik, SessionDecoder};
pub use source::{
    PcmEinspeiser, PcmVoiceDataSource, QuellenStatus, SendeQuelle, SendeSchritt,
    SilenceDataSource, VoiceDataSource,
};
