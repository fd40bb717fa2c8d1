//! chorus-voice – Voice-Verbindungsverwaltung
//!
//! Verwaltet die Voice-Verbindungen eines Clients pro Guild.
//!
//! ## Module
//! - [`manager`] – Zulassung, Ersetzen und Abbau der Engines pro Guild
//! - [`engine`] – Schnittstelle zur Transport-Implementierung
//! - [`delegate`] – Rueckmeldungen von Engine und Manager
//! - [`receiver`] – Empfangspfad: Datagramm zu Opus- oder PCM-Paket

pub mod delegate;
pub mod engine;
pub mod error;
pub mod manager;
pub mod receiver;

pub use delegate::{VoiceEngineDelegate, VoiceManagerDelegate};
pub use engine::{EngineConfig, EngineFactory, EngineParameter, VoiceEngine};
pub use error::{VoiceError, VoiceResult};
pub use manager::VoiceManager;
pub use receiver::{Empfang, VoiceReceiver};
