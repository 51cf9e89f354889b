//! Archive parsing: MBOX streaming, record assembly over `mail-parser`,
//! Gmail labels, thread derivation, and the OLM ZIP/XML decoder.

pub mod date;
pub mod eml;
pub mod labels;
pub mod mbox;
pub mod mime;
pub mod olm;
pub mod thread;

pub use mbox::MboxParser;
pub use olm::OlmParser;
