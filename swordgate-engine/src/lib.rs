//! # swordgate-engine
//!
//! Ingest orchestration for the swordgate deposit engine, embedded into
//! server crates behind their HTTP surface.
//!
//! This crate provides:
//! - **Acceptability gate**: policy-driven vetoes on content type and
//!   packaging before a deposit touches storage
//! - **Originals archiver**: stores the as-received package and/or entry
//!   document into the target container's preservation bundle under a
//!   single privilege-bracketed sequence
//! - **Filename policy**: stable names for stored payloads when the
//!   client supplies none
//! - **Failure dumper**: forensic dump of raw deposit bytes plus a header
//!   snapshot when ingest aborts
//! - **In-memory store**: a [`memory::MemoryStore`] implementing the core
//!   storage contract for tests and embedding

pub mod archiver;
pub mod dumper;
pub mod filename;
pub mod gate;
pub mod ingest;
pub mod memory;
