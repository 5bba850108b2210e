//! # swordgate-core
//!
//! Shared building blocks for the swordgate deposit ingest engine.
//!
//! This crate provides the foundational types and contracts used by
//! [`swordgate-engine`] and by server crates that embed the engine behind
//! an HTTP surface.
//!
//! ## Responsibilities
//!
//! - **Content negotiation** — `Accept`-header analysis producing an
//!   ordered [`negotiate::QualityMap`], including implicit-quality
//!   inference for entries listed without a `q=` parameter.
//!
//! - **Deposit model** — the immutable inbound submission
//!   ([`deposit::Deposit`]), its metadata-entry document, and the resolved
//!   depositor identity ([`deposit::AuthContext`]).
//!
//! - **Policy & storage contracts** — trait seams
//!   ([`policy::DepositPolicy`], [`store::RepositoryStore`]) so the engine
//!   stays generic over the repository backend, the same way a transport
//!   trait keeps an engine generic over TCP or an in-memory pipe.
//!
//! - **Error taxonomy** — [`error::SwordError`] with protocol error URIs
//!   from [`uri`].

pub mod deposit;
pub mod error;
pub mod headers;
pub mod negotiate;
pub mod policy;
pub mod store;
pub mod uri;
