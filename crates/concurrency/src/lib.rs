//! The RepCRec transaction manager: read/write paths, the three-gate
//! commit validator, site lifecycle, and the blocked-reads unblocker.
//!
//! `repcrec-core` supplies the data model; this crate supplies the
//! behavior that operates on it. The one type most callers need is
//! [`Engine`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod blocked;
mod conflict;
mod engine;
mod indexes;
mod read;
mod sites;
mod store;
mod validation;
mod write;

pub use blocked::{BlockedRead, BlockedReads};
pub use engine::Engine;
pub use indexes::{LastWriterIndex, ReaderIndex};
pub use read::ReadOutcome;
pub use sites::SiteRegistry;
pub use store::VersionStore;
pub use write::WriteOutcome;
