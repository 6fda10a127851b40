//! Domain primitives for the RepCRec replicated transaction manager.
//!
//! This crate has no behavior of its own beyond small, well-tested
//! invariants on the data model: identifiers, the logical clock, the
//! multi-version history, the site record, and the transaction record.
//! The transaction manager itself (read/write paths, commit validation,
//! site lifecycle) lives in `repcrec-concurrency`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod time;
pub mod topology;
pub mod trace;
pub mod transaction;
pub mod types;
pub mod version;

pub use error::{AbortReason, Error, Result};
pub use time::Time;
pub use topology::ClusterTopology;
pub use trace::{NullSink, RecordingSink, TraceEvent, TraceSink};
pub use transaction::{Transaction, TransactionStatus};
pub use types::{SiteId, TxnId, VarId};
pub use version::{Version, VersionHistory};

pub mod site;
pub use site::Site;
