//! # Contracts
//!
//! Frozen interface contracts shared by every pipeline crate.
//! All business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - A parsed file is a [`Dataset`]: normalized headers plus rows of typed [`Cell`]s
//! - Every dataset is referenced by an explicit [`DatasetId`] handle
//! - Filters are described by [`FilterCriteria`], broadcast runs by [`DispatchReport`]

mod blueprint;
mod cell;
mod credentials;
mod dataset;
mod dataset_id;
mod dispatch;
mod error;
mod filter;
mod source;
mod transport;

pub use blueprint::*;
pub use cell::{Cell, PREVIEW_DATE_FORMAT};
pub use credentials::{CredentialVerifier, LocalTokenProvider, TokenProvider};
pub use dataset::*;
pub use dataset_id::DatasetId;
pub use dispatch::*;
pub use error::*;
pub use filter::*;
pub use source::SourceKind;
pub use transport::*;
