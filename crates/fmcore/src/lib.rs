#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `fmcore` is the foundation crate of the dpan file-manager engine: the
//! error enum every other crate returns, the `PATH_MAX`/`NAME_MAX`
//! bounds the path and scanner crates build against, and a handful of
//! pure formatting/matching helpers (`pretty_size`, `contains`,
//! `prettify_path`) that a renderer would call but that carry no
//! rendering logic themselves.
//!
//! # Design
//!
//! Every other crate in the workspace depends on this one and nothing
//! else upward — `fmcore` has no dependency on `path`, `flist`, `walk`,
//! `panel`, `rename`, or `task`, so it can be depended on from all of
//! them without a cycle.
//!
//! # See also
//!
//! - [`error::Error`] for the shared error enum.
//! - [`limits`] for the path/name length bounds.
//! - [`size::pretty_size`] for human-readable byte counts.
//! - [`strmatch`] for substring and home-prefix helpers.

pub mod error;
pub mod limits;
pub mod size;
pub mod strmatch;

pub use error::{Error, Result};
pub use limits::{NAME_MAX, PATH_MAX};
pub use size::pretty_size;
pub use strmatch::{contains, initial_matching_bytes, prettify_path, prettify_path_i};
