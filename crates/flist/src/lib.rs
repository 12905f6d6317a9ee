#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Remote tree discovery for vmsync.
//!
//! [`crawler::Crawler`] walks the remote tree depth-first through a
//! managed session and produces a [`manifest::Manifest`]: the ordered
//! list of everything one run intends to mirror. Discovery is separate
//! from transfer so progress can be reported against a known total.

pub mod crawler;
pub mod manifest;

pub use crawler::Crawler;
pub use manifest::Manifest;
