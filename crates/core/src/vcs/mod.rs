//! Wrappers around the external version-control binaries.

pub mod command;
pub mod cvs;
pub mod hg;

pub use cvs::CvsClient;
pub use hg::HgClient;
