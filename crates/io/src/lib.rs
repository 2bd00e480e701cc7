// File I/O: everything that touches bytes at the edges of a run

pub mod catalog;
pub mod error;
pub mod extraction;
pub mod json;
pub mod xlsx;

pub use error::IoError;
