//! Serialization context
//!
//! Supports: XML (classic endpoints), JSON (pro endpoints)
//!
//! # Overview
//!
//! The decode module turns response bodies into `Document`s and back.
//! There is no process-wide parser state: every read and write goes
//! through the explicit functions in `xml` or through `Document`.

mod document;
pub mod xml;

pub use document::Document;

#[cfg(test)]
mod tests;
