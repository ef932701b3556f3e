//! EPUB reading and writing.
//!
//! - [`container`] holds the zip archive: entry order, the package location
//!   from `META-INF/container.xml`, and atomic saving.
//! - [`package`] parses and edits the OPF package document.
//! - [`stylesheet`] supplies the CSS for annotation classes and links it from
//!   content documents.

pub mod container;
pub mod package;
pub mod stylesheet;

#[cfg(test)]
pub(crate) mod fixtures;

pub use container::{EpubBook, SpineDocument};
pub use package::{ManifestItem, Package};
pub use stylesheet::Stylesheet;
