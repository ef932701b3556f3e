//! Annotation of text runs.
//!
//! The [`Annotator`] reconciles an analyzer's role spans with the exact text of
//! a run and produces an [`AnnotatedFragment`]: plain and role-tagged segments
//! that concatenate back to the run.

pub mod annotator;
pub mod fragment;

pub use annotator::{AnnotationConfig, Annotator, RoleClasses};
pub use fragment::{AnnotatedFragment, Segment};
