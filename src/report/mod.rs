//! The visit-report pipeline: form state, signature capture, template
//! rendering, and document export.

pub mod export;
pub mod form;
pub mod pdf;
pub mod signature;
pub mod template;
