//! Domain types shared by every booknote provider and renderer
//!
//! This crate provides the canonical, provider-agnostic representation of
//! book metadata:
//! - Book: the normalized record every provider produces
//! - FieldValue: scalar / list / mapping values exposed to templates
//! - FrontMatter: the ordered key/value mapping rendered as a header block
//! - ServiceProvider, KeyStyle: configuration enums shared with the core crate

pub mod book;
pub mod frontmatter;
pub mod provider;
pub mod value;

pub use book::*;
pub use frontmatter::*;
pub use provider::*;
pub use value::*;
