//! # Note Rendering
//!
//! Default [`DocumentRenderer`](bridge_traits::DocumentRenderer)
//! implementations for mirrored notes.

pub mod markdown;

pub use markdown::MarkdownRenderer;
