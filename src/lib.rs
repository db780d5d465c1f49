//! # mail-forge – email-safe HTML render pipeline
//!
//! This crate turns SSR-rendered email markup into delivery-ready HTML,
//! optionally inlining generated utility CSS and deriving a plain-text
//! counterpart. The pipeline stages are:
//!
//! 1. **Media queries** – extract `data-mq-*` directives ([`media`])
//! 2. **Utility CSS** – generate rules for used classes ([`tailwind`])
//! 3. **Inline** – move stylesheet rules into `style` attributes ([`inline`])
//! 4. **Cleanup** – strip SSR artifacts, optional pretty-print ([`cleanup`])
//! 5. **Text** – derive the plain-text alternative ([`text`])
//!
//! Component templates use [`style::merge`] and [`media::generate`] directly
//! to build safe `style=` attributes and `@media` blocks before SSR.

pub mod cleanup;
pub mod dom;
pub mod inline;
pub mod media;
pub mod pipeline;
pub mod style;
pub mod tailwind;
pub mod templates;
pub mod text;

// Re-exports for convenience
pub use inline::InlineOptions;
pub use pipeline::{render_document, render_parts, RenderOptions, RenderOutput};
pub use style::merge;
pub use tailwind::TailwindConfig;
pub use text::TextOptions;
