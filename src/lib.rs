//! textengine - the in-memory core of a code-editor text engine.
//!
//! Turns a raw byte stream into an interactively editable, encoding-aware,
//! line-indexed document: a chunked byte buffer, an encoding-aware codepoint
//! index, a line registry, multi-caret edits with undo/redo, soft wrapping
//! and folding. Rendering, layout, and UI are external collaborators; this
//! crate only exposes the interfaces they need.

pub mod buffer;
pub mod caret;
pub mod character;
pub mod constants;
pub mod edit;
pub mod encoding;
pub mod error;
pub mod fold;
pub mod interpretation;
pub mod line_registry;
pub mod registry;
pub mod softbreak;
pub mod theme;
pub mod tree;

pub use buffer::Buffer;
pub use error::{Result, TextEngineError};
pub use interpretation::Interpretation;
