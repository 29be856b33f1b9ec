//! Streaming HTML parsing primitives for feed scraping.
//!
//! The pipeline goes: a [`ByteSource`] window over the raw stream, a
//! [`Tokenizer`] producing open/close/text/comment tokens, decoders turning
//! tag bytes into [`OpenTag`]/[`CloseTag`] payloads, an [`AstBuilder`]
//! assembling each selected subtree into a flat discovery-order chain while
//! repairing mis-nested markup, and [`parse`] driving any number of
//! [`Selector`]s over one token stream. Selectors hand every completed
//! subtree to a callback and reset for the next one.
//!
//! This crate is deliberately lax where real-world feed markup is lax: class
//! matching is substring containment, unmatched close tags are dropped, and
//! unclosed elements are auto-closed into their parent's chain.

mod ast;
mod parse;
mod selector;
mod source;
mod token;
mod tokenizer;

pub use ast::{AstBuilder, Chain, Node, NodeKind, Tree, TEXT_NODE_NAME};
pub use parse::parse;
pub use selector::{contains_class, ClassSelector, Selector, TreeCallback};
pub use source::{ByteSource, Cursor, SourceError};
pub use token::{scrub_whitespace, CloseTag, DecodeError, OpenTag};
pub use tokenizer::{Token, Tokenizer};
