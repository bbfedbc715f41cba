//! # tessel-core — Foundational Types for Tessel
//!
//! The leaf crate of the Tessel workspace. It holds the primitives that the
//! model engine and the descriptor layer share but that know nothing about
//! schemas themselves.
//!
//! ## Contents
//!
//! - [`FieldPath`] — the dotted location of a value inside a (possibly
//!   nested) model, used to qualify validation errors (`address.pin`,
//!   `allergies[2]`).
//! - [`split_selector`] — splits a dotted selection key on its first
//!   separator, one nesting level at a time.
//! - [`encode`] / [`Encoding`] — renders a structured document as text:
//!   compact JSON, pretty JSON, or RFC 8785 canonical JSON.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tessel-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod encode;
pub mod error;
pub mod path;

pub use encode::{encode, Encoding};
pub use error::{EncodeError, PathError};
pub use path::{split_selector, FieldPath, SEPARATOR};
