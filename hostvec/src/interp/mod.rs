//! Script evaluator
//!
//! Plays the dynamically-typed caller: every `new`, call and method call in a
//! script becomes a call record dispatched through the [`Runtime`](crate::runtime::Runtime).

mod eval;

pub use eval::Evaluator;
