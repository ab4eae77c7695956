//! Terminal reporting: the one-shot summary, source captions, and table tail.

pub mod format;

pub use format::*;
