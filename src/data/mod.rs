//! Market data access.
//!
//! - shared HTTP plumbing and the absorbed failure taxonomy (`fetch`)
//! - one adapter per upstream: quote chart API (`quote`), FRED (`fred`),
//!   BOK ECOS (`ecos`)
//! - priority-ordered source fallback (`resolve`)
//! - injected TTL memoization (`cache`)
//!
//! Adapters share one contract: any network, HTTP, or payload problem is
//! logged and degraded to an empty `NamedSeries`. Nothing in this module
//! returns a fetch error to callers.

pub mod cache;
pub mod ecos;
pub mod fetch;
pub mod fred;
pub mod quote;
pub mod resolve;

pub use cache::*;
pub use ecos::*;
pub use fetch::*;
pub use fred::*;
pub use quote::*;
pub use resolve::*;
