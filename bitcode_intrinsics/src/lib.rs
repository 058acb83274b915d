//! Bitcode Intrinsics
//!
//! Adaptive polymorphic dispatch for math-library intrinsics and foreign
//! source evaluation. Each call site caches a small number of type-guarded
//! specializations and falls back to a generic path once it has seen more
//! distinct operand shapes than its limit allows.
//!
//! - `catalog`: the fixed set of operations and their specialized executors
//! - `cache`: the bounded, lock-free per-call-site specialization cache
//! - `engine`: `DispatchEngine` and `CallSite`
//! - `polyglot`: cached evaluation of foreign source through a language host
//! - `config`: limits and tracing, from TOML and the environment
//!
//! # Example
//! ```
//! use bitcode_intrinsics::prelude::*;
//!
//! let engine = DispatchEngine::default();
//! let site = engine.call_site_named("pow").unwrap();
//! let mut memory = NoMemory;
//! let r = site
//!     .call(&[NumericValue::Float64(2.0), NumericValue::Int32(10)], &mut memory)
//!     .unwrap();
//! assert_eq!(r, NumericValue::Float64(1024.0));
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod polyglot;

pub use bitcode_intrinsics_runtime as runtime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::cache::{CacheState, CacheStats, Guard, Lookup, SpecializationCache};
    pub use super::catalog::{execute_generic, resolve, Executor, Operation};
    pub use super::config::{ConfigError, EngineConfig};
    pub use super::engine::{CallSite, DispatchEngine, Shape};
    pub use super::polyglot::{
        CompiledUnit, ForeignEvalCache, HostError, LanguageHost, LanguageSelector, PolyglotEval,
        SourceOrigin, SourceRequest,
    };
    pub use bitcode_intrinsics_runtime::prelude::*;
}
