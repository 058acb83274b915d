//! Dispatch engine and call sites.
//!
//! A [`CallSite`] is one fixed point in the calling program that invokes an
//! operation repeatedly. It owns a [`SpecializationCache`] keyed by operand
//! [`Shape`], so each distinct shape resolves its executor once and every
//! later call with that shape goes straight to it.
//!
//! ## Debug Logging
//!
//! Set `BITCODE_INTRINSICS_DISPATCH_DEBUG=1` (or `trace_dispatch = true` in
//! the config) to trace every dispatch decision to stderr in debug builds.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;

use bitcode_intrinsics_runtime::{Memory, NumericValue, RuntimeError, RuntimeResult, ValueKind};

use crate::cache::{CacheState, CacheStats, Guard, Lookup, SpecializationCache};
use crate::catalog::{self, Executor, Operation};
use crate::config::EngineConfig;
use crate::polyglot::{LanguageHost, PolyglotEval};

/// Check if dispatch debug logging is enabled via `BITCODE_INTRINSICS_DISPATCH_DEBUG`.
/// Only available in debug builds to avoid performance impact in release.
#[cfg(debug_assertions)]
fn dispatch_debug_enabled() -> bool {
    use once_cell::sync::Lazy;
    static ENABLED: Lazy<bool> =
        Lazy::new(|| std::env::var(crate::config::DISPATCH_DEBUG_ENV).is_ok());
    *ENABLED
}

#[cfg(not(debug_assertions))]
fn dispatch_debug_enabled() -> bool {
    false
}

/// Emit dispatch debug logs in debug builds without relying on `eprintln!`.
#[cfg(debug_assertions)]
fn dispatch_debug_log(args: fmt::Arguments<'_>) {
    use std::io::Write;
    let _ = writeln!(std::io::stderr(), "{args}");
}

/// Exact operand kinds observed at one invocation
///
/// As a guard it admits only invocations with the same arity and the same
/// kind in every position. Vector lane counts are not part of the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Box<[ValueKind]>);

impl Shape {
    pub fn of(args: &[NumericValue]) -> Self {
        Shape(args.iter().map(NumericValue::kind).collect())
    }

    pub fn kinds(&self) -> &[ValueKind] {
        &self.0
    }
}

impl Guard<[NumericValue]> for Shape {
    #[inline]
    fn admits(&self, observed: &[NumericValue]) -> bool {
        self.0.len() == observed.len()
            && self.0.iter().zip(observed).all(|(k, v)| *k == v.kind())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", kind)?;
        }
        write!(f, ")")
    }
}

/// Entry point for intrinsic calls and foreign evaluation
#[derive(Debug, Clone, Default)]
pub struct DispatchEngine {
    config: EngineConfig,
}

impl DispatchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a fresh call site for `op`
    pub fn call_site(&self, op: Operation) -> CallSite {
        CallSite {
            operation: op,
            cache: SpecializationCache::new(op.name(), self.config.cache_limit),
            trace: self.config.trace_dispatch || dispatch_debug_enabled(),
        }
    }

    /// Create a fresh call site for the operation called `name`
    pub fn call_site_named(&self, name: &str) -> RuntimeResult<CallSite> {
        let op: Operation = name.parse()?;
        Ok(self.call_site(op))
    }

    /// One-shot call through the generic path, without a call site
    pub fn invoke(
        &self,
        name: &str,
        args: &[NumericValue],
        memory: &mut dyn Memory,
    ) -> RuntimeResult<NumericValue> {
        let op: Operation = name.parse()?;
        catalog::execute_generic(op, args, memory)
    }

    /// Foreign evaluation entry points backed by `host`
    pub fn polyglot<H: LanguageHost>(&self, host: H) -> PolyglotEval<H> {
        PolyglotEval::new(host, self.config.foreign_cache_limit)
    }
}

/// One call site of one operation
///
/// Call sites are `Send + Sync`; concurrent calls share the cache.
#[derive(Debug)]
pub struct CallSite {
    operation: Operation,
    cache: SpecializationCache<Shape, Executor>,
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    trace: bool,
}

impl CallSite {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Invoke the operation on `args`
    ///
    /// The first call with a new shape resolves and installs its executor.
    /// Once the site holds `cache_limit` shapes, an unseen shape demotes it
    /// and every later call takes the generic path. An unsupported shape
    /// fails this call and installs nothing.
    pub fn call(
        &self,
        args: &[NumericValue],
        memory: &mut dyn Memory,
    ) -> RuntimeResult<NumericValue> {
        let lookup = self.cache.get_or_install(args, || {
            let shape = Shape::of(args);
            let executor = catalog::resolve(self.operation, shape.kinds())?;
            Ok::<_, RuntimeError>((shape, executor))
        })?;

        #[cfg(debug_assertions)]
        if self.trace {
            dispatch_debug_log(format_args!(
                "[DISPATCH] {}{}: {}",
                self.operation,
                Shape::of(args),
                match &lookup {
                    Lookup::Hit(_) => "hit",
                    Lookup::Installed(_) => "installed",
                    Lookup::Uncached(_) => "uncached",
                    Lookup::Generic => "generic",
                }
            ));
        }

        match lookup {
            Lookup::Hit(executor) | Lookup::Installed(executor) => executor(args, memory),
            Lookup::Uncached(executor) => executor(args, memory),
            Lookup::Generic => catalog::execute_generic(self.operation, args, memory),
        }
    }

    pub fn state(&self) -> CacheState {
        self.cache.state()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of installed specializations
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Maximum number of specializations
    pub fn limit(&self) -> usize {
        self.cache.limit()
    }
}
