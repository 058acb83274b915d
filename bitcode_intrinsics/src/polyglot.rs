//! Foreign source evaluation.
//!
//! `PolyglotEval` hands source text to an external language host, runs the
//! compiled unit and converts the foreign result into a pointer-shaped
//! [`NumericValue`]. Inline evaluations are cached per
//! `(language, source text)` pair with the same protocol as intrinsic call
//! sites; file evaluations always re-read and re-parse.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bitcode_intrinsics_runtime::{Address, NumericValue, RuntimeError, RuntimeResult};
use thiserror::Error;

use crate::cache::{CacheState, CacheStats, Guard, Lookup, SpecializationCache};

/// Source name given to inline evaluations
pub const EVAL_SOURCE_NAME: &str = "<eval>";

/// Failure reported by a language host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("no language registered for {0}")]
    UnknownLanguage(String),

    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Run(String),

    #[error("result is not convertible to a pointer: {0}")]
    Conversion(String),

    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        HostError::Io(e.to_string())
    }
}

/// How the host should pick the language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageSelector {
    /// Language identifier, e.g. `"js"`
    Id(String),
    /// MIME type, e.g. `"application/javascript"`
    MimeType(String),
}

impl LanguageSelector {
    pub fn as_str(&self) -> &str {
        match self {
            LanguageSelector::Id(s) | LanguageSelector::MimeType(s) => s,
        }
    }
}

/// Where the source text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    Inline(String),
    /// Read by the host on every parse
    File(PathBuf),
}

/// A parse request handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub selector: LanguageSelector,
    pub origin: SourceOrigin,
    /// Name the host attaches to the source (`"<eval>"` for inline text)
    pub name: String,
}

impl SourceRequest {
    pub fn inline(selector: LanguageSelector, source: &str) -> Self {
        Self {
            selector,
            origin: SourceOrigin::Inline(source.to_string()),
            name: EVAL_SOURCE_NAME.to_string(),
        }
    }

    pub fn file(selector: LanguageSelector, path: &Path) -> Self {
        Self {
            selector,
            origin: SourceOrigin::File(path.to_path_buf()),
            name: path.display().to_string(),
        }
    }
}

/// Parsed, immutable foreign program
///
/// Units are shared between concurrent evaluations and never mutated after
/// parsing.
pub trait CompiledUnit: Send + Sync {
    /// Foreign value produced by a run
    type Value;

    fn run(&self) -> Result<Self::Value, HostError>;
}

/// Parse and conversion capabilities of a foreign language runtime
pub trait LanguageHost: Send + Sync {
    type Unit: CompiledUnit;

    /// Parse (and for file origins, read) a source
    fn parse(&self, request: &SourceRequest) -> Result<Self::Unit, HostError>;

    /// Convert a foreign result into a raw address
    fn to_native(&self, value: <Self::Unit as CompiledUnit>::Value) -> Result<Address, HostError>;
}

/// Guard key of a cached compiled unit: exact selector and source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    selector: String,
    source: String,
}

impl SourceKey {
    pub fn new(selector: &str, source: &str) -> Self {
        Self {
            selector: selector.to_string(),
            source: source.to_string(),
        }
    }
}

/// Borrowed form of [`SourceKey`] used for guard checks
#[derive(Debug, Clone, Copy)]
pub struct ObservedSource<'a> {
    pub selector: &'a str,
    pub source: &'a str,
}

impl<'a> Guard<ObservedSource<'a>> for SourceKey {
    #[inline]
    fn admits(&self, observed: &ObservedSource<'a>) -> bool {
        self.selector == observed.selector && self.source == observed.source
    }
}

/// Specialization cache of compiled units keyed by `(selector, source)`
pub type ForeignEvalCache<U> = SpecializationCache<SourceKey, Arc<U>>;

/// Foreign evaluation entry points over one language host
pub struct PolyglotEval<H: LanguageHost> {
    host: H,
    by_id: ForeignEvalCache<H::Unit>,
    by_mime: ForeignEvalCache<H::Unit>,
}

impl<H: LanguageHost> PolyglotEval<H> {
    /// Create entry points whose caches hold at most `limit` units each
    pub fn new(host: H, limit: usize) -> Self {
        Self {
            host,
            by_id: SpecializationCache::new("eval", limit),
            by_mime: SpecializationCache::new("eval (mime type)", limit),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Evaluate inline `source` in the language identified by `language`
    ///
    /// Repeated `(language, source)` pairs reuse the compiled unit until the
    /// cache limit is reached; after that every call parses afresh.
    pub fn eval(&self, language: &str, source: &str) -> RuntimeResult<NumericValue> {
        self.eval_cached(
            &self.by_id,
            LanguageSelector::Id(language.to_string()),
            source,
        )
    }

    /// Evaluate inline `source` in the language registered for `mime_type`
    ///
    /// Kept for callers of the MIME-type based API. Same caching protocol as
    /// [`eval`](Self::eval), with a cache of its own.
    pub fn eval_legacy(&self, mime_type: &str, source: &str) -> RuntimeResult<NumericValue> {
        self.eval_cached(
            &self.by_mime,
            LanguageSelector::MimeType(mime_type.to_string()),
            source,
        )
    }

    /// Evaluate the file at `path`; never cached
    ///
    /// A file that cannot be read fails with [`RuntimeError::FileEval`];
    /// an unknown language or a parse error fails with
    /// [`RuntimeError::Eval`] like inline evaluation.
    pub fn eval_file(
        &self,
        language: &str,
        path: impl AsRef<Path>,
    ) -> RuntimeResult<NumericValue> {
        let path = path.as_ref();
        let request = SourceRequest::file(LanguageSelector::Id(language.to_string()), path);
        log::debug!("eval_file: parsing {} as {}", path.display(), language);
        let unit = self.host.parse(&request).map_err(|e| match e {
            HostError::Io(message) => RuntimeError::file_eval_failure(path, message),
            other => RuntimeError::eval_failure(language, other.to_string()),
        })?;
        self.run_unit(language, &unit)
    }

    /// Compiled units cached by [`eval`](Self::eval)
    pub fn cache(&self) -> &ForeignEvalCache<H::Unit> {
        &self.by_id
    }

    /// Compiled units cached by [`eval_legacy`](Self::eval_legacy)
    pub fn legacy_cache(&self) -> &ForeignEvalCache<H::Unit> {
        &self.by_mime
    }

    pub fn state(&self) -> CacheState {
        self.by_id.state()
    }

    pub fn stats(&self) -> CacheStats {
        self.by_id.stats()
    }

    fn eval_cached(
        &self,
        cache: &ForeignEvalCache<H::Unit>,
        selector: LanguageSelector,
        source: &str,
    ) -> RuntimeResult<NumericValue> {
        let label = selector.as_str();
        let observed = ObservedSource {
            selector: label,
            source,
        };
        let lookup = cache.get_or_install(&observed, || {
            let unit = self.parse_inline(&selector, source)?;
            Ok::<_, RuntimeError>((SourceKey::new(label, source), Arc::new(unit)))
        })?;
        let unit = match lookup {
            Lookup::Hit(unit) | Lookup::Installed(unit) => Arc::clone(unit),
            Lookup::Uncached(unit) => unit,
            Lookup::Generic => Arc::new(self.parse_inline(&selector, source)?),
        };
        self.run_unit(label, &unit)
    }

    fn parse_inline(&self, selector: &LanguageSelector, source: &str) -> RuntimeResult<H::Unit> {
        log::debug!("eval: parsing {} bytes as {}", source.len(), selector.as_str());
        let request = SourceRequest::inline(selector.clone(), source);
        self.host
            .parse(&request)
            .map_err(|e| RuntimeError::eval_failure(selector.as_str(), e.to_string()))
    }

    fn run_unit(&self, language: &str, unit: &H::Unit) -> RuntimeResult<NumericValue> {
        let value = unit
            .run()
            .map_err(|e| RuntimeError::eval_failure(language, e.to_string()))?;
        let address = self
            .host
            .to_native(value)
            .map_err(|e| RuntimeError::eval_failure(language, e.to_string()))?;
        Ok(NumericValue::Pointer(address))
    }
}

impl<H: LanguageHost> fmt::Debug for PolyglotEval<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolyglotEval")
            .field("by_id", &self.by_id)
            .field("by_mime", &self.by_mime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Host whose programs are decimal literals evaluating to that address
    #[derive(Default)]
    struct LiteralHost {
        parses: AtomicUsize,
    }

    struct Literal(u64);

    impl CompiledUnit for Literal {
        type Value = u64;

        fn run(&self) -> Result<u64, HostError> {
            Ok(self.0)
        }
    }

    impl LanguageHost for LiteralHost {
        type Unit = Literal;

        fn parse(&self, request: &SourceRequest) -> Result<Literal, HostError> {
            self.parses.fetch_add(1, Ordering::SeqCst);
            if request.selector.as_str() != "lit" && request.selector.as_str() != "text/x-lit" {
                return Err(HostError::UnknownLanguage(request.selector.as_str().to_string()));
            }
            let text = match &request.origin {
                SourceOrigin::Inline(text) => text.clone(),
                SourceOrigin::File(path) => std::fs::read_to_string(path)?,
            };
            text.trim()
                .parse()
                .map(Literal)
                .map_err(|e| HostError::Parse(format!("{}: {}", request.name, e)))
        }

        fn to_native(&self, value: u64) -> Result<Address, HostError> {
            Ok(Address(value))
        }
    }

    #[test]
    fn test_eval_caches_by_language_and_source() {
        let eval = PolyglotEval::new(LiteralHost::default(), 2);
        assert_eq!(eval.eval("lit", "16"), Ok(NumericValue::Pointer(Address(16))));
        assert_eq!(eval.eval("lit", "16"), Ok(NumericValue::Pointer(Address(16))));
        assert_eq!(eval.host().parses.load(Ordering::SeqCst), 1);
        assert_eq!(eval.stats().hits, 1);
        assert_eq!(eval.state(), CacheState::Specializing(1));
    }

    #[test]
    fn test_parse_failure_names_source() {
        let eval = PolyglotEval::new(LiteralHost::default(), 2);
        let err = eval.eval("lit", "sixteen").unwrap_err();
        assert!(err.is_eval_failure());
        assert!(err.to_string().starts_with("EvalError: lit: <eval>:"));
        assert!(eval.cache().is_empty());

        let err = eval.eval("cobol", "1").unwrap_err();
        assert_eq!(
            err,
            RuntimeError::eval_failure("cobol", "no language registered for cobol")
        );
    }

    #[test]
    fn test_legacy_cache_is_separate() {
        let eval = PolyglotEval::new(LiteralHost::default(), 2);
        eval.eval("lit", "1").unwrap();
        eval.eval_legacy("text/x-lit", "1").unwrap();
        assert_eq!(eval.cache().len(), 1);
        assert_eq!(eval.legacy_cache().len(), 1);
        assert_eq!(eval.host().parses.load(Ordering::SeqCst), 2);
    }
}
