//! Shared helpers for integration tests
// This helper module is consumed selectively by the integration test files.
// Keep these utilities available without forcing every helper to be referenced
// in each individual test target.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use bitcode_intrinsics::prelude::*;

/// Install a test logger so `RUST_LOG=debug` shows cache decisions
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Memory capability that records every write in order
#[derive(Debug, Default)]
pub struct RecordingMemory {
    doubles: BTreeMap<u64, f64>,
    extended: BTreeMap<u64, Extended80>,
    read_only: BTreeSet<u64>,
    pub writes: Vec<Address>,
}

impl RecordingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `addr` as mapped but not writable
    pub fn protect(&mut self, addr: Address) {
        self.read_only.insert(addr.as_u64());
    }

    pub fn double_at(&self, addr: Address) -> Option<f64> {
        self.doubles.get(&addr.as_u64()).copied()
    }
}

impl Memory for RecordingMemory {
    fn read_f64(&self, addr: Address) -> Result<f64, MemoryFault> {
        self.double_at(addr).ok_or(MemoryFault::Unmapped(addr))
    }

    fn write_f64(&mut self, addr: Address, value: f64) -> Result<(), MemoryFault> {
        if self.read_only.contains(&addr.as_u64()) {
            return Err(MemoryFault::ReadOnly(addr));
        }
        self.writes.push(addr);
        self.doubles.insert(addr.as_u64(), value);
        Ok(())
    }

    fn read_extended(&self, addr: Address) -> Result<Extended80, MemoryFault> {
        self.extended
            .get(&addr.as_u64())
            .cloned()
            .ok_or(MemoryFault::Unmapped(addr))
    }

    fn write_extended(&mut self, addr: Address, value: &Extended80) -> Result<(), MemoryFault> {
        if self.read_only.contains(&addr.as_u64()) {
            return Err(MemoryFault::ReadOnly(addr));
        }
        self.writes.push(addr);
        self.extended.insert(addr.as_u64(), value.clone());
        Ok(())
    }
}

/// Compiled "program": a decimal address literal
#[derive(Debug)]
pub struct AddressLiteral(pub u64);

impl CompiledUnit for AddressLiteral {
    type Value = u64;

    fn run(&self) -> Result<u64, HostError> {
        if self.0 == 0 {
            return Err(HostError::Run("null result".to_string()));
        }
        Ok(self.0)
    }
}

/// Language host for the `addr` language, counting every parse
///
/// Registered under the id `"addr"` and the MIME type `"application/x-addr"`.
#[derive(Debug, Default)]
pub struct CountingHost {
    parses: AtomicUsize,
    pub requests: Mutex<Vec<SourceRequest>>,
}

impl CountingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }
}

impl LanguageHost for CountingHost {
    type Unit = AddressLiteral;

    fn parse(&self, request: &SourceRequest) -> Result<AddressLiteral, HostError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &request.selector {
            LanguageSelector::Id(id) if id == "addr" => {}
            LanguageSelector::MimeType(mime) if mime == "application/x-addr" => {}
            other => return Err(HostError::UnknownLanguage(other.as_str().to_string())),
        }

        let text = match &request.origin {
            SourceOrigin::Inline(text) => text.clone(),
            SourceOrigin::File(path) => std::fs::read_to_string(path)?,
        };
        text.trim()
            .parse()
            .map(AddressLiteral)
            .map_err(|_| HostError::Parse(format!("{}: not an address: {:?}", request.name, text)))
    }

    fn to_native(&self, value: u64) -> Result<Address, HostError> {
        if value % 8 != 0 {
            return Err(HostError::Conversion(format!("unaligned address {}", value)));
        }
        Ok(Address(value))
    }
}

/// Sample operands of `kind`: zeros, negatives, subnormals, infinities, NaN
pub fn samples(kind: ValueKind) -> Vec<NumericValue> {
    match kind {
        ValueKind::Int32 => [0, -7, 3, 1024].into_iter().map(NumericValue::Int32).collect(),
        ValueKind::Int64 => [0i64, -7, i64::MAX]
            .into_iter()
            .map(NumericValue::Int64)
            .collect(),
        ValueKind::Float32 => float32_samples()
            .into_iter()
            .map(NumericValue::Float32)
            .collect(),
        ValueKind::Float64 => float64_samples()
            .into_iter()
            .map(NumericValue::Float64)
            .collect(),
        ValueKind::Extended80 => extended_samples()
            .into_iter()
            .map(|x| NumericValue::from(Extended80::from_f64(x)))
            .collect(),
        ValueKind::VectorF32 => vec![NumericValue::from(Vector::new(float32_samples()))],
        ValueKind::VectorF64 => vec![NumericValue::from(Vector::new(float64_samples()))],
        ValueKind::VectorBool => vec![NumericValue::from(Vector::new(vec![true, false]))],
        ValueKind::Pointer => vec![NumericValue::Pointer(Address(0x1000))],
    }
}

pub fn float32_samples() -> Vec<f32> {
    vec![
        0.0,
        -0.0,
        -2.5,
        0.75,
        1e-40,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::NAN,
    ]
}

pub fn float64_samples() -> Vec<f64> {
    vec![
        0.0,
        -0.0,
        -3.75,
        2.5,
        5e-324,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
    ]
}

/// Doubles used to build extended-precision operands
pub fn extended_samples() -> Vec<f64> {
    vec![
        0.0,
        -0.0,
        -2.5,
        3.0,
        1e-300,
        5e-324,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
    ]
}

/// Every operand combination for `shape`
pub fn operand_grid(shape: &[ValueKind]) -> Vec<Vec<NumericValue>> {
    shape.iter().fold(vec![Vec::new()], |acc, kind| {
        let options = samples(*kind);
        acc.into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |value| {
                    let mut next = prefix.clone();
                    next.push(value.clone());
                    next
                })
            })
            .collect()
    })
}

/// Same outcome: bit-identical values or equal errors
pub fn same_outcome(
    a: &RuntimeResult<NumericValue>,
    b: &RuntimeResult<NumericValue>,
) -> bool {
    match (a, b) {
        (Ok(x), Ok(y)) => x.bit_eq(y),
        (Err(x), Err(y)) => x == y,
        _ => false,
    }
}
