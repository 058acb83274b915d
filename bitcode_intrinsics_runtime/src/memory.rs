//! Memory capability used by pointer-writeback intrinsics
//!
//! The dispatch engine never owns target memory. Operations that write
//! through a pointer (`modf`, extended-precision array literals) go through
//! the [`Memory`] trait supplied by the caller, and any [`MemoryFault`] it
//! raises is passed through to the caller unmodified.

use std::fmt;

use thiserror::Error;

use crate::extended::Extended80;

/// Raw target address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl Address {
    /// Address `offset` bytes past this one
    #[inline]
    pub fn offset(self, offset: u64) -> Address {
        Address(self.0.wrapping_add(offset))
    }

    /// Raw address value
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Fault signalled by a memory capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryFault {
    /// Address is not backed by any allocation
    #[error("SegmentationFault: address {0} is not mapped")]
    Unmapped(Address),

    /// Address is mapped but not writable
    #[error("SegmentationFault: address {0} is read-only")]
    ReadOnly(Address),

    /// The capability has no memory at all (pure call contexts)
    #[error("MemoryError: no memory available for access at {0}")]
    Unavailable(Address),
}

/// Typed reads and writes at raw addresses
///
/// The caller guarantees exclusive access to every address handed to an
/// intrinsic for the duration of the call; implementations need no internal
/// synchronization.
pub trait Memory {
    /// Read a double at `addr`
    fn read_f64(&self, addr: Address) -> Result<f64, MemoryFault>;

    /// Write a double at `addr`
    fn write_f64(&mut self, addr: Address, value: f64) -> Result<(), MemoryFault>;

    /// Read an extended-precision float at `addr`
    fn read_extended(&self, addr: Address) -> Result<Extended80, MemoryFault>;

    /// Write an extended-precision float at `addr`
    fn write_extended(&mut self, addr: Address, value: &Extended80) -> Result<(), MemoryFault>;
}

/// Memory capability for contexts without addressable memory
///
/// Every access faults with [`MemoryFault::Unavailable`]. Pure intrinsics
/// never touch memory, so they run unchanged against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemory;

impl Memory for NoMemory {
    fn read_f64(&self, addr: Address) -> Result<f64, MemoryFault> {
        Err(MemoryFault::Unavailable(addr))
    }

    fn write_f64(&mut self, addr: Address, _value: f64) -> Result<(), MemoryFault> {
        Err(MemoryFault::Unavailable(addr))
    }

    fn read_extended(&self, addr: Address) -> Result<Extended80, MemoryFault> {
        Err(MemoryFault::Unavailable(addr))
    }

    fn write_extended(&mut self, addr: Address, _value: &Extended80) -> Result<(), MemoryFault> {
        Err(MemoryFault::Unavailable(addr))
    }
}

/// Store an extended-precision array literal
///
/// Writes `values[i]` at `base + i * stride`, in order, and returns `base`.
/// The first fault stops the store; earlier elements stay written.
pub fn store_extended_array(
    memory: &mut dyn Memory,
    base: Address,
    values: &[Extended80],
    stride: u64,
) -> Result<Address, MemoryFault> {
    let mut current = base;
    for value in values {
        memory.write_extended(current, value)?;
        current = current.offset(stride);
    }
    Ok(base)
}
