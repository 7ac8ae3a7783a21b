use std::hint::black_box;
use std::time::Instant;

use log::info;

use crate::cost::Cost;

/// Number of `u64` values in the buffer probed for memory access timing (8 MiB).
const MEMORY_BUFFER_LEN: usize = 1 << 20;
const MEMORY_PROBES: usize = 1 << 20;
const FLOP_ITERATIONS: usize = 1 << 20;
const ROUNDS: usize = 3;

/// Lower bound for measured unit costs, in nanoseconds.
const MIN_UNIT_NS: f64 = 0.01;

/// A disk read is assumed to be this many times slower than a memory access.
const DISK_READ_FACTOR: f64 = 20.0;
const DISK_WRITE_FACTOR: f64 = 40.0;

lazy_static! {
    static ref CALIBRATED: CostConstants = CostConstants::calibrate();
}

/// Unit costs all operator costs are expressed in.
///
/// Memory access and floating point operation costs are measured once per process, disk access
/// costs are derived from the memory access cost.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CostConstants {
    pub memory_access: Cost,
    pub flop: Cost,
    pub disk_access_read: Cost,
    pub disk_access_write: Cost,
}

impl CostConstants {
    /// Constants measured on this machine.
    pub fn calibrated() -> &'static CostConstants {
        &CALIBRATED
    }

    /// Constants for given unit costs in nanoseconds.
    pub fn from_unit_costs(memory_access_ns: f64, flop_ns: f64) -> Self {
        let memory_access_ns = memory_access_ns.max(MIN_UNIT_NS);
        let flop_ns = flop_ns.max(MIN_UNIT_NS);
        Self {
            memory_access: Cost::cpu(memory_access_ns),
            flop: Cost::cpu(flop_ns),
            disk_access_read: Cost::io(memory_access_ns * DISK_READ_FACTOR),
            disk_access_write: Cost::io(memory_access_ns * DISK_WRITE_FACTOR),
        }
    }

    fn calibrate() -> Self {
        let memory_access_ns = (0..ROUNDS)
            .map(|_| measure_memory_access())
            .fold(f64::INFINITY, f64::min);
        let flop_ns = (0..ROUNDS)
            .map(|_| measure_flop())
            .fold(f64::INFINITY, f64::min);

        info!(
            "Calibrated cost constants, memory access: {:.3}ns, flop: {:.3}ns.",
            memory_access_ns, flop_ns
        );

        Self::from_unit_costs(memory_access_ns, flop_ns)
    }
}

fn measure_memory_access() -> f64 {
    let buffer: Vec<u64> = (0..MEMORY_BUFFER_LEN as u64).collect();
    let mask = MEMORY_BUFFER_LEN - 1;
    let mut index = 0usize;
    let mut acc = 0u64;

    let start = Instant::now();
    for _ in 0..MEMORY_PROBES {
        acc = acc.wrapping_add(buffer[index]);
        index = index
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            & mask;
    }
    black_box(acc);

    start.elapsed().as_nanos() as f64 / MEMORY_PROBES as f64
}

fn measure_flop() -> f64 {
    let mut x = 1.000_1f64;

    let start = Instant::now();
    for _ in 0..FLOP_ITERATIONS {
        x = black_box(x) * 1.000_000_1 + 1e-9;
    }
    black_box(x);

    // One multiplication and one addition per iteration.
    start.elapsed().as_nanos() as f64 / (2 * FLOP_ITERATIONS) as f64
}
