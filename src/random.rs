// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Process-wide cryptographic random source.
//!
//! A ChaCha20 generator is seeded once per process from a SHA-256 pool.
//! Seeding repeatedly mixes in the clock and process id plus whatever the
//! operating system's CSPRNG hands out, and only finishes once enough
//! entropy has been credited. If the OS source fails, a weak fallback of
//! stack-address and timing jitter keeps the loop moving one byte at a time.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bytes of entropy that must be credited before the generator is ready.
const SEED_BYTES: usize = 32;

/// Largest single request, matching the C `int` length used by OpenSSL.
const MAX_REQUEST: usize = i32::MAX as usize;

static GENERATOR: Lazy<Mutex<ChaCha20Rng>> = Lazy::new(|| {
    let seeded = seed(&mut OsEntropy);
    tracing::trace!(rounds = seeded.rounds, "random generator seeded");
    Mutex::new(ChaCha20Rng::from_seed(seeded.seed))
});

/// Something that can hand out raw entropy, or fail to.
pub(crate) trait EntropySource {
    fn try_fill(&mut self, buf: &mut [u8]) -> bool;
}

struct OsEntropy;

impl EntropySource for OsEntropy {
    fn try_fill(&mut self, buf: &mut [u8]) -> bool {
        OsRng.try_fill_bytes(buf).is_ok()
    }
}

pub(crate) struct Seeded {
    pub(crate) seed: [u8; 32],
    pub(crate) rounds: usize,
}

/// Accumulates entropy into a running SHA-256 state.
struct SeedPool {
    hasher: Sha256,
    credited: usize,
}

impl SeedPool {
    fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            credited: 0,
        }
    }

    fn mix(&mut self, data: &[u8], credit: usize) {
        self.hasher.update(data);
        self.credited += credit;
    }

    fn is_ready(&self) -> bool {
        self.credited >= SEED_BYTES
    }

    fn finish(self) -> [u8; 32] {
        self.hasher.finalize().into()
    }
}

fn clock_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

/// Weak entropy used only when the OS refuses to provide any.
fn weak_sample(pool: &mut SeedPool, round: usize) {
    let marker = [0u8; 128];
    let addr = marker.as_ptr() as usize;
    // Pseudo-random offset into the sample so rounds do not repeat exactly
    let offset = (clock_nanos() as usize ^ round.wrapping_mul(0x9e37_79b9)) % marker.len();
    pool.mix(&addr.wrapping_add(offset).to_ne_bytes(), 0);
    pool.mix(&clock_nanos().to_ne_bytes(), 1);
}

pub(crate) fn seed<S: EntropySource>(source: &mut S) -> Seeded {
    let mut pool = SeedPool::new();
    let pid = std::process::id();
    let mut rounds = 0;

    while !pool.is_ready() {
        rounds += 1;
        pool.mix(&clock_nanos().to_ne_bytes(), 0);
        pool.mix(&pid.to_ne_bytes(), 0);

        let mut buf = [0u8; SEED_BYTES];
        if source.try_fill(&mut buf) {
            pool.mix(&buf, buf.len());
        } else {
            weak_sample(&mut pool, rounds);
        }
    }

    Seeded {
        seed: pool.finish(),
        rounds,
    }
}

/// Seed the process generator if that has not happened yet.
///
/// Safe to call from any number of threads; seeding runs at most once.
pub fn init() {
    Lazy::force(&GENERATOR);
}

/// Fill `buf` with cryptographically strong random bytes.
///
/// # Errors
/// Returns [`Error::NotImplemented`] if `buf` is longer than `i32::MAX`.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    if buf.len() > MAX_REQUEST {
        return Err(Error::NotImplemented(format!(
            "random request of {} bytes exceeds {}",
            buf.len(),
            MAX_REQUEST
        )));
    }
    GENERATOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .fill_bytes(buf);
    Ok(())
}

/// Adapter exposing the process generator to APIs that take an `RngCore`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandom;

impl RngCore for SystemRandom {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // Chunked so the length bound never applies here
        for chunk in dest.chunks_mut(1 << 20) {
            GENERATOR
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .fill_bytes(chunk);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for SystemRandom {}
