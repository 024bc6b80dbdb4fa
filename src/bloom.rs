use core::cmp::Ordering;

use crate::error::{Error, Result};

// Bloom filters as they appear inside exclude specs.
//
// The hash is a 31-bit feedback shift register following the primitive polynomial
//  x^31 + x^13 + 1, seeded from 4 bytes that travel with the filter. Every key byte
//  is folded into the register, then each hash round clocks the register once more
//  and uses its low bits as a position in the table. Only the low `1 << table_size_log2`
//  bits of the table are ever addressed.
//
// Wire form: [table_size_log2, hash_rounds, method, reserved, seed[4], bits...]

pub const DEFAULT_SEED: [u8; 4] = [0x2b, 0x7e, 0x15, 0x16];

const MAX_TABLE_SIZE_LOG2: u8 = 13;
const MIN_TABLE_SIZE_LOG2: u8 = 3;
const BITS_PER_ELEMENT: usize = 12;
const MIN_HASH_ROUNDS: u8 = 2;
const MAX_HASH_ROUNDS: u8 = 32;

const METHOD_A: u8 = b'A';
const HEADER_LEN: usize = 8;

const FEEDBACK_BITS: u32 = 13;
const STATE_MASK: u32 = 0x7FFF_FFFF;

#[derive(Clone, Debug)]
pub struct BloomFilter {
    seed: [u8; 4],
    // May be longer than `used_bytes()` when decoded from a padded buffer
    bits: Vec<u8>,
    hash_rounds: u8,
    table_size_log2: u8,
}

impl BloomFilter {
    pub fn new(expected_size: usize, seed: &[u8]) -> Result<Self> {
        let seed: [u8; 4] = seed
            .try_into()
            .map_err(|_| Error::InvalidBloomSeed { len: seed.len() })?;
        let expected_size = expected_size.max(1);

        // Aiming for about 12 bits per expected element
        let mut table_size_log2 = MAX_TABLE_SIZE_LOG2;
        while table_size_log2 > MIN_TABLE_SIZE_LOG2
            && (1usize << table_size_log2) > expected_size.saturating_mul(BITS_PER_ELEMENT)
        {
            table_size_log2 -= 1;
        }

        // Optimal k is ln(2) * m / n
        let table_bits = (1usize << table_size_log2) as f64;
        let rounds = (core::f64::consts::LN_2 * table_bits / expected_size as f64).round();
        let hash_rounds = rounds.clamp(MIN_HASH_ROUNDS as f64, MAX_HASH_ROUNDS as f64) as u8;

        Ok(Self {
            seed,
            bits: vec![0; Self::bytes_for(table_size_log2)],
            hash_rounds,
            table_size_log2,
        })
    }

    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::MalformedBloom("truncated header"));
        }
        let table_size_log2 = bytes[0];
        let hash_rounds = bytes[1];
        if !(MIN_TABLE_SIZE_LOG2..=MAX_TABLE_SIZE_LOG2).contains(&table_size_log2) {
            return Err(Error::MalformedBloom("table size out of range"));
        }
        if hash_rounds == 0 || hash_rounds > MAX_HASH_ROUNDS {
            return Err(Error::MalformedBloom("hash rounds out of range"));
        }
        if bytes[2] != METHOD_A {
            return Err(Error::MalformedBloom("unknown method"));
        }
        let bits = &bytes[HEADER_LEN..];
        if bits.len() < Self::bytes_for(table_size_log2) {
            return Err(Error::MalformedBloom("bit table shorter than its size"));
        }

        let mut seed = [0; 4];
        seed.copy_from_slice(&bytes[4..HEADER_LEN]);

        Ok(Self {
            seed,
            bits: bits.to_vec(),
            hash_rounds,
            table_size_log2,
        })
    }

    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.used_bytes());
        out.extend_from_slice(&[self.table_size_log2, self.hash_rounds, METHOD_A, 0]);
        out.extend_from_slice(&self.seed);
        out.extend_from_slice(self.used());
        out
    }

    // Returns whether any bit was newly set
    pub fn insert(&mut self, key: &[u8]) -> bool {
        let mask = self.used_bits() - 1;
        let mut state = self.key_state(key);
        let mut changed = false;
        for _ in 0..self.hash_rounds {
            state = next_state(state, 0);
            let position = (state & mask) as usize;
            let bit = 1u8 << (position & 7);
            changed |= self.bits[position >> 3] & bit == 0;
            self.bits[position >> 3] |= bit;
        }
        changed
    }

    pub fn matches(&self, key: &[u8]) -> bool {
        let mask = self.used_bits() - 1;
        let mut state = self.key_state(key);
        for _ in 0..self.hash_rounds {
            state = next_state(state, 0);
            let position = (state & mask) as usize;
            if self.bits[position >> 3] & (1 << (position & 7)) == 0 {
                return false;
            }
        }
        true
    }

    pub fn seed(&self) -> [u8; 4] {
        self.seed
    }

    pub fn hash_rounds(&self) -> u8 {
        self.hash_rounds
    }

    pub fn table_size_log2(&self) -> u8 {
        self.table_size_log2
    }

    pub fn used_bits(&self) -> u32 {
        1 << self.table_size_log2
    }

    pub fn used_bytes(&self) -> usize {
        Self::bytes_for(self.table_size_log2)
    }

    fn used(&self) -> &[u8] {
        &self.bits[..self.used_bytes()]
    }

    fn bytes_for(table_size_log2: u8) -> usize {
        ((1usize << table_size_log2) / 8).max(1)
    }

    fn key_state(&self, key: &[u8]) -> u32 {
        // Keys fold in as byte + 1 so that runs of zero bytes still move the register
        key.iter().fold(
            u32::from_be_bytes(self.seed) & STATE_MASK,
            |state, b| next_state(state, *b as u32 + 1),
        )
    }
}

fn next_state(state: u32, input: u32) -> u32 {
    let feedback = state & ((1 << FEEDBACK_BITS) - 1);
    let mixed = (state >> FEEDBACK_BITS)
        ^ (feedback << (31 - FEEDBACK_BITS))
        ^ (feedback << (31 - 2 * FEEDBACK_BITS));
    (mixed & STATE_MASK).wrapping_add(input) & STATE_MASK
}

// Only the addressed part of the table takes part in comparisons
impl PartialEq for BloomFilter {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BloomFilter {}

impl PartialOrd for BloomFilter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BloomFilter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.table_size_log2
            .cmp(&other.table_size_log2)
            .then(self.hash_rounds.cmp(&other.hash_rounds))
            .then(self.seed.cmp(&other.seed))
            .then_with(|| self.used().cmp(other.used()))
    }
}
