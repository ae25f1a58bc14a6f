//! ## Binary serialization
//! Versioned, type-tagged layout with big-endian integers:
//!
//! ```txt
//! HyperMinHash: [token=1:1][version:1][p:4][r:4][width token:1][register count:4][entries..]
//! BetaMinHash:  [token=2:1][version:1][entries..]
//! ```
//!
//! Registers are stored sparse run-length: a negative entry `-k` skips `k` zero registers, any
//! positive entry is a literal register. Entries are `i32` for narrow stores and `i64` for wide
//! ones, BetaMinHash always uses narrow entries. Packed registers keep their top bit clear
//! (6 + 25 and 6 + 57 bits), so literals are never negative.

use bytes::{Buf, BufMut};
use log::debug;

use crate::beta_minhash::BetaMinHash;
use crate::error::{Result, SketchError};
use crate::packer::unpack_position;
use crate::registers::{RegisterStore, RegisterStoreTrait, RegisterWidth};
use crate::sketch::{validate_params, HyperMinHash, IntersectionSketch};

/// Serialization tokens. Append-only: existing values must never be reassigned.
pub mod tokens {
    /// HyperMinHash sketch
    pub const HYPER_MIN_HASH: u8 = 1;
    /// BetaMinHash sketch
    pub const BETA_MIN_HASH: u8 = 2;
    /// 64-bit register store
    pub const WIDE_REGISTERS: u8 = 3;
    /// 32-bit register store
    pub const NARROW_REGISTERS: u8 = 4;
}

/// Size of the `[token][version]` prefix shared by all sketches
const PREFIX_SIZE: usize = 2;
/// Size of the HyperMinHash parameter header following the prefix
const HYPER_MIN_HASH_HEADER_SIZE: usize = 4 + 4 + 1 + 4;

/// Binary encoding of a sketch.
pub trait SketchSerde: Sized {
    /// Return exact number of bytes `write_to` produces.
    fn size_in_bytes(&self) -> usize;

    /// Append encoded sketch to `buf`.
    fn write_to<B: BufMut>(&self, buf: &mut B);

    /// Decode sketch from `bytes`, which must hold exactly one encoded sketch.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;

    /// Return encoded sketch.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size_in_bytes());
        self.write_to(&mut buf);
        buf
    }
}

/// Return encoded `sketch`
pub fn encode<S: SketchSerde>(sketch: &S) -> Vec<u8> {
    sketch.to_bytes()
}

/// Decode a sketch of type `S` from `bytes`
pub fn decode<S: SketchSerde>(bytes: &[u8]) -> Result<S> {
    S::from_bytes(bytes)
}

/// Return number of bytes `encode` produces for `sketch`
pub fn size_in_bytes<S: SketchSerde>(sketch: &S) -> usize {
    sketch.size_in_bytes()
}

impl SketchSerde for HyperMinHash {
    fn size_in_bytes(&self) -> usize {
        let registers = self.registers();
        PREFIX_SIZE + HYPER_MIN_HASH_HEADER_SIZE + registers_size(registers, registers.width())
    }

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        let registers = self.registers();
        let width = registers.width();
        buf.put_u8(tokens::HYPER_MIN_HASH);
        buf.put_u8(Self::VERSION);
        buf.put_u32(self.precision());
        buf.put_u32(self.retained_bits());
        buf.put_u8(width_token(width));
        // at most 2^29 registers
        buf.put_u32(registers.len() as u32);
        write_registers(registers, width, buf);
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        read_prefix(&mut buf, tokens::HYPER_MIN_HASH, Self::VERSION)?;

        ensure_remaining(buf, HYPER_MIN_HASH_HEADER_SIZE, "header")?;
        let p = buf.get_u32();
        let r = buf.get_u32();
        validate_params(p, r)?;

        let width = width_from_token(buf.get_u8())?;
        if width != RegisterWidth::for_retained_bits(r) {
            return Err(SketchError::SerializationFormat(format!(
                "{:?} registers cannot hold {} retained bits",
                width, r
            )));
        }

        let count = u64::from(buf.get_u32());
        if count != 1u64 << p {
            return Err(SketchError::SerializationFormat(format!(
                "register count {} does not match precision {}",
                count, p
            )));
        }

        let registers = read_registers(&mut buf, p, r, width)?;
        ensure_consumed(buf)?;
        debug!("decoded HyperMinHash p = {}, r = {} from {} bytes", p, r, bytes.len());
        HyperMinHash::from_registers(p, r, registers)
    }
}

impl SketchSerde for BetaMinHash {
    fn size_in_bytes(&self) -> usize {
        PREFIX_SIZE + registers_size(self.registers(), RegisterWidth::Narrow)
    }

    fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(tokens::BETA_MIN_HASH);
        buf.put_u8(Self::VERSION);
        write_registers(self.registers(), RegisterWidth::Narrow, buf);
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        read_prefix(&mut buf, tokens::BETA_MIN_HASH, Self::VERSION)?;
        let registers = read_registers(&mut buf, Self::P, Self::R, RegisterWidth::Narrow)?;
        ensure_consumed(buf)?;
        debug!("decoded BetaMinHash from {} bytes", bytes.len());
        Ok(BetaMinHash::from_registers(registers))
    }
}

fn width_token(width: RegisterWidth) -> u8 {
    match width {
        RegisterWidth::Narrow => tokens::NARROW_REGISTERS,
        RegisterWidth::Wide => tokens::WIDE_REGISTERS,
    }
}

fn width_from_token(token: u8) -> Result<RegisterWidth> {
    match token {
        tokens::NARROW_REGISTERS => Ok(RegisterWidth::Narrow),
        tokens::WIDE_REGISTERS => Ok(RegisterWidth::Wide),
        _ => Err(SketchError::SerializationFormat(format!(
            "unknown register width token {}",
            token
        ))),
    }
}

/// Visit run-length entries of `registers`: `-k` for `k` consecutive zero registers, the
/// register itself otherwise.
fn for_each_entry(registers: &RegisterStore, mut f: impl FnMut(i64)) {
    let mut zeros: i64 = 0;
    for register in registers.iter() {
        if register == 0 {
            zeros += 1;
            continue;
        }
        if zeros > 0 {
            f(-zeros);
            zeros = 0;
        }
        // registers use at most 63 bits
        f(register as i64);
    }
    if zeros > 0 {
        f(-zeros);
    }
}

fn registers_size(registers: &RegisterStore, width: RegisterWidth) -> usize {
    let mut entries = 0;
    for_each_entry(registers, |_| entries += 1);
    entries * width.bytes()
}

fn write_registers<B: BufMut>(registers: &RegisterStore, width: RegisterWidth, buf: &mut B) {
    match width {
        // narrow registers and zero runs of at most 2^29 fit into i32
        RegisterWidth::Narrow => for_each_entry(registers, |entry| buf.put_i32(entry as i32)),
        RegisterWidth::Wide => for_each_entry(registers, |entry| buf.put_i64(entry)),
    }
}

fn read_registers(buf: &mut &[u8], p: u32, r: u32, width: RegisterWidth) -> Result<RegisterStore> {
    let mut registers = RegisterStore::new(p, r)?;
    let len = registers.len();
    // The mapper terminates the zero search with a sentinel bit.
    let max_position = 65 - p;

    let mut idx = 0;
    while idx < len {
        ensure_remaining(*buf, width.bytes(), "registers")?;
        let entry = match width {
            RegisterWidth::Narrow => i64::from(buf.get_i32()),
            RegisterWidth::Wide => buf.get_i64(),
        };

        if entry < 0 {
            let run = entry.unsigned_abs();
            if run > (len - idx) as u64 {
                return Err(SketchError::SerializationFormat(format!(
                    "run of {} zero registers at index {} overshoots {} registers",
                    run, idx, len
                )));
            }
            idx += run as usize;
            continue;
        }

        let register = entry.unsigned_abs();
        let position = unpack_position(register, r);
        if position == 0 || position > max_position {
            return Err(SketchError::SerializationFormat(format!(
                "register {:#x} at index {} has invalid position {}",
                register, idx, position
            )));
        }
        registers.update_if_dominant(idx, register);
        idx += 1;
    }
    Ok(registers)
}

fn read_prefix(buf: &mut &[u8], token: u8, version: u8) -> Result<()> {
    ensure_remaining(*buf, PREFIX_SIZE, "prefix")?;
    let found_token = buf.get_u8();
    if found_token != token {
        return Err(SketchError::SerializationFormat(format!(
            "unexpected sketch token {}, expected {}",
            found_token, token
        )));
    }
    let found_version = buf.get_u8();
    if found_version != version {
        return Err(SketchError::SerializationFormat(format!(
            "unsupported version {}",
            found_version
        )));
    }
    Ok(())
}

#[inline]
fn ensure_remaining(buf: &[u8], needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(SketchError::SerializationFormat(format!(
            "truncated {}: needed {} bytes, {} remaining",
            what,
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}

#[inline]
fn ensure_consumed(buf: &[u8]) -> Result<()> {
    if buf.has_remaining() {
        return Err(SketchError::SerializationFormat(format!(
            "{} trailing bytes",
            buf.remaining()
        )));
    }
    Ok(())
}
