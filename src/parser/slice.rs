//! Big-endian bit reader over a message payload
//!
//! Payloads are the data bits of a message body, packed most significant bit
//! first. References to child cells are not available, so any layout that
//! stores data behind a ref cannot be read.

use crate::address::Address;
use crate::error::{Error, Result};

/// Sequential reader over a byte payload, bit by bit
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bits left to read
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    fn ensure(&self, bits: usize) -> Result<()> {
        if bits > self.remaining() {
            return Err(Error::decode(format!(
                "payload underflow: need {} bits, {} left",
                bits,
                self.remaining()
            )));
        }
        Ok(())
    }

    pub fn skip(&mut self, bits: usize) -> Result<()> {
        self.ensure(bits)?;
        self.pos += bits;
        Ok(())
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        self.ensure(1)?;
        let byte = self.data[self.pos / 8];
        let bit = (byte >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Ok(bit == 1)
    }

    /// Read an unsigned integer of up to 64 bits
    pub fn load_uint(&mut self, bits: usize) -> Result<u64> {
        if bits > 64 {
            return Err(Error::decode(format!("cannot load {} bits into u64", bits)));
        }
        Ok(self.load_uint_big(bits)? as u64)
    }

    /// Read an unsigned integer of up to 128 bits
    pub fn load_uint_big(&mut self, bits: usize) -> Result<u128> {
        if bits > 128 {
            return Err(Error::decode(format!("cannot load {} bits into u128", bits)));
        }
        self.ensure(bits)?;
        let mut value = 0u128;
        for _ in 0..bits {
            value = (value << 1) | u128::from(self.load_bit()?);
        }
        Ok(value)
    }

    pub fn load_int8(&mut self) -> Result<i8> {
        Ok(self.load_uint(8)? as u8 as i8)
    }

    /// `VarUInteger 16`: a 4-bit byte length followed by the amount
    pub fn load_coins(&mut self) -> Result<u128> {
        let len = self.load_uint(4)? as usize;
        self.load_uint_big(len * 8)
    }

    /// `MsgAddress`: `addr_none` yields `None`, `addr_std` yields the address
    pub fn load_maybe_address(&mut self) -> Result<Option<Address>> {
        match self.load_uint(2)? {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(Error::decode("anycast addresses are not supported"));
                }
                let workchain = self.load_int8()?;
                let mut hash = [0u8; 32];
                for byte in hash.iter_mut() {
                    *byte = self.load_uint(8)? as u8;
                }
                Ok(Some(Address::new(workchain, hash)))
            }
            tag => Err(Error::decode(format!("unsupported address tag {:#04b}", tag))),
        }
    }

    pub fn load_address(&mut self) -> Result<Address> {
        self.load_maybe_address()?
            .ok_or_else(|| Error::decode("expected an address, found addr_none"))
    }
}

/// Big-endian bit writer, the inverse of [`BitReader`]; builds payload fixtures
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct BitWriter {
    data: Vec<u8>,
    len: usize,
}

#[cfg(test)]
impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_bit(&mut self, bit: bool) -> &mut Self {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 1 << (7 - self.len % 8);
        }
        self.len += 1;
        self
    }

    pub fn store_uint(&mut self, value: u128, bits: usize) -> &mut Self {
        for i in (0..bits).rev() {
            self.store_bit((value >> i) & 1 == 1);
        }
        self
    }

    pub fn store_coins(&mut self, amount: u128) -> &mut Self {
        let bytes = (128 - amount.leading_zeros() as usize).div_ceil(8);
        self.store_uint(bytes as u128, 4);
        self.store_uint(amount, bytes * 8)
    }

    pub fn store_address(&mut self, address: Option<&Address>) -> &mut Self {
        match address {
            None => self.store_uint(0b00, 2),
            Some(address) => {
                self.store_uint(0b10, 2);
                self.store_bit(false);
                self.store_uint(address.workchain() as u8 as u128, 8);
                for byte in address.hash() {
                    self.store_uint(u128::from(*byte), 8);
                }
                self
            }
        }
    }

    /// The packed bytes; trailing bits of the last byte are zero
    pub fn finish(&self) -> Vec<u8> {
        self.data.clone()
    }
}
