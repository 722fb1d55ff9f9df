use crate::error::{IoError, IoResult};
use byteorder::{ByteOrder, LittleEndian};
use std::mem::size_of;

/// Read cursor over an immutable byte buffer.
///
/// Every read is bounds-checked; a failed read leaves the position untouched.
#[derive(Debug, Clone)]
pub struct MemoryReader<'a> {
    memory: &'a [u8],
    pos: usize,
}

impl<'a> MemoryReader<'a> {
    pub fn new(memory: &'a [u8]) -> Self {
        Self { memory, pos: 0 }
    }

    /// Creates a reader positioned at `pos`.
    pub fn with_position(memory: &'a [u8], pos: usize) -> IoResult<Self> {
        let mut reader = Self::new(memory);
        reader.seek(pos)?;
        Ok(reader)
    }

    #[inline(always)]
    fn ensure_position(&self, move_by: usize) -> IoResult<()> {
        match self.pos.checked_add(move_by) {
            Some(end) if end <= self.memory.len() => Ok(()),
            _ => Err(IoError::UnexpectedEof {
                position: self.pos,
                needed: move_by,
                length: self.memory.len(),
            }),
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.memory.len() - self.pos
    }

    /// Moves the cursor. Seeking to the end of the buffer is allowed.
    pub fn seek(&mut self, pos: usize) -> IoResult<()> {
        if pos > self.memory.len() {
            return Err(IoError::InvalidSeek {
                position: pos,
                length: self.memory.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    #[inline(always)]
    pub fn peek(&self) -> IoResult<u8> {
        self.ensure_position(1)?;
        Ok(self.memory[self.pos])
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> IoResult<u8> {
        self.ensure_position(1)?;
        let value = self.memory[self.pos];
        self.pos += 1;
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u16(&mut self) -> IoResult<u16> {
        self.ensure_position(size_of::<u16>())?;
        let value = LittleEndian::read_u16(&self.memory[self.pos..]);
        self.pos += size_of::<u16>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_i16(&mut self) -> IoResult<i16> {
        self.ensure_position(size_of::<i16>())?;
        let value = LittleEndian::read_i16(&self.memory[self.pos..]);
        self.pos += size_of::<i16>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u32(&mut self) -> IoResult<u32> {
        self.ensure_position(size_of::<u32>())?;
        let value = LittleEndian::read_u32(&self.memory[self.pos..]);
        self.pos += size_of::<u32>();
        Ok(value)
    }

    #[inline(always)]
    pub fn read_u64(&mut self) -> IoResult<u64> {
        self.ensure_position(size_of::<u64>())?;
        let value = LittleEndian::read_u64(&self.memory[self.pos..]);
        self.pos += size_of::<u64>();
        Ok(value)
    }

    /// Reads a variable-length integer bounded by `max`.
    pub fn read_var_int(&mut self, max: u64) -> IoResult<u64> {
        let start = self.pos;
        let b = self.read_u8()?;
        let value = match b {
            0xfd => self.read_u16().map(u64::from),
            0xfe => self.read_u32().map(u64::from),
            0xff => self.read_u64(),
            _ => Ok(u64::from(b)),
        };
        let value = match value {
            Ok(value) => value,
            Err(err) => {
                self.pos = start;
                return Err(err);
            }
        };
        if value > max {
            self.pos = start;
            return Err(IoError::VarIntTooLarge { value, max });
        }
        Ok(value)
    }

    pub fn read_bytes(&mut self, count: usize) -> IoResult<&'a [u8]> {
        self.ensure_position(count)?;
        let result = &self.memory[self.pos..self.pos + count];
        self.pos += count;
        Ok(result)
    }

    pub fn read_var_bytes(&mut self, max: u64) -> IoResult<&'a [u8]> {
        let start = self.pos;
        let length = self.read_var_int(max)? as usize;
        self.read_bytes(length).map_err(|err| {
            self.pos = start;
            err
        })
    }

    pub fn read_var_string(&mut self, max: u64) -> IoResult<String> {
        let start = self.pos;
        let data = self.read_var_bytes(max)?;
        String::from_utf8(data.to_vec()).map_err(|_| {
            self.pos = start;
            IoError::InvalidUtf8
        })
    }

    pub fn read_to_end(&mut self) -> &'a [u8] {
        let result = &self.memory[self.pos..];
        self.pos = self.memory.len();
        result
    }
}
