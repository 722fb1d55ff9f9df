use byteorder::{ByteOrder, LittleEndian};

/// Growable little-endian byte sink, the write-side counterpart of
/// [`MemoryReader`](crate::MemoryReader).
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.write_bytes(&buf)
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        let mut buf = [0u8; 2];
        LittleEndian::write_i16(&mut buf, value);
        self.write_bytes(&buf)
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.write_bytes(&buf)
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        self.write_bytes(&buf)
    }

    /// Writes `value` with the shortest variable-length prefix.
    pub fn write_var_int(&mut self, value: u64) -> &mut Self {
        if value < 0xfd {
            self.write_u8(value as u8)
        } else if value <= 0xffff {
            self.write_u8(0xfd).write_u16(value as u16)
        } else if value <= 0xffff_ffff {
            self.write_u8(0xfe).write_u32(value as u32)
        } else {
            self.write_u8(0xff).write_u64(value)
        }
    }

    /// Overwrites already written bytes at `position`.
    ///
    /// Used to patch forward references once their target is known.
    pub fn patch(&mut self, position: usize, bytes: &[u8]) -> bool {
        match self.buffer.get_mut(position..position + bytes.len()) {
            Some(slot) => {
                slot.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(bytes);
        self
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_var_int(bytes.len() as u64).write_bytes(bytes)
    }

    pub fn write_var_string(&mut self, value: &str) -> &mut Self {
        self.write_var_bytes(value.as_bytes())
    }
}
