//! Fixed frame templates with bounds-checked patching
//!
//! A template is split in two: the `head` runs up to (and including) the
//! length byte of its variable-length element, the `tail` holds the fixed
//! elements that follow it. Rendering copies the head, patches fields at
//! fixed offsets, appends the variable payload and then the tail.

use bytes::{BufMut, BytesMut};
use secot_core::{Error, Result};

/// Immutable frame layout
#[derive(Debug, Clone, Copy)]
pub struct FrameTemplate {
    name: &'static str,
    head: &'static [u8],
    tail: &'static [u8],
}

impl FrameTemplate {
    pub const fn new(name: &'static str, head: &'static [u8], tail: &'static [u8]) -> Self {
        Self { name, head, tail }
    }

    /// Start a transient copy of the template
    pub fn instantiate(&self) -> FrameBuilder {
        let mut buf = BytesMut::with_capacity(self.head.len() + 32 + self.tail.len());
        buf.put_slice(self.head);
        FrameBuilder {
            template: *self,
            buf,
        }
    }
}

/// Working copy of a [`FrameTemplate`]
#[derive(Debug)]
pub struct FrameBuilder {
    template: FrameTemplate,
    buf: BytesMut,
}

impl FrameBuilder {
    /// Overwrite `bytes` at `offset`; the write must fall inside what has
    /// been assembled so far.
    pub fn patch(&mut self, offset: usize, bytes: &[u8]) -> Result<&mut Self> {
        write_at(&mut self.buf, offset, bytes).map_err(|e| match e {
            Error::PacketConstruction(msg) => {
                Error::PacketConstruction(format!("{}: {}", self.template.name, msg))
            }
            other => other,
        })?;
        Ok(self)
    }

    pub fn patch_u8(&mut self, offset: usize, value: u8) -> Result<&mut Self> {
        self.patch(offset, &[value])
    }

    /// Write the element length byte at `len_offset` and append `payload`,
    /// silently truncated to `max_len`.
    pub fn push_element(&mut self, len_offset: usize, payload: &[u8], max_len: usize) -> Result<&mut Self> {
        let len = payload.len().min(max_len).min(u8::MAX as usize);
        self.patch_u8(len_offset, len as u8)?;
        self.buf.put_slice(&payload[..len]);
        Ok(self)
    }

    /// Offset at which the trailing elements start (or will start)
    pub fn tail_offset(&self) -> usize {
        self.buf.len()
    }

    /// Append the template's trailing elements
    pub fn push_tail(&mut self) -> &mut Self {
        self.buf.put_slice(self.template.tail);
        self
    }

    /// Append only the first `len` bytes of the trailing elements
    pub fn push_tail_prefix(&mut self, len: usize) -> &mut Self {
        let len = len.min(self.template.tail.len());
        self.buf.put_slice(&self.template.tail[..len]);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(&mut self) -> Vec<u8> {
        self.buf.split().to_vec()
    }
}

/// Bounds-checked copy of `bytes` into `buf` at `offset`
pub fn write_at(buf: &mut [u8], offset: usize, bytes: &[u8]) -> Result<()> {
    let end = offset
        .checked_add(bytes.len())
        .filter(|end| *end <= buf.len())
        .ok_or_else(|| {
            Error::PacketConstruction(format!(
                "write of {} bytes at offset {} exceeds frame length {}",
                bytes.len(),
                offset,
                buf.len()
            ))
        })?;
    buf[offset..end].copy_from_slice(bytes);
    Ok(())
}
