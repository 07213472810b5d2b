//! Persistently mapped GPU buffers.
//!
//! A [`MappedBuffer`] is allocated once and written in place for as long as its
//! owner lives; it is released when dropped. [`UniformBlock`] adds a typed view
//! sized to the device's uniform alignment.

use std::marker::PhantomData;
use std::rc::Rc;

use bytemuck::Pod;

use crate::error::RenderError;
use crate::renderer::device::{BufferDescriptor, BufferHandle, BufferKind, RenderDevice};

pub fn align_up(size: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

pub struct MappedBuffer {
    device: Rc<dyn RenderDevice>,
    handle: BufferHandle,
    size: u64,
}

impl MappedBuffer {
    pub fn new(
        device: &Rc<dyn RenderDevice>,
        label: &str,
        size: u64,
        kind: BufferKind,
    ) -> Result<Self, RenderError> {
        let handle = device.create_buffer(&BufferDescriptor { label, size, kind })?;
        Ok(Self {
            device: Rc::clone(device),
            handle,
            size,
        })
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn write<T: Pod>(&self, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        debug_assert!(bytes.len() as u64 <= self.size);
        self.device.write_buffer(self.handle, 0, bytes);
    }
}

impl Drop for MappedBuffer {
    fn drop(&mut self) {
        self.device.destroy_buffer(self.handle);
    }
}

pub struct UniformBlock<T: Pod> {
    buffer: MappedBuffer,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBlock<T> {
    pub fn new(device: &Rc<dyn RenderDevice>, label: &str) -> Result<Self, RenderError> {
        let size = align_up(
            std::mem::size_of::<T>() as u64,
            device.uniform_alignment(),
        );
        let buffer = MappedBuffer::new(device, label, size, BufferKind::Uniform)?;
        Ok(Self {
            buffer,
            _marker: PhantomData,
        })
    }

    pub fn handle(&self) -> BufferHandle {
        self.buffer.handle()
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }

    pub fn write(&self, value: &T) {
        self.buffer.write(std::slice::from_ref(value));
    }
}
