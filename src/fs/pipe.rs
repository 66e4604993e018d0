//! Anonymous byte pipes.
//!
//! A pipe is a bounded single-producer/single-consumer byte ring with two
//! independently closable halves. Reads block while the ring is empty and a
//! writer exists; writes block while the ring is full and a reader exists.
//! Dropping the last handle of a half closes that half and wakes the peer,
//! which then observes EOF (reads) or `EPIPE` (writes).

use std::any::Any;

use crate::prelude::*;
use crate::util::ring_buf::RingBuf;

struct Pipe {
    inner: Mutex<PipeInner>,
    has_space: Condvar,
    has_data: Condvar,
}

#[derive(Debug)]
struct PipeInner {
    ring: RingBuf,
    reader_open: bool,
    writer_open: bool,
}

/// Creates a pipe over a ring buffer of `size` bytes.
pub fn pipe(size: usize) -> (PipeReader, PipeWriter) {
    let pipe = Arc::new(Pipe {
        inner: Mutex::new(PipeInner {
            ring: RingBuf::new(size),
            reader_open: true,
            writer_open: true,
        }),
        has_space: Condvar::new(),
        has_data: Condvar::new(),
    });
    (
        PipeReader { pipe: pipe.clone() },
        PipeWriter { pipe },
    )
}

impl Pipe {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut inner = self.inner.lock().unwrap();
        while inner.ring.is_empty() && inner.writer_open {
            inner = self.has_data.wait(inner).unwrap();
        }
        if inner.ring.is_empty() {
            // Writer gone and the ring drained: EOF.
            return Ok(0);
        }
        let count = inner.ring.pop_slice(buf);
        drop(inner);
        self.has_space.notify_all();
        Ok(count)
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut inner = self.inner.lock().unwrap();
        if !inner.reader_open {
            return_errno!(EPIPE, "the read side is closed");
        }
        while inner.ring.is_full() && inner.reader_open {
            inner = self.has_space.wait(inner).unwrap();
        }
        if !inner.reader_open {
            return_errno!(EPIPE, "the read side closed while writing");
        }
        let count = inner.ring.push_slice(buf);
        drop(inner);
        self.has_data.notify_all();
        Ok(count)
    }

    fn close_reader(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.reader_open = false;
        drop(inner);
        self.has_space.notify_all();
    }

    fn close_writer(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.writer_open = false;
        drop(inner);
        self.has_data.notify_all();
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("Pipe")
            .field("len", &inner.ring.len())
            .field("reader_open", &inner.reader_open)
            .field("writer_open", &inner.writer_open)
            .finish()
    }
}

pub struct PipeReader {
    pipe: Arc<Pipe>,
}

impl File for PipeReader {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.pipe.read(buf)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        trace!("pipe reader closed");
        self.pipe.close_reader();
    }
}

impl fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeReader").field("pipe", &self.pipe).finish()
    }
}

pub struct PipeWriter {
    pipe: Arc<Pipe>,
}

impl File for PipeWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.pipe.write(buf)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        trace!("pipe writer closed");
        self.pipe.close_writer();
    }
}

impl fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeWriter").field("pipe", &self.pipe).finish()
    }
}

/// Creates a pipe and binds both halves into the calling process's
/// descriptor table. Returns `[read_fd, write_fd]`; either both descriptors
/// are reserved or neither is.
pub fn do_pipe() -> Result<[FileDesc; 2]> {
    let (reader, writer) = pipe(crate::config::get().pipe_buffer_size);

    let current = current!();
    let mut files = current.process().files().lock().unwrap();
    let read_fd = files.put(Arc::new(reader))?;
    let write_fd = match files.put(Arc::new(writer)) {
        Ok(fd) => fd,
        Err(e) => {
            files
                .del(read_fd)
                .expect("the just-reserved read fd must still be there");
            return Err(e);
        }
    };
    debug!("pipe: read_fd = {}, write_fd = {}", read_fd, write_fd);
    Ok([read_fd, write_fd])
}
