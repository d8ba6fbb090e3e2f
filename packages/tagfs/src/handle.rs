//! Random-access file handles over remote file content.
//!
//! The object store only offers ranged reads, ranged writes and a shrinking
//! truncate. A [`FileHandle`] keeps its own position and builds stream
//! semantics (seek, line reading, growing truncate) on top of those three
//! calls. Seeking and `tell` never touch the network, except that seeking
//! from the end asks for the current size.

use std::fmt;
use std::io::{self, SeekFrom};
use std::iter::FusedIterator;
use std::sync::Arc;

use tagfs_object_service::{ObjectId, ObjectService};

use crate::error::{FsError, FsResult};

/// Chunk size for line reads and zero padding.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// An open file.
///
/// Handles share the filesystem's connection. Nothing tracks open handles,
/// so two handles on one file see each other's writes but keep separate
/// positions.
pub struct FileHandle {
    service: Arc<dyn ObjectService>,
    file_id: ObjectId,
    name: String,
    pos: u64,
    readable: bool,
    writable: bool,
    buffer_size: usize,
    closed: bool,
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("file_id", &self.file_id)
            .field("name", &self.name)
            .field("pos", &self.pos)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl FileHandle {
    pub(crate) fn new(
        service: Arc<dyn ObjectService>,
        file_id: ObjectId,
        name: impl Into<String>,
        readable: bool,
        writable: bool,
    ) -> Self {
        Self {
            service,
            file_id,
            name: name.into(),
            pos: 0,
            readable,
            writable,
            buffer_size: DEFAULT_BUFFER_SIZE,
            closed: false,
        }
    }

    /// Use a different chunk size for line reads and padding. Zero is
    /// treated as one.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_id(&self) -> ObjectId {
        self.file_id
    }

    pub fn readable(&self) -> bool {
        self.readable
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn seekable(&self) -> bool {
        true
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn isatty(&self) -> bool {
        false
    }

    /// Handles have no operating system descriptor.
    pub fn fileno(&self) -> FsResult<i32> {
        Err(FsError::unsupported(&self.name, "fileno"))
    }

    fn ensure_open(&self) -> FsResult<()> {
        if self.closed {
            return Err(FsError::Closed);
        }
        Ok(())
    }

    fn ensure_readable(&self) -> FsResult<()> {
        self.ensure_open()?;
        if !self.readable {
            return Err(FsError::PermissionDenied {
                message: "File opened write-only".to_string(),
            });
        }
        Ok(())
    }

    fn ensure_writable(&self) -> FsResult<()> {
        self.ensure_open()?;
        if !self.writable {
            return Err(FsError::PermissionDenied {
                message: "File opened read-only".to_string(),
            });
        }
        Ok(())
    }

    /// Current size of the remote content.
    pub fn size(&self) -> FsResult<u64> {
        self.ensure_open()?;
        Ok(self.service.file_size(self.file_id)?)
    }

    /// Read up to `size` bytes from the current position, or everything up
    /// to the end with `None`. Returns an empty buffer at end of file.
    pub fn read(&mut self, size: Option<usize>) -> FsResult<Vec<u8>> {
        self.ensure_readable()?;
        let length = match size {
            Some(size) => size as u64,
            None => self
                .service
                .file_size(self.file_id)?
                .saturating_sub(self.pos),
        };
        if length == 0 {
            return Ok(Vec::new());
        }

        let data = self.service.read_file(self.file_id, self.pos, length)?;
        self.pos += data.len() as u64;
        Ok(data)
    }

    /// Write `data` at the current position.
    pub fn write(&mut self, data: &[u8]) -> FsResult<usize> {
        self.ensure_writable()?;
        if data.is_empty() {
            return Ok(0);
        }
        let end = self
            .pos
            .checked_add(data.len() as u64)
            .ok_or_else(|| FsError::InvalidArgument {
                message: format!(
                    "write of {} bytes at position {} overflows",
                    data.len(),
                    self.pos
                ),
            })?;

        self.service.write_file(self.file_id, self.pos, data)?;
        self.pos = end;
        Ok(data.len())
    }

    pub fn writelines<I>(&mut self, lines: I) -> FsResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for line in lines {
            self.write(line.as_ref())?;
        }
        Ok(())
    }

    /// Resize the file to `size` bytes, or to the current position with
    /// `None`. The position is left where it was.
    ///
    /// Growing writes zero bytes from the current end, since the store can
    /// only shrink.
    pub fn truncate(&mut self, size: Option<u64>) -> FsResult<u64> {
        self.ensure_writable()?;
        let size = size.unwrap_or(self.pos);
        let current = self.service.file_size(self.file_id)?;

        if size < current {
            self.service.truncate_file(self.file_id, size)?;
        } else if size > current {
            let saved = self.pos;
            self.pos = current;
            let result = self.pad_to(size);
            self.pos = saved;
            result?;
        }
        Ok(size)
    }

    fn pad_to(&mut self, size: u64) -> FsResult<()> {
        let zeros = vec![0u8; self.buffer_size];
        while self.pos < size {
            let chunk = (size - self.pos).min(zeros.len() as u64) as usize;
            self.write(&zeros[..chunk])?;
        }
        Ok(())
    }

    /// Move the position. Positions past the end are allowed; positions
    /// before the start are not.
    pub fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        self.ensure_open()?;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => self
                .service
                .file_size(self.file_id)?
                .checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| FsError::InvalidArgument {
            message: format!("invalid seek to {:?} from position {}", pos, self.pos),
        })?;
        self.pos = target;
        Ok(target)
    }

    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Read one line including its `\n`, at most `limit` bytes.
    ///
    /// Content is fetched in chunks of the buffer size; bytes fetched past
    /// the terminator are given back by moving the position to just after
    /// it. Returns an empty buffer at end of file.
    pub fn readline(&mut self, limit: Option<usize>) -> FsResult<Vec<u8>> {
        self.ensure_readable()?;
        let mut line = Vec::new();
        loop {
            let want = match limit {
                Some(limit) => (limit - line.len()).min(self.buffer_size),
                None => self.buffer_size,
            };
            if want == 0 {
                break;
            }

            let start = self.pos;
            let chunk = self.read(Some(want))?;
            if chunk.is_empty() {
                break;
            }
            if let Some(end) = chunk.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&chunk[..=end]);
                self.pos = start + end as u64 + 1;
                break;
            }
            line.extend_from_slice(&chunk);
        }
        Ok(line)
    }

    /// Read lines until end of file, or until at least `hint` bytes have
    /// been read.
    pub fn readlines(&mut self, hint: Option<usize>) -> FsResult<Vec<Vec<u8>>> {
        let hint = hint.filter(|&h| h > 0);
        let mut lines = Vec::new();
        let mut total = 0;
        loop {
            let line = self.readline(None)?;
            if line.is_empty() {
                break;
            }
            total += line.len();
            lines.push(line);
            if hint.is_some_and(|h| total >= h) {
                break;
            }
        }
        Ok(lines)
    }

    /// Lines from the current position onwards.
    ///
    /// The iterator consumes the handle's position and ends for good at end
    /// of file or after the first error.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines {
            handle: self,
            done: false,
        }
    }

    /// Writes go straight to the store; there is nothing to flush.
    pub fn flush(&mut self) -> FsResult<()> {
        self.ensure_open()
    }

    /// Close the handle. Closing twice is fine; the connection stays open.
    pub fn close(&mut self) -> FsResult<()> {
        if !self.closed {
            self.closed = true;
            tracing::debug!(file_id = self.file_id, name = %self.name, "closed file handle");
        }
        Ok(())
    }
}

/// Iterator returned by [`FileHandle::lines`].
#[derive(Debug)]
pub struct Lines<'a> {
    handle: &'a mut FileHandle,
    done: bool,
}

impl Iterator for Lines<'_> {
    type Item = FsResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.handle.readline(None) {
            Ok(line) if line.is_empty() => {
                self.done = true;
                None
            }
            Ok(line) => Some(Ok(line)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Lines<'_> {}

impl io::Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = FileHandle::read(self, Some(buf.len()))?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

impl io::Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(FileHandle::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(FileHandle::flush(self)?)
    }
}

impl io::Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(FileHandle::seek(self, pos)?)
    }
}
