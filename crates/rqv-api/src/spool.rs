//! # Body Spool
//!
//! Holds a request body so it can be read for assembly and then replayed
//! to the handler. Small bodies stay in memory; a body past the memory
//! ceiling spills to an anonymous temporary file, which is removed when
//! the spool (or the replayed body) is dropped.

use std::io::{self, SeekFrom};

use axum::body::{Body, Bytes};
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::BodyError;

const READ_CHUNK: usize = 64 * 1024;

/// A buffered request body.
#[derive(Debug)]
pub enum Spool {
    Memory(Bytes),
    /// Spilled to a temporary file of `len` bytes.
    File { file: File, len: u64 },
}

impl Default for Spool {
    fn default() -> Self {
        Spool::Memory(Bytes::new())
    }
}

impl From<Bytes> for Spool {
    fn from(bytes: Bytes) -> Self {
        Spool::Memory(bytes)
    }
}

impl Spool {
    /// Read `body` to the end, keeping at most `memory_limit` bytes in
    /// memory.
    pub async fn from_body(body: Body, memory_limit: usize) -> Result<Self, BodyError> {
        let mut chunks = body.into_data_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut spilled: Option<File> = None;
        let mut len = 0u64;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|_| BodyError::Unreadable)?;
            len += chunk.len() as u64;

            if spilled.is_none() && buffer.len() + chunk.len() > memory_limit {
                let std_file = tempfile::tempfile().map_err(spill_failed)?;
                let mut file = File::from_std(std_file);
                file.write_all(&buffer).await.map_err(spill_failed)?;
                buffer = Vec::new();
                tracing::debug!(memory_limit, "request body spilled to temporary storage");
                spilled = Some(file);
            }
            match spilled.as_mut() {
                Some(file) => file.write_all(&chunk).await.map_err(spill_failed)?,
                None => buffer.extend_from_slice(&chunk),
            }
        }

        match spilled {
            Some(mut file) => {
                file.flush().await.map_err(spill_failed)?;
                Ok(Spool::File { file, len })
            }
            None => Ok(Spool::Memory(Bytes::from(buffer))),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Spool::Memory(bytes) => bytes.len() as u64,
            Spool::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_spilled(&self) -> bool {
        matches!(self, Spool::File { .. })
    }

    /// Stream the contents from the start.
    pub async fn stream(&self) -> Result<BoxStream<'static, io::Result<Bytes>>, BodyError> {
        match self {
            Spool::Memory(bytes) => {
                let bytes = bytes.clone();
                Ok(stream::once(async move { Ok(bytes) }).boxed())
            }
            Spool::File { file, .. } => {
                let mut reader = file.try_clone().await.map_err(spill_failed)?;
                reader.seek(SeekFrom::Start(0)).await.map_err(spill_failed)?;
                Ok(file_stream(reader))
            }
        }
    }

    /// Collect the contents into memory, refusing more than `limit` bytes.
    pub async fn to_bytes(&self, limit: usize) -> Result<Bytes, BodyError> {
        if self.len() > limit as u64 {
            return Err(BodyError::Unreadable);
        }
        match self {
            Spool::Memory(bytes) => Ok(bytes.clone()),
            Spool::File { .. } => {
                let mut chunks = self.stream().await?;
                let mut out = Vec::with_capacity(self.len() as usize);
                while let Some(chunk) = chunks.next().await {
                    out.extend_from_slice(&chunk.map_err(spill_failed)?);
                }
                Ok(Bytes::from(out))
            }
        }
    }

    /// Turn the spool back into a body for the handler.
    pub async fn into_body(self) -> Result<Body, BodyError> {
        match self {
            Spool::Memory(bytes) => Ok(Body::from(bytes)),
            Spool::File { mut file, .. } => {
                file.seek(SeekFrom::Start(0)).await.map_err(spill_failed)?;
                Ok(Body::from_stream(file_stream(file)))
            }
        }
    }
}

fn file_stream(file: File) -> BoxStream<'static, io::Result<Bytes>> {
    stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; READ_CHUNK];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), file)))
    })
    .boxed()
}

fn spill_failed(e: io::Error) -> BodyError {
    tracing::warn!(error = %e, "temporary body storage failed");
    BodyError::Unreadable
}
