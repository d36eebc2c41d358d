//! JSON-lines sink over any `std::io::Write`.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use eventsim_core::sink::{PublishSink, SinkError};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes one message per line. The lock keeps lines from interleaving
/// when several workers publish at once. Writes run on the blocking pool.
pub struct WriterSink {
    writer: SharedWriter,
}

impl WriterSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Appends to `path`, creating it if needed.
    pub fn file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(io::BufWriter::new(file)))
    }
}

#[async_trait]
impl PublishSink for WriterSink {
    async fn publish(&self, payload: Bytes) -> Result<(), SinkError> {
        blocking(self.writer.clone(), move |writer| {
            writer.write_all(&payload)?;
            writer.write_all(b"\n")
        })
        .await
    }

    async fn flush(&self) -> Result<(), SinkError> {
        blocking(self.writer.clone(), |writer| writer.flush()).await
    }
}

async fn blocking<F>(writer: SharedWriter, op: F) -> Result<(), SinkError>
where
    F: FnOnce(&mut Box<dyn Write + Send>) -> io::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&mut writer.lock()))
        .await
        .map_err(|err| SinkError::Unavailable(err.to_string()))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn writes_one_line_per_message() {
        let buf = SharedBuf::default();
        let sink = WriterSink::new(buf.clone());
        sink.publish(Bytes::from_static(b"{\"a\":1}")).await.unwrap();
        sink.publish(Bytes::from_static(b"{\"a\":2}")).await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(&*buf.0.lock(), b"{\"a\":1}\n{\"a\":2}\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_publishes_keep_lines_whole() {
        let buf = SharedBuf::default();
        let sink = Arc::new(WriterSink::new(buf.clone()));
        let mut tasks = Vec::new();
        for task in 0..8 {
            let sink = sink.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    let line = format!("{{\"task\":{task},\"i\":{i}}}");
                    sink.publish(Bytes::from(line)).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 400);
        assert!(lines
            .iter()
            .all(|line| line.starts_with("{\"task\":") && line.ends_with('}')));
    }

    #[tokio::test]
    async fn io_errors_surface_as_sink_errors() {
        let sink = WriterSink::new(BrokenPipe);
        let err = sink.publish(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
