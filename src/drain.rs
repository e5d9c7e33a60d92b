/*!
 * Background draining of subprocess output streams.
 *
 * A child process that blocks writing to a full pipe never exits, and a
 * parent that only waits for exit never drains the pipe. Each stream
 * therefore gets its own reader thread that runs to end-of-stream while
 * the parent blocks on process completion, and all three are joined once
 * the child exits.
 */

use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

/// A background reader that drains one stream into a writer until EOF
pub struct PipeDrainer<W: Write + Send + 'static> {
    handle: JoinHandle<io::Result<(W, u64)>>,
}

impl<W: Write + Send + 'static> PipeDrainer<W> {
    /// Spawn a thread that copies `reader` into `writer` until end-of-stream
    pub fn spawn<R: Read + Send + 'static>(mut reader: R, mut writer: W) -> Self {
        let handle = thread::spawn(move || {
            let copied = io::copy(&mut reader, &mut writer)?;
            writer.flush()?;
            Ok((writer, copied))
        });
        Self { handle }
    }

    /// Wait for end-of-stream and recover the writer and byte count
    pub fn join(self) -> io::Result<(W, u64)> {
        self.handle
            .join()
            .map_err(|_| io::Error::other("drain thread panicked"))?
    }
}

impl PipeDrainer<Vec<u8>> {
    /// Spawn a drainer that buffers the stream's content for diagnostics
    pub fn capture<R: Read + Send + 'static>(reader: R) -> Self {
        Self::spawn(reader, Vec::new())
    }
}
