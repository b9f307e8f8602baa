use std::io;

use tracing::Level;

/// Buffers one formatted event and hands it to `console.log` when dropped.
#[derive(Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&line.trim_end().into());
    }
}

/// Route `tracing` output to the browser console. Later calls are no-ops.
pub fn init(max_level: Level) {
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::default)
        .with_max_level(max_level)
        .without_time()
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
