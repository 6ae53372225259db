use crate::hex_codec;
use crate::stats::RunStats;
use std::fs::File;
use std::io::{self, Stdout, Write};

/// A writer whose buffered output can be pushed down to durable storage.
pub trait DurableWrite: Write {
    /// Flushes and then asks the OS to persist everything written so far.
    fn sync(&mut self) -> io::Result<()>;
}

impl DurableWrite for File {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_data()
    }
}

impl DurableWrite for Stdout {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        sync_stdout(self);
        Ok(())
    }
}

// ttys and pipes reject fsync; that is not worth failing a report over.
#[cfg(unix)]
fn sync_stdout(stdout: &Stdout) {
    use std::os::fd::AsFd;

    if let Ok(fd) = stdout.as_fd().try_clone_to_owned() {
        let _ = File::from(fd).sync_data();
    }
}

#[cfg(not(unix))]
fn sync_stdout(_stdout: &Stdout) {}

impl DurableWrite for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: DurableWrite + ?Sized> DurableWrite for &mut W {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

/// Writes the human-readable output of a run.
pub struct Reporter<W: DurableWrite> {
    out: W,
    reports: u64,
}

impl<W: DurableWrite> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, reports: 0 }
    }

    /// Emits a new-best line pair and makes sure it reached the sink before
    /// returning.
    pub fn new_best(&mut self, candidate: &str, distance: u32, digest: &[u8]) -> io::Result<()> {
        writeln!(self.out, "score(\"{candidate}\") = {distance}")?;
        writeln!(self.out, "{}", hex_codec::encode(digest))?;
        self.out.sync()?;
        self.reports += 1;
        Ok(())
    }

    /// Emits the final hash count, elapsed time and rate.
    pub fn summary(&mut self, stats: &RunStats) -> io::Result<()> {
        writeln!(
            self.out,
            "\n{} hashes in {}.{:06} seconds",
            stats.hashes,
            stats.elapsed.as_secs(),
            stats.elapsed.subsec_micros()
        )?;
        writeln!(self.out, "({} hashes per second)", stats.hashes_per_second())?;
        self.out.flush()
    }

    /// Number of new-best reports written so far.
    pub fn reports(&self) -> u64 {
        self.reports
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
