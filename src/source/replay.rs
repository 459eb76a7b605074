//! Replay of captured packet files
//!
//! A reader thread walks the capture folder and feeds a bounded queue; the
//! send loop drains it without blocking for more than a millisecond.
//!
//! ```text
//! ┌──────────────────┐  bounded(5000)   ┌─────────────┐
//! │  replay-reader   │ ───────────────▶ │  send loop  │
//! │ (*.bin, sorted)  │   4096-byte bufs │ (main)      │
//! └──────────────────┘                  └─────────────┘
//! ```
//!
//! Each `.bin` file is a plain concatenation of wire packets. A trailing
//! partial packet is discarded. With `loop_data` the folder is listed again
//! and replayed from the first file once the last one is done.

use super::{PacketSource, SourcePoll};
use crate::core::{Packet, PACKET_BYTE_SIZE};
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Packets buffered between the reader thread and the send loop
pub const REPLAY_QUEUE_CAPACITY: usize = 5000;

/// Longest the send loop waits for the reader per poll
const POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Packet source backed by `.bin` capture files
pub struct ReplaySource {
    folder: PathBuf,
    loop_data: bool,
    rx: Option<Receiver<Vec<u8>>>,
    shutdown: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl ReplaySource {
    /// Start the reader thread for `folder`
    ///
    /// Fails if the folder cannot be listed or holds no `.bin` files.
    pub fn spawn<P: Into<PathBuf>>(folder: P, loop_data: bool) -> Result<Self> {
        let folder = folder.into();
        let files = list_captures(&folder)?;
        if files.is_empty() {
            return Err(Error::Config(format!(
                "No .bin files found in {}",
                folder.display()
            )));
        }
        log::info!(
            "Replaying {} capture file(s) from {}{}",
            files.len(),
            folder.display(),
            if loop_data { " (looping)" } else { "" }
        );

        let (tx, rx) = bounded(REPLAY_QUEUE_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));

        let reader_folder = folder.clone();
        let reader_shutdown = Arc::clone(&shutdown);
        let reader = thread::Builder::new()
            .name("replay-reader".to_string())
            .spawn(move || {
                reader_loop(reader_folder, files, loop_data, tx, reader_shutdown);
            })?;

        Ok(Self {
            folder,
            loop_data,
            rx: Some(rx),
            shutdown,
            reader: Some(reader),
        })
    }

    fn stop_reader(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Dropping the receiver unblocks a reader waiting on a full queue
        self.rx.take();
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

impl PacketSource for ReplaySource {
    fn next_packet(&mut self, _time: f64, _sequence: u64) -> Result<SourcePoll> {
        let Some(rx) = self.rx.as_ref() else {
            return Ok(SourcePoll::Exhausted);
        };

        match rx.recv_timeout(POLL_TIMEOUT) {
            Ok(bytes) => Ok(SourcePoll::Ready(Packet::from_vec(bytes)?)),
            Err(RecvTimeoutError::Timeout) => Ok(SourcePoll::Pending),
            Err(RecvTimeoutError::Disconnected) => Ok(SourcePoll::Exhausted),
        }
    }

    fn describe(&self) -> String {
        format!(
            "replay of {}{}",
            self.folder.display(),
            if self.loop_data { " (looping)" } else { "" }
        )
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop_reader();
    }
}

/// `.bin` files directly inside `folder`, sorted by path
fn list_captures(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "bin") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

enum FileOutcome {
    /// File fully read; number of packets queued
    Done(usize),
    /// Shutdown requested or the send loop went away
    Stopped,
}

fn reader_loop(
    folder: PathBuf,
    mut files: Vec<PathBuf>,
    loop_data: bool,
    tx: Sender<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        let mut pass_packets = 0usize;

        for path in &files {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            log::info!("Reading {}", path.display());
            match replay_file(path, &tx, &shutdown) {
                Ok(FileOutcome::Done(count)) => {
                    log::debug!("Queued {} packets from {}", count, path.display());
                    pass_packets += count;
                }
                Ok(FileOutcome::Stopped) => return,
                Err(e) => log::error!("Failed to read {}: {}", path.display(), e),
            }
        }

        if !loop_data || shutdown.load(Ordering::Relaxed) {
            break;
        }
        if pass_packets == 0 {
            log::error!(
                "No complete packets in {}, stopping replay",
                folder.display()
            );
            break;
        }

        files = match list_captures(&folder) {
            Ok(next) if !next.is_empty() => next,
            Ok(_) => {
                log::error!("No .bin files left in {}", folder.display());
                break;
            }
            Err(e) => {
                log::error!("Failed to list {}: {}", folder.display(), e);
                break;
            }
        };
    }
    log::info!("Replay reader finished");
}

fn replay_file(path: &Path, tx: &Sender<Vec<u8>>, shutdown: &AtomicBool) -> Result<FileOutcome> {
    let file = File::open(path)?;
    let trailing = file.metadata()?.len() % PACKET_BYTE_SIZE as u64;
    if trailing != 0 {
        log::warn!(
            "{}: discarding {} trailing bytes (not a whole packet)",
            path.display(),
            trailing
        );
    }

    let mut reader = BufReader::with_capacity(PACKET_BYTE_SIZE * 64, file);
    let mut count = 0usize;

    while !shutdown.load(Ordering::Relaxed) {
        let mut packet = vec![0u8; PACKET_BYTE_SIZE];
        match reader.read_exact(&mut packet) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(FileOutcome::Done(count)),
            Err(e) => return Err(e.into()),
        }
        // Blocks while the queue is full
        if tx.send(packet).is_err() {
            return Ok(FileOutcome::Stopped);
        }
        count += 1;
    }
    Ok(FileOutcome::Stopped)
}
