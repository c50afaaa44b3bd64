//! Byte cursor over a pull-based reader with double-buffered prefetch.
//!
//! The scanner owns a working buffer of one lookback slot plus [`CHUNK`] live
//! bytes. A dedicated worker thread reads the next chunk while the current one
//! is being parsed; the two sides meet on a pair of rendezvous channels, and a
//! single spare chunk buffer circulates between them so steady-state operation
//! allocates nothing. The absolute end of input is unknown until the reader is
//! exhausted, at which point the worker publishes it through an atomic shared
//! with every reader of `end()`.

use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};

/// Live bytes per fill; the working buffer adds one lookback slot.
pub(crate) const CHUNK: usize = 4095;

/// Sentinel meaning the reader has not yet signalled end-of-input.
pub(crate) const END_UNKNOWN: u64 = u64::MAX;

type Chunk = Box<[u8; CHUNK]>;

pub(crate) struct Scanner {
    /// Absolute byte position in the input stream.
    pos: u64,
    /// Absolute end of input; `END_UNKNOWN` until the reader is exhausted.
    end: Arc<AtomicU64>,
    /// Index of the last returned byte within `buf`.
    ipos: usize,
    /// High-water mark of valid bytes within `buf`.
    ifill: usize,
    /// Working buffer: slot 0 is the lookback byte, slots 1..=ifill are live.
    buf: Box<[u8; CHUNK + 1]>,
    /// Whether the most recent `next()` actually moved the cursor.
    advanced: bool,
    fill_req: Sender<Chunk>,
    fill_ready: Receiver<(Chunk, usize)>,
    failure: Arc<Mutex<Option<io::Error>>>,
}

impl Scanner {
    /// Starts the prefetch worker and issues the initial fill request so the
    /// first `next()` has bytes to consume.
    pub(crate) fn new<R: Read + Send + 'static>(reader: R) -> Self {
        let (req_tx, req_rx) = bounded::<Chunk>(0);
        let (ready_tx, ready_rx) = bounded::<(Chunk, usize)>(0);
        let end = Arc::new(AtomicU64::new(END_UNKNOWN));
        let failure = Arc::new(Mutex::new(None));

        {
            let end = Arc::clone(&end);
            let failure = Arc::clone(&failure);
            thread::spawn(move || fill_loop(reader, &req_rx, &ready_tx, &end, &failure));
        }

        // The worker is parked on the request channel; this rendezvous
        // kicks off the first read without waiting for it to complete.
        let _ = req_tx.send(Box::new([0u8; CHUNK]));

        Self {
            pos: 0,
            end,
            ipos: 0,
            ifill: 0,
            buf: Box::new([0u8; CHUNK + 1]),
            advanced: false,
            fill_req: req_tx,
            fill_ready: ready_rx,
            failure,
        }
    }

    /// Number of bytes consumed from the reader.
    pub(crate) fn pos(&self) -> u64 {
        self.pos
    }

    /// Absolute end of input, or `END_UNKNOWN` if not yet observed.
    pub(crate) fn end(&self) -> u64 {
        self.end.load(Ordering::Acquire)
    }

    /// Number of unread bytes, or `END_UNKNOWN` while the end of the
    /// underlying reader has not been found.
    pub(crate) fn remaining(&self) -> u64 {
        match self.end() {
            END_UNKNOWN => END_UNKNOWN,
            end => end.saturating_sub(self.pos),
        }
    }

    /// Byte at the current position, without advancing.
    pub(crate) fn cur(&self) -> u8 {
        self.buf[self.ipos]
    }

    /// Advances one byte and returns it; returns 0 without moving once the
    /// end of input has been reached.
    pub(crate) fn next(&mut self) -> u8 {
        if self.pos >= self.end() {
            self.advanced = false;
            return 0;
        }
        self.ipos += 1;

        if self.ipos > self.ifill {
            match self.fill_ready.recv() {
                Ok((chunk, n)) => {
                    // Keep the last live byte in slot 0 so back() still works
                    // across the buffer seam.
                    self.buf[0] = self.buf[self.ifill];
                    self.buf[1..=n].copy_from_slice(&chunk[..n]);
                    self.ifill = n;
                    self.ipos = 1;
                    if self.end() == END_UNKNOWN {
                        // Hand the spare buffer back so the next chunk is
                        // read while this one is parsed.
                        let _ = self.fill_req.send(chunk);
                    }
                }
                Err(_) => {
                    // Worker gone: end of input or reader failure.
                    self.ipos -= 1;
                    self.advanced = false;
                    return 0;
                }
            }
        }

        self.pos += 1;
        self.advanced = true;
        self.buf[self.ipos]
    }

    /// Rewinds one byte. Only the byte returned by the most recent `next()`
    /// can be un-read; a `next()` that hit end-of-input did not move, so the
    /// rewind is skipped.
    pub(crate) fn back(&mut self) {
        if !self.advanced {
            return;
        }
        assert!(self.ipos > 0, "lookback exhausted");
        self.ipos -= 1;
        self.pos -= 1;
        self.advanced = false;
    }

    /// Error recorded by the prefetch worker, if the reader failed.
    pub(crate) fn take_failure(&self) -> Option<io::Error> {
        self.failure.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Prefetch worker: waits for a fill request carrying the spare chunk, reads
/// into it, and sends it back with the byte count. On end-of-input it stores
/// the cumulative total as the absolute end and drops the result channel; on
/// a reader failure it records the error first so the decoder can surface it.
fn fill_loop<R: Read>(
    mut reader: R,
    requests: &Receiver<Chunk>,
    ready: &Sender<(Chunk, usize)>,
    end: &AtomicU64,
    failure: &Mutex<Option<io::Error>>,
) {
    let mut total: u64 = 0;

    for mut chunk in requests.iter() {
        loop {
            match reader.read(&mut chunk[..]) {
                Ok(0) => {
                    tracing::trace!(total, "reader exhausted");
                    end.store(total, Ordering::Release);
                    return;
                }
                Ok(n) => {
                    total += n as u64;
                    tracing::trace!(n, total, "chunk prefetched");
                    if ready.send((chunk, n)).is_err() {
                        return;
                    }
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(error = %e, total, "reader failure");
                    if let Ok(mut slot) = failure.lock() {
                        *slot = Some(e);
                    }
                    end.store(total, Ordering::Release);
                    return;
                }
            }
        }
    }
}
