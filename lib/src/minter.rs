//! Serialized monotonic integer allocation, backed by a counter file.
//!
//! Mirrors the original implementation's `CreateMinter`/`MintNextUri`: a
//! dedicated background thread owns the counter file and is the only thing
//! that ever reads or writes it, so concurrent callers can never observe or
//! produce the same value. Callers exchange a one-shot reply channel with
//! the thread over a bounded `mpsc` channel and block on the reply.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

/// Allocates IDs of the form `{prefix}{n}` (e.g. `node34`), serialized
/// across every clone. Cloning shares the same background thread.
#[derive(Clone)]
pub struct Minter {
    requests: mpsc::Sender<mpsc::Sender<u64>>,
}

impl Minter {
    /// Spawns the minter thread, creating `id_file` with an initial value
    /// of `0` if it does not already exist.
    pub fn new(id_file: PathBuf) -> Result<Self> {
        if !id_file.is_file() {
            fs::write(&id_file, "0")?;
        }
        let (requests, inbox) = mpsc::channel::<mpsc::Sender<u64>>();
        thread::spawn(move || run(&id_file, &inbox));
        Ok(Self { requests })
    }

    /// Mints the next integer and returns `prefix` concatenated with it.
    ///
    /// # Panics
    /// Panics if the minter thread has terminated (an unrecoverable I/O
    /// failure on the counter file), mirroring the original's `panic` on a
    /// corrupt or unreadable id file.
    pub fn mint(&self, prefix: &str) -> String {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .send(reply_tx)
            .expect("minter thread terminated unexpectedly");
        let id = reply_rx
            .recv()
            .expect("minter thread terminated unexpectedly");
        format!("{prefix}{id}")
    }
}

/// Body of the dedicated minter thread: serve one request at a time for as
/// long as there are live senders.
fn run(id_file: &Path, inbox: &mpsc::Receiver<mpsc::Sender<u64>>) {
    while let Ok(reply) = inbox.recv() {
        let next = mint_next_id(id_file);
        if reply.send(next).is_err() {
            // Caller gave up waiting; the counter file was still advanced,
            // matching the fire-and-forget nature of the original channel.
        }
    }
}

fn mint_next_id(id_file: &Path) -> u64 {
    let last_text = fs::read_to_string(id_file).expect("could not read last id");
    let last_id: u64 = last_text
        .trim()
        .parse()
        .expect("could not calculate last id");
    let next_id = last_id + 1;
    fs::write(id_file, next_id.to_string()).expect("error writing next id");
    next_id
}
