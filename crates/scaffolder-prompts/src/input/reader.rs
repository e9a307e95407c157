//! Raw byte source and the async decode pump
//!
//! A dedicated thread does blocking reads on stdin and forwards chunks over a
//! channel; the pump task decodes them and publishes events to an [`InputHub`].
//! The pump is also where the escape timeout lives: when the decoder holds an
//! unterminated ESC and no bytes arrive in time, the buffer is flushed as a
//! bare Escape key.

use super::decoder::Decoder;
use super::event::InputEvent;
use super::hub::InputHub;
use std::io::{self, Read};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Receiving end of raw input chunks
pub type ByteChunks = mpsc::UnboundedReceiver<Vec<u8>>;

/// Spawn the stdin reader thread.
///
/// The thread is detached: a blocking read can't be interrupted, so it simply
/// ends with the process (or when stdin reaches EOF).
pub fn spawn_stdin_reader() -> io::Result<ByteChunks> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::Builder::new()
        .name("scaffold-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            let mut buf = [0u8; 256];
            loop {
                match stdin.lock().read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::debug!("stdin read failed: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("stdin reader finished");
        })?;

    Ok(rx)
}

/// Decode chunks until the channel closes, publishing every event.
/// Closes the hub when the source ends.
pub async fn pump(mut chunks: ByteChunks, hub: InputHub, escape_timeout: Duration) {
    let mut decoder = Decoder::new();

    loop {
        let chunk = if decoder.has_pending() {
            match tokio::time::timeout(escape_timeout, chunks.recv()).await {
                Ok(chunk) => chunk,
                Err(_) => {
                    publish_all(&hub, decoder.flush());
                    continue;
                }
            }
        } else {
            chunks.recv().await
        };

        match chunk {
            Some(bytes) => publish_all(&hub, decoder.feed(&bytes)),
            None => {
                publish_all(&hub, decoder.flush());
                hub.close();
                break;
            }
        }
    }
}

/// Run [`pump`] as a background task
pub fn spawn_pump(chunks: ByteChunks, hub: InputHub, escape_timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(pump(chunks, hub, escape_timeout))
}

fn publish_all(hub: &InputHub, events: Vec<InputEvent>) {
    for event in &events {
        hub.publish(event);
    }
}
