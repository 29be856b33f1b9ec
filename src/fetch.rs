//! HTTP fetch surface bridging async responses to the blocking parser.
//!
//! The tokenizer pulls bytes through `std::io::Read`, while responses arrive
//! as an async byte stream. A spawned forwarder pushes chunks into a bounded
//! channel and [`RemoteBody`] drains it blockingly, so a page parse can run
//! on a blocking thread while the download proceeds.

use bytes::{Buf, Bytes};
use futures_util::StreamExt;
use reqwest::Client;
use std::io::{self, Read};
use tokio::sync::mpsc;

const CHUNK_CHANNEL_CAPACITY: usize = 4;

/// Response body readable from blocking code.
///
/// `read` parks the calling thread on the chunk channel, so it must only be
/// used off the async runtime (e.g. inside `spawn_blocking`).
pub struct RemoteBody {
    chunks: mpsc::Receiver<reqwest::Result<Bytes>>,
    current: Bytes,
}

impl Read for RemoteBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current.is_empty() {
            match self.chunks.blocking_recv() {
                None => return Ok(0),
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(err)) => return Err(io::Error::other(err)),
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}

/// Issues a GET for `url` and returns the streaming body.
///
/// Status codes are not inspected; whatever body comes back is handed to the
/// parser.
pub async fn fetch_page(client: &Client, url: &str) -> reqwest::Result<RemoteBody> {
    let response = client.get(url).send().await?;
    let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if chunk_tx.send(chunk).await.is_err() {
                // Reader gave up; drop the rest of the body.
                break;
            }
        }
    });

    Ok(RemoteBody {
        chunks: chunk_rx,
        current: Bytes::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::RemoteBody;
    use bytes::Bytes;
    use std::io::Read;
    use tokio::sync::mpsc;

    #[test]
    fn drains_chunks_in_order() {
        let (tx, rx) = mpsc::channel(4);
        tx.blocking_send(Ok(Bytes::from_static(b"hello ")))
            .expect("send chunk");
        tx.blocking_send(Ok(Bytes::from_static(b"world")))
            .expect("send chunk");
        drop(tx);

        let mut body = RemoteBody {
            chunks: rx,
            current: Bytes::new(),
        };
        let mut out = String::new();
        body.read_to_string(&mut out).expect("read body");
        assert_eq!(out, "hello world");
    }

    #[test]
    fn closed_channel_reads_as_end_of_stream() {
        let (tx, rx) = mpsc::channel::<reqwest::Result<Bytes>>(1);
        drop(tx);

        let mut body = RemoteBody {
            chunks: rx,
            current: Bytes::new(),
        };
        let mut buf = [0u8; 8];
        assert_eq!(body.read(&mut buf).expect("read"), 0);
    }
}
