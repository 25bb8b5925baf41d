//! In-process group runtime
//!
//! Runs each participant as a Tokio task. Participants are wired
//! all-to-all with unbounded channels; a message arriving ahead of the
//! receive that wants it is stashed and replayed on the next matching
//! receive, so tag discipline behaves like a tagged two-sided runtime.

use crate::comm::{GroupComm, Tag, BCAST_TAG_BASE, GATHER_TAG_BASE};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Barrier, Mutex};

/// One in-flight message
#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: Tag,
    payload: Vec<u8>,
}

/// One participant's endpoint of the in-process group.
///
/// Created in bulk by [`LocalGroup::create`]; each endpoint is moved into
/// its participant task and used through the [`GroupComm`] trait.
pub struct LocalGroup {
    rank: usize,
    size: usize,
    /// Bound on every receive and barrier wait
    timeout: Duration,
    /// Outgoing channels, indexed by destination rank
    senders: Vec<mpsc::UnboundedSender<Envelope>>,
    /// This participant's incoming channel
    inbox: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    /// Messages received ahead of their matching recv call
    stash: Mutex<Vec<Envelope>>,
    /// Full-group rendezvous shared by all endpoints
    barrier: Arc<Barrier>,
}

impl LocalGroup {
    /// Create all endpoints of a group of `size` participants.
    ///
    /// The returned vector is indexed by rank.
    pub fn create(size: usize, timeout: Duration) -> Result<Vec<LocalGroup>> {
        if size == 0 {
            return Err(AppError::invalid_group_size("group of 0 participants"));
        }

        let mut senders = Vec::with_capacity(size);
        let mut receivers = Vec::with_capacity(size);
        for _ in 0..size {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.push(tx);
            receivers.push(rx);
        }

        let barrier = Arc::new(Barrier::new(size));

        Ok(receivers
            .into_iter()
            .enumerate()
            .map(|(rank, rx)| LocalGroup {
                rank,
                size,
                timeout,
                senders: senders.clone(),
                inbox: Mutex::new(rx),
                stash: Mutex::new(Vec::new()),
                barrier: barrier.clone(),
            })
            .collect())
    }

    fn check_peer(&self, peer: usize) -> Result<()> {
        if peer >= self.size {
            return Err(AppError::communication(format!(
                "rank {} is outside the group of {}",
                peer, self.size
            )));
        }
        Ok(())
    }

    /// Pull a stashed message matching `(source, tag)` if one exists
    async fn take_stashed(&self, source: usize, tag: Tag) -> Option<Vec<u8>> {
        let mut stash = self.stash.lock().await;
        let index = stash
            .iter()
            .position(|env| env.source == source && env.tag == tag)?;
        Some(stash.swap_remove(index).payload)
    }
}

#[async_trait]
impl GroupComm for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()> {
        self.check_peer(dest)?;
        self.senders[dest]
            .send(Envelope {
                source: self.rank,
                tag,
                payload,
            })
            .map_err(|_| {
                AppError::communication(format!(
                    "rank {} cannot reach rank {}: participant has gone away",
                    self.rank, dest
                ))
            })
    }

    async fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>> {
        self.check_peer(source)?;

        if let Some(payload) = self.take_stashed(source, tag).await {
            return Ok(payload);
        }

        let mut inbox = self.inbox.lock().await;
        loop {
            let envelope = tokio::time::timeout(self.timeout, inbox.recv())
                .await
                .map_err(|_| {
                    AppError::timeout(format!(
                        "rank {} waited {:?} for tag {} from rank {}",
                        self.rank, self.timeout, tag, source
                    ))
                })?
                .ok_or_else(|| {
                    AppError::communication(format!(
                        "rank {}: incoming channel closed while waiting for rank {}",
                        self.rank, source
                    ))
                })?;

            if envelope.source == source && envelope.tag == tag {
                return Ok(envelope.payload);
            }

            // Not ours yet; keep it for a later recv
            self.stash.lock().await.push(envelope);
        }
    }

    async fn barrier(&self) -> Result<()> {
        tokio::time::timeout(self.timeout, self.barrier.wait())
            .await
            .map_err(|_| {
                AppError::timeout(format!(
                    "rank {} waited {:?} at the barrier without the group completing",
                    self.rank, self.timeout
                ))
            })?;
        Ok(())
    }

    async fn gather(&self, root: usize, payload: Vec<u8>) -> Result<Option<Vec<Vec<u8>>>> {
        self.check_peer(root)?;

        if self.rank != root {
            self.send(root, GATHER_TAG_BASE + self.rank as Tag, payload)
                .await?;
            return Ok(None);
        }

        let mut gathered = Vec::with_capacity(self.size);
        for rank in 0..self.size {
            if rank == root {
                gathered.push(payload.clone());
            } else {
                let contribution = self.recv(rank, GATHER_TAG_BASE + rank as Tag).await?;
                gathered.push(contribution);
            }
        }
        Ok(Some(gathered))
    }

    async fn broadcast(&self, root: usize, payload: Vec<u8>) -> Result<Vec<u8>> {
        self.check_peer(root)?;

        if self.rank == root {
            for rank in 0..self.size {
                if rank != root {
                    self.send(rank, BCAST_TAG_BASE + root as Tag, payload.clone())
                        .await?;
                }
            }
            Ok(payload)
        } else {
            self.recv(root, BCAST_TAG_BASE + root as Tag).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(size: usize) -> Vec<LocalGroup> {
        LocalGroup::create(size, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_rank_and_size() {
        let endpoints = group(3);
        for (i, ep) in endpoints.iter().enumerate() {
            assert_eq!(ep.rank(), i);
            assert_eq!(ep.size(), 3);
        }
    }

    #[tokio::test]
    async fn test_send_recv_round_trip() {
        let mut endpoints = group(2);
        let b = endpoints.pop().unwrap();
        let a = endpoints.pop().unwrap();

        let echo = tokio::spawn(async move {
            let payload = b.recv(0, 10).await.unwrap();
            b.send(0, 20, payload).await.unwrap();
        });

        a.send(1, 10, vec![7u8; 32]).await.unwrap();
        let back = a.recv(1, 20).await.unwrap();
        assert_eq!(back, vec![7u8; 32]);
        echo.await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_order_tags_are_stashed() {
        let mut endpoints = group(2);
        let b = endpoints.pop().unwrap();
        let a = endpoints.pop().unwrap();

        // Two sends under different tags, received in reverse order
        a.send(1, 1, vec![1]).await.unwrap();
        a.send(1, 2, vec![2]).await.unwrap();

        assert_eq!(b.recv(0, 2).await.unwrap(), vec![2]);
        assert_eq!(b.recv(0, 1).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_recv_times_out_on_silent_peer() {
        let endpoints = LocalGroup::create(2, Duration::from_millis(50)).unwrap();
        let err = endpoints[0].recv(1, 99).await.unwrap_err();
        assert_eq!(err.category(), "TIMEOUT");
    }

    #[tokio::test]
    async fn test_barrier_times_out_without_full_group() {
        let endpoints = LocalGroup::create(2, Duration::from_millis(50)).unwrap();
        // Only one participant arrives
        let err = endpoints[0].barrier().await.unwrap_err();
        assert_eq!(err.category(), "TIMEOUT");
    }

    #[tokio::test]
    async fn test_barrier_releases_full_group() {
        let endpoints = group(4);
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|ep| tokio::spawn(async move { ep.barrier().await }))
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_gather_collects_in_rank_order() {
        let endpoints = group(3);
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|ep| {
                tokio::spawn(async move {
                    let rank = ep.rank();
                    ep.gather(0, vec![rank as u8]).await
                })
            })
            .collect();

        let mut outputs = Vec::new();
        for handle in handles {
            outputs.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(outputs[0], Some(vec![vec![0], vec![1], vec![2]]));
        assert_eq!(outputs[1], None);
        assert_eq!(outputs[2], None);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let endpoints = group(3);
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|ep| {
                tokio::spawn(async move {
                    let payload = if ep.rank() == 1 { vec![42u8] } else { Vec::new() };
                    ep.broadcast(1, payload).await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), vec![42u8]);
        }
    }

    #[tokio::test]
    async fn test_invalid_peer_rejected() {
        let endpoints = group(2);
        let err = endpoints[0].send(5, 1, Vec::new()).await.unwrap_err();
        assert_eq!(err.category(), "COMM");
    }
}
