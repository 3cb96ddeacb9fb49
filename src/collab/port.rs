//! Transport seam for collaboration events
//!
//! The engine never owns a network connection. Anything that can move a
//! serialized [`CollabEvent`] between replicas implements [`CollabPort`].

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::event::CollabEvent;
use crate::error::Result;

/// Outbound/inbound channel for collaboration events
pub trait CollabPort {
    /// Publish an event to the other replicas
    fn send(&self, event: &CollabEvent) -> Result<()>;

    /// Next received event, or `None` if nothing is pending
    fn try_recv(&self) -> Result<Option<CollabEvent>>;

    /// Receive every pending event
    fn drain(&self) -> Result<Vec<CollabEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv()? {
            events.push(event);
        }
        Ok(events)
    }
}

/// In-process port over a pair of `mpsc` channels carrying JSON text
#[derive(Debug)]
pub struct ChannelPort {
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl ChannelPort {
    /// Two connected ports: what one sends, the other receives
    pub fn pair() -> (ChannelPort, ChannelPort) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            ChannelPort { tx: a_tx, rx: a_rx },
            ChannelPort { tx: b_tx, rx: b_rx },
        )
    }
}

impl CollabPort for ChannelPort {
    fn send(&self, event: &CollabEvent) -> Result<()> {
        let payload = event.to_json()?;
        self.tx.send(payload).map_err(|_| {
            io::Error::new(io::ErrorKind::BrokenPipe, "collaboration peer disconnected")
        })?;
        Ok(())
    }

    fn try_recv(&self) -> Result<Option<CollabEvent>> {
        match self.rx.try_recv() {
            Ok(payload) => Ok(Some(CollabEvent::from_json(&payload)?)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{Marker, MarkerType};

    #[test]
    fn test_pair_is_bidirectional() {
        let (left, right) = ChannelPort::pair();
        let marker = Marker::with_id("m1", 3.0, MarkerType::Peak);

        left.send(&CollabEvent::added(&marker)).unwrap();
        right.send(&CollabEvent::deleted("m2")).unwrap();

        assert_eq!(right.try_recv().unwrap(), Some(CollabEvent::added(&marker)));
        assert_eq!(right.try_recv().unwrap(), None);
        assert_eq!(left.drain().unwrap(), vec![CollabEvent::deleted("m2")]);
    }

    #[test]
    fn test_send_to_dropped_peer_fails() {
        let (left, right) = ChannelPort::pair();
        drop(right);

        let err = left.send(&CollabEvent::deleted("m1")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert_eq!(left.try_recv().unwrap(), None);
    }
}
