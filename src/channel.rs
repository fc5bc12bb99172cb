use anyhow::{anyhow, Result};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Directive sent from a controller to a running search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Two unbounded FIFO pipes running in opposite directions. The `server`
/// endpoint goes to the worker, the `client` endpoint stays with the controller.
#[derive(Debug)]
pub struct Channel<T> {
    pub server: Endpoint<T>,
    pub client: Endpoint<T>,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        let (to_server, server_inbox) = mpsc::unbounded_channel();
        let (to_client, client_inbox) = mpsc::unbounded_channel();
        Channel {
            server: Endpoint {
                sender: to_client,
                receiver: server_inbox,
            },
            client: Endpoint {
                sender: to_server,
                receiver: client_inbox,
            },
        }
    }

    pub fn split(self) -> (Endpoint<T>, Endpoint<T>) {
        (self.server, self.client)
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct Endpoint<T> {
    sender: UnboundedSender<T>,
    receiver: UnboundedReceiver<T>,
}

impl<T> Endpoint<T> {
    /// Queues `message` for the peer. Never blocks; fails only once the peer
    /// endpoint has been dropped.
    pub fn send(&self, message: T) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| anyhow!("channel peer has been dropped"))
    }

    /// With `blocking`, waits until a message arrives (or the peer is gone).
    /// Without it, returns `None` straight away when the queue is empty.
    ///
    /// Blocking receives must not be issued from inside an async runtime.
    pub fn receive(&mut self, blocking: bool) -> Option<T> {
        if blocking {
            return self.receiver.blocking_recv();
        }
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Number of messages waiting to be received.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// A cloneable sending half, for producers that cannot own the endpoint.
    pub fn outbound(&self) -> Outbound<T> {
        Outbound {
            sender: self.sender.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Outbound<T> {
    sender: UnboundedSender<T>,
}

impl<T> Clone for Outbound<T> {
    fn clone(&self) -> Self {
        Outbound {
            sender: self.sender.clone(),
        }
    }
}

impl<T> Outbound<T> {
    pub fn send(&self, message: T) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| anyhow!("channel peer has been dropped"))
    }
}
