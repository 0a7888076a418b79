//! Background I/O transports.
//!
//! A transport accepts encoded messages without blocking and reports each
//! message's outcome later, from its own execution context, through a
//! [`DeliverySink`]. The dispatcher owns the receiving end of that channel and
//! is the only place outcomes are applied to tracker state.

pub mod kafka;
pub mod memory;

use crate::error::TransportError;
use crate::message::{DeliveryResult, ProducedMessage};
use crossbeam_channel::{Receiver, Sender};
use tracing::warn;

pub use kafka::{create_topic, KafkaTransport};
pub use memory::{AckerHandle, MemoryTransport};

/// A non-blocking message transport.
pub trait Transport: Send + Sync {
    /// Hand `message` to the background context.
    ///
    /// Must return immediately. On `Ok` the transport guarantees exactly one
    /// [`DeliveryResult`] for `message.sequence` will eventually be sent to
    /// its sink; on `Err` none will.
    fn send(&self, message: &ProducedMessage) -> Result<(), TransportError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Sending half of the outcome channel, held by a transport.
#[derive(Clone)]
pub struct DeliverySink {
    tx: Sender<DeliveryResult>,
}

impl DeliverySink {
    pub fn deliver(&self, result: DeliveryResult) {
        if let Err(err) = self.tx.send(result) {
            warn!(
                "Dropping outcome for message {}: dispatcher is gone",
                err.0.sequence
            );
        }
    }
}

/// Create the channel connecting a transport to a dispatcher.
pub fn outcome_channel() -> (DeliverySink, Receiver<DeliveryResult>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (DeliverySink { tx }, rx)
}
