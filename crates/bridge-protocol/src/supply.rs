//! Inbound event supplier.

use async_trait::async_trait;
use bridge_core::{BodyDelivery, Event, InvocationId, InvocationObserver, Receive};

/// Hands the buffered request body to the application.
pub(crate) struct BodySupplier<'a> {
    id: InvocationId,
    body: Option<&'a [u8]>,
    delivery: BodyDelivery,
    delivered: bool,
    observer: &'a dyn InvocationObserver,
}

impl<'a> BodySupplier<'a> {
    pub(crate) fn new(
        id: InvocationId,
        body: Option<&'a [u8]>,
        delivery: BodyDelivery,
        observer: &'a dyn InvocationObserver,
    ) -> Self {
        Self {
            id,
            body,
            delivery,
            delivered: false,
            observer,
        }
    }

    fn next_event(&mut self) -> Event {
        if self.delivered && self.delivery == BodyDelivery::Once {
            return Event::Disconnect;
        }
        self.delivered = true;
        Event::request(self.body.unwrap_or_default())
    }
}

#[async_trait]
impl Receive for BodySupplier<'_> {
    async fn receive(&mut self) -> Event {
        let event = self.next_event();
        self.observer.on_receive(self.id, &event);
        event
    }
}
