// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Pull-based access to a publisher.

use futures::Stream;
use parking_lot::Mutex;
use spillway_core::{Publisher, SpillwayError, StreamItem, Subscriber, Subscription};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

type SharedSubscription = Arc<Mutex<Option<Arc<dyn Subscription>>>>;

struct BridgeSubscriber<T> {
    batch: u64,
    sender: Mutex<Option<UnboundedSender<StreamItem<T>>>>,
    subscription: SharedSubscription,
}

impl<T: Send> Subscriber<T> for BridgeSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        *self.subscription.lock() = Some(Arc::clone(&subscription));
        subscription.request(self.batch);
    }

    fn on_next(&self, value: T) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(StreamItem::Value(value));
        }
    }

    fn on_error(&self, error: SpillwayError) {
        if let Some(sender) = self.sender.lock().take() {
            let _ = sender.send(StreamItem::Error(error));
        }
    }

    fn on_complete(&self) {
        self.sender.lock().take();
    }
}

/// A [`Stream`] over the signals of a publisher.
///
/// Values arrive as `StreamItem::Value`, a terminal error as one
/// `StreamItem::Error`, and completion ends the stream. `batch` elements are
/// requested up front and one more for every value yielded. Dropping the
/// stream cancels the subscription.
pub struct SubscriberStream<T> {
    items: UnboundedReceiverStream<StreamItem<T>>,
    subscription: SharedSubscription,
}

impl<T: Send + 'static> SubscriberStream<T> {
    pub fn new<P>(publisher: &P, batch: u64) -> Self
    where
        P: Publisher<T> + ?Sized,
    {
        let (sender, receiver) = unbounded_channel();
        let subscription = SharedSubscription::default();
        publisher.subscribe(Arc::new(BridgeSubscriber {
            batch: batch.max(1),
            sender: Mutex::new(Some(sender)),
            subscription: Arc::clone(&subscription),
        }));

        Self {
            items: UnboundedReceiverStream::new(receiver),
            subscription,
        }
    }
}

/// Subscribe to `publisher` and consume it as a [`Stream`].
pub fn into_stream<T, P>(publisher: &P, batch: u64) -> SubscriberStream<T>
where
    T: Send + 'static,
    P: Publisher<T> + ?Sized,
{
    SubscriberStream::new(publisher, batch)
}

impl<T> Stream for SubscriberStream<T> {
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.items).poll_next(cx);
        if let Poll::Ready(Some(StreamItem::Value(_))) = &polled {
            let subscription = this.subscription.lock().clone();
            if let Some(subscription) = subscription {
                subscription.request(1);
            }
        }
        polled
    }
}

impl<T> Drop for SubscriberStream<T> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }
    }
}
