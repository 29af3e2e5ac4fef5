use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{DonationsMergedEvent, EventHandler, EventProducer, Handler, PaymentConfirmedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_confirmed_producer: Vec<EventProducer<PaymentConfirmedEvent>>,
    pub donations_merged_producer: Vec<EventProducer<DonationsMergedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_confirmed: Option<EventHandler<PaymentConfirmedEvent>>,
    pub on_donations_merged: Option<EventHandler<DonationsMergedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_confirmed =
            hooks.on_payment_confirmed.map(|f| EventHandler::new("payment_confirmed", buffer_size, f));
        let on_donations_merged =
            hooks.on_donations_merged.map(|f| EventHandler::new("donations_merged", buffer_size, f));
        Self { on_payment_confirmed, on_donations_merged }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_confirmed {
            result.payment_confirmed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_donations_merged {
            result.donations_merged_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_confirmed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_donations_merged {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_confirmed: Option<Handler<PaymentConfirmedEvent>>,
    pub on_donations_merged: Option<Handler<DonationsMergedEvent>>,
}

impl EventHooks {
    pub fn on_payment_confirmed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentConfirmedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_confirmed = Some(Arc::new(f));
        self
    }

    pub fn on_donations_merged<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DonationsMergedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_donations_merged = Some(Arc::new(f));
        self
    }
}
