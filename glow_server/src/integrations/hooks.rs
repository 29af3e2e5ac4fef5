//! Event hooks installed by the server.
//!
//! Receipt e-mails are sent by a separate service, so the server's hooks only record what happened.
use futures::future::BoxFuture;
use glow_engine::events::{EventHandlers, EventHooks};
use log::*;

pub const EVENT_BUFFER_SIZE: usize = 25;

pub fn create_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_payment_confirmed(|ev| {
        let payment = ev.payment;
        let receipt = if payment.payload.email.is_some() { "a receipt is due" } else { "no receipt address" };
        info!(
            "📬️ [{}] Payment {} of {} for {} confirmed; {receipt}",
            payment.provider,
            payment.reference,
            payment.amount(),
            payment.campaign_id()
        );
        no_op()
    });
    hooks.on_donations_merged(|ev| {
        info!(
            "📬️ [{}] {} donations merged into {}. The campaign now has {} donations totalling {}",
            ev.provider,
            ev.donations.len(),
            ev.campaign_id,
            ev.counters.total,
            ev.counters.total_amount
        );
        no_op()
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
