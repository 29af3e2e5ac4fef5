//! Provider notification endpoints.
//!
//! Neither provider signs its notifications, so the notification only tells us *which* payment to look at. The status
//! is always fetched from the provider by the engine before anything is recorded.
//!
//! Both providers retry a notification until they get the acknowledgement they expect, so these handlers never answer
//! with a JSON error. Anything that should be retried (store errors, provider errors, timeouts) is answered with a
//! plain `400 Bad Request`; everything else gets the provider's success acknowledgement.
use actix_web::{web, HttpResponse};
use glow_engine::{
    db_types::Provider,
    donation_objects::NotificationOutcome,
    PaymentCacheManagement,
    PaymentFlowApi,
    PaymentFlowError,
    PaymentProviderGateway,
};
use log::*;

use crate::{
    data_objects::{PayNlExchangeParams, PayconiqCallback},
    route,
};

/// Pay.nl only treats an exchange call as handled when the body is exactly `TRUE`
pub const PAYNL_ACK: &str = "TRUE";
pub const PAYCONIQ_ACK: &str = "OK";

fn bad_request() -> HttpResponse {
    HttpResponse::BadRequest().body("Bad Request")
}

fn acknowledge(provider: Provider, reference: &str, result: Result<NotificationOutcome, PaymentFlowError>) -> HttpResponse {
    let ack = match provider {
        Provider::PayNl => PAYNL_ACK,
        Provider::Payconiq => PAYCONIQ_ACK,
    };
    match result {
        Ok(outcome) => {
            match &outcome {
                NotificationOutcome::Confirmed(p) => {
                    info!("💻️ [{provider}] {reference} confirmed ({} to {})", p.amount(), p.campaign_id())
                },
                NotificationOutcome::AlreadyProcessed => debug!("💻️ [{provider}] {reference} was already handled"),
                NotificationOutcome::Pending => debug!("💻️ [{provider}] {reference} is pending"),
                NotificationOutcome::Rejected(status) => info!("💻️ [{provider}] {reference} failed: {status}"),
            }
            HttpResponse::Ok().body(ack)
        },
        Err(e) => {
            warn!("💻️ [{provider}] Could not handle the notification for {reference}. Asking for a retry. {e}");
            bad_request()
        },
    }
}

async fn handle_paynl_exchange<B, G>(
    query: PayNlExchangeParams,
    form: Option<PayNlExchangeParams>,
    api: &PaymentFlowApi<B, G>,
) -> HttpResponse
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    let order_id = query
        .order_id
        .or_else(|| form.and_then(|f| f.order_id))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let Some(order_id) = order_id else {
        warn!("💻️ [paynl] Exchange call without an order_id");
        return bad_request();
    };
    trace!("💻️ [paynl] Exchange call for {order_id}");
    let result = api.handle_notification(Provider::PayNl, &order_id).await;
    acknowledge(Provider::PayNl, &order_id, result)
}

route!(paynl_exchange_get => Get "/webhook/paynl" impl PaymentCacheManagement, PaymentProviderGateway);
pub async fn paynl_exchange_get<B, G>(
    query: web::Query<PayNlExchangeParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    handle_paynl_exchange(query.into_inner(), None, api.get_ref()).await
}

route!(paynl_exchange_post => Post "/webhook/paynl" impl PaymentCacheManagement, PaymentProviderGateway);
/// Pay.nl may also POST the exchange call, with the order id in the query string or in a form body.
pub async fn paynl_exchange_post<B, G>(
    query: web::Query<PayNlExchangeParams>,
    form: Option<web::Form<PayNlExchangeParams>>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    handle_paynl_exchange(query.into_inner(), form.map(|f| f.into_inner()), api.get_ref()).await
}

route!(payconiq_callback => Post "/webhook/payconiq" impl PaymentCacheManagement, PaymentProviderGateway);
pub async fn payconiq_callback<B, G>(
    body: Option<web::Json<PayconiqCallback>>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    let callback = body.map(|b| b.into_inner()).unwrap_or_default();
    let reference = callback.reference.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let Some(reference) = reference else {
        warn!("💻️ [payconiq] Callback without a reference. Payment id: {:?}", callback.payment_id);
        return bad_request();
    };
    trace!("💻️ [payconiq] Callback for {reference} reporting {:?}", callback.status);
    let result = api.handle_notification(Provider::Payconiq, &reference).await;
    acknowledge(Provider::Payconiq, &reference, result)
}
