//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every store and provider call is therefore async.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use glow_engine::{
    db_types::{DonationUpdate, NewDonation, Provider},
    donation_objects::DonationRequest,
    CacheJanitor,
    LedgerApi,
    LedgerManagement,
    PaymentCacheManagement,
    PaymentFlowApi,
    PaymentProviderGateway,
    ReconciliationApi,
};
use log::*;

use crate::{
    config::ServerOptions,
    data_objects::{CampaignSettingsRequest, JsonResponse, PaginationParams, PaymentStatusResponse},
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires admin) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AdminMiddlewareFactory::new());
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Donations  ----------------------------------------------------
route!(donate => Post "/donations" impl PaymentCacheManagement, PaymentProviderGateway);
/// Starts a donation. The body is a [`DonationRequest`]; the response carries the checkout URL the donor must be sent
/// to, and the payment reference the front end can poll with.
pub async fn donate<B, G>(
    req: HttpRequest,
    body: web::Json<DonationRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    let request = body.into_inner();
    debug!("💻️ Received donation request for campaign {}", request.campaign_id);
    let client_ip = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    let donation = api.initiate_donation(request, client_ip).await?;
    Ok(HttpResponse::Ok().json(donation))
}

route!(donations => Get "/campaigns/{campaign_id}/donations" impl LedgerManagement);
pub async fn donations<B: LedgerManagement>(
    path: web::Path<String>,
    query: web::Query<PaginationParams>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    let PaginationParams { offset, page_size } = query.into_inner();
    trace!("💻️ Donation list requested for {campaign_id} ({offset:?}/{page_size:?})");
    let page = api.list_donations(&campaign_id, offset.unwrap_or(0), page_size.unwrap_or(0)).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(latest_donation => Get "/campaigns/{campaign_id}/donations/latest" impl LedgerManagement);
/// The most recent donation, or `null` for a campaign without donations.
pub async fn latest_donation<B: LedgerManagement>(
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    let latest = api.latest_donation(&campaign_id).await?;
    Ok(HttpResponse::Ok().json(latest))
}

route!(counters => Get "/campaigns/{campaign_id}/counters" impl LedgerManagement);
pub async fn counters<B: LedgerManagement>(
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    let counters = api.counters(&campaign_id).await?;
    Ok(HttpResponse::Ok().json(counters))
}

route!(payment_status => Get "/payments/{provider}/{reference}" impl PaymentCacheManagement, PaymentProviderGateway);
pub async fn payment_status<B, G>(
    path: web::Path<(String, String)>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    let (provider, reference) = path.into_inner();
    let provider = provider.parse::<Provider>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    let state = api.payment_state(provider, &reference).await?;
    Ok(HttpResponse::Ok().json(PaymentStatusResponse { provider, reference, state }))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(add_donation => Post "/admin/campaigns/{campaign_id}/donations" impl LedgerManagement where requires admin);
pub async fn add_donation<B: LedgerManagement>(
    path: web::Path<String>,
    body: web::Json<NewDonation>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    let donation = body.into_inner();
    info!("💻️ Admin added a {} donation by {} to {campaign_id}", donation.amount, donation.name);
    let record = api.add_donation(&campaign_id, donation).await?;
    Ok(HttpResponse::Created().json(record))
}

route!(edit_donation => Patch "/admin/campaigns/{campaign_id}/donations/{number}" impl LedgerManagement where requires admin);
pub async fn edit_donation<B: LedgerManagement>(
    path: web::Path<(String, i64)>,
    body: web::Json<DonationUpdate>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (campaign_id, number) = path.into_inner();
    let update = body.into_inner();
    if update.is_empty() {
        return Err(ServerError::InvalidRequestBody("The update does not change anything".into()));
    }
    info!("💻️ Admin edit of donation #{number} in {campaign_id}");
    let record = api.edit_donation(&campaign_id, number, update).await?;
    Ok(HttpResponse::Ok().json(record))
}

route!(delete_donation => Delete "/admin/campaigns/{campaign_id}/donations/{number}" impl LedgerManagement where requires admin);
pub async fn delete_donation<B: LedgerManagement>(
    path: web::Path<(String, i64)>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (campaign_id, number) = path.into_inner();
    info!("💻️ Admin delete of donation #{number} in {campaign_id}");
    let record = api.delete_donation(&campaign_id, number).await?;
    Ok(HttpResponse::Ok().json(record))
}

route!(recompute_counters => Post "/admin/campaigns/{campaign_id}/recompute" impl LedgerManagement where requires admin);
pub async fn recompute_counters<B: LedgerManagement>(
    path: web::Path<String>,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let campaign_id = path.into_inner();
    info!("💻️ Admin recompute of the counters of {campaign_id}");
    let counters = api.recompute_counters(&campaign_id).await?;
    Ok(HttpResponse::Ok().json(counters))
}

route!(register_campaign => Post "/admin/campaigns" impl PaymentCacheManagement, PaymentProviderGateway where requires admin);
pub async fn register_campaign<B, G>(
    body: web::Json<CampaignSettingsRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentCacheManagement,
    G: PaymentProviderGateway,
{
    let settings = body.into_inner();
    let campaign_id = settings.campaign_id.clone();
    api.register_campaign(settings.into()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Payment settings for {campaign_id} saved"))))
}

route!(reconcile_now => Post "/admin/reconcile" impl LedgerManagement where requires admin);
/// Runs a reconciliation pass immediately, instead of waiting for the worker.
pub async fn reconcile_now<B: LedgerManagement>(
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ Admin requested a reconciliation run");
    let report = api.run_reconciliation().await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(expire_cache_now => Post "/admin/expire" impl PaymentCacheManagement where requires admin);
/// Runs the cache janitor immediately, instead of waiting for the worker.
pub async fn expire_cache_now<B: PaymentCacheManagement>(
    api: web::Data<CacheJanitor<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ Admin requested a cache expiry run");
    let report = api.expire_stale_entries().await?;
    Ok(HttpResponse::Ok().json(report))
}
