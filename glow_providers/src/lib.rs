mod api;
mod config;
mod error;
mod payconiq;
mod paynl;

mod data_objects;

pub use api::RestClient;
pub use config::{PayNlConfig, PayconiqConfig, ProviderConfig};
pub use data_objects::{
    CheckoutLink,
    PayNlAmount,
    PayNlEndUser,
    PayNlPaymentDetails,
    PayNlRequestResult,
    PayNlStartResponse,
    PayNlStatusResponse,
    PayNlTransaction,
    PayNlTransactionRequest,
    PayconiqLinks,
    PayconiqPayment,
    PayconiqPaymentRequest,
};
pub use error::ProviderApiError;
pub use payconiq::PayconiqApi;
pub use paynl::PayNlApi;
