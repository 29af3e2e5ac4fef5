use glow_common::{Amount, EURO_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

//--------------------------------------        Pay.nl         -------------------------------------------------------

/// The donor details Pay.nl wants alongside a new transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PayNlEndUser {
    pub language: String,
    pub email_address: String,
    pub initials: String,
    pub last_name: String,
}

impl PayNlEndUser {
    /// Splits the donor's name on the first space, and reduces a locale such as `nl-BE` to Pay.nl's two-letter code.
    pub fn new(name: &str, email: Option<&str>, language: Option<&str>) -> Self {
        let name = name.trim();
        let (initials, last_name) = match name.split_once(' ') {
            Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
            None => (name.to_string(), String::new()),
        };
        let language = language
            .map(|l| l.trim().to_uppercase())
            .filter(|l| !l.is_empty())
            .map(|l| match l.split_once('-') {
                Some((_, region)) => region.to_string(),
                None => l,
            })
            .unwrap_or_else(|| "NL".to_string());
        Self { language, email_address: email.unwrap_or_default().to_string(), initials, last_name }
    }
}

/// A Pay.nl transaction start request. Pay.nl expects a form-encoded body with PHP-style bracketed keys.
#[derive(Debug, Clone, PartialEq)]
pub struct PayNlTransactionRequest {
    pub service_id: String,
    pub amount: Amount,
    pub ip_address: String,
    pub finish_url: String,
    pub exchange_url: String,
    pub description: String,
    pub test_mode: bool,
    pub end_user: PayNlEndUser,
}

impl PayNlTransactionRequest {
    pub fn to_form(&self) -> Vec<(String, String)> {
        let pairs = [
            ("serviceId", self.service_id.clone()),
            ("amount", self.amount.cents().to_string()),
            ("ipAddress", self.ip_address.clone()),
            ("finishUrl", self.finish_url.clone()),
            ("testmode", if self.test_mode { "1" } else { "0" }.to_string()),
            ("transaction[currency]", EURO_CURRENCY_CODE.to_string()),
            ("transaction[orderExchangeUrl]", self.exchange_url.clone()),
            ("transaction[description]", self.description.clone()),
            ("enduser[language]", self.end_user.language.clone()),
            ("enduser[emailAddress]", self.end_user.email_address.clone()),
            ("enduser[initials]", self.end_user.initials.clone()),
            ("enduser[lastName]", self.end_user.last_name.clone()),
        ];
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayNlRequestResult {
    /// "1" on success, "0" on failure
    pub result: String,
    #[serde(default)]
    pub error_id: String,
    #[serde(default)]
    pub error_message: String,
}

impl PayNlRequestResult {
    pub fn is_success(&self) -> bool {
        self.result != "0"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayNlTransaction {
    pub transaction_id: String,
    #[serde(rename = "paymentURL")]
    pub payment_url: String,
    #[serde(default)]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayNlBlacklist {
    #[serde(default)]
    pub blacklist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayNlStartResponse {
    pub request: PayNlRequestResult,
    pub transaction: Option<PayNlTransaction>,
    #[serde(default)]
    pub enduser: Option<PayNlBlacklist>,
}

impl PayNlStartResponse {
    pub fn is_blacklisted(&self) -> bool {
        self.enduser.as_ref().map(|e| e.blacklist == "1").unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayNlAmount {
    /// Cents, as a string
    pub value: String,
    pub currency: String,
}

impl PayNlAmount {
    pub fn as_amount(&self) -> Option<Amount> {
        self.value.trim().parse::<i64>().ok().map(Amount::from_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayNlPaymentDetails {
    pub transaction_id: String,
    pub state: String,
    #[serde(default)]
    pub state_name: String,
    pub amount: Option<PayNlAmount>,
    pub amount_paid: Option<PayNlAmount>,
    #[serde(default)]
    pub created: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayNlStatusResponse {
    pub request: PayNlRequestResult,
    pub payment_details: Option<PayNlPaymentDetails>,
}

//--------------------------------------       Payconiq        -------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayconiqPaymentRequest {
    /// Cents
    pub amount: i64,
    pub currency: String,
    pub callback_url: String,
    pub description: String,
    pub reference: String,
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLink {
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayconiqLinks {
    pub checkout: Option<CheckoutLink>,
    pub deeplink: Option<CheckoutLink>,
    pub qrcode: Option<CheckoutLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayconiqPayment {
    pub payment_id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: PayconiqLinks,
}

impl PayconiqPayment {
    pub fn checkout_url(&self) -> Option<&str> {
        self.links.checkout.as_ref().map(|l| l.href.as_str())
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount.map(Amount::from_cents)
    }
}
