mod helpers;
mod mocks;

mod admin;
mod donations;
mod webhooks;
