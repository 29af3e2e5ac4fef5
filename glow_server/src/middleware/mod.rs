mod admin;

pub use admin::{AdminMiddlewareFactory, AdminMiddlewareService, ADMIN_TOKEN_HEADER};
