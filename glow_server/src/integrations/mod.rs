pub mod hooks;
pub mod providers;
