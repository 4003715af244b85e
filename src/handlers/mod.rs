pub mod http;
pub mod interactions;
