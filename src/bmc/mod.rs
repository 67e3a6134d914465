// BMC web API access: login exchange and authenticated descriptor fetch.

pub mod client;
pub mod session;

pub use client::BmcClient;
pub use session::{parse_login_response, Session};
