//! Remote data provider: the LSEG ESG search endpoints.

mod client;
mod types;

pub use self::client::{create_http_client, LsegClient};
pub use self::types::*;
