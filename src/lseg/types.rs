//! Constants for the LSEG ESG endpoints.

use tokio::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.lseg.com/bin/esg/";
pub const SUGGESTIONS_PATH: &str = "esgsearchsuggestions/";
pub const RESULT_PATH: &str = "esgsearchresult/";

/// Query parameter carrying the RIC on the score endpoint.
pub const RIC_PARAM: &str = "ricCode";

/// Descriptor field holding the RIC in the suggestions payload.
pub const DEFAULT_LOOKUP_FIELD: &str = "ricCode";

/// Descriptor field holding the company name in the suggestions payload.
pub const DEFAULT_NAME_FIELD: &str = "companyName";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
