use crate::error::Error;
use crate::rxclass::RxClassResponse;
use async_trait::async_trait;
use surf::Client;
use utils::query_url::with_query;
use utils::surf_logging::SurfLogging;

pub const RXCLASS_BY_RXCUI_URL: &str = "https://rxnav.nlm.nih.gov/REST/rxclass/class/byRxcui.json";

/// Something that can look up the drug classes of a single RxNorm code
#[async_trait]
pub trait ClassificationSource: Send + Sync {
    async fn fetch(&self, rxcui: &str) -> Result<RxClassResponse, Error>;
}

/// RxNav RxClass REST API, one GET per RxNorm code
#[derive(Clone)]
pub struct RxNavSource {
    http: Client,
    base_url: String,
}

impl Default for RxNavSource {
    fn default() -> Self {
        Self::new(RXCLASS_BY_RXCUI_URL)
    }
}

impl RxNavSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new().with(SurfLogging),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ClassificationSource for RxNavSource {
    async fn fetch(&self, rxcui: &str) -> Result<RxClassResponse, Error> {
        let url = with_query(&self.base_url, &[("rxcui", rxcui)])
            .map_err(|err| Error::dispatch(rxcui, err))?;

        let mut response = self
            .http
            .get(url.as_str())
            .await
            .map_err(|err| Error::transport(rxcui, err))?;

        if !response.status().is_success() {
            return Err(Error::status(rxcui, response.status()));
        }

        let body = response
            .body_string()
            .await
            .map_err(|err| Error::transport(rxcui, err))?;

        serde_json::from_str(&body).map_err(|err| Error::malformed(rxcui, err))
    }
}
