use crate::client::{
    SheetApi,
    SheetError,
    SheetResult,
};
use futures::future::BoxFuture;
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Thin HTTP client for the spreadsheet facade.
///
/// The facade exposes `GET rows/{row}`, `POST range`, `POST rows` and
/// `POST clear` relative to the configured base URL. Vendor-specific
/// formatting is the facade's problem, not ours.
pub struct RestSheet {
    client: reqwest::Client,
    base: Url,
}

impl RestSheet {
    pub fn new(base: Url) -> SheetResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> SheetResult<Url> {
        let mut base = self.base.clone();
        // Url::join treats a base without a trailing slash as a file.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(path)
            .map_err(|e| SheetError::Unavailable(format!("invalid sink endpoint: {e}")))
    }
}

impl SheetApi for RestSheet {
    fn read_row(&self, row: u32) -> BoxFuture<'_, SheetResult<Vec<String>>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.endpoint(&format!("rows/{row}"))?)
                .send()
                .await?
                .error_for_status()?;
            Ok(response.json().await?)
        })
    }

    fn write_range(&self, range: String, rows: Vec<Vec<String>>) -> BoxFuture<'_, SheetResult<()>> {
        Box::pin(async move {
            self.client
                .post(self.endpoint("range")?)
                .json(&json!({ "range": range, "rows": rows }))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }

    fn append_row(&self, values: Vec<String>) -> BoxFuture<'_, SheetResult<()>> {
        Box::pin(async move {
            self.client
                .post(self.endpoint("rows")?)
                .json(&json!({ "values": values }))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'_, SheetResult<()>> {
        Box::pin(async move {
            self.client
                .post(self.endpoint("clear")?)
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
    }
}
