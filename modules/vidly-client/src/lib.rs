pub mod error;
pub mod types;

pub use error::{Result, VidlyError};
pub use types::{
    ApiErrorEntry, MediaEntry, MediaRecord, MediaStatus, SuccessItem, TagStatuses, TaskEntry,
    VidlyResponse,
};

use std::time::Duration;

use types::QueryDocument;

pub const DEFAULT_API_URL: &str = "https://m.vid.ly/api/";

const ACTION_GET_STATUS: &str = "GetStatus";
const ACTION_GET_MEDIA_LIST: &str = "GetMediaList";

#[derive(Debug, Clone)]
pub struct VidlyOptions {
    pub api_url: String,
    pub user_id: String,
    pub user_key: String,
}

pub struct VidlyClient {
    client: reqwest::Client,
    options: VidlyOptions,
}

impl VidlyClient {
    pub fn new(options: VidlyOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, options })
    }

    /// Transcoding status for each tag. Tags Vid.ly doesn't know about are
    /// simply absent from the result.
    pub async fn query(&self, tags: &[&str]) -> Result<TagStatuses> {
        tracing::debug!(?tags, "Querying Vid.ly status");
        let response = self
            .post(ACTION_GET_STATUS, Some(tags.join(",")))
            .await?;
        Ok(response.into_statuses())
    }

    /// Every media item on the account, in the order Vid.ly lists them.
    pub async fn media_list(&self) -> Result<Vec<MediaRecord>> {
        let response = self.post(ACTION_GET_MEDIA_LIST, None).await?;
        let records = response.into_records();
        tracing::info!(count = records.len(), "Fetched Vid.ly media list");
        Ok(records)
    }

    async fn post(&self, action: &str, media_short_link: Option<String>) -> Result<VidlyResponse> {
        let document = self.query_document(action, media_short_link)?;

        let resp = self
            .client
            .post(&self.options.api_url)
            .form(&[("xml", document)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VidlyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        parse_response(&body)
    }

    fn query_document(&self, action: &str, media_short_link: Option<String>) -> Result<String> {
        build_query(
            action,
            &self.options.user_id,
            &self.options.user_key,
            media_short_link,
        )
    }
}

fn build_query(
    action: &str,
    user_id: &str,
    user_key: &str,
    media_short_link: Option<String>,
) -> Result<String> {
    let document = QueryDocument {
        action,
        user_id,
        user_key,
        media_short_link,
    };
    quick_xml::se::to_string(&document).map_err(|e| VidlyError::Encode(e.to_string()))
}

/// Decode a raw API response body.
pub fn parse_response(body: &str) -> Result<VidlyResponse> {
    Ok(quick_xml::de::from_str(body.trim())?)
}
