use crate::resume::watch_history::{PositionReport, WatchHistory, WatchHistoryError};
use crate::types::{ContentId, UserId};
use async_trait::async_trait;
use chrono::Duration;
use reqwest::{Client, RequestBuilder};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use url::Url;

/// [`WatchHistory`] backed by the `watch-history` REST endpoint.
#[derive(Clone, Debug)]
pub struct HttpWatchHistory {
	client: Client,
	endpoint: Url,
	token: Option<String>,
}

impl HttpWatchHistory {
	pub fn new(base_url: &Url, token: Option<String>) -> Result<Self, url::ParseError> {
		let mut base_url = base_url.clone();
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());
			base_url.set_path(&path);
		}

		Ok(Self {
			client: Client::new(),
			endpoint: base_url.join("watch-history")?,
			token,
		})
	}

	fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
		match &self.token {
			Some(token) => request.bearer_auth(token),
			None => request,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<Data> {
	success: bool,
	#[serde(default)]
	message: Option<String>,
	data: Option<Data>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedWatchHistory {
	watch_position: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveWatchHistoryRequest {
	user_id: UserId,
	content_id: ContentId,
	watch_position: i64,
	completed: bool,
}

#[async_trait]
impl WatchHistory for HttpWatchHistory {
	async fn position(&self, user: UserId, content: ContentId) -> Result<Option<Duration>, WatchHistoryError> {
		let unavailable = |reason: String| WatchHistoryError::LookupUnavailable { reason };

		let mut url = self.endpoint.clone();
		url.query_pairs_mut()
			.append_pair("userId", &user.to_string())
			.append_pair("contentId", &content.to_string());

		let response = self
			.authorized(self.client.get(url))
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(|error| unavailable(error.to_string()))?;
		let body = response
			.json::<ApiResponse<SavedWatchHistory>>()
			.await
			.map_err(|error| unavailable(error.to_string()))?;

		if !body.success {
			return Err(unavailable(body.message.unwrap_or_default()));
		}

		match body.data.and_then(|saved| saved.watch_position) {
			None => Ok(None),
			Some(seconds) => Duration::try_seconds(seconds)
				.map(Some)
				.ok_or_else(|| unavailable(format!("Watch position of {seconds} seconds is out of range."))),
		}
	}

	async fn report(&self, user: UserId, content: ContentId, report: PositionReport) -> Result<(), WatchHistoryError> {
		let failed = |reason: String| WatchHistoryError::ReportFailed { reason };

		let request = SaveWatchHistoryRequest {
			user_id: user,
			content_id: content,
			watch_position: report.position.num_seconds(),
			completed: report.completed,
		};
		let response = self
			.authorized(self.client.post(self.endpoint.clone()))
			.json(&request)
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(|error| failed(error.to_string()))?;
		let body = response
			.json::<ApiResponse<IgnoredAny>>()
			.await
			.map_err(|error| failed(error.to_string()))?;

		if body.success {
			Ok(())
		} else {
			Err(failed(body.message.unwrap_or_default()))
		}
	}
}
