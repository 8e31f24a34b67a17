// Schedule command client
//
// Request/response calls against the device's `/api/schedule/*` endpoints.
// Nothing here touches the push channel: every call either succeeds with a
// 2xx answer or returns an `Error` the caller can report and retry.

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::protocol::ScheduleItem;
use crate::transport::TransportConfig;

/// HTTP client for the schedule command endpoints.
pub struct ScheduleClient {
    http: reqwest::Client,
    base_url: Url,
}

#[derive(Serialize)]
struct ScheduleForm {
    schedule: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundsForm<'a> {
    day_start: &'a str,
    night_start: &'a str,
}

impl ScheduleClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the device root, e.g. `http://192.168.1.50/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Reset the device-side schedule.
    pub async fn clear(&self) -> Result<(), Error> {
        self.get("clear", "api/schedule/clear").await
    }

    /// Stop a running schedule.
    pub async fn stop(&self) -> Result<(), Error> {
        self.get("stop", "api/schedule/stop").await
    }

    /// Start the schedule the device currently holds.
    pub async fn start(&self) -> Result<(), Error> {
        self.get("start", "api/schedule/start").await
    }

    /// Replace the device's day rotation.
    pub async fn push_day(&self, items: &[ScheduleItem]) -> Result<(), Error> {
        let form = ScheduleForm {
            schedule: serde_json::to_string(items)?,
        };
        self.post_form("push day", "api/schedule/day", &form).await
    }

    /// Replace the device's night rotation.
    pub async fn push_night(&self, items: &[ScheduleItem]) -> Result<(), Error> {
        let form = ScheduleForm {
            schedule: serde_json::to_string(items)?,
        };
        self.post_form("push night", "api/schedule/night", &form)
            .await
    }

    /// Set the day/night boundaries. Both are `HH:MM`.
    pub async fn set_bounds(&self, day_start: &str, night_start: &str) -> Result<(), Error> {
        let form = BoundsForm {
            day_start,
            night_start,
        };
        self.post_form("set bounds", "api/schedule/bounds", &form)
            .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get(&self, command: &'static str, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!(command, "GET {}", url);

        let resp = self.http.get(url).send().await?;
        check_status(command, resp).await
    }

    async fn post_form(
        &self,
        command: &'static str,
        path: &str,
        form: &impl Serialize,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!(command, "POST {}", url);

        let resp = self.http.post(url).form(form).send().await?;
        check_status(command, resp).await
    }
}

/// Any 2xx is success; everything else is a rejection carrying the body.
async fn check_status(command: &'static str, resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::CommandRejected {
        command,
        status: status.as_u16(),
        body,
    })
}

/// `Url::join` replaces the last segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ScheduleClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://wall.local/device").unwrap(),
        );
        assert_eq!(
            client.url("api/schedule/start").unwrap().as_str(),
            "http://wall.local/device/api/schedule/start"
        );
    }

    #[test]
    fn root_url_is_untouched() {
        let client = ScheduleClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://10.0.0.7").unwrap(),
        );
        assert_eq!(client.base_url().as_str(), "http://10.0.0.7/");
        assert_eq!(
            client.url("api/schedule/clear").unwrap().as_str(),
            "http://10.0.0.7/api/schedule/clear"
        );
    }
}
