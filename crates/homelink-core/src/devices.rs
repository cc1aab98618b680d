//! Read-only client for the smart-home device API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{CoreError, Result};
use crate::models::{Credential, Device, DeviceList};

/// Source of a user's device list.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Fetch the devices visible to `credential`, in provider order.
    async fn list_devices(&self, credential: &Credential) -> Result<Vec<Device>>;
}

/// HTTP client for `GET <base>/user/devices`.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    base_url: String,
    http_client: Client,
}

impl DeviceClient {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Full URL of the device listing endpoint.
    pub fn devices_url(&self) -> String {
        format!("{}/user/devices", self.base_url)
    }
}

#[async_trait]
impl DeviceSource for DeviceClient {
    async fn list_devices(&self, credential: &Credential) -> Result<Vec<Device>> {
        let response = self
            .http_client
            .get(self.devices_url())
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::api(status.as_u16(), body));
        }

        let list: DeviceList = serde_json::from_slice(&response.bytes().await?)?;
        debug!(count = list.devices.len(), "Fetched devices");
        Ok(list.devices)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::get,
        Router,
    };

    use super::*;

    async fn spawn_device_api(body: &'static str) -> Url {
        let app = Router::new().route(
            "/v1.0/user/devices",
            get(move |headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer good-token");
                if authorized {
                    (StatusCode::OK, body)
                } else {
                    (StatusCode::UNAUTHORIZED, r#"{"status":"error","message":"forbidden"}"#)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/v1.0")).unwrap()
    }

    #[test]
    fn test_devices_url() {
        let client = DeviceClient::new(
            &Url::parse("https://api.iot.yandex.net/v1.0").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.devices_url(), "https://api.iot.yandex.net/v1.0/user/devices");

        let client = DeviceClient::new(
            &Url::parse("https://api.example.com/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.devices_url(), "https://api.example.com/user/devices");
    }

    #[tokio::test]
    async fn test_list_devices_in_order() {
        let base = spawn_device_api(
            r#"{"devices":[
                {"id":"a","name":"Kitchen lamp","type":"devices.types.light","online":true},
                {"id":"b","name":"Heater","type":"devices.types.thermostat","online":false},
                {"id":"c","name":"Kettle","type":"devices.types.cooking.kettle"}
            ]}"#,
        )
        .await;
        let client = DeviceClient::new(&base, Duration::from_secs(5)).unwrap();

        let devices = client
            .list_devices(&Credential::bearer("good-token"))
            .await
            .unwrap();

        let names: Vec<_> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Kitchen lamp", "Heater", "Kettle"]);
        assert_eq!(devices[1].kind, "devices.types.thermostat");
    }

    #[tokio::test]
    async fn test_list_devices_unauthorized() {
        let base = spawn_device_api(r#"{"devices":[]}"#).await;
        let client = DeviceClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .list_devices(&Credential::bearer("stale-token"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_list_devices_malformed_json() {
        let base = spawn_device_api("<html>oops</html>").await;
        let client = DeviceClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .list_devices(&Credential::bearer("good-token"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }
}
