// HTTP client for the device's configuration endpoints
use crate::application::device_config_repository::{DeviceConfigError, DeviceConfigRepository};
use crate::domain::alarm::AlarmConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const ALARM_PATH: &str = "/api/v1/alarm";
const ENABLE_PATH: &str = "/api/v1/enable";

#[derive(Debug, Clone)]
pub struct HttpDeviceConfig {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AlarmUpdate {
    hours: u32,
    minutes: u32,
    sunrise: u32,
}

#[derive(Debug, Serialize)]
struct EnableUpdate {
    enabled: bool,
}

impl HttpDeviceConfig {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, DeviceConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeviceConfigError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DeviceConfigError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(DeviceConfigError::Status { status, body })
    }

    async fn put_json<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), DeviceConfigError> {
        let url = self.url(path);
        tracing::debug!(%url, "Writing device configuration");

        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DeviceConfigError::Request(e.to_string()))?;

        Self::check(response).await.map(|_| ())
    }
}

#[async_trait]
impl DeviceConfigRepository for HttpDeviceConfig {
    async fn get_alarm(&self) -> Result<AlarmConfig, DeviceConfigError> {
        let response = self
            .client
            .get(self.url(ALARM_PATH))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DeviceConfigError::Request(e.to_string()))?;

        Self::check(response)
            .await?
            .json::<AlarmConfig>()
            .await
            .map_err(|e| DeviceConfigError::Response(e.to_string()))
    }

    async fn put_alarm(&self, hours: u32, minutes: u32, sunrise: u32) -> Result<(), DeviceConfigError> {
        self.put_json(
            ALARM_PATH,
            &AlarmUpdate {
                hours,
                minutes,
                sunrise,
            },
        )
        .await
    }

    async fn put_enabled(&self, enabled: bool) -> Result<(), DeviceConfigError> {
        self.put_json(ENABLE_PATH, &EnableUpdate { enabled }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn fake_device(captured: Captured) -> Router {
        Router::new()
            .route(
                ALARM_PATH,
                get(|| async {
                    Json(serde_json::json!({
                        "hours": 7, "minutes": 15, "sunrise": 30, "enabled": true
                    }))
                })
                .put(
                    |State(captured): State<Captured>, Json(body): Json<serde_json::Value>| async move {
                        if body["hours"].as_u64().unwrap_or(99) > 23 {
                            return (StatusCode::BAD_REQUEST, "Invalid alarm value");
                        }
                        captured.lock().unwrap().push(body);
                        (StatusCode::OK, r#"{"ok":true}"#)
                    },
                ),
            )
            .route(
                ENABLE_PATH,
                put(
                    |State(captured): State<Captured>, Json(body): Json<serde_json::Value>| async move {
                        captured.lock().unwrap().push(body);
                        StatusCode::OK
                    },
                ),
            )
            .with_state(captured)
    }

    fn client(base: String) -> HttpDeviceConfig {
        HttpDeviceConfig::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_alarm() {
        let base = serve(fake_device(Captured::default())).await;
        let alarm = client(base).get_alarm().await.unwrap();
        assert_eq!(
            alarm,
            AlarmConfig {
                hours: 7,
                minutes: 15,
                enabled: true,
                sunrise: 30
            }
        );
    }

    #[tokio::test]
    async fn test_put_alarm_and_enable_send_json() {
        let captured = Captured::default();
        let base = serve(fake_device(captured.clone())).await;
        let device = client(base);

        device.put_alarm(6, 5, 20).await.unwrap();
        device.put_enabled(false).await.unwrap();

        let bodies = captured.lock().unwrap();
        assert_eq!(bodies[0], serde_json::json!({"hours": 6, "minutes": 5, "sunrise": 20}));
        assert_eq!(bodies[1], serde_json::json!({"enabled": false}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let base = serve(fake_device(Captured::default())).await;
        let err = client(base).put_alarm(30, 0, 0).await.unwrap_err();
        match err {
            DeviceConfigError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "Invalid alarm value");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_device_is_a_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}", addr)).get_alarm().await.unwrap_err();
        assert!(matches!(err, DeviceConfigError::Request(_)));
    }
}
