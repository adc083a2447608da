//! Cliente HTTP do ThingSpeak.
//!
//! Um `GET /update?api_key=...&field1=...` por envio. Resposta 200 traz no
//! corpo o número da entrada gravada.

use reqwest::blocking::Client;
use sonar_core::config::TelemetryConfig;
use sonar_core::{EntryId, TelemetryError, TelemetryUploader};

pub struct ThingSpeakClient {
    http: Client,
    url: String,
    api_key: String,
    field: String,
}

impl ThingSpeakClient {
    pub fn new(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            field: config.field.clone(),
        })
    }
}

impl TelemetryUploader for ThingSpeakClient {
    fn upload(&mut self, distance_cm: f64) -> Result<EntryId, TelemetryError> {
        let value = format!("{distance_cm:.2}");
        let query = [("api_key", self.api_key.as_str()), (self.field.as_str(), value.as_str())];

        // `without_url` evita que a api_key vá parar no log
        let response = self
            .http
            .get(&self.url)
            .query(&query)
            .send()
            .map_err(|e| TelemetryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Service {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|e| TelemetryError::Transport(e.without_url().to_string()))?;
        Ok(EntryId(body.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(url: String) -> TelemetryConfig {
        TelemetryConfig {
            api_url: url,
            api_key: "TESTKEY".into(),
            timeout_secs: 2.0,
            ..Default::default()
        }
    }

    /// O cliente bloqueante não pode rodar dentro do runtime async.
    async fn upload_blocking(config: TelemetryConfig, distance: f64) -> Result<EntryId, TelemetryError> {
        tokio::task::spawn_blocking(move || {
            let mut client = ThingSpeakClient::new(&config)?;
            client.upload(distance)
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sends_key_and_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/update"))
            .and(query_param("api_key", "TESTKEY"))
            .and(query_param("field1", "17.15"))
            .respond_with(ResponseTemplate::new(200).set_body_string("42"))
            .expect(1)
            .mount(&server)
            .await;

        let result = upload_blocking(config_for(format!("{}/update", server.uri())), 17.15).await;
        assert_eq!(result.unwrap(), EntryId("42".into()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn custom_field_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("field3", "60.00"))
            .respond_with(ResponseTemplate::new(200).set_body_string("7\n"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(format!("{}/update", server.uri()));
        config.field = "field3".into();
        let result = upload_blocking(config, 60.0).await;
        assert_eq!(result.unwrap(), EntryId("7".into()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = upload_blocking(config_for(format!("{}/update", server.uri())), 12.5).await;
        assert!(matches!(result, Err(TelemetryError::Service { status: 500 })));
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let mut client = ThingSpeakClient::new(&config_for("http://127.0.0.1:9/update".into())).unwrap();
        match client.upload(10.0) {
            Err(TelemetryError::Transport(msg)) => assert!(!msg.contains("TESTKEY")),
            other => panic!("esperava erro de transporte, veio {other:?}"),
        }
    }
}
