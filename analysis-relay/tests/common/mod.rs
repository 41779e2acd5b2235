#![allow(dead_code)]

use analysis_relay::config::{
    CorsSettings, GeminiSettings, ObservabilitySettings, PromptSettings, RelayConfig,
    RetrySettings, UploadSettings, DEFAULT_MAX_UPLOAD_BYTES,
};
use analysis_relay::startup::Application;
use reqwest::multipart;
use service_core::config::Config as CoreConfig;
use std::time::Duration;

pub const TEST_MODEL: &str = "test-model";
pub const TEST_API_KEY: &str = "test-api-key";
pub const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

/// Config pointing at `upstream_uri`, with millisecond backoff so retry
/// tests finish quickly.
pub fn test_config(upstream_uri: &str) -> RelayConfig {
    RelayConfig {
        common: CoreConfig { port: 0 },
        gemini: GeminiSettings {
            api_key: TEST_API_KEY.to_string(),
            model: TEST_MODEL.to_string(),
            api_base: format!("{}/v1beta", upstream_uri),
            timeout_secs: 5,
        },
        prompts: PromptSettings {
            instruction: "Analyze this video.".to_string(),
            system_instruction: "You are a video production expert.".to_string(),
        },
        retry: RetrySettings {
            max_attempts: 5,
            base_delay_ms: 1,
        },
        upload: UploadSettings {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        },
        cors: CorsSettings {
            allowed_origins: vec!["*".to_string()],
        },
        observability: ObservabilitySettings {
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(config: RelayConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_analyze(&self, form: multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}/analyze", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn video_form(bytes: Vec<u8>, mime_type: &str) -> multipart::Form {
    multipart::Form::new().part(
        "file",
        multipart::Part::bytes(bytes)
            .file_name("clip.mp4")
            .mime_str(mime_type)
            .unwrap(),
    )
}

/// Gemini response envelope whose first part carries `text`.
pub fn gemini_envelope(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}
