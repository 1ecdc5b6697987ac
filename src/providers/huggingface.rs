//! Hugging Face inference client for text-to-image rendering.
//!
//! One POST per image: the prompt in `inputs`, sampling knobs in
//! `parameters`. FLUX-class backends ignore `negative_prompt`, SD-class
//! backends honour it — sending it is harmless either way, which is why the
//! positive style preamble also restates the "no shading" constraints.
//! The response body is the image itself (PNG or JPEG), not JSON.

use crate::error::ServiceError;
use crate::providers::ImageModel;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

/// Sampling knobs forwarded to the inference endpoint where supported.
#[derive(Debug, Clone, Default)]
pub struct SamplingOptions {
    pub negative_prompt: Option<String>,
    pub inference_steps: Option<u32>,
    pub guidance_scale: Option<f32>,
}

/// REST client for a Hugging Face inference endpoint.
pub struct HuggingFaceClient {
    http: reqwest::Client,
    model_url: String,
    api_key: String,
    options: SamplingOptions,
    timeout_secs: u64,
}

impl HuggingFaceClient {
    pub fn new(
        model_url: &str,
        api_key: &str,
        options: SamplingOptions,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            model_url: model_url.to_string(),
            api_key: api_key.to_string(),
            options,
            timeout_secs,
        })
    }

    /// Request body: `inputs` plus a `parameters` object carrying only the
    /// knobs that are actually set.
    fn request_body(&self, prompt: &str) -> Value {
        let mut parameters = Map::new();
        if let Some(ref neg) = self.options.negative_prompt {
            parameters.insert("negative_prompt".into(), json!(neg));
        }
        if let Some(steps) = self.options.inference_steps {
            parameters.insert("num_inference_steps".into(), json!(steps));
        }
        if let Some(scale) = self.options.guidance_scale {
            parameters.insert("guidance_scale".into(), json!(scale));
        }

        if parameters.is_empty() {
            json!({ "inputs": prompt })
        } else {
            json!({ "inputs": prompt, "parameters": parameters })
        }
    }
}

#[async_trait]
impl ImageModel for HuggingFaceClient {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .http
            .post(&self.model_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::from_reqwest(e, self.timeout_secs))?;

        if bytes.is_empty() {
            return Err(ServiceError::BadResponse("empty image body".into()));
        }

        debug!("Image model returned {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(options: SamplingOptions) -> HuggingFaceClient {
        HuggingFaceClient::new("https://example.invalid/model", "hf_test", options, 5).unwrap()
    }

    #[test]
    fn body_without_options_is_inputs_only() {
        let body = client(SamplingOptions::default()).request_body("a dinosaur");
        assert_eq!(body, json!({ "inputs": "a dinosaur" }));
    }

    #[test]
    fn body_carries_set_parameters_only() {
        let body = client(SamplingOptions {
            negative_prompt: Some("color".into()),
            inference_steps: Some(4),
            guidance_scale: None,
        })
        .request_body("a rocket");

        assert_eq!(body["inputs"], "a rocket");
        assert_eq!(body["parameters"]["negative_prompt"], "color");
        assert_eq!(body["parameters"]["num_inference_steps"], 4);
        assert!(body["parameters"].get("guidance_scale").is_none());
    }
}
