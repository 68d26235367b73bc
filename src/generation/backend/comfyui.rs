//! ComfyUI backend integration
//!
//! Runs a plain txt2img workflow on a local or remote ComfyUI server:
//! submit the graph, poll its history until an image shows up, download it.

use super::{BackendType, GenerationRequest, ImageBackend};
use crate::error::ComicError;
use crate::models::GenerationConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Node id of the SaveImage node in the generated workflow
const SAVE_NODE: &str = "9";

/// ComfyUI backend
pub struct ComfyUiBackend {
    api_url: String,
    model_id: String,
    api_token: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
    poll_interval: Duration,
    status_timeout: Duration,
}

impl ComfyUiBackend {
    /// Create new ComfyUI backend
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model_id: config.model_id.clone(),
            api_token: config.api_token.clone(),
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(10)),
            status_timeout: Duration::from_millis(config.status_timeout_ms.max(1)),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.api_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.api_url, path)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Generate ComfyUI txt2img workflow
    fn generate_workflow(&self, request: &GenerationRequest) -> serde_json::Value {
        let seed = request
            .seed
            .unwrap_or_else(|| u64::from(rand::random::<u32>()));

        serde_json::json!({
            "3": {
                "inputs": {
                    "seed": seed,
                    "steps": request.steps,
                    "cfg": request.guidance_scale,
                    "sampler_name": "euler",
                    "scheduler": "normal",
                    "denoise": 1.0,
                    "model": ["4", 0],
                    "positive": ["6", 0],
                    "negative": ["7", 0],
                    "latent_image": ["5", 0]
                },
                "class_type": "KSampler"
            },
            "4": {
                "inputs": {
                    "ckpt_name": self.model_id
                },
                "class_type": "CheckpointLoaderSimple"
            },
            "5": {
                "inputs": {
                    "width": request.width,
                    "height": request.height,
                    "batch_size": 1
                },
                "class_type": "EmptyLatentImage"
            },
            "6": {
                "inputs": {
                    "text": request.positive_prompt,
                    "clip": ["4", 1]
                },
                "class_type": "CLIPTextEncode"
            },
            "7": {
                "inputs": {
                    "text": request.negative_prompt,
                    "clip": ["4", 1]
                },
                "class_type": "CLIPTextEncode"
            },
            "8": {
                "inputs": {
                    "samples": ["3", 0],
                    "vae": ["4", 2]
                },
                "class_type": "VAEDecode"
            },
            SAVE_NODE: {
                "inputs": {
                    "filename_prefix": format!("storycomic_panel_{}", request.index),
                    "images": ["8", 0]
                },
                "class_type": "SaveImage"
            }
        })
    }

    /// Submit workflow to ComfyUI
    async fn submit_prompt(&self, workflow: serde_json::Value) -> Result<String> {
        let response = self
            .post("/prompt")
            .json(&serde_json::json!({
                "prompt": workflow,
                "client_id": uuid::Uuid::new_v4().to_string(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ComicError::Backend(format!("ComfyUI rejected prompt: {} - {}", status, body)).into());
        }

        let result: PromptResponse = response.json().await?;
        Ok(result.prompt_id)
    }

    /// Poll history until the prompt has produced an image
    async fn wait_for_image(&self, prompt_id: &str) -> Result<OutputImage> {
        let started = Instant::now();

        loop {
            let response = self.get(&format!("/history/{}", prompt_id)).send().await?;
            if !response.status().is_success() {
                anyhow::bail!("Failed to get prompt history: {}", response.status());
            }

            let history: HashMap<String, HistoryEntry> = response.json().await?;
            if let Some(entry) = history.get(prompt_id) {
                if entry.failed() {
                    return Err(ComicError::Backend(format!(
                        "execution error for prompt {}",
                        prompt_id
                    ))
                    .into());
                }
                if let Some(image) = entry.first_image() {
                    return Ok(image.clone());
                }
            }

            if started.elapsed() >= self.timeout {
                anyhow::bail!(
                    "Timed out after {}s waiting for prompt {}",
                    self.timeout.as_secs(),
                    prompt_id
                );
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Download an output image
    async fn download(&self, image: &OutputImage) -> Result<Vec<u8>> {
        let response = self
            .get("/view")
            .query(&[
                ("filename", image.filename.as_str()),
                ("subfolder", image.subfolder.as_str()),
                ("type", image.kind.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to download {}: {}", image.filename, response.status());
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl ImageBackend for ComfyUiBackend {
    fn name(&self) -> &str {
        "ComfyUI"
    }

    fn backend_type(&self) -> BackendType {
        BackendType::ComfyUi
    }

    async fn is_available(&self) -> Result<bool> {
        let request = self.get("/system_stats").timeout(self.status_timeout).send();
        match request.await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::debug!(url = %self.api_url, error = %e, "ComfyUI status check failed");
                Ok(false)
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        let workflow = self.generate_workflow(request);
        let prompt_id = self.submit_prompt(workflow).await?;
        tracing::debug!(prompt_id = %prompt_id, panel = request.index, "Submitted ComfyUI prompt");

        let image = self.wait_for_image(&prompt_id).await?;
        self.download(&image).await
    }
}

/// ComfyUI prompt response
#[derive(Debug, Deserialize)]
struct PromptResponse {
    prompt_id: String,
}

/// ComfyUI history entry
#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(default)]
    outputs: HashMap<String, NodeOutput>,
    #[serde(default)]
    status: Option<HistoryStatus>,
}

impl HistoryEntry {
    fn first_image(&self) -> Option<&OutputImage> {
        self.outputs
            .get(SAVE_NODE)
            .and_then(|o| o.images.first())
            .or_else(|| self.outputs.values().find_map(|o| o.images.first()))
    }

    fn failed(&self) -> bool {
        self.status
            .as_ref()
            .map(|s| s.status_str == "error")
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct HistoryStatus {
    #[serde(default)]
    status_str: String,
}

#[derive(Debug, Deserialize)]
struct NodeOutput {
    #[serde(default)]
    images: Vec<OutputImage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputImage {
    filename: String,
    #[serde(default)]
    subfolder: String,
    #[serde(rename = "type", default = "default_output_kind")]
    kind: String,
}

fn default_output_kind() -> String {
    "output".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> ComfyUiBackend {
        let mut config = GenerationConfig::default();
        config.api_url = "http://localhost:8188/".to_string();
        config.model_id = "v1-5-pruned-emaonly.safetensors".to_string();
        ComfyUiBackend::new(&config).unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            index: 2,
            positive_prompt: "manga panel, Hello".to_string(),
            negative_prompt: "blurry".to_string(),
            seed: Some(1234),
            width: 640,
            height: 512,
            steps: 20,
            guidance_scale: 6.5,
        }
    }

    #[test]
    fn test_backend_creation() {
        let backend = backend();
        assert_eq!(backend.name(), "ComfyUI");
        assert_eq!(backend.backend_type(), BackendType::ComfyUi);
        assert_eq!(backend.api_url, "http://localhost:8188");
    }

    #[tokio::test]
    async fn test_availability_check_gives_up_on_silent_server() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _hold = tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });

        let mut config = GenerationConfig::default();
        config.api_url = format!("http://{}", addr);
        config.status_timeout_ms = 200;
        let backend = ComfyUiBackend::new(&config).unwrap();
        assert_eq!(backend.timeout, Duration::from_secs(300));

        let started = Instant::now();
        let available = tokio::time::timeout(Duration::from_secs(10), backend.is_available())
            .await
            .expect("availability check should not wait for the generation timeout")
            .unwrap();
        assert!(!available);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_workflow_generation() {
        let workflow = backend().generate_workflow(&request());

        assert_eq!(workflow["3"]["inputs"]["seed"], 1234);
        assert_eq!(workflow["3"]["inputs"]["steps"], 20);
        assert_eq!(workflow["4"]["inputs"]["ckpt_name"], "v1-5-pruned-emaonly.safetensors");
        assert_eq!(workflow["5"]["inputs"]["width"], 640);
        assert_eq!(workflow["6"]["inputs"]["text"], "manga panel, Hello");
        assert_eq!(workflow["7"]["inputs"]["text"], "blurry");
        assert_eq!(workflow[SAVE_NODE]["class_type"], "SaveImage");
    }

    #[test]
    fn test_workflow_random_seed_when_unset() {
        let mut req = request();
        req.seed = None;
        let workflow = backend().generate_workflow(&req);
        assert!(workflow["3"]["inputs"]["seed"].is_u64());
    }

    #[test]
    fn test_history_entry_parsing() {
        let json = r#"{
            "outputs": {
                "9": {"images": [{"filename": "storycomic_panel_2_00001_.png", "subfolder": "", "type": "output"}]}
            },
            "status": {"status_str": "success", "completed": true}
        }"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert!(!entry.failed());
        let image = entry.first_image().unwrap();
        assert_eq!(image.filename, "storycomic_panel_2_00001_.png");
        assert_eq!(image.kind, "output");
    }

    #[test]
    fn test_history_entry_error_and_pending() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"outputs": {}, "status": {"status_str": "error"}}"#).unwrap();
        assert!(entry.failed());
        assert!(entry.first_image().is_none());

        let pending: HistoryEntry = serde_json::from_str(r#"{}"#).unwrap();
        assert!(!pending.failed());
        assert!(pending.first_image().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let mut config = GenerationConfig::default();
        config.api_url = "http://127.0.0.1:9".to_string();
        config.timeout_secs = 2;
        let backend = ComfyUiBackend::new(&config).unwrap();
        assert!(!backend.is_available().await.unwrap());
    }
}
