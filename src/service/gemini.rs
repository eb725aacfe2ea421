//! Gemini REST implementation of [`GenerationService`].

use super::{
    CHAT_OPERATION, EDIT_OPERATION, EditCall, GenerationService, IMAGINE_OPERATION,
    RENDER_OPERATION, RenderCall, TextStream, edit_prompt, render_prompt,
};
use crate::config::Config;
use crate::error::{AtomError, Result};
use crate::types::{AspectRatio, ImageBlob, Message, ModelTier, Role, SizeTier};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PRO_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
const FLASH_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const CHAT_MODEL: &str = "gemini-3-pro-preview";
const CHAT_SYSTEM_INSTRUCTION: &str =
    "คุณคือ AtomRender Specialist ผู้เชี่ยวชาญด้านการเรนเดอร์และสถาปัตยกรรม";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    fn image(blob: &ImageBlob) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: blob.mime_type.clone(),
                data: blob.to_base64(),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    image_config: ImageConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'static str>,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize, Debug)]
struct ResponseInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .flatten()
            .take(1)
            .filter_map(|c| c.content.as_ref())
            .filter_map(|c| c.parts.as_ref())
            .flatten()
    }

    /// First inline image of the first candidate
    fn into_image(self, operation: &str) -> Result<ImageBlob> {
        let inline = self
            .parts()
            .find_map(|p| p.inline_data.as_ref())
            .ok_or_else(|| AtomError::remote(operation, "no image in response"))?;
        ImageBlob::from_base64(inline.mime_type.clone(), &inline.data)
            .map_err(|e| AtomError::remote(operation, e.to_string()))
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.parts().filter_map(|p| p.text.as_deref()).collect()
    }
}

/// Server-sent event framing: buffers raw bytes and yields complete `data:` payloads.
///
/// Events are decoded only once their terminating blank line has arrived, so a
/// multi-byte character split across network chunks is never torn.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        // CR never occurs inside a UTF-8 sequence or an escaped JSON payload
        self.buffer.extend(chunk.iter().copied().filter(|&b| b != b'\r'));

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            let event = String::from_utf8(raw)
                .map_err(|e| AtomError::remote(CHAT_OPERATION, format!("stream event is not UTF-8: {}", e)))?;
            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            if !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        Ok(payloads)
    }
}

fn image_size(size: SizeTier) -> &'static str {
    match size {
        SizeTier::FullHd | SizeTier::TwoK => "2K",
        SizeTier::FourK => "4K",
        SizeTier::MiniHd | SizeTier::OneK => "1K",
    }
}

fn image_config(aspect_ratio: AspectRatio, image_size: Option<&'static str>) -> Option<GenerationConfig> {
    Some(GenerationConfig {
        image_config: ImageConfig {
            aspect_ratio: aspect_ratio.as_str(),
            image_size,
        },
    })
}

fn single_turn(parts: Vec<Part>) -> Vec<Content> {
    vec![Content { role: None, parts }]
}

fn render_request(call: &RenderCall) -> (&'static str, GenerateRequest) {
    let (model, size) = match call.tier {
        ModelTier::Pro => (PRO_IMAGE_MODEL, Some(image_size(call.size))),
        ModelTier::Free => (FLASH_IMAGE_MODEL, None),
    };
    let request = GenerateRequest {
        contents: single_turn(vec![Part::image(&call.sketch), Part::text(render_prompt(&call.prompt))]),
        system_instruction: None,
        generation_config: image_config(call.aspect_ratio, size),
    };
    (model, request)
}

fn edit_request(call: &EditCall) -> (&'static str, GenerateRequest) {
    let mut parts = vec![Part::image(&call.base_image)];
    if let Some(mask) = &call.mask {
        parts.push(Part::image(mask));
    }
    parts.push(Part::text(edit_prompt(&call.prompt, call.mask.is_some())));

    let request = GenerateRequest {
        contents: single_turn(parts),
        system_instruction: None,
        generation_config: image_config(call.aspect_ratio, None),
    };
    (FLASH_IMAGE_MODEL, request)
}

fn imagine_request(prompt: &str) -> (&'static str, GenerateRequest) {
    let request = GenerateRequest {
        contents: single_turn(vec![Part::text(prompt)]),
        system_instruction: None,
        generation_config: image_config(AspectRatio::Square, None),
    };
    (FLASH_IMAGE_MODEL, request)
}

fn chat_request(history: &[Message]) -> GenerateRequest {
    let contents = history
        .iter()
        .filter_map(|message| {
            let role = match message.role {
                Role::User => "user",
                Role::Assistant => "model",
                Role::System => return None,
            };
            let mut parts: Vec<Part> = message
                .attachments
                .iter()
                .map(|a| Part::InlineData {
                    inline_data: InlineData {
                        mime_type: a.mime_type.clone(),
                        data: a.data.clone(),
                    },
                })
                .collect();
            if !message.content.is_empty() {
                parts.push(Part::text(message.content.clone()));
            }
            (!parts.is_empty()).then_some(Content {
                role: Some(role),
                parts,
            })
        })
        .collect();

    GenerateRequest {
        contents,
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(CHAT_SYSTEM_INSTRUCTION)],
        }),
        generation_config: None,
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_key()?, config.api_base_url.as_str())
    }

    async fn post(&self, url: &str, request: &GenerateRequest, operation: &str) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AtomError::remote(operation, format!("API error {}: {}", status, body)));
        }
        Ok(resp)
    }

    async fn generate_image(&self, model: &str, request: GenerateRequest, operation: &str) -> Result<ImageBlob> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(model, operation, "sending image request");

        let resp = self.post(&url, &request, operation).await?;
        let body: GenerateResponse = resp.json().await?;
        body.into_image(operation)
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn render(&self, call: &RenderCall) -> Result<ImageBlob> {
        let (model, request) = render_request(call);
        self.generate_image(model, request, RENDER_OPERATION).await
    }

    async fn edit(&self, call: &EditCall) -> Result<ImageBlob> {
        let (model, request) = edit_request(call);
        self.generate_image(model, request, EDIT_OPERATION).await
    }

    async fn generate_from_text(&self, prompt: &str) -> Result<ImageBlob> {
        let (model, request) = imagine_request(prompt);
        self.generate_image(model, request, IMAGINE_OPERATION).await
    }

    async fn chat_stream(&self, history: &[Message]) -> Result<TextStream> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, CHAT_MODEL
        );
        let request = chat_request(history);
        let resp = self.post(&url, &request, CHAT_OPERATION).await?;
        let mut bytes = resp.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(AtomError::from)?;
                for data in decoder.push(&chunk)? {
                    let event: GenerateResponse = serde_json::from_str(&data)
                        .map_err(|source| AtomError::JsonParse {
                            context: "chat stream event".to_string(),
                            source,
                        })?;
                    let text = event.text();
                    if !text.is_empty() {
                        yield text;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
