use super::GenerativeBackend;
use crate::integration::config::BackendConfig;
use crate::messages::Message;
use crate::persona::{Persona, SpeakerVoice};
use crate::{Result, ZeitgeistError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// Request bodies

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

// Response bodies

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidatePart {
    text: Option<String>,
    inline_data: Option<CandidateInlineData>,
}

#[derive(Debug, Deserialize)]
struct CandidateInlineData {
    data: Option<String>,
}

impl GenerateResponse {
    fn first_parts(&self) -> &[CandidatePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Inline payload of the first part of the first candidate
    fn audio_payload(&self) -> Option<String> {
        self.first_parts()
            .first()
            .and_then(|p| p.inline_data.as_ref())
            .and_then(|d| d.data.clone())
            .filter(|d| !d.is_empty())
    }
}

fn message_content(message: &Message) -> Content<'_> {
    let mut parts = vec![Part {
        text: Some(message.text.clone()),
        inline_data: None,
    }];

    if let Some(inline) = message.image.as_ref().and_then(|i| i.inline_data()) {
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: inline.mime_type,
                data: inline.data,
            }),
        });
    }

    Content {
        role: Some(message.role.as_str()),
        parts,
    }
}

/// Client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    client: Client,
    config: BackendConfig,
}

impl GeminiClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate(&self, model: &str, body: &GenerateRequest<'_>) -> Result<GenerateResponse> {
        let url = self.endpoint(model);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ZeitgeistError::BackendUnavailable(format!(
                "{} returned {}: {}",
                model, status, detail
            )));
        }

        response.json::<GenerateResponse>().await.map_err(|e| {
            ZeitgeistError::BackendUnavailable(format!("Unreadable response from {}: {}", model, e))
        })
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_text(
        &self,
        persona: &Persona,
        history: &[Message],
    ) -> Result<Option<String>> {
        let body = GenerateRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: Some(persona.system_instruction.clone()),
                    inline_data: None,
                }],
            }),
            contents: history.iter().map(message_content).collect(),
            generation_config: GenerationConfig {
                temperature: Some(self.config.temperature),
                ..Default::default()
            },
        };

        let response = self.generate(&self.config.text_model, &body).await?;
        let text = response.text();
        info!(
            "{} replied with {} chars",
            persona.id,
            text.as_ref().map_or(0, |t| t.len())
        );
        Ok(text)
    }

    async fn synthesize_speech(&self, text: &str, voice: SpeakerVoice) -> Result<Option<String>> {
        let body = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: Some(text.to_string()),
                    inline_data: None,
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO"]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.as_str(),
                        },
                    },
                }),
                ..Default::default()
            },
        };

        let response = self.generate(&self.config.speech_model, &body).await?;
        let payload = response.audio_payload();
        if payload.is_none() {
            debug!("Speech response for voice {} carried no audio", voice);
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::config::AppConfig;
    use crate::messages::{ImageAttachment, Role};
    use serde_json::json;

    #[test]
    fn test_text_request_shape() {
        let user = Message::user(
            "Critique this",
            Some(ImageAttachment::from_data_uri("data:image/png;base64,AAAA")),
        );
        let reply = Message::new(Role::Model, "Gee");
        let history = [user, reply];

        let body = GenerateRequest {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: Some("You are Andy Warhol.".into()),
                    inline_data: None,
                }],
            }),
            contents: history.iter().map(message_content).collect(),
            generation_config: GenerationConfig {
                temperature: Some(0.5),
                ..Default::default()
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "systemInstruction": { "parts": [{ "text": "You are Andy Warhol." }] },
                "contents": [
                    {
                        "role": "user",
                        "parts": [
                            { "text": "Critique this" },
                            { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                        ]
                    },
                    { "role": "model", "parts": [{ "text": "Gee" }] }
                ],
                "generationConfig": { "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn test_unparseable_image_sent_as_text_only() {
        let message = Message::user("hi", Some(ImageAttachment::from_data_uri("not a uri")));
        let content = message_content(&message);
        assert_eq!(content.parts.len(), 1);
    }

    #[test]
    fn test_speech_request_shape() {
        let body = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: Some("Hello".into()),
                    inline_data: None,
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["AUDIO"]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig { voice_name: "Kore" },
                    },
                }),
                ..Default::default()
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["generationConfig"]["responseModalities"], json!(["AUDIO"]));
        assert_eq!(
            value["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Kore"
        );
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_and_audio() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Gee, " }, { "text": "that's great." }] }
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Gee, that's great."));
        assert!(response.audio_payload().is_none());

        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "audio/L16;rate=24000", "data": "AID/fw==" } }] }
            }]
        }))
        .unwrap();
        assert_eq!(response.audio_payload().as_deref(), Some("AID/fw=="));
        assert!(response.text().is_none());
    }

    #[test]
    fn test_empty_response() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.text().is_none());
        assert!(response.audio_payload().is_none());
    }

    #[test]
    fn test_endpoint() {
        let config = AppConfig::default().with_base_url("http://localhost:8080/v1beta/");
        let client = GeminiClient::new(config.backend).unwrap();
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_error() {
        let client = GeminiClient::new(BackendConfig {
            base_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let result = client.synthesize_speech("hi", SpeakerVoice::Puck).await;
        assert!(matches!(result, Err(ZeitgeistError::BackendUnavailable(_))));
    }
}
