use anyhow::{Context, Result, bail};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use slipway_core::{GeneratorSettings, MitigationRequest, MitigationSuggestion, parse_mitigation_response};

pub const SUPPORTED_PROVIDER: &str = "anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    t: String,
    text: Option<String>,
}

/// Ask the generator for suggestions and validate the reply.
///
/// Fails before any request when the provider is unsupported or no key is
/// configured. A reply that arrives but is unusable becomes fallback records.
pub async fn request_suggestions(
    provider: &str,
    settings: &GeneratorSettings,
    request: &MitigationRequest,
) -> Result<Vec<MitigationSuggestion>> {
    if provider != SUPPORTED_PROVIDER {
        bail!("unsupported generator provider '{provider}' (expected '{SUPPORTED_PROVIDER}')");
    }
    let key = settings.require_api_key()?;

    let text = anthropic_complete(settings, key, &request.system_prompt(), &request.user_prompt()).await?;
    tracing::debug!(chars = text.len(), "generator replied");
    Ok(parse_mitigation_response(&text))
}

fn messages_url(base_url: &str) -> String {
    format!("{}/v1/messages", base_url.trim_end_matches('/'))
}

fn collect_text(resp: Resp) -> String {
    let mut s = String::new();
    for b in resp.content {
        if b.t == "text" {
            if let Some(t) = b.text {
                s.push_str(&t);
            }
        }
    }
    s.trim().to_string()
}

async fn anthropic_complete(
    settings: &GeneratorSettings,
    key: &str,
    system: &str,
    user: &str,
) -> Result<String> {
    let body = Req {
        model: &settings.model,
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        system,
        messages: vec![Msg { role: "user", content: user }],
    };

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(key).context("api key is not a valid header value")?);
    headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let url = messages_url(&settings.base_url);
    tracing::debug!(%url, model = %settings.model, "sending mitigation request");

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .headers(headers)
        .json(&body)
        .send()
        .await
        .context("anthropic request")?;

    let status = resp.status();
    if !status.is_success() {
        let txt = resp.text().await.unwrap_or_default();
        bail!("anthropic error: {status} {txt}");
    }

    let out: Resp = resp.json().await.context("parse anthropic response")?;
    Ok(collect_text(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_core::{Language, analyze_variance, critical_path, score_confidence};

    fn settings(api_key: Option<&str>) -> GeneratorSettings {
        GeneratorSettings {
            model: "m".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            max_tokens: 100,
            temperature: 0.0,
            api_key: api_key.map(str::to_string),
        }
    }

    fn empty_request() -> MitigationRequest {
        MitigationRequest::build(
            &critical_path(&[], &[]),
            &analyze_variance(&[]),
            &score_confidence(&[]),
            Language::En,
        )
    }

    #[test]
    fn text_blocks_are_concatenated() {
        let resp: Resp = serde_json::from_str(
            r#"{"content": [
                {"type": "text", "text": "  [{\"strategy\":"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "\"a\"}]  "}
            ]}"#,
        )
        .unwrap();
        assert_eq!(collect_text(resp), r#"[{"strategy":"a"}]"#);
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        assert_eq!(messages_url("https://api.anthropic.com/"), "https://api.anthropic.com/v1/messages");
        assert_eq!(messages_url("http://localhost:8080"), "http://localhost:8080/v1/messages");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let err = request_suggestions("anthropic", &settings(None), &empty_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[tokio::test]
    async fn unknown_provider_is_rejected() {
        let err = request_suggestions("openai", &settings(Some("k")), &empty_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported generator provider"));
    }
}
