use std::io::{BufRead, BufReader, Lines};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CompletionClient, FragmentStream, Turn};
use crate::config::{ConfigStore, Credentials};
use crate::error::{Error, Result};

pub const MAX_OUTPUT_TOKENS: u32 = 1024;

const AZURE_API_VERSION: &str = "2024-02-01";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Streams chat completions from an OpenAI-compatible or Azure OpenAI endpoint.
///
/// Settings are re-read from the store on every request, so edits made by
/// `ai-chat config` in another terminal apply to the next turn.
pub struct OpenAIClient {
    store: ConfigStore,
    client: Client,
}

impl OpenAIClient {
    pub fn new(store: ConfigStore) -> Result<Self> {
        // Replies can stream for longer than any fixed total timeout.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| Error::completion("failed to build HTTP client", e))?;
        Ok(Self { store, client })
    }
}

#[derive(Serialize)]
struct OaiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<Turn>,
    max_tokens: u32,
    stream: bool,
}

// Data structures for streaming responses
#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// System prompt first, then the conversation in order.
fn build_messages(history: &[Turn], system_prompt: &str) -> Vec<Turn> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Turn::system(system_prompt));
    messages.extend_from_slice(history);
    messages
}

fn completions_url(credentials: &Credentials) -> String {
    match credentials {
        Credentials::OpenAi { base_url, .. } => format!("{base_url}/chat/completions"),
        Credentials::AzureDeployment {
            endpoint,
            deployment,
            ..
        } => format!(
            "{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={AZURE_API_VERSION}"
        ),
    }
}

impl CompletionClient for OpenAIClient {
    fn stream_completion(&self, history: &[Turn], system_prompt: &str) -> Result<FragmentStream> {
        let config = self.store.read()?;
        let credentials = config.credentials()?;

        let url = completions_url(&credentials);
        let messages = build_messages(history, system_prompt);
        let request = match &credentials {
            Credentials::OpenAi { api_key, model, .. } => self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&OaiRequest {
                    model: Some(model.as_str()),
                    messages,
                    max_tokens: MAX_OUTPUT_TOKENS,
                    stream: true,
                }),
            Credentials::AzureDeployment { api_key, .. } => self
                .client
                .post(&url)
                .header("api-key", api_key)
                .json(&OaiRequest {
                    model: None,
                    messages,
                    max_tokens: MAX_OUTPUT_TOKENS,
                    stream: true,
                }),
        };

        debug!(%url, turns = history.len(), "sending chat completion request");
        let resp = request
            .send()
            .map_err(|e| Error::completion(format!("failed to call {url}"), e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            warn!(%status, "provider rejected chat completion request");
            let detail = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(Error::completion(format!("provider returned {status}"), detail));
        }

        Ok(Box::new(SseFragments::new(BufReader::new(resp))))
    }
}

/// Pulls text deltas out of a server-sent-events body, one `data:` line at a time.
pub struct SseFragments<R> {
    lines: Lines<R>,
    done: bool,
}

impl<R: BufRead> SseFragments<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            done: false,
        }
    }

    fn finish(&mut self) -> Option<Result<String>> {
        self.done = true;
        debug!("chat completion stream ended");
        None
    }
}

impl<R: BufRead> Iterator for SseFragments<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                None => return self.finish(),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(Error::completion("failed to read line from stream", e)));
                }
                Some(Ok(line)) => line,
            };

            // SSE format: data lines start with "data:"
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                return self.finish();
            }

            let chunk = match serde_json::from_str::<StreamChunk>(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    debug!(error = %e, "skipping unparseable stream chunk");
                    continue;
                }
            };

            if let Some(api_error) = chunk.error {
                self.done = true;
                return Some(Err(Error::completion(
                    "provider reported an error mid-stream",
                    api_error.message,
                )));
            }

            // Azure sends a leading chunk with no choices (content filter results)
            let content = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content);
            if let Some(content) = content {
                return Some(Ok(content));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::llm::Role;

    fn collect(body: &str) -> Vec<Result<String>> {
        SseFragments::new(Cursor::new(body.to_string())).collect()
    }

    #[test]
    fn test_sse_yields_deltas_in_order() {
        let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                    data: [DONE]\n\n";
        let fragments: Vec<String> = collect(body).into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(fragments, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_sse_stops_at_done_marker() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\
                    data: [DONE]\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n";
        let fragments: Vec<String> = collect(body).into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(fragments, vec!["a"]);
    }

    #[test]
    fn test_sse_skips_noise() {
        let body = ": keep-alive\n\
                    event: message\n\
                    data: {\"choices\":[],\"prompt_filter_results\":[]}\n\
                    data: not json\n\
                    data:{\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n";
        let fragments: Vec<String> = collect(body).into_iter().map(|f| f.unwrap()).collect();
        assert_eq!(fragments, vec!["ok"]);
    }

    #[test]
    fn test_sse_empty_body_yields_nothing() {
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_sse_error_chunk_ends_stream() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\
                    data: {\"error\":{\"message\":\"rate limited\"}}\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"y\"}}]}\n";
        let items = collect(body);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "x");
        assert!(matches!(items[1], Err(Error::CompletionFailed { .. })));
    }

    #[test]
    fn test_build_messages_puts_system_first() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello"), Turn::user("again")];
        let messages = build_messages(&history, "Be brief.");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Turn::system("Be brief."));
        assert_eq!(&messages[1..], history.as_slice());
    }

    #[test]
    fn test_request_serialization() {
        let req = OaiRequest {
            model: None,
            messages: vec![Turn::system("s"), Turn::user("u")],
            max_tokens: MAX_OUTPUT_TOKENS,
            stream: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [
                    {"role": "system", "content": "s"},
                    {"role": "user", "content": "u"}
                ],
                "max_tokens": 1024,
                "stream": true
            })
        );
        assert_eq!(Role::Assistant, Turn::assistant("a").role);
    }

    #[test]
    fn test_completions_url() {
        let openai = Credentials::OpenAi {
            api_key: "k".into(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
        };
        assert_eq!(
            completions_url(&openai),
            "https://api.openai.com/v1/chat/completions"
        );

        let azure = Credentials::AzureDeployment {
            api_key: "k".into(),
            endpoint: "https://res.openai.azure.com".into(),
            deployment: "gpt-35-turbo".into(),
        };
        assert_eq!(
            completions_url(&azure),
            "https://res.openai.azure.com/openai/deployments/gpt-35-turbo/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join(".ai-chat"));
        // Unroutable endpoint: reaching the network would surface CompletionFailed instead.
        store
            .write(&[("OPENAI_API_ENDPOINT", "http://127.0.0.1:9")])
            .unwrap();
        let client = OpenAIClient::new(store).unwrap();

        let err = client
            .stream_completion(&[Turn::user("hi")], "You are a helpful assistant.")
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingCredentials { ref missing } if missing == &vec!["OPENAI_KEY"]));
    }
}
