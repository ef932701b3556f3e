//! UDPipe REST client.
//!
//! Talks to a UDPipe 2 service (the public LINDAT instance by default, or a
//! self-hosted one). Sentences are sent pre-segmented; the service answers
//! with CoNLL-U which is read by [`parse_conllu`].
//!
//! Requires the `udpipe` feature (enabled by default).

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::analysis::parser::{DependencyParser, ParsedSentence, parse_conllu};
use crate::error::{BionicError, Result};

/// Connection settings for a UDPipe service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpipeConfig {
    /// Base URL of the REST API (without trailing `/process`).
    pub url: String,
    /// Model name or prefix, e.g. `chinese-gsdsimp`.
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UdpipeConfig {
    fn default() -> Self {
        UdpipeConfig {
            url: "https://lindat.mff.cuni.cz/services/udpipe/api".to_string(),
            model: "chinese-gsdsimp".to_string(),
            timeout_secs: 60,
        }
    }
}

impl UdpipeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    default_model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    result: String,
}

/// Resolve a configured model name against the models a service offers.
///
/// An exact name wins; otherwise the first model starting with the
/// configured prefix is used.
fn resolve_model(models: &ModelsResponse, wanted: &str) -> Option<String> {
    if models.models.contains_key(wanted) {
        return Some(wanted.to_string());
    }
    models
        .models
        .keys()
        .find(|name| name.starts_with(wanted))
        .cloned()
}

fn decode_process_response(body: &str) -> Result<ParsedSentence> {
    let response: ProcessResponse = serde_json::from_str(body)
        .map_err(|e| BionicError::analysis(format!("unexpected UDPipe response: {e}")))?;

    let mut merged = ParsedSentence::default();
    for sentence in parse_conllu(&response.result)? {
        merged.append(sentence);
    }
    Ok(merged)
}

/// A [`DependencyParser`] backed by a UDPipe REST service.
///
/// # Examples
///
/// ```no_run
/// use bionic_epub::analysis::parser::{DependencyParser, UdpipeConfig, UdpipeParser};
///
/// # fn example() -> bionic_epub::error::Result<()> {
/// let parser = UdpipeParser::connect(UdpipeConfig::default())?;
/// let parsed = parser.parse("他吃了苹果")?;
/// println!("{} tokens", parsed.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UdpipeParser {
    client: Client,
    config: UdpipeConfig,
    model: String,
}

impl UdpipeParser {
    /// Connect to the service and check the configured model is served.
    pub fn connect(config: UdpipeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BionicError::analysis(format!("cannot build HTTP client: {e}")))?;

        let url = config.endpoint("models");
        log::debug!("Querying UDPipe models at {url}");
        let response = client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| BionicError::analysis(format!("UDPipe service unreachable: {e}")))?;
        let models: ModelsResponse = response
            .json()
            .map_err(|e| BionicError::analysis(format!("unexpected UDPipe model list: {e}")))?;

        let model = resolve_model(&models, &config.model).ok_or_else(|| {
            BionicError::analysis(format!(
                "UDPipe model '{}' not available (service default: {})",
                config.model,
                models.default_model.as_deref().unwrap_or("none")
            ))
        })?;
        log::info!("Using UDPipe model {model}");

        Ok(UdpipeParser {
            client,
            config,
            model,
        })
    }

    /// The resolved model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &UdpipeConfig {
        &self.config
    }
}

impl DependencyParser for UdpipeParser {
    fn parse(&self, sentence: &str) -> Result<ParsedSentence> {
        let form = [
            ("model", self.model.as_str()),
            ("tokenizer", "presegmented"),
            ("tagger", ""),
            ("parser", ""),
            ("data", sentence),
        ];

        let body = self
            .client
            .post(self.config.endpoint("process"))
            .form(&form)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| BionicError::analysis(format!("UDPipe request failed: {e}")))?;

        decode_process_response(&body)
    }

    fn name(&self) -> &'static str {
        "udpipe"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UdpipeConfig::default();
        assert_eq!(config.model, "chinese-gsdsimp");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(
            config.endpoint("process"),
            "https://lindat.mff.cuni.cz/services/udpipe/api/process"
        );
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let config = UdpipeConfig::new().with_url("http://localhost:8001/");
        assert_eq!(config.endpoint("models"), "http://localhost:8001/models");
    }

    #[test]
    fn test_resolve_model_prefix() {
        let models: ModelsResponse = serde_json::from_str(
            r#"{"models": {"chinese-gsdsimp-ud-2.15-241121": ["tokenizer", "tagger", "parser"],
                           "english-ewt-ud-2.15-241121": ["tokenizer"]},
                "default_model": "english-ewt-ud-2.15-241121"}"#,
        )
        .unwrap();

        assert_eq!(
            resolve_model(&models, "chinese-gsdsimp").as_deref(),
            Some("chinese-gsdsimp-ud-2.15-241121")
        );
        assert!(resolve_model(&models, "japanese").is_none());
    }

    #[test]
    fn test_decode_merges_sentences() {
        let conllu = "1\t他\t他\tPRON\t_\t_\t2\tnsubj\t_\t_\n\
2\t来\t来\tVERB\t_\t_\t0\troot\t_\t_\n\
\n\
1\t走\t走\tVERB\t_\t_\t0\troot\t_\t_\n";
        let body = serde_json::json!({ "model": "m", "result": conllu }).to_string();

        let parsed = decode_process_response(&body).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.tokens[2].head, 0);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_decode_rejects_bad_payload() {
        assert!(decode_process_response("not json").unwrap_err().is_analysis());
    }
}
