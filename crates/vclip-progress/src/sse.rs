//! Server-Sent Events transport.

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Response};
use tracing::{debug, warn};

use vclip_models::JobId;

use crate::config::ProgressClientConfig;
use crate::error::{ProgressError, ProgressResult};
use crate::source::{EventStream, ProgressSource, TransportEvent};

/// Incremental parser for `text/event-stream` bodies.
///
/// Bytes are buffered until a line terminator (`\n`, `\r\n` or `\r`), so
/// chunk boundaries may fall anywhere, including inside a UTF-8 sequence.
/// Only unnamed and `message` events are emitted; `id` and `retry` fields
/// are ignored.
#[derive(Debug, Default)]
pub struct SseParser {
    line: Vec<u8>,
    data: String,
    event_type: String,
    after_cr: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the data of every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();

        for &byte in chunk {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\n' => self.end_line(&mut events),
                b'\r' => {
                    self.end_line(&mut events);
                    self.after_cr = true;
                }
                _ => self.line.push(byte),
            }
        }

        events
    }

    fn end_line(&mut self, events: &mut Vec<String>) {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();

        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event_type = value.to_string(),
            _ => {}
        }
    }

    fn dispatch(&mut self, events: &mut Vec<String>) {
        let event_type = std::mem::take(&mut self.event_type);
        let mut data = std::mem::take(&mut self.data);
        if data.is_empty() {
            return;
        }
        data.pop();

        if event_type.is_empty() || event_type == "message" {
            events.push(data);
        } else {
            debug!("Ignoring SSE event of type {:?}", event_type);
        }
    }
}

/// Progress source backed by the backend's SSE endpoint.
#[derive(Debug, Clone)]
pub struct SseSource {
    http: Client,
    config: ProgressClientConfig,
}

impl SseSource {
    /// Create a new SSE source.
    pub fn new(config: ProgressClientConfig) -> ProgressResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ProgressError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProgressResult<Self> {
        Self::new(ProgressClientConfig::from_env())
    }

    pub fn config(&self) -> &ProgressClientConfig {
        &self.config
    }
}

impl ProgressSource for SseSource {
    fn connect(&self, job_id: JobId) -> EventStream {
        let url = self.config.endpoint(job_id);
        let request = self
            .http
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        let stream = futures_util::stream::once(async move {
            debug!("Opening progress stream {}", url);

            match request.send().await.and_then(Response::error_for_status) {
                Ok(response) => decode_body(response),
                Err(e) => {
                    warn!("Progress stream for job {} failed to open: {}", job_id, e);
                    futures_util::stream::iter([TransportEvent::Error(e.to_string())]).boxed()
                }
            }
        })
        .flatten();

        Box::pin(stream)
    }
}

fn decode_body(response: Response) -> EventStream {
    let mut parser = SseParser::new();

    response
        .bytes_stream()
        .flat_map(move |chunk| {
            let events: Vec<TransportEvent> = match chunk {
                Ok(bytes) => parser
                    .feed(&bytes)
                    .into_iter()
                    .map(TransportEvent::Message)
                    .collect(),
                Err(e) => vec![TransportEvent::Error(e.to_string())],
            };
            futures_util::stream::iter(events)
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parser_single_event() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: {\"progress\":1,\"status\":\"processing\"}\n\n");
        assert_eq!(events, vec!["{\"progress\":1,\"status\":\"processing\"}"]);
    }

    #[test]
    fn test_parser_multiline_data() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: first\ndata:second\n\n");
        assert_eq!(events, vec!["first\nsecond"]);
    }

    #[test]
    fn test_parser_split_across_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: {\"progr").is_empty());
        assert!(parser.feed(b"ess\":5}\r").is_empty());
        assert!(parser.feed(b"\n").is_empty());
        assert_eq!(parser.feed(b"\r\n"), vec!["{\"progress\":5}"]);
    }

    #[test]
    fn test_parser_split_utf8() {
        let mut parser = SseParser::new();
        let bytes = "data: é\n\n".as_bytes();
        assert!(parser.feed(&bytes[..7]).is_empty());
        assert_eq!(parser.feed(&bytes[7..]), vec!["é"]);
    }

    #[test]
    fn test_parser_ignores_comments_and_named_events() {
        let mut parser = SseParser::new();
        let events = parser.feed(
            b": keep-alive\n\nevent: ping\ndata: x\n\nid: 3\nretry: 1000\nevent: message\ndata: y\n\n",
        );
        assert_eq!(events, vec!["y"]);
    }

    #[test]
    fn test_parser_blank_lines_without_data() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"\n\n\n").is_empty());
        assert_eq!(parser.feed(b"data:\n\n"), vec![""]);
    }

    fn config_for(server: &MockServer) -> ProgressClientConfig {
        ProgressClientConfig {
            base_url: server.uri(),
            progress_path: "/api/jobs/{job_id}/progress".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sse_source_streams_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/7/progress"))
            .and(header("accept", "text/event-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(
                        "data: {\"progress\":10,\"status\":\"processing\"}\n\n\
                         : heartbeat\n\n\
                         data: {\"progress\":100,\"status\":\"completed\"}\n\n",
                    ),
            )
            .mount(&server)
            .await;

        let source = tokio_test::assert_ok!(SseSource::new(config_for(&server)));
        let events: Vec<_> = source.connect(JobId::new(7)).collect().await;

        assert_eq!(
            events,
            vec![
                TransportEvent::Message("{\"progress\":10,\"status\":\"processing\"}".into()),
                TransportEvent::Message("{\"progress\":100,\"status\":\"completed\"}".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_sse_source_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = SseSource::new(config_for(&server)).unwrap();
        let events: Vec<_> = source.connect(JobId::new(8)).collect().await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], TransportEvent::Error(msg) if msg.contains("404")));
    }

    #[test]
    fn test_sse_source_rejects_invalid_config() {
        let config = ProgressClientConfig {
            progress_path: "/progress".to_string(),
            ..Default::default()
        };
        tokio_test::assert_err!(SseSource::new(config));
    }
}
