use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Config;
use crate::logging::OperationLog;
use crate::model::{self, ModelRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub content: String,
}

pub type ModelGatewayFuture<'a> = Pin<Box<dyn Future<Output = Result<ModelResponse>> + 'a>>;

/// The seam between the chat loop and whatever actually answers prompts.
pub trait ModelGateway {
    fn query<'a>(&'a self, request: ModelRequest) -> ModelGatewayFuture<'a>;
}

type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

trait QueryBackend {
    fn query<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        request: &'a ModelRequest,
    ) -> QueryFuture<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderQueryBackend;

impl QueryBackend for ProviderQueryBackend {
    fn query<'a>(
        &'a self,
        client: &'a Client,
        cfg: &'a Config,
        request: &'a ModelRequest,
    ) -> QueryFuture<'a> {
        Box::pin(async move { model::query(client, cfg, request).await })
    }
}

/// Gateway backed by the configured provider. Failures are written to the
/// error log before being handed back to the caller.
pub struct HostModelGateway<'a, B = ProviderQueryBackend> {
    client: &'a Client,
    cfg: &'a Config,
    oplog: &'a OperationLog,
    backend: B,
}

impl<'a> HostModelGateway<'a, ProviderQueryBackend> {
    pub fn new(client: &'a Client, cfg: &'a Config, oplog: &'a OperationLog) -> Self {
        Self::with_backend(client, cfg, oplog, ProviderQueryBackend)
    }
}

impl<'a, B> HostModelGateway<'a, B> {
    fn with_backend(
        client: &'a Client,
        cfg: &'a Config,
        oplog: &'a OperationLog,
        backend: B,
    ) -> Self {
        Self {
            client,
            cfg,
            oplog,
            backend,
        }
    }
}

impl<'a, B> ModelGateway for HostModelGateway<'a, B>
where
    B: QueryBackend,
{
    fn query<'b>(&'b self, request: ModelRequest) -> ModelGatewayFuture<'b> {
        Box::pin(async move {
            match self.backend.query(self.client, self.cfg, &request).await {
                Ok(content) => Ok(ModelResponse { content }),
                Err(err) => {
                    self.oplog
                        .error(&format!("Error running Ollama query: {err:#}"));
                    Err(err.context("Error running Ollama query"))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::fs;

    use super::{HostModelGateway, ModelGateway, QueryBackend, QueryFuture};
    use crate::config::Config;
    use crate::logging::OperationLog;
    use crate::model::ModelRequest;

    #[derive(Debug)]
    enum StubOutcome {
        Ok(String),
        Err(String),
    }

    #[derive(Debug)]
    struct StubBackend {
        calls: RefCell<Vec<ModelRequest>>,
        outcome: StubOutcome,
    }

    impl StubBackend {
        fn ok(content: impl Into<String>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome: StubOutcome::Ok(content.into()),
            }
        }

        fn err(message: impl Into<String>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                outcome: StubOutcome::Err(message.into()),
            }
        }
    }

    impl QueryBackend for StubBackend {
        fn query<'a>(
            &'a self,
            _client: &'a reqwest::Client,
            _cfg: &'a Config,
            request: &'a ModelRequest,
        ) -> QueryFuture<'a> {
            self.calls.borrow_mut().push(request.clone());
            let result = match &self.outcome {
                StubOutcome::Ok(content) => Ok(content.clone()),
                StubOutcome::Err(message) => Err(anyhow!(message.clone())),
            };
            Box::pin(async move { result })
        }
    }

    fn test_config() -> Config {
        Config::from_json_str(
            r#"{"ollama-chat": {"openAICompatible": {"baseUrl": "http://localhost:11434/v1", "models": ["llama3"]}}}"#,
        )
        .expect("test config should parse")
    }

    #[tokio::test]
    async fn host_gateway_forwards_request_and_wraps_content() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let dir = tempfile::tempdir().expect("temp dir");
        let oplog = OperationLog::new(dir.path().join("p.log"), dir.path().join("e.log"));
        let gateway =
            HostModelGateway::with_backend(&client, &cfg, &oplog, StubBackend::ok("hello"));

        let response = gateway
            .query(ModelRequest::new("llama3", "hi"))
            .await
            .expect("gateway query should succeed");

        assert_eq!(response.content, "hello");
        let calls = gateway.backend.calls.borrow();
        assert_eq!(calls.as_slice(), &[ModelRequest::new("llama3", "hi")]);
        assert!(!dir.path().join("e.log").exists());
    }

    #[tokio::test]
    async fn host_gateway_logs_and_preserves_backend_errors() {
        let client = reqwest::Client::new();
        let cfg = test_config();
        let dir = tempfile::tempdir().expect("temp dir");
        let error_log = dir.path().join("e.log");
        let oplog = OperationLog::new(dir.path().join("p.log"), &error_log);
        let gateway = HostModelGateway::with_backend(
            &client,
            &cfg,
            &oplog,
            StubBackend::err("runner exploded"),
        );

        let err = gateway
            .query(ModelRequest::new("llama3", "ping"))
            .await
            .expect_err("gateway query should fail");

        let msg = format!("{err:#}");
        assert!(msg.contains("runner exploded"), "unexpected error message: {msg}");
        let logged = fs::read_to_string(&error_log).expect("error log should exist");
        assert_eq!(logged, "ERROR: Error running Ollama query: runner exploded\n");
    }
}
