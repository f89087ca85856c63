//! Line-protocol HTTP sink (blocking `ureq` agent).
//!
//! Posts each batch to `http://{host}/api/v2/write?bucket={bucket}&precision=s`.
//! The agent timeout bounds how long one post can hold up the executor.

use std::time::Duration;

use log::debug;
use ureq::Agent;

use crate::app::ports::TelemetrySink;
use crate::config::TelemetryConfig;
use crate::error::SinkError;

pub struct HttpLineSink {
    agent: Agent,
    url: String,
}

impl HttpLineSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: url.into(),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            config.write_url(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TelemetrySink for HttpLineSink {
    fn post(&mut self, payload: &str) -> Result<(), SinkError> {
        match self
            .agent
            .post(&self.url)
            .set("Content-Type", "text/plain; charset=utf-8")
            .send_string(payload)
        {
            Ok(resp) => {
                debug!("POST {} -> {}", self.url, resp.status());
                Ok(())
            }
            Err(ureq::Error::Status(code, _)) => Err(SinkError::Rejected(code)),
            Err(ureq::Error::Transport(t)) => {
                debug!("POST {} failed: {}", self.url, t);
                Err(SinkError::Unreachable)
            }
        }
    }
}
