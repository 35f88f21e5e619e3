//! LLM arbiter adapter.
//!
//! The arbitration oracle is a capability injected by configuration:
//! potentially slow, potentially unavailable, always best-effort. The
//! production wiring shells out to a configured CLI AI tool, passing the
//! prompt on stdin; tests supply deterministic stubs.

mod parse;
mod prompts;

pub use parse::parse_arbiter_response;
pub use prompts::build_arbitration_prompt;

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use weee_types::{ArbiterError, ArbitrationRequest, ArbitrationResponse};

/// The arbitration capability: one call, one categorical answer.
#[async_trait]
pub trait Arbiter: Send + Sync {
    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationResponse, ArbiterError>;
}

/// Arbiter backed by an external command (e.g. a CLI LLM client).
///
/// The command line is split with shell-words; the prompt goes to the
/// child's stdin and the categorical answer is read from stdout. The
/// child is killed if the arbitration future is dropped, so cancelling
/// a request never leaks the process.
pub struct CommandArbiter {
    command: String,
}

impl CommandArbiter {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Arbiter for CommandArbiter {
    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationResponse, ArbiterError> {
        let prompt = build_arbitration_prompt(request);

        let argv = shell_words::split(&self.command)
            .map_err(|e| ArbiterError::Unavailable(format!("invalid arbiter command: {}", e)))?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ArbiterError::Unavailable("empty arbiter command".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ArbiterError::Unavailable(format!("failed to spawn arbiter: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| ArbiterError::Unavailable(format!("failed to send prompt: {}", e)))?;
            // Close stdin so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ArbiterError::Unavailable(format!("arbiter did not finish: {}", e)))?;

        if !output.status.success() {
            return Err(ArbiterError::Unavailable(format!(
                "arbiter command exited with {}",
                output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        parse_arbiter_response(&text)
    }
}
