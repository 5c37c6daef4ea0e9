//! Command-based notification channels

use crate::services::{ChannelKind, NotificationChannel, ServiceError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Delivers a message by running a program with the body on stdin.
///
/// `{subject}` in any argument is replaced by the message subject. A program
/// still running after the timeout is killed and the send fails.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    name: String,
    kind: ChannelKind,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

/// Default limit for one delivery
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(120);

impl CommandChannel {
    pub fn new(
        name: impl Into<String>,
        kind: ChannelKind,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            program: program.into(),
            args,
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Primary channel mailing reports with `mail -s <subject> <recipient>`
    pub fn email(recipient: impl Into<String>) -> Self {
        Self::new(
            "email",
            ChannelKind::Primary,
            "mail",
            vec!["-s".to_string(), "{subject}".to_string(), recipient.into()],
        )
    }

    /// Secondary channel from a whitespace-separated command line
    pub fn chat(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new("chat", ChannelKind::Secondary, program, words.collect()))
    }

    /// Arguments with the subject filled in
    pub fn render_args(&self, subject: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace("{subject}", subject))
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for CommandChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), ServiceError> {
        debug!(channel = %self.name, "Sending notification: {}", subject);

        // Dropping the delivery future kills the child
        tokio::time::timeout(self.timeout, self.deliver(subject, body))
            .await
            .map_err(|_| ServiceError::Timeout {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
    }
}

impl CommandChannel {
    async fn deliver(&self, subject: &str, body: &str) -> Result<(), ServiceError> {
        let mut child = Command::new(&self.program)
            .args(self.render_args(subject))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that exits without reading its input is judged by its exit status
            if let Err(e) = stdin.write_all(body.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
            // Dropping stdin closes it so the program sees EOF
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(ServiceError::command(&self.program, &output));
        }
        Ok(())
    }
}
