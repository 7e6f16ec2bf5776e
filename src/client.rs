// Interactive terminal client for a running chat server.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

use crate::models::{ChatRequest, ChatResponse};
use crate::transcript::Transcript;

/// Talks to `POST /api/chat` on one server.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(server: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/chat", server.trim_end_matches('/')),
        })
    }

    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .context(format!("Failed to reach {}", self.endpoint))?;

        if !resp.status().is_success() {
            bail!("Failed to send message: server answered {}", resp.status());
        }
        resp.json::<ChatResponse>()
            .await
            .context("Failed to parse chat response")
    }
}

fn render_sources(out: &mut String, transcript: &Transcript, index: usize) {
    let Some(sources) = transcript.sources_for(index) else {
        return;
    };
    if transcript.is_expanded(index) {
        out.push_str(&format!("  Sources ({}):\n", sources.len()));
        for source in sources {
            out.push_str(&format!("    - {source}\n"));
        }
    } else {
        out.push_str(&format!("  Sources ({}), type /sources to show\n", sources.len()));
    }
}

/// Reads questions from stdin until EOF or `/quit`.
pub async fn run_chat(client: &ChatClient, greeting: String) -> Result<()> {
    let mut transcript = Transcript::new(greeting);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("bot> {}\n", transcript.messages()[0].content).as_bytes())
        .await?;

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let mut out = String::new();

        match line.trim() {
            "/quit" | "/exit" => break,
            "/sources" => match transcript.last_with_sources() {
                Some(index) => {
                    transcript.toggle_sources(index);
                    render_sources(&mut out, &transcript, index);
                }
                None => out.push_str("  (no sources yet)\n"),
            },
            input => {
                let Some(request) = transcript.begin_send(input) else {
                    continue;
                };
                let index = match client.send(&request).await {
                    Ok(response) => transcript.complete(response),
                    Err(e) => {
                        error!("Error sending message: {:?}", e);
                        transcript.fail()
                    }
                };
                out.push_str(&format!("bot> {}\n", transcript.messages()[index].content));
                render_sources(&mut out, &transcript, index);
            }
        }

        stdout.write_all(out.as_bytes()).await?;
    }

    info!(messages = transcript.messages().len(), "Chat session finished");
    Ok(())
}
