//! Interactive console conversation.
//!
//! Each stdin line becomes one inbound activity; the pipeline processes it
//! and queued replies are printed. State persists across turns through the
//! frame cache (and its backing store) for the lifetime of the session.

use botflow_config::Config;
use botflow_core::Activity;
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
    /// Conversation id to resume (config default if not provided)
    pub conversation: Option<String>,
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let conversation = input
            .conversation
            .unwrap_or_else(|| config.channel.default_conversation.clone());
        let processor = super::build_processor(&config);

        info!("Conversation: {conversation}");

        // Single-message mode.
        if let Some(message) = input.message {
            let report = processor
                .process_turn(
                    Activity::message(conversation.clone(), message),
                    CancellationToken::new(),
                )
                .await?;
            for reply in report.replies {
                println!("{reply}");
            }
            processor.close_conversation(&conversation);
            return Ok(());
        }

        println!("=== botflow console ({conversation}) ===");
        println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            let line = line.trim();

            if matches!(line, "exit" | "quit" | "q") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            match processor
                .process_turn(
                    Activity::message(conversation.clone(), line),
                    CancellationToken::new(),
                )
                .await
            {
                Ok(report) => {
                    for reply in report.replies {
                        println!("{reply}");
                    }
                    debug!(
                        "Turn done: outcome={:?} flushed={}",
                        report.outcome, report.flushed
                    );
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                }
            }
        }

        processor.close_conversation(&conversation);
        println!("\nSession ended.");
        Ok(())
    }
}
