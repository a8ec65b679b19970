use octochat::{
    commands::{help_text, Command},
    config::ChatConfig,
    conversational::ChatSession,
    memory::{HistoryStore, MessageRole, PromptBuilder},
    ollama::OllamaClient,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

const ASSISTANT_NAME: &str = "OctoBlank";
const RECENT_TURNS_SHOWN: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing on stderr so the transcript owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("octochat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ChatConfig::from_env()?;

    info!("OctoBlank chat starting");
    info!("History: {}", config.history_path.display());

    let store = HistoryStore::open(&config.history_path);
    let engine = Arc::new(OllamaClient::new(&config.ollama_url, &config.model)?);
    info!("Model: {} at {}", engine.model(), config.ollama_url);
    let mut session = ChatSession::new(
        store,
        PromptBuilder::new(config.persona.clone()),
        engine,
        config.limits,
        config.generation,
    );

    println!("{} v1.2 - Advanced AI Chatbot", ASSISTANT_NAME);
    println!("{}", help_text());
    for msg in session.history().recent(RECENT_TURNS_SHOWN) {
        println!("{}", transcript_line(msg.role, &msg.content));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(line) = prompt_line(&mut lines, "> ").await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Exit => break,
            Command::Empty => continue,
            Command::DeleteAll => {
                let removed = session.delete_all();
                println!("System: All conversation history deleted ({} entries).", removed);
            }
            Command::DeleteMatching => {
                println!("{}: What do you want to delete from the memory?", ASSISTANT_NAME);
                let Some(keyword) = prompt_line(&mut lines, "keyword> ").await? else {
                    break;
                };
                let keyword = keyword.trim();
                if keyword.is_empty() {
                    println!("System: No keyword given, nothing deleted.");
                    continue;
                }
                let removed = session.delete_matching(keyword);
                println!(
                    "System: Entries containing '{}' have been deleted ({} entries).",
                    keyword, removed
                );
            }
            Command::Message(text) => {
                println!("{}", transcript_line(MessageRole::User, &text));
                let reply = session.respond(&text).await;
                println!("{}", transcript_line(MessageRole::Assistant, &reply));
            }
        }
    }

    info!("OctoBlank chat exiting");
    Ok(())
}

fn transcript_line(role: MessageRole, content: &str) -> String {
    match role {
        MessageRole::User => format!("You: {}", content),
        MessageRole::Assistant => format!("{}: {}", ASSISTANT_NAME, content),
    }
}

/// Print `prompt` and read the next line; `None` at end of input
async fn prompt_line(
    lines: &mut Lines<BufReader<Stdin>>,
    prompt: &str,
) -> std::io::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}
