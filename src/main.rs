use anyhow::Context;
use clever_reply::{CleverbotConfig, ConversationService};
use time::UtcOffset;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONVERSATION_KEY: &str = "stdin";

fn main() -> anyhow::Result<()> {
    // Only readable while the process is still single-threaded.
    let utc_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?
        .block_on(run(utc_offset))
}

async fn run(utc_offset: UtcOffset) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clever_reply=info,cleverbot_api=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let key = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONVERSATION_KEY.to_owned());
    let config = CleverbotConfig::new().with_utc_offset(utc_offset);
    let service =
        ConversationService::with_config(config).context("failed to create HTTP client")?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                service.reset(&key).await;
                eprintln!("(conversation reset)");
            }
            "/history" => match service.conversation(&key).await {
                Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
                None => eprintln!("(no conversation yet)"),
            },
            message => match service.query(&key, message).await {
                Ok(reply) => println!("{reply}"),
                Err(error) if error.is_transient() => {
                    eprintln!("service is busy, try again later: {error}");
                }
                Err(error) => eprintln!("error: {error}"),
            },
        }
    }

    Ok(())
}
