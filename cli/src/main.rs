mod terminal;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use chat_client::net::api::{ChatClient, ClientError};
use chat_client::state::chat::{ChatMessage, ChatState, SubmitError};
use terminal::TerminalView;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to initialize chat client: {0}")]
    Client(#[from] ClientError),
    #[error("cannot send message: {0}")]
    Submit(#[from] SubmitError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "chat-cli", about = "Terminal chat against the streaming chat proxy")]
struct Cli {
    #[arg(long, env = "CHAT_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Send one message, print the reply and exit.
    #[arg(long, short)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .init();

    let cli = Cli::parse();
    let client = ChatClient::new(&cli.base_url)?;
    let mut state = ChatState::new();
    let mut view = TerminalView::new(std::io::stdout()).echo_user(cli.message.is_some());

    match cli.message {
        Some(message) => exchange(&mut state, &client, &mut view, &message).await,
        None => run_interactive(&mut state, &client, &mut view).await,
    }
}

async fn run_interactive(
    state: &mut ChatState,
    client: &ChatClient,
    view: &mut TerminalView<std::io::Stdout>,
) -> Result<(), CliError> {
    if state.messages().is_empty() {
        view.welcome()?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        view.prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match exchange(state, client, view, &line).await {
            Ok(()) | Err(CliError::Submit(SubmitError::Blank)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// One full exchange. Returns only after `loading` has cleared.
async fn exchange(
    state: &mut ChatState,
    client: &ChatClient,
    view: &mut TerminalView<std::io::Stdout>,
    text: &str,
) -> Result<(), CliError> {
    state.submit(text, client, view).await?;
    if let Some(e) = view.take_error() {
        return Err(e.into());
    }
    if state.messages().last().is_some_and(ChatMessage::is_degraded) {
        view.degraded_notice()?;
    }
    Ok(())
}
