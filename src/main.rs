use std::io::Write;

use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use skald::{
    CancellationToken, ChatParams, ClientConfig, EventStream, GenerateParams, RagConfig,
    SearchRequest, SkaldClient,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const USAGE: &str = "\
Usage: skald [OPTIONS] <QUERY>...

Streams an answer from your Skald knowledge base.

Options:
  --generate         Generate a document instead of chatting
  --search           Print search results instead of chatting
  --chat-id <ID>     Continue an earlier chat
  --version          Print version
  -h, --help         Print help

Environment:
  SKALD_API_KEY      API key (required)
  SKALD_BASE_URL     API base URL (default: https://api.useskald.com)
  RUST_LOG           Log filter (default: skald=info)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Chat,
    Generate,
    Search,
}

#[derive(Debug)]
struct Args {
    mode: Mode,
    chat_id: Option<String>,
    query: String,
}

fn parse_args() -> Result<Option<Args>> {
    let mut mode = Mode::Chat;
    let mut chat_id = None;
    let mut words = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" => {
                println!("skald {}", VERSION);
                return Ok(None);
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(None);
            }
            "--generate" => mode = Mode::Generate,
            "--search" => mode = Mode::Search,
            "--chat-id" => match args.next() {
                Some(id) => chat_id = Some(id),
                None => bail!("--chat-id needs a value"),
            },
            _ => words.push(arg),
        }
    }

    if words.is_empty() {
        bail!("no query given\n\n{}", USAGE);
    }

    Ok(Some(Args {
        mode,
        chat_id,
        query: words.join(" "),
    }))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skald=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Print tokens as they arrive, then the references footer.
async fn print_stream(mut stream: EventStream) -> Result<()> {
    let mut stdout = std::io::stdout();
    let mut references = skald::References::new();
    let mut chat_id = None;

    while let Some(event) = stream.next_event().await {
        if event.is_token() {
            write!(stdout, "{}", event.text())?;
            stdout.flush()?;
        }
        if event.chat_id.is_some() {
            chat_id = event.chat_id;
        }
        references.extend(event.references);
    }
    writeln!(stdout)?;

    stream.finish().await.wrap_err("stream failed")?;

    if !references.is_empty() {
        writeln!(stdout, "\nReferences:")?;
        for (number, reference) in &references {
            writeln!(
                stdout,
                "  [{}] {} ({})",
                number, reference.memo_title, reference.memo_uuid
            )?;
        }
    }
    if let Some(chat_id) = chat_id {
        writeln!(stdout, "\nchat id: {}", chat_id)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    init_tracing();

    let config = ClientConfig::from_env().wrap_err("failed to load configuration")?;
    let client = SkaldClient::new(config)?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    match args.mode {
        Mode::Chat => {
            let mut params =
                ChatParams::new(args.query).with_rag_config(RagConfig::with_references());
            if let Some(chat_id) = args.chat_id {
                params = params.with_chat_id(chat_id);
            }
            print_stream(client.streamed_chat(params, &cancel)).await
        }
        Mode::Generate => {
            let params =
                GenerateParams::new(args.query).with_rag_config(RagConfig::with_references());
            print_stream(client.streamed_generate_doc(params, &cancel)).await
        }
        Mode::Search => {
            let response = client.search(SearchRequest::new(args.query)).await?;
            for result in response.results {
                println!("{}  {}", result.memo_uuid, result.memo_title);
                if !result.content_snippet.is_empty() {
                    println!("    {}", result.content_snippet);
                }
            }
            Ok(())
        }
    }
}
