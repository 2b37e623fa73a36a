use clap::{Parser, Subcommand};
use homework_helper::chat::ChatSession;
use homework_helper::client::ApiClient;
use homework_helper::config::Config;
use homework_helper::server::{self, AppContext};
use homework_helper::store::{FileStore, SessionStore};
use homework_helper::tutor::LearningContext;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// AI homework helper: progress ledger backend and terminal chat client
#[derive(Parser, Debug)]
#[command(name = "homework-helper", version, about)]
struct Args {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the HTTP backend
    Serve {
        /// TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overrides the config
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Chat with the homework helper from the terminal
    Chat {
        /// Backend base URL
        #[arg(short, long, default_value = "http://127.0.0.1:3001")]
        server: String,

        /// Directory for the local session state
        #[arg(short, long, default_value = ".homework-helper")]
        data_dir: PathBuf,

        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Create the account instead of logging in
        #[arg(long)]
        register: bool,

        #[arg(long, default_value = "")]
        school: String,

        #[arg(long, default_value = "")]
        grade: String,

        #[arg(long, default_value = "")]
        semester: String,

        #[arg(long, default_value = "")]
        unit: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    match Args::parse().command {
        Mode::Serve { config, bind } => {
            let mut config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            }
            .with_env();
            if let Some(bind) = bind {
                config.server.bind = bind;
            }

            info!(bind = %config.server.bind, model = %config.llm.model, "homework helper starting");
            server::run(AppContext::from_config(config)?).await?;
        }
        Mode::Chat {
            server,
            data_dir,
            username,
            password,
            register,
            school,
            grade,
            semester,
            unit,
        } => {
            let client = ApiClient::new(&server)?;
            let auth = if register {
                client.register(&username, &password).await?
            } else {
                client.login(&username, &password).await?
            };

            let mut store = SessionStore::open(Box::new(FileStore::open(&data_dir)?));
            store.sign_in(&auth.token, auth.user)?;

            let mut chat = ChatSession::new(Arc::new(client), store);
            chat.set_context(LearningContext {
                school,
                grade,
                semester,
                unit,
            });
            run_chat(&mut chat).await?;
        }
    }

    Ok(())
}

async fn run_chat(chat: &mut ChatSession) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("{}", chat.greeting());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match chat.handle(&line).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "could not save session state");
                continue;
            }
        };
        for message in &reply.messages {
            println!("{message}");
        }
        if reply.session_ended {
            break;
        }
    }

    info!("chat session closed");
    Ok(())
}
