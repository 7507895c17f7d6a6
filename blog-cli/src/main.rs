use std::path::PathBuf;
use std::process::ExitCode;

use blog_client::{
    BlogClient, BlogClientError, DEFAULT_SESSION_FILE, NewPost, PostChanges, PostQuery,
    PostStatus, Session,
};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "blog-cli", about = "Command line client for the blog API")]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Where the login token is kept between runs.
    #[arg(long, default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Draft,
    Published,
}

impl From<StatusArg> for PostStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Draft => PostStatus::Draft,
            StatusArg::Published => PostStatus::Published,
        }
    }
}

#[derive(Parser, Debug)]
enum Command {
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to `--password`.
        #[arg(long)]
        password_confirmation: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Me,
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        author: String,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    Delete {
        id: i64,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = BlogClient::connect(&cli.server)?;
    let mut session = Session::load(&cli.session_file)?;

    match cli.command {
        Command::Register {
            name,
            email,
            password,
            password_confirmation,
        } => {
            let confirmation = password_confirmation.unwrap_or_else(|| password.clone());
            let user = client
                .register(&mut session, &name, &email, &password, &confirmation)
                .await?;
            session.save(&cli.session_file)?;
            println!("Registered and logged in as {user}");
        }
        Command::Login { email, password } => {
            let user = client.login(&mut session, &email, &password).await?;
            session.save(&cli.session_file)?;
            println!("Logged in as {user}");
        }
        Command::Logout => {
            let outcome = client.logout(&mut session).await;
            session.save(&cli.session_file)?;
            outcome?;
            println!("Logged out");
        }
        Command::Me => {
            let user = client.me(&session).await?;
            println!("{user}");
        }
        Command::List {
            status,
            author,
            search,
        } => {
            let query = PostQuery {
                status: status.map(Into::into),
                author,
                search,
            };
            let posts = client.list_posts(&session, &query).await?;
            println!("Posts ({})", posts.len());
            for post in posts {
                println!("- {post}");
            }
        }
        Command::Get { id } => {
            let post = client.get_post(&session, id).await?;
            println!("{post}");
            println!("created {}, updated {}", post.created_at, post.updated_at);
            println!();
            println!("{}", post.content);
        }
        Command::Create {
            title,
            content,
            author,
            status,
        } => {
            let post = client
                .create_post(
                    &session,
                    &NewPost {
                        title,
                        content,
                        author,
                        status: status.map(Into::into),
                    },
                )
                .await?;
            println!("Post created: {post}");
        }
        Command::Update {
            id,
            title,
            content,
            author,
            status,
        } => {
            let changes = PostChanges {
                title,
                content,
                author,
                status: status.map(Into::into),
            };
            if changes.is_empty() {
                anyhow::bail!("nothing to update, pass at least one of --title, --content, --author, --status");
            }
            let post = client.update_post(&session, id, &changes).await?;
            println!("Post updated: {post}");
        }
        Command::Delete { id } => {
            client.delete_post(&session, id).await?;
            println!("Post {id} deleted");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            if let Some(client_err) = err.downcast_ref::<BlogClientError>() {
                for line in client_err.field_messages() {
                    eprintln!("  {line}");
                }
                if matches!(client_err, BlogClientError::Unauthorized) {
                    eprintln!("  run `blog-cli login` first");
                }
            }
            ExitCode::FAILURE
        }
    }
}
