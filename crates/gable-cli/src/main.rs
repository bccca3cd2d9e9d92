use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gable_common::GableConfig;
use gable_content::{plain_text, to_rich_content};
use gable_store::{ContactMessage, PostDraft, PostPatch, Supabase};
use miette::{IntoDiagnostic, Result};
use serde_json::Value;

#[derive(Parser)]
#[command(version, about = "Gable - admin tool for the blog backend", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage blog posts
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },
    /// Manage categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Normalize a local content file and print it as HTML
    Render {
        /// JSON document (any historical shape) or plain text
        file: PathBuf,
    },
    /// Send a contact-form message through the configured endpoint
    Contact {
        #[arg(long)]
        name: String,
        /// Email address or phone number
        #[arg(long)]
        contact: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Subcommand)]
enum PostCommands {
    /// List published posts, newest first
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one post
    Show {
        id: String,
        /// Print the content as HTML instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Create a published post from a content file
    Create {
        #[arg(long)]
        title: String,
        /// Content file: JSON document (any historical shape) or plain text
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        excerpt: Option<String>,
        /// Category display name
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "article")]
        kind: String,
        /// Card image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Update fields of an existing post
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<PathBuf>,
        #[arg(long)]
        excerpt: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        published: Option<bool>,
    },
    /// Delete a post
    Delete { id: String },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    List,
    /// Add a category
    Add { name: String },
    /// Rename a category
    Rename { from: String, to: String },
    /// Remove a category
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Posts { command } => posts(command).await,
        Commands::Categories { command } => categories(command).await,
        Commands::Render { file } => {
            let content = load_content(&file)?;
            print!("{}", gable_renderer::render(&content));
            Ok(())
        }
        Commands::Contact {
            name,
            contact,
            message,
        } => {
            let client = client()?;
            client
                .submit_contact(&ContactMessage {
                    name,
                    contact,
                    message,
                })
                .await?;
            println!("Message sent.");
            Ok(())
        }
    }
}

async fn posts(command: PostCommands) -> Result<()> {
    let client = client()?;
    match command {
        PostCommands::List { limit, page } => {
            let offset = limit * page.saturating_sub(1);
            let (posts, total) = client.post_previews(limit, offset).await?;
            for post in &posts {
                println!(
                    "{}  {:12}  {:10}  {}",
                    post.id, post.date, post.category, post.title
                );
            }
            println!("{} of {total} published posts", posts.len());
        }
        PostCommands::Show { id, html } => {
            let Some(post) = client.post_by_id(&id).await? else {
                return Err(miette::miette!("no published post with id {id}"));
            };
            println!("{}", post.title);
            println!("{} · {} · {}", post.date, post.category, post.read_time);
            println!();
            match (&post.content, html) {
                (Some(content), true) => print!("{}", gable_renderer::render(content)),
                (Some(content), false) => println!("{}", plain_text(content)),
                (None, _) => println!("(no content)"),
            }
        }
        PostCommands::Create {
            title,
            content,
            excerpt,
            category,
            kind,
            image,
        } => {
            let content = load_content(&content)?;
            let category_id = match category {
                Some(name) => Some(resolve_category(&client, &name).await?),
                None => None,
            };
            let post = client
                .create_post(&PostDraft {
                    title,
                    excerpt,
                    content,
                    category_id,
                    kind,
                    image,
                })
                .await?;
            println!("Created post {} ({})", post.id, post.slug);
        }
        PostCommands::Update {
            id,
            title,
            content,
            excerpt,
            category,
            kind,
            image,
            published,
        } => {
            let content = content.as_deref().map(load_content).transpose()?;
            let category_id = match category {
                Some(name) => Some(resolve_category(&client, &name).await?),
                None => None,
            };
            let post = client
                .update_post(
                    &id,
                    &PostPatch {
                        title,
                        excerpt,
                        content,
                        category_id,
                        kind,
                        image,
                        published,
                    },
                )
                .await?;
            println!("Updated post {} ({})", post.id, post.slug);
        }
        PostCommands::Delete { id } => {
            client.delete_post(&id).await?;
            println!("Deleted post {id}");
        }
    }
    Ok(())
}

async fn categories(command: CategoryCommands) -> Result<()> {
    let client = client()?;
    match command {
        CategoryCommands::List => {
            for category in client.categories().await? {
                println!("{}  {}", category.id, category.name);
            }
        }
        CategoryCommands::Add { name } => {
            let category = client.create_category(&name).await?;
            println!("Added category {} ({})", category.name, category.id);
        }
        CategoryCommands::Rename { from, to } => {
            let category = client.rename_category(&from, &to).await?;
            println!("Renamed to {} ({})", category.name, category.id);
        }
        CategoryCommands::Remove { name } => {
            client.delete_category(&name).await?;
            println!("Removed category {name}");
        }
    }
    Ok(())
}

fn client() -> Result<Supabase> {
    Ok(Supabase::new(GableConfig::from_env()?))
}

async fn resolve_category(client: &Supabase, name: &str) -> Result<String> {
    client
        .category_by_name(name)
        .await?
        .map(|c| c.id)
        .ok_or_else(|| miette::miette!("no category named {name:?}"))
}

/// Read a content file and normalize it. JSON gets coerced from whatever
/// historical shape it is in; anything that is not JSON is treated as
/// legacy plain text, one paragraph per non-empty line.
fn load_content(path: &Path) -> Result<gable_content::RichContent> {
    let raw = std::fs::read_to_string(path).into_diagnostic()?;
    Ok(to_rich_content(&Value::String(raw)))
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
