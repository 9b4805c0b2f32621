use clap::{Parser, Subcommand};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "blog-cli")]
#[command(about = "Command-line client for the blog API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every post
    List,
    /// Show one post
    Get { id: String },
    /// Create a post from a JSON object
    Create { json: String },
    /// Apply a JSON object's fields to one post
    Update { id: String, json: String },
    /// Apply a JSON array of posts (each with `_id`) in one request
    UpdateMany { json: String },
    /// Delete one post
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let posts = format!("{}/posts", cli.url.trim_end_matches('/'));

    let request = match cli.command {
        Commands::List => client.get(&posts),
        Commands::Get { id } => client.get(format!("{}/{}", posts, id)),
        Commands::Create { json } => with_json(client.post(&posts), &json)?,
        Commands::Update { id, json } => {
            with_json(client.request(Method::PATCH, format!("{}/{}", posts, id)), &json)?
        }
        Commands::UpdateMany { json } => with_json(client.request(Method::PATCH, &posts), &json)?,
        Commands::Delete { id } => client.delete(format!("{}/{}", posts, id)),
    };

    print_response(request.send().await?).await
}

fn with_json(request: RequestBuilder, json: &str) -> Result<RequestBuilder, serde_json::Error> {
    let body: Value = serde_json::from_str(json)?;
    Ok(request.json(&body))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let pretty = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", pretty);
    } else {
        eprintln!("Error: API returned status {}", status);
        eprintln!("{}", pretty);
    }
    Ok(())
}
