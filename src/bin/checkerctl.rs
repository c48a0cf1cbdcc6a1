use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "checkerctl")]
#[command(about = "Query the upstream health checker", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the status page of every zone
    Status,
    /// Check whether a zone has any peer up
    Zone { zone: String },
    /// List a zone's peers and their state
    Peers { zone: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_text(res).await?;
        }
        Commands::Zone { zone } => {
            let res = client.get(format!("{}/status/{}", cli.url, zone))
                .headers(headers)
                .send()
                .await?;
            // 503 carries "down", which is an answer, not an error.
            println!("{}", res.text().await?);
        }
        Commands::Peers { zone } => {
            let res = client.get(format!("{}/status/{}/peers", cli.url, zone))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
    }

    Ok(())
}

async fn print_text(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }
    print!("{}", text);
    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
