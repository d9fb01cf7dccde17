use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "askgate-cli")]
#[command(about = "Command-line client for the askgate server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question
    Ask {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show the latest upstream health report
    Health,
    /// Show health, cache and session status
    Status,
    /// Print the metrics text
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    match cli.command {
        Commands::Ask { question } => {
            let res = client
                .post(format!("{}/api/ask", base))
                .headers(headers)
                .json(&json!({ "question": question.join(" ") }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/api/health", base)).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/api/status", base)).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Metrics => {
            let res = client.get(format!("{}/metrics", base)).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: server returned status {}", status);
            }
            print!("{}", text);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => eprintln!("{}", body.get("error").and_then(Value::as_str).unwrap_or(&text)),
            Err(_) => eprintln!("Response: {}", text),
        }
        std::process::exit(1);
    }

    let json: Value = serde_json::from_str(&text)?;
    match json.get("answer").and_then(Value::as_str) {
        Some(answer) => println!("{}", answer),
        None => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(())
}
