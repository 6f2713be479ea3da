use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "orchestrator-cli")]
#[command(about = "Management CLI for the service orchestrator admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "ORCHESTRATOR_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall status, lifecycle phase and initialization order
    Status,
    /// Last observed health per service
    Health,
    /// Health dashboard with recovery details
    Dashboard,
    /// Comprehensive per-facade metrics
    Metrics,
    /// Run a health-check cycle now
    Check,
    /// Clear one service's facade cache
    ClearCache {
        /// Registered service name
        service: String,
    },
}

impl Commands {
    fn request(&self) -> (Method, String) {
        match self {
            Commands::Status => (Method::GET, "/admin/status".to_string()),
            Commands::Health => (Method::GET, "/admin/health".to_string()),
            Commands::Dashboard => (Method::GET, "/admin/dashboard".to_string()),
            Commands::Metrics => (Method::GET, "/admin/metrics".to_string()),
            Commands::Check => (Method::POST, "/admin/health-check".to_string()),
            Commands::ClearCache { service } => {
                (Method::POST, format!("/admin/services/{}/cache/clear", service))
            }
        }
    }
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

    let (method, path) = cli.command.request();
    let res = client
        .request(method, format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
