use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "jobs-cli")]
#[command(about = "Management CLI for the scrape job admin API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "SCRAPE_ADMIN_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List managed scrape jobs
    List,
    /// Add a job scraping an address on both collector ports
    Add { job_name: String, ip_address: String },
    /// Remove a job by name
    Remove { job_name: String },
    /// Find jobs whose targets contain an address
    Search { ip: String },
    /// Show service status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::List => client.get(format!("{}/jobs", base)).send().await?,
        Commands::Add { job_name, ip_address } => {
            client
                .post(format!("{}/jobs", base))
                .json(&json!({ "job_name": job_name, "ip_address": ip_address }))
                .send()
                .await?
        }
        Commands::Remove { job_name } => {
            let mut url = reqwest::Url::parse(base)?;
            url.path_segments_mut()
                .map_err(|_| "URL cannot be a base")?
                .pop_if_empty()
                .extend(["jobs", job_name.as_str()]);
            client.delete(url).send().await?
        }
        Commands::Search { ip } => {
            client
                .get(format!("{}/jobs/search", base))
                .query(&[("ip", ip)])
                .send()
                .await?
        }
        Commands::Status => client.get(format!("{}/status", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        eprintln!("{}", serde_json::to_string_pretty(&body)?);
        std::process::exit(1);
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
