use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Terminal client for the engine relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:10000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay and engine health
    Health,
    /// Send a topic to the engine through /make
    Make {
        /// Topic to generate content for
        topic: String,

        #[arg(short, long, default_value = "KR")]
        country: String,

        /// Extra parameters as a JSON object, merged into the payload
        #[arg(short, long)]
        extra: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::Make {
            topic,
            country,
            extra,
        } => {
            let mut body = Map::new();
            body.insert("topic".into(), Value::String(topic));
            body.insert("country".into(), Value::String(country));
            if let Some(extra) = extra {
                body.insert("extraJson".into(), Value::String(extra));
            }
            client
                .post(format!("{base}/make"))
                .json(&body)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    println!("STATUS {}", status.as_u16());
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
