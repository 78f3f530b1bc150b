use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "directory-cli")]
#[command(about = "Command line client for the directory gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8111")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every employee
    List,
    /// Show one employee by id
    Get { id: String },
    /// Find employees whose name contains the fragment
    Search { fragment: String },
    /// Print the highest salary
    HighestSalary,
    /// Print the ten best paid employee names
    TopEarners,
    /// Create an employee
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        salary: u64,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        title: String,
    },
    /// Delete an employee by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/api/employees", cli.url.trim_end_matches('/'));

    let request = match cli.command {
        Commands::List => client.get(&base),
        Commands::Get { id } => client.get(format!("{base}/{id}")),
        Commands::Search { fragment } => client.get(format!("{base}/search/{fragment}")),
        Commands::HighestSalary => client.get(format!("{base}/highestSalary")),
        Commands::TopEarners => client.get(format!("{base}/topTenHighestEarningEmployeeNames")),
        Commands::Create {
            name,
            salary,
            age,
            title,
        } => client
            .post(&base)
            .json(&json!({ "name": name, "salary": salary, "age": age, "title": title })),
        Commands::Delete { id } => client.delete(format!("{base}/{id}")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
