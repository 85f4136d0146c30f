use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use project_feasibility::config::ModelsConfig;
use project_feasibility::ml::{FeatureEncoder, ModelRole, ModelStore};
use project_feasibility::models::ProjectInput;
use reqwest::Client;
use serde_json::json;
use std::path::PathBuf;
use strum::IntoEnumIterator;

#[derive(Parser)]
#[command(name = "feasibility-cli")]
#[command(about = "Project Feasibility CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "FEASIBILITY_ENDPOINT", default_value = "http://localhost:8000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ProjectArgs {
    /// Bridge, Building, Power Plant, Road or Water Infra
    #[arg(short = 't', long)]
    project_type: String,

    #[arg(short = 'c', long)]
    estimated_cost: f64,

    #[arg(short = 'd', long)]
    time_estimate_days: i64,

    #[arg(long)]
    resource_allocation: f64,

    #[arg(long)]
    risk_assessment: f64,

    #[arg(long)]
    environmental_impact: f64,

    /// Historical cost deviation in percent
    #[arg(long)]
    cost_deviation: f64,

    #[arg(long)]
    stakeholder_priority: f64,

    #[arg(long)]
    scope_complexity: i64,
}

impl From<ProjectArgs> for ProjectInput {
    fn from(args: ProjectArgs) -> Self {
        ProjectInput {
            project_type: args.project_type,
            estimated_cost_usd: args.estimated_cost,
            time_estimate_days: args.time_estimate_days,
            resource_allocation_score: args.resource_allocation,
            risk_assessment_score: args.risk_assessment,
            environmental_impact_score: args.environmental_impact,
            historical_cost_deviation_pct: args.cost_deviation,
            stakeholder_priority_score: args.stakeholder_priority,
            scope_complexity: args.scope_complexity,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// Run all three models on a project
    Assess(ProjectArgs),

    /// Predict feasibility only
    Feasibility(ProjectArgs),

    /// Predict cost only
    Cost(ProjectArgs),

    /// Predict duration only
    Time(ProjectArgs),

    /// List models loaded by the server
    Models,

    /// Load and validate model artifacts locally
    Inspect {
        #[arg(short, long, default_value = "models")]
        models_dir: PathBuf,
    },

    /// Print the encoded feature vectors of a project without a server
    Encode(ProjectArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Health => {
            let body = get(&client, &format!("{}/health", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Assess(args) => {
            post_project(&client, &cli.endpoint, "/v1/assessments", args).await?;
        }

        Commands::Feasibility(args) => {
            post_project(&client, &cli.endpoint, "/v1/predictions/feasibility", args).await?;
        }

        Commands::Cost(args) => {
            post_project(&client, &cli.endpoint, "/v1/predictions/cost", args).await?;
        }

        Commands::Time(args) => {
            post_project(&client, &cli.endpoint, "/v1/predictions/time", args).await?;
        }

        Commands::Models => {
            let body = get(&client, &format!("{}/v1/models", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Inspect { models_dir } => inspect(models_dir)?,

        Commands::Encode(args) => {
            let input = ProjectInput::from(args);
            let encoder = FeatureEncoder::new();

            let mut vectors = serde_json::Map::new();
            for role in ModelRole::iter() {
                let vector = encoder.encode_for(&input, role)?;
                let columns: serde_json::Map<String, serde_json::Value> = role
                    .schema()
                    .field_names()
                    .into_iter()
                    .zip(vector.values().iter().map(|v| json!(v)))
                    .collect();
                vectors.insert(role.to_string(), serde_json::Value::Object(columns));
            }
            println!("{}", serde_json::to_string_pretty(&vectors)?);
        }
    }

    Ok(())
}

async fn get(client: &Client, url: &str) -> anyhow::Result<serde_json::Value> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;
    Ok(response.json().await?)
}

async fn post_project(
    client: &Client,
    endpoint: &str,
    path: &str,
    args: ProjectArgs,
) -> anyhow::Result<()> {
    let url = format!("{}{}", endpoint, path);
    let response = client
        .post(&url)
        .json(&ProjectInput::from(args))
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        bail!("server answered {}", status);
    }
    Ok(())
}

fn inspect(models_dir: PathBuf) -> anyhow::Result<()> {
    let config = ModelsConfig {
        dir: models_dir,
        ..ModelsConfig::default()
    };
    let store = ModelStore::load(&config)
        .with_context(|| format!("cannot load models from {}", config.dir.display()))?;

    let mut report = Vec::new();
    for role in ModelRole::iter() {
        let importances = store.feature_importances(role).map(|values| {
            role.schema()
                .field_names()
                .into_iter()
                .zip(values.iter().map(|v| json!(v)))
                .collect::<serde_json::Map<String, serde_json::Value>>()
        });

        report.push(json!({
            "metadata": store.metadata(role),
            "features": role.schema().field_names(),
            "feature_importances": importances,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
