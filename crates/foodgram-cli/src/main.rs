use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use foodgram_core::models::{NewIngredient, NewTag};
use foodgram_core::traits::CatalogStore;
use foodgram_core::validation::validate_tag;
use foodgram_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "foodgram", version, about = "Foodgram operator tools")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Connection pool size
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    max_connections: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,

    /// Load ingredients from a CSV file of `name,measurement_unit` rows
    LoadIngredients {
        /// Path to the CSV file
        path: PathBuf,

        /// Treat the first row as data instead of a header
        #[arg(long, default_value_t = false)]
        no_header: bool,
    },

    /// Create a tag
    AddTag {
        #[arg(long)]
        name: String,

        /// Hex color, e.g. "#49B64E"
        #[arg(long)]
        color: String,

        #[arg(long)]
        slug: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodgram=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect_db(cli.database_url, cli.max_connections).await?;

    match cli.command {
        Commands::Migrate => {
            // connect_db already migrated
            println!("Migrations applied.");
        }
        Commands::LoadIngredients { path, no_header } => {
            cmd_load_ingredients(&db, &path, !no_header).await?;
        }
        Commands::AddTag { name, color, slug } => {
            cmd_add_tag(&db, NewTag { name, color, slug }).await?;
        }
    }

    Ok(())
}

/// Connect to PostgreSQL and bring the schema up to date.
async fn connect_db(url: Option<String>, max_connections: u32) -> Result<Database> {
    let url = url.context("DATABASE_URL not set. Pass --database-url or set the variable.")?;
    let config = DatabaseConfig {
        url,
        max_connections,
    };

    let db = Database::connect(&config)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to connect to database")?;
    db.migrate().await.map_err(|e| anyhow::anyhow!(e))?;

    Ok(db)
}

/// Parse `name,measurement_unit` rows. Blank names are skipped.
fn read_ingredients(source: impl Read, has_headers: bool) -> Result<Vec<NewIngredient>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut ingredients = Vec::new();
    for (line, record) in reader.deserialize::<(String, String)>().enumerate() {
        let (name, measurement_unit) =
            record.with_context(|| format!("Malformed CSV record #{}", line + 1))?;
        if name.is_empty() {
            continue;
        }
        ingredients.push(NewIngredient {
            name,
            measurement_unit,
        });
    }
    Ok(ingredients)
}

async fn cmd_load_ingredients(db: &Database, path: &Path, has_headers: bool) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let ingredients = read_ingredients(file, has_headers)?;

    tracing::info!(rows = ingredients.len(), "Loading ingredients from {}", path.display());

    let catalog = db.catalog_repo();
    let mut inserted = 0usize;
    for ingredient in &ingredients {
        if catalog
            .upsert_ingredient(ingredient)
            .await
            .map_err(|e| anyhow::anyhow!(e))?
        {
            inserted += 1;
        }
    }

    println!(
        "Loaded {} ingredients ({} new, {} already present).",
        ingredients.len(),
        inserted,
        ingredients.len() - inserted
    );
    Ok(())
}

async fn cmd_add_tag(db: &Database, tag: NewTag) -> Result<()> {
    validate_tag(&tag).map_err(|e| anyhow::anyhow!(e))?;

    let created = db
        .catalog_repo()
        .create_tag(&tag)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(tag_id = created.id, slug = %created.slug, "Tag created");
    println!("Created tag #{} ({})", created.id, created.slug);
    Ok(())
}
