use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use foodgram::auth::PasswordHasher;
use foodgram::config::{FileConfig, ServerConfig};
use foodgram::server::validation::{
    validate_email, validate_tag_color, validate_tag_name, validate_tag_slug, validate_username,
};
use foodgram::server::{AppState, create_router};
use foodgram::store::{SqliteStore, Store};
use foodgram::types::NewUser;

const DB_FILE: &str = "foodgram.db";

#[derive(Parser)]
#[command(name = "foodgram")]
#[command(about = "A recipe sharing server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Create a user account
    CreateUser {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Fail instead of prompting for missing fields
        #[arg(long)]
        non_interactive: bool,
    },

    /// Delete a user account with its recipes, token, marks and subscriptions
    DeleteUser {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of the account to delete
        #[arg(long)]
        email: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,

        /// Fail instead of prompting for confirmation
        #[arg(long)]
        non_interactive: bool,
    },

    /// Create a recipe tag
    CreateTag {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        #[arg(long)]
        name: String,

        /// Color in #RRGGBB form, upper case
        #[arg(long)]
        color: String,

        #[arg(long)]
        slug: String,
    },

    /// Load ingredients from a JSON array of {name, measurement_unit}
    LoadIngredients {
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Path to the JSON file
        file: PathBuf,
    },

    /// Start the server
    Serve {
        /// TOML configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Default page size for list endpoints
        #[arg(long)]
        page_size: Option<i64>,
    },
}

#[derive(Debug, Deserialize)]
struct IngredientSeed {
    name: String,
    measurement_unit: String,
}

fn open_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    let db_path = data_dir.join(DB_FILE);
    if !db_path.exists() {
        bail!("Database not found at {}. Run 'foodgram init' first.", db_path.display());
    }
    Ok(SqliteStore::new(&db_path)?)
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let data_path: PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join(DB_FILE);
    let existed = db_path.exists();

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    if existed {
        println!("Database already initialized at {}", db_path.display());
    } else {
        println!("Initialized database at {}", db_path.display());
    }

    Ok(())
}

fn prompt_text(
    label: &str,
    value: Option<String>,
    non_interactive: bool,
    validate: fn(&str) -> Result<(), String>,
) -> anyhow::Result<String> {
    if let Some(value) = value {
        validate(&value).map_err(anyhow::Error::msg)?;
        return Ok(value);
    }

    if non_interactive {
        bail!("--{} is required in non-interactive mode", label.replace(' ', "-"));
    }

    let answer = inquire::Text::new(&format!("{label}:"))
        .with_validator(move |input: &str| match validate(input) {
            Ok(()) => Ok(inquire::validator::Validation::Valid),
            Err(message) => Ok(inquire::validator::Validation::Invalid(message.into())),
        })
        .prompt()?;

    Ok(answer)
}

fn not_blank(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        Err("value cannot be empty".to_string())
    } else {
        Ok(())
    }
}

struct UserArgs {
    email: Option<String>,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
}

fn run_create_user(data_dir: String, args: UserArgs, non_interactive: bool) -> anyhow::Result<()> {
    let store = open_store(Path::new(&data_dir))?;

    let email = prompt_text("email", args.email, non_interactive, validate_email)?;
    let username = prompt_text("username", args.username, non_interactive, validate_username)?;
    let first_name = prompt_text("first name", args.first_name, non_interactive, not_blank)?;
    let last_name = prompt_text("last name", args.last_name, non_interactive, not_blank)?;

    let password = match args.password {
        Some(password) => password,
        None if non_interactive => bail!("--password is required in non-interactive mode"),
        None => inquire::Password::new("Password:").prompt()?,
    };
    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    let password_hash = PasswordHasher::new().hash(&password)?;

    let user = store
        .create_user(&NewUser {
            email,
            username,
            first_name,
            last_name,
            password_hash,
        })
        .context("Failed to create user (email or username may already be taken)")?;

    println!("Created user '{}' with id {}", user.username, user.id);
    Ok(())
}

/// Request confirmation for a destructive operation
fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message).with_default(false).prompt()?)
    }
}

fn run_delete_user(
    data_dir: String,
    email: String,
    yes: bool,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let store = open_store(Path::new(&data_dir))?;
    let user = store
        .get_user_by_email(&email)?
        .with_context(|| format!("No user with email '{email}'"))?;

    let message = format!("Delete user '{}' and all of their recipes?", user.username);
    if !confirm_action(&message, yes, non_interactive)? {
        println!("Cancelled");
        return Ok(());
    }

    store.delete_user(user.id)?;
    info!(user_id = user.id, "user deleted");
    println!("Deleted user '{}'", user.username);
    Ok(())
}

fn run_create_tag(data_dir: String, name: String, color: String, slug: String) -> anyhow::Result<()> {
    validate_tag_name(&name).map_err(anyhow::Error::msg)?;
    validate_tag_color(&color).map_err(anyhow::Error::msg)?;
    validate_tag_slug(&slug).map_err(anyhow::Error::msg)?;

    let store = open_store(Path::new(&data_dir))?;
    let tag = store
        .create_tag(&name, &color, &slug)
        .context("Failed to create tag (name, color and slug must be unique)")?;

    println!("Created tag '{}' with id {}", tag.slug, tag.id);
    Ok(())
}

fn run_load_ingredients(data_dir: String, file: PathBuf) -> anyhow::Result<()> {
    let content = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let seeds: Vec<IngredientSeed> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let store = open_store(Path::new(&data_dir))?;
    for seed in &seeds {
        if seed.name.trim().is_empty() || seed.measurement_unit.trim().is_empty() {
            bail!("Ingredient entries need a name and a measurement_unit");
        }
        store.create_ingredient(seed.name.trim(), seed.measurement_unit.trim())?;
    }

    println!("Loaded {} ingredients", seeds.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("foodgram=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => run_init(data_dir)?,
        Commands::CreateUser {
            data_dir,
            email,
            username,
            first_name,
            last_name,
            password,
            non_interactive,
        } => {
            let args = UserArgs {
                email,
                username,
                first_name,
                last_name,
                password,
            };
            run_create_user(data_dir, args, non_interactive)?;
        }
        Commands::DeleteUser {
            data_dir,
            email,
            yes,
            non_interactive,
        } => run_delete_user(data_dir, email, yes, non_interactive)?,
        Commands::CreateTag {
            data_dir,
            name,
            color,
            slug,
        } => run_create_tag(data_dir, name, color, slug)?,
        Commands::LoadIngredients { data_dir, file } => run_load_ingredients(data_dir, file)?,
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            page_size,
        } => {
            let mut file = match config {
                Some(path) => FileConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => FileConfig::default(),
            };
            file.host = host.or(file.host);
            file.port = port.or(file.port);
            file.data_dir = data_dir.or(file.data_dir);
            file.page_size = page_size.or(file.page_size);

            let config = ServerConfig::from_file(file)?;

            let store = open_store(&config.data_dir)?;
            store.initialize()?;

            let state = Arc::new(AppState::new(Arc::new(store), config.page_size));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
