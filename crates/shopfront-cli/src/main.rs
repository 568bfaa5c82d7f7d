mod account;
mod cart;
mod catalog;
mod orders;

use clap::{Parser, Subcommand};
use shopfront_client::{ApiClient, Session};
use tracing_subscriber::EnvFilter;

use crate::cart::CartCommands;
use crate::orders::{OrderCommands, OrdersCommands};

#[derive(Debug, Parser)]
#[command(name = "shopfront")]
#[command(about = "Storefront command line client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List products, newest first
    Products {
        /// Maximum number of products to return
        #[arg(long, default_value = "5")]
        limit: u32,
        /// Sort key understood by the backend
        #[arg(long, default_value = "-createdAt")]
        sort: String,
        /// Restrict to a category
        #[arg(long)]
        category: Option<String>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one product, its options, and the variant a selection resolves to
    Product {
        id: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
    },
    /// List the catalog's colors and sizes
    Options,
    /// Inspect and modify the cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Place an order
    Order {
        #[command(subcommand)]
        command: OrderCommands,
    },
    /// Browse past orders
    Orders {
        #[command(subcommand)]
        command: OrdersCommands,
    },
    /// Sign in and print the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// End the configured session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List the signed-in user's saved addresses
    Addresses,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("shopfront: no command given; run with --help for usage");
        return Ok(());
    };

    let config = shopfront_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let session = config
        .auth_token
        .as_deref()
        .map_or_else(Session::new, Session::with_token);
    let client = ApiClient::new(&config, session)?;

    match command {
        Commands::Products {
            limit,
            sort,
            category,
            search,
        } => {
            let query = shopfront_client::ProductQuery {
                limit,
                sort,
                category,
                search,
            };
            catalog::run_products(&client, &query).await?;
        }
        Commands::Product { id, color, size } => {
            catalog::run_product(&client, &id.into(), color.as_deref(), size.as_deref()).await?;
        }
        Commands::Options => catalog::run_options(&client).await?,
        Commands::Cart { command } => cart::run(&client, &config, command).await?,
        Commands::Order { command } => orders::run_order(&client, command).await?,
        Commands::Orders { command } => orders::run_orders(&client, command).await?,
        Commands::Login { email, password } => {
            account::run_login(&client, &email, &password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            phone,
        } => {
            account::run_register(&client, &name, &email, &password, phone).await?;
        }
        Commands::Logout => account::run_logout(&client).await?,
        Commands::Whoami => account::run_whoami(&client).await?,
        Commands::Addresses => account::run_addresses(&client).await?,
    }

    Ok(())
}
