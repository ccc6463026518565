use super::Context;
use crate::output::{or_dash, print_json, print_table};
use anyhow::Context as _;
use clap::Subcommand;
use storefront_core::lifecycle::StoreLifecycle;
use storefront_core::types::{Currency, NewStore, StoreUpdate, StoreWithConfig};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum StoreSubcommand {
    /// List all stores with their subdomains
    List,

    /// Show one store and its config
    Show { id: String },

    /// Create a store together with its routing config
    Create {
        name: String,
        /// First host label the store is served under
        #[arg(long)]
        subdomain: String,
        /// Supported currency code, repeatable; the first is the default
        #[arg(long = "currency", value_name = "CODE")]
        currencies: Vec<String>,
        #[arg(long)]
        custom_domain: Option<String>,
        /// Theme settings as a JSON object
        #[arg(long, value_name = "JSON")]
        theme: Option<String>,
    },

    /// Change a store's name or routing config
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        subdomain: Option<String>,
        /// Custom domain; pass an empty string to clear it
        #[arg(long)]
        custom_domain: Option<String>,
        /// Theme settings as a JSON object
        #[arg(long, value_name = "JSON")]
        theme: Option<String>,
        /// Reject the update unless the config is still at this version
        #[arg(long)]
        expected_version: Option<u64>,
    },

    /// Make a store's subdomain resolve again
    Activate { id: String },

    /// Stop resolving a store's subdomain without deleting it
    Deactivate { id: String },

    /// Delete a store and its config
    Delete { id: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Context, subcmd: StoreSubcommand, json: bool) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let registry = ctx.open_registry(&config)?;

    match subcmd {
        StoreSubcommand::List => list(&registry, json),
        StoreSubcommand::Show { id } => {
            let store = registry.get(&id)?;
            show(&store, json)
        }
        StoreSubcommand::Create {
            name,
            subdomain,
            currencies,
            custom_domain,
            theme,
        } => {
            let mut input = NewStore::new(name, subdomain);
            if !currencies.is_empty() {
                input.currencies = Some(Currency::list_from_codes(currencies.as_slice()));
            }
            input.custom_domain = custom_domain;
            input.theme_settings = parse_theme(theme)?;
            let created = registry.create(input).context("failed to create store")?;
            if !json {
                println!("Created store {}", created.store.id);
            }
            show(&created, json)
        }
        StoreSubcommand::Update {
            id,
            name,
            subdomain,
            custom_domain,
            theme,
            expected_version,
        } => {
            let update = StoreUpdate {
                name,
                subdomain,
                custom_domain,
                theme_settings: parse_theme(theme)?,
                expected_version,
                ..Default::default()
            };
            let updated = registry.update(&id, update).context("failed to update store")?;
            show(&updated, json)
        }
        StoreSubcommand::Activate { id } => set_active(&registry, &id, true, json),
        StoreSubcommand::Deactivate { id } => set_active(&registry, &id, false, json),
        StoreSubcommand::Delete { id } => {
            registry
                .delete(&id)
                .with_context(|| format!("failed to delete store {id}"))?;
            if json {
                print_json(&serde_json::json!({ "success": true, "id": id }))
            } else {
                println!("Deleted store {id}");
                Ok(())
            }
        }
    }
}

fn parse_theme(raw: Option<String>) -> anyhow::Result<Option<serde_json::Value>> {
    raw.map(|s| serde_json::from_str(&s).context("--theme must be valid JSON"))
        .transpose()
}

// ---------------------------------------------------------------------------
// list / show
// ---------------------------------------------------------------------------

fn list(registry: &dyn StoreLifecycle, json: bool) -> anyhow::Result<()> {
    let stores = registry.list()?;
    if json {
        return print_json(&serde_json::json!({ "stores": stores }));
    }
    if stores.is_empty() {
        println!("No stores.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = stores
        .iter()
        .map(|s| {
            let cfg = s.config.as_ref();
            vec![
                s.store.id.clone(),
                s.store.name.clone(),
                or_dash(cfg.map(|c| c.subdomain.as_str())),
                match cfg {
                    Some(c) if c.is_active => "active".to_string(),
                    Some(_) => "inactive".to_string(),
                    None => "-".to_string(),
                },
                or_dash(
                    s.store
                        .default_currency()
                        .map(|c| c.currency_code.as_str()),
                ),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "SUBDOMAIN", "STATUS", "CURRENCY"], &rows);
    Ok(())
}

fn show(store: &StoreWithConfig, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(store);
    }

    let codes: Vec<&str> = store
        .store
        .supported_currencies
        .iter()
        .map(|c| c.currency_code.as_str())
        .collect();
    println!("ID:          {}", store.store.id);
    println!("Name:        {}", store.store.name);
    println!("Currencies:  {}", codes.join(", "));
    match &store.config {
        Some(cfg) => {
            println!("Subdomain:   {}", cfg.subdomain);
            println!("Domain:      {}", or_dash(cfg.custom_domain.as_deref()));
            println!("Active:      {}", cfg.is_active);
            println!("Version:     {}", cfg.version);
        }
        None => println!("Config:      (missing)"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// activate / deactivate
// ---------------------------------------------------------------------------

fn set_active(
    registry: &dyn StoreLifecycle,
    id: &str,
    active: bool,
    json: bool,
) -> anyhow::Result<()> {
    let update = StoreUpdate {
        is_active: Some(active),
        ..Default::default()
    };
    let updated = registry.update(id, update)?;
    if json {
        return print_json(&updated);
    }
    let state = if active { "activated" } else { "deactivated" };
    match &updated.config {
        Some(cfg) => println!("Store {id} {state} ({})", cfg.subdomain),
        None => println!("Store {id} {state}"),
    }
    Ok(())
}
