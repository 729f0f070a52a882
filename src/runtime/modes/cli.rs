//! One-shot maintenance commands: migrate, bootstrap and config-gen

use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use crate::cli::Commands;
use crate::config::AppConfig;
use crate::services::{AuditService, BootstrapRequest, CreateStaffRequest, StaffService};
use crate::storage::{Role, StorageFactory};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    InputError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::InputError(msg) => format!("Input error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::SopError> for CliError {
    fn from(err: crate::errors::SopError) -> Self {
        CliError::CommandError(err.format_simple())
    }
}

/// Run a maintenance command. `serve` is handled by the caller.
pub async fn run_cli(cmd: &Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Serve => Err(CliError::CommandError(
            "serve is not a maintenance command".to_string(),
        )),
        Commands::Migrate => migrate().await,
        Commands::Bootstrap {
            name,
            name_th,
            timezone,
            admin_email,
            admin_name,
            pin,
        } => {
            let pin = match pin {
                Some(pin) => pin.clone(),
                None => prompt_pin_with_confirm()?,
            };
            bootstrap(BootstrapRequest {
                restaurant_name: name.clone(),
                restaurant_name_th: name_th.clone(),
                timezone: timezone.clone(),
                admin: CreateStaffRequest {
                    email: admin_email.clone(),
                    full_name: admin_name.clone(),
                    full_name_th: None,
                    role: Role::Admin,
                    pin,
                },
            })
            .await
        }
        Commands::ConfigGen { path, force } => config_generate(path, *force),
    }
}

async fn migrate() -> Result<(), CliError> {
    // 建立连接时即执行迁移
    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    println!(
        "Migrations applied on {} backend",
        storage.backend_name()
    );
    storage.close().await;
    Ok(())
}

async fn bootstrap(req: BootstrapRequest) -> Result<(), CliError> {
    let storage = StorageFactory::create()
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;
    let audit = Arc::new(AuditService::new(storage.clone()));
    let staff = StaffService::new(storage.clone(), audit);

    let result = staff.bootstrap(req).await;
    storage.close().await;
    let (restaurant, admin) = result?;

    println!("Restaurant created");
    println!("  id:    {}", restaurant.id);
    println!("  name:  {}", restaurant.name);
    println!("Admin account created");
    println!("  id:    {}", admin.id);
    println!("  email: {}", admin.email);
    println!("Log in with restaurant_id, email and PIN at POST /api/v1/auth/login");
    Ok(())
}

/// 交互式输入 PIN（带确认）
fn prompt_pin_with_confirm() -> Result<String, CliError> {
    if !io::stdin().is_terminal() {
        return Err(CliError::InputError(
            "No PIN provided. Use --pin or run interactively.".to_string(),
        ));
    }
    let pin = rpassword::prompt_password("Admin PIN: ")
        .map_err(|e| CliError::InputError(format!("Failed to read PIN: {}", e)))?;
    let confirm = rpassword::prompt_password("Confirm PIN: ")
        .map_err(|e| CliError::InputError(format!("Failed to read PIN: {}", e)))?;
    if pin != confirm {
        return Err(CliError::InputError("PINs do not match".to_string()));
    }
    Ok(pin)
}

fn config_generate(path: &str, force: bool) -> Result<(), CliError> {
    if !force && Path::new(path).exists() {
        print!("File already exists: {} Overwrite? [y/N] ", path);
        io::stdout()
            .flush()
            .map_err(|e| CliError::InputError(e.to_string()))?;
        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| CliError::InputError(e.to_string()))?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    AppConfig::sample()
        .save_to_file(path)
        .map_err(|e| CliError::CommandError(format!("Failed to write {}: {}", path, e)))?;
    println!("Configuration file generated: {}", path);
    println!("Set auth.jwt_secret (or SOP__AUTH__JWT_SECRET) before running in production");
    Ok(())
}
