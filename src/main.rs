use clap::{Parser, Subcommand};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use nauta_connect::config::{self, Config, TimeInfo};
use nauta_connect::credentials::CredentialStore;
use nauta_connect::notify::{DesktopNotifier, Notifier};
use nauta_connect::portal::{PortalClient, SessionManager};
use nauta_connect::settings::FileSettings;

#[derive(Parser)]
#[command(name = "nauta-connect")]
#[command(about = "Captive-portal session client for the ETECSA Nauta network")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate against the portal and persist the session
    Login {
        /// Account to log in with (defaults to the configured current account)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Close the authenticated session
    Logout,
    /// Show session status and remaining quota
    Status,
    /// Tick a session timer, notifying when the quota runs out
    Watch {
        /// Log the session out when the watch is interrupted
        #[arg(long)]
        logout_on_exit: bool,
    },
    /// Query the account credit
    Credits {
        /// Account to query (defaults to the configured current account)
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Manage portal accounts stored in the OS keychain
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },
    /// Generate default config file
    Init,
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Store an account; prompts for the password
    Add { username: String },
    /// Delete an account and its stored password
    Remove { username: String },
    /// List stored accounts
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = config::config_path();
    let mut config = Config::load_or_default(&config_path)?;

    match cli.command {
        Commands::Login { user } => {
            let (username, password) = resolve_credentials(&config, user)?;
            let mut session = build_session(&config)?;

            match session.login(&username, &password).await {
                Ok(()) => {
                    println!("Connected as {}", username);
                    if config.current_user.as_deref() != Some(username.as_str()) {
                        config.current_user = Some(username.clone());
                        config.save(&config_path)?;
                    }
                }
                Err(e) => {
                    DesktopNotifier.notify("Nauta Connect", "Unable to login right now");
                    error!("Login failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Logout => {
            let mut session = build_session(&config)?;
            if !session.is_connected() {
                println!("Not connected");
                return Ok(());
            }

            match session.logout().await {
                Ok(()) => println!("Disconnected"),
                Err(e) => {
                    DesktopNotifier.notify("Nauta Connect", "Unable to logout from actual session");
                    error!("Logout failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Status => {
            let session = build_session(&config)?;
            match session.state().auth {
                Some(ref auth) => {
                    println!("Session: Connected");
                    println!("  User: {}", auth.username);
                    match session.remaining_time().await {
                        Ok(seconds) => println!("  Remaining time: {}", format_hms(seconds)),
                        Err(e) => println!("  Remaining time: not available ({})", e),
                    }
                }
                None => println!("Session: Not connected"),
            }
        }
        Commands::Watch { logout_on_exit } => {
            let mut session = build_session(&config)?;
            if !session.is_connected() {
                println!("Not connected");
                return Ok(());
            }

            // Soft-fail: a quota the portal refuses to report means "no
            // known total", not a reason to abort the watch.
            let total = match session.remaining_time().await {
                Ok(seconds) => Some(seconds),
                Err(e) => {
                    warn!("Could not fetch remaining time: {}", e);
                    None
                }
            };

            let notifier = DesktopNotifier;
            let started = Instant::now();
            let mut notified = false;
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            info!("Watching session; Ctrl-C to stop");
            loop {
                tokio::select! {
                    _ = &mut ctrl_c => break,
                    _ = ticker.tick() => {
                        let elapsed = started.elapsed().as_secs();
                        let left = total.map(|total| total.saturating_sub(elapsed));

                        if left == Some(0) && !notified && config.ui.notify_limits {
                            notifier.notify("Nauta Connect", "The connection time has finished");
                            notified = true;
                        }

                        match config.ui.time_info {
                            TimeInfo::None => {}
                            TimeInfo::Elapsed => {
                                print!("\r{}", format_hms(elapsed));
                                std::io::stdout().flush().ok();
                            }
                            TimeInfo::Remain => {
                                match left {
                                    Some(left) => print!("\r{}", format_hms(left)),
                                    None => print!("\rremaining time not available"),
                                }
                                std::io::stdout().flush().ok();
                            }
                        }
                    }
                }
            }
            println!();

            if logout_on_exit {
                match session.logout().await {
                    Ok(()) => println!("Disconnected"),
                    Err(e) => {
                        notifier.notify("Nauta Connect", "Unable to logout from actual session");
                        error!("Logout failed: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Commands::Credits { user } => {
            let (username, password) = resolve_credentials(&config, user)?;
            let session = build_session(&config)?;
            let credit = session.user_credits(&username, &password).await?;
            println!("Credit: {}", credit);
        }
        Commands::Accounts { command } => match command {
            AccountCommands::Add { username } => {
                let password = rpassword::prompt_password(format!("Password for {}: ", username))?;
                CredentialStore::new().store(&username, &password)?;

                if !config.accounts.contains(&username) {
                    config.accounts.push(username.clone());
                }
                if config.current_user.is_none() {
                    config.current_user = Some(username.clone());
                }
                config.save(&config_path)?;
                println!("Stored account {}", username);
            }
            AccountCommands::Remove { username } => {
                if let Err(e) = CredentialStore::new().remove(&username) {
                    warn!("Could not remove keychain entry: {}", e);
                }
                config.accounts.retain(|account| account != &username);
                if config.current_user.as_deref() == Some(username.as_str()) {
                    config.current_user = None;
                }
                config.save(&config_path)?;
                println!("Removed account {}", username);
            }
            AccountCommands::List => {
                if config.accounts.is_empty() {
                    println!("No accounts stored; add one with `nauta-connect accounts add <username>`");
                }
                for account in &config.accounts {
                    let marker = if config.current_user.as_deref() == Some(account.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}", marker, account);
                }
            }
        },
        Commands::Init => {
            let defaults = Config::default();
            defaults.save(&config_path)?;
            println!("Created default config: {}", config_path.display());
        }
    }

    Ok(())
}

/// Build a session manager with persisted state and a cookie-carrying client
fn build_session(
    config: &Config,
) -> Result<SessionManager<PortalClient, FileSettings>, Box<dyn std::error::Error>> {
    let transport = PortalClient::new(Duration::from_secs(config.portal.timeout_secs))?;
    let store = FileSettings::open(config::session_path())?;
    Ok(SessionManager::from_settings(
        transport,
        &config.portal.url,
        store,
    )?)
}

/// Pick the account to use and fetch its password, prompting when the
/// keychain has none
fn resolve_credentials(
    config: &Config,
    user: Option<String>,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let username = user
        .or_else(|| config.current_user.clone())
        .ok_or("No account selected; pass --user or add one with `accounts add`")?;

    let password = match CredentialStore::new().password(&username) {
        Ok(password) => password,
        Err(e) => {
            debug!("No stored password for {}: {}", username, e);
            rpassword::prompt_password(format!("Password for {}: ", username))?
        }
    };

    Ok((username, password))
}

fn format_hms(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}
