//! `portal` CLI — terminal front end for the agency portal.
//!
//! Signs into the primary backend, logs into client sites' admin panels and
//! manages the user's websites. Tokens persist between runs in a redb file.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use portal_core::types::{SectionValue, TimeRange, WebsiteSection, WebsiteStatus};
use portal_core::{ClientCredentials, Navigation, Portal, PortalConfig, RecordingNavigator};
use portal_storage::RedbBackend;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "portal",
    version,
    about = "Portal CLI — sign in, switch into client sites and manage websites",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         PORTAL_API_URL        Primary backend API (default: http://localhost:8000/api)\n  \
         PORTAL_PAGE_ORIGIN    Origin the portal is served from\n  \
         PORTAL_STORAGE_PATH   Token store file (default: ~/.portal/tokens.redb)\n  \
         PORTAL_SITES_FILE     JSON catalog replacing the built-in client sites\n  \
         PORTAL_PASSWORD       Password for login commands\n  \
         PORTAL_LOG_LEVEL      Log filter when RUST_LOG is unset (default: warn)\n\n\
         {DIM}Examples:{RESET}\n  \
         portal login --email ana@example.com\n  \
         portal client login --domain artisancrafts.al --username admin\n  \
         portal section 1 4 --set title='Handmade in Albania' --set visible=true"
    ),
)]
struct Cli {
    /// Primary backend API base URL.
    #[arg(long, env = "PORTAL_API_URL", global = true)]
    api_url: Option<String>,

    /// Origin the portal is served from.
    #[arg(long, env = "PORTAL_PAGE_ORIGIN", global = true)]
    page_origin: Option<String>,

    /// Token store file.
    #[arg(long, env = "PORTAL_STORAGE_PATH", global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign into the primary backend.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in.
    Signup {
        /// Full name; the first word becomes the first name.
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out of the primary backend.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List the client sites you can log into.
    Sites,
    /// Client-site sessions.
    Client {
        #[command(subcommand)]
        action: ClientCommands,
    },
    /// Show the dashboard summary.
    Dashboard,
    /// List your websites.
    Websites,
    /// List the sections of a website.
    Sections {
        /// Website ID.
        website: i64,
    },
    /// Show a section, or edit its content with --set.
    Section {
        /// Website ID.
        website: i64,
        /// Section ID.
        section: i64,
        /// Content value to change, e.g. `title=Welcome` or `visible=false`.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Show traffic analytics for a website.
    Analytics {
        /// Website ID.
        website: i64,
        /// week, month or year.
        #[arg(long, default_value = "month")]
        range: TimeRange,
    },
    /// Account settings.
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Log into a client site's admin panel.
    Login {
        /// Site domain exactly as listed by `portal sites`.
        #[arg(long)]
        domain: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the token for a client site.
    Logout {
        #[arg(long)]
        domain: String,
    },
    /// Show which client sites you are signed into.
    Status,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show account settings.
    Show,
    /// Change account settings. Unset options keep their value.
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        email_notifications: Option<bool>,
        #[arg(long)]
        marketing_emails: Option<bool>,
    },
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn status_badge(status: WebsiteStatus) -> String {
    let color = match status {
        WebsiteStatus::Live => GREEN,
        WebsiteStatus::Development => CYAN,
        WebsiteStatus::Maintenance => YELLOW,
        WebsiteStatus::Offline => RED,
    };
    format!("{color}{status}{RESET}")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn print_section(section: &WebsiteSection) {
    header("🧩", &format!("{} ({})", section.name, section.key));
    if section.content.is_empty() {
        println!("  {DIM}(no content){RESET}");
    }
    for (key, value) in &section.content {
        kv_line(key, &value.to_string());
    }
}

// ── Startup ──────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(std::env::var("PORTAL_LOG_LEVEL").unwrap_or_else(|_| "warn".to_owned()))
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(
    api_url: Option<String>,
    page_origin: Option<String>,
    storage: Option<PathBuf>,
) -> PortalConfig {
    let mut config = PortalConfig::from_env();
    if let Some(url) = api_url {
        config.api_url = url.trim_end_matches('/').to_owned();
    }
    if let Some(origin) = page_origin {
        config.page_origin = origin.trim_end_matches('/').to_owned();
    }
    if storage.is_some() {
        config.storage_path = storage;
    }
    config
}

fn open_portal(config: PortalConfig, navigator: &RecordingNavigator) -> Result<Portal> {
    let path = config
        .storage_path
        .clone()
        .context("no token store location, set --storage, PORTAL_STORAGE_PATH or HOME")?;
    debug!(storage = %path.display(), api_url = %config.api_url, "opening portal");
    let storage = RedbBackend::open(&path)
        .with_context(|| format!("failed to open token store at {}", path.display()))?;
    Portal::builder()
        .storage(Arc::new(storage))
        .config(config)
        .navigator(Arc::new(navigator.clone()))
        .build()
        .context("failed to initialize portal")
}

fn require_password(password: Option<String>) -> Result<String> {
    password
        .filter(|p| !p.is_empty())
        .context("a password is required, pass --password or set PORTAL_PASSWORD")
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.api_url, cli.page_origin, cli.storage);
    let client_login_page = config.client_login_page.clone();
    let navigator = RecordingNavigator::new();

    let result = match open_portal(config, &navigator) {
        Ok(portal) => run(&portal, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            if let Some(Navigation::FullPage(target)) = navigator.last() {
                let next = if target == client_login_page {
                    "portal client login --domain <site>"
                } else {
                    "portal login --email <email>"
                };
                eprintln!("  {DIM}You have been signed out. Run `{next}` to continue.{RESET}");
            }
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(portal: &Portal, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Login { email, password } => cmd_login(portal, &email, password).await,
        Commands::Signup {
            name,
            email,
            password,
        } => cmd_signup(portal, &name, &email, password).await,
        Commands::Logout => cmd_logout(portal).await,
        Commands::Whoami => cmd_whoami(portal).await,
        Commands::Sites => {
            cmd_sites(portal);
            Ok(())
        }
        Commands::Client { action } => cmd_client(portal, action).await,
        Commands::Dashboard => cmd_dashboard(portal).await,
        Commands::Websites => cmd_websites(portal).await,
        Commands::Sections { website } => cmd_sections(portal, website).await,
        Commands::Section {
            website,
            section,
            set,
        } => cmd_section(portal, website, section, &set).await,
        Commands::Analytics { website, range } => cmd_analytics(portal, website, range).await,
        Commands::Settings { action } => cmd_settings(portal, action).await,
    }
}

// ── Account commands ─────────────────────────────────────────────────

async fn cmd_login(portal: &Portal, email: &str, password: Option<String>) -> Result<()> {
    let password = require_password(password)?;
    let user = portal.auth().login(email, &password).await?;
    println!();
    success(&format!("Logged in as {BOLD}{}{RESET}", user.display_name()));
    println!();
    Ok(())
}

async fn cmd_signup(
    portal: &Portal,
    name: &str,
    email: &str,
    password: Option<String>,
) -> Result<()> {
    let password = require_password(password)?;
    let user = portal.auth().signup(name, email, &password).await?;
    println!();
    success(&format!("Account created for {BOLD}{}{RESET}", user.display_name()));
    println!();
    Ok(())
}

async fn cmd_logout(portal: &Portal) -> Result<()> {
    portal.auth().logout().await?;
    println!();
    success("Logged out.");
    println!();
    Ok(())
}

async fn cmd_whoami(portal: &Portal) -> Result<()> {
    let Some(user) = portal.auth().current_user().await? else {
        bail!("not logged in, run `portal login --email <email>` first");
    };
    println!();
    header("👤", "Signed in");
    kv_line("Name", &user.display_name());
    kv_line("Username", &user.username);
    kv_line("Email", &user.email);
    if let Some(role) = &user.role {
        kv_line("Role", role);
    }
    println!();
    Ok(())
}

// ── Client-site commands ─────────────────────────────────────────────

fn cmd_sites(portal: &Portal) {
    println!();
    header("🌐", "Client sites");
    for site in portal.sites().list_sites() {
        println!("  {BOLD}{:<26}{RESET} {DIM}{}{RESET}", site.name, site.domain);
    }
    println!();
}

async fn cmd_client(portal: &Portal, action: ClientCommands) -> Result<()> {
    match action {
        ClientCommands::Login {
            domain,
            username,
            password,
        } => {
            let password = require_password(password)?;
            let session = portal
                .client_auth()
                .login_to_client_site(&ClientCredentials {
                    username,
                    password,
                    domain: domain.clone(),
                })
                .await?;
            let name = portal
                .sites()
                .find_site(&domain)
                .map_or(domain.as_str(), |s| s.name.as_str());
            println!();
            success(&format!("Logged into {BOLD}{name}{RESET}"));
            match session.navigation() {
                Navigation::FullPage(url) => kv_line("Open", &url),
                Navigation::InApp(path) => kv_line("Go to", &path),
            }
            println!();
        }
        ClientCommands::Logout { domain } => {
            portal.client_auth().logout_from_client_site(&domain).await?;
            println!();
            success(&format!("Logged out of {BOLD}{domain}{RESET}"));
            println!();
        }
        ClientCommands::Status => {
            let last = portal.client_auth().last_client_domain().await?;
            println!();
            header("🔑", "Client-site sessions");
            for site in portal.sites().list_sites() {
                let signed_in = portal.tokens().has_token(Some(&site.domain)).await?;
                let state = if signed_in {
                    format!("{GREEN}signed in{RESET}")
                } else {
                    format!("{DIM}signed out{RESET}")
                };
                let marker = if last.as_deref() == Some(site.domain.as_str()) {
                    " (last used)"
                } else {
                    ""
                };
                kv_line(&site.name, &format!("{state}{DIM}{marker}{RESET}"));
            }
            let stored = portal.tokens().client_token_count().await?;
            println!();
            println!("  {DIM}{stored} client-site token(s) stored{RESET}");
            println!();
        }
    }
    Ok(())
}

// ── Website commands ─────────────────────────────────────────────────

async fn cmd_dashboard(portal: &Portal) -> Result<()> {
    let summary = portal.dashboard().summary().await?;
    println!();
    header("📊", &summary.website_name);
    kv_line("URL", &summary.website_url);
    kv_line("Status", &status_badge(summary.status));
    kv_line("Visitors", &summary.visitors.to_string());
    kv_line("Page views", &summary.page_views.to_string());
    kv_line("Avg. time", &summary.avg_time);
    kv_line("Bounce rate", &summary.bounce_rate);
    if !summary.recent_activity.is_empty() {
        println!();
        println!("  {BOLD}Recent activity{RESET}");
        for activity in &summary.recent_activity {
            println!("  {DIM}{}{RESET}  {}", activity.date, activity.description);
        }
    }
    println!();
    Ok(())
}

async fn cmd_websites(portal: &Portal) -> Result<()> {
    let websites = portal.websites().list().await?;
    println!();
    if websites.is_empty() {
        warning("No websites yet.");
        println!();
        return Ok(());
    }
    header("🗂", "Websites");
    for site in &websites {
        println!(
            "  {DIM}{:>4}{RESET}  {BOLD}{:<24}{RESET} {:<28} {}",
            site.id,
            site.name,
            site.domain,
            status_badge(site.status)
        );
    }
    println!();
    Ok(())
}

async fn cmd_sections(portal: &Portal, website: i64) -> Result<()> {
    let sections = portal.websites().sections(website).await?;
    println!();
    header("🧩", &format!("Sections of website {website}"));
    for section in &sections {
        println!(
            "  {DIM}{:>4}{RESET}  {:<16} {}",
            section.id, section.key, section.name
        );
    }
    println!();
    Ok(())
}

async fn cmd_section(portal: &Portal, website: i64, section: i64, set: &[String]) -> Result<()> {
    let service = portal.websites();
    let mut current = service.section(website, section).await?;
    if !set.is_empty() {
        for pair in set {
            let (key, raw) = pair
                .split_once('=')
                .with_context(|| format!("expected KEY=VALUE, got '{pair}'"))?;
            current
                .content
                .insert(key.to_owned(), SectionValue::parse_literal(raw));
        }
        current = service.update_section(website, section, &current).await?;
        println!();
        success(&format!("Section {BOLD}{}{RESET} updated", current.key));
    }
    println!();
    print_section(&current);
    println!();
    Ok(())
}

async fn cmd_analytics(portal: &Portal, website: i64, range: TimeRange) -> Result<()> {
    let data = portal.analytics().analytics(website, range).await?;
    println!();
    header("📈", &format!("Analytics ({})", data.time_range.as_str()));
    kv_line("Visitors", &format!("{} {DIM}{}{RESET}", data.total_visitors, data.visitors_delta));
    kv_line("Page views", &format!("{} {DIM}{}{RESET}", data.page_views, data.page_views_delta));
    kv_line(
        "Avg. session",
        &format!("{} {DIM}{}{RESET}", data.avg_session_duration, data.session_duration_delta),
    );
    kv_line("Bounce rate", &format!("{} {DIM}{}{RESET}", data.bounce_rate, data.bounce_rate_delta));
    if !data.top_pages.is_empty() {
        println!();
        println!("  {BOLD}Top pages{RESET}");
        for page in &data.top_pages {
            println!(
                "  {:<28} {:>8}  {DIM}{} · {}{RESET}",
                page.path, page.views, page.avg_time, page.bounce_rate
            );
        }
    }
    println!();
    Ok(())
}

// ── Settings commands ────────────────────────────────────────────────

async fn cmd_settings(portal: &Portal, action: SettingsCommands) -> Result<()> {
    let users = portal.users();
    let mut settings = users.get_settings().await?;
    if let SettingsCommands::Set {
        name,
        email,
        phone,
        company,
        language,
        email_notifications,
        marketing_emails,
    } = action
    {
        if let Some(v) = name {
            settings.name = v;
        }
        if let Some(v) = email {
            settings.email = v;
        }
        if let Some(v) = phone {
            settings.phone = v;
        }
        if let Some(v) = company {
            settings.company = v;
        }
        if let Some(v) = language {
            settings.language = v;
        }
        if let Some(v) = email_notifications {
            settings.email_notifications = v;
        }
        if let Some(v) = marketing_emails {
            settings.marketing_emails = v;
        }
        settings = users.update_settings(&settings).await?;
        println!();
        success("Settings saved.");
    }
    println!();
    header("⚙", "Account settings");
    kv_line("Name", &settings.name);
    kv_line("Email", &settings.email);
    kv_line("Phone", &settings.phone);
    kv_line("Company", &settings.company);
    kv_line("Language", &settings.language);
    kv_line("Email notifications", yes_no(settings.email_notifications));
    kv_line("Marketing emails", yes_no(settings.marketing_emails));
    println!();
    Ok(())
}
