use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cfzones::batch::{self, DomainReport, EditRequest, SettingChanges};
use cfzones::config::{FailurePolicy, Settings, DEFAULT_CONFIG_FILE};
use cfzones::dns::{create_provider, DnsProvider, Toggle};
use cfzones::{domains, secrets};

#[derive(Parser)]
#[command(name = "cfzones")]
#[command(about = "Bulk Cloudflare onboarding - creates zones, A records and HTTPS settings from a domain list")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Stop the whole batch at the first domain that fails
    #[arg(long, global = true)]
    fail_fast: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create zones and proxied A records for every domain in the list
    Add {
        /// IP address the A records point to
        #[arg(short, long)]
        ip: Option<Ipv4Addr>,
    },

    /// Change HTTPS settings and optionally replace the A record
    Edit {
        /// Domain to edit; '*' or omitted edits every domain in the list
        #[arg(short, long)]
        domain: Option<String>,

        /// IP address for the replacement A record
        #[arg(short, long)]
        ip: Option<Ipv4Addr>,

        #[command(flatten)]
        https: HttpsArgs,

        /// Replace the A record with a proxied one (Y/N)
        #[arg(short = 'x', long, action = ArgAction::Set, value_parser = parse_yes_no, default_value = "N")]
        proxied: bool,
    },

    /// Change HTTPS settings of a single domain
    Settings {
        /// Domain to change
        #[arg(short, long)]
        domain: String,

        #[command(flatten)]
        https: HttpsArgs,
    },

    /// Store the Cloudflare API token in the credentials file
    SetToken,

    /// Show configuration file location and contents
    Config,
}

#[derive(Args)]
struct HttpsArgs {
    /// Automatic HTTPS Rewrites: -1 leaves it unchanged, 0 off, 1 on
    #[arg(long, value_parser = parse_setting_flag, default_value = "-1", allow_hyphen_values = true)]
    arhttps: SettingFlag,

    /// Always Use HTTPS: -1 leaves it unchanged, 0 off, 1 on
    #[arg(long, value_parser = parse_setting_flag, default_value = "-1", allow_hyphen_values = true)]
    auhttps: SettingFlag,
}

impl HttpsArgs {
    fn changes(&self) -> SettingChanges {
        SettingChanges {
            automatic_https_rewrites: self.arhttps.0,
            always_use_https: self.auhttps.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SettingFlag(Option<Toggle>);

fn parse_setting_flag(s: &str) -> Result<SettingFlag, String> {
    match s.trim() {
        "-1" | "unset" => Ok(SettingFlag(None)),
        other => other.parse::<Toggle>().map(|t| SettingFlag(Some(t))),
    }
}

fn parse_yes_no(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        other => Err(format!("expected Y or N, got {:?}", other)),
    }
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config);

    // Initialize logging with config level or default
    let log_level = settings
        .as_ref()
        .map(|s| s.batch.log_level.as_str())
        .unwrap_or("info");
    init_logging(log_level);

    let mut settings = settings?;
    if cli.fail_fast {
        settings.batch.on_error = FailurePolicy::Abort;
    }
    let policy = settings.batch.on_error;

    match cli.command {
        Commands::Add { ip } => {
            let ip = target_ip(ip, &settings)?;
            let provider = connect(&settings)?;
            let domains = domains::read_domain_list(
                &settings.batch.domains_file,
                settings.batch.scheme_policy,
            )?;

            info!("Adding {} domains pointing at {}", domains.len(), ip);
            let reports =
                batch::add_domains(provider.as_ref(), &domains, ip, policy, print_report).await?;
            summarize(&reports);
        }

        Commands::Edit {
            domain,
            ip,
            https,
            proxied,
        } => {
            let replace_record = if proxied {
                Some(target_ip(ip, &settings)?)
            } else {
                None
            };
            let request = EditRequest {
                settings: https.changes(),
                replace_record,
            };
            run_edit(&settings, domain.as_deref(), &request, policy).await?;
        }

        Commands::Settings { domain, https } => {
            let request = EditRequest {
                settings: https.changes(),
                replace_record: None,
            };
            if domain.trim() == domains::ALL_DOMAINS {
                bail!("The settings command takes a single domain; use 'edit' for the whole list");
            }
            run_edit(&settings, Some(&domain), &request, policy).await?;
        }

        Commands::SetToken => {
            let token = rpassword::prompt_password("Cloudflare API token: ")?;
            let token = token.trim();
            if token.is_empty() {
                bail!("No token entered");
            }

            let path = &settings.batch.credentials_file;
            secrets::store_token(path, token)?;
            println!("Token stored in {}", path.display());
        }

        Commands::Config => {
            show_config(&cli.config, &settings)?;
        }
    }

    Ok(())
}

async fn run_edit(
    settings: &Settings,
    domain: Option<&str>,
    request: &EditRequest,
    policy: FailurePolicy,
) -> Result<()> {
    if request.settings.is_empty() && request.replace_record.is_none() {
        warn!("No settings requested and record replacement is off; only zone lookups will run");
    }

    let provider = connect(settings)?;
    let domains = domains::select_domains(
        domain,
        &settings.batch.domains_file,
        settings.batch.scheme_policy,
    )?;

    let reports =
        batch::edit_domains(provider.as_ref(), &domains, request, policy, print_report).await?;
    summarize(&reports);

    Ok(())
}

fn connect(settings: &Settings) -> Result<Arc<dyn DnsProvider>> {
    let credentials = secrets::load_credentials(&settings.batch.credentials_file)?;
    create_provider("cloudflare", credentials, &settings.api)
        .context("Failed to create Cloudflare client")
}

fn target_ip(arg: Option<Ipv4Addr>, settings: &Settings) -> Result<Ipv4Addr> {
    arg.or(settings.batch.default_ip).ok_or_else(|| {
        anyhow!("No target IP: pass --ip or set batch.default_ip in the configuration file")
    })
}

fn print_report(report: &DomainReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to render report for {}: {}", report.domain, e),
    }
}

fn summarize(reports: &[DomainReport]) {
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        warn!("{} of {} domains failed", failed, reports.len());
    } else {
        info!("All {} domains processed", reports.len());
    }
}

fn show_config(path: &Path, settings: &Settings) -> Result<()> {
    println!("Configuration file location: {}\n", path.display());

    if !path.exists() {
        println!("Configuration file not found, using defaults.");
        println!("\nExample configuration:\n");
        println!(
            r#"[api]
base_url = "https://api.cloudflare.com/client/v4"
timeout_seconds = 30

[batch]
credentials_file = "auth.json"
domains_file = "domains.txt"
default_ip = "203.0.113.10"
on_error = "continue"
scheme_policy = "http_and_https"
log_level = "info"
"#
        );
        return Ok(());
    }

    println!("Current configuration:\n");
    println!("{}", toml::to_string_pretty(settings)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_flag_values() {
        assert_eq!(parse_setting_flag("-1"), Ok(SettingFlag(None)));
        assert_eq!(parse_setting_flag("0"), Ok(SettingFlag(Some(Toggle::Off))));
        assert_eq!(parse_setting_flag("1"), Ok(SettingFlag(Some(Toggle::On))));
        assert!(parse_setting_flag("2").is_err());
    }

    #[test]
    fn test_yes_no() {
        assert_eq!(parse_yes_no("Y"), Ok(true));
        assert_eq!(parse_yes_no("no"), Ok(false));
        assert!(parse_yes_no("maybe").is_err());
    }

    #[test]
    fn test_edit_defaults_leave_settings_untouched() {
        let cli = Cli::try_parse_from(["cfzones", "edit", "-d", "example.com"]).unwrap();
        match cli.command {
            Commands::Edit {
                domain,
                https,
                proxied,
                ..
            } => {
                assert_eq!(domain.as_deref(), Some("example.com"));
                assert!(https.changes().is_empty());
                assert!(!proxied);
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_edit_flags() {
        let cli = Cli::try_parse_from([
            "cfzones", "edit", "--arhttps", "1", "--auhttps", "-1", "-x", "Y", "-i", "1.2.3.4",
        ])
        .unwrap();
        match cli.command {
            Commands::Edit {
                domain,
                ip,
                https,
                proxied,
            } => {
                assert_eq!(domain, None);
                assert_eq!(ip, Some(Ipv4Addr::new(1, 2, 3, 4)));
                assert_eq!(
                    https.changes(),
                    SettingChanges {
                        automatic_https_rewrites: Some(Toggle::On),
                        always_use_https: None,
                    }
                );
                assert!(proxied);
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn test_target_ip_prefers_flag() {
        let mut settings = Settings::default();
        assert!(target_ip(None, &settings).is_err());

        settings.batch.default_ip = Some(Ipv4Addr::new(203, 0, 113, 10));
        assert_eq!(
            target_ip(None, &settings).unwrap(),
            Ipv4Addr::new(203, 0, 113, 10)
        );
        assert_eq!(
            target_ip(Some(Ipv4Addr::new(1, 2, 3, 4)), &settings).unwrap(),
            Ipv4Addr::new(1, 2, 3, 4)
        );
    }
}
