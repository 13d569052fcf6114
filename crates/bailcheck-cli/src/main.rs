//! `bailcheck` command-line interface.
//!
//! Logs go to stderr; stdout carries JSON only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use bailcheck_core::{case::parse_leading_int, parse_sections, Assessment, NewCase};
use bailcheck_runtime::{
    CaseService, ChatAssistant, DashboardStats, InMemoryCaseStore, ProviderRegistry,
    RuntimeConfig,
};

#[derive(Parser, Debug)]
#[command(name = "bailcheck", author, version, about, long_about = None)]
struct Cli {
    /// Runtime configuration file (YAML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rule table file (YAML or JSON); overrides the config
    #[arg(long, global = true, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Officer id recorded in the audit trail
    #[arg(long, global = true, default_value = "cli")]
    actor: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract section numbers from free-form text
    Parse {
        text: String,
    },
    /// Evaluate bail eligibility for a list of sections
    Evaluate {
        /// IPC sections, e.g. "379, 411"
        #[arg(long)]
        ipc: String,
        /// CrPC sections (recorded, not evaluated)
        #[arg(long)]
        crpc: Option<String>,
        /// Age of the accused
        #[arg(long)]
        age: Option<String>,
    },
    /// Register and evaluate every case in a JSON or YAML file
    Analyze {
        file: PathBuf,
    },
    /// Show the legal rule reference list
    Rules {
        /// Case-insensitive filter over section, offense and description
        #[arg(long, conflicts_with = "section")]
        search: Option<String>,
        /// Show a single section
        #[arg(long)]
        section: Option<String>,
    },
    /// Ask the legal assistant a question
    Chat {
        message: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzedCase {
    case_id: String,
    fir_number: String,
    #[serde(flatten)]
    assessment: Assessment,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput {
    cases: Vec<AnalyzedCase>,
    stats: DashboardStats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<RuntimeConfig> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if let Some(rules) = &cli.rules {
        config.rules_path = Some(rules.clone());
    }
    Ok(config)
}

/// Read intake records from a JSON array or a YAML list.
fn load_cases(path: &Path) -> Result<Vec<NewCase>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_cases(&contents, path)
}

fn parse_cases(contents: &str, path: &Path) -> Result<Vec<NewCase>> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let cases = if is_yaml {
        serde_yaml::from_str(contents)
            .with_context(|| format!("Invalid case list in {}", path.display()))?
    } else {
        serde_json::from_str(contents)
            .with_context(|| format!("Invalid case list in {}", path.display()))?
    };
    Ok(cases)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Parse { text } => {
            print_json(&parse_sections(Some(text.as_str())))?;
        }

        Commands::Evaluate { ipc, crpc, age } => {
            let rules = config.load_rules().context("Failed to load rule table")?;
            let age = age.as_deref().and_then(parse_leading_int);
            let assessment =
                bailcheck_core::evaluate_sections(&rules, Some(ipc.as_str()), crpc.as_deref(), age);
            print_json(&assessment)?;
        }

        Commands::Analyze { file } => {
            let intakes = load_cases(file)?;
            let service = CaseService::from_config(&config, Arc::new(InMemoryCaseStore::new()))
                .context("Failed to start case service")?;

            let mut cases = Vec::with_capacity(intakes.len());
            for intake in intakes {
                let fir_number = intake.fir_number.clone();
                let case_id = service.register_case(&cli.actor, intake).await?;
                let assessment = service.analyze_case(&cli.actor, &case_id).await?;
                cases.push(AnalyzedCase {
                    case_id,
                    fir_number,
                    assessment,
                });
            }

            print_json(&AnalyzeOutput {
                cases,
                stats: service.dashboard_stats().await,
            })?;
        }

        Commands::Rules { search, section } => {
            let rules = config.load_rules().context("Failed to load rule table")?;
            match section {
                Some(section) => match rules.get(section.trim()) {
                    Some(rule) => print_json(rule)?,
                    None => bail!("No rule for section {}", section),
                },
                None => print_json(&rules.search(search.as_deref().unwrap_or("")))?,
            }
        }

        Commands::Chat { message } => {
            let registry = ProviderRegistry::with_defaults();
            let assistant = ChatAssistant::from_config(&config, &registry)
                .context("Chat assistant is not available")?;
            let reply = assistant.reply(message, &[]).await?;
            print_json(&reply)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_evaluate_args() {
        let cli = Cli::try_parse_from([
            "bailcheck", "evaluate", "--ipc", "379, 411", "--age", "65",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate { ipc, crpc, age } => {
                assert_eq!(ipc, "379, 411");
                assert!(crpc.is_none());
                assert_eq!(age.as_deref(), Some("65"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.actor, "cli");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bailcheck", "rules", "--search", "theft", "--rules", "custom.yaml",
        ])
        .unwrap();
        assert_eq!(cli.rules, Some(PathBuf::from("custom.yaml")));
    }

    #[test]
    fn test_rules_search_conflicts_with_section() {
        assert!(Cli::try_parse_from([
            "bailcheck", "rules", "--search", "theft", "--section", "379",
        ])
        .is_err());
    }

    #[test]
    fn test_rules_flag_overrides_config() {
        let cli = Cli::try_parse_from(["bailcheck", "--rules", "x.json", "parse", "302"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.rules_path, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn test_parse_cases_json_and_yaml() {
        let json = r#"[{"firNumber": "FIR/1", "ipcSections": "379", "age": 28}]"#;
        let cases = parse_cases(json, Path::new("cases.json")).unwrap();
        assert_eq!(cases[0].fir_number, "FIR/1");
        assert_eq!(cases[0].age.as_deref(), Some("28"));

        let yaml = "- firNumber: FIR/2\n  ipcSections: \"302, 34\"\n";
        let cases = parse_cases(yaml, Path::new("cases.yml")).unwrap();
        assert_eq!(cases[0].ipc_sections.as_deref(), Some("302, 34"));
    }

    #[test]
    fn test_parse_cases_rejects_object() {
        assert!(parse_cases(r#"{"firNumber": "FIR/1"}"#, Path::new("c.json")).is_err());
    }
}
