use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use condmark::engine::facts::FactContext;
use condmark::marks::config::{Settings, SettingsOverride};
use condmark::marks::rules::{ConditionRuleStore, Conditions, RuleTable};
use condmark::marks::session::MarkSession;
use condmark::marks::testbed::TestbedLoader;
use dotenv::dotenv;
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Conditions file; repeat to merge several
    #[arg(short, long = "conditions")]
    conditions: Vec<PathBuf>,

    /// Testbed inventory file
    #[arg(long)]
    testbed_file: Option<PathBuf>,

    /// Testbed conf-name to derive facts from
    #[arg(short, long)]
    testbed: Option<String>,
}

impl SourceArgs {
    fn settings(self, ignore_marks: bool) -> Settings {
        Settings::from_env().overlay(SettingsOverride {
            conditions_files: self.conditions,
            testbed_file: self.testbed_file,
            testbed: self.testbed,
            ignore_marks,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the mark a test item would receive
    Lookup {
        #[command(flatten)]
        sources: SourceArgs,

        /// Test id, e.g. bgp/test_bgp_fact.py::test_bgp_facts; repeatable
        #[arg(short = 'i', long = "test-id", required = true)]
        test_ids: Vec<String>,

        /// YAML file of facts
        #[arg(long)]
        facts: Option<PathBuf>,

        /// Single fact as key=value; repeatable, wins over --facts
        #[arg(short, long = "fact")]
        fact: Vec<String>,

        /// Ignore all marks
        #[arg(long)]
        ignore_marks: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate conditions files
    Check {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// List entries, or the keys matching a test id
    List {
        #[command(flatten)]
        sources: SourceArgs,

        /// Only show keys matching this test id
        #[arg(short = 'i', long = "test-id")]
        test_id: Option<String>,
    },
    /// List testbeds and their topology family
    Testbeds {
        /// Testbed inventory file
        #[arg(long)]
        testbed_file: PathBuf,
    },
    /// Print the JSON schema of the conditions file format
    Schema,
}

fn load_table(settings: &Settings) -> anyhow::Result<RuleTable> {
    settings.validate()?;
    ConditionRuleStore::new()
        .load_files(&settings.conditions_files)
        .context("Failed to load conditions")
}

fn describe_conditions(conditions: &Conditions) -> String {
    match conditions {
        Conditions::Always => "always".to_string(),
        Conditions::AlwaysTrue { note, .. } => format!("always ({})", note),
        Conditions::All(conds) => conds
            .iter()
            .map(|c| c.source.as_str())
            .collect::<Vec<_>>()
            .join(" AND "),
        Conditions::Any(conds) => conds
            .iter()
            .map(|c| c.source.as_str())
            .collect::<Vec<_>>()
            .join(" OR "),
    }
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lookup {
            sources,
            test_ids,
            facts,
            fact,
            ignore_marks,
            json,
        } => {
            let settings = sources.settings(ignore_marks);
            let session =
                MarkSession::from_settings(&settings).context("Failed to start session")?;

            let mut item_facts = FactContext::new();
            if let Some(path) = facts {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read facts file {}", path.display()))?;
                item_facts.extend(FactContext::from_yaml(&content)?);
            }
            item_facts.extend(FactContext::from_pairs(&fact)?);
            let facts = session.facts_for(item_facts);

            log::info!(
                "Evaluating {} test ids against {} facts",
                test_ids.len(),
                facts.len()
            );

            let mut results = Vec::new();
            for test_id in &test_ids {
                let disposition = session.lookup(test_id, &facts);
                if json {
                    results.push(json!({ "test_id": test_id, "disposition": disposition }));
                    continue;
                }
                match disposition {
                    Some(d) => println!(
                        "{}: {}{} - {} (from '{}')",
                        test_id,
                        d.kind,
                        if d.strict { " strict" } else { "" },
                        d.reason,
                        d.matched_key
                    ),
                    None => println!("{}: run", test_id),
                }
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }
        Commands::Check { sources } => {
            let settings = sources.settings(false);
            let table = load_table(&settings)?;
            let summary = table.summary();
            println!(
                "OK: {} entries, {} skip rules, {} xfail rules",
                summary.entries, summary.skip_rules, summary.xfail_rules
            );
            if summary.documentation_only > 0 {
                println!(
                    "warning: {} rules use a plain string as conditions and always apply",
                    summary.documentation_only
                );
            }
        }
        Commands::List { sources, test_id } => {
            let settings = sources.settings(false);
            let table = load_table(&settings)?;
            match test_id {
                Some(id) => {
                    for key in table.matches(&id) {
                        println!("{}", key);
                    }
                }
                None => {
                    for entry in table.iter() {
                        println!("{}  [{}]", entry.test_id, entry.origin);
                        for rule in entry.rules() {
                            println!(
                                "  {}: {} | {}",
                                rule.disposition,
                                rule.reason,
                                describe_conditions(&rule.conditions)
                            );
                        }
                    }
                }
            }
        }
        Commands::Testbeds { testbed_file } => {
            let inventory = TestbedLoader::new()
                .load_file(&testbed_file)
                .with_context(|| format!("Failed to load {}", testbed_file.display()))?;
            for tb in inventory.entries() {
                println!(
                    "{}  topo={} type={} duts={}",
                    tb.conf_name,
                    tb.topo,
                    tb.topo_type(),
                    tb.dut.join(",")
                );
            }
        }
        Commands::Schema => {
            let schema = ConditionRuleStore::schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}
