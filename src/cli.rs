use std::path::{Path, PathBuf};

mod list;
mod show;
mod terminal;

use chrono::NaiveDate;
use clap::ArgAction;
use dms::{
    Actor, Config, DirectoryStore, DocumentType, LifecycleStatus, LocalIdentity,
    domain::lifecycle::{Approval, Obsolescence},
    registry::{NewDocument, PublishInput, Registry},
};
use list::List;
use show::Show;
use terminal::Colorize;
use tracing::instrument;

/// The workspace configuration file, at the root next to the collections.
const CONFIG_FILE: &str = "dms.toml";

/// Parse a document type from a string, case-insensitively.
///
/// This is a CLI boundary function; the domain type itself is strict.
fn parse_document_type(s: &str) -> Result<DocumentType, String> {
    const TYPES: [DocumentType; 8] = [
        DocumentType::Standard,
        DocumentType::Procedure,
        DocumentType::Sop,
        DocumentType::Policy,
        DocumentType::WorkInstruction,
        DocumentType::Manual,
        DocumentType::Form,
        DocumentType::Other,
    ];
    TYPES
        .into_iter()
        .find(|ty| ty.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown document type '{s}'"))
}

/// Parse a lifecycle status from a string, case-insensitively.
fn parse_status(s: &str) -> Result<LifecycleStatus, String> {
    const STATUSES: [LifecycleStatus; 5] = [
        LifecycleStatus::Draft,
        LifecycleStatus::UnderReview,
        LifecycleStatus::Approved,
        LifecycleStatus::Published,
        LifecycleStatus::Obsolete,
    ];
    STATUSES
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown lifecycle status '{s}'"))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

fn load_config(root: &Path) -> Config {
    let path = root.join(CONFIG_FILE);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

fn open_store(root: &Path) -> DirectoryStore {
    DirectoryStore::new(root.to_path_buf(), load_config(root))
}

fn workspace(root: &Path) -> (DirectoryStore, Actor) {
    let config = load_config(root);
    let actor = LocalIdentity::new(config.actor.clone()).actor();
    (DirectoryStore::new(root.to_path_buf(), config), actor)
}

fn confirm(prompt: &str) -> anyhow::Result<()> {
    eprint!("\n{prompt} (y/N) ");
    use std::io::{self, BufRead};
    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    if !line.trim().eq_ignore_ascii_case("y") {
        println!("Cancelled");
        std::process::exit(130);
    }
    Ok(())
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the document workspace
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Initialize a new document workspace
    Init(Init),

    /// List documents with filters and pagination (default)
    List(List),

    /// Show detailed information about a document
    Show(Show),

    /// Register a new draft document
    Create(Create),

    /// Submit a draft for review
    RequestApproval(RequestApproval),

    /// Approve a document under review
    Approve(Approve),

    /// Publish an approved document
    Publish(Publish),

    /// Mark a document obsolete
    MarkObsolete(MarkObsolete),

    /// Delete a document
    Delete(Delete),

    /// Show the next available document code for a prefix
    NextCode(NextCode),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(&root)?,
            Self::List(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Create(command) => command.run(&root)?,
            Self::RequestApproval(command) => command.run(&root)?,
            Self::Approve(command) => command.run(&root)?,
            Self::Publish(command) => command.run(&root)?,
            Self::MarkObsolete(command) => command.run(&root)?,
            Self::Delete(command) => command.run(&root)?,
            Self::NextCode(command) => command.run(&root)?,
        }
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Init {}

impl Init {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!(
                "Workspace already initialized (found existing {CONFIG_FILE})"
            );
        }

        let config = Config::default();
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        let store = DirectoryStore::new(root.to_path_buf(), config.clone());
        store.init()?;

        println!("Initialized document workspace in {}", root.display());
        println!("  Created: {CONFIG_FILE}");
        println!("  Created: {}/", config.authoring_collection);
        println!("  Created: {}/", config.published_collection);
        println!();
        println!("Next steps:");
        println!("  Set your name, email, and roles in {CONFIG_FILE}");
        println!("  dms create path/to/draft.docx --type SOP --process Quality");

        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Create {
    /// Path to the draft file to register
    file: PathBuf,

    /// Document title (defaults to the file name without extension)
    #[clap(long, short)]
    title: Option<String>,

    /// Document type, used to derive the code prefix
    #[clap(long = "type", value_parser = parse_document_type, default_value = "Other")]
    document_type: DocumentType,

    /// Process or function, used to derive the code prefix
    #[clap(long, short, default_value = "")]
    process: String,

    /// Department or site
    #[clap(long, short, default_value = "")]
    department: String,

    /// Comma-separated keywords
    #[clap(long, short, value_delimiter = ',')]
    keywords: Vec<String>,

    /// Short description
    #[clap(long, default_value = "")]
    summary: String,
}

impl Create {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let (store, actor) = workspace(root);
        let registry = Registry::new(&store);

        let content = std::fs::read(&self.file)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", self.file.display()))?;
        let file_name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("{} has no file name", self.file.display()))?;
        let title = self.title.unwrap_or_else(|| {
            self.file
                .file_stem()
                .map_or_else(|| file_name.clone(), |s| s.to_string_lossy().into_owned())
        });

        let record = registry.create(
            &NewDocument {
                title,
                document_type: self.document_type,
                process_or_function: self.process,
                department_or_site: self.department,
                keywords: self.keywords,
                summary: self.summary,
                file_name,
                content,
            },
            &actor,
        )?;

        println!(
            "{}",
            format!("Registered {} ({})", record.document_code, record.title).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct RequestApproval {
    /// The id of the document to submit
    id: String,

    /// Note for the approver (logged, not stored on the record)
    #[arg(long)]
    notes: Option<String>,
}

impl RequestApproval {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let (store, actor) = workspace(root);
        let registry = Registry::new(&store);
        let record = registry.request_approval(&self.id, self.notes.as_deref(), &actor)?;
        println!(
            "{}",
            format!("{} is now under review", record.document_code).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Approve {
    /// The id of the document to approve
    id: String,

    /// Revision label to stamp on the document
    #[arg(long)]
    revision: String,

    /// Date the document takes effect (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    effective: NaiveDate,

    /// Date the document is due for review (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    review: NaiveDate,
}

impl Approve {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let (store, actor) = workspace(root);
        let registry = Registry::new(&store);
        let record = registry.approve(
            &self.id,
            &Approval {
                revision: self.revision,
                effective_date: Some(self.effective),
                next_review_date: Some(self.review),
            },
            &actor,
        )?;
        println!(
            "{}",
            format!(
                "Approved {} at revision {}",
                record.document_code, record.revision
            )
            .success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Publish {
    /// The id of the document to publish
    id: String,

    /// A manually rendered file to publish instead of the authoring copy
    #[arg(long, conflicts_with = "auto_convert")]
    file: Option<PathBuf>,

    /// Publish the authoring file as-is
    #[arg(long)]
    auto_convert: bool,
}

impl Publish {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let (store, actor) = workspace(root);
        let registry = Registry::new(&store);

        let input = if let Some(file) = self.file {
            let content = std::fs::read(&file)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow::anyhow!("{} has no file name", file.display()))?;
            PublishInput::Rendered { file_name, content }
        } else if self.auto_convert {
            PublishInput::AutoConvert
        } else {
            anyhow::bail!("Specify either --file <PATH> or --auto-convert");
        };

        let record = registry.publish(&self.id, input, &actor)?;
        println!(
            "{}",
            format!("Published {}", record.document_code).success()
        );
        println!("  {}", record.published_file_url.dim());
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct MarkObsolete {
    /// The id of the document to mark obsolete
    id: String,

    /// The id of the document that supersedes this one
    #[arg(long)]
    superseded_by: Option<String>,

    /// Note for the audit log (not stored on the record)
    #[arg(long)]
    notes: Option<String>,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl MarkObsolete {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let (store, actor) = workspace(root);
        let registry = Registry::new(&store);

        let record = registry.get(&self.id)?;
        if !self.yes {
            println!(
                "Will mark {} ({}) obsolete",
                record.document_code, record.title
            );
            confirm("Proceed?")?;
        }

        let record = registry.mark_obsolete(
            &self.id,
            &Obsolescence {
                superseded_by_document_id: self.superseded_by,
                notes: self.notes,
            },
            &actor,
        )?;
        println!(
            "{}",
            format!("{} is now obsolete", record.document_code).warning()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// The id of the document to delete
    id: String,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let (store, actor) = workspace(root);
        let registry = Registry::new(&store);

        let record = registry.get(&self.id)?;
        if !self.yes {
            println!(
                "Will delete {} ({})",
                record.document_code, record.title
            );
            confirm("Proceed?")?;
        }

        registry.delete(&self.id, &actor)?;
        println!(
            "{}",
            format!("Deleted {}", record.document_code).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct NextCode {
    /// Document type for the code prefix
    #[clap(long = "type", value_parser = parse_document_type, default_value = "Other")]
    document_type: DocumentType,

    /// Process or function for the code prefix
    #[clap(long, short, default_value = "")]
    process: String,

    /// Also list the items that matched the prefix scan
    #[arg(long)]
    matches: bool,
}

impl NextCode {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = open_store(root);
        let registry = Registry::new(&store);
        let allocator = registry.allocator();

        let prefix = dms::domain::code::code_prefix(self.document_type, &self.process);
        let sequence = allocator.next_sequence(&prefix);
        println!("{prefix}{sequence}");

        if self.matches {
            let matched = allocator.matching_items(&prefix);
            if matched.is_empty() {
                println!("{}", "No existing items match this prefix".dim());
            } else {
                println!();
                for item in matched {
                    let sequence = item
                        .sequence
                        .map_or_else(|| "---".to_string(), |s| format!("{s:03}"));
                    println!(
                        "  {sequence}  {:<30} {} ({})",
                        item.code,
                        item.display_name.dim(),
                        item.collection
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parse_document_type_is_case_insensitive() {
        assert_eq!(parse_document_type("sop").unwrap(), DocumentType::Sop);
        assert_eq!(
            parse_document_type("WORKINSTRUCTION").unwrap(),
            DocumentType::WorkInstruction
        );
        assert!(parse_document_type("blueprint").is_err());
    }

    #[test]
    fn parse_status_is_case_insensitive() {
        assert_eq!(
            parse_status("underreview").unwrap(),
            LifecycleStatus::UnderReview
        );
        assert!(parse_status("archived").is_err());
    }

    #[test]
    fn init_then_create_registers_a_draft() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        Init {}.run(&root).expect("init should succeed");
        assert!(root.join(CONFIG_FILE).is_file());

        let draft = root.join("calibration.docx");
        std::fs::write(&draft, b"draft content").unwrap();

        let create = Create {
            file: draft,
            title: Some("Calibration".to_string()),
            document_type: DocumentType::Sop,
            process: "Quality".to_string(),
            department: "HQ".to_string(),
            keywords: vec!["calibration".to_string()],
            summary: String::new(),
        };
        create.run(&root).expect("create should succeed");

        let store = open_store(&root);
        let registry = Registry::new(&store);
        let page = registry.list(&Default::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].document_code, "SOP-QUA-001");
    }

    #[test]
    fn init_refuses_to_reinitialize() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        Init {}.run(&root).unwrap();
        assert!(Init {}.run(&root).is_err());
    }
}
