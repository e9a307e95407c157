//! scaffold CLI - Answer project scaffolding questions interactively

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scaffolder_prompts::prompt::{confirm, multiselect, select, text, PromptBuilder, SelectOption};
use scaffolder_prompts::{
    Answers, Orchestrator, ProcessShutdown, PromptConfig, QuestionManifest, Session,
    SessionConfig, Theme, Value,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable prefix for session settings
const ENV_PREFIX: &str = "SCAFFOLD";

#[derive(Parser, Debug)]
#[command(name = "scaffold")]
#[command(about = "CLI for answering project scaffolding questions")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(clap::Args, Debug)]
pub struct SessionArgs {
    /// Milliseconds to wait for the rest of an escape sequence before treating ESC as a key
    #[arg(long = "escape-timeout-ms", global = true)]
    pub escape_timeout_ms: Option<u64>,

    /// Disable mouse support
    #[arg(long = "no-mouse", global = true)]
    pub no_mouse: bool,

    /// Render prompts inline instead of on the alternate screen
    #[arg(long = "no-alt-screen", global = true)]
    pub no_alt_screen: bool,

    /// Don't print a summary of the answers when done
    #[arg(long = "no-echo", global = true)]
    pub no_echo: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Write logs to this file instead of stderr
    #[arg(long = "log-file", env = "SCAFFOLD_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

impl SessionArgs {
    /// Environment settings with command line flags layered on top
    fn session_config(&self, base: SessionConfig) -> SessionConfig {
        let mut config = base;
        if let Some(ms) = self.escape_timeout_ms {
            config.escape_timeout = Duration::from_millis(ms);
        }
        if self.no_mouse {
            config.mouse = false;
        }
        if self.no_alt_screen {
            config.alternate_screen = false;
        }
        if self.no_echo {
            config.echo_answers = false;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the questions for a new project
    Create(CreateArgs),
    /// Ask the questions described in a YAML file
    Ask(AskArgs),
}

#[derive(Parser, Debug, Default)]
pub struct CreateArgs {
    /// Project name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Template name to use
    #[arg(short, long)]
    pub template: Option<String>,

    /// Languages to include (comma-separated: typescript,javascript,python)
    #[arg(short, long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Questions file
    pub file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stdout().show_cursor();
        default_panic(info);
    }));

    let args = Args::parse();
    init_logging(args.session.log_file.as_deref())?;

    // Handles Ctrl+C / SIGTERM while the terminal is not in raw mode
    let shutdown = ProcessShutdown::install();

    let config = args.session.session_config(SessionConfig::from_env(ENV_PREFIX));
    tracing::debug!(?config, "session config");
    let theme = if args.session.no_color {
        Theme::plain()
    } else {
        Theme::colored()
    };
    let session = Session::stdio(config, shutdown, theme).context("failed to open terminal")?;
    let orchestrator = Orchestrator::new(session);

    let answers = match args.command {
        Some(Command::Create(create_args)) => create(&orchestrator, create_args).await?,
        Some(Command::Ask(ask_args)) => ask_file(&orchestrator, &ask_args.file).await?,
        None => create(&orchestrator, CreateArgs::default()).await?,
    };

    print!("{}", serde_yaml::to_string(&answers)?);
    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let _ = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    Ok(())
}

async fn ask_file(orchestrator: &Orchestrator, path: &Path) -> Result<Answers> {
    let configs = QuestionManifest::from_path(path)
        .with_context(|| format!("failed to read questions from {}", path.display()))?
        .into_configs()
        .with_context(|| format!("invalid question in {}", path.display()))?;

    Ok(orchestrator.flow(configs).await?)
}

async fn create(orchestrator: &Orchestrator, args: CreateArgs) -> Result<Answers> {
    let mut answers = Answers::new();
    if let Some(name) = &args.name {
        validate_project_name(name)?;
        answers.insert("name", Value::from(name.as_str()));
    }
    if let Some(template) = &args.template {
        answers.insert("template", Value::from(template.as_str()));
    }
    if let Some(languages) = &args.languages {
        answers.insert("languages", Value::List(languages.clone()));
    }

    let given = orchestrator.flow(create_questions(&args)).await?;
    for (name, value) in given.iter() {
        answers.insert(name, value.clone());
    }
    Ok(answers)
}

/// Questions for `create`, leaving out what was given on the command line
fn create_questions(args: &CreateArgs) -> Vec<PromptConfig> {
    let mut questions: Vec<PromptConfig> = Vec::new();

    if args.name.is_none() {
        questions.push(
            text("Project name")
                .name("name")
                .required(true)
                .placeholder("my-project")
                .validate(|value| validate_project_name(&value.to_string()))
                .into(),
        );
    }

    if args.template.is_none() {
        questions.push(
            select("Template")
                .name("template")
                .searchable(true)
                .group_by(true)
                .page_size(6)
                .options(templates())
                .into(),
        );
    }

    if args.languages.is_none() {
        questions.push(
            multiselect("Languages")
                .name("languages")
                .required(true)
                .options([
                    SelectOption::new("typescript", "TypeScript"),
                    SelectOption::new("javascript", "JavaScript"),
                    SelectOption::new("python", "Python"),
                ])
                .default_value(vec!["typescript".to_string()])
                .into(),
        );
    }

    let preset_template = args.template.clone();
    questions.push(
        text("API base path")
            .name("base_path")
            .default_value("/api")
            .when(move |answers| {
                let template = answers
                    .get("template")
                    .and_then(Value::as_str)
                    .or(preset_template.as_deref());
                template == Some("api")
            })
            .into(),
    );

    questions.push(
        confirm("Initialize a git repository?")
            .name("git")
            .initial(true)
            .into(),
    );

    questions
}

fn templates() -> Vec<SelectOption> {
    vec![
        SelectOption::new("quickstart", "Quickstart")
            .group("Starter")
            .description("Smallest working project with one example step"),
        SelectOption::new("basic", "Basic")
            .group("Starter")
            .description("Project layout with tests and configuration"),
        SelectOption::new("api", "REST API")
            .group("Backend")
            .description("HTTP endpoints with request validation"),
        SelectOption::new("worker", "Background worker")
            .group("Backend")
            .description("Queue consumer with retries"),
        SelectOption::new("agent", "AI agent")
            .group("AI")
            .description("Coming soon")
            .disabled(true),
    ]
}

fn validate_project_name(name: &str) -> Result<()> {
    if name.starts_with('.') || name.starts_with('-') {
        anyhow::bail!("Project name can't start with '{}'", &name[..1]);
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        anyhow::bail!("Project name can't contain '{}'", c);
    }
    Ok(())
}
