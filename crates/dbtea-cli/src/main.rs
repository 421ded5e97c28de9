use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dbtea_core::config::{config_path, default_profiles_dir};
use dbtea_core::timing::log_duration;
use dbtea_core::{DbteaConfig, DbteaError, ModelSchema, ProjectConfig, Report, Severity};
use dbtea_dbt::{DbtCommand, DbtFlag, DbtProject, DbtRunner};
use dbtea_git::{GitHubProvider, PullRequest, PullRequestProvider};
use dbtea_lookml::{
    dump, load_file, to_lookml, write_view_files, LookmlFileKind, LookmlModel, OutputTarget,
    SchemaTranslator, TracingObserver, TranslateOptions, Translation,
};

/// dbtea - dbt metadata to LookML
#[derive(Parser)]
#[command(name = "dbtea")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding dbtea.toml and looker.ini (default: ~/.dbt)
    #[arg(long, global = true, env = "DBTEA_PROFILES_DIR")]
    profiles_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory receiving dbtea.log
    #[arg(long, global = true, env = "DBTEA_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// dbt project root (default: nearest parent holding dbt_project.yml)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run dbt commands against the project
    Dbt {
        #[command(subcommand)]
        command: DbtCommands,
    },

    /// Generate, assemble and parse LookML
    Lookml {
        #[command(subcommand)]
        command: LookmlCommands,
    },

    /// Manage dbtea configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Open pull requests for generated LookML
    Pr {
        #[command(subcommand)]
        command: PrCommands,
    },
}

/// Options shared by every dbt subcommand
#[derive(Args, Debug, Clone, Default)]
struct DbtArgs {
    /// dbt target to use
    #[arg(long)]
    target: Option<String>,

    /// YAML dictionary of project variables
    #[arg(long)]
    vars: Option<String>,

    /// Extra arguments passed to dbt verbatim (after `--`)
    #[arg(last = true)]
    passthrough: Vec<String>,
}

impl DbtArgs {
    fn flags(&self) -> Vec<DbtFlag> {
        let mut flags = Vec::new();
        if let Some(target) = &self.target {
            flags.push(DbtFlag::value("target", target.clone()));
        }
        if let Some(vars) = &self.vars {
            flags.push(DbtFlag::value("vars", vars.clone()));
        }
        flags
    }
}

#[derive(Subcommand, Debug)]
enum DbtCommands {
    /// Remove dbt clean target folders
    Clean(DbtArgs),
    /// Compile dbt models
    Compile(DbtArgs),
    /// Check project setup, profile and warehouse access
    Debug(DbtArgs),
    /// Install package dependencies
    Deps {
        /// Fail unless packages.yml includes the codegen package
        #[arg(long)]
        require_codegen: bool,

        #[command(flatten)]
        args: DbtArgs,
    },
    /// Generate documentation artifacts
    DocsGenerate(DbtArgs),
    /// Serve the documentation site
    DocsServe(DbtArgs),
    /// List project resources
    List(DbtArgs),
    /// Create a base dbt project
    Init(DbtArgs),
    /// Parse the project
    Parse(DbtArgs),
    /// Start an RPC server
    Rpc(DbtArgs),
    /// Run a macro
    RunOperation {
        /// Macro name
        macro_name: String,

        /// Macro arguments as a YAML dictionary
        #[arg(long = "args")]
        macro_args: Option<String>,

        #[command(flatten)]
        args: DbtArgs,
    },
    /// Run models
    Run(DbtArgs),
    /// Load seed files
    Seed(DbtArgs),
    /// Execute snapshots
    Snapshot(DbtArgs),
    /// Check source freshness
    SourceFreshness(DbtArgs),
    /// Run data tests
    Test(DbtArgs),
}

impl DbtCommands {
    /// The dbt command, its options, and whether codegen must be present
    fn into_parts(self) -> (DbtCommand, DbtArgs, bool) {
        match self {
            Self::Clean(args) => (DbtCommand::Clean, args, false),
            Self::Compile(args) => (DbtCommand::Compile, args, false),
            Self::Debug(args) => (DbtCommand::Debug, args, false),
            Self::Deps { require_codegen, args } => (DbtCommand::Deps, args, require_codegen),
            Self::DocsGenerate(args) => (DbtCommand::DocsGenerate, args, false),
            Self::DocsServe(args) => (DbtCommand::DocsServe, args, false),
            Self::List(args) => (DbtCommand::List, args, false),
            Self::Init(args) => (DbtCommand::Init, args, false),
            Self::Parse(args) => (DbtCommand::Parse, args, false),
            Self::Rpc(args) => (DbtCommand::Rpc, args, false),
            Self::RunOperation { macro_name, macro_args, args } => (
                DbtCommand::RunOperation {
                    macro_name,
                    args: macro_args,
                },
                args,
                false,
            ),
            Self::Run(args) => (DbtCommand::Run, args, false),
            Self::Seed(args) => (DbtCommand::Seed, args, false),
            Self::Snapshot(args) => (DbtCommand::Snapshot, args, false),
            Self::SourceFreshness(args) => (DbtCommand::SourceFreshness, args, false),
            Self::Test(args) => (DbtCommand::Test, args, false),
        }
    }
}

/// Where model schemas are read from
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaSource {
    /// `models:` entries in schema YAML files
    Schema,
    /// Model nodes in target/manifest.json
    Manifest,
}

#[derive(Args, Debug)]
struct ViewsArgs {
    /// Where to read model schemas from
    #[arg(long, value_enum, default_value_t = SchemaSource::Schema)]
    from: SchemaSource,

    /// Write one <view>.view.lkml per model here instead of printing
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only translate these models
    #[arg(short, long = "select")]
    select: Vec<String>,

    /// Derive field types from `data_type` when `type` is missing
    #[arg(long)]
    infer_types: bool,

    /// Map zip/postal code columns to `zipcode` when inferring types
    #[arg(long)]
    include_postal_code: bool,

    /// Prefix sql_table_name with database and schema
    #[arg(long)]
    qualify_table_names: bool,

    /// Put warehouse time types (datetime, timestamp_ntz, ...) in dimension groups
    #[arg(long)]
    group_time_types: bool,

    /// Save a JSON report of translation diagnostics
    #[arg(long)]
    report: Option<PathBuf>,

    /// Configured dbtea project supplying defaults
    #[arg(long)]
    project: Option<String>,
}

#[derive(Subcommand, Debug)]
enum LookmlCommands {
    /// Translate dbt models into LookML views
    Views(ViewsArgs),

    /// Assemble a LookML model file
    Model {
        /// Model name
        name: String,

        /// Database connection name
        #[arg(long)]
        connection: Option<String>,

        #[arg(long)]
        label: Option<String>,

        /// Include patterns (repeatable)
        #[arg(long = "include")]
        includes: Vec<String>,

        /// Explore names (repeatable)
        #[arg(long = "explore")]
        explores: Vec<String>,

        /// Write <name>.model.lkml here instead of printing
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Parse a LookML file and print it as JSON
    Parse {
        /// LookML file
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Add a project to dbtea.toml
    Init {
        /// Project name
        project: String,

        #[arg(long)]
        dbt_project_dir: Option<PathBuf>,

        #[arg(long)]
        looker_project: Option<String>,

        #[arg(long)]
        lookml_output_dir: Option<PathBuf>,

        /// Overwrite an existing project entry
        #[arg(long)]
        replace: bool,
    },

    /// Show configured projects
    Show,

    /// Write the Looker SDK ini file from a project's looker_sdk_* settings
    Looker {
        /// Project name
        project: String,
    },
}

#[derive(Subcommand, Debug)]
enum PrCommands {
    /// Open a pull request from a branch
    Create {
        /// Branch holding the changes
        #[arg(long)]
        head: String,

        /// Branch to merge into (default: configured base branch or main)
        #[arg(long)]
        base: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Configured dbtea project supplying git settings
        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        organization: Option<String>,

        #[arg(long)]
        repository: Option<String>,
    },
}

/// Settings resolved from global flags
struct Session {
    profiles_dir: PathBuf,
    project_dir: Option<PathBuf>,
    verbose: bool,
}

impl Session {
    fn config_path(&self) -> PathBuf {
        config_path(&self.profiles_dir)
    }

    fn load_config(&self) -> Result<DbteaConfig> {
        Ok(DbteaConfig::from_file(&self.config_path())?)
    }

    fn project_config(&self, name: Option<&str>) -> Result<Option<ProjectConfig>> {
        match name {
            Some(name) => Ok(Some(self.load_config()?.project(name)?.clone())),
            None => Ok(None),
        }
    }

    /// Explicit --project-dir, else the configured project's dir, else discovery
    fn dbt_project(&self, configured: Option<&ProjectConfig>) -> Result<DbtProject> {
        let custom = self
            .project_dir
            .clone()
            .or_else(|| configured.and_then(|p| p.dbt_project_dir.clone()));
        Ok(DbtProject::discover(custom.as_deref())?)
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(&cli.log_dir, cli.verbose);

    let session = Session {
        profiles_dir: cli.profiles_dir.clone().unwrap_or_else(default_profiles_dir),
        project_dir: cli.project_dir.clone(),
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Dbt { command } => dbt_command(&session, command),
        Commands::Lookml { command } => lookml_command(&session, command),
        Commands::Config { command } => config_command(&session, command),
        Commands::Pr { command } => pr_command(&session, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// stderr plus an append-only `<log_dir>/dbtea.log`
fn init_logging(log_dir: &Path, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_file = std::fs::create_dir_all(log_dir).and_then(|_| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("dbtea.log"))
    });
    let file_layer = match log_file {
        Ok(file) => Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
        Err(e) => {
            eprintln!(
                "{} cannot open log file in {}: {}",
                "Warning:".yellow(),
                log_dir.display(),
                e
            );
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();
}

/// Domain errors carry their own exit code; anything else exits 1
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<DbteaError>())
        .and_then(|e| u8::try_from(e.exit_code()).ok())
        .unwrap_or(1)
}

/// Dbt command - run a dbt CLI command in the project root
fn dbt_command(session: &Session, command: DbtCommands) -> Result<()> {
    let (command, args, codegen_required) = command.into_parts();

    let runner = if command == DbtCommand::Init {
        // No project exists yet
        let dir = match &session.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Cannot read working directory")?,
        };
        DbtRunner::new(&dir)
    } else {
        let project = session.dbt_project(None)?;
        if codegen_required {
            dbtea_dbt::require_codegen(&project.root)?;
        }
        project.runner()
    };

    if session.verbose {
        eprintln!("{} {}", "Project:".cyan(), runner.working_dir().display());
    }

    let output = runner.run(&command, &args.flags(), &args.passthrough)?;
    print!("{}", output.stdout);
    eprintln!("{} dbt {}", "✓".green(), command.args().join(" "));
    Ok(())
}

fn lookml_command(session: &Session, command: LookmlCommands) -> Result<()> {
    match command {
        LookmlCommands::Views(args) => views_command(session, &args),
        LookmlCommands::Model {
            name,
            connection,
            label,
            includes,
            explores,
            output_dir,
        } => {
            let mut model = LookmlModel::new(name.clone())
                .with_includes(includes)
                .with_explores(
                    explores
                        .into_iter()
                        .map(|explore| serde_json::json!({ "name": explore }))
                        .collect(),
                );
            if let Some(connection) = connection {
                model = model.with_connection(connection);
            }
            if let Some(label) = label {
                model = model.with_label(label);
            }

            let target = match output_dir {
                Some(dir) => OutputTarget::File(dir),
                None => OutputTarget::Stdout,
            };
            match to_lookml(&model.assemble(), &target, &name, Some(LookmlFileKind::Model))? {
                Some(text) => print!("{}", text),
                None => {
                    if let OutputTarget::File(dir) = &target {
                        let path = dir.join(format!("{}.model.lkml", name));
                        eprintln!("{} {}", "Wrote".green(), path.display());
                    }
                }
            }
            Ok(())
        }
        LookmlCommands::Parse { file } => {
            let document = load_file(&file)?;
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
    }
}

/// Views command - translate dbt model schemas into LookML views
fn views_command(session: &Session, args: &ViewsArgs) -> Result<()> {
    let configured = session.project_config(args.project.as_deref())?;
    let project = session.dbt_project(configured.as_ref())?;

    if session.verbose {
        eprintln!("{} {}", "Loading models from:".cyan(), project.root.display());
    }

    let models = select_models(
        match args.from {
            SchemaSource::Schema => project.schema_file_models()?,
            SchemaSource::Manifest => project.manifest()?.model_schemas(),
        },
        &args.select,
    );

    let translator = SchemaTranslator::with_options(TranslateOptions {
        infer_types: args.infer_types,
        include_postal_code: args.include_postal_code,
        qualify_table_names: args.qualify_table_names,
        group_warehouse_time_types: args.group_time_types,
    });
    let translation = log_duration("LookML view generation ", || {
        translator.translate(&models, &mut TracingObserver)
    });

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| configured.as_ref().and_then(|p| p.lookml_output_dir.clone()));
    match output_dir {
        Some(dir) => {
            for path in write_view_files(&translation, &dir)? {
                eprintln!("{} {}", "Wrote".green(), path.display());
            }
        }
        None => print!("{}", dump(&translation.to_value())),
    }

    if let Some(report_path) = &args.report {
        let views = translation
            .views
            .iter()
            .filter_map(|view| view.name().map(str::to_string))
            .collect();
        Report::new(views, translation.diagnostics.clone())
            .save_to_file(report_path)
            .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
        eprintln!("{} {}", "Report saved to:".green(), report_path.display());
    }

    print_translation_summary(&translation);
    Ok(())
}

/// Keep only `selected` models; an empty selection keeps everything
fn select_models(mut models: Vec<ModelSchema>, selected: &[String]) -> Vec<ModelSchema> {
    if !selected.is_empty() {
        models.retain(|model| {
            model
                .name
                .as_ref()
                .is_some_and(|name| selected.contains(name))
        });
    }
    models
}

fn print_translation_summary(translation: &Translation) {
    eprintln!();
    eprintln!(
        "{} {} view(s) generated",
        "✓".green(),
        translation.views.len()
    );

    let stripped = translation.stripped_properties().len();
    if stripped > 0 {
        eprintln!("  {} {} unsupported properties removed", "ℹ".cyan(), stripped);
    }

    for diagnostic in translation
        .diagnostics
        .iter()
        .filter(|d| d.severity >= Severity::Warn)
    {
        eprintln!("  {} {}", "⚠".yellow(), diagnostic.message);
    }
}

fn config_command(session: &Session, command: ConfigCommands) -> Result<()> {
    let path = session.config_path();

    match command {
        ConfigCommands::Init {
            project,
            dbt_project_dir,
            looker_project,
            lookml_output_dir,
            replace,
        } => {
            let mut config = DbteaConfig::load_or_default(&path)?;
            if config.projects.contains_key(&project) && !replace {
                eprintln!(
                    "{} project {} already configured in {}; pass --replace to overwrite",
                    "⚠".yellow(),
                    project,
                    path.display()
                );
                return Ok(());
            }

            config.upsert_project(
                project.clone(),
                ProjectConfig {
                    dbt_project_dir,
                    lookml_output_dir,
                    looker_project,
                    ..ProjectConfig::default()
                },
            );
            config.write(&path, true)?;
            eprintln!("{} {} in {}", "Configured".green(), project, path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = session.load_config()?;
            println!("{} {}", "Config:".bold(), path.display());
            if config.projects.is_empty() {
                println!("{}", "No projects configured".yellow());
            }
            for (name, project) in &config.projects {
                println!();
                println!("{}", name.bold().bright_blue());
                print_setting("dbt project", project.dbt_project_dir.as_ref().map(|p| p.display().to_string()));
                print_setting("LookML output", project.lookml_output_dir.as_ref().map(|p| p.display().to_string()));
                print_setting("Looker project", project.looker_project.clone());
                print_setting(
                    "Looker config",
                    Some(format!(
                        "{} [{}]",
                        project.looker_config_path(&session.profiles_dir).display(),
                        project.looker_section()
                    )),
                );
                print_setting(
                    "Git",
                    project
                        .git
                        .as_ref()
                        .map(|g| format!("{}/{} (base {})", g.organization, g.repository, g.base_branch)),
                );
            }
            Ok(())
        }
        ConfigCommands::Looker { project } => {
            let config = session.load_config()?;
            let written = config.write_looker_config(&project, &session.profiles_dir)?;
            eprintln!("{} {}", "Wrote".green(), written.display());
            Ok(())
        }
    }
}

fn print_setting(label: &str, value: Option<String>) {
    match value {
        Some(value) => println!("  {:<15} {}", format!("{}:", label), value),
        None => println!("  {:<15} {}", format!("{}:", label), "-".dimmed()),
    }
}

fn pr_command(session: &Session, command: PrCommands) -> Result<()> {
    match command {
        PrCommands::Create {
            head,
            base,
            title,
            description,
            project,
            organization,
            repository,
        } => {
            let git = session
                .project_config(project.as_deref())?
                .and_then(|p| p.git);

            let organization = organization
                .or_else(|| git.as_ref().map(|g| g.organization.clone()))
                .ok_or_else(|| missing_git_setting("organization"))?;
            let repository = repository
                .or_else(|| git.as_ref().map(|g| g.repository.clone()))
                .ok_or_else(|| missing_git_setting("repository"))?;

            let mut request = PullRequest::new(organization, repository, head);
            if let Some(base) = base.or_else(|| git.as_ref().map(|g| g.base_branch.clone())) {
                request = request.with_base(base);
            }
            if let Some(title) = title {
                request = request.with_title(title);
            }
            if let Some(description) = description {
                request = request.with_body(description);
            }

            let token_env = git.as_ref().map_or("GITHUB_TOKEN", |g| g.token_env.as_str());
            let mut provider = GitHubProvider::from_env(token_env)?;
            if let Some(api_url) = git.as_ref().and_then(|g| g.api_url.clone()) {
                provider = provider.with_api_url(api_url);
            }

            open_pull_request(&provider, &request)
        }
    }
}

fn missing_git_setting(setting: &str) -> DbteaError {
    DbteaError::invalid_input(
        "missing-git-settings",
        "Pull request target is incomplete",
        format!(
            "No {} given; pass --{} or configure a [projects.<name>.git] table",
            setting, setting
        ),
    )
}

fn open_pull_request(provider: &dyn PullRequestProvider, request: &PullRequest) -> Result<()> {
    eprintln!("{} {} via {}", "Opening pull request".cyan(), request, provider.name());
    let created = provider.create(request)?;
    match created.html_url {
        Some(url) => println!("{} {}", "✓ Created pull request:".green(), url),
        None => println!("{}", "✓ Created pull request".green()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use dbtea_git::MockProvider;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dbt_passthrough() {
        let cli = Cli::try_parse_from([
            "dbtea", "dbt", "run", "--target", "prod", "--", "--select", "orders",
        ])
        .unwrap();

        let Commands::Dbt { command } = cli.command else {
            panic!("expected dbt command");
        };
        let (command, args, codegen) = command.into_parts();
        assert_eq!(command, DbtCommand::Run);
        assert!(!codegen);
        assert_eq!(args.flags(), vec![DbtFlag::value("target", "prod")]);
        assert_eq!(args.passthrough, vec!["--select", "orders"]);
    }

    #[test]
    fn parses_run_operation() {
        let cli = Cli::try_parse_from([
            "dbtea",
            "dbt",
            "run-operation",
            "generate_model_yaml",
            "--args",
            "{model_name: orders}",
        ])
        .unwrap();

        let Commands::Dbt { command } = cli.command else {
            panic!("expected dbt command");
        };
        let (command, _, _) = command.into_parts();
        assert_eq!(
            command,
            DbtCommand::RunOperation {
                macro_name: "generate_model_yaml".to_string(),
                args: Some("{model_name: orders}".to_string()),
            }
        );
    }

    #[test]
    fn parses_views_options() {
        let cli = Cli::try_parse_from([
            "dbtea",
            "--project-dir",
            "fixtures/jaffle-shop",
            "lookml",
            "views",
            "--from",
            "manifest",
            "--select",
            "orders",
            "--infer-types",
        ])
        .unwrap();

        assert_eq!(cli.project_dir, Some(PathBuf::from("fixtures/jaffle-shop")));
        let Commands::Lookml { command: LookmlCommands::Views(args) } = cli.command else {
            panic!("expected lookml views");
        };
        assert_eq!(args.from, SchemaSource::Manifest);
        assert_eq!(args.select, vec!["orders"]);
        assert!(args.infer_types);
        assert!(!args.qualify_table_names);
    }

    #[test]
    fn selection_filters_by_name() {
        let models = vec![ModelSchema::new("orders"), ModelSchema::new("users")];
        let selected = select_models(models.clone(), &["users".to_string()]);
        assert_eq!(selected, vec![ModelSchema::new("users")]);
        assert_eq!(select_models(models.clone(), &[]), models);
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing = anyhow::Error::new(DbteaError::missing_resource("missing-dbt-project", "t", "d"));
        assert_eq!(exit_code_for(&missing), 101);

        let wrapped = anyhow::Error::new(DbteaError::invalid_input("x", "t", "d")).context("while testing");
        assert_eq!(exit_code_for(&wrapped), 100);

        assert_eq!(exit_code_for(&anyhow::anyhow!("plain failure")), 1);
    }

    #[test]
    fn pull_request_through_provider() {
        let provider = MockProvider::new();
        let request = PullRequest::new("acme", "looker", "dbtea/refresh");
        open_pull_request(&provider, &request).unwrap();
        assert_eq!(provider.requests(), vec![request]);
    }
}
