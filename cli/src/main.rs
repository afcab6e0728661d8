use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tkb_core::CourseMeeting;
use tkb_parser::output::{OutputFormat, format_profiles, format_records, format_report};
use tkb_parser::report::ParseReport;
use tkb_parser::{ParseOptions, parse_schedule_text_with_report};
use tkb_profiles::{InstitutionProfile, JsonFileStore, ProfileRegistry, SessionState};

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
            CliOutputFormat::Markdown => Self::Markdown,
            CliOutputFormat::Table => Self::Table,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tkb-parse")]
#[command(about = "Parse copy-pasted university timetable text into course records")]
struct Cli {
    /// Institution registry (YAML or JSON) to load instead of the built-ins.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// JSON file holding persisted session state.
    #[arg(long, global = true)]
    state: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse timetable text from stdin.
    ParseStdin(ParseStdinArgs),
    /// Parse timetable text from one or more files.
    ParseFile(ParseFileArgs),
    /// List the available institution profiles.
    Profiles(ProfilesArgs),
    /// Persist the default institution in the state file.
    Select(SelectArgs),
}

#[derive(Debug, Args)]
struct ParseOptionsArgs {
    /// Institution profile id (default: persisted selection, else the first profile).
    #[arg(long)]
    institution: Option<String>,
    /// Merge records that meet at the same times.
    #[arg(long, conflicts_with = "no_merge")]
    merge: bool,
    /// Keep one record per date range even if the profile merges by default.
    #[arg(long)]
    no_merge: bool,
    /// Output both records and the parse report.
    #[arg(long)]
    with_report: bool,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ParseStdinArgs {
    #[command(flatten)]
    options: ParseOptionsArgs,
}

#[derive(Debug, Args)]
struct ParseFileArgs {
    /// Path to a file containing timetable text (repeatable).
    #[arg(long, required = true)]
    input: Vec<PathBuf>,
    /// Number of parallel parse jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    #[command(flatten)]
    options: ParseOptionsArgs,
}

#[derive(Debug, Args)]
struct ProfilesArgs {
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct SelectArgs {
    /// Institution profile id.
    #[arg(long)]
    institution: String,
}

fn main() {
    let cli = Cli::parse();

    let context = Context {
        config: cli.config,
        state: cli.state,
    };
    let result = match cli.command {
        Command::ParseStdin(args) => run_parse_stdin(&context, args),
        Command::ParseFile(args) => run_parse_file(&context, args),
        Command::Profiles(args) => run_profiles(&context, args),
        Command::Select(args) => run_select(&context, args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Global options shared by every subcommand.
struct Context {
    config: Option<PathBuf>,
    state: Option<PathBuf>,
}

impl Context {
    fn registry(&self) -> Result<ProfileRegistry, String> {
        match &self.config {
            Some(path) => ProfileRegistry::load(path)
                .map_err(|e| format!("Failed to load registry '{}': {e}", path.display())),
            None => ProfileRegistry::builtin()
                .map_err(|e| format!("Failed to build built-in profiles: {e}")),
        }
    }

    fn store(&self) -> Result<Option<JsonFileStore>, String> {
        self.state
            .as_ref()
            .map(|path| {
                JsonFileStore::open(path)
                    .map_err(|e| format!("Failed to open state '{}': {e}", path.display()))
            })
            .transpose()
    }
}

fn resolve_profile<'r>(
    registry: &'r ProfileRegistry,
    store: Option<&JsonFileStore>,
    requested: Option<&str>,
) -> Result<&'r InstitutionProfile, String> {
    match (requested, store) {
        (Some(id), _) => registry.require(id).map_err(|e| {
            format!("{e} (available: {})", registry.ids().join(", "))
        }),
        (None, Some(store)) => Ok(registry.default_profile(store)),
        (None, None) => Ok(registry.first()),
    }
}

fn parse_options(args: &ParseOptionsArgs, profile: &InstitutionProfile) -> ParseOptions {
    let mut options = ParseOptions::for_profile(profile);
    if args.merge {
        options.merge_records = true;
    }
    if args.no_merge {
        options.merge_records = false;
    }
    options
}

// ---------------------------------------------------------------------------
// parse-stdin / parse-file
// ---------------------------------------------------------------------------

fn run_parse_stdin(context: &Context, args: ParseStdinArgs) -> Result<(), String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    run_parse_inputs(context, &args.options, vec![(None, text)], None)
}

fn run_parse_file(context: &Context, args: ParseFileArgs) -> Result<(), String> {
    let inputs = args
        .input
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .map(|text| (Some(path.display().to_string()), text))
                .map_err(|err| format!("Failed to read '{}': {err}", path.display()))
        })
        .collect::<Result<Vec<_>, String>>()?;
    run_parse_inputs(context, &args.options, inputs, args.jobs)
}

#[derive(serde::Serialize)]
struct ParseOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<&'a str>,
    records: &'a [CourseMeeting],
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ParseReport>,
}

struct ParsedInput {
    input: Option<String>,
    text: String,
    records: Vec<CourseMeeting>,
    report: ParseReport,
    warnings: Vec<String>,
}

fn run_parse_inputs(
    context: &Context,
    args: &ParseOptionsArgs,
    inputs: Vec<(Option<String>, String)>,
    jobs: Option<usize>,
) -> Result<(), String> {
    use rayon::prelude::*;

    let registry = context.registry()?;
    let mut store = context.store()?;
    let profile = resolve_profile(&registry, store.as_ref(), args.institution.as_deref())?;
    let options = parse_options(args, profile);
    let format: OutputFormat = args.format.into();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let parsed: Vec<ParsedInput> = pool.install(|| {
        inputs
            .into_par_iter()
            .map(|(input, text)| {
                let run = parse_schedule_text_with_report(profile, &text, options);
                ParsedInput {
                    input,
                    text,
                    records: run.result.records,
                    report: run.report,
                    warnings: run.result.warnings,
                }
            })
            .collect()
    });

    if !args.with_report {
        let failed: Vec<String> = parsed
            .iter()
            .filter(|p| p.records.is_empty())
            .map(|p| {
                format!(
                    "{}: {}",
                    p.input.as_deref().unwrap_or("stdin"),
                    if p.warnings.is_empty() {
                        "no records".to_string()
                    } else {
                        p.warnings.join("; ")
                    }
                )
            })
            .collect();
        if !failed.is_empty() {
            return Err(format!(
                "Failed to parse timetable for '{}': {}",
                profile.id(),
                failed.join(" | ")
            ));
        }
    }

    print_parsed(&parsed, profile, args.with_report, format)?;

    if let (Some(store), [single]) = (store.as_mut(), parsed.as_slice()) {
        if !single.records.is_empty() {
            let mut session = SessionState::load(&*store);
            session.data = single.text.clone();
            session.selected_university = Some(profile.id().to_string());
            session.save(&mut *store);
            store
                .persist()
                .map_err(|e| format!("Failed to save state '{}': {e}", store.path().display()))?;
        }
    }

    Ok(())
}

fn print_parsed(
    parsed: &[ParsedInput],
    profile: &InstitutionProfile,
    with_report: bool,
    format: OutputFormat,
) -> Result<(), String> {
    let outputs: Vec<ParseOutput<'_>> = parsed
        .iter()
        .map(|p| ParseOutput {
            input: p.input.as_deref(),
            records: &p.records,
            report: with_report.then_some(&p.report),
        })
        .collect();

    match format {
        OutputFormat::Json | OutputFormat::Yaml if !with_report && outputs.len() == 1 => {
            println!("{}", format_records(outputs[0].records, profile, format)?);
        }
        OutputFormat::Json => {
            let json = if outputs.len() == 1 {
                serde_json::to_string_pretty(&outputs[0])
            } else {
                serde_json::to_string_pretty(&outputs)
            }
            .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = if outputs.len() == 1 {
                serde_yaml::to_string(&outputs[0])
            } else {
                serde_yaml::to_string(&outputs)
            }
            .map_err(|e| format!("Failed to serialize output: {e}"))?;
            println!("{yaml}");
        }
        _ => {
            for p in parsed {
                if let (true, Some(input)) = (parsed.len() > 1, &p.input) {
                    println!("==> {input} <==");
                }
                print!("{}", format_records(&p.records, profile, format)?);
                if with_report {
                    print!("{}", format_report(&p.report, format)?);
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// profiles / select
// ---------------------------------------------------------------------------

fn run_profiles(context: &Context, args: ProfilesArgs) -> Result<(), String> {
    let registry = context.registry()?;
    print!("{}", format_profiles(registry.profiles(), args.format.into())?);
    Ok(())
}

fn run_select(context: &Context, args: SelectArgs) -> Result<(), String> {
    let registry = context.registry()?;
    let profile = resolve_profile(&registry, None, Some(&args.institution))?;
    let Some(mut store) = context.store()? else {
        return Err("select requires --state <PATH>".to_string());
    };

    let mut session = SessionState::load(&store);
    session.selected_university = Some(profile.id().to_string());
    session.save(&mut store);
    store
        .persist()
        .map_err(|e| format!("Failed to save state '{}': {e}", store.path().display()))?;
    println!("{}", profile.id());
    Ok(())
}
