use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use roomcraft_contracts::models::{ModelRegistry, ModelSelector, CAP_IMAGE, CAP_TEXT, CAP_VISION};
use roomcraft_contracts::presets::{QUICK_STYLES, STYLE_PRESETS};
use roomcraft_contracts::records::{BudgetTier, DesignRequest};
use roomcraft_contracts::runs::report::load_report;
use roomcraft_engine::client::{generate_text, text_part};
use roomcraft_engine::{
    discover_photos, AssessmentAgent, CoordinatorAgent, GeminiClient, ImageSynthesizer,
    LlmTaskRunner, Orchestrator, Progress, RenderingGenerator, RoomAnalyzer, RunKind, RunOutcome,
    RunState, Settings,
};
use tracing_subscriber::EnvFilter;

mod interactive;

#[derive(Debug, Parser)]
#[command(name = "roomcraft", version, about = "Redesign a room from a photo with Gemini")]
struct Cli {
    /// Log engine progress at info level (RUST_LOG takes precedence).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(flatten)]
    overrides: SettingsArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Default, Args)]
struct SettingsArgs {
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true)]
    vision_model: Option<String>,
    #[arg(long, global = true)]
    image_model: Option<String>,
    #[arg(long, global = true)]
    fallback_image_model: Option<String>,
    #[arg(long, global = true)]
    text_model: Option<String>,
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    events: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a photo, render a design and plan the project.
    Run(RunArgs),
    /// Analyze a photo and print the assessment only.
    Analyze(AnalyzeArgs),
    /// Refine the latest design in a saved report.
    Refine(RefineArgs),
    /// Guided session with a command loop for follow-up changes.
    Interactive,
    /// Validate configuration and make one short model call.
    Check,
    /// List style presets and quick-style instructions.
    Presets,
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Room photo; defaults to the first photo in the input directory.
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long, default_value = "modern minimalist")]
    style: String,
    #[arg(long, default_value = "moderate")]
    budget: BudgetTier,
    /// Free-text design instruction used instead of the style brief.
    #[arg(long)]
    prompt: Option<String>,
    /// Do not send the photo along with the rendering request.
    #[arg(long)]
    no_reference: bool,
    /// Print the saved report as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct RefineArgs {
    #[arg(long)]
    report: PathBuf,
    #[arg(long)]
    request: String,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("roomcraft error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Presets => {
            print_presets();
            Ok(())
        }
        Command::Check => run_check(&load_settings(&cli.overrides)?),
        Command::Run(args) => run_one_shot(&load_settings(&cli.overrides)?, args),
        Command::Analyze(args) => run_analyze(&load_settings(&cli.overrides)?, args),
        Command::Refine(args) => run_refine(&load_settings(&cli.overrides)?, args),
        Command::Interactive => {
            let settings = load_settings(&cli.overrides)?;
            with_orchestrator(&settings, |orchestrator| {
                interactive::run_session(&settings, orchestrator)
            })
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_settings(overrides: &SettingsArgs) -> Result<Settings> {
    let api_key = overrides.api_key.clone();
    let mut settings = Settings::from_lookup(|key| match key {
        "GOOGLE_API_KEY" => api_key.clone().or_else(|| std::env::var(key).ok()),
        _ => std::env::var(key).ok(),
    })
    .context("loading configuration")?;
    apply_overrides(&mut settings, overrides);
    settings.validate().context("validating configuration")?;
    Ok(settings)
}

fn apply_overrides(settings: &mut Settings, overrides: &SettingsArgs) {
    if let Some(model) = &overrides.vision_model {
        settings.vision_model = model.clone();
    }
    if let Some(model) = &overrides.image_model {
        settings.image_model = model.clone();
    }
    if let Some(model) = &overrides.fallback_image_model {
        settings.fallback_image_model = Some(model.clone());
    }
    if let Some(model) = &overrides.text_model {
        settings.text_model = model.clone();
    }
    if let Some(dir) = &overrides.input_dir {
        settings.input_dir = dir.clone();
    }
    if let Some(dir) = &overrides.output_dir {
        settings.output_dir = dir.clone();
    }
    if let Some(path) = &overrides.events {
        settings.events_path = Some(path.clone());
    }
}

/// Prints stage changes and engine messages to stdout.
pub(crate) struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn stage(&self, state: RunState) {
        let label = match state {
            RunState::Idle => return,
            RunState::Analyzing => "Analyzing the room",
            RunState::Generating => "Generating the design",
            RunState::Refining => "Refining the design",
            RunState::Persisted => "Saving results",
            RunState::Failed => "Run failed",
        };
        println!("==> {label}");
    }

    fn message(&self, text: &str) {
        println!("    {text}");
    }
}

fn with_orchestrator<T>(
    settings: &Settings,
    body: impl FnOnce(&Orchestrator<'_>) -> Result<T>,
) -> Result<T> {
    let client = GeminiClient::new(settings).context("building model client")?;
    let runner = LlmTaskRunner::new(&client, settings.text_model.clone());
    let progress = ConsoleProgress;
    let synthesizer = ImageSynthesizer::from_settings(&client, settings);
    let assessor = AssessmentAgent::new(
        RoomAnalyzer::new(&client, settings.vision_model.clone()),
        &runner,
    );
    let coordinator = CoordinatorAgent::new(
        RenderingGenerator::new(
            &client,
            settings.text_model.clone(),
            settings.vision_model.clone(),
            Some(synthesizer),
        ),
        &runner,
    );
    let orchestrator = Orchestrator::new(
        assessor,
        coordinator,
        settings.output_dir.clone(),
        settings.output_naming,
        &progress,
    )
    .with_events_path(settings.events_path());
    body(&orchestrator)
}

fn pick_image(settings: &Settings, requested: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = requested {
        if !path.is_file() {
            bail!("image not found: {}", path.display());
        }
        return Ok(path);
    }
    let photos = discover_photos(settings.input_dir(), settings.max_photos)
        .with_context(|| format!("reading {}", settings.input_dir().display()))?;
    match photos.into_iter().next() {
        Some(path) => Ok(path),
        None => bail!(
            "no jpg/jpeg/png photos in {}; pass --image",
            settings.input_dir().display()
        ),
    }
}

fn run_one_shot(settings: &Settings, args: RunArgs) -> Result<()> {
    let image = pick_image(settings, args.image)?;
    let mut request = DesignRequest::new(args.style, args.budget);
    if let Some(prompt) = args.prompt.filter(|text| !text.trim().is_empty()) {
        request = request.with_instruction(prompt);
    }
    if !args.no_reference {
        request = request.with_reference_image(&image);
    }

    let outcome = with_orchestrator(settings, |orchestrator| {
        Ok(orchestrator.run(&image, &request, RunKind::OneShot)?)
    })?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn run_analyze(settings: &Settings, args: AnalyzeArgs) -> Result<()> {
    let image = pick_image(settings, args.image)?;
    with_orchestrator(settings, |orchestrator| {
        match orchestrator.analyze_only(&image) {
            Ok(assessment) => {
                println!("{}", assessment.raw_analysis.summary());
                println!("PROFESSIONAL ASSESSMENT\n{}", assessment.professional_assessment);
            }
            Err(err) => println!("Analysis failed ({}): {err}", err.kind()),
        }
        Ok(())
    })
}

fn run_refine(settings: &Settings, args: RefineArgs) -> Result<()> {
    let report = load_report(&args.report)
        .with_context(|| format!("loading report {}", args.report.display()))?;
    let outcome = with_orchestrator(settings, |orchestrator| {
        Ok(orchestrator.refine(report, &args.request)?)
    })?;
    print_outcome(&outcome);
    Ok(())
}

fn run_check(settings: &Settings) -> Result<()> {
    println!("Configuration OK");
    println!("  api base:   {}", settings.api_base);
    println!("  output dir: {}", settings.output_dir.display());
    println!("  run log:    {}", settings.events_path().display());
    println!("  naming:     {}", settings.output_naming);

    let registry = ModelRegistry::default();
    let known: Vec<&str> = registry.list().map(|spec| spec.name.as_str()).collect();
    println!("  known models: {}", known.join(", "));
    let selector = ModelSelector::new(Some(registry.clone()));
    let mut roles = vec![
        ("vision", settings.vision_model.as_str(), CAP_VISION),
        ("image", settings.image_model.as_str(), CAP_IMAGE),
        ("text", settings.text_model.as_str(), CAP_TEXT),
    ];
    if let Some(model) = settings.fallback_image_model.as_deref() {
        roles.push(("fallback image", model, CAP_IMAGE));
    }
    for (role, model, capability) in roles {
        let spec = registry.resolve(model);
        let known = if registry.get(model).is_some() { "" } else { " (inferred)" };
        println!(
            "  {role} model: {} [{}] via {}{known}",
            spec.name,
            spec.capabilities.join(", "),
            spec.provider
        );
        if !spec.supports(capability) {
            let hint = selector
                .select(Some(model), capability)
                .map(|selection| format!("try {}", selection.model.name))
                .unwrap_or_else(|reason| reason);
            println!("    warning: no '{capability}' capability; {hint}");
        }
    }

    let client = GeminiClient::new(settings).context("building model client")?;
    let chain = ImageSynthesizer::from_settings(&client, settings).backend_names();
    println!("  image chain: {}", chain.join(" -> "));
    let reply = generate_text(
        &client,
        &settings.text_model,
        vec![text_part("Reply with the single word: ready")],
        None,
    )
    .context("text model check call")?;
    println!("Text model replied: {}", reply.trim());
    Ok(())
}

fn print_presets() {
    println!("Style presets:");
    for style in STYLE_PRESETS {
        println!("  - {style}");
    }
    println!("\nQuick styles:");
    for (index, quick) in QUICK_STYLES.iter().enumerate() {
        println!("  {}. {}: {}", index + 1, quick.name, quick.instruction);
    }
}

pub(crate) fn print_outcome(outcome: &RunOutcome) {
    if let Some(record) = outcome.analysis() {
        println!("\n{}", record.summary());
    }
    if outcome.succeeded() {
        if let Some(plan) = outcome.plan() {
            print_plan(plan);
        }
    } else {
        let error = outcome.report.error.as_deref().unwrap_or("unknown error");
        println!("\nRun failed: {error}");
    }
    println!("\nReport: {}", outcome.report_path.display());
}

pub(crate) fn print_plan(plan: &roomcraft_contracts::records::ProjectPlan) {
    let rendering = &plan.rendering;
    let version = plan
        .version
        .map(|version| format!(" (v{version})"))
        .unwrap_or_default();
    println!(
        "\nDESIGN{version}: {} {} / {} budget",
        plan.design_style,
        plan.room_type,
        plan.budget_range.price_band()
    );
    if let Some(description) = rendering.description() {
        println!("\n{description}");
    }
    match (&rendering.image_path, &rendering.note) {
        (Some(path), _) => match (rendering.image_width, rendering.image_height) {
            (Some(width), Some(height)) => println!("\nRendered image: {path} ({width}x{height})"),
            _ => println!("\nRendered image: {path}"),
        },
        (None, Some(note)) => println!("\nNote: {note}"),
        (None, None) => {}
    }
    if !plan.project_plan.trim().is_empty() {
        println!("\nPROJECT PLAN\n{}", plan.project_plan);
    }
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
