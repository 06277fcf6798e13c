use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use roomcraft_contracts::chat::{parse_intent, ChatIntent, CHAT_HELP_COMMANDS};
use roomcraft_contracts::presets::{infer_style, quick_style, QUICK_STYLES};
use roomcraft_contracts::records::{BudgetTier, DesignRequest};
use roomcraft_contracts::runs::report::RunReport;
use roomcraft_engine::{discover_photos, Orchestrator, RunKind, RunOutcome, Settings};
use tracing::warn;

use crate::{file_label, print_outcome, print_plan, print_presets};

struct Session {
    image: PathBuf,
    input_dir: PathBuf,
    style: Option<String>,
    budget: BudgetTier,
    report: Option<RunReport>,
}

pub(crate) fn run_session(settings: &Settings, orchestrator: &Orchestrator<'_>) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let photos = match discover_photos(settings.input_dir(), settings.max_photos) {
        Ok(photos) => photos,
        Err(err) => {
            warn!(dir = %settings.input_dir().display(), "cannot list photos: {err}");
            Vec::new()
        }
    };

    println!("Roomcraft interactive session.");
    let Some(image) = choose_image(&mut input, &photos, settings.input_dir())? else {
        return Ok(());
    };
    let Some(instruction) = choose_instruction(&mut input)? else {
        return Ok(());
    };
    let Some(budget) = choose_budget(&mut input)? else {
        return Ok(());
    };

    let request = build_request(&image, &instruction, None, budget);
    println!(
        "\nPhoto: {}\nInstruction: {}\nStyle: {}\nBudget: {} ({})",
        file_label(&image),
        instruction,
        request.style,
        budget,
        budget.price_band()
    );
    if !confirm(&mut input)? {
        println!("Cancelled.");
        return Ok(());
    }

    let mut session = Session {
        image,
        input_dir: settings.input_dir().to_path_buf(),
        style: None,
        budget,
        report: None,
    };
    session.transform(orchestrator, &request);
    println!("\nType a new instruction, or /help for commands.");
    command_loop(&mut input, orchestrator, &mut session)
}

fn command_loop(
    input: &mut impl BufRead,
    orchestrator: &Orchestrator<'_>,
    session: &mut Session,
) -> Result<()> {
    while let Some(line) = prompt(input, "> ")? {
        match parse_intent(&line) {
            ChatIntent::Noop => {}
            ChatIntent::Instruction(text) => {
                let request =
                    build_request(&session.image, &text, session.style.as_deref(), session.budget);
                session.transform(orchestrator, &request);
            }
            ChatIntent::Refine(text) => session.refine(orchestrator, &text),
            ChatIntent::SetStyle(style) => {
                println!("Style for the next instruction: {style}");
                session.style = Some(style);
            }
            ChatIntent::SetBudget(tier) => {
                println!("Budget set to {tier} ({})", tier.price_band());
                session.budget = tier;
            }
            ChatIntent::SetImage(path) => match locate_photo(&path, &session.input_dir) {
                Some(found) => {
                    println!("Photo set to {}", found.display());
                    session.image = found;
                    session.report = None;
                }
                None => println!("Photo not found: {}", path.display()),
            },
            ChatIntent::Show => session.show(),
            ChatIntent::Presets => print_presets(),
            ChatIntent::Help => {
                for help in CHAT_HELP_COMMANDS {
                    println!("  {:<30} {}", help.usage, help.summary);
                }
            }
            ChatIntent::Quit => break,
            ChatIntent::Invalid { reason, .. } => println!("{reason}"),
            ChatIntent::Unknown { command, .. } => {
                println!("Unknown command /{command}; type /help for commands.")
            }
        }
    }
    Ok(())
}

impl Session {
    fn transform(&mut self, orchestrator: &Orchestrator<'_>, request: &DesignRequest) {
        let result = orchestrator.run(&self.image, request, RunKind::Interactive);
        self.absorb(result.map_err(anyhow::Error::from));
    }

    fn refine(&mut self, orchestrator: &Orchestrator<'_>, text: &str) {
        let Some(report) = self.report.clone() else {
            println!("Nothing to refine yet; describe a transformation first.");
            return;
        };
        let result = orchestrator.refine(report, text);
        self.absorb(result.map_err(anyhow::Error::from));
    }

    fn absorb(&mut self, result: Result<RunOutcome>) {
        match result {
            Ok(outcome) => {
                print_outcome(&outcome);
                if outcome.succeeded() {
                    self.report = Some(outcome.report);
                }
            }
            Err(err) => println!("Results could not be saved: {err:#}"),
        }
    }

    fn show(&self) {
        println!(
            "Photo: {} | style: {} | budget: {}",
            file_label(&self.image),
            self.style.as_deref().unwrap_or("from instruction"),
            self.budget
        );
        match self.report.as_ref().and_then(RunReport::latest_plan) {
            Some(plan) => print_plan(plan),
            None => println!("No design yet."),
        }
    }
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(line.trim().to_string())),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

fn choose_image(
    input: &mut impl BufRead,
    photos: &[PathBuf],
    input_dir: &Path,
) -> Result<Option<PathBuf>> {
    if photos.is_empty() {
        println!("No photos found in {}.", input_dir.display());
    } else {
        println!("Photos in {}:", input_dir.display());
        for (index, photo) in photos.iter().enumerate() {
            println!("  {}. {}", index + 1, file_label(photo));
        }
    }
    loop {
        let Some(answer) = prompt(input, "Choose a photo (number, file name or path): ")? else {
            return Ok(None);
        };
        match resolve_image_choice(&answer, photos, input_dir) {
            Some(path) => return Ok(Some(path)),
            None => println!("No such photo: {answer}"),
        }
    }
}

fn resolve_image_choice(answer: &str, photos: &[PathBuf], input_dir: &Path) -> Option<PathBuf> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    if let Ok(number) = answer.parse::<usize>() {
        if (1..=photos.len()).contains(&number) {
            return Some(photos[number - 1].clone());
        }
    }
    locate_photo(Path::new(answer), input_dir)
}

fn locate_photo(path: &Path, input_dir: &Path) -> Option<PathBuf> {
    let in_dir = input_dir.join(path);
    if path.is_relative() && in_dir.is_file() {
        return Some(in_dir);
    }
    path.is_file().then(|| path.to_path_buf())
}

fn choose_instruction(input: &mut impl BufRead) -> Result<Option<String>> {
    println!("\nQuick styles:");
    for (index, quick) in QUICK_STYLES.iter().enumerate() {
        println!("  {}. {}", index + 1, quick.name);
    }
    loop {
        let Some(answer) = prompt(input, "Describe the transformation (or pick a quick style): ")?
        else {
            return Ok(None);
        };
        match resolve_instruction(&answer) {
            Some(instruction) => return Ok(Some(instruction)),
            None => println!("Please describe the change you want."),
        }
    }
}

fn resolve_instruction(answer: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    if let Ok(number) = answer.parse::<usize>() {
        if let Some(quick) = number.checked_sub(1).and_then(|index| QUICK_STYLES.get(index)) {
            return Some(quick.instruction.to_string());
        }
    }
    if let Some(quick) = quick_style(answer) {
        return Some(quick.instruction.to_string());
    }
    Some(answer.to_string())
}

fn choose_budget(input: &mut impl BufRead) -> Result<Option<BudgetTier>> {
    println!("\nBudget:");
    for (index, tier) in BudgetTier::ALL.iter().enumerate() {
        println!("  {}. {} ({})", index + 1, tier, tier.price_band());
    }
    loop {
        let Some(answer) = prompt(input, "Choose a budget [2]: ")? else {
            return Ok(None);
        };
        if answer.is_empty() {
            return Ok(Some(BudgetTier::default()));
        }
        match answer.parse::<BudgetTier>() {
            Ok(tier) => return Ok(Some(tier)),
            Err(err) => println!("{err}"),
        }
    }
}

fn confirm(input: &mut impl BufRead) -> Result<bool> {
    let answer = prompt(input, "Proceed? [Y/n] ")?.unwrap_or_default();
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "" | "y" | "yes"))
}

fn build_request(
    image: &Path,
    instruction: &str,
    style: Option<&str>,
    budget: BudgetTier,
) -> DesignRequest {
    let style = style
        .map(str::to_string)
        .unwrap_or_else(|| infer_style(instruction));
    DesignRequest::new(style, budget)
        .with_instruction(instruction)
        .with_reference_image(image)
}
