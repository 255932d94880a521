use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use ecosphere_contracts::analysis::{mime_for_path, AnalysisResult, DEFAULT_IMAGE_MIME};
use ecosphere_contracts::chat::{parse_intent, Intent, CHAT_HELP_COMMANDS};
use ecosphere_contracts::events::EventWriter;
use ecosphere_contracts::prompts::{impact_prompt, irrigation_prompt, AnalysisKind};
use ecosphere_engine::{ChatSession, EcoEngine, EngineConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_LOG_FILTER: &str = "warn";
const CHAT_SEND_FAILED: &str = "Sorry, I encountered an error. Please try again.";
const CHAT_OFFLINE: &str = "EcoBot is offline. Set GEMINI_API_KEY to enable chat.";
const CHAT_UNREACHABLE: &str = "EcoBot could not reach a chat model. Restart the chat to try again.";

#[derive(Debug, Parser)]
#[command(name = "ecosphere", version, about = "Ecosphere Guardian sustainability assistant")]
struct Cli {
    /// Append a JSONL audit record for every AI request to this file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Per-attempt request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<f64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Analyze(AnalyzeArgs),
    Advice(AdviceArgs),
    Tip,
    Irrigation(IrrigationArgs),
    Impact(ImpactArgs),
    Aqi(AqiArgs),
    Ask(AskArgs),
    Chat,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(value_parser = parse_kind)]
    kind: AnalysisKind,
    image: PathBuf,
    /// Replace the built-in instruction for this kind.
    #[arg(long)]
    prompt: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct AdviceArgs {
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,
}

#[derive(Debug, Parser)]
struct IrrigationArgs {
    #[arg(long)]
    crop: String,
    /// Soil moisture reading in percent.
    #[arg(long)]
    moisture: f64,
}

#[derive(Debug, Parser)]
struct ImpactArgs {
    #[arg(long)]
    aqi: u32,
    #[arg(long)]
    ph: f64,
}

#[derive(Debug, Parser)]
struct AqiArgs {
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    city: Option<String>,
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
}

#[derive(Debug, Parser)]
struct AskArgs {
    #[arg(long)]
    context: Option<String>,
    #[arg(long, conflicts_with = "context")]
    context_file: Option<PathBuf>,
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum AqiLocation {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("ecosphere error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    init_tracing();
    let cli = Cli::parse();
    let engine = build_engine(cli.events.as_deref(), cli.timeout)?;
    match cli.command {
        Command::Analyze(args) => run_analyze(&engine, args),
        Command::Advice(args) => {
            println!("{}", engine.get_advice(&args.prompt.join(" ")));
            Ok(0)
        }
        Command::Tip => {
            println!("{}", engine.get_daily_tip());
            Ok(0)
        }
        Command::Irrigation(args) => {
            println!(
                "{}",
                engine.get_advice(&irrigation_prompt(args.crop.trim(), args.moisture))
            );
            Ok(0)
        }
        Command::Impact(args) => {
            println!("{}", engine.get_advice(&impact_prompt(args.aqi, args.ph)));
            Ok(0)
        }
        Command::Aqi(args) => {
            let report = match aqi_location(&args)? {
                AqiLocation::City(city) => engine.get_city_air_quality(&city),
                AqiLocation::Coordinates { lat, lon } => {
                    engine.get_air_quality_by_coordinates(lat, lon)
                }
            };
            println!("{report}");
            Ok(0)
        }
        Command::Ask(args) => {
            let context = match (args.context, args.context_file) {
                (Some(context), _) => context,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read context file {}", path.display()))?,
                (None, None) => bail!("ask requires --context or --context-file"),
            };
            println!(
                "{}",
                engine.get_contextual_advice(context.trim(), &args.question.join(" "))
            );
            Ok(0)
        }
        Command::Chat => {
            run_chat(&engine)?;
            Ok(0)
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn build_engine(events: Option<&Path>, timeout: Option<f64>) -> Result<EcoEngine> {
    let mut config = EngineConfig::from_env();
    if let Some(seconds) = timeout {
        config = config.with_timeout_seconds(seconds);
    }
    let engine = EcoEngine::from_config(&config);
    let Some(path) = events else {
        return Ok(engine);
    };
    let writer = EventWriter::create(path, Uuid::new_v4().to_string())?;
    info!(
        path = %writer.path().display(),
        session_id = writer.session_id(),
        "recording request events"
    );
    Ok(engine.with_events(writer))
}

fn run_analyze(engine: &EcoEngine, args: AnalyzeArgs) -> Result<i32> {
    let image = encode_image_file(&args.image)?;
    let instruction = args
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .unwrap_or(args.kind.instruction());
    match engine.analyze(&image, instruction) {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", format_analysis(&result));
            }
            Ok(0)
        }
        Err(err) => {
            eprintln!("Analysis failed [{}]: {err}", err.code());
            Ok(1)
        }
    }
}

fn run_chat(engine: &EcoEngine) -> Result<()> {
    let mut session = engine.create_chat_session();
    let mut last_reply: Option<String> = None;

    match session.as_ref() {
        Some(session) => println!(
            "EcoBot ready ({}). Type /help for commands.",
            session.model()
        ),
        None => println!(
            "{} Slash commands still respond. Type /help for commands.",
            chat_unavailable_message(engine)
        ),
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let intent = parse_intent(line.trim_end_matches(['\n', '\r']));
        if intent.action == "noop" {
            continue;
        }
        if let Some(reply) = handle_intent(engine, session.as_mut(), last_reply.as_deref(), &intent)
        {
            println!("{reply}");
            last_reply = Some(reply);
        }
        if intent.action == "reset" {
            last_reply = None;
        }
    }
    Ok(())
}

/// Runs one chat intent. Returns the assistant text worth keeping as `/ask` context.
fn handle_intent(
    engine: &EcoEngine,
    session: Option<&mut ChatSession>,
    last_reply: Option<&str>,
    intent: &Intent,
) -> Option<String> {
    match intent.action.as_str() {
        "help" => {
            println!("Commands: {}", CHAT_HELP_COMMANDS.join(" "));
            None
        }
        "reset" => {
            if let Some(session) = session {
                session.reset();
            }
            println!("Conversation cleared.");
            None
        }
        "analyze_food" | "analyze_plant" | "analyze_waste" => {
            let kind = intent
                .action
                .strip_prefix("analyze_")
                .and_then(AnalysisKind::parse)?;
            let path = Path::new(intent.arg_str("path")?);
            if !path.exists() {
                println!("Analysis failed: file not found ({})", path.display());
                return None;
            }
            let image = match encode_image_file(path) {
                Ok(image) => image,
                Err(err) => {
                    println!("Analysis failed: {err:#}");
                    return None;
                }
            };
            match engine.analyze(&image, kind.instruction()) {
                Ok(result) => Some(format_analysis(&result)),
                Err(err) => {
                    println!("Analysis failed: {err}");
                    None
                }
            }
        }
        "advice" => Some(engine.get_advice(intent.arg_str("prompt")?)),
        "tip" => Some(engine.get_daily_tip()),
        "city_air_quality" => Some(engine.get_city_air_quality(intent.arg_str("city")?)),
        "coordinates_air_quality" => Some(engine.get_air_quality_by_coordinates(
            intent.arg_f64("lat")?,
            intent.arg_f64("lon")?,
        )),
        "irrigation" => Some(engine.get_advice(&irrigation_prompt(
            intent.arg_str("crop")?,
            intent.arg_f64("moisture")?,
        ))),
        "impact" => {
            let aqi = intent.arg_f64("aqi")?;
            if aqi < 0.0 {
                println!("/impact: aqi must not be negative");
                return None;
            }
            Some(engine.get_advice(&impact_prompt(aqi.round() as u32, intent.arg_f64("ph")?)))
        }
        "ask" => {
            let Some(context) = last_reply else {
                println!("/ask needs an earlier reply or report to use as context.");
                return None;
            };
            Some(engine.get_contextual_advice(context, intent.arg_str("question")?))
        }
        "chat" => {
            let message = intent.message.as_deref()?;
            let Some(session) = session else {
                println!("{}", chat_unavailable_message(engine));
                return None;
            };
            match session.send_message(message) {
                Ok(reply) => Some(reply),
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "chat message failed");
                    println!("{CHAT_SEND_FAILED}");
                    None
                }
            }
        }
        "invalid" => {
            println!(
                "/{}: {}",
                intent.arg_str("command").unwrap_or_default(),
                intent.arg_str("reason").unwrap_or("invalid arguments")
            );
            None
        }
        _ => {
            println!(
                "Unknown command /{}. Commands: {}",
                intent.arg_str("command").unwrap_or_default(),
                CHAT_HELP_COMMANDS.join(" ")
            );
            None
        }
    }
}

fn chat_unavailable_message(engine: &EcoEngine) -> &'static str {
    if engine.is_available() {
        CHAT_UNREACHABLE
    } else {
        CHAT_OFFLINE
    }
}

fn parse_kind(raw: &str) -> Result<AnalysisKind, String> {
    AnalysisKind::parse(raw).ok_or_else(|| format!("expected food, plant or waste (got '{raw}')"))
}

fn aqi_location(args: &AqiArgs) -> Result<AqiLocation> {
    match (args.city.as_deref(), args.lat, args.lon) {
        (Some(city), _, _) => Ok(AqiLocation::City(city.trim().to_string())),
        (None, Some(lat), Some(lon)) => Ok(AqiLocation::Coordinates { lat, lon }),
        _ => bail!("aqi requires --city <name> or --lat <deg> --lon <deg>"),
    }
}

fn encode_image_file(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(image_data_uri(
        mime_for_path(path).unwrap_or(DEFAULT_IMAGE_MIME),
        &bytes,
    ))
}

fn image_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
}

fn format_analysis(result: &AnalysisResult) -> String {
    let mut lines = vec![
        format!("{} ({})", result.title, result.category),
        format!(
            "Status: {} | Confidence: {:.0}%",
            result.status,
            result.confidence * 100.0
        ),
    ];
    for metric in &result.metrics {
        lines.push(format!("{}: {}", metric.label, metric.value));
    }
    if !result.description.trim().is_empty() {
        lines.push(String::new());
        lines.push(result.description.trim().to_string());
    }
    if !result.recommendations.is_empty() {
        lines.push(String::new());
        lines.push("Recommendations:".to_string());
        for recommendation in &result.recommendations {
            lines.push(format!("- {recommendation}"));
        }
    }
    lines.join("\n")
}
