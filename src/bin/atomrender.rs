use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize};
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// Import from organized modules
use atomrender::error::AtomError;
use atomrender::formatting::{format_number_with_commas, format_quota};
use atomrender::identity::{self, UserIdentity};
use atomrender::ledger;
use atomrender::mask::{StrokeLayer, Tool, binarize, binarize_overlay};
use atomrender::types::{
    AspectRatio, ImageBlob, ModelTier, OperationKind, RemainingTime, RenderHistoryItem,
    RenderRequestSpec, SizeTier, UsageStats,
};
use atomrender::utils::get_data_dir;
use atomrender::{
    ChatSession, Config, FileStore, GeminiClient, GenerationService, HistoryLog, KeyValueStore,
    RegionMask, Result, Studio,
};

#[derive(Parser)]
#[command(
    name = "atomrender",
    version,
    about = "Photorealistic architectural renders from sketches",
    long_about = "Turns SketchUp screenshots into photorealistic renders with a hosted image model,\n\
                  edits results inside a painted region, and tracks the daily free quota.\n\
                  \n\
                  Environment Variables:\n\
                    GEMINI_API_KEY / API_KEY         # Generation service key\n\
                    ATOMRENDER_HOME                  # Data directory (default: ~/.atomrender)\n\
                    RUST_LOG                         # Log filter (default: atomrender=warn)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Data directory holding config, history, usage and user records
    #[arg(long, env = "ATOMRENDER_HOME", global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with an email address
    Login { email: String },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show quota usage and time until the window resets
    Status,
    /// Price a render or edit without submitting it
    Quote {
        #[command(flatten)]
        options: RenderOptions,
        /// Price an edit instead of a create
        #[arg(long)]
        edit: bool,
    },
    /// Render a sketch into a photorealistic image
    Render {
        /// Sketch image (PNG or JPEG)
        sketch: PathBuf,
        /// Architecture style
        #[arg(long, short = 'p', default_value = "")]
        prompt: String,
        #[command(flatten)]
        options: RenderOptions,
        /// Output file (default: render-<id>.<ext>)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Modify a render, optionally only inside a painted region
    Edit {
        /// Image to edit
        image: PathBuf,
        /// Requested change
        #[arg(long, short = 'p')]
        prompt: String,
        /// Transparent overlay whose painted pixels mark the region
        #[arg(long, conflicts_with = "stroke")]
        mask: Option<PathBuf>,
        /// Brush path "x,y x,y ..." painted over the image; repeatable
        #[arg(long)]
        stroke: Vec<String>,
        /// Brush width in pixels
        #[arg(long, default_value_t = atomrender::constants::DEFAULT_BRUSH_SIZE)]
        brush_size: f32,
        /// Write the binarized mask here as well
        #[arg(long)]
        save_mask: Option<PathBuf>,
        #[command(flatten)]
        options: RenderOptions,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// Generate a square image from text alone (not metered)
    Imagine {
        prompt: String,
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
    /// List past renders, newest first
    History {
        #[arg(long, short = 'n', default_value = "10")]
        limit: usize,
    },
    /// Chat with the rendering assistant (reads lines from stdin)
    Chat,
}

#[derive(Args, Clone, Copy)]
struct RenderOptions {
    #[arg(long, default_value_t = SizeTier::FullHd)]
    size: SizeTier,
    #[arg(long, default_value_t = ModelTier::Free)]
    tier: ModelTier,
    #[arg(long, default_value_t = AspectRatio::Widescreen)]
    aspect: AspectRatio,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "atomrender=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "❌".red(), e);
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("   {}", cause.to_string().dimmed());
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Configure rayon thread pool for mask binarization
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .thread_name(|i| format!("atomrender-worker-{}", i))
        .build_global()?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => get_data_dir()?,
    };
    let config = Config::load(&data_dir).with_env_api_key();
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&data_dir)?);

    match cli.command {
        Command::Login { email } => {
            let user = identity::login(store.as_ref(), &email)?;
            println!("{} Signed in as {}", "✅".green(), user_label(&user));
        }
        Command::Logout => {
            identity::logout(store.as_ref())?;
            println!("Signed out");
        }
        Command::Whoami => match identity::current_user(store.as_ref()) {
            Some(user) => println!("{}", user_label(&user)),
            None => println!("{}", "Not signed in".dimmed()),
        },
        Command::Status => {
            let now = Utc::now();
            let usage = ledger::load_or_init(store.as_ref(), now);
            print_status(&usage, config.daily_free_limit, now);
        }
        Command::Quote { options, edit } => {
            let operation = if edit {
                OperationKind::Edit
            } else {
                OperationKind::Create
            };
            let spec = RenderRequestSpec::new(options.size, options.tier, operation);
            warn_downgrade(options, spec);
            println!(
                "{} {} {}: {}",
                spec.size(),
                spec.tier(),
                operation_label(operation),
                cost_label(config.cost_model().cost_of(&spec).to_label()),
            );
        }
        Command::Render {
            sketch,
            prompt,
            options,
            out,
        } => {
            require_user(store.as_ref())?;
            let sketch = ImageBlob::from_path(&sketch)?;
            let mut studio = open_online(store, &config)?;
            apply_options(&mut studio, options);

            eprintln!("{}", "Rendering...".dimmed());
            let item = studio.render(sketch, &prompt, Utc::now()).await?;
            let path = save_result(&item, out).await?;
            println!(
                "{} {} ({}) -> {}",
                "✅".green(),
                item.prompt,
                cost_label(item.cost.to_label()),
                path.display()
            );
            print_status(studio.usage(), studio.daily_limit(), Utc::now());
        }
        Command::Edit {
            image,
            prompt,
            mask,
            stroke,
            brush_size,
            save_mask,
            options,
            out,
        } => {
            require_user(store.as_ref())?;
            let base = ImageBlob::from_path(&image)?;
            let region = build_mask(&base, mask.as_deref(), &stroke, brush_size)?;
            if let (Some(region), Some(path)) = (&region, &save_mask) {
                write_file(path, &region.to_png()?).await?;
            }
            if let Some(region) = &region {
                println!(
                    "Mask: {} px selected",
                    format_number_with_commas(region.selected_count())
                );
            }

            let mut studio = open_online(store, &config)?;
            apply_options(&mut studio, options);

            eprintln!("{}", "Editing...".dimmed());
            let item = studio.edit(base, &prompt, region.as_ref(), Utc::now()).await?;
            let path = save_result(&item, out).await?;
            println!(
                "{} {} ({}) -> {}",
                "✅".green(),
                item.prompt,
                cost_label(item.cost.to_label()),
                path.display()
            );
            print_status(studio.usage(), studio.daily_limit(), Utc::now());
        }
        Command::Imagine { prompt, out } => {
            let studio = open_online(store, &config)?;
            let blob = studio.imagine(&prompt).await?;
            let id = Utc::now().timestamp_millis().to_string();
            let path = out.unwrap_or_else(|| PathBuf::from(format!("imagine-{}.{}", id, blob.extension())));
            write_file(&path, &blob.data).await?;
            println!("{} {}", "✅".green(), path.display());
        }
        Command::History { limit } => {
            let history = HistoryLog::load(store.as_ref());
            if history.is_empty() {
                println!("{}", "No renders yet".dimmed());
            }
            for item in history.iter().take(limit) {
                println!(
                    "{} {} {} {} {}",
                    item.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                    item.size.to_string().cyan(),
                    item.model_tier.map(|t| t.to_string()).unwrap_or_default(),
                    cost_label(item.cost.to_label()),
                    item.prompt,
                );
            }
            println!("Total spend: {}", history.total_cost());
        }
        Command::Chat => {
            let client = GeminiClient::from_config(&config)?;
            run_chat(&client).await?;
        }
    }

    Ok(())
}

fn open_online(store: Arc<dyn KeyValueStore>, config: &Config) -> Result<Studio> {
    let client = GeminiClient::from_config(config)?;
    Ok(Studio::open(store, Arc::new(client), config, Utc::now()))
}

fn apply_options(studio: &mut Studio, options: RenderOptions) {
    studio.set_tier(options.tier);
    studio.set_size(options.size);
    studio.set_aspect_ratio(options.aspect);
    warn_downgrade(options, studio.spec());
}

fn warn_downgrade(options: RenderOptions, spec: RenderRequestSpec) {
    if options.size != spec.size() {
        eprintln!(
            "{} {} is a pro size; using {}",
            "⚠️".yellow(),
            options.size,
            spec.size()
        );
    }
}

fn require_user(store: &dyn KeyValueStore) -> Result<UserIdentity> {
    identity::current_user(store).ok_or(AtomError::NotLoggedIn)
}

fn build_mask(
    base: &ImageBlob,
    overlay: Option<&Path>,
    strokes: &[String],
    brush_size: f32,
) -> Result<Option<RegionMask>> {
    if overlay.is_none() && strokes.is_empty() {
        return Ok(None);
    }
    let decoded = image::load_from_memory(&base.data)?;
    let (width, height) = (decoded.width(), decoded.height());

    if let Some(path) = overlay {
        let surface = image::open(path)?.to_rgba8();
        return Ok(Some(binarize_overlay(&surface, (width, height))?));
    }

    let mut layer = StrokeLayer::new(width, height);
    layer.set_brush_size(brush_size);
    for path in strokes {
        let stroke = layer.stroke(Tool::Brush).with_path(path)?;
        layer.paint(&stroke);
    }
    Ok(Some(binarize(&layer)))
}

async fn save_result(item: &RenderHistoryItem, out: Option<PathBuf>) -> Result<PathBuf> {
    let blob = ImageBlob::from_data_url(&item.image_url)?;
    let path = out.unwrap_or_else(|| PathBuf::from(item.download_name(blob.extension())));
    write_file(&path, &blob.data).await?;
    Ok(path)
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .map_err(|source| AtomError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}

async fn run_chat(service: &dyn GenerationService) -> Result<()> {
    let mut session = ChatSession::new(Utc::now());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_prompt();
    while let Some(line) = lines.next_line().await? {
        let mut printed = 0;
        let sent = session
            .send(service, &line, Vec::new(), Utc::now(), |text| {
                // Print only the newly streamed suffix
                print!("{}", &text[printed..]);
                printed = text.len();
                let _ = std::io::stdout().flush();
            })
            .await;
        match sent {
            Ok(()) if printed > 0 => println!(),
            Ok(()) => {}
            Err(e) => eprintln!("\n{} {}", "❌".red(), e),
        }
        print_prompt();
    }
    Ok(())
}

fn print_prompt() {
    print!("{} ", "›".cyan());
    let _ = std::io::stdout().flush();
}

fn print_status(usage: &UsageStats, daily_limit: u32, now: DateTime<Utc>) {
    let remaining = RemainingTime::from_usage_stats(usage, now);

    println!(
        "📊 {} · {} left · 💰 {} spent · ⏰ {} (resets {})",
        format_quota(usage.render_count, daily_limit, ModelTier::Free),
        ledger::remaining_free_renders(usage, daily_limit).to_string().green(),
        usage.total_cost,
        remaining.to_colored_string(),
        usage.window_end().format("%Y-%m-%d %H:%M UTC"),
    );
}

#[inline]
fn user_label(user: &UserIdentity) -> ColoredString {
    format!("{} <{}>", user.name, user.email).bold()
}

#[inline]
fn operation_label(operation: OperationKind) -> &'static str {
    match operation {
        OperationKind::Create => "create",
        OperationKind::Edit => "edit",
    }
}

#[inline]
fn cost_label(label: String) -> ColoredString {
    if label == "FREE" {
        label.green()
    } else {
        label.yellow().bold()
    }
}
