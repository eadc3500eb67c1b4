use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use inkmark::{
    Config,
    filename::export_filename,
    preferences::{FileStore, Preferences, STORAGE_KEY, load_preferences, save_preferences},
    session::WatermarkSession,
    startup_checks,
    upload::load_image_file,
    watermark::{
        Anchor, Color, DrawingSurface, Offset, OutputFormat, PRESETS, PresetId, RasterSurface,
        WatermarkMode, apply_preset, load_font,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark an image and write the result
    Apply(ApplyArgs),

    /// List the built-in presets
    Presets,

    /// Manage saved preferences
    #[command(subcommand)]
    Prefs(PrefsCommands),
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Image to watermark (JPG, PNG or GIF)
    input: PathBuf,

    /// Output file or directory (defaults to the configured output directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the preview-sized render as PNG
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Use a preset (identity-verification, document-copy, sample)
    #[arg(long)]
    preset: Option<PresetId>,

    /// Custom watermark text
    #[arg(long, conflicts_with = "preset")]
    text: Option<String>,

    /// Placement anchor, e.g. bottom-right
    #[arg(long)]
    anchor: Option<Anchor>,

    /// Left edge of the watermark in preview pixels
    #[arg(long)]
    offset_x: Option<f32>,

    /// Top edge of the watermark in preview pixels
    #[arg(long)]
    offset_y: Option<f32>,

    #[arg(long)]
    opacity: Option<f32>,

    #[arg(long)]
    font_size: Option<u32>,

    /// Text color as #rrggbb
    #[arg(long)]
    color: Option<Color>,

    /// Remember type, preset, opacity, font size and anchor for next time
    #[arg(long)]
    save_prefs: bool,
}

#[derive(Subcommand, Debug)]
enum PrefsCommands {
    /// Print the preferences that would be used
    Show,
    /// Forget saved preferences
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Apply(args) => apply(&config, args).await,
        Commands::Presets => {
            for preset in PRESETS.iter() {
                println!(
                    "{:<22} {:<10} {}px {} opacity {} at {}  ({})",
                    preset.id.as_str(),
                    preset.text,
                    preset.font_size_px,
                    preset.color.to_hex(),
                    preset.opacity,
                    preset.anchor,
                    preset.description
                );
            }
            Ok(())
        }
        Commands::Prefs(cmd) => handle_prefs_command(&config, cmd),
    }
}

fn handle_prefs_command(
    config: &Config,
    cmd: PrefsCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    use inkmark::preferences::PreferenceStore;

    let mut store = FileStore::new(&config.preferences.directory);
    match cmd {
        PrefsCommands::Show => {
            let preferences = load_preferences(&store);
            println!("{}", serde_json::to_string_pretty(&preferences)?);
        }
        PrefsCommands::Reset => {
            store.remove(STORAGE_KEY)?;
            println!(
                "Removed saved preferences from {}",
                store.directory().display()
            );
        }
    }
    Ok(())
}

async fn apply(config: &Config, args: ApplyArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(errors) = startup_checks::perform_startup_checks(config).await {
        for error in &errors {
            tracing::error!("Startup check failed: {}", error);
        }
        if errors.iter().any(|e| e.is_critical()) {
            tracing::error!("Critical startup check failed, exiting");
            return Err("Critical startup check failed".into());
        }
        warn!("Non-critical startup checks failed, continuing");
    }

    let mut store = FileStore::new(&config.preferences.directory);
    let mut watermark = load_preferences(&store).to_config();

    if let Some(preset) = args.preset {
        apply_preset(&mut watermark, preset);
    }
    if let Some(text) = args.text {
        watermark.mode = WatermarkMode::Custom;
        watermark.text = text;
    }
    if let Some(anchor) = args.anchor {
        watermark.set_anchor(anchor);
    }
    if let Some(opacity) = args.opacity {
        watermark.opacity = opacity;
    }
    if let Some(font_size) = args.font_size {
        watermark.font_size_px = font_size;
    }
    if let Some(color) = args.color {
        watermark.color = color;
    }
    if args.offset_x.is_some() || args.offset_y.is_some() {
        watermark.offset = Some(Offset::new(
            args.offset_x.unwrap_or(0.0),
            args.offset_y.unwrap_or(0.0),
        ));
    }

    let source = load_image_file(
        &args.input,
        &config.upload_limits(),
        config.render.preview_max_width,
        config.render.preview_max_height,
    )
    .await?;

    let font = match config.render.resolve_font_path().map(load_font) {
        Some(Ok(font)) => Some(Arc::new(font)),
        Some(Err(e)) => {
            warn!("Failed to load font, watermark will be skipped: {}", e);
            None
        }
        None => {
            warn!(
                "No font found at {:?} or any fallback, watermark will be skipped",
                config.render.font_path
            );
            None
        }
    };

    let preview_surface =
        RasterSurface::new(source.display_width, source.display_height, font.clone())?;
    let (original_width, original_height) = (source.original_width, source.original_height);
    let mut session = WatermarkSession::new(source, watermark, preview_surface);

    let outcome = session.render()?;
    match &outcome.watermark_error {
        Some(e) => warn!("Preview rendered without watermark: {}", e),
        None if outcome.geometry.is_empty() => info!("Preview rendered without watermark"),
        None => info!("Watermark placed at {:?}", outcome.geometry.bounding_box),
    }

    if let Some(preview_path) = &args.preview {
        let bytes = session.surface().encode(OutputFormat::Png)?;
        tokio::fs::write(preview_path, bytes).await?;
        info!("Preview written to {:?}", preview_path);
    }

    let mut export_surface = RasterSurface::new(original_width, original_height, font)?;
    let exported = session.export(&mut export_surface, config.jpeg_quality())?;

    let filename = export_filename(&session.config, exported.format, Utc::now());
    let output_path = match args.output {
        Some(path) if path.is_dir() => path.join(filename),
        Some(path) => path,
        None => config.export.output_directory.join(filename),
    };
    tokio::fs::write(&output_path, &exported.bytes).await?;
    info!(
        "Wrote {} ({} bytes, {})",
        output_path.display(),
        exported.bytes.len(),
        exported.format.mime_type()
    );
    println!("{}", output_path.display());

    if args.save_prefs {
        save_preferences(&mut store, &Preferences::from_config(&session.config))?;
        info!("Preferences saved");
    }

    Ok(())
}
