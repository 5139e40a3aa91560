use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgGroup, Parser};

use manga_overlay::{
    default_output_path, FixedTranslator, FontSource, OverlayEngine, OverlayOptions,
    ProcessResult, TextDirection,
};

#[derive(Parser)]
#[command(
    name = "manga-overlay",
    about = "Erase manga speech bubbles and draw a translation back into them",
    version,
    after_help = "Simple usage: manga-overlay <image> --text \"Hello! Who are you?\"\n\n\
                  The translation is split on sentence punctuation and placed into the\n\
                  detected bubbles top to bottom. A JSON array of {x, y, width, height, text}\n\
                  records (fractions of the image size) places each text explicitly."
)]
#[command(group(ArgGroup::new("translation").required(true).args(["text", "text_file"])))]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_translated.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Translated text, or a JSON region array, to draw
    #[arg(long)]
    text: Option<String>,

    /// Read the translated text from a file
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Target language; Arabic, Hebrew, Persian and Urdu are drawn right to left
    #[arg(short, long, default_value = "Arabic")]
    lang: String,

    /// Force right-to-left layout
    #[arg(long, conflicts_with = "ltr")]
    rtl: bool,

    /// Force left-to-right layout
    #[arg(long)]
    ltr: bool,

    /// Font file to draw with
    #[arg(long, conflicts_with = "font_family")]
    font: Option<PathBuf>,

    /// Installed font family to draw with
    #[arg(long)]
    font_family: Option<String>,

    /// Process images of any size
    #[arg(short, long)]
    force: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        if let Err(e) = tracing_subscriber::fmt()
            .with_target(false)
            .with_level(true)
            .try_init()
        {
            eprintln!("WARNING: Failed to initialize logging: {e}");
        }
    }

    let direction = if cli.rtl {
        Some(TextDirection::Rtl)
    } else if cli.ltr {
        Some(TextDirection::Ltr)
    } else {
        None
    };

    let opts = OverlayOptions {
        target_language: cli.lang,
        direction,
        force: cli.force,
        verbose: cli.verbose,
        quiet: cli.quiet,
        ..OverlayOptions::default()
    };

    let translation = match (cli.text, cli.text_file) {
        (Some(text), _) => text,
        (None, Some(path)) => match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: Failed to read {}: {e}", path.display());
                process::exit(1);
            }
        },
        (None, None) => unreachable!("clap requires --text or --text-file"),
    };
    let translator = FixedTranslator::new(translation);

    let font = match (cli.font, cli.font_family) {
        (Some(path), _) => FontSource::Path(path),
        (None, Some(family)) => FontSource::Family(family),
        (None, None) => FontSource::Default,
    };

    let engine = match OverlayEngine::new(&font) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Fatal: Failed to initialize engine: {e}");
            process::exit(1);
        }
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        eprintln!(
            "Target language: {} ({:?})",
            opts.target_language,
            opts.text_direction()
        );
        if opts.force {
            eprintln!("WARNING: Force mode - processing images of any size!");
        }
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: manga-overlay <input_dir> -o <output_dir> --text <translation>");
            process::exit(1);
        };
        engine.process_directory(input_path, &output_dir, &translator, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![engine.process_file(input_path, &output_path, &translator, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Translated: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &OverlayOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            if result.cached {
                eprintln!("[OK] {filename} (cached, {} regions)", result.regions);
            } else {
                eprintln!("[OK] {filename} ({} regions)", result.regions);
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
