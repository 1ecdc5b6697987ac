//! CLI binary for crayonpress.
//!
//! A thin shim over the library crate that maps CLI flags to `BookConfig`,
//! renders a progress bar, and writes the finished PDF.

use anyhow::{Context, Result};
use clap::Parser;
use crayonpress::{
    generate, BookConfig, GenerationProgressCallback, GenerationRequest, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar across all slots, a log line per
/// finished slot, and an explicit marker when a slot fell back to the
/// placeholder.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_generation_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Dreaming up scenes…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn slot_label(slot: usize) -> String {
        if slot == 0 {
            "cover".to_string()
        } else {
            format!("page {slot}")
        }
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_slots: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} images  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_slots as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Drawing");
    }

    fn on_ideas_ready(&self, page_count: usize, fallback: bool) {
        let note = if fallback {
            yellow("(template ideas — language model unavailable)")
        } else {
            dim("(model ideas)")
        };
        self.bar.println(format!(
            "{} {} {}",
            cyan("◆"),
            bold(&format!("{page_count} scenes ready")),
            note
        ));
    }

    fn on_slot_start(&self, slot: usize, _total_slots: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(slot, Instant::now());
        self.bar.set_message(Self::slot_label(slot));
    }

    fn on_slot_complete(
        &self,
        slot: usize,
        _total_slots: usize,
        image_bytes: usize,
        used_placeholder: bool,
    ) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&slot)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        let mark = if used_placeholder {
            yellow("⚠")
        } else {
            green("✓")
        };
        let note = if used_placeholder {
            yellow("placeholder")
        } else {
            dim(&format!("{:>4} KiB", image_bytes / 1024))
        };

        self.bar.println(format!(
            "  {mark} {:<8} {note}  {}",
            Self::slot_label(slot),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_generation_complete(&self, total_slots: usize, placeholder_slots: usize) {
        self.bar.finish_and_clear();
        if placeholder_slots == 0 {
            eprintln!(
                "{} {} images drawn",
                green("✔"),
                bold(&total_slots.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} images drawn  ({} placeholder)",
                yellow("⚠"),
                bold(&(total_slots - placeholder_slots).to_string()),
                total_slots,
                yellow(&placeholder_slots.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a five-page book
  crayonpress "Space Dinosaurs" --name Lily

  # Choose the output path and page count
  crayonpress "Under the Sea" --name Mateo --pages 8 -o mateo.pdf

  # Structured run report on stdout
  crayonpress "Robots" --name Ada --json > run.json

  # Different image model endpoint
  crayonpress "Jungle Animals" --name Zoe \
      --image-model https://router.huggingface.co/hf-inference/models/stabilityai/stable-diffusion-xl-base-1.0

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY              Language-model key (optional — template ideas without it)
  HF_API_KEY                  Image-model key (required)
  CRAYONPRESS_CHILD_NAME      Default for --name
  CRAYONPRESS_PAGES           Default for --pages
  CRAYONPRESS_OUTPUT          Default for --output
  CRAYONPRESS_IMAGE_MODEL     Default for --image-model
  CRAYONPRESS_TEXT_MODEL      Default for --text-model

FAILURE BEHAVIOUR:
  Idea generation falls back to a local template; each image gets one retry
  and then a generic placeholder. The book always comes out with the full
  page count — check the summary (or --json) to see how degraded it is.
"#;

/// Generate themed children's coloring books as printable PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "crayonpress",
    version,
    about = "Generate themed children's coloring books as printable PDFs",
    long_about = "Generate a personalised coloring book: scene ideas from a language model, \
line-art images from a text-to-image model, assembled into an A4-landscape PDF. \
Degrades gracefully when either model misbehaves.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Book theme, e.g. "Space Dinosaurs".
    theme: Option<String>,

    /// Child's name, printed on the title page.
    #[arg(short, long, env = "CRAYONPRESS_CHILD_NAME")]
    name: Option<String>,

    /// Write the PDF here. Default: <Name>_<Theme>.pdf.
    #[arg(short, long, env = "CRAYONPRESS_OUTPUT")]
    output: Option<PathBuf>,

    /// Content pages per book (1–12), cover excluded.
    #[arg(short, long, env = "CRAYONPRESS_PAGES", default_value_t = 5,
          value_parser = clap::value_parser!(usize))]
    pages: usize,

    /// Language model for scene ideas.
    #[arg(long, env = "CRAYONPRESS_TEXT_MODEL", default_value = "gemini-1.5-flash")]
    text_model: String,

    /// Text-to-image inference endpoint URL.
    #[arg(long, env = "CRAYONPRESS_IMAGE_MODEL")]
    image_model: Option<String>,

    /// Stock-image URL used when a slot fails twice.
    #[arg(long, env = "CRAYONPRESS_PLACEHOLDER")]
    placeholder_url: Option<String>,

    /// Override the style preamble prepended to every image prompt.
    #[arg(long, env = "CRAYONPRESS_STYLE")]
    style: Option<String>,

    /// Negative prompt for the image service.
    #[arg(long, conflicts_with = "no_negative_prompt")]
    negative_prompt: Option<String>,

    /// Send no negative prompt at all.
    #[arg(long)]
    no_negative_prompt: bool,

    /// Sampling steps for the image service.
    #[arg(long)]
    steps: Option<u32>,

    /// Guidance scale for the image service.
    #[arg(long)]
    guidance: Option<f32>,

    /// Idea-call timeout in seconds.
    #[arg(long, env = "CRAYONPRESS_IDEA_TIMEOUT", default_value_t = 30)]
    idea_timeout: u64,

    /// Per-image-call timeout in seconds.
    #[arg(long, env = "CRAYONPRESS_RENDER_TIMEOUT", default_value_t = 60)]
    render_timeout: u64,

    /// Print the structured run report (ideas, slots, stats) as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "CRAYONPRESS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CRAYONPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CRAYONPRESS_QUIET")]
    quiet: bool,

    /// Run the HTTP server instead of generating one book.
    #[cfg(feature = "server")]
    #[arg(long)]
    serve: bool,

    /// Server bind port.
    #[cfg(feature = "server")]
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Directory where the server archives finished books.
    #[cfg(feature = "server")]
    #[arg(long, env = "CRAYONPRESS_ARCHIVE_DIR", default_value = "book_archive")]
    archive_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs; verbose mode wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    #[cfg(feature = "server")]
    if cli.serve {
        let config = build_config(&cli, None)?;
        let server = crayonpress::server::ServerConfig {
            bind_addr: format!("0.0.0.0:{}", cli.port),
            archive_dir: cli.archive_dir.clone(),
        };
        crayonpress::server::run_server(config, server)
            .await
            .context("Server failed")?;
        return Ok(());
    }

    // ── Delivery-surface validation ──────────────────────────────────────
    let theme = cli
        .theme
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .context("A non-empty THEME argument is required")?
        .to_string();
    let name = cli
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .context("A non-empty --name is required")?
        .to_string();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let request = GenerationRequest::new(&name, &theme);

    // ── Run generation ───────────────────────────────────────────────────
    let output = generate(&request, &config)
        .await
        .context("Book generation failed")?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_{}.pdf", safe(&name), safe(&theme))));

    tokio::fs::write(&output_path, &output.pdf)
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise run report")?
        );
    }

    if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {} images ({} placeholder)  {:.1}s  →  {}",
            if stats.placeholder_slots == 0 {
                green("✔")
            } else {
                yellow("⚠")
            },
            stats.total_slots,
            stats.placeholder_slots,
            stats.total_duration_ms as f64 / 1000.0,
            bold(&output_path.display().to_string()),
        );
        if stats.idea_fallback {
            eprintln!("   {}", yellow("scene ideas came from the local template"));
        }
    }

    Ok(())
}

/// Map CLI args to `BookConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BookConfig> {
    let mut builder = BookConfig::builder()
        .page_count(cli.pages)
        .text_model(&cli.text_model)
        .idea_timeout_secs(cli.idea_timeout)
        .render_timeout_secs(cli.render_timeout);

    if let Some(ref url) = cli.image_model {
        builder = builder.image_model_url(url);
    }
    if let Some(ref url) = cli.placeholder_url {
        builder = builder.placeholder_url(url);
    }
    if let Some(ref style) = cli.style {
        builder = builder.style_preamble(style);
    }
    if let Some(ref neg) = cli.negative_prompt {
        builder = builder.negative_prompt(neg);
    }
    if cli.no_negative_prompt {
        builder = builder.no_negative_prompt();
    }
    if let Some(steps) = cli.steps {
        builder = builder.inference_steps(steps);
    }
    if let Some(guidance) = cli.guidance {
        builder = builder.guidance_scale(guidance);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Filesystem-safe default file-name component.
fn safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
