use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{ArgGroup, Parser};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use subindex_core::{
    CachedTranscriptSource, ChunkConfig, CueOrigin, CueResolver, DataApiClient, DirSubtitleStore,
    IndexConfig, SubindexError, TranscriptSource, VideoMeta, YtDlpTranscripts,
    format_chunks_with_timestamps, get_root_cache_dir, load_video_list, save_index,
};

const CHANNEL_ID_ENV: &str = "CHANNEL_ID";

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "subindex")]
#[command(about = "Build a time-aligned caption index for a YouTube channel, playlist or video list")]
#[command(group(
    ArgGroup::new("video_source")
        .args(["channel_id", "playlist_id", "videos"])
        .multiple(false)
))]
struct Cli {
    /// Channel whose uploads are indexed. Falls back to $CHANNEL_ID when no
    /// other video source is given.
    #[arg(long)]
    channel_id: Option<String>,

    /// Index a playlist instead of a channel's uploads
    #[arg(long)]
    playlist_id: Option<String>,

    /// JSON file with a manual video list: [{"id": "...", "title": "...", "date": "..."}]
    #[arg(long)]
    videos: Option<PathBuf>,

    /// YouTube Data API key (needed for channel and playlist listing)
    #[arg(long, env = "YT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory with local {id}.vtt / {id}.srt files, checked before the remote source
    #[arg(long)]
    subs_dir: Option<PathBuf>,

    /// Transcript language preference, most wanted first
    #[arg(short, long = "lang", default_values_t = ["ar".to_string(), "en".to_string()])]
    languages: Vec<String>,

    /// Value written to every record's "lang" field
    #[arg(long, default_value = "ar")]
    record_lang: String,

    /// Maximum number of videos listed from a channel or playlist
    #[arg(long, default_value_t = 50)]
    max_videos: usize,

    /// Character budget per chunk
    #[arg(long, default_value_t = 180)]
    max_chars: usize,

    /// Time budget per chunk, in seconds
    #[arg(long, default_value_t = 18.0, value_parser = parse_max_secs)]
    max_secs: f64,

    /// Videos processed concurrently
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Timeout for each remote call, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Output file
    #[arg(short, long, default_value = "data/index.json")]
    output: PathBuf,

    /// Do not read or write the transcript cache
    #[arg(long)]
    no_cache: bool,

    /// Print the chunks of the first indexed video
    #[arg(long)]
    preview: bool,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_max_secs(s: &str) -> std::result::Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if secs.is_finite() && secs > 0.0 {
        Ok(secs)
    } else {
        Err("must be a positive number of seconds".to_string())
    }
}

enum VideoListSource {
    Manual(PathBuf),
    Playlist(String),
    Channel(String),
}

impl Cli {
    fn video_list_source(&self) -> Option<VideoListSource> {
        self.video_list_source_or(std::env::var(CHANNEL_ID_ENV).ok())
    }

    /// At most one source flag is set (clap enforces it). The env channel
    /// only applies when none is.
    fn video_list_source_or(&self, env_channel: Option<String>) -> Option<VideoListSource> {
        if let Some(path) = &self.videos {
            Some(VideoListSource::Manual(path.clone()))
        } else if let Some(id) = &self.playlist_id {
            Some(VideoListSource::Playlist(id.clone()))
        } else {
            self.channel_id
                .clone()
                .or(env_channel.filter(|id| !id.is_empty()))
                .map(VideoListSource::Channel)
        }
    }

    fn api_client(&self, timeout: Duration) -> Result<DataApiClient> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| SubindexError::MissingEnv {
                env_var: "YT_API_KEY".to_string(),
            })?;
        Ok(DataApiClient::new(api_key, timeout)?)
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("subindex={0},subindex_core={0}", default_level).into()
        }))
        .with_writer(std::io::stderr)
        .init();
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn create_progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("━╸ "),
    );
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

async fn list_videos(cli: &Cli, timeout: Duration) -> Result<Vec<VideoMeta>> {
    let Some(source) = cli.video_list_source() else {
        anyhow::bail!(
            "no videos to index: pass --channel-id, --playlist-id or --videos, or set {}",
            CHANNEL_ID_ENV
        );
    };

    let videos = match source {
        VideoListSource::Manual(path) => load_video_list(&path).await?,
        VideoListSource::Playlist(id) => {
            cli.api_client(timeout)?
                .list_playlist(&id, cli.max_videos)
                .await?
        }
        VideoListSource::Channel(id) => {
            cli.api_client(timeout)?
                .list_channel_uploads(&id, cli.max_videos)
                .await?
        }
    };
    Ok(videos)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let timeout = Duration::from_secs(cli.timeout_secs);

    println!(
        "\n{}  {}\n",
        style("subindex").cyan().bold(),
        style("Caption Indexer").dim()
    );

    let total_start = Instant::now();

    // Step 1: List videos
    let step_start = Instant::now();
    let spinner = create_spinner("Listing videos...");
    let videos = match list_videos(&cli, timeout).await {
        Ok(videos) => videos,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    spinner.finish_with_message(format!(
        "{} Listed {} videos {}",
        style("✓").green().bold(),
        videos.len(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));

    // Step 2: Wire up cue sources
    let ytdlp = YtDlpTranscripts::new(timeout)?;
    let remote: Arc<dyn TranscriptSource> = if cli.no_cache {
        Arc::new(ytdlp)
    } else {
        Arc::new(CachedTranscriptSource::new(ytdlp, get_root_cache_dir()))
    };

    let mut resolver = CueResolver::new(remote).with_languages(cli.languages.clone());
    if let Some(dir) = &cli.subs_dir {
        println!(
            "{} Local subtitles: {}",
            style("✓").green().bold(),
            style(dir.display()).dim()
        );
        resolver = resolver.with_store(DirSubtitleStore::new(dir));
    }

    let config = IndexConfig {
        chunk: ChunkConfig {
            max_chars: cli.max_chars,
            max_secs: cli.max_secs,
        },
        lang: cli.record_lang.clone(),
        concurrency: usize::from(cli.concurrency),
    };

    // Step 3: Resolve and chunk
    let step_start = Instant::now();
    let pb = create_progress_bar(videos.len());
    let mut without_cues = 0usize;
    let mut local = 0usize;
    let records = subindex_core::build_index(videos, Arc::new(resolver), &config, |outcome| {
        match outcome.origin {
            CueOrigin::Unavailable => without_cues += 1,
            CueOrigin::Local(_) => local += 1,
            CueOrigin::Remote { .. } => {}
        }
        pb.set_message(format!(
            "{} ({} chunks)",
            outcome.record.id,
            outcome.record.terms.len()
        ));
        pb.inc(1);
    })
    .await;
    let chunk_total: usize = records.iter().map(|r| r.terms.len()).sum();
    pb.finish_and_clear();
    println!(
        "{} Indexed {} videos, {} chunks ({} local, {} without captions) {}",
        style("✓").green().bold(),
        records.len(),
        chunk_total,
        local,
        style(without_cues).yellow(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    );

    // Step 4: Write output
    save_index(&records, &cli.output).await?;
    tracing::info!(
        "Wrote {} records to {}",
        records.len(),
        cli.output.display()
    );

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );

    println!(
        "{} {}\n",
        style("Saved:").dim(),
        style(cli.output.display()).cyan()
    );

    if cli.preview {
        if let Some(record) = records.iter().find(|r| !r.terms.is_empty()) {
            println!("{}", style("─".repeat(60)).dim());
            println!("{} {}\n", style(&record.title).bold(), style(&record.url).dim());
            println!("{}", format_chunks_with_timestamps(record));
        }
    }

    Ok(())
}
