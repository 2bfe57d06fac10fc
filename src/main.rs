mod ai;
mod config;
mod error;
mod lyrics;
mod player;
mod pow;
mod publish;
mod storage;
mod sync;
#[cfg(test)]
mod test_support;
mod track;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lyrics::{LyricsResolver, LyricsResult, ParsedTimeline, SongQuery};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storage::{GeneratedKind, Storage};
use sync::{format_time, Located, PlaybackSynchronizer};
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "lyricsio", version, about = "Find, follow and share song lyrics")]
struct Cli {
    /// Override config file path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log provider attempts and other details to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up lyrics for a song.
    Lyrics {
        title: String,
        #[arg(long)]
        artist: Option<String>,
        /// Track length in seconds; enables the exact LRCLIB match.
        #[arg(long)]
        duration: Option<f64>,
        /// Cache the result under this video id.
        #[arg(long)]
        video_id: Option<String>,
        /// Treat the title as a raw video title and --artist as the channel name.
        #[arg(long)]
        raw: bool,
        /// Ignore the cache.
        #[arg(long)]
        refresh: bool,
        /// Print the timed LRC block instead of plain text.
        #[arg(long)]
        synced: bool,
    },
    /// Follow timed lyrics while a song plays.
    Karaoke {
        /// File or URL to play through mpv. Without it a wall clock is used.
        media: Option<String>,
        #[arg(long, conflicts_with_all = ["title", "artist"])]
        lrc: Option<PathBuf>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Show the lyric line at a playback position.
    Sync {
        lrc_file: PathBuf,
        #[arg(long)]
        at: f64,
    },
    /// Transcribe an audio file into lyrics.
    Transcribe {
        audio_file: PathBuf,
        /// Store the transcription under this video id for later publishing.
        #[arg(long)]
        video_id: Option<String>,
        /// Print timed LRC when the transcript has segment timing.
        #[arg(long)]
        lrc: bool,
    },
    /// Generate a chord sheet for a song.
    Chords {
        title: String,
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        video_id: Option<String>,
    },
    /// Contribute lyrics to LRCLIB.
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        /// Defaults to the track title.
        #[arg(long)]
        album: Option<String>,
        #[arg(long)]
        duration: f64,
        /// Publish the lyrics transcribed for this video id.
        #[arg(long, conflicts_with = "plain", required_unless_present = "plain")]
        video_id: Option<String>,
        /// Plain lyrics file.
        #[arg(long)]
        plain: Option<PathBuf>,
        /// Timed lyrics file to send along with --plain.
        #[arg(long, requires = "plain")]
        lrc: Option<PathBuf>,
    },
    /// Solve a publish challenge and print the token.
    Solve {
        prefix: String,
        target: String,
        #[arg(long)]
        max_attempts: Option<u64>,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
    /// Manage the lyrics cache.
    Cache {
        #[command(subcommand)]
        cmd: CacheCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the current settings.
    Show,
    /// Set the Groq API key used for AI lyrics, transcription and chords.
    SetKey { key: String },
    /// Set the interface language (en, es, pt, ...).
    SetLanguage { language: String },
    SetTheme { theme: ThemeArg },
    /// Flip a boolean preference.
    Toggle { setting: ToggleArg },
}

#[derive(Debug, Subcommand)]
enum CacheCommand {
    /// Remove cached and generated lyrics.
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToggleArg {
    AutoDetect,
    ShowPanel,
    ShowOverlay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Lyrics {
            title,
            artist,
            duration,
            video_id,
            raw,
            refresh,
            synced,
        } => {
            let query = if raw {
                let (title, artist) = track::clean_title(&title, artist.as_deref().unwrap_or_default());
                SongQuery::new(title, artist, duration)
            } else {
                SongQuery::new(title, artist.unwrap_or_default(), duration)
            };
            let storage = open_storage(&cfg);
            let result = find_lyrics(&cfg, storage.as_ref(), &query, video_id.as_deref(), refresh).await?;

            match (synced, &result.synced_text) {
                (true, Some(lrc)) => println!("{lrc}"),
                (true, None) => {
                    eprintln!("No synced lyrics from {}; showing plain text.", result.source_label);
                    println!("{}", result.plain_text);
                }
                (false, _) => println!("{}", result.plain_text),
            }
        }
        Command::Karaoke {
            media,
            lrc,
            title,
            artist,
            duration,
        } => {
            let timeline = match (lrc, title) {
                (Some(path), _) => ParsedTimeline::parse(&read_text(&path).await?),
                (None, Some(title)) => {
                    let query = SongQuery::new(title, artist.unwrap_or_default(), duration);
                    let storage = open_storage(&cfg);
                    let result = find_lyrics(&cfg, storage.as_ref(), &query, None, false).await?;
                    match result.timeline() {
                        Some(t) if !t.is_empty() => t,
                        _ => {
                            eprintln!("No synced lyrics available; showing plain text.");
                            println!("{}", result.plain_text);
                            return Ok(());
                        }
                    }
                }
                (None, None) => anyhow::bail!("pass --lrc FILE or --title to choose the lyrics"),
            };
            if timeline.is_empty() {
                anyhow::bail!("no timed lines in the lyrics");
            }
            karaoke(&cfg, PlaybackSynchronizer::new(timeline), media, duration).await?;
        }
        Command::Sync { lrc_file, at } => {
            let sync = PlaybackSynchronizer::new(ParsedTimeline::parse(&read_text(&lrc_file).await?));
            let located = sync.locate(at);
            match located.current {
                Some(line) => println!("{} {}", format_time(line.time_secs), line.text),
                None => println!("{} (before the first line)", format_time(at)),
            }
            if let Some(next) = located.next {
                println!("next {} {}", format_time(next.time_secs), next.text);
            }
        }
        Command::Transcribe {
            audio_file,
            video_id,
            lrc,
        } => {
            let groq = ai_client(&cfg)?;
            let audio = tokio::fs::read(&audio_file)
                .await
                .with_context(|| format!("read {}", audio_file.display()))?;
            let file_name = audio_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "audio.webm".to_string());

            let transcription = groq.transcribe(audio, &file_name).await?;
            let timed = transcription.to_lrc();

            if let Some(video_id) = video_id.as_deref()
                && let Some(storage) = open_storage(&cfg)
            {
                let content = timed.clone().unwrap_or_else(|| transcription.to_plain());
                if let Err(e) = storage.save_generated(video_id, GeneratedKind::Lyrics, &content, storage::now_unix()) {
                    tracing::warn!("failed to store transcription: {e:#}");
                }
            }

            match timed {
                Some(lrc_text) if lrc => println!("{lrc_text}"),
                _ => println!("{}", transcription.to_plain()),
            }
        }
        Command::Chords {
            title,
            artist,
            video_id,
        } => {
            let storage = open_storage(&cfg);
            let cached = match (video_id.as_deref(), storage.as_ref()) {
                (Some(id), Some(s)) => s.get_generated(id, GeneratedKind::Tabs).unwrap_or_else(|e| {
                    tracing::warn!("chords cache read failed: {e:#}");
                    None
                }),
                _ => None,
            };
            if let Some(sheet) = cached {
                println!("{sheet}");
                return Ok(());
            }

            let groq = ai_client(&cfg)?;
            let query = SongQuery::new(title, artist.unwrap_or_default(), None);
            let lyrics = find_lyrics(&cfg, storage.as_ref(), &query, video_id.as_deref(), false).await?;
            let sheet = groq
                .generate_chords(&query.title, &query.artist, &lyrics.plain_text)
                .await?;
            if sheet.trim().is_empty() {
                anyhow::bail!("the model returned an empty chord sheet");
            }

            if let (Some(id), Some(s)) = (video_id.as_deref(), storage.as_ref())
                && let Err(e) = s.save_generated(id, GeneratedKind::Tabs, &sheet, storage::now_unix())
            {
                tracing::warn!("failed to cache chords: {e:#}");
            }
            println!("{sheet}");
        }
        Command::Publish {
            title,
            artist,
            album,
            duration,
            video_id,
            plain,
            lrc,
        } => {
            let (plain_lyrics, synced_lyrics) = match (video_id, plain) {
                (_, Some(path)) => {
                    let synced = match lrc {
                        Some(p) => Some(read_text(&p).await?),
                        None => None,
                    };
                    (read_text(&path).await?, synced)
                }
                (Some(id), None) => generated_lyrics(&cfg, &id),
                (None, None) => (String::new(), None),
            };

            let contribution = publish::TrackContribution {
                album_name: album.unwrap_or_else(|| title.clone()),
                track_name: title,
                artist_name: artist,
                duration_secs: duration.max(0.0).round() as u64,
                plain_lyrics,
                synced_lyrics,
            };

            let lrclib = lyrics::LrclibClient::new(
                &cfg.providers.lrclib_url,
                Duration::from_secs(cfg.providers.timeout_secs),
            )?;
            eprintln!("Publishing (solving the challenge can take a while)...");
            publish::PublishCoordinator::new(lrclib, cfg.publish.max_attempts)
                .publish(&contribution)
                .await?;
            println!("✅ Lyrics published to LRCLIB! Thank you for contributing!");
        }
        Command::Solve {
            prefix,
            target,
            max_attempts,
        } => {
            let max = max_attempts.unwrap_or(cfg.publish.max_attempts);
            let token = pow::solve_in_background(prefix, target.clone(), max).await?;
            if !pow::verify(&token, &target) {
                anyhow::bail!("solved token {token} does not verify against the target");
            }
            println!("{token}");
        }
        Command::Config { cmd } => {
            let mut cfg = cfg;
            match cmd {
                ConfigCommand::Show => {
                    let mut shown = cfg.clone();
                    if shown.providers.api_key().is_some() {
                        shown.providers.api_key = Some("********".to_string());
                    }
                    print!("{}", toml::to_string_pretty(&shown).context("serialize config")?);
                    return Ok(());
                }
                ConfigCommand::SetKey { key } => {
                    let key = key.trim().to_string();
                    cfg.providers.api_key = (!key.is_empty()).then_some(key);
                }
                ConfigCommand::SetLanguage { language } => cfg.general.language = language,
                ConfigCommand::SetTheme { theme } => {
                    cfg.general.theme = match theme {
                        ThemeArg::Dark => config::Theme::Dark,
                        ThemeArg::Light => config::Theme::Light,
                    };
                }
                ConfigCommand::Toggle { setting } => {
                    let flag = match setting {
                        ToggleArg::AutoDetect => &mut cfg.general.auto_detect,
                        ToggleArg::ShowPanel => &mut cfg.general.show_panel,
                        ToggleArg::ShowOverlay => &mut cfg.general.show_overlay,
                    };
                    *flag = !*flag;
                    println!("{setting:?}: {}", if *flag { "on" } else { "off" });
                }
            }
            config::save(&cfg, cli.config.as_deref()).context("save config")?;
            println!("Settings saved.");
        }
        Command::Cache { cmd } => match cmd {
            CacheCommand::Clear => {
                let storage = Storage::open(&cfg.paths.cache_db())?;
                let removed = storage.clear()?;
                println!("Removed {removed} cached entries.");
            }
        },
    }

    Ok(())
}

fn log_level(verbose: bool) -> tracing::Level {
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

/// The cache is optional: failing to open it only costs a warning.
fn open_storage(cfg: &config::Config) -> Option<Storage> {
    match Storage::open(&cfg.paths.cache_db()) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("lyrics cache unavailable: {e:#}");
            None
        }
    }
}

async fn find_lyrics(
    cfg: &config::Config,
    storage: Option<&Storage>,
    query: &SongQuery,
    video_id: Option<&str>,
    refresh: bool,
) -> anyhow::Result<LyricsResult> {
    let cache = video_id.zip(storage);

    if !refresh && let Some((id, s)) = cache {
        match s.get_lyrics(id) {
            Ok(Some(hit)) => {
                tracing::debug!(video_id = id, "lyrics cache hit");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("lyrics cache read failed: {e:#}"),
        }
    }

    let resolver = LyricsResolver::from_config(&cfg.providers)?;
    let result = resolver.resolve(query).await?;

    if let Some((id, s)) = cache
        && let Err(e) = s.cache_lyrics(id, &result, storage::now_unix())
    {
        tracing::warn!("lyrics cache write failed: {e:#}");
    }
    Ok(result)
}

fn ai_client(cfg: &config::Config) -> anyhow::Result<ai::GroqClient> {
    let p = &cfg.providers;
    let key = p
        .api_key()
        .context("no API key configured; run `lyricsio config set-key <KEY>`")?;
    ai::GroqClient::new(
        &p.groq_url,
        key,
        &p.chat_model,
        &p.transcription_model,
        Duration::from_secs(p.timeout_secs),
    )
}

/// Transcribed lyrics stored for a video, split into plain and timed text.
fn generated_lyrics(cfg: &config::Config, video_id: &str) -> (String, Option<String>) {
    let content = open_storage(cfg)
        .and_then(|s| s.get_generated(video_id, GeneratedKind::Lyrics).ok().flatten())
        .unwrap_or_default();
    let timeline = ParsedTimeline::parse(&content);
    if timeline.is_empty() {
        (content, None)
    } else {
        (timeline.plain_text(), Some(content))
    }
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))
}

async fn karaoke(
    cfg: &config::Config,
    sync: PlaybackSynchronizer,
    media: Option<String>,
    duration: Option<f64>,
) -> anyhow::Result<()> {
    let poll = Duration::from_millis(cfg.sync.poll_interval_ms.max(1));
    let (tx, rx) = mpsc::channel(64);

    // Keeps mpv alive until the lyrics loop is done.
    let _mpv = match media {
        Some(media) => {
            let mpv = player::mpv::MpvHandle::spawn(tx, cfg.player.audio_device.as_deref()).await?;
            mpv.load(&media).await?;
            Some(mpv)
        }
        None => {
            let end = duration.or_else(|| sync.timeline().lines().last().map(|l| l.time_secs + 5.0));
            player::clock::spawn(tx, 0.0, end, poll);
            None
        }
    };

    sync.drive(rx, poll, print_line).await;
    Ok(())
}

fn print_line(at: &Located<'_>) {
    match at.current {
        Some(line) => println!("[{}] {}", format_time(line.time_secs), line.text),
        None => println!("♪"),
    }
}
