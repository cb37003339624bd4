mod settings;

use std::path::{Path, PathBuf};
use std::process::Command as Process;

use anyhow::{Context, Result, bail};
use beatport_module::{
    BeatportModule, DownloadType, MediaIdentification, Preloaded, QualityTier, TrackDownloadInfo,
    TrackInfo, parse_url,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use settings::{AuthConfig, Config, FileSettings};

#[derive(Parser)]
#[command(name = "beatdump", version, about = "Beatport catalog browser & downloader")]
struct Cli {
    /// Config file [default: ~/.config/beatdump/config.json]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Session file [default: ~/.config/beatdump/session.json]
    #[arg(long, global = true, value_name = "PATH")]
    session: Option<PathBuf>,
    /// More logging (-v info, -vv debug); `RUST_LOG` takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and save the session
    Login {
        /// Account username (saved to the config file)
        #[arg(short, long)]
        username: Option<String>,
        /// Account password (saved to the config file)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Clear saved session
    Logout,
    /// Show current account
    Me,
    /// Search the catalog
    Search {
        /// Search keyword
        query: String,
        /// Search type
        #[arg(short = 't', long, default_value = "track")]
        r#type: SearchKind,
        /// Max results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show details of a Beatport URL or track ID
    Info {
        /// `https://www.beatport.com/...` URL or numeric track ID
        target: String,
    },
    /// Download a track, release, chart, playlist, artist or label
    Download {
        /// `https://www.beatport.com/...` URL or numeric track ID
        target: String,
        /// Audio quality
        #[arg(short, long, default_value = "high")]
        quality: QualityArg,
        /// Output directory
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Also save each track's cover next to it
        #[arg(long)]
        cover: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum SearchKind {
    Track,
    Album,
    Playlist,
    Artist,
    Label,
}

#[derive(Clone, ValueEnum)]
enum QualityArg {
    /// 128 kbps AAC (HLS, remuxed with ffmpeg)
    Low,
    /// 256 kbps AAC (MP4)
    High,
}

impl From<SearchKind> for DownloadType {
    fn from(k: SearchKind) -> Self {
        match k {
            SearchKind::Track => Self::Track,
            SearchKind::Album => Self::Album,
            SearchKind::Playlist => Self::Playlist,
            SearchKind::Artist => Self::Artist,
            SearchKind::Label => Self::Label,
        }
    }
}

impl From<QualityArg> for QualityTier {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Low => Self::Low,
            QualityArg::High => Self::High,
        }
    }
}

/// Resolved config and session locations.
struct Paths {
    config: PathBuf,
    session: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dir = settings::config_dir()?;
    let paths = Paths {
        config: cli.config.unwrap_or_else(|| dir.join("config.json")),
        session: cli.session.unwrap_or_else(|| dir.join("session.json")),
    };

    match cli.command {
        Command::Login { username, password } => cmd_login(&paths, username, password),
        Command::Logout => cmd_logout(&paths),
        Command::Me => cmd_me(&paths),
        Command::Search {
            query,
            r#type,
            limit,
        } => cmd_search(&paths, &query, r#type, limit),
        Command::Info { target } => cmd_info(&paths, &target),
        Command::Download {
            target,
            quality,
            output,
            cover,
        } => cmd_download(&paths, &target, quality.into(), output, cover),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_module(paths: &Paths) -> Result<BeatportModule<FileSettings>> {
    let config = Config::load(&paths.config)?;
    let session = FileSettings::load(paths.session.clone())?;
    let controller = beatport_module::ModuleController::new(session, config.module_settings())
        .with_options(config.module_options())
        .with_client_config(config.client_config())
        .with_error_reporter(|msg| eprintln!("error: {msg}"));
    BeatportModule::new(controller).context("failed to open Beatport session")
}

/// A URL, or a bare number taken as a track id.
fn resolve_target(target: &str) -> Result<MediaIdentification> {
    if let Ok(id) = target.parse() {
        return Ok(MediaIdentification {
            media_type: DownloadType::Track,
            media_id: id,
            is_chart: false,
        });
    }
    Ok(parse_url(target)?)
}

// ── login / logout / me ──

fn cmd_login(paths: &Paths, username: Option<String>, password: Option<String>) -> Result<()> {
    let mut config = Config::load(&paths.config)?;
    if username.is_some() || password.is_some() {
        if let Some(username) = username {
            config.username = username;
        }
        if let Some(password) = password {
            config.password = password;
        }
        config.save(&paths.config)?;
    }
    if config.username.is_empty() && !matches!(config.auth, AuthConfig::Embed { .. }) {
        bail!("no username configured, pass --username and --password");
    }

    // start from scratch so the module logs in instead of reusing the session
    FileSettings::clear(&paths.session)?;
    let mut module = open_module(paths)?;
    match module.account() {
        Ok(account) => println!(
            "Logged in as: {} (id={})",
            account.username.as_deref().unwrap_or(&config.username),
            account.user_id.unwrap_or_default()
        ),
        Err(e) => println!("Session saved but validation failed: {e}"),
    }
    Ok(())
}

fn cmd_logout(paths: &Paths) -> Result<()> {
    FileSettings::clear(&paths.session)?;
    println!("Session cleared.");
    Ok(())
}

fn cmd_me(paths: &Paths) -> Result<()> {
    let mut module = open_module(paths)?;
    let account = module.account()?;
    println!(
        "User:         {} (id={})",
        account.username.as_deref().unwrap_or("?"),
        account.user_id.unwrap_or_default()
    );
    println!(
        "Subscription: {}",
        account.subscription.as_deref().unwrap_or("none")
    );
    Ok(())
}

// ── search ──

fn cmd_search(paths: &Paths, query: &str, kind: SearchKind, limit: usize) -> Result<()> {
    let mut module = open_module(paths)?;
    let results = module.search(kind.into(), query, limit)?;
    if results.is_empty() {
        println!("No results.");
    }
    for r in &results {
        let mut line = format!("  [{}] ", r.result_id);
        if let Some(artists) = &r.artists {
            line.push_str(&format!("{} - ", artists.join(", ")));
        }
        line.push_str(&r.name);
        if let Some(year) = &r.year {
            line.push_str(&format!(" ({year})"));
        }
        if let Some(secs) = r.duration {
            line.push_str(&format!(" {}", format_duration(secs)));
        }
        if !r.additional.is_empty() {
            line.push_str(&format!(" [{}]", r.additional.join(", ")));
        }
        println!("{line}");
    }
    Ok(())
}

// ── info ──

fn cmd_info(paths: &Paths, target: &str) -> Result<()> {
    let media = resolve_target(target)?;
    let mut module = open_module(paths)?;
    let id = media.media_id;
    match media.media_type {
        DownloadType::Track => {
            let t = module.get_track_info(id, QualityTier::High, None)?;
            print_track(&t);
        }
        DownloadType::Album => {
            let a = module.get_album_info(id, None)?;
            println!("Release:  {} (id={id})", a.name);
            if let Some(artist) = &a.artist {
                println!("Artist:   {artist}");
            }
            if let Some(year) = &a.release_year {
                println!("Year:     {year}");
            }
            if let Some(upc) = &a.upc {
                println!("UPC:      {upc}");
            }
            println!("Duration: {}", format_duration(a.duration));
            print_tracks(&a.tracks, &a.preloaded);
        }
        DownloadType::Playlist => {
            let p = module.get_playlist_info(id, media.is_chart)?;
            println!("Playlist: {} (id={id})", p.name);
            println!("Creator:  {}", p.creator);
            println!("Duration: {}", format_duration(p.duration));
            print_tracks(&p.tracks, &p.preloaded);
        }
        DownloadType::Artist => {
            let a = module.get_artist_info(id)?;
            println!("Artist:   {} (id={id})", a.name);
            print_tracks(&a.tracks, &a.preloaded);
        }
        DownloadType::Label => {
            let l = module.get_label_info(id)?;
            println!("Label:    {} (id={id})", l.name);
            println!();
            for album_id in &l.albums {
                if let Some(r) = l.preloaded.releases.get(album_id) {
                    println!("  [{}] {}", r.id, r.name);
                }
            }
        }
    }
    Ok(())
}

fn print_track(t: &TrackInfo) {
    println!("Track:    {} (id={})", t.name, t.id);
    println!("Artists:  {}", t.artists.join(", "));
    if let Some(album) = &t.album {
        println!("Release:  {album} (id={})", t.album_id.unwrap_or_default());
    }
    if let Some(secs) = t.duration {
        println!("Duration: {}", format_duration(secs));
    }
    if let Some(bpm) = t.tags.bpm {
        println!("BPM:      {bpm}");
    }
    if let Some(key) = &t.tags.key {
        println!("Key:      {key}");
    }
    if !t.tags.genres.is_empty() {
        println!("Genre:    {}", t.tags.genres.join(" / "));
    }
    if let Some(error) = &t.error {
        println!("Status:   {error}");
    }
}

fn print_tracks(ids: &[u64], preloaded: &Preloaded) {
    println!();
    for (i, id) in ids.iter().enumerate() {
        let Some(t) = preloaded.tracks.get(id) else {
            continue;
        };
        let artists: Vec<&str> = t.artists.iter().map(|a| a.name.as_str()).collect();
        let number = i + 1;
        println!("  {number:>3}. [{}] {} - {}", t.id, artists.join(", "), t.name);
    }
}

// ── download ──

fn cmd_download(
    paths: &Paths,
    target: &str,
    quality: QualityTier,
    output: Option<PathBuf>,
    cover: bool,
) -> Result<()> {
    let media = resolve_target(target)?;
    let cover_size = if cover {
        Some(Config::load(&paths.config)?.module_options().cover_size)
    } else {
        None
    };
    let mut module = open_module(paths)?;
    let out_dir = output.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let id = media.media_id;
    let (tracks, preloaded) = match media.media_type {
        DownloadType::Track => (vec![id], Preloaded::default()),
        DownloadType::Album => {
            let a = module.get_album_info(id, None)?;
            (a.tracks, a.preloaded)
        }
        DownloadType::Playlist => {
            let p = module.get_playlist_info(id, media.is_chart)?;
            (p.tracks, p.preloaded)
        }
        DownloadType::Artist => {
            let a = module.get_artist_info(id)?;
            (a.tracks, a.preloaded)
        }
        DownloadType::Label => {
            let l = module.get_label_info(id)?;
            let mut tracks = Vec::new();
            let mut preloaded = Preloaded::default();
            for album_id in &l.albums {
                let a = module.get_album_info(*album_id, Some(&l.preloaded))?;
                tracks.extend(a.tracks);
                preloaded.tracks.extend(a.preloaded.tracks);
                preloaded.releases.extend(a.preloaded.releases);
                preloaded.positions.extend(a.preloaded.positions);
            }
            (tracks, preloaded)
        }
    };

    let mut failed = 0usize;
    for track_id in &tracks {
        if let Err(e) = download_track(
            &mut module,
            *track_id,
            quality,
            &preloaded,
            &out_dir,
            cover_size,
        ) {
            eprintln!("error: track {track_id}: {e:#}");
            failed += 1;
        }
    }
    if tracks.len() > 1 {
        println!("{} of {} tracks downloaded", tracks.len() - failed, tracks.len());
    }
    Ok(())
}

fn download_track(
    module: &mut BeatportModule<FileSettings>,
    track_id: u64,
    quality: QualityTier,
    preloaded: &Preloaded,
    out_dir: &Path,
    cover_size: Option<u32>,
) -> Result<()> {
    let info = module.get_track_info(track_id, quality, Some(preloaded))?;
    if let Some(error) = &info.error {
        bail!("{error}");
    }

    let stem = file_stem(&info);
    let dest = out_dir.join(format!("{stem}.{}", info.codec.extension()));
    match module.get_track_download(track_id, quality)? {
        TrackDownloadInfo::Url(url) => {
            let size = module.client().download(&url, &dest)?;
            debug!("wrote {size} bytes");
        }
        TrackDownloadInfo::Remux { manifest_url } => remux(&manifest_url, &dest)?,
    }
    println!("Downloaded {}", dest.display());

    if let Some(size) = cover_size {
        let art = module.get_track_cover(track_id, size, Some(preloaded))?;
        let cover_dest = out_dir.join(format!("{stem}.jpg"));
        if let Err(e) = module.client().download(&art.url, &cover_dest) {
            warn!("cover download failed for track {track_id}: {e}");
        }
    }
    Ok(())
}

/// Copy the audio of an HLS manifest into an MP4 container.
fn remux(manifest_url: &str, dest: &Path) -> Result<()> {
    let status = Process::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-i", manifest_url])
        .args(["-c:a", "copy"])
        .arg(dest)
        .status()
        .context("failed to run ffmpeg (is it installed?)")?;
    if !status.success() {
        bail!("ffmpeg exited with {status}");
    }
    Ok(())
}

/// `Artist - Title`, with path separators replaced.
fn file_stem(t: &TrackInfo) -> String {
    let name = if t.artists.is_empty() {
        t.name.clone()
    } else {
        format!("{} - {}", t.artists.join(", "), t.name)
    };
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
