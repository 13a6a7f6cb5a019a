mod cli;

use mkvtag::config::{self, Config};
use mkvtag_matroska::{
    Attachment, MatroskaFile, ReadStyle, SimpleTag, SimpleTagMap, Tag, TagTypes, TagValue, Track,
    TrackKind,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mkvtag=debug,mkvtag_matroska=debug,mkvtag_ebml=trace".to_string()
        } else {
            "mkvtag=info,mkvtag_matroska=warn,mkvtag_ebml=warn".to_string()
        }
    });

    // Logs go to stderr so `show --json` output stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Show { file, json } => show(&file, &config, json),
        Commands::SetTitle { file, title } => edit(&file, &config, |f| {
            f.tag().title = Some(title);
            Ok(())
        }),
        Commands::ClearTitle { file } => edit(&file, &config, |f| {
            f.tag().title = None;
            Ok(())
        }),
        Commands::SetTag {
            file,
            key,
            value,
            language,
        } => edit(&file, &config, |f| {
            let mut simple = SimpleTag::text(value);
            simple.language = language;
            let medium = f.tag().medium_mut();
            medium.remove(&key);
            medium.insert(&key, simple);
            Ok(())
        }),
        Commands::RemoveTags { file } => edit(&file, &config, |f| {
            f.remove_tags(TagTypes::MATROSKA);
            Ok(())
        }),
        Commands::Attach {
            file,
            path,
            mime,
            description,
        } => attach(&file, &config, &path, mime, description),
        Commands::Detach { file, name } => edit(&file, &config, |f| {
            let removed = f.tag().detach(&name);
            if removed == 0 {
                anyhow::bail!("No attachment named {:?}", name);
            }
            println!("Removed {} attachment(s)", removed);
            Ok(())
        }),
        Commands::Extract { file, name, out } => extract(&file, &config, &name, &out),
        Commands::Check { file } => check(&file),
    }
}

fn open(file: &Path, config: &Config) -> Result<MatroskaFile> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    let options = config.open_options()?;
    MatroskaFile::open(file, options).with_context(|| format!("Failed to open {:?}", file))
}

/// Open `file`, apply `change` and save.
fn edit<F>(file: &Path, config: &Config, change: F) -> Result<()>
where
    F: FnOnce(&mut MatroskaFile) -> Result<()>,
{
    let mut mkv = open(file, config)?;
    change(&mut mkv)?;
    mkv.save().with_context(|| format!("Failed to save {:?}", file))?;
    tracing::info!("Updated {:?}", file);
    Ok(())
}

fn attach(
    file: &Path,
    config: &Config,
    path: &Path,
    mime: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    if data.is_empty() {
        anyhow::bail!("Refusing to attach empty file {:?}", path);
    }
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("No filename in {:?}", path))?;
    let mime = mime.unwrap_or_else(|| guess_mime(&filename).to_string());

    edit(file, config, |f| {
        let tags = f.tag();
        let uid = tags.attachments().iter().map(|a| a.uid).max().unwrap_or(0) + 1;
        let mut attachment = Attachment::new(filename, mime, data).with_uid(uid);
        if let Some(description) = description {
            attachment = attachment.with_description(description);
        }
        tags.attach(attachment);
        Ok(())
    })
}

fn extract(file: &Path, config: &Config, name: &str, out: &Path) -> Result<()> {
    let mkv = open(file, config)?;
    let attachment = mkv
        .raw_tags()
        .attachments()
        .iter()
        .find(|a| a.filename.as_deref() == Some(name) || a.description.as_deref() == Some(name))
        .with_context(|| format!("No attachment named {:?}", name))?;
    std::fs::write(out, &attachment.data).with_context(|| format!("Failed to write {:?}", out))?;
    println!("Wrote {} bytes to {}", attachment.len(), out.display());
    Ok(())
}

fn check(file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }
    // Targets are irrelevant without tag access; any valid policy will do.
    let options = Config::default().open_options()?.read_style(ReadStyle::None);
    let mkv = MatroskaFile::open(file, options).with_context(|| format!("Failed to open {:?}", file))?;

    println!("DocType: {}", mkv.doc_type());
    println!("SeekHead entries: {}", mkv.seek_entries().len());
    for entry in mkv.seek_entries() {
        println!(
            "  {:<12} at {}",
            mkvtag_ebml::ids::name(entry.id),
            entry.position
        );
    }
    Ok(())
}

fn show(file: &Path, config: &Config, json: bool) -> Result<()> {
    let mut mkv = open(file, config)?;
    let doc_type = mkv.doc_type().to_string();
    let properties = mkv.properties().clone();
    let tags = mkv.tag();
    let non_empty: Vec<&Tag> = tags.iter().filter(|t| !t.is_empty()).collect();

    if json {
        let attachments: Vec<_> = tags
            .attachments()
            .iter()
            .map(|a| {
                serde_json::json!({
                    "filename": a.filename,
                    "description": a.description,
                    "mime_type": a.mime_type,
                    "uid": a.uid,
                    "size": a.len(),
                    "picture_type": a.picture_type().name(),
                })
            })
            .collect();
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "doc_type": doc_type,
            "title": tags.title,
            "duration_ms": properties.duration_ms,
            "tracks": properties.tracks,
            "tags": non_empty,
            "attachments": attachments,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("DocType: {}", doc_type);
    if let Some(ref title) = tags.title {
        println!("Title: {}", title);
    }
    let ms = properties.duration_ms;
    let secs = ms / 1000;
    println!(
        "Duration: {:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        ms % 1000
    );

    println!("\nTracks: {}", properties.tracks.len());
    for track in &properties.tracks {
        println!("  {}", describe_track(track));
    }

    println!("\nTags: {}", non_empty.len());
    for tag in &non_empty {
        print!("  Level {}", tag.target_type_value);
        if let Some(ref target_type) = tag.target_type {
            print!(" ({})", target_type);
        }
        for target in &tag.targets {
            print!(" {:?}:{}", target.kind(), target.value());
        }
        println!();
        print_simple_tags(tag.simple_tags(), 4);
    }

    println!("\nAttachments: {}", tags.attachments().len());
    for attachment in tags.attachments() {
        print!(
            "  {} ({}, {} bytes",
            attachment.filename.as_deref().unwrap_or("<unnamed>"),
            attachment.mime_type,
            attachment.len()
        );
        let picture = attachment.picture_type();
        if picture != mkvtag_matroska::PictureType::NotAPicture {
            print!(", {}", picture.name());
        }
        println!(")");
    }

    Ok(())
}

fn describe_track(track: &Track) -> String {
    let mut line = format!("[{}] ", track.number);
    match &track.kind {
        TrackKind::Video(video) => {
            line.push_str(&format!(
                "Video {} {}x{}",
                track.codec_name(),
                video.pixel_width,
                video.pixel_height
            ));
            if let Some(fps) = track.frame_rate() {
                line.push_str(&format!(" {:.3} fps", fps));
            }
        }
        TrackKind::Audio(audio) => line.push_str(&format!(
            "Audio {} {}ch {}Hz",
            track.codec_name(),
            audio.channels,
            audio.sampling_frequency
        )),
        TrackKind::Subtitle => line.push_str(&format!("Subtitle {}", track.codec_name())),
        TrackKind::Unknown(raw) => line.push_str(&format!("Type 0x{:X} {}", raw, track.codec_id)),
    }
    if let Some(ref lang) = track.language {
        line.push_str(&format!(" ({})", lang));
    }
    if track.default {
        line.push_str(" [default]");
    }
    line
}

fn print_simple_tags(map: &SimpleTagMap, indent: usize) {
    for (key, values) in map {
        for simple in values {
            let value = match &simple.value {
                TagValue::Text(text) => text.clone(),
                TagValue::Binary(data) => format!("<binary, {} bytes>", data.len()),
            };
            print!("{:indent$}{} = {}", "", key, value, indent = indent);
            if let Some(ref language) = simple.language {
                print!(" [{}]", language);
            }
            println!();
            print_simple_tags(simple.children(), indent + 2);
        }
    }
}

fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "srt" => "application/x-subrip",
        "ass" | "ssa" => "text/x-ssa",
        "txt" | "nfo" => "text/plain",
        "xml" => "application/xml",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
