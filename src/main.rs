use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use capmark::Editor;
use capmark::assets::decode_image;
use capmark::config::EditorConfig;
use capmark::export::padding::MAX_PADDING;
use capmark::export::{ExportFormat, FrameConfig, FrameStyle, PaddingConfig, Watermark};
use capmark::scene::MemoryScene;
use clap::{ArgAction, Parser, ValueEnum};

/// Draw an annotation list over a screenshot and export it
#[derive(Parser, Debug)]
#[command(name = "capmark", version, about, long_about = None)]
struct Args {
    /// Screenshot to annotate
    image: PathBuf,

    /// Annotation list (JSON) drawn over the image
    #[arg(short, long)]
    annotations: Option<PathBuf>,

    /// Output file (default: timestamped in the configured save location)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// png, jpeg or webp; guessed from the output extension when omitted
    #[arg(short, long, value_parser = parse_format)]
    format: Option<ExportFormat>,

    /// JPEG quality
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Solid border around the export, in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_PADDING as i64))]
    padding: Option<u32>,

    /// Browser window frame
    #[arg(long, value_enum)]
    frame: Option<FrameArg>,

    /// URL shown in the frame
    #[arg(long)]
    url: Option<String>,

    /// Print the export date in the frame
    #[arg(long, action = ArgAction::SetTrue)]
    date: bool,

    /// Image stamped on the export with the configured watermark settings
    #[arg(long)]
    watermark: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FrameArg {
    Mac,
    Windows,
}

impl From<FrameArg> for FrameStyle {
    fn from(arg: FrameArg) -> Self {
        match arg {
            FrameArg::Mac => FrameStyle::Mac,
            FrameArg::Windows => FrameStyle::Windows,
        }
    }
}

fn parse_format(value: &str) -> Result<ExportFormat, String> {
    value.parse()
}

async fn read_image(path: &PathBuf) -> anyhow::Result<image::RgbaImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    decode_image(bytes)
        .await
        .with_context(|| format!("Failed to decode {}", path.display()))
}

async fn run(args: Args) -> anyhow::Result<PathBuf> {
    let config = EditorConfig::load();
    let image = read_image(&args.image).await?;
    let mut editor = Editor::from_config(image, MemoryScene::new(), &config);

    if let Some(path) = &args.annotations {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let count = editor.load_annotations_json(&json)?;
        log::info!("Loaded {count} annotations from {}", path.display());
    }

    let mut export = config.export_config();
    if let Some(format) = args.format {
        export.format = format;
    } else if let Some(format) = args
        .output
        .as_ref()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse().ok())
    {
        export.format = format;
    }
    if let Some(quality) = args.quality {
        export.quality = quality;
    }
    if let Some(size) = args.padding {
        export.padding = Some(PaddingConfig {
            size,
            ..export.padding.unwrap_or_default()
        });
    }
    if args.frame.is_some() || args.url.is_some() || args.date {
        let base = export.browser_frame.take().unwrap_or_default();
        export.browser_frame = Some(FrameConfig {
            style: args.frame.map_or(base.style, FrameStyle::from),
            url: args.url.clone().or(base.url),
            show_date: args.date || base.show_date,
        });
    }
    if let Some(path) = args.watermark.as_ref().or(config.watermark_path.as_ref()) {
        export.watermark = Some(Watermark {
            image: Arc::new(read_image(path).await?),
            settings: config.watermark,
        });
    }

    let output = editor.export_with(&export)?;
    let path = match args.output {
        Some(path) => path,
        None => {
            let config = EditorConfig {
                export_format: export.format,
                ..config
            };
            config
                .output_path()
                .context("No Pictures or Documents directory, pass --output")?
        }
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&path, &output.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let path = runtime.block_on(run(args))?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_export_options() {
        let args = Args::try_parse_from([
            "capmark", "shot.png", "-a", "notes.json", "-f", "jpg", "-q", "80", "--padding",
            "20", "--frame", "windows", "--date",
        ])
        .unwrap();
        assert_eq!(args.image, PathBuf::from("shot.png"));
        assert_eq!(args.annotations, Some(PathBuf::from("notes.json")));
        assert_eq!(args.format, Some(ExportFormat::Jpeg));
        assert_eq!(args.quality, Some(80));
        assert_eq!(args.padding, Some(20));
        assert_eq!(args.frame, Some(FrameArg::Windows));
        assert!(args.date);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(Args::try_parse_from(["capmark", "a.png", "-q", "0"]).is_err());
        assert!(Args::try_parse_from(["capmark", "a.png", "--padding", "500"]).is_err());
        assert!(Args::try_parse_from(["capmark", "a.png", "-f", "gif"]).is_err());
        assert!(Args::try_parse_from(["capmark"]).is_err());
    }
}
