use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::assets::AssetRepository;
use crate::editor::Editor;
use crate::scene::Scene;
use crate::utils::sanitize_file_stem;
use crate::visual::DEFAULT_MODEL_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum OutputDestination {
    Stdout,
    File(PathBuf),
    /// Named after the exported model, next to the input (or in the working directory).
    Beside(PathBuf),
}

#[derive(Debug, Parser)]
#[command(
    name = "rdlt-draw",
    about = "Lay out RDLT models from a scene description and export them as RDLT text, SVG or PNG."
)]
pub struct RenderArgs {
    /// Path to the scene JSON file. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Path to the output file. Use '-' to write to stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Output format (defaults to the output file extension or txt).
    #[arg(short = 'e', long = "output-format")]
    output_format: Option<OutputFormat>,

    /// Override the model name stored in the scene.
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Directory holding component templates (defaults to the bundled set).
    #[arg(long = "templates")]
    templates: Option<PathBuf>,

    /// Scale factor applied when rasterizing PNG output.
    #[arg(long = "scale", default_value_t = 1.0)]
    scale: f32,

    /// Background color for SVG and PNG output.
    #[arg(short = 'b', long = "background-color", default_value = "white")]
    background_color: String,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Txt,
    Svg,
    Png,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
        {
            Some(ext) if ext == "txt" => Some(OutputFormat::Txt),
            Some(ext) if ext == "svg" => Some(OutputFormat::Svg),
            Some(ext) if ext == "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

pub async fn dispatch() -> Result<()> {
    run_render(RenderArgs::parse()).await
}

pub async fn run_render(cli: RenderArgs) -> Result<()> {
    let input_source = parse_input(cli.input.as_deref())?;
    let output_dest = parse_output(cli.output.as_deref(), &input_source)?;
    let format = determine_format(cli.output_format, &output_dest)?;

    if format == OutputFormat::Png && !(cli.scale.is_finite() && cli.scale > 0.0) {
        bail!("--scale must be greater than zero for PNG output");
    }

    let source = load_scene(&input_source)?;
    let scene = Scene::parse(&source).context("failed to parse scene description")?;

    let assets = load_assets(cli.templates.as_deref()).await?;
    let mut editor = Editor::new(&assets, DEFAULT_MODEL_NAME)?;
    scene.apply(&mut editor)?;
    if let Some(name) = cli.name {
        editor.set_model_name(name);
    }

    let (filename, bytes) = match format {
        OutputFormat::Txt => {
            let file = editor.export_rdlt();
            (file.filename, file.contents)
        }
        OutputFormat::Svg => {
            let svg = editor.export_svg(&cli.background_color)?;
            let filename = format!("{}.svg", sanitize_file_stem(editor.model().name()));
            (filename, svg.into_bytes())
        }
        OutputFormat::Png => {
            let file = editor.export_png(&cli.background_color, cli.scale)?;
            (file.filename, file.contents)
        }
    };

    let output_dest = match output_dest {
        OutputDestination::Beside(dir) => OutputDestination::File(beside_path(&dir, &filename)?),
        other => other,
    };
    write_output(output_dest, &bytes, cli.quiet)?;

    Ok(())
}

async fn load_assets(templates: Option<&Path>) -> Result<AssetRepository> {
    match templates {
        Some(dir) => {
            let mut assets = AssetRepository::new();
            assets
                .initialize_from_dir(dir)
                .await
                .with_context(|| format!("failed to load templates from '{}'", dir.display()))?;
            Ok(assets)
        }
        None => Ok(AssetRepository::bundled()?),
    }
}

fn parse_input(input: Option<&str>) -> Result<InputSource> {
    match input {
        Some("-") => Ok(InputSource::Stdin),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                return Err(anyhow!("input file '{path_str}' does not exist"));
            }
            Ok(InputSource::File(path))
        }
        None => Ok(InputSource::Stdin),
    }
}

fn parse_output(output: Option<&str>, input: &InputSource) -> Result<OutputDestination> {
    match output {
        Some("-") => Ok(OutputDestination::Stdout),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(anyhow!(
                        "output directory '{}' does not exist",
                        parent.display()
                    ));
                }
            }
            Ok(OutputDestination::File(path))
        }
        None => match input {
            InputSource::File(path) => Ok(OutputDestination::Beside(
                path.parent().map(Path::to_path_buf).unwrap_or_default(),
            )),
            InputSource::Stdin => Ok(OutputDestination::Beside(PathBuf::new())),
        },
    }
}

/// Joins only the final component of `filename`, so model names cannot
/// steer the output out of `dir`.
fn beside_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| anyhow!("cannot derive an output file name from '{filename}'"))?;
    Ok(dir.join(name))
}

fn determine_format(
    preference: Option<OutputFormat>,
    output: &OutputDestination,
) -> Result<OutputFormat> {
    if let Some(fmt) = preference {
        return Ok(fmt);
    }

    match output {
        OutputDestination::Stdout | OutputDestination::Beside(_) => Ok(OutputFormat::Txt),
        OutputDestination::File(path) => OutputFormat::from_path(path).ok_or_else(|| {
            anyhow!(
                "unable to determine output format from '{}'; please specify --output-format",
                path.display()
            )
        }),
    }
}

fn load_scene(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            if buffer.trim().is_empty() {
                Err(anyhow!("no scene description supplied on stdin"))
            } else {
                Ok(buffer)
            }
        }
        InputSource::File(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            if contents.trim().is_empty() {
                Err(anyhow!("input file '{}' was empty", path.display()))
            } else {
                Ok(contents)
            }
        }
    }
}

fn write_output(dest: OutputDestination, bytes: &[u8], quiet: bool) -> Result<()> {
    match dest {
        OutputDestination::Stdout => {
            let mut stdout = io::stdout();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
        OutputDestination::File(path) | OutputDestination::Beside(path) => {
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            if !quiet {
                println!("Generated diagram -> {}", path.display());
            }
        }
    }
    Ok(())
}
