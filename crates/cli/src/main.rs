use anyhow::{anyhow, bail, Context};
use config::{Config, File};
use fluvial::{
    render::svg::networks_to_svg, timed, TerrainGenerator, WorldConfig,
};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for generating terrain regions with Fluvial.
#[derive(Debug, StructOpt)]
#[structopt(name = "fluvial")]
struct Opt {
    /// Path to a config file that defines the world. Supported formats: JSON,
    /// TOML. If not given, the default config is used.
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// X coordinate of the first region to generate, in region units
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    region_x: i32,

    /// Z coordinate of the first region to generate, in region units
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    region_z: i32,

    /// Generate an n×n square of regions, starting at the given region
    #[structopt(long, default_value = "1")]
    regions: u32,

    /// If given, generated regions will be saved to this directory. The exact
    /// files that appear in the directory are defined by the output formats.
    /// See `--output-formats` for more info
    #[structopt(short, long)]
    output: Option<PathBuf>,

    /// The format(s) to output regions in. Supported formats:
    ///
    /// cfg - The full config object used for the world, in TOML format
    ///
    /// json - Packed column heights and basin climates of each region
    ///
    /// svg - 2D rendering of the rivers that shaped each region
    #[structopt(short = "f", long)]
    output_formats: Vec<OutputFormat>,

    /// The logging level to use during generation. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Different output formats.
#[derive(Copy, Clone, Debug, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    // If you change this, make sure to update the help text for
    // `--output-formats`!
    /// Export the world's full config in a human-readable file
    Cfg,
    /// Export each region's height map as JSON
    Json,
    /// Draw each region's drainage networks as a 2D SVG
    Svg,
}

impl OutputFormat {
    fn file_ext(self) -> &'static str {
        match self {
            Self::Cfg => "toml",
            Self::Json => "json",
            Self::Svg => "svg",
        }
    }
}

fn load_config(config_path: &Path) -> anyhow::Result<WorldConfig> {
    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .context("error reading config file")?;
    settings.try_into().context("error reading config")
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("error opening output file {:?}", path))?;
    file.write_all(bytes)
        .with_context(|| format!("error writing to file {:?}", path))
}

/// Generate one region and write it out in every requested per-region format
fn gen_region_output(
    output_dir: &Path,
    output_formats: &[OutputFormat],
    generator: &TerrainGenerator,
    region_x: i32,
    region_z: i32,
) -> anyhow::Result<()> {
    let region = generator.generate_region(region_x, region_z);
    let file_stem = format!("region_{}_{}", region_x, region_z);

    for &output_format in output_formats {
        let bytes: Vec<u8> = match output_format {
            // Only written once for the whole run
            OutputFormat::Cfg => continue,
            OutputFormat::Json => region.to_json().into_bytes(),
            OutputFormat::Svg => {
                let frame = generator.region_frame(region_x, region_z);
                let networks: Vec<_> = generator
                    .basins_in(frame)
                    .into_iter()
                    .map(|basin| generator.drainage_network(basin))
                    .collect();
                networks_to_svg(
                    generator.config(),
                    networks.iter().map(|network| &**network),
                    Some(frame),
                )
                .to_string()
                .into_bytes()
            }
        };

        let output_file_path = output_dir
            .join(&file_stem)
            .with_extension(output_format.file_ext());
        timed!(
            format!(
                "Writing {} output to {:?}",
                output_format, &output_file_path
            ),
            log::Level::Info,
            write_file(&output_file_path, &bytes)?
        );
    }
    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let config = match &opt.config {
        Some(config_path) => load_config(config_path)?,
        None => {
            info!("No config given, using defaults");
            WorldConfig::default()
        }
    };
    let generator = TerrainGenerator::new(config)?;

    let output_dir = match opt.output {
        Some(output_dir) => output_dir,
        None => {
            // Nothing to write, but still generate so timings get logged
            generator.generate_region(opt.region_x, opt.region_z);
            return Ok(());
        }
    };
    if opt.output_formats.is_empty() {
        bail!("output dir was specified, but no output formats were given")
    }
    fs::create_dir_all(&output_dir)?;

    if opt
        .output_formats
        .iter()
        .any(|format| matches!(format, OutputFormat::Cfg))
    {
        let path = output_dir
            .join("world")
            .with_extension(OutputFormat::Cfg.file_ext());
        // Panics only if config format isn't serializable (a bug)
        let text = toml::to_string_pretty(generator.config())
            .expect("error serializing config");
        write_file(&path, text.as_bytes())?;
        info!("Wrote config to {:?}", path);
    }

    let regions = opt.regions as i32;
    for dz in 0..regions {
        for dx in 0..regions {
            gen_region_output(
                &output_dir,
                &opt.output_formats,
                &generator,
                opt.region_x + dx,
                opt.region_z + dz,
            )?;
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
