use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use era5_explorer::{
    write_csv, AnimationOptions, Area, AxisVariable, DownloadWindow, Era5Explorer,
    FrameSelector, VariableRegistry, YBins,
};
use log::info;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "era5")]
#[command(about = "Download ERA5 reanalysis data and explore its distributions")]
struct Args {
    /// Project directory holding data/ and rendered output
    #[arg(long, env = "PROJECT_DIR", global = true)]
    project_dir: Option<PathBuf>,

    /// JSON file with variable titles, units and conversions
    #[arg(long, global = true)]
    variables: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download an archive from the Climate Data Store
    Download {
        #[arg(long, default_value_t = DownloadWindow::default().start_year)]
        start_year: i32,
        #[arg(long, default_value_t = DownloadWindow::default().end_year)]
        end_year: i32,
        #[arg(long, default_value_t = DownloadWindow::default().start_month)]
        start_month: u32,
        #[arg(long, default_value_t = DownloadWindow::default().end_month)]
        end_month: u32,
        #[arg(long, default_value_t = DownloadWindow::default().start_day)]
        start_day: u32,
        #[arg(long, default_value_t = DownloadWindow::default().end_day)]
        end_day: u32,
        #[arg(long, default_value_t = Area::default().north, allow_hyphen_values = true)]
        north: f64,
        #[arg(long, default_value_t = Area::default().west, allow_hyphen_values = true)]
        west: f64,
        #[arg(long, default_value_t = Area::default().south, allow_hyphen_values = true)]
        south: f64,
        #[arg(long, default_value_t = Area::default().east, allow_hyphen_values = true)]
        east: f64,
    },
    /// Extract and merge an archive into the parquet cache
    Preprocess {
        /// Defaults to the newest archive in data/raw
        #[arg(long)]
        archive: Option<PathBuf>,
    },
    /// Summary statistics and smoothed distribution of one variable
    Stats {
        variable: String,
        /// Time steps to use: `all`, an index such as `3`, or a range such as `0..24`
        #[arg(long, default_value = "all")]
        frame: FrameSelector,
        #[arg(long, default_value_t = 100)]
        bins: usize,
        #[arg(long, default_value_t = 1.0)]
        sigma: f64,
        /// Write the estimate to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Joint distribution of a positional axis and a variable
    Joint {
        /// valid_time, latitude or longitude
        axis: AxisVariable,
        variable: String,
        #[arg(long, default_value_t = 100)]
        bins_y: usize,
        #[arg(long, default_value_t = 1.0)]
        sigma: f64,
        /// Time steps to use: `all`, an index, or a range such as `0..24`
        #[arg(long, default_value = "all")]
        frame: FrameSelector,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Render an animated GIF of a variable
    Animate {
        variable: String,
        #[arg(long, default_value_t = 5)]
        fps: u32,
        /// Skip writing individual PNG frames
        #[arg(long)]
        no_frames: bool,
        #[arg(long, default_value_t = 4)]
        cell_px: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    let mut explorer = match args.project_dir {
        Some(dir) => Era5Explorer::with_project_dir(dir).await?,
        None => Era5Explorer::new().await?,
    };
    if let Some(path) = &args.variables {
        let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
        let registry = VariableRegistry::from_json_reader(file)
            .with_context(|| format!("parsing variable registry {:?}", path))?;
        explorer = explorer.with_registry(registry);
    }

    match args.command {
        Command::Download {
            start_year,
            end_year,
            start_month,
            end_month,
            start_day,
            end_day,
            north,
            west,
            south,
            east,
        } => {
            let window = DownloadWindow {
                start_year,
                end_year,
                start_month,
                end_month,
                start_day,
                end_day,
            };
            let area = Area {
                north,
                west,
                south,
                east,
            };
            let path = explorer.download().window(window).area(area).call().await?;
            println!("{}", path.display());
        }
        Command::Preprocess { archive } => {
            let field = explorer.load_field().maybe_archive(archive).call().await?;
            let (n_time, n_lat, n_lon) = field.shape();
            println!(
                "{} time steps, {} latitudes, {} longitudes, variables: {}",
                n_time,
                n_lat,
                n_lon,
                field.variable_names().collect::<Vec<_>>().join(", ")
            );
        }
        Command::Stats {
            variable,
            frame,
            bins,
            sigma,
            csv,
        } => {
            let field = explorer.load_field().call().await?;
            let estimate = explorer
                .kde1d()
                .field(&field)
                .variable(&variable)
                .frame(frame)
                .bins(bins)
                .smooth_sigma(sigma)
                .call()?;
            let units = explorer.registry().spec_or_default(&variable).units;
            println!("{} ({} values)", variable, estimate.count);
            println!("  min:    {:.2} {}", estimate.v_min, units);
            println!("  mean:   {:.2} {}", estimate.mean, units);
            println!("  median: {:.2} {}", estimate.median, units);
            println!("  max:    {:.2} {}", estimate.v_max, units);
            if let Some(path) = csv {
                write_csv(&mut estimate.to_dataframe()?, &path)?;
                info!("Wrote {:?}", path);
            }
        }
        Command::Joint {
            axis,
            variable,
            bins_y,
            sigma,
            frame,
            csv,
        } => {
            let field = explorer.load_field().call().await?;
            let estimate = explorer
                .kde2d()
                .field(&field)
                .axis(axis)
                .variable(&variable)
                .y_bins(YBins::Count(bins_y))
                .smooth_sigma(sigma)
                .frame(frame)
                .call()?;
            println!(
                "{} against {}: {} x {} buckets, {} in [{:.2}, {:.2}]",
                variable,
                axis,
                estimate.bins_x(),
                estimate.bins_y(),
                variable,
                estimate.y_range.0,
                estimate.y_range.1
            );
            for ((x, lo), hi) in estimate
                .x_unique
                .iter()
                .zip(&estimate.min_per_x)
                .zip(&estimate.max_per_x)
            {
                println!("  {:>10.2}: {:.2} .. {:.2}", x, lo, hi);
            }
            if let Some(path) = csv {
                write_csv(&mut estimate.to_dataframe()?, &path)?;
                info!("Wrote {:?}", path);
            }
        }
        Command::Animate {
            variable,
            fps,
            no_frames,
            cell_px,
        } => {
            let field = explorer.load_field().call().await?;
            let options = AnimationOptions {
                fps,
                save_frames: !no_frames,
                cell_px,
            };
            let output = explorer
                .animate()
                .field(&field)
                .variable(&variable)
                .options(options)
                .call()
                .await?;
            println!("{}", output.gif.display());
        }
    }
    Ok(())
}
