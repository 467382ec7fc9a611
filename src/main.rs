use anyhow::Context;
use clap::Parser;
use dbem::config::PipelineConfig;
use dbem::core::demand::DemandField;
use dbem::input::{read_benchmarks, read_buildings};
use dbem::output::FileOutput;
use dbem::output_writer::BuildingColumns;
use dbem::read_benchmark_uses::{benchmark_uses_from_archive, benchmark_uses_from_json};
use dbem::read_boundaries::{
    local_authority_boundaries_from_geojson, small_area_boundaries_from_geojson,
};
use dbem::{run_project, ProjectFlags, ProjectInput};
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct DbemArgs {
    #[arg(help = "Path to valuation office buildings in .csv format")]
    buildings_file: String,
    #[arg(long, short, help = "Path to energy benchmarks in .csv format")]
    benchmarks: String,
    #[arg(
        long,
        short = 'u',
        help = "Path to benchmark uses, either a .zip of one .txt file per benchmark or a cached .json"
    )]
    benchmark_uses: String,
    #[arg(long, short, help = "Path to small area boundaries in .geojson format")]
    small_area_boundaries: Option<String>,
    #[arg(
        long,
        short,
        requires = "small_area_boundaries",
        help = "Path to local authority boundaries in .geojson format"
    )]
    local_authority_boundaries: Option<String>,
    #[arg(long, short, help = "Path to a pipeline configuration in .json format")]
    config: Option<String>,
    #[arg(long, help = "Boiler efficiency, overriding any configured value")]
    boiler_efficiency: Option<f64>,
    #[arg(
        long,
        short,
        help = "Directory to write results to [default: <buildings file stem>__results]"
    )]
    output_dir: Option<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Demand columns to write for each building [default: all]"
    )]
    demand_columns: Vec<DemandField>,
    #[arg(long, help = "Only write buildings with a positive value of this demand")]
    filter_on: Option<DemandField>,
    #[clap(
        long,
        default_value_t = false,
        help = "Write uses which could not be matched to a benchmark"
    )]
    unknown_uses: bool,
    #[clap(
        long,
        default_value_t = false,
        help = "Write the floor area used for each building"
    )]
    bounded_areas: bool,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

fn main() -> anyhow::Result<()> {
    let args = DbemArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(tracing::Level::DEBUG);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)
        .context("setting tracing subscriber failed")?;

    let buildings_file = args.buildings_file.as_str();
    let buildings_file_ext = Path::new(buildings_file)
        .extension()
        .and_then(OsStr::to_str);
    let buildings_file_stem = match buildings_file_ext {
        Some(ext) => &buildings_file[..(buildings_file.len() - ext.len() - 1)],
        None => buildings_file,
    };

    let output_path = match &args.output_dir {
        Some(output_dir) => PathBuf::from(output_dir),
        None => PathBuf::from(format!("{buildings_file_stem}__results")),
    };
    fs::create_dir_all(&output_path)?;
    let file_output = FileOutput::new(output_path.clone(), "{}.{}".to_string());

    let mut config = match &args.config {
        Some(config) => PipelineConfig::from_json(open(config)?)?,
        None => PipelineConfig::default(),
    };
    if let Some(boiler_efficiency) = args.boiler_efficiency {
        config.boiler_efficiency = boiler_efficiency;
    }
    debug!("Using configuration {config:?}");

    let input = ProjectInput {
        buildings: read_buildings(open(buildings_file)?)?,
        benchmarks: read_benchmarks(open(&args.benchmarks)?)?,
        benchmark_uses: match Path::new(&args.benchmark_uses)
            .extension()
            .and_then(OsStr::to_str)
        {
            Some("json") => benchmark_uses_from_json(open(&args.benchmark_uses)?)?,
            _ => benchmark_uses_from_archive(open(&args.benchmark_uses)?)?,
        },
        small_areas: args
            .small_area_boundaries
            .as_deref()
            .map(|path| {
                small_area_boundaries_from_geojson(open(path)?, &config.boundary_properties)
            })
            .transpose()?,
        local_authorities: args
            .local_authority_boundaries
            .as_deref()
            .map(|path| {
                local_authority_boundaries_from_geojson(open(path)?, &config.boundary_properties)
            })
            .transpose()?,
    };

    let columns = BuildingColumns {
        demand_fields: if args.demand_columns.is_empty() {
            BuildingColumns::default().demand_fields
        } else {
            args.demand_columns.clone()
        },
        filter_on: args.filter_on,
    };

    let results = run_project(
        input,
        &config,
        &columns,
        &file_output,
        &(&args).into(),
    )?;

    info!(
        "Wrote {} buildings and {} small areas to {}",
        results.buildings.len(),
        results.small_areas.len(),
        output_path.display()
    );

    Ok(())
}

fn open(path: &str) -> anyhow::Result<BufReader<File>> {
    Ok(BufReader::new(
        File::open(path).with_context(|| format!("Could not open {path}"))?,
    ))
}

impl From<&DbemArgs> for ProjectFlags {
    fn from(args: &DbemArgs) -> Self {
        let mut flags = ProjectFlags::empty();
        if args.unknown_uses {
            flags.insert(ProjectFlags::UNKNOWN_USES);
        }
        if args.bounded_areas {
            flags.insert(ProjectFlags::BOUNDED_AREAS);
        }

        flags
    }
}
