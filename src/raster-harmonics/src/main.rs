use clap::Parser;
use ndarray::Axis;
use raster_harmonics::io::{read_collection, read_sample_points, stack_bands, write_csv};
use raster_harmonics::{compute_fourier_transform, sample_points, DEFAULT_MODES};
use tracing::{info, Level};

#[derive(Parser)]
#[clap(name = "raster-harmonics")]
struct Args {
    /// CSV manifest with `path` and `date` columns, one GeoTIFF per row
    #[clap(short, long)]
    manifest: String,

    /// Names of the TIFF pages, in order
    #[clap(short, long, value_delimiter = ',', required = true)]
    bands: Vec<String>,

    /// Band modelled by the harmonic regression
    #[clap(short, long)]
    dependent: String,

    #[clap(long, default_value_t = DEFAULT_MODES)]
    modes: usize,

    /// Composite table, one row per pixel
    #[clap(short, long)]
    output: String,

    /// CSV of `row,col,label` points to sample from the composite
    #[clap(long, requires = "samples_output")]
    samples: Option<String>,

    /// Where to write the sampled training table
    #[clap(long, requires = "samples")]
    samples_output: Option<String>,

    #[clap(long, default_value = "4")]
    jobs: usize,

    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    rayon::ThreadPoolBuilder::new().num_threads(args.jobs).build_global()?;

    let collection = read_collection(&args.manifest, &args.bands)?;
    let composite = compute_fourier_transform(collection, &args.dependent, args.modes)?;

    let headers = composite.band_names();
    write_csv(&stack_bands(&composite), &headers, &args.output)?;
    info!(output = %args.output, bands = headers.len(), "wrote composite");

    if let (Some(samples), Some(samples_output)) = (&args.samples, &args.samples_output) {
        let points = read_sample_points(samples)?;
        let dataset = sample_points(&composite, &points)?;

        let mut sample_headers: Vec<&str> = headers.clone();
        sample_headers.push("label");
        let labels = dataset.targets().mapv(|label| label as f64).insert_axis(Axis(1));
        let table = ndarray::concatenate(Axis(1), &[dataset.records().view(), labels.view()])?;
        write_csv(&table, &sample_headers, samples_output)?;
        info!(output = %samples_output, points = dataset.records().nrows(), "wrote training samples");
    }
    Ok(())
}
