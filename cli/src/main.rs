use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use workflow::compare::{run_compare, CompareSettings};
use workflow::config::ToolConfig;
use workflow::merge::{run_merge, write_report, MergeRequest};

mod workflow;

#[derive(Parser)]
#[command(author, version, about = "b-tagging scale-factor calibration tools")]
struct Args {
    /// Load tool defaults (merge source lists, plot style, catalog) from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plot scale factors of several taggers, years and working points
    Compare(CompareArgs),
    /// Merge systematic sources of a calibration file in quadrature
    Merge(MergeArgs),
}

#[derive(ClapArgs)]
struct CompareArgs {
    /// Tagger(s) to be compared
    #[arg(long, default_value = "deepcsv")]
    taggers: String,
    /// Year(s) to be compared
    #[arg(long, default_value = "2016-2017-2018")]
    years: String,
    /// Path where csv files are stored
    #[arg(long, default_value = "./CSVFiles")]
    inputpath: PathBuf,
    /// Additional csv files to be compared
    #[arg(long, default_value = "")]
    inputfiles: String,
    /// Only use custom csv files
    #[arg(long, default_value_t = false)]
    customfiles: bool,
    /// Working point(s) to be compared
    #[arg(long, default_value = "M")]
    wps: String,
    /// Measurement type(s) to be compared
    #[arg(long, default_value = "default")]
    meastypes: String,
    /// Flavour to be studied
    #[arg(long, default_value = "b")]
    flavour: String,
    /// Formats of the plot, e.g. png-svg
    #[arg(long, default_value = "png")]
    plotformat: String,
    #[arg(long, default_value = "./Plots")]
    plotdir: PathBuf,
}

#[derive(ClapArgs)]
struct MergeArgs {
    /// Name of the input csv file
    #[arg(long)]
    inputfile: String,
    /// Name of the output csv file
    #[arg(long, default_value = "default")]
    outputfile: String,
    /// Path where csv files are stored
    #[arg(long, default_value = "./CSVFiles/")]
    csvpath: PathBuf,
    /// Turn off year correlations
    #[arg(long, default_value_t = false)]
    yearcorroff: bool,
    /// Split type2 uncertainties
    #[arg(long, default_value_t = false)]
    splittype2: bool,
    /// Custom comma-separated list of uncertainties kept apart
    #[arg(long)]
    custom: Option<String>,
    /// Write a JSON summary of the merge
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        ToolConfig::load(path)?
    } else {
        ToolConfig::default()
    };

    match args.command {
        Command::Compare(compare) => {
            let settings = CompareSettings {
                taggers: compare.taggers,
                years: compare.years,
                input_path: compare.inputpath,
                input_files: compare.inputfiles,
                custom_files: compare.customfiles,
                wps: compare.wps,
                meastypes: compare.meastypes,
                flavour: compare.flavour,
                plot_format: compare.plotformat,
                plot_dir: compare.plotdir,
            };
            let result = run_compare(&settings, &config)?;
            println!(
                "Compare -> {} curves in {}, files {:?}",
                result.curve_count, result.title, result.written
            );
        }
        Command::Merge(merge) => {
            let request = MergeRequest {
                input_file: merge.inputfile,
                output_file: merge.outputfile,
                csv_path: merge.csvpath,
                year_correlations_off: merge.yearcorroff,
                split_type2: merge.splittype2,
                custom: merge.custom,
            };
            let run = run_merge(&request, &config)?;
            println!(
                "Merge -> {} ({} copied, {} merged entries, flag {})",
                run.output.display(),
                run.report.passthrough_entries,
                run.report.merged_entries,
                run.report.output_flag
            );
            if let Some(path) = merge.report {
                write_report(&run.report, &path)?;
            }
        }
    }

    Ok(())
}
