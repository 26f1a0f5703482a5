use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::perturb::NoiseDistribution;

/// Plot a comparative word list as heatmap and dendrogram.
///
/// Input is a CSV file with one row per language: its name, then a
/// (form, cognacy) column pair per concept. Forms judged cognate share the
/// same cognacy number; anything that is not a number counts as missing.
/// Rows starting with "#" and empty rows are ignored.
///
///   Concept  , 1SG , cognacy , HAND , cognacy
///   #POS     , prn ,         , n    ,
///   Duhumbi  , ga  , 1       , hut  , 1
///   Rupa     , gu  , 1       , ʔik  , 2
#[derive(Debug, Parser)]
#[command(name = "cognacy-cluster", version, verbatim_doc_comment)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plot the whole data set and its leading subset.
    Plot(PlotArgs),
    /// Plot copies of the similarity matrix with random variation added.
    Simulate(SimulateArgs),
    /// Write the similarity matrix as CSV and its linkage tree as JSON.
    Export(ExportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct PlotArgs {
    /// Cognacy spreadsheet
    #[arg(default_value = "data/dataset_khobwa.csv")]
    pub infile: PathBuf,

    /// Output directory (must exist)
    #[arg(long, default_value = "plots")]
    pub outdir: PathBuf,

    /// Name of the plot of the whole data
    #[arg(long, default_value = "tbkhobwa")]
    pub plot_all: String,

    /// Name of the plot of the first `part_range` items
    #[arg(long, default_value = "khobwa")]
    pub plot_part: String,

    /// Number of leading items in the partial plot
    #[arg(long, default_value_t = 22)]
    pub part_range: usize,

    #[command(flatten)]
    pub linkage: LinkageFlag,
}

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Cognacy spreadsheet
    #[arg(default_value = "data/dataset_khobwa.csv")]
    pub infile: PathBuf,

    /// Output directory (must exist)
    #[arg(long, default_value = "simulations")]
    pub outdir: PathBuf,

    /// Number of simulations to run
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    /// Probability distribution of the noise: uniform or binomial
    #[arg(long, default_value = "uniform")]
    pub distr: NoiseDistribution,

    /// Maximum spread around each value
    #[arg(long, default_value_t = 20)]
    pub spread: u32,

    /// Shift of every offset (negative: stricter cognacy judgements)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub mean: i32,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub linkage: LinkageFlag,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Cognacy spreadsheet
    #[arg(default_value = "data/dataset_khobwa.csv")]
    pub infile: PathBuf,

    /// Output directory (must exist)
    #[arg(long, default_value = ".")]
    pub outdir: PathBuf,

    /// Base name of the written files
    #[arg(long, default_value = "similarity")]
    pub name: String,

    /// Only export these items, in this order (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub items: Vec<String>,
}

/// `--linkage` / `--no-linkage`: print the linkage matrix to stdout.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct LinkageFlag {
    /// Show the linkage matrix
    #[arg(long = "linkage", overrides_with = "no_linkage")]
    linkage: bool,

    /// Do not show the linkage matrix (default)
    #[arg(long = "no-linkage", overrides_with = "linkage")]
    no_linkage: bool,
}

impl LinkageFlag {
    #[cfg(test)]
    pub fn on() -> Self {
        LinkageFlag {
            linkage: true,
            no_linkage: false,
        }
    }

    pub fn show(&self) -> bool {
        self.linkage && !self.no_linkage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cognacy-cluster").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn plot_defaults() {
        let Command::Plot(args) = parse(&["plot"]).command else {
            panic!("expected plot");
        };
        assert_eq!(args.infile, PathBuf::from("data/dataset_khobwa.csv"));
        assert_eq!(args.outdir, PathBuf::from("plots"));
        assert_eq!((args.plot_all.as_str(), args.plot_part.as_str()), ("tbkhobwa", "khobwa"));
        assert_eq!(args.part_range, 22);
        assert!(!args.linkage.show());
    }

    #[test]
    fn linkage_flags_last_one_wins() {
        let Command::Plot(args) = parse(&["plot", "--linkage"]).command else {
            panic!("expected plot");
        };
        assert!(args.linkage.show());
        let Command::Plot(args) = parse(&["plot", "--linkage", "--no-linkage"]).command else {
            panic!("expected plot");
        };
        assert!(!args.linkage.show());
    }

    #[test]
    fn simulate_options() {
        let cli = parse(&[
            "-v", "simulate", "in.csv", "--distr", "binomial", "--spread", "10", "--mean", "-5",
            "--count", "3", "--seed", "42",
        ]);
        assert_eq!(cli.verbose, 1);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.distr, NoiseDistribution::Binomial);
        assert_eq!((args.spread, args.mean, args.count), (10, -5, 3));
        assert_eq!(args.seed, Some(42));
    }

    #[test]
    fn unknown_distribution_is_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["cognacy-cluster", "simulate", "--distr", "poisson"])
            .unwrap_err();
        assert!(err.to_string().contains("poisson"));
    }

    #[test]
    fn export_item_list() {
        let Command::Export(args) = parse(&["export", "--items", "Rupa,Khispi"]).command else {
            panic!("expected export");
        };
        assert_eq!(args.items, vec!["Rupa", "Khispi"]);
    }
}
