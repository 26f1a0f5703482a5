use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::cli::{ExportArgs, PlotArgs, SimulateArgs};
use crate::cluster::{average_linkage, LinkageStep};
use crate::data::filter::MIN_ITEMS;
use crate::data::loader::load_file;
use crate::data::model::SimilarityMatrix;
use crate::perturb::{NoiseModel, Simulation};
use crate::render::render_clustermap;
use crate::similarity::hamming_similarity;

/// Extension of every written plot.
pub const PLOT_EXTENSION: &str = "svg";

// ---------------------------------------------------------------------------
// Shared steps
// ---------------------------------------------------------------------------

/// Load a spreadsheet and compute its pairwise cognacy percentages.
pub fn calculate_pairwise_cognacy(infile: &Path) -> Result<SimilarityMatrix> {
    let data = load_file(infile).with_context(|| format!("loading {}", infile.display()))?;
    let similarity = hamming_similarity(&data)
        .with_context(|| format!("computing similarities for {}", infile.display()))?;
    log::debug!("Pairwise cognacy:\n{similarity}");
    Ok(similarity)
}

/// Output directories are not created on demand.
fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("output directory {} does not exist", dir.display());
    }
    Ok(())
}

/// Cluster `similarity`, optionally print the linkage matrix, and write the
/// clustermap to `<base>.svg`. Returns the written path.
pub fn plot_heatmap_with_dendrogram(
    similarity: &SimilarityMatrix,
    base: &Path,
    show_linkage: bool,
) -> Result<PathBuf> {
    if similarity.len() < MIN_ITEMS {
        bail!(
            "cannot cluster {} item(s); at least {MIN_ITEMS} are needed",
            similarity.len()
        );
    }
    let linkage = average_linkage(similarity);
    if show_linkage {
        print!("{linkage}");
    }

    // Appended rather than `with_extension`, so dots in plot names survive.
    let mut path = base.as_os_str().to_owned();
    path.push(format!(".{PLOT_EXTENSION}"));
    let path = PathBuf::from(path);
    log::info!("Writing {}", path.display());
    render_clustermap(similarity, &linkage, &path)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Two plots: all items, and the first `part_range` items.
pub fn run_plot(args: &PlotArgs) -> Result<Vec<PathBuf>> {
    ensure_dir(&args.outdir)?;
    let pairwise = calculate_pairwise_cognacy(&args.infile)?;

    let all = plot_heatmap_with_dendrogram(
        &pairwise,
        &args.outdir.join(&args.plot_all),
        args.linkage.show(),
    )?;

    let part_range = if args.part_range > pairwise.len() {
        log::warn!(
            "--part-range {} exceeds the {} items; plotting all of them",
            args.part_range,
            pairwise.len()
        );
        pairwise.len()
    } else {
        args.part_range
    };
    let part = pairwise.leading(part_range)?;
    let part = plot_heatmap_with_dendrogram(&part, &args.outdir.join(&args.plot_part), false)?;

    Ok(vec![all, part])
}

/// `count` plots of the similarity matrix with random noise added.
pub fn run_simulate(args: &SimulateArgs) -> Result<Vec<PathBuf>> {
    let model = NoiseModel::new(args.distr, args.spread, args.mean)?;
    ensure_dir(&args.outdir)?;
    let pairwise = calculate_pairwise_cognacy(&args.infile)?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    log::info!(
        "Running {} simulation(s): {} noise, spread {}, mean {}",
        args.count,
        model.distribution,
        model.spread,
        model.mean
    );
    let start = Instant::now();
    let prefix = format!("simulation_{}_{}", args.distr, args.spread);
    let mut written = Vec::with_capacity(args.count);
    for (i, perturbed) in Simulation::new(&pairwise, model, rng, args.count).enumerate() {
        let base = args.outdir.join(format!("{prefix}_{}", i + 1));
        written.push(plot_heatmap_with_dendrogram(&perturbed, &base, args.linkage.show())?);
    }
    log::info!("--- {:.3} seconds ---", start.elapsed().as_secs_f64());
    Ok(written)
}

#[derive(Debug, Serialize)]
struct LinkageExport<'a> {
    labels: &'a [String],
    steps: &'a [LinkageStep],
    leaf_order: Vec<&'a str>,
}

/// Similarity matrix as `<name>.csv` and linkage tree as `<name>_linkage.json`.
pub fn run_export(args: &ExportArgs) -> Result<Vec<PathBuf>> {
    ensure_dir(&args.outdir)?;
    let mut pairwise = calculate_pairwise_cognacy(&args.infile)?;
    if !args.items.is_empty() {
        pairwise = pairwise.select(args.items.as_slice())?;
    }

    let csv_path = args.outdir.join(format!("{}.csv", args.name));
    log::info!("Writing {}", csv_path.display());
    write_matrix_csv(&pairwise, &csv_path)
        .with_context(|| format!("writing {}", csv_path.display()))?;

    let json_path = args.outdir.join(format!("{}_linkage.json", args.name));
    log::info!("Writing {}", json_path.display());
    let linkage = average_linkage(&pairwise);
    let export = LinkageExport {
        labels: &linkage.labels,
        steps: &linkage.steps,
        leaf_order: linkage
            .leaf_order()
            .into_iter()
            .map(|i| linkage.labels[i].as_str())
            .collect(),
    };
    let file =
        File::create(&json_path).with_context(|| format!("creating {}", json_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &export)
        .with_context(|| format!("writing {}", json_path.display()))?;

    Ok(vec![csv_path, json_path])
}

fn write_matrix_csv(similarity: &SimilarityMatrix, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(std::iter::once("").chain(similarity.labels().iter().map(String::as_str)))?;
    for (i, label) in similarity.labels().iter().enumerate() {
        let cells = similarity.row(i).iter().map(|v| v.to_string());
        writer.write_record(std::iter::once(label.clone()).chain(cells))?;
    }
    writer.flush()?;
    Ok(())
}
