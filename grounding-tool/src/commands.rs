//! Implementations of the tool's subcommands.

use crate::{common::*, dataset::SelectedDataset};
use label::{pointing, Geometry};
use prettytable::{cell, row, Table};
use rendezvous::{FileFlag, WaitOptions};

/// Reads image dimensions from file headers, caching them by image path.
#[derive(Debug)]
pub struct ImageSizes {
    image_dir: PathBuf,
    cache: HashMap<String, ImageSize>,
}

impl ImageSizes {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, image: &str) -> Result<ImageSize> {
        if let Some(size) = self.cache.get(image) {
            return Ok(*size);
        }
        let path = self.image_dir.join(image);
        let imagesize::ImageSize { width, height } = imagesize::size(&path)
            .map_err(|err| format_err!("unable to read size of '{}': {:?}", path.display(), err))?;
        let size = ImageSize::try_new(width as i64, height as i64)?;
        self.cache.insert(image.to_string(), size);
        Ok(size)
    }
}

/// Converts `<ref>`/`<point>` tagged pointing data into annotation samples.
pub fn convert_pointing(
    input: &Path,
    output: &Path,
    save_malformed: Option<&Path>,
    system: CoordinateSystem,
) -> Result<()> {
    let items: Vec<Value> = load_samples(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    info!("loaded {} items from '{}'", items.len(), input.display());

    let pointing::Conversion { samples, skipped } = pointing::convert_items(&items, system);
    info!(
        "converted {} items, skipped {}",
        samples.len(),
        skipped.len()
    );
    save_samples(output, &samples)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    if let Some(path) = save_malformed {
        if !skipped.is_empty() {
            let items: Vec<_> = skipped.into_iter().map(|(item, _)| item).collect();
            save_samples(path, &items)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!("saved skipped items to '{}'", path.display());
        }
    }
    Ok(())
}

/// Converts every sample of `input` from `from` units to `to` units.
///
/// Image sizes are read from `image_dir`. The first malformed sample aborts
/// the run. Returns the number of converted samples.
pub fn normalize(
    input: &Path,
    output: &Path,
    from: CoordinateSystem,
    to: CoordinateSystem,
    image_dir: &Path,
) -> Result<usize> {
    let samples: Vec<Sample> = load_samples(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let mut sizes = ImageSizes::new(image_dir);

    let converted = samples
        .iter()
        .map(|sample| -> Result<_> {
            let record = sample
                .to_record(from)
                .with_context(|| format!("invalid sample for '{}'", sample.image))?;
            warn_on_system_mismatch(&record, from);
            if !record.has_regions() {
                return Ok(sample.clone());
            }
            let size = sizes.get(&record.image)?;
            let record = record.convert(to, size);
            Sample::from_record(&record)
                .with_context(|| format!("conversion of '{}' is inconsistent", sample.image))
        })
        .collect::<Result<Vec<_>>>()?;

    save_samples(output, &converted)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    info!(
        "converted {} samples from {} to {}",
        converted.len(),
        from,
        to
    );
    Ok(converted.len())
}

/// Maps absolute coordinates onto the size each image is resized to by the processor.
///
/// Relative coordinates are scale-invariant and are copied unchanged.
pub fn rescale(
    input: &Path,
    output: &Path,
    system: CoordinateSystem,
    image_dir: &Path,
    resize: &ResizeConfig,
) -> Result<usize> {
    if system == CoordinateSystem::RelativeThousand {
        warn!("relative coordinates do not change on resize, copying samples");
    }
    let samples: Vec<Sample> = load_samples(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let mut sizes = ImageSizes::new(image_dir);

    let rescaled = samples
        .iter()
        .map(|sample| -> Result<_> {
            let record = sample
                .to_record(system)
                .with_context(|| format!("invalid sample for '{}'", sample.image))?;
            if system == CoordinateSystem::RelativeThousand || !record.has_regions() {
                return Ok(sample.clone());
            }
            let original = sizes.get(&record.image)?;
            let resized = smart_resize(original, resize)
                .with_context(|| format!("unable to resize '{}'", record.image))?;
            debug!("resize '{}' from {} to {}", record.image, original, resized);
            let record = record.rescale(original, resized);
            Sample::from_record(&record)
                .with_context(|| format!("rescaled '{}' is inconsistent", sample.image))
        })
        .collect::<Result<Vec<_>>>()?;

    save_samples(output, &rescaled)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    Ok(rescaled.len())
}

/// Statistics gathered by [check].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub samples: usize,
    pub boxes: usize,
    pub points: usize,
    /// Samples whose values contradict the declared coordinate system.
    pub mismatched: usize,
    /// Image and error message of every invalid sample.
    pub errors: Vec<(String, String)>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn print(&self) {
        let mut table = Table::new();
        table.add_row(row!["samples", "boxes", "points", "mismatched", "errors"]);
        table.add_row(row![
            self.samples,
            self.boxes,
            self.points,
            self.mismatched,
            self.errors.len()
        ]);
        table.printstd();

        if !self.errors.is_empty() {
            let mut table = Table::new();
            table.add_row(row!["image", "error"]);
            self.errors.iter().for_each(|(image, error)| {
                table.add_row(row![image, error]);
            });
            table.printstd();
        }
    }
}

/// Validates every sample of `input` as `system` units without modifying it.
pub fn check(input: &Path, system: CoordinateSystem) -> Result<CheckReport> {
    let samples: Vec<Sample> = load_samples(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let mut report = CheckReport::default();

    for sample in &samples {
        report.samples += 1;
        let record = match sample.to_record(system) {
            Ok(record) => record,
            Err(err) => {
                report.errors.push((sample.image.clone(), err.to_string()));
                continue;
            }
        };
        if warn_on_system_mismatch(&record, system) {
            report.mismatched += 1;
        }
        if let Err(err) = record.validate() {
            report.errors.push((sample.image.clone(), err.to_string()));
            continue;
        }
        for region in &record.regions {
            match region.geometry {
                Geometry::BoundingBox(_) => report.boxes += 1,
                Geometry::Point(_) => report.points += 1,
            }
        }
    }
    Ok(report)
}

/// Prints the resolved datasets as a table.
pub fn print_datasets(selected: &[SelectedDataset]) {
    let mut table = Table::new();
    table.add_row(row![
        "name",
        "sampling rate",
        "coordinates",
        "annotation path",
        "data path"
    ]);
    selected.iter().for_each(|dataset| {
        table.add_row(row![
            dataset.name,
            format!("{:.2}", dataset.sampling_rate),
            dataset
                .config
                .coordinate_system
                .map(|system| system.to_string())
                .unwrap_or_else(|| "-".to_string()),
            dataset.config.annotation_path.display(),
            dataset.config.data_path.display(),
        ]);
    });
    table.printstd();
}

/// Runs an external command to completion, failing on a non-zero exit status.
pub fn run_command(command: &[String]) -> Result<()> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| format_err!("no command given"))?;
    info!("running '{}'", command.join(" "));
    let status = process::Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("failed to start '{}'", program))?;
    ensure!(
        status.success(),
        "command '{}' exited with {}",
        command.join(" "),
        status
    );
    Ok(())
}

/// Resolves the flag for `run_id`, with `flag_dir` taking precedence over the configured directory.
pub fn gate_flag(config: &GateConfig, flag_dir: Option<PathBuf>, run_id: &str) -> Result<FileFlag> {
    let config = GateConfig {
        flag_dir: flag_dir.or_else(|| config.flag_dir.clone()),
        ..config.clone()
    };
    let flag = config
        .flag(run_id)
        .context("pass --flag-dir or set gate.flag_dir in the config file")?;
    Ok(flag)
}

/// The rank of this process: an explicit rank first, then `SLURM_PROCID`.
///
/// Fails when neither is known, since guessing rank 0 would make every
/// process a leader.
pub fn resolve_rank(rank: Option<usize>, slurm_procid: Option<&str>) -> Result<usize> {
    if let Some(rank) = rank {
        return Ok(rank);
    }
    let procid = slurm_procid
        .ok_or_else(|| format_err!("rank is unknown, pass --rank or set RANK or SLURM_PROCID"))?;
    procid
        .trim()
        .parse()
        .with_context(|| format!("invalid SLURM_PROCID '{}'", procid))
}

/// Passes the start-up gate as `role`, running `command` as the preparation step when leading.
pub fn pass_gate(flag: FileFlag, role: Role, options: &WaitOptions, command: &[String]) -> Result<()> {
    info!("passing gate '{}' as {:?}", flag.path().display(), role);
    let mut gate = Gate::new(flag);
    gate.pass(role, options, || run_command(command))?;
    Ok(())
}

/// Removes the gate flag. Removing an absent flag succeeds.
pub fn release_gate(flag: FileFlag) -> Result<()> {
    let path = flag.path().to_path_buf();
    Gate::new(flag).release()?;
    info!("released gate '{}'", path.display());
    Ok(())
}

fn warn_on_system_mismatch(record: &AnnotationRecord, declared: CoordinateSystem) -> bool {
    match record.guess_system() {
        Some(guessed) if guessed != declared => {
            warn!(
                "'{}' is declared {} but has coordinates above 1000",
                record.image, declared
            );
            true
        }
        _ => false,
    }
}
