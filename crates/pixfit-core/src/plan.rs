//! Batch planning: distributing a byte budget across images and resolving
//! output paths.
//!
//! The planner is pure: it owns the tasks until it hands plans to the
//! scheduler and touches neither the filesystem nor the codec.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::PlanError;
use crate::types::{ImageTask, JobPlan};

/// Immutable batch configuration, snapshotted at batch start.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// The byte budget: per image when `proportional` is false, for the
    /// whole batch when true
    pub target_bytes: u64,

    /// Split the budget across images weighted by pixel count
    pub proportional: bool,

    /// Directory for output files; `None` writes next to each source with a
    /// size suffix
    pub output_dir: Option<PathBuf>,

    /// Worker pool size
    pub concurrency: usize,

    /// Derive the filename suffix from each plan's effective target instead
    /// of the global one. Off by default: the global-target suffix matches
    /// long-standing behavior even though it can mislead under proportional
    /// splits.
    pub suffix_from_plan_target: bool,
}

impl BatchOptions {
    /// Options with the given target and defaults everywhere else.
    pub fn new(target_bytes: u64) -> Self {
        Self {
            target_bytes,
            proportional: false,
            output_dir: None,
            concurrency: default_concurrency(),
            suffix_from_plan_target: false,
        }
    }

    fn validate(&self) -> Result<(), PlanError> {
        if self.target_bytes == 0 {
            return Err(PlanError::InvalidTarget);
        }
        if self.concurrency == 0 {
            return Err(PlanError::InvalidConcurrency);
        }
        Ok(())
    }
}

/// Default worker count: 90% of logical processors, rounded down, minimum 1.
///
/// Leaves headroom for the rest of the host while keeping the pool close to
/// its parallel compression capacity.
pub fn default_concurrency() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    ((cores as f64 * 0.9) as usize).max(1)
}

/// Compute one plan per task from the batch options.
///
/// Flat mode gives every task the global target verbatim. Proportional mode
/// splits the global budget by pixel count with floor rounding, so the plan
/// targets sum to at most the global budget.
pub fn plan(tasks: Vec<ImageTask>, options: &BatchOptions) -> Result<Vec<JobPlan>, PlanError> {
    options.validate()?;
    if tasks.is_empty() {
        return Err(PlanError::NoTasks);
    }

    let plans: Vec<JobPlan> = if options.proportional {
        let total_pixels: u64 = tasks.iter().map(|t| t.pixel_count()).sum();
        if total_pixels == 0 {
            // Nothing to weight by; no division
            return Ok(Vec::new());
        }
        tasks
            .into_iter()
            .map(|task| {
                // u128 keeps budget * pixel_count from overflowing
                let target = (options.target_bytes as u128 * task.pixel_count() as u128
                    / total_pixels as u128) as u64;
                make_plan(task, target, options)
            })
            .collect()
    } else {
        tasks
            .into_iter()
            .map(|task| make_plan(task, options.target_bytes, options))
            .collect()
    };

    if plans.iter().all(|p| p.target_bytes == 0) {
        return Err(PlanError::DegenerateTargets);
    }

    Ok(plans)
}

fn make_plan(task: ImageTask, target_bytes: u64, options: &BatchOptions) -> JobPlan {
    let suffix_target = if options.suffix_from_plan_target {
        target_bytes
    } else {
        options.target_bytes
    };
    let output_path = resolve_output_path(&task.path, options.output_dir.as_deref(), suffix_target);
    JobPlan {
        task,
        target_bytes,
        output_path,
    }
}

/// Resolve where a compressed image will be written.
///
/// With an output directory, the file keeps its name there. Without one, the
/// output sits next to the source as `<stem>_resized_<N>MB.<ext>` where `N`
/// is the target in decimal megabytes.
pub fn resolve_output_path(
    source: &Path,
    output_dir: Option<&Path>,
    suffix_target_bytes: u64,
) -> PathBuf {
    if let Some(dir) = output_dir {
        return dir.join(source.file_name().unwrap_or_default());
    }

    let mut name = OsString::new();
    name.push(source.file_stem().unwrap_or_default());
    name.push(format!(
        "_resized_{}MB",
        format_megabytes(suffix_target_bytes)
    ));
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }
    source.with_file_name(name)
}

/// Format a byte count as decimal megabytes, stripping trailing zeros and a
/// trailing decimal point: 5_000_000 -> "5", 1_500_000 -> "1.5".
pub fn format_megabytes(bytes: u64) -> String {
    let value = format!("{}", bytes as f64 / 1_000_000.0);
    if value.contains('.') {
        value
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, width: u32, height: u32) -> ImageTask {
        ImageTask {
            path: PathBuf::from(format!("/photos/{name}")),
            file_name: name.to_string(),
            width,
            height,
            source_size: 1_000_000,
        }
    }

    fn options(target_bytes: u64) -> BatchOptions {
        BatchOptions {
            concurrency: 2,
            ..BatchOptions::new(target_bytes)
        }
    }

    #[test]
    fn test_flat_planning_uses_global_target_verbatim() {
        let tasks = vec![task("a.jpg", 10, 10), task("b.jpg", 4000, 3000)];
        let plans = plan(tasks, &options(3_000_000)).unwrap();

        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.target_bytes == 3_000_000));
    }

    #[test]
    fn test_proportional_split_by_pixel_count() {
        // 100 and 300 pixels against a 4 MB budget: 1 MB and 3 MB
        let tasks = vec![task("small.jpg", 10, 10), task("large.jpg", 20, 15)];
        let mut opts = options(4_000_000);
        opts.proportional = true;

        let plans = plan(tasks, &opts).unwrap();
        assert_eq!(plans[0].target_bytes, 1_000_000);
        assert_eq!(plans[1].target_bytes, 3_000_000);
    }

    #[test]
    fn test_proportional_floor_rounding_never_exceeds_budget() {
        let tasks = vec![
            task("a.jpg", 3, 1),
            task("b.jpg", 3, 1),
            task("c.jpg", 1, 1),
        ];
        let mut opts = options(1_000_000);
        opts.proportional = true;

        let plans = plan(tasks, &opts).unwrap();
        let sum: u64 = plans.iter().map(|p| p.target_bytes).sum();
        assert!(sum <= 1_000_000);
        // Integer floor of 1_000_000 * 3/7 and * 1/7
        assert_eq!(plans[0].target_bytes, 428_571);
        assert_eq!(plans[2].target_bytes, 142_857);
    }

    #[test]
    fn test_empty_tasks_is_a_plan_error() {
        let err = plan(Vec::new(), &options(1_000_000)).unwrap_err();
        assert!(matches!(err, PlanError::NoTasks));
    }

    #[test]
    fn test_zero_total_pixels_yields_empty_plan() {
        let tasks = vec![task("empty.jpg", 0, 0)];
        let mut opts = options(1_000_000);
        opts.proportional = true;

        assert!(plan(tasks, &opts).unwrap().is_empty());
    }

    #[test]
    fn test_zero_target_rejected() {
        let err = plan(vec![task("a.jpg", 1, 1)], &options(0)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTarget));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut opts = options(1_000_000);
        opts.concurrency = 0;
        let err = plan(vec![task("a.jpg", 1, 1)], &opts).unwrap_err();
        assert!(matches!(err, PlanError::InvalidConcurrency));
    }

    #[test]
    fn test_all_zero_targets_degenerate() {
        // One giant image and one tiny one; the tiny share floors to 0 but
        // the batch as a whole is still plannable
        let tasks = vec![task("giant.jpg", 10_000, 10_000), task("tiny.jpg", 1, 1)];
        let mut opts = options(1_000_000);
        opts.proportional = true;
        let plans = plan(tasks, &opts).unwrap();
        assert_eq!(plans[1].target_bytes, 0);

        // But when every target floors to zero, planning fails
        let tasks = vec![task("a.jpg", 1, 1), task("b.jpg", 1, 1)];
        let mut opts = options(1);
        opts.proportional = true;
        opts.target_bytes = 1;
        let err = plan(tasks, &opts).unwrap_err();
        assert!(matches!(err, PlanError::DegenerateTargets));
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(5_000_000), "5");
        assert_eq!(format_megabytes(1_500_000), "1.5");
        assert_eq!(format_megabytes(10_000_000), "10");
        assert_eq!(format_megabytes(300_000), "0.3");
        assert_eq!(format_megabytes(1_250_000), "1.25");
    }

    #[test]
    fn test_suffix_naming_next_to_source() {
        let path = resolve_output_path(Path::new("/photos/cat.jpg"), None, 5_000_000);
        assert_eq!(path, PathBuf::from("/photos/cat_resized_5MB.jpg"));

        let path = resolve_output_path(Path::new("/photos/cat.jpg"), None, 1_500_000);
        assert_eq!(path, PathBuf::from("/photos/cat_resized_1.5MB.jpg"));
    }

    #[test]
    fn test_suffix_naming_without_extension() {
        let path = resolve_output_path(Path::new("/photos/cat"), None, 5_000_000);
        assert_eq!(path, PathBuf::from("/photos/cat_resized_5MB"));
    }

    #[test]
    fn test_output_dir_keeps_basename() {
        let path = resolve_output_path(
            Path::new("/photos/cat.jpg"),
            Some(Path::new("/out")),
            5_000_000,
        );
        assert_eq!(path, PathBuf::from("/out/cat.jpg"));
    }

    #[test]
    fn test_suffix_uses_global_target_by_default() {
        // Proportional split: the suffix still names the global 4MB budget
        let tasks = vec![task("small.jpg", 10, 10), task("large.jpg", 20, 15)];
        let mut opts = options(4_000_000);
        opts.proportional = true;

        let plans = plan(tasks, &opts).unwrap();
        assert!(plans[0]
            .output_path
            .to_string_lossy()
            .ends_with("small_resized_4MB.jpg"));
    }

    #[test]
    fn test_suffix_from_plan_target_opt_in() {
        let tasks = vec![task("small.jpg", 10, 10), task("large.jpg", 20, 15)];
        let mut opts = options(4_000_000);
        opts.proportional = true;
        opts.suffix_from_plan_target = true;

        let plans = plan(tasks, &opts).unwrap();
        assert!(plans[0]
            .output_path
            .to_string_lossy()
            .ends_with("small_resized_1MB.jpg"));
        assert!(plans[1]
            .output_path
            .to_string_lossy()
            .ends_with("large_resized_3MB.jpg"));
    }

    #[test]
    fn test_default_concurrency_at_least_one() {
        assert!(default_concurrency() >= 1);
    }
}
