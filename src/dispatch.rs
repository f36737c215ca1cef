//! Fan-out of one configuration across many targets.

use crate::config::FingerprintConfig;
use crate::digest::DigestResult;
use crate::task::{FingerprintTarget, FingerprintTask, TaskError, TaskInputs};
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown task: {0} (expected calculate or calculate<ALGORITHM>)")]
    UnknownTask(String),
}

/// A parsed task name.
///
/// `calculate` uses the configured algorithm. `calculate<ALGORITHM>`, for
/// example `calculateMD5`, overrides it for this invocation only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRequest {
    algorithm_override: Option<String>,
}

impl TaskRequest {
    pub const BASE_NAME: &'static str = "calculate";

    pub fn parse(name: &str) -> Result<Self, DispatchError> {
        let suffix = name
            .strip_prefix(Self::BASE_NAME)
            .ok_or_else(|| DispatchError::UnknownTask(name.to_string()))?;

        Ok(TaskRequest {
            algorithm_override: (!suffix.is_empty()).then(|| suffix.to_string()),
        })
    }

    pub fn with_algorithm(algorithm: impl Into<String>) -> Self {
        TaskRequest {
            algorithm_override: Some(algorithm.into()),
        }
    }

    pub fn algorithm_override(&self) -> Option<&str> {
        self.algorithm_override.as_deref()
    }

    fn task<'a>(
        &'a self,
        target: &'a FingerprintTarget,
        config: &'a FingerprintConfig,
    ) -> FingerprintTask<'a> {
        let task = FingerprintTask::new(target, config);
        match &self.algorithm_override {
            Some(algorithm) => task.with_algorithm(algorithm),
            None => task,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    #[default]
    Parallel,
    Sequential,
}

#[derive(Debug)]
pub struct TargetOutcome<T> {
    pub target: String,
    pub output_path: PathBuf,
    pub result: Result<T, TaskError>,
}

/// Executes every target, returning one outcome per target in target order.
///
/// A failing target does not stop the others. In parallel mode targets run
/// on the rayon thread pool; the files within a target are always digested
/// in selection order.
pub fn dispatch(
    config: &FingerprintConfig,
    targets: &[FingerprintTarget],
    request: &TaskRequest,
    mode: DispatchMode,
) -> Vec<TargetOutcome<DigestResult>> {
    run_all(targets, mode, |target| {
        request.task(target, config).execute()
    })
}

/// Collects the declared inputs of every target without executing any.
pub fn declare(
    config: &FingerprintConfig,
    targets: &[FingerprintTarget],
    request: &TaskRequest,
    mode: DispatchMode,
) -> Vec<TargetOutcome<TaskInputs>> {
    run_all(targets, mode, |target| {
        request.task(target, config).declared_inputs()
    })
}

fn run_all<T, F>(
    targets: &[FingerprintTarget],
    mode: DispatchMode,
    run: F,
) -> Vec<TargetOutcome<T>>
where
    T: Send,
    F: Fn(&FingerprintTarget) -> Result<T, TaskError> + Sync,
{
    let run_one = |target: &FingerprintTarget| {
        debug!("Running target {}", target.name);
        let result = run(target);
        if let Err(e) = &result {
            error!("Target {} failed ({}): {}", target.name, e.kind(), e);
        }
        TargetOutcome {
            target: target.name.clone(),
            output_path: target.output_path.clone(),
            result,
        }
    };

    match mode {
        DispatchMode::Parallel => targets.par_iter().map(run_one).collect(),
        DispatchMode::Sequential => targets.iter().map(run_one).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn target(root: &Path, name: &str) -> FingerprintTarget {
        FingerprintTarget {
            name: name.to_string(),
            input_roots: vec![root.join(name).join("src")],
            output_path: root.join(name).join("build/hash_sum.txt"),
        }
    }

    #[test]
    fn test_parse_task_names() {
        assert_eq!(TaskRequest::parse("calculate").unwrap(), TaskRequest::default());
        assert_eq!(
            TaskRequest::parse("calculateMD5").unwrap().algorithm_override(),
            Some("MD5")
        );
        assert_eq!(
            TaskRequest::parse("calculateSha256").unwrap().algorithm_override(),
            Some("Sha256")
        );
        assert_eq!(
            TaskRequest::parse("compute"),
            Err(DispatchError::UnknownTask("compute".to_string()))
        );
    }

    #[test]
    fn test_dispatch_independent_targets() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("good/src")).unwrap();
        fs::write(root.join("good/src/a.kt"), "test").unwrap();
        fs::create_dir_all(root.join("bad")).unwrap();
        fs::write(root.join("bad/build"), "blocks the output directory").unwrap();

        let targets = vec![target(root, "bad"), target(root, "good")];
        let config = FingerprintConfig {
            file_extensions: vec!["kt".to_string()],
            ..FingerprintConfig::default()
        };

        for mode in [DispatchMode::Parallel, DispatchMode::Sequential] {
            let outcomes = dispatch(&config, &targets, &TaskRequest::default(), mode);

            assert_eq!(outcomes.len(), 2);
            assert_eq!(outcomes[0].target, "bad");
            assert!(matches!(
                outcomes[0].result,
                Err(TaskError::OutputWriteFailure { .. })
            ));
            assert_eq!(outcomes[1].target, "good");
            assert_eq!(
                outcomes[1].result.as_ref().unwrap().hex_digest,
                "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3"
            );
            assert_eq!(
                fs::read_to_string(root.join("good/build/hash_sum.txt")).unwrap(),
                "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3"
            );
        }
    }

    #[test]
    fn test_dispatch_override_does_not_touch_config() {
        let temp = TempDir::new().unwrap();
        let targets = vec![target(temp.path(), "one"), target(temp.path(), "two")];
        let config = FingerprintConfig::default();

        let outcomes = dispatch(
            &config,
            &targets,
            &TaskRequest::parse("calculateMD5").unwrap(),
            DispatchMode::Parallel,
        );

        for outcome in &outcomes {
            assert_eq!(outcome.result.as_ref().unwrap().algorithm, Algorithm::Md5);
        }
        assert_eq!(config.algorithm, "SHA-1");

        let outcomes = dispatch(&config, &targets, &TaskRequest::default(), DispatchMode::Parallel);
        for outcome in &outcomes {
            assert_eq!(outcome.result.as_ref().unwrap().algorithm, Algorithm::Sha1);
        }
    }

    #[test]
    fn test_dispatch_unsupported_override_fails_every_target() {
        let temp = TempDir::new().unwrap();
        let targets = vec![target(temp.path(), "one"), target(temp.path(), "two")];

        let outcomes = dispatch(
            &FingerprintConfig::default(),
            &targets,
            &TaskRequest::with_algorithm("Whirlpool"),
            DispatchMode::Sequential,
        );

        for outcome in &outcomes {
            assert_eq!(
                outcome.result.as_ref().unwrap_err().kind(),
                "UnsupportedAlgorithm"
            );
            assert!(!outcome.output_path.exists());
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let names: Vec<String> = (0..8).map(|i| format!("p{i}")).collect();
        for (i, name) in names.iter().enumerate() {
            fs::create_dir_all(root.join(name).join("src/nested")).unwrap();
            for j in 0..=i {
                fs::write(root.join(name).join(format!("src/f{j}.kt")), format!("{i}:{j}")).unwrap();
                fs::write(root.join(name).join(format!("src/nested/g{j}.kt")), "g").unwrap();
            }
        }
        let targets: Vec<_> = names.iter().map(|n| target(root, n)).collect();
        let config = FingerprintConfig::default();

        let digests = |mode| {
            dispatch(&config, &targets, &TaskRequest::default(), mode)
                .into_iter()
                .map(|o| o.result.unwrap().hex_digest)
                .collect::<Vec<_>>()
        };

        assert_eq!(digests(DispatchMode::Parallel), digests(DispatchMode::Sequential));
    }

    #[test]
    fn test_declare_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let targets = vec![target(temp.path(), "one")];

        let outcomes = declare(
            &FingerprintConfig::default(),
            &targets,
            &TaskRequest::default(),
            DispatchMode::Sequential,
        );

        let inputs = outcomes[0].result.as_ref().unwrap();
        assert_eq!(inputs.algorithm, Algorithm::Sha1);
        assert!(inputs.files.is_empty());
        assert!(!targets[0].output_path.exists());
    }
}
