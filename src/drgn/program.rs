use std::path::PathBuf;
use std::process::Command;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::DrgnError;
use super::jobs::Job;
use super::version::{DrgnVersion, DEFAULT_VERSION, ENV_PREFIX};

/// Builds and runs `cryodrgn <program>` inside its conda environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Launcher {
    /// Command making `conda` available in a fresh shell
    pub conda_activation: String,
    /// Command activating the cryoDRGN environment
    pub env_activation: String,
    /// Installation prefix stripped from `env_activation`
    pub scipion_home: Option<PathBuf>,
    /// GPU device indices exported as `CUDA_VISIBLE_DEVICES`
    pub gpus: Vec<u32>,
}

impl Default for Launcher {
    fn default() -> Self {
        Self {
            conda_activation: "eval \"$(conda shell.bash hook)\"".to_string(),
            env_activation: format!("conda activate {}{}", ENV_PREFIX, DEFAULT_VERSION),
            scipion_home: None,
            gpus: vec![0],
        }
    }
}

impl Launcher {
    /// Launcher pinned to the given GPUs
    pub fn with_gpus(mut self, gpus: Vec<u32>) -> Self {
        self.gpus = gpus;
        self
    }

    /// Environment activation with the installation prefix removed
    pub fn env_activation(&self) -> String {
        match &self.scipion_home {
            Some(home) => {
                let prefix = format!("{}{}", home.display(), std::path::MAIN_SEPARATOR);
                self.env_activation.replacen(&prefix, "", 1)
            }
            None => self.env_activation.clone(),
        }
    }

    /// Release named by the environment activation
    pub fn active_version(&self) -> Result<DrgnVersion, DrgnError> {
        DrgnVersion::from_activation(&self.env_activation())
    }

    /// `0,1,...` as exported in `CUDA_VISIBLE_DEVICES`
    pub fn gpu_list(&self) -> String {
        self.gpus
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether the job will see more than one GPU
    pub fn is_multi_gpu(&self) -> bool {
        self.gpus.len() > 1
    }

    /// `<conda> <env> && CUDA_VISIBLE_DEVICES=<gpus> cryodrgn <program>`
    pub fn program_line(&self, program: &str) -> String {
        let activation = [self.conda_activation.trim().to_string(), self.env_activation()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "{} && CUDA_VISIBLE_DEVICES={} cryodrgn {}",
            activation,
            self.gpu_list(),
            program
        )
    }

    /// Full shell line with quoted arguments
    pub fn shell_line(&self, program: &str, args: &[String]) -> String {
        let mut line = self.program_line(program);
        for arg in args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line
    }

    /// Process running the shell line under `bash -c`, without `PYTHONPATH`
    pub fn command(&self, program: &str, args: &[String]) -> Command {
        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(self.shell_line(program, args))
            .env_remove("PYTHONPATH")
            .env("CUDA_VISIBLE_DEVICES", self.gpu_list());
        cmd
    }

    /// Run a program to completion
    pub fn run(&self, program: &str, args: &[String]) -> Result<(), DrgnError> {
        info!("{}", self.shell_line(program, args));
        let status = self.command(program, args).status()?;
        if !status.success() {
            return Err(DrgnError::ProgramFailed {
                program: program.to_string(),
                status,
            });
        }
        Ok(())
    }

    /// Check a job against the active release, then run it
    pub fn run_job(&self, job: &dyn Job) -> Result<(), DrgnError> {
        let version = self.active_version()?;
        let args = prepare(job, &version)?;
        self.run(job.program(), &args)
    }
}

/// Validate a job for a release and return its arguments
///
/// Warnings are logged; errors and version gates fail the job before launch.
pub fn prepare(job: &dyn Job, version: &DrgnVersion) -> Result<Vec<String>, DrgnError> {
    if let Some(required) = job.min_version() {
        if !version.is_at_least(required) {
            return Err(DrgnError::UnsupportedVersion {
                program: job.program().to_string(),
                required: required.to_string(),
                active: version.to_string(),
            });
        }
    }

    let errors = job.validate();
    if !errors.is_empty() {
        return Err(DrgnError::Validation {
            program: job.program().to_string(),
            errors,
        });
    }
    for warning in job.warnings() {
        warn!("{}: {}", job.program(), warning);
    }

    Ok(job.args(version))
}

/// Single-quote an argument unless it is shell-safe as is
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_line() {
        let launcher = Launcher {
            conda_activation: ". /opt/conda/etc/profile.d/conda.sh;".into(),
            env_activation: "conda activate cryodrgn-3.4.0".into(),
            scipion_home: None,
            gpus: vec![0, 2],
        };
        assert_eq!(
            launcher.program_line("train_vae"),
            ". /opt/conda/etc/profile.d/conda.sh; conda activate cryodrgn-3.4.0 && CUDA_VISIBLE_DEVICES=0,2 cryodrgn train_vae"
        );
        assert!(launcher.is_multi_gpu());
    }

    #[test]
    fn test_scipion_home_stripped_once() {
        let launcher = Launcher {
            env_activation: "conda activate /opt/scipion/envs/cryodrgn-2.3.0".into(),
            scipion_home: Some("/opt/scipion".into()),
            ..Default::default()
        };
        assert_eq!(launcher.env_activation(), "conda activate envs/cryodrgn-2.3.0");
        assert_eq!(launcher.active_version().unwrap().as_str(), "2.3.0");
    }

    #[test]
    fn test_shell_line_quotes_arguments() {
        let launcher = Launcher {
            conda_activation: String::new(),
            ..Default::default()
        };
        let line = launcher.shell_line(
            "downsample",
            &["my particles.star".to_string(), "-D".to_string(), "128".to_string()],
        );
        assert_eq!(
            line,
            "conda activate cryodrgn-3.4.0 && CUDA_VISIBLE_DEVICES=0 cryodrgn downsample 'my particles.star' -D 128"
        );
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_prepare_gates_on_version() {
        let job = crate::drgn::BackprojectVoxel {
            particles: "tilts.star".into(),
            poses: "poses.pkl".into(),
            ctf: "ctf.pkl".into(),
            ntilts: 10,
            dose_per_tilt: 2.5,
            output_dir: "bp".into(),
            datadir: "in".into(),
        };
        let old = DrgnVersion::parse("3.3.3").unwrap();
        let err = prepare(&job, &old).unwrap_err();
        assert!(matches!(err, DrgnError::UnsupportedVersion { .. }));
        assert_eq!(
            err.to_string(),
            "backproject_voxel requires cryoDRGN 3.4.0 or later (active: 3.3.3)"
        );

        let args = prepare(&job, &DrgnVersion::default_release()).unwrap();
        assert_eq!(args[0], "tilts.star");
    }

    #[test]
    fn test_prepare_reports_validation_errors() {
        let job = crate::drgn::Downsample::new("p.star", std::path::Path::new("out"), 64, 127);
        let err = prepare(&job, &DrgnVersion::default_release()).unwrap_err();
        match err {
            DrgnError::Validation { program, errors } => {
                assert_eq!(program, "downsample");
                assert_eq!(errors, vec!["You cannot upscale particles!", "Box size must be even!"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_command_environment() {
        let cmd = Launcher::default().with_gpus(vec![1]).command("analyze", &[]);
        let envs: Vec<_> = cmd.get_envs().collect();
        assert!(envs.contains(&(std::ffi::OsStr::new("PYTHONPATH"), None)));
        assert!(envs.contains(&(
            std::ffi::OsStr::new("CUDA_VISIBLE_DEVICES"),
            Some(std::ffi::OsStr::new("1"))
        )));
        assert_eq!(cmd.get_program(), "bash");
    }
}
