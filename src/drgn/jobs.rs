//! Argument builders for the cryoDRGN sub-programs.
//!
//! Each job knows its program name, the release that introduced it, the checks
//! run before launch and the argument list. Optional arguments that are not set
//! are left out entirely.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::particles::ImageLocation;
use crate::star::{labels, StarTable};

use super::version::{DrgnVersion, V2_0_0, V3_4_0};

/// One invocation of a cryoDRGN sub-program
pub trait Job {
    /// Sub-program name (`cryodrgn <program>`)
    fn program(&self) -> &'static str;

    /// Arguments for the given release
    fn args(&self, version: &DrgnVersion) -> Vec<String>;

    /// Problems that prevent launching
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }

    /// Problems worth reporting that do not prevent launching
    fn warnings(&self) -> Vec<String> {
        Vec::new()
    }

    /// First release providing the program
    fn min_version(&self) -> Option<&'static str> {
        None
    }
}

#[derive(Default)]
struct ArgList(Vec<String>);

impl ArgList {
    fn arg(mut self, value: impl Display) -> Self {
        self.0.push(value.to_string());
        self
    }

    fn path(self, path: &Path) -> Self {
        self.arg(path.display())
    }

    fn value(self, flag: &str, value: impl Display) -> Self {
        self.arg(flag).arg(value)
    }

    fn path_value(self, flag: &str, path: &Path) -> Self {
        self.value(flag, path.display())
    }

    fn opt<T: Display>(self, flag: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.value(flag, v),
            None => self,
        }
    }

    fn flag(self, flag: &str, on: bool) -> Self {
        if on {
            self.arg(flag)
        } else {
            self
        }
    }

    fn extra(mut self, params: &str) -> Self {
        self.0.extend(params.split_whitespace().map(str::to_string));
        self
    }

    fn build(self) -> Vec<String> {
        self.0
    }
}

/// `downsample`: rescale and restack particles before training
#[derive(Debug, Clone, PartialEq)]
pub struct Downsample {
    /// Input STAR file
    pub star: PathBuf,
    /// Output stack, `particles.<box>.mrcs`
    pub output: PathBuf,
    /// Directory image paths in the STAR file are relative to
    pub datadir: Option<PathBuf>,
    /// Box of the input particles (px)
    pub input_box: u32,
    /// Requested box (px)
    pub box_size: u32,
    /// Worker threads
    pub threads: u32,
    /// Images per output stack; 0 writes a single stack
    pub chunk: usize,
}

impl Downsample {
    /// Downsample `star` into `output_dir/particles.<box_size>.mrcs`
    pub fn new(star: impl Into<PathBuf>, output_dir: &Path, input_box: u32, box_size: u32) -> Self {
        Self {
            star: star.into(),
            output: output_dir.join(format!("particles.{}.mrcs", box_size)),
            datadir: None,
            input_box,
            box_size,
            threads: 1,
            chunk: 0,
        }
    }

    /// Input box over output box
    pub fn scale_factor(&self) -> f64 {
        self.input_box as f64 / self.box_size as f64
    }

    /// Pixel size of the downsampled images
    pub fn sampling_rate(&self, input_sampling: f64) -> f64 {
        input_sampling * self.scale_factor()
    }

    /// Where each of `total` particles lands, in input order
    ///
    /// Chunked output is split into `particles.<box>.<n>.mrcs` with `n` from 0;
    /// frame indices restart at 1 in every chunk.
    pub fn output_locations(&self, total: usize) -> Vec<ImageLocation> {
        let dir = self.output.parent().unwrap_or(Path::new(""));
        if self.chunk == 0 {
            return (1..=total)
                .map(|i| ImageLocation::new(i as u32, dir.join(format!("particles.{}.mrcs", self.box_size))))
                .collect();
        }

        (0..total)
            .map(|i| {
                let stack = dir.join(format!("particles.{}.{}.mrcs", self.box_size, i / self.chunk));
                ImageLocation::new((i % self.chunk + 1) as u32, stack)
            })
            .collect()
    }
}

impl Job for Downsample {
    fn program(&self) -> &'static str {
        "downsample"
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        let chunk = (self.chunk > 0).then_some(self.chunk);
        ArgList::default()
            .path(&self.star)
            .path_value("-o", &self.output)
            .opt("--datadir", self.datadir.as_ref().map(|d| d.display()))
            .value("-D", self.box_size)
            .value("--max-threads", self.threads)
            .opt("--chunk", chunk)
            .build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.box_size > self.input_box {
            errors.push("You cannot upscale particles!".to_string());
        }
        if self.box_size % 2 != 0 {
            errors.push("Box size must be even!".to_string());
        }
        errors
    }

    fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.box_size % 8 != 0 {
            warnings.push(
                "CryoDRGN mixed-precision (AMP) training will require box size divisible by 8. \
                 Alternatively, you will have to provide --no-amp option."
                    .to_string(),
            );
        }
        warnings
    }
}

/// Which per-particle parameters a STAR parse extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarParse {
    /// `parse_pose_star`
    Poses,
    /// `parse_ctf_star`
    Ctf,
}

/// `parse_pose_star` / `parse_ctf_star`: pickle poses or CTF from a STAR file
#[derive(Debug, Clone, PartialEq)]
pub struct ParseStar {
    /// What to extract
    pub kind: StarParse,
    /// Input STAR file
    pub star: PathBuf,
    /// Output pickle
    pub output: PathBuf,
    /// Box size (px)
    pub box_size: Option<u32>,
    /// Pixel size (Å/px)
    pub apix: Option<f64>,
}

impl Job for ParseStar {
    fn program(&self) -> &'static str {
        match self.kind {
            StarParse::Poses => "parse_pose_star",
            StarParse::Ctf => "parse_ctf_star",
        }
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        ArgList::default()
            .path(&self.star)
            .path_value("-o", &self.output)
            .opt("-D", self.box_size)
            .opt("--Apix", self.apix)
            .build()
    }
}

/// Pixel size of tilt-series particles from detector pixel size and magnification
///
/// Relion 3.0 style tomography tables carry `rlnDetectorPixelSize` (µm) and
/// `rlnMagnification` instead of an image pixel size. Taken from the first row.
pub fn tilt_pixel_size(table: &StarTable) -> Option<f64> {
    let detector = table.value(0, labels::DETECTOR_PIXEL_SIZE)?.as_f64()?;
    let magnification = table.value(0, labels::MAGNIFICATION)?.as_f64()?;
    if magnification <= 0.0 {
        return None;
    }
    Some(detector * 10000.0 / magnification)
}

/// Architecture of the VAE encoder and decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    /// Encoder hidden layers
    pub enc_layers: u32,
    /// Encoder layer width
    pub enc_dim: u32,
    /// Decoder hidden layers
    pub dec_layers: u32,
    /// Decoder layer width
    pub dec_dim: u32,
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            enc_layers: 3,
            enc_dim: 1024,
            dec_layers: 3,
            dec_dim: 1024,
        }
    }
}

/// `train_vae`: heterogeneous reconstruction with known poses
#[derive(Debug, Clone, PartialEq)]
pub struct TrainVae {
    /// Preprocessed particle stack or STAR file
    pub particles: PathBuf,
    /// Pose pickle
    pub poses: PathBuf,
    /// CTF pickle
    pub ctf: PathBuf,
    /// Latent dimension
    pub zdim: u32,
    /// Training output directory
    pub output_dir: PathBuf,
    /// Epochs
    pub epochs: u32,
    /// Worker threads
    pub threads: u32,
    /// Network shape
    pub architecture: Architecture,
    /// Pass `--multigpu`
    pub multi_gpu: bool,
    /// Free-form extra arguments
    pub extra_params: String,
}

impl Job for TrainVae {
    fn program(&self) -> &'static str {
        "train_vae"
    }

    fn args(&self, version: &DrgnVersion) -> Vec<String> {
        let arch = &self.architecture;
        ArgList::default()
            .path(&self.particles)
            .path_value("--poses", &self.poses)
            .path_value("--ctf", &self.ctf)
            .value("--zdim", self.zdim)
            .path_value("-o", &self.output_dir)
            .value("-n", self.epochs)
            .arg("--preprocessed")
            .value("--max-threads", self.threads)
            .value("--enc-layers", arch.enc_layers)
            .value("--enc-dim", arch.enc_dim)
            .value("--dec-layers", arch.dec_layers)
            .value("--dec-dim", arch.dec_dim)
            .flag("--relion31", version.needs_relion31_flag())
            .flag("--multigpu", self.multi_gpu)
            .extra(&self.extra_params)
            .build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.zdim == 0 {
            errors.push("Latent dimension must be positive".to_string());
        }
        if self.epochs == 0 {
            errors.push("Number of epochs must be positive".to_string());
        }
        errors
    }
}

/// Flavour of ab initio reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbInitioKind {
    /// Single consensus volume, `zdim` must be 1
    Homo,
    /// Heterogeneous reconstruction
    Het,
}

/// `abinit_homo` / `abinit_het`: reconstruction without input poses
#[derive(Debug, Clone, PartialEq)]
pub struct AbInitio {
    /// Homogeneous or heterogeneous
    pub kind: AbInitioKind,
    /// Preprocessed particle stack or STAR file
    pub particles: PathBuf,
    /// CTF pickle
    pub ctf: PathBuf,
    /// Training output directory
    pub output_dir: PathBuf,
    /// Epochs
    pub epochs: u32,
    /// Translation search extent (px)
    pub t_extent: u32,
    /// Pose search frequency (epochs)
    pub ps_freq: u32,
    /// Latent dimension
    pub zdim: u32,
    /// Worker threads
    pub threads: u32,
    /// Pass `--multigpu`
    pub multi_gpu: bool,
    /// Free-form extra arguments
    pub extra_params: String,
}

impl Job for AbInitio {
    fn program(&self) -> &'static str {
        match self.kind {
            AbInitioKind::Homo => "abinit_homo",
            AbInitioKind::Het => "abinit_het",
        }
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        let args = ArgList::default()
            .path(&self.particles)
            .path_value("--ctf", &self.ctf)
            .path_value("-o", &self.output_dir)
            .value("-n", self.epochs)
            .value("--t-extent", self.t_extent)
            .value("--ps-freq", self.ps_freq);

        let args = match self.kind {
            AbInitioKind::Homo => args,
            AbInitioKind::Het => args
                .value("--zdim", self.zdim)
                .arg("--preprocessed")
                .value("--max-threads", self.threads)
                .flag("--multigpu", self.multi_gpu),
        };
        args.extra(&self.extra_params).build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.kind == AbInitioKind::Homo && self.zdim > 1 {
            errors.push("Latent variable must be 1 for homogeneous reconstruction".to_string());
        }
        errors
    }

    fn min_version(&self) -> Option<&'static str> {
        Some(V2_0_0)
    }
}

/// `analyze`: volumes and latent-space plots for one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct Analyze {
    /// Training output directory
    pub train_dir: PathBuf,
    /// Epoch to analyze, 0-based as cryoDRGN counts
    pub epoch: u32,
    /// Analysis output directory
    pub output_dir: PathBuf,
    /// Pixel size (Å/px)
    pub apix: f64,
    /// GPU used for volume generation
    pub device: String,
    /// Downsampled volume box (px)
    pub downsample: Option<u32>,
    /// Box of the training particles (px)
    pub input_box: u32,
    /// Flip volume handedness
    pub flip: bool,
    /// Invert volume contrast
    pub invert: bool,
    /// Latent dimension of the trained model
    pub zdim: u32,
    /// K-means samples
    pub ksample: u32,
    /// Principal components to plot
    pub pc: u32,
    /// Last completed epoch, when known
    pub last_epoch: Option<u32>,
}

impl Job for Analyze {
    fn program(&self) -> &'static str {
        "analyze"
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        let multi = self.zdim > 1;
        ArgList::default()
            .path(&self.train_dir)
            .arg(self.epoch)
            .path_value("-o", &self.output_dir)
            .value("--Apix", self.apix)
            .value("--device", &self.device)
            .opt("-d", self.downsample)
            .flag("--flip", self.flip)
            .flag("--invert", self.invert)
            .opt("--ksample", multi.then_some(self.ksample))
            .opt("--pc", multi.then_some(self.pc))
            .build()
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(last) = self.last_epoch {
            if self.epoch > last {
                errors.push(format!("You can analyse only epochs 1-{}", last + 1));
            }
        }
        if self.downsample.is_some_and(|d| d > self.input_box) {
            errors.push("You cannot upscale volumes!".to_string());
        }
        errors
    }

    fn warnings(&self) -> Vec<String> {
        if self.zdim > 1 {
            return Vec::new();
        }
        vec!["Model has zdim=1; principal components and k-means samples are ignored".to_string()]
    }
}

/// `graph_traversal`: latent path between anchor particles
#[derive(Debug, Clone, PartialEq)]
pub struct GraphTraversal {
    /// Latent embeddings (`z.<epoch>.pkl`)
    pub z_file: PathBuf,
    /// Particle indices to connect
    pub anchors: Vec<usize>,
    /// Path indices output
    pub output: PathBuf,
    /// Path latent values output
    pub output_z: PathBuf,
}

impl Job for GraphTraversal {
    fn program(&self) -> &'static str {
        "graph_traversal"
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        let mut args = ArgList::default().path(&self.z_file).arg("--anchors");
        for anchor in &self.anchors {
            args = args.arg(anchor);
        }
        args.path_value("-o", &self.output)
            .path_value("--out-z", &self.output_z)
            .build()
    }

    fn validate(&self) -> Vec<String> {
        if self.anchors.len() < 2 {
            return vec!["Graph traversal needs at least two anchors".to_string()];
        }
        Vec::new()
    }
}

/// `eval_vol`: generate volumes at given latent values
#[derive(Debug, Clone, PartialEq)]
pub struct EvalVol {
    /// Model weights (`weights.<epoch>.pkl`)
    pub weights: PathBuf,
    /// Model config
    pub config: PathBuf,
    /// Latent values, one per line
    pub z_file: PathBuf,
    /// Volume output directory
    pub output_dir: PathBuf,
}

impl Job for EvalVol {
    fn program(&self) -> &'static str {
        "eval_vol"
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        ArgList::default()
            .path(&self.weights)
            .path_value("-c", &self.config)
            .path_value("--zfile", &self.z_file)
            .path_value("-o", &self.output_dir)
            .build()
    }
}

/// Masking used by the landscape analysis
#[derive(Debug, Clone, PartialEq)]
pub enum LandscapeMask {
    /// Mask generated from the volumes
    Auto {
        /// Dilation (Å)
        dilate: u32,
        /// Density threshold; values below 0.001 let cryoDRGN choose
        threshold: f64,
    },
    /// User mask file
    File(PathBuf),
}

/// `analyze_landscape`: volume clustering across the latent space
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeLandscape {
    /// Training output directory
    pub train_dir: PathBuf,
    /// Epoch to analyze, 0-based
    pub epoch: u32,
    /// Output directory (`landscape.<epoch>`)
    pub output_dir: PathBuf,
    /// Pixel size (Å/px)
    pub apix: f64,
    /// GPU used for volume generation
    pub device: String,
    /// Volumes to sample
    pub num_vols: u32,
    /// Clustering linkage (`average`, `ward`, ...)
    pub linkage: String,
    /// Clusters
    pub clusters: u32,
    /// Downsampled volume box (px)
    pub downsample: Option<u32>,
    /// Flip volume handedness
    pub flip: bool,
    /// Masking
    pub mask: LandscapeMask,
}

/// Auto-mask thresholds below this are treated as unset
pub const MIN_MASK_THRESHOLD: f64 = 0.001;

impl Job for AnalyzeLandscape {
    fn program(&self) -> &'static str {
        "analyze_landscape"
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        let args = ArgList::default()
            .path(&self.train_dir)
            .arg(self.epoch)
            .path_value("-o", &self.output_dir)
            .value("--Apix", self.apix)
            .value("--device", &self.device)
            .arg("--skip-umap")
            .value("-N", self.num_vols)
            .value("--linkage", &self.linkage)
            .value("-M", self.clusters)
            .opt("-d", self.downsample)
            .flag("--flip", self.flip);

        match &self.mask {
            LandscapeMask::Auto { dilate, threshold } => args
                .value("--dilate", dilate)
                .opt("--thresh", (*threshold >= MIN_MASK_THRESHOLD).then_some(threshold))
                .build(),
            LandscapeMask::File(path) => args.path_value("--mask", path).build(),
        }
    }
}

/// `backproject_voxel --tilt`: subtomogram average from tilt-series particles
#[derive(Debug, Clone, PartialEq)]
pub struct BackprojectVoxel {
    /// Input STAR file
    pub particles: PathBuf,
    /// Pose pickle
    pub poses: PathBuf,
    /// CTF pickle
    pub ctf: PathBuf,
    /// Tilts per particle
    pub ntilts: u32,
    /// Electron dose per tilt (e-/Å²)
    pub dose_per_tilt: f64,
    /// Output directory
    pub output_dir: PathBuf,
    /// Directory image paths are relative to
    pub datadir: PathBuf,
}

impl Job for BackprojectVoxel {
    fn program(&self) -> &'static str {
        "backproject_voxel"
    }

    fn args(&self, _version: &DrgnVersion) -> Vec<String> {
        ArgList::default()
            .path(&self.particles)
            .path_value("--poses", &self.poses)
            .path_value("--ctf", &self.ctf)
            .arg("--tilt")
            .value("--ntilts", self.ntilts)
            .value("--dose-per-tilt", self.dose_per_tilt)
            .path_value("-o", &self.output_dir)
            .path_value("--datadir", &self.datadir)
            .build()
    }

    fn min_version(&self) -> Option<&'static str> {
        Some(V3_4_0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::star::StarDocument;

    fn release(v: &str) -> DrgnVersion {
        DrgnVersion::parse(v).unwrap()
    }

    fn train_vae() -> TrainVae {
        TrainVae {
            particles: "out/particles.128.mrcs".into(),
            poses: "out/poses.pkl".into(),
            ctf: "out/ctfs.pkl".into(),
            zdim: 8,
            output_dir: "out/train".into(),
            epochs: 25,
            threads: 4,
            architecture: Architecture::default(),
            multi_gpu: false,
            extra_params: String::new(),
        }
    }

    #[test]
    fn test_downsample_args() {
        let mut job = Downsample::new("in/particles.star", Path::new("out"), 256, 128);
        job.datadir = Some("in".into());
        job.threads = 8;
        assert_eq!(
            job.args(&release("3.4.0")),
            vec![
                "in/particles.star", "-o", "out/particles.128.mrcs", "--datadir", "in", "-D", "128",
                "--max-threads", "8",
            ]
        );

        job.chunk = 1000;
        let args = job.args(&release("3.4.0"));
        assert_eq!(&args[args.len() - 2..], ["--chunk", "1000"]);
        assert!(job.validate().is_empty());
        assert!(job.warnings().is_empty());
    }

    #[test]
    fn test_downsample_validation() {
        let job = Downsample::new("p.star", Path::new("out"), 128, 256);
        assert_eq!(job.validate(), vec!["You cannot upscale particles!"]);

        let job = Downsample::new("p.star", Path::new("out"), 128, 99);
        assert_eq!(job.validate(), vec!["Box size must be even!"]);

        let job = Downsample::new("p.star", Path::new("out"), 128, 100);
        assert!(job.validate().is_empty());
        assert_eq!(job.warnings().len(), 1);
    }

    #[test]
    fn test_downsample_output_locations() {
        let mut job = Downsample::new("p.star", Path::new("out"), 256, 64);
        assert!((job.sampling_rate(1.1) - 4.4).abs() < 1e-12);

        let single = job.output_locations(3);
        assert_eq!(single[2], ImageLocation::new(3, "out/particles.64.mrcs"));

        job.chunk = 2;
        let chunked = job.output_locations(5);
        assert_eq!(chunked[0], ImageLocation::new(1, "out/particles.64.0.mrcs"));
        assert_eq!(chunked[1], ImageLocation::new(2, "out/particles.64.0.mrcs"));
        assert_eq!(chunked[2], ImageLocation::new(1, "out/particles.64.1.mrcs"));
        assert_eq!(chunked[4], ImageLocation::new(1, "out/particles.64.2.mrcs"));
    }

    #[test]
    fn test_parse_star_programs() {
        let mut job = ParseStar {
            kind: StarParse::Poses,
            star: "p.star".into(),
            output: "poses.pkl".into(),
            box_size: Some(128),
            apix: None,
        };
        assert_eq!(job.program(), "parse_pose_star");
        assert_eq!(job.args(&release("3.4.0")), vec!["p.star", "-o", "poses.pkl", "-D", "128"]);

        job.kind = StarParse::Ctf;
        job.apix = Some(1.5);
        assert_eq!(job.program(), "parse_ctf_star");
        assert_eq!(
            job.args(&release("3.4.0")),
            vec!["p.star", "-o", "poses.pkl", "-D", "128", "--Apix", "1.5"]
        );
    }

    #[test]
    fn test_tilt_pixel_size() {
        let doc = StarDocument::parse(
            "data_\nloop_\n_rlnDetectorPixelSize #1\n_rlnMagnification #2\n5.0 50000\n",
        )
        .unwrap();
        let table = doc.table("").unwrap();
        assert!((tilt_pixel_size(table).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_train_vae_relion31_flag_by_release() {
        let job = train_vae();
        assert!(job.args(&release("0.3.5")).contains(&"--relion31".to_string()));
        assert!(!job.args(&release("1.1.0")).contains(&"--relion31".to_string()));
    }

    #[test]
    fn test_train_vae_multigpu_and_extra_params() {
        let mut job = train_vae();
        job.multi_gpu = true;
        job.extra_params = "  --lr 0.0001   --beta 2 ".into();
        let args = job.args(&release("3.4.0"));
        assert_eq!(&args[..2], ["out/particles.128.mrcs", "--poses"]);
        assert_eq!(&args[args.len() - 5..], ["--multigpu", "--lr", "0.0001", "--beta", "2"]);
        assert!(args.iter().all(|a| !a.is_empty()));
    }

    #[test]
    fn test_abinit() {
        let mut job = AbInitio {
            kind: AbInitioKind::Homo,
            particles: "p.mrcs".into(),
            ctf: "ctf.pkl".into(),
            output_dir: "train".into(),
            epochs: 30,
            t_extent: 10,
            ps_freq: 5,
            zdim: 1,
            threads: 2,
            multi_gpu: true,
            extra_params: String::new(),
        };
        assert_eq!(job.program(), "abinit_homo");
        assert_eq!(job.min_version(), Some("2.0.0"));
        let homo = job.args(&release("3.4.0"));
        assert!(!homo.contains(&"--zdim".to_string()));
        assert!(!homo.contains(&"--multigpu".to_string()));
        assert!(job.validate().is_empty());

        job.zdim = 8;
        assert_eq!(job.validate().len(), 1);

        job.kind = AbInitioKind::Het;
        assert!(job.validate().is_empty());
        let het = job.args(&release("3.4.0"));
        assert_eq!(job.program(), "abinit_het");
        assert!(het.windows(2).any(|w| w == ["--zdim", "8"]));
        assert!(het.contains(&"--multigpu".to_string()));
    }

    #[test]
    fn test_analyze_args() {
        let mut job = Analyze {
            train_dir: "train".into(),
            epoch: 19,
            output_dir: "train/analyze.19".into(),
            apix: 2.5,
            device: "0".into(),
            downsample: Some(64),
            input_box: 128,
            flip: true,
            invert: false,
            zdim: 8,
            ksample: 20,
            pc: 2,
            last_epoch: Some(24),
        };
        assert_eq!(
            job.args(&release("3.4.0")),
            vec![
                "train", "19", "-o", "train/analyze.19", "--Apix", "2.5", "--device", "0", "-d", "64",
                "--flip", "--ksample", "20", "--pc", "2",
            ]
        );
        assert!(job.validate().is_empty());
        assert!(job.warnings().is_empty());

        job.zdim = 1;
        assert!(!job.args(&release("3.4.0")).contains(&"--ksample".to_string()));
        assert_eq!(job.warnings().len(), 1);
    }

    #[test]
    fn test_analyze_validation() {
        let job = Analyze {
            train_dir: "train".into(),
            epoch: 30,
            output_dir: "a".into(),
            apix: 1.0,
            device: "0".into(),
            downsample: Some(256),
            input_box: 128,
            flip: false,
            invert: false,
            zdim: 8,
            ksample: 20,
            pc: 2,
            last_epoch: Some(24),
        };
        assert_eq!(
            job.validate(),
            vec!["You can analyse only epochs 1-25", "You cannot upscale volumes!"]
        );
    }

    #[test]
    fn test_graph_traversal_and_eval_vol() {
        let job = GraphTraversal {
            z_file: "train/z.24.pkl".into(),
            anchors: vec![5, 17, 200],
            output: "gt/path.txt".into(),
            output_z: "gt/z.path.txt".into(),
        };
        assert_eq!(
            job.args(&release("3.4.0")),
            vec![
                "train/z.24.pkl", "--anchors", "5", "17", "200", "-o", "gt/path.txt", "--out-z",
                "gt/z.path.txt",
            ]
        );
        assert!(job.validate().is_empty());

        let eval = EvalVol {
            weights: "train/weights.24.pkl".into(),
            config: "train/config.yaml".into(),
            z_file: "gt/z.path.txt".into(),
            output_dir: "gt".into(),
        };
        assert_eq!(
            eval.args(&release("3.4.0")),
            vec![
                "train/weights.24.pkl", "-c", "train/config.yaml", "--zfile", "gt/z.path.txt", "-o", "gt",
            ]
        );
    }

    #[test]
    fn test_analyze_landscape_mask() {
        let mut job = AnalyzeLandscape {
            train_dir: "train".into(),
            epoch: 24,
            output_dir: "train/landscape.24".into(),
            apix: 1.0,
            device: "0".into(),
            num_vols: 500,
            linkage: "average".into(),
            clusters: 10,
            downsample: None,
            flip: false,
            mask: LandscapeMask::Auto {
                dilate: 5,
                threshold: 0.0,
            },
        };
        let args = job.args(&release("3.4.0"));
        assert!(args.contains(&"--skip-umap".to_string()));
        assert_eq!(&args[args.len() - 2..], ["--dilate", "5"]);

        job.mask = LandscapeMask::Auto {
            dilate: 3,
            threshold: 0.5,
        };
        let args = job.args(&release("3.4.0"));
        assert_eq!(&args[args.len() - 4..], ["--dilate", "3", "--thresh", "0.5"]);

        job.mask = LandscapeMask::File("mask.mrc".into());
        let args = job.args(&release("3.4.0"));
        assert_eq!(&args[args.len() - 2..], ["--mask", "mask.mrc"]);
    }

    #[test]
    fn test_backproject_voxel() {
        let job = BackprojectVoxel {
            particles: "tilts.star".into(),
            poses: "poses.pkl".into(),
            ctf: "ctf.pkl".into(),
            ntilts: 41,
            dose_per_tilt: 3.0,
            output_dir: "bp".into(),
            datadir: "in".into(),
        };
        assert_eq!(job.min_version(), Some("3.4.0"));
        let args = job.args(&release("3.4.0"));
        assert!(args.contains(&"--tilt".to_string()));
        assert!(args.windows(2).any(|w| w == ["--ntilts", "41"]));
        assert!(args.windows(2).any(|w| w == ["--dose-per-tilt", "3"]));
    }
}
