use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::materialize::{materialize, relative_path, FileMapping, FormatConverter, StackConverter};
use crate::particles::{to_star_name, AlignType, Particle, ParticleSet};
use crate::star::{labels, StarValue, StarWriter, STAR_FORMAT_VERSION};

use super::align::{align_2d, align_projection};
use super::config::WriterConfig;
use super::error::WriterError;
use super::optics::OpticsTable;
use super::row::StarRow;
use super::stats::WriteSummary;

/// Caller hook that can add or override cells of a particle row
pub type RowHook<'a> = Box<dyn FnMut(&Particle, &mut StarRow) + 'a>;

/// Labels copied from particles in addition to the configured ones
const ALWAYS_EXTRA_LABELS: [&str; 2] = [labels::PARTICLE_SELECT_ZSCORE, labels::MOVIE_FRAME_NUMBER];

/// Writes a particle set as `particles` and `optics` STAR tables
///
/// A writer is consumed by [`ParticleSetWriter::write`]; all per-write state
/// (optics groups, file mapping, stack counter) lives in that single call.
pub struct ParticleSetWriter<'a> {
    config: WriterConfig,
    converter: Box<dyn StackConverter + 'a>,
    preprocess_row: Option<RowHook<'a>>,
    postprocess_row: Option<RowHook<'a>>,
}

impl<'a> ParticleSetWriter<'a> {
    /// Writer converting binaries with [`FormatConverter`]
    pub fn new(config: WriterConfig) -> Self {
        Self {
            config,
            converter: Box::new(FormatConverter),
            preprocess_row: None,
            postprocess_row: None,
        }
    }

    /// Use another converter for stack conversion and consolidation
    pub fn with_converter(mut self, converter: impl StackConverter + 'a) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Hook run after the generic fields are set, before extra labels and the optics group
    pub fn preprocess_row(mut self, hook: impl FnMut(&Particle, &mut StarRow) + 'a) -> Self {
        self.preprocess_row = Some(Box::new(hook));
        self
    }

    /// Hook run once a row is complete
    pub fn postprocess_row(mut self, hook: impl FnMut(&Particle, &mut StarRow) + 'a) -> Self {
        self.postprocess_row = Some(Box::new(hook));
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write `set` to `star_path`, materializing binaries first when configured
    pub fn write<P: AsRef<Path>>(self, set: &ParticleSet, star_path: P) -> Result<WriteSummary, WriterError> {
        let star_path = star_path.as_ref();
        let first = set.first().ok_or(WriterError::EmptyParticleSet)?;

        let align = self.config.align_type.unwrap_or(set.alignment);
        if align == AlignType::ThreeD {
            return Err(WriterError::Unsupported3dAlignment);
        }

        let star_dir = star_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let target_extension = self.config.target_extension();
        if self.config.output_dir.is_some() && (target_extension.is_empty() || target_extension.contains('.')) {
            return Err(WriterError::InvalidConfig(format!(
                "target extension {:?} must be a bare extension such as \"mrcs\"",
                target_extension
            )));
        }

        let stack_files = set.stack_files();
        let output_stack = match &self.config.output_stack {
            Some(stack) => {
                if stack_files.iter().any(|src| same_file(src, stack)) {
                    return Err(WriterError::InvalidConfig(format!(
                        "output stack {} is also an input stack",
                        stack.display()
                    )));
                }
                if stack.exists() {
                    fs::remove_file(stack)?;
                }
                Some(OutputStack {
                    path: stack.clone(),
                    relative: relative_path(stack, star_dir)?,
                })
            }
            None => None,
        };

        let file_mapping = match &self.config.output_dir {
            Some(dir) => materialize(
                &stack_files,
                dir,
                target_extension,
                self.config.force_convert,
                self.converter.as_ref(),
            )?,
            None => FileMapping::new(),
        };

        let mut extra_labels = self.config.extra_labels.clone();
        for label in ALWAYS_EXTRA_LABELS {
            if !extra_labels.iter().any(|l| l == label) {
                extra_labels.push(label.to_string());
            }
        }

        let pixel_size = if first.sampling_rate > 0.0 {
            first.sampling_rate
        } else {
            1.0
        };

        let session = WriteSession {
            set_ctf: self.config.write_ctf && first.has_ctf(),
            set_random_subset: self.config.fill_random_subset && first.random_subset.is_some(),
            root_dir: self.config.root_dir.clone(),
            materialized: self.config.output_dir.is_some(),
            config_align: align,
            extra_labels,
            pixel_size,
            output_stack,
            file_mapping,
            optics: OpticsTable::new(first.box_size),
            converter: self.converter,
            preprocess_row: self.preprocess_row,
            postprocess_row: self.postprocess_row,
            counter: 0,
        };
        debug!(
            "Writing {} particles to {} (alignment {}, ctf {})",
            set.len(),
            star_path.display(),
            align,
            session.set_ctf
        );

        session.write(set, first, star_path)
    }
}

/// Write a particle set with the default converter and no hooks
pub fn write_particle_set<P: AsRef<Path>>(
    set: &ParticleSet,
    star_path: P,
    config: WriterConfig,
) -> Result<WriteSummary, WriterError> {
    ParticleSetWriter::new(config).write(set, star_path)
}

/// Same path, or two paths resolving to the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

struct OutputStack {
    path: PathBuf,
    relative: PathBuf,
}

struct WriteSession<'a> {
    set_ctf: bool,
    set_random_subset: bool,
    root_dir: Option<PathBuf>,
    materialized: bool,
    config_align: AlignType,
    extra_labels: Vec<String>,
    pixel_size: f64,
    output_stack: Option<OutputStack>,
    file_mapping: FileMapping,
    optics: OpticsTable,
    converter: Box<dyn StackConverter + 'a>,
    preprocess_row: Option<RowHook<'a>>,
    postprocess_row: Option<RowHook<'a>>,
    /// Next index in the output stack; 0 while probing the first particle
    counter: u32,
}

impl WriteSession<'_> {
    fn write(mut self, set: &ParticleSet, first: &Particle, star_path: &Path) -> Result<WriteSummary, WriterError> {
        // the first particle's row fixes the column layout
        let layout_row = self.finished_row(first)?;
        let columns = layout_row.labels();

        let mut writer = StarWriter::create(star_path)?;
        writer.comment(&format!(
            "Star file generated with {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))?;
        writer.comment(&format!("version {}", STAR_FORMAT_VERSION))?;
        writer.begin_table("particles", &columns)?;

        let mut particles_written = 0;
        for particle in set {
            let row = self.finished_row(particle)?;
            writer.write_row(&row.project(&columns))?;
            particles_written += 1;
        }

        writer.blank_line()?;
        writer.comment(&format!("version {}", STAR_FORMAT_VERSION))?;
        self.optics.write(&mut writer)?;
        writer.finish()?;

        info!(
            "Wrote {} particles and {} optics group(s) to {}",
            particles_written,
            self.optics.len(),
            star_path.display()
        );

        Ok(WriteSummary {
            particles_written,
            optics_groups: self.optics.len(),
            file_mapping: self.file_mapping,
        })
    }

    fn finished_row(&mut self, particle: &Particle) -> Result<StarRow, WriterError> {
        let mut row = self.particle_row(particle)?;
        if let Some(hook) = self.postprocess_row.as_mut() {
            hook(particle, &mut row);
        }
        Ok(row)
    }

    fn particle_row(&mut self, particle: &Particle) -> Result<StarRow, WriterError> {
        let mut row = StarRow::new();
        row.set(labels::IMAGE_ID, particle.id);

        if let Some(coord) = &particle.coordinate {
            row.set(labels::COORDINATE_X, coord.x);
            row.set(labels::COORDINATE_Y, coord.y);
            if let Some(class) = coord.class_number {
                row.set(labels::CLASS_NUMBER, class);
            }
            if let Some(fom) = coord.autopick_fom {
                row.set(labels::AUTOPICK_FIGURE_OF_MERIT, fom);
            }
            if let Some(psi) = coord.angle_psi {
                row.set(labels::ANGLE_PSI, psi);
            }
            match (coord.mic_name.as_deref().filter(|n| !n.is_empty()), coord.mic_id) {
                (Some(name), _) => row.set(labels::MICROGRAPH_NAME, name.replace(' ', "")),
                (None, Some(id)) if id != 0 => row.set(labels::MICROGRAPH_NAME, id),
                _ => {}
            }
        }

        self.set_image_name(particle, &mut row)?;

        if self.set_random_subset {
            let subset = particle
                .random_subset
                .map(StarValue::Int)
                .unwrap_or(StarValue::Missing);
            row.set(labels::RANDOM_SUBSET, subset);
        }

        if self.set_ctf {
            self.set_ctf_fields(particle, &mut row);
        }

        self.set_alignment(particle, &mut row)?;

        if let Some(hook) = self.preprocess_row.as_mut() {
            hook(particle, &mut row);
        }

        for label in &self.extra_labels {
            if let Some(value) = particle.labels.get(label) {
                row.set(label, value);
            }
        }

        row.set(labels::OPTICS_GROUP, self.optics.group_number(particle));
        self.counter += 1;

        Ok(row)
    }

    fn set_image_name(&mut self, particle: &Particle, row: &mut StarRow) -> Result<(), WriterError> {
        let location = &particle.location;

        let name = match &self.output_stack {
            Some(stack) => {
                row.set(labels::ORIGINAL_PARTICLE_NAME, location.to_star());
                if self.counter > 0 {
                    self.converter.append_image(location, &stack.path, self.counter)?;
                }
                to_star_name(Some(self.counter), &stack.relative)
            }
            None => {
                let mut path = location.path.clone();
                if self.materialized {
                    if let Some(mapped) = self.file_mapping.get(&path) {
                        path = mapped.to_path_buf();
                    }
                }
                if let Some(root) = &self.root_dir {
                    path = relative_path(&path, root)?;
                }
                to_star_name(location.index, &path)
            }
        };

        row.set(labels::IMAGE_NAME, name);
        Ok(())
    }

    fn set_ctf_fields(&self, particle: &Particle, row: &mut StarRow) {
        let Some(ctf) = &particle.ctf else {
            warn!("Particle {} has no CTF; writing zero defocus", particle.id);
            for label in [
                labels::DEFOCUS_U,
                labels::DEFOCUS_V,
                labels::CTF_ASTIGMATISM,
                labels::DEFOCUS_ANGLE,
                labels::CTF_FIGURE_OF_MERIT,
                labels::CTF_MAX_RESOLUTION,
            ] {
                row.set(label, 0.0);
            }
            return;
        };

        if let Some(psd) = &ctf.psd_file {
            row.set(labels::CTF_IMAGE, psd.as_str());
        }
        row.set(labels::DEFOCUS_U, ctf.defocus_u);
        row.set(labels::DEFOCUS_V, ctf.defocus_v);
        row.set(labels::CTF_ASTIGMATISM, (ctf.defocus_u - ctf.defocus_v).abs());
        row.set(labels::DEFOCUS_ANGLE, ctf.defocus_angle);
        row.set(labels::CTF_FIGURE_OF_MERIT, ctf.fit_quality.unwrap_or(0.0));
        row.set(labels::CTF_MAX_RESOLUTION, ctf.resolution.unwrap_or(0.0));
        if let Some(phase_shift) = ctf.phase_shift {
            row.set(labels::CTF_PHASE_SHIFT, phase_shift);
        }
    }

    fn set_alignment(&self, particle: &Particle, row: &mut StarRow) -> Result<(), WriterError> {
        let transform = particle.transform.unwrap_or_default();
        match self.config_align {
            AlignType::None => {}
            AlignType::TwoD => align_2d(&transform, self.pixel_size).write_to(row),
            AlignType::Projection => align_projection(&transform, self.pixel_size)
                .ok_or(WriterError::SingularTransform {
                    particle_id: particle.id,
                })?
                .write_to(row),
            AlignType::ThreeD => return Err(WriterError::Unsupported3dAlignment),
        }
        Ok(())
    }
}
