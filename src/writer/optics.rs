use std::io::Write;

use log::warn;

use crate::particles::Particle;
use crate::star::{labels, StarError, StarValue, StarWriter};

use super::row::StarRow;

/// Name used when a particle's acquisition has no optics group
pub const DEFAULT_OPTICS_GROUP: &str = "DefaultOpticsGroup";

/// Acquisition parameters shared by every particle of a group
#[derive(Debug, Clone, PartialEq)]
pub struct OpticsGroup {
    /// Group name, the deduplication key
    pub name: String,
    /// 1-based group number in first-seen order
    pub number: u32,
    /// Pixel size (Å/px)
    pub pixel_size: f64,
    /// Voltage (kV)
    pub voltage: f64,
    /// Spherical aberration (mm)
    pub spherical_aberration: f64,
    /// Amplitude contrast
    pub amplitude_contrast: f64,
    /// Beam tilt X (mrad)
    pub beam_tilt_x: f64,
    /// Beam tilt Y (mrad)
    pub beam_tilt_y: f64,
    /// 2 for particle images
    pub dimensionality: u32,
    /// Box size (px)
    pub image_size: u32,
    /// Detector MTF
    pub mtf_file: Option<String>,
}

impl OpticsGroup {
    fn from_particle(name: String, number: u32, particle: &Particle, image_size: u32) -> Self {
        let acq = &particle.acquisition;
        Self {
            name,
            number,
            pixel_size: particle.sampling_rate,
            voltage: acq.voltage,
            spherical_aberration: acq.spherical_aberration,
            amplitude_contrast: acq.amplitude_contrast,
            beam_tilt_x: acq.beam_tilt_x.unwrap_or(0.0),
            beam_tilt_y: acq.beam_tilt_y.unwrap_or(0.0),
            dimensionality: 2,
            image_size,
            mtf_file: acq.mtf_file.clone(),
        }
    }

    fn same_acquisition(&self, other: &Self) -> bool {
        self.pixel_size == other.pixel_size
            && self.voltage == other.voltage
            && self.spherical_aberration == other.spherical_aberration
            && self.amplitude_contrast == other.amplitude_contrast
            && self.beam_tilt_x == other.beam_tilt_x
            && self.beam_tilt_y == other.beam_tilt_y
            && self.mtf_file == other.mtf_file
    }

    fn to_row(&self, with_mtf: bool) -> StarRow {
        let mut row = StarRow::new();
        row.set(labels::OPTICS_GROUP_NAME, self.name.as_str());
        row.set(labels::OPTICS_GROUP, self.number);
        row.set(labels::MICROGRAPH_ORIGINAL_PIXEL_SIZE, self.pixel_size);
        row.set(labels::IMAGE_PIXEL_SIZE, self.pixel_size);
        row.set(labels::VOLTAGE, self.voltage);
        row.set(labels::SPHERICAL_ABERRATION, self.spherical_aberration);
        row.set(labels::AMPLITUDE_CONTRAST, self.amplitude_contrast);
        row.set(labels::BEAM_TILT_X, self.beam_tilt_x);
        row.set(labels::BEAM_TILT_Y, self.beam_tilt_y);
        row.set(labels::IMAGE_DIMENSIONALITY, self.dimensionality);
        row.set(labels::IMAGE_SIZE, self.image_size);
        if with_mtf {
            let mtf = self
                .mtf_file
                .as_deref()
                .map(StarValue::from)
                .unwrap_or(StarValue::Missing);
            row.set(labels::MTF_FILE_NAME, mtf);
        }
        row
    }
}

/// Optics groups discovered while visiting particles
#[derive(Debug, Default)]
pub struct OpticsTable {
    groups: Vec<OpticsGroup>,
    image_size: u32,
}

impl OpticsTable {
    /// Empty table; every group reports `image_size` as its box
    pub fn new(image_size: u32) -> Self {
        Self {
            groups: Vec::new(),
            image_size,
        }
    }

    /// Group number for a particle, registering its group on first sight
    pub fn group_number(&mut self, particle: &Particle) -> u32 {
        let name = particle
            .acquisition
            .optics_group_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_OPTICS_GROUP.to_string());

        let candidate = OpticsGroup::from_particle(name, self.groups.len() as u32 + 1, particle, self.image_size);

        match self.groups.iter().find(|g| g.name == candidate.name) {
            Some(existing) => {
                if !existing.same_acquisition(&candidate) {
                    warn!(
                        "Particle {} has different acquisition parameters than optics group '{}'; keeping the first seen",
                        particle.id, existing.name
                    );
                }
                existing.number
            }
            None => {
                let number = candidate.number;
                self.groups.push(candidate);
                number
            }
        }
    }

    /// Groups in number order
    pub fn groups(&self) -> &[OpticsGroup] {
        &self.groups
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group was registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Write the `optics` table
    pub fn write<W: Write>(&self, writer: &mut StarWriter<W>) -> Result<(), StarError> {
        let with_mtf = self.groups.iter().any(|g| g.mtf_file.is_some());
        let rows: Vec<StarRow> = self.groups.iter().map(|g| g.to_row(with_mtf)).collect();
        let Some(first) = rows.first() else {
            return Ok(());
        };

        let columns = first.labels();
        writer.begin_table("optics", &columns)?;
        for row in &rows {
            writer.write_row(&row.project(&columns))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Acquisition, ImageLocation};

    fn particle(id: u64, group: Option<&str>, voltage: f64) -> Particle {
        Particle::new(id, ImageLocation::new(id as u32, "s.mrcs"), 1.2, 64).with_acquisition(Acquisition {
            optics_group_name: group.map(str::to_string),
            voltage,
            ..Default::default()
        })
    }

    #[test]
    fn test_groups_numbered_first_seen() {
        let mut table = OpticsTable::new(64);
        assert_eq!(table.group_number(&particle(1, Some("b"), 300.0)), 1);
        assert_eq!(table.group_number(&particle(2, Some("a"), 200.0)), 2);
        assert_eq!(table.group_number(&particle(3, Some("b"), 300.0)), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.groups()[1].name, "a");
    }

    #[test]
    fn test_missing_name_uses_default_group() {
        let mut table = OpticsTable::new(64);
        table.group_number(&particle(1, None, 300.0));
        table.group_number(&particle(2, Some(""), 300.0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.groups()[0].name, DEFAULT_OPTICS_GROUP);
    }

    #[test]
    fn test_inconsistent_group_keeps_first() {
        let mut table = OpticsTable::new(64);
        table.group_number(&particle(1, Some("g"), 300.0));
        assert_eq!(table.group_number(&particle(2, Some("g"), 200.0)), 1);
        assert_eq!(table.groups()[0].voltage, 300.0);
    }

    #[test]
    fn test_mtf_column_only_when_present() {
        let mut table = OpticsTable::new(64);
        table.group_number(&particle(1, Some("a"), 300.0));
        let mut writer = StarWriter::new(Vec::new());
        table.write(&mut writer).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(!text.contains("rlnMtfFileName"));
        assert!(text.contains("_rlnImageSize #11"));

        let mut with_mtf = particle(2, Some("b"), 300.0);
        with_mtf.acquisition.mtf_file = Some("mtf_k3.star".into());
        table.group_number(&with_mtf);
        let mut writer = StarWriter::new(Vec::new());
        table.write(&mut writer).unwrap();
        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(text.contains("_rlnMtfFileName #12"));
        assert!(text.contains("a 1 1.200000 1.200000 300.000000"));
        assert!(text.lines().any(|l| l.starts_with("a ") && l.ends_with(" None")));
        assert!(text.lines().any(|l| l.starts_with("b ") && l.ends_with(" mtf_k3.star")));
    }
}
