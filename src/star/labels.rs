//! Relion column labels, reproduced verbatim so downstream parsers find them.

/// Particle image id in the source set
pub const IMAGE_ID: &str = "rlnImageId";
/// `index@stack` image location
pub const IMAGE_NAME: &str = "rlnImageName";
/// Location before consolidation into a new stack
pub const ORIGINAL_PARTICLE_NAME: &str = "rlnOriginalParticleName";
/// Parent micrograph
pub const MICROGRAPH_NAME: &str = "rlnMicrographName";
/// Picking X position (px)
pub const COORDINATE_X: &str = "rlnCoordinateX";
/// Picking Y position (px)
pub const COORDINATE_Y: &str = "rlnCoordinateY";
/// Class assigned during picking or classification
pub const CLASS_NUMBER: &str = "rlnClassNumber";
/// Autopicking score
pub const AUTOPICK_FIGURE_OF_MERIT: &str = "rlnAutopickFigureOfMerit";
/// Half-set assignment
pub const RANDOM_SUBSET: &str = "rlnRandomSubset";

// CTF
/// Power spectrum image
pub const CTF_IMAGE: &str = "rlnCtfImage";
/// Defocus U (Å)
pub const DEFOCUS_U: &str = "rlnDefocusU";
/// Defocus V (Å)
pub const DEFOCUS_V: &str = "rlnDefocusV";
/// |U - V| (Å)
pub const CTF_ASTIGMATISM: &str = "rlnCtfAstigmatism";
/// Astigmatism angle (deg)
pub const DEFOCUS_ANGLE: &str = "rlnDefocusAngle";
/// CTF fit score
pub const CTF_FIGURE_OF_MERIT: &str = "rlnCtfFigureOfMerit";
/// CTF fit resolution (Å)
pub const CTF_MAX_RESOLUTION: &str = "rlnCtfMaxResolution";
/// Phase plate shift (deg)
pub const CTF_PHASE_SHIFT: &str = "rlnCtfPhaseShift";

// Alignment
/// Origin X shift (Å)
pub const ORIGIN_X_ANGST: &str = "rlnOriginXAngst";
/// Origin Y shift (Å)
pub const ORIGIN_Y_ANGST: &str = "rlnOriginYAngst";
/// Origin Z shift (Å)
pub const ORIGIN_Z_ANGST: &str = "rlnOriginZAngst";
/// First Euler angle (deg)
pub const ANGLE_ROT: &str = "rlnAngleRot";
/// Second Euler angle (deg)
pub const ANGLE_TILT: &str = "rlnAngleTilt";
/// Third Euler angle, or in-plane angle for 2D (deg)
pub const ANGLE_PSI: &str = "rlnAnglePsi";

// Extra labels always looked up on particles
/// Particle selection z-score
pub const PARTICLE_SELECT_ZSCORE: &str = "rlnParticleSelectZScore";
/// Movie frame of a polished particle
pub const MOVIE_FRAME_NUMBER: &str = "rlnMovieFrameNumber";

// Optics
/// Optics group number, shared by both tables
pub const OPTICS_GROUP: &str = "rlnOpticsGroup";
/// Optics group name
pub const OPTICS_GROUP_NAME: &str = "rlnOpticsGroupName";
/// Micrograph pixel size before extraction (Å)
pub const MICROGRAPH_ORIGINAL_PIXEL_SIZE: &str = "rlnMicrographOriginalPixelSize";
/// Particle pixel size (Å)
pub const IMAGE_PIXEL_SIZE: &str = "rlnImagePixelSize";
/// Voltage (kV)
pub const VOLTAGE: &str = "rlnVoltage";
/// Spherical aberration (mm)
pub const SPHERICAL_ABERRATION: &str = "rlnSphericalAberration";
/// Amplitude contrast
pub const AMPLITUDE_CONTRAST: &str = "rlnAmplitudeContrast";
/// Beam tilt X (mrad)
pub const BEAM_TILT_X: &str = "rlnBeamTiltX";
/// Beam tilt Y (mrad)
pub const BEAM_TILT_Y: &str = "rlnBeamTiltY";
/// 2 for particles, 3 for subtomograms
pub const IMAGE_DIMENSIONALITY: &str = "rlnImageDimensionality";
/// Box size (px)
pub const IMAGE_SIZE: &str = "rlnImageSize";
/// Detector MTF
pub const MTF_FILE_NAME: &str = "rlnMtfFileName";

// Tilt-series exports from Warp/M
/// Detector pixel size (µm)
pub const DETECTOR_PIXEL_SIZE: &str = "rlnDetectorPixelSize";
/// Magnification
pub const MAGNIFICATION: &str = "rlnMagnification";
