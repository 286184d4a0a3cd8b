//! Icosphere geometry and deformation mapping parameters.

/// Base mesh shape parameters.
#[derive(Debug, Clone)]
pub struct SphereGeometry {
    /// Base radius of the icosphere (world units)
    /// reference value: 20
    pub radius: f32,

    /// Icosahedron subdivision detail (0 = raw icosahedron, 1 = 42 vertices)
    /// reference value: 1
    pub detail: u32,

    /// OpenSimplex noise seed (any fixed value keeps the mapper deterministic)
    pub noise_seed: u32,
}

impl Default for SphereGeometry {
    fn default() -> Self {
        Self {
            radius: 20.0,
            detail: 1,
            noise_seed: 42,
        }
    }
}

/// Mapping from band features to vertex displacement and ambient spin.
#[derive(Debug, Clone)]
pub struct DeformationMapping {
    /// Exponent applied to the lower-band peak fraction before rescaling
    /// reference value: 0.8
    pub bass_pow: f32,

    /// Upper end of the bass factor range (world units added to the radius)
    /// Formula: bass = modulate(lower_peak_fr^bass_pow, 0, 1, 0, this)
    /// reference value: 12
    pub bass_out_max: f32,

    /// Upper end of the treble factor range (dimensionless noise gain)
    /// Formula: treble = modulate(upper_avg_fr, 0, 1, 0, this)
    /// reference value: 6
    pub treble_out_max: f32,

    /// Noise amplitude multiplied by the treble factor (world units)
    /// reference value: 8
    pub noise_amplitude: f32,

    /// Base time rate for the noise field offset (per millisecond)
    /// reference value: 0.00001
    pub time_rate: f32,

    /// Per-axis multipliers on the time rate; distinct values desynchronize
    /// the three axes
    /// reference values: (6, 7, 8)
    pub axis_rates: [f32; 3],

    /// Ambient spin per tick (radians, XYZ order), independent of audio
    /// reference values: (0.001, 0.005, 0.002)
    pub spin_increments: [f32; 3],
}

impl Default for DeformationMapping {
    fn default() -> Self {
        Self {
            bass_pow: 0.8,
            bass_out_max: 12.0,
            treble_out_max: 6.0,
            noise_amplitude: 8.0,
            time_rate: 0.00001,
            axis_rates: [6.0, 7.0, 8.0],
            spin_increments: [0.001, 0.005, 0.002],
        }
    }
}
