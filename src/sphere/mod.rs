//! Audio-reactive sphere: maps band features onto radial vertex displacement.

mod mesh;

pub use mesh::{IcosphereMesh, Vertex};

use glam::{EulerRot, Mat4, Quat};
use noise::{NoiseFn, OpenSimplex};

use crate::bands::{modulate, BandFeatures};
use crate::params::{DeformationMapping, SphereGeometry};

/// Sphere system owning the mesh, the noise field, and the spin state.
pub struct SphereSystem {
    pub mesh: IcosphereMesh,
    geometry: SphereGeometry,
    mapping: DeformationMapping,
    noise: OpenSimplex,
    /// Accumulated Euler angles (radians, XYZ order)
    rotation: [f32; 3],
}

impl SphereSystem {
    pub fn new(geometry: SphereGeometry, mapping: DeformationMapping) -> Self {
        let mesh = IcosphereMesh::new(geometry.detail, geometry.radius);
        let noise = OpenSimplex::new(geometry.noise_seed);
        Self {
            mesh,
            geometry,
            mapping,
            noise,
            rotation: [0.0; 3],
        }
    }

    /// Run one deformation tick.
    ///
    /// Advances the ambient spin, maps the current band features to bass and
    /// treble factors, and displaces every vertex along its base direction.
    /// Normals are recomputed after the full pass.
    pub fn update(&mut self, time_ms: f32, features: &BandFeatures) {
        for (angle, inc) in self.rotation.iter_mut().zip(self.mapping.spin_increments) {
            *angle += inc;
        }

        let bass = modulate(
            features.lower_peak_fr.powf(self.mapping.bass_pow),
            0.0,
            1.0,
            0.0,
            self.mapping.bass_out_max,
        );
        let treble = modulate(
            features.upper_avg_fr,
            0.0,
            1.0,
            0.0,
            self.mapping.treble_out_max,
        );

        self.warp(time_ms, bass, treble);
    }

    /// Displace every vertex for the given instant and factors.
    fn warp(&mut self, time_ms: f32, bass: f32, treble: f32) {
        for i in 0..self.mesh.vertices.len() {
            let distance = self.displaced_distance(i, time_ms, bass, treble);
            self.mesh.displace(i, distance);
        }
        self.mesh.recompute_normals();
    }

    /// Radial distance for one vertex.
    ///
    /// Pure in (vertex, time, bass, treble) for a fixed noise seed: the noise
    /// field is sampled at the vertex direction offset by a slow per-axis
    /// time term, so the three axes drift out of phase.
    pub fn displaced_distance(&self, index: usize, time_ms: f32, bass: f32, treble: f32) -> f32 {
        let dir = self.mesh.base_dirs()[index];
        let rf = self.mapping.time_rate;
        let [rx, ry, rz] = self.mapping.axis_rates;

        let n = self.noise.get([
            (dir.x + time_ms * rf * rx) as f64,
            (dir.y + time_ms * rf * ry) as f64,
            (dir.z + time_ms * rf * rz) as f64,
        ]) as f32;

        (self.geometry.radius + bass) + n * self.mapping.noise_amplitude * treble
    }

    /// Model matrix for the accumulated ambient spin.
    pub fn model_matrix(&self) -> Mat4 {
        let [x, y, z] = self.rotation;
        Mat4::from_quat(Quat::from_euler(EulerRot::XYZ, x, y, z))
    }

    /// Accumulated Euler angles (radians)
    pub fn rotation(&self) -> [f32; 3] {
        self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn system() -> SphereSystem {
        SphereSystem::new(SphereGeometry::default(), DeformationMapping::default())
    }

    #[test]
    fn test_deformation_is_deterministic() {
        let a = system();
        let b = system();
        for i in 0..a.mesh.vertices.len() {
            let da = a.displaced_distance(i, 1234.5, 3.0, 2.0);
            let db = b.displaced_distance(i, 1234.5, 3.0, 2.0);
            assert_eq!(da, db);
        }
    }

    #[test]
    fn test_zero_treble_collapses_to_radius_plus_bass() {
        let mut s = system();
        s.warp(5000.0, 4.0, 0.0);
        for vertex in &s.mesh.vertices {
            let len = Vec3::from_array(vertex.position).length();
            assert!((len - 24.0).abs() < 1e-3, "distance {len} != 24");
        }
    }

    #[test]
    fn test_update_recomputes_features_every_tick() {
        let mut s = system();
        let loud = BandFeatures {
            lower_peak_fr: 1.0,
            lower_avg_fr: 0.5,
            upper_peak_fr: 1.0,
            upper_avg_fr: 1.0,
        };
        s.update(0.0, &loud);
        let loud_pos = s.mesh.vertices[0].position;

        // A silent frame must fully override the previous deformation.
        s.update(16.0, &BandFeatures::default());
        let len = Vec3::from_array(s.mesh.vertices[0].position).length();
        assert!((len - 20.0).abs() < 1e-3);
        assert_ne!(loud_pos, s.mesh.vertices[0].position);
    }

    #[test]
    fn test_spin_accumulates_fixed_increments() {
        let mut s = system();
        let features = BandFeatures::default();
        for _ in 0..10 {
            s.update(0.0, &features);
        }
        let [x, y, z] = s.rotation();
        assert!((x - 0.01).abs() < 1e-6);
        assert!((y - 0.05).abs() < 1e-6);
        assert!((z - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_normals_stay_unit_after_warp() {
        let mut s = system();
        s.warp(777.0, 6.0, 3.0);
        for vertex in &s.mesh.vertices {
            let n = Vec3::from_array(vertex.normal).length();
            assert!((n - 1.0).abs() < 1e-3);
        }
    }
}
