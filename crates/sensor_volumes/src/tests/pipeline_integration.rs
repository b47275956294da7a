//! Integration tests for the shape -> mesh -> primitive -> frame pipeline
//!
//! Exercises geometry synthesis and the primitive cache together through a
//! scene backed by the headless backend.

use crate::foundation::logging;
use crate::foundation::math::{constants, Vec3};
use crate::geometry::{ConicShape, PyramidShape, SensorMesh, SensorVertex, Topology, TorusShape};
use crate::primitive::SensorVolume;
use crate::render::{CommandKind, HeadlessBackend, Material, Color, Pass};
use crate::scene::{Passes, Scene, SceneMode};
use crate::SensorError;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RESOLUTION: f64 = 5.0 * constants::DEG_TO_RAD;

    fn headless(scene: &Scene) -> &HeadlessBackend {
        logging::init_for_tests();
        scene.backend().as_any().downcast_ref::<HeadlessBackend>().unwrap()
    }

    fn sample_meshes(radius: f64) -> Vec<SensorMesh> {
        let sets = [
            PyramidShape::new(0.3, 0.7).directions(),
            ConicShape::new(0.0, 0.5, 0.0, constants::TAU).directions(RESOLUTION),
            ConicShape::new(0.2, 1.2, 0.5, 2.0).directions(RESOLUTION),
            ConicShape::new(0.0, 2.5, -1.0, 1.0).directions(RESOLUTION),
            TorusShape::new(0.6, 1.4, 0.3, -0.8).directions(RESOLUTION),
            TorusShape::new(0.4, constants::TAU, 0.0, 0.0).directions(RESOLUTION),
        ];
        sets.iter()
            .map(|set| SensorMesh::synthesize(&set.directions, set.topology, radius).unwrap())
            .collect()
    }

    #[test]
    fn test_quarter_pi_pyramid_mesh() {
        let set = PyramidShape::new(constants::QUARTER_PI, constants::QUARTER_PI).directions();
        assert_eq!(set.len(), 4);
        assert_eq!(set.topology, Topology::Fan);

        let mesh = SensorMesh::synthesize(&set.directions, set.topology, 100.0).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.vertex_count(), 12);

        for (index, vertex) in mesh.vertices().iter().enumerate() {
            let position = vertex.position_f64();
            if index % 3 == 0 {
                assert_eq!(position, Vec3::zeros());
            } else {
                assert!(position.norm() >= 99.999, "vertex {index} too close: {}", position.norm());
            }
            assert_relative_eq!(vertex.normal_f64().norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_bounding_sphere_encloses_every_vertex() {
        for mesh in sample_meshes(1000.0) {
            let sphere = mesh.bounding_sphere();
            for vertex in mesh.vertices() {
                assert!(
                    sphere.contains_point(&vertex.position_f64()),
                    "{:?} mesh vertex outside its bounding sphere",
                    mesh.topology()
                );
            }
        }
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let first = sample_meshes(250.0);
        let second = sample_meshes(250.0);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.as_bytes(), b.as_bytes());
            assert_eq!(a.bounding_sphere(), b.bounding_sphere());
        }
    }

    #[test]
    fn test_vertex_bytes_match_layout() {
        let mesh = &sample_meshes(10.0)[0];
        let layout = SensorVertex::layout();
        assert_eq!(mesh.as_bytes().len(), mesh.vertex_count() * layout.stride as usize);
    }

    #[test]
    fn test_angle_clamps() {
        let pyramid = PyramidShape::new(3.0, -1.0);
        assert_eq!(pyramid.x_half_angle(), constants::HALF_PI);
        assert!(pyramid.y_half_angle() > 0.0);

        let cone = ConicShape::new(4.0, 5.0, 0.0, 10.0);
        assert_eq!(cone.outer_half_angle(), constants::PI);
        assert_eq!(cone.inner_half_angle(), constants::PI);
        assert_relative_eq!(cone.clock_span(), constants::TAU, epsilon = 1e-12);

        let torus = TorusShape::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(torus.elevation_span(), constants::PI);
        assert_eq!(torus.azimuth_span(), constants::TAU);
    }

    #[test]
    fn test_torus_side_walls() {
        let wedge = TorusShape::new(constants::HALF_PI, constants::HALF_PI, 0.0, 0.0);
        let lattice = wedge.lattice(RESOLUTION);
        assert!(lattice.side_walls);
        assert_eq!(lattice.azimuth_steps, 18);
        assert_eq!(lattice.elevation_steps, 18);
        assert_eq!(lattice.triangle_count(), 36 + 36 + 648);
        assert_eq!(wedge.directions(RESOLUTION).len(), lattice.triangle_count() * 3);

        let ring = TorusShape::new(constants::PI, constants::TAU, 0.0, 0.0);
        let lattice = ring.lattice(RESOLUTION);
        assert!(!lattice.side_walls);
        assert_eq!(lattice.triangle_count(), 2 * 72 + 2 * 72 * 36);
        assert_eq!(ring.directions(RESOLUTION).len(), lattice.triangle_count() * 3);
    }

    #[test]
    fn test_frame_reuses_cached_resources() {
        let mut scene = Scene::new(Box::new(HeadlessBackend::new()));
        let key = scene.add_primitive(SensorVolume::pyramid(PyramidShape::default()));

        let commands = scene.render_frame(Passes::render_and_pick()).unwrap();
        let kinds: Vec<_> = commands.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![CommandKind::BackFace, CommandKind::FrontFace, CommandKind::Pick]);
        assert!(commands.iter().all(|c| c.pass == Pass::Translucent));
        assert!(commands.iter().all(|c| c.is_complete()));

        let stats = headless(&scene).stats();
        assert_eq!(stats.buffers_created, 1);
        assert_eq!(stats.programs_linked, 2);
        assert_eq!(stats.pick_ids_created, 1);

        scene.render_frame(Passes::render_and_pick()).unwrap();
        assert_eq!(headless(&scene).stats().total_allocations(), stats.total_allocations());

        scene.primitive_mut(key).unwrap().set_radius(500.0);
        scene.render_frame(Passes::render_only()).unwrap();
        let stats = headless(&scene).stats();
        assert_eq!(stats.buffers_created, 2);
        assert_eq!(stats.buffers_released, 1);
        assert_eq!(stats.programs_linked, 2);
    }

    #[test]
    fn test_opaque_material_emits_front_face_only() {
        let mut scene = Scene::new(Box::new(HeadlessBackend::new()));
        let mut volume = SensorVolume::pyramid(PyramidShape::default());
        volume.set_material(Some(Material::color(Color::WHITE)));
        scene.add_primitive(volume);

        let commands = scene.render_frame(Passes::render_only()).unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].kind, CommandKind::FrontFace);
        assert_eq!(commands[0].pass, Pass::Opaque);
    }

    #[test]
    fn test_hidden_primitive_keeps_its_slot() {
        let mut scene = Scene::new(Box::new(HeadlessBackend::new()));
        let key = scene.add_primitive(SensorVolume::conic(ConicShape::default()));
        scene.render_frame(Passes::render_only()).unwrap();
        let allocations = headless(&scene).stats().total_allocations();

        scene.primitive_mut(key).unwrap().set_show(false);
        assert!(scene.render_frame(Passes::render_and_pick()).unwrap().is_empty());
        assert!(scene.contains_primitive(key));

        scene.primitive_mut(key).unwrap().set_show(true);
        assert_eq!(scene.render_frame(Passes::render_only()).unwrap().len(), 2);
        assert_eq!(headless(&scene).stats().total_allocations(), allocations);
    }

    #[test]
    fn test_non_3d_modes_emit_nothing() {
        let mut scene = Scene::new(Box::new(HeadlessBackend::new()));
        scene.add_primitive(SensorVolume::torus(TorusShape::default()));

        for mode in [SceneMode::Scene2D, SceneMode::ColumbusView, SceneMode::Morphing] {
            scene.set_mode(mode);
            assert!(scene.render_frame(Passes::render_and_pick()).unwrap().is_empty());
        }
        assert_eq!(headless(&scene).stats().total_allocations(), 0);
    }

    #[test]
    fn test_negative_radius_fails_frame() {
        let mut scene = Scene::new(Box::new(HeadlessBackend::new()));
        let key = scene.add_primitive(SensorVolume::pyramid(PyramidShape::default()));
        scene.primitive_mut(key).unwrap().set_radius(-1.0);

        let result = scene.render_frame(Passes::render_only());
        assert!(matches!(result, Err(SensorError::InvalidState(_))));
    }

    #[test]
    fn test_removal_releases_everything() {
        let mut scene = Scene::new(Box::new(HeadlessBackend::new()));
        let keys: Vec<_> = (0..3)
            .map(|_| scene.add_primitive(SensorVolume::pyramid(PyramidShape::default())))
            .collect();
        scene.render_frame(Passes::render_and_pick()).unwrap();
        assert_eq!(headless(&scene).live_buffer_count(), 3);

        assert!(scene.remove_primitive(keys[0]));
        assert!(!scene.remove_primitive(keys[0]));
        assert_eq!(scene.primitive_count(), 2);

        scene.remove_all_primitives();
        let backend = headless(&scene);
        assert_eq!(backend.live_buffer_count(), 0);
        assert_eq!(backend.live_program_count(), 0);
        assert_eq!(backend.live_pick_id_count(), 0);
        assert_eq!(backend.stats().invalid_releases, 0);
    }
}
