use proptest::prelude::*;
use rffd_core::grid::GridGeometry;
use rffd_core::spatial::{Direction, Point, Spacing};

const D: usize = 3;

fn make_rotation(angle_x: f64, angle_y: f64, angle_z: f64) -> Direction<D> {
    let cx = angle_x.cos();
    let sx = angle_x.sin();
    let cy = angle_y.cos();
    let sy = angle_y.sin();
    let cz = angle_z.cos();
    let sz = angle_z.sin();

    let rz = nalgebra::SMatrix::<f64, 3, 3>::new(cz, -sz, 0.0, sz, cz, 0.0, 0.0, 0.0, 1.0);
    let ry = nalgebra::SMatrix::<f64, 3, 3>::new(cy, 0.0, sy, 0.0, 1.0, 0.0, -sy, 0.0, cy);
    let rx = nalgebra::SMatrix::<f64, 3, 3>::new(1.0, 0.0, 0.0, 0.0, cx, -sx, 0.0, sx, cx);

    Direction(rx * ry * rz)
}

proptest! {
    /// Node positions projected back into the direction frame recover the
    /// origin-frame coordinate plus index times spacing, for any rotation.
    #[test]
    fn test_node_position_frame_roundtrip(
        ox in -100.0f64..100.0, oy in -100.0f64..100.0, oz in -100.0f64..100.0,
        sx in 0.1f64..5.0, sy in 0.1f64..5.0, sz in 0.1f64..5.0,
        ax in -3.14f64..3.14, ay in -3.14f64..3.14, az in -3.14f64..3.14,
        ix in 0usize..6, iy in 0usize..6, iz in 0usize..6
    ) {
        let origin = Point::<D>::new([ox, oy, oz]);
        let spacing = Spacing::<D>::new([sx, sy, sz]);
        let direction = make_rotation(ax, ay, az);
        let grid = GridGeometry::new([0; D], [6, 6, 6], spacing, origin, direction);

        let frame_origin = grid.origin_frame();
        let pos = grid.node_position([ix, iy, iz]);
        let frame_pos = direction.to_frame(pos.as_vector());

        let expected = [
            frame_origin[0] + ix as f64 * sx,
            frame_origin[1] + iy as f64 * sy,
            frame_origin[2] + iz as f64 * sz,
        ];
        for d in 0..D {
            prop_assert!(
                (frame_pos[d] - expected[d]).abs() < 1e-9,
                "axis {} mismatch: {} vs {}", d, frame_pos[d], expected[d]
            );
        }
    }

    /// The direction matrices produced by Euler angles are orthonormal.
    #[test]
    fn test_rotation_orthonormal(
        ax in -3.14f64..3.14, ay in -3.14f64..3.14, az in -3.14f64..3.14
    ) {
        prop_assert!(make_rotation(ax, ay, az).is_orthonormal());
    }
}
