//! Per-vertex blending between two meshes.

use crate::attribute::InterpolationRegistry;
use crate::error::{MeshError, Result};
use crate::mesh::{lerp_records, MeshContainer};

/// Blend two meshes vertex by vertex.
///
/// Both meshes must share a schema and a vertex count, as two frames of a
/// morph target do. Every slot is interpolated through `interpolation`; `t`
/// is not clamped, so values outside `0..=1` extrapolate. Name and topology
/// come from `a`.
pub fn blend(
    a: &MeshContainer,
    b: &MeshContainer,
    t: f64,
    interpolation: &InterpolationRegistry,
) -> Result<MeshContainer> {
    if a.schema() != b.schema() {
        return Err(MeshError::schema_mismatch(format!(
            "cannot blend meshes with different schemas ({:?} vs {:?})",
            a.schema().names().collect::<Vec<_>>(),
            b.schema().names().collect::<Vec<_>>()
        )));
    }
    if a.num_vertices() != b.num_vertices() {
        return Err(MeshError::schema_mismatch(format!(
            "cannot blend {} vertices with {}",
            a.num_vertices(),
            b.num_vertices()
        )));
    }

    let vertices = a
        .vertices()
        .iter()
        .zip(b.vertices())
        .map(|(va, vb)| lerp_records(va, vb, t, interpolation))
        .collect();

    Ok(MeshContainer::from_parts(
        a.name().map(str::to_string),
        a.schema().clone(),
        vertices,
        a.topology().cloned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{slot, AttributeKind, AttributeSchema};
    use crate::mesh::{Topology, VertexRecord};
    use nalgebra::{Vector3, Vector4};

    fn frame(offset: f64) -> MeshContainer {
        let schema = AttributeSchema::new()
            .with(slot::POSITION, AttributeKind::Position, 3)
            .with(slot::COLOR0, AttributeKind::Color, 4);
        let mut mesh = MeshContainer::new(schema);
        for i in 0..3 {
            let x = i as f64 + offset;
            mesh.push_vertex(VertexRecord::new(vec![
                Vector3::new(x, offset, 0.0).into(),
                Vector4::new(offset, 0.0, 0.0, 1.0).into(),
            ]))
            .unwrap();
        }
        mesh.set_topology(Topology::from_triangles(vec![0, 1, 2]).unwrap())
            .unwrap();
        mesh
    }

    #[test]
    fn test_endpoints_are_exact() {
        let registry = InterpolationRegistry::new();
        let (a, b) = (frame(0.0), frame(1.0));
        assert_eq!(blend(&a, &b, 0.0, &registry).unwrap(), a);
        assert_eq!(blend(&a, &b, 1.0, &registry).unwrap().vertices(), b.vertices());
    }

    #[test]
    fn test_midpoint_and_extrapolation() {
        let registry = InterpolationRegistry::new();
        let (a, b) = (frame(0.0), frame(1.0));

        let mid = blend(&a, &b, 0.5, &registry).unwrap();
        assert_eq!(mid.position(2), Some(Vector3::new(2.5, 0.5, 0.0)));
        assert_eq!(mid.topology(), a.topology());

        let far = blend(&a, &b, 2.0, &registry).unwrap();
        assert_eq!(far.position(0), Some(Vector3::new(2.0, 2.0, 0.0)));
    }

    #[test]
    fn test_mismatched_meshes() {
        let registry = InterpolationRegistry::new();
        let a = frame(0.0);

        let b = frame(1.0);
        let shorter =
            MeshContainer::from_parts(None, b.schema().clone(), b.vertices()[..2].to_vec(), None);
        assert!(matches!(
            blend(&a, &shorter, 0.5, &registry),
            Err(MeshError::SchemaMismatch { .. })
        ));

        let other = MeshContainer::new(
            AttributeSchema::new().with(slot::POSITION, AttributeKind::Position, 3),
        );
        assert!(blend(&a, &other, 0.5, &registry).is_err());
    }
}
