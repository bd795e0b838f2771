//! End-to-end interchange through the default format registry.

use std::sync::Arc;

use meshmux::diagnostics::{CollectingDiagnostics, Diagnostic};
use meshmux::fs::MemoryFileSystem;
use meshmux::prelude::*;
use nalgebra::{Vector2, Vector3, Vector4};

const TETRA_OFF: &str = "\
OFF
4 4 6
0.0 0.0 0.0
1.0 0.0 0.0
0.5 1.0 0.0
0.5 0.5 1.0
3 0 2 1
3 0 1 3
3 1 2 3
3 2 0 3
";

fn setup() -> (MemoryFileSystem, FormatRegistry, Arc<CollectingDiagnostics>) {
    let fs = MemoryFileSystem::new();
    let sink = Arc::new(CollectingDiagnostics::new());
    let registry = FormatRegistry::with_defaults().with_diagnostics(sink.clone());
    (fs, registry, sink)
}

fn assert_close(a: &MeshContainer, b: &MeshContainer) {
    assert_eq!(a.num_vertices(), b.num_vertices());
    assert_eq!(a.topology(), b.topology());
    for (va, vb) in a.vertices().iter().zip(b.vertices()) {
        for (x, y) in va.values().iter().zip(vb.values()) {
            for (p, q) in x.as_slice().iter().zip(y.as_slice()) {
                assert!((p - q).abs() < 1e-6, "{p} != {q}");
            }
        }
    }
}

#[test]
fn off_roundtrip_preserves_structure() {
    let (fs, registry, sink) = setup();
    fs.insert("tetra.off", TETRA_OFF);

    let first = registry.try_read(&fs.file("tetra.off")).unwrap();
    assert_eq!(first.source_format.as_deref(), Some("OFF"));
    assert!(registry.try_write(&fs.file("copy.off"), &first));
    let second = registry.try_read(&fs.file("copy.off")).unwrap();

    assert_eq!(second.num_vertices(), 4);
    assert_eq!(second.num_faces(), 4);
    assert_close(&first.meshes[0], &second.meshes[0]);
    assert!(sink.is_empty());
    assert_eq!(fs.open_streams(), 0);
}

#[test]
fn mixed_case_extension_dispatches_to_off() {
    let (fs, registry, _) = setup();
    fs.insert("model.OFF", TETRA_OFF);

    assert_eq!(registry.codec_for(&fs.file("model.OFF")).unwrap().name(), "OFF");
    assert!(registry.try_read(&fs.file("model.OFF")).is_some());
}

#[test]
fn missing_file_is_not_an_error() {
    let (fs, registry, sink) = setup();

    assert!(registry.try_read(&fs.file("nowhere.off")).is_none());
    assert!(registry.try_read(&fs.file("nowhere.glb")).is_none());
    assert!(registry.try_read(&fs.file("nowhere.bsp")).is_none());
    assert_eq!(fs.open_streams(), 0);

    let events = sink.take();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|e| matches!(e, Diagnostic::CodecFailed { .. })));
}

#[test]
fn bsp_is_registered_but_always_fails() {
    let (fs, registry, sink) = setup();
    fs.insert("e1m1.bsp", vec![29, 0, 0, 0]);

    assert!(registry.try_read(&fs.file("e1m1.bsp")).is_none());
    assert!(matches!(
        &sink.take()[0],
        Diagnostic::CodecFailed { codec, .. } if codec == "BSP"
    ));
}

#[test]
fn off_to_glb_and_back() {
    let (fs, registry, _) = setup();
    fs.insert("tetra.off", TETRA_OFF);

    let off = registry.try_read(&fs.file("tetra.off")).unwrap();
    assert!(registry.try_write(&fs.file("tetra.glb"), &off));
    let glb = registry.try_read(&fs.file("tetra.glb")).unwrap();

    assert_eq!(glb.source_format.as_deref(), Some("glTF"));
    assert_close(&off.meshes[0], &glb.meshes[0]);
}

#[test]
fn four_d_positions_need_conversion_before_gltf() {
    let (fs, registry, sink) = setup();
    fs.insert(
        "hom.off",
        "4OFF\n3 1 0\n0 0 0 1\n1 0 0 1\n0 1 0 1\n3 0 1 2\n",
    );

    let mut container = registry.try_read(&fs.file("hom.off")).unwrap();
    assert!(!registry.try_write(&fs.file("hom.gltf"), &container));
    assert!(fs.get("hom.gltf").is_none());
    assert!(matches!(&sink.take()[0], Diagnostic::CodecFailed { codec, .. } if codec == "glTF"));

    let converters = ConverterRegistry::new();
    container.meshes[0]
        .convert_slot(slot::POSITION, 3, &converters)
        .unwrap();
    assert!(registry.try_write(&fs.file("hom.gltf"), &container));

    let back = registry.try_read(&fs.file("hom.gltf")).unwrap();
    assert_eq!(back.meshes[0].position(1), Some(Vector3::new(1.0, 0.0, 0.0)));
}

#[test]
fn texcoords_widen_and_narrow_through_the_registry() {
    let schema = AttributeSchema::new()
        .with(slot::POSITION, AttributeKind::Position, 3)
        .with(slot::UV0, AttributeKind::TexCoord, 2);
    let mut mesh = MeshContainer::new(schema);
    mesh.push_vertex(VertexRecord::new(vec![
        Vector3::new(0.0, 0.0, 0.0).into(),
        Vector2::new(0.25, 0.75).into(),
    ]))
    .unwrap();

    let converters = ConverterRegistry::new();
    mesh.convert_slot(slot::UV0, 4, &converters).unwrap();
    assert_eq!(
        mesh.attribute(0, slot::UV0),
        Some(&AttributeValue::Vec4(Vector4::new(0.25, 0.75, 0.0, 0.0)))
    );

    // OFF texcoords are 2D only.
    let (fs, registry, _) = setup();
    let container = FileContainer::from_mesh(mesh.clone());
    assert!(!registry.try_write(&fs.file("wide.off"), &container));

    mesh.convert_slot(slot::UV0, 2, &converters).unwrap();
    assert!(registry.try_write(&fs.file("narrow.off"), &FileContainer::from_mesh(mesh)));
}

#[test]
fn unknown_extension_reports_unrecognized_format() {
    let (fs, registry, sink) = setup();
    fs.insert("mesh.obj", "v 0 0 0\n");

    assert!(registry.try_read(&fs.file("mesh.obj")).is_none());
    assert!(!registry.try_write(&fs.file("mesh.obj"), &FileContainer::new()));
    let events = sink.take();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Diagnostic::FormatUnrecognized { .. }));
}

#[test]
fn off_counts_beyond_the_data_fail_quietly() {
    let (fs, registry, sink) = setup();
    fs.insert("vertices.off", "OFF\n18446744073709551615 0 0\n0 0 0\n");
    fs.insert(
        "arity.off",
        "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n18446744073709551615 0 1 2\n",
    );

    assert!(registry.try_read(&fs.file("vertices.off")).is_none());
    assert!(registry.try_read(&fs.file("arity.off")).is_none());
    assert_eq!(fs.open_streams(), 0);
    assert_eq!(sink.take().len(), 2);
}
