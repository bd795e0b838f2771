//! glTF 2.0 support.
//!
//! Reading goes through the `gltf` crate. Every primitive becomes one
//! [`MeshContainer`]; buffers are taken from the GLB binary chunk, from base64
//! `data:` URIs, or from files next to the glTF file, opened through the same
//! [`FileSystem`](crate::fs::FileSystem) as the glTF file itself.
//!
//! | glTF attribute | Slot | Components |
//! |----------------|------|------------|
//! | `POSITION` | `position` | 3 |
//! | `NORMAL` | `normal` | 3 |
//! | `TANGENT` | `tangent` | 4 |
//! | `TEXCOORD_n` | `uv{n}` | 2 |
//! | `COLOR_0` | `color0` | 3 or 4 |
//!
//! Triangle strips and fans are converted to triangle lists. Point primitives
//! come back without topology, and line primitives are skipped.
//!
//! Writing produces a binary `.glb` or a `.gltf` with the buffer embedded as a
//! base64 data URI, depending on the target extension.

use std::collections::BTreeMap;

use base64::Engine as _;
use serde::Serialize;

use super::{read_all, write_all, Codec, FileContainer, SupportedExtension};
use crate::attribute::{slot, AttributeKind, AttributeSchema, AttributeSpec, AttributeValue};
use crate::error::{MeshError, Result};
use crate::fs::FileRef;
use crate::mesh::{MeshContainer, Topology, VertexRecord};

const FORMAT: &str = "glTF";

const EXTENSIONS: &[SupportedExtension] = &[
    SupportedExtension::new("glTF", ".gltf"),
    SupportedExtension::new("glTF Binary", ".glb"),
];

const GLB_MAGIC: u32 = 0x4654_6C67;
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_POINTS: u32 = 0;

const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

/// Options for writing glTF files.
#[derive(Debug, Clone)]
pub struct GltfOptions {
    /// Value of `asset.generator`.
    pub generator: Option<String>,
}

impl Default for GltfOptions {
    fn default() -> Self {
        Self {
            generator: Some(format!("meshmux {}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl GltfOptions {
    /// Set the `asset.generator` string.
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }
}

/// Reads and writes glTF 2.0 (`.gltf` and `.glb`).
#[derive(Debug, Clone, Default)]
pub struct GltfCodec {
    options: GltfOptions,
}

impl GltfCodec {
    /// Create a codec with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with the given write options.
    pub fn with_options(options: GltfOptions) -> Self {
        Self { options }
    }
}

impl Codec for GltfCodec {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn supported_extensions(&self) -> &[SupportedExtension] {
        EXTENSIONS
    }

    fn read(&self, file: &FileRef) -> Result<FileContainer> {
        let bytes = read_all(file)?;
        let ::gltf::Gltf { document, mut blob } = ::gltf::Gltf::from_slice(&bytes)
            .map_err(|e| MeshError::load(file.path(), e.to_string()))?;

        let mut buffers = Vec::with_capacity(document.buffers().count());
        for buffer in document.buffers() {
            let data = match buffer.source() {
                ::gltf::buffer::Source::Bin => blob
                    .take()
                    .ok_or_else(|| MeshError::load(file.path(), "GLB binary chunk is missing"))?,
                ::gltf::buffer::Source::Uri(uri) => load_uri(file, uri)?,
            };
            if data.len() < buffer.length() {
                return Err(MeshError::load(
                    file.path(),
                    format!(
                        "buffer {} holds {} bytes, {} declared",
                        buffer.index(),
                        data.len(),
                        buffer.length()
                    ),
                ));
            }
            buffers.push(data);
        }

        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            let primitives = mesh.primitives().count();
            for primitive in mesh.primitives() {
                let name = match (mesh.name(), primitives) {
                    (Some(name), 1) => Some(name.to_string()),
                    (Some(name), _) => Some(format!("{name}#{}", primitive.index())),
                    (None, _) => None,
                };
                match read_primitive(&primitive, &buffers, name) {
                    Ok(Some(container)) => meshes.push(container),
                    Ok(None) => log::debug!(
                        "{}: skipped {:?} primitive {} of mesh {}",
                        file.path().display(),
                        primitive.mode(),
                        primitive.index(),
                        mesh.index()
                    ),
                    Err(message) => return Err(MeshError::load(file.path(), message)),
                }
            }
        }

        log::debug!(
            "{}: read {} meshes from {} glTF meshes",
            file.path().display(),
            meshes.len(),
            document.meshes().count()
        );
        Ok(FileContainer {
            meshes,
            source_format: Some(FORMAT.to_string()),
        })
    }

    fn write(&self, file: &FileRef, container: &FileContainer) -> Result<()> {
        let (root, bin) = build_document(container, &self.options)?;
        let binary = file
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".glb"));

        let bytes = if binary {
            let json = serde_json::to_vec(&root)
                .map_err(|e| MeshError::save(file.path(), e.to_string()))?;
            encode_glb(json, bin)
        } else {
            let mut root = root;
            if let Some(buffer) = root.buffers.first_mut() {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&bin);
                buffer.uri = Some(format!("{DATA_URI_PREFIX}{encoded}"));
            }
            serde_json::to_vec_pretty(&root)
                .map_err(|e| MeshError::save(file.path(), e.to_string()))?
        };
        write_all(file, &bytes)
    }
}

fn load_uri(file: &FileRef, uri: &str) -> Result<Vec<u8>> {
    if let Some(data) = uri.strip_prefix("data:") {
        let (_, payload) = data.split_once(";base64,").ok_or_else(|| {
            MeshError::load(file.path(), "only base64 data URIs are supported")
        })?;
        return base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| MeshError::load(file.path(), format!("bad data URI: {e}")));
    }
    let external = file.sibling(uri);
    log::debug!("loading external buffer {}", external.path().display());
    read_all(&external)
}

fn vec2(v: [f32; 2]) -> AttributeValue {
    AttributeValue::Vec2(nalgebra::Vector2::new(v[0] as f64, v[1] as f64))
}

fn vec3(v: [f32; 3]) -> AttributeValue {
    AttributeValue::Vec3(nalgebra::Vector3::new(v[0] as f64, v[1] as f64, v[2] as f64))
}

fn vec4(v: [f32; 4]) -> AttributeValue {
    AttributeValue::Vec4(nalgebra::Vector4::new(
        v[0] as f64,
        v[1] as f64,
        v[2] as f64,
        v[3] as f64,
    ))
}

/// Collects slot columns of equal length before they are zipped into records.
struct Columns {
    schema: AttributeSchema,
    columns: Vec<Vec<AttributeValue>>,
    len: usize,
}

impl Columns {
    fn push(
        &mut self,
        name: &str,
        kind: AttributeKind,
        components: usize,
        values: Vec<AttributeValue>,
    ) -> std::result::Result<(), String> {
        if values.len() != self.len {
            return Err(format!(
                "attribute '{name}' has {} elements, POSITION has {}",
                values.len(),
                self.len
            ));
        }
        self.schema
            .insert(name, AttributeSpec::new(kind, components))
            .map_err(|e| e.to_string())?;
        self.columns.push(values);
        Ok(())
    }

    fn into_records(self) -> (AttributeSchema, Vec<VertexRecord>) {
        let records = (0..self.len)
            .map(|i| VertexRecord::new(self.columns.iter().map(|c| c[i]).collect()))
            .collect();
        (self.schema, records)
    }
}

/// Returns `Ok(None)` for primitives that have no container equivalent.
fn read_primitive(
    primitive: &::gltf::mesh::Primitive<'_>,
    buffers: &[Vec<u8>],
    name: Option<String>,
) -> std::result::Result<Option<MeshContainer>, String> {
    use ::gltf::mesh::util::ReadColors;
    use ::gltf::mesh::Mode;

    let mode = primitive.mode();
    if matches!(mode, Mode::Lines | Mode::LineLoop | Mode::LineStrip) {
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let positions: Vec<AttributeValue> = reader
        .read_positions()
        .ok_or_else(|| "primitive has no POSITION attribute".to_string())?
        .map(vec3)
        .collect();

    let mut columns = Columns {
        schema: AttributeSchema::new(),
        columns: Vec::new(),
        len: positions.len(),
    };
    columns.push(slot::POSITION, AttributeKind::Position, 3, positions)?;

    if let Some(normals) = reader.read_normals() {
        columns.push(slot::NORMAL, AttributeKind::Normal, 3, normals.map(vec3).collect())?;
    }
    if let Some(tangents) = reader.read_tangents() {
        columns.push(slot::TANGENT, AttributeKind::Tangent, 4, tangents.map(vec4).collect())?;
    }

    let mut uv_sets: Vec<u32> = primitive
        .attributes()
        .filter_map(|(semantic, _)| match semantic {
            ::gltf::mesh::Semantic::TexCoords(set) => Some(set),
            _ => None,
        })
        .collect();
    uv_sets.sort_unstable();
    for set in uv_sets {
        if let Some(uvs) = reader.read_tex_coords(set) {
            let values = uvs.into_f32().map(vec2).collect();
            columns.push(&slot::uv(set as usize), AttributeKind::TexCoord, 2, values)?;
        }
    }

    if let Some(colors) = reader.read_colors(0) {
        let rgb = matches!(
            colors,
            ReadColors::RgbU8(_) | ReadColors::RgbU16(_) | ReadColors::RgbF32(_)
        );
        if rgb {
            let values = colors.into_rgb_f32().map(vec3).collect();
            columns.push(slot::COLOR0, AttributeKind::Color, 3, values)?;
        } else {
            let values = colors.into_rgba_f32().map(vec4).collect();
            columns.push(slot::COLOR0, AttributeKind::Color, 4, values)?;
        }
    }

    let num_vertices = columns.len as u32;
    let indices: Option<Vec<u32>> = reader.read_indices().map(|i| i.into_u32().collect());
    let triangles = match mode {
        Mode::Points => None,
        Mode::Triangles => Some(list_to_triangles(
            indices.unwrap_or_else(|| (0..num_vertices).collect()),
        )),
        Mode::TriangleStrip => Some(strip_to_triangles(
            &indices.unwrap_or_else(|| (0..num_vertices).collect()),
        )),
        Mode::TriangleFan => Some(fan_to_triangles(
            &indices.unwrap_or_else(|| (0..num_vertices).collect()),
        )),
        Mode::Lines | Mode::LineLoop | Mode::LineStrip => return Ok(None),
    };
    let topology = triangles
        .map(Topology::from_triangles)
        .transpose()
        .map_err(|e| e.to_string())?;

    let (schema, records) = columns.into_records();
    let mesh = MeshContainer::from_parts(name, schema, records, topology);
    mesh.validate().map_err(|e| e.to_string())?;
    Ok(Some(mesh))
}

fn list_to_triangles(mut indices: Vec<u32>) -> Vec<u32> {
    indices.truncate(indices.len() - indices.len() % 3);
    indices
}

fn strip_to_triangles(indices: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
    for i in 0..indices.len().saturating_sub(2) {
        if i % 2 == 0 {
            out.extend_from_slice(&[indices[i], indices[i + 1], indices[i + 2]]);
        } else {
            // Odd triangles flip winding.
            out.extend_from_slice(&[indices[i], indices[i + 2], indices[i + 1]]);
        }
    }
    out
}

fn fan_to_triangles(indices: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(indices.len().saturating_sub(2) * 3);
    for i in 1..indices.len().saturating_sub(1) {
        out.extend_from_slice(&[indices[0], indices[i], indices[i + 1]]);
    }
    out
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Root {
    asset: Asset,
    scene: u32,
    scenes: Vec<Scene>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    meshes: Vec<Mesh>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    accessors: Vec<Accessor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buffer_views: Vec<BufferView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buffers: Vec<Buffer>,
}

#[derive(Debug, Serialize)]
struct Asset {
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    generator: Option<String>,
}

#[derive(Debug, Serialize)]
struct Scene {
    nodes: Vec<u32>,
}

#[derive(Debug, Serialize)]
struct Node {
    mesh: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Mesh {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    primitives: Vec<Primitive>,
}

#[derive(Debug, Serialize)]
struct Primitive {
    attributes: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    indices: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: u32,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<Vec<f32>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    buffer: u32,
    byte_offset: usize,
    byte_length: usize,
    target: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    byte_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
}

/// glTF attribute name for a container slot, after checking the shape.
fn semantic(name: &str, spec: &AttributeSpec) -> Result<String> {
    let expected = match name {
        slot::POSITION => Some((3, "POSITION".to_string())),
        slot::NORMAL => Some((3, "NORMAL".to_string())),
        slot::TANGENT => Some((4, "TANGENT".to_string())),
        slot::COLOR0 if spec.components >= 3 => Some((spec.components, "COLOR_0".to_string())),
        slot::COLOR0 => Some((3, "COLOR_0".to_string())),
        _ => name
            .strip_prefix("uv")
            .and_then(|set| set.parse::<u32>().ok())
            .map(|set| (2, format!("TEXCOORD_{set}"))),
    };
    match expected {
        Some((components, semantic)) if components == spec.components => Ok(semantic),
        Some((components, _)) => Err(MeshError::incompatible(
            FORMAT,
            name,
            format!("{} components given, glTF stores {components}", spec.components),
        )),
        None => Err(MeshError::incompatible(
            FORMAT,
            name,
            "glTF has no attribute for this slot",
        )),
    }
}

fn accessor_type(components: usize) -> &'static str {
    match components {
        2 => "VEC2",
        3 => "VEC3",
        _ => "VEC4",
    }
}

/// Accumulates the binary buffer with its views and accessors.
#[derive(Default)]
struct BinBuilder {
    bin: Vec<u8>,
    views: Vec<BufferView>,
    accessors: Vec<Accessor>,
}

impl BinBuilder {
    fn push_view(&mut self, bytes: &[u8], target: u32) -> u32 {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.views.push(BufferView {
            buffer: 0,
            byte_offset: self.bin.len(),
            byte_length: bytes.len(),
            target,
        });
        self.bin.extend_from_slice(bytes);
        (self.views.len() - 1) as u32
    }

    fn push_attribute<'a>(
        &mut self,
        values: impl ExactSizeIterator<Item = &'a AttributeValue>,
        components: usize,
        bounds: bool,
    ) -> u32 {
        let count = values.len();
        let mut bytes = Vec::with_capacity(count * components * 4);
        let mut min = vec![f32::INFINITY; components];
        let mut max = vec![f32::NEG_INFINITY; components];
        for value in values {
            for (c, &x) in value.as_slice().iter().enumerate() {
                let x = x as f32;
                min[c] = min[c].min(x);
                max[c] = max[c].max(x);
                bytes.extend_from_slice(&x.to_le_bytes());
            }
        }
        let view = self.push_view(&bytes, TARGET_ARRAY_BUFFER);
        self.accessors.push(Accessor {
            buffer_view: view,
            component_type: COMPONENT_F32,
            count,
            kind: accessor_type(components),
            min: bounds.then_some(min),
            max: bounds.then_some(max),
        });
        (self.accessors.len() - 1) as u32
    }

    fn push_indices(&mut self, indices: &[u32]) -> u32 {
        let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        let view = self.push_view(&bytes, TARGET_ELEMENT_ARRAY_BUFFER);
        self.accessors.push(Accessor {
            buffer_view: view,
            component_type: COMPONENT_U32,
            count: indices.len(),
            kind: "SCALAR",
            min: None,
            max: None,
        });
        (self.accessors.len() - 1) as u32
    }
}

fn build_document(container: &FileContainer, options: &GltfOptions) -> Result<(Root, Vec<u8>)> {
    // Check every mesh before emitting anything.
    let mut semantics = Vec::with_capacity(container.meshes.len());
    for mesh in &container.meshes {
        let schema = mesh.schema();
        if !schema.contains(slot::POSITION) {
            return Err(MeshError::incompatible(
                FORMAT,
                slot::POSITION,
                "glTF primitives need a position",
            ));
        }
        if mesh.num_vertices() == 0 {
            return Err(MeshError::InvalidState(
                "glTF accessors cannot be empty".to_string(),
            ));
        }
        if mesh.num_vertices() > u32::MAX as usize {
            return Err(MeshError::InvalidState(format!(
                "{} vertices exceed the u32 index range",
                mesh.num_vertices()
            )));
        }
        mesh.validate()?;
        let names = schema
            .iter()
            .map(|(name, spec)| semantic(name, spec))
            .collect::<Result<Vec<String>>>()?;
        semantics.push(names);
    }

    let mut bin = BinBuilder::default();
    let mut meshes = Vec::with_capacity(container.meshes.len());
    let mut nodes = Vec::with_capacity(container.meshes.len());

    for (mi, (mesh, names)) in container.meshes.iter().zip(semantics).enumerate() {
        let mut attributes = BTreeMap::new();
        for ((slot_name, spec), semantic) in mesh.schema().iter().zip(names) {
            let Some(values) = mesh.slot_values(slot_name) else {
                continue;
            };
            let bounds = slot_name == slot::POSITION;
            let accessor = bin.push_attribute(values, spec.components, bounds);
            attributes.insert(semantic, accessor);
        }

        let (indices, mode) = match mesh.topology() {
            Some(topology) => {
                let triangles: Vec<u32> = topology.triangles().flatten().collect();
                (Some(bin.push_indices(&triangles)), None)
            }
            None => (None, Some(MODE_POINTS)),
        };

        meshes.push(Mesh {
            name: mesh.name().map(str::to_string),
            primitives: vec![Primitive {
                attributes,
                indices,
                mode,
            }],
        });
        nodes.push(Node {
            mesh: mi as u32,
            name: mesh.name().map(str::to_string),
        });
    }

    let BinBuilder {
        bin,
        views,
        accessors,
    } = bin;
    let buffers = if bin.is_empty() {
        Vec::new()
    } else {
        vec![Buffer {
            byte_length: bin.len(),
            uri: None,
        }]
    };

    let root = Root {
        asset: Asset {
            version: "2.0",
            generator: options.generator.clone(),
        },
        scene: 0,
        scenes: vec![Scene {
            nodes: (0..nodes.len() as u32).collect(),
        }],
        nodes,
        meshes,
        accessors,
        buffer_views: views,
        buffers,
    };
    Ok((root, bin))
}

fn encode_glb(mut json: Vec<u8>, mut bin: Vec<u8>) -> Vec<u8> {
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let bin_chunk = if bin.is_empty() { 0 } else { 8 + bin.len() };
    let total = 12 + 8 + json.len() + bin_chunk;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use nalgebra::{Vector2, Vector3, Vector4};

    fn quad() -> MeshContainer {
        let schema = AttributeSchema::new()
            .with(slot::POSITION, AttributeKind::Position, 3)
            .with(slot::NORMAL, AttributeKind::Normal, 3)
            .with(slot::UV0, AttributeKind::TexCoord, 2)
            .with(slot::COLOR0, AttributeKind::Color, 4);
        let mut mesh = MeshContainer::new(schema);
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.push_vertex(VertexRecord::new(vec![
                Vector3::new(x, y, 0.0).into(),
                Vector3::new(0.0, 0.0, 1.0).into(),
                Vector2::new(x, 1.0 - y).into(),
                Vector4::new(x, y, 0.5, 1.0).into(),
            ]))
            .unwrap();
        }
        mesh.set_topology(Topology::from_polygons(vec![0, 1, 2, 3], vec![4]).unwrap())
            .unwrap();
        mesh.set_name(Some("quad".to_string()));
        mesh
    }

    fn roundtrip(path: &str) -> (MemoryFileSystem, FileContainer) {
        let fs = MemoryFileSystem::new();
        let codec = GltfCodec::new();
        let container = FileContainer::from_mesh(quad());
        codec.write(&fs.file(path), &container).unwrap();
        let back = codec.read(&fs.file(path)).unwrap();
        (fs, back)
    }

    fn assert_quad(container: &FileContainer) {
        assert_eq!(container.meshes.len(), 1);
        let mesh = &container.meshes[0];
        assert_eq!(mesh.name(), Some("quad"));
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.topology().unwrap().indices(), &[0, 1, 2, 0, 2, 3]);

        let names: Vec<&str> = mesh.schema().names().collect();
        assert_eq!(names, vec!["position", "normal", "uv0", "color0"]);
        assert_eq!(mesh.position(2), Some(Vector3::new(1.0, 1.0, 0.0)));
        assert_eq!(
            mesh.attribute(3, slot::COLOR0),
            Some(&AttributeValue::Vec4(Vector4::new(0.0, 1.0, 0.5, 1.0)))
        );
    }

    #[test]
    fn test_glb_roundtrip() {
        let (fs, back) = roundtrip("out/quad.glb");
        assert_quad(&back);
        assert_eq!(back.source_format.as_deref(), Some("glTF"));

        let bytes = fs.get("out/quad.glb").unwrap();
        assert_eq!(&bytes[0..4], b"glTF");
        let total = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        assert_eq!(total as usize, bytes.len());
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(fs.open_streams(), 0);
    }

    #[test]
    fn test_embedded_gltf_roundtrip() {
        let (fs, back) = roundtrip("quad.gltf");
        assert_quad(&back);

        let json: serde_json::Value =
            serde_json::from_slice(&fs.get("quad.gltf").unwrap()).unwrap();
        let uri = json["buffers"][0]["uri"].as_str().unwrap();
        assert!(uri.starts_with(DATA_URI_PREFIX));
        assert_eq!(json["asset"]["version"], "2.0");
        assert!(json["asset"]["generator"].as_str().unwrap().starts_with("meshmux"));
        assert_eq!(json["accessors"][0]["max"], serde_json::json!([1.0, 1.0, 0.0]));
    }

    #[test]
    fn test_generator_option() {
        let fs = MemoryFileSystem::new();
        let codec = GltfCodec::with_options(GltfOptions::default().with_generator("test suite"));
        codec
            .write(&fs.file("a.gltf"), &FileContainer::from_mesh(quad()))
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&fs.get("a.gltf").unwrap()).unwrap();
        assert_eq!(json["asset"]["generator"], "test suite");
    }

    #[test]
    fn test_several_meshes() {
        let fs = MemoryFileSystem::new();
        let codec = GltfCodec::new();
        let mut second = quad();
        second.set_name(Some("other".to_string()));
        second.clear_topology();
        let container = FileContainer {
            meshes: vec![quad(), second],
            source_format: None,
        };
        assert!(codec.try_write(&fs.file("two.glb"), &container));

        let back = codec.try_read(&fs.file("two.glb")).unwrap();
        assert_eq!(back.meshes.len(), 2);
        assert_eq!(back.meshes[1].name(), Some("other"));
        assert!(!back.meshes[1].is_indexed());
        assert_eq!(back.num_vertices(), 8);
    }

    #[test]
    fn test_external_buffer_goes_through_file_system() {
        let fs = MemoryFileSystem::new();
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let bin: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
        fs.insert("assets/tri.bin", bin);
        fs.insert(
            "assets/tri.gltf",
            r#"{
                "asset": {"version": "2.0"},
                "buffers": [{"uri": "tri.bin", "byteLength": 36}],
                "bufferViews": [{"buffer": 0, "byteLength": 36}],
                "accessors": [{
                    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                    "min": [0, 0, 0], "max": [1, 1, 0]
                }],
                "meshes": [{"name": "tri", "primitives": [{"attributes": {"POSITION": 0}}]}]
            }"#,
        );

        let codec = GltfCodec::new();
        let back = codec.try_read(&fs.file("assets/tri.gltf")).unwrap();
        let mesh = &back.meshes[0];
        assert_eq!(mesh.name(), Some("tri"));
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.topology().unwrap().indices(), &[0, 1, 2]);
        assert_eq!(fs.open_streams(), 0);

        fs.remove("assets/tri.bin");
        assert!(codec.try_read(&fs.file("assets/tri.gltf")).is_none());
    }

    #[test]
    fn test_rejects_unrepresentable_schemas() {
        let fs = MemoryFileSystem::new();
        let codec = GltfCodec::new();
        let cases = [
            AttributeSchema::new()
                .with(slot::POSITION, AttributeKind::Position, 3)
                .with("weight", AttributeKind::Custom, 2),
            AttributeSchema::new().with(slot::POSITION, AttributeKind::Position, 4),
            AttributeSchema::new()
                .with(slot::POSITION, AttributeKind::Position, 3)
                .with(slot::UV0, AttributeKind::TexCoord, 3),
            AttributeSchema::new()
                .with(slot::POSITION, AttributeKind::Position, 3)
                .with(slot::COLOR0, AttributeKind::Color, 2),
            AttributeSchema::new()
                .with(slot::POSITION, AttributeKind::Position, 3)
                .with(slot::TANGENT, AttributeKind::Tangent, 3),
            AttributeSchema::new().with(slot::NORMAL, AttributeKind::Normal, 3),
        ];
        for schema in cases {
            let mut mesh = MeshContainer::new(schema.clone());
            let record = schema
                .iter()
                .map(|(_, spec)| AttributeValue::from_slice(&[0.0; 4][..spec.components]).unwrap())
                .collect();
            mesh.push_vertex(VertexRecord::new(record)).unwrap();

            let result = codec.write(&fs.file("bad.glb"), &FileContainer::from_mesh(mesh));
            assert!(
                matches!(result, Err(MeshError::IncompatibleSchema { .. })),
                "{schema:?} should be rejected"
            );
        }
        assert!(fs.get("bad.glb").is_none());
    }

    #[test]
    fn test_rejection_keeps_existing_file() {
        let fs = MemoryFileSystem::new();
        fs.insert("keep.gltf", b"{}".to_vec());
        let schema = AttributeSchema::new().with(slot::POSITION, AttributeKind::Position, 4);
        let mut mesh = MeshContainer::new(schema);
        mesh.push_vertex(VertexRecord::new(vec![Vector4::new(0.0, 0.0, 0.0, 1.0).into()]))
            .unwrap();

        assert!(!GltfCodec::new().try_write(&fs.file("keep.gltf"), &FileContainer::from_mesh(mesh)));
        assert_eq!(fs.get("keep.gltf"), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let fs = MemoryFileSystem::new();
        fs.insert("junk.glb", b"not a gltf file".to_vec());
        assert!(GltfCodec::new().try_read(&fs.file("junk.glb")).is_none());
        assert!(GltfCodec::new().try_read(&fs.file("missing.glb")).is_none());
        assert_eq!(fs.open_streams(), 0);
    }

    #[test]
    fn test_strip_and_fan_conversion() {
        assert_eq!(strip_to_triangles(&[0, 1, 2, 3]), vec![0, 1, 2, 1, 3, 2]);
        assert_eq!(fan_to_triangles(&[0, 1, 2, 3]), vec![0, 1, 2, 0, 2, 3]);
        assert!(strip_to_triangles(&[0, 1]).is_empty());
        assert_eq!(list_to_triangles(vec![0, 1, 2, 3]), vec![0, 1, 2]);
    }

    #[test]
    fn test_glb_padding() {
        let glb = encode_glb(b"{}".to_vec(), vec![1, 2, 3]);
        assert_eq!(glb.len(), 12 + 8 + 4 + 8 + 4);
        assert_eq!(&glb[20..24], b"{}  ");
        assert_eq!(&glb[32..36], &[1, 2, 3, 0]);
    }
}
