//! OFF (Object File Format) support.
//!
//! OFF is a line-based text format:
//!
//! ```text
//! [ST][C][N][4]OFF
//! NVertices NFaces NEdges
//! x y z [nx ny nz] [r g b [a]] [s t]     (NVertices lines)
//! n i1 i2 ... in [r g b [a]]              (NFaces lines)
//! ```
//!
//! The keyword prefixes announce per-vertex texture coordinates (`ST`),
//! colors (`C`), normals (`N`) and homogeneous 4D positions (`4`). The counts
//! may share the keyword line. `#` starts a comment. Colors written as
//! integers are 0-255 and are normalized to 0-1; face colors are ignored.
//!
//! Slots map to `position`, `normal`, `color0` and `uv0`.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use nalgebra::Vector3;

use super::{read_all, write_all, Codec, FileContainer, SupportedExtension};
use crate::attribute::{slot, AttributeKind, AttributeSchema, AttributeSpec, AttributeValue};
use crate::error::{MeshError, Result};
use crate::fs::FileRef;
use crate::mesh::{MeshContainer, Topology, VertexRecord};

const FORMAT: &str = "OFF";

const EXTENSIONS: &[SupportedExtension] =
    &[SupportedExtension::new("Object File Format", ".off")];

/// Options for writing OFF files.
#[derive(Debug, Clone)]
pub struct OffOptions {
    /// Fixed number of decimals, or `None` for the shortest exact
    /// representation.
    pub precision: Option<usize>,

    /// Comment written above the header.
    pub comment: Option<String>,
}

impl Default for OffOptions {
    fn default() -> Self {
        Self {
            precision: None,
            comment: Some("Generated by meshmux".to_string()),
        }
    }
}

impl OffOptions {
    /// Write values with a fixed number of decimals.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Set or clear the header comment.
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }
}

/// Reads and writes OFF files.
#[derive(Debug, Clone, Default)]
pub struct OffCodec {
    options: OffOptions,
}

impl OffCodec {
    /// Create a codec with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with the given write options.
    pub fn with_options(options: OffOptions) -> Self {
        Self { options }
    }
}

impl Codec for OffCodec {
    fn name(&self) -> &'static str {
        FORMAT
    }

    fn supported_extensions(&self) -> &[SupportedExtension] {
        EXTENSIONS
    }

    fn read(&self, file: &FileRef) -> Result<FileContainer> {
        let bytes = read_all(file)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| MeshError::load(file.path(), format!("not UTF-8 text: {e}")))?;
        let mesh = parse(text, file.path())?;
        Ok(FileContainer {
            meshes: vec![mesh],
            source_format: Some(FORMAT.to_string()),
        })
    }

    fn write(&self, file: &FileRef, container: &FileContainer) -> Result<()> {
        let [mesh] = container.meshes.as_slice() else {
            return Err(MeshError::save(
                file.path(),
                format!("OFF stores exactly one mesh, container has {}", container.meshes.len()),
            ));
        };
        let text = serialize(mesh, &self.options)?;
        write_all(file, text.as_bytes())
    }
}

/// Which optional vertex fields a file carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Header {
    texcoords: bool,
    colors: bool,
    normals: bool,
    four_d: bool,
}

impl Header {
    fn parse(keyword: &str) -> Option<Self> {
        let mut rest = keyword.strip_suffix("OFF")?;
        let mut header = Header::default();
        if let Some(r) = rest.strip_prefix("ST") {
            header.texcoords = true;
            rest = r;
        }
        if let Some(r) = rest.strip_prefix('C') {
            header.colors = true;
            rest = r;
        }
        if let Some(r) = rest.strip_prefix('N') {
            header.normals = true;
            rest = r;
        }
        if let Some(r) = rest.strip_prefix('4') {
            header.four_d = true;
            rest = r;
        }
        rest.is_empty().then_some(header)
    }

    fn keyword(&self) -> String {
        let mut s = String::new();
        if self.texcoords {
            s.push_str("ST");
        }
        if self.colors {
            s.push('C');
        }
        if self.normals {
            s.push('N');
        }
        if self.four_d {
            s.push('4');
        }
        s.push_str("OFF");
        s
    }

    fn position_components(&self) -> usize {
        if self.four_d {
            4
        } else {
            3
        }
    }
}

/// Non-empty lines with comments stripped, split into tokens.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, Vec<&'a str>);

    fn next(&mut self) -> Option<Self::Item> {
        for (i, line) in self.inner.by_ref() {
            let content = line.split('#').next().unwrap_or("");
            let tokens: Vec<&str> = content.split_whitespace().collect();
            if !tokens.is_empty() {
                return Some((i + 1, tokens));
            }
        }
        None
    }
}

fn parse_error(path: &Path, line: usize, message: impl std::fmt::Display) -> MeshError {
    MeshError::load(path, format!("line {line}: {message}"))
}

fn parse_count(path: &Path, line: usize, token: &str, what: &str) -> Result<usize> {
    token
        .parse()
        .map_err(|_| parse_error(path, line, format!("invalid {what} '{token}'")))
}

fn parse_float(path: &Path, line: usize, token: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| parse_error(path, line, format!("invalid number '{token}'")))
}

fn is_integer_token(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit() || b == b'-' || b == b'+')
}

fn parse(text: &str, path: &Path) -> Result<MeshContainer> {
    let mut lines = Lines::new(text);

    let (line, tokens) = lines
        .next()
        .ok_or_else(|| MeshError::load(path, "empty file"))?;
    let keyword = tokens[0];
    let header = Header::parse(keyword)
        .ok_or_else(|| parse_error(path, line, format!("unsupported OFF keyword '{keyword}'")))?;

    let (line, counts) = if tokens.len() > 1 {
        (line, tokens[1..].to_vec())
    } else {
        lines
            .next()
            .ok_or_else(|| MeshError::load(path, "missing vertex/face counts"))?
    };
    if counts.len() < 2 {
        return Err(parse_error(path, line, "expected vertex and face counts"));
    }
    let num_vertices = parse_count(path, line, counts[0], "vertex count")?;
    let num_faces = parse_count(path, line, counts[1], "face count")?;

    let position_n = header.position_components();
    let normal_n = if header.normals { 3 } else { 0 };
    let texcoord_n = if header.texcoords { 2 } else { 0 };
    let fixed_n = position_n + normal_n + texcoord_n;

    let mut color_n: Option<usize> = None;
    // The declared count is untrusted; each vertex needs its own line.
    let mut records = Vec::with_capacity(num_vertices.min(text.lines().count()));

    for _ in 0..num_vertices {
        let (line, tokens) = lines
            .next()
            .ok_or_else(|| MeshError::load(path, "unexpected end of file in vertex list"))?;

        let this_color_n = if header.colors {
            tokens.len().saturating_sub(fixed_n)
        } else {
            0
        };
        if header.colors && !(3..=4).contains(&this_color_n) {
            return Err(parse_error(
                path,
                line,
                format!("expected 3 or 4 color components, found {this_color_n}"),
            ));
        }
        if tokens.len() != fixed_n + this_color_n {
            return Err(parse_error(
                path,
                line,
                format!("expected {fixed_n} values per vertex, found {}", tokens.len()),
            ));
        }
        match color_n {
            None => color_n = Some(this_color_n),
            Some(n) if n != this_color_n => {
                return Err(parse_error(
                    path,
                    line,
                    format!("vertex has {this_color_n} color components, previous vertices had {n}"),
                ));
            }
            Some(_) => {}
        }

        let values = tokens
            .iter()
            .map(|t| parse_float(path, line, t))
            .collect::<Result<Vec<f64>>>()?;

        let (position, rest) = values.split_at(position_n);
        let (normal, rest) = rest.split_at(normal_n);
        let (color, texcoord) = rest.split_at(this_color_n);

        let mut record = vec![vector(position)];
        if header.normals {
            record.push(vector(normal));
        }
        if header.colors {
            let start = position_n + normal_n;
            let mut color = color.to_vec();
            if tokens[start..start + this_color_n].iter().all(|t| is_integer_token(t)) {
                color.iter_mut().for_each(|c| *c /= 255.0);
            }
            record.push(vector(&color));
        }
        if header.texcoords {
            record.push(vector(texcoord));
        }
        records.push(VertexRecord::new(record));
    }

    let mut schema = AttributeSchema::new();
    schema.insert(slot::POSITION, AttributeSpec::new(AttributeKind::Position, position_n))?;
    if header.normals {
        schema.insert(slot::NORMAL, AttributeSpec::new(AttributeKind::Normal, 3))?;
    }
    if header.colors {
        schema.insert(slot::COLOR0, AttributeSpec::new(AttributeKind::Color, color_n.unwrap_or(3)))?;
    }
    if header.texcoords {
        schema.insert(slot::UV0, AttributeSpec::new(AttributeKind::TexCoord, 2))?;
    }

    let mut topology = Topology::new();
    let mut ignored_face_colors = 0usize;
    for face in 0..num_faces {
        let (line, tokens) = lines
            .next()
            .ok_or_else(|| MeshError::load(path, "unexpected end of file in face list"))?;
        let n = parse_count(path, line, tokens[0], "face size")?;
        if n < 3 {
            return Err(parse_error(path, line, format!("face {face} has {n} vertices")));
        }
        if tokens.len() - 1 < n {
            return Err(parse_error(
                path,
                line,
                format!("face {face} declares {n} vertices but lists {}", tokens.len() - 1),
            ));
        }
        if tokens.len() - 1 > n {
            ignored_face_colors += 1;
        }
        let indices = tokens[1..=n]
            .iter()
            .map(|t| {
                let vi = parse_count(path, line, t, "vertex index")?;
                if vi >= num_vertices {
                    return Err(MeshError::InvalidVertexIndex { face, vertex: vi });
                }
                Ok(vi as u32)
            })
            .collect::<Result<Vec<u32>>>()?;
        topology.push_face(&indices)?;
    }
    if ignored_face_colors > 0 {
        log::debug!(
            "{}: ignored trailing face data on {} faces",
            path.display(),
            ignored_face_colors
        );
    }

    let topology = (num_faces > 0).then_some(topology);
    let mesh = MeshContainer::from_parts(None, schema, records, topology);
    mesh.validate()?;
    log::debug!(
        "{}: read {} vertices, {} faces ({})",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces(),
        header.keyword()
    );
    Ok(mesh)
}

fn vector(values: &[f64]) -> AttributeValue {
    match AttributeValue::from_slice(values) {
        Some(v) => v,
        // Callers only slice 2, 3 or 4 values.
        None => AttributeValue::Vec3(Vector3::zeros()),
    }
}

/// Which slot goes into which OFF field.
struct Layout {
    header: Header,
    position: usize,
    normal: Option<usize>,
    color: Option<usize>,
    texcoord: Option<usize>,
}

fn layout(schema: &AttributeSchema) -> Result<Layout> {
    let mut header = Header::default();
    let mut position = None;
    let mut normal = None;
    let mut color = None;
    let mut texcoord = None;

    for (index, (name, spec)) in schema.iter().enumerate() {
        match (name, spec.components) {
            (slot::POSITION, 3) => position = Some(index),
            (slot::POSITION, 4) => {
                header.four_d = true;
                position = Some(index);
            }
            (slot::NORMAL, 3) => {
                header.normals = true;
                normal = Some(index);
            }
            (slot::COLOR0, 3 | 4) => {
                header.colors = true;
                color = Some(index);
            }
            (slot::UV0, 2) => {
                header.texcoords = true;
                texcoord = Some(index);
            }
            (slot::POSITION | slot::NORMAL | slot::COLOR0 | slot::UV0, n) => {
                return Err(MeshError::incompatible(
                    FORMAT,
                    name,
                    format!("{n} components are not representable"),
                ));
            }
            _ => {
                return Err(MeshError::incompatible(
                    FORMAT,
                    name,
                    "OFF has no field for this slot",
                ));
            }
        }
    }

    let position = position.ok_or_else(|| {
        MeshError::incompatible(FORMAT, slot::POSITION, "OFF vertices need a position")
    })?;

    Ok(Layout {
        header,
        position,
        normal,
        color,
        texcoord,
    })
}

fn push_values(out: &mut String, value: &AttributeValue, precision: Option<usize>) {
    for c in value.as_slice() {
        out.push(' ');
        // Debug formatting keeps a decimal point, so integral colors are not
        // mistaken for 0-255 values on the way back in.
        let _ = match precision {
            Some(p) => write!(out, "{:.*}", p.max(1), c),
            None => write!(out, "{:?}", c),
        };
    }
}

fn count_edges(topology: &Topology) -> usize {
    let mut edges = HashSet::new();
    for face in topology.faces() {
        for i in 0..face.len() {
            let (a, b) = (face[i], face[(i + 1) % face.len()]);
            edges.insert(if a < b { (a, b) } else { (b, a) });
        }
    }
    edges.len()
}

fn serialize(mesh: &MeshContainer, options: &OffOptions) -> Result<String> {
    let layout = layout(mesh.schema())?;
    mesh.validate()?;

    let mut out = String::new();
    if let Some(comment) = &options.comment {
        for line in comment.lines() {
            let _ = writeln!(out, "# {line}");
        }
    }
    let _ = writeln!(out, "{}", layout.header.keyword());
    let edges = mesh.topology().map_or(0, count_edges);
    let _ = writeln!(out, "{} {} {}", mesh.num_vertices(), mesh.num_faces(), edges);

    for vertex in mesh.vertices() {
        let values = vertex.values();
        let mut line = String::new();
        push_values(&mut line, &values[layout.position], options.precision);
        for field in [layout.normal, layout.color, layout.texcoord].into_iter().flatten() {
            push_values(&mut line, &values[field], options.precision);
        }
        out.push_str(line.trim_start());
        out.push('\n');
    }

    if let Some(topology) = mesh.topology() {
        for face in topology.faces() {
            let _ = write!(out, "{}", face.len());
            for vi in face {
                let _ = write!(out, " {vi}");
            }
            out.push('\n');
        }
    }

    Ok(out)
}
