//! The canonical mesh container.

use nalgebra::Vector3;

use super::topology::Topology;
use crate::attribute::{
    slot, AttributeSchema, AttributeValue, ConverterRegistry, InterpolationRegistry,
};
use crate::error::{MeshError, Result};

/// One vertex: a value for every slot of the owning mesh's schema, in schema
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    values: Vec<AttributeValue>,
}

impl VertexRecord {
    /// Create a record from values in schema order.
    pub fn new(values: Vec<AttributeValue>) -> Self {
        Self { values }
    }

    /// Values in schema order.
    #[inline]
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Value of the slot at `index` in the schema.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.values.get(index)
    }
}

/// Format-agnostic mesh: an attribute schema, vertex records that follow it,
/// and optional face connectivity.
///
/// Every vertex has exactly the slots of the schema with exactly the declared
/// component counts. The mutating methods check this and never coerce.
///
/// # Example
///
/// ```
/// use meshmux::attribute::{slot, AttributeKind, AttributeSchema};
/// use meshmux::mesh::{MeshContainer, Topology};
/// use nalgebra::{Vector2, Vector3};
///
/// let schema = AttributeSchema::new()
///     .with(slot::POSITION, AttributeKind::Position, 3)
///     .with(slot::UV0, AttributeKind::TexCoord, 2);
///
/// let mut mesh = MeshContainer::new(schema);
/// for (p, uv) in [([0.0, 0.0, 0.0], [0.0, 0.0]), ([1.0, 0.0, 0.0], [1.0, 0.0]), ([0.0, 1.0, 0.0], [0.0, 1.0])] {
///     mesh.push_vertex_named(&[
///         (slot::POSITION, Vector3::from(p).into()),
///         (slot::UV0, Vector2::from(uv).into()),
///     ])
///     .unwrap();
/// }
/// mesh.set_topology(Topology::from_triangles(vec![0, 1, 2]).unwrap()).unwrap();
///
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshContainer {
    name: Option<String>,
    schema: AttributeSchema,
    vertices: Vec<VertexRecord>,
    topology: Option<Topology>,
}

impl MeshContainer {
    /// Create an empty mesh with the given schema.
    pub fn new(schema: AttributeSchema) -> Self {
        Self {
            name: None,
            schema,
            vertices: Vec::new(),
            topology: None,
        }
    }

    /// Create an empty mesh with room for `vertices` records.
    pub fn with_capacity(schema: AttributeSchema, vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            ..Self::new(schema)
        }
    }

    /// Mesh name, if the source format had one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the mesh name.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// The attribute schema.
    #[inline]
    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (0 for unindexed meshes).
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.topology.as_ref().map_or(0, Topology::num_faces)
    }

    /// Whether the mesh has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All vertex records.
    #[inline]
    pub fn vertices(&self) -> &[VertexRecord] {
        &self.vertices
    }

    /// Vertex record at `index`.
    pub fn vertex(&self, index: usize) -> Option<&VertexRecord> {
        self.vertices.get(index)
    }

    /// Face connectivity; `None` for an unindexed soup.
    #[inline]
    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    /// Whether the mesh has face connectivity.
    pub fn is_indexed(&self) -> bool {
        self.topology.is_some()
    }

    /// Value of `slot` at vertex `index`.
    pub fn attribute(&self, index: usize, slot: &str) -> Option<&AttributeValue> {
        let si = self.schema.index_of(slot)?;
        self.vertices.get(index)?.get(si)
    }

    /// Iterate over one slot across all vertices.
    pub fn slot_values<'a>(
        &'a self,
        slot: &str,
    ) -> Option<impl ExactSizeIterator<Item = &'a AttributeValue> + 'a> {
        let si = self.schema.index_of(slot)?;
        Some(self.vertices.iter().map(move |v| &v.values[si]))
    }

    /// Position of vertex `index` as a 3D point, if the mesh has a 3D
    /// position slot.
    pub fn position(&self, index: usize) -> Option<Vector3<f64>> {
        match self.attribute(index, slot::POSITION)? {
            AttributeValue::Vec3(p) => Some(*p),
            _ => None,
        }
    }

    fn check_record(&self, record: &VertexRecord) -> Result<()> {
        if record.values.len() != self.schema.len() {
            return Err(MeshError::schema_mismatch(format!(
                "vertex has {} values, schema declares {} slots",
                record.values.len(),
                self.schema.len()
            )));
        }
        for ((name, spec), value) in self.schema.iter().zip(&record.values) {
            if !spec.accepts(value) {
                return Err(MeshError::schema_mismatch(format!(
                    "slot '{name}' expects {} components, got {}",
                    spec.components,
                    value.components()
                )));
            }
        }
        Ok(())
    }

    /// Append a vertex whose values are in schema order.
    ///
    /// Returns the new vertex index.
    pub fn push_vertex(&mut self, record: VertexRecord) -> Result<usize> {
        self.check_record(&record)?;
        self.vertices.push(record);
        Ok(self.vertices.len() - 1)
    }

    /// Append a vertex from `(slot, value)` pairs in any order.
    pub fn push_vertex_named(&mut self, values: &[(&str, AttributeValue)]) -> Result<usize> {
        let mut ordered: Vec<Option<AttributeValue>> = vec![None; self.schema.len()];
        for (name, value) in values {
            let si = self.schema.index_of(name).ok_or_else(|| {
                MeshError::schema_mismatch(format!("slot '{name}' is not in the schema"))
            })?;
            if ordered[si].replace(*value).is_some() {
                return Err(MeshError::schema_mismatch(format!(
                    "slot '{name}' given twice"
                )));
            }
        }
        let values = ordered
            .into_iter()
            .zip(self.schema.names())
            .map(|(v, name)| {
                v.ok_or_else(|| MeshError::schema_mismatch(format!("slot '{name}' is missing")))
            })
            .collect::<Result<Vec<_>>>()?;
        self.push_vertex(VertexRecord::new(values))
    }

    /// Replace the face connectivity after checking every index.
    pub fn set_topology(&mut self, topology: Topology) -> Result<()> {
        topology.validate(self.vertices.len())?;
        self.topology = Some(topology);
        Ok(())
    }

    /// Drop the face connectivity, leaving an unindexed soup.
    pub fn clear_topology(&mut self) -> Option<Topology> {
        self.topology.take()
    }

    /// Check the schema/record invariant and index bounds for the whole mesh.
    pub fn validate(&self) -> Result<()> {
        for record in &self.vertices {
            self.check_record(record)?;
        }
        if let Some(topology) = &self.topology {
            topology.validate(self.vertices.len())?;
        }
        Ok(())
    }

    /// Reshape `slot` to `components` components on every vertex.
    ///
    /// Uses the converter registered for the exact source/target pair. If any
    /// value fails to convert the mesh is left untouched.
    pub fn convert_slot(
        &mut self,
        slot: &str,
        components: usize,
        converters: &ConverterRegistry,
    ) -> Result<()> {
        let si = self
            .schema
            .index_of(slot)
            .ok_or_else(|| MeshError::schema_mismatch(format!("slot '{slot}' is not in the schema")))?;

        let current = self.schema.iter().nth(si).map(|(_, s)| s.components);
        if current == Some(components) {
            return Ok(());
        }

        let converted = self
            .vertices
            .iter()
            .map(|v| converters.convert_value(&v.values[si], components))
            .collect::<Result<Vec<_>>>()?;

        for (record, value) in self.vertices.iter_mut().zip(converted) {
            record.values[si] = value;
        }
        if let Some(spec) = self.schema.spec_at_mut(si) {
            spec.components = components;
        }
        log::debug!("converted slot '{}' to {} components", slot, components);
        Ok(())
    }

    /// Build a new record between vertices `a` and `b`, interpolating every
    /// slot by `amount`.
    pub fn interpolate_vertex(
        &self,
        a: usize,
        b: usize,
        amount: f64,
        interpolation: &InterpolationRegistry,
    ) -> Result<VertexRecord> {
        let va = self
            .vertex(a)
            .ok_or_else(|| MeshError::invalid_param("a", a, "vertex index out of range"))?;
        let vb = self
            .vertex(b)
            .ok_or_else(|| MeshError::invalid_param("b", b, "vertex index out of range"))?;
        Ok(lerp_records(va, vb, amount, interpolation))
    }

    pub(crate) fn from_parts(
        name: Option<String>,
        schema: AttributeSchema,
        vertices: Vec<VertexRecord>,
        topology: Option<Topology>,
    ) -> Self {
        Self {
            name,
            schema,
            vertices,
            topology,
        }
    }
}

pub(crate) fn lerp_records(
    a: &VertexRecord,
    b: &VertexRecord,
    amount: f64,
    interpolation: &InterpolationRegistry,
) -> VertexRecord {
    VertexRecord::new(
        a.values
            .iter()
            .zip(&b.values)
            .map(|(x, y)| interpolation.lerp_value(x, y, amount))
            .collect(),
    )
}
