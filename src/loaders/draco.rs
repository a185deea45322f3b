//! Decoding of `KHR_draco_mesh_compression` primitives.
//!
//! The native decoder writes the index list first (u16 when the count fits,
//! u32 otherwise), then each attribute in draco attribute id order as tightly
//! packed little-endian components.

use anyhow::Context;
use draco_decoder::{decode_mesh, AttributeDataType, MeshDecodeConfig};
use gltf::accessor::DataType;
use gltf::mesh::Semantic;

use super::gltf::PrimitiveGeometry;
use crate::error::AssetError;

pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// What the loader keeps from a decoded attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Position,
    Normal,
    Other,
}

/// One attribute in the decoder's output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSlot {
    pub kind: SlotKind,
    pub dimensions: usize,
    pub component_size: usize,
    pub is_float: bool,
}

/// Shape of the decoder's output for one primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLayout {
    pub vertex_count: usize,
    pub index_count: usize,
    pub attributes: Vec<AttributeSlot>,
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], String> {
        let end = self.offset + len;
        let slice = self.bytes.get(self.offset..end).ok_or_else(|| {
            format!(
                "decoded stream ends at byte {} while reading {} ({} bytes needed)",
                self.bytes.len(),
                what,
                end
            )
        })?;
        self.offset = end;
        Ok(slice)
    }
}

fn read_vec3(slice: &[u8], dimensions: usize, fill: f32) -> Vec<[f32; 3]> {
    slice
        .chunks_exact(4 * dimensions)
        .map(|c| {
            let component = |i: usize| {
                if i < dimensions {
                    f32::from_le_bytes([c[4 * i], c[4 * i + 1], c[4 * i + 2], c[4 * i + 3]])
                } else {
                    fill
                }
            };
            [component(0), component(1), component(2)]
        })
        .collect()
}

impl DecodedLayout {
    /// Split the decoder's output into positions, normals and indices
    pub fn parse(&self, bytes: &[u8]) -> Result<PrimitiveGeometry, String> {
        let mut cursor = ByteCursor { bytes, offset: 0 };

        let indices = if self.index_count == 0 {
            None
        } else if self.index_count <= u16::MAX as usize {
            let raw = cursor.take(self.index_count * 2, "indices")?;
            Some(
                raw.chunks_exact(2)
                    .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
                    .collect(),
            )
        } else {
            let raw = cursor.take(self.index_count * 4, "indices")?;
            Some(
                raw.chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            )
        };

        let mut positions = None;
        let mut normals = None;
        for slot in &self.attributes {
            let len = slot.dimensions * self.vertex_count * slot.component_size;
            let raw = cursor.take(len, "attribute")?;
            match slot.kind {
                SlotKind::Position if slot.is_float => {
                    positions = Some(read_vec3(raw, slot.dimensions, 0.0))
                }
                SlotKind::Position => return Err("POSITION is not float data".to_string()),
                SlotKind::Normal if slot.is_float => {
                    normals = Some(read_vec3(raw, slot.dimensions, 1.0))
                }
                _ => {}
            }
        }

        let positions = positions.ok_or_else(|| "stream has no POSITION attribute".to_string())?;
        Ok(PrimitiveGeometry {
            positions,
            normals,
            indices,
        })
    }
}

fn semantic_from_name(name: &str) -> Option<Semantic> {
    let set = |prefix: &str| name.strip_prefix(prefix).and_then(|n| n.parse().ok());
    match name {
        "POSITION" => Some(Semantic::Positions),
        "NORMAL" => Some(Semantic::Normals),
        "TANGENT" => Some(Semantic::Tangents),
        _ => set("TEXCOORD_")
            .map(Semantic::TexCoords)
            .or_else(|| set("COLOR_").map(Semantic::Colors))
            .or_else(|| set("JOINTS_").map(Semantic::Joints))
            .or_else(|| set("WEIGHTS_").map(Semantic::Weights)),
    }
}

fn attribute_type(data_type: DataType) -> AttributeDataType {
    match data_type {
        DataType::I8 => AttributeDataType::Int8,
        DataType::U8 => AttributeDataType::UInt8,
        DataType::I16 => AttributeDataType::Int16,
        DataType::U16 => AttributeDataType::UInt16,
        DataType::U32 => AttributeDataType::UInt32,
        DataType::F32 => AttributeDataType::Float32,
    }
}

/// Decode a compressed primitive into model-space geometry
pub fn decode_primitive(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    primitive: &gltf::mesh::Primitive,
    mesh: &str,
) -> Result<PrimitiveGeometry, AssetError> {
    let fail = |reason: String| AssetError::Draco {
        mesh: mesh.to_string(),
        reason,
    };

    let extension = primitive
        .extension_value(DRACO_EXTENSION)
        .ok_or_else(|| fail(format!("primitive has no {} extension", DRACO_EXTENSION)))?;
    let view_index = extension
        .get("bufferView")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| fail("extension has no bufferView".to_string()))? as usize;
    let attribute_ids = extension
        .get("attributes")
        .and_then(|v| v.as_object())
        .ok_or_else(|| fail("extension has no attributes".to_string()))?;

    let view = document
        .views()
        .nth(view_index)
        .ok_or_else(|| fail(format!("bufferView {} out of range", view_index)))?;
    let compressed = buffers
        .get(view.buffer().index())
        .and_then(|data| data.get(view.offset()..view.offset() + view.length()))
        .ok_or_else(|| fail(format!("bufferView {} exceeds its buffer", view_index)))?;

    let vertex_count = primitive
        .get(&Semantic::Positions)
        .map(|accessor| accessor.count())
        .ok_or_else(|| fail("primitive has no POSITION accessor".to_string()))?;
    let index_count = primitive.indices().map(|a| a.count()).unwrap_or(0);

    let mut ordered = Vec::with_capacity(attribute_ids.len());
    for (name, id) in attribute_ids {
        let id = id
            .as_u64()
            .ok_or_else(|| fail(format!("attribute {} has no numeric id", name)))?;
        let semantic = semantic_from_name(name)
            .ok_or_else(|| fail(format!("unknown attribute {}", name)))?;
        let accessor = primitive
            .get(&semantic)
            .ok_or_else(|| fail(format!("no accessor for attribute {}", name)))?;
        let kind = match semantic {
            Semantic::Positions => SlotKind::Position,
            Semantic::Normals => SlotKind::Normal,
            _ => SlotKind::Other,
        };
        ordered.push((id, kind, accessor.dimensions().multiplicity(), accessor.data_type()));
    }
    ordered.sort_by_key(|(id, ..)| *id);

    let mut config = MeshDecodeConfig::new(vertex_count as u32, index_count as u32);
    let mut attributes = Vec::with_capacity(ordered.len());
    for (_, kind, dimensions, data_type) in ordered {
        let ty = attribute_type(data_type);
        attributes.push(AttributeSlot {
            kind,
            dimensions,
            component_size: ty.size_in_bytes(),
            is_float: data_type == DataType::F32,
        });
        config.add_attribute(dimensions as u32, ty);
    }

    let decoded = pollster::block_on(decode_mesh(compressed, &config))
        .context("decoder rejected the stream")
        .map_err(|e| fail(format!("{:#}", e)))?;

    let layout = DecodedLayout {
        vertex_count,
        index_count,
        attributes,
    };
    log::debug!(
        "Decoded Draco primitive in {:?}: {} vertices, {} indices",
        mesh,
        vertex_count,
        index_count
    );
    layout.parse(&decoded).map_err(fail)
}
