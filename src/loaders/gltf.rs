use std::future::Future;
use std::path::{Path, PathBuf};

use futures::channel::oneshot;
use glam::{Mat3, Mat4, Vec3};

use super::draco::{self, DRACO_EXTENSION};
use super::parts::{Part, PartRegistry};
use crate::error::AssetError;
use crate::types::{MeshData, Vertex};

const DEFAULT_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Parts looked up by the vehicle after loading
pub const WHEEL_PATTERN: &str = "WHEEL";

/// Loaded model: flattened geometry plus its named parts
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub mesh: MeshData,
    pub parts: PartRegistry,
}

impl ModelAsset {
    /// Built-in stand-in rover: a body box and four `WHEEL_*` boxes
    pub fn placeholder() -> Self {
        let mut mesh = MeshData::default();
        mesh.push_box([-0.8, 0.25, -0.5], [0.8, 0.65, 0.5], [0.85, 0.85, 0.8]);
        mesh.push_box([-0.2, 0.65, -0.15], [0.1, 1.05, 0.15], [0.6, 0.6, 0.65]);

        let wheel_centers = [
            ("WHEEL_FL", Vec3::new(-0.6, 0.25, -0.6)),
            ("WHEEL_FR", Vec3::new(-0.6, 0.25, 0.6)),
            ("WHEEL_RL", Vec3::new(0.6, 0.25, -0.6)),
            ("WHEEL_RR", Vec3::new(0.6, 0.25, 0.6)),
        ];

        let mut parts = vec![Part {
            name: "BODY".to_string(),
            node: 0,
            transform: Mat4::IDENTITY,
        }];
        for (i, (name, center)) in wheel_centers.iter().enumerate() {
            let half = Vec3::new(0.25, 0.25, 0.1);
            mesh.push_box(
                (*center - half).to_array(),
                (*center + half).to_array(),
                [0.15, 0.15, 0.15],
            );
            parts.push(Part {
                name: name.to_string(),
                node: i + 1,
                transform: Mat4::from_translation(*center),
            });
        }

        let mut registry = PartRegistry::new(parts);
        registry.register_group(WHEEL_PATTERN);
        Self {
            mesh,
            parts: registry,
        }
    }
}

/// Vertex data of one triangle primitive before node transforms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    /// `None` for non-indexed primitives
    pub indices: Option<Vec<u32>>,
}

/// Imports the document and its buffers.
///
/// The importer refuses documents that list Draco under `extensionsRequired`,
/// so those are re-read without validation and decoded here instead.
fn import(path: &Path) -> Result<(gltf::Document, Vec<gltf::buffer::Data>), AssetError> {
    let import_error = |source| AssetError::Import {
        path: path.to_path_buf(),
        source,
    };

    let validation = match gltf::import(path) {
        Ok((document, buffers, _images)) => return Ok((document, buffers)),
        Err(err @ gltf::Error::Validation(_)) => err,
        Err(err) => return Err(import_error(err)),
    };

    let bytes = std::fs::read(path).map_err(|e| import_error(gltf::Error::Io(e)))?;
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice_without_validation(&bytes).map_err(import_error)?;
    if !document.extensions_required().any(|ext| ext == DRACO_EXTENSION) {
        return Err(import_error(validation));
    }

    log::debug!("{:?} requires {}, importing unvalidated", path, DRACO_EXTENSION);
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(import_error)?;
    Ok((document, buffers))
}

/// Loads a glTF/GLB file into a [`ModelAsset`]
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelAsset, AssetError> {
    let path = path.as_ref();
    log::info!("Loading model: {:?}", path);

    let (document, buffers) = import(path)?;

    let mut mesh = MeshData::default();
    let mut parts = Vec::new();

    let scene = document.default_scene().or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            process_node(&node, &document, &buffers, Mat4::IDENTITY, &mut mesh, &mut parts)?;
        }
    }

    if mesh.is_empty() {
        log::warn!("No geometry found in {:?}", path);
    }

    let mut registry = PartRegistry::new(parts);
    let wheels = registry.register_group(WHEEL_PATTERN);
    log::info!(
        "Model loaded: {} triangles, {} named parts, {} wheels",
        mesh.triangle_count(),
        registry.len(),
        wheels
    );

    Ok(ModelAsset {
        mesh,
        parts: registry,
    })
}

/// Loads a model on a worker thread.
///
/// Decoding happens off the calling thread; the returned future resolves
/// once the worker finishes.
pub fn load_model_async(
    path: impl Into<PathBuf>,
) -> impl Future<Output = Result<ModelAsset, AssetError>> {
    spawn_loader(std::thread::Builder::new().name("asset-loader".to_string()), path.into())
}

fn spawn_loader(
    builder: std::thread::Builder,
    path: PathBuf,
) -> impl Future<Output = Result<ModelAsset, AssetError>> {
    let (sender, receiver) = oneshot::channel();

    let spawned = builder.spawn(move || {
        // Receiver may be gone if the caller dropped the future
        sender.send(load_model(&path)).ok();
    });
    let spawn_error = spawned.err().map(|e| {
        log::error!("Failed to spawn asset loader: {}", e);
        AssetError::Spawn(e)
    });

    async move {
        if let Some(e) = spawn_error {
            return Err(e);
        }
        receiver.await.map_err(|_| AssetError::Worker)?
    }
}

/// Recursively collects geometry and named parts
fn process_node(
    node: &gltf::Node,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    parent_transform: Mat4,
    mesh: &mut MeshData,
    parts: &mut Vec<Part>,
) -> Result<(), AssetError> {
    let local_transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let global_transform = parent_transform * local_transform;

    let name = node
        .name()
        .or_else(|| node.mesh().and_then(|m| m.name()))
        .filter(|n| !n.is_empty());
    if let Some(name) = name {
        parts.push(Part {
            name: name.to_string(),
            node: node.index(),
            transform: global_transform,
        });
    }

    if let Some(node_mesh) = node.mesh() {
        process_mesh(&node_mesh, document, buffers, global_transform, mesh)?;
    }

    for child in node.children() {
        process_node(&child, document, buffers, global_transform, mesh, parts)?;
    }

    Ok(())
}

fn process_mesh(
    gltf_mesh: &gltf::Mesh,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    transform: Mat4,
    out: &mut MeshData,
) -> Result<(), AssetError> {
    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();

    for primitive in gltf_mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("Skipping non-triangle primitive in {:?}", gltf_mesh.name());
            continue;
        }

        let geometry = if primitive.extension_value(DRACO_EXTENSION).is_some() {
            let name = gltf_mesh.name().unwrap_or("unnamed");
            draco::decode_primitive(document, buffers, &primitive, name)?
        } else {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
            let Some(positions) = reader.read_positions() else {
                log::warn!("Primitive without positions in {:?}", gltf_mesh.name());
                continue;
            };
            PrimitiveGeometry {
                positions: positions.collect(),
                normals: reader.read_normals().map(|n| n.collect()),
                indices: reader.read_indices().map(|i| i.into_u32().collect()),
            }
        };

        let positions: Vec<Vec3> = geometry
            .positions
            .iter()
            .map(|&p| transform.transform_point3(Vec3::from_array(p)))
            .collect();
        let normals: Vec<Vec3> = match &geometry.normals {
            Some(normals) => normals
                .iter()
                .map(|&n| (normal_matrix * Vec3::from_array(n)).normalize_or_zero())
                .collect(),
            None => vec![Vec3::Y; positions.len()],
        };

        let base_color = primitive.material().pbr_metallic_roughness().base_color_factor();
        let color = if primitive.material().index().is_some() {
            [base_color[0], base_color[1], base_color[2]]
        } else {
            DEFAULT_COLOR
        };

        let base = out.vertices.len() as u32;
        out.vertices.extend(
            positions
                .iter()
                .zip(normals.iter())
                .map(|(p, n)| Vertex::new(p.to_array(), n.to_array(), color)),
        );

        match &geometry.indices {
            Some(indices) => {
                let count = positions.len() as u32;
                for triangle in indices.chunks_exact(3) {
                    if triangle.iter().all(|&i| i < count) {
                        out.indices.extend(triangle.iter().map(|&i| base + i));
                    }
                }
            }
            None => {
                let whole = positions.len() - positions.len() % 3;
                out.indices.extend((0..whole as u32).map(|i| base + i));
            }
        }
    }

    Ok(())
}
