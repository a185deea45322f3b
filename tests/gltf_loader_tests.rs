use std::path::PathBuf;

use glam::Vec3;
use rover_drive::error::AssetError;
use rover_drive::loaders::{load_model, load_model_async, WHEEL_PATTERN};

/// One red triangle instanced by three nodes under a translated root
const ROVER_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "Rover", "translation": [0.0, 1.0, 0.0], "children": [1, 2, 3, 4] },
    { "name": "Body", "mesh": 0 },
    { "name": "WHEEL_FL", "mesh": 0, "translation": [1.0, 0.0, 2.0] },
    { "name": "WHEEL_FR", "mesh": 0, "translation": [1.0, 0.0, -2.0] },
    { "name": "Mast" }
  ],
  "meshes": [{
    "name": "Tri",
    "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
  }],
  "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } }],
  "accessors": [
    {
      "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
    },
    { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
  ],
  "buffers": [{
    "byteLength": 44,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
  }]
}"#;

/// One Draco-compressed triangle: sequential encoding, raw connectivity,
/// a single float POSITION attribute
const DRACO_TRIANGLE: &str = "data:application/octet-stream;base64,RFJBQ08CAgEAAAABAwEAAQIBAQAJAwAAAAAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAA==";

/// Same length, but not a Draco stream
const DRACO_GARBAGE: &str =
    "data:application/octet-stream;base64,Tk9URFJBQ08AAAAAAAAAAAAAAAAAAAAAAAAAAA==";

const DRACO_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "extensionsUsed": ["KHR_draco_mesh_compression"],
  "extensionsRequired": ["KHR_draco_mesh_compression"],
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "Hull", "mesh": 0, "translation": [0.0, 2.0, 0.0] }],
  "meshes": [{
    "name": "HullMesh",
    "primitives": [{
      "attributes": { "POSITION": 0 },
      "indices": 1,
      "extensions": {
        "KHR_draco_mesh_compression": { "bufferView": 0, "attributes": { "POSITION": 0 } }
      }
    }]
  }],
  "accessors": [
    {
      "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
    },
    { "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": BYTE_LENGTH }],
  "buffers": [{ "byteLength": BYTE_LENGTH, "uri": "BUFFER_URI" }]
}"#;

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "rover-drive-gltf-{}-{}",
        name,
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write the fixture into a fresh temp directory and return its path
fn write_fixture(name: &str) -> PathBuf {
    let path = fixture_dir(name).join("rover.gltf");
    std::fs::write(&path, ROVER_GLTF).unwrap();
    path
}

fn write_draco_fixture(name: &str, uri: &str, byte_length: usize) -> PathBuf {
    let path = fixture_dir(name).join("hull.gltf");
    let json = DRACO_GLTF
        .replace("BYTE_LENGTH", &byte_length.to_string())
        .replace("BUFFER_URI", uri);
    std::fs::write(&path, json).unwrap();
    path
}

#[cfg(test)]
mod gltf_loader_tests {
    use super::*;

    #[test]
    fn test_loads_geometry_from_every_mesh_node() {
        let model = load_model(write_fixture("geometry")).unwrap();

        assert_eq!(model.mesh.triangle_count(), 3);
        assert_eq!(model.mesh.vertices.len(), 9);
        for vertex in &model.mesh.vertices {
            assert_eq!(vertex.color, [1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_node_transforms_are_applied() {
        let model = load_model(write_fixture("transforms")).unwrap();

        // Vertex order follows node order: Body, WHEEL_FL, WHEEL_FR
        let first_wheel_vertex = Vec3::from_array(model.mesh.vertices[3].position);
        assert!((first_wheel_vertex - Vec3::new(1.0, 1.0, 2.0)).length() < 1e-6);

        let body_vertex = Vec3::from_array(model.mesh.vertices[1].position);
        assert!((body_vertex - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_parts_registered_in_document_order() {
        let model = load_model(write_fixture("parts")).unwrap();

        let names: Vec<&str> = model.parts.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Rover", "Body", "WHEEL_FL", "WHEEL_FR", "Mast"]);

        let wheels: Vec<&str> = model
            .parts
            .group(WHEEL_PATTERN)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(wheels, vec!["WHEEL_FL", "WHEEL_FR"]);

        let wheel = model.parts.get("WHEEL_FR").unwrap();
        let origin = wheel.transform.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 1.0, -2.0)).length() < 1e-6);
    }

    #[test]
    fn test_lookup_is_case_sensitive_and_lenient() {
        let model = load_model(write_fixture("lookup")).unwrap();

        assert!(model.parts.matching("wheel").is_empty());
        assert!(model.parts.matching("TURRET").is_empty());
        assert_eq!(model.parts.require("WHEEL").unwrap().len(), 2);
        assert!(matches!(
            model.parts.require("TURRET"),
            Err(AssetError::MissingPart { .. })
        ));
    }

    #[test]
    fn test_async_load_matches_sync_load() {
        let path = write_fixture("async");
        let sync = load_model(&path).unwrap();
        let loaded = pollster::block_on(load_model_async(path)).unwrap();

        assert_eq!(loaded.mesh.vertices, sync.mesh.vertices);
        assert_eq!(loaded.mesh.indices, sync.mesh.indices);
        assert_eq!(loaded.parts.len(), sync.parts.len());
    }

    #[test]
    fn test_async_missing_file_is_import_error() {
        let result = pollster::block_on(load_model_async("does/not/exist.glb"));
        assert!(matches!(result, Err(AssetError::Import { .. })));
    }

    #[test]
    fn test_invalid_document_is_import_error() {
        let dir = write_fixture("invalid");
        let path = dir.with_file_name("broken.gltf");
        std::fs::write(&path, "{ not gltf").unwrap();

        assert!(matches!(load_model(&path), Err(AssetError::Import { .. })));
    }

    #[test]
    fn test_draco_primitive_is_decoded() {
        let path = write_draco_fixture("draco", DRACO_TRIANGLE, 61);
        let model = load_model(&path).unwrap();

        assert_eq!(model.mesh.triangle_count(), 1);
        assert_eq!(model.mesh.indices, vec![0, 1, 2]);
        let corner = Vec3::from_array(model.mesh.vertices[1].position);
        assert!((corner - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
        assert!(model.parts.get("Hull").is_some());
    }

    #[test]
    fn test_corrupt_draco_stream_is_draco_error() {
        let path = write_draco_fixture("draco-corrupt", DRACO_GARBAGE, 28);

        match load_model(&path) {
            Err(AssetError::Draco { mesh, .. }) => assert_eq!(mesh, "HullMesh"),
            other => panic!("expected Draco error, got {:?}", other.map(|_| ())),
        }
    }
}
