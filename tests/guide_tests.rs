//! Integration tests for guide generation against USDA files on disk.

use std::fs;
use std::path::PathBuf;

use autoguide::core::TimeCode;
use autoguide::geom::{NodeKind, Purpose, VisibilityPolicy};
use autoguide::guide::{
    generate_guide, BoundsResolver, ExtentNormalization, GuideConfig, FACE_VERTEX_COUNTS, FACE_VERTEX_INDICES,
};
use autoguide::scene::{FileStore, SceneStore, Stage};
use autoguide::usda;
use autoguide::util::{DVec3, Error};

use tempfile::tempdir;

fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "data", name].iter().collect();
    path.to_string_lossy().into_owned()
}

fn open_fixture() -> Stage {
    FileStore::new().open(&fixture("geo.usda")).expect("Failed to open fixture")
}

fn world_extent(config: &GuideConfig) -> [[f64; 3]; 2] {
    let stage = open_fixture();
    let mut resolver = BoundsResolver::from_config(config);
    resolver
        .compute_world_extent(&stage, "/asset")
        .expect("Failed to compute extent")
        .to_array()
}

#[test]
fn test_fixture_default_bound() {
    // body mesh, hidden lamp and the instanced tire count; the proxy does not
    let extent = world_extent(&GuideConfig::default());
    assert_eq!(extent, [[-1.125, 0.5, -1.0], [3.5, 3.0, 2.0]]);
}

#[test]
fn test_fixture_respect_visibility() {
    let config = GuideConfig { visibility: VisibilityPolicy::Respect, ..Default::default() };
    assert_eq!(world_extent(&config), [[-1.125, 0.5, -1.0], [1.0, 3.0, 2.0]]);
}

#[test]
fn test_fixture_with_proxy_purpose() {
    let config = GuideConfig {
        included_purposes: vec![Purpose::Default, Purpose::Render, Purpose::Proxy],
        ..Default::default()
    };
    assert_eq!(world_extent(&config), [[-50.0, -49.0, -50.0], [50.0, 51.0, 50.0]]);
}

#[test]
fn test_fixture_subtree_bound() {
    let stage = open_fixture();
    let mut resolver = BoundsResolver::default();
    // the instance's own translate overrides the prototype's
    let wheel = resolver.compute_world_extent(&stage, "/asset/wheel_fl").unwrap();
    assert_eq!(wheel.to_array(), [[-1.125, 0.5, 1.0], [-0.875, 1.5, 2.0]]);

    let err = resolver.compute_world_extent(&stage, "/asset/looks").unwrap_err();
    assert!(matches!(err.root_cause(), Error::EmptyBound(_)), "{err}");
}

#[test]
fn test_generate_guide_matches_golden_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let target = dir.path().join("guide.usda");
    let target = target.to_string_lossy();

    let store = FileStore::new();
    let report = generate_guide(&store, &fixture("geo.usda"), &target, &GuideConfig::default())
        .expect("Failed to generate guide");
    assert_eq!(report.asset, "/asset");
    assert_eq!(report.mesh, "/asset/model/guide/box");
    assert_eq!(report.points.len(), 8);

    let written = fs::read_to_string(&*target).unwrap();
    let golden = fs::read_to_string(fixture("guide.usda")).unwrap();
    assert_eq!(written, golden);
}

#[test]
fn test_generated_guide_reads_back() {
    let dir = tempdir().unwrap();
    let store = FileStore::with_root(dir.path());
    let report = generate_guide(&store, &fixture("geo.usda"), "guide.usda", &GuideConfig::default()).unwrap();

    let guide = store.open("guide.usda").expect("Failed to reopen guide");
    let mesh = guide.resolve("/asset/model/guide/box").unwrap();
    assert_eq!(guide.node(mesh).unwrap().kind(), &NodeKind::Mesh);
    assert_eq!(guide.default_node(), guide.resolve("/asset").ok());

    let get = |name: &str| guide.attribute(mesh, name).and_then(|a| a.get(TimeCode::Default)).unwrap();
    let counts: Vec<i64> = FACE_VERTEX_COUNTS.iter().map(|&c| c.into()).collect();
    let indices: Vec<i64> = FACE_VERTEX_INDICES.iter().map(|&i| i.into()).collect();
    assert_eq!(get("faceVertexCounts").as_int_array(), Some(&counts[..]));
    assert_eq!(get("faceVertexIndices").as_int_array(), Some(&indices[..]));
    assert_eq!(get("points").as_vec3_array(), Some(&report.points[..]));
    assert_eq!(get("extent").as_vec3_array(), Some(&[report.extent.min, report.extent.max][..]));

    // a guide's own bound is the box it describes
    let mut resolver = BoundsResolver::default();
    let again = resolver.compute_world_extent(&guide, "/asset").unwrap();
    assert_eq!(again, report.extent);
}

#[test]
fn test_regenerating_is_stable() {
    let dir = tempdir().unwrap();
    let store = FileStore::with_root(dir.path());
    let source = fixture("geo.usda");

    generate_guide(&store, &source, "guide.usda", &GuideConfig::default()).unwrap();
    let first = fs::read_to_string(dir.path().join("guide.usda")).unwrap();
    generate_guide(&store, &source, "guide.usda", &GuideConfig::default()).unwrap();
    let second = fs::read_to_string(dir.path().join("guide.usda")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_source_file_is_untouched() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("geo.usda");
    fs::copy(fixture("geo.usda"), &source).unwrap();
    let before = fs::read_to_string(&source).unwrap();

    let store = FileStore::with_root(dir.path());
    generate_guide(&store, "geo.usda", "geo_guide.usda", &GuideConfig::default()).unwrap();
    assert_eq!(fs::read_to_string(&source).unwrap(), before);
    assert!(dir.path().join("geo_guide.usda").is_file());
}

#[test]
fn test_missing_source_writes_nothing() {
    let dir = tempdir().unwrap();
    let store = FileStore::with_root(dir.path());
    let err = generate_guide(&store, "missing.usda", "guide.usda", &GuideConfig::default()).unwrap_err();
    assert!(matches!(err, Error::SourceNotFound(ref p) if p == "missing.usda"));
    assert!(!dir.path().join("guide.usda").exists());
}

#[test]
fn test_unparsable_source_is_wrapped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.usda"), "#usda 1.0\ndef Xform \"asset\" {\n").unwrap();
    let store = FileStore::with_root(dir.path());
    let err = generate_guide(&store, "bad.usda", "guide.usda", &GuideConfig::default()).unwrap_err();
    assert!(matches!(err, Error::GuideGeneration { .. }));
    assert!(matches!(err.root_cause(), Error::Parse { .. }), "{err}");
    assert!(!dir.path().join("guide.usda").exists());
}

#[test]
fn test_missing_target_directory_fails() {
    let dir = tempdir().unwrap();
    let store = FileStore::with_root(dir.path());
    let err = generate_guide(&store, &fixture("geo.usda"), "no/such/dir/guide.usda", &GuideConfig::default())
        .unwrap_err();
    assert!(matches!(err.root_cause(), Error::Io(_)), "{err}");
}

#[test]
fn test_scenario_corner_order() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("geo.usda"),
        r#"#usda 1.0
(
    defaultPrim = "asset"
)

def Xform "asset"
{
    def Mesh "geo"
    {
        point3f[] points = [(-1, -2, -3), (4, 5, 6)]
    }
}
"#,
    )
    .unwrap();
    let store = FileStore::with_root(dir.path());
    let report = generate_guide(&store, "geo.usda", "guide.usda", &GuideConfig::default()).unwrap();

    let expected = [
        DVec3::new(4.0, -2.0, 6.0),
        DVec3::new(-1.0, -2.0, 6.0),
        DVec3::new(4.0, 5.0, 6.0),
        DVec3::new(-1.0, 5.0, 6.0),
        DVec3::new(-1.0, -2.0, -3.0),
        DVec3::new(4.0, -2.0, -3.0),
        DVec3::new(-1.0, 5.0, -3.0),
        DVec3::new(4.0, 5.0, -3.0),
    ];
    assert_eq!(report.points, expected);
}

#[test]
fn test_legacy_normalization_end_to_end() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("tiny.usda"),
        r#"#usda 1.0
(
    defaultPrim = "asset"
)

def Xform "asset"
{
    def Mesh "geo"
    {
        point3d[] points = [(-2e-5, 0, 0), (3e-5, 1, 1)]
    }
}
"#,
    )
    .unwrap();
    let store = FileStore::with_root(dir.path());

    let exact = generate_guide(&store, "tiny.usda", "exact.usda", &GuideConfig::default()).unwrap();
    assert_eq!(exact.extent.min.x, -2e-5);

    let config = GuideConfig { normalization: ExtentNormalization::LegacyMantissa, ..Default::default() };
    let legacy = generate_guide(&store, "tiny.usda", "legacy.usda", &config).unwrap();
    assert_eq!(legacy.extent.to_array(), [[-2.0, 0.0, 0.0], [3.0, 1.0, 1.0]]);
}

#[test]
fn test_time_sampled_source() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("anim.usda"),
        r#"#usda 1.0
(
    defaultPrim = "asset"
)

def Xform "asset"
{
    def Cube "cube"
    {
        double3 xformOp:translate.timeSamples = {
            1: (0, 0, 0),
            11: (10, 0, 0),
        }
        uniform token[] xformOpOrder = ["xformOp:translate"]
    }
}
"#,
    )
    .unwrap();
    let store = FileStore::with_root(dir.path());

    // samples are held until the next one
    let config = GuideConfig { time: Some(6.0), ..Default::default() };
    let report = generate_guide(&store, "anim.usda", "guide.usda", &config).unwrap();
    assert_eq!(report.extent.to_array(), [[-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]]);

    let config = GuideConfig { time: Some(12.0), ..Default::default() };
    let report = generate_guide(&store, "anim.usda", "guide.usda", &config).unwrap();
    assert_eq!(report.extent.to_array(), [[9.0, -1.0, -1.0], [11.0, 1.0, 1.0]]);
}

#[test]
fn test_references_compose_prototype_opinions() {
    let gprim = r#"#usda 1.0
def Xform "asset"
{
    def "inst" (
        prepend references = </protos/box>
    )
    {
    }
}

class "protos"
{
    def Mesh "box"
    {
        point3f[] points = [(0, 0, 0), (1, 1, 1)]
    }
}
"#;
    let stage = usda::read(gprim, "gprim.usda").unwrap();
    let extent = BoundsResolver::default().compute_world_extent(&stage, "/asset").unwrap();
    assert_eq!(extent.to_array(), [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);

    let placed = r#"#usda 1.0
def Xform "asset"
{
    def Xform "inst" (
        references = </protos/wheel>
    )
    {
    }
}

class "protos"
{
    def Xform "wheel"
    {
        double3 xformOp:translate = (100, 0, 0)
        uniform token[] xformOpOrder = ["xformOp:translate"]

        def Cube "cube"
        {
        }
    }
}
"#;
    let stage = usda::read(placed, "placed.usda").unwrap();
    let extent = BoundsResolver::default().compute_world_extent(&stage, "/asset").unwrap();
    assert_eq!(extent.to_array(), [[99.0, -1.0, -1.0], [101.0, 1.0, 1.0]]);
}

#[test]
fn test_orient_and_euler_ops_from_file() {
    let text = r#"#usda 1.0
def Xform "asset"
{
    def Cube "a"
    {
        quatf xformOp:orient = (1, 0, 0, 0)
        float3 xformOp:rotateZYX = (0, 0, 0)
        double3 xformOp:translate = (5, 0, 0)
        uniform token[] xformOpOrder = ["xformOp:translate", "xformOp:orient", "xformOp:rotateZYX"]
    }
}
"#;
    let stage = usda::read(text, "ops.usda").unwrap();
    let extent = BoundsResolver::default().compute_world_extent(&stage, "/asset").unwrap();
    assert_eq!(extent.to_array(), [[4.0, -1.0, -1.0], [6.0, 1.0, 1.0]]);
}
