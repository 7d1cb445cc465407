//! Example: build a small mesh dataset and dump it

use cgtree::value::foreign::{export_foreign, import_foreign};
use cgtree::value::ImportMode;
use cgtree::{Criterion, FormatOptions, NodeValue, Tree};

fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG=debug shows ownership events)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut base = Tree::new("Base", "CGNSBase_t", NodeValue::from_vec(vec![3i32, 3]));
    let zone = base.emplace_child(Tree::new(
        "Zone",
        "Zone_t",
        NodeValue::from_literal(vec![vec![27i32, 8, 0]])?,
    ));
    zone.emplace_child(Tree::new("ZoneType", "ZoneType_t", "Unstructured"));
    let coords = zone.emplace_child(Tree::labeled("GridCoordinates", "GridCoordinates_t"));
    for axis in ["CoordinateX", "CoordinateY", "CoordinateZ"] {
        let values: Vec<f64> = (0..27).map(|i| (i % 3) as f64).collect();
        coords.emplace_child(Tree::new(axis, "DataArray_t", NodeValue::from_array([3, 3, 3], values)?));
    }

    println!("{}", base);
    println!("{}", cgtree::to_string_with(&base, &FormatOptions::with_threshold(100)));

    // Hand a coordinate array to a host runtime and take it back as a view.
    let coord_x = base
        .get_child_mut(&Criterion::Path("Zone/GridCoordinates/CoordinateX"))?
        .set_value(NodeValue::empty());
    let exported = export_foreign(coord_x)?;
    let view = unsafe { import_foreign(&exported.array, ImportMode::View)? };
    println!("host sees {} array of shape {:?}", exported.array.type_code, exported.array.shape);
    println!("view owns its memory: {}", view.is_owner());
    drop(view);
    if let Some(capsule) = exported.capsule {
        capsule.finalize();
    }

    Ok(())
}
