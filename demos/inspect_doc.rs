//! Saves a nested collection to a temporary file and prints its structural
//! report.

use rescode::{CodecRegistry, FrozenMap, Rescode, WireInspector};

/// Main entry point for the example.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = CodecRegistry::with_defaults();
    registry.register_map::<FrozenMap<String, i64>>();
    registry.register_builder::<FrozenMap<String, i64>, _>(FrozenMap::from_entries);
    registry.register_map::<FrozenMap<String, FrozenMap<String, i64>>>();
    registry.register_builder::<FrozenMap<String, FrozenMap<String, i64>>, _>(
        FrozenMap::from_entries,
    );

    let regions = FrozenMap::from_entries(
        (0..4_i64)
            .map(|r| {
                (
                    format!("region_{r}"),
                    FrozenMap::from_entries(
                        (0..6_i64).map(|s| (format!("slot_{s}"), r * 10 + s)).collect(),
                    ),
                )
            })
            .collect(),
    );

    let path = std::env::temp_dir().join("rescode_inspect_demo.rsc");
    Rescode::save(&registry, &path, &regions)?;

    let report = WireInspector::inspect(&path)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    std::fs::remove_file(&path).ok();
    Ok(())
}
