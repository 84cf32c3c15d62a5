//! Demonstrates writing a collection across many forced suspensions.
//!
//! The writer is given a deliberately tiny buffer so the engine pauses on
//! nearly every entry; the drained chunks concatenate to the exact document
//! an uninterrupted write would produce.

use rescode::{CodecRegistry, FrozenMap, MapSerializer, Rescode, TokenWriter, WriteStatus};

/// Main entry point for the example.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = CodecRegistry::with_defaults();
    registry.register_map::<FrozenMap<String, i64>>();
    registry.register_builder::<FrozenMap<String, i64>, _>(FrozenMap::from_entries);

    // 1. Build a container worth pausing over.
    let inventory = FrozenMap::from_entries(
        (0..50_i64)
            .map(|i| (format!("item_{i:02}"), i * 17))
            .collect(),
    );

    // 2. Drive the write with a 24-byte buffer, draining on every pause.
    let mut serializer = MapSerializer::new(&registry, &inventory)?;
    let mut writer = TokenWriter::with_threshold(24);
    let mut document = Vec::new();
    let mut pauses = 0;
    loop {
        let status = serializer.resume(&mut writer)?;
        writer.drain_to(&mut document)?;
        if status == WriteStatus::Done {
            break;
        }
        pauses += 1;
    }

    println!(
        "wrote {} bytes across {} suspensions",
        document.len(),
        pauses
    );

    // 3. The chunked output is byte-identical to a one-shot write.
    let one_shot = Rescode::to_string(&registry, &inventory)?;
    assert_eq!(document, one_shot.as_bytes());
    println!("chunked output matches the uninterrupted document");

    Ok(())
}
