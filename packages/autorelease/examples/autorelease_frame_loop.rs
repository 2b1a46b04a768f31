//! Demonstrates deferred release in a per-frame update loop.
//!
//! Every frame pushes a pool, creates a few transient objects that are autoreleased into it and
//! pops the pool at the end of the frame. An object that outlives the loop is retained for the
//! duration of each frame and handed back to the frame's pool.

use autorelease::{Object, PoolManager, Release};

fn main() {
    println!("=== Autorelease frame loop example ===");

    let manager = PoolManager::instance();
    let scene = Object::new(String::from("main scene"));

    for frame in 0..3_u32 {
        manager.push();

        let sprites: Vec<_> = (0..4_u32)
            .map(|index| Object::new(format!("frame {frame} sprite {index}")).autorelease())
            .collect();

        scene.retain();
        let scene_in_frame = scene.autorelease();

        println!(
            "frame {frame}: {} pending releases, scene retain count {}",
            manager.current_len(),
            scene_in_frame.retain_count()
        );

        manager.pop();

        assert!(sprites.iter().all(|sprite| sprite.is_destroyed()));
    }

    assert!(scene.is_single_reference());
    println!(
        "scene survived the loop: {}",
        scene.with(String::clone).unwrap_or_default()
    );

    manager.finalize();

    println!("Example completed successfully!");
}
