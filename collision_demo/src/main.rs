//! Collision demo
//!
//! Scatters a field of cubes, attaches a small rig of child transforms to a
//! spinning hub, and drives one "rover" body through the field with
//! authoritative poses. Each tick logs the colliding pairs.
//!
//! Usage: `collision_demo [config.toml|config.ron] [ticks]`

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_core::foundation::logging;
use scene_core::prelude::*;
use thiserror::Error;

const DEFAULT_TICKS: u32 = 120;
const FIELD_SIZE: usize = 24;
const FIELD_EXTENT: f32 = 12.0;
const SCATTER_SEED: u64 = 0x5EED;

#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] scene_core::core::ConfigError),

    #[error(transparent)]
    Collision(#[from] CollisionError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("Invalid tick count '{0}'")]
    TickCount(String),
}

struct Demo {
    scene: Scene,
    hub: TransformHandle,
    rover: TransformHandle,
    poses: PoseBuffer,
}

impl Demo {
    fn new(config: CoreConfig) -> Result<Self, DemoError> {
        let mut scene = Scene::with_config(config)?;
        let mut rng = StdRng::seed_from_u64(SCATTER_SEED);

        log::info!("Scattering {} cubes", FIELD_SIZE);
        for _ in 0..FIELD_SIZE {
            let position = Vec3::new(
                rng.gen_range(-FIELD_EXTENT..FIELD_EXTENT),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-FIELD_EXTENT..FIELD_EXTENT),
            );
            let half = rng.gen_range(0.3..1.2);
            let mesh = MeshGeometry::cuboid(Vec3::new(half, half * 0.5, half)).shared();
            let (transform, _) = scene.spawn(position, mesh)?;
            scene
                .hierarchy_mut()
                .rotate(transform, Vec3::new(0.0, rng.gen_range(0.0..std::f32::consts::TAU), 0.0))?;
        }

        // Hub with two arms; arms inherit the hub's spin.
        let arm_mesh = MeshGeometry::cube(0.5).shared();
        let hub = scene.hierarchy_mut().create();
        for offset in [Vec3::new(4.0, 0.0, 0.0), Vec3::new(-4.0, 0.0, 0.0)] {
            let (arm, _) = scene.spawn(offset, Arc::clone(&arm_mesh))?;
            scene.hierarchy_mut().add_child(hub, arm, true)?;
        }

        let (rover, _) = scene.spawn(
            Vec3::new(-FIELD_EXTENT, 0.0, 0.0),
            Arc::new(MeshGeometry::cuboid(Vec3::new(0.8, 0.8, 0.8))),
        )?;

        Ok(Self {
            scene,
            hub,
            rover,
            poses: PoseBuffer::new(),
        })
    }

    fn run(&mut self, ticks: u32) -> Result<(), DemoError> {
        let mut total_hits = 0;
        for tick in 0..ticks {
            // Local movement first, then the authoritative pose for the rover.
            self.scene
                .hierarchy_mut()
                .rotate(self.hub, Vec3::new(0.0, 0.05, 0.0))?;

            let progress = tick as f32 / ticks.max(1) as f32;
            let x = -FIELD_EXTENT + 2.0 * FIELD_EXTENT * progress;
            let z = (progress * std::f32::consts::TAU).sin() * FIELD_EXTENT * 0.5;
            self.poses.push(self.rover, Mat4::new_translation(&Vec3::new(x, 0.0, z)));

            let pairs = self.scene.tick(&mut self.poses);
            total_hits += pairs.len();
            for pair in &pairs {
                log::debug!("tick {:>4}: {:?} <-> {:?}", tick, pair.collider_a, pair.collider_b);
            }
            if !pairs.is_empty() {
                log::info!("tick {:>4}: {} colliding pairs", tick, pairs.len());
            }
        }

        log::info!(
            "Finished {} ticks, {} colliding pairs reported in total",
            self.scene.tick_count(),
            total_hits
        );
        Ok(())
    }
}

fn load_config(path: Option<&String>) -> Result<CoreConfig, DemoError> {
    match path {
        Some(path) => Ok(CoreConfig::load_from_file(path)?),
        None => Ok(CoreConfig::default()),
    }
}

fn main() -> Result<(), DemoError> {
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1))?;

    logging::init_with_level(&config.logging.level);
    log::info!("Starting collision demo");

    let ticks = match args.get(2) {
        Some(raw) => raw.parse().map_err(|_| DemoError::TickCount(raw.clone()))?,
        None => DEFAULT_TICKS,
    };

    let mut demo = Demo::new(config)?;
    let result = demo.run(ticks);
    if let Err(err) = &result {
        log::error!("Demo failed: {}", err);
    }
    result
}
