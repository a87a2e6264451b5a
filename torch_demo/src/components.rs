//! Demo behaviours
//!
//! A spinning sun with an orbiting planet, and a spawner filling the field
//! with short-lived asteroids that share one mesh asset.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use torch_engine::foundation::math::Unit;
use torch_engine::prelude::*;
use torch_engine::scene::FieldError;

/// Key of the shared asteroid mesh
pub const ASTEROID_MESH: &str = "meshes/asteroid.mesh";

/// Point cloud mesh
pub struct Mesh {
    pub vertices: Vec<Vec3>,
}

impl Asset for Mesh {
    /// Whitespace separated floats, three per vertex
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let text = std::str::from_utf8(bytes).map_err(|e| AssetError::InvalidData(e.to_string()))?;
        let values = text
            .split_whitespace()
            .map(str::parse::<f32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AssetError::InvalidData(e.to_string()))?;
        if values.len() % 3 != 0 {
            return Err(AssetError::InvalidData(format!("{} floats is not a whole number of vertices", values.len())));
        }
        Ok(Self {
            vertices: values.chunks_exact(3).map(|v| Vec3::new(v[0], v[1], v[2])).collect(),
        })
    }

    fn release(&self) {
        log::info!("Released mesh with {} vertices", self.vertices.len());
    }
}

/// Procedural fallback: a unit octahedron
pub fn octahedron(_key: &str) -> Result<Mesh, AssetError> {
    let vertices = vec![
        Vec3::x(),
        -Vec3::x(),
        Vec3::y(),
        -Vec3::y(),
        Vec3::z(),
        -Vec3::z(),
    ];
    Ok(Mesh { vertices })
}

/// Spins its object around an axis
pub struct Rotator {
    pub speed: f32,
    pub axis: Vec3,
}

impl Default for Rotator {
    fn default() -> Self {
        Self {
            speed: 1.0,
            axis: Vec3::y(),
        }
    }
}

impl Component for Rotator {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        let angle = self.speed * ctx.delta_time();
        let axis = Unit::new_normalize(self.axis);
        if let Some(local) = ctx.local_transform_mut() {
            local.rotation = Quat::from_axis_angle(&axis, angle) * local.rotation;
        }
        Ok(())
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("speed", FieldKind::Float),
            FieldDescriptor::new("axis", FieldKind::Vec3),
        ]
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "speed" => Some(FieldValue::Float(f64::from(self.speed))),
            "axis" => Some(FieldValue::from(self.axis)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match (name, &value) {
            ("speed", FieldValue::Float(speed)) => {
                self.speed = *speed as f32;
                Ok(())
            }
            ("axis", _) => {
                let axis = value.as_vec3().unwrap_or_else(Vec3::zeros);
                if axis.norm() < f32::EPSILON {
                    return Err(FieldError::InvalidValue {
                        field: name.to_string(),
                        reason: "axis must not be zero".to_string(),
                    });
                }
                self.axis = axis;
                Ok(())
            }
            _ => Err(FieldError::UnknownField(name.to_string())),
        }
    }
}

/// Moves its object with a constant velocity
pub struct Drift {
    pub velocity: Vec3,
}

impl Component for Drift {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        let step = self.velocity * ctx.delta_time();
        if let Some(local) = ctx.local_transform_mut() {
            local.position += step;
        }
        Ok(())
    }
}

/// Removes its object once the time runs out
pub struct Lifetime {
    pub remaining: f32,
}

impl Component for Lifetime {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.remaining -= ctx.delta_time();
        if self.remaining <= 0.0 {
            let object = ctx.object();
            ctx.scene.remove_object(object)?;
        }
        Ok(())
    }

    fn destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        log::debug!("{} expired", ctx.object_name());
    }
}

/// Links the shared mesh while attached
#[derive(Default)]
pub struct MeshRenderer {
    mesh: Option<AssetHandle<Mesh>>,
}

impl Component for MeshRenderer {
    fn start(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        let consumer = ctx.consumer();
        let assets = &ctx.services.assets;
        let mesh = match assets.load_file::<Mesh>(ASTEROID_MESH, consumer) {
            Ok(mesh) => mesh,
            Err(AssetError::NotFound(_)) => assets.load(ASTEROID_MESH, consumer, &octahedron)?,
            Err(e) => return Err(e.into()),
        };
        self.mesh = Some(mesh);
        Ok(())
    }

    fn render_object(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        if let Some(mesh) = &self.mesh {
            log::trace!(
                "{}: {} vertices at {:?}",
                ctx.object_name(),
                mesh.vertices.len(),
                ctx.world_position()
            );
        }
        Ok(())
    }
}

/// Spawns asteroids at a fixed interval
pub struct Spawner {
    pub interval: f32,
    pub max_alive: usize,
    elapsed: f32,
    spawned: u32,
    rng: StdRng,
}

impl Spawner {
    pub fn new(interval: f32, max_alive: usize, seed: u64) -> Self {
        Self {
            interval,
            max_alive,
            elapsed: 0.0,
            spawned: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn spawn(&mut self, scene: &mut Scene) -> Result<(), SceneError> {
        self.spawned += 1;
        let position = Vec3::new(
            self.rng.gen_range(-10.0..10.0),
            self.rng.gen_range(-10.0..10.0),
            0.0,
        );
        let name = format!("Asteroid {}", self.spawned);
        let asteroid = scene.create_object_with(&name, Transform::from_position(position))?;

        scene.add_component(asteroid, MeshRenderer::default())?;
        scene.add_component(
            asteroid,
            Drift {
                velocity: Vec3::new(self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0), 0.0),
            },
        )?;
        scene.add_component(
            asteroid,
            Lifetime {
                remaining: self.rng.gen_range(1.0..3.0),
            },
        )?;
        log::debug!("Spawned '{}' at {:?}", name, position);
        Ok(())
    }
}

impl Component for Spawner {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.elapsed += ctx.delta_time();
        if self.elapsed < self.interval {
            return Ok(());
        }
        self.elapsed -= self.interval;

        let alive = ctx.scene.object_count();
        if alive < self.max_alive {
            self.spawn(ctx.scene)?;
        }
        Ok(())
    }
}
