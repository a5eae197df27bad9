//! C ABI for simbridge.
//!
//! The host owns an opaque [`BridgeWorld`] pointer and passes plain numbers,
//! float arrays and `#[repr(C)]` records. Failures never cross the boundary:
//! functions return `false`, `0`, or zero-filled outputs and the reason goes
//! to the log.
//!
//! # Safety
//!
//! Every pointer argument must be null or valid for the documented number of
//! elements. Null pointers are treated as "not found".

use std::ffi::{c_char, CStr};
use std::slice;

use parking_lot::Mutex;
use simbridge_physics::{
    ActorDesc, ActorId, AggregateId, AxisLimits, CollisionRecord, EntityKind, JointDesc, JointId,
    PhysicsWorld, Result, ShapeDesc, ShapeGeometry, ShapeId, ShapeMaterial, StepCounts,
    StepResultRecord, WorldSettings,
};
use tracing::warn;

// ============================================================================
// World handle
// ============================================================================

struct HostBuffer<T> {
    ptr: *mut T,
    capacity: usize,
}

struct Buffers {
    updates: Option<HostBuffer<StepResultRecord>>,
    collisions: Option<HostBuffer<CollisionRecord>>,
    fallback_updates: Vec<StepResultRecord>,
    fallback_collisions: Vec<CollisionRecord>,
}

// The host guarantees registered buffers outlive the world and are only
// touched between steps.
unsafe impl Send for Buffers {}

/// A physics world plus the host buffers its steps write into.
pub struct BridgeWorld {
    world: PhysicsWorld,
    buffers: Mutex<Buffers>,
}

impl BridgeWorld {
    /// Wrap a new world.
    pub fn new(settings: WorldSettings) -> Self {
        let buffers = Buffers {
            updates: None,
            collisions: None,
            fallback_updates: vec![StepResultRecord::default(); settings.max_updates],
            fallback_collisions: vec![CollisionRecord::default(); settings.max_collisions],
        };
        Self {
            world: PhysicsWorld::new(settings),
            buffers: Mutex::new(buffers),
        }
    }

    /// The wrapped world.
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Step the world into the registered buffers, or the internal ones when
    /// the host has not registered any.
    pub fn simulate(&self, dt: f32) -> Result<StepCounts> {
        let mut buffers = self.buffers.lock();
        let Buffers {
            updates,
            collisions,
            fallback_updates,
            fallback_collisions,
        } = &mut *buffers;

        let updates: &mut [StepResultRecord] = match updates {
            // SAFETY: registered through `simbridge_init_entity_update`,
            // whose contract covers `capacity` records.
            Some(buf) => unsafe { slice::from_raw_parts_mut(buf.ptr, buf.capacity) },
            None => fallback_updates,
        };
        let collisions: &mut [CollisionRecord] = match collisions {
            // SAFETY: as above, via `simbridge_init_collision_update`.
            Some(buf) => unsafe { slice::from_raw_parts_mut(buf.ptr, buf.capacity) },
            None => fallback_collisions,
        };
        self.world.simulate(dt, updates, collisions)
    }
}

// ============================================================================
// Pointer helpers
// ============================================================================

unsafe fn world_ref<'a>(world: *const BridgeWorld) -> Option<&'a BridgeWorld> {
    let world = world.as_ref();
    if world.is_none() {
        warn!("null world pointer");
    }
    world
}

unsafe fn read_array<const N: usize>(ptr: *const f32) -> Option<[f32; N]> {
    if ptr.is_null() {
        return None;
    }
    let mut out = [0.0; N];
    out.copy_from_slice(slice::from_raw_parts(ptr, N));
    Some(out)
}

unsafe fn write_array<const N: usize>(ptr: *mut f32, values: [f32; N]) {
    if !ptr.is_null() {
        slice::from_raw_parts_mut(ptr, N).copy_from_slice(&values);
    }
}

unsafe fn read_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

unsafe fn with_world(world: *const BridgeWorld, f: impl FnOnce(&PhysicsWorld) -> Result<()>) -> bool {
    world_ref(world).is_some_and(|w| f(&w.world).is_ok())
}

// ============================================================================
// Logging and lifecycle
// ============================================================================

/// Install a `fmt` log subscriber. Returns false if one is already set.
#[no_mangle]
pub extern "C" fn simbridge_init_logging() -> bool {
    tracing_subscriber::fmt().with_target(false).try_init().is_ok()
}

/// Create a world with default settings. Free it with
/// `simbridge_world_destroy`.
#[no_mangle]
pub extern "C" fn simbridge_world_create() -> *mut BridgeWorld {
    Box::into_raw(Box::new(BridgeWorld::new(WorldSettings::default())))
}

/// Create a world from JSON settings. Returns null if they do not parse.
///
/// # Safety
/// `json` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn simbridge_world_create_with_settings(json: *const c_char) -> *mut BridgeWorld {
    match WorldSettings::from_json(&read_str(json)) {
        Ok(settings) => Box::into_raw(Box::new(BridgeWorld::new(settings))),
        Err(e) => {
            warn!(error = %e, "rejected world settings");
            std::ptr::null_mut()
        }
    }
}

/// Destroy a world.
///
/// # Safety
/// `world` must come from `simbridge_world_create*` and not be used again.
#[no_mangle]
pub unsafe extern "C" fn simbridge_world_destroy(world: *mut BridgeWorld) {
    if !world.is_null() {
        drop(Box::from_raw(world));
    }
}

/// Create the scene.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_create_scene(world: *const BridgeWorld) -> bool {
    let Some(w) = world_ref(world) else {
        return false;
    };
    if w.world.create_scene().is_err() {
        return false;
    }
    let registered = w.buffers.lock().collisions.as_ref().map(|b| b.capacity);
    match registered {
        Some(capacity) => w.world.set_collision_capacity(capacity).is_ok(),
        None => true,
    }
}

/// Release the scene and everything in it.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_release_scene(world: *const BridgeWorld) -> bool {
    with_world(world, |w| w.release_scene())
}

// ============================================================================
// Step buffers and simulation
// ============================================================================

/// Register the buffer step results are written into.
///
/// # Safety
/// `buffer` must be valid for `capacity` records until the world is
/// destroyed or another buffer is registered, and must not be read while
/// `simbridge_simulate` runs.
#[no_mangle]
pub unsafe extern "C" fn simbridge_init_entity_update(
    world: *const BridgeWorld,
    buffer: *mut StepResultRecord,
    capacity: u32,
) -> bool {
    let Some(w) = world_ref(world) else {
        return false;
    };
    if buffer.is_null() {
        warn!("null entity update buffer");
        return false;
    }
    w.buffers.lock().updates = Some(HostBuffer {
        ptr: buffer,
        capacity: capacity as usize,
    });
    true
}

/// Register the buffer collisions are written into. The collision sink is
/// resized to match, now or when the scene is created.
///
/// # Safety
/// Same contract as `simbridge_init_entity_update`.
#[no_mangle]
pub unsafe extern "C" fn simbridge_init_collision_update(
    world: *const BridgeWorld,
    buffer: *mut CollisionRecord,
    capacity: u32,
) -> bool {
    let Some(w) = world_ref(world) else {
        return false;
    };
    if buffer.is_null() {
        warn!("null collision buffer");
        return false;
    }
    w.buffers.lock().collisions = Some(HostBuffer {
        ptr: buffer,
        capacity: capacity as usize,
    });
    !w.world.is_initialized() || w.world.set_collision_capacity(capacity as usize).is_ok()
}

/// Advance the scene by `dt` seconds and report how many records were
/// written into each buffer.
///
/// # Safety
/// `world` must be null or valid; the count pointers may be null.
#[no_mangle]
pub unsafe extern "C" fn simbridge_simulate(
    world: *const BridgeWorld,
    dt: f32,
    entity_count: *mut u32,
    collision_count: *mut u32,
) -> bool {
    let counts = world_ref(world).and_then(|w| {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| w.simulate(dt)))
            .map_err(|_| warn!("panic during simulation step"))
            .ok()?
            .ok()
    });
    let StepCounts {
        updates,
        collisions,
    } = counts.unwrap_or_default();
    if let Some(out) = entity_count.as_mut() {
        *out = updates as u32;
    }
    if let Some(out) = collision_count.as_mut() {
        *out = collisions as u32;
    }
    counts.is_some()
}

// ============================================================================
// Actors
// ============================================================================

/// Create an actor. `position` holds 3 floats, `rotation` 4 (`x, y, z, w`);
/// either may be null for the default.
///
/// # Safety
/// Pointers must be null or valid for their lengths; `name` NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn simbridge_create_actor(
    world: *const BridgeWorld,
    id: u32,
    dynamic: bool,
    position: *const f32,
    rotation: *const f32,
    name: *const c_char,
) -> bool {
    let desc = actor_desc(id, dynamic, position, rotation, name);
    with_world(world, |w| w.create_actor(&desc))
}

unsafe fn actor_desc(
    id: u32,
    dynamic: bool,
    position: *const f32,
    rotation: *const f32,
    name: *const c_char,
) -> ActorDesc {
    let kind = if dynamic {
        EntityKind::Dynamic
    } else {
        EntityKind::Static
    };
    let mut desc = ActorDesc::new(ActorId(id), kind);
    if let Some(p) = read_array::<3>(position) {
        desc.position = p;
    }
    if let Some(q) = read_array::<4>(rotation) {
        desc.rotation = q;
    }
    desc.name = read_str(name);
    desc
}

/// Remove an actor.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_remove_actor(world: *const BridgeWorld, id: u32) -> bool {
    with_world(world, |w| w.remove_actor(ActorId(id)))
}

/// Rename an actor.
///
/// # Safety
/// `name` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_actor_name(
    world: *const BridgeWorld,
    id: u32,
    name: *const c_char,
) -> bool {
    let name = read_str(name);
    with_world(world, |w| w.set_actor_name(ActorId(id), &name))
}

/// Copy an actor's name into `buffer` as a NUL-terminated string,
/// truncating to fit. Returns the number of bytes written before the NUL.
///
/// # Safety
/// `buffer` must be null or valid for `capacity` bytes.
#[no_mangle]
pub unsafe extern "C" fn simbridge_get_actor_name(
    world: *const BridgeWorld,
    id: u32,
    buffer: *mut c_char,
    capacity: u32,
) -> u32 {
    if buffer.is_null() || capacity == 0 {
        return 0;
    }
    let name = world_ref(world)
        .and_then(|w| w.world.actor_name(ActorId(id)).ok())
        .unwrap_or_default();
    let len = name.len().min(capacity as usize - 1);
    let out = slice::from_raw_parts_mut(buffer.cast::<u8>(), len + 1);
    out[..len].copy_from_slice(&name.as_bytes()[..len]);
    out[len] = 0;
    len as u32
}

// ============================================================================
// Shapes
// ============================================================================

/// Surface and mass parameters of a new shape.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    /// Friction at rest.
    pub static_friction: f32,
    /// Sliding friction.
    pub dynamic_friction: f32,
    /// Bounciness.
    pub restitution: f32,
    /// Density.
    pub density: f32,
}

impl ShapeParams {
    fn to_desc(self, geometry: ShapeGeometry) -> ShapeDesc {
        ShapeDesc {
            geometry,
            material: ShapeMaterial {
                static_friction: self.static_friction,
                dynamic_friction: self.dynamic_friction,
                restitution: self.restitution,
            },
            density: self.density,
        }
    }
}

unsafe fn attach(world: *const BridgeWorld, actor: u32, shape: u32, desc: ShapeDesc) -> bool {
    with_world(world, |w| w.add_shape(ActorId(actor), ShapeId(shape), &desc))
}

/// Attach a sphere.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_attach_sphere(
    world: *const BridgeWorld,
    actor: u32,
    shape: u32,
    radius: f32,
    params: ShapeParams,
) -> bool {
    attach(world, actor, shape, params.to_desc(ShapeGeometry::Sphere { radius }))
}

/// Attach a box given its half extents.
///
/// # Safety
/// `half_extents` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_attach_box(
    world: *const BridgeWorld,
    actor: u32,
    shape: u32,
    half_extents: *const f32,
    params: ShapeParams,
) -> bool {
    let Some(half_extents) = read_array::<3>(half_extents) else {
        return false;
    };
    attach(world, actor, shape, params.to_desc(ShapeGeometry::Box { half_extents }))
}

/// Attach a capsule along the local x axis.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_attach_capsule(
    world: *const BridgeWorld,
    actor: u32,
    shape: u32,
    half_height: f32,
    radius: f32,
    params: ShapeParams,
) -> bool {
    let geometry = ShapeGeometry::Capsule {
        half_height,
        radius,
    };
    attach(world, actor, shape, params.to_desc(geometry))
}

unsafe fn read_points(ptr: *const f32, count: u32) -> Option<Vec<[f32; 3]>> {
    if ptr.is_null() {
        return None;
    }
    let flat = slice::from_raw_parts(ptr, count as usize * 3);
    Some(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

/// Attach a triangle mesh. `vertices` holds `vertex_count * 3` floats and
/// `indices` holds `triangle_count * 3` indices.
///
/// # Safety
/// Both arrays must be null or valid for their lengths.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn simbridge_attach_triangle_mesh(
    world: *const BridgeWorld,
    actor: u32,
    shape: u32,
    vertices: *const f32,
    vertex_count: u32,
    indices: *const u32,
    triangle_count: u32,
    params: ShapeParams,
) -> bool {
    let Some(vertices) = read_points(vertices, vertex_count) else {
        return false;
    };
    if indices.is_null() {
        return false;
    }
    let indices = slice::from_raw_parts(indices, triangle_count as usize * 3)
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    let geometry = ShapeGeometry::TriangleMesh { vertices, indices };
    attach(world, actor, shape, params.to_desc(geometry))
}

/// Attach the convex hull of `point_count` points.
///
/// # Safety
/// `points` must be null or valid for `point_count * 3` floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_attach_convex_mesh(
    world: *const BridgeWorld,
    actor: u32,
    shape: u32,
    points: *const f32,
    point_count: u32,
    params: ShapeParams,
) -> bool {
    let Some(points) = read_points(points, point_count) else {
        return false;
    };
    attach(world, actor, shape, params.to_desc(ShapeGeometry::ConvexMesh { points }))
}

/// Detach a shape.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_detach_shape(world: *const BridgeWorld, actor: u32, shape: u32) -> bool {
    with_world(world, |w| w.detach_shape(ActorId(actor), ShapeId(shape)))
}

/// Change one shape's density.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_shape_density(
    world: *const BridgeWorld,
    actor: u32,
    shape: u32,
    density: f32,
) -> bool {
    with_world(world, |w| w.set_shape_density(ActorId(actor), ShapeId(shape), density))
}

/// Give every shape of a dynamic actor the same density.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_update_actor_density(world: *const BridgeWorld, actor: u32, density: f32) -> bool {
    with_world(world, |w| w.update_actor_density(ActorId(actor), density))
}

/// Override the mass of a dynamic actor.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_actor_mass(world: *const BridgeWorld, actor: u32, mass: f32) -> bool {
    with_world(world, |w| w.set_actor_mass(ActorId(actor), mass))
}

/// Mass of an actor, or 0 if it is static or unknown.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_get_actor_mass(world: *const BridgeWorld, actor: u32) -> f32 {
    world_ref(world)
        .and_then(|w| w.world.actor_mass(ActorId(actor)).ok())
        .unwrap_or(0.0)
}

// ============================================================================
// Pose and motion
// ============================================================================

/// Move an actor, keeping its orientation.
///
/// # Safety
/// `position` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_position(world: *const BridgeWorld, actor: u32, position: *const f32) -> bool {
    let Some(position) = read_array::<3>(position) else {
        return false;
    };
    with_world(world, |w| w.set_position(ActorId(actor), position))
}

/// Rotate an actor, keeping its position.
///
/// # Safety
/// `rotation` must be null or valid for 4 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_rotation(world: *const BridgeWorld, actor: u32, rotation: *const f32) -> bool {
    let Some(rotation) = read_array::<4>(rotation) else {
        return false;
    };
    with_world(world, |w| w.set_rotation(ActorId(actor), rotation))
}

/// Set position and orientation in one write.
///
/// # Safety
/// `position` must be valid for 3 floats and `rotation` for 4, or null.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_transformation(
    world: *const BridgeWorld,
    actor: u32,
    position: *const f32,
    rotation: *const f32,
) -> bool {
    let (Some(position), Some(rotation)) = (read_array::<3>(position), read_array::<4>(rotation)) else {
        return false;
    };
    with_world(world, |w| w.set_transformation(ActorId(actor), position, rotation))
}

/// Write an actor's position into `out`; zeros if unknown.
///
/// # Safety
/// `out` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_get_position(world: *const BridgeWorld, actor: u32, out: *mut f32) -> bool {
    let value = world_ref(world).and_then(|w| w.world.position(ActorId(actor)).ok());
    write_array(out, value.unwrap_or_default());
    value.is_some()
}

/// Write an actor's orientation (`x, y, z, w`) into `out`; zeros if
/// unknown.
///
/// # Safety
/// `out` must be null or valid for 4 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_get_rotation(world: *const BridgeWorld, actor: u32, out: *mut f32) -> bool {
    let value = world_ref(world).and_then(|w| w.world.rotation(ActorId(actor)).ok());
    write_array(out, value.unwrap_or_default());
    value.is_some()
}

/// Set the linear velocity of a dynamic actor.
///
/// # Safety
/// `velocity` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_linear_velocity(
    world: *const BridgeWorld,
    actor: u32,
    velocity: *const f32,
) -> bool {
    let Some(velocity) = read_array::<3>(velocity) else {
        return false;
    };
    with_world(world, |w| w.set_linear_velocity(ActorId(actor), velocity))
}

/// Set the angular velocity of a dynamic actor.
///
/// # Safety
/// `velocity` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_angular_velocity(
    world: *const BridgeWorld,
    actor: u32,
    velocity: *const f32,
) -> bool {
    let Some(velocity) = read_array::<3>(velocity) else {
        return false;
    };
    with_world(world, |w| w.set_angular_velocity(ActorId(actor), velocity))
}

/// Write an actor's linear velocity into `out`; zeros if unknown.
///
/// # Safety
/// `out` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_get_linear_velocity(world: *const BridgeWorld, actor: u32, out: *mut f32) -> bool {
    let value = world_ref(world).and_then(|w| w.world.linear_velocity(ActorId(actor)).ok());
    write_array(out, value.unwrap_or_default());
    value.is_some()
}

/// Write an actor's angular velocity into `out`; zeros if unknown.
///
/// # Safety
/// `out` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_get_angular_velocity(world: *const BridgeWorld, actor: u32, out: *mut f32) -> bool {
    let value = world_ref(world).and_then(|w| w.world.angular_velocity(ActorId(actor)).ok());
    write_array(out, value.unwrap_or_default());
    value.is_some()
}

/// Push a dynamic actor for the next step.
///
/// # Safety
/// `force` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_add_force(world: *const BridgeWorld, actor: u32, force: *const f32) -> bool {
    let Some(force) = read_array::<3>(force) else {
        return false;
    };
    with_world(world, |w| w.add_force(ActorId(actor), force))
}

/// Turn gravity on or off for one actor.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_enable_gravity(world: *const BridgeWorld, actor: u32, enabled: bool) -> bool {
    with_world(world, |w| w.enable_gravity(ActorId(actor), enabled))
}

/// Set scene gravity.
///
/// # Safety
/// `gravity` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_set_gravity(world: *const BridgeWorld, gravity: *const f32) -> bool {
    let Some(gravity) = read_array::<3>(gravity) else {
        return false;
    };
    with_world(world, |w| w.set_gravity(gravity))
}

// ============================================================================
// Joints
// ============================================================================

/// Create a 6-DOF joint. An actor id of 0 (or an unknown id) attaches that
/// side to the world frame.
///
/// Frame positions hold 3 floats, frame rotations 4, and each limit array
/// 3 floats. For each axis, `lower == upper` locks it, `lower > upper`
/// frees it, and `lower < upper` limits it.
///
/// # Safety
/// All array pointers must be valid for their lengths.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn simbridge_add_joint(
    world: *const BridgeWorld,
    joint: u32,
    actor1: u32,
    actor2: u32,
    frame1_position: *const f32,
    frame1_rotation: *const f32,
    frame2_position: *const f32,
    frame2_rotation: *const f32,
    linear_lower: *const f32,
    linear_upper: *const f32,
    angular_lower: *const f32,
    angular_upper: *const f32,
) -> bool {
    let (
        Some(frame1_position),
        Some(frame1_rotation),
        Some(frame2_position),
        Some(frame2_rotation),
        Some(linear_lower),
        Some(linear_upper),
        Some(angular_lower),
        Some(angular_upper),
    ) = (
        read_array::<3>(frame1_position),
        read_array::<4>(frame1_rotation),
        read_array::<3>(frame2_position),
        read_array::<4>(frame2_rotation),
        read_array::<3>(linear_lower),
        read_array::<3>(linear_upper),
        read_array::<3>(angular_lower),
        read_array::<3>(angular_upper),
    )
    else {
        warn!(joint, "null joint parameters");
        return false;
    };

    let desc = JointDesc {
        id: JointId(joint),
        actor1: ActorId(actor1),
        actor2: ActorId(actor2),
        frame1_position,
        frame1_rotation,
        frame2_position,
        frame2_rotation,
        limits: AxisLimits {
            linear_lower,
            linear_upper,
            angular_lower,
            angular_upper,
        },
    };
    with_world(world, |w| w.add_joint(&desc))
}

/// Release a joint.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_remove_joint(world: *const BridgeWorld, joint: u32) -> bool {
    with_world(world, |w| w.remove_joint(JointId(joint)))
}

// ============================================================================
// Ground plane and aggregates
// ============================================================================

/// Add a static +Z ground plane through `position`.
///
/// # Safety
/// `position` must be null or valid for 3 floats.
#[no_mangle]
pub unsafe extern "C" fn simbridge_create_ground_plane(world: *const BridgeWorld, position: *const f32) -> bool {
    let position = read_array::<3>(position).unwrap_or_default();
    with_world(world, |w| w.create_ground_plane(position))
}

/// Remove the ground plane.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_release_ground_plane(world: *const BridgeWorld) -> bool {
    with_world(world, |w| w.release_ground_plane())
}

/// Create an aggregate holding at most `max_actors`.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_create_aggregate(world: *const BridgeWorld, id: u32, max_actors: u32) -> bool {
    with_world(world, |w| w.create_aggregate(AggregateId(id), max_actors as usize))
}

/// Add an actor to an aggregate.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_add_to_aggregate(world: *const BridgeWorld, id: u32, actor: u32) -> bool {
    with_world(world, |w| w.add_to_aggregate(AggregateId(id), ActorId(actor)))
}

/// Take an actor out of an aggregate.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_remove_from_aggregate(world: *const BridgeWorld, id: u32, actor: u32) -> bool {
    with_world(world, |w| w.remove_from_aggregate(AggregateId(id), ActorId(actor)))
}

/// Release an aggregate.
///
/// # Safety
/// `world` must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn simbridge_remove_aggregate(world: *const BridgeWorld, id: u32) -> bool {
    with_world(world, |w| w.remove_aggregate(AggregateId(id)))
}
