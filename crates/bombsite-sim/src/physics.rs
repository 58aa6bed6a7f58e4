//! Physics body integration with sub-stepping and terrain contact.
//!
//! Bodies move with semi-implicit Euler: velocity is updated from the
//! acceleration first, then position from the new velocity. A tick is split
//! into sub-steps so no sub-step travels further than the configured limit;
//! after each sub-step the body is tested against the terrain mask and, on
//! overlap, the contact point is located by bisection.

use bombsite_core::config::Tuning;
use bombsite_core::enums::DragModel;
use bombsite_core::types::{DVec2, Kinematics};
use bombsite_terrain::TerrainField;

/// How far below a body the support probe reaches (cells).
pub const SUPPORT_PROBE: f64 = 0.5;

const MIN_SWEEP_SPACING: f64 = 0.25;
const MAX_SWEEP_SAMPLES: u32 = 4096;

/// A circular rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    pub position: DVec2,
    pub velocity: DVec2,
    pub mass: f64,
    pub drag: f64,
    pub radius: f64,
    pub restitution: f64,
    pub friction: f64,
    pub gravity_scale: f64,
    /// Resting on terrain; skipped by integration until relaunched.
    pub settled: bool,
}

/// World forces acting on every body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forces {
    pub gravity: f64,
    pub wind: f64,
    pub drag_model: DragModel,
}

impl Forces {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            gravity: tuning.gravity,
            wind: tuning.wind,
            drag_model: tuning.drag_model,
        }
    }
}

/// Sub-stepping limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLimits {
    pub max_substep_distance: f64,
    pub max_substeps: u32,
    pub bisection_steps: u32,
}

impl StepLimits {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            max_substep_distance: tuning.max_substep_distance,
            max_substeps: tuning.max_substeps,
            bisection_steps: tuning.contact_bisection_steps,
        }
    }
}

/// First terrain contact found during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainContact {
    /// Body centre at the moment of contact.
    pub position: DVec2,
    /// Velocity just before contact.
    pub incoming_velocity: DVec2,
    /// Outward surface normal at the contact.
    pub normal: DVec2,
    /// Fraction of the tick elapsed at contact, in [0, 1].
    pub time: f64,
}

/// Result of advancing one body by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Position at the start of the tick.
    pub start: DVec2,
    pub contact: Option<TerrainContact>,
}

impl PhysicsBody {
    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            position: self.position,
            velocity: self.velocity,
        }
    }

    /// Acceleration for a given velocity: gravity, wind and drag.
    pub fn acceleration(&self, velocity: DVec2, forces: &Forces) -> DVec2 {
        let drag = match forces.drag_model {
            DragModel::Linear => -velocity * (self.drag / self.mass),
            DragModel::Quadratic => -velocity * velocity.length() * (self.drag / self.mass),
        };
        DVec2::new(forces.wind, forces.gravity * self.gravity_scale) + drag
    }

    /// One semi-implicit Euler step, ignoring terrain.
    pub fn integrate(&self, dt: f64, forces: &Forces) -> Kinematics {
        let velocity = self.velocity + self.acceleration(self.velocity, forces) * dt;
        Kinematics {
            position: self.position + velocity * dt,
            velocity,
        }
    }

    /// Start moving again after resting.
    pub fn launch(&mut self, velocity: DVec2) {
        self.velocity = velocity;
        self.settled = false;
    }

    /// Come to rest where the body is.
    pub fn settle(&mut self) {
        self.velocity = DVec2::ZERO;
        self.settled = true;
    }
}

/// Number of sub-steps for a tick so that none travels further than the limit.
pub fn substep_count(body: &PhysicsBody, dt: f64, forces: &Forces, limits: &StepLimits) -> u32 {
    let accel = body.acceleration(body.velocity, forces).length();
    let reach = (body.velocity.length() + accel * dt) * dt;
    if !reach.is_finite() {
        return limits.max_substeps.max(1);
    }
    let n = (reach / limits.max_substep_distance).ceil();
    (n as u32).clamp(1, limits.max_substeps.max(1))
}

/// Advance an unsettled body by `dt`, stopping at the first terrain contact.
///
/// On contact the body is left at the contact point carrying its incoming
/// velocity; the caller decides whether it bounces, lands or detonates.
pub fn step(
    body: &mut PhysicsBody,
    field: &TerrainField,
    forces: &Forces,
    limits: &StepLimits,
    dt: f64,
) -> StepOutcome {
    let start = body.position;
    if body.settled {
        return StepOutcome {
            start,
            contact: None,
        };
    }

    if field.overlaps_circle(body.position, body.radius) {
        let normal = field.contact_normal(body.position, body.radius);
        return StepOutcome {
            start,
            contact: Some(TerrainContact {
                position: body.position,
                incoming_velocity: body.velocity,
                normal,
                time: 0.0,
            }),
        };
    }

    let n = substep_count(body, dt, forces, limits);
    let h = dt / n as f64;
    let spacing = sweep_spacing(body.radius, limits);
    for i in 0..n {
        let next = body.integrate(h, forces);
        if let Some((free_t, blocked_t)) =
            first_blocked(field, body.position, next.position, body.radius, spacing)
        {
            let free = body.position.lerp(next.position, free_t);
            let blocked = body.position.lerp(next.position, blocked_t);
            let (position, frac) =
                bisect_contact(field, free, blocked, body.radius, limits.bisection_steps);
            let along = free_t + frac * (blocked_t - free_t);
            let normal = field.contact_normal(position, body.radius);
            body.position = position;
            body.velocity = next.velocity;
            return StepOutcome {
                start,
                contact: Some(TerrainContact {
                    position,
                    incoming_velocity: next.velocity,
                    normal,
                    time: (i as f64 + along) / n as f64,
                }),
            };
        }
        body.position = next.position;
        body.velocity = next.velocity;
    }

    StepOutcome {
        start,
        contact: None,
    }
}

/// Sample spacing for sweeping one sub-step. A disc cannot pass a one-cell
/// wall between samples closer than its radius.
fn sweep_spacing(radius: f64, limits: &StepLimits) -> f64 {
    radius
        .min(limits.max_substep_distance)
        .max(MIN_SWEEP_SPACING)
}

/// March along `from → to` in steps no longer than `spacing`. Returns the
/// fractions of the last free sample and the first overlapping one.
fn first_blocked(
    field: &TerrainField,
    from: DVec2,
    to: DVec2,
    radius: f64,
    spacing: f64,
) -> Option<(f64, f64)> {
    let length = from.distance(to);
    let samples = if length.is_finite() {
        ((length / spacing).ceil() as u32).clamp(1, MAX_SWEEP_SAMPLES)
    } else {
        1
    };
    let mut free_t = 0.0;
    for k in 1..=samples {
        let t = k as f64 / samples as f64;
        if field.overlaps_circle(from.lerp(to, t), radius) {
            return Some((free_t, t));
        }
        free_t = t;
    }
    None
}

/// Locate the last free point on the segment `free → blocked`. Returns the
/// point and its fraction along the segment.
pub fn bisect_contact(
    field: &TerrainField,
    free: DVec2,
    blocked: DVec2,
    radius: f64,
    steps: u32,
) -> (DVec2, f64) {
    let mut lo = 0.0;
    let mut hi = 1.0;
    for _ in 0..steps {
        let mid = 0.5 * (lo + hi);
        if field.overlaps_circle(free.lerp(blocked, mid), radius) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    (free.lerp(blocked, lo), lo)
}

/// Whether solid terrain lies directly beneath the body.
pub fn is_supported(field: &TerrainField, position: DVec2, radius: f64) -> bool {
    field.overlaps_circle(position + DVec2::new(0.0, SUPPORT_PROBE), radius)
}

/// Reflect a velocity off a surface: the normal part is reversed and scaled by
/// restitution, the tangential part scaled by friction. Velocities already
/// leaving the surface are returned unchanged.
pub fn bounce(velocity: DVec2, normal: DVec2, restitution: f64, friction: f64) -> DVec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    let normal_part = normal * vn;
    let tangential = velocity - normal_part;
    tangential * friction - normal_part * restitution
}

/// Whether a surface normal is flat enough to rest on.
pub fn is_floor(normal: DVec2) -> bool {
    normal.y < -0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(position: DVec2, velocity: DVec2) -> PhysicsBody {
        PhysicsBody {
            position,
            velocity,
            mass: 1.0,
            drag: 0.0,
            radius: 2.0,
            restitution: 0.0,
            friction: 1.0,
            gravity_scale: 1.0,
            settled: false,
        }
    }

    fn gravity_only() -> Forces {
        Forces {
            gravity: 500.0,
            wind: 0.0,
            drag_model: DragModel::Quadratic,
        }
    }

    fn limits() -> StepLimits {
        StepLimits {
            max_substep_distance: 1.0,
            max_substeps: 64,
            bisection_steps: 12,
        }
    }

    #[test]
    fn test_integrate_semi_implicit() {
        let body = ball(DVec2::new(10.0, 10.0), DVec2::new(30.0, 0.0));
        let k = body.integrate(0.1, &gravity_only());
        assert!((k.velocity.y - 50.0).abs() < 1e-12);
        // Position uses the updated velocity.
        assert!((k.position.y - 15.0).abs() < 1e-12);
        assert!((k.position.x - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_drag_opposes_motion() {
        let mut body = ball(DVec2::ZERO, DVec2::new(100.0, 0.0));
        body.drag = 0.01;
        let forces = Forces {
            gravity: 0.0,
            wind: 0.0,
            drag_model: DragModel::Quadratic,
        };
        let a = body.acceleration(body.velocity, &forces);
        assert!((a.x + 100.0).abs() < 1e-9);

        let linear = Forces {
            drag_model: DragModel::Linear,
            ..forces
        };
        let a = body.acceleration(body.velocity, &linear);
        assert!((a.x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wind_pushes_horizontally() {
        let body = ball(DVec2::ZERO, DVec2::ZERO);
        let forces = Forces {
            gravity: 0.0,
            wind: 12.0,
            drag_model: DragModel::Linear,
        };
        assert_eq!(body.acceleration(DVec2::ZERO, &forces), DVec2::new(12.0, 0.0));
    }

    #[test]
    fn test_substep_count_bounded() {
        let slow = ball(DVec2::ZERO, DVec2::new(10.0, 0.0));
        assert_eq!(substep_count(&slow, 1.0 / 60.0, &gravity_only(), &limits()), 1);

        let fast = ball(DVec2::ZERO, DVec2::new(1_000_000.0, 0.0));
        assert_eq!(substep_count(&fast, 1.0 / 60.0, &gravity_only(), &limits()), 64);
    }

    #[test]
    fn test_free_fall_matches_integration() {
        let field = TerrainField::empty(100, 1000).unwrap();
        let mut body = ball(DVec2::new(50.0, 10.0), DVec2::ZERO);
        let dt = 1.0 / 60.0;
        for _ in 0..30 {
            let outcome = step(&mut body, &field, &gravity_only(), &limits(), dt);
            assert!(outcome.contact.is_none());
        }
        // Half a second under 500 cells/s^2: about 62.5 cells.
        let analytic = 10.0 + 0.5 * 500.0 * 0.25;
        assert!((body.position.y - analytic).abs() < 2.5, "y = {}", body.position.y);
        assert!((body.velocity.y - 250.0).abs() < 1e-6);
        assert_eq!(body.position.x, 50.0);
    }

    #[test]
    fn test_contact_lands_on_surface() {
        let field = TerrainField::from_heightfield(40, 60, &[50; 40]).unwrap();
        let mut body = ball(DVec2::new(20.0, 40.0), DVec2::new(0.0, 400.0));
        let mut contact = None;
        for _ in 0..60 {
            let outcome = step(&mut body, &field, &gravity_only(), &limits(), 1.0 / 60.0);
            if outcome.contact.is_some() {
                contact = outcome.contact;
                break;
            }
        }
        let contact = contact.expect("body never reached the ground");
        assert!((contact.position.y - 48.0).abs() < 0.01, "y = {}", contact.position.y);
        assert!(contact.normal.y < -0.99);
        assert!(contact.incoming_velocity.y > 0.0);
        assert!((0.0..=1.0).contains(&contact.time));
        assert!(!field.overlaps_circle(body.position, body.radius));
        assert!(is_supported(&field, body.position, body.radius));
    }

    #[test]
    fn test_fast_body_does_not_tunnel() {
        let field = TerrainField::from_ascii(
            "
..........#.........
..........#.........
..........#.........
",
        )
        .unwrap();
        let mut body = ball(DVec2::new(1.3, 1.5), DVec2::new(3000.0, 0.0));
        body.radius = 0.5;
        let forces = Forces {
            gravity: 0.0,
            ..gravity_only()
        };
        let outcome = step(&mut body, &field, &forces, &limits(), 1.0 / 60.0);
        let contact = outcome.contact.expect("passed through the wall");
        assert!(contact.position.x < 10.0);
        assert!(contact.normal.x < -0.9);
    }

    #[test]
    fn test_bullet_at_max_tick_stops_at_thin_wall() {
        use bombsite_core::weapons::{ids, WeaponCatalogue};

        let tuning = Tuning::default();
        let catalogue = WeaponCatalogue::default();
        let spec = catalogue.get(ids::RIFLE).unwrap().projectile;
        let (width, height) = (400, 20);
        let mask: Vec<bool> = (0..height)
            .flat_map(|_| (0..width).map(|x| x == 10))
            .collect();
        let field = TerrainField::from_mask(width, height, &mask).unwrap();

        let speed = tuning.max_launch_speed * spec.launch_speed_scale;
        let mut body = PhysicsBody {
            position: DVec2::new(2.65, 10.0),
            velocity: DVec2::new(speed, 0.0),
            mass: spec.mass,
            drag: spec.drag,
            radius: spec.radius,
            restitution: spec.restitution,
            friction: spec.friction,
            gravity_scale: spec.gravity_scale,
            settled: false,
        };
        let forces = Forces::from_tuning(&tuning);
        let limits = StepLimits::from_tuning(&tuning);
        // Each sub-step covers more than a cell at this speed.
        let n = substep_count(&body, tuning.max_tick_dt, &forces, &limits);
        assert!(speed * tuning.max_tick_dt / n as f64 > 2.0 * spec.radius);

        let outcome = step(&mut body, &field, &forces, &limits, tuning.max_tick_dt);
        let contact = outcome.contact.expect("bullet passed through the wall");
        assert!(contact.position.x < 10.0, "x = {}", contact.position.x);
        assert!(contact.position.x > 8.9, "x = {}", contact.position.x);
        assert!(contact.normal.x < -0.9);
        assert!(contact.time < 0.1);
        assert_eq!(body.position, contact.position);
        assert!(!field.overlaps_circle(body.position, body.radius));
    }

    #[test]
    fn test_settled_body_does_not_move() {
        let field = TerrainField::empty(10, 10).unwrap();
        let mut body = ball(DVec2::new(5.0, 5.0), DVec2::ZERO);
        body.settle();
        let outcome = step(&mut body, &field, &gravity_only(), &limits(), 1.0 / 60.0);
        assert!(outcome.contact.is_none());
        assert_eq!(body.position, DVec2::new(5.0, 5.0));
    }

    #[test]
    fn test_bounce_reflects_normal_component() {
        let v = bounce(DVec2::new(10.0, 100.0), DVec2::new(0.0, -1.0), 0.5, 0.8);
        assert!((v.x - 8.0).abs() < 1e-12);
        assert!((v.y + 50.0).abs() < 1e-12);
        // Leaving the surface: unchanged.
        let v = bounce(DVec2::new(0.0, -5.0), DVec2::new(0.0, -1.0), 0.5, 0.8);
        assert_eq!(v, DVec2::new(0.0, -5.0));
    }
}
