//! Falling snow backdrop that scatters away from the pointer and drifts with
//! device tilt.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::config::SnowConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Snowflake {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub opacity: f64,
}

pub struct SnowField {
    config: SnowConfig,
    width: f64,
    height: f64,
    gravity_x: f64,
    pointer: Option<(f64, f64)>,
    particles: Vec<Snowflake>,
    rng: SmallRng,
}

impl SnowField {
    pub fn new(config: SnowConfig, width: f64, height: f64, seed: u64) -> Self {
        let mut field = Self {
            particles: Vec::with_capacity(config.particle_count),
            config,
            width,
            height,
            gravity_x: 0.0,
            pointer: None,
            rng: SmallRng::seed_from_u64(seed),
        };
        for _ in 0..field.config.particle_count {
            let flake = field.spawn(true);
            field.particles.push(flake);
        }
        field
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.pointer = Some((x, y));
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    /// Left/right tilt in degrees. Absent readings leave the drift unchanged.
    pub fn set_tilt(&mut self, gamma: Option<f64>) {
        if let Some(gamma) = gamma {
            self.gravity_x = gamma / self.config.tilt_divisor;
        }
    }

    pub fn gravity_x(&self) -> f64 {
        self.gravity_x
    }

    pub fn particles(&self) -> &[Snowflake] {
        &self.particles
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Advances every flake by one frame.
    pub fn step(&mut self) {
        for index in 0..self.particles.len() {
            let flake = &mut self.particles[index];
            advance(flake, &self.config, self.gravity_x, self.pointer);

            let margin = self.config.horizontal_margin;
            let out_of_bounds = flake.y > self.height + self.config.bottom_margin
                || flake.x > self.width + margin
                || flake.x < -margin;
            if out_of_bounds {
                self.particles[index] = self.spawn(false);
            }
        }
    }

    fn spawn(&mut self, initial: bool) -> Snowflake {
        let config = &self.config;
        let x = self.rng.gen::<f64>() * self.width;
        let y = if initial {
            self.rng.gen::<f64>() * self.height
        } else {
            config.spawn_height
        };
        Snowflake {
            x,
            y,
            vx: (self.rng.gen::<f64>() - 0.5) * config.max_drift * 2.0,
            vy: lerp(config.min_fall_speed, config.max_fall_speed, self.rng.gen()),
            size: lerp(config.min_size, config.max_size, self.rng.gen()),
            opacity: lerp(config.min_opacity, 1.0, self.rng.gen()),
        }
    }
}

fn advance(
    flake: &mut Snowflake,
    config: &SnowConfig,
    gravity_x: f64,
    pointer: Option<(f64, f64)>,
) {
    flake.y += flake.vy;
    flake.x += flake.vx + gravity_x;

    if let Some((px, py)) = pointer {
        let dx = flake.x - px;
        let dy = flake.y - py;
        let distance = dx.hypot(dy);
        let radius = config.interaction_radius;
        if distance < radius {
            let force = (radius - distance) / radius;
            let angle = dy.atan2(dx);
            flake.vx += angle.cos() * force * config.push_strength;
            flake.vy += angle.sin() * force * config.push_strength;
        }
    }

    flake.vx *= config.friction;
    if flake.vy < config.min_fall_speed {
        flake.vy += config.recovery;
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_flake(x: f64, y: f64) -> Snowflake {
        Snowflake {
            x,
            y,
            vx: 0.0,
            vy: 1.0,
            size: 2.0,
            opacity: 1.0,
        }
    }

    #[test]
    fn spawns_the_configured_number_inside_the_viewport() {
        let field = SnowField::new(SnowConfig::default(), 800.0, 600.0, 7);
        assert_eq!(field.particles().len(), 150);
        for flake in field.particles() {
            assert!((0.0..=800.0).contains(&flake.x));
            assert!((0.0..=600.0).contains(&flake.y));
            assert!((1.0..=3.0).contains(&flake.vy));
            assert!((0.5..=1.0).contains(&flake.opacity));
        }
    }

    #[test]
    fn same_seed_same_snow() {
        let mut a = SnowField::new(SnowConfig::default(), 400.0, 300.0, 42);
        let mut b = SnowField::new(SnowConfig::default(), 400.0, 300.0, 42);
        for _ in 0..50 {
            a.step();
            b.step();
        }
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn pointer_pushes_flakes_away() {
        let config = SnowConfig::default();
        let mut flake = still_flake(110.0, 99.0);
        advance(&mut flake, &config, 0.0, Some((100.0, 100.0)));
        assert!(flake.vx > 0.0);

        let mut untouched = still_flake(500.0, 99.0);
        advance(&mut untouched, &config, 0.0, Some((100.0, 100.0)));
        assert_eq!(untouched.vx, 0.0);
    }

    #[test]
    fn slowed_flakes_recover_their_fall() {
        let config = SnowConfig::default();
        let mut flake = still_flake(0.0, 0.0);
        flake.vy = 0.2;
        advance(&mut flake, &config, 0.0, None);
        assert!((flake.vy - 0.25).abs() < 1e-9);
    }

    #[test]
    fn tilt_adds_horizontal_drift() {
        let mut field = SnowField::new(SnowConfig::default(), 400.0, 300.0, 1);
        field.set_tilt(Some(40.0));
        assert_eq!(field.gravity_x(), 2.0);
        field.set_tilt(None);
        assert_eq!(field.gravity_x(), 2.0);
    }

    #[test]
    fn flakes_leaving_the_bottom_respawn_above() {
        let config = SnowConfig {
            particle_count: 1,
            ..SnowConfig::default()
        };
        let mut field = SnowField::new(config, 100.0, 100.0, 3);
        field.particles[0] = still_flake(50.0, 115.0);
        field.step();
        assert_eq!(field.particles()[0].y, -10.0);
    }
}
