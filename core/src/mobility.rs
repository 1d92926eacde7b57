//! Mobility model — simplified random waypoint
//!
//! Each node drifts across a square area at a constant speed along a heading.
//! Coordinates are clamped at the area boundary; hitting a wall picks a fresh
//! heading so nodes do not pile up in corners. Every step counts as a movement
//! notification for the node's decision engine.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mobility tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityConfig {
    /// Side of the square simulation area (units)
    pub area: f32,
    /// Slowest speed a node can draw (units/step)
    pub min_speed: u8,
    /// Fastest speed a node can draw (units/step)
    pub max_speed: u8,
    /// Time between steps (milliseconds)
    pub step_interval_ms: u64,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            area: 100.0,
            min_speed: 1,
            max_speed: 5,
            step_interval_ms: 1_000,
        }
    }
}

/// 2D coordinates inside the area
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn distance_to(&self, other: &Position) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct MobilityModel {
    position: Position,
    /// Units per step
    speed: f32,
    /// Degrees, [0, 360)
    heading: f32,
    area: f32,
}

impl MobilityModel {
    /// Random position, speed and heading
    pub fn random(config: &MobilityConfig, rng: &mut impl Rng) -> Self {
        let area = config.area.max(0.0);
        let (lo, hi) = if config.min_speed <= config.max_speed {
            (config.min_speed, config.max_speed)
        } else {
            (config.max_speed, config.min_speed)
        };

        let model = Self {
            position: Position {
                x: rng.gen_range(0.0..=area),
                y: rng.gen_range(0.0..=area),
            },
            speed: f32::from(rng.gen_range(lo..=hi)),
            heading: f32::from(rng.gen_range(0u16..360)),
            area,
        };

        debug!(
            "Mobility: start at ({:.1}, {:.1}), speed {:.1}, heading {:.1}°",
            model.position.x, model.position.y, model.speed, model.heading
        );
        model
    }

    pub fn new(position: Position, speed: f32, heading: f32, area: f32) -> Self {
        let mut model = Self {
            position,
            speed,
            heading: heading.rem_euclid(360.0),
            area: area.max(0.0),
        };
        model.set_position(position.x, position.y);
        model
    }

    /// Advance one step. Returns the distance actually travelled.
    pub fn step(&mut self, rng: &mut impl Rng) -> f32 {
        let old = self.position;
        let radians = self.heading.to_radians();

        let x = old.x + self.speed * radians.cos();
        let y = old.y + self.speed * radians.sin();
        let clamped_x = x.clamp(0.0, self.area);
        let clamped_y = y.clamp(0.0, self.area);

        self.position = Position {
            x: clamped_x,
            y: clamped_y,
        };

        if clamped_x != x || clamped_y != y {
            self.heading = f32::from(rng.gen_range(0u16..360));
            debug!(
                "Mobility: boundary reached at ({:.1}, {:.1}), new heading {:.1}°",
                clamped_x, clamped_y, self.heading
            );
        }

        old.distance_to(&self.position)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Move to an explicit position (clamped into the area)
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Position {
            x: x.clamp(0.0, self.area),
            y: y.clamp(0.0, self.area),
        };
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }
}
