// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Water splashes raised by shell impacts and explosions
//!
//! A splash is purely cosmetic: a column that rises for [`RISE_TIME`]
//! seconds to [`RISE_HEIGHT`], falls back under gravity, then fades out.
//! Radii and opacity follow cubic B-splines over the normalized age.

use crate::bodies::gun_shell::GRAVITY;
use crate::ecs::components::{Body, Extents};
use crate::ecs::system::{Simulatable, TickContext};
use crate::math::{Angle, BSpline, Vector3};

/// Time to reach the maximum height (s)
pub const RISE_TIME: f64 = 0.4;

/// Maximum height of the column (m)
pub const RISE_HEIGHT: f64 = 25.0;

/// Extra time the splash lingers after its lifetime (s)
pub const FADE_TIME: f64 = 0.5;

/// Stage of a splash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashPhase {
    /// Column is rising
    Rising,
    /// Column is falling back
    Falling,
    /// Column has collapsed, spray fades
    Fading,
}

/// Render parameters of a splash column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplashShape {
    /// Radius at the water line (m)
    pub radius_bottom: f64,
    /// Radius at the top (m)
    pub radius_top: f64,
    /// Column height (m)
    pub height: f64,
    /// Opacity in `[0, 1]`
    pub alpha: f64,
}

/// A water splash
#[derive(Debug, Clone, PartialEq)]
pub struct WaterSplash {
    /// Shared physical state
    pub body: Body,
    rest_time: f64,
    radius_top: BSpline,
    radius_bottom: BSpline,
    alpha: BSpline,
}

impl WaterSplash {
    /// Fall time from the maximum height (s)
    pub fn fall_time() -> f64 {
        (2.0 * RISE_HEIGHT / GRAVITY).sqrt()
    }

    /// Rise plus fall time (s)
    pub fn lifetime() -> f64 {
        RISE_TIME + Self::fall_time()
    }

    /// Create a splash at `position`
    pub fn new(position: Vector3) -> Self {
        let body = Body::new(position, Angle::new(0.0), Extents::new(10.0, 10.0, RISE_HEIGHT, 0.0), 1.0);
        WaterSplash {
            body,
            rest_time: Self::lifetime(),
            radius_top: BSpline::new(3, vec![5.0, 5.0, 6.0, 7.0, 8.0, 9.0]),
            radius_bottom: BSpline::new(3, vec![5.0, 5.0, 5.2, 5.4, 5.6, 5.8]),
            alpha: BSpline::new(3, vec![1.0, 1.0, 0.75, 0.5, 0.25, 0.0]),
        }
    }

    /// Seconds since the splash was raised
    pub fn age(&self) -> f64 {
        Self::lifetime() - self.rest_time
    }

    pub(crate) fn set_age(&mut self, age: f64) {
        self.rest_time = Self::lifetime() - age.max(0.0);
    }

    /// Current stage
    pub fn phase(&self) -> SplashPhase {
        let age = self.age();
        if age < RISE_TIME {
            SplashPhase::Rising
        } else if self.rest_time > 0.0 {
            SplashPhase::Falling
        } else {
            SplashPhase::Fading
        }
    }

    /// Column height `t` seconds after the splash was raised
    pub fn height_at(t: f64) -> f64 {
        let x = if t < RISE_TIME {
            (RISE_TIME - t) / RISE_TIME
        } else {
            (t - RISE_TIME) / Self::fall_time()
        };
        (RISE_HEIGHT * (1.0 - x * x)).max(0.0)
    }

    /// Shape of the column, `None` once it collapsed
    pub fn shape(&self) -> Option<SplashShape> {
        if self.rest_time <= 0.0 {
            return None;
        }
        let t = self.age() / Self::lifetime();
        Some(SplashShape {
            radius_bottom: self.radius_bottom.value(t),
            radius_top: self.radius_top.value(t),
            height: Self::height_at(self.age()),
            alpha: self.alpha.value(t),
        })
    }
}

impl Simulatable for WaterSplash {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn integrate(&mut self, ctx: &TickContext) {
        if !self.body.is_alive() {
            self.body.mark_defunct();
            return;
        }
        self.rest_time -= ctx.dt;
        if self.rest_time <= -FADE_TIME {
            self.body.kill();
        }
    }
}
