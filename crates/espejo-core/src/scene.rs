#![forbid(unsafe_code)]

//! Math for the decorative sun scene.
//!
//! A flat-coloured sphere spins slowly while a translucent back-face shell
//! ("corona") pulses around it. The camera orbits the origin under
//! damped pointer control; zoom is disabled.
//!
//! Matrices are column-major `f32` and use a right-handed view space with a
//! `[0, 1]` clip depth range, matching WebGPU.

use std::f32::consts::PI;

pub const SUN_RADIUS: f32 = 1.5;
pub const CORONA_RADIUS: f32 = 1.6;
/// `#f0c43c`, opaque.
pub const SUN_COLOR: [f32; 4] = [240.0 / 255.0, 196.0 / 255.0, 60.0 / 255.0, 1.0];
/// `#ffa500` at 40% opacity.
pub const CORONA_COLOR: [f32; 4] = [1.0, 165.0 / 255.0, 0.0, 0.4];
/// Sun spin per rendered frame, radians.
pub const SUN_SPIN_PER_FRAME: f32 = 0.002;
const PULSE_RATE_PER_MS: f64 = 0.001;
const PULSE_AMPLITUDE: f64 = 0.05;

pub const FOV_Y_DEGREES: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const CAMERA_DISTANCE: f32 = 5.0;
/// Sphere tessellation (longitude × latitude segments).
pub const SPHERE_SEGMENTS: (u32, u32) = (32, 32);

const POLE_EPSILON: f32 = 1e-6;

// ─────────────────────────────────────────────────────────────────────────────
// Vectors and matrices
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    #[must_use]
    pub fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    #[must_use]
    pub fn dot(self, o: Self) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    #[must_use]
    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            return self;
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }
}

/// Column-major 4×4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Right-handed perspective projection with depth mapped to `[0, 1]`.
    #[must_use]
    pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y_radians / 2.0).tan();
        let range = near - far;
        Self {
            cols: [
                [f / aspect, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, far / range, -1.0],
                [0.0, 0.0, near * far / range, 0.0],
            ],
        }
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    #[must_use]
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = target.sub(eye).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f);
        Self {
            cols: [
                [s.x, u.x, -f.x, 0.0],
                [s.y, u.y, -f.y, 0.0],
                [s.z, u.z, -f.z, 0.0],
                [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
            ],
        }
    }

    /// Rotation about the Y axis.
    #[must_use]
    pub fn rotation_y(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            cols: [
                [cos, 0.0, -sin, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [sin, 0.0, cos, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Uniform scale.
    #[must_use]
    pub fn scale(s: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = s;
        m.cols[1][1] = s;
        m.cols[2][2] = s;
        m
    }

    /// `self * rhs`.
    #[must_use]
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, cell) in col.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.cols[k][i] * rhs.cols[j][k]).sum();
            }
        }
        Self { cols: out }
    }

    /// Transform a point (w = 1) and return homogeneous coordinates.
    #[must_use]
    pub fn transform(&self, p: Vec3) -> [f32; 4] {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0f32; 4];
        for (i, cell) in out.iter_mut().enumerate() {
            *cell = (0..4).map(|k| self.cols[k][i] * v[k]).sum();
        }
        out
    }

    /// Flatten to 16 floats in column order.
    #[must_use]
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (j, col) in self.cols.iter().enumerate() {
            out[j * 4..j * 4 + 4].copy_from_slice(col);
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sphere mesh
// ─────────────────────────────────────────────────────────────────────────────

/// Unit UV sphere as a non-indexed triangle list of `[x, y, z, 1]` positions.
///
/// Triangles wind counter-clockwise seen from outside. The degenerate
/// triangles touching the poles are omitted.
#[must_use]
pub fn unit_sphere(width_segments: u32, height_segments: u32) -> Vec<[f32; 4]> {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);

    let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(hs as usize + 1);
    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        let row = (0..=ws)
            .map(|ix| {
                let u = ix as f32 / ws as f32;
                let (sin_phi, cos_phi) = (u * 2.0 * PI).sin_cos();
                let (sin_theta, cos_theta) = (v * PI).sin_cos();
                Vec3::new(-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta)
            })
            .collect();
        grid.push(row);
    }

    let mut out = Vec::with_capacity(sphere_vertex_count(ws, hs));
    let mut push = |p: Vec3| out.push([p.x, p.y, p.z, 1.0]);
    for iy in 0..hs as usize {
        for ix in 0..ws as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                push(a);
                push(b);
                push(d);
            }
            if iy != hs as usize - 1 {
                push(b);
                push(c);
                push(d);
            }
        }
    }
    out
}

/// Vertex count produced by [`unit_sphere`].
#[must_use]
pub fn sphere_vertex_count(width_segments: u32, height_segments: u32) -> usize {
    let ws = width_segments.max(3) as usize;
    let hs = height_segments.max(2) as usize;
    ws * (2 * hs - 2) * 3
}

// ─────────────────────────────────────────────────────────────────────────────
// Orbit controls
// ─────────────────────────────────────────────────────────────────────────────

/// Spherical coordinates around the orbit target (Y up).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Azimuth around Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius <= f32::EPSILON {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_r = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_r * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_r * self.theta.cos(),
        )
    }
}

/// Damped orbit camera controller driven by pointer drags.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    spherical: Spherical,
    delta_theta: f32,
    delta_phi: f32,
    drag_origin: Option<(f32, f32)>,
    /// Fraction of the pending rotation applied per update.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub enable_zoom: bool,
}

impl OrbitControls {
    /// Controls orbiting `target` from `eye`.
    #[must_use]
    pub fn new(eye: Vec3, target: Vec3) -> Self {
        Self {
            target,
            spherical: Spherical::from_offset(eye.sub(target)),
            delta_theta: 0.0,
            delta_phi: 0.0,
            drag_origin: None,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            enable_zoom: false,
        }
    }

    /// Camera position.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.target.add(self.spherical.to_offset())
    }

    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.drag_origin = Some((x, y));
    }

    /// Accumulate rotation for a drag; `element_height` scales pixels to
    /// angle so a full-height drag is one turn.
    pub fn pointer_move(&mut self, x: f32, y: f32, element_height: f32) {
        let Some((x0, y0)) = self.drag_origin else {
            return;
        };
        let h = element_height.max(1.0);
        let dx = x - x0;
        let dy = y - y0;
        self.delta_theta -= 2.0 * PI * dx / h * self.rotate_speed;
        self.delta_phi -= 2.0 * PI * dy / h * self.rotate_speed;
        self.drag_origin = Some((x, y));
    }

    pub fn pointer_up(&mut self) {
        self.drag_origin = None;
    }

    /// Wheel zoom. Ignored while zoom is disabled; returns whether applied.
    pub fn wheel(&mut self, delta_y: f32) -> bool {
        if !self.enable_zoom {
            return false;
        }
        let factor = 0.95f32.powf(-delta_y.signum());
        self.spherical.radius = (self.spherical.radius * factor).max(NEAR);
        true
    }

    /// Apply a damped step of the pending rotation. Returns whether the
    /// camera moved noticeably.
    pub fn update(&mut self) -> bool {
        let step_theta = self.delta_theta * self.damping_factor;
        let step_phi = self.delta_phi * self.damping_factor;
        self.spherical.theta += step_theta;
        self.spherical.phi =
            (self.spherical.phi + step_phi).clamp(POLE_EPSILON, PI - POLE_EPSILON);

        self.delta_theta *= 1.0 - self.damping_factor;
        self.delta_phi *= 1.0 - self.damping_factor;

        step_theta.abs() > POLE_EPSILON || step_phi.abs() > POLE_EPSILON
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scene state
// ─────────────────────────────────────────────────────────────────────────────

/// Per-draw uniform data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawUniforms {
    pub mvp: Mat4,
    pub color: [f32; 4],
}

/// Uniforms for one frame: the corona is drawn first (back faces), then the sun.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub corona: DrawUniforms,
    pub sun: DrawUniforms,
}

/// Animated sun scene.
#[derive(Debug, Clone)]
pub struct SunScene {
    sun_rotation: f32,
    corona_scale: f32,
    width: u32,
    height: u32,
    pub controls: OrbitControls,
}

impl SunScene {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            sun_rotation: 0.0,
            corona_scale: 1.0,
            width: width.max(1),
            height: height.max(1),
            controls: OrbitControls::new(Vec3::new(0.0, 0.0, CAMERA_DISTANCE), Vec3::ZERO),
        }
    }

    /// Track a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    #[must_use]
    pub fn sun_rotation(&self) -> f32 {
        self.sun_rotation
    }

    #[must_use]
    pub fn corona_scale(&self) -> f32 {
        self.corona_scale
    }

    /// Advance one frame at wall-clock time `now_ms`.
    pub fn tick(&mut self, now_ms: f64) {
        self.sun_rotation = (self.sun_rotation + SUN_SPIN_PER_FRAME) % (2.0 * PI);
        self.corona_scale = corona_scale_at(now_ms);
        self.controls.update();
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(FOV_Y_DEGREES.to_radians(), self.aspect(), NEAR, FAR)
    }

    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at(self.controls.eye(), self.controls.target(), Vec3::Y)
    }

    /// Uniforms for the current frame, expecting a unit sphere mesh.
    #[must_use]
    pub fn frame_uniforms(&self) -> FrameUniforms {
        let view_proj = self.projection().mul(&self.view());
        let sun_model = Mat4::rotation_y(self.sun_rotation).mul(&Mat4::scale(SUN_RADIUS));
        let corona_model = Mat4::scale(CORONA_RADIUS * self.corona_scale);
        FrameUniforms {
            corona: DrawUniforms {
                mvp: view_proj.mul(&corona_model),
                color: CORONA_COLOR,
            },
            sun: DrawUniforms {
                mvp: view_proj.mul(&sun_model),
                color: SUN_COLOR,
            },
        }
    }
}

/// Corona scale at `now_ms`: `1 ± 0.05` on a slow sine.
#[must_use]
pub fn corona_scale_at(now_ms: f64) -> f32 {
    (1.0 + (now_ms * PULSE_RATE_PER_MS).sin() * PULSE_AMPLITUDE) as f32
}
