//! CPU frame buffers for the reference effect implementations
//!
//! Sampling mirrors the GPU side: colour is read bilinearly with
//! clamp-to-edge addressing (`textureSampleLevel` with a linear sampler),
//! auxiliary textures are read from the nearest texel (`textureLoad`).

/// Rec. 709 luminance
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]
}

/// Colour plus optional depth, normal and velocity planes of one frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffers {
    pub width: u32,
    pub height: u32,
    /// Linear RGBA, row-major, top row first
    pub color: Vec<[f32; 4]>,
    /// Non-linear depth in `[0, 1]`, 1 at the far plane
    pub depth: Option<Vec<f32>>,
    /// View-space unit normals
    pub normal: Option<Vec<[f32; 3]>>,
    /// Screen motion in UV units per frame
    pub velocity: Option<Vec<[f32; 2]>>,
}

/// Texel count of a `width` x `height` plane, computed without `u32` overflow
fn plane_len(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

impl FrameBuffers {
    /// Wrap a colour plane; a plane of the wrong length is padded or cut
    pub fn new(width: u32, height: u32, mut color: Vec<[f32; 4]>) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        color.resize(plane_len(width, height), [0.0; 4]);
        Self {
            width,
            height,
            color,
            depth: None,
            normal: None,
            velocity: None,
        }
    }

    /// Single-colour frame
    pub fn filled(width: u32, height: u32, color: [f32; 4]) -> Self {
        Self::new(width, height, vec![color; plane_len(width.max(1), height.max(1))])
    }

    /// Frame whose colour comes from `f(x, y)`
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let color = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, color)
    }

    pub fn with_depth(mut self, mut depth: Vec<f32>) -> Self {
        depth.resize(self.len(), 1.0);
        self.depth = Some(depth);
        self
    }

    pub fn with_normal(mut self, mut normal: Vec<[f32; 3]>) -> Self {
        normal.resize(self.len(), [0.0, 0.0, 1.0]);
        self.normal = Some(normal);
        self
    }

    pub fn with_velocity(mut self, mut velocity: Vec<[f32; 2]>) -> Self {
        velocity.resize(self.len(), [0.0; 2]);
        self.velocity = Some(velocity);
        self
    }

    pub fn len(&self) -> usize {
        plane_len(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_empty()
    }

    /// Size of one texel in UV units
    pub fn texel_size(&self) -> [f32; 2] {
        [1.0 / self.width as f32, 1.0 / self.height as f32]
    }

    /// UV of a texel centre
    pub fn uv(&self, x: u32, y: u32) -> [f32; 2] {
        [
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        ]
    }

    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.color[self.index(x, y)]
    }

    /// Evaluate `f(x, y, uv)` for every texel, row-major
    pub fn map_pixels(&self, mut f: impl FnMut(u32, u32, [f32; 2]) -> [f32; 4]) -> Vec<[f32; 4]> {
        let mut out = Vec::with_capacity(self.len());
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(f(x, y, self.uv(x, y)));
            }
        }
        out
    }

    /// Bilinear colour sample, clamp-to-edge
    pub fn sample_color(&self, uv: [f32; 2]) -> [f32; 4] {
        let px = uv[0] * self.width as f32 - 0.5;
        let py = uv[1] * self.height as f32 - 0.5;
        let x0 = px.floor();
        let y0 = py.floor();
        let fx = px - x0;
        let fy = py - y0;

        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        let xa = (x0 as i64).clamp(0, max_x) as u32;
        let xb = (x0 as i64 + 1).clamp(0, max_x) as u32;
        let ya = (y0 as i64).clamp(0, max_y) as u32;
        let yb = (y0 as i64 + 1).clamp(0, max_y) as u32;

        let top = lerp4(self.pixel(xa, ya), self.pixel(xb, ya), fx);
        let bottom = lerp4(self.pixel(xa, yb), self.pixel(xb, yb), fx);
        lerp4(top, bottom, fy)
    }

    pub fn load_depth(&self, uv: [f32; 2]) -> Option<f32> {
        let index = self.nearest(uv);
        self.depth.as_ref().map(|d| d[index])
    }

    pub fn load_normal(&self, uv: [f32; 2]) -> Option<[f32; 3]> {
        let index = self.nearest(uv);
        self.normal.as_ref().map(|n| n[index])
    }

    pub fn load_velocity(&self, uv: [f32; 2]) -> Option<[f32; 2]> {
        let index = self.nearest(uv);
        self.velocity.as_ref().map(|v| v[index])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Texel under `uv`, clamped to the frame
    fn nearest(&self, uv: [f32; 2]) -> usize {
        let x = (uv[0] * self.width as f32).floor() as i64;
        let y = (uv[1] * self.height as f32).floor() as i64;
        let x = x.clamp(0, self.width as i64 - 1) as u32;
        let y = y.clamp(0, self.height as i64 - 1) as u32;
        self.index(x, y)
    }
}

fn lerp4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}
