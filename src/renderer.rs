use crate::{
    camera::Pose,
    config::EngineConfig,
    error::Result,
    grid::{Cell, Grid},
    raymarch::{Escape, Hit, RayMarcher, RaySample},
};

#[inline]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
    // Alpha at 0
}

pub const BACKGROUND: u32 = pack_rgb(0, 0, 0);
pub const WALL_COLOR: u32 = pack_rgb(0, 121, 241); // blue
pub const FLOOR_COLOR: u32 = pack_rgb(80, 80, 80); // dark gray
pub const VOID_COLOR: u32 = pack_rgb(0, 0, 0);
pub const MAP_WALL_COLOR: u32 = pack_rgb(130, 130, 130); // gray
pub const MARKER_COLOR: u32 = pack_rgb(230, 41, 55); // red

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shade {
    Wall,  // foreground slab
    Floor, // nothing within max distance
    Void,  // ray left the map
}

impl Shade {
    #[inline]
    pub fn color(self) -> u32 {
        match self {
            Shade::Wall => WALL_COLOR,
            Shade::Floor => FLOOR_COLOR,
            Shade::Void => VOID_COLOR,
        }
    }
}

/// What to draw in one ray column. `extent` is the slab height in pixels,
/// centred on the horizon. Floor and void columns span the full height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSlab {
    pub column: usize,
    pub shade: Shade,
    pub extent: f32,
}

pub fn column_slabs(samples: &[RaySample], viewport_height: f32, scale: f32) -> Vec<ColumnSlab> {
    samples
        .iter()
        .map(|s| {
            let (shade, extent) = match s.hit {
                Hit::Wall { .. } => (
                    Shade::Wall,
                    s.wall_height(viewport_height, scale).unwrap_or(0.0),
                ),
                Hit::Escaped(Escape::MaxDistance) => (Shade::Floor, viewport_height),
                Hit::Escaped(Escape::OutOfBounds) => (Shade::Void, viewport_height),
            };
            ColumnSlab {
                column: s.column,
                shade,
                extent,
            }
        })
        .collect()
}

/// Placement of the ray columns on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewLayout {
    pub x0: usize,        // first screen column of the 3D view
    pub column_px: usize, // screen pixels per ray
}

impl ViewLayout {
    pub fn new(width: usize, show_minimap: bool) -> Self {
        if show_minimap {
            Self {
                x0: width / 2,
                column_px: 2,
            }
        } else {
            Self {
                x0: 0,
                column_px: 1,
            }
        }
    }
}

pub fn render_frame(
    buf: &mut [u32],
    width: usize,
    height: usize,
    slabs: &[ColumnSlab],
    layout: ViewLayout,
) {
    buf[..width * height].fill(BACKGROUND);

    let horizon = height as f32 / 2.0;
    for slab in slabs {
        let x = layout.x0 + slab.column * layout.column_px;
        let top = (horizon - slab.extent / 2.0).floor() as i32;
        let bottom = (horizon + slab.extent / 2.0).floor() as i32;
        fill_rect(
            buf,
            width,
            height,
            x as i32,
            top,
            layout.column_px as i32,
            bottom - top,
            slab.shade.color(),
        );
    }
}

/// Cast, shade and draw one full frame into `buf`, which must be
/// `viewport_width * viewport_height` pixels.
pub fn render_scene(
    buf: &mut [u32],
    config: &EngineConfig,
    marcher: &RayMarcher<'_>,
    grid: &Grid,
    pose: &Pose,
    show_minimap: bool,
) -> Result<()> {
    let (width, height) = (config.viewport_width, config.viewport_height);
    let samples = marcher.cast_frame(pose, config.fov, config.columns(show_minimap))?;
    let slabs = column_slabs(&samples, height as f32, marcher.config().wall_height_scale);
    render_frame(buf, width, height, &slabs, ViewLayout::new(width, show_minimap));

    if show_minimap {
        draw_minimap(
            buf,
            width,
            height,
            grid,
            pose,
            marcher.origin(pose),
            config.cell_px,
            config.marker_radius,
            config.heading_len,
        );
    }
    Ok(())
}

/// Top-down overlay: wall cells, camera marker and heading line.
#[allow(clippy::too_many_arguments)]
pub fn draw_minimap(
    buf: &mut [u32],
    width: usize,
    height: usize,
    grid: &Grid,
    pose: &Pose,
    eye: [f32; 2],
    cell_px: usize,
    marker_radius: usize,
    heading_len: f32,
) {
    let px = cell_px as i32;
    for (x, y, cell) in grid.cells() {
        if cell == Cell::Wall {
            fill_rect(
                buf,
                width,
                height,
                x as i32 * px,
                y as i32 * px,
                px,
                px,
                MAP_WALL_COLOR,
            );
        }
    }

    let cx = eye[0] * cell_px as f32;
    let cy = eye[1] * cell_px as f32;
    fill_circle(buf, width, height, cx, cy, marker_radius as f32, MARKER_COLOR);

    let [dx, dy] = pose.direction();
    draw_line(
        buf,
        width,
        height,
        [cx, cy],
        [cx + dx * heading_len, cy + dy * heading_len],
        MARKER_COLOR,
    );
}

#[inline]
fn put(buf: &mut [u32], width: usize, height: usize, x: i32, y: i32, color: u32) {
    if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
        buf[y as usize * width + x as usize] = color;
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_rect(
    buf: &mut [u32],
    width: usize,
    height: usize,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    color: u32,
) {
    // Clamp to screen
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(width as i32);
    let y1 = (y + h).min(height as i32);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for yi in y0..y1 {
        let row = yi as usize * width;
        buf[row + x0 as usize..row + x1 as usize].fill(color);
    }
}

fn fill_circle(buf: &mut [u32], width: usize, height: usize, cx: f32, cy: f32, r: f32, color: u32) {
    let r2 = r * r;
    let (y0, y1) = ((cy - r).floor() as i32, (cy + r).ceil() as i32);
    let (x0, x1) = ((cx - r).floor() as i32, (cx + r).ceil() as i32);
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                put(buf, width, height, x, y, color);
            }
        }
    }
}

// DDA line, one pixel per step along the major axis
fn draw_line(buf: &mut [u32], width: usize, height: usize, a: [f32; 2], b: [f32; 2], color: u32) {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
    let (sx, sy) = (dx / steps as f32, dy / steps as f32);
    for i in 0..=steps {
        let x = a[0] + sx * i as f32;
        let y = a[1] + sy * i as f32;
        put(buf, width, height, x.floor() as i32, y.floor() as i32, color);
    }
}
