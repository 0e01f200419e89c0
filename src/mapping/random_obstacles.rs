// Random rectangle and circle obstacles on top of an occupancy map

use rand::Rng;
use serde::Deserialize;

use super::occupancy_map::OccupancyMap;

/// Parameters for random obstacle placement, in cells
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RandomObstacleConfig {
    pub seed: u64,
    pub n_rects: usize,
    pub n_circles: usize,
    pub max_rect_width: u32,
    pub max_rect_height: u32,
    pub max_radius: u32,
}

impl Default for RandomObstacleConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            n_rects: 5,
            n_circles: 3,
            max_rect_width: 15,
            max_rect_height: 10,
            max_radius: 5,
        }
    }
}

const MIN_EXTENT: u32 = 2;

/// Inclusive uniform draw that collapses to `lo` when the range is empty
fn sample_inclusive<R: Rng + ?Sized>(rng: &mut R, lo: i64, hi: i64) -> i64 {
    if hi <= lo {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

/// Scatter rectangles and circles that fit inside the grid
pub fn add_random_obstacles<R: Rng + ?Sized>(
    map: &mut OccupancyMap,
    config: &RandomObstacleConfig,
    rng: &mut R,
) {
    let w = map.width() as i64;
    let h = map.height() as i64;
    let res = map.resolution();

    for _ in 0..config.n_rects {
        let rw = sample_inclusive(rng, MIN_EXTENT as i64, config.max_rect_width as i64);
        let rh = sample_inclusive(rng, MIN_EXTENT as i64, config.max_rect_height as i64);
        let x_min = sample_inclusive(rng, 0, (w - rw - 1).max(0));
        let y_min = sample_inclusive(rng, 0, (h - rh - 1).max(0));
        map.add_rect(
            x_min as f64 * res,
            y_min as f64 * res,
            (x_min + rw) as f64 * res,
            (y_min + rh) as f64 * res,
        );
    }

    for _ in 0..config.n_circles {
        let r = sample_inclusive(rng, MIN_EXTENT as i64, config.max_radius as i64);
        let cx = sample_inclusive(rng, r, w - r - 1);
        let cy = sample_inclusive(rng, r, h - r - 1);
        map.add_circle(cx as f64 * res, cy as f64 * res, r as f64 * res);
    }
}
