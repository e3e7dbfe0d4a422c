use rayon::{
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Precomputed source column/row for every destination pixel
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScaleLut {
    src_x: Vec<usize>,
    src_row: Vec<usize>, // source row start offsets, already multiplied by src width
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn dst_width(&self) -> usize {
        self.src_x.len()
    }

    pub fn dst_height(&self) -> usize {
        self.src_row.len()
    }
}

/// Nearest-neighbour mapping keeps hard pixel edges on the wall slabs.
pub fn build_scale_lut(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleLut {
    if src_w == 0 || src_h == 0 {
        return ScaleLut::empty();
    }

    let sx = src_w as f32 / dst_w.max(1) as f32;
    let sy = src_h as f32 / dst_h.max(1) as f32;

    let src_x = (0..dst_w)
        .map(|x| (((x as f32 + 0.5) * sx) as usize).min(src_w - 1))
        .collect();
    let src_row = (0..dst_h)
        .map(|y| (((y as f32 + 0.5) * sy) as usize).min(src_h - 1) * src_w)
        .collect();

    ScaleLut { src_x, src_row }
}

/// Parallel nearest-neighbour stretch, one destination row per task
pub fn blit_nearest(dst: &mut [u32], dw: usize, src: &[u32], lut: &ScaleLut) {
    if dw == 0 || lut.dst_width() != dw {
        return;
    }

    dst.par_chunks_mut(dw)
        .zip(lut.src_row.par_iter())
        .for_each(|(dst_row, &row)| {
            for (out, &x) in dst_row.iter_mut().zip(&lut.src_x) {
                *out = src[row + x];
            }
        });
}
