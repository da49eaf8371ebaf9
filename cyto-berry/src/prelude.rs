//! 🧫欢迎光临🔬
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx2dF, PrepError};

pub use crate::clean::clean_labeled;
pub use crate::mask::{
    compress_mask, extract_foreground, extract_foreground_batch, CompactMask,
};
pub use crate::mosaic::{assemble_slide, assemble_slide_with_order, tile_order};
pub use crate::norm::{histogram_stretch, znorm};
pub use crate::segment::{
    distance_transform_edt, label_areas, label_regions, local_maxima, watershed,
};
pub use crate::threshold::local_threshold;
pub use crate::voronoi::voronoi_cytoplasm;

pub use crate::consts::{
    DEFAULT_BLOCK_SIZE, DEFAULT_EDGE_BUFFER, DEFAULT_FNUC, DEFAULT_MAX_CELL_DIM,
    DEFAULT_MIN_CELL_DIM, DEFAULT_PCUT,
};

pub use crate::dataset::{self, ClassifierArchive};
