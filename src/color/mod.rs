pub(crate) mod matrix;

pub use matrix::ConversionMatrix;

pub(crate) mod mat_idxs {
    pub(crate) const Y: usize = 0;
    pub(crate) const CB: usize = 1;
    pub(crate) const CR: usize = 2;

    pub(crate) const R: usize = 0;
    pub(crate) const G: usize = 1;
    pub(crate) const B: usize = 2;
}
