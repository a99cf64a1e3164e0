use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2, Axis, concatenate};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result};

/// An in-memory labelled dataset.
///
/// Each row holds a sample's `x_size` features followed by its `y_size` targets.
#[derive(Debug, Clone)]
pub struct Dataset {
    data: Array2<f32>,
    x_size: usize,
}

impl Dataset {
    /// Creates a new `Dataset` from row-major raw data.
    ///
    /// # Arguments
    /// * `data` - The samples, each one `x_size + y_size` values long.
    /// * `x_size` - The amount of features per sample.
    /// * `y_size` - The amount of targets per sample.
    ///
    /// # Returns
    /// A new `Dataset` or an error if `data` can't be split in whole rows.
    pub fn new(data: Vec<f32>, x_size: usize, y_size: usize) -> Result<Self> {
        let row_size = x_size + y_size;

        if x_size == 0 || y_size == 0 {
            return Err(MlErr::InvalidSpec(
                "x_size and y_size must be greater than 0".into(),
            ));
        }

        if data.len() % row_size != 0 {
            return Err(MlErr::SizeMismatch {
                what: "dataset rows",
                got: data.len() % row_size,
                expected: 0,
            });
        }

        let data = Array2::from_shape_vec((data.len() / row_size, row_size), data)?;
        Ok(Self { data, x_size })
    }

    /// Creates a new `Dataset` by pairing the rows of `x` and `y`.
    pub fn from_parts(x: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Self> {
        if x.nrows() != y.nrows() {
            return Err(MlErr::SizeMismatch {
                what: "dataset targets",
                got: y.nrows(),
                expected: x.nrows(),
            });
        }

        let data = concatenate(Axis(1), &[x, y])?;
        Ok(Self {
            data,
            x_size: x.ncols(),
        })
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.data.ncols() - self.x_size
    }

    /// Returns the features and targets of every sample.
    pub fn split(&self) -> (ArrayView2<'_, f32>, ArrayView2<'_, f32>) {
        self.data.view().split_at(Axis(1), self.x_size)
    }

    /// Shuffles the order of the samples.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        self.data = self.data.select(Axis(0), &indices);
    }

    /// Iterates the dataset in batches of at most `batch_size` samples, the last one may be
    /// shorter.
    ///
    /// # Returns
    /// An iterator of `(x, y)` pairs.
    pub fn batches(
        &self,
        batch_size: NonZeroUsize,
    ) -> impl Iterator<Item = (ArrayView2<'_, f32>, ArrayView2<'_, f32>)> {
        let x_size = self.x_size;

        self.data
            .axis_chunks_iter(Axis(0), batch_size.get())
            .map(move |chunk| chunk.split_at(Axis(1), x_size))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn dataset() -> Dataset {
        let data = (0..10).flat_map(|i| [i as f32, 100. + i as f32]).collect();
        Dataset::new(data, 1, 1).unwrap()
    }

    #[test]
    fn batches_cover_every_row() {
        let dataset = dataset();
        let sizes: Vec<_> = dataset
            .batches(NonZeroUsize::new(4).unwrap())
            .map(|(x, y)| (x.nrows(), y.nrows()))
            .collect();

        assert_eq!(sizes, [(4, 4), (4, 4), (2, 2)]);

        let (x, y) = dataset.batches(NonZeroUsize::new(4).unwrap()).last().unwrap();
        assert_eq!(x, array![[8.], [9.]]);
        assert_eq!(y, array![[108.], [109.]]);
    }

    #[test]
    fn shuffle_keeps_pairs_together() {
        let mut dataset = dataset();
        dataset.shuffle(&mut StdRng::seed_from_u64(7));

        let (x, y) = dataset.split();
        let mut xs: Vec<_> = x.iter().copied().collect();
        for (x, y) in x.iter().zip(y.iter()) {
            assert_eq!(*y, x + 100.);
        }

        xs.sort_by(f32::total_cmp);
        assert_eq!(xs, (0..10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn from_parts_pairs_rows() {
        let x = array![[0.1], [0.2]];
        let y = array![[1.], [2.]];
        let dataset = Dataset::from_parts(x.view(), y.view()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.x_size(), 1);
        assert_eq!(dataset.y_size(), 1);
    }

    #[test]
    fn ragged_data_is_rejected() {
        assert!(Dataset::new(vec![1., 2., 3.], 1, 1).is_err());
        assert!(Dataset::from_parts(array![[1.]].view(), array![[1.], [2.]].view()).is_err());
    }
}
