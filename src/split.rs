use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::{Dataset, Partition};
use crate::error::{Error, Result};

/// Shuffles a dataset's rows and cuts them into train and test partitions.
#[derive(Clone, Debug)]
pub struct Partitioner {
	pub train_rate: f64,
}

impl Default for Partitioner {
	fn default() -> Self {
		Self { train_rate: 0.8 }
	}
}

impl Partitioner {
	/// Replaces any previous split of `dataset`.
	///
	/// The first `floor(train_rate * n)` shuffled rows go to train and the
	/// rest to test. Either side may come out empty for tiny datasets.
	pub fn split<'a, R: Rng + ?Sized>(
		&self,
		rng: &mut R,
		dataset: &'a mut Dataset,
	) -> Result<(&'a Partition, &'a Partition)> {
		let n = dataset.rows_len();
		if n == 0 {
			tracing::error!("cannot split {}: dataset is empty", dataset.name());
			return Err(Error::NoRows);
		}

		let train_num = ((self.train_rate * n as f64).floor() as usize).min(n);

		// Fisher-Yates, walking down from the last index.
		let mut index = (0..n).collect::<Vec<usize>>();
		index.shuffle(rng);

		let (train_index, test_index) = index.split_at(train_num);
		let columns = dataset.features_len();
		let train = take(dataset, columns, train_index)?;
		let test = take(dataset, columns, test_index)?;

		tracing::info!("split {}: train: {}, test: {}", dataset.name(), train.len(), test.len());
		dataset.set_partitions(train, test);

		let dataset: &'a Dataset = dataset;
		match (dataset.train(), dataset.test()) {
			(Some(train), Some(test)) => Ok((train, test)),
			_ => Err(Error::NotSplit),
		}
	}
}

fn take(dataset: &Dataset, columns: usize, index: &[usize]) -> Result<Partition> {
	let rows = index
		.iter()
		.map(|&i| dataset.features()[i].clone())
		.collect();
	let labels = index
		.iter()
		.map(|&i| dataset.labels()[i])
		.collect();

	Partition::new(columns, rows, labels)
}
