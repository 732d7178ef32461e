use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_traits::FromPrimitive;
use rand::Rng;

use crate::classifier::Classifier;
use crate::dataset::Dataset;
use crate::ensemble::OneVsAll;
use crate::error::{Error, Result};
use crate::perceptron::{Perceptron, PerceptronBuilder, TrainReport};

#[derive(Clone, Copy, Debug, PartialEq, FromPrimitive)]
enum ModelKind {
	Binary = 0,
	OneVsAll = 1,
}

/// A trained model of whichever shape the dataset called for.
#[derive(Clone, Debug, PartialEq)]
pub enum Model {
	Binary(Perceptron),
	OneVsAll(OneVsAll),
}

impl Model {
	/// Trains on the train partition of `dataset`: a single perceptron for
	/// two classes or fewer, one-vs-all otherwise.
	pub fn fit<R: Rng + ?Sized>(
		builder: &PerceptronBuilder,
		rng: &mut R,
		dataset: &Dataset,
	) -> Result<(Self, Vec<TrainReport>)> {
		let train = dataset.train().ok_or(Error::NotSplit)?;
		let n_classes = dataset.num_classes();

		if n_classes <= 2 {
			let (perceptron, report) = builder.fit(rng, train);
			return Ok((Model::Binary(perceptron), vec![report]));
		}

		tracing::info!("{} classes, training one-vs-all", n_classes);
		let mut ensemble = OneVsAll::build(builder, rng, n_classes, train.columns());
		let reports = ensemble.train(train);

		Ok((Model::OneVsAll(ensemble), reports))
	}

	pub fn n_classes(&self) -> usize {
		match self {
			Model::Binary(_) => 2,
			Model::OneVsAll(ensemble) => ensemble.n_classes(),
		}
	}

	fn kind(&self) -> ModelKind {
		match self {
			Model::Binary(_) => ModelKind::Binary,
			Model::OneVsAll(_) => ModelKind::OneVsAll,
		}
	}
}

impl Classifier for Model {
	fn predict(&self, x: &[f64]) -> usize {
		match self {
			Model::Binary(perceptron) => perceptron.predict(x),
			Model::OneVsAll(ensemble) => ensemble.predict(x),
		}
	}

	fn n_features(&self) -> usize {
		match self {
			Model::Binary(perceptron) => perceptron.n_features(),
			Model::OneVsAll(ensemble) => ensemble.n_features(),
		}
	}

	fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		writer.write_u16::<BigEndian>(self.kind() as u16)?;

		match self {
			Model::Binary(perceptron) => perceptron.serialize(writer),
			Model::OneVsAll(ensemble) => ensemble.serialize(writer),
		}
	}

	fn deserialize<R: Read>(reader: &mut R) -> io::Result<Self> {
		let tag = reader.read_u16::<BigEndian>()?;

		match ModelKind::from_u16(tag) {
			Some(ModelKind::Binary) => Ok(Model::Binary(Perceptron::deserialize(reader)?)),
			Some(ModelKind::OneVsAll) => Ok(Model::OneVsAll(OneVsAll::deserialize(reader)?)),
			None => Err(io::Error::new(
				io::ErrorKind::InvalidData,
				Error::UnknownModelKind(tag),
			)),
		}
	}
}
