use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};

use crate::classifier::Classifier;
use crate::dataset::Partition;
use crate::perceptron::{Perceptron, PerceptronBuilder, TrainReport};

/// One perceptron per class; member `i` answers "is this row class `i`".
#[derive(Clone, Debug, PartialEq)]
pub struct OneVsAll {
	members: Vec<Perceptron>,
}

impl OneVsAll {
	pub fn new(members: Vec<Perceptron>) -> Self {
		Self { members }
	}

	pub fn build<R: Rng + ?Sized>(builder: &PerceptronBuilder, rng: &mut R, n_classes: usize, n_features: usize) -> Self {
		let members = (0..n_classes)
			.map(|_| builder.build(rng, n_features))
			.collect();

		Self { members }
	}

	pub fn members(&self) -> &[Perceptron] {
		&self.members
	}

	pub fn n_classes(&self) -> usize {
		self.members.len()
	}

	/// Trains every member against its own binarized copy of the labels.
	/// `train` is only read, so members run in parallel.
	pub fn train(&mut self, train: &Partition) -> Vec<TrainReport> {
		let reports = self.members
			.par_iter_mut()
			.enumerate()
			.map(|(class, member)| {
				let targets = train.labels()
					.iter()
					.map(|&y| (y == class) as usize)
					.collect::<Vec<_>>();

				let report = member.train(train.rows(), &targets);
				tracing::debug!("class {} trained in {} epochs", class, report.epochs);

				report
			})
			.collect::<Vec<_>>();

		tracing::info!(
			"one-vs-all trained {} classes, {} converged",
			reports.len(),
			reports.iter().filter(|r| r.converged).count()
		);

		reports
	}

	/// Confidence of each member for `x`, indexed by class.
	pub fn confidences(&self, x: &[f64]) -> Vec<f64> {
		self.members
			.iter()
			.map(|m| m.predict_confidence(x))
			.collect()
	}
}

impl Classifier for OneVsAll {
	/// Most confident class; ties go to the lowest class code.
	fn predict(&self, x: &[f64]) -> usize {
		let mut best = 0;
		let mut max = std::f64::NEG_INFINITY;

		for (class, confidence) in self.confidences(x).into_iter().enumerate() {
			if confidence > max {
				max = confidence;
				best = class;
			}
		}

		best
	}

	fn n_features(&self) -> usize {
		self.members.first().map_or(0, Perceptron::n_features)
	}

	fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		writer.write_u16::<BigEndian>(self.members.len() as u16)?;

		for member in &self.members {
			member.serialize(writer)?;
		}

		Ok(())
	}

	fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self> {
		let len = reader.read_u16::<BigEndian>()?;

		let members = (0..len)
			.map(|_| Perceptron::deserialize(reader))
			.collect::<std::io::Result<Vec<Perceptron>>>()?;

		Ok(Self { members })
	}
}
