use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::Rng;

use crate::classifier::Classifier;
use crate::dataset::Partition;
use crate::error::{Error, Result};

pub const DEFAULT_LEARNING_RATE: f64 = 0.001;
pub const DEFAULT_EPOCHS: usize = 1000;
pub const DEFAULT_INIT_RANGE: f64 = 0.05;

/// Heaviside step. A sum of exactly zero is class 1.
fn step(sum: f64) -> usize {
	if sum < 0.0 {
		0
	} else {
		1
	}
}

fn sigmoid(sum: f64) -> f64 {
	1.0 / (1.0 + (-sum).exp())
}

/// Outcome of a call to [`Perceptron::train`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrainReport {
	/// Passes over the training rows actually run.
	pub epochs: usize,
	/// Misclassified rows during the last pass.
	pub errors: usize,
	/// Whether the last pass made no mistakes.
	pub converged: bool,
}

/// A linear binary classifier trained with the perceptron rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Perceptron {
	weights: Vec<f64>,
	bias: f64,
	epochs: usize,
	learning_rate: f64,
}

impl Perceptron {
	/// Weights start uniform in `[-0.05, 0.05)`, the bias at 1.
	pub fn new<R: Rng + ?Sized>(rng: &mut R, n_features: usize, epochs: usize) -> Self {
		Self::with_init_range(rng, n_features, epochs, DEFAULT_INIT_RANGE)
	}

	fn with_init_range<R: Rng + ?Sized>(rng: &mut R, n_features: usize, epochs: usize, range: f64) -> Self {
		let weights = (0..n_features)
			.map(|_| if range.is_finite() && range > 0.0 { rng.gen_range(-range, range) } else { 0.0 })
			.collect();

		Self {
			weights,
			bias: 1.0,
			epochs,
			learning_rate: DEFAULT_LEARNING_RATE,
		}
	}

	/// Rebuilds a model from stored parameters.
	pub fn from_parts(bias: f64, weights: Vec<f64>) -> Self {
		Self {
			weights,
			bias,
			epochs: DEFAULT_EPOCHS,
			learning_rate: DEFAULT_LEARNING_RATE,
		}
	}

	pub fn weights(&self) -> &[f64] {
		&self.weights
	}

	pub fn bias(&self) -> f64 {
		self.bias
	}

	pub fn epochs(&self) -> usize {
		self.epochs
	}

	pub fn learning_rate(&self) -> f64 {
		self.learning_rate
	}

	pub fn set_learning_rate(&mut self, learning_rate: f64) {
		self.learning_rate = learning_rate;
	}

	pub fn set_epochs(&mut self, epochs: usize) {
		self.epochs = epochs;
	}

	/// `x` must have one value per weight.
	pub fn weighted_sum(&self, x: &[f64]) -> f64 {
		debug_assert_eq!(x.len(), self.weights.len(), "row width does not match the model");

		self.weights
			.iter()
			.zip(x)
			.map(|(w, x)| w * x)
			.sum::<f64>() + self.bias
	}

	/// Logistic score in (0, 1); only meaningful for comparing models.
	pub fn predict_confidence(&self, x: &[f64]) -> f64 {
		sigmoid(self.weighted_sum(x))
	}

	/// Runs up to `epochs` passes, stopping early after a pass with no
	/// mistakes. The weights of the last pass are kept.
	pub fn train(&mut self, rows: &[Vec<f64>], labels: &[usize]) -> TrainReport {
		let mut report = TrainReport {
			epochs: 0,
			errors: 0,
			converged: false,
		};

		for epoch in 0..self.epochs {
			let mut errors = 0;

			for (x, &y) in rows.iter().zip(labels) {
				let error = y as f64 - step(self.weighted_sum(x)) as f64;
				if error == 0.0 {
					continue;
				}

				errors += 1;
				let delta = error * self.learning_rate;
				for (w, x) in self.weights.iter_mut().zip(x) {
					*w += delta * x;
				}
				self.bias += delta;
			}

			tracing::debug!("epoch {}: {} errors", epoch + 1, errors);

			report.epochs = epoch + 1;
			report.errors = errors;
			if errors == 0 {
				report.converged = true;
				break;
			}
		}

		report
	}

	pub fn fit(&mut self, partition: &Partition) -> TrainReport {
		self.train(partition.rows(), partition.labels())
	}

	/// Text record: the bias, then one weight per line.
	pub fn write_text<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		writeln!(writer, "{:.6}", self.bias)?;

		for w in &self.weights {
			writeln!(writer, "{:.6}", w)?;
		}

		Ok(())
	}

	pub fn read_text<R: Read>(reader: &mut R) -> Result<Self> {
		let mut content = String::new();
		reader.read_to_string(&mut content)?;

		let mut values = content
			.split_whitespace()
			.map(|x| x.parse::<f64>().map_err(|_| Error::InvalidRecord(format!("{:?} is not a number", x))))
			.collect::<Result<Vec<f64>>>()?;

		if values.is_empty() {
			return Err(Error::InvalidRecord("empty model record".to_string()));
		}

		let bias = values.remove(0);
		Ok(Self::from_parts(bias, values))
	}
}

impl Classifier for Perceptron {
	fn predict(&self, x: &[f64]) -> usize {
		step(self.weighted_sum(x))
	}

	fn n_features(&self) -> usize {
		self.weights.len()
	}

	fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		writer.write_f64::<BigEndian>(self.bias)?;
		writer.write_f64::<BigEndian>(self.learning_rate)?;
		writer.write_u32::<BigEndian>(self.epochs as u32)?;
		writer.write_u32::<BigEndian>(self.weights.len() as u32)?;

		for &w in &self.weights {
			writer.write_f64::<BigEndian>(w)?;
		}

		Ok(())
	}

	fn deserialize<R: Read>(reader: &mut R) -> io::Result<Self> {
		let bias = reader.read_f64::<BigEndian>()?;
		let learning_rate = reader.read_f64::<BigEndian>()?;
		let epochs = reader.read_u32::<BigEndian>()? as usize;
		let len = reader.read_u32::<BigEndian>()?;

		let weights = (0..len)
			.map(|_| reader.read_f64::<BigEndian>())
			.collect::<io::Result<Vec<f64>>>()?;

		Ok(Self {
			weights,
			bias,
			epochs,
			learning_rate,
		})
	}
}

/// Hyperparameters for building perceptrons.
#[derive(Clone, Debug)]
pub struct PerceptronBuilder {
	pub epochs: usize,
	pub learning_rate: f64,
	/// Half-width of the initial weight band. Zero, negative and
	/// non-finite values start every weight at 0.
	pub init_range: f64,
}

impl Default for PerceptronBuilder {
	fn default() -> Self {
		Self {
			epochs: DEFAULT_EPOCHS,
			learning_rate: 0.01,
			init_range: DEFAULT_INIT_RANGE,
		}
	}
}

impl PerceptronBuilder {
	pub fn build<R: Rng + ?Sized>(&self, rng: &mut R, n_features: usize) -> Perceptron {
		let mut perceptron = Perceptron::with_init_range(rng, n_features, self.epochs, self.init_range);
		perceptron.set_learning_rate(self.learning_rate);
		perceptron
	}

	pub fn fit<R: Rng + ?Sized>(&self, rng: &mut R, train: &Partition) -> (Perceptron, TrainReport) {
		let mut perceptron = self.build(rng, train.columns());
		let report = perceptron.fit(train);

		tracing::info!(
			"perceptron trained: {} epochs, {} errors in last pass, converged: {}",
			report.epochs,
			report.errors,
			report.converged
		);

		(perceptron, report)
	}
}
