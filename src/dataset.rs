use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use ordered_float::OrderedFloat;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::classifier::Classifier;
use crate::error::{Error, Result};
use crate::label_encoder::LabelEncoder;

/// Rows and labels of one side of a train/test split.
///
/// Rows are owned copies, so a partition stays valid even after the
/// dataset it came from is split again.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Partition {
	columns: usize,
	rows: Vec<Vec<f64>>,
	labels: Vec<usize>,
}

impl Partition {
	pub fn new(columns: usize, rows: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<Self> {
		check_shape(columns, &rows, &labels)?;

		Ok(Self { columns, rows, labels })
	}

	pub fn rows(&self) -> &[Vec<f64>] {
		&self.rows
	}

	pub fn labels(&self) -> &[usize] {
		&self.labels
	}

	pub fn columns(&self) -> usize {
		self.columns
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Fraction of rows the classifier labels correctly.
	pub fn evaluate<C: Classifier + Sync>(&self, classifier: &C) -> Result<f64> {
		if self.is_empty() {
			return Err(Error::EmptyTestSet);
		}

		if classifier.n_features() != self.columns {
			return Err(Error::DimensionMismatch {
				expected: classifier.n_features(),
				found: self.columns,
			});
		}

		let hits = self.rows
			.par_iter()
			.zip(self.labels.par_iter())
			.filter(|&(x, &y)| classifier.predict(x) == y)
			.count();

		Ok(hits as f64 / self.len() as f64)
	}
}

fn check_shape(columns: usize, rows: &[Vec<f64>], labels: &[usize]) -> Result<()> {
	if rows.len() != labels.len() {
		return Err(Error::InvalidRecord(format!(
			"{} rows but {} labels",
			rows.len(),
			labels.len()
		)));
	}

	if let Some(row) = rows.iter().find(|row| row.len() != columns) {
		return Err(Error::DimensionMismatch {
			expected: columns,
			found: row.len(),
		});
	}

	Ok(())
}

/// A labeled feature matrix, optionally split into train and test partitions.
#[derive(Clone, Debug)]
pub struct Dataset {
	name: String,
	column_names: Vec<String>,
	features: Vec<Vec<f64>>,
	labels: Vec<usize>,
	partitions: Option<(Partition, Partition)>,
}

impl Dataset {
	pub fn new(name: &str, column_names: Vec<String>, features: Vec<Vec<f64>>, labels: Vec<usize>) -> Result<Self> {
		if column_names.is_empty() {
			return Err(Error::HeaderTooShort { columns: column_names.len() + 1 });
		}

		check_shape(column_names.len(), &features, &labels)?;

		Ok(Self {
			name: name.to_string(),
			column_names,
			features,
			labels,
			partitions: None,
		})
	}

	pub fn open<P: AsRef<Path>>(path: P, encoder: &mut LabelEncoder) -> Result<Self> {
		let path = path.as_ref();
		let file = fs::File::open(path)?;
		let dataset = Self::parse(io::BufReader::new(file), &path.display().to_string(), encoder)?;

		tracing::info!(
			"loaded {} rows, {} columns, {} classes from {}",
			dataset.rows_len(),
			dataset.features_len(),
			encoder.len(),
			path.display()
		);

		Ok(dataset)
	}

	/// Reads comma separated values: a header of feature names followed by the
	/// label name, then one row per line. Blank lines are skipped. Either the
	/// whole source loads or an error is returned.
	pub fn parse<R: BufRead>(reader: R, name: &str, encoder: &mut LabelEncoder) -> Result<Self> {
		let mut lines = reader.lines().enumerate();

		let header = match lines.next() {
			Some((_, line)) => line?,
			None => return Err(Error::EmptySource),
		};

		let header = header
			.split(',')
			.map(|x| x.trim().to_string())
			.collect::<Vec<_>>();

		let total = header.len();
		if total < 2 {
			return Err(Error::HeaderTooShort { columns: total });
		}

		let columns = total - 1;
		let column_names = header[..columns].to_vec();

		let mut features = Vec::new();
		let mut labels = Vec::new();

		for (i, line) in lines {
			let line = line?;
			let line = line.trim();
			if line.is_empty() {
				continue;
			}

			let number = i + 1;
			let tokens = line
				.split(',')
				.map(str::trim)
				.collect::<Vec<_>>();

			if tokens.len() < total {
				return Err(Error::MissingColumns {
					line: number,
					expected: total,
					found: tokens.len(),
				});
			}

			let row = tokens[..columns]
				.iter()
				.enumerate()
				.map(|(j, x)| x.parse::<f64>().map_err(|_| Error::InvalidNumber {
					line: number,
					column: j + 1,
					value: x.to_string(),
				}))
				.collect::<Result<Vec<f64>>>()?;

			features.push(row);
			labels.push(encoder.encode(tokens[columns]));
		}

		if features.is_empty() {
			return Err(Error::NoRows);
		}

		Ok(Self {
			name: name.to_string(),
			column_names,
			features,
			labels,
			partitions: None,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn column_names(&self) -> &[String] {
		&self.column_names
	}

	pub fn features(&self) -> &[Vec<f64>] {
		&self.features
	}

	pub fn labels(&self) -> &[usize] {
		&self.labels
	}

	pub fn features_len(&self) -> usize {
		self.column_names.len()
	}

	pub fn rows_len(&self) -> usize {
		self.features.len()
	}

	pub fn value(&self, row: usize, column: usize) -> Option<f64> {
		self.features.get(row)?.get(column).copied()
	}

	pub fn label(&self, row: usize) -> Option<usize> {
		self.labels.get(row).copied()
	}

	/// Highest class code plus one.
	pub fn num_classes(&self) -> usize {
		self.labels.iter().max().map_or(0, |&x| x + 1)
	}

	pub fn train(&self) -> Option<&Partition> {
		self.partitions.as_ref().map(|(train, _)| train)
	}

	pub fn test(&self) -> Option<&Partition> {
		self.partitions.as_ref().map(|(_, test)| test)
	}

	pub fn is_split(&self) -> bool {
		self.partitions.is_some()
	}

	pub(crate) fn set_partitions(&mut self, train: Partition, test: Partition) {
		self.partitions = Some((train, test));
	}

	/// Accuracy of `classifier` on the test partition.
	pub fn accuracy<C: Classifier + Sync>(&self, classifier: &C) -> Result<f64> {
		self.test().ok_or(Error::NotSplit)?.evaluate(classifier)
	}

	pub fn mean(&self, column: usize) -> Option<f64> {
		if column >= self.features_len() || self.features.is_empty() {
			return None;
		}

		Some(self.column(column).sum::<f64>() / self.rows_len() as f64)
	}

	/// Population standard deviation.
	pub fn std_dev(&self, column: usize) -> Option<f64> {
		let mean = self.mean(column)?;
		let variance = self.column(column)
			.map(|x| (x - mean).powi(2))
			.sum::<f64>() / self.rows_len() as f64;

		Some(variance.sqrt())
	}

	pub fn median(&self, column: usize) -> Option<f64> {
		if column >= self.features_len() || self.features.is_empty() {
			return None;
		}

		let mut values = self.column(column).collect::<Vec<_>>();
		values.sort_by_key(|&x| OrderedFloat(x));

		let n = values.len();
		if n % 2 == 1 {
			Some(values[n / 2])
		} else {
			Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
		}
	}

	fn column(&self, column: usize) -> impl '_ + Iterator<Item = f64> {
		self.features.iter().map(move |row| row[column])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	const IRIS: &str = "\
sepal_length, sepal_width, species
5.1, 3.5, setosa
7.0, 3.2, versicolor

6.3, 3.3, virginica
4.9, 3.0, setosa
";

	fn parse(source: &str) -> Result<Dataset> {
		Dataset::parse(source.as_bytes(), "test", &mut LabelEncoder::new())
	}

	#[test]
	fn parses_rows_and_labels() {
		let dataset = parse(IRIS).unwrap();

		assert_eq!(dataset.rows_len(), 4);
		assert_eq!(dataset.features_len(), 2);
		assert_eq!(dataset.column_names(), &["sepal_length", "sepal_width"]);
		assert_eq!(dataset.labels(), &[0, 1, 2, 0]);
		assert_eq!(dataset.value(2, 0), Some(6.3));
		assert_eq!(dataset.label(1), Some(1));
		assert_eq!(dataset.label(4), None);
		assert_eq!(dataset.num_classes(), 3);
		assert!(!dataset.is_split());
	}

	#[test]
	fn parsing_is_deterministic() {
		let a = parse(IRIS).unwrap();
		let b = parse(IRIS).unwrap();

		assert_eq!(a.features(), b.features());
		assert_eq!(a.labels(), b.labels());
	}

	#[test]
	fn rejects_empty_source() {
		assert!(matches!(parse(""), Err(Error::EmptySource)));
	}

	#[test]
	fn rejects_short_header() {
		assert!(matches!(parse("label\n1\n"), Err(Error::HeaderTooShort { columns: 1 })));
	}

	#[test]
	fn rejects_header_without_rows() {
		assert!(matches!(parse("a,b,label\n\n  \n"), Err(Error::NoRows)));
	}

	#[test]
	fn reports_bad_number_position() {
		let err = parse("a,b,label\n1,2,x\n1,2x,y\n").unwrap_err();

		match err {
			Error::InvalidNumber { line, column, value } => {
				assert_eq!(line, 3);
				assert_eq!(column, 2);
				assert_eq!(value, "2x");
			}
			e => panic!("unexpected error {:?}", e),
		}
	}

	#[test]
	fn rejects_missing_columns() {
		let err = parse("a,b,label\n1,2,x\n1,y\n").unwrap_err();

		assert!(matches!(err, Error::MissingColumns { line: 3, expected: 3, found: 2 }));
	}

	#[test]
	fn new_validates_shape() {
		let names = vec!["a".to_string(), "b".to_string()];

		assert!(Dataset::new("d", names.clone(), vec![vec![1.0, 2.0]], vec![0]).is_ok());
		assert!(Dataset::new("d", names.clone(), vec![vec![1.0]], vec![0]).is_err());
		assert!(Dataset::new("d", names, vec![vec![1.0, 2.0]], vec![]).is_err());
	}

	#[test]
	fn column_statistics() {
		let dataset = parse("a,label\n1,x\n2,x\n3,y\n4,y\n").unwrap();

		assert_relative_eq!(dataset.mean(0).unwrap(), 2.5);
		assert_relative_eq!(dataset.std_dev(0).unwrap(), 1.25f64.sqrt());
		assert_relative_eq!(dataset.median(0).unwrap(), 2.5);
		assert_eq!(dataset.mean(1), None);
	}

	#[test]
	fn accuracy_requires_split() {
		let dataset = parse(IRIS).unwrap();
		let model = crate::perceptron::Perceptron::from_parts(0.0, vec![0.0, 0.0]);

		assert!(matches!(dataset.accuracy(&model), Err(Error::NotSplit)));
	}

	#[test]
	fn empty_partition_has_no_accuracy() {
		let model = crate::perceptron::Perceptron::from_parts(0.0, vec![]);

		assert!(matches!(Partition::default().evaluate(&model), Err(Error::EmptyTestSet)));
	}
}
