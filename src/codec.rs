//! Persistence for split datasets.
//!
//! The record is plain text, one item per line, in this order: test count,
//! train count, test rows, train rows, test labels, train labels, column
//! names and finally the column count. Values are written with 6 decimals.
//!
//! Column names are written but not read back; a loaded dataset names every
//! column [`PLACEHOLDER_COLUMN`]. Its unsplit rows are the test rows followed
//! by the train rows, which is generally not the order of the original file.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::dataset::{Dataset, Partition};
use crate::error::{Error, Result};

pub const PLACEHOLDER_COLUMN: &str = "Col";

fn write_rows<W: Write>(writer: &mut W, rows: &[Vec<f64>]) -> io::Result<()> {
	for row in rows {
		let line = row
			.iter()
			.map(|x| format!("{:.6}", x))
			.collect::<Vec<_>>()
			.join(",");
		writeln!(writer, "{}", line)?;
	}

	Ok(())
}

fn write_labels<W: Write>(writer: &mut W, labels: &[usize]) -> io::Result<()> {
	for label in labels {
		writeln!(writer, "{}", label)?;
	}

	Ok(())
}

pub fn save<W: Write>(dataset: &Dataset, writer: &mut W) -> Result<()> {
	let (train, test) = match (dataset.train(), dataset.test()) {
		(Some(train), Some(test)) => (train, test),
		_ => return Err(Error::NotSplit),
	};

	writeln!(writer, "{}", test.len())?;
	writeln!(writer, "{}", train.len())?;
	write_rows(writer, test.rows())?;
	write_rows(writer, train.rows())?;
	write_labels(writer, test.labels())?;
	write_labels(writer, train.labels())?;
	writeln!(writer, "{}", dataset.column_names().join(","))?;
	writeln!(writer, "{}", dataset.features_len())?;

	Ok(())
}

/// Saves to a file. Failures are logged before being returned; nothing is
/// written for a dataset that was never split.
pub fn save_to<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<()> {
	let path = path.as_ref();

	let result = if dataset.is_split() {
		fs::File::create(path)
			.map_err(Error::from)
			.and_then(|file| {
				let mut writer = BufWriter::new(file);
				save(dataset, &mut writer)?;
				writer.flush()?;
				Ok(())
			})
	} else {
		Err(Error::NotSplit)
	};

	match &result {
		Ok(()) => tracing::info!("saved {} to {}", dataset.name(), path.display()),
		Err(e) => tracing::error!("could not save {} to {}: {}", dataset.name(), path.display(), e),
	}

	result
}

fn next_token<'a, I: Iterator<Item = &'a str>>(tokens: &mut I, what: &str) -> Result<&'a str> {
	tokens
		.next()
		.ok_or_else(|| Error::InvalidRecord(format!("missing {}", what)))
}

fn parse_count(token: &str, what: &str) -> Result<usize> {
	token
		.parse::<usize>()
		.map_err(|_| Error::InvalidRecord(format!("{} {:?} is not a count", what, token)))
}

fn read_rows<'a, I: Iterator<Item = &'a str>>(tokens: &mut I, n: usize, columns: usize) -> Result<Vec<Vec<f64>>> {
	(0..n)
		.map(|i| {
			let row = next_token(tokens, "feature row")?
				.split(',')
				.map(|x| x.parse::<f64>().map_err(|_| {
					Error::InvalidRecord(format!("row {}: {:?} is not a number", i + 1, x))
				}))
				.collect::<Result<Vec<f64>>>()?;

			if row.len() != columns {
				return Err(Error::DimensionMismatch {
					expected: columns,
					found: row.len(),
				});
			}

			Ok(row)
		})
		.collect()
}

fn read_labels<'a, I: Iterator<Item = &'a str>>(tokens: &mut I, n: usize) -> Result<Vec<usize>> {
	(0..n)
		.map(|_| parse_count(next_token(tokens, "label")?, "label"))
		.collect()
}

pub fn load<R: Read>(reader: &mut R, name: &str) -> Result<Dataset> {
	let mut content = String::new();
	reader.read_to_string(&mut content)?;

	let mut tokens = content.split_whitespace();
	let test_num = parse_count(next_token(&mut tokens, "test count")?, "test count")?;
	let train_num = parse_count(next_token(&mut tokens, "train count")?, "train count")?;

	// The column count is always the last token.
	let columns = content
		.split_whitespace()
		.last()
		.ok_or_else(|| Error::InvalidRecord("missing column count".to_string()))
		.and_then(|x| parse_count(x, "column count"))?;

	if columns == 0 {
		return Err(Error::InvalidRecord("column count is 0".to_string()));
	}

	let test_rows = read_rows(&mut tokens, test_num, columns)?;
	let train_rows = read_rows(&mut tokens, train_num, columns)?;
	let test_labels = read_labels(&mut tokens, test_num)?;
	let train_labels = read_labels(&mut tokens, train_num)?;

	let features = test_rows
		.iter()
		.chain(&train_rows)
		.cloned()
		.collect();
	let labels = test_labels
		.iter()
		.chain(&train_labels)
		.copied()
		.collect();

	let column_names = vec![PLACEHOLDER_COLUMN.to_string(); columns];
	let mut dataset = Dataset::new(name, column_names, features, labels)?;
	dataset.set_partitions(
		Partition::new(columns, train_rows, train_labels)?,
		Partition::new(columns, test_rows, test_labels)?,
	);

	Ok(dataset)
}

pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Dataset> {
	let path = path.as_ref();
	let mut file = fs::File::open(path)?;
	let dataset = load(&mut file, &path.display().to_string())?;

	tracing::info!("loaded {} rows from {}", dataset.rows_len(), path.display());
	Ok(dataset)
}

fn write_csv(path: &Path, partition: &Partition) -> Result<()> {
	let mut writer = BufWriter::new(fs::File::create(path)?);

	for (row, label) in partition.rows().iter().zip(partition.labels()) {
		for x in row {
			write!(writer, "{:.6},", x)?;
		}
		writeln!(writer, "{}", label)?;
	}

	writer.flush()?;
	Ok(())
}

/// Writes the partitions to `<base>_TRAIN.csv` and `<base>_TEST.csv`,
/// each row being the features followed by the class code.
pub fn save_split(dataset: &Dataset, base: &str) -> Result<(PathBuf, PathBuf)> {
	let (train, test) = match (dataset.train(), dataset.test()) {
		(Some(train), Some(test)) => (train, test),
		_ => return Err(Error::NotSplit),
	};

	let train_path = PathBuf::from(format!("{}_TRAIN.csv", base));
	let test_path = PathBuf::from(format!("{}_TEST.csv", base));

	write_csv(&train_path, train)?;
	write_csv(&test_path, test)?;

	tracing::info!("split saved to {} and {}", train_path.display(), test_path.display());
	Ok((train_path, test_path))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::label_encoder::LabelEncoder;
	use crate::split::Partitioner;
	use approx::assert_abs_diff_eq;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn split_dataset() -> Dataset {
		let source = "\
width, height, kind
1.25, 2.5, cat
3.1234567, 4, dog
5, 6.5, bird
7, 8, cat
9.5, 10, dog
";
		let mut dataset = Dataset::parse(source.as_bytes(), "animals", &mut LabelEncoder::new()).unwrap();
		Partitioner::default().split(&mut StdRng::seed_from_u64(0), &mut dataset).unwrap();
		dataset
	}

	#[test]
	fn record_layout() {
		let mut dataset = Dataset::new(
			"d",
			vec!["a".into(), "b".into()],
			vec![vec![1.0, 2.0], vec![3.0, 4.0]],
			vec![0, 1],
		).unwrap();
		dataset.set_partitions(
			Partition::new(2, vec![vec![3.0, 4.0]], vec![1]).unwrap(),
			Partition::new(2, vec![vec![1.0, 2.0]], vec![0]).unwrap(),
		);

		let mut buf = Vec::new();
		save(&dataset, &mut buf).unwrap();

		assert_eq!(
			String::from_utf8(buf).unwrap(),
			"1\n1\n1.000000,2.000000\n3.000000,4.000000\n0\n1\na,b\n2\n"
		);
	}

	#[test]
	fn round_trip() {
		let dataset = split_dataset();
		let mut buf = Vec::new();
		save(&dataset, &mut buf).unwrap();

		let loaded = load(&mut buf.as_slice(), "animals").unwrap();
		let (train, test) = (dataset.train().unwrap(), dataset.test().unwrap());
		let (loaded_train, loaded_test) = (loaded.train().unwrap(), loaded.test().unwrap());

		assert_eq!(loaded_train.len(), train.len());
		assert_eq!(loaded_test.len(), test.len());
		assert_eq!(loaded_train.labels(), train.labels());
		assert_eq!(loaded_test.labels(), test.labels());

		for (a, b) in train.rows().iter().chain(test.rows()).zip(loaded_train.rows().iter().chain(loaded_test.rows())) {
			for (x, y) in a.iter().zip(b) {
				assert_abs_diff_eq!(*x, *y, epsilon = 5e-7);
			}
		}

		assert_eq!(loaded.column_names(), &["Col", "Col"]);
		assert_eq!(loaded.rows_len(), 5);
		assert_eq!(&loaded.labels()[..test.len()], test.labels());
		assert_eq!(&loaded.labels()[test.len()..], train.labels());
	}

	#[test]
	fn unsplit_dataset_is_not_saved() {
		let dataset = Dataset::parse("a,l\n1,x\n".as_bytes(), "d", &mut LabelEncoder::new()).unwrap();
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("record.txt");

		assert!(matches!(save_to(&dataset, &path), Err(Error::NotSplit)));
		assert!(!path.exists());
	}

	#[test]
	fn missing_target_directory_is_reported() {
		let dataset = split_dataset();
		let dir = tempfile::tempdir().unwrap();

		let result = save_to(&dataset, dir.path().join("missing").join("record.txt"));
		assert!(matches!(result, Err(Error::Io(_))));
	}

	#[test]
	fn bad_counts_are_rejected() {
		assert!(matches!(load(&mut "".as_bytes(), "d"), Err(Error::InvalidRecord(_))));
		assert!(matches!(load(&mut "x\n1\n".as_bytes(), "d"), Err(Error::InvalidRecord(_))));
		assert!(load(&mut "1\n0\n1.0,oops\n0\nCol\n2\n".as_bytes(), "d").is_err());
		assert!(load(&mut "1\n0\n1.0\n0\nCol\n2\n".as_bytes(), "d").is_err());
	}

	#[test]
	fn record_without_test_rows_has_no_accuracy() {
		let dataset = load(&mut "0\n3\n0.000000\n1.000000\n2.000000\n0\n1\n1\nCol\n1\n".as_bytes(), "d").unwrap();
		assert_eq!(dataset.test().map(Partition::len), Some(0));
		assert_eq!(dataset.train().map(Partition::len), Some(3));

		let model = crate::perceptron::Perceptron::from_parts(0.0, vec![1.0]);
		assert!(matches!(dataset.accuracy(&model), Err(Error::EmptyTestSet)));
	}

	#[test]
	fn split_files() {
		let dataset = split_dataset();
		let dir = tempfile::tempdir().unwrap();
		let base = dir.path().join("animals");

		let (train_path, test_path) = save_split(&dataset, &base.display().to_string()).unwrap();

		assert!(train_path.ends_with("animals_TRAIN.csv"));
		let train = fs::read_to_string(train_path).unwrap();
		let test = fs::read_to_string(test_path).unwrap();
		assert_eq!(train.lines().count(), 4);
		assert_eq!(test.lines().count(), 1);

		let first = dataset.test().unwrap();
		let expected = format!("{:.6},{:.6},{}", first.rows()[0][0], first.rows()[0][1], first.labels()[0]);
		assert_eq!(test.trim_end(), expected);
	}
}
