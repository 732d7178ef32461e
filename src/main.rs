use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use perceptron::{codec, logging};
use perceptron::{Classifier, Dataset, LabelEncoder, Model, ModelStore, Partitioner, PerceptronBuilder, Result};

const USAGE: &str = "\
usage: perceptron <action> [args]

  split    <csv> <record>                          split 80/20, save the record and the _TRAIN/_TEST files
  fit      <csv|record> <model> [epochs] [rate]   train and serialize a model
  evaluate <record> <model>                        accuracy of a serialized model on the test rows
  stats    <csv>                                   mean, standard deviation and median per column
  export   <csv> <name>                            train a binary perceptron into the model directory
  models                                           list the model directory

Set PERCEPTRON_SEED for a reproducible split and initialization.";

fn rng() -> StdRng {
	match std::env::var("PERCEPTRON_SEED").ok().and_then(|x| x.parse::<u64>().ok()) {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_entropy(),
	}
}

fn is_csv(location: &str) -> bool {
	Path::new(location)
		.extension()
		.map_or(false, |x| x.eq_ignore_ascii_case("csv"))
}

fn read_csv(location: &str, rng: &mut StdRng) -> Result<Dataset> {
	let mut dataset = Dataset::open(location, &mut LabelEncoder::new())?;
	Partitioner::default().split(rng, &mut dataset)?;
	Ok(dataset)
}

/// Reads a CSV and splits it, or reads an already split record.
fn read_dataset(location: &str, rng: &mut StdRng) -> Result<Dataset> {
	if is_csv(location) {
		read_csv(location, rng)
	} else {
		codec::load_from(location)
	}
}

fn split(dataset_location: &str, record_location: &str) -> Result<()> {
	if !is_csv(dataset_location) {
		return Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("{} is not a .csv file", dataset_location),
		).into());
	}

	let mut rng = rng();
	let dataset = read_csv(dataset_location, &mut rng)?;

	codec::save_to(&dataset, record_location)?;

	let base = Path::new(dataset_location).with_extension("");
	codec::save_split(&dataset, &base.display().to_string())?;

	Ok(())
}

fn fit(dataset_location: &str, serializing_location: &str, builder: &PerceptronBuilder) -> Result<()> {
	let mut rng = rng();

	tracing::info!("reading dataset ...");
	let dataset = read_dataset(dataset_location, &mut rng)?;

	tracing::info!("fitting model [epochs: {}, learning rate: {}] ...", builder.epochs, builder.learning_rate);
	let (model, _) = Model::fit(builder, &mut rng, &dataset)?;

	if let Some(train) = dataset.train().filter(|x| !x.is_empty()) {
		println!("Classification rate train: {:.3?}%", train.evaluate(&model)? * 100.0);
	}
	match dataset.test().filter(|x| !x.is_empty()) {
		Some(test) => println!("Classification rate test: {:.3?}%", test.evaluate(&model)? * 100.0),
		None => tracing::warn!("no test rows in {}, skipping the test rate", dataset_location),
	}

	tracing::info!("serializing model to {} ...", serializing_location);
	let mut serialized_file = BufWriter::new(File::create(serializing_location)?);
	model.serialize(&mut serialized_file)?;
	serialized_file.flush()?;

	Ok(())
}

fn evaluate(record_location: &str, serializing_location: &str) -> Result<()> {
	let dataset = codec::load_from(record_location)?;

	tracing::info!("deserializing model {} ...", serializing_location);
	let mut file = File::open(serializing_location)?;
	let model = Model::deserialize(&mut file)?;

	println!("Classification rate test: {:.3?}%", dataset.accuracy(&model)? * 100.0);

	Ok(())
}

fn stats(dataset_location: &str) -> Result<()> {
	let dataset = Dataset::open(dataset_location, &mut LabelEncoder::new())?;

	for (i, name) in dataset.column_names().iter().enumerate() {
		if let (Some(mean), Some(std_dev), Some(median)) = (dataset.mean(i), dataset.std_dev(i), dataset.median(i)) {
			println!("[{}] mean: {:.2} | std dev: {:.2} | median: {:.2}", name, mean, std_dev, median);
		}
	}

	Ok(())
}

fn export(dataset_location: &str, name: &str) -> Result<()> {
	let mut rng = rng();
	let dataset = read_dataset(dataset_location, &mut rng)?;
	let train = dataset.train().ok_or(perceptron::Error::NotSplit)?;

	let (model, _) = PerceptronBuilder::default().fit(&mut rng, train);
	let path = ModelStore::default().save(name, &model)?;
	println!("Saved {}", path.display());

	Ok(())
}

fn models() -> Result<()> {
	let names = ModelStore::default().list()?;

	if names.is_empty() {
		println!("(no models)");
	}
	for name in names {
		println!(" -> {}", name);
	}

	Ok(())
}

fn usage() -> ! {
	eprintln!("{}", USAGE);
	std::process::exit(2)
}

fn arg(args: &[String], i: usize) -> &str {
	match args.get(i) {
		Some(x) => x.as_str(),
		None => usage(),
	}
}

fn opt<T: std::str::FromStr>(args: &[String], i: usize, default: T) -> T {
	match args.get(i) {
		Some(x) => x.parse().unwrap_or_else(|_| usage()),
		None => default,
	}
}

fn run(args: &[String]) -> Result<()> {
	match arg(args, 1) {
		"split" => split(arg(args, 2), arg(args, 3)),
		"fit" => {
			let defaults = PerceptronBuilder::default();
			let builder = PerceptronBuilder {
				epochs: opt(args, 4, defaults.epochs),
				learning_rate: opt(args, 5, defaults.learning_rate),
				..defaults
			};
			fit(arg(args, 2), arg(args, 3), &builder)
		},
		"evaluate" => evaluate(arg(args, 2), arg(args, 3)),
		"stats" => stats(arg(args, 2)),
		"export" => export(arg(args, 2), arg(args, 3)),
		"models" => models(),
		_ => usage(),
	}
}

fn main() {
	logging::init();

	let args = std::env::args().collect::<Vec<String>>();
	if let Err(e) = run(&args) {
		tracing::error!("{}", e);
		std::process::exit(1);
	}
}
