use std::fs;
use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;

use perceptron::{codec, Classifier, Dataset, LabelEncoder, Model, ModelStore, Partitioner, PerceptronBuilder};

// Three clusters of 25 points around (0, 0), (5, 5) and (10, 0).
fn write_clusters(path: &std::path::Path) -> std::io::Result<()> {
	let mut file = fs::File::create(path)?;
	writeln!(file, "x, y, color")?;

	let offsets = [-0.6, -0.3, 0.0, 0.3, 0.6];
	for &(cx, cy, name) in &[(0.0, 0.0, "red"), (5.0, 5.0, "green"), (10.0, 0.0, "blue")] {
		for dx in &offsets {
			for dy in &offsets {
				writeln!(file, "{}, {}, {}", cx + dx, cy + dy, name)?;
			}
		}
		writeln!(file)?;
	}

	Ok(())
}

#[test]
fn csv_to_model_and_back() -> perceptron::Result<()> {
	let dir = tempfile::tempdir()?;
	let csv = dir.path().join("clusters.csv");
	write_clusters(&csv)?;

	let mut rng = StdRng::seed_from_u64(2024);
	let mut encoder = LabelEncoder::new();
	let mut dataset = Dataset::open(&csv, &mut encoder)?;

	assert_eq!(dataset.rows_len(), 75);
	assert_eq!(dataset.num_classes(), 3);
	assert_eq!(encoder.labels(), &["red", "green", "blue"]);

	Partitioner::default().split(&mut rng, &mut dataset)?;
	let train_labels = dataset.train().unwrap().labels().to_vec();

	let builder = PerceptronBuilder {
		learning_rate: 0.1,
		..PerceptronBuilder::default()
	};
	let (model, reports) = Model::fit(&builder, &mut rng, &dataset)?;

	assert_eq!(reports.len(), 3);
	assert!(reports.iter().all(|r| r.converged));
	assert_eq!(dataset.train().unwrap().labels(), train_labels.as_slice());
	assert_eq!(dataset.train().unwrap().evaluate(&model)?, 1.0);

	let accuracy = dataset.accuracy(&model)?;
	assert!((0.0..=1.0).contains(&accuracy));

	// Persist both the split dataset and the model, then score again.
	let record = dir.path().join("clusters.txt");
	codec::save_to(&dataset, &record)?;
	let loaded = codec::load_from(&record)?;

	let mut buf = Vec::new();
	model.serialize(&mut buf)?;
	let restored = Model::deserialize(&mut buf.as_slice())?;

	assert_eq!(restored, model);
	assert_eq!(loaded.test().unwrap().labels(), dataset.test().unwrap().labels());
	assert_eq!(loaded.accuracy(&restored)?, accuracy);

	Ok(())
}

#[test]
fn binary_model_through_store() -> perceptron::Result<()> {
	let dir = tempfile::tempdir()?;
	let csv = dir.path().join("and.csv");
	fs::write(&csv, "a,b,out\n0,0,no\n0,1,no\n1,0,no\n1,1,yes\n0,0,no\n1,1,yes\n0,1,no\n1,0,no\n1,1,yes\n0,0,no\n")?;

	let mut rng = StdRng::seed_from_u64(7);
	let mut dataset = Dataset::open(&csv, &mut LabelEncoder::new())?;
	Partitioner::default().split(&mut rng, &mut dataset)?;

	let (model, report) = PerceptronBuilder::default().fit(&mut rng, dataset.train().unwrap());
	assert!(report.converged);

	let store = ModelStore::new(dir.path().join("models"));
	store.save("and.txt", &model)?;
	assert_eq!(store.list()?, vec!["and.txt"]);

	let loaded = store.load("and.txt")?;
	for x in &[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
		assert_eq!(loaded.predict(x), model.predict(x));
	}

	Ok(())
}
