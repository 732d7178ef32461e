use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::perceptron::Perceptron;

/// A directory of perceptrons stored as text records.
#[derive(Clone, Debug)]
pub struct ModelStore {
	pub dir: PathBuf,
}

impl Default for ModelStore {
	fn default() -> Self {
		Self::new("Perceptron")
	}
}

impl ModelStore {
	pub fn new<P: AsRef<Path>>(dir: P) -> Self {
		Self { dir: dir.as_ref().to_path_buf() }
	}

	pub fn path(&self, name: &str) -> PathBuf {
		self.dir.join(name)
	}

	pub fn save(&self, name: &str, perceptron: &Perceptron) -> Result<PathBuf> {
		let path = self.path(name);

		let result = fs::create_dir_all(&self.dir)
			.and_then(|_| fs::File::create(&path))
			.and_then(|file| {
				let mut writer = BufWriter::new(file);
				perceptron.write_text(&mut writer)?;
				writer.flush()
			});

		if let Err(e) = result {
			tracing::error!("could not save model to {}: {}", path.display(), e);
			return Err(e.into());
		}

		tracing::info!("model saved to {}", path.display());
		Ok(path)
	}

	pub fn load(&self, name: &str) -> Result<Perceptron> {
		let path = self.path(name);
		let mut file = fs::File::open(&path)?;
		let perceptron = Perceptron::read_text(&mut file)?;

		tracing::info!("loaded model with {} weights from {}", perceptron.weights().len(), path.display());
		Ok(perceptron)
	}

	/// Names of stored models, sorted. A missing directory holds no models.
	pub fn list(&self) -> Result<Vec<String>> {
		let entries = match fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				tracing::warn!("model directory {} does not exist", self.dir.display());
				return Ok(Vec::new());
			}
			Err(e) => return Err(e.into()),
		};

		let mut names = Vec::new();
		for entry in entries {
			let name = entry?.file_name().to_string_lossy().into_owned();
			if !name.starts_with('.') {
				names.push(name);
			}
		}

		names.sort();
		Ok(names)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn save_load_list() {
		let dir = tempfile::tempdir().unwrap();
		let store = ModelStore::new(dir.path().join("models"));

		assert!(store.list().unwrap().is_empty());

		let perceptron = Perceptron::from_parts(1.0, vec![0.5, -0.25]);
		store.save("b.txt", &perceptron).unwrap();
		store.save("a.txt", &perceptron).unwrap();
		fs::write(store.path(".hidden"), "1.0\n").unwrap();

		assert_eq!(store.list().unwrap(), vec!["a.txt", "b.txt"]);

		let loaded = store.load("a.txt").unwrap();
		assert_eq!(loaded.bias(), 1.0);
		assert_eq!(loaded.weights(), &[0.5, -0.25]);
	}

	#[test]
	fn missing_model_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let store = ModelStore::new(dir.path());

		assert!(store.load("nope").is_err());
	}
}
