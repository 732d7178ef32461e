use std::io::{Read, Write};

pub trait Classifier: Sized {
	/// Class code for a single row. `x` must be `n_features()` wide;
	/// check the width first when the row comes from outside.
	fn predict(&self, x: &[f64]) -> usize;

	/// Row width the model was built for.
	fn n_features(&self) -> usize;

	fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;
	fn deserialize<R: Read>(reader: &mut R) -> std::io::Result<Self>;
}
