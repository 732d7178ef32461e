/// Number of distinct classes an encoder accepts unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 10;

/// Maps raw textual labels to class codes in first-seen order.
///
/// Whitespace anywhere in a label is ignored. Empty labels and labels that
/// arrive once the encoder is full both map to class 0.
#[derive(Clone, Debug)]
pub struct LabelEncoder {
	known: Vec<String>,
	capacity: usize,
}

impl Default for LabelEncoder {
	fn default() -> Self {
		Self::with_capacity(DEFAULT_CAPACITY)
	}
}

impl LabelEncoder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			known: Vec::new(),
			capacity,
		}
	}

	pub fn encode(&mut self, raw: &str) -> usize {
		let clean = raw
			.chars()
			.filter(|c| !c.is_whitespace())
			.collect::<String>();

		if clean.is_empty() {
			return 0;
		}

		if let Some(code) = self.known.iter().position(|x| *x == clean) {
			return code;
		}

		if self.known.len() < self.capacity {
			self.known.push(clean);
			return self.known.len() - 1;
		}

		tracing::warn!("label {:?} exceeds the {} class limit, encoding as 0", clean, self.capacity);
		0
	}

	/// Raw label registered for `code`, if any.
	pub fn decode(&self, code: usize) -> Option<&str> {
		self.known.get(code).map(String::as_str)
	}

	pub fn labels(&self) -> &[String] {
		&self.known
	}

	pub fn len(&self) -> usize {
		self.known.len()
	}

	pub fn is_empty(&self) -> bool {
		self.known.is_empty()
	}
}
