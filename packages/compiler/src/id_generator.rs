use crc32fast::Hasher;

/// Generate document ID from file path using CRC32
pub fn get_document_id(path: &str) -> String {
    let mut buff = String::from(path);
    if !path.starts_with("file://") {
        buff = format!("file://{}", buff);
    }

    let mut hasher = Hasher::new();
    hasher.update(buff.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic names for condition groups and loops within one template.
///
/// Names are `<seed>_if_<n>` and `<seed>_loop_<n>` with independent counters,
/// so recompiling unchanged source yields the same names.
#[derive(Debug, Clone)]
pub struct IDGenerator {
    seed: String,
    conditions: u32,
    loops: u32,
}

impl IDGenerator {
    pub fn new(path: &str) -> Self {
        Self::from_seed(get_document_id(path))
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            conditions: 0,
            loops: 0,
        }
    }

    pub fn next_condition(&mut self) -> String {
        let id = format!("{}_if_{}", self.seed, self.conditions);
        self.conditions += 1;
        id
    }

    pub fn next_loop(&mut self) -> String {
        let id = format!("{}_loop_{}", self.seed, self.loops);
        self.loops += 1;
        id
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
