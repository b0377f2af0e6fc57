use std::path::PathBuf;

/// Where a checkpoint comes from: a path on disk or bytes already in memory.
pub enum ModelSource {
    File(PathBuf),
    Memory(Vec<u8>),
}
