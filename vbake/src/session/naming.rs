use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MODIFIED_SUFFIX: &str = "_Modified";
const MAX_NAME_ATTEMPTS: usize = 100;

/// Removes any number of trailing `_Modified` suffixes.
pub fn strip_modified_suffix(name: &str) -> &str {
    let mut name = name;
    while let Some(stripped) = name.strip_suffix(MODIFIED_SUFFIX) {
        name = stripped;
    }
    name
}

/// Makes an object name safe to use in a file name.
///
/// Characters invalid in file names, spaces and parentheses become `_`, and runs of `_` collapse
/// into one.
pub fn sanitize_file_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        let replaced = match c {
            '"' | '<' | '>' | '|' | ':' | '*' | '?' | '\\' | '/' | ' ' | '(' | ')' => '_',
            c if c.is_control() => '_',
            c => c,
        };
        if replaced == '_' && result.ends_with('_') {
            continue;
        }
        result.push(replaced);
    }
    result
}

/// Generates asset names of the form `Mesh_<object>_<10 random digits>`.
pub struct AssetNamer {
    rng: StdRng,
}

impl AssetNamer {
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    /// Deterministic names, for tests and reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// First candidate `exists` rejects is retried, up to 100 times. After that the current time
    /// replaces the random part.
    pub fn unique_name(&mut self, object: &str, exists: impl Fn(&str) -> bool) -> String {
        let object = sanitize_file_name(object);
        for _ in 0..MAX_NAME_ATTEMPTS {
            let number: u64 = self.rng.random_range(1_000_000_000..10_000_000_000);
            let name = format!("Mesh_{object}_{number}");
            if !exists(&name) {
                return name;
            }
        }
        log::warn!("no free name for '{object}' after {MAX_NAME_ATTEMPTS} attempts, using a timestamp");
        format!("Mesh_{object}_{}", chrono::Local::now().format("%Y%m%d%H%M%S%f"))
    }
}

impl Default for AssetNamer {
    fn default() -> Self {
        Self::new()
    }
}
