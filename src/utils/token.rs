use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn generate_object_name(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Random object key that keeps the extension of `file_name`, e.g. `k3j9x0a1bq.pdf`.
pub fn object_key_for(file_name: &str) -> String {
    let stem = generate_object_name(12);
    match std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
    {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext.to_ascii_lowercase()),
        _ => stem,
    }
}
